//! The bounded tool-calling loop that answers one user turn.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use adscope_core::{merge, ActiveFilterSet, AppConfig, Campaign};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::chat::{ChatRequest, ChatResponse, HistoryTurn};
use crate::embedder::OpenAiEmbedder;
use crate::error::AgentError;
use crate::llm::{ChatMessage, ChatModel, ModelTurn, OpenAiChatClient, ToolCallRequest, ToolSchema};
use crate::prompt::system_prompt;
use crate::response::assemble_response;
use crate::store::CampaignStore;
use crate::tools::{tool_schemas, ToolInvocation, ToolResult, Toolbox};

/// Maximum model round trips per user turn.
pub const DEFAULT_MAX_ITERATIONS: usize = 5;
/// Most recent history turns replayed into the buffer.
pub const MAX_HISTORY_TURNS: usize = 20;
pub const DEFAULT_ROUND_TRIP_TIMEOUT: Duration = Duration::from_secs(30);
/// Returned when the iteration cap is reached or the model produces no text.
pub const FALLBACK_ANSWER: &str =
    "Sorry, I couldn't generate a response. Please try rephrasing your question.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    AwaitingModelTurn,
    ExecutingTools,
    Done,
}

/// Everything the loop produced for one user turn.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopOutcome {
    pub answer: String,
    /// Campaigns from the most recent successful tool call.
    pub campaigns: Vec<Campaign>,
    pub total: usize,
    pub detected_filters: Option<ActiveFilterSet>,
    /// Model round trips performed.
    pub iterations: usize,
    pub hit_iteration_cap: bool,
}

pub struct Orchestrator {
    model: Arc<dyn ChatModel>,
    toolbox: Toolbox,
    schemas: Vec<ToolSchema>,
    system_prompt: String,
    max_iterations: usize,
    round_trip_timeout: Duration,
}

impl Orchestrator {
    #[must_use]
    pub fn new(model: Arc<dyn ChatModel>, toolbox: Toolbox) -> Self {
        Self {
            model,
            toolbox,
            schemas: tool_schemas(),
            system_prompt: system_prompt(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            round_trip_timeout: DEFAULT_ROUND_TRIP_TIMEOUT,
        }
    }

    /// Wires the OpenAI-compatible clients described by `config` around
    /// `store`.
    ///
    /// # Errors
    ///
    /// Returns an error if either HTTP client cannot be built.
    pub fn from_config(
        config: &AppConfig,
        store: Arc<dyn CampaignStore>,
    ) -> Result<Self, AgentError> {
        let embedder = OpenAiEmbedder::new(
            &config.openai_api_key,
            &config.llm_base_url,
            &config.embedding_model,
            config.upstream_timeout_secs,
        )?;
        let model = OpenAiChatClient::new(
            &config.openai_api_key,
            &config.llm_base_url,
            &config.chat_model,
            config.upstream_timeout_secs,
        )?;
        let toolbox = Toolbox::new(store, Arc::new(embedder))
            .with_similarity_threshold(config.similarity_threshold);

        Ok(Self::new(Arc::new(model), toolbox)
            .with_max_iterations(config.max_tool_iterations)
            .with_round_trip_timeout(Duration::from_secs(config.upstream_timeout_secs)))
    }

    /// Sets the round-trip cap. Values below 1 are raised to 1.
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    #[must_use]
    pub fn with_round_trip_timeout(mut self, timeout: Duration) -> Self {
        self.round_trip_timeout = timeout;
        self
    }

    /// Validates `request`, runs the loop, and assembles the chat response.
    ///
    /// # Errors
    ///
    /// [`AgentError::Validation`] for a missing message; any error that
    /// aborts [`Orchestrator::run`].
    pub async fn respond(&self, request: &ChatRequest) -> Result<ChatResponse, AgentError> {
        let message = request.validated_message()?;
        let base = request.active_filters.clone().unwrap_or_default();
        let outcome = self.run(message, &request.history, &base).await?;
        Ok(assemble_response(outcome))
    }

    /// Runs the model/tool loop until the model answers or the cap is hit.
    ///
    /// Tool failures are reported back to the model and never abort the loop.
    ///
    /// # Errors
    ///
    /// Returns an error if a model turn fails or times out.
    pub async fn run(
        &self,
        message: &str,
        history: &[HistoryTurn],
        base: &ActiveFilterSet,
    ) -> Result<LoopOutcome, AgentError> {
        let mut messages = self.seed_buffer(message, history);
        let mut state = LoopState::AwaitingModelTurn;
        let mut iterations = 0;
        let mut hit_iteration_cap = false;
        let mut answer: Option<String> = None;
        let mut pending: Vec<ToolCallRequest> = Vec::new();
        let mut last_result: Option<ToolResult> = None;
        let mut detected: Option<ActiveFilterSet> = None;

        while state != LoopState::Done {
            state = match state {
                LoopState::AwaitingModelTurn if iterations >= self.max_iterations => {
                    warn!(iterations, "tool iteration cap reached without a final answer");
                    hit_iteration_cap = true;
                    LoopState::Done
                }
                LoopState::AwaitingModelTurn => {
                    iterations += 1;
                    let turn = self.model_turn(&messages).await?;
                    debug!(
                        iteration = iterations,
                        tool_calls = turn.tool_calls.len(),
                        "model turn completed"
                    );
                    if turn.tool_calls.is_empty() {
                        answer = turn.text.filter(|t| !t.trim().is_empty());
                        LoopState::Done
                    } else {
                        pending = turn.tool_calls;
                        LoopState::ExecutingTools
                    }
                }
                LoopState::ExecutingTools => {
                    for call in pending.drain(..) {
                        let content = match self.execute(&call, base, &mut detected).await {
                            Ok(result) => {
                                let summary = result.summary_for_llm.clone();
                                last_result = Some(result);
                                summary
                            }
                            Err(error) => {
                                warn!(tool = %call.name, error = %error, "tool call failed");
                                format!("Error: {error}")
                            }
                        };
                        let call_id = call.id.clone();
                        messages.push(ChatMessage::assistant_tool_call(call));
                        messages.push(ChatMessage::tool(call_id, content));
                    }
                    LoopState::AwaitingModelTurn
                }
                LoopState::Done => LoopState::Done,
            };
        }

        let (campaigns, total) = last_result.map_or((Vec::new(), 0), |r| (r.campaigns, r.count));
        info!(iterations, total, hit_iteration_cap, "chat turn completed");

        Ok(LoopOutcome {
            answer: answer.unwrap_or_else(|| FALLBACK_ANSWER.to_string()),
            campaigns,
            total,
            detected_filters: detected,
            iterations,
            hit_iteration_cap,
        })
    }

    fn seed_buffer(&self, message: &str, history: &[HistoryTurn]) -> Vec<ChatMessage> {
        let recent = &history[history.len().saturating_sub(MAX_HISTORY_TURNS)..];
        let mut messages = Vec::with_capacity(recent.len() + 2);
        messages.push(ChatMessage::system(self.system_prompt.clone()));
        messages.extend(recent.iter().map(HistoryTurn::to_message));
        messages.push(ChatMessage::user(message));
        messages
    }

    async fn model_turn(&self, messages: &[ChatMessage]) -> Result<ModelTurn, AgentError> {
        self.bounded("model turn", self.model.chat_turn(messages, &self.schemas))
            .await
    }

    async fn execute(
        &self,
        call: &ToolCallRequest,
        base: &ActiveFilterSet,
        detected: &mut Option<ActiveFilterSet>,
    ) -> Result<ToolResult, AgentError> {
        let args = parse_arguments(call);
        let invocation = ToolInvocation::parse(&call.name, &args)?;

        if let Some(overlay) = invocation.detected_filters() {
            let accumulated = merge(&detected.take().unwrap_or_default(), &overlay);
            *detected = Some(accumulated);
        }

        debug!(tool = %invocation.name(), "executing tool");
        self.bounded(invocation.name().as_str(), self.toolbox.run(&invocation, base))
            .await
    }

    async fn bounded<T>(
        &self,
        operation: &str,
        fut: impl Future<Output = Result<T, AgentError>>,
    ) -> Result<T, AgentError> {
        tokio::time::timeout(self.round_trip_timeout, fut)
            .await
            .map_err(|_| AgentError::Timeout {
                operation: operation.to_string(),
                secs: self.round_trip_timeout.as_secs(),
            })?
    }
}

/// Parses the raw argument payload. Anything that is not a JSON object is
/// treated as empty arguments.
fn parse_arguments(call: &ToolCallRequest) -> Value {
    if call.arguments.trim().is_empty() {
        return Value::Object(Map::new());
    }
    match serde_json::from_str::<Value>(&call.arguments) {
        Ok(value @ Value::Object(_)) => value,
        _ => {
            warn!(tool = %call.name, "malformed tool arguments, treating as empty");
            Value::Object(Map::new())
        }
    }
}
