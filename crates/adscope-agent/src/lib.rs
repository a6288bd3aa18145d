//! Conversational campaign search for adscope.
//!
//! A user utterance goes through a bounded tool-calling loop: the language
//! model picks among four search tools, each tool queries the campaign store
//! through the [`CampaignStore`] adapter, and the model only ever sees a capped
//! text summary of the results. Collaborators (store, embedder, model) are
//! injected as trait objects.

pub mod chat;
pub mod embedder;
pub mod error;
pub mod llm;
pub mod orchestrator;
pub mod prompt;
pub mod response;
pub mod store;
pub mod tools;

pub use chat::{ChatRequest, ChatResponse, HistoryRole, HistoryTurn};
pub use embedder::{Embedder, OpenAiEmbedder};
pub use error::{AgentError, StoreError};
pub use llm::{ChatMessage, ChatModel, ModelTurn, OpenAiChatClient, Role, ToolCallRequest, ToolSchema};
pub use orchestrator::{LoopOutcome, LoopState, Orchestrator, DEFAULT_MAX_ITERATIONS, FALLBACK_ANSWER};
pub use response::{assemble_response, suggestions};
pub use store::{CampaignStore, PgCampaignStore};
pub use tools::{build_tool_result, ToolInvocation, ToolName, ToolResult, Toolbox};
