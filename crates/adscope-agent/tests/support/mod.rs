//! In-process stand-ins for the store, embedder and language model.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use adscope_agent::{
    AgentError, CampaignStore, ChatMessage, ChatModel, Embedder, ModelTurn, StoreError,
    ToolCallRequest, ToolSchema, Toolbox,
};
use adscope_core::{
    matches, ActiveFilterSet, Campaign, CampaignEmbedding, Channel, EmbeddingField,
};
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

pub fn campaign(company: &str, channel: Channel) -> Campaign {
    Campaign {
        id: Uuid::new_v4(),
        created_at: Utc::now(),
        company: Some(company.to_string()),
        brand: None,
        channel: Some(channel),
        primary_product: None,
        offer: None,
        incentives: vec![],
        key_value_props: vec![],
        imagery_sentiment: None,
        imagery_visual_style: None,
        imagery_primary_subject: None,
        imagery_demographics: vec![],
        campaign_text: None,
        full_campaign_text: None,
        volume: None,
        spend: None,
        capture_date: None,
        image_paths: vec![],
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

/// Which store operations should fail.
#[derive(Debug, Default, Clone, Copy)]
pub struct Failures {
    pub filter: bool,
    pub similarity: bool,
    pub text: bool,
    pub offer: bool,
}

#[derive(Default)]
pub struct InMemoryStore {
    records: Vec<(Campaign, CampaignEmbedding)>,
    failures: Failures,
    pub filter_calls: AtomicUsize,
    pub similarity_calls: AtomicUsize,
    pub text_channels: Mutex<Option<Vec<Channel>>>,
}

impl InMemoryStore {
    pub fn new(records: Vec<(Campaign, CampaignEmbedding)>) -> Self {
        Self {
            records,
            ..Self::default()
        }
    }

    pub fn with_campaigns(campaigns: Vec<Campaign>) -> Self {
        Self::new(
            campaigns
                .into_iter()
                .map(|c| (c, CampaignEmbedding::default()))
                .collect(),
        )
    }

    pub fn failing(mut self, failures: Failures) -> Self {
        self.failures = failures;
        self
    }

    fn unavailable(op: &str) -> StoreError {
        StoreError::Unavailable(format!("{op} is not available"))
    }
}

#[async_trait]
impl CampaignStore for InMemoryStore {
    async fn filter_campaigns(
        &self,
        filters: &ActiveFilterSet,
        limit: usize,
    ) -> Result<Vec<Campaign>, StoreError> {
        self.filter_calls.fetch_add(1, Ordering::SeqCst);
        if self.failures.filter {
            return Err(Self::unavailable("filter"));
        }
        Ok(self
            .records
            .iter()
            .map(|(c, _)| c)
            .filter(|c| matches(c, filters))
            .take(limit)
            .cloned()
            .collect())
    }

    /// Pushes down channel and value-prop only, like the Postgres store.
    async fn similarity_search(
        &self,
        field: EmbeddingField,
        query_embedding: &[f32],
        filters: &ActiveFilterSet,
        threshold: f32,
        limit: usize,
    ) -> Result<Vec<Campaign>, StoreError> {
        self.similarity_calls.fetch_add(1, Ordering::SeqCst);
        if self.failures.similarity {
            return Err(Self::unavailable("similarity search"));
        }
        let pushed_down = ActiveFilterSet {
            channel: filters.channel.clone(),
            value_prop: filters.value_prop.clone(),
            ..ActiveFilterSet::default()
        };
        let mut scored: Vec<(f32, Campaign)> = self
            .records
            .iter()
            .filter(|(c, _)| matches(c, &pushed_down))
            .filter_map(|(c, e)| {
                let score = cosine(e.get(field)?, query_embedding);
                (score > threshold).then(|| (score, c.clone()))
            })
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        Ok(scored.into_iter().take(limit).map(|(_, c)| c).collect())
    }

    async fn text_search(
        &self,
        query: &str,
        channels: Option<&[Channel]>,
        limit: usize,
    ) -> Result<Vec<Campaign>, StoreError> {
        *self.text_channels.lock().unwrap() = channels.map(<[Channel]>::to_vec);
        if self.failures.text {
            return Err(Self::unavailable("full-text search"));
        }
        let needle = query.to_lowercase();
        Ok(self
            .records
            .iter()
            .map(|(c, _)| c)
            .filter(|c| channels.is_none_or(|ch| c.channel.is_some_and(|x| ch.contains(&x))))
            .filter(|c| {
                c.body_text()
                    .is_some_and(|t| t.to_lowercase().contains(&needle))
            })
            .take(limit)
            .cloned()
            .collect())
    }

    async fn offer_search(
        &self,
        query: &str,
        filters: &ActiveFilterSet,
        limit: usize,
    ) -> Result<Vec<Campaign>, StoreError> {
        if self.failures.offer {
            return Err(Self::unavailable("offer search"));
        }
        let needle = query.to_lowercase();
        Ok(self
            .records
            .iter()
            .map(|(c, _)| c)
            .filter(|c| {
                c.offer
                    .as_deref()
                    .is_some_and(|o| o.to_lowercase().contains(&needle))
            })
            .filter(|c| matches(c, filters))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn get_campaign(&self, id: Uuid) -> Result<Option<Campaign>, StoreError> {
        Ok(self
            .records
            .iter()
            .find(|(c, _)| c.id == id)
            .map(|(c, _)| c.clone()))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

pub struct FixedEmbedder {
    vector: Vec<f32>,
    fail: bool,
    pub calls: AtomicUsize,
}

impl FixedEmbedder {
    pub fn new(vector: Vec<f32>) -> Self {
        Self {
            vector,
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            vector: vec![],
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Embedder for FixedEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, AgentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(AgentError::Embedding("embedding service down".to_string()));
        }
        Ok(self.vector.clone())
    }
}

/// Replays scripted turns, then repeats `repeat` (or fails) once exhausted.
pub struct ScriptedModel {
    script: Mutex<VecDeque<Result<ModelTurn, String>>>,
    repeat: Option<ModelTurn>,
    pub calls: AtomicUsize,
    pub buffers: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedModel {
    pub fn new(script: Vec<Result<ModelTurn, String>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            repeat: None,
            calls: AtomicUsize::new(0),
            buffers: Mutex::new(Vec::new()),
        }
    }

    pub fn always(turn: ModelTurn) -> Self {
        Self {
            repeat: Some(turn),
            ..Self::new(vec![])
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_buffer(&self) -> Vec<ChatMessage> {
        self.buffers.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn chat_turn(
        &self,
        messages: &[ChatMessage],
        _tools: &[ToolSchema],
    ) -> Result<ModelTurn, AgentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.buffers.lock().unwrap().push(messages.to_vec());
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Ok(turn)) => Ok(turn),
            Some(Err(message)) => Err(AgentError::Model(message)),
            None => self
                .repeat
                .clone()
                .ok_or_else(|| AgentError::Model("script exhausted".to_string())),
        }
    }
}

pub fn answer(text: &str) -> ModelTurn {
    ModelTurn {
        text: Some(text.to_string()),
        tool_calls: vec![],
    }
}

pub fn tool_turn(calls: &[(&str, &str)]) -> ModelTurn {
    ModelTurn {
        text: None,
        tool_calls: calls
            .iter()
            .enumerate()
            .map(|(i, (name, args))| ToolCallRequest {
                id: format!("call_{i}"),
                name: (*name).to_string(),
                arguments: (*args).to_string(),
            })
            .collect(),
    }
}

pub fn toolbox(store: InMemoryStore, embedder: FixedEmbedder) -> (Toolbox, Arc<InMemoryStore>) {
    let store = Arc::new(store);
    let toolbox = Toolbox::new(store.clone(), Arc::new(embedder));
    (toolbox, store)
}
