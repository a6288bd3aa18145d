//! Orchestration-loop behaviour against scripted model turns.

mod support;

use std::sync::Arc;
use std::time::Duration;

use adscope_agent::{
    AgentError, ChatRequest, HistoryRole, HistoryTurn, ModelTurn, Orchestrator, Role,
    FALLBACK_ANSWER,
};
use adscope_core::{ActiveFilterSet, Channel, ValueProp};
use support::{answer, campaign, tool_turn, toolbox, FixedEmbedder, InMemoryStore, ScriptedModel};

fn orchestrator(model: Arc<ScriptedModel>, store: InMemoryStore) -> Orchestrator {
    let (tools, _) = toolbox(store, FixedEmbedder::new(vec![1.0, 0.0]));
    Orchestrator::new(model, tools)
}

fn instagram_store() -> InMemoryStore {
    let mut a = campaign("Alpha", Channel::Instagram);
    a.offer = Some("$150 bonus".to_string());
    a.key_value_props = vec![ValueProp::SignUpBonus];
    let b = campaign("Bravo", Channel::Instagram);
    let c = campaign("Charlie", Channel::Email);
    InMemoryStore::with_campaigns(vec![a, b, c])
}

#[tokio::test]
async fn direct_answer_finishes_in_one_round_trip() {
    let model = Arc::new(ScriptedModel::new(vec![Ok(answer("Hello there."))]));
    let agent = orchestrator(model.clone(), instagram_store());

    let outcome = agent
        .run("hi", &[], &ActiveFilterSet::default())
        .await
        .unwrap();

    assert_eq!(outcome.answer, "Hello there.");
    assert_eq!(outcome.iterations, 1);
    assert!(!outcome.hit_iteration_cap);
    assert_eq!(outcome.total, 0);
    assert!(outcome.campaigns.is_empty());
    assert_eq!(model.call_count(), 1);

    let buffer = model.last_buffer();
    assert_eq!(buffer.len(), 2);
    assert_eq!(buffer[0].role, Role::System);
    assert_eq!(buffer[1].role, Role::User);
    assert_eq!(buffer[1].content.as_deref(), Some("hi"));
}

#[tokio::test]
async fn unknown_tool_is_reported_to_the_model_and_loop_recovers() {
    let model = Arc::new(ScriptedModel::new(vec![
        Ok(tool_turn(&[("launch_rockets", "{}")])),
        Ok(answer("I could not use that tool, but here is my answer.")),
    ]));
    let agent = orchestrator(model.clone(), instagram_store());

    let outcome = agent
        .run("do something", &[], &ActiveFilterSet::default())
        .await
        .unwrap();

    assert_eq!(
        outcome.answer,
        "I could not use that tool, but here is my answer."
    );
    assert_eq!(outcome.iterations, 2);

    let buffer = model.last_buffer();
    let tool_message = buffer.last().unwrap();
    assert_eq!(tool_message.role, Role::Tool);
    assert_eq!(tool_message.tool_call_id.as_deref(), Some("call_0"));
    let content = tool_message.content.as_deref().unwrap();
    assert!(content.starts_with("Error: "), "got {content}");
    assert!(content.contains("launch_rockets"));
}

#[tokio::test]
async fn model_that_always_calls_tools_hits_the_cap_after_five_turns() {
    let model = Arc::new(ScriptedModel::always(tool_turn(&[(
        "filter_campaigns",
        r#"{"channel": ["instagram"]}"#,
    )])));
    let agent = orchestrator(model.clone(), instagram_store());

    let outcome = agent
        .run("loop forever", &[], &ActiveFilterSet::default())
        .await
        .unwrap();

    assert_eq!(model.call_count(), 5);
    assert_eq!(outcome.iterations, 5);
    assert!(outcome.hit_iteration_cap);
    assert_eq!(outcome.answer, FALLBACK_ANSWER);
    // The last tool result still reaches the caller.
    assert_eq!(outcome.total, 2);
}

#[tokio::test]
async fn configured_cap_is_honoured() {
    let model = Arc::new(ScriptedModel::always(tool_turn(&[("filter_campaigns", "{}")])));
    let agent = orchestrator(model.clone(), instagram_store()).with_max_iterations(2);

    let outcome = agent
        .run("loop", &[], &ActiveFilterSet::default())
        .await
        .unwrap();
    assert_eq!(model.call_count(), 2);
    assert!(outcome.hit_iteration_cap);
}

#[tokio::test]
async fn tool_results_feed_the_model_only_the_summary() {
    let model = Arc::new(ScriptedModel::new(vec![
        Ok(tool_turn(&[(
            "filter_campaigns",
            r#"{"channel": ["instagram"], "has_offer": true}"#,
        )])),
        Ok(answer("One Instagram campaign has an offer.")),
    ]));
    let agent = orchestrator(model.clone(), instagram_store());

    let outcome = agent
        .run("instagram offers?", &[], &ActiveFilterSet::default())
        .await
        .unwrap();

    assert_eq!(outcome.total, 1);
    assert_eq!(outcome.campaigns[0].company.as_deref(), Some("Alpha"));
    assert_eq!(
        outcome.detected_filters.and_then(|f| f.channel),
        Some(vec![Channel::Instagram])
    );

    let buffer = model.last_buffer();
    let n = buffer.len();
    assert_eq!(buffer[n - 2].role, Role::Assistant);
    assert_eq!(buffer[n - 2].tool_calls[0].name, "filter_campaigns");
    assert!(buffer[n - 2].content.is_none());
    assert_eq!(buffer[n - 1].role, Role::Tool);
    assert!(buffer[n - 1]
        .content
        .as_deref()
        .unwrap()
        .starts_with("Found 1 campaign:"));
}

#[tokio::test]
async fn malformed_arguments_are_treated_as_empty() {
    let model = Arc::new(ScriptedModel::new(vec![
        Ok(tool_turn(&[("filter_campaigns", "{channel: instagram")])),
        Ok(answer("Here is everything.")),
    ]));
    let agent = orchestrator(model.clone(), instagram_store());

    let outcome = agent
        .run("everything", &[], &ActiveFilterSet::default())
        .await
        .unwrap();

    assert_eq!(outcome.answer, "Here is everything.");
    assert_eq!(outcome.total, 3);
}

#[tokio::test]
async fn several_calls_in_one_turn_run_in_order_and_last_result_wins() {
    let model = Arc::new(ScriptedModel::new(vec![
        Ok(tool_turn(&[
            ("filter_campaigns", r#"{"channel": ["instagram"]}"#),
            ("filter_campaigns", r#"{"channel": ["email"]}"#),
        ])),
        Ok(answer("done")),
    ]));
    let agent = orchestrator(model.clone(), instagram_store());

    let outcome = agent
        .run("compare", &[], &ActiveFilterSet::default())
        .await
        .unwrap();

    assert_eq!(outcome.total, 1);
    assert_eq!(outcome.campaigns[0].company.as_deref(), Some("Charlie"));
    // Detected filters accumulate by merge, so the later channel wins.
    assert_eq!(
        outcome.detected_filters.and_then(|f| f.channel),
        Some(vec![Channel::Email])
    );

    let buffer = model.last_buffer();
    let tool_ids: Vec<&str> = buffer
        .iter()
        .filter(|m| m.role == Role::Tool)
        .filter_map(|m| m.tool_call_id.as_deref())
        .collect();
    assert_eq!(tool_ids, ["call_0", "call_1"]);
}

#[tokio::test]
async fn failing_tool_keeps_previous_result() {
    let model = Arc::new(ScriptedModel::new(vec![
        Ok(tool_turn(&[
            ("filter_campaigns", r#"{"channel": ["email"]}"#),
            ("filter_campaigns", r#"{"channel": ["carrier_pigeon"]}"#),
        ])),
        Ok(answer("ok")),
    ]));
    let agent = orchestrator(model.clone(), instagram_store());

    let outcome = agent
        .run("email", &[], &ActiveFilterSet::default())
        .await
        .unwrap();
    assert_eq!(outcome.total, 1);

    let buffer = model.last_buffer();
    let error = buffer.last().unwrap().content.as_deref().unwrap();
    assert!(error.starts_with("Error: invalid arguments for filter_campaigns"));
}

#[tokio::test]
async fn model_failure_aborts_the_loop() {
    let model = Arc::new(ScriptedModel::new(vec![Err("rate limited".to_string())]));
    let agent = orchestrator(model, instagram_store());

    let err = agent
        .run("hi", &[], &ActiveFilterSet::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AgentError::Model(ref m) if m == "rate limited"));
}

#[tokio::test]
async fn blank_model_text_yields_fallback_answer() {
    let model = Arc::new(ScriptedModel::new(vec![Ok(ModelTurn {
        text: Some("   ".to_string()),
        tool_calls: vec![],
    })]));
    let agent = orchestrator(model, instagram_store());

    let outcome = agent
        .run("hi", &[], &ActiveFilterSet::default())
        .await
        .unwrap();
    assert_eq!(outcome.answer, FALLBACK_ANSWER);
    assert!(!outcome.hit_iteration_cap);
}

#[tokio::test]
async fn base_filters_constrain_every_tool_call() {
    let model = Arc::new(ScriptedModel::new(vec![
        Ok(tool_turn(&[("filter_campaigns", "{}")])),
        Ok(answer("filtered")),
    ]));
    let agent = orchestrator(model, instagram_store());
    let base = ActiveFilterSet {
        channel: Some(vec![Channel::Email]),
        ..ActiveFilterSet::default()
    };

    let outcome = agent.run("anything", &[], &base).await.unwrap();
    assert_eq!(outcome.total, 1);
    // An empty overlay detects nothing worth echoing.
    assert!(outcome.detected_filters.is_none_or(|f| f.is_empty()));
}

#[tokio::test]
async fn history_is_replayed_and_capped() {
    let model = Arc::new(ScriptedModel::new(vec![Ok(answer("ok"))]));
    let agent = orchestrator(model.clone(), instagram_store());
    let history: Vec<HistoryTurn> = (0..25)
        .map(|i| HistoryTurn {
            role: if i % 2 == 0 {
                HistoryRole::User
            } else {
                HistoryRole::Assistant
            },
            content: format!("turn {i}"),
        })
        .collect();

    agent
        .run("latest", &history, &ActiveFilterSet::default())
        .await
        .unwrap();

    let buffer = model.last_buffer();
    assert_eq!(buffer.len(), 1 + 20 + 1);
    assert_eq!(buffer[1].content.as_deref(), Some("turn 5"));
    assert_eq!(buffer[20].content.as_deref(), Some("turn 24"));
    assert_eq!(buffer[21].content.as_deref(), Some("latest"));
}

#[tokio::test]
async fn respond_assembles_the_chat_contract() {
    let model = Arc::new(ScriptedModel::new(vec![
        Ok(tool_turn(&[("search_offers", r#"{"query": "bonus"}"#)])),
        Ok(answer("Alpha offers a $150 bonus.")),
    ]));
    let agent = orchestrator(model, instagram_store());

    let response = agent
        .respond(&ChatRequest::new("who has a bonus?"))
        .await
        .unwrap();

    assert_eq!(response.response, "Alpha offers a $150 bonus.");
    assert_eq!(response.total, 1);
    assert_eq!(response.campaigns.len(), 1);
    assert_eq!(response.suggestions.len(), 3);
    // search_offers with no filter arguments detects nothing.
    assert!(response.detected_filters.is_none());
}

#[tokio::test]
async fn respond_rejects_blank_message_before_calling_the_model() {
    let model = Arc::new(ScriptedModel::new(vec![]));
    let agent = orchestrator(model.clone(), instagram_store());

    let err = agent.respond(&ChatRequest::new("  ")).await.unwrap_err();
    assert!(err.is_validation());
    assert_eq!(model.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn slow_model_turn_times_out() {
    struct Stalled;

    #[async_trait::async_trait]
    impl adscope_agent::ChatModel for Stalled {
        async fn chat_turn(
            &self,
            _messages: &[adscope_agent::ChatMessage],
            _tools: &[adscope_agent::ToolSchema],
        ) -> Result<ModelTurn, AgentError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(ModelTurn::default())
        }
    }

    let (tools, _) = toolbox(instagram_store(), FixedEmbedder::new(vec![1.0]));
    let agent = Orchestrator::new(Arc::new(Stalled), tools)
        .with_round_trip_timeout(Duration::from_secs(30));

    let err = agent
        .run("hi", &[], &ActiveFilterSet::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AgentError::Timeout { secs: 30, .. }));
}
