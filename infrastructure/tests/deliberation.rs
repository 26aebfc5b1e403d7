//! End-to-end runs of the orchestrator against the real adapters, with the
//! provider backends served by wiremock.

use roundtable_application::{
    CancelOutcome, CancelSessionUseCase, DeliberationParams, GetSessionUseCase, RetryPolicy,
    RunDeliberationUseCase, SessionStore,
};
use roundtable_domain::{
    Agent, AgentSnapshot, ProviderKind, ProviderProfile, Session, SessionId, SessionStatus,
};
use roundtable_infrastructure::{
    HttpProviderClient, HttpProviderConfig, InMemorySessionStore, JsonFileSessionStore,
    JsonlConversationLogger, StoreRecords,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mock_backends() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains("facilitator closing"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content":
                "```json\n[\"Pilot the four-day week\", \"Measure output\", \"Report in Q3\"]\n```"}}]
        })))
        .with_priority(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "We should try it for one quarter."}}]
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [{"type": "text", "text": "Only if support hours stay covered."}]
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/broken/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"message": "invalid api key"}
        })))
        .mount(&server)
        .await;

    server
}

fn default_profile(server: &MockServer) -> ProviderProfile {
    ProviderProfile::new(ProviderKind::OpenAi, "sk-default")
        .with_endpoint(format!("{}/v1/chat/completions", server.uri()))
}

fn records(server: &MockServer, third_agent_broken: bool) -> StoreRecords {
    let mut snapshots = vec![
        AgentSnapshot::new("optimist", "Optimist"),
        AgentSnapshot::new("skeptic", "Skeptic"),
    ];
    let mut records = StoreRecords::default()
        .with_agent(Agent::new("optimist", "Optimist", "You see the upside."))
        .with_agent(
            Agent::new("skeptic", "Skeptic", "You look for risks.")
                .with_provider("claude")
                .with_max_tokens(300),
        )
        .with_provider(
            "claude",
            ProviderProfile::new(ProviderKind::Anthropic, "sk-ant")
                .with_endpoint(format!("{}/v1/messages", server.uri())),
        );

    if third_agent_broken {
        snapshots.push(AgentSnapshot::new("accountant", "Accountant"));
        records = records
            .with_agent(Agent::new("accountant", "Accountant", "You count costs.").with_provider("broken"))
            .with_provider(
                "broken",
                ProviderProfile::new(ProviderKind::Custom, "sk-bad")
                    .with_endpoint(format!("{}/broken/v1/chat/completions", server.uri()))
                    .with_model("local"),
            );
    }

    records.with_session(
        Session::new("weekly", "Should we adopt a four-day week?", snapshots, 2)
            .with_objective("Decide whether to run a pilot"),
    )
}

fn http_client() -> Arc<HttpProviderClient> {
    Arc::new(
        HttpProviderClient::new(HttpProviderConfig {
            timeout: Duration::from_secs(5),
            default_max_tokens: 1024,
        })
        .unwrap(),
    )
}

fn params() -> DeliberationParams {
    DeliberationParams::default().with_retry(RetryPolicy::none())
}

#[tokio::test]
async fn json_file_store_run_completes_and_persists() {
    let server = mock_backends().await;
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonFileSessionStore::new(dir.path().join("roundtable.json")));
    store.save(records(&server, false)).await.unwrap();
    let log_path = dir.path().join("events.jsonl");
    let logger = Arc::new(JsonlConversationLogger::new(&log_path).unwrap());
    let id = SessionId::new("weekly");

    let outcome = RunDeliberationUseCase::new(http_client(), Arc::clone(&store), default_profile(&server))
        .with_params(params())
        .with_logger(logger)
        .execute(&id)
        .await
        .unwrap();

    assert_eq!(outcome.status, SessionStatus::Completed);
    assert_eq!(outcome.turns_recorded, 4);
    assert!(!outcome.is_partial());

    let reopened = JsonFileSessionStore::new(store.path().to_path_buf());
    let session = reopened.get_session(&id).await.unwrap();
    assert_eq!(session.status, SessionStatus::Completed);
    assert_eq!(session.current_round, 2);
    assert_eq!(session.transcript[0].agent_name, "Optimist");
    assert_eq!(session.transcript[1].content, "Only if support hours stay covered.");
    assert_eq!(
        session.action_items,
        vec!["Pilot the four-day week", "Measure output", "Report in Q3"]
    );

    let log = std::fs::read_to_string(&log_path).unwrap();
    let types: Vec<String> = log
        .lines()
        .map(|line| serde_json::from_str::<serde_json::Value>(line).unwrap()["type"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(types.first().map(String::as_str), Some("session_started"));
    assert_eq!(types.iter().filter(|t| *t == "turn_appended").count(), 4);
    assert_eq!(types.last().map(String::as_str), Some("session_completed"));
}

#[tokio::test]
async fn failing_agent_is_skipped_and_session_still_completes() {
    let server = mock_backends().await;
    let store = Arc::new(InMemorySessionStore::new(records(&server, true)));
    let id = SessionId::new("weekly");

    let outcome = RunDeliberationUseCase::new(http_client(), Arc::clone(&store), default_profile(&server))
        .with_params(params())
        .execute(&id)
        .await
        .unwrap();

    assert_eq!(outcome.status, SessionStatus::Completed);
    assert_eq!(outcome.turns_recorded, 4);
    assert_eq!(outcome.expected_turns, 6);

    let projection = GetSessionUseCase::new(Arc::clone(&store))
        .execute(&id)
        .await
        .unwrap();
    assert!(projection.is_partial());
    assert!(projection.transcript.iter().all(|t| t.agent_name != "Accountant"));
    assert_eq!(projection.action_items.len(), 3);
}

#[tokio::test]
async fn cancel_after_completion_is_a_no_op() {
    let server = mock_backends().await;
    let store = Arc::new(InMemorySessionStore::new(records(&server, false)));
    let id = SessionId::new("weekly");

    RunDeliberationUseCase::new(http_client(), Arc::clone(&store), default_profile(&server))
        .with_params(params())
        .execute(&id)
        .await
        .unwrap();

    let outcome = CancelSessionUseCase::new(Arc::clone(&store))
        .execute(&id)
        .await
        .unwrap();
    assert_eq!(outcome, CancelOutcome::NotRunning(SessionStatus::Completed));
    assert_eq!(
        store.get_session(&id).await.unwrap().status,
        SessionStatus::Completed
    );
}
