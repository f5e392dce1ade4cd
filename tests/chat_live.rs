//! Live tests against the real provider APIs.
//!
//! Ignored by default; run with `cargo test -- --ignored` after setting
//! `ANTHROPIC_API_KEY` and/or `OPENAI_API_KEY` (a `.env` file works too).

use std::env;

use dotenvy::dotenv;
use kaiwa_llm::chat::{ChatSession, ScriptedLines};
use kaiwa_llm::config::{ClientCatalog, ProviderConfig, build_client};
use kaiwa_llm::http::reqwest::default_dyn_transport;
use kaiwa_llm::provider::BufferSink;

fn load_env_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

async fn run_one_turn(key_var: &str, model_name: &str) {
    let _ = dotenv();

    let Some(api_key) = load_env_var(key_var) else {
        eprintln!("skip live test: {key_var} missing");
        return;
    };
    let catalog = ClientCatalog::new(
        ProviderConfig::new(api_key.clone()),
        ProviderConfig::new(api_key),
    );
    let transport = default_dyn_transport().expect("transport");
    let client = build_client(&catalog, model_name, transport).expect("client");

    let mut session = ChatSession::new(client, "Answer with a single word.");
    let mut input = ScriptedLines::new(["Say hello."]);
    let mut sink = BufferSink::new();

    session
        .run(&mut input, &mut sink)
        .await
        .expect("live turn should succeed");
    assert!(!sink.text().is_empty(), "answer should not be empty");
    assert_eq!(session.history().len(), 2);
}

#[tokio::test]
#[ignore = "requires ANTHROPIC_API_KEY and network access"]
async fn anthropic_haiku_answers_a_short_prompt() {
    run_one_turn("ANTHROPIC_API_KEY", "haiku").await;
}

#[tokio::test]
#[ignore = "requires OPENAI_API_KEY and network access"]
async fn openai_gpt4_answers_a_short_prompt() {
    run_one_turn("OPENAI_API_KEY", "gpt4").await;
}
