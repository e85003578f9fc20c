//! Prompt construction and completion handling for the Q&A service

mod common;

use common::RecordingBackend;
use serde_json::json;
use web_scraper_qa::config::LlmSettings;
use web_scraper_qa::error::AppError;
use web_scraper_qa::llm::{ChatMessage, CompletionBackend, CompletionOptions, OpenAiClient, Role};
use web_scraper_qa::qa::{
    AskOptions, CONTEXT_TRUNCATION_MARKER, MAX_CONTEXT_CHARS, QaService, SUMMARY_MODEL,
};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn embedded_context(prompt: &str) -> &str {
    let start = prompt.find("Website Content:\n").unwrap() + "Website Content:\n".len();
    let end = prompt.find("\n\nQuestion: ").unwrap();
    &prompt[start..end]
}

#[tokio::test]
async fn test_long_context_is_truncated() {
    let backend = RecordingBackend::replying("  The answer.  \n", 321);
    let qa = backend.service();

    let context = "a".repeat(15_000);
    let result = qa
        .answer_question(&context, "What is it?", &AskOptions::default())
        .await
        .unwrap();

    assert_eq!(result.answer, "The answer.");
    assert_eq!(result.tokens_used, 321);
    assert_eq!(result.question, "What is it?");
    assert_eq!(result.model, "gpt-3.5-turbo");

    let (messages, options) = backend.last_call();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, Role::System);
    assert_eq!(messages[1].role, Role::User);

    let embedded = embedded_context(&messages[1].content);
    let expected = format!("{}{}", "a".repeat(MAX_CONTEXT_CHARS), CONTEXT_TRUNCATION_MARKER);
    assert_eq!(embedded, expected);

    assert_eq!(options.max_tokens, 500);
    assert_eq!(options.temperature, 0.7);
}

#[tokio::test]
async fn test_short_context_is_embedded_verbatim() {
    let backend = RecordingBackend::replying("yes", 10);
    let qa = backend.service();

    let options = AskOptions {
        model: "gpt-4".to_string(),
        max_tokens: 64,
    };
    let result = qa
        .answer_question("Rust is a language.", "Is it?", &options)
        .await
        .unwrap();
    assert_eq!(result.model, "gpt-4");

    let (messages, sent) = backend.last_call();
    assert_eq!(embedded_context(&messages[1].content), "Rust is a language.");
    assert!(messages[1].content.ends_with("Question: Is it?\n\nAnswer:"));
    assert_eq!(sent.model, "gpt-4");
    assert_eq!(sent.max_tokens, 64);
}

#[tokio::test]
async fn test_summary_uses_fixed_settings() {
    let backend = RecordingBackend::replying("\nA short summary.\n", 42);
    let qa = backend.service();

    let content = "b".repeat(8_000);
    let summary = qa.summarize_content(&content, 150).await.unwrap();
    assert_eq!(summary, "A short summary.");

    let (messages, options) = backend.last_call();
    let prompt = &messages[1].content;
    assert!(prompt.contains("in approximately 150 words:"));
    assert!(prompt.contains(&format!("\n\n{}\n\nSummary:", content)));
    assert!(!prompt.contains(&format!("{}...", content)));

    assert_eq!(options.model, SUMMARY_MODEL);
    assert_eq!(options.max_tokens, 300);
    assert_eq!(options.temperature, 0.5);
}

#[tokio::test]
async fn test_long_summary_input_is_truncated() {
    let backend = RecordingBackend::replying("ok", 1);
    let qa = backend.service();

    let content = "c".repeat(9_000);
    qa.summarize_content(&content, 200).await.unwrap();

    let (messages, _) = backend.last_call();
    let expected = format!("\n\n{}...\n\nSummary:", "c".repeat(8_000));
    assert!(messages[1].content.ends_with(&expected));
}

#[tokio::test]
async fn test_backend_failures_are_wrapped() {
    let backend = RecordingBackend::failing("rate limited");
    let qa = backend.service();

    let err = qa
        .answer_question("ctx", "q", &AskOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(&err, AppError::CompletionError(msg) if msg == "rate limited"));
    assert_eq!(err.to_string(), "Error calling OpenAI API: rate limited");

    let err = qa.summarize_content("ctx", 200).await.unwrap_err();
    assert!(matches!(&err, AppError::SummarizationError(msg) if msg == "rate limited"));
    assert_eq!(backend.call_count(), 2);
}

#[test]
fn test_missing_credential_before_any_request() {
    let result = QaService::with_resolver(None, &LlmSettings::default(), |_| None);
    assert!(matches!(result, Err(AppError::MissingCredential)));
}

fn settings_for(server: &MockServer) -> LlmSettings {
    LlmSettings {
        base_url: format!("{}/v1", server.uri()),
        ..LlmSettings::default()
    }
}

#[tokio::test]
async fn test_openai_client_request_and_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "gpt-3.5-turbo",
            "max_tokens": 500,
            "messages": [
                { "role": "system" },
                { "role": "user" }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "role": "assistant", "content": " Paris. " } }],
            "usage": { "prompt_tokens": 90, "completion_tokens": 3, "total_tokens": 93 }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let qa = QaService::with_resolver(Some("sk-test"), &settings_for(&mock_server), |_| None)
        .unwrap();
    let result = qa
        .answer_question(
            "France's capital is Paris.",
            "What is the capital?",
            &AskOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(result.answer, "Paris.");
    assert_eq!(result.tokens_used, 93);
}

#[tokio::test]
async fn test_openai_client_surfaces_http_errors() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": { "message": "Incorrect API key provided" }
        })))
        .mount(&mock_server)
        .await;

    let client = OpenAiClient::new("sk-bad".to_string(), &settings_for(&mock_server));
    let options = CompletionOptions {
        model: "gpt-3.5-turbo".to_string(),
        max_tokens: 10,
        temperature: 0.7,
    };
    let err = client
        .complete(&[ChatMessage::user("hi")], &options)
        .await
        .unwrap_err();

    match err {
        AppError::LlmError(msg) => {
            assert!(msg.contains("401"), "message was {msg}");
            assert!(msg.contains("Incorrect API key provided"));
        }
        other => panic!("expected LlmError, got {other:?}"),
    }
}

#[tokio::test]
async fn test_openai_client_rejects_empty_choices() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [],
            "usage": { "total_tokens": 0 }
        })))
        .mount(&mock_server)
        .await;

    let qa = QaService::with_resolver(Some("sk-test"), &settings_for(&mock_server), |_| None)
        .unwrap();
    let err = qa.summarize_content("text", 200).await.unwrap_err();
    assert!(matches!(err, AppError::SummarizationError(msg) if msg.contains("Invalid response format")));
}
