use secrecy::SecretString;
use stride_core::config::InsightConfig;
use stride_core::insight::{EMPTY_RESPONSE_FALLBACK, ERROR_FALLBACK};
use stride_core::{
    daily_insight, Gender, GeminiClient, InsightGenerator, InsightRequest, UserProfile,
};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GENERATE_PATH: &str = "/v1beta/models/gemini-2.5-flash:generateContent";

fn request() -> InsightRequest {
    InsightRequest {
        steps: 10_500,
        calories: 536,
        profile: UserProfile {
            name: "Alex".into(),
            age: 30,
            weight: 70.0,
            height: 170.0,
            gender: Gender::Male,
            daily_step_goal: 10_000,
        },
    }
}

fn client(server: &MockServer, timeout_ms: u64) -> GeminiClient {
    let config = InsightConfig {
        base_url: format!("{}/", server.uri()),
        timeout_ms,
        ..InsightConfig::default()
    };
    GeminiClient::new(&config, SecretString::from("sekrit".to_string())).expect("client")
}

#[tokio::test]
async fn generate_sends_key_and_prompt() {
    let server = MockServer::start().await;
    let body = serde_json::json!({
        "candidates": [{"content": {"parts": [{"text": "Goal smashed! 🎉"}]}}]
    });
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(header("x-goog-api-key", "sekrit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let text = client(&server, 5_000).generate(&request()).await.expect("text");
    assert_eq!(text, "Goal smashed! 🎉");

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    let sent: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
    let prompt = sent["contents"][0]["parts"][0]["text"].as_str().unwrap();
    assert!(prompt.contains("Steps: 10500 / Goal: 10000"));
    assert!(prompt.contains("Calories Burned: 536"));
}

#[tokio::test]
async fn server_error_falls_back() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let client = client(&server, 5_000);
    assert!(client.generate(&request()).await.is_err());
    assert_eq!(daily_insight(&client, &request()).await, ERROR_FALLBACK);
}

#[tokio::test]
async fn empty_candidates_fall_back() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"candidates": []})),
        )
        .mount(&server)
        .await;

    let message = daily_insight(&client(&server, 5_000), &request()).await;
    assert_eq!(message, EMPTY_RESPONSE_FALLBACK);
}

#[tokio::test]
async fn timeout_falls_back() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"candidates": []}))
                .set_delay(std::time::Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let message = daily_insight(&client(&server, 50), &request()).await;
    assert_eq!(message, ERROR_FALLBACK);
}

#[tokio::test]
async fn unreachable_service_falls_back() {
    let config = InsightConfig {
        base_url: "http://127.0.0.1:9".into(),
        timeout_ms: 1_000,
        ..InsightConfig::default()
    };
    let client = GeminiClient::new(&config, SecretString::from("k".to_string())).unwrap();
    assert_eq!(daily_insight(&client, &request()).await, ERROR_FALLBACK);
}
