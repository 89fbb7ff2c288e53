/// Integration tests with a mocked Gemini endpoint
/// Exercises the full analysis round-trip without hitting the real service
mod common;

use common::{high_risk_tx1, test_config, ONE_TX_INPUT};
use fraudguard_api::errors::AppError;
use fraudguard_api::gateway::AnalysisGateway;
use fraudguard_api::gemini_client::GeminiClient;
use fraudguard_api::models::{RecommendedAction, RiskLevel};
use fraudguard_api::prompt::PROMPT_PREFIX;
use fraudguard_api::validator::parse_input;
use std::sync::Arc;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GENERATE_PATH: &str = "/v1beta/models/gemini-2.5-flash:generateContent";

fn envelope(text: &str) -> serde_json::Value {
    serde_json::json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }]
    })
}

fn gateway_for(server: &MockServer, api_key: Option<&str>) -> AnalysisGateway {
    let config = test_config(&server.uri(), api_key);
    let client = GeminiClient::new(&config).expect("client builds");
    AnalysisGateway::new(config, Arc::new(client))
}

#[tokio::test]
async fn test_successful_analysis_round_trip() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_partial_json(serde_json::json!({
            "generationConfig": {"responseMimeType": "application/json"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(&high_risk_tx1().to_string())))
        .expect(1)
        .mount(&mock_server)
        .await;

    let gateway = gateway_for(&mock_server, Some("test-key"));
    let input = parse_input(ONE_TX_INPUT).unwrap();
    let output = gateway.analyze(&input).await.unwrap();

    assert_eq!(output.overall_assessment.risk_level, RiskLevel::High);
    assert_eq!(output.transaction_findings.len(), 1);
    assert_eq!(
        output.transaction_findings[0].recommended_action,
        RecommendedAction::ConsiderSarStr
    );
}

#[tokio::test]
async fn test_request_carries_system_instruction_and_prompt() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(&high_risk_tx1().to_string())))
        .mount(&mock_server)
        .await;

    let gateway = gateway_for(&mock_server, Some("test-key"));
    gateway.analyze(&parse_input(ONE_TX_INPUT).unwrap()).await.unwrap();

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();

    let system = body["systemInstruction"]["parts"][0]["text"].as_str().unwrap();
    assert!(system.starts_with("You are FraudGuard AI"));

    let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
    assert!(prompt.starts_with(PROMPT_PREFIX));
    assert!(prompt.contains("\"tx_id\": \"TX-1\""));
    assert_eq!(body["contents"][0]["role"], "user");
}

#[tokio::test]
async fn test_missing_credential_performs_no_network_io() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope("{}")))
        .expect(0)
        .mount(&mock_server)
        .await;

    let gateway = gateway_for(&mock_server, None);
    let err = gateway
        .analyze(&parse_input(ONE_TX_INPUT).unwrap())
        .await
        .unwrap_err();

    assert_eq!(err, AppError::CredentialMissing);
}

#[tokio::test]
async fn test_not_json_reply_is_malformed_json() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope("not json")))
        .mount(&mock_server)
        .await;

    let gateway = gateway_for(&mock_server, Some("test-key"));
    let input = parse_input(ONE_TX_INPUT).unwrap();
    let before = input.clone();
    let err = gateway.analyze(&input).await.unwrap_err();

    assert!(matches!(err, AppError::MalformedJson(_)));
    assert_eq!(input, before);
}

#[tokio::test]
async fn test_no_candidates_is_empty_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        })))
        .mount(&mock_server)
        .await;

    let gateway = gateway_for(&mock_server, Some("test-key"));
    let err = gateway
        .analyze(&parse_input(ONE_TX_INPUT).unwrap())
        .await
        .unwrap_err();

    assert_eq!(err, AppError::EmptyResponse);
}

#[tokio::test]
async fn test_missing_section_is_rejected_wholesale() {
    let mock_server = MockServer::start().await;

    let mut reply = high_risk_tx1();
    reply.as_object_mut().unwrap().remove("explainability");

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(&reply.to_string())))
        .mount(&mock_server)
        .await;

    let gateway = gateway_for(&mock_server, Some("test-key"));
    let err = gateway
        .analyze(&parse_input(ONE_TX_INPUT).unwrap())
        .await
        .unwrap_err();

    assert_eq!(
        err,
        AppError::MissingRequiredField("explainability".to_string())
    );
}

#[tokio::test]
async fn test_endpoint_error_is_transport_error_without_retry() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let gateway = gateway_for(&mock_server, Some("test-key"));
    let err = gateway
        .analyze(&parse_input(ONE_TX_INPUT).unwrap())
        .await
        .unwrap_err();

    match err {
        AppError::TransportError(msg) => assert!(msg.contains("500")),
        other => panic!("Expected TransportError, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unreachable_endpoint_is_transport_error() {
    // Nothing listens on the discard port
    let config = test_config("http://127.0.0.1:9", Some("test-key"));
    let client = GeminiClient::new(&config).unwrap();
    let gateway = AnalysisGateway::new(config, Arc::new(client));

    let err = gateway
        .analyze(&parse_input(ONE_TX_INPUT).unwrap())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::TransportError(_)));
}
