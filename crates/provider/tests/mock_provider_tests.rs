//! Mock Provider Tests
//!
//! Tests using mockall for the Provider trait to verify
//! that the trait can be mocked and consumed through a trait object.

use async_trait::async_trait;
use mockall::mock;
use selfcall_provider::{ChatParams, ChatResponse, Message, Provider, ProviderError, Usage};

mock! {
    pub Provider {}

    #[async_trait]
    impl Provider for Provider {
        async fn chat(&self, params: ChatParams) -> Result<ChatResponse, ProviderError>;
        fn default_model(&self) -> String;
        fn is_configured(&self) -> bool;
    }
}

#[tokio::test]
async fn test_mock_provider_chat_returns_success() {
    let mut mock = MockProvider::new();

    mock.expect_chat()
        .times(1)
        .returning(|_| Ok(ChatResponse::text("Hello from mock!")));

    let response = mock.chat(ChatParams::default()).await.unwrap();

    assert_eq!(response.content, Some("Hello from mock!".to_string()));
    assert_eq!(response.text_content(), Some("Hello from mock!"));
}

#[tokio::test]
async fn test_mock_provider_chat_returns_error() {
    let mut mock = MockProvider::new();

    mock.expect_chat()
        .times(1)
        .returning(|_| Err(ProviderError::Api("Mock API error".to_string())));

    let result = mock.chat(ChatParams::default()).await;

    match result {
        Err(ProviderError::Api(msg)) => assert_eq!(msg, "Mock API error"),
        _ => panic!("Expected Api error"),
    }
}

#[tokio::test]
async fn test_mock_provider_sees_persona_messages() {
    let mut mock = MockProvider::new();

    mock.expect_chat()
        .times(1)
        .withf(|params| {
            params.messages.len() == 2
                && params.messages[0].role == "system"
                && params.messages[1].role == "user"
                && params.model == "test-model"
        })
        .returning(|_| {
            Ok(ChatResponse {
                content: Some("1. Book venue".to_string()),
                finish_reason: "stop".to_string(),
                usage: Usage {
                    prompt_tokens: 10,
                    completion_tokens: 5,
                    total_tokens: 15,
                },
            })
        });

    let params = ChatParams {
        model: "test-model".to_string(),
        messages: vec![
            Message::system("You are the planner"),
            Message::user("Goal: Plan a 3-day offsite"),
        ],
        max_tokens: 100,
        temperature: 0.5,
    };

    let response = mock.chat(params).await.unwrap();
    assert_eq!(response.usage.total_tokens, 15);
}

#[test]
fn test_mock_provider_default_model() {
    let mut mock = MockProvider::new();

    mock.expect_default_model()
        .times(1)
        .returning(|| "mock-model-v1".to_string());

    assert_eq!(mock.default_model(), "mock-model-v1");
}

#[test]
fn test_mock_provider_is_configured() {
    let mut mock = MockProvider::new();
    mock.expect_is_configured().times(1).returning(|| false);
    assert!(!mock.is_configured());
}

#[tokio::test]
async fn test_mock_provider_multiple_calls() {
    let mut mock = MockProvider::new();

    mock.expect_chat().times(3).returning(|params| {
        let content = params
            .messages
            .last()
            .and_then(|m| m.content.clone())
            .unwrap_or_default();
        Ok(ChatResponse::text(format!("Echo: {}", content)))
    });

    for i in 0..3 {
        let params = ChatParams::for_model("test", vec![Message::user(format!("Cycle {}", i))]);
        let response = mock.chat(params).await.unwrap();
        assert!(response
            .content
            .as_ref()
            .unwrap()
            .contains(&format!("Cycle {}", i)));
    }
}

#[tokio::test]
async fn test_mock_provider_chat_rate_limited() {
    let mut mock = MockProvider::new();

    mock.expect_chat()
        .times(1)
        .returning(|_| Err(ProviderError::RateLimited));

    let result = mock.chat(ChatParams::default()).await;
    assert!(matches!(result, Err(ProviderError::RateLimited)));
}

#[tokio::test]
async fn test_mock_provider_json_error() {
    let mut mock = MockProvider::new();

    mock.expect_chat().times(1).returning(|_| {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        Err(ProviderError::Json(json_err))
    });

    let result = mock.chat(ChatParams::default()).await;
    assert!(matches!(result, Err(ProviderError::Json(_))));
}

// A consumer that holds the provider behind a trait object
struct ProviderConsumer {
    provider: Box<dyn Provider>,
}

impl ProviderConsumer {
    async fn ask(&self, message: &str) -> Result<String, ProviderError> {
        let params = ChatParams::for_model("test-model", vec![Message::user(message)]);
        let response = self.provider.chat(params).await?;
        Ok(response.content.unwrap_or_default())
    }
}

#[tokio::test]
async fn test_mock_provider_in_consumer() {
    let mut mock = MockProvider::new();

    mock.expect_chat()
        .times(1)
        .returning(|_| Ok(ChatResponse::text("Processed!")));

    let consumer = ProviderConsumer {
        provider: Box::new(mock),
    };

    assert_eq!(consumer.ask("Hello").await.unwrap(), "Processed!");
}
