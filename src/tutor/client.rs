//! Chat-completion client.
//!
//! Sends one bearer-authenticated request per call to the configured
//! endpoint and extracts the completion text. No retries; any failure is
//! returned to the caller.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::error::{Result, TutorError};
use crate::model::Settings;

const TEMPERATURE: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Raw HTTP result: status plus undecoded body.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// The single network seam shared by the chat and TTS calls.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn post_json(&self, url: &str, bearer: &str, body: &Value) -> Result<HttpResponse>;
}

pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout_secs: u64) -> Self {
        let mut builder = Client::builder();
        if timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(timeout_secs));
        }
        let client = builder.build().unwrap_or_else(|e| {
            warn!("Failed to configure HTTP client: {e}, using defaults");
            Client::new()
        });
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post_json(&self, url: &str, bearer: &str, body: &Value) -> Result<HttpResponse> {
        let resp = self
            .client
            .post(url)
            .bearer_auth(bearer)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    TutorError::Transport(format!("cannot connect to {url}"))
                } else if e.is_timeout() {
                    TutorError::Transport(format!("request to {url} timed out"))
                } else {
                    TutorError::Transport(e.to_string())
                }
            })?;
        let status = resp.status().as_u16();
        let body = resp
            .bytes()
            .await
            .map_err(|e| TutorError::Transport(format!("failed to read response body: {e}")))?;
        Ok(HttpResponse {
            status,
            body: body.to_vec(),
        })
    }
}

/// Best-effort server message: `error.message` from a JSON body, else the raw
/// body text.
pub fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(String::from))
        .unwrap_or_else(|| body.to_string())
}

/// Concatenate completion content that is either a plain string or a list of
/// content parts. Parts without text contribute nothing.
pub fn extract_text_content(content: &Value) -> String {
    match content {
        Value::String(s) => s.clone(),
        Value::Array(parts) => parts
            .iter()
            .map(|part| match part {
                Value::String(s) => s.as_str(),
                Value::Object(map) => map.get("text").and_then(Value::as_str).unwrap_or(""),
                _ => "",
            })
            .collect(),
        _ => String::new(),
    }
}

pub struct TutorClient<T: HttpTransport> {
    transport: T,
}

impl<T: HttpTransport> TutorClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn complete(&self, messages: &[ChatMessage], settings: &Settings) -> Result<String> {
        if !settings.has_api_key() {
            return Err(TutorError::MissingApiKey);
        }

        let body = json!({
            "model": settings.model,
            "temperature": TEMPERATURE,
            "messages": messages,
        });
        debug!(
            "Sending {} messages to model '{}' at {}",
            messages.len(),
            settings.model,
            settings.base_url
        );

        let resp = self
            .transport
            .post_json(&settings.base_url, &settings.api_key, &body)
            .await?;

        if !resp.is_success() {
            let message = error_message(&resp.text());
            warn!("Model endpoint returned status {}", resp.status);
            return Err(TutorError::Http {
                service: "Model",
                status: resp.status,
                message,
            });
        }

        let data: Value = serde_json::from_slice(&resp.body)
            .map_err(|e| TutorError::Transport(format!("response was not JSON: {e}")))?;
        let content = extract_text_content(&data["choices"][0]["message"]["content"]);
        if content.is_empty() {
            return Err(TutorError::EmptyResponse);
        }
        debug!("Model returned {} chars", content.len());
        Ok(content)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Transport double that replays one canned response and records calls.
    pub(crate) struct MockTransport {
        status: u16,
        body: Vec<u8>,
        failure: Option<String>,
        pub calls: AtomicUsize,
        pub last_request: Mutex<Option<(String, String, Value)>>,
    }

    impl MockTransport {
        pub(crate) fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
            Self {
                status,
                body: body.into(),
                failure: None,
                calls: AtomicUsize::new(0),
                last_request: Mutex::new(None),
            }
        }

        pub(crate) fn completion(content: Value) -> Self {
            let body = json!({ "choices": [{ "message": { "content": content } }] });
            Self::new(200, body.to_string())
        }

        /// Transport that fails before any response arrives.
        pub(crate) fn failing(message: &str) -> Self {
            Self {
                failure: Some(message.to_string()),
                ..Self::new(0, Vec::new())
            }
        }

        pub(crate) fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl HttpTransport for MockTransport {
        async fn post_json(&self, url: &str, bearer: &str, body: &Value) -> Result<HttpResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_request.lock().unwrap() =
                Some((url.to_string(), bearer.to_string(), body.clone()));
            if let Some(message) = &self.failure {
                return Err(TutorError::Transport(message.clone()));
            }
            Ok(HttpResponse {
                status: self.status,
                body: self.body.clone(),
            })
        }
    }

    pub(crate) fn keyed_settings() -> Settings {
        Settings {
            api_key: "sk-test".into(),
            ..Settings::default()
        }
    }

    fn messages() -> Vec<ChatMessage> {
        vec![ChatMessage::system("Be brief."), ChatMessage::user("Hola")]
    }

    #[tokio::test]
    async fn empty_key_never_reaches_transport() {
        for key in ["", "   "] {
            let client = TutorClient::new(MockTransport::completion(json!("hi")));
            let settings = Settings {
                api_key: key.into(),
                ..Settings::default()
            };
            let err = client.complete(&messages(), &settings).await.unwrap_err();
            assert!(matches!(err, TutorError::MissingApiKey));
            assert_eq!(client.transport().call_count(), 0);
        }
    }

    #[tokio::test]
    async fn request_carries_model_temperature_and_messages() {
        let client = TutorClient::new(MockTransport::completion(json!("Hola!")));
        let settings = keyed_settings();
        let text = client.complete(&messages(), &settings).await.unwrap();
        assert_eq!(text, "Hola!");

        let (url, bearer, body) = client.transport().last_request.lock().unwrap().clone().unwrap();
        assert_eq!(url, settings.base_url);
        assert_eq!(bearer, "sk-test");
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["temperature"], json!(0.7));
        assert!(body.to_string().contains("\"temperature\":0.7}"));
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "Hola");
    }

    #[tokio::test]
    async fn content_parts_are_concatenated() {
        let parts = json!([{ "type": "text", "text": "Hola " }, { "type": "image" }, "amigo"]);
        let client = TutorClient::new(MockTransport::completion(parts));
        let text = client.complete(&messages(), &keyed_settings()).await.unwrap();
        assert_eq!(text, "Hola amigo");
    }

    #[tokio::test]
    async fn empty_content_is_an_error() {
        let client = TutorClient::new(MockTransport::completion(json!("")));
        let err = client.complete(&messages(), &keyed_settings()).await.unwrap_err();
        assert!(matches!(err, TutorError::EmptyResponse));

        let client = TutorClient::new(MockTransport::new(200, r#"{"choices":[]}"#));
        let err = client.complete(&messages(), &keyed_settings()).await.unwrap_err();
        assert!(matches!(err, TutorError::EmptyResponse));
    }

    #[tokio::test]
    async fn http_error_uses_nested_message() {
        let body = r#"{"error":{"message":"Invalid API key"}}"#;
        let client = TutorClient::new(MockTransport::new(401, body));
        let err = client.complete(&messages(), &keyed_settings()).await.unwrap_err();
        match &err {
            TutorError::Http { status, message, .. } => {
                assert_eq!(*status, 401);
                assert_eq!(message, "Invalid API key");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("401"));
    }

    #[tokio::test]
    async fn http_error_falls_back_to_raw_body() {
        let client = TutorClient::new(MockTransport::new(502, "Bad gateway"));
        let err = client.complete(&messages(), &keyed_settings()).await.unwrap_err();
        assert_eq!(err.to_string(), "Model request failed: 502 Bad gateway");
    }

    #[tokio::test]
    async fn transport_failure_propagates_unchanged() {
        let client = TutorClient::new(MockTransport::failing("cannot connect to http://localhost:1"));
        let err = client.complete(&messages(), &keyed_settings()).await.unwrap_err();
        match err {
            TutorError::Transport(message) => assert_eq!(message, "cannot connect to http://localhost:1"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(client.transport().call_count(), 1);
    }

    #[tokio::test]
    async fn non_json_success_body_is_a_transport_error() {
        let client = TutorClient::new(MockTransport::new(200, "<html>gateway</html>"));
        let err = client.complete(&messages(), &keyed_settings()).await.unwrap_err();
        assert!(matches!(err, TutorError::Transport(ref m) if m.starts_with("response was not JSON")));
    }
}
