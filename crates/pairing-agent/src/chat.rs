use std::time::Duration;

use reqwest::{header, Client};

use crate::runner::Completion;
use crate::types::{ChatMessage, ChatRequest, ChatResponse};
use crate::{AgentError, Result};

// ─── ChatCompletions ──────────────────────────────────────────────────────

/// An OpenAI-compatible `chat/completions` endpoint.
///
/// With `azure_api_version` set, requests go to the Azure OpenAI deployment
/// named by `model` and authenticate with the `api-key` header. Otherwise the
/// model is sent in the body and the key as a bearer token.
#[derive(Clone)]
pub struct ChatCompletions {
    http_client: Client,
    base_url: String,
    model: String,
    api_key: String,
    azure_api_version: Option<String>,
}

impl ChatCompletions {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: api_key.into(),
            azure_api_version: None,
        })
    }

    pub fn with_azure_api_version(mut self, version: impl Into<String>) -> Self {
        self.azure_api_version = Some(version.into());
        self
    }

    pub fn endpoint(&self) -> String {
        match &self.azure_api_version {
            Some(v) => format!(
                "{}/openai/deployments/{}/chat/completions?api-version={}",
                self.base_url, self.model, v
            ),
            None => format!("{}/chat/completions", self.base_url),
        }
    }

    async fn chat(&self, system_prompt: &str, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: self
                .azure_api_version
                .is_none()
                .then(|| self.model.clone()),
            messages: vec![ChatMessage::system(system_prompt), ChatMessage::user(prompt)],
        };

        let builder = self.http_client.post(self.endpoint()).json(&request);
        let builder = if self.azure_api_version.is_some() {
            builder.header("api-key", &self.api_key)
        } else {
            builder.header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
        };

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response.json().await?;
        if let Some(usage) = &parsed.usage {
            tracing::debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "chat completion usage"
            );
        }
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or(AgentError::EmptyResponse)?;
        let finish_reason = choice.finish_reason.as_deref().unwrap_or("unknown");
        match choice.message.content.filter(|text| !text.trim().is_empty()) {
            Some(text) => {
                tracing::debug!(finish_reason, "chat completion finished");
                Ok(text)
            }
            None => {
                tracing::warn!(finish_reason, "chat completion returned no content");
                Err(AgentError::EmptyResponse)
            }
        }
    }
}

impl Completion for ChatCompletions {
    async fn complete(&self, system_prompt: &str, prompt: &str) -> Result<String> {
        self.chat(system_prompt, prompt).await
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    const REPLY: &str = r#"{"choices":[{"message":{"role":"assistant","content":"[{\"mentor\":\"a\"}]"},"finish_reason":"stop"}],"usage":{"prompt_tokens":10,"completion_tokens":5}}"#;

    #[tokio::test]
    async fn openai_style_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "model": "gpt-4o",
                "messages": [
                    {"role": "system", "content": "sys"},
                    {"role": "user", "content": "batch"}
                ]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(REPLY)
            .create_async()
            .await;

        let client =
            ChatCompletions::new(server.url(), "gpt-4o", "sk-test", Duration::from_secs(5)).unwrap();
        let text = client.complete("sys", "batch").await.unwrap();
        assert_eq!(text, r#"[{"mentor":"a"}]"#);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn azure_style_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/openai/deployments/gpt-4-32k/chat/completions")
            .match_query(Matcher::UrlEncoded("api-version".into(), "2023-05-15".into()))
            .match_header("api-key", "azure-key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(REPLY)
            .create_async()
            .await;

        let client = ChatCompletions::new(
            format!("{}/", server.url()),
            "gpt-4-32k",
            "azure-key",
            Duration::from_secs(5),
        )
        .unwrap()
        .with_azure_api_version("2023-05-15");
        client.complete("sys", "batch").await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn error_status_carries_body() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/chat/completions")
            .with_status(429)
            .with_body("rate limited")
            .create_async()
            .await;
        let client = ChatCompletions::new(server.url(), "m", "k", Duration::from_secs(5)).unwrap();
        match client.complete("s", "p").await.unwrap_err() {
            AgentError::Api { status, body } => {
                assert_eq!(status, 429);
                assert_eq!(body, "rate limited");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_choices_are_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[]}"#)
            .create_async()
            .await;
        let client = ChatCompletions::new(server.url(), "m", "k", Duration::from_secs(5)).unwrap();
        assert!(matches!(
            client.complete("s", "p").await.unwrap_err(),
            AgentError::EmptyResponse
        ));
    }

    #[tokio::test]
    async fn filtered_choice_without_content_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"choices":[{"message":{"role":"assistant","content":null},"finish_reason":"content_filter"}]}"#,
            )
            .create_async()
            .await;
        let client = ChatCompletions::new(server.url(), "m", "k", Duration::from_secs(5)).unwrap();
        assert!(matches!(
            client.complete("s", "p").await.unwrap_err(),
            AgentError::EmptyResponse
        ));
    }
}
