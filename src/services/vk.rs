//! VK API client implementing the messaging gateway
//!
//! Calls are form-encoded POSTs to `{api_url}{method}`; every response is
//! either `{"response": ...}` or `{"error": {"error_code", "error_msg"}}`.

use std::time::Duration;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::config::BotConfig;
use crate::services::gateway::MessagingGateway;
use crate::services::keyboards::Keyboard;
use crate::utils::errors::{CourierHubError, GatewayError, Result};
use crate::utils::logging::log_api_error;

/// Peer ids of group chats start here
pub const CHAT_PEER_OFFSET: i64 = 2_000_000_000;

#[derive(Debug, Deserialize)]
struct VkEnvelope {
    response: Option<Value>,
    error: Option<VkApiError>,
}

#[derive(Debug, Deserialize)]
struct VkApiError {
    error_code: i64,
    error_msg: String,
}

#[derive(Clone)]
#[derive(Debug)]
pub struct VkGateway {
    client: Client,
    config: BotConfig,
}

impl VkGateway {
    pub fn new(config: BotConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("CourierHub/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(CourierHubError::Http)?;

        Ok(Self { client, config })
    }

    /// Invoke an API method and unwrap the response envelope
    pub async fn call(&self, method: &str, params: &[(&str, String)]) -> Result<Value> {
        if self.config.token.is_empty() {
            return Err(GatewayError::NotConfigured("bot.token is empty".to_string()).into());
        }

        let url = url::Url::parse(&self.config.api_url)?.join(method)?;
        let mut form: Vec<(&str, String)> = params.to_vec();
        form.push(("access_token", self.config.token.clone()));
        form.push(("v", self.config.api_version.clone()));

        debug!(method = method, "Calling VK API");

        let envelope: VkEnvelope = self
            .client
            .post(url)
            .form(&form)
            .send()
            .await?
            .json()
            .await?;

        if let Some(error) = envelope.error {
            log_api_error(method, &error.error_msg, Some(&format!("code {}", error.error_code)));
            return Err(GatewayError::Api {
                code: error.error_code,
                message: error.error_msg,
            }
            .into());
        }

        envelope
            .response
            .ok_or_else(|| GatewayError::InvalidResponse(format!("{} returned no response", method)).into())
    }

    fn random_id() -> String {
        rand::random::<i32>().to_string()
    }
}

/// Reference of the first sent message in a `messages.send` reply with `peer_ids`
fn sent_message_reference(response: &Value) -> Option<i64> {
    match response {
        Value::Array(items) => items.first().and_then(|item| {
            item.get("conversation_message_id")
                .and_then(Value::as_i64)
                .or_else(|| item.get("message_id").and_then(Value::as_i64))
        }),
        other => other.as_i64(),
    }
}

#[async_trait]
impl MessagingGateway for VkGateway {
    async fn send_message(&self, peer_id: i64, text: &str, keyboard: Option<&Keyboard>) -> Result<i64> {
        let mut params = vec![
            ("peer_ids", peer_id.to_string()),
            ("message", text.to_string()),
            ("random_id", Self::random_id()),
        ];
        if let Some(keyboard) = keyboard {
            params.push(("keyboard", keyboard.to_json()));
        }

        let response = self.call("messages.send", &params).await?;
        sent_message_reference(&response)
            .ok_or_else(|| GatewayError::InvalidResponse("messages.send returned no message id".to_string()).into())
    }

    async fn edit_message(&self, peer_id: i64, message_id: i64, text: &str, keyboard: Option<&Keyboard>) -> Result<()> {
        let mut params = vec![
            ("peer_id", peer_id.to_string()),
            ("conversation_message_id", message_id.to_string()),
            ("message", text.to_string()),
        ];
        if let Some(keyboard) = keyboard {
            params.push(("keyboard", keyboard.to_json()));
        }

        self.call("messages.edit", &params).await?;
        Ok(())
    }

    async fn chat_title(&self, peer_id: i64) -> Result<Option<String>> {
        let response = self
            .call("messages.getConversationsById", &[("peer_ids", peer_id.to_string())])
            .await?;

        Ok(response
            .pointer("/items/0/chat_settings/title")
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    async fn remove_chat_member(&self, peer_id: i64, member_id: i64) -> Result<()> {
        let chat_id = if peer_id > CHAT_PEER_OFFSET { peer_id - CHAT_PEER_OFFSET } else { peer_id.abs() };
        self.call(
            "messages.removeChatUser",
            &[("chat_id", chat_id.to_string()), ("member_id", member_id.to_string())],
        )
        .await?;
        Ok(())
    }

    async fn post_to_feed(&self, text: &str) -> Result<i64> {
        let response = self
            .call(
                "wall.post",
                &[
                    ("owner_id", (-self.config.group_id).to_string()),
                    ("from_group", "1".to_string()),
                    ("message", text.to_string()),
                ],
            )
            .await?;

        response
            .get("post_id")
            .and_then(Value::as_i64)
            .ok_or_else(|| GatewayError::InvalidResponse("wall.post returned no post_id".to_string()).into())
    }

    async fn pin_message(&self, peer_id: i64, message_id: i64) -> Result<()> {
        self.call(
            "messages.pin",
            &[("peer_id", peer_id.to_string()), ("conversation_message_id", message_id.to_string())],
        )
        .await?;
        Ok(())
    }

    async fn unpin_message(&self, peer_id: i64) -> Result<()> {
        self.call(
            "messages.unpin",
            &[("peer_id", peer_id.to_string()), ("group_id", self.config.group_id.to_string())],
        )
        .await?;
        Ok(())
    }

    async fn ban_user(&self, user_id: i64, until: Option<DateTime<Utc>>) -> Result<()> {
        let mut params = vec![
            ("group_id", self.config.group_id.to_string()),
            ("owner_id", user_id.to_string()),
        ];
        if let Some(until) = until {
            params.push(("end_date", until.timestamp().to_string()));
        }
        self.call("groups.ban", &params).await?;
        Ok(())
    }

    async fn unban_user(&self, user_id: i64) -> Result<()> {
        self.call(
            "groups.unban",
            &[("group_id", self.config.group_id.to_string()), ("owner_id", user_id.to_string())],
        )
        .await?;
        Ok(())
    }
}
