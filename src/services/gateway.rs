//! Messaging gateway contract
//!
//! The outbound side of the chat platform. Message references returned by
//! [`MessagingGateway::send_message`] are what `edit_message` and
//! `pin_message` expect back.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::services::keyboards::Keyboard;
use crate::utils::errors::Result;

#[async_trait]
pub trait MessagingGateway: Send + Sync {
    /// Send a message and return its reference within the conversation
    async fn send_message(&self, peer_id: i64, text: &str, keyboard: Option<&Keyboard>) -> Result<i64>;

    async fn edit_message(&self, peer_id: i64, message_id: i64, text: &str, keyboard: Option<&Keyboard>) -> Result<()>;

    /// Display title of a group chat, if the platform knows it
    async fn chat_title(&self, peer_id: i64) -> Result<Option<String>>;

    async fn remove_chat_member(&self, peer_id: i64, member_id: i64) -> Result<()>;

    /// Publish to the community feed and return the post id
    async fn post_to_feed(&self, text: &str) -> Result<i64>;

    async fn pin_message(&self, peer_id: i64, message_id: i64) -> Result<()>;

    async fn unpin_message(&self, peer_id: i64) -> Result<()>;

    /// Ban from the community; `None` means forever
    async fn ban_user(&self, user_id: i64, until: Option<DateTime<Utc>>) -> Result<()>;

    async fn unban_user(&self, user_id: i64) -> Result<()>;
}
