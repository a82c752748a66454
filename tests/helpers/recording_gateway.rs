//! In-process messaging gateway for tests
//!
//! Records every outbound call instead of talking to the VK API, and hands
//! out increasing message references the way the real platform does.

use std::collections::HashMap;
use std::sync::Mutex;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use CourierHub::services::{Keyboard, MessagingGateway};
use CourierHub::Result;

#[derive(Debug, Clone)]
pub struct SentMessage {
    pub peer_id: i64,
    pub message_id: i64,
    pub text: String,
    pub keyboard: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EditedMessage {
    pub peer_id: i64,
    pub message_id: i64,
    pub text: String,
}

#[derive(Default)]
struct Recorded {
    next_id: i64,
    sent: Vec<SentMessage>,
    edits: Vec<EditedMessage>,
    titles: HashMap<i64, String>,
    posts: Vec<String>,
    pins: Vec<(i64, i64)>,
    unpins: Vec<i64>,
    bans: Vec<(i64, Option<DateTime<Utc>>)>,
    unbans: Vec<i64>,
    removed: Vec<(i64, i64)>,
}

#[derive(Default)]
pub struct RecordingGateway {
    inner: Mutex<Recorded>,
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Title returned by `chat_title` for the peer
    pub fn set_title(&self, peer_id: i64, title: &str) {
        self.inner.lock().unwrap().titles.insert(peer_id, title.to_string());
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.inner.lock().unwrap().sent.clone()
    }

    pub fn sent_to(&self, peer_id: i64) -> Vec<SentMessage> {
        self.sent().into_iter().filter(|m| m.peer_id == peer_id).collect()
    }

    pub fn last_to(&self, peer_id: i64) -> Option<SentMessage> {
        self.sent_to(peer_id).pop()
    }

    pub fn last_text(&self, peer_id: i64) -> String {
        self.last_to(peer_id).map(|m| m.text).unwrap_or_default()
    }

    pub fn edits(&self) -> Vec<EditedMessage> {
        self.inner.lock().unwrap().edits.clone()
    }

    pub fn posts(&self) -> Vec<String> {
        self.inner.lock().unwrap().posts.clone()
    }

    pub fn pins(&self) -> Vec<(i64, i64)> {
        self.inner.lock().unwrap().pins.clone()
    }

    pub fn unpins(&self) -> Vec<i64> {
        self.inner.lock().unwrap().unpins.clone()
    }

    pub fn bans(&self) -> Vec<(i64, Option<DateTime<Utc>>)> {
        self.inner.lock().unwrap().bans.clone()
    }

    pub fn unbans(&self) -> Vec<i64> {
        self.inner.lock().unwrap().unbans.clone()
    }

    pub fn removed(&self) -> Vec<(i64, i64)> {
        self.inner.lock().unwrap().removed.clone()
    }

    /// Forget everything sent so far, keeping configured titles
    pub fn reset(&self) {
        let mut inner = self.inner.lock().unwrap();
        let titles = std::mem::take(&mut inner.titles);
        let next_id = inner.next_id;
        *inner = Recorded {
            next_id,
            titles,
            ..Recorded::default()
        };
    }
}

#[async_trait]
impl MessagingGateway for RecordingGateway {
    async fn send_message(&self, peer_id: i64, text: &str, keyboard: Option<&Keyboard>) -> Result<i64> {
        let mut inner = self.inner.lock().unwrap();
        inner.next_id += 1;
        let message_id = inner.next_id;
        inner.sent.push(SentMessage {
            peer_id,
            message_id,
            text: text.to_string(),
            keyboard: keyboard.map(Keyboard::to_json),
        });
        Ok(message_id)
    }

    async fn edit_message(&self, peer_id: i64, message_id: i64, text: &str, _keyboard: Option<&Keyboard>) -> Result<()> {
        self.inner.lock().unwrap().edits.push(EditedMessage {
            peer_id,
            message_id,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn chat_title(&self, peer_id: i64) -> Result<Option<String>> {
        Ok(self.inner.lock().unwrap().titles.get(&peer_id).cloned())
    }

    async fn remove_chat_member(&self, peer_id: i64, member_id: i64) -> Result<()> {
        self.inner.lock().unwrap().removed.push((peer_id, member_id));
        Ok(())
    }

    async fn post_to_feed(&self, text: &str) -> Result<i64> {
        let mut inner = self.inner.lock().unwrap();
        inner.posts.push(text.to_string());
        Ok(inner.posts.len() as i64)
    }

    async fn pin_message(&self, peer_id: i64, message_id: i64) -> Result<()> {
        self.inner.lock().unwrap().pins.push((peer_id, message_id));
        Ok(())
    }

    async fn unpin_message(&self, peer_id: i64) -> Result<()> {
        self.inner.lock().unwrap().unpins.push(peer_id);
        Ok(())
    }

    async fn ban_user(&self, user_id: i64, until: Option<DateTime<Utc>>) -> Result<()> {
        self.inner.lock().unwrap().bans.push((user_id, until));
        Ok(())
    }

    async fn unban_user(&self, user_id: i64) -> Result<()> {
        self.inner.lock().unwrap().unbans.push(user_id);
        Ok(())
    }
}
