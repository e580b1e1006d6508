//! Chat widget state: transcript, input line and visibility.
//!
//! Sending is split in two halves so the UI never waits on the network:
//! [`ChatWidget::begin_send`] echoes the user message and clears the input
//! synchronously, and [`PendingReply::resolve`] produces the bot message to
//! append once the exchange settles. Sends are independent of each other, so
//! replies land in the transcript in the order they resolve.

use uuid::Uuid;

use statdash_client::{ClientError, DashboardApi};
use statdash_protocol::{
    ChatMessage, ChatReply, ChatRequest, CHAT_FAILURE_TEXT, DEFAULT_CHAT_USER_ID,
};

use crate::input::InputLine;

/// Most recent sent lines kept for Up/Down recall.
pub const HISTORY_LIMIT: usize = 100;

/// A message that has been echoed locally but not yet answered.
#[derive(Debug)]
pub struct PendingReply {
    request: ChatRequest,
    request_id: Uuid,
}

impl PendingReply {
    pub fn request(&self) -> &ChatRequest {
        &self.request
    }

    /// Perform the exchange without folding failures.
    pub async fn exchange(&self, api: &dyn DashboardApi) -> Result<ChatReply, ClientError> {
        api.chat(&self.request).await
    }

    /// Perform the exchange and turn the outcome into a bot message.
    pub async fn resolve(self, api: &dyn DashboardApi) -> ChatMessage {
        match self.exchange(api).await {
            Ok(reply) => {
                tracing::debug!(request_id = %self.request_id, "Chat reply received");
                ChatMessage::bot(reply.response)
            }
            Err(e) => {
                tracing::warn!(request_id = %self.request_id, error = %e, "Chat request failed");
                ChatMessage::bot(CHAT_FAILURE_TEXT)
            }
        }
    }
}

#[derive(Debug)]
pub struct ChatWidget {
    open: bool,
    transcript: Vec<ChatMessage>,
    input: InputLine,
    /// Previously sent lines for Up/Down recall.
    history: Vec<String>,
    history_pos: Option<usize>,
    user_id: String,
    max_messages: Option<usize>,
}

impl Default for ChatWidget {
    fn default() -> Self {
        Self::new(DEFAULT_CHAT_USER_ID, None)
    }
}

impl ChatWidget {
    /// `max_messages` of `None` (or `Some(0)`) keeps the whole session.
    pub fn new(user_id: impl Into<String>, max_messages: Option<usize>) -> Self {
        Self {
            open: false,
            transcript: Vec::new(),
            input: InputLine::new(),
            history: Vec::new(),
            history_pos: None,
            user_id: user_id.into(),
            max_messages: max_messages.filter(|&max| max > 0),
        }
    }

    pub fn toggle(&mut self) {
        self.open = !self.open;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn input(&self) -> &InputLine {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut InputLine {
        &mut self.input
    }

    /// Echo `text` as a user message and clear the input.
    ///
    /// Returns `None` without touching any state when `text` is blank.
    pub fn begin_send(&mut self, text: &str) -> Option<PendingReply> {
        if text.trim().is_empty() {
            return None;
        }

        self.push(ChatMessage::user(text));
        self.input.clear();
        self.history.push(text.to_string());
        if self.history.len() > HISTORY_LIMIT {
            let excess = self.history.len() - HISTORY_LIMIT;
            self.history.drain(..excess);
        }
        self.history_pos = None;

        Some(PendingReply {
            request: ChatRequest {
                user_id: self.user_id.clone(),
                message: text.to_string(),
            },
            request_id: Uuid::new_v4(),
        })
    }

    /// [`begin_send`](Self::begin_send) with the current input line.
    pub fn submit_input(&mut self) -> Option<PendingReply> {
        let text = self.input.text().to_string();
        self.begin_send(&text)
    }

    pub fn push_reply(&mut self, reply: ChatMessage) {
        self.push(reply);
    }

    pub async fn send(&mut self, api: &dyn DashboardApi, text: &str) {
        if let Some(pending) = self.begin_send(text) {
            let reply = pending.resolve(api).await;
            self.push_reply(reply);
        }
    }

    pub async fn send_input(&mut self, api: &dyn DashboardApi) {
        if let Some(pending) = self.submit_input() {
            let reply = pending.resolve(api).await;
            self.push_reply(reply);
        }
    }

    pub fn history_prev(&mut self) {
        if self.history.is_empty() {
            return;
        }
        let pos = match self.history_pos {
            Some(p) if p > 0 => p - 1,
            Some(p) => p,
            None => self.history.len() - 1,
        };
        self.history_pos = Some(pos);
        self.input.set(self.history[pos].clone());
    }

    pub fn history_next(&mut self) {
        if let Some(pos) = self.history_pos {
            if pos + 1 < self.history.len() {
                self.history_pos = Some(pos + 1);
                self.input.set(self.history[pos + 1].clone());
            } else {
                self.history_pos = None;
                self.input.clear();
            }
        }
    }

    fn push(&mut self, message: ChatMessage) {
        self.transcript.push(message);
        if let Some(max) = self.max_messages {
            if self.transcript.len() > max {
                let excess = self.transcript.len() - max;
                self.transcript.drain(..excess);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use statdash_client::mock::{MockDashboardApi, Scripted};
    use statdash_protocol::Sender;

    fn reply(text: &str) -> ChatReply {
        ChatReply {
            response: text.to_string(),
        }
    }

    #[tokio::test]
    async fn blank_messages_are_ignored() {
        let api = MockDashboardApi::new();
        let mut chat = ChatWidget::default();

        chat.send(&api, "").await;
        chat.send(&api, "   ").await;

        assert!(chat.transcript().is_empty());
        assert!(api.chat_calls().is_empty());
    }

    #[tokio::test]
    async fn user_message_is_echoed_before_reply() {
        let api = MockDashboardApi::new();
        api.push_chat(Scripted::reply(reply("hello")));
        let mut chat = ChatWidget::default();

        let pending = chat.begin_send("hi").expect("non-blank");
        assert_eq!(chat.transcript().len(), 1);
        assert_eq!(chat.transcript()[0].sender, Sender::User);
        assert_eq!(chat.transcript()[0].text, "hi");

        let bot = pending.resolve(&api).await;
        chat.push_reply(bot);
        assert_eq!(chat.transcript().len(), 2);
        assert_eq!(chat.transcript()[1].sender, Sender::Bot);
        assert_eq!(chat.transcript()[1].text, "hello");
    }

    #[tokio::test]
    async fn request_carries_user_id_and_raw_text() {
        let api = MockDashboardApi::new();
        api.push_chat(Scripted::reply(reply("ok")));
        let mut chat = ChatWidget::new("analyst-7", None);

        chat.send(&api, " urban households ").await;

        let calls = api.chat_calls();
        assert_eq!(calls[0].user_id, "analyst-7");
        assert_eq!(calls[0].message, " urban households ");
    }

    #[tokio::test]
    async fn failure_appends_single_fallback_message() {
        let api = MockDashboardApi::new();
        api.push_chat(Scripted::malformed());
        let mut chat = ChatWidget::default();

        chat.send(&api, "hi").await;

        assert_eq!(chat.transcript().len(), 2);
        assert_eq!(chat.transcript()[1].sender, Sender::Bot);
        assert_eq!(chat.transcript()[1].text, CHAT_FAILURE_TEXT);
    }

    #[tokio::test]
    async fn error_status_is_folded_into_fallback() {
        let api = MockDashboardApi::new();
        api.push_chat(Scripted::status(500, Some("model unavailable")));
        let mut chat = ChatWidget::default();

        chat.send(&api, "hi").await;
        assert_eq!(chat.transcript()[1].text, CHAT_FAILURE_TEXT);
    }

    #[tokio::test]
    async fn input_is_cleared_on_send() {
        let api = MockDashboardApi::new();
        api.push_chat(Scripted::reply(reply("ok")));
        let mut chat = ChatWidget::default();
        chat.input_mut().set("show Bihar");

        let pending = chat.submit_input().unwrap();
        assert!(chat.input().is_empty());
        assert_eq!(pending.request().message, "show Bihar");
    }

    #[tokio::test]
    async fn blank_input_is_kept() {
        let mut chat = ChatWidget::default();
        chat.input_mut().set("  ");
        assert!(chat.submit_input().is_none());
        assert_eq!(chat.input().text(), "  ");
    }

    #[tokio::test]
    async fn replies_land_in_resolution_order() {
        let api = MockDashboardApi::new();
        api.push_chat(Scripted::reply(reply("slow")).after(Duration::from_millis(80)));
        api.push_chat(Scripted::reply(reply("fast")));
        let mut chat = ChatWidget::default();

        let first = chat.begin_send("one").unwrap();
        let second = chat.begin_send("two").unwrap();

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let first_fut = async {
            let _ = tx.send(first.resolve(&api).await);
        };
        let second_fut = async {
            let _ = tx.send(second.resolve(&api).await);
        };
        tokio::join!(first_fut, second_fut);
        drop(tx);
        while let Some(msg) = rx.recv().await {
            chat.push_reply(msg);
        }

        let texts: Vec<&str> = chat.transcript().iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["one", "two", "fast", "slow"]);
    }

    #[test]
    fn toggle_flips_visibility() {
        let mut chat = ChatWidget::default();
        assert!(!chat.is_open());
        chat.toggle();
        assert!(chat.is_open());
        chat.toggle();
        assert!(!chat.is_open());
    }

    #[tokio::test]
    async fn cap_evicts_oldest_messages() {
        let api = MockDashboardApi::new();
        for i in 0..3 {
            api.push_chat(Scripted::reply(reply(&format!("r{i}"))));
        }
        let mut chat = ChatWidget::new("default", Some(3));
        for i in 0..3 {
            chat.send(&api, &format!("m{i}")).await;
        }

        let texts: Vec<&str> = chat.transcript().iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["r1", "m2", "r2"]);
    }

    #[test]
    fn history_keeps_only_recent_lines() {
        let mut chat = ChatWidget::default();
        for i in 0..HISTORY_LIMIT + 5 {
            chat.begin_send(&format!("line {i}"));
        }

        for _ in 0..HISTORY_LIMIT + 10 {
            chat.history_prev();
        }
        assert_eq!(chat.input().text(), "line 5");
    }

    #[tokio::test]
    async fn zero_cap_keeps_everything() {
        let api = MockDashboardApi::new();
        api.push_chat(Scripted::reply(reply("ok")));
        let mut chat = ChatWidget::new("default", Some(0));

        chat.send(&api, "hi").await;
        assert_eq!(chat.transcript().len(), 2);
    }

    #[test]
    fn history_recalls_sent_lines() {
        let mut chat = ChatWidget::default();
        chat.begin_send("first");
        chat.begin_send("second");

        chat.history_prev();
        assert_eq!(chat.input().text(), "second");
        chat.history_prev();
        assert_eq!(chat.input().text(), "first");
        chat.history_next();
        assert_eq!(chat.input().text(), "second");
        chat.history_next();
        assert!(chat.input().is_empty());
    }
}
