//! Scripted backend for testing
//!
//! Replies are served in the order they were queued. Every call is recorded
//! so tests can assert on what would have gone over the wire.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use statdash_protocol::{ChatReply, ChatRequest, FilterCriteria, FilterResponse, WelcomeResponse};

use crate::{ApiFuture, ClientError, DashboardApi};

/// A canned reply, optionally delayed.
#[derive(Debug, Clone)]
pub struct Scripted<T> {
    pub delay: Option<Duration>,
    pub outcome: MockOutcome<T>,
}

#[derive(Debug, Clone)]
pub enum MockOutcome<T> {
    Reply(T),
    /// Non-2xx status with an optional `error` body field.
    Status(u16, Option<String>),
    /// Body that is not valid JSON for the expected shape.
    Malformed,
}

impl<T> Scripted<T> {
    pub fn reply(value: T) -> Self {
        Self {
            delay: None,
            outcome: MockOutcome::Reply(value),
        }
    }

    pub fn status(status: u16, error: Option<&str>) -> Self {
        Self {
            delay: None,
            outcome: MockOutcome::Status(status, error.map(str::to_string)),
        }
    }

    pub fn malformed() -> Self {
        Self {
            delay: None,
            outcome: MockOutcome::Malformed,
        }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// In-memory [`DashboardApi`] with queued replies.
///
/// An empty queue answers with HTTP 503.
#[derive(Default)]
pub struct MockDashboardApi {
    filter_replies: Mutex<VecDeque<Scripted<FilterResponse>>>,
    chat_replies: Mutex<VecDeque<Scripted<ChatReply>>>,
    filter_calls: Mutex<Vec<FilterCriteria>>,
    chat_calls: Mutex<Vec<ChatRequest>>,
}

impl MockDashboardApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_filter(&self, scripted: Scripted<FilterResponse>) {
        lock(&self.filter_replies).push_back(scripted);
    }

    pub fn push_chat(&self, scripted: Scripted<ChatReply>) {
        lock(&self.chat_replies).push_back(scripted);
    }

    pub fn filter_calls(&self) -> Vec<FilterCriteria> {
        lock(&self.filter_calls).clone()
    }

    pub fn chat_calls(&self) -> Vec<ChatRequest> {
        lock(&self.chat_calls).clone()
    }
}

impl DashboardApi for MockDashboardApi {
    fn filter<'a>(&'a self, criteria: &'a FilterCriteria) -> ApiFuture<'a, FilterResponse> {
        lock(&self.filter_calls).push(criteria.clone());
        let next = lock(&self.filter_replies).pop_front();
        Box::pin(play(next))
    }

    fn chat<'a>(&'a self, request: &'a ChatRequest) -> ApiFuture<'a, ChatReply> {
        lock(&self.chat_calls).push(request.clone());
        let next = lock(&self.chat_replies).pop_front();
        Box::pin(play(next))
    }

    fn welcome(&self) -> ApiFuture<'_, WelcomeResponse> {
        Box::pin(async {
            Ok(WelcomeResponse {
                message: "mock backend".to_string(),
            })
        })
    }
}

async fn play<T>(scripted: Option<Scripted<T>>) -> Result<T, ClientError> {
    let Some(scripted) = scripted else {
        return Err(ClientError::Status {
            status: 503,
            embedded_error: None,
        });
    };
    if let Some(delay) = scripted.delay {
        tokio::time::sleep(delay).await;
    }
    match scripted.outcome {
        MockOutcome::Reply(value) => Ok(value),
        MockOutcome::Status(status, embedded_error) => Err(ClientError::Status {
            status,
            embedded_error,
        }),
        MockOutcome::Malformed => match serde_json::from_str::<serde_json::Value>("<html>") {
            Err(e) => Err(ClientError::Decode(e)),
            Ok(_) => Err(ClientError::Status {
                status: 500,
                embedded_error: None,
            }),
        },
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
