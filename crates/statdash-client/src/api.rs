use std::future::Future;
use std::pin::Pin;

use statdash_protocol::{ChatReply, ChatRequest, FilterCriteria, FilterResponse, WelcomeResponse};

use crate::ClientError;

pub type ApiFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ClientError>> + Send + 'a>>;

/// Operations the dashboard needs from its backend.
///
/// Implementations must not retry or time out on their own unless configured
/// to; each call is a single independent exchange.
pub trait DashboardApi: Send + Sync {
    /// `GET /api/filter` with the set criteria as query parameters.
    fn filter<'a>(&'a self, criteria: &'a FilterCriteria) -> ApiFuture<'a, FilterResponse>;

    /// `POST /chat`.
    fn chat<'a>(&'a self, request: &'a ChatRequest) -> ApiFuture<'a, ChatReply>;

    /// `GET /`, used as a reachability probe.
    fn welcome(&self) -> ApiFuture<'_, WelcomeResponse>;
}
