//! Remote work item service client.
//!
//! Provides the raw request transport, the exponential-backoff executor
//! that wraps it, typed work item endpoints (submit, status, owner
//! nickname), and the status poller that drives a submitted work item
//! to a terminal state.

pub mod api;
pub mod backoff;
pub mod client;
pub mod error;
pub mod poller;
