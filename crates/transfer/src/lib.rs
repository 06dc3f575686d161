//! Bounded-concurrency file transfers.
//!
//! [`queue::TransferQueue`] admits upload and download tasks in FIFO
//! order up to a fixed worker count and exposes a settled signal once
//! every enqueued task has finished. [`http::HttpTransfer`] performs the
//! actual PUT / GET against signed URLs.

pub mod error;
pub mod executor;
pub mod http;
pub mod queue;
