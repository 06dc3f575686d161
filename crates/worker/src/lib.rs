//! Job runner for remote work items.
//!
//! Wires configuration, the job capability set, and the phase pipeline
//! that stages inputs, submits and polls a work item, and fetches its
//! outputs.

pub mod capabilities;
pub mod config;
pub mod error;
pub mod export;
pub mod runner;
pub mod template;
