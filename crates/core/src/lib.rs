//! Domain types shared by the work item engine crates.
//!
//! Holds the job identifier and status vocabulary, the transfer task
//! model consumed by the transfer queue, and the object naming
//! conventions used for staged inputs and fetched outputs.

pub mod error;
pub mod naming;
pub mod status;
pub mod transfer;
pub mod types;
