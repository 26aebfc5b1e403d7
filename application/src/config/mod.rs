//! Application-level configuration.
//!
//! - [`DeliberationParams`]: round loop control (context window, empty rounds, concurrency)
//! - [`RetryPolicy`]: per-call retry and backoff for provider calls
//! - [`SynthesisParams`]: sampling parameters of the synthesis call

pub mod deliberation_params;

pub use deliberation_params::{DeliberationParams, RetryPolicy, SynthesisParams};
