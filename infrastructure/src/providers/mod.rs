//! Provider backends
//!
//! [`HttpProviderClient`] implements the application's `ProviderClient` port
//! over HTTP for every supported provider kind.

mod anthropic;
mod http;
mod openai_compat;

pub use http::{HttpProviderClient, HttpProviderConfig};
