//! Provider capability types.
//!
//! - [`profile::ProviderProfile`]: which backend to call and with which key
//! - [`profile::ProviderKind`]: the fixed set of backend families
//! - [`message::Message`]: a chat message sent to a provider

pub mod message;
pub mod profile;
