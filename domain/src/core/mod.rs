//! Core domain concepts shared across all subdomains.
//!
//! - [`error::DomainError`]: domain-level errors
//! - [`ids`]: identifiers for sessions, agents and provider profiles

pub mod error;
pub mod ids;
