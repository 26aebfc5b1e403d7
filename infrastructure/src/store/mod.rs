//! Session record stores
//!
//! Adapters implementing the application's `SessionStore` port.

mod json_file;
mod memory;
mod records;

pub use json_file::JsonFileSessionStore;
pub use memory::InMemorySessionStore;
pub use records::StoreRecords;
