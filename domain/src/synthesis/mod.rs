//! Synthesis output parsing.

pub mod parsing;

pub use parsing::{MAX_ACTION_ITEMS, parse_action_items};
