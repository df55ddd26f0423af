//! Shared utilities used by the transaction and RPC modules.

pub mod ids;
pub mod serde_util;
pub mod time;

// Re-export commonly used items
pub use ids::new_entity_id;
pub use time::parse_due;
