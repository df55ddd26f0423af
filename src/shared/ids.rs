//! Entity id generation.

/// Generate a globally unique entity id of the form `<prefix>:<uuid-v4>`.
pub fn new_entity_id(prefix: &str) -> String {
    format!("{}:{}", prefix, uuid::Uuid::new_v4())
}
