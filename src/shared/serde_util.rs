//! Custom serde helpers for node wire formats.

/// Deserializes any JSON value into a `String`.
///
/// CometBFT sends JSON-RPC `error.data` as a string, but some proxies and
/// older nodes send objects or omit it. Strings pass through verbatim,
/// `null` becomes empty, anything else is rendered as compact JSON.
pub mod lenient_string {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &str, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(value)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<serde_json::Value>::deserialize(deserializer)?;
        Ok(match value {
            None | Some(serde_json::Value::Null) => String::new(),
            Some(serde_json::Value::String(s)) => s,
            Some(other) => other.to_string(),
        })
    }
}
