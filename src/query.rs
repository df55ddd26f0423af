//! `abci_query` request building and value decoding.

use std::fmt;
use std::str::FromStr;

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::error::{LbcError, LbcResult};

/// Entity collections exposed under `/list/<alias>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityAlias {
    Promise,
    Commitment,
    Commiter,
    Beneficiary,
}

impl EntityAlias {
    pub const ALL: [EntityAlias; 4] = [
        EntityAlias::Promise,
        EntityAlias::Commitment,
        EntityAlias::Commiter,
        EntityAlias::Beneficiary,
    ];

    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Promise => "promise",
            Self::Commitment => "commitment",
            Self::Commiter => "commiter",
            Self::Beneficiary => "beneficiary",
        }
    }

    /// ABCI path listing this collection.
    pub fn path(&self) -> String {
        format!("/list/{}", self.as_str())
    }
}

impl fmt::Display for EntityAlias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EntityAlias {
    type Err = LbcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|alias| alias.as_str() == s)
            .ok_or_else(|| {
                LbcError::InvalidInput(format!(
                    "unknown entity alias: {:?} (expected promise, commitment, commiter or beneficiary)",
                    s
                ))
            })
    }
}

/// A resolved `abci_query` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    path: String,
    data: Option<Vec<u8>>,
    height: Option<String>,
}

impl QueryRequest {
    /// Query an explicit ABCI path.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            data: None,
            height: None,
        }
    }

    /// Query an entity collection.
    pub fn list(alias: EntityAlias) -> Self {
        Self::new(alias.path())
    }

    /// Resolve from an explicit path and/or an alias.
    ///
    /// A non-empty path wins and the alias is ignored. Otherwise the alias
    /// must name a known collection.
    pub fn resolve(path: Option<&str>, alias: Option<&str>) -> LbcResult<Self> {
        if let Some(path) = path.filter(|p| !p.is_empty()) {
            return Ok(Self::new(path));
        }
        match alias.filter(|a| !a.is_empty()) {
            Some(alias) => Ok(Self::list(alias.parse()?)),
            None => Err(LbcError::InvalidInput(
                "either a path or an entity alias is required".to_string(),
            )),
        }
    }

    /// Attach query data. Empty data is not sent.
    pub fn with_data(mut self, data: impl Into<Vec<u8>>) -> Self {
        let data = data.into();
        self.data = (!data.is_empty()).then_some(data);
        self
    }

    /// Query at a specific height. The value is passed through unparsed;
    /// an empty string is not sent.
    pub fn with_height(mut self, height: impl Into<String>) -> Self {
        let height = height.into();
        self.height = (!height.is_empty()).then_some(height);
        self
    }

    /// Unquoted ABCI path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Raw query data, base64-encoded on the wire.
    pub fn data(&self) -> Option<&[u8]> {
        self.data.as_deref()
    }

    /// Block height, if pinned.
    pub fn height(&self) -> Option<&str> {
        self.height.as_deref()
    }

    /// Form-encoded query string, keys in sorted order.
    ///
    /// The node parses `path` as a JSON-style quoted string, so it is sent
    /// wrapped in double quotes. `data` is standard base64.
    pub fn to_query_string(&self) -> LbcResult<String> {
        let mut pairs: Vec<(&str, String)> = Vec::with_capacity(3);
        if let Some(data) = &self.data {
            pairs.push(("data", STANDARD.encode(data)));
        }
        if let Some(height) = &self.height {
            pairs.push(("height", height.clone()));
        }
        pairs.push(("path", quote(&self.path)));
        serde_urlencoded::to_string(&pairs).map_err(|e| LbcError::Encoding(e.to_string()))
    }
}

/// Double-quote `s`. C escapes use their short forms,
/// `\xNN` for other ASCII controls, `\uXXXX`/`\UXXXXXXXX` for non-printable
/// code points above ASCII.
fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{7}' => out.push_str("\\a"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{b}' => out.push_str("\\v"),
            c if (c as u32) < 0x20 || c == '\u{7f}' => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c if is_printable(c) => out.push(c),
            c if (c as u32) < 0x1_0000 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push_str(&format!("\\U{:08x}", c as u32)),
        }
    }
    out.push('"');
    out
}

/// Printable outside ASCII: not a control, not a space other than U+0020,
/// not a format or private-use character.
fn is_printable(c: char) -> bool {
    if c.is_control() || (c.is_whitespace() && c != ' ') {
        return false;
    }
    !matches!(
        c as u32,
        0x00AD
            | 0x0600..=0x0605
            | 0x061C
            | 0x06DD
            | 0x070F
            | 0x180E
            | 0x200B..=0x200F
            | 0x202A..=0x202E
            | 0x2060..=0x2064
            | 0x2066..=0x206F
            | 0xE000..=0xF8FF
            | 0xFEFF
            | 0xFFF9..=0xFFFB
            | 0xF_0000..=0x10_FFFF
    )
}

/// Decoded form of an `abci_query` value.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryView {
    /// No value
    Empty,
    /// Value parsed as JSON
    Json(serde_json::Value),
    /// Non-text bytes
    Binary(Vec<u8>),
    /// UTF-8 text that is not JSON
    Text(String),
}

impl QueryView {
    /// Decode a base64 response value.
    ///
    /// # Errors
    ///
    /// Returns [`LbcError::Decode`] carrying the raw value if it is not
    /// valid base64.
    pub fn decode(value: Option<&str>) -> LbcResult<Self> {
        let encoded = match value {
            None => return Ok(Self::Empty),
            Some(v) if v.is_empty() => return Ok(Self::Empty),
            Some(v) => v,
        };
        let bytes = STANDARD.decode(encoded).map_err(|e| LbcError::Decode {
            value: encoded.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self::from_bytes(bytes))
    }

    /// Classify raw value bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        if bytes.is_empty() {
            return Self::Empty;
        }
        if let Ok(json) = serde_json::from_slice::<serde_json::Value>(&bytes) {
            return Self::Json(json);
        }
        if bytes.contains(&0) {
            return Self::Binary(bytes);
        }
        match String::from_utf8(bytes) {
            Ok(text) => Self::Text(text),
            Err(e) => Self::Binary(e.into_bytes()),
        }
    }

    /// Whether the node returned no value.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

impl fmt::Display for QueryView {
    /// JSON is pretty-printed with two-space indentation, binary values are
    /// shown as standard base64.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Json(value) => {
                let pretty = serde_json::to_string_pretty(value).map_err(|_| fmt::Error)?;
                f.write_str(&pretty)
            }
            Self::Binary(bytes) => f.write_str(&STANDARD.encode(bytes)),
            Self::Text(text) => f.write_str(text),
        }
    }
}
