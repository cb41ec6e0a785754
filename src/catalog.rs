//! Static reply catalog: exact message text to canned reply payloads.
//!
//! The catalog is a JSON object whose keys are matched against the full text
//! of an inbound message, byte for byte. Each value is one payload object or an
//! array of them, sent unchanged as the reply.

use crate::error::{Error, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// The platform accepts at most this many messages in one reply.
pub const MAX_REPLY_MESSAGES: usize = 5;

#[derive(Debug, Clone, Default)]
pub struct ReplyCatalog {
    entries: HashMap<String, Vec<Value>>,
}

impl ReplyCatalog {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: HashMap<String, Vec<Value>>) -> Result<Self> {
        for (key, payloads) in &entries {
            validate_payloads(key, payloads)?;
        }
        Ok(Self { entries })
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let root: Value = serde_json::from_str(raw)
            .map_err(|err| Error::Catalog(format!("invalid json: {err}")))?;
        let Value::Object(map) = root else {
            return Err(Error::Catalog("catalog root must be an object".to_string()));
        };

        let mut entries = HashMap::with_capacity(map.len());
        for (key, value) in map {
            let payloads = match value {
                Value::Array(items) => items,
                obj @ Value::Object(_) => vec![obj],
                other => {
                    return Err(Error::Catalog(format!(
                        "entry {key:?} must be an object or an array, got {other}"
                    )))
                }
            };
            entries.insert(key, payloads);
        }
        Self::from_entries(entries)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|err| {
            Error::Catalog(format!("cannot read {}: {err}", path.display()))
        })?;
        Self::from_json_str(&raw)
    }

    pub fn lookup(&self, text: &str) -> Option<&[Value]> {
        self.entries.get(text).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

fn validate_payloads(key: &str, payloads: &[Value]) -> Result<()> {
    if payloads.is_empty() {
        return Err(Error::Catalog(format!("entry {key:?} has no payloads")));
    }
    if payloads.len() > MAX_REPLY_MESSAGES {
        return Err(Error::Catalog(format!(
            "entry {key:?} has {} payloads, at most {MAX_REPLY_MESSAGES} fit in one reply",
            payloads.len()
        )));
    }
    for payload in payloads {
        if payload.get("type").and_then(Value::as_str).is_none() {
            return Err(Error::Catalog(format!(
                "entry {key:?} has a payload without a string \"type\""
            )));
        }
    }
    Ok(())
}
