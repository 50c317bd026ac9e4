//! Field simplification and regex filter payloads.
//!
//! Several Kismet endpoints accept a `fields` list that projects each
//! returned record down to the named fields. A field is either a name or
//! path (`kismet.device.base.signal/kismet.common.signal.last_signal_dbm`)
//! or a `[path, alias]` pair that renames it in the output. Regex filters
//! are `[field, regex]` pairs.

use serde::{Deserialize, Serialize};

/// One entry of a field simplification list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Field {
    /// Keep the field under its own (final path component) name.
    Path(String),
    /// Keep the field, renamed to the alias.
    Alias(String, String),
}

impl Field {
    pub fn path(path: impl Into<String>) -> Self {
        Self::Path(path.into())
    }

    pub fn alias(path: impl Into<String>, alias: impl Into<String>) -> Self {
        Self::Alias(path.into(), alias.into())
    }
}

impl From<&str> for Field {
    fn from(path: &str) -> Self {
        Self::Path(path.to_owned())
    }
}

impl From<(&str, &str)> for Field {
    fn from((path, alias): (&str, &str)) -> Self {
        Self::Alias(path.to_owned(), alias.to_owned())
    }
}

/// A `[field, regex]` filter term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegexFilter(pub String, pub String);
