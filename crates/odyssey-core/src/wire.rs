//! Wire-format translation for adventure documents.
//!
//! Backends and clients disagree on how the top-level keys are spelled
//! (`Rising_Action` vs `Rising Action`, `Denoument` vs `denouement`). The
//! canonical spelling lives on [`GeneratedAdventure`]; this module renders
//! it into a given [`WireFormat`] and folds any known spelling back.

use std::fmt;
use std::str::FromStr;

use serde_json::map::Entry;
use serde_json::{Map, Value};

use crate::adventure::GeneratedAdventure;
use crate::error::GenerationError;

/// Top-level key spellings of one wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireKeys {
    /// Key for the exposition.
    pub exposition: &'static str,
    /// Key for the incitement.
    pub incitement: &'static str,
    /// Key for the rising action.
    pub rising_action: &'static str,
    /// Key for the climax.
    pub climax: &'static str,
    /// Key for the denouement.
    pub denouement: &'static str,
}

/// Known spellings of the adventure document on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WireFormat {
    /// Capitalized keys with `Rising_Action`, as the schema-enforced backend
    /// prompt version uses.
    #[default]
    Underscored,
    /// Capitalized keys with `Rising Action`, as the browser client reads.
    Spaced,
}

impl WireFormat {
    /// Returns the top-level key spellings of this format.
    #[must_use]
    pub const fn keys(self) -> WireKeys {
        let rising_action = match self {
            Self::Underscored => "Rising_Action",
            Self::Spaced => "Rising Action",
        };
        WireKeys {
            exposition: "Exposition",
            incitement: "Incitement",
            rising_action,
            climax: "Climax",
            denouement: "Denoument",
        }
    }

    /// Renders `adventure` with this format's key spellings.
    #[must_use]
    pub fn encode(self, adventure: &GeneratedAdventure) -> Value {
        let keys = self.keys();
        let rising_action = adventure
            .rising_action
            .iter()
            .map(|scene| serde_json::to_value(scene).unwrap_or(Value::Null))
            .collect();

        let mut map = Map::new();
        map.insert(
            keys.exposition.to_owned(),
            Value::String(adventure.exposition.clone()),
        );
        map.insert(
            keys.incitement.to_owned(),
            Value::String(adventure.incitement.clone()),
        );
        map.insert(keys.rising_action.to_owned(), Value::Array(rising_action));
        map.insert(
            keys.climax.to_owned(),
            Value::String(adventure.climax.clone()),
        );
        map.insert(
            keys.denouement.to_owned(),
            Value::String(adventure.denouement.clone()),
        );
        Value::Object(map)
    }
}

impl fmt::Display for WireFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Underscored => f.write_str("underscored"),
            Self::Spaced => f.write_str("spaced"),
        }
    }
}

impl FromStr for WireFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "underscored" => Ok(Self::Underscored),
            "spaced" => Ok(Self::Spaced),
            other => Err(format!(
                "unknown wire format '{other}', expected 'underscored' or 'spaced'"
            )),
        }
    }
}

/// Spellings that do not fold onto the canonical key by case and separator
/// alone.
const KEY_ALIASES: &[(&str, &str)] = &[
    ("denoument", "denouement"),
    ("risingaction", "rising_action"),
    ("plottwist", "plot_twist"),
];

/// Folds a wire key onto its canonical spelling: lowercase, with spaces and
/// hyphens read as underscores.
fn canonical_key(key: &str) -> String {
    let folded: String = key
        .trim()
        .chars()
        .map(|c| match c {
            ' ' | '-' => '_',
            other => other.to_ascii_lowercase(),
        })
        .collect();

    KEY_ALIASES
        .iter()
        .find(|(alias, _)| *alias == folded)
        .map_or(folded, |(_, canonical)| (*canonical).to_owned())
}

/// Rewrites every key of `value`'s objects, recursively, onto its canonical
/// spelling.
///
/// When two spellings collide, a populated value replaces an empty one.
/// Between two populated values the key that sorts first wins, since object
/// keys are visited in sorted order.
fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (key, inner) in map {
                let inner = canonicalize(inner);
                match out.entry(canonical_key(&key)) {
                    Entry::Vacant(slot) => {
                        slot.insert(inner);
                    }
                    Entry::Occupied(mut slot) => {
                        if is_empty(slot.get()) && !is_empty(&inner) {
                            slot.insert(inner);
                        }
                    }
                }
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}

/// Null, blank strings, and empty arrays or objects.
fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Decodes an adventure from any known wire spelling.
///
/// # Errors
///
/// Returns `GenerationError::MalformedResponse` if the document is missing a
/// required field or has the wrong shape.
pub fn decode(value: Value) -> Result<GeneratedAdventure, GenerationError> {
    serde_json::from_value(canonicalize(value)).map_err(schema_mismatch)
}

fn schema_mismatch(err: serde_json::Error) -> GenerationError {
    GenerationError::MalformedResponse(format!("document does not match schema: {err}"))
}
