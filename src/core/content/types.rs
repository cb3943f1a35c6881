//! Content record types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::ident::ContentType;

/// A single typed content record.
///
/// Immutable once loaded; owned exclusively by the
/// [`ContentStore`](super::ContentStore). Type-specific data (hit points,
/// damage dice, property tags, ...) lives in the open `fields` map with
/// typed accessors for the fields the engine consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentItem {
    /// Canonical ID, unique within its type (e.g. `monster/goblin`).
    pub id: String,
    /// Content type this record belongs to.
    #[serde(rename = "type")]
    pub kind: ContentType,
    /// Display name as authored (e.g. `Goblin`, `Warhammer`).
    pub name: String,
    /// Type-specific fields.
    #[serde(default, flatten)]
    pub fields: Map<String, Value>,
}

impl ContentItem {
    /// Integer field accessor.
    fn int_field(&self, key: &str) -> Option<i64> {
        self.fields.get(key).and_then(Value::as_i64)
    }

    /// String field accessor.
    fn str_field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    /// Hit points (monsters).
    pub fn hp(&self) -> Option<i64> {
        self.int_field("hp")
    }

    /// Armor class (monsters).
    pub fn ac(&self) -> Option<i64> {
        self.int_field("ac")
    }

    /// Attack bonus (monsters).
    pub fn attack_bonus(&self) -> Option<i64> {
        self.int_field("attack")
    }

    /// Damage die expression, e.g. `"1d8"` (monsters, weapons).
    pub fn damage(&self) -> Option<&str> {
        self.str_field("damage")
    }

    /// Property tags, e.g. `["versatile (1d10)"]` (weapons).
    pub fn properties(&self) -> Vec<&str> {
        self.fields
            .get("properties")
            .and_then(Value::as_array)
            .map(|tags| tags.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// Opponent content refs (encounter fixtures).
    pub fn opponents(&self) -> Vec<&str> {
        self.fields
            .get("opponents")
            .and_then(Value::as_array)
            .map(|refs| refs.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// Rule body text (rules).
    pub fn text(&self) -> Option<&str> {
        self.str_field("text")
    }

    /// Render as a single JSON object for the `show` surface.
    ///
    /// Always carries `id`, `type` and `name`; type-specific fields are
    /// flattened alongside them.
    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("id".to_string(), Value::String(self.id.clone()));
        obj.insert("type".to_string(), Value::String(self.kind.to_string()));
        obj.insert("name".to_string(), Value::String(self.name.clone()));
        for (key, value) in &self.fields {
            obj.insert(key.clone(), value.clone());
        }
        Value::Object(obj)
    }
}

/// Shape of one record as authored in a content file.
///
/// The `id` is optional; when absent it is derived from `name`.
#[derive(Debug, Deserialize)]
pub(super) struct RawRecord {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, flatten)]
    pub fields: Map<String, Value>,
}
