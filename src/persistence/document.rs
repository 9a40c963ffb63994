use schemars::JsonSchema;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

use crate::model::{ClickType, Position};

use super::lenient;

/// On-disk document: every set plus the execution queue.
///
/// ```json
/// { "sets": { "Set 1": { "loop_count": 1, "coordinates": [ ... ] } },
///   "queue": ["Set 1"] }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Document {
    /// Sets keyed by name, in the order they were created.
    #[schemars(with = "BTreeMap<String, SetRecord>")]
    pub sets: SetMap,

    /// Set names to play, in order. Repeats are allowed.
    pub queue: Vec<String>,
}

/// Persisted form of a set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SetRecord {
    /// Repetitions of the whole set (>= 1). Defaults to 1.
    #[serde(default, deserialize_with = "lenient::loop_count")]
    #[schemars(with = "Option<u32>")]
    pub loop_count: Option<u32>,

    /// Action slots in slot order. Missing slots are filled with empty actions.
    #[serde(default)]
    pub coordinates: Vec<ActionRecord>,
}

/// Persisted form of an action slot. Every field is optional on input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ActionRecord {
    #[serde(default)]
    pub label: Option<String>,

    /// "left", "right" or "double". Defaults to "left".
    #[serde(default)]
    pub click_type: Option<ClickType>,

    /// Text typed after the click.
    #[serde(default)]
    pub text: Option<String>,

    /// Seconds to wait after the action. Defaults to 0.5.
    #[serde(default, deserialize_with = "lenient::delay")]
    #[schemars(with = "Option<f64>")]
    pub delay: Option<f64>,

    /// Playback order. Defaults to the slot index.
    #[serde(default, deserialize_with = "lenient::order")]
    #[schemars(with = "Option<i32>")]
    pub order: Option<i32>,

    /// `null` until a position has been recorded.
    #[serde(default)]
    pub position: Option<Position>,
}

/// Name-keyed sets that keep document order on both read and write.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SetMap(pub Vec<(String, SetRecord)>);

impl Serialize for SetMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, record) in &self.0 {
            map.serialize_entry(name, record)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for SetMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SetMapVisitor;

        impl<'de> Visitor<'de> for SetMapVisitor {
            type Value = SetMap;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object mapping set names to sets")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<SetMap, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((name, record)) = access.next_entry::<String, SetRecord>()? {
                    entries.push((name, record));
                }
                Ok(SetMap(entries))
            }
        }

        deserializer.deserialize_map(SetMapVisitor)
    }
}
