use schemars::{Schema, schema_for};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;
use tracing::{debug, warn};

use super::document::{ActionRecord, Document, SetMap, SetRecord};
use crate::error::DocumentError;
use crate::model::{Action, ActionSet, DEFAULT_DELAY_SECS, MAX_ACTIONS, SetRegistry, Workspace};

/// Top-level shape before the required collections are checked.
#[derive(Deserialize)]
struct RawDocument {
    #[serde(default)]
    sets: Option<SetMap>,
    #[serde(default)]
    queue: Option<Vec<String>>,
}

/// Snapshot a workspace into its document form. Every slot is written.
pub fn encode(workspace: &Workspace) -> Document {
    let sets = workspace
        .registry()
        .sets()
        .map(|set| (set.name().to_string(), encode_set(set)))
        .collect();
    Document {
        sets: SetMap(sets),
        queue: workspace.queue().snapshot(),
    }
}

fn encode_set(set: &ActionSet) -> SetRecord {
    SetRecord {
        loop_count: Some(set.loop_count()),
        coordinates: set.actions().iter().map(encode_action).collect(),
    }
}

fn encode_action(action: &Action) -> ActionRecord {
    ActionRecord {
        label: Some(action.label.clone()),
        click_type: Some(action.click_type),
        text: Some(action.text.clone()),
        delay: Some(action.delay),
        order: Some(action.order),
        position: action.position,
    }
}

/// Rebuild a workspace, backfilling every missing field with slot defaults.
pub fn decode(document: Document) -> Workspace {
    let sets = document
        .sets
        .0
        .into_iter()
        .map(|(name, record)| decode_set(name, record));
    Workspace::from_parts(SetRegistry::from_sets(sets), document.queue)
}

fn decode_set(name: String, record: SetRecord) -> ActionSet {
    if record.coordinates.len() > MAX_ACTIONS {
        warn!(
            target: "macroqueue::persistence",
            set = %name,
            found = record.coordinates.len(),
            capacity = MAX_ACTIONS,
            "Set has more actions than slots; extra actions dropped"
        );
    }
    let mut set = ActionSet::new(name);
    set.loop_count = record.loop_count.unwrap_or(1).max(1);
    for (slot, action) in record.coordinates.into_iter().take(MAX_ACTIONS).enumerate() {
        set.actions[slot] = decode_action(slot, action);
    }
    set
}

fn decode_action(slot: usize, record: ActionRecord) -> Action {
    let defaults = Action::empty(slot);
    Action {
        label: record.label.unwrap_or(defaults.label),
        position: record.position,
        click_type: record.click_type.unwrap_or(defaults.click_type),
        text: record.text.unwrap_or(defaults.text),
        delay: record.delay.unwrap_or(DEFAULT_DELAY_SECS),
        order: record.order.unwrap_or(defaults.order),
    }
}

fn check_raw(raw: RawDocument) -> Result<Document, DocumentError> {
    Ok(Document {
        sets: raw.sets.ok_or(DocumentError::MissingCollection("sets"))?,
        queue: raw.queue.ok_or(DocumentError::MissingCollection("queue"))?,
    })
}

/// Parse a document from a JSON string.
pub fn from_str(s: &str) -> Result<Workspace, DocumentError> {
    let raw: RawDocument = serde_json::from_str(s)?;
    Ok(decode(check_raw(raw)?))
}

/// Parse a document from any reader.
pub fn from_reader<R: Read>(reader: R) -> Result<Workspace, DocumentError> {
    let raw: RawDocument = serde_json::from_reader(reader)?;
    Ok(decode(check_raw(raw)?))
}

/// Pretty-printed JSON for a workspace.
pub fn to_string_pretty(workspace: &Workspace) -> Result<String, DocumentError> {
    Ok(serde_json::to_string_pretty(&encode(workspace))?)
}

/// Load a document from a file path synchronously.
pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Workspace, DocumentError> {
    let path_ref = path.as_ref();
    let file = File::open(path_ref).map_err(|source| DocumentError::Io {
        path: path_ref.to_path_buf(),
        source,
    })?;
    let workspace = from_reader(BufReader::new(file))?;
    debug!(target: "macroqueue::persistence", path = %path_ref.display(), "Loaded document");
    Ok(workspace)
}

/// Load a document from a file path asynchronously (Tokio).
pub async fn load_from_path_async<P: AsRef<Path>>(path: P) -> Result<Workspace, DocumentError> {
    let path_ref = path.as_ref();
    let bytes = tokio::fs::read(path_ref)
        .await
        .map_err(|source| DocumentError::Io {
            path: path_ref.to_path_buf(),
            source,
        })?;
    let raw: RawDocument = serde_json::from_slice(&bytes)?;
    let workspace = decode(check_raw(raw)?);
    debug!(target: "macroqueue::persistence", path = %path_ref.display(), "Loaded document");
    Ok(workspace)
}

/// Write a document to a file path synchronously.
pub fn save_to_path<P: AsRef<Path>>(workspace: &Workspace, path: P) -> Result<(), DocumentError> {
    let path_ref = path.as_ref();
    let json = to_string_pretty(workspace)?;
    std::fs::write(path_ref, json).map_err(|source| DocumentError::Io {
        path: path_ref.to_path_buf(),
        source,
    })?;
    debug!(target: "macroqueue::persistence", path = %path_ref.display(), "Saved document");
    Ok(())
}

/// Write a document to a file path asynchronously (Tokio).
pub async fn save_to_path_async<P: AsRef<Path>>(
    workspace: &Workspace,
    path: P,
) -> Result<(), DocumentError> {
    let path_ref = path.as_ref();
    let json = to_string_pretty(workspace)?;
    tokio::fs::write(path_ref, json)
        .await
        .map_err(|source| DocumentError::Io {
            path: path_ref.to_path_buf(),
            source,
        })?;
    debug!(target: "macroqueue::persistence", path = %path_ref.display(), "Saved document");
    Ok(())
}

/// JSON Schema for the document format.
pub fn generate_schema() -> Schema {
    schema_for!(Document)
}

/// Write the document JSON Schema to any writer (pretty-printed).
pub fn write_schema_to_writer<W: Write>(mut writer: W) -> anyhow::Result<()> {
    use anyhow::Context;
    let json = serde_json::to_string_pretty(&generate_schema()).context("Failed to serialize schema")?;
    writer
        .write_all(json.as_bytes())
        .context("Failed to write schema to writer")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ClickType, Position};
    use serde_json::json;

    fn sample_workspace() -> Workspace {
        let mut ws = Workspace::new();
        let second = ws.registry_mut().create_set();
        ws.rename_set(&second, "Checkout").unwrap();
        let reg = ws.registry_mut();
        reg.record_action_position("Set 1", 0, Position::new(100, 200))
            .unwrap();
        reg.update_action(
            "Set 1",
            0,
            crate::model::ActionUpdate {
                click_type: Some(ClickType::Double),
                text: Some("hello".into()),
                delay: Some(0.25),
                order: Some(7),
                ..Default::default()
            },
        )
        .unwrap();
        reg.record_action_position("Checkout", 4, Position::new(-3, 9))
            .unwrap();
        reg.set_loop_count("Checkout", 3).unwrap();
        ws.enqueue("Checkout").unwrap();
        ws.enqueue("Set 1").unwrap();
        ws.enqueue("Checkout").unwrap();
        ws
    }

    #[test]
    fn round_trip_preserves_model() {
        let ws = sample_workspace();
        let json = to_string_pretty(&ws).unwrap();
        let back = from_str(&json).unwrap();
        assert_eq!(back.registry().set_names(), vec!["Set 1", "Checkout"]);
        assert_eq!(back.queue().snapshot(), ws.queue().snapshot());
        for (a, b) in ws.registry().sets().zip(back.registry().sets()) {
            assert_eq!(a, b);
        }
    }

    #[test]
    fn set_order_follows_document_not_alphabet() {
        // Raw text: `json!` would sort the keys.
        let doc = r#"{ "sets": { "zeta": {}, "alpha": {} }, "queue": [] }"#;
        let ws = from_str(doc).unwrap();
        assert_eq!(ws.registry().set_names(), vec!["zeta", "alpha"]);
    }

    #[test]
    fn missing_collections_are_reported() {
        let err = from_str(r#"{"queue": []}"#).unwrap_err();
        assert!(matches!(err, DocumentError::MissingCollection("sets")));

        let err = from_str(r#"{"sets": {}}"#).unwrap_err();
        assert!(matches!(err, DocumentError::MissingCollection("queue")));

        let err = from_str("not json").unwrap_err();
        assert!(matches!(err, DocumentError::Parse(_)));
    }

    #[test]
    fn missing_action_fields_are_backfilled() {
        let doc = json!({
            "sets": {
                "Set 1": {
                    "coordinates": [
                        { "position": { "x": 1, "y": 2 } },
                        { "label": "second", "delay": "bogus", "click_type": "right" }
                    ]
                }
            },
            "queue": ["Set 1"]
        });
        let ws = from_str(&doc.to_string()).unwrap();
        let set = ws.registry().get("Set 1").unwrap();
        assert_eq!(set.loop_count(), 1);
        assert_eq!(set.actions().len(), MAX_ACTIONS);

        let first = set.action(0).unwrap();
        assert_eq!(first.delay, DEFAULT_DELAY_SECS);
        assert_eq!(first.click_type, ClickType::Left);
        assert_eq!(first.order, 0);
        assert_eq!(first.text, "");
        assert_eq!(first.label, "Point 1");
        assert_eq!(first.position, Some(Position::new(1, 2)));

        let second = set.action(1).unwrap();
        assert_eq!(second.label, "second");
        assert_eq!(second.delay, DEFAULT_DELAY_SECS);
        assert_eq!(second.click_type, ClickType::Right);
        assert_eq!(second.order, 1);
        assert!(second.position.is_none());

        assert_eq!(set.action(2), Some(&Action::empty(2)));
    }

    #[test]
    fn oversized_sets_are_truncated() {
        let coords: Vec<_> = (0..25).map(|i| json!({ "order": i })).collect();
        let doc = json!({ "sets": { "big": { "coordinates": coords, "loop_count": "0" } }, "queue": [] });
        let ws = from_str(&doc.to_string()).unwrap();
        let set = ws.registry().get("big").unwrap();
        assert_eq!(set.actions().len(), MAX_ACTIONS);
        assert_eq!(set.loop_count(), 1);
    }

    #[test]
    fn schema_mentions_both_collections() {
        let schema = serde_json::to_value(generate_schema()).unwrap();
        let required = schema["required"].as_array().unwrap();
        assert!(required.contains(&json!("sets")));
        assert!(required.contains(&json!("queue")));
    }
}
