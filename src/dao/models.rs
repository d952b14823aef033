//! Persisted save layout shared by every game.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

/// Schema version written into new documents. Informational only.
pub const SAVE_VERSION: u32 = 1;

/// Opaque per-game save object: field name to arbitrary JSON value.
pub type GameSave = IndexMap<String, Value>;

/// The single document holding every game's progress for one profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveDocument {
    /// Schema version the document was written with.
    #[serde(default = "default_version")]
    pub version: u32,
    /// Site-wide counters.
    #[serde(default)]
    pub global: GlobalStats,
    /// Save slices keyed by game identifier, created lazily on first write.
    #[serde(default)]
    pub games: IndexMap<String, GameSave>,
    /// Top-level keys this build does not know about, kept so newer data survives a round-trip.
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// Counters shared by the whole hub.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalStats {
    /// Number of times the hub was opened. Never decreases.
    #[serde(default)]
    pub total_site_loads: u64,
    /// Legacy flat keys already folded into the document; they are never read again.
    #[serde(default, skip_serializing_if = "IndexSet::is_empty")]
    pub legacy_imported: IndexSet<String>,
    /// Unknown counters written by newer builds.
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl Default for SaveDocument {
    fn default() -> Self {
        Self {
            version: SAVE_VERSION,
            global: GlobalStats::default(),
            games: IndexMap::new(),
            extra: IndexMap::new(),
        }
    }
}

fn default_version() -> u32 {
    SAVE_VERSION
}

impl SaveDocument {
    /// Read a game's slice, or an empty one when it was never written.
    pub fn game(&self, game_id: &str) -> GameSave {
        self.games.get(game_id).cloned().unwrap_or_default()
    }

    /// Shallow-merge `patch` into the slice of `game_id`, creating it if needed.
    pub fn merge_game(&mut self, game_id: &str, patch: GameSave) {
        let slice = self.games.entry(game_id.to_owned()).or_default();
        for (field, value) in patch {
            slice.insert(field, value);
        }
    }

    /// Replace the slice of `game_id` wholesale.
    pub fn replace_game(&mut self, game_id: &str, slice: GameSave) {
        self.games.insert(game_id.to_owned(), slice);
    }
}

/// Why a stored value could not be read as a [`SaveDocument`].
#[derive(Debug, Error)]
pub enum DocumentShapeError {
    /// The stored value is neither an object nor text holding one.
    #[error("stored value is not a JSON object")]
    NotAnObject,
    /// Text value that does not parse as JSON.
    #[error("stored text is not valid JSON")]
    Text(#[source] serde_json::Error),
    /// An object whose known fields have the wrong types.
    #[error("stored object does not match the save layout")]
    Fields(#[source] serde_json::Error),
}

/// Interpret a raw stored value as a save document.
///
/// Accepts an object, or a string containing a serialized object (the
/// flat text layout used by the legacy store). Missing fields take their
/// defaults; unknown top-level keys are kept.
pub fn parse_document(raw: Value) -> Result<SaveDocument, DocumentShapeError> {
    let value = match raw {
        Value::String(text) => {
            serde_json::from_str::<Value>(&text).map_err(DocumentShapeError::Text)?
        }
        other => other,
    };
    if !value.is_object() {
        return Err(DocumentShapeError::NotAnObject);
    }
    serde_json::from_value(value).map_err(DocumentShapeError::Fields)
}

/// Interpret a raw stored value as a standalone per-game object (legacy flat keys).
pub fn parse_slice(raw: Value) -> Option<GameSave> {
    let value = match raw {
        Value::String(text) => serde_json::from_str::<Value>(&text).ok()?,
        other => other,
    };
    match value {
        Value::Object(map) => Some(map.into_iter().collect()),
        _ => None,
    }
}

/// Decode a slice into a typed view, falling back to defaults on mismatch.
pub fn decode_slice<T>(game_id: &str, slice: &GameSave) -> T
where
    T: DeserializeOwned + Default,
{
    let object = Value::Object(
        slice
            .iter()
            .map(|(field, value)| (field.clone(), value.clone()))
            .collect(),
    );
    match serde_json::from_value(object) {
        Ok(typed) => typed,
        Err(err) => {
            warn!(game_id, error = %err, "save slice has an unexpected shape; using defaults");
            T::default()
        }
    }
}

/// Encode a typed patch into slice fields. Fields serialized as absent stay absent.
pub fn encode_patch<T>(patch: &T) -> Result<GameSave, serde_json::Error>
where
    T: Serialize,
{
    let value = serde_json::to_value(patch)?;
    serde_json::from_value(value)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn default_document_matches_the_empty_layout() {
        let value = serde_json::to_value(SaveDocument::default()).unwrap();
        assert_eq!(
            value,
            json!({"version": 1, "global": {"totalSiteLoads": 0}, "games": {}})
        );
    }

    #[test]
    fn missing_fields_take_defaults() {
        let doc = parse_document(json!({"games": {"clicker": {"highScore": 3}}})).unwrap();
        assert_eq!(doc.version, 1);
        assert_eq!(doc.global.total_site_loads, 0);
        assert_eq!(doc.game("clicker").get("highScore"), Some(&json!(3)));
    }

    #[test]
    fn unknown_top_level_keys_round_trip() {
        let raw = json!({
            "version": 2,
            "global": {"totalSiteLoads": 4, "streak": 2},
            "games": {},
            "profile": {"name": "ada"}
        });
        let doc = parse_document(raw.clone()).unwrap();
        assert_eq!(doc.extra.get("profile"), Some(&json!({"name": "ada"})));
        assert_eq!(serde_json::to_value(&doc).unwrap(), raw);
    }

    #[test]
    fn text_values_are_parsed() {
        let doc = parse_document(json!("{\"global\":{\"totalSiteLoads\":9}}")).unwrap();
        assert_eq!(doc.global.total_site_loads, 9);
    }

    #[test]
    fn malformed_values_are_rejected() {
        assert!(matches!(
            parse_document(json!("{oops")),
            Err(DocumentShapeError::Text(_))
        ));
        assert!(matches!(
            parse_document(json!([1, 2])),
            Err(DocumentShapeError::NotAnObject)
        ));
        assert!(matches!(
            parse_document(json!({"games": 5})),
            Err(DocumentShapeError::Fields(_))
        ));
    }

    #[test]
    fn merge_overwrites_present_keys_and_keeps_the_rest() {
        let mut doc = SaveDocument::default();
        doc.merge_game("memory", encode_patch(&json!({"wins": 1, "bestTimeMs": 900})).unwrap());
        doc.merge_game("memory", encode_patch(&json!({"wins": 2})).unwrap());

        assert_eq!(
            serde_json::to_value(doc.game("memory")).unwrap(),
            json!({"wins": 2, "bestTimeMs": 900})
        );
    }

    #[test]
    fn absent_slice_reads_as_empty() {
        assert!(SaveDocument::default().game("nope").is_empty());
    }

    #[test]
    fn slices_accept_objects_and_object_text_only() {
        assert_eq!(
            parse_slice(json!("{\"highScore\":12}")).unwrap().get("highScore"),
            Some(&json!(12))
        );
        assert!(parse_slice(json!(12)).is_none());
        assert!(parse_slice(json!("nope")).is_none());
    }

    #[derive(Debug, Default, Deserialize, PartialEq)]
    #[serde(rename_all = "camelCase")]
    struct Typed {
        #[serde(default)]
        high_score: u64,
    }

    #[test]
    fn decode_slice_falls_back_on_wrong_types() {
        let mut slice = GameSave::new();
        slice.insert("highScore".into(), json!("lots"));
        assert_eq!(decode_slice::<Typed>("clicker", &slice), Typed::default());

        slice.insert("highScore".into(), json!(7));
        assert_eq!(decode_slice::<Typed>("clicker", &slice), Typed { high_score: 7 });
    }
}
