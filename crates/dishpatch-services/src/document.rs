// ── Document and path types ──
//
// A document is an opaque JSON field map under a store-assigned id.
// Paths are slash-separated segment lists: an odd segment count names
// a collection ("users", "users/u1/orders"), an even count a single
// document ("users/u1").

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::StoreError;

/// Field map type used throughout the store surface.
pub type Fields = Map<String, Value>;

/// A single stored document: store-assigned id plus its field map.
///
/// `#[serde(flatten)]` keeps the wire shape flat -- the id sits next
/// to the fields, exactly as consumers decode it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,

    #[serde(flatten)]
    pub fields: Fields,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Convenience lookup into the field map.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

// ── Path validation ──────────────────────────────────────────────────

fn segments(path: &str) -> Result<Vec<&str>, StoreError> {
    if path.is_empty() {
        return Err(StoreError::InvalidPath {
            path: path.to_owned(),
            reason: "path is empty".into(),
        });
    }
    let segs: Vec<&str> = path.split('/').collect();
    if segs.iter().any(|s| s.is_empty()) {
        return Err(StoreError::InvalidPath {
            path: path.to_owned(),
            reason: "path contains an empty segment".into(),
        });
    }
    Ok(segs)
}

/// Validate a collection path (odd number of segments).
pub fn validate_collection_path(path: &str) -> Result<(), StoreError> {
    let segs = segments(path)?;
    if segs.len() % 2 == 0 {
        return Err(StoreError::InvalidPath {
            path: path.to_owned(),
            reason: "collection paths need an odd number of segments".into(),
        });
    }
    Ok(())
}

/// Validate a document path (even number of segments) and split it
/// into its parent collection path and document id.
pub fn split_document_path(path: &str) -> Result<(&str, &str), StoreError> {
    let segs = segments(path)?;
    if segs.len() % 2 != 0 {
        return Err(StoreError::InvalidPath {
            path: path.to_owned(),
            reason: "document paths need an even number of segments".into(),
        });
    }
    // Guaranteed by the even-count check above: at least one '/'.
    path.rsplit_once('/')
        .ok_or_else(|| StoreError::InvalidPath {
            path: path.to_owned(),
            reason: "document paths need an even number of segments".into(),
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn collection_paths_need_odd_segments() {
        assert!(validate_collection_path("users").is_ok());
        assert!(validate_collection_path("users/u1/orders").is_ok());
        assert!(validate_collection_path("users/u1").is_err());
        assert!(validate_collection_path("").is_err());
        assert!(validate_collection_path("users//orders").is_err());
    }

    #[test]
    fn document_paths_split_into_collection_and_id() {
        let (collection, id) = split_document_path("users/u1").unwrap();
        assert_eq!(collection, "users");
        assert_eq!(id, "u1");

        let (collection, id) = split_document_path("users/u1/orders/o9").unwrap();
        assert_eq!(collection, "users/u1/orders");
        assert_eq!(id, "o9");

        assert!(split_document_path("users").is_err());
        assert!(split_document_path("/users/u1").is_err());
    }

    #[test]
    fn document_roundtrips_with_flat_fields() {
        let mut fields = Fields::new();
        fields.insert("name".into(), Value::String("Ada".into()));
        let doc = Document::new("u1", fields);

        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["id"], "u1");
        assert_eq!(json["name"], "Ada");

        let back: Document = serde_json::from_value(json).unwrap();
        assert_eq!(back, doc);
    }
}
