use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Prefix keeping key-value documents apart from design documents.
pub const KV_PREFIX: &str = "kv::";

/// One stored key: the document id is derived from the key, the payload lives in `value`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchKvDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    pub value: Value,
}

/// Document id for a store key.
pub fn kv_doc_id(key: &str) -> String {
    format!("{KV_PREFIX}{key}")
}

/// Percent-encode a document id so it fits in a single URL path segment.
pub fn encode_path_segment(doc_id: &str) -> String {
    let mut encoded = String::with_capacity(doc_id.len());
    for byte in doc_id.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~') {
            encoded.push(byte as char);
        } else {
            let _ = write!(encoded, "%{byte:02X}");
        }
    }
    encoded
}
