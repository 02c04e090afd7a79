//! Core data types shared by the request handlers.
//!
//! These types represent the records that flow from the search backend out to
//! HTTP clients: classified search hits and the summarized detail envelope.

use anyhow::{anyhow, Result};
use serde::Serialize;
use serde_json::Value;

use crate::config::IndexClassifier;

/// Logical record type, inferred from the index a document lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordType {
    Member,
    Plan,
}

impl RecordType {
    /// Parse a query-string value. Anything other than `"member"` or
    /// `"plan"` is rejected.
    pub fn parse(s: &str) -> Option<RecordType> {
        match s {
            "member" => Some(RecordType::Member),
            "plan" => Some(RecordType::Plan),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::Member => "member",
            RecordType::Plan => "plan",
        }
    }
}

impl std::fmt::Display for RecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One type-ahead search result, flattened from a backend hit.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub id: String,
    #[serde(rename = "type")]
    pub record_type: RecordType,
    pub data: Value,
    pub index: String,
}

/// Map a raw backend hit to a [`SearchResult`].
///
/// A hit must carry string `_id` and `_index` fields; `_source` defaults to
/// an empty object when absent. Callers skip (and log) hits that fail here
/// rather than aborting the whole request.
pub fn result_from_hit(hit: &Value, classifier: &IndexClassifier) -> Result<SearchResult> {
    let id = hit
        .get("_id")
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("hit is missing _id"))?
        .to_string();
    let index = hit
        .get("_index")
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("hit is missing _index"))?
        .to_string();
    let data = hit
        .get("_source")
        .cloned()
        .unwrap_or_else(|| Value::Object(Default::default()));

    Ok(SearchResult {
        id,
        record_type: classifier.classify(&index),
        data,
        index,
    })
}
