//! Summarization gateway.
//!
//! Sends a record (or a record merged with its communication events) to the
//! cluster-hosted ML inference endpoint and extracts the generated summary
//! from its nested response envelope.
//!
//! Summarization is a best-effort enrichment: the [`Summarizer`] trait is
//! explicitly fallible, and the request handler substitutes
//! [`SUMMARY_UNAVAILABLE`] on any error so a record is always returned even
//! when the model call fails.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::backend::OpenSearchClient;
use crate::config::SummarizerConfig;

/// Placeholder returned in place of a summary when the inference call fails.
pub const SUMMARY_UNAVAILABLE: &str = "Unable to generate summary";

const SYSTEM_PROMPT: &str = "Summarize the json response to a user readable format so that it \
    can be displayed in a chat interface. If the data is a member, display the communication \
    events on top of the member data in the summary.";

/// Produces a natural-language summary of an arbitrary JSON payload.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, payload: &Value) -> Result<String>;
}

/// Summarizer backed by the OpenSearch ML plugin's predict API.
pub struct MlSummarizer {
    client: Arc<OpenSearchClient>,
    model_id: String,
}

impl MlSummarizer {
    pub fn new(client: Arc<OpenSearchClient>, config: &SummarizerConfig) -> MlSummarizer {
        MlSummarizer {
            client,
            model_id: config.model_id.clone(),
        }
    }
}

#[async_trait]
impl Summarizer for MlSummarizer {
    async fn summarize(&self, payload: &Value) -> Result<String> {
        let path = format!("/_plugins/_ml/models/{}/_predict", self.model_id);
        let response = self.client.post_json(&path, &predict_body(payload)).await?;
        extract_summary(&response)
    }
}

/// Build the chat-style predict request: the fixed system instruction plus
/// the stringified payload as the user message.
fn predict_body(payload: &Value) -> Value {
    serde_json::json!({
        "parameters": {
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": payload.to_string()}
            ]
        }
    })
}

/// Extract the generated text from the predict response.
///
/// The envelope nests the chat completion several layers deep:
/// `inference_results[0].output[0].dataAsMap.choices[0].message.content`.
/// Any missing layer or a non-string content field is an error.
fn extract_summary(response: &Value) -> Result<String> {
    response
        .pointer("/inference_results/0/output/0/dataAsMap/choices/0/message/content")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| anyhow!("ML predict response missing choices[0].message.content"))
}
