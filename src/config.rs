use anyhow::{Context, Result};

use crate::models::RecordType;

/// Application configuration, read from environment variables.
///
/// Every variable is optional; defaults reproduce a local single-node
/// OpenSearch setup with the stock demo credentials.
#[derive(Debug, Clone)]
pub struct Config {
    pub backend: BackendConfig,
    pub search: SearchConfig,
    pub summarizer: SummarizerConfig,
}

/// Connection settings for the OpenSearch backend.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Backend hostname (`OPENSEARCH_HOST`, default `localhost`).
    pub host: String,
    /// Backend port (`OPENSEARCH_PORT`, default `9200`).
    pub port: u16,
    /// Sign requests with AWS SigV4 instead of basic auth (`USE_AWS`).
    pub use_aws: bool,
    /// Verify TLS certificates (`VERIFY_CERTS`, default off).
    pub verify_certs: bool,
    /// Basic-auth username (`OPENSEARCH_USERNAME`, default `admin`).
    pub username: String,
    /// Basic-auth password (`OPENSEARCH_PASSWORD`, default `admin`).
    pub password: String,
}

impl BackendConfig {
    /// Base URL of the backend. TLS is always on; only verification is
    /// configurable.
    pub fn url(&self) -> String {
        format!("https://{}:{}", self.host, self.port)
    }
}

/// Query-side settings.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Multi-index alias queried by the type-ahead endpoint (`SEARCH_ALIAS`).
    pub alias: String,
    /// Fields the multi-match query runs over (`SEARCH_FIELDS`,
    /// comma-separated, default `*`).
    pub fields: Vec<String>,
    /// Index holding member communication events (`EVENTS_INDEX`).
    pub events_index: String,
    /// Index-name to record-type mapping (`SEARCH_INDEX_TYPES`).
    pub classifier: IndexClassifier,
}

/// ML summarization settings.
#[derive(Debug, Clone)]
pub struct SummarizerConfig {
    /// Model id under `/_plugins/_ml/models/` (`ML_MODEL_ID`).
    pub model_id: String,
}

/// Maps index names to logical record types.
///
/// Unknown indices classify as the declared fallback type. Entry order is
/// preserved: the first index of a given type is that type's default index
/// for detail lookups.
#[derive(Debug, Clone)]
pub struct IndexClassifier {
    entries: Vec<(String, RecordType)>,
    fallback: RecordType,
}

impl IndexClassifier {
    /// Parse a `index=type,index=type` mapping string.
    pub fn parse(spec: &str, fallback: RecordType) -> Result<IndexClassifier> {
        let mut entries = Vec::new();
        for pair in spec.split(',') {
            let pair = pair.trim();
            if pair.is_empty() {
                continue;
            }
            let (index, type_name) = pair
                .split_once('=')
                .with_context(|| format!("Invalid index mapping entry: '{}'", pair))?;
            let record_type = RecordType::parse(type_name.trim()).with_context(|| {
                format!(
                    "Unknown record type '{}' in index mapping. Must be member or plan.",
                    type_name.trim()
                )
            })?;
            entries.push((index.trim().to_string(), record_type));
        }
        Ok(IndexClassifier { entries, fallback })
    }

    pub fn classify(&self, index: &str) -> RecordType {
        self.entries
            .iter()
            .find(|(name, _)| name == index)
            .map(|(_, t)| *t)
            .unwrap_or(self.fallback)
    }

    /// The first configured index of the given type, used when a detail
    /// request does not name an index explicitly.
    pub fn default_index(&self, record_type: RecordType) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, t)| *t == record_type)
            .map(|(name, _)| name.as_str())
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(v) => parse_bool(&v),
        Err(_) => default,
    }
}

fn parse_bool(v: &str) -> bool {
    v.trim().eq_ignore_ascii_case("true")
}

pub fn load_config() -> Result<Config> {
    let port: u16 = env_or("OPENSEARCH_PORT", "9200")
        .parse()
        .context("OPENSEARCH_PORT must be a valid port number")?;

    let fields: Vec<String> = env_or("SEARCH_FIELDS", "*")
        .split(',')
        .map(|f| f.trim().to_string())
        .filter(|f| !f.is_empty())
        .collect();
    if fields.is_empty() {
        anyhow::bail!("SEARCH_FIELDS must name at least one field");
    }

    let fallback = RecordType::parse(&env_or("INDEX_TYPE_FALLBACK", "plan"))
        .context("INDEX_TYPE_FALLBACK must be member or plan")?;
    let classifier = IndexClassifier::parse(
        &env_or("SEARCH_INDEX_TYPES", "member_1=member,plan_1=plan"),
        fallback,
    )?;

    // Detail requests without an explicit index need a default for each type.
    for record_type in [RecordType::Member, RecordType::Plan] {
        if classifier.default_index(record_type).is_none() {
            anyhow::bail!(
                "SEARCH_INDEX_TYPES must map at least one index to type '{}'",
                record_type
            );
        }
    }

    Ok(Config {
        backend: BackendConfig {
            host: env_or("OPENSEARCH_HOST", "localhost"),
            port,
            use_aws: env_bool("USE_AWS", false),
            verify_certs: env_bool("VERIFY_CERTS", false),
            username: env_or("OPENSEARCH_USERNAME", "admin"),
            password: env_or("OPENSEARCH_PASSWORD", "admin"),
        },
        search: SearchConfig {
            alias: env_or("SEARCH_ALIAS", "smart_search_alias"),
            fields,
            events_index: env_or("EVENTS_INDEX", "member_communication_events"),
            classifier,
        },
        summarizer: SummarizerConfig {
            model_id: env_or("ML_MODEL_ID", "rluzGZcBSgqcBodJYVXj"),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("true"));
        assert!(parse_bool("TRUE"));
        assert!(parse_bool(" True "));
        assert!(!parse_bool("false"));
        assert!(!parse_bool("1"));
        assert!(!parse_bool(""));
    }

    #[test]
    fn test_classifier_default_mapping() {
        let c = IndexClassifier::parse("member_1=member,plan_1=plan", RecordType::Plan).unwrap();
        assert_eq!(c.classify("member_1"), RecordType::Member);
        assert_eq!(c.classify("plan_1"), RecordType::Plan);
        // Anything unmapped classifies as the fallback type.
        assert_eq!(c.classify("member_2"), RecordType::Plan);
        assert_eq!(c.classify(""), RecordType::Plan);
    }

    #[test]
    fn test_classifier_default_index_preserves_order() {
        let c = IndexClassifier::parse(
            "member_1=member,member_2=member,plan_1=plan",
            RecordType::Plan,
        )
        .unwrap();
        assert_eq!(c.default_index(RecordType::Member), Some("member_1"));
        assert_eq!(c.default_index(RecordType::Plan), Some("plan_1"));
    }

    #[test]
    fn test_classifier_missing_type_has_no_default_index() {
        let c = IndexClassifier::parse("member_1=member", RecordType::Plan).unwrap();
        assert_eq!(c.default_index(RecordType::Plan), None);
    }

    #[test]
    fn test_classifier_rejects_unknown_type() {
        assert!(IndexClassifier::parse("claims_1=claim", RecordType::Plan).is_err());
    }

    #[test]
    fn test_classifier_rejects_malformed_entry() {
        assert!(IndexClassifier::parse("member_1", RecordType::Plan).is_err());
    }

    #[test]
    fn test_classifier_tolerates_whitespace_and_empty_entries() {
        let c =
            IndexClassifier::parse(" member_1 = member , ,plan_1=plan,", RecordType::Plan).unwrap();
        assert_eq!(c.classify("member_1"), RecordType::Member);
        assert_eq!(c.classify("plan_1"), RecordType::Plan);
    }
}
