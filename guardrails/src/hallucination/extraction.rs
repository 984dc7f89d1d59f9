//! Semantic claim extraction and claim-set assembly.

use scriptorium_backend::{GenerationBackend, GenerationRequest};
use serde::Deserialize;
use tracing::warn;

use super::types::{Claim, ClaimCategory};

/// Cap on claims returned by the semantic pass.
const SEMANTIC_CLAIM_LIMIT: usize = 20;
/// Cap on the combined, deduplicated claim set.
pub const TOTAL_CLAIM_LIMIT: usize = 50;

#[derive(Debug, Deserialize)]
struct SemanticClaim {
    text: String,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    source_sentence: Option<String>,
}

fn parse_category(raw: Option<&str>) -> ClaimCategory {
    match raw.map(str::to_lowercase).as_deref() {
        Some("statistic") | Some("statistics") => ClaimCategory::Statistic,
        Some("date") | Some("dates") => ClaimCategory::Date,
        Some("quote") | Some("quotes") => ClaimCategory::Quote,
        Some("fact") | Some("facts") => ClaimCategory::Fact,
        _ => ClaimCategory::Other,
    }
}

fn extraction_prompt(content: &str, content_type: &str) -> String {
    format!(
        "Extract the verifiable factual claims from the following {content_type} \
         content: statistical data, historical facts and dates, direct quotes \
         with attribution, and scientific or geographic claims. Return a JSON \
         array, at most {SEMANTIC_CLAIM_LIMIT} entries, each shaped as \
         {{\"text\": \"exact claim text\", \"category\": \"statistic|date|quote|fact|other\", \
         \"confidence\": 0.8, \"source_sentence\": \"full sentence\"}}.\n\nContent:\n{}",
        crate::util::prefix(content, 2_000)
    )
}

/// One backend call extracting up to twenty claims. Any failure, including
/// an unparseable response, yields an empty set so the pattern pass is
/// never affected.
pub async fn extract_semantic(
    backend: &dyn GenerationBackend,
    content: &str,
    content_type: &str,
) -> Vec<Claim> {
    let request = GenerationRequest::new(extraction_prompt(content, content_type))
        .with_max_tokens(1_500);
    let response = match backend.generate(request).await {
        Ok(response) => response,
        Err(err) => {
            warn!(error = %err, "semantic claim extraction failed");
            return Vec::new();
        }
    };
    let parsed: Vec<SemanticClaim> = match serde_json::from_str(&response.content) {
        Ok(parsed) => parsed,
        Err(err) => {
            warn!(error = %err, "semantic claim extraction returned unparseable JSON");
            return Vec::new();
        }
    };

    parsed
        .into_iter()
        .take(SEMANTIC_CLAIM_LIMIT)
        .enumerate()
        .filter(|(_, c)| !c.text.trim().is_empty())
        .map(|(i, c)| {
            let span = content
                .find(&c.text)
                .map(|start| (start, start + c.text.len()))
                .unwrap_or((0, 0));
            Claim {
                id: format!("ai_claim_{}", i + 1),
                category: parse_category(c.category.as_deref()),
                confidence: c.confidence.unwrap_or(0.5).clamp(0.0, 1.0),
                sentence: c.source_sentence.unwrap_or_default(),
                span,
                text: c.text,
            }
        })
        .collect()
}

/// Normalized claim text used for deduplication and cache keys.
pub fn normalize(text: &str) -> String {
    text.to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Merge claim sets: first occurrence of a normalized text wins, capped at
/// [`TOTAL_CLAIM_LIMIT`].
pub fn dedup_and_cap(claims: Vec<Claim>) -> Vec<Claim> {
    let mut seen = std::collections::HashSet::new();
    claims
        .into_iter()
        .filter(|claim| seen.insert(normalize(&claim.text)))
        .take(TOTAL_CLAIM_LIMIT)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scriptorium_backend::{BackendError, ScriptedBackend};

    #[tokio::test]
    async fn semantic_claims_are_parsed_with_spans() {
        let backend = ScriptedBackend::new().with_default(
            r#"[{"text": "CRISPR was adapted for editing in 2012", "category": "fact", "confidence": 0.9, "source_sentence": "CRISPR was adapted for editing in 2012."}]"#,
        );
        let content = "CRISPR was adapted for editing in 2012.";
        let claims = extract_semantic(&backend, content, "article").await;
        assert_eq!(claims.len(), 1);
        assert_eq!(claims[0].category, ClaimCategory::Fact);
        assert_eq!(claims[0].span.0, 0);
    }

    #[tokio::test]
    async fn backend_failure_yields_empty_set() {
        let backend = ScriptedBackend::new()
            .push_error(BackendError::Network("down".into()));
        let claims = extract_semantic(&backend, "content", "article").await;
        assert!(claims.is_empty());
    }

    #[tokio::test]
    async fn garbage_json_yields_empty_set() {
        let backend = ScriptedBackend::new().with_default("not json at all");
        let claims = extract_semantic(&backend, "content", "article").await;
        assert!(claims.is_empty());
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        let mk = |id: &str, text: &str| Claim {
            id: id.into(),
            text: text.into(),
            category: ClaimCategory::Other,
            confidence: 0.7,
            sentence: String::new(),
            span: (0, 0),
        };
        let claims = vec![
            mk("a", "Rose by 12%"),
            mk("b", "rose  by 12%"),
            mk("c", "another claim"),
        ];
        let deduped = dedup_and_cap(claims);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].id, "a");
    }

    #[test]
    fn claim_set_is_capped_at_fifty() {
        let claims: Vec<Claim> = (0..80)
            .map(|i| Claim {
                id: format!("c{i}"),
                text: format!("claim number {i}"),
                category: ClaimCategory::Other,
                confidence: 0.7,
                sentence: String::new(),
                span: (0, 0),
            })
            .collect();
        assert_eq!(dedup_and_cap(claims).len(), TOTAL_CLAIM_LIMIT);
    }
}
