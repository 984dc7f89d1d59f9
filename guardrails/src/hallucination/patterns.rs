//! Pattern-based claim extraction.

use once_cell::sync::Lazy;
use regex::Regex;

use super::types::{Claim, ClaimCategory};

static STATISTIC_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"\b\d+(?:\.\d+)?%").unwrap(),
        Regex::new(r"\b\d{1,3}(?:,\d{3})*(?:\.\d+)?\s+(?:million|billion|trillion)\b").unwrap(),
        Regex::new(r"\b\d+(?:\.\d+)?\s+(?:times|fold)\b").unwrap(),
        Regex::new(r"\b(?:increased|decreased|rose|fell)\s+by\s+\d+(?:\.\d+)?%?").unwrap(),
    ]
});

static DATE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(
            r"\b(?:January|February|March|April|May|June|July|August|September|October|November|December)\s+\d{1,2},?\s+\d{4}\b",
        )
        .unwrap(),
        Regex::new(r"\b\d{1,2}/\d{1,2}/\d{4}\b").unwrap(),
        Regex::new(r"\b\d{4}-\d{2}-\d{2}\b").unwrap(),
        Regex::new(r"\bin\s+\d{4}\b").unwrap(),
    ]
});

static QUOTE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r#""[^"]{20,200}""#).unwrap(),
        Regex::new(r#"said\s+"[^"]+""#).unwrap(),
        Regex::new(r#"according\s+to\s+[^,]+,\s+"[^"]+""#).unwrap(),
    ]
});

static FACT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(
            r"\b(?:is|was|are|were)\s+(?:the\s+)?(?:first|last|only|largest|smallest|highest|lowest)\b",
        )
        .unwrap(),
        Regex::new(r"\b(?:founded|established|created|invented)\s+in\s+\d{4}\b").unwrap(),
        Regex::new(r"\b(?:located|situated)\s+in\s+[A-Z][a-z]+(?:\s+[A-Z][a-z]+)*").unwrap(),
    ]
});

/// Confidence assigned to every pattern-extracted claim.
pub const PATTERN_CONFIDENCE: f64 = 0.7;

fn families() -> [(ClaimCategory, &'static [Regex]); 4] {
    [
        (ClaimCategory::Statistic, STATISTIC_PATTERNS.as_slice()),
        (ClaimCategory::Date, DATE_PATTERNS.as_slice()),
        (ClaimCategory::Quote, QUOTE_PATTERNS.as_slice()),
        (ClaimCategory::Fact, FACT_PATTERNS.as_slice()),
    ]
}

/// The sentence enclosing a character span.
pub fn enclosing_sentence(content: &str, start: usize, end: usize) -> String {
    let sentence_start = content[..start].rfind(['.', '!', '?']).map(|i| i + 1).unwrap_or(0);
    let sentence_end = content[end..]
        .find(['.', '!', '?'])
        .map(|i| end + i + 1)
        .unwrap_or(content.len());
    content[sentence_start..sentence_end].trim().to_string()
}

/// Extract claims by regex family. Infallible; always runs regardless of
/// the semantic pass.
pub fn extract(content: &str) -> Vec<Claim> {
    let mut claims = Vec::new();
    let mut counter = 1usize;
    for (category, patterns) in families() {
        for pattern in patterns {
            for m in pattern.find_iter(content) {
                claims.push(Claim {
                    id: format!("pattern_claim_{counter}"),
                    text: m.as_str().to_string(),
                    category,
                    confidence: PATTERN_CONFIDENCE,
                    sentence: enclosing_sentence(content, m.start(), m.end()),
                    span: (m.start(), m.end()),
                });
                counter += 1;
            }
        }
    }
    claims
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentages_are_statistics() {
        let claims = extract("Honey production rose by 12% in 2021.");
        assert!(claims
            .iter()
            .any(|c| c.category == ClaimCategory::Statistic && c.text.contains("12%")));
    }

    #[test]
    fn years_in_context_are_dates() {
        let claims = extract("The society was founded in 1893.");
        assert!(claims.iter().any(|c| c.category == ClaimCategory::Date));
        assert!(claims.iter().any(|c| c.category == ClaimCategory::Fact));
    }

    #[test]
    fn short_quotes_are_ignored() {
        let claims = extract(r#"He said "no" and left."#);
        assert!(!claims.iter().any(|c| c.category == ClaimCategory::Quote && c.text == "\"no\""));
    }

    #[test]
    fn long_quotes_are_extracted_with_spans() {
        let content = r#"The keeper remarked: "urban hives often outproduce their rural counterparts in spring"."#;
        let claims = extract(content);
        let quote = claims.iter().find(|c| c.category == ClaimCategory::Quote).unwrap();
        assert_eq!(&content[quote.span.0..quote.span.1], quote.text);
    }

    #[test]
    fn enclosing_sentence_is_recovered() {
        let content = "Bees are busy. Honey output rose by 40% last year. Hives thrive.";
        let claims = extract(content);
        let stat = claims.iter().find(|c| c.category == ClaimCategory::Statistic).unwrap();
        assert_eq!(stat.sentence, "Honey output rose by 40% last year.");
    }
}
