//! Pure text statistics: counts, syllables, readability.
//!
//! All heuristics are plain functions over `&str` so they can be
//! property-tested without any natural-language tooling.

use serde::{Deserialize, Serialize};

/// Basic content counts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BasicMetrics {
    pub word_count: usize,
    pub sentence_count: usize,
    pub paragraph_count: usize,
    pub character_count: usize,
    pub unique_words: usize,
    pub avg_words_per_sentence: f64,
    pub avg_sentences_per_paragraph: f64,
}

pub fn sentences(text: &str) -> Vec<&str> {
    text.split(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

pub fn paragraphs(text: &str) -> Vec<&str> {
    text.split("\n\n").map(str::trim).filter(|p| !p.is_empty()).collect()
}

pub fn basic_metrics(text: &str) -> BasicMetrics {
    let words: Vec<&str> = text.split_whitespace().collect();
    let sentence_list = sentences(text);
    let paragraph_list = paragraphs(text);
    let unique: std::collections::HashSet<String> = words
        .iter()
        .filter(|w| w.chars().all(char::is_alphabetic))
        .map(|w| w.to_lowercase())
        .collect();
    BasicMetrics {
        word_count: words.len(),
        sentence_count: sentence_list.len(),
        paragraph_count: paragraph_list.len(),
        character_count: text.chars().count(),
        unique_words: unique.len(),
        avg_words_per_sentence: words.len() as f64 / sentence_list.len().max(1) as f64,
        avg_sentences_per_paragraph: sentence_list.len() as f64
            / paragraph_list.len().max(1) as f64,
    }
}

/// Simplified syllable counter: vowel groups, minus one for a trailing
/// silent 'e' when the word has more than one syllable, minimum one.
pub fn count_syllables(word: &str) -> usize {
    let word = word.to_lowercase();
    let mut count = 0usize;
    let mut previous_was_vowel = false;
    for c in word.chars() {
        let is_vowel = matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y');
        if is_vowel && !previous_was_vowel {
            count += 1;
        }
        previous_was_vowel = is_vowel;
    }
    if word.ends_with('e') && count > 1 {
        count -= 1;
    }
    count.max(1)
}

/// Flesch-Kincaid grade level.
pub fn flesch_kincaid_grade(text: &str) -> f64 {
    let words: Vec<&str> = text.split_whitespace().collect();
    let sentence_count = sentences(text).len();
    if words.is_empty() || sentence_count == 0 {
        return 0.0;
    }
    let syllables: usize = words.iter().map(|w| count_syllables(w)).sum();
    let avg_sentence_length = words.len() as f64 / sentence_count as f64;
    let avg_syllables_per_word = syllables as f64 / words.len() as f64;
    0.39 * avg_sentence_length + 11.8 * avg_syllables_per_word - 15.59
}

/// Map grade level to a 0-5 readability score; grade 8 maps to 5.
pub fn readability_score(text: &str) -> f64 {
    let grade = flesch_kincaid_grade(text);
    (5.0 - (grade - 8.0) / 4.0).clamp(0.0, 5.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syllable_counts_follow_vowel_groups() {
        assert_eq!(count_syllables("bee"), 1);
        assert_eq!(count_syllables("honey"), 2);
        assert_eq!(count_syllables("beautiful"), 3);
        // trailing silent e
        assert_eq!(count_syllables("make"), 1);
        // minimum one even with no vowels
        assert_eq!(count_syllables("tsk"), 1);
    }

    #[test]
    fn empty_text_has_zero_grade() {
        assert_eq!(flesch_kincaid_grade(""), 0.0);
        assert_eq!(readability_score(""), 5.0);
    }

    #[test]
    fn simple_prose_scores_high_readability() {
        let text = "The bee flew home. It was a warm day. The hive was full.";
        assert!(readability_score(text) > 4.0);
    }

    #[test]
    fn dense_prose_scores_lower_than_simple_prose() {
        let simple = "The bee flew home. It was warm.";
        let dense = "Apicultural superintendence necessitates comprehensive observational \
                     methodologies encompassing multifactorial environmental considerations.";
        assert!(readability_score(dense) < readability_score(simple));
    }

    #[test]
    fn basic_metrics_count_structure() {
        let text = "One sentence here. Another one!\n\nNew paragraph now.";
        let metrics = basic_metrics(text);
        assert_eq!(metrics.sentence_count, 3);
        assert_eq!(metrics.paragraph_count, 2);
        assert!(metrics.word_count > 0);
    }
}
