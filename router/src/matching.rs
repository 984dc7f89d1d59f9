//! Worker matching by keyword overlap.

use scriptorium_contracts::WorkerId;
use scriptorium_workers::WorkerRegistry;

/// Score every registered worker by keyword overlap with the request text.
/// Returns (worker, score) pairs in registry order, so ties resolve
/// deterministically.
pub fn score_workers(text: &str, registry: &WorkerRegistry) -> Vec<(WorkerId, usize)> {
    let lowered = text.to_lowercase();
    registry
        .iter()
        .map(|(id, worker)| {
            let score = worker
                .metadata()
                .keywords
                .iter()
                .filter(|keyword| lowered.contains(keyword.as_str()))
                .count();
            (id, score)
        })
        .collect()
}

/// Best-scoring worker, or the generalist when nothing scores above zero.
pub fn pick_primary(text: &str, registry: &WorkerRegistry) -> WorkerId {
    score_workers(text, registry)
        .into_iter()
        .filter(|(_, score)| *score > 0)
        .max_by_key(|(_, score)| *score)
        .map(|(id, _)| id)
        .unwrap_or_else(WorkerId::generalist)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scriptorium_backend::StaticBackend;
    use scriptorium_config::BackendConfig;
    use std::sync::Arc;

    fn registry() -> WorkerRegistry {
        WorkerRegistry::with_builtin(Arc::new(StaticBackend::new()), &BackendConfig::default())
    }

    #[test]
    fn article_request_matches_content_writer() {
        let registry = registry();
        assert_eq!(
            pick_primary("Write a 900-word article on urban beekeeping", &registry),
            WorkerId::ContentWriter
        );
    }

    #[test]
    fn proofreading_matches_grammar_assistant() {
        let registry = registry();
        assert_eq!(
            pick_primary("proofread this for spelling and punctuation", &registry),
            WorkerId::GrammarAssistant
        );
    }

    #[test]
    fn unmatched_text_falls_back_to_generalist() {
        let registry = registry();
        assert_eq!(pick_primary("zzzzzz", &registry), WorkerId::generalist());
    }

    #[test]
    fn max_by_key_keeps_the_last_of_equal_scores_stable() {
        // the same text always yields the same primary
        let registry = registry();
        let a = pick_primary("improve the documentation", &registry);
        let b = pick_primary("improve the documentation", &registry);
        assert_eq!(a, b);
    }
}
