//! Worker registry, keyed by `WorkerId` and initialized at startup.

use std::collections::BTreeMap;
use std::sync::Arc;

use scriptorium_backend::GenerationBackend;
use scriptorium_config::BackendConfig;
use scriptorium_contracts::WorkerId;
use tracing::info;

use crate::builtin::{
    ContentWriter, CreativeEnhancer, GrammarAssistant, QualityReviewer, ResearchAssistant,
    StructureArchitect, StyleEditor, TechnicalWriter,
};
use crate::traits::{Worker, WorkerHealth};

/// Registry of available workers.
///
/// Backed by a BTreeMap so iteration order (and therefore router scoring
/// ties) is deterministic.
pub struct WorkerRegistry {
    workers: BTreeMap<WorkerId, Arc<dyn Worker>>,
}

impl WorkerRegistry {
    pub fn empty() -> Self {
        Self { workers: BTreeMap::new() }
    }

    /// Registry with the full built-in worker set.
    pub fn with_builtin(backend: Arc<dyn GenerationBackend>, config: &BackendConfig) -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(ContentWriter::new(backend.clone(), config.clone())));
        registry.register(Arc::new(ResearchAssistant::new(backend.clone(), config.clone())));
        registry.register(Arc::new(StyleEditor::new(backend.clone(), config.clone())));
        registry.register(Arc::new(GrammarAssistant::new(backend.clone(), config.clone())));
        registry.register(Arc::new(StructureArchitect::new(backend.clone(), config.clone())));
        registry.register(Arc::new(CreativeEnhancer::new(backend.clone(), config.clone())));
        registry.register(Arc::new(TechnicalWriter::new(backend.clone(), config.clone())));
        registry.register(Arc::new(QualityReviewer::new(backend, config.clone())));
        info!(workers = registry.len(), "worker registry initialized");
        registry
    }

    pub fn register(&mut self, worker: Arc<dyn Worker>) {
        self.workers.insert(worker.metadata().id, worker);
    }

    pub fn get(&self, id: WorkerId) -> Option<Arc<dyn Worker>> {
        self.workers.get(&id).cloned()
    }

    pub fn contains(&self, id: WorkerId) -> bool {
        self.workers.contains_key(&id)
    }

    /// The generalist fallback, if registered.
    pub fn generalist(&self) -> Option<Arc<dyn Worker>> {
        self.get(WorkerId::generalist())
    }

    pub fn ids(&self) -> impl Iterator<Item = WorkerId> + '_ {
        self.workers.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (WorkerId, &Arc<dyn Worker>)> {
        self.workers.iter().map(|(id, w)| (*id, w))
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Health of every registered worker.
    pub fn health_report(&self) -> BTreeMap<WorkerId, WorkerHealth> {
        self.workers.iter().map(|(id, w)| (*id, w.health())).collect()
    }
}
