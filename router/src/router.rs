//! The router itself.

use std::sync::Arc;

use parking_lot::Mutex;
use scriptorium_backend::{GenerationBackend, GenerationRequest};
use scriptorium_config::RouterConfig;
use scriptorium_contracts::{
    PermissionLevel, Request, RiskLevel, RoutingDecision, WorkerId,
};
use scriptorium_workers::WorkerRegistry;
use thiserror::Error;
use tracing::{debug, warn};

use crate::analysis::{self, TaskAnalysis};
use crate::breakdown;
use crate::history::{OptimizationReport, RoutingHistory, RoutingStatistics};
use crate::matching;

#[derive(Error, Debug)]
pub enum RouterError {
    #[error("no workers registered")]
    NoWorkersRegistered,
}

/// Routes requests to workers.
///
/// `route` is deterministic for a fixed registry and backend response: the
/// keyword path always runs, and the single optional backend analysis call
/// can only escalate its classification.
pub struct Router {
    registry: Arc<WorkerRegistry>,
    backend: Arc<dyn GenerationBackend>,
    config: RouterConfig,
    history: Mutex<RoutingHistory>,
}

impl Router {
    pub fn new(
        registry: Arc<WorkerRegistry>,
        backend: Arc<dyn GenerationBackend>,
        config: RouterConfig,
    ) -> Self {
        Self { registry, backend, config, history: Mutex::new(RoutingHistory::new()) }
    }

    pub async fn route(&self, request: &Request) -> Result<RoutingDecision, RouterError> {
        if self.registry.is_empty() {
            return Err(RouterError::NoWorkersRegistered);
        }

        let mut analysis = analysis::analyze_text(&request.content, request.task_kind);
        let mut fallback_cause = None;

        if self.config.use_backend_analysis {
            match self.analyze_with_backend(request).await {
                Ok((complexity, risk)) => analysis.escalate(complexity, risk),
                Err(cause) => {
                    warn!(%cause, "router analysis call failed, using keyword path");
                    fallback_cause = Some(cause);
                }
            }
        }

        let primary = self.validated_primary(&request.content);
        let supporting = self.select_supporting(&analysis, primary);
        let include_qa =
            analysis.risk >= RiskLevel::Medium || request.task_kind.is_destructive();
        let task_breakdown = breakdown::build_breakdown(request, primary, &supporting, include_qa);

        let estimated_duration_s = self.config.base_duration_s
            * analysis.complexity.duration_multiplier()
            + self.config.supporting_duration_s * supporting.len() as u64;

        let required_permission = self.derive_permission(request, &analysis);

        let reasoning = match &fallback_cause {
            Some(cause) => format!("fallback due to analysis failure: {cause}"),
            None => format!(
                "Selected {} based on task analysis. Complexity: {:?}, risk: {:?}. Supporting workers: {}.",
                primary,
                analysis.complexity,
                analysis.risk,
                if supporting.is_empty() {
                    "none".to_string()
                } else {
                    supporting.iter().map(|w| w.as_str()).collect::<Vec<_>>().join(", ")
                }
            ),
        };

        let decision = RoutingDecision {
            primary_worker: primary,
            supporting_workers: supporting,
            task_breakdown,
            complexity: analysis.complexity,
            risk: analysis.risk,
            required_permission,
            estimated_duration_s,
            reasoning,
        };

        self.history.lock().record(request.task_kind, &decision);
        debug!(primary = %decision.primary_worker, supporting = decision.supporting_workers.len(), "request routed");
        Ok(decision)
    }

    async fn analyze_with_backend(&self, request: &Request) -> Result<(scriptorium_contracts::Complexity, RiskLevel), String> {
        let prompt = format!(
            "Analyze the following writing task and describe its complexity \
             (simple, moderate, or complex) and risk to existing text (low, \
             medium risk, or high risk) in one short paragraph.\n\nTask kind: \
             {:?}\nTask: {}\nContext: {}",
            request.task_kind,
            request.content,
            request.context.as_deref().unwrap_or("none"),
        );
        let response = self
            .backend
            .generate(GenerationRequest::new(prompt).with_max_tokens(256))
            .await
            .map_err(|err| err.to_string())?;
        Ok(analysis::parse_backend_analysis(&response.content))
    }

    fn validated_primary(&self, content: &str) -> WorkerId {
        let candidate = matching::pick_primary(content, &self.registry);
        if self.registry.contains(candidate) {
            return candidate;
        }
        warn!(worker = %candidate, "primary worker missing from registry, substituting generalist");
        if self.registry.contains(WorkerId::generalist()) {
            WorkerId::generalist()
        } else {
            // registry is non-empty, checked on entry
            self.registry.ids().next().unwrap_or(WorkerId::generalist())
        }
    }

    fn select_supporting(&self, analysis: &TaskAnalysis, primary: WorkerId) -> Vec<WorkerId> {
        let mut supporting = Vec::new();
        if analysis.requires_research {
            supporting.push(WorkerId::ResearchAssistant);
        }
        if analysis.requires_creativity {
            supporting.push(WorkerId::CreativeEnhancer);
        }
        if analysis.complexity == scriptorium_contracts::Complexity::High {
            supporting.push(WorkerId::StructureArchitect);
            supporting.push(WorkerId::StyleEditor);
        }

        supporting.retain(|w| *w != primary);
        supporting.dedup();
        supporting.retain(|w| {
            let known = self.registry.contains(*w);
            if !known {
                warn!(worker = %w, "dropping unknown supporting worker");
            }
            known
        });
        supporting.retain(|w| {
            self.registry
                .get(*w)
                .map(|worker| worker.metadata().delegable)
                .unwrap_or(false)
        });
        supporting.truncate(self.config.max_supporting_workers.min(3));
        supporting
    }

    fn derive_permission(&self, request: &Request, analysis: &TaskAnalysis) -> PermissionLevel {
        let mut computed = match analysis.risk {
            RiskLevel::High => PermissionLevel::Assistant,
            RiskLevel::Medium => PermissionLevel::Collaborative,
            RiskLevel::Low => PermissionLevel::SemiAutonomous,
        };
        if self.config.force_assistant_for_destructive && request.task_kind.is_destructive() {
            computed = PermissionLevel::Assistant;
        }
        // the granted level restricts, never elevates, what we computed
        computed.min(request.granted_permission())
    }

    pub fn statistics(&self) -> RoutingStatistics {
        self.history.lock().statistics()
    }

    pub fn optimization_report(&self) -> OptimizationReport {
        self.history.lock().optimization_report()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scriptorium_backend::{BackendError, ScriptedBackend, StaticBackend};
    use scriptorium_config::BackendConfig;
    use scriptorium_contracts::{Complexity, TaskKind};

    fn registry() -> Arc<WorkerRegistry> {
        Arc::new(WorkerRegistry::with_builtin(
            Arc::new(StaticBackend::new()),
            &BackendConfig::default(),
        ))
    }

    fn keyword_router() -> Router {
        let config = RouterConfig { use_backend_analysis: false, ..RouterConfig::default() };
        Router::new(registry(), Arc::new(StaticBackend::new()), config)
    }

    #[tokio::test]
    async fn simple_article_routes_to_content_writer_alone() {
        let router = keyword_router();
        let mut request =
            Request::new(TaskKind::Create, "Write a 900-word article on urban beekeeping");
        request.options.permission_level = Some(PermissionLevel::Autonomous);
        let decision = router.route(&request).await.unwrap();
        assert_eq!(decision.primary_worker, WorkerId::ContentWriter);
        assert!(decision.supporting_workers.is_empty());
        assert_eq!(decision.task_breakdown.len(), 1);
        // low risk derives semi_autonomous; the autonomous grant leaves it
        assert_eq!(decision.required_permission, PermissionLevel::SemiAutonomous);
    }

    #[tokio::test]
    async fn default_grant_clamps_the_requirement() {
        let router = keyword_router();
        let request = Request::new(TaskKind::Create, "Write a note about tea");
        let decision = router.route(&request).await.unwrap();
        assert_eq!(decision.required_permission, PermissionLevel::Collaborative);
    }

    #[tokio::test]
    async fn research_request_gets_research_support() {
        let router = keyword_router();
        let request = Request::new(
            TaskKind::Create,
            "Summarize the latest research on CRISPR base editing",
        );
        let decision = router.route(&request).await.unwrap();
        assert!(decision
            .supporting_workers
            .contains(&WorkerId::ResearchAssistant));
    }

    #[tokio::test]
    async fn high_complexity_adds_structure_and_style() {
        let router = keyword_router();
        let request = Request::new(
            TaskKind::Create,
            "Write a comprehensive multi-chapter guide to beekeeping",
        );
        let decision = router.route(&request).await.unwrap();
        assert_eq!(decision.complexity, Complexity::High);
        assert!(decision.supporting_workers.contains(&WorkerId::StructureArchitect));
        assert!(decision.supporting_workers.contains(&WorkerId::StyleEditor));
        // base 60 * 4 + 30 per supporter
        assert_eq!(decision.estimated_duration_s, 240 + 30 * decision.supporting_workers.len() as u64);
    }

    #[tokio::test]
    async fn supporting_workers_are_capped_at_three() {
        let router = keyword_router();
        let request = Request::new(
            TaskKind::Create,
            "Research and write a comprehensive creative story with original imaginative detail",
        );
        let decision = router.route(&request).await.unwrap();
        assert!(decision.supporting_workers.len() <= 3);
    }

    #[tokio::test]
    async fn destructive_kind_requires_assistant_and_qa() {
        let router = keyword_router();
        let request = Request::new(TaskKind::Replace, "Replace the introduction");
        let decision = router.route(&request).await.unwrap();
        assert_eq!(decision.required_permission, PermissionLevel::Assistant);
        assert_eq!(
            decision.task_breakdown.last().unwrap().worker,
            WorkerId::QualityReviewer
        );
    }

    #[tokio::test]
    async fn user_permission_restricts_but_never_elevates() {
        let router = keyword_router();
        let mut request = Request::new(TaskKind::Create, "Write a short note");
        request.options.permission_level = Some(PermissionLevel::Assistant);
        let decision = router.route(&request).await.unwrap();
        assert_eq!(decision.required_permission, PermissionLevel::Assistant);

        let mut request = Request::new(TaskKind::Delete, "Delete the appendix");
        request.options.permission_level = Some(PermissionLevel::Autonomous);
        let decision = router.route(&request).await.unwrap();
        // computed assistant for destructive intent; autonomous must not elevate
        assert_eq!(decision.required_permission, PermissionLevel::Assistant);
    }

    #[tokio::test]
    async fn analysis_failure_falls_back_with_cause() {
        let backend = ScriptedBackend::new()
            .rule_error("Analyze the following writing task", BackendError::Network("down".into()));
        let config = RouterConfig::default();
        let router = Router::new(registry(), Arc::new(backend), config);
        let request = Request::new(TaskKind::Create, "Write a poem about rust");
        let decision = router.route(&request).await.unwrap();
        assert!(decision.reasoning.starts_with("fallback due to analysis failure:"));
        assert_eq!(decision.primary_worker, WorkerId::ContentWriter);
    }

    #[tokio::test]
    async fn backend_analysis_escalates_but_never_downgrades() {
        let backend = ScriptedBackend::new().rule(
            "Analyze the following writing task",
            "This is a complex and challenging task with high risk to existing text.",
        );
        let router = Router::new(registry(), Arc::new(backend), RouterConfig::default());
        let request = Request::new(TaskKind::Create, "Write a note");
        let decision = router.route(&request).await.unwrap();
        assert_eq!(decision.complexity, Complexity::High);
        assert_eq!(decision.risk, RiskLevel::High);
    }

    #[tokio::test]
    async fn routing_is_deterministic_for_identical_input() {
        let make = || {
            let backend = ScriptedBackend::new().with_default("a moderate task, low risk");
            Router::new(registry(), Arc::new(backend), RouterConfig::default())
        };
        let request = Request::new(TaskKind::Create, "Write an article about tea");
        let a = make().route(&request).await.unwrap();
        let b = make().route(&request).await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn statistics_accumulate() {
        let router = keyword_router();
        let request = Request::new(TaskKind::Create, "Write an article");
        router.route(&request).await.unwrap();
        router.route(&request).await.unwrap();
        let stats = router.statistics();
        assert_eq!(stats.total_routed, 2);
        assert_eq!(
            stats.worker_usage[&WorkerId::ContentWriter].primary,
            2
        );
    }
}
