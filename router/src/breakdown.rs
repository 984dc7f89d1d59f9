//! Task breakdown: planned subtasks with priorities and dependencies.

use scriptorium_contracts::{Request, SubtaskSpec, TaskPriority, WorkerId};

/// First hundred characters of the request, for subtask descriptions.
fn excerpt(content: &str) -> String {
    let mut cut = content.chars().take(100).collect::<String>();
    if content.chars().count() > 100 {
        cut.push_str("...");
    }
    cut
}

fn supporting_subtask(n: usize, worker: WorkerId, request: &Request) -> SubtaskSpec {
    let snippet = excerpt(&request.content);
    // Research and structure work from the request itself and can run
    // alongside the primary; everything else consumes the primary's output.
    let (description, priority, depends_on, estimated_duration_s) = match worker {
        WorkerId::ResearchAssistant => (
            format!("Research and fact-check content for: {snippet}"),
            TaskPriority::Normal,
            vec![],
            90,
        ),
        WorkerId::StructureArchitect => (
            format!("Optimize structure and organization for: {snippet}"),
            TaskPriority::Normal,
            vec![],
            75,
        ),
        WorkerId::StyleEditor => (
            format!("Review and enhance style for: {snippet}"),
            TaskPriority::High,
            vec!["subtask-1".to_string()],
            60,
        ),
        other => (
            format!("Supporting pass by {other} for: {snippet}"),
            TaskPriority::High,
            vec!["subtask-1".to_string()],
            45,
        ),
    };
    SubtaskSpec {
        id: format!("subtask-{n}"),
        description,
        worker,
        priority,
        depends_on,
        estimated_duration_s,
    }
}

/// Build the ordered breakdown: primary first, then supporting subtasks,
/// then an optional quality-review subtask depending on everything before
/// it.
pub fn build_breakdown(
    request: &Request,
    primary: WorkerId,
    supporting: &[WorkerId],
    include_qa: bool,
) -> Vec<SubtaskSpec> {
    let mut subtasks = vec![SubtaskSpec {
        id: "subtask-1".to_string(),
        description: request.content.clone(),
        worker: primary,
        priority: TaskPriority::Low,
        depends_on: vec![],
        estimated_duration_s: 120,
    }];

    for (i, worker) in supporting.iter().enumerate() {
        subtasks.push(supporting_subtask(i + 2, *worker, request));
    }

    if include_qa {
        let prior_ids: Vec<String> = subtasks.iter().map(|s| s.id.clone()).collect();
        subtasks.push(SubtaskSpec {
            id: format!("subtask-{}", subtasks.len() + 1),
            description: "Final quality review of the assembled content".to_string(),
            worker: WorkerId::QualityReviewer,
            priority: TaskPriority::High,
            depends_on: prior_ids,
            estimated_duration_s: 60,
        });
    }

    subtasks
}
