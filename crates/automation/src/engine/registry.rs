//! Workflow registry contract and trigger matching.
//!
//! The registry answers "which active workflows match this event" and hands
//! the engine a snapshot of each workflow's ordered action list. Definitions
//! are read-only to the engine during a run.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::db::models::{TriggerType, Workflow, WorkflowAction};
use crate::engine::condition::Condition;
use crate::engine::event::TriggerEvent;
use crate::error::AppResult;

/// A workflow definition plus its ordered action list, snapshotted for the
/// duration of one execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowSnapshot {
    pub workflow: Workflow,
    /// Actions in ascending `position`.
    pub actions: Vec<WorkflowAction>,
}

/// Source of active workflow definitions.
#[async_trait]
pub trait WorkflowRegistry: Send + Sync {
    /// Active workflows for a trigger type, each with its ordered actions.
    /// Ordering between workflows is unspecified.
    async fn active_for_trigger(&self, trigger: &TriggerType) -> AppResult<Vec<WorkflowSnapshot>>;
}

/// Evaluate a workflow's trigger against an event.
///
/// A workflow with no trigger configuration matches every event of its
/// trigger type. An unparseable configuration is logged and treated as
/// "no match" so it cannot disturb matching for other workflows.
pub fn matches(workflow: &Workflow, event: &TriggerEvent) -> bool {
    if workflow.trigger() != event.trigger {
        return false;
    }

    match &workflow.trigger_config {
        None => true,
        Some(expr) if expr.is_null() => true,
        Some(expr) => match Condition::parse(expr) {
            Ok(condition) => condition.matches(&event.payload),
            Err(e) => {
                warn!(
                    workflow_id = %workflow.id,
                    workflow = %workflow.name,
                    error = %e,
                    "Unparseable trigger configuration, treating as no match"
                );
                false
            }
        },
    }
}

/// In-memory registry, used by tests and local tooling.
#[derive(Default)]
pub struct MemoryWorkflowRegistry {
    workflows: std::sync::RwLock<Vec<WorkflowSnapshot>>,
}

impl MemoryWorkflowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a workflow snapshot.
    pub fn insert(&self, snapshot: WorkflowSnapshot) {
        self.workflows
            .write()
            .expect("registry lock poisoned")
            .push(snapshot);
    }
}

#[async_trait]
impl WorkflowRegistry for MemoryWorkflowRegistry {
    async fn active_for_trigger(&self, trigger: &TriggerType) -> AppResult<Vec<WorkflowSnapshot>> {
        let workflows = self.workflows.read().expect("registry lock poisoned");
        Ok(workflows
            .iter()
            .filter(|s| s.workflow.is_active() && s.workflow.trigger() == *trigger)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use uuid::Uuid;

    fn make_workflow(trigger: &str, config: Option<serde_json::Value>) -> Workflow {
        Workflow {
            id: Uuid::new_v4(),
            name: "test".to_string(),
            description: None,
            trigger_type: trigger.to_string(),
            trigger_config: config,
            status: "active".to_string(),
            author_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_matches_trigger_type_only() {
        let workflow = make_workflow("donation_received", None);
        let event = TriggerEvent::new(TriggerType::DonationReceived, json!({"amount": 1}));
        assert!(matches(&workflow, &event));

        let other = TriggerEvent::new(TriggerType::MemberCreated, json!({}));
        assert!(!matches(&workflow, &other));
    }

    #[test]
    fn test_matches_with_trigger_config() {
        let workflow = make_workflow(
            "donation_received",
            Some(json!({"all": [{"field": "amount", "op": "gt", "value": 0}]})),
        );
        let event = TriggerEvent::new(TriggerType::DonationReceived, json!({"amount": 100}));
        assert!(matches(&workflow, &event));

        let zero = TriggerEvent::new(TriggerType::DonationReceived, json!({"amount": 0}));
        assert!(!matches(&workflow, &zero));
    }

    #[test]
    fn test_unparseable_config_is_no_match() {
        let workflow = make_workflow("donation_received", Some(json!("amount > 0")));
        let event = TriggerEvent::new(TriggerType::DonationReceived, json!({"amount": 100}));
        assert!(!matches(&workflow, &event));
    }

    #[test]
    fn test_null_config_matches() {
        let workflow = make_workflow("member_created", Some(serde_json::Value::Null));
        let event = TriggerEvent::new(TriggerType::MemberCreated, json!({}));
        assert!(matches(&workflow, &event));
    }

    #[tokio::test]
    async fn test_memory_registry_filters_state_and_trigger() {
        let registry = MemoryWorkflowRegistry::new();

        let active = make_workflow("member_created", None);
        let mut paused = make_workflow("member_created", None);
        paused.status = "paused".to_string();
        let other_trigger = make_workflow("donation_received", None);

        for workflow in [active.clone(), paused, other_trigger] {
            registry.insert(WorkflowSnapshot {
                workflow,
                actions: vec![],
            });
        }

        let found = registry
            .active_for_trigger(&TriggerType::MemberCreated)
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].workflow.id, active.id);
    }
}
