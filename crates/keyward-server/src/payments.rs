//! Payment status lookup.
//!
//! Billing is not wired to a real provider. [`MockPaymentStatus`] answers for
//! every project so the dashboard's plan badge and gating logic have a stable
//! contract to code against.

use serde::Serialize;
use uuid::Uuid;

/// Subscription state of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingState {
    Active,
    PastDue,
    Canceled,
}

/// Payment status reported for a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentStatus {
    pub project_id: Uuid,
    pub status: BillingState,
    pub plan: String,
}

/// Source of truth for a project's payment status.
#[async_trait::async_trait]
pub trait PaymentStatusProvider: Send + Sync + 'static {
    /// Look up the current status of `project_id`.
    async fn status(&self, project_id: Uuid) -> PaymentStatus;
}

/// Reports every project as active on the free plan.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockPaymentStatus;

#[async_trait::async_trait]
impl PaymentStatusProvider for MockPaymentStatus {
    async fn status(&self, project_id: Uuid) -> PaymentStatus {
        PaymentStatus {
            project_id,
            status: BillingState::Active,
            plan: "free".to_owned(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_reports_active_free_plan() {
        let project = Uuid::new_v4();
        let status = MockPaymentStatus.status(project).await;
        assert_eq!(status.project_id, project);
        assert_eq!(status.status, BillingState::Active);
        assert_eq!(status.plan, "free");
    }

    #[test]
    fn billing_state_serializes_snake_case() {
        let json = serde_json::to_string(&BillingState::PastDue).unwrap();
        assert_eq!(json, "\"past_due\"");
    }
}
