use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Values exported by a deployed guestbook topology
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TopologyOutputs {
    /// Frontend URL or cluster IP, `pending` until the orchestrator assigns one
    pub resolved_frontend_address: String,
    pub monitoring_admin_user: String,
    pub monitoring_admin_password: String,
    pub monitoring_url: String,
    pub generated_at: DateTime<Utc>,
}
