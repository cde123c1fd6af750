#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

/// Raw signals feeding the confidence score. Supplied fresh on every call.
///
/// Counts are signed so that bad upstream data can be clamped instead of
/// rejected; see [`ConfidenceInputs::sanitized`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfidenceInputs {
    // velocity
    pub velocity_7: f64,
    pub velocity_30: f64,
    pub total_devices: i64,
    pub current_percentage: f64,
    pub days_since_last_enrollment: f64,

    // success rate
    pub enrollment_attempts: i64,
    pub enrollment_successes: i64,
    pub retry_count: i64,
    pub recent_failures: i64,

    // complexity
    /// Applications only deployable through ConfigMgr.
    pub app_dependency_count: i64,
    /// Group policies or baselines with no cloud equivalent yet.
    pub policy_dependency_count: i64,
    /// Task sequences and scripts tied to ConfigMgr.
    pub script_dependency_count: i64,
    /// Co-management workloads switched to the cloud (out of 7).
    pub workloads_shifted: i64,

    // infrastructure
    pub co_management_enabled: bool,
    pub cloud_management_gateway: bool,
    pub autopilot_configured: bool,
    pub hybrid_join_configured: bool,
    pub tenant_attach_enabled: bool,

    // conditional access
    pub ca_requires_compliance: bool,
    pub compliance_policy_count: i64,
    pub ca_blocks_legacy_auth: bool,
}

pub const CO_MANAGEMENT_WORKLOADS: i64 = 7;

fn finite(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

impl ConfidenceInputs {
    /// Clamp counts to be non-negative, percentages to 0..=100 and replace
    /// non-finite numbers with zero.
    pub fn sanitized(&self) -> Self {
        let attempts = self.enrollment_attempts.max(0);
        Self {
            velocity_7: finite(self.velocity_7),
            velocity_30: finite(self.velocity_30),
            total_devices: self.total_devices.max(0),
            current_percentage: finite(self.current_percentage).clamp(0.0, 100.0),
            days_since_last_enrollment: finite(self.days_since_last_enrollment).max(0.0),
            enrollment_attempts: attempts,
            enrollment_successes: self.enrollment_successes.clamp(0, attempts),
            retry_count: self.retry_count.max(0),
            recent_failures: self.recent_failures.max(0),
            app_dependency_count: self.app_dependency_count.max(0),
            policy_dependency_count: self.policy_dependency_count.max(0),
            script_dependency_count: self.script_dependency_count.max(0),
            workloads_shifted: self.workloads_shifted.clamp(0, CO_MANAGEMENT_WORKLOADS),
            compliance_policy_count: self.compliance_policy_count.max(0),
            ..self.clone()
        }
    }
}
