#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlaybookType {
    RebuildMomentum,
    ReduceDependencies,
    AutopilotHygiene,
    StallRecovery,
    ScaleUp,
    Custom,
}

impl PlaybookType {
    /// Lower ranks surface first.
    pub fn severity_rank(self) -> u8 {
        match self {
            PlaybookType::StallRecovery => 0,
            PlaybookType::RebuildMomentum => 1,
            PlaybookType::ReduceDependencies => 2,
            PlaybookType::AutopilotHygiene => 3,
            PlaybookType::ScaleUp => 4,
            PlaybookType::Custom => 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PlaybookRisk {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepAction {
    Review,
    Communicate,
    CreateCollection,
    EnableWorkload,
    AssignPolicy,
    EnrollBatch,
    Remediate,
    Monitor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybookStep {
    pub order: u32,
    pub title: String,
    pub description: String,
    pub action: StepAction,
    pub requires_confirmation: bool,
    pub rollback_instructions: Option<String>,
}

/// When a playbook is worth surfacing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "when", rename_all = "camelCase")]
pub enum Applicability {
    /// The stall-risk assessment flags a risk.
    AtRisk,
    /// The trend is stalled or declining.
    LosingMomentum,
    /// The complexity category scored below its midpoint.
    ComplexityHigh,
    /// The infrastructure category scored below its midpoint.
    InfrastructureWeak,
    /// Growing steadily, no stall risk and at least medium confidence.
    HealthyGrowth,
    /// Enrollment percentage within `min..=max`.
    PercentageRange { min: f64, max: f64 },
    Always,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playbook {
    pub id: String,
    pub name: String,
    pub description: String,
    pub playbook_type: PlaybookType,
    pub risk_level: PlaybookRisk,
    pub applicability: Applicability,
    pub estimated_days: u32,
    /// Executed in order; never reordered.
    pub steps: Vec<PlaybookStep>,
}

fn step(
    order: u32,
    title: &str,
    description: &str,
    action: StepAction,
    requires_confirmation: bool,
    rollback: Option<&str>,
) -> PlaybookStep {
    PlaybookStep {
        order,
        title: title.to_string(),
        description: description.to_string(),
        action,
        requires_confirmation,
        rollback_instructions: rollback.map(str::to_string),
    }
}

pub fn builtin_playbooks() -> Vec<Playbook> {
    use StepAction::*;

    vec![
        Playbook {
            id: "stall-recovery".into(),
            name: "Stall recovery".into(),
            description: "Diagnose why enrollment stopped and restart it with a safe batch".into(),
            playbook_type: PlaybookType::StallRecovery,
            risk_level: PlaybookRisk::Medium,
            applicability: Applicability::AtRisk,
            estimated_days: 14,
            steps: vec![
                step(1, "Collect enrollment errors", "Export enrollment failures from the last 30 days and group them by error code", Review, false, None),
                step(2, "Survey blocked owners", "Ask owners of unenrolled devices what is stopping them", Communicate, false, None),
                step(3, "Fix the top blocker", "Remediate the most common failure cause", Remediate, true, Some("Revert the remediation change and re-run the error export")),
                step(4, "Enroll a low-risk batch", "Enroll the most ready devices to prove the fix", EnrollBatch, true, Some("Remove the batch from the enrollment collection")),
                step(5, "Watch daily velocity", "Track new enrollments daily for two weeks", Monitor, false, None),
            ],
        },
        Playbook {
            id: "rebuild-momentum".into(),
            name: "Rebuild momentum".into(),
            description: "Restart a slowing rollout with communication and scheduled waves".into(),
            playbook_type: PlaybookType::RebuildMomentum,
            risk_level: PlaybookRisk::Low,
            applicability: Applicability::LosingMomentum,
            estimated_days: 21,
            steps: vec![
                step(1, "Review the last waves", "Compare enrollment counts of the last three waves", Review, false, None),
                step(2, "Announce the next wave", "Send the schedule and the benefits to affected users", Communicate, false, None),
                step(3, "Create the wave collection", "Build a collection for the next wave of devices", CreateCollection, true, Some("Delete the wave collection")),
                step(4, "Enroll the wave", "Deploy the auto-enrollment policy to the wave collection", EnrollBatch, true, Some("Remove the deployment from the wave collection")),
                step(5, "Track weekly velocity", "Confirm the week-over-week change turns positive", Monitor, false, None),
            ],
        },
        Playbook {
            id: "reduce-dependencies".into(),
            name: "Reduce dependencies".into(),
            description: "Move applications, policies and scripts off ConfigMgr-only delivery".into(),
            playbook_type: PlaybookType::ReduceDependencies,
            risk_level: PlaybookRisk::Medium,
            applicability: Applicability::ComplexityHigh,
            estimated_days: 45,
            steps: vec![
                step(1, "Inventory dependencies", "List apps, policies and task sequences only delivered by ConfigMgr", Review, false, None),
                step(2, "Package top applications", "Repackage the most deployed apps for cloud delivery", Remediate, false, None),
                step(3, "Migrate policies", "Recreate group policies as cloud configuration profiles", AssignPolicy, true, Some("Unassign the new profiles; group policies remain in effect")),
                step(4, "Shift workloads", "Switch co-management workloads whose dependencies are gone", EnableWorkload, true, Some("Move the workload slider back to ConfigMgr")),
                step(5, "Verify delivery", "Check app and policy install success on pilot devices", Monitor, false, None),
            ],
        },
        Playbook {
            id: "autopilot-hygiene".into(),
            name: "Autopilot hygiene".into(),
            description: "Fix the provisioning and management infrastructure new enrollments rely on".into(),
            playbook_type: PlaybookType::AutopilotHygiene,
            risk_level: PlaybookRisk::Low,
            applicability: Applicability::InfrastructureWeak,
            estimated_days: 10,
            steps: vec![
                step(1, "Audit infrastructure", "Check co-management, cloud management gateway and hybrid join configuration", Review, false, None),
                step(2, "Register hardware hashes", "Upload hardware hashes for devices missing from Autopilot", Remediate, false, None),
                step(3, "Assign deployment profiles", "Assign Autopilot profiles to the registered device groups", AssignPolicy, true, Some("Unassign the deployment profiles")),
                step(4, "Validate provisioning", "Provision a test device end to end", Monitor, false, None),
            ],
        },
        Playbook {
            id: "scale-up".into(),
            name: "Scale up".into(),
            description: "Increase wave size while enrollment is healthy".into(),
            playbook_type: PlaybookType::ScaleUp,
            risk_level: PlaybookRisk::High,
            applicability: Applicability::HealthyGrowth,
            estimated_days: 30,
            steps: vec![
                step(1, "Confirm capacity", "Check service desk capacity for a larger wave", Review, false, None),
                step(2, "Create a larger wave", "Build a collection twice the size of the last wave", CreateCollection, true, Some("Delete the wave collection")),
                step(3, "Enroll the wave", "Deploy the auto-enrollment policy to the larger wave", EnrollBatch, true, Some("Remove the deployment from the wave collection")),
                step(4, "Shift remaining workloads", "Move the remaining co-management workloads to the cloud", EnableWorkload, true, Some("Move the workload sliders back to ConfigMgr")),
                step(5, "Monitor failure rate", "Stop scaling if the success rate drops below 90%", Monitor, false, None),
            ],
        },
    ]
}
