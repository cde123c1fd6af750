#![forbid(unsafe_code)]

mod batch;
mod milestones;
mod playbooks;
mod recommender;

pub use batch::{DeviceCandidate, PlaybookEnrollmentBatch, select_low_risk_batch};
pub use milestones::{MILESTONE_LADDER, Milestone, milestone_ladder};
pub use playbooks::{
    Applicability, Playbook, PlaybookRisk, PlaybookStep, PlaybookType, StepAction,
    builtin_playbooks,
};
pub use recommender::{
    PlaybookRecommender, RecommendationContext, RecommendedPlaybook, TemplatePlaybookRecommender,
};
