// Lead Workflow Orchestration
//
// Rule-driven automation for incoming leads: weighted conditions pick a rule,
// its actions run in order, and observed outcomes feed back into selection.

pub mod actions;
pub mod adaptation;
pub mod channels;
pub mod conditions;
pub mod engagement;
pub mod engine;
pub mod executor;
pub mod optimizer;
pub mod proposal;
pub mod rules;
pub mod runner;
pub mod selector;
pub mod store;
pub mod triggers;

pub use actions::{Action, ActionErrorKind, ActionResult, ActionType, ExecutedAction};
pub use adaptation::{AdaptationRecorder, AdaptationUpdate, RulePerformance};
pub use channels::{Channel, ChannelPlan, MultiChannelCoordinator};
pub use conditions::{Condition, ConditionOperator};
pub use engagement::{EngagementLevel, EngagementPlan, EngagementPlanner};
pub use engine::{Collaborators, WorkflowOrchestrator, WorkflowOutcome};
pub use executor::{ActionExecutor, WorkflowContext};
pub use optimizer::OptimizationReport;
pub use proposal::{ProposalPlan, ProposalPlanner};
pub use rules::{AdaptationSettings, Rule};
pub use runner::{WorkflowRun, WorkflowRunner};
pub use selector::{RuleSelector, Selection, SelectionWeights};
pub use store::{InMemoryRuleStore, PgRuleStore, RuleStore, StoreError};
pub use triggers::{LeadEvent, LeadEventType};
