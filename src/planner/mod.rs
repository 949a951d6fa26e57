pub mod diff;
pub mod plan;
pub mod reconcile;

pub use plan::{PlanSummary, PlannedChange, ResourceAction};
pub use reconcile::{reconcile, AdoptionStrategy, Disposition, ReconcileError, ReconciledPlan};
