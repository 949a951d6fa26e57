use std::fmt;

use crate::provider::ObservedResource;
use crate::resource::{Attributes, ResourceKind};

use super::diff::AttributeChange;
use super::reconcile::{AdoptionStrategy, Disposition};

/// The action to take for a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceAction {
    Create,
    /// Take ownership of an existing object without changing it.
    Import,
    Update,
    Replace,
    NoOp,
}

impl fmt::Display for ResourceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceAction::Create => write!(f, "+"),
            ResourceAction::Import => write!(f, "<="),
            ResourceAction::Update => write!(f, "~"),
            ResourceAction::Replace => write!(f, "-/+"),
            ResourceAction::NoOp => write!(f, "(no changes)"),
        }
    }
}

/// A planned change for a single resource.
#[derive(Debug, Clone)]
pub struct PlannedChange {
    pub address: String,
    pub kind: ResourceKind,
    pub disposition: Disposition,
    pub action: ResourceAction,
    /// The object is not managed yet; applying takes ownership of it.
    pub importing: bool,
    /// Id of the existing object, when there is one.
    pub physical_id: Option<String>,
    /// Desired attributes with references resolved where possible.
    pub desired: Attributes,
    pub current: Option<ObservedResource>,
    pub attribute_changes: Vec<AttributeChange>,
    pub note: Option<String>,
}

/// Summary of a plan operation.
#[derive(Debug, Clone)]
pub struct PlanSummary {
    pub stack_name: String,
    pub strategy: AdoptionStrategy,
    pub changes: Vec<PlannedChange>,
    pub creates: usize,
    pub imports: usize,
    pub updates: usize,
    pub replaces: usize,
    pub no_ops: usize,
    pub notes: Vec<String>,
}

impl PlanSummary {
    pub fn from_changes(
        stack_name: &str,
        strategy: AdoptionStrategy,
        changes: Vec<PlannedChange>,
        notes: Vec<String>,
    ) -> Self {
        let count = |action: ResourceAction| changes.iter().filter(|c| c.action == action).count();
        let creates = count(ResourceAction::Create);
        let updates = count(ResourceAction::Update);
        let replaces = count(ResourceAction::Replace);
        let no_ops = count(ResourceAction::NoOp);
        let imports = changes
            .iter()
            .filter(|c| c.action == ResourceAction::Import || c.importing)
            .count();

        PlanSummary {
            stack_name: stack_name.to_string(),
            strategy,
            changes,
            creates,
            imports,
            updates,
            replaces,
            no_ops,
            notes,
        }
    }

    /// Creates, updates and replaces. Imports are not counted.
    pub fn proposed_changes(&self) -> usize {
        self.creates + self.updates + self.replaces
    }

    /// Nothing to change and nothing left to take ownership of.
    pub fn is_converged(&self) -> bool {
        self.proposed_changes() == 0 && self.imports == 0
    }

    pub fn get(&self, address: &str) -> Option<&PlannedChange> {
        self.changes.iter().find(|c| c.address == address)
    }
}

impl fmt::Display for PlanSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if self.creates > 0 {
            parts.push(format!("{} to add", self.creates));
        }
        if self.imports > 0 {
            parts.push(format!("{} to import", self.imports));
        }
        if self.replaces > 0 {
            parts.push(format!("{} to replace", self.replaces));
        }
        if self.updates > 0 {
            parts.push(format!("{} to change", self.updates));
        }
        if parts.is_empty() {
            write!(f, "No changes.")
        } else {
            write!(f, "Plan: {}.", parts.join(", "))
        }
    }
}
