//! The create-vs-adopt decision for every logical resource of a stack.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::catalog::ResourceMapping;
use crate::dag::validation::validate_dependency_coverage;
use crate::dag::{AdoptionPlan, PlanError};
use crate::resource::{LogicalResource, ResourceKind};

/// Attributes of an adopted security group that carry rule content.
const SECURITY_GROUP_RULE_ATTRIBUTES: [&str; 3] = ["description", "egress", "ingress"];

/// How a run treats the catalog's physical ids.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdoptionStrategy {
    /// Ignore the catalog and create every resource.
    #[serde(rename = "create")]
    CreateNew,
    /// Bind resources to the catalog's ids where one is present.
    #[default]
    #[serde(rename = "adopt")]
    AdoptExisting,
}

impl FromStr for AdoptionStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "create" | "create-new" => Ok(AdoptionStrategy::CreateNew),
            "adopt" | "adopt-existing" => Ok(AdoptionStrategy::AdoptExisting),
            other => Err(format!(
                "unknown strategy '{}' (expected 'create' or 'adopt')",
                other
            )),
        }
    }
}

impl fmt::Display for AdoptionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdoptionStrategy::CreateNew => write!(f, "create"),
            AdoptionStrategy::AdoptExisting => write!(f, "adopt"),
        }
    }
}

/// What the reconciler decided for one resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    Create,
    /// Bind to an existing object by id.
    Adopt { id: String },
    /// Route owned by an adopted route table.
    AdoptImplicit { via: String },
}

impl Disposition {
    pub fn is_adopt(&self) -> bool {
        !matches!(self, Disposition::Create)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Disposition::Create => "create",
            Disposition::Adopt { .. } => "adopt",
            Disposition::AdoptImplicit { .. } => "adopt-implicit",
        }
    }

    pub fn bound_id(&self) -> Option<&str> {
        match self {
            Disposition::Adopt { id } => Some(id),
            _ => None,
        }
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Disposition::Create => write!(f, "create"),
            Disposition::Adopt { id } => write!(f, "adopt {}", id),
            Disposition::AdoptImplicit { via } => write!(f, "adopt via {}", via),
        }
    }
}

/// A resource with its effective ignore set and disposition.
#[derive(Debug, Clone)]
pub struct ReconciledResource {
    pub resource: LogicalResource,
    pub disposition: Disposition,
    /// The catalog's id for this resource's slot, whatever the strategy.
    pub catalog_id: Option<String>,
}

impl ReconciledResource {
    pub fn address(&self) -> &str {
        &self.resource.address
    }

    pub fn kind(&self) -> ResourceKind {
        self.resource.kind
    }

    pub fn ignores(&self, attribute: &str) -> bool {
        self.resource.ignore_changes.contains(attribute)
    }

    /// Attributes excluded from the diff against the object `observed_id`.
    /// A catalog security group keeps its rule ignores under either strategy.
    pub fn ignore_set_for(&self, observed_id: &str) -> BTreeSet<String> {
        let mut ignored = self.resource.ignore_changes.clone();
        if self.kind() == ResourceKind::SecurityGroup
            && self.catalog_id.as_deref() == Some(observed_id)
        {
            ignored.extend(SECURITY_GROUP_RULE_ATTRIBUTES.iter().map(|a| a.to_string()));
        }
        ignored
    }
}

/// Reconciler output: every resource in dependency order.
#[derive(Debug, Clone)]
pub struct ReconciledPlan {
    pub strategy: AdoptionStrategy,
    pub stack_name: String,
    pub resources: Vec<ReconciledResource>,
    pub batches: Vec<Vec<String>>,
    /// Informational notes (implicit adoptions); never errors.
    pub notes: Vec<String>,
}

impl ReconciledPlan {
    pub fn get(&self, address: &str) -> Option<&ReconciledResource> {
        self.resources.iter().find(|r| r.resource.address == address)
    }

    pub fn disposition(&self, address: &str) -> Option<&Disposition> {
        self.get(address).map(|r| &r.disposition)
    }

    pub fn adopt_count(&self) -> usize {
        self.resources
            .iter()
            .filter(|r| r.disposition.is_adopt())
            .count()
    }

    pub fn create_count(&self) -> usize {
        self.resources.len() - self.adopt_count()
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error("association '{address}' has id '{id}', expected '<subnet-id>/<route-table-id>'")]
    MalformedCompositeId { address: String, id: String },

    #[error(
        "association '{address}' is bound to '{id}' but its endpoints are bound to '{expected_subnet}' and '{expected_route_table}'"
    )]
    CompositeIdMismatch {
        address: String,
        id: String,
        expected_subnet: String,
        expected_route_table: String,
    },

    #[error("{kind} '{address}' is bound to '{id}', which does not exist")]
    AdoptTargetMissing {
        address: String,
        kind: ResourceKind,
        id: String,
    },
}

/// Decide create vs adopt for every resource, in dependency order.
///
/// Associations are checked against the ids of their endpoints before
/// anything is bound; a mismatch fails the whole plan.
pub fn reconcile(
    strategy: AdoptionStrategy,
    plan: &AdoptionPlan,
    mapping: &ResourceMapping,
) -> Result<ReconciledPlan, ReconcileError> {
    if let Some(err) = validate_dependency_coverage(plan).into_iter().next() {
        return Err(ReconcileError::Plan(err.into()));
    }

    let ordered = plan.ordered();

    // Bound ids by address, so associations and routes can see their endpoints.
    let mut bound: HashMap<&str, &str> = HashMap::new();
    if strategy == AdoptionStrategy::AdoptExisting {
        for resource in ordered.iter().copied() {
            if !resource.kind.bindable_by_id() {
                continue;
            }
            if let Some(id) = resource.slot.and_then(|slot| mapping.id_for(slot)) {
                bound.insert(resource.address.as_str(), id);
            }
        }
    }

    let mut resources = Vec::with_capacity(ordered.len());
    let mut notes = Vec::new();

    for resource in ordered {
        let mut effective = resource.clone();
        let disposition = match resource.kind {
            ResourceKind::Route => {
                match implicit_owner(resource, &bound, strategy) {
                    Some(via) => {
                        notes.push(format!(
                            "{} is owned by adopted route table {}",
                            resource.address, via
                        ));
                        Disposition::AdoptImplicit { via }
                    }
                    None => Disposition::Create,
                }
            }
            _ => match bound.get(resource.address.as_str()) {
                Some(id) => {
                    if resource.kind == ResourceKind::RouteTableAssociation {
                        check_association(resource, id, &bound)?;
                    }
                    if resource.kind == ResourceKind::SecurityGroup {
                        for attribute in SECURITY_GROUP_RULE_ATTRIBUTES {
                            effective.ignore_changes.insert(attribute.to_string());
                        }
                    }
                    Disposition::Adopt { id: id.to_string() }
                }
                None => Disposition::Create,
            },
        };

        debug!(
            address = %resource.address,
            kind = %resource.kind,
            disposition = %disposition,
            ignored = ?effective.ignore_changes,
            "Reconciled resource"
        );
        let catalog_id = resource
            .slot
            .filter(|_| resource.kind.bindable_by_id())
            .and_then(|slot| mapping.id_for(slot))
            .map(str::to_string);
        resources.push(ReconciledResource {
            resource: effective,
            disposition,
            catalog_id,
        });
    }

    let reconciled = ReconciledPlan {
        strategy,
        stack_name: plan.stack_name().to_string(),
        resources,
        batches: plan.batches(),
        notes,
    };
    info!(
        stack = %reconciled.stack_name,
        strategy = %strategy,
        adopt = reconciled.adopt_count(),
        create = reconciled.create_count(),
        "Reconciled plan"
    );
    Ok(reconciled)
}

/// The owning route table's address, when it is adopted.
fn implicit_owner(
    route: &LogicalResource,
    bound: &HashMap<&str, &str>,
    strategy: AdoptionStrategy,
) -> Option<String> {
    if strategy != AdoptionStrategy::AdoptExisting {
        return None;
    }
    let route_table = route.reference_target("route_table_id")?;
    bound.contains_key(route_table.as_str()).then_some(route_table)
}

fn check_association(
    resource: &LogicalResource,
    id: &str,
    bound: &HashMap<&str, &str>,
) -> Result<(), ReconcileError> {
    let parts: Vec<&str> = id.split('/').collect();
    let (subnet_id, route_table_id) = match parts.as_slice() {
        [subnet, rtb] if !subnet.is_empty() && !rtb.is_empty() => (*subnet, *rtb),
        _ => {
            return Err(ReconcileError::MalformedCompositeId {
                address: resource.address.clone(),
                id: id.to_string(),
            })
        }
    };

    let endpoint = |attribute: &str| -> Option<String> {
        let target = resource.reference_target(attribute)?;
        bound.get(target.as_str()).map(|bound_id| bound_id.to_string())
    };
    let expected_subnet = endpoint("subnet_id");
    let expected_route_table = endpoint("route_table_id");

    if expected_subnet.as_deref() != Some(subnet_id)
        || expected_route_table.as_deref() != Some(route_table_id)
    {
        return Err(ReconcileError::CompositeIdMismatch {
            address: resource.address.clone(),
            id: id.to_string(),
            expected_subnet: expected_subnet.unwrap_or_else(|| "(unbound)".to_string()),
            expected_route_table: expected_route_table
                .unwrap_or_else(|| "(unbound)".to_string()),
        });
    }
    Ok(())
}
