use std::collections::{BTreeSet, HashMap};

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::{debug, info};

use super::plan::{PlanSummary, PlannedChange, ResourceAction};
use super::reconcile::{Disposition, ReconcileError, ReconciledPlan, ReconciledResource};
use crate::provider::{ObservedResource, ProvisioningEngine};
use crate::resource::reference::{is_unknown, resolve_attributes};
use crate::resource::{route_id, Attributes, ResourceKind};

/// A single attribute that differs between desired and current state.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeChange {
    pub attribute: String,
    pub current: Option<Value>,
    pub desired: Value,
    pub forces_replacement: bool,
}

/// Compare desired attributes against an existing object.
///
/// Only desired keys are compared; ignored attributes are skipped. Arrays
/// compare as sets and objects as subsets, so extra tags or extra list
/// entries on the existing object are not drift. Unresolved values always
/// count as a change.
pub fn diff_attributes(
    kind: ResourceKind,
    desired: &Attributes,
    current: &Attributes,
    ignore: &BTreeSet<String>,
) -> Vec<AttributeChange> {
    let mut changes = Vec::new();
    for (attribute, want) in desired {
        if ignore.contains(attribute) {
            continue;
        }
        let have = current.get(attribute);
        let matched = match have {
            Some(have) => !is_unknown(want) && values_match(want, have),
            None => false,
        };
        if !matched {
            changes.push(AttributeChange {
                attribute: attribute.clone(),
                current: have.cloned(),
                desired: want.clone(),
                forces_replacement: kind.forces_replacement(attribute),
            });
        }
    }
    changes
}

fn values_match(desired: &Value, current: &Value) -> bool {
    match (desired, current) {
        (Value::Array(want), Value::Array(have)) => {
            want.len() == have.len()
                && want
                    .iter()
                    .all(|w| have.iter().any(|h| values_match(w, h)))
        }
        (Value::Object(want), Value::Object(have)) => want
            .iter()
            .all(|(k, w)| have.get(k).is_some_and(|h| values_match(w, h))),
        _ => desired == current,
    }
}

/// Walk the reconciled plan in order and work out what applying would do.
///
/// References resolve against objects already observed earlier in the walk;
/// anything not yet known becomes `(known after apply)`.
pub async fn compute_changes(
    reconciled: &ReconciledPlan,
    engine: &dyn ProvisioningEngine,
) -> Result<PlanSummary> {
    let stack = reconciled.stack_name.as_str();
    let mut observed: HashMap<String, ObservedResource> = HashMap::new();
    let mut changes = Vec::with_capacity(reconciled.resources.len());
    let mut notes = reconciled.notes.clone();

    for entry in &reconciled.resources {
        let address = entry.address();
        let lookup = |addr: &str, attr: &str| observed.get(addr).and_then(|o| o.attribute(attr));
        let desired = resolve_attributes(&entry.resource.attributes, &lookup);

        let current = read_current(entry, &desired, &observed, engine, stack)
            .await
            .with_context(|| format!("Failed to read current state of {}", address))?;

        let change = plan_resource(entry, desired, current);
        debug!(
            address = %address,
            action = ?change.action,
            importing = change.importing,
            changed = change.attribute_changes.len(),
            "Planned resource"
        );

        if let Some(note) = &change.note {
            notes.push(note.clone());
        }
        if matches!(
            change.action,
            ResourceAction::Import | ResourceAction::Update | ResourceAction::NoOp
        ) {
            if let Some(current) = &change.current {
                observed.insert(address.to_string(), current.clone());
            }
        }
        changes.push(change);
    }

    let summary = PlanSummary::from_changes(stack, reconciled.strategy, changes, notes);
    info!(
        stack = %stack,
        creates = summary.creates,
        imports = summary.imports,
        updates = summary.updates,
        replaces = summary.replaces,
        "Computed plan"
    );
    Ok(summary)
}

async fn read_current(
    entry: &ReconciledResource,
    desired: &Attributes,
    observed: &HashMap<String, ObservedResource>,
    engine: &dyn ProvisioningEngine,
    stack: &str,
) -> Result<Option<ObservedResource>> {
    let address = entry.address();
    match &entry.disposition {
        Disposition::Create => engine.find_managed(stack, address).await,
        Disposition::Adopt { id } => match engine.read(entry.kind(), id).await? {
            Some(found) => Ok(Some(found)),
            None => Err(ReconcileError::AdoptTargetMissing {
                address: address.to_string(),
                kind: entry.kind(),
                id: id.clone(),
            }
            .into()),
        },
        Disposition::AdoptImplicit { via } => {
            let Some(route_table) = observed.get(via) else {
                return Ok(None);
            };
            let Some(destination) = desired.get("destination_cidr_block").and_then(Value::as_str)
            else {
                return Ok(None);
            };
            engine
                .read(entry.kind(), &route_id(&route_table.id, destination))
                .await
        }
    }
}

fn plan_resource(
    entry: &ReconciledResource,
    desired: Attributes,
    current: Option<ObservedResource>,
) -> PlannedChange {
    let Some(existing) = current else {
        return PlannedChange {
            address: entry.address().to_string(),
            kind: entry.kind(),
            disposition: entry.disposition.clone(),
            action: ResourceAction::Create,
            importing: false,
            physical_id: None,
            desired,
            current: None,
            attribute_changes: Vec::new(),
            note: None,
        };
    };

    let attribute_changes = diff_attributes(
        entry.kind(),
        &desired,
        &existing.attributes,
        &entry.ignore_set_for(&existing.id),
    );
    let importing = !existing.managed;
    let action = if attribute_changes.iter().any(|c| c.forces_replacement) {
        ResourceAction::Replace
    } else if !attribute_changes.is_empty() {
        ResourceAction::Update
    } else if importing {
        ResourceAction::Import
    } else {
        ResourceAction::NoOp
    };

    let note = match (&entry.disposition, action) {
        (Disposition::AdoptImplicit { via }, ResourceAction::Import) => Some(format!(
            "{} already matches through {}; it is adopted now and converges on the next run",
            entry.address(),
            via
        )),
        _ => None,
    };

    PlannedChange {
        address: entry.address().to_string(),
        kind: entry.kind(),
        disposition: entry.disposition.clone(),
        action,
        importing,
        physical_id: Some(existing.id.clone()),
        desired,
        current: Some(existing),
        attribute_changes,
        note,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn attrs(value: Value) -> Attributes {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_arrays_compare_as_sets() {
        let desired = attrs(json!({ "vpc_security_group_ids": ["sg-1", "sg-2"] }));
        let current = attrs(json!({ "vpc_security_group_ids": ["sg-2", "sg-1"] }));
        let changes = diff_attributes(ResourceKind::Instance, &desired, &current, &BTreeSet::new());
        assert!(changes.is_empty());
    }

    #[test]
    fn test_extra_tags_are_not_drift() {
        let desired = attrs(json!({ "tags": { "Name": "EC2-Dev/VPC" } }));
        let current = attrs(json!({ "tags": { "Name": "EC2-Dev/VPC", "team": "infra" } }));
        assert!(diff_attributes(ResourceKind::Vpc, &desired, &current, &BTreeSet::new()).is_empty());
    }

    #[test]
    fn test_ignored_attributes_never_diff() {
        let desired = attrs(json!({ "ami": "ami-new", "user_data": "#!/bin/bash" }));
        let current = attrs(json!({ "ami": "ami-old", "user_data": "echo old" }));
        let ignore: BTreeSet<String> = ["ami", "user_data"].iter().map(|s| s.to_string()).collect();
        assert!(diff_attributes(ResourceKind::Instance, &desired, &current, &ignore).is_empty());

        let changes = diff_attributes(ResourceKind::Instance, &desired, &current, &BTreeSet::new());
        assert_eq!(changes.len(), 2);
        assert!(changes.iter().all(|c| c.forces_replacement));
    }

    #[test]
    fn test_unknown_values_always_change() {
        let desired = attrs(json!({ "vpc_id": crate::resource::UNKNOWN }));
        let current = attrs(json!({ "vpc_id": crate::resource::UNKNOWN }));
        let changes = diff_attributes(ResourceKind::Subnet, &desired, &current, &BTreeSet::new());
        assert_eq!(changes.len(), 1);
        assert!(changes[0].forces_replacement);
    }

    #[test]
    fn test_in_place_change_does_not_force_replacement() {
        let desired = attrs(json!({ "instance_type": "m7g.xlarge" }));
        let current = attrs(json!({ "instance_type": "m7g.large" }));
        let changes = diff_attributes(ResourceKind::Instance, &desired, &current, &BTreeSet::new());
        assert_eq!(changes.len(), 1);
        assert!(!changes[0].forces_replacement);
        assert_eq!(changes[0].current, Some(json!("m7g.large")));
    }
}
