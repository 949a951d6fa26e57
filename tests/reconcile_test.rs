mod common;

use tether::catalog::{self, ResourceMapping};
use tether::dag::{AdoptionPlan, PlanError};
use tether::planner::{reconcile, AdoptionStrategy, Disposition, ReconcileError};
use tether::resource::reference::reference;
use tether::resource::{LogicalResource, ResourceKind};
use tether::stack;

fn dev_mapping() -> ResourceMapping {
    catalog::lookup("dev").unwrap().clone()
}

#[test]
fn test_adopt_existing_binds_every_catalog_id() {
    let plan = common::dev_plan();
    let mapping = dev_mapping();
    let reconciled = reconcile(AdoptionStrategy::AdoptExisting, &plan, &mapping).unwrap();

    assert_eq!(reconciled.resources.len(), 16);
    assert_eq!(reconciled.adopt_count(), 16);
    assert_eq!(reconciled.create_count(), 0);
    assert_eq!(
        reconciled.disposition(stack::VPC),
        Some(&Disposition::Adopt {
            id: mapping.vpc.clone()
        })
    );
    assert_eq!(
        reconciled.disposition(stack::INSTANCE).and_then(Disposition::bound_id),
        Some("i-084b07ea685e39d1d")
    );
    assert_eq!(
        reconciled.disposition(stack::ASSOCIATION1).and_then(Disposition::bound_id),
        Some(mapping.route_table_association1.as_str())
    );
}

#[test]
fn test_routes_are_adopted_through_their_route_table() {
    let plan = common::dev_plan();
    let reconciled = reconcile(AdoptionStrategy::AdoptExisting, &plan, &dev_mapping()).unwrap();

    assert_eq!(
        reconciled.disposition(stack::DEFAULT_ROUTE1),
        Some(&Disposition::AdoptImplicit {
            via: stack::ROUTE_TABLE1.to_string()
        })
    );
    assert_eq!(
        reconciled.disposition(stack::DEFAULT_ROUTE2).map(Disposition::label),
        Some("adopt-implicit")
    );
    assert_eq!(reconciled.notes.len(), 2);
    assert!(reconciled.notes[0].contains("owned by adopted route table"));
    assert!(!reconciled.notes[0].contains("next run"));
}

#[test]
fn test_create_new_ignores_the_catalog() {
    let plan = common::dev_plan();
    let reconciled = reconcile(AdoptionStrategy::CreateNew, &plan, &dev_mapping()).unwrap();

    assert_eq!(reconciled.adopt_count(), 0);
    assert!(reconciled
        .resources
        .iter()
        .all(|r| r.disposition == Disposition::Create));
    assert!(reconciled.notes.is_empty());
}

#[test]
fn test_blank_ids_fall_back_to_create() {
    let plan = common::dev_plan();
    let mut mapping = dev_mapping();
    mapping.asset_bucket.clear();
    mapping.route_table2 = "  ".to_string();
    mapping.route_table_association2.clear();

    let reconciled = reconcile(AdoptionStrategy::AdoptExisting, &plan, &mapping).unwrap();
    assert_eq!(reconciled.disposition(stack::ASSET_BUCKET), Some(&Disposition::Create));
    assert_eq!(reconciled.disposition(stack::ROUTE_TABLE2), Some(&Disposition::Create));
    assert_eq!(reconciled.disposition(stack::DEFAULT_ROUTE2), Some(&Disposition::Create));
    assert!(reconciled.disposition(stack::DEFAULT_ROUTE1).unwrap().is_adopt());
    assert_eq!(reconciled.notes.len(), 1);
}

#[test]
fn test_adopted_security_groups_ignore_rules() {
    let plan = common::dev_plan();
    let adopted = reconcile(AdoptionStrategy::AdoptExisting, &plan, &dev_mapping()).unwrap();
    let group = adopted.get(stack::SSH_SECURITY_GROUP).unwrap();
    for attribute in ["description", "ingress", "egress"] {
        assert!(group.ignores(attribute), "{} not ignored", attribute);
    }
    assert!(!group.ignores("vpc_id"));

    let created = reconcile(AdoptionStrategy::CreateNew, &plan, &dev_mapping()).unwrap();
    assert!(!created.get(stack::SSH_SECURITY_GROUP).unwrap().ignores("ingress"));
}

#[test]
fn test_instance_ignores_boot_script_and_image_in_both_strategies() {
    let plan = common::dev_plan();
    for strategy in [AdoptionStrategy::AdoptExisting, AdoptionStrategy::CreateNew] {
        let reconciled = reconcile(strategy, &plan, &dev_mapping()).unwrap();
        let instance = reconciled.get(stack::INSTANCE).unwrap();
        assert!(instance.ignores("user_data"));
        assert!(instance.ignores("ami"));
        assert!(!instance.ignores("instance_type"));
    }
}

#[test]
fn test_association_pointing_at_wrong_subnet_fails() {
    let plan = common::dev_plan();
    let mut mapping = dev_mapping();
    mapping.route_table_association1 =
        format!("{}/{}", mapping.public_subnet2, mapping.route_table1);

    let err = reconcile(AdoptionStrategy::AdoptExisting, &plan, &mapping).unwrap_err();
    assert_eq!(
        err,
        ReconcileError::CompositeIdMismatch {
            address: stack::ASSOCIATION1.to_string(),
            id: mapping.route_table_association1.clone(),
            expected_subnet: mapping.public_subnet1.clone(),
            expected_route_table: mapping.route_table1.clone(),
        }
    );
}

#[test]
fn test_association_with_unbound_endpoint_fails() {
    let plan = common::dev_plan();
    let mut mapping = dev_mapping();
    mapping.public_subnet1.clear();

    let err = reconcile(AdoptionStrategy::AdoptExisting, &plan, &mapping).unwrap_err();
    match err {
        ReconcileError::CompositeIdMismatch {
            address,
            expected_subnet,
            ..
        } => {
            assert_eq!(address, stack::ASSOCIATION1);
            assert_eq!(expected_subnet, "(unbound)");
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_malformed_association_id_fails() {
    let plan = common::dev_plan();
    let mut mapping = dev_mapping();
    mapping.route_table_association2 = mapping.route_table2.clone();

    let err = reconcile(AdoptionStrategy::AdoptExisting, &plan, &mapping).unwrap_err();
    assert_eq!(
        err,
        ReconcileError::MalformedCompositeId {
            address: stack::ASSOCIATION2.to_string(),
            id: mapping.route_table2.clone(),
        }
    );
}

#[test]
fn test_association_checks_are_skipped_when_creating() {
    let plan = common::dev_plan();
    let mut mapping = dev_mapping();
    mapping.route_table_association1 = "garbage".to_string();
    assert!(reconcile(AdoptionStrategy::CreateNew, &plan, &mapping).is_ok());
}

#[test]
fn test_reference_without_dependency_is_rejected() {
    let resources = vec![
        LogicalResource::new("VPC", ResourceKind::Vpc).attr("cidr_block", "10.0.0.0/16"),
        LogicalResource::new("Subnet", ResourceKind::Subnet).attr("vpc_id", reference("VPC", "id")),
    ];
    let plan = AdoptionPlan::from_resources("EC2-Dev", resources).unwrap();

    let err = reconcile(AdoptionStrategy::CreateNew, &plan, &dev_mapping()).unwrap_err();
    assert_eq!(
        err,
        ReconcileError::Plan(PlanError::MissingDependency {
            address: "Subnet".to_string(),
            reference: "VPC".to_string(),
        })
    );
}

#[test]
fn test_batches_are_carried_over() {
    let plan = common::dev_plan();
    let reconciled = reconcile(AdoptionStrategy::AdoptExisting, &plan, &dev_mapping()).unwrap();
    assert_eq!(reconciled.batches, plan.batches());
    assert_eq!(reconciled.stack_name, "EC2-Dev");
    assert_eq!(reconciled.resources[0].address(), reconciled.batches[0][0]);
}
