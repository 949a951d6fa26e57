mod common;

use std::collections::HashSet;

use serde_json::json;
use tether::dag::validation::validate_dependency_coverage;
use tether::dag::visualizer::to_dot;
use tether::dag::PlanError;
use tether::provider::Lookups;
use tether::resource::ResourceKind;
use tether::stack::network::{DEFAULT_DESTINATION, SUBNET_CIDRS, VPC_CIDR};
use tether::stack::{self, build_stack};

#[test]
fn test_stack_has_every_resource() {
    let plan = common::dev_plan();
    assert_eq!(plan.len(), 16);
    assert_eq!(plan.stack_name(), "EC2-Dev");

    let count = |kind: ResourceKind| plan.resources().filter(|r| r.kind == kind).count();
    assert_eq!(count(ResourceKind::Vpc), 1);
    assert_eq!(count(ResourceKind::InternetGateway), 1);
    assert_eq!(count(ResourceKind::Subnet), 2);
    assert_eq!(count(ResourceKind::RouteTable), 2);
    assert_eq!(count(ResourceKind::Route), 2);
    assert_eq!(count(ResourceKind::RouteTableAssociation), 2);
    assert_eq!(count(ResourceKind::SecurityGroup), 2);
    assert_eq!(count(ResourceKind::Instance), 1);
}

#[test]
fn test_subnets_span_two_zones() {
    let plan = common::dev_plan();
    let subnets: Vec<_> = plan
        .resources()
        .filter(|r| r.kind == ResourceKind::Subnet)
        .collect();

    let zones: HashSet<&str> = subnets
        .iter()
        .map(|s| s.attributes["availability_zone"].as_str().unwrap())
        .collect();
    assert_eq!(zones.len(), 2);

    let subnet1 = plan.get(stack::PUBLIC_SUBNET1).unwrap();
    assert_eq!(subnet1.attributes["availability_zone"], json!("us-west-2a"));
    assert_eq!(subnet1.attributes["cidr_block"], json!(SUBNET_CIDRS[0]));
    assert_eq!(subnet1.attributes["map_public_ip_on_launch"], json!(true));
    assert_eq!(subnet1.tag_name(), Some("EC2-Dev/VPC/ServerPublicSubnet1"));

    let subnet2 = plan.get(stack::PUBLIC_SUBNET2).unwrap();
    assert_eq!(subnet2.attributes["availability_zone"], json!("us-west-2b"));
    assert_eq!(subnet2.attributes["cidr_block"], json!(SUBNET_CIDRS[1]));
}

#[test]
fn test_route_tables_are_one_to_one_with_subnets() {
    let plan = common::dev_plan();
    let pairs: Vec<(String, String)> = plan
        .resources()
        .filter(|r| r.kind == ResourceKind::RouteTableAssociation)
        .map(|a| {
            (
                a.reference_target("subnet_id").unwrap(),
                a.reference_target("route_table_id").unwrap(),
            )
        })
        .collect();

    assert_eq!(
        pairs,
        vec![
            (stack::PUBLIC_SUBNET1.to_string(), stack::ROUTE_TABLE1.to_string()),
            (stack::PUBLIC_SUBNET2.to_string(), stack::ROUTE_TABLE2.to_string()),
        ]
    );
}

#[test]
fn test_default_routes_point_at_gateway() {
    let plan = common::dev_plan();
    for (route, table) in [
        (stack::DEFAULT_ROUTE1, stack::ROUTE_TABLE1),
        (stack::DEFAULT_ROUTE2, stack::ROUTE_TABLE2),
    ] {
        let route = plan.get(route).unwrap();
        assert_eq!(route.attributes["destination_cidr_block"], json!(DEFAULT_DESTINATION));
        assert_eq!(route.reference_target("gateway_id").as_deref(), Some(stack::INTERNET_GATEWAY));
        assert_eq!(route.reference_target("route_table_id").as_deref(), Some(table));
        assert!(route.slot.is_none());
    }
}

#[test]
fn test_vpc_attributes() {
    let plan = common::dev_plan();
    let vpc = plan.get(stack::VPC).unwrap();
    assert_eq!(vpc.attributes["cidr_block"], json!(VPC_CIDR));
    assert_eq!(vpc.attributes["enable_dns_hostnames"], json!(true));
    assert_eq!(vpc.attributes["enable_dns_support"], json!(true));
    assert_eq!(vpc.tag_name(), Some("EC2-Dev/VPC"));
}

#[test]
fn test_every_reference_has_an_edge() {
    let plan = common::dev_plan();
    assert!(validate_dependency_coverage(&plan).is_empty());
}

#[test]
fn test_batches_respect_dependencies() {
    let plan = common::dev_plan();
    let batches = plan.batches();
    let position = |address: &str| {
        batches
            .iter()
            .position(|b| b.iter().any(|a| a == address))
            .unwrap()
    };

    let roots: HashSet<&str> = batches[0].iter().map(String::as_str).collect();
    assert_eq!(
        roots,
        HashSet::from([stack::VPC, stack::EC2_ROLE, stack::ASSET_BUCKET])
    );
    assert!(position(stack::VPC) < position(stack::PUBLIC_SUBNET1));
    assert!(position(stack::INTERNET_GATEWAY) < position(stack::DEFAULT_ROUTE1));
    assert!(position(stack::ROUTE_TABLE2) < position(stack::ASSOCIATION2));
    assert!(position(stack::INSTANCE_PROFILE) < position(stack::INSTANCE));
    assert_eq!(batches.iter().map(Vec::len).sum::<usize>(), 16);
}

#[test]
fn test_fewer_than_two_zones_is_an_error() {
    let lookups = Lookups {
        zones: vec!["us-west-2a".to_string()],
        ami: common::AMI.to_string(),
    };
    let err = build_stack(&common::dev(), &lookups).unwrap_err();
    assert_eq!(err, PlanError::InsufficientZones(1));
}

#[test]
fn test_subnets_must_land_in_distinct_zones() {
    let lookups = Lookups {
        zones: vec!["us-west-2a".to_string(), "us-west-2a".to_string()],
        ami: common::AMI.to_string(),
    };
    let err = build_stack(&common::dev(), &lookups).unwrap_err();
    assert_eq!(err, PlanError::DuplicateZones("us-west-2a".to_string()));
}

#[test]
fn test_extra_zones_are_ignored() {
    let lookups = Lookups {
        zones: vec![
            "us-west-2c".to_string(),
            "us-west-2a".to_string(),
            "us-west-2b".to_string(),
        ],
        ami: common::AMI.to_string(),
    };
    let plan = build_stack(&common::dev(), &lookups).unwrap();
    let subnet1 = plan.get(stack::PUBLIC_SUBNET1).unwrap();
    assert_eq!(subnet1.attributes["availability_zone"], json!("us-west-2c"));
}

#[test]
fn test_dot_output() {
    let plan = common::dev_plan();
    let dot = to_dot(&plan, |address| {
        (address == stack::VPC).then(|| "adopt vpc-1".to_string())
    });
    assert!(dot.starts_with("digraph \"EC2-Dev\" {"));
    assert!(dot.contains("[adopt vpc-1]"));
    assert!(dot.contains("\"VPC\" -> \"IGW\""));
}
