use super::{INTERNET_GATEWAY, VPC};
use crate::catalog::Slot;
use crate::resource::reference::reference;
use crate::resource::{name_tag, LogicalResource, ResourceKind};

pub const VPC_CIDR: &str = "10.0.0.0/16";
pub const SUBNET_CIDRS: [&str; 2] = ["10.0.0.0/24", "10.0.1.0/24"];
pub const DEFAULT_DESTINATION: &str = "0.0.0.0/0";

const SUBNET_SLOTS: [Slot; 2] = [Slot::PublicSubnet1, Slot::PublicSubnet2];
const ROUTE_TABLE_SLOTS: [Slot; 2] = [Slot::RouteTable1, Slot::RouteTable2];
const ASSOCIATION_SLOTS: [Slot; 2] = [Slot::RouteTableAssociation1, Slot::RouteTableAssociation2];

/// VPC, gateway, and per-zone subnet, route table, association and default route.
pub fn resources(stack: &str, zones: [&str; 2]) -> Vec<LogicalResource> {
    let mut out = vec![
        LogicalResource::new(VPC, ResourceKind::Vpc)
            .bound_through(Slot::Vpc)
            .attr("cidr_block", VPC_CIDR)
            .attr("enable_dns_hostnames", true)
            .attr("enable_dns_support", true)
            .name_tag(name_tag(stack, "VPC")),
        LogicalResource::new(INTERNET_GATEWAY, ResourceKind::InternetGateway)
            .bound_through(Slot::InternetGateway)
            .attr("vpc_id", reference(VPC, "id"))
            .name_tag(name_tag(stack, "IGW"))
            .depends_on(VPC),
    ];

    for (i, zone) in zones.iter().enumerate() {
        let subnet = format!("ServerPublicSubnet{}", i + 1);
        let route_table = format!("{}RouteTable", subnet);
        let route = format!("{}DefaultRoute", subnet);
        let association = format!("{}RouteTableAssociation", subnet);
        let tag = name_tag(stack, &format!("VPC/{}", subnet));

        out.push(
            LogicalResource::new(subnet.as_str(), ResourceKind::Subnet)
                .bound_through(SUBNET_SLOTS[i])
                .attr("vpc_id", reference(VPC, "id"))
                .attr("cidr_block", SUBNET_CIDRS[i])
                .attr("availability_zone", *zone)
                .attr("map_public_ip_on_launch", true)
                .name_tag(tag.clone())
                .depends_on(VPC),
        );
        out.push(
            LogicalResource::new(route_table.as_str(), ResourceKind::RouteTable)
                .bound_through(ROUTE_TABLE_SLOTS[i])
                .attr("vpc_id", reference(VPC, "id"))
                .name_tag(tag)
                .depends_on(VPC),
        );
        out.push(
            LogicalResource::new(route.as_str(), ResourceKind::Route)
                .attr("route_table_id", reference(&route_table, "id"))
                .attr("destination_cidr_block", DEFAULT_DESTINATION)
                .attr("gateway_id", reference(INTERNET_GATEWAY, "id"))
                .depends_on(&route_table)
                .depends_on(INTERNET_GATEWAY),
        );
        out.push(
            LogicalResource::new(association.as_str(), ResourceKind::RouteTableAssociation)
                .bound_through(ASSOCIATION_SLOTS[i])
                .attr("subnet_id", reference(&subnet, "id"))
                .attr("route_table_id", reference(&route_table, "id"))
                .depends_on(&subnet)
                .depends_on(&route_table),
        );
    }

    out
}
