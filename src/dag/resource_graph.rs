use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use thiserror::Error;

use crate::resource::LogicalResource;

/// Errors raised while assembling an adoption plan.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error("resource address '{0}' is declared more than once")]
    DuplicateAddress(String),

    #[error("resource '{address}' depends on unknown resource '{dependency}'")]
    UnknownDependency { address: String, dependency: String },

    #[error("resource '{address}' references '{reference}' without declaring a dependency on it")]
    MissingDependency { address: String, reference: String },

    #[error("circular dependency detected involving '{0}'")]
    Cycle(String),

    #[error("need at least two availability zones, found {0}")]
    InsufficientZones(usize),

    #[error("both public subnets would be placed in availability zone '{0}'")]
    DuplicateZones(String),
}

/// The type of dependency between two resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyEdge {
    /// The dependent reads an attribute of the dependency.
    Reference,
    /// Declared for ordering only.
    Ordering,
}

/// A resource-level dependency graph. An edge A -> B means B depends on A.
pub type PlanGraph = DiGraph<LogicalResource, DependencyEdge>;

/// The logical resources of one stack plus their dependency edges.
#[derive(Debug, Clone)]
pub struct AdoptionPlan {
    stack_name: String,
    graph: PlanGraph,
    node_map: HashMap<String, NodeIndex>,
}

impl AdoptionPlan {
    /// Assemble a plan from declared resources.
    ///
    /// Every `depends_on` entry becomes an edge; unknown targets and cycles
    /// are rejected.
    pub fn from_resources(
        stack_name: &str,
        resources: Vec<LogicalResource>,
    ) -> Result<Self, PlanError> {
        let mut graph = PlanGraph::new();
        let mut node_map: HashMap<String, NodeIndex> = HashMap::new();

        for resource in resources {
            if node_map.contains_key(&resource.address) {
                return Err(PlanError::DuplicateAddress(resource.address));
            }
            let address = resource.address.clone();
            let idx = graph.add_node(resource);
            node_map.insert(address, idx);
        }

        let mut edges = Vec::new();
        for idx in graph.node_indices() {
            let resource = &graph[idx];
            let refs = resource.references();
            for dep in &resource.depends_on {
                let from_idx = node_map.get(dep).copied().ok_or_else(|| {
                    PlanError::UnknownDependency {
                        address: resource.address.clone(),
                        dependency: dep.clone(),
                    }
                })?;
                let edge = if refs.contains(dep) {
                    DependencyEdge::Reference
                } else {
                    DependencyEdge::Ordering
                };
                edges.push((from_idx, idx, edge));
            }
        }
        for (from, to, edge) in edges {
            graph.add_edge(from, to, edge);
        }

        if let Err(cycle) = petgraph::algo::toposort(&graph, None) {
            return Err(PlanError::Cycle(graph[cycle.node_id()].address.clone()));
        }

        Ok(Self {
            stack_name: stack_name.to_string(),
            graph,
            node_map,
        })
    }

    pub fn stack_name(&self) -> &str {
        &self.stack_name
    }

    pub fn graph(&self) -> &PlanGraph {
        &self.graph
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn get(&self, address: &str) -> Option<&LogicalResource> {
        self.node_map.get(address).map(|idx| &self.graph[*idx])
    }

    /// All resources in declaration order.
    pub fn resources(&self) -> impl Iterator<Item = &LogicalResource> {
        self.graph.node_indices().map(|idx| &self.graph[idx])
    }

    /// Dependency batches, each sorted by address.
    pub fn batches(&self) -> Vec<Vec<String>> {
        super::resolver::resolve_batches(&self.graph)
    }

    /// Resources ordered so that every dependency precedes its dependents.
    pub fn ordered(&self) -> Vec<&LogicalResource> {
        self.batches()
            .iter()
            .flatten()
            .filter_map(|address| self.get(address))
            .collect()
    }

    /// Whether `dependent` has a direct edge from `dependency`.
    pub fn has_edge(&self, dependency: &str, dependent: &str) -> bool {
        match (self.node_map.get(dependency), self.node_map.get(dependent)) {
            (Some(&from), Some(&to)) => self.graph.contains_edge(from, to),
            _ => false,
        }
    }
}
