pub mod resolver;
pub mod resource_graph;
pub mod validation;
pub mod visualizer;

pub use resource_graph::{AdoptionPlan, DependencyEdge, PlanError};
