use std::collections::{HashMap, VecDeque};

use petgraph::graph::NodeIndex;

use super::resource_graph::PlanGraph;

/// Resolve the dependency graph into parallel execution batches.
///
/// Each batch contains resources whose dependencies all sit in earlier
/// batches. Uses Kahn's algorithm.
pub fn resolve_batches(graph: &PlanGraph) -> Vec<Vec<String>> {
    let mut in_degree: HashMap<NodeIndex, usize> = HashMap::new();
    let mut adjacency: HashMap<NodeIndex, Vec<NodeIndex>> = HashMap::new();

    for idx in graph.node_indices() {
        in_degree.insert(idx, 0);
        adjacency.insert(idx, Vec::new());
    }

    for edge in graph.edge_indices() {
        if let Some((from, to)) = graph.edge_endpoints(edge) {
            adjacency.entry(from).or_default().push(to);
            *in_degree.entry(to).or_insert(0) += 1;
        }
    }

    let mut batches: Vec<Vec<String>> = Vec::new();
    let mut queue: VecDeque<NodeIndex> = VecDeque::new();

    // Start with resources that have no dependencies
    for idx in graph.node_indices() {
        if in_degree.get(&idx).copied().unwrap_or(0) == 0 {
            queue.push_back(idx);
        }
    }

    while !queue.is_empty() {
        let mut batch = Vec::new();
        let mut next_queue = VecDeque::new();

        while let Some(node) = queue.pop_front() {
            batch.push(graph[node].address.clone());

            if let Some(neighbors) = adjacency.get(&node) {
                for &neighbor in neighbors {
                    if let Some(deg) = in_degree.get_mut(&neighbor) {
                        *deg -= 1;
                        if *deg == 0 {
                            next_queue.push_back(neighbor);
                        }
                    }
                }
            }
        }

        batch.sort(); // Deterministic ordering within a batch
        batches.push(batch);
        queue = next_queue;
    }

    batches
}
