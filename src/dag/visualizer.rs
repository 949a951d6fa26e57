use super::resource_graph::{AdoptionPlan, DependencyEdge};

/// Convert the plan's dependency graph to DOT format.
///
/// `annotate` may return a per-resource label suffix (e.g. `adopt`), which
/// also selects the fill color.
pub fn to_dot<F>(plan: &AdoptionPlan, annotate: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let graph = plan.graph();
    let mut lines = Vec::new();
    lines.push(format!("digraph \"{}\" {{", plan.stack_name()));
    lines.push("    rankdir=TB;".to_string());
    lines.push("    node [shape=box, style=filled];".to_string());

    for idx in graph.node_indices() {
        let resource = &graph[idx];
        let note = annotate(&resource.address);
        let color = match note.as_deref() {
            Some(n) if n.starts_with("adopt") => "#a8c8d8",
            Some(n) if n.starts_with("create") => "#a8d8a8",
            _ => "lightgrey",
        };
        let label = match note {
            Some(n) => format!("{}\\n{}\\n[{}]", resource.address, resource.kind, n),
            None => format!("{}\\n{}", resource.address, resource.kind),
        };
        lines.push(format!(
            "    \"{}\" [label=\"{}\", fillcolor=\"{}\"];",
            resource.address, label, color
        ));
    }

    for edge in graph.edge_indices() {
        if let Some((from, to)) = graph.edge_endpoints(edge) {
            let style = match graph[edge] {
                DependencyEdge::Reference => "solid",
                DependencyEdge::Ordering => "dashed",
            };
            lines.push(format!(
                "    \"{}\" -> \"{}\" [style={}];",
                graph[from].address, graph[to].address, style
            ));
        }
    }

    lines.push("}".to_string());
    lines.join("\n")
}
