use colored::Colorize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use super::exporter::StackOutputs;
use super::report::StateReport;
use crate::catalog::{Catalog, EnvName, ResourceMapping, Slot};
use crate::executor::{ApplyStatus, ApplySummary};
use crate::planner::plan::{PlanSummary, PlannedChange, ResourceAction};
use crate::provider::ObservedResource;
use crate::resource::UNKNOWN;

/// Attributes too long to print; shown as a digest instead.
const DIGEST_ATTRIBUTES: [&str; 1] = ["user_data"];

/// Print a success message.
pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green().bold(), msg.green());
}

/// Print a plan in a Terraform-like format.
///
/// `targets` filters by address substring; empty means everything.
pub fn print_plan(plan: &PlanSummary, targets: &[String]) {
    println!();
    println!(
        "{} {} (strategy: {})",
        "Stack".bold(),
        plan.stack_name.bold().cyan(),
        plan.strategy
    );
    println!();

    let actionable: Vec<&PlannedChange> = plan
        .changes
        .iter()
        .filter(|c| c.action != ResourceAction::NoOp)
        .filter(|c| targets.is_empty() || targets.iter().any(|t| c.address.contains(t.as_str())))
        .collect();

    if actionable.is_empty() {
        println!("{}", "No changes. Infrastructure matches the configuration.".green());
        print_notes(&plan.notes);
        return;
    }

    println!("Resource actions are indicated with the following symbols:");
    let has = |action: ResourceAction| actionable.iter().any(|c| c.action == action);
    if has(ResourceAction::Create) {
        println!("  {} create", "+".green().bold());
    }
    if has(ResourceAction::Import) || actionable.iter().any(|c| c.importing) {
        println!("  {} import existing object", "<=".cyan().bold());
    }
    if has(ResourceAction::Update) {
        println!("  {} update in-place", "~".yellow().bold());
    }
    if has(ResourceAction::Replace) {
        println!("  {} destroy and then create replacement", "-/+".magenta().bold());
    }

    println!();
    println!("The following actions will be performed:");
    println!();

    for change in &actionable {
        print_resource_change(change);
    }

    println!("{}", plan);
    print_notes(&plan.notes);
    println!();
}

fn print_notes(notes: &[String]) {
    if notes.is_empty() {
        return;
    }
    println!();
    for note in notes {
        println!("{} {}", "Note:".cyan().bold(), note.dimmed());
    }
}

/// Print a single resource change with its attributes.
fn print_resource_change(change: &PlannedChange) {
    let color_fn: fn(&str) -> colored::ColoredString = match change.action {
        ResourceAction::Create => |s: &str| s.green(),
        ResourceAction::Import => |s: &str| s.cyan(),
        ResourceAction::Update => |s: &str| s.yellow(),
        ResourceAction::Replace => |s: &str| s.magenta(),
        ResourceAction::NoOp => return,
    };

    let action_desc = match change.action {
        ResourceAction::Create => "will be created".to_string(),
        ResourceAction::Import => format!("will be adopted ({})", change.disposition),
        ResourceAction::Update if change.importing => {
            "will be adopted and updated in-place".to_string()
        }
        ResourceAction::Update => "will be updated in-place".to_string(),
        ResourceAction::Replace => "must be replaced".to_string(),
        ResourceAction::NoOp => return,
    };

    println!(
        "  {} {} {}",
        "#".dimmed(),
        change.address.bold(),
        action_desc.dimmed()
    );
    let header = format!(
        "  {} resource \"{}\" \"{}\" {{",
        change.action, change.kind, change.address
    );
    println!("{}", color_fn(&header));

    if let Some(id) = &change.physical_id {
        println!("{}", color_fn(&format!("        id = \"{}\"", id)));
    }

    match change.action {
        ResourceAction::Create => {
            let width = change.desired.keys().map(|k| k.len()).max().unwrap_or(0).min(35);
            for (key, value) in &change.desired {
                let line = format!(
                    "      + {:<width$} = {}",
                    key,
                    format_attribute(key, value),
                    width = width
                );
                println!("{}", color_fn(&line));
            }
        }
        ResourceAction::Update | ResourceAction::Replace => {
            let width = change
                .attribute_changes
                .iter()
                .map(|c| c.attribute.len())
                .max()
                .unwrap_or(0)
                .min(35);
            for attr in &change.attribute_changes {
                let before = attr
                    .current
                    .as_ref()
                    .map(|v| format_attribute(&attr.attribute, v))
                    .unwrap_or_else(|| "null".to_string());
                let after = format_attribute(&attr.attribute, &attr.desired);
                let marker = if attr.forces_replacement { " # forces replacement" } else { "" };
                let line = format!(
                    "      ~ {:<width$} = {} -> {}{}",
                    attr.attribute,
                    before,
                    after,
                    marker,
                    width = width
                );
                println!("{}", color_fn(&line));
            }
        }
        _ => {}
    }

    println!("{}", color_fn("    }"));
    println!();
}

fn format_attribute(key: &str, value: &Value) -> String {
    match value {
        Value::String(s) if DIGEST_ATTRIBUTES.contains(&key) && s != UNKNOWN => {
            format!("<{} lines, sha256:{}>", s.lines().count(), short_digest(s))
        }
        _ => format_value_short(value),
    }
}

/// First 12 hex characters of the SHA-256 of `content`.
pub fn short_digest(content: &str) -> String {
    let digest = Sha256::digest(content.as_bytes());
    let mut hex = hex::encode(digest);
    hex.truncate(12);
    hex
}

/// Format a JSON value for short inline display.
fn format_value_short(value: &Value) -> String {
    match value {
        Value::String(s) if s == UNKNOWN => UNKNOWN.dimmed().to_string(),
        Value::String(s) => format!("\"{}\"", s),
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(arr) => {
            if arr.is_empty() {
                "[]".to_string()
            } else if arr.len() <= 4 && arr.iter().all(|v| matches!(v, Value::String(_))) {
                let items: Vec<String> = arr.iter().map(format_value_short).collect();
                format!("[{}]", items.join(", "))
            } else {
                format!("[...{} items]", arr.len())
            }
        }
        Value::Object(obj) => {
            if obj.is_empty() {
                "{}".to_string()
            } else if obj.len() <= 4 && obj.values().all(|v| !v.is_object() && !v.is_array()) {
                let items: Vec<String> = obj
                    .iter()
                    .map(|(k, v)| format!("{} = {}", k, format_value_short(v)))
                    .collect();
                format!("{{ {} }}", items.join(", "))
            } else {
                format!("{{...{} keys}}", obj.len())
            }
        }
    }
}

/// Print the result of an apply.
pub fn print_apply_summary(summary: &ApplySummary) {
    println!();
    for result in &summary.results {
        match &result.status {
            ApplyStatus::Failed(err) => {
                println!("  {} {} {}", "✗".red().bold(), result.address.bold(), err.red());
            }
            ApplyStatus::Skipped(reason) => {
                println!("  {} {} {}", "-".yellow(), result.address, reason.dimmed());
            }
            ApplyStatus::Succeeded => {}
        }
    }
    if summary.is_success() {
        println!("{}", summary.to_string().green().bold());
    } else {
        println!("{}", summary.to_string().yellow().bold());
    }
}

/// Print stack outputs as `name = "value"` lines.
pub fn print_outputs(outputs: &StackOutputs) {
    println!();
    println!("{}", "Outputs:".bold());
    println!();
    let entries = outputs.entries();
    let width = entries.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
    for (name, value) in entries {
        let padded = format!("{:<width$}", name, width = width);
        println!("{} = \"{}\"", padded.cyan(), value);
    }
    println!();
}

/// Print the catalog overview: one line per environment.
pub fn print_catalog(catalog: &Catalog) {
    println!();
    println!(
        "  {:<6} {:<10} {:<24} {}",
        "ENV".bold(),
        "STACK".bold(),
        "VPC".bold(),
        "IDS".bold()
    );
    println!("{}", "─".repeat(60));
    for (env, mapping) in catalog.entries() {
        println!(
            "  {:<6} {:<10} {:<24} {}/{}",
            env.as_str(),
            env.stack_name(),
            mapping.vpc,
            mapping.populated_count(),
            Slot::ALL.len()
        );
    }
    println!();
}

/// Print every field of one environment's mapping.
pub fn print_mapping(env: EnvName, mapping: &ResourceMapping) {
    println!();
    println!("{} {} ({})", "Environment:".bold().cyan(), env.as_str().bold(), env.stack_name());
    println!("{}", "─".repeat(60));
    for slot in Slot::ALL {
        let value = mapping.id_for(slot).unwrap_or("-");
        println!("  {:<26} {}", slot.field_name(), value);
    }
    if let Some(ami) = mapping.ami_override() {
        println!("  {:<26} {}", "ami", ami);
    }
    println!();
}

/// Print the objects known to the local engine.
pub fn print_resource_list(resources: &[ObservedResource]) {
    if resources.is_empty() {
        println!("{}", "No resources in state.".dimmed());
        return;
    }

    println!();
    println!(
        "  {:<28} {:<42} {:<10} {}",
        "TYPE".bold(),
        "ID".bold(),
        "STATUS".bold(),
        "ADDRESS".bold()
    );
    println!("{}", "─".repeat(100));
    for resource in resources {
        let status = if resource.managed {
            "managed".green().to_string()
        } else {
            "unmanaged".yellow().to_string()
        };
        let owner = match (&resource.stack, &resource.address) {
            (Some(stack), Some(address)) => format!("{}/{}", stack, address),
            _ => "-".to_string(),
        };
        println!(
            "  {:<28} {:<42} {:<10} {}",
            resource.kind.type_name(),
            resource.id,
            status,
            owner.dimmed()
        );
    }

    let report = StateReport::from_resources(resources);
    println!();
    println!("  {}", report);
    println!();
}
