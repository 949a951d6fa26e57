use colored::Colorize;

use super::resource_graph::{AdoptionPlan, PlanError};

/// A reference that is not backed by an explicit dependency edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub address: String,
    pub reference: String,
}

impl From<ValidationError> for PlanError {
    fn from(err: ValidationError) -> Self {
        PlanError::MissingDependency {
            address: err.address,
            reference: err.reference,
        }
    }
}

/// Print validation errors with colored, formatted output.
pub fn print_validation_errors(errors: &[ValidationError]) {
    for (i, err) in errors.iter().enumerate() {
        if i > 0 {
            eprintln!();
        }
        eprintln!(
            "{} {}",
            "Error:".red().bold(),
            "Undeclared dependency".bold()
        );
        eprintln!();
        eprintln!("  {} {}", "on".dimmed(), err.address.yellow());
        eprintln!();
        eprintln!(
            "  {} reads an attribute of {} but does not depend on it.",
            err.address.cyan().bold(),
            err.reference.cyan().bold()
        );
        eprintln!("  Adopted resources carry fixed ids, so ordering must be declared.");
    }
    eprintln!();
    eprintln!(
        "{} Plan contains {} error(s).",
        "Error:".red().bold(),
        errors.len().to_string().red().bold()
    );
}

/// Check that every `${address.attr}` reference has a matching edge.
///
/// Adopted resources resolve to hardcoded ids, so nothing but the declared
/// edges orders them during apply.
pub fn validate_dependency_coverage(plan: &AdoptionPlan) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for resource in plan.resources() {
        for reference in resource.references() {
            if !plan.has_edge(&reference, &resource.address) {
                errors.push(ValidationError {
                    address: resource.address.clone(),
                    reference,
                });
            }
        }
    }
    errors
}
