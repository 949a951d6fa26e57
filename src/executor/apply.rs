use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use colored::Colorize;
use dashmap::DashMap;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use super::retry::{with_retry, RetryPolicy};
use crate::planner::plan::{PlanSummary, PlannedChange, ResourceAction};
use crate::planner::reconcile::ReconciledPlan;
use crate::provider::{ObservedResource, ProvisioningEngine};
use crate::resource::reference::resolve_attributes;
use crate::resource::{Attributes, LogicalResource};

/// Outcome of one resource during apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyStatus {
    Succeeded,
    Failed(String),
    Skipped(String),
}

#[derive(Debug, Clone)]
pub struct ResourceResult {
    pub address: String,
    pub action: ResourceAction,
    pub status: ApplyStatus,
    pub physical_id: Option<String>,
}

/// Summary of an apply operation.
#[derive(Debug)]
pub struct ApplySummary {
    pub results: Vec<ResourceResult>,
    pub added: usize,
    pub imported: usize,
    pub changed: usize,
    pub replaced: usize,
    pub failed: usize,
    pub skipped: usize,
    pub elapsed_secs: u64,
}

impl ApplySummary {
    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.skipped == 0
    }

    pub fn get(&self, address: &str) -> Option<&ResourceResult> {
        self.results.iter().find(|r| r.address == address)
    }
}

impl fmt::Display for ApplySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Apply complete! Resources: {} added, {} imported, {} changed, {} replaced",
            self.added, self.imported, self.changed, self.replaced,
        )?;
        if self.failed > 0 {
            write!(f, ", {} failed", self.failed)?;
        }
        if self.skipped > 0 {
            write!(f, ", {} skipped", self.skipped)?;
        }
        write!(f, ". Total time: {}.", format_elapsed(self.elapsed_secs))
    }
}

fn format_elapsed(secs: u64) -> String {
    if secs < 60 {
        format!("{}s", secs)
    } else {
        let mins = secs / 60;
        let remaining = secs % 60;
        if remaining == 0 {
            format!("{}m", mins)
        } else {
            format!("{}m{}s", mins, remaining)
        }
    }
}

/// Applies a computed plan against an engine, batch by batch.
#[derive(Debug, Clone, Copy)]
pub struct Executor {
    parallelism: usize,
    retry: RetryPolicy,
}

impl Executor {
    pub fn new(parallelism: usize, retry: RetryPolicy) -> Self {
        Self {
            parallelism: parallelism.max(1),
            retry,
        }
    }

    /// Execute every planned change.
    ///
    /// Resources in one batch run concurrently. References are re-resolved
    /// against objects completed earlier in the walk, so created ids flow
    /// into their dependents. A failure skips everything downstream of it.
    pub async fn apply(
        &self,
        reconciled: &ReconciledPlan,
        plan: &PlanSummary,
        engine: Arc<dyn ProvisioningEngine>,
    ) -> Result<ApplySummary> {
        let start = Instant::now();
        let semaphore = Arc::new(Semaphore::new(self.parallelism));
        let completed: Arc<DashMap<String, ObservedResource>> = Arc::new(DashMap::new());
        let stack = Arc::new(reconciled.stack_name.clone());

        let changes: HashMap<&str, &PlannedChange> =
            plan.changes.iter().map(|c| (c.address.as_str(), c)).collect();
        let mut blocked: HashSet<String> = HashSet::new();
        let mut results: Vec<ResourceResult> = Vec::new();

        for (batch_idx, batch) in reconciled.batches.iter().enumerate() {
            info!(batch = batch_idx + 1, resources = ?batch, "Starting batch");
            let mut handles = Vec::new();

            for address in batch {
                let Some(entry) = reconciled.get(address) else {
                    continue;
                };
                let change = changes
                    .get(address.as_str())
                    .ok_or_else(|| anyhow!("No planned change for {}", address))?;

                if let Some(dep) = entry
                    .resource
                    .depends_on
                    .iter()
                    .find(|d| blocked.contains(*d))
                {
                    let reason = format!("Dependency '{}' failed", dep);
                    println!("{}: {} — {}", address.bold(), "Skipped".yellow(), reason.dimmed());
                    warn!(address = %address, dependency = %dep, "Skipping due to failed dependency");
                    blocked.insert(address.clone());
                    results.push(ResourceResult {
                        address: address.clone(),
                        action: change.action,
                        status: ApplyStatus::Skipped(reason),
                        physical_id: change.physical_id.clone(),
                    });
                    continue;
                }

                let lookup = |addr: &str, attr: &str| completed.get(addr).and_then(|o| o.attribute(attr));
                let desired = resolve_attributes(&entry.resource.attributes, &lookup);

                let mut resource = entry.resource.clone();
                if let Some(id) = &change.physical_id {
                    resource.ignore_changes = entry.ignore_set_for(id);
                }
                let task = ResourceTask {
                    stack: Arc::clone(&stack),
                    resource,
                    action: change.action,
                    importing: change.importing,
                    physical_id: change.physical_id.clone(),
                    current: change.current.clone(),
                    desired,
                };
                let engine = Arc::clone(&engine);
                let retry = self.retry;
                let permit = semaphore
                    .clone()
                    .acquire_owned()
                    .await
                    .context("Executor semaphore closed")?;

                if task.action != ResourceAction::NoOp {
                    println!("{}: {}...", address, task.verb().cyan());
                }
                let handle = tokio::spawn(async move {
                    let _permit = permit;
                    let started = Instant::now();
                    let outcome = task.run(engine.as_ref(), retry).await;
                    (task, outcome, started.elapsed().as_secs())
                });
                handles.push(handle);
            }

            for handle in handles {
                let (task, outcome, secs) = handle.await?;
                let address = task.resource.address.clone();
                match outcome {
                    Ok(observed) => {
                        if task.action != ResourceAction::NoOp {
                            println!(
                                "{}: {} after {}s [id={}]",
                                address,
                                format!("{} complete", task.verb()).green().bold(),
                                secs,
                                observed.id,
                            );
                        }
                        debug!(address = %address, id = %observed.id, "Resource applied");
                        results.push(ResourceResult {
                            address: address.clone(),
                            action: task.action,
                            status: ApplyStatus::Succeeded,
                            physical_id: Some(observed.id.clone()),
                        });
                        completed.insert(address, observed);
                    }
                    Err(e) => {
                        println!("{}: {} — {}", address.bold(), "FAILED".red().bold(), e);
                        tracing::error!(address = %address, error = %e, "Resource failed");
                        blocked.insert(address.clone());
                        results.push(ResourceResult {
                            address,
                            action: task.action,
                            status: ApplyStatus::Failed(format!("{:#}", e)),
                            physical_id: task.physical_id.clone(),
                        });
                    }
                }
            }
        }

        Ok(summarize(results, plan, start.elapsed().as_secs()))
    }
}

fn summarize(results: Vec<ResourceResult>, plan: &PlanSummary, elapsed_secs: u64) -> ApplySummary {
    let succeeded = |action: ResourceAction| {
        results
            .iter()
            .filter(|r| r.action == action && r.status == ApplyStatus::Succeeded)
            .count()
    };
    let imported = results
        .iter()
        .filter(|r| r.status == ApplyStatus::Succeeded)
        .filter(|r| {
            r.action == ResourceAction::Import
                || plan.get(&r.address).is_some_and(|c| c.importing)
        })
        .count();

    ApplySummary {
        added: succeeded(ResourceAction::Create),
        imported,
        changed: succeeded(ResourceAction::Update),
        replaced: succeeded(ResourceAction::Replace),
        failed: results
            .iter()
            .filter(|r| matches!(r.status, ApplyStatus::Failed(_)))
            .count(),
        skipped: results
            .iter()
            .filter(|r| matches!(r.status, ApplyStatus::Skipped(_)))
            .count(),
        results,
        elapsed_secs,
    }
}

/// Everything a spawned task needs to apply one resource.
struct ResourceTask {
    stack: Arc<String>,
    resource: LogicalResource,
    action: ResourceAction,
    importing: bool,
    physical_id: Option<String>,
    current: Option<ObservedResource>,
    desired: Attributes,
}

impl ResourceTask {
    fn verb(&self) -> &'static str {
        match self.action {
            ResourceAction::Create => "Creating",
            ResourceAction::Import => "Importing",
            ResourceAction::Update => "Modifying",
            ResourceAction::Replace => "Replacing",
            ResourceAction::NoOp => "Reading",
        }
    }

    fn existing_id(&self) -> Result<&str> {
        self.physical_id
            .as_deref()
            .ok_or_else(|| anyhow!("{} has no physical id", self.resource.address))
    }

    /// Desired attributes minus the ignored ones.
    fn enforced(&self) -> Attributes {
        self.desired
            .iter()
            .filter(|(k, _)| !self.resource.ignore_changes.contains(*k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    async fn run(&self, engine: &dyn ProvisioningEngine, retry: RetryPolicy) -> Result<ObservedResource> {
        let stack = self.stack.as_str();
        let address = self.resource.address.as_str();
        let kind = self.resource.kind;

        match self.action {
            ResourceAction::Create => {
                with_retry(retry, address, || engine.create(stack, address, kind, &self.desired)).await
            }
            ResourceAction::Import => {
                let id = self.existing_id()?;
                with_retry(retry, address, || engine.import(stack, address, kind, id)).await
            }
            ResourceAction::Update => {
                let id = self.existing_id()?;
                let enforced = self.enforced();
                let updated =
                    with_retry(retry, address, || engine.update(kind, id, &enforced)).await?;
                if self.importing {
                    with_retry(retry, address, || engine.import(stack, address, kind, id)).await
                } else {
                    Ok(updated)
                }
            }
            ResourceAction::Replace => {
                let id = self.existing_id()?;
                with_retry(retry, address, || engine.delete(kind, id)).await?;
                info!(address = %address, id = %id, "Old resource deleted");
                with_retry(retry, address, || engine.create(stack, address, kind, &self.desired)).await
            }
            ResourceAction::NoOp => self
                .current
                .clone()
                .ok_or_else(|| anyhow!("{} has no current state", address)),
        }
    }
}
