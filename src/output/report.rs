use std::collections::BTreeMap;
use std::fmt;

use crate::provider::ObservedResource;
use crate::resource::ResourceKind;

/// Counts over the objects an engine knows about.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct StateReport {
    pub managed: usize,
    pub unmanaged: usize,
    pub by_kind: BTreeMap<ResourceKind, usize>,
    pub stacks: BTreeMap<String, usize>,
}

impl StateReport {
    pub fn from_resources(resources: &[ObservedResource]) -> Self {
        let mut report = StateReport::default();
        for resource in resources {
            *report.by_kind.entry(resource.kind).or_insert(0) += 1;
            if resource.managed {
                report.managed += 1;
                if let Some(stack) = &resource.stack {
                    *report.stacks.entry(stack.clone()).or_insert(0) += 1;
                }
            } else {
                report.unmanaged += 1;
            }
        }
        report
    }

    pub fn total(&self) -> usize {
        self.managed + self.unmanaged
    }
}

impl fmt::Display for StateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} resource(s) total: {} managed, {} unmanaged",
            self.total(),
            self.managed,
            self.unmanaged
        )?;
        if !self.stacks.is_empty() {
            let stacks: Vec<String> = self
                .stacks
                .iter()
                .map(|(stack, count)| format!("{} ({})", stack, count))
                .collect();
            write!(f, " [{}]", stacks.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::Attributes;

    #[test]
    fn test_counts_managed_and_unmanaged() {
        let mut vpc = ObservedResource::unmanaged(ResourceKind::Vpc, "vpc-1", Attributes::new());
        vpc.managed = true;
        vpc.stack = Some("EC2-Dev".to_string());
        let subnet = ObservedResource::unmanaged(ResourceKind::Subnet, "subnet-1", Attributes::new());

        let report = StateReport::from_resources(&[vpc, subnet]);
        assert_eq!(report.total(), 2);
        assert_eq!(report.managed, 1);
        assert_eq!(report.by_kind[&ResourceKind::Subnet], 1);
        assert_eq!(
            report.to_string(),
            "2 resource(s) total: 1 managed, 1 unmanaged [EC2-Dev (1)]"
        );
    }
}
