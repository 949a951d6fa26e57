pub mod exporter;
pub mod formatter;
pub mod report;

pub use exporter::{OutputError, StackOutputs};
