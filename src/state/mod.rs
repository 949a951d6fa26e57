pub mod schema;
pub mod snapshot;
pub mod sqlite;

pub use snapshot::Snapshot;
pub use sqlite::SqliteEngine;
