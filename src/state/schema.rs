/// SQL DDL for the local engine database.
///
/// `resources` holds every physical object the engine knows about, managed
/// or not. `lookups` backs zone enumeration and image lookup.

pub const SCHEMA_VERSION: i32 = 1;

pub const CREATE_TABLES_SQL: &str = "
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL,
    description TEXT
);

-- Physical objects
CREATE TABLE IF NOT EXISTS resources (
    kind TEXT NOT NULL,
    physical_id TEXT NOT NULL,
    attributes_json TEXT NOT NULL DEFAULT '{}',
    managed INTEGER NOT NULL DEFAULT 0,
    stack TEXT,
    address TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (kind, physical_id)
);

-- Zones (category 'zone', key = region) and images (category 'image', key = arch)
CREATE TABLE IF NOT EXISTS lookups (
    category TEXT NOT NULL,
    key TEXT NOT NULL,
    position INTEGER NOT NULL DEFAULT 0,
    value TEXT NOT NULL,
    PRIMARY KEY (category, key, position)
);

-- Apply runs
CREATE TABLE IF NOT EXISTS runs (
    id TEXT PRIMARY KEY,
    stack TEXT NOT NULL,
    strategy TEXT NOT NULL,
    started_at TEXT NOT NULL,
    completed_at TEXT,
    status TEXT NOT NULL DEFAULT 'running',
    resources_planned INTEGER DEFAULT 0,
    resources_succeeded INTEGER DEFAULT 0,
    resources_failed INTEGER DEFAULT 0
);
";

pub const CREATE_INDEXES_SQL: &str = "
CREATE INDEX IF NOT EXISTS idx_resources_owner ON resources(stack, address);
CREATE INDEX IF NOT EXISTS idx_runs_stack ON runs(stack);
";
