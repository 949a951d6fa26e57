use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;

use super::schema;
use super::snapshot::Snapshot;
use crate::provider::mint::{computed_attributes, merge_attributes, mint_id};
use crate::provider::{ObservedResource, ProvisioningEngine};
use crate::resource::{Attributes, ResourceKind};
use crate::sizing::CpuArch;

const ZONE: &str = "zone";
const IMAGE: &str = "image";

/// SQLite-backed provisioning engine for local runs.
pub struct SqliteEngine {
    conn: Mutex<Connection>,
    region: String,
}

/// A `resources` row before its kind and attributes are parsed.
struct ResourceRow {
    kind: String,
    physical_id: String,
    attributes_json: String,
    managed: bool,
    stack: Option<String>,
    address: Option<String>,
}

impl ResourceRow {
    fn into_observed(self) -> Result<ObservedResource> {
        let kind: ResourceKind = self.kind.parse().map_err(anyhow::Error::msg)?;
        let attributes: Attributes = serde_json::from_str(&self.attributes_json)
            .with_context(|| format!("Corrupt attributes for {} '{}'", kind, self.physical_id))?;
        Ok(ObservedResource {
            kind,
            id: self.physical_id,
            attributes,
            managed: self.managed,
            stack: self.stack,
            address: self.address,
        })
    }
}

const RESOURCE_COLUMNS: &str = "kind, physical_id, attributes_json, managed, stack, address";

fn row_to_resource(row: &rusqlite::Row<'_>) -> rusqlite::Result<ResourceRow> {
    Ok(ResourceRow {
        kind: row.get(0)?,
        physical_id: row.get(1)?,
        attributes_json: row.get(2)?,
        managed: row.get::<_, i64>(3)? != 0,
        stack: row.get(4)?,
        address: row.get(5)?,
    })
}

impl SqliteEngine {
    /// Open or create the engine database and make sure the schema exists.
    pub fn open(db_path: &str, region: &str) -> Result<Self> {
        let parent = Path::new(db_path).parent();
        if let Some(dir) = parent {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)?;
            }
        }
        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open engine database at {}", db_path))?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        let engine = Self {
            conn: Mutex::new(conn),
            region: region.to_string(),
        };
        engine.initialize()?;
        Ok(engine)
    }

    /// Open an in-memory database (for testing).
    pub fn open_memory(region: &str) -> Result<Self> {
        let engine = Self {
            conn: Mutex::new(Connection::open_in_memory()?),
            region: region.to_string(),
        };
        engine.initialize()?;
        Ok(engine)
    }

    fn now() -> String {
        chrono::Utc::now().to_rfc3339()
    }

    fn initialize(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(schema::CREATE_TABLES_SQL)?;
        conn.execute_batch(schema::CREATE_INDEXES_SQL)?;
        conn.execute(
            "INSERT OR IGNORE INTO schema_version (version, applied_at, description) VALUES (?1, ?2, ?3)",
            params![schema::SCHEMA_VERSION, Self::now(), "Initial schema"],
        )?;
        Ok(())
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    // ─── Lookups ────────────────────────────────────────────────────────────

    /// Replace the zones reported for a region.
    pub fn register_zones(&self, region: &str, zones: &[String]) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM lookups WHERE category = ?1 AND key = ?2",
            params![ZONE, region],
        )?;
        for (position, zone) in zones.iter().enumerate() {
            tx.execute(
                "INSERT INTO lookups (category, key, position, value) VALUES (?1, ?2, ?3, ?4)",
                params![ZONE, region, position as i64, zone],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Set the latest image for an architecture (`arm64`, `x86_64`).
    pub fn register_image(&self, arch: &str, ami: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO lookups (category, key, position, value) VALUES (?1, ?2, 0, ?3)
             ON CONFLICT(category, key, position) DO UPDATE SET value = excluded.value",
            params![IMAGE, arch.to_ascii_lowercase(), ami],
        )?;
        Ok(())
    }

    // ─── Resources ──────────────────────────────────────────────────────────

    /// Insert or overwrite an object.
    pub fn upsert(&self, resource: &ObservedResource) -> Result<()> {
        let now = Self::now();
        let attributes_json = serde_json::to_string(&resource.attributes)?;
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO resources (kind, physical_id, attributes_json, managed, stack, address, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(kind, physical_id) DO UPDATE SET
                attributes_json = excluded.attributes_json,
                managed = excluded.managed,
                stack = excluded.stack,
                address = excluded.address,
                updated_at = excluded.updated_at",
            params![
                resource.kind.type_name(),
                resource.id,
                attributes_json,
                resource.managed as i64,
                resource.stack,
                resource.address,
                now,
                now,
            ],
        )?;
        Ok(())
    }

    fn fetch(&self, kind: ResourceKind, id: &str) -> Result<Option<ObservedResource>> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                &format!(
                    "SELECT {} FROM resources WHERE kind = ?1 AND physical_id = ?2",
                    RESOURCE_COLUMNS
                ),
                params![kind.type_name(), id],
                row_to_resource,
            )
            .optional()?;
        row.map(ResourceRow::into_observed).transpose()
    }

    /// Every object, ordered by kind and id.
    pub fn list_resources(&self) -> Result<Vec<ObservedResource>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM resources ORDER BY kind, physical_id",
            RESOURCE_COLUMNS
        ))?;
        let rows = stmt
            .query_map([], row_to_resource)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(ResourceRow::into_observed).collect()
    }

    /// Objects managed by one stack, ordered by address.
    pub fn list_managed(&self, stack: &str) -> Result<Vec<ObservedResource>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM resources WHERE managed = 1 AND stack = ?1 ORDER BY address",
            RESOURCE_COLUMNS
        ))?;
        let rows = stmt
            .query_map(params![stack], row_to_resource)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(ResourceRow::into_observed).collect()
    }

    /// Seed lookups and existing objects. Returns the number of objects loaded.
    pub fn load_snapshot(&self, snapshot: &Snapshot) -> Result<usize> {
        for (region, zones) in &snapshot.zones {
            self.register_zones(region, zones)?;
        }
        for (arch, ami) in &snapshot.images {
            self.register_image(arch, ami)?;
        }
        for resource in &snapshot.resources {
            self.upsert(resource)?;
        }
        tracing::info!(
            resources = snapshot.resources.len(),
            regions = snapshot.zones.len(),
            images = snapshot.images.len(),
            "Loaded snapshot"
        );
        Ok(snapshot.resources.len())
    }

    // ─── Runs ───────────────────────────────────────────────────────────────

    pub fn start_run(&self, stack: &str, strategy: &str, resources_planned: usize) -> Result<String> {
        let id = uuid::Uuid::new_v4().to_string();
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO runs (id, stack, strategy, started_at, status, resources_planned)
             VALUES (?1, ?2, ?3, ?4, 'running', ?5)",
            params![id, stack, strategy, Self::now(), resources_planned as i64],
        )?;
        Ok(id)
    }

    pub fn complete_run(
        &self,
        run_id: &str,
        status: &str,
        resources_succeeded: usize,
        resources_failed: usize,
    ) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE runs SET completed_at = ?2, status = ?3, resources_succeeded = ?4, resources_failed = ?5
             WHERE id = ?1",
            params![
                run_id,
                Self::now(),
                status,
                resources_succeeded as i64,
                resources_failed as i64
            ],
        )?;
        Ok(())
    }

    /// Status of the most recent run of a stack.
    pub fn latest_run_status(&self, stack: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().unwrap();
        let status = conn
            .query_row(
                "SELECT status FROM runs WHERE stack = ?1 ORDER BY started_at DESC LIMIT 1",
                params![stack],
                |row| row.get(0),
            )
            .optional()?;
        Ok(status)
    }
}

#[async_trait]
impl ProvisioningEngine for SqliteEngine {
    async fn available_zones(&self, region: &str) -> Result<Vec<String>> {
        let zones = {
            let conn = self.conn.lock().unwrap();
            let mut stmt = conn.prepare(
                "SELECT value FROM lookups WHERE category = ?1 AND key = ?2 ORDER BY position",
            )?;
            let rows = stmt
                .query_map(params![ZONE, region], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        };
        if zones.is_empty() {
            tracing::debug!(region = %region, "No zones registered, using default zone names");
            return Ok(["a", "b", "c"]
                .iter()
                .map(|suffix| format!("{}{}", region, suffix))
                .collect());
        }
        Ok(zones)
    }

    async fn latest_ami(&self, arch: CpuArch) -> Result<String> {
        let conn = self.conn.lock().unwrap();
        let ami: Option<String> = conn
            .query_row(
                "SELECT value FROM lookups WHERE category = ?1 AND key = ?2 AND position = 0",
                params![IMAGE, arch.image_arch()],
                |row| row.get(0),
            )
            .optional()?;
        ami.ok_or_else(|| {
            anyhow!(
                "No machine image registered for {}; set engine.amis.{} or load a snapshot",
                arch,
                arch.image_arch()
            )
        })
    }

    async fn read(&self, kind: ResourceKind, id: &str) -> Result<Option<ObservedResource>> {
        self.fetch(kind, id)
    }

    async fn find_managed(&self, stack: &str, address: &str) -> Result<Option<ObservedResource>> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                &format!(
                    "SELECT {} FROM resources WHERE managed = 1 AND stack = ?1 AND address = ?2",
                    RESOURCE_COLUMNS
                ),
                params![stack, address],
                row_to_resource,
            )
            .optional()?;
        row.map(ResourceRow::into_observed).transpose()
    }

    async fn create(
        &self,
        stack: &str,
        address: &str,
        kind: ResourceKind,
        attributes: &Attributes,
    ) -> Result<ObservedResource> {
        let id = mint_id(stack, address, kind, attributes);
        if self.fetch(kind, &id)?.is_some() {
            bail!("{} '{}' already exists", kind, id);
        }
        let mut stored = attributes.clone();
        merge_attributes(&mut stored, &computed_attributes(kind, &id, &self.region));

        let resource = ObservedResource {
            kind,
            id,
            attributes: stored,
            managed: true,
            stack: Some(stack.to_string()),
            address: Some(address.to_string()),
        };
        self.upsert(&resource)?;
        tracing::debug!(address = %address, id = %resource.id, "Created resource");
        Ok(resource)
    }

    async fn update(
        &self,
        kind: ResourceKind,
        id: &str,
        attributes: &Attributes,
    ) -> Result<ObservedResource> {
        let mut resource = self
            .fetch(kind, id)?
            .ok_or_else(|| anyhow!("{} '{}' does not exist", kind, id))?;
        merge_attributes(&mut resource.attributes, attributes);
        self.upsert(&resource)?;
        Ok(resource)
    }

    async fn import(
        &self,
        stack: &str,
        address: &str,
        kind: ResourceKind,
        id: &str,
    ) -> Result<ObservedResource> {
        let mut resource = self
            .fetch(kind, id)?
            .ok_or_else(|| anyhow!("{} '{}' does not exist", kind, id))?;
        resource.managed = true;
        resource.stack = Some(stack.to_string());
        resource.address = Some(address.to_string());
        self.upsert(&resource)?;
        Ok(resource)
    }

    async fn delete(&self, kind: ResourceKind, id: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute(
            "DELETE FROM resources WHERE kind = ?1 AND physical_id = ?2",
            params![kind.type_name(), id],
        )?;
        if deleted == 0 {
            bail!("{} '{}' does not exist", kind, id);
        }
        Ok(())
    }
}
