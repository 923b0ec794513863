//! SQLite-backed stores
//!
//! One database file backs all three store contracts. The schema mirrors
//! the metadata layout the analyzer pipeline produces: packages and
//! package-versions, modules with hierarchy metadata JSON, callables with
//! their stored URIs, and edges with invocation-site receiver JSON.
//!
//! Partial graphs are derived rather than stored as blobs: a
//! package-version's nodes are its callable rows (internal flag decides the
//! set), its edges the rows of `edges` whose source belongs to it.

use anyhow::{Context, Result};
use rusqlite::{params, params_from_iter, Connection};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::coordinate::Coordinate;

use super::{
    ArcRow, CallableRow, CallKind, DependencyStore, EdgeMetadataStore, GraphStore, HierarchyRow,
    InvocationSite, PartialGraph,
};

/// Forge tag for package rows; only Maven-style coordinates are stored.
pub const FORGE: &str = "mvn";

/// SQLite parameter ceiling is 999; stay under it when chunking IN lists
/// and OR chains.
const MAX_BATCH: usize = 400;

/// Wire shape of one receiver triple inside the `receivers` JSON column.
type ReceiverTriple = (i32, u8, String);

/// SQLite-backed implementation of all three store contracts.
pub struct SqliteStores {
    conn: Connection,
}

impl SqliteStores {
    /// Open a store database, creating the schema if missing.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path).context("failed to open store database")?;
        let stores = SqliteStores { conn };
        stores.ensure_schema()?;
        Ok(stores)
    }

    /// Open an in-memory database, for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let stores = SqliteStores { conn };
        stores.ensure_schema()?;
        Ok(stores)
    }

    fn ensure_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS packages (
                 id INTEGER PRIMARY KEY,
                 package_name TEXT NOT NULL,
                 forge TEXT NOT NULL,
                 UNIQUE (package_name, forge)
             );
             CREATE TABLE IF NOT EXISTS package_versions (
                 id INTEGER PRIMARY KEY,
                 package_id INTEGER NOT NULL REFERENCES packages(id),
                 version TEXT NOT NULL,
                 UNIQUE (package_id, version)
             );
             CREATE TABLE IF NOT EXISTS modules (
                 id INTEGER PRIMARY KEY,
                 package_version_id INTEGER NOT NULL REFERENCES package_versions(id),
                 namespace TEXT NOT NULL,
                 metadata TEXT NOT NULL DEFAULT '{}'
             );
             CREATE TABLE IF NOT EXISTS callables (
                 id INTEGER PRIMARY KEY,
                 module_id INTEGER NOT NULL REFERENCES modules(id),
                 fasten_uri TEXT NOT NULL,
                 is_internal INTEGER NOT NULL DEFAULT 1
             );
             CREATE TABLE IF NOT EXISTS edges (
                 source_id INTEGER NOT NULL,
                 target_id INTEGER NOT NULL,
                 receivers TEXT NOT NULL DEFAULT '[]',
                 PRIMARY KEY (source_id, target_id)
             );
             CREATE INDEX IF NOT EXISTS idx_modules_pv
                 ON modules(package_version_id);
             CREATE INDEX IF NOT EXISTS idx_callables_module
                 ON callables(module_id);",
        )?;
        Ok(())
    }

    // ---- writer API (fixtures and ingestion) ----

    /// Insert a package-version row, creating the package row on first use.
    /// Returns the package-version id.
    pub fn insert_package_version(&self, coordinate: &Coordinate) -> Result<u64> {
        self.conn.execute(
            "INSERT OR IGNORE INTO packages (package_name, forge) VALUES (?1, ?2)",
            params![coordinate.package_name(), FORGE],
        )?;
        let package_id: i64 = self.conn.query_row(
            "SELECT id FROM packages WHERE package_name = ?1 AND forge = ?2",
            params![coordinate.package_name(), FORGE],
            |row| row.get(0),
        )?;
        self.conn.execute(
            "INSERT OR IGNORE INTO package_versions (package_id, version) VALUES (?1, ?2)",
            params![package_id, coordinate.version],
        )?;
        let pv_id: i64 = self.conn.query_row(
            "SELECT id FROM package_versions WHERE package_id = ?1 AND version = ?2",
            params![package_id, coordinate.version],
            |row| row.get(0),
        )?;
        Ok(pv_id as u64)
    }

    /// Insert a module row with hierarchy metadata. Returns the module id.
    pub fn insert_module(
        &self,
        package_version: u64,
        namespace: &str,
        super_classes: &[&str],
        super_interfaces: &[&str],
    ) -> Result<u64> {
        let metadata = serde_json::json!({
            "superClasses": super_classes,
            "superInterfaces": super_interfaces,
        });
        self.conn.execute(
            "INSERT INTO modules (package_version_id, namespace, metadata)
             VALUES (?1, ?2, ?3)",
            params![package_version as i64, namespace, metadata.to_string()],
        )?;
        Ok(self.conn.last_insert_rowid() as u64)
    }

    /// Insert a callable row with an explicit id.
    pub fn insert_callable(
        &self,
        id: u64,
        module: u64,
        fasten_uri: &str,
        is_internal: bool,
    ) -> Result<()> {
        self.conn.execute(
            "INSERT INTO callables (id, module_id, fasten_uri, is_internal)
             VALUES (?1, ?2, ?3, ?4)",
            params![id as i64, module as i64, fasten_uri, is_internal],
        )?;
        Ok(())
    }

    /// Insert an edge with its invocation sites.
    pub fn insert_edge(&self, source: u64, target: u64, sites: &[InvocationSite]) -> Result<()> {
        let triples: Vec<ReceiverTriple> = sites
            .iter()
            .map(|s| (s.source_line, s.kind.to_wire(), s.receiver_type.clone()))
            .collect();
        self.conn.execute(
            "INSERT OR REPLACE INTO edges (source_id, target_id, receivers)
             VALUES (?1, ?2, ?3)",
            params![
                source as i64,
                target as i64,
                serde_json::to_string(&triples)?
            ],
        )?;
        Ok(())
    }

    // ---- status counters ----

    /// Count rows of one store table.
    pub fn count(&self, table: &str) -> Result<usize> {
        let sql = match table {
            "packages" => "SELECT COUNT(*) FROM packages",
            "package_versions" => "SELECT COUNT(*) FROM package_versions",
            "modules" => "SELECT COUNT(*) FROM modules",
            "callables" => "SELECT COUNT(*) FROM callables",
            "edges" => "SELECT COUNT(*) FROM edges",
            other => anyhow::bail!("unknown store table: {other}"),
        };
        let n: i64 = self.conn.query_row(sql, [], |row| row.get(0))?;
        Ok(n as usize)
    }

    /// Callable ids of one package-version, split internal/external.
    fn callables_of_pv(&self, package_version: u64) -> Result<(BTreeSet<u64>, BTreeSet<u64>)> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT c.id, c.is_internal FROM callables c
             JOIN modules m ON c.module_id = m.id
             WHERE m.package_version_id = ?1",
        )?;
        let mut internal = BTreeSet::new();
        let mut external = BTreeSet::new();
        let rows = stmt.query_map(params![package_version as i64], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, bool>(1)?))
        })?;
        for row in rows {
            let (id, is_internal) = row?;
            if is_internal {
                internal.insert(id as u64);
            } else {
                external.insert(id as u64);
            }
        }
        Ok((internal, external))
    }
}

impl DependencyStore for SqliteStores {
    fn ids_by_coordinates(&self, coordinates: &[Coordinate]) -> Result<BTreeSet<u64>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT pv.id FROM package_versions pv
             JOIN packages p ON pv.package_id = p.id
             WHERE p.package_name = ?1 AND pv.version = ?2 AND p.forge = ?3",
        )?;
        let unique: BTreeSet<&Coordinate> = coordinates.iter().collect();
        let mut ids = BTreeSet::new();
        for coordinate in unique {
            let row = stmt
                .query_row(
                    params![coordinate.package_name(), coordinate.version, FORGE],
                    |row| row.get::<_, i64>(0),
                )
                .map(Some)
                .or_else(|e| match e {
                    rusqlite::Error::QueryReturnedNoRows => Ok(None),
                    other => Err(other),
                })?;
            if let Some(id) = row {
                ids.insert(id as u64);
            }
        }
        Ok(ids)
    }

    fn callable_ids_of(&self, package_versions: &BTreeSet<u64>) -> Result<Vec<u64>> {
        let mut out = Vec::new();
        let pvs: Vec<u64> = package_versions.iter().copied().collect();
        for chunk in pvs.chunks(MAX_BATCH) {
            let placeholders = vec!["?"; chunk.len()].join(",");
            let sql = format!(
                "SELECT c.id FROM callables c
                 JOIN modules m ON c.module_id = m.id
                 WHERE m.package_version_id IN ({placeholders})
                   AND c.is_internal = 1
                 ORDER BY c.id"
            );
            let mut stmt = self.conn.prepare(&sql)?;
            let rows = stmt.query_map(
                params_from_iter(chunk.iter().map(|id| *id as i64)),
                |row| row.get::<_, i64>(0),
            )?;
            for row in rows {
                out.push(row? as u64);
            }
        }
        Ok(out)
    }

    fn callables_by_id(&self, callables: &BTreeSet<u64>) -> Result<Vec<CallableRow>> {
        let ids: Vec<u64> = callables.iter().copied().collect();
        let mut out = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(MAX_BATCH) {
            let placeholders = vec!["?"; chunk.len()].join(",");
            let sql = format!(
                "SELECT id, fasten_uri FROM callables WHERE id IN ({placeholders}) ORDER BY id"
            );
            let mut stmt = self.conn.prepare(&sql)?;
            let rows = stmt.query_map(
                params_from_iter(chunk.iter().map(|id| *id as i64)),
                |row| {
                    Ok(CallableRow {
                        id: row.get::<_, i64>(0)? as u64,
                        uri: row.get(1)?,
                    })
                },
            )?;
            for row in rows {
                out.push(row?);
            }
        }
        Ok(out)
    }

    fn module_hierarchy_of(&self, callables: &BTreeSet<u64>) -> Result<Vec<HierarchyRow>> {
        let ids: Vec<u64> = callables.iter().copied().collect();
        // module id -> row, deduplicated across chunks
        let mut modules: BTreeMap<i64, HierarchyRow> = BTreeMap::new();
        for chunk in ids.chunks(MAX_BATCH) {
            let placeholders = vec!["?"; chunk.len()].join(",");
            let sql = format!(
                "SELECT DISTINCT m.id, m.namespace, m.metadata FROM modules m
                 JOIN callables c ON c.module_id = m.id
                 WHERE c.id IN ({placeholders})"
            );
            let mut stmt = self.conn.prepare(&sql)?;
            let rows = stmt.query_map(
                params_from_iter(chunk.iter().map(|id| *id as i64)),
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )?;
            for row in rows {
                let (module_id, namespace, metadata) = row?;
                let parsed: serde_json::Value = serde_json::from_str(&metadata)
                    .with_context(|| format!("bad hierarchy metadata for module {module_id}"))?;
                let string_list = |key: &str| -> Vec<String> {
                    parsed[key]
                        .as_array()
                        .map(|values| {
                            values
                                .iter()
                                .filter_map(|v| v.as_str().map(str::to_string))
                                .collect()
                        })
                        .unwrap_or_default()
                };
                modules.insert(
                    module_id,
                    HierarchyRow {
                        namespace,
                        super_classes: string_list("superClasses"),
                        super_interfaces: string_list("superInterfaces"),
                    },
                );
            }
        }
        Ok(modules.into_values().collect())
    }
}

impl GraphStore for SqliteStores {
    fn partial_graph(&self, package_version: u64) -> Result<Option<PartialGraph>> {
        let (internal_nodes, external_nodes) = self.callables_of_pv(package_version)?;
        if internal_nodes.is_empty() && external_nodes.is_empty() {
            return Ok(None);
        }

        let mut graph = PartialGraph {
            internal_nodes,
            external_nodes,
            successors: BTreeMap::new(),
        };

        let sources: Vec<u64> = graph.nodes().collect();
        for chunk in sources.chunks(MAX_BATCH) {
            let placeholders = vec!["?"; chunk.len()].join(",");
            let sql = format!(
                "SELECT source_id, target_id FROM edges
                 WHERE source_id IN ({placeholders})
                 ORDER BY source_id, target_id"
            );
            let mut stmt = self.conn.prepare(&sql)?;
            let rows = stmt.query_map(
                params_from_iter(chunk.iter().map(|id| *id as i64)),
                |row| Ok((row.get::<_, i64>(0)? as u64, row.get::<_, i64>(1)? as u64)),
            )?;
            for row in rows {
                let (source, target) = row?;
                graph.add_edge(source, target);
            }
        }
        Ok(Some(graph))
    }
}

impl EdgeMetadataStore for SqliteStores {
    fn edges(&self, pairs: &[(u64, u64)]) -> Result<Vec<ArcRow>> {
        let mut out = Vec::with_capacity(pairs.len());
        // Each pair consumes two parameters in the OR chain
        for chunk in pairs.chunks(MAX_BATCH) {
            let condition = vec!["(source_id = ? AND target_id = ?)"; chunk.len()].join(" OR ");
            let sql = format!(
                "SELECT source_id, target_id, receivers FROM edges
                 WHERE {condition}
                 ORDER BY source_id, target_id"
            );
            let mut stmt = self.conn.prepare(&sql)?;
            let flat: Vec<i64> = chunk
                .iter()
                .flat_map(|(s, t)| [*s as i64, *t as i64])
                .collect();
            let rows = stmt.query_map(params_from_iter(flat), |row| {
                Ok((
                    row.get::<_, i64>(0)? as u64,
                    row.get::<_, i64>(1)? as u64,
                    row.get::<_, String>(2)?,
                ))
            })?;
            for row in rows {
                let (source, target, receivers) = row?;
                let triples: Vec<ReceiverTriple> = serde_json::from_str(&receivers)
                    .with_context(|| format!("bad receivers JSON on edge {source} -> {target}"))?;
                let sites = triples
                    .into_iter()
                    .map(|(line, kind, receiver_type)| InvocationSite {
                        source_line: line,
                        kind: CallKind::from_wire(kind),
                        receiver_type,
                    })
                    .collect();
                out.push(ArcRow {
                    source,
                    target,
                    sites,
                });
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> SqliteStores {
        let stores = SqliteStores::open_in_memory().unwrap();
        let coordinate = Coordinate::parse("g:a:1.0").unwrap();
        let pv = stores.insert_package_version(&coordinate).unwrap();
        let module = stores
            .insert_module(pv, "/ns/Widget", &["/ns/Base"], &[])
            .unwrap();
        stores
            .insert_callable(1, module, "/ns/Widget.m()%2Fns%2FV", true)
            .unwrap();
        stores
            .insert_callable(2, module, "/ns/Base.m()%2Fns%2FV", false)
            .unwrap();
        stores
            .insert_edge(
                1,
                2,
                &[InvocationSite {
                    source_line: 7,
                    kind: CallKind::Virtual,
                    receiver_type: "/ns/Base".to_string(),
                }],
            )
            .unwrap();
        stores
    }

    #[test]
    fn test_coordinate_lookup() {
        let stores = fixture();
        let present = Coordinate::parse("g:a:1.0").unwrap();
        let missing = Coordinate::parse("g:zz:9.9").unwrap();
        let ids = stores
            .ids_by_coordinates(&[present, missing])
            .unwrap();
        assert_eq!(ids.len(), 1);
    }

    #[test]
    fn test_partial_graph_derivation() {
        let stores = fixture();
        let pv = stores
            .ids_by_coordinates(&[Coordinate::parse("g:a:1.0").unwrap()])
            .unwrap()
            .into_iter()
            .next()
            .unwrap();
        let graph = stores.partial_graph(pv).unwrap().unwrap();
        assert_eq!(graph.internal_nodes, BTreeSet::from([1]));
        assert_eq!(graph.external_nodes, BTreeSet::from([2]));
        assert_eq!(graph.edges().collect::<Vec<_>>(), vec![(1, 2)]);

        assert!(stores.partial_graph(9999).unwrap().is_none());
    }

    #[test]
    fn test_edge_metadata_round_trip() {
        let stores = fixture();
        let rows = stores.edges(&[(1, 2)]).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].sites.len(), 1);
        assert_eq!(rows[0].sites[0].kind, CallKind::Virtual);
        assert_eq!(rows[0].sites[0].receiver_type, "/ns/Base");
    }

    #[test]
    fn test_hierarchy_rows() {
        let stores = fixture();
        let rows = stores
            .module_hierarchy_of(&BTreeSet::from([1]))
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].namespace, "/ns/Widget");
        assert_eq!(rows[0].super_classes, vec!["/ns/Base"]);
        assert!(rows[0].super_interfaces.is_empty());
    }

    #[test]
    fn test_internal_callables_only() {
        let stores = fixture();
        let pv = stores
            .ids_by_coordinates(&[Coordinate::parse("g:a:1.0").unwrap()])
            .unwrap();
        let ids = stores.callable_ids_of(&pv).unwrap();
        assert_eq!(ids, vec![1]);
    }
}
