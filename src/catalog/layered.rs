//! Layered metadata catalog.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::dialect::{DialectVersion, SqlDialect};
use crate::error::{CubeError, Result};

use super::meta::{MetaField, MetaRelation, MetaTable};
use super::Catalog;

/// Catalog holding its own descriptors, optionally layered over a parent.
///
/// The visible set of each descriptor kind is this catalog's own entries
/// followed by the parent's entries whose id is not already present. The
/// merge runs on every call, so descriptors added to the parent later are
/// picked up by the child.
///
/// A parent must exist before its child is created, which rules out
/// inheritance cycles.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaCatalog {
    dialect: SqlDialect,
    #[serde(default)]
    version: DialectVersion,
    #[serde(default)]
    parent: Option<Arc<MetaCatalog>>,
    #[serde(default)]
    tables: RwLock<Vec<Arc<MetaTable>>>,
    #[serde(default)]
    fields: RwLock<Vec<Arc<MetaField>>>,
    #[serde(default)]
    relations: RwLock<Vec<Arc<MetaRelation>>>,
}

/// Own entries first, then parent entries with unseen ids.
fn merge<T>(own: &[Arc<T>], inherited: Vec<Arc<T>>, id: impl Fn(&T) -> &str) -> Vec<Arc<T>> {
    let seen: HashSet<&str> = own.iter().map(|e| id(e.as_ref())).collect();
    let extra: Vec<Arc<T>> = inherited
        .into_iter()
        .filter(|e| !seen.contains(id(e.as_ref())))
        .collect();
    own.iter().cloned().chain(extra).collect()
}

fn push_unique<T>(
    list: &RwLock<Vec<Arc<T>>>,
    entry: T,
    kind: &str,
    id: impl Fn(&T) -> &str,
) -> Result<Arc<T>> {
    let mut list = list.write();
    if list.iter().any(|e| id(e.as_ref()) == id(&entry)) {
        return Err(duplicate(kind, id(&entry)));
    }
    let entry = Arc::new(entry);
    list.push(Arc::clone(&entry));
    Ok(entry)
}

/// Fails on the first id that appears twice in one layer.
fn check_unique<T>(list: &RwLock<Vec<Arc<T>>>, kind: &str, id: impl Fn(&T) -> &str) -> Result<()> {
    let list = list.read();
    let mut seen = HashSet::new();
    for entry in list.iter() {
        let key = id(entry.as_ref());
        if !seen.insert(key) {
            return Err(duplicate(kind, key));
        }
    }
    Ok(())
}

fn duplicate(kind: &str, id: &str) -> CubeError {
    CubeError::ContractViolation(format!("{kind} '{id}' is already declared in this catalog"))
}

impl MetaCatalog {
    /// Creates an empty root catalog.
    #[must_use]
    pub fn new(dialect: SqlDialect) -> Self {
        MetaCatalog {
            dialect,
            version: DialectVersion::default(),
            parent: None,
            tables: RwLock::new(Vec::new()),
            fields: RwLock::new(Vec::new()),
            relations: RwLock::new(Vec::new()),
        }
    }

    /// Sets the server version.
    #[must_use]
    pub fn with_version(mut self, version: DialectVersion) -> Self {
        self.version = version;
        self
    }

    /// Creates an empty catalog layered over `parent`, inheriting its
    /// dialect and version.
    #[must_use]
    pub fn child_of(parent: Arc<MetaCatalog>) -> Self {
        let mut catalog = MetaCatalog::new(parent.dialect).with_version(parent.version);
        catalog.parent = Some(parent);
        catalog
    }

    #[must_use]
    pub fn parent(&self) -> Option<&Arc<MetaCatalog>> {
        self.parent.as_ref()
    }

    /// Declares a table in this layer.
    ///
    /// # Errors
    ///
    /// Returns a contract violation if this layer already has the id.
    pub fn add_table(&self, table: MetaTable) -> Result<Arc<MetaTable>> {
        push_unique(&self.tables, table, "table", MetaTable::id)
    }

    /// Declares a field in this layer.
    ///
    /// # Errors
    ///
    /// Returns a contract violation if this layer already has the id.
    pub fn add_field(&self, field: MetaField) -> Result<Arc<MetaField>> {
        push_unique(&self.fields, field, "field", MetaField::id)
    }

    /// Declares a relation in this layer.
    ///
    /// # Errors
    ///
    /// Returns a contract violation if this layer already has the id.
    pub fn add_relation(&self, relation: MetaRelation) -> Result<Arc<MetaRelation>> {
        push_unique(&self.relations, relation, "relation", MetaRelation::id)
    }

    /// Binds the parent's descriptors to the parent, then this layer's
    /// descriptors to this catalog. Returns how many descriptors were
    /// newly bound; a second call returns zero.
    ///
    /// # Errors
    ///
    /// Returns a contract violation if a layer holds the same id twice, or
    /// `NotFound` if a field or relation names a table that is not
    /// visible from its catalog.
    pub fn prepare(self: &Arc<Self>) -> Result<usize> {
        let mut bound = match &self.parent {
            Some(parent) => parent.prepare()?,
            None => 0,
        };
        self.check_layer()?;

        // Snapshots: binding a field looks tables up through this catalog.
        let tables = self.tables.read().clone();
        let fields = self.fields.read().clone();
        let relations = self.relations.read().clone();

        for table in &tables {
            bound += usize::from(table.prepare(self)?);
        }
        for field in &fields {
            bound += usize::from(field.prepare(self)?);
        }
        for relation in &relations {
            bound += usize::from(relation.prepare(self)?);
        }

        trace!(
            dialect = %self.dialect,
            tables = tables.len(),
            fields = fields.len(),
            relations = relations.len(),
            bound,
            "prepared catalog"
        );
        Ok(bound)
    }

    /// Shortest chain of tables from `source_id` to `target_id`, following
    /// relations from left to right. Both ends are included.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if either table is unknown or no path exists.
    pub fn shortest_path(&self, source_id: &str, target_id: &str) -> Result<Vec<Arc<MetaTable>>> {
        let source = self.table_by_id(source_id)?;
        self.table_by_id(target_id)?;
        if source_id == target_id {
            return Ok(vec![source]);
        }

        let mut edges: HashMap<String, Vec<String>> = HashMap::new();
        for relation in self.relations() {
            edges
                .entry(relation.lhs_id().to_string())
                .or_default()
                .push(relation.rhs_id().to_string());
        }

        let mut previous: HashMap<String, String> = HashMap::new();
        let mut queue = VecDeque::from([source_id.to_string()]);
        let mut visited = HashSet::from([source_id.to_string()]);
        while let Some(current) = queue.pop_front() {
            if current == target_id {
                break;
            }
            for next in edges.get(&current).into_iter().flatten() {
                if visited.insert(next.clone()) {
                    previous.insert(next.clone(), current.clone());
                    queue.push_back(next.clone());
                }
            }
        }

        if !previous.contains_key(target_id) {
            return Err(CubeError::not_found(
                "path",
                format!("{source_id} -> {target_id}"),
            ));
        }
        let mut ids = vec![target_id.to_string()];
        while let Some(prev) = ids.last().and_then(|id| previous.get(id)) {
            ids.push(prev.clone());
        }
        ids.reverse();
        ids.iter().map(|id| self.table_by_id(id)).collect()
    }

    /// Parses a catalog from JSON. Descriptors come back unbound.
    ///
    /// # Errors
    ///
    /// Returns a serialization error on malformed input, or a contract
    /// violation if a layer declares the same id twice.
    pub fn from_json(json: &str) -> Result<Self> {
        let catalog: MetaCatalog = serde_json::from_str(json)?;
        catalog.check_layers()?;
        Ok(catalog)
    }

    /// # Errors
    ///
    /// Returns a serialization error if encoding fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Serializes the catalog to a binary snapshot.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if encoding fails.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| CubeError::Serialization(format!("Failed to serialize catalog: {e}")))
    }

    /// Restores a catalog from a binary snapshot. Descriptors come back
    /// unbound.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if the data is invalid, or a contract
    /// violation if a layer declares the same id twice.
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        let catalog: MetaCatalog = bincode::deserialize(data)
            .map_err(|e| CubeError::Serialization(format!("Failed to deserialize catalog: {e}")))?;
        catalog.check_layers()?;
        Ok(catalog)
    }

    /// Decoded layers bypass `add_*`, so ids are checked once loaded.
    fn check_layer(&self) -> Result<()> {
        check_unique(&self.tables, "table", MetaTable::id)?;
        check_unique(&self.fields, "field", MetaField::id)?;
        check_unique(&self.relations, "relation", MetaRelation::id)
    }

    fn check_layers(&self) -> Result<()> {
        self.check_layer()?;
        match &self.parent {
            Some(parent) => parent.check_layers(),
            None => Ok(()),
        }
    }
}

impl Catalog for MetaCatalog {
    fn dialect(&self) -> SqlDialect {
        self.dialect
    }

    fn version(&self) -> DialectVersion {
        self.version
    }

    fn tables(&self) -> Vec<Arc<MetaTable>> {
        let inherited = self.parent.as_ref().map(|p| p.tables()).unwrap_or_default();
        merge(&self.tables.read(), inherited, MetaTable::id)
    }

    fn fields(&self) -> Vec<Arc<MetaField>> {
        let inherited = self.parent.as_ref().map(|p| p.fields()).unwrap_or_default();
        merge(&self.fields.read(), inherited, MetaField::id)
    }

    fn relations(&self) -> Vec<Arc<MetaRelation>> {
        let inherited = self
            .parent
            .as_ref()
            .map(|p| p.relations())
            .unwrap_or_default();
        merge(&self.relations.read(), inherited, MetaRelation::id)
    }
}
