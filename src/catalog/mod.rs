//! Catalog of table, field and relation descriptors.
//!
//! A [`Catalog`] answers lookups over its visible descriptors. Only the
//! three listing methods are required; every lookup has a default that
//! scans them, so an implementation with an index can override just the
//! hot paths.

mod layered;
mod meta;

pub use layered::MetaCatalog;
pub use meta::{MetaField, MetaRelation, MetaTable};

use std::sync::Arc;

use crate::dialect::{DialectVersion, SqlDialect};
use crate::error::{CubeError, Result};

/// Read side of a catalog.
pub trait Catalog: Send + Sync {
    /// Dialect SQL is rendered for.
    fn dialect(&self) -> SqlDialect;

    /// Server version the catalog targets.
    fn version(&self) -> DialectVersion;

    /// Visible tables, deduplicated by id.
    fn tables(&self) -> Vec<Arc<MetaTable>>;

    /// Visible fields, deduplicated by id.
    fn fields(&self) -> Vec<Arc<MetaField>>;

    /// Visible relations, deduplicated by id.
    fn relations(&self) -> Vec<Arc<MetaRelation>>;

    fn table_count(&self) -> usize {
        self.tables().len()
    }

    fn field_count(&self) -> usize {
        self.fields().len()
    }

    /// # Errors
    ///
    /// Returns `NotFound` if no visible table has this id.
    fn table_by_id(&self, id: &str) -> Result<Arc<MetaTable>> {
        self.tables()
            .into_iter()
            .find(|t| t.id() == id)
            .ok_or_else(|| CubeError::not_found("table", id))
    }

    /// First visible table named `name`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no visible table has this name.
    fn table_by_name(&self, name: &str) -> Result<Arc<MetaTable>> {
        self.tables()
            .into_iter()
            .find(|t| t.name() == name)
            .ok_or_else(|| CubeError::not_found("table", name))
    }

    /// Table owning `field`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the owning table is not visible.
    fn table_by_field(&self, field: &MetaField) -> Result<Arc<MetaTable>> {
        self.table_by_id(field.table_id())
    }

    /// # Errors
    ///
    /// Returns `NotFound` if no visible field has this id.
    fn field_by_id(&self, id: &str) -> Result<Arc<MetaField>> {
        self.fields()
            .into_iter()
            .find(|f| f.id() == id)
            .ok_or_else(|| CubeError::not_found("field", id))
    }

    /// # Errors
    ///
    /// Returns `NotFound` if the table has no field named `name`.
    fn field_by_name(&self, table_id: &str, name: &str) -> Result<Arc<MetaField>> {
        self.fields()
            .into_iter()
            .find(|f| f.table_id() == table_id && f.name() == name)
            .ok_or_else(|| CubeError::not_found("field", format!("{table_id}.{name}")))
    }

    /// Fields owned by `table_id`, in catalog order. Empty if none.
    fn fields_by_table(&self, table_id: &str) -> Vec<Arc<MetaField>> {
        self.fields()
            .into_iter()
            .filter(|f| f.table_id() == table_id)
            .collect()
    }

    /// # Errors
    ///
    /// Returns `NotFound` if no visible relation has this id.
    fn relation_by_id(&self, id: &str) -> Result<Arc<MetaRelation>> {
        self.relations()
            .into_iter()
            .find(|r| r.id() == id)
            .ok_or_else(|| CubeError::not_found("relation", id))
    }

    /// Relations with `table_id` on either side.
    fn relations_by_table(&self, table_id: &str) -> Vec<Arc<MetaRelation>> {
        self.relations()
            .into_iter()
            .filter(|r| r.touches(table_id))
            .collect()
    }

    /// Relations leaving `table_id`.
    fn relations_by_left_table(&self, table_id: &str) -> Vec<Arc<MetaRelation>> {
        self.relations()
            .into_iter()
            .filter(|r| r.lhs_id() == table_id)
            .collect()
    }

    /// Relations arriving at `table_id`.
    fn relations_by_right_table(&self, table_id: &str) -> Vec<Arc<MetaRelation>> {
        self.relations()
            .into_iter()
            .filter(|r| r.rhs_id() == table_id)
            .collect()
    }

    /// First relation from `lhs_id` to `rhs_id`. Direction matters.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the tables are not directly related.
    fn relation_between(&self, lhs_id: &str, rhs_id: &str) -> Result<Arc<MetaRelation>> {
        self.relations()
            .into_iter()
            .find(|r| r.lhs_id() == lhs_id && r.rhs_id() == rhs_id)
            .ok_or_else(|| CubeError::not_found("relation", format!("{lhs_id} -> {rhs_id}")))
    }
}
