//! Table, field and relation descriptors.
//!
//! Descriptors are plain serde records until `prepare` binds them to a
//! catalog. Binding happens once; later calls are no-ops even with a
//! different catalog. Accessors that need the binding fail with
//! `InvalidState` until then.

use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::trace;
use uuid::Uuid;

use crate::error::{check_not_blank, CubeError, Result};
use crate::expr::{Field, Table, TableExpr, TableFieldExpr, TableName};

use super::Catalog;

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

#[derive(Debug)]
enum BindState<E> {
    Unbound,
    Bound { catalog: Weak<dyn Catalog>, expr: E },
}

/// Bind state of a descriptor.
#[derive(Debug)]
struct Binding<E> {
    state: RwLock<BindState<E>>,
}

impl<E> Default for Binding<E> {
    fn default() -> Self {
        Binding {
            state: RwLock::new(BindState::Unbound),
        }
    }
}

impl<E: Clone> Binding<E> {
    /// Binds unless already bound. Returns whether this call bound.
    fn bind<C: Catalog + 'static>(&self, catalog: &Arc<C>, expr: E) -> bool {
        let mut state = self.state.write();
        if matches!(*state, BindState::Bound { .. }) {
            return false;
        }
        let shared: Arc<dyn Catalog> = catalog.clone();
        *state = BindState::Bound {
            catalog: Arc::downgrade(&shared),
            expr,
        };
        true
    }

    fn is_bound(&self) -> bool {
        matches!(*self.state.read(), BindState::Bound { .. })
    }

    fn catalog(&self, what: &str) -> Result<Arc<dyn Catalog>> {
        match &*self.state.read() {
            BindState::Unbound => Err(unprepared(what)),
            BindState::Bound { catalog, .. } => catalog.upgrade().ok_or_else(|| {
                CubeError::InvalidState(format!("catalog of {what} has been dropped"))
            }),
        }
    }

    fn expr(&self, what: &str) -> Result<E> {
        match &*self.state.read() {
            BindState::Unbound => Err(unprepared(what)),
            BindState::Bound { expr, .. } => Ok(expr.clone()),
        }
    }

    fn update<R>(&self, what: &str, f: impl FnOnce(&mut E) -> Result<R>) -> Result<R> {
        match &mut *self.state.write() {
            BindState::Unbound => Err(unprepared(what)),
            BindState::Bound { expr, .. } => f(expr),
        }
    }
}

fn unprepared(what: &str) -> CubeError {
    CubeError::InvalidState(format!("{what} has not been prepared"))
}

// ============================================================================
// MetaTable
// ============================================================================

/// Table descriptor.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaTable {
    #[serde(default = "new_id")]
    id: String,
    name: String,
    #[serde(skip)]
    binding: Binding<TableExpr>,
}

impl MetaTable {
    /// Creates a table descriptor with a generated id.
    ///
    /// # Errors
    ///
    /// Returns a contract violation if `name` is blank.
    pub fn new(name: &str) -> Result<Self> {
        Self::with_id(&new_id(), name)
    }

    /// Creates a table descriptor with the given id.
    ///
    /// # Errors
    ///
    /// Returns a contract violation if `id` or `name` is blank.
    pub fn with_id(id: &str, name: &str) -> Result<Self> {
        check_not_blank(id, "table id")?;
        check_not_blank(name, "table name")?;
        Ok(MetaTable {
            id: id.to_string(),
            name: name.to_string(),
            binding: Binding::default(),
        })
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn is_prepared(&self) -> bool {
        self.binding.is_bound()
    }

    /// Binds this descriptor to `catalog`. Returns `false` if it was
    /// already bound, in which case nothing changes.
    ///
    /// # Errors
    ///
    /// Returns a contract violation if the stored name is blank.
    pub fn prepare<C: Catalog + 'static>(&self, catalog: &Arc<C>) -> Result<bool> {
        if self.is_prepared() {
            return Ok(false);
        }
        let expr = TableExpr::new(&self.name, std::iter::empty::<&str>())?;
        let bound = self.binding.bind(catalog, expr);
        if bound {
            trace!(table = %self.name, id = %self.id, "bound table descriptor");
        }
        Ok(bound)
    }

    /// Returns the catalog this descriptor is bound to.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` before preparation or once the catalog is gone.
    pub fn catalog(&self) -> Result<Arc<dyn Catalog>> {
        self.binding.catalog(&self.describe())
    }

    /// Returns the alias of the bound table.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` before preparation.
    pub fn alias(&self) -> Result<Option<String>> {
        self.binding
            .expr(&self.describe())
            .map(|t| t.alias().map(str::to_string))
    }

    /// Aliases the bound table. An alias can be set exactly once.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` before preparation and a contract violation
    /// if an alias is already set.
    pub fn set_alias(&self, alias: &str) -> Result<()> {
        self.binding
            .update(&self.describe(), |table| table.set_alias(alias))
    }

    /// Field descriptors of this table, read from the catalog on each call.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` before preparation.
    pub fn fields(&self) -> Result<Vec<Arc<MetaField>>> {
        Ok(self.catalog()?.fields_by_table(&self.id))
    }

    /// Number of fields the catalog currently lists for this table.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` before preparation.
    pub fn field_count(&self) -> Result<usize> {
        self.fields().map(|fields| fields.len())
    }

    /// Builds the table expression with the current field list.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` before preparation.
    pub fn to_table(&self) -> Result<Table> {
        let expr = self.binding.expr(&self.describe())?;
        let table_name = expr.table_name();
        let fields = self
            .fields()?
            .iter()
            .map(|f| TableFieldExpr::new(f.name(), table_name.clone()).map(Field::TableField))
            .collect::<Result<Vec<_>>>()?;
        Ok(Table::Base(expr.with_fields(fields)))
    }

    /// Looks up a column of the bound table.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` before preparation and `NotFound` for an
    /// unknown column.
    pub fn field(&self, name: &str) -> Result<Field> {
        self.to_table()?.field(name)
    }

    /// `table.*`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` before preparation.
    pub fn asterisk(&self) -> Result<Field> {
        self.to_table().map(|t| t.asterisk())
    }

    fn describe(&self) -> String {
        format!("table '{}'", self.name)
    }
}

// ============================================================================
// MetaField
// ============================================================================

/// Field descriptor, owned by a table through `table_id`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaField {
    #[serde(default = "new_id")]
    id: String,
    name: String,
    table_id: String,
    #[serde(skip)]
    binding: Binding<TableFieldExpr>,
}

impl MetaField {
    /// Creates a field descriptor with a generated id.
    ///
    /// # Errors
    ///
    /// Returns a contract violation if a name or id is blank.
    pub fn new(table_id: &str, name: &str) -> Result<Self> {
        Self::with_id(&new_id(), table_id, name)
    }

    /// Creates a field descriptor with the given id.
    ///
    /// # Errors
    ///
    /// Returns a contract violation if a name or id is blank.
    pub fn with_id(id: &str, table_id: &str, name: &str) -> Result<Self> {
        check_not_blank(id, "field id")?;
        check_not_blank(table_id, "table id")?;
        check_not_blank(name, "field name")?;
        Ok(MetaField {
            id: id.to_string(),
            name: name.to_string(),
            table_id: table_id.to_string(),
            binding: Binding::default(),
        })
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn table_id(&self) -> &str {
        &self.table_id
    }

    #[must_use]
    pub fn is_prepared(&self) -> bool {
        self.binding.is_bound()
    }

    /// Binds this descriptor to `catalog`, resolving its table there.
    /// Returns `false` if it was already bound.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the catalog has no table with `table_id`.
    pub fn prepare<C: Catalog + 'static>(&self, catalog: &Arc<C>) -> Result<bool> {
        if self.is_prepared() {
            return Ok(false);
        }
        let table = catalog.table_by_id(&self.table_id)?;
        let expr = TableFieldExpr::new(&self.name, TableName::new(table.name()))?;
        let bound = self.binding.bind(catalog, expr);
        if bound {
            trace!(field = %self.name, table = %table.name(), id = %self.id, "bound field descriptor");
        }
        Ok(bound)
    }

    /// Returns the catalog this descriptor is bound to.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` before preparation or once the catalog is gone.
    pub fn catalog(&self) -> Result<Arc<dyn Catalog>> {
        self.binding.catalog(&self.describe())
    }

    /// Returns the table descriptor owning this field.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` before preparation and `NotFound` if the
    /// table has left the catalog.
    pub fn table(&self) -> Result<Arc<MetaTable>> {
        self.catalog()?.table_by_id(&self.table_id)
    }

    /// Returns the alias of the bound field.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` before preparation.
    pub fn alias(&self) -> Result<Option<String>> {
        self.binding
            .expr(&self.describe())
            .map(|f| f.alias().map(str::to_string))
    }

    /// Aliases the bound field. An alias can be set exactly once.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` before preparation and a contract violation
    /// if an alias is already set.
    pub fn set_alias(&self, alias: &str) -> Result<()> {
        self.binding.update(&self.describe(), |expr| {
            let mut field = Field::TableField(expr.clone());
            field.set_alias(alias)?;
            if let Field::TableField(aliased) = field {
                *expr = aliased;
            }
            Ok(())
        })
    }

    /// Builds the column expression, qualified with the table's current
    /// alias.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` before preparation.
    pub fn to_field(&self) -> Result<Field> {
        let mut expr = self.binding.expr(&self.describe())?;
        let alias = self.table()?.alias()?;
        expr.table_mut().set_alias(alias);
        Ok(Field::TableField(expr))
    }

    fn describe(&self) -> String {
        format!("field '{}'", self.name)
    }
}

// ============================================================================
// MetaRelation
// ============================================================================

/// Directed relation between two tables.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaRelation {
    #[serde(default = "new_id")]
    id: String,
    #[serde(default)]
    name: String,
    lhs_id: String,
    rhs_id: String,
    #[serde(skip)]
    binding: Binding<()>,
}

impl MetaRelation {
    /// Creates a relation from `lhs_id` to `rhs_id` with a generated id.
    ///
    /// # Errors
    ///
    /// Returns a contract violation if a table id is blank.
    pub fn new(lhs_id: &str, rhs_id: &str) -> Result<Self> {
        Self::with_id(&new_id(), lhs_id, rhs_id)
    }

    /// Creates a relation with the given id.
    ///
    /// # Errors
    ///
    /// Returns a contract violation if an id is blank.
    pub fn with_id(id: &str, lhs_id: &str, rhs_id: &str) -> Result<Self> {
        check_not_blank(id, "relation id")?;
        check_not_blank(lhs_id, "left table id")?;
        check_not_blank(rhs_id, "right table id")?;
        Ok(MetaRelation {
            id: id.to_string(),
            name: String::new(),
            lhs_id: lhs_id.to_string(),
            rhs_id: rhs_id.to_string(),
            binding: Binding::default(),
        })
    }

    /// Names the relation.
    #[must_use]
    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn lhs_id(&self) -> &str {
        &self.lhs_id
    }

    #[must_use]
    pub fn rhs_id(&self) -> &str {
        &self.rhs_id
    }

    /// Returns true if either side is `table_id`.
    #[must_use]
    pub fn touches(&self, table_id: &str) -> bool {
        self.lhs_id == table_id || self.rhs_id == table_id
    }

    #[must_use]
    pub fn is_prepared(&self) -> bool {
        self.binding.is_bound()
    }

    /// Binds this relation to `catalog`. Returns `false` if it was already
    /// bound.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if either table is missing from the catalog.
    pub fn prepare<C: Catalog + 'static>(&self, catalog: &Arc<C>) -> Result<bool> {
        if self.is_prepared() {
            return Ok(false);
        }
        catalog.table_by_id(&self.lhs_id)?;
        catalog.table_by_id(&self.rhs_id)?;
        let bound = self.binding.bind(catalog, ());
        if bound {
            trace!(lhs = %self.lhs_id, rhs = %self.rhs_id, id = %self.id, "bound relation descriptor");
        }
        Ok(bound)
    }

    /// Left-hand table.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` before preparation.
    pub fn lhs(&self) -> Result<Arc<MetaTable>> {
        self.binding
            .catalog(&self.describe())?
            .table_by_id(&self.lhs_id)
    }

    /// Right-hand table.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` before preparation.
    pub fn rhs(&self) -> Result<Arc<MetaTable>> {
        self.binding
            .catalog(&self.describe())?
            .table_by_id(&self.rhs_id)
    }

    fn describe(&self) -> String {
        format!("relation '{}'", self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MetaCatalog;
    use crate::dialect::SqlDialect;

    fn catalog() -> Arc<MetaCatalog> {
        let catalog = MetaCatalog::new(SqlDialect::Postgres);
        catalog.add_table(MetaTable::with_id("t1", "orders").unwrap()).unwrap();
        catalog.add_field(MetaField::with_id("f1", "t1", "id").unwrap()).unwrap();
        Arc::new(catalog)
    }

    #[test]
    fn test_accessors_before_prepare() {
        let table = MetaTable::new("orders").unwrap();
        assert!(matches!(table.alias(), Err(CubeError::InvalidState(_))));
        assert!(matches!(table.to_table(), Err(CubeError::InvalidState(_))));
        assert!(matches!(table.set_alias("o"), Err(CubeError::InvalidState(_))));
        assert!(!table.is_prepared());
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let a = MetaTable::new("a").unwrap();
        let b = MetaTable::new("a").unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_first_binding_wins() {
        let first = catalog();
        let second = Arc::new(MetaCatalog::new(SqlDialect::Oracle));
        let table = MetaTable::with_id("t1", "orders").unwrap();
        assert!(table.prepare(&first).unwrap());
        assert!(!table.prepare(&second).unwrap());
        assert_eq!(table.catalog().unwrap().dialect(), SqlDialect::Postgres);
    }

    #[test]
    fn test_dropped_catalog_is_invalid_state() {
        let table = MetaTable::with_id("t1", "orders").unwrap();
        {
            let catalog = catalog();
            table.prepare(&catalog).unwrap();
        }
        assert!(matches!(table.catalog(), Err(CubeError::InvalidState(_))));
    }

    #[test]
    fn test_field_requires_table() {
        let catalog = catalog();
        let orphan = MetaField::with_id("f9", "missing", "x").unwrap();
        assert!(matches!(
            orphan.prepare(&catalog),
            Err(CubeError::NotFound { kind: "table", .. })
        ));
        assert!(!orphan.is_prepared());
    }

    #[test]
    fn test_field_follows_table_alias() {
        let catalog = catalog();
        catalog.prepare().unwrap();
        let table = catalog.table_by_id("t1").unwrap();
        let field = catalog.field_by_id("f1").unwrap();
        table.set_alias("o").unwrap();
        let expr = field.to_field().unwrap();
        assert_eq!(expr.table().map(TableName::qualifier), Some("o"));
    }

    #[test]
    fn test_json_tolerates_unknown_attributes() {
        let json = r#"{"id":"f1","name":"id","tableId":"t1","comment":"pk"}"#;
        let field: MetaField = serde_json::from_str(json).unwrap();
        assert_eq!(field.table_id(), "t1");
        assert!(!field.is_prepared());
    }
}
