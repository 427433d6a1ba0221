//! Table family: base tables and joins.

use crate::error::{check_not_blank, CubeError, Result};
use crate::keyword::{IndexHintKind, IndexHintScope, JoinHint, JoinType};

use super::condition::Condition;
use super::field::{assign_alias, AsteriskExpr, Field, TableFieldExpr, TableName};
use super::visitor::ExpressionVisitor;
use super::Node;

/// `USE INDEX FOR JOIN (idx_a, idx_b)` style annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexHint {
    kind: IndexHintKind,
    scope: Option<IndexHintScope>,
    indexes: Vec<String>,
}

impl IndexHint {
    /// Creates an index hint.
    ///
    /// # Errors
    ///
    /// Returns a contract violation if no index is named or a name is blank.
    pub fn new<I, S>(kind: IndexHintKind, scope: Option<IndexHintScope>, indexes: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let indexes: Vec<String> = indexes.into_iter().map(Into::into).collect();
        if indexes.is_empty() {
            return Err(CubeError::ContractViolation(format!(
                "{} requires at least one index",
                kind.keyword()
            )));
        }
        for index in &indexes {
            check_not_blank(index, "index name")?;
        }
        Ok(IndexHint {
            kind,
            scope,
            indexes,
        })
    }

    #[must_use]
    pub fn kind(&self) -> IndexHintKind {
        self.kind
    }

    #[must_use]
    pub fn scope(&self) -> Option<IndexHintScope> {
        self.scope
    }

    #[must_use]
    pub fn indexes(&self) -> &[String] {
        &self.indexes
    }
}

/// A named table with its columns.
#[derive(Debug, Clone, PartialEq)]
pub struct TableExpr {
    name: String,
    fields: Vec<Field>,
    alias: Option<String>,
    hints: Vec<IndexHint>,
}

impl TableExpr {
    /// Creates a table with the given column names.
    ///
    /// # Errors
    ///
    /// Returns a contract violation if the table or a column name is blank.
    pub fn new<I, S>(name: &str, columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        check_not_blank(name, "table name")?;
        let fields = columns
            .into_iter()
            .map(|c| TableFieldExpr::new(c.as_ref(), TableName::new(name)).map(Field::TableField))
            .collect::<Result<Vec<_>>>()?;
        Ok(TableExpr {
            name: name.to_string(),
            fields,
            alias: None,
            hints: Vec::new(),
        })
    }

    pub(crate) fn with_fields(&self, fields: Vec<Field>) -> Self {
        TableExpr {
            name: self.name.clone(),
            fields,
            alias: self.alias.clone(),
            hints: self.hints.clone(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    #[must_use]
    pub fn hints(&self) -> &[IndexHint] {
        &self.hints
    }

    /// Name and alias used to qualify this table's columns.
    #[must_use]
    pub fn table_name(&self) -> TableName {
        TableName::aliased(&self.name, self.alias.clone())
    }

    /// Sets the alias and requalifies the stored columns with it.
    pub(crate) fn set_alias(&mut self, alias: &str) -> Result<()> {
        assign_alias(&mut self.alias, alias)?;
        for field in &mut self.fields {
            if let Field::TableField(f) = field {
                f.table_mut().set_alias(self.alias.clone());
            }
        }
        Ok(())
    }

    pub fn accept<V: ExpressionVisitor + ?Sized>(&self, visitor: &mut V) -> V::Output {
        visitor.visit_table(self)
    }
}

/// Two tables joined together.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinExpr {
    lhs: Box<Table>,
    rhs: Box<Table>,
    join_type: JoinType,
    hint: Option<JoinHint>,
    condition: Option<Condition>,
    alias: Option<String>,
}

impl JoinExpr {
    #[must_use]
    pub fn new(
        lhs: Table,
        rhs: Table,
        join_type: JoinType,
        hint: Option<JoinHint>,
        condition: Option<Condition>,
    ) -> Self {
        JoinExpr {
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
            join_type,
            hint,
            condition,
            alias: None,
        }
    }

    #[must_use]
    pub fn lhs(&self) -> &Table {
        &self.lhs
    }

    #[must_use]
    pub fn rhs(&self) -> &Table {
        &self.rhs
    }

    #[must_use]
    pub fn join_type(&self) -> JoinType {
        self.join_type
    }

    #[must_use]
    pub fn hint(&self) -> Option<JoinHint> {
        self.hint
    }

    #[must_use]
    pub fn condition(&self) -> Option<&Condition> {
        self.condition.as_ref()
    }

    #[must_use]
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub(super) fn rebuild(&self, lhs: Table, rhs: Table, condition: Option<Condition>) -> Self {
        JoinExpr {
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
            join_type: self.join_type,
            hint: self.hint,
            condition,
            alias: self.alias.clone(),
        }
    }

    pub fn accept<V: ExpressionVisitor + ?Sized>(&self, visitor: &mut V) -> V::Output {
        visitor.visit_join(self)
    }
}

/// A queryable relation.
#[derive(Debug, Clone, PartialEq)]
pub enum Table {
    Base(TableExpr),
    Join(JoinExpr),
}

impl Table {
    /// Creates a base table with the given column names.
    ///
    /// # Errors
    ///
    /// See [`TableExpr::new`].
    pub fn new<I, S>(name: &str, columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        TableExpr::new(name, columns).map(Table::Base)
    }

    /// Returns the table name.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedOperation` for joins, which have no single name.
    pub fn name(&self) -> Result<&str> {
        match self {
            Table::Base(t) => Ok(t.name()),
            Table::Join(_) => Err(CubeError::UnsupportedOperation(
                "a join has no table name".to_string(),
            )),
        }
    }

    #[must_use]
    pub fn alias(&self) -> Option<&str> {
        match self {
            Table::Base(t) => t.alias(),
            Table::Join(j) => j.alias(),
        }
    }

    /// Sets the alias. An alias can be set exactly once.
    ///
    /// # Errors
    ///
    /// Returns a contract violation if the alias is blank or already set.
    pub fn set_alias(&mut self, alias: &str) -> Result<()> {
        match self {
            Table::Base(t) => t.set_alias(alias),
            Table::Join(j) => assign_alias(&mut j.alias, alias),
        }
    }

    /// Consuming form of [`Table::set_alias`].
    ///
    /// # Errors
    ///
    /// See [`Table::set_alias`].
    pub fn with_alias(mut self, alias: &str) -> Result<Self> {
        self.set_alias(alias)?;
        Ok(self)
    }

    /// Number of columns; the sum of both sides for a join.
    #[must_use]
    pub fn field_count(&self) -> usize {
        match self {
            Table::Base(t) => t.fields().len(),
            Table::Join(j) => j.lhs().field_count() + j.rhs().field_count(),
        }
    }

    /// Returns the columns; for a join, the union of both sides.
    #[must_use]
    pub fn fields(&self) -> Vec<Field> {
        match self {
            Table::Base(t) => t.fields().to_vec(),
            Table::Join(j) => {
                let mut fields = j.lhs().fields();
                for field in j.rhs().fields() {
                    if !fields.contains(&field) {
                        fields.push(field);
                    }
                }
                fields
            }
        }
    }

    /// Looks up a column by name, left side first for joins.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no column carries that name.
    pub fn field(&self, name: &str) -> Result<Field> {
        self.find_field(name)
            .cloned()
            .ok_or_else(|| CubeError::not_found("field", name))
    }

    fn find_field(&self, name: &str) -> Option<&Field> {
        match self {
            Table::Base(t) => t.fields().iter().find(|f| f.name() == name),
            Table::Join(j) => j.lhs().find_field(name).or_else(|| j.rhs().find_field(name)),
        }
    }

    /// `table.*`, or a bare `*` for joins.
    #[must_use]
    pub fn asterisk(&self) -> Field {
        match self {
            Table::Base(t) => Field::Asterisk(AsteriskExpr::of(t.table_name())),
            Table::Join(_) => Field::Asterisk(AsteriskExpr::new()),
        }
    }

    /// Base tables in left-to-right join order.
    #[must_use]
    pub fn base_tables(&self) -> Vec<&TableExpr> {
        match self {
            Table::Base(t) => vec![t],
            Table::Join(j) => {
                let mut tables = j.lhs().base_tables();
                tables.extend(j.rhs().base_tables());
                tables
            }
        }
    }

    pub fn accept<V: ExpressionVisitor + ?Sized>(&self, visitor: &mut V) -> V::Output {
        match self {
            Table::Base(t) => t.accept(visitor),
            Table::Join(j) => j.accept(visitor),
        }
    }

    /// Returns the immediate structural children.
    #[must_use]
    pub fn children(&self) -> Vec<Node<'_>> {
        match self {
            Table::Base(t) => t.fields().iter().map(Node::Field).collect(),
            Table::Join(j) => {
                let mut children = vec![Node::Table(j.lhs()), Node::Table(j.rhs())];
                children.extend(j.condition().map(Node::Condition));
                children
            }
        }
    }

    // ==================== Joins ====================

    /// Joins `other` onto this table.
    #[must_use]
    pub fn join(
        self,
        other: Table,
        join_type: JoinType,
        hint: Option<JoinHint>,
        condition: Option<Condition>,
    ) -> Table {
        Table::Join(JoinExpr::new(self, other, join_type, hint, condition))
    }

    #[must_use]
    pub fn inner_join(self, other: Table, on: Condition) -> Table {
        self.join(other, JoinType::InnerJoin, None, Some(on))
    }

    #[must_use]
    pub fn left_join(self, other: Table, on: Condition) -> Table {
        self.join(other, JoinType::LeftJoin, None, Some(on))
    }

    #[must_use]
    pub fn left_outer_join(self, other: Table, on: Condition) -> Table {
        self.join(other, JoinType::LeftOuterJoin, None, Some(on))
    }

    #[must_use]
    pub fn right_join(self, other: Table, on: Condition) -> Table {
        self.join(other, JoinType::RightJoin, None, Some(on))
    }

    #[must_use]
    pub fn right_outer_join(self, other: Table, on: Condition) -> Table {
        self.join(other, JoinType::RightOuterJoin, None, Some(on))
    }

    #[must_use]
    pub fn full_join(self, other: Table, on: Condition) -> Table {
        self.join(other, JoinType::FullJoin, None, Some(on))
    }

    #[must_use]
    pub fn full_outer_join(self, other: Table, on: Condition) -> Table {
        self.join(other, JoinType::FullOuterJoin, None, Some(on))
    }

    // ==================== Index hints ====================

    /// Attaches an index hint.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedOperation` for joins and a contract violation if
    /// no index is named.
    pub fn index_hint<I, S>(
        mut self,
        kind: IndexHintKind,
        scope: Option<IndexHintScope>,
        indexes: I,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        match &mut self {
            Table::Base(t) => t.hints.push(IndexHint::new(kind, scope, indexes)?),
            Table::Join(_) => {
                return Err(CubeError::UnsupportedOperation(
                    "index hints apply to base tables only".to_string(),
                ))
            }
        }
        Ok(self)
    }

    /// `USE INDEX (indexes)`.
    ///
    /// # Errors
    ///
    /// See [`Table::index_hint`].
    pub fn use_index<I, S>(self, indexes: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.index_hint(IndexHintKind::Use, None, indexes)
    }

    /// `IGNORE INDEX (indexes)`.
    ///
    /// # Errors
    ///
    /// See [`Table::index_hint`].
    pub fn ignore_index<I, S>(self, indexes: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.index_hint(IndexHintKind::Ignore, None, indexes)
    }

    /// `FORCE INDEX (indexes)`.
    ///
    /// # Errors
    ///
    /// See [`Table::index_hint`].
    pub fn force_index<I, S>(self, indexes: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.index_hint(IndexHintKind::Force, None, indexes)
    }

    /// `USE INDEX FOR <scope> (indexes)`.
    ///
    /// # Errors
    ///
    /// See [`Table::index_hint`].
    pub fn use_index_for<I, S>(self, scope: IndexHintScope, indexes: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.index_hint(IndexHintKind::Use, Some(scope), indexes)
    }

    /// `IGNORE INDEX FOR <scope> (indexes)`.
    ///
    /// # Errors
    ///
    /// See [`Table::index_hint`].
    pub fn ignore_index_for<I, S>(self, scope: IndexHintScope, indexes: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.index_hint(IndexHintKind::Ignore, Some(scope), indexes)
    }

    /// `FORCE INDEX FOR <scope> (indexes)`.
    ///
    /// # Errors
    ///
    /// See [`Table::index_hint`].
    pub fn force_index_for<I, S>(self, scope: IndexHintScope, indexes: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.index_hint(IndexHintKind::Force, Some(scope), indexes)
    }
}

impl From<TableExpr> for Table {
    fn from(t: TableExpr) -> Self {
        Table::Base(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orders() -> Table {
        Table::new("orders", ["id", "customer_id", "total"]).unwrap()
    }

    fn customers() -> Table {
        Table::new("customers", ["cid", "name"]).unwrap()
    }

    #[test]
    fn test_field_lookup() {
        let t = orders();
        assert_eq!(t.field("total").unwrap().name(), "total");
        assert!(matches!(
            t.field("missing"),
            Err(CubeError::NotFound { kind: "field", .. })
        ));
    }

    #[test]
    fn test_alias_requalifies_fields() {
        let t = orders().with_alias("o").unwrap();
        let id = t.field("id").unwrap();
        assert_eq!(id.table().map(TableName::qualifier), Some("o"));
    }

    #[test]
    fn test_table_alias_single_assignment() {
        let mut t = orders();
        t.set_alias("o").unwrap();
        assert!(t.set_alias("x").is_err());
        assert!(t.set_alias("x").is_err());
        assert_eq!(t.alias(), Some("o"));
    }

    #[test]
    fn test_join_fields_are_union() {
        let on = orders()
            .field("customer_id")
            .unwrap()
            .eq(customers().field("cid").unwrap())
            .unwrap();
        let join = orders().inner_join(customers(), on);
        assert_eq!(join.field_count(), 5);
        assert_eq!(join.fields().len(), 5);
        assert_eq!(join.field("name").unwrap().name(), "name");
        assert!(join.name().is_err());
    }

    #[test]
    fn test_join_rejects_index_hint() {
        let on = orders().field("id").unwrap().is_not_null();
        let join = orders().left_join(customers(), on);
        assert!(matches!(
            join.use_index(["idx"]),
            Err(CubeError::UnsupportedOperation(_))
        ));
    }

    #[test]
    fn test_index_hint_needs_names() {
        let empty: [&str; 0] = [];
        assert!(matches!(
            orders().force_index(empty),
            Err(CubeError::ContractViolation(_))
        ));
        let hinted = orders()
            .use_index_for(IndexHintScope::Join, ["idx_customer"])
            .unwrap();
        match hinted {
            Table::Base(t) => assert_eq!(t.hints().len(), 1),
            Table::Join(_) => unreachable!(),
        }
    }

    #[test]
    fn test_chained_join_base_tables() {
        let items = Table::new("items", ["order_id"]).unwrap();
        let c1 = orders().field("id").unwrap().is_not_null();
        let c2 = items.field("order_id").unwrap().is_not_null();
        let join = orders().inner_join(customers(), c1).inner_join(items, c2);
        let names: Vec<&str> = join.base_tables().iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["orders", "customers", "items"]);
        assert_eq!(join.field_count(), 6);
    }
}
