//! Root statements: `SELECT` and `EXPLAIN`.

use std::sync::Arc;

use crate::error::{CubeError, Result};
use crate::keyword::{CombineOperator, NullOrdering, SortOrder};
use crate::render::{self, QueryContext};

use super::condition::Condition;
use super::field::{assign_alias, Field};
use super::table::Table;
use super::visitor::ExpressionVisitor;
use super::Node;

/// A field in an `ORDER BY` clause.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderField {
    field: Field,
    order: Option<SortOrder>,
    nulls: Option<NullOrdering>,
}

impl OrderField {
    #[must_use]
    pub fn new(field: Field, order: Option<SortOrder>) -> Self {
        OrderField {
            field,
            order,
            nulls: None,
        }
    }

    /// Places nulls first or last.
    #[must_use]
    pub fn nulls(mut self, nulls: NullOrdering) -> Self {
        self.nulls = Some(nulls);
        self
    }

    #[must_use]
    pub fn nulls_first(self) -> Self {
        self.nulls(NullOrdering::First)
    }

    #[must_use]
    pub fn nulls_last(self) -> Self {
        self.nulls(NullOrdering::Last)
    }

    #[must_use]
    pub fn field(&self) -> &Field {
        &self.field
    }

    #[must_use]
    pub fn order(&self) -> Option<SortOrder> {
        self.order
    }

    #[must_use]
    pub fn null_ordering(&self) -> Option<NullOrdering> {
        self.nulls
    }

    pub(super) fn with_field(&self, field: Field) -> Self {
        OrderField {
            field,
            order: self.order,
            nulls: self.nulls,
        }
    }
}

impl From<Field> for OrderField {
    fn from(field: Field) -> Self {
        OrderField::new(field, None)
    }
}

/// Row window of a select.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paging {
    pub limit: u64,
    pub skip: u64,
}

/// A `SELECT` statement bound to the query context that created it.
#[derive(Debug, Clone)]
pub struct Select {
    pub(super) context: Arc<QueryContext>,
    pub(super) field: Field,
    pub(super) table: Option<Table>,
    pub(super) where_: Option<Condition>,
    pub(super) having: Option<Condition>,
    pub(super) groups: Vec<Field>,
    pub(super) orders: Vec<OrderField>,
    pub(super) distinct: bool,
    pub(super) paging: Option<Paging>,
    pub(super) combined: Vec<(CombineOperator, Select)>,
    pub(super) alias: Option<String>,
}

impl Select {
    /// Creates a select projecting `field`.
    #[must_use]
    pub fn new(context: Arc<QueryContext>, field: Field) -> Self {
        Select {
            context,
            field,
            table: None,
            where_: None,
            having: None,
            groups: Vec::new(),
            orders: Vec::new(),
            distinct: false,
            paging: None,
            combined: Vec::new(),
            alias: None,
        }
    }

    // ==================== Clauses ====================

    /// Sets the source table. May be called once.
    ///
    /// # Errors
    ///
    /// Returns a contract violation if the source is already set.
    pub fn from(mut self, table: impl Into<Table>) -> Result<Self> {
        if self.table.is_some() {
            return Err(CubeError::ContractViolation(
                "source table already set".to_string(),
            ));
        }
        self.table = Some(table.into());
        Ok(self)
    }

    /// Adds a filter, combined with any earlier one by `AND`.
    #[must_use]
    pub fn where_(mut self, condition: Condition) -> Self {
        self.where_ = Some(match self.where_.take() {
            Some(existing) => existing.and(condition),
            None => condition,
        });
        self
    }

    /// Adds a post-aggregation filter, combined with any earlier one by `AND`.
    #[must_use]
    pub fn having(mut self, condition: Condition) -> Self {
        self.having = Some(match self.having.take() {
            Some(existing) => existing.and(condition),
            None => condition,
        });
        self
    }

    #[must_use]
    pub fn group_by<I>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = Field>,
    {
        self.groups.extend(fields);
        self
    }

    #[must_use]
    pub fn order_by<I, O>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = O>,
        O: Into<OrderField>,
    {
        self.orders.extend(fields.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Returns at most `limit` rows after skipping `skip`.
    #[must_use]
    pub fn offset(mut self, limit: u64, skip: u64) -> Self {
        self.paging = Some(Paging { limit, skip });
        self
    }

    /// One-based page of `size` rows. Pages below one are treated as the
    /// first page; a non-positive size leaves the select unchanged.
    #[must_use]
    pub fn page_by(self, page: i64, size: i64) -> Self {
        if size <= 0 {
            return self;
        }
        let page = page.max(1).unsigned_abs();
        let size = size.unsigned_abs();
        self.offset(size, (page - 1).saturating_mul(size))
    }

    // ==================== Composition ====================

    #[must_use]
    pub fn combine(mut self, operator: CombineOperator, other: Select) -> Self {
        self.combined.push((operator, other));
        self
    }

    #[must_use]
    pub fn union(self, other: Select) -> Self {
        self.combine(CombineOperator::Union, other)
    }

    #[must_use]
    pub fn union_all(self, other: Select) -> Self {
        self.combine(CombineOperator::UnionAll, other)
    }

    #[must_use]
    pub fn except(self, other: Select) -> Self {
        self.combine(CombineOperator::Except, other)
    }

    #[must_use]
    pub fn intersect(self, other: Select) -> Self {
        self.combine(CombineOperator::Intersect, other)
    }

    /// Wraps this select in an `EXPLAIN`.
    #[must_use]
    pub fn explain(self) -> Explain {
        Explain::new(self)
    }

    /// Sets the alias. An alias can be set exactly once. No dialect renders
    /// an aliased select yet, so rendering one fails with
    /// `UnsupportedOperation`.
    ///
    /// # Errors
    ///
    /// Returns a contract violation if the alias is blank or already set.
    pub fn set_alias(&mut self, alias: &str) -> Result<()> {
        assign_alias(&mut self.alias, alias)
    }

    /// Consuming form of [`Select::set_alias`].
    ///
    /// # Errors
    ///
    /// See [`Select::set_alias`].
    pub fn with_alias(mut self, alias: &str) -> Result<Self> {
        self.set_alias(alias)?;
        Ok(self)
    }

    // ==================== Accessors ====================

    #[must_use]
    pub fn context(&self) -> &Arc<QueryContext> {
        &self.context
    }

    #[must_use]
    pub fn field(&self) -> &Field {
        &self.field
    }

    #[must_use]
    pub fn table(&self) -> Option<&Table> {
        self.table.as_ref()
    }

    #[must_use]
    pub fn where_condition(&self) -> Option<&Condition> {
        self.where_.as_ref()
    }

    #[must_use]
    pub fn having_condition(&self) -> Option<&Condition> {
        self.having.as_ref()
    }

    #[must_use]
    pub fn groups(&self) -> &[Field] {
        &self.groups
    }

    #[must_use]
    pub fn orders(&self) -> &[OrderField] {
        &self.orders
    }

    #[must_use]
    pub fn is_distinct(&self) -> bool {
        self.distinct
    }

    #[must_use]
    pub fn paging(&self) -> Option<Paging> {
        self.paging
    }

    #[must_use]
    pub fn combined(&self) -> &[(CombineOperator, Select)] {
        &self.combined
    }

    #[must_use]
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub fn accept<V: ExpressionVisitor + ?Sized>(&self, visitor: &mut V) -> V::Output {
        visitor.visit_select(self)
    }

    /// Returns the immediate structural children.
    #[must_use]
    pub fn children(&self) -> Vec<Node<'_>> {
        let mut children = vec![Node::Field(&self.field)];
        children.extend(self.table.as_ref().map(Node::Table));
        children.extend(self.where_.as_ref().map(Node::Condition));
        children.extend(self.groups.iter().map(Node::Field));
        children.extend(self.having.as_ref().map(Node::Condition));
        children.extend(self.orders.iter().map(|o| Node::Field(o.field())));
        children.extend(self.combined.iter().map(|(_, s)| Node::Select(s)));
        children
    }

    /// Renders this select with the dialect and options of its context.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedOperation` if the tree uses a construct the
    /// dialect cannot express.
    pub fn render(&self) -> Result<String> {
        render::render_node(&self.context, Node::Select(self))
    }
}

impl PartialEq for Select {
    // The context is an environment handle, not part of the tree.
    fn eq(&self, other: &Self) -> bool {
        self.field == other.field
            && self.table == other.table
            && self.where_ == other.where_
            && self.having == other.having
            && self.groups == other.groups
            && self.orders == other.orders
            && self.distinct == other.distinct
            && self.paging == other.paging
            && self.combined == other.combined
            && self.alias == other.alias
    }
}

/// `EXPLAIN <select>`.
#[derive(Debug, Clone, PartialEq)]
pub struct Explain {
    select: Box<Select>,
}

impl Explain {
    #[must_use]
    pub fn new(select: Select) -> Self {
        Explain {
            select: Box::new(select),
        }
    }

    #[must_use]
    pub fn select(&self) -> &Select {
        &self.select
    }

    pub fn accept<V: ExpressionVisitor + ?Sized>(&self, visitor: &mut V) -> V::Output {
        visitor.visit_explain(self)
    }

    #[must_use]
    pub fn children(&self) -> Vec<Node<'_>> {
        vec![Node::Select(&self.select)]
    }

    /// Renders the statement.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedOperation` for dialects without an explain form.
    pub fn render(&self) -> Result<String> {
        render::render_node(self.select.context(), Node::Explain(self))
    }
}
