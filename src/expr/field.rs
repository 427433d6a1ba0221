//! Field family: values that produce a single projected column.

use crate::error::{check_not_blank, CubeError, Result};
use crate::keyword::{Aggregate, Comparator, NullOrdering, SortOrder};
use crate::types::Value;

use super::condition::{ComparisonExpr, Condition};
use super::select::{OrderField, Select};
use super::visitor::ExpressionVisitor;
use super::{Expression, Node, Operand};

/// Sets `slot` to `alias` unless it already holds one.
pub(super) fn assign_alias(slot: &mut Option<String>, alias: &str) -> Result<()> {
    check_not_blank(alias, "alias")?;
    if let Some(existing) = slot {
        return Err(CubeError::ContractViolation(format!(
            "alias already set to '{existing}'"
        )));
    }
    *slot = Some(alias.to_string());
    Ok(())
}

/// Name and alias of the table a column belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableName {
    name: String,
    alias: Option<String>,
}

impl TableName {
    /// Creates an unaliased table name.
    pub fn new(name: impl Into<String>) -> Self {
        TableName {
            name: name.into(),
            alias: None,
        }
    }

    pub(crate) fn aliased(name: impl Into<String>, alias: Option<String>) -> Self {
        TableName {
            name: name.into(),
            alias,
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

    /// Returns the name columns are qualified with: the alias if set.
    #[must_use]
    pub fn qualifier(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    pub(crate) fn set_alias(&mut self, alias: Option<String>) {
        self.alias = alias;
    }
}

/// A column of a table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableFieldExpr {
    name: String,
    table: TableName,
    alias: Option<String>,
}

impl TableFieldExpr {
    /// Creates a column reference.
    ///
    /// # Errors
    ///
    /// Returns a contract violation if the column or table name is blank.
    pub fn new(name: &str, table: TableName) -> Result<Self> {
        check_not_blank(name, "field name")?;
        check_not_blank(table.name(), "table name")?;
        Ok(TableFieldExpr {
            name: name.to_string(),
            table,
            alias: None,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn table(&self) -> &TableName {
        &self.table
    }

    #[must_use]
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub(crate) fn table_mut(&mut self) -> &mut TableName {
        &mut self.table
    }

    pub fn accept<V: ExpressionVisitor + ?Sized>(&self, visitor: &mut V) -> V::Output {
        visitor.visit_table_field(self)
    }
}

/// A literal value.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableExpr {
    value: Value,
    alias: Option<String>,
}

impl VariableExpr {
    /// Wraps a native value as a literal.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedLiteral` for value kinds that have no literal
    /// encoding. Only 64-bit integers are accepted.
    pub fn new(value: Value) -> Result<Self> {
        match value.data_type() {
            Some(dt) if dt.is_literal() => Ok(VariableExpr { value, alias: None }),
            _ => Err(CubeError::UnsupportedLiteral(value.kind_name().to_string())),
        }
    }

    /// Integer literal; never fails.
    #[must_use]
    pub fn int(value: i64) -> Self {
        VariableExpr {
            value: Value::Int64(value),
            alias: None,
        }
    }

    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }

    #[must_use]
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub fn accept<V: ExpressionVisitor + ?Sized>(&self, visitor: &mut V) -> V::Output {
        visitor.visit_variable(self)
    }
}

/// A comma separated list of fields.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberExpr {
    fields: Vec<Field>,
}

impl MemberExpr {
    /// Creates a member list.
    ///
    /// # Errors
    ///
    /// Returns a contract violation if `fields` is empty.
    pub fn new(fields: Vec<Field>) -> Result<Self> {
        if fields.is_empty() {
            return Err(CubeError::ContractViolation(
                "member list cannot be empty".to_string(),
            ));
        }
        Ok(MemberExpr { fields })
    }

    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn accept<V: ExpressionVisitor + ?Sized>(&self, visitor: &mut V) -> V::Output {
        visitor.visit_member(self)
    }
}

/// `*` or `table.*`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AsteriskExpr {
    table: Option<TableName>,
}

impl AsteriskExpr {
    /// Unqualified `*`.
    #[must_use]
    pub fn new() -> Self {
        AsteriskExpr { table: None }
    }

    /// `table.*`.
    #[must_use]
    pub fn of(table: TableName) -> Self {
        AsteriskExpr { table: Some(table) }
    }

    #[must_use]
    pub fn table(&self) -> Option<&TableName> {
        self.table.as_ref()
    }

    pub fn accept<V: ExpressionVisitor + ?Sized>(&self, visitor: &mut V) -> V::Output {
        visitor.visit_asterisk(self)
    }
}

/// `DISTINCT field`.
#[derive(Debug, Clone, PartialEq)]
pub struct DistinctExpr {
    field: Box<Field>,
    alias: Option<String>,
}

impl DistinctExpr {
    #[must_use]
    pub fn new(field: Field) -> Self {
        DistinctExpr {
            field: Box::new(field),
            alias: None,
        }
    }

    #[must_use]
    pub fn field(&self) -> &Field {
        &self.field
    }

    #[must_use]
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub fn accept<V: ExpressionVisitor + ?Sized>(&self, visitor: &mut V) -> V::Output {
        visitor.visit_distinct(self)
    }

    pub(super) fn with_field(&self, field: Field) -> Self {
        DistinctExpr {
            field: Box::new(field),
            alias: self.alias.clone(),
        }
    }
}

/// Aggregate function call such as `COUNT(DISTINCT orders.id)`.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateExpr {
    function: Aggregate,
    arguments: Vec<Field>,
    distinct: bool,
    alias: Option<String>,
}

impl AggregateExpr {
    /// Creates an aggregate call.
    ///
    /// # Errors
    ///
    /// Returns a contract violation if no argument is given.
    pub fn new(function: Aggregate, arguments: Vec<Field>) -> Result<Self> {
        if arguments.is_empty() {
            return Err(CubeError::ContractViolation(format!(
                "{} requires an argument",
                function.keyword()
            )));
        }
        Ok(AggregateExpr {
            function,
            arguments,
            distinct: false,
            alias: None,
        })
    }

    /// Applies the aggregate to distinct values only.
    #[must_use]
    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Attaches an alias.
    ///
    /// # Errors
    ///
    /// Returns a contract violation if an alias is already set.
    pub fn with_alias(mut self, alias: &str) -> Result<Self> {
        assign_alias(&mut self.alias, alias)?;
        Ok(self)
    }

    #[must_use]
    pub fn function(&self) -> Aggregate {
        self.function
    }

    #[must_use]
    pub fn arguments(&self) -> &[Field] {
        &self.arguments
    }

    #[must_use]
    pub fn is_distinct(&self) -> bool {
        self.distinct
    }

    #[must_use]
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub fn accept<V: ExpressionVisitor + ?Sized>(&self, visitor: &mut V) -> V::Output {
        visitor.visit_aggregate(self)
    }

    pub(super) fn with_arguments(&self, arguments: Vec<Field>) -> Self {
        AggregateExpr {
            function: self.function,
            arguments,
            distinct: self.distinct,
            alias: self.alias.clone(),
        }
    }
}

/// A column-like expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    TableField(TableFieldExpr),
    Variable(VariableExpr),
    Member(MemberExpr),
    Asterisk(AsteriskExpr),
    Distinct(DistinctExpr),
    Aggregate(AggregateExpr),
}

impl Field {
    /// Integer literal.
    #[must_use]
    pub fn int(value: i64) -> Self {
        Field::Variable(VariableExpr::int(value))
    }

    /// Returns the column name; empty for computed fields.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Field::TableField(f) => f.name(),
            Field::Asterisk(_) => "*",
            Field::Distinct(d) => d.field().name(),
            Field::Variable(_) | Field::Member(_) | Field::Aggregate(_) => "",
        }
    }

    #[must_use]
    pub fn alias(&self) -> Option<&str> {
        match self {
            Field::TableField(f) => f.alias(),
            Field::Variable(v) => v.alias(),
            Field::Distinct(d) => d.alias(),
            Field::Aggregate(a) => a.alias(),
            Field::Member(_) | Field::Asterisk(_) => None,
        }
    }

    /// Sets the alias. An alias can be set exactly once.
    ///
    /// # Errors
    ///
    /// Returns a contract violation if the alias is blank, already set, or
    /// the field is a member list or asterisk.
    pub fn set_alias(&mut self, alias: &str) -> Result<()> {
        let slot = match self {
            Field::TableField(f) => &mut f.alias,
            Field::Variable(v) => &mut v.alias,
            Field::Distinct(d) => &mut d.alias,
            Field::Aggregate(a) => &mut a.alias,
            Field::Member(_) | Field::Asterisk(_) => {
                return Err(CubeError::ContractViolation(format!(
                    "{} cannot be aliased",
                    self.kind()
                )))
            }
        };
        assign_alias(slot, alias)
    }

    /// Consuming form of [`Field::set_alias`].
    ///
    /// # Errors
    ///
    /// See [`Field::set_alias`].
    pub fn with_alias(mut self, alias: &str) -> Result<Self> {
        self.set_alias(alias)?;
        Ok(self)
    }

    /// Returns the table this field is a column of, if any.
    #[must_use]
    pub fn table(&self) -> Option<&TableName> {
        match self {
            Field::TableField(f) => Some(f.table()),
            Field::Asterisk(a) => a.table(),
            Field::Distinct(d) => d.field().table(),
            _ => None,
        }
    }

    /// Returns the concrete node kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Field::TableField(_) => "table field",
            Field::Variable(_) => "variable",
            Field::Member(_) => "member list",
            Field::Asterisk(_) => "asterisk",
            Field::Distinct(_) => "distinct",
            Field::Aggregate(_) => "aggregate",
        }
    }

    pub fn accept<V: ExpressionVisitor + ?Sized>(&self, visitor: &mut V) -> V::Output {
        match self {
            Field::TableField(f) => f.accept(visitor),
            Field::Variable(v) => v.accept(visitor),
            Field::Member(m) => m.accept(visitor),
            Field::Asterisk(a) => a.accept(visitor),
            Field::Distinct(d) => d.accept(visitor),
            Field::Aggregate(a) => a.accept(visitor),
        }
    }

    /// Returns the immediate structural children.
    #[must_use]
    pub fn children(&self) -> Vec<Node<'_>> {
        match self {
            Field::TableField(_) | Field::Variable(_) | Field::Asterisk(_) => Vec::new(),
            Field::Member(m) => m.fields().iter().map(Node::Field).collect(),
            Field::Distinct(d) => vec![Node::Field(d.field())],
            Field::Aggregate(a) => a.arguments().iter().map(Node::Field).collect(),
        }
    }

    // ==================== Comparisons ====================

    fn compare(&self, operator: Comparator, rhs: Option<Expression>) -> Result<Condition> {
        ComparisonExpr::new(Expression::Field(self.clone()), rhs, operator)
            .map(Condition::Comparison)
    }

    fn compare_operand(&self, operator: Comparator, rhs: impl Into<Operand>) -> Result<Condition> {
        let rhs = rhs.into().into_expression()?;
        self.compare(operator, Some(rhs))
    }

    fn compare_list<I, T>(&self, operator: Comparator, values: I) -> Result<Condition>
    where
        I: IntoIterator<Item = T>,
        T: Into<Operand>,
    {
        let fields = values
            .into_iter()
            .map(|v| v.into().into_field())
            .collect::<Result<Vec<_>>>()?;
        let member = MemberExpr::new(fields)?;
        self.compare(operator, Some(Expression::Field(Field::Member(member))))
    }

    fn compare_range(
        &self,
        operator: Comparator,
        low: impl Into<Operand>,
        high: impl Into<Operand>,
    ) -> Result<Condition> {
        let member = MemberExpr::new(vec![low.into().into_field()?, high.into().into_field()?])?;
        self.compare(operator, Some(Expression::Field(Field::Member(member))))
    }

    /// `self = rhs`.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedLiteral` if `rhs` is a raw value that cannot be
    /// wrapped.
    pub fn eq(&self, rhs: impl Into<Operand>) -> Result<Condition> {
        self.compare_operand(Comparator::Eq, rhs)
    }

    /// `self <> rhs`.
    ///
    /// # Errors
    ///
    /// See [`Field::eq`].
    pub fn ne(&self, rhs: impl Into<Operand>) -> Result<Condition> {
        self.compare_operand(Comparator::Ne, rhs)
    }

    /// `self < rhs`.
    ///
    /// # Errors
    ///
    /// See [`Field::eq`].
    pub fn lt(&self, rhs: impl Into<Operand>) -> Result<Condition> {
        self.compare_operand(Comparator::Lt, rhs)
    }

    /// `self > rhs`.
    ///
    /// # Errors
    ///
    /// See [`Field::eq`].
    pub fn gt(&self, rhs: impl Into<Operand>) -> Result<Condition> {
        self.compare_operand(Comparator::Gt, rhs)
    }

    /// `self <= rhs`.
    ///
    /// # Errors
    ///
    /// See [`Field::eq`].
    pub fn le(&self, rhs: impl Into<Operand>) -> Result<Condition> {
        self.compare_operand(Comparator::Le, rhs)
    }

    /// `self >= rhs`.
    ///
    /// # Errors
    ///
    /// See [`Field::eq`].
    pub fn ge(&self, rhs: impl Into<Operand>) -> Result<Condition> {
        self.compare_operand(Comparator::Ge, rhs)
    }

    /// `self IN (values...)`.
    ///
    /// # Errors
    ///
    /// Returns a contract violation for an empty list and
    /// `UnsupportedLiteral` for unwrappable values.
    pub fn in_list<I, T>(&self, values: I) -> Result<Condition>
    where
        I: IntoIterator<Item = T>,
        T: Into<Operand>,
    {
        self.compare_list(Comparator::In, values)
    }

    /// `self NOT IN (values...)`.
    ///
    /// # Errors
    ///
    /// See [`Field::in_list`].
    pub fn not_in_list<I, T>(&self, values: I) -> Result<Condition>
    where
        I: IntoIterator<Item = T>,
        T: Into<Operand>,
    {
        self.compare_list(Comparator::NotIn, values)
    }

    /// `self IN (subquery)`.
    ///
    /// # Errors
    ///
    /// Never fails for a well-formed select; kept fallible for symmetry.
    pub fn in_select(&self, select: Select) -> Result<Condition> {
        self.compare(Comparator::In, Some(Expression::Select(Box::new(select))))
    }

    /// `self NOT IN (subquery)`.
    ///
    /// # Errors
    ///
    /// See [`Field::in_select`].
    pub fn not_in_select(&self, select: Select) -> Result<Condition> {
        self.compare(Comparator::NotIn, Some(Expression::Select(Box::new(select))))
    }

    /// `self BETWEEN low AND high`.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedLiteral` for unwrappable bounds.
    pub fn between(&self, low: impl Into<Operand>, high: impl Into<Operand>) -> Result<Condition> {
        self.compare_range(Comparator::Between, low, high)
    }

    /// `self NOT BETWEEN low AND high`.
    ///
    /// # Errors
    ///
    /// See [`Field::between`].
    pub fn not_between(
        &self,
        low: impl Into<Operand>,
        high: impl Into<Operand>,
    ) -> Result<Condition> {
        self.compare_range(Comparator::NotBetween, low, high)
    }

    /// `self LIKE pattern`.
    ///
    /// # Errors
    ///
    /// See [`Field::eq`].
    pub fn like(&self, pattern: impl Into<Operand>) -> Result<Condition> {
        self.compare_operand(Comparator::Like, pattern)
    }

    /// `self NOT LIKE pattern`.
    ///
    /// # Errors
    ///
    /// See [`Field::eq`].
    pub fn not_like(&self, pattern: impl Into<Operand>) -> Result<Condition> {
        self.compare_operand(Comparator::NotLike, pattern)
    }

    /// Case-insensitive `LIKE`.
    ///
    /// # Errors
    ///
    /// See [`Field::eq`].
    pub fn ilike(&self, pattern: impl Into<Operand>) -> Result<Condition> {
        self.compare_operand(Comparator::LikeIgnoreCase, pattern)
    }

    /// Case-insensitive `NOT LIKE`.
    ///
    /// # Errors
    ///
    /// See [`Field::eq`].
    pub fn not_ilike(&self, pattern: impl Into<Operand>) -> Result<Condition> {
        self.compare_operand(Comparator::NotLikeIgnoreCase, pattern)
    }

    /// `self IS NULL`.
    #[must_use]
    pub fn is_null(&self) -> Condition {
        Condition::Comparison(ComparisonExpr::unary(
            Expression::Field(self.clone()),
            Comparator::IsNull,
        ))
    }

    /// `self IS NOT NULL`.
    #[must_use]
    pub fn is_not_null(&self) -> Condition {
        Condition::Comparison(ComparisonExpr::unary(
            Expression::Field(self.clone()),
            Comparator::IsNotNull,
        ))
    }

    // ==================== Aggregates ====================

    fn aggregate(&self, function: Aggregate) -> AggregateExpr {
        AggregateExpr {
            function,
            arguments: vec![self.clone()],
            distinct: false,
            alias: None,
        }
    }

    #[must_use]
    pub fn count(&self) -> AggregateExpr {
        self.aggregate(Aggregate::Count)
    }

    #[must_use]
    pub fn max(&self) -> AggregateExpr {
        self.aggregate(Aggregate::Max)
    }

    #[must_use]
    pub fn min(&self) -> AggregateExpr {
        self.aggregate(Aggregate::Min)
    }

    #[must_use]
    pub fn sum(&self) -> AggregateExpr {
        self.aggregate(Aggregate::Sum)
    }

    #[must_use]
    pub fn avg(&self) -> AggregateExpr {
        self.aggregate(Aggregate::Avg)
    }

    #[must_use]
    pub fn round(&self) -> AggregateExpr {
        self.aggregate(Aggregate::Round)
    }

    /// `ROUND(self, places)`.
    #[must_use]
    pub fn round_to(&self, places: i64) -> AggregateExpr {
        let mut round = self.aggregate(Aggregate::Round);
        round.arguments.push(Field::int(places));
        round
    }

    #[must_use]
    pub fn median(&self) -> AggregateExpr {
        self.aggregate(Aggregate::Median)
    }

    /// `DISTINCT self`.
    #[must_use]
    pub fn distinct(&self) -> Field {
        Field::Distinct(DistinctExpr::new(self.clone()))
    }

    // ==================== Ordering ====================

    #[must_use]
    pub fn asc(&self) -> OrderField {
        OrderField::new(self.clone(), Some(SortOrder::Asc))
    }

    #[must_use]
    pub fn desc(&self) -> OrderField {
        OrderField::new(self.clone(), Some(SortOrder::Desc))
    }

    /// Ordering with explicit null placement.
    #[must_use]
    pub fn order(&self, order: SortOrder, nulls: NullOrdering) -> OrderField {
        OrderField::new(self.clone(), Some(order)).nulls(nulls)
    }
}

impl From<TableFieldExpr> for Field {
    fn from(f: TableFieldExpr) -> Self {
        Field::TableField(f)
    }
}

impl From<VariableExpr> for Field {
    fn from(v: VariableExpr) -> Self {
        Field::Variable(v)
    }
}

impl From<AggregateExpr> for Field {
    fn from(a: AggregateExpr) -> Self {
        Field::Aggregate(a)
    }
}

impl From<AsteriskExpr> for Field {
    fn from(a: AsteriskExpr) -> Self {
        Field::Asterisk(a)
    }
}
