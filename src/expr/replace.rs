//! Tree rewriting.

use crate::error::Result;

use super::condition::{ComparisonExpr, Condition, LogicalExpr};
use super::field::{
    AggregateExpr, AsteriskExpr, DistinctExpr, Field, MemberExpr, TableFieldExpr, VariableExpr,
};
use super::select::{Explain, Select};
use super::table::{JoinExpr, Table, TableExpr};
use super::visitor::ExpressionVisitor;
use super::{Expression, Node};

/// Result of a rewrite.
#[derive(Debug, Clone, PartialEq)]
pub enum Transformed<T> {
    /// Tree was modified.
    Yes(T),
    /// Tree unchanged.
    No(T),
}

impl<T> Transformed<T> {
    fn new(value: T, changed: bool) -> Self {
        if changed {
            Transformed::Yes(value)
        } else {
            Transformed::No(value)
        }
    }

    /// Returns the inner value.
    pub fn into_inner(self) -> T {
        match self {
            Transformed::Yes(v) | Transformed::No(v) => v,
        }
    }

    /// Returns true if the tree was modified.
    #[must_use]
    pub fn was_transformed(&self) -> bool {
        matches!(self, Transformed::Yes(_))
    }

    fn try_map<U>(self, f: impl FnOnce(T) -> Result<U>) -> Result<Transformed<U>> {
        match self {
            Transformed::Yes(v) => Ok(Transformed::Yes(f(v)?)),
            Transformed::No(v) => Ok(Transformed::No(f(v)?)),
        }
    }
}

/// Rewrites a tree bottom-up through a replacement function.
///
/// The function is offered every node top-down; returning `Some` replaces
/// that node (its subtree is not visited further). Ancestors of a
/// replaced node are rebuilt, everything else is cloned unchanged.
pub struct ReplacingVisitor<F> {
    replace_fn: F,
}

impl<F> ReplacingVisitor<F>
where
    F: FnMut(Node<'_>) -> Option<Expression>,
{
    pub fn new(replace_fn: F) -> Self {
        ReplacingVisitor { replace_fn }
    }

    /// Rewrites the subtree rooted at `node`.
    ///
    /// # Errors
    ///
    /// Returns a contract violation if a replacement lands in a slot of a
    /// different family.
    pub fn rewrite(&mut self, node: Node<'_>) -> Result<Transformed<Expression>> {
        match (self.replace_fn)(node) {
            Some(replacement) => Ok(Transformed::Yes(replacement)),
            None => node.accept(self),
        }
    }

    fn rewrite_field(&mut self, field: &Field) -> Result<Transformed<Field>> {
        self.rewrite(Node::Field(field))?.try_map(Field::try_from)
    }

    fn rewrite_condition(&mut self, condition: &Condition) -> Result<Transformed<Condition>> {
        self.rewrite(Node::Condition(condition))?
            .try_map(Condition::try_from)
    }

    fn rewrite_table(&mut self, table: &Table) -> Result<Transformed<Table>> {
        self.rewrite(Node::Table(table))?.try_map(Table::try_from)
    }

    fn rewrite_select(&mut self, select: &Select) -> Result<Transformed<Select>> {
        self.rewrite(Node::Select(select))?.try_map(Select::try_from)
    }

    fn rewrite_fields(&mut self, fields: &[Field]) -> Result<Transformed<Vec<Field>>> {
        let mut changed = false;
        let mut rewritten = Vec::with_capacity(fields.len());
        for field in fields {
            let t = self.rewrite_field(field)?;
            changed |= t.was_transformed();
            rewritten.push(t.into_inner());
        }
        Ok(Transformed::new(rewritten, changed))
    }

    fn rewrite_optional_condition(
        &mut self,
        condition: Option<&Condition>,
    ) -> Result<Transformed<Option<Condition>>> {
        match condition {
            Some(c) => self.rewrite_condition(c)?.try_map(|c| Ok(Some(c))),
            None => Ok(Transformed::No(None)),
        }
    }
}

fn unchanged(expr: impl Into<Expression>) -> Result<Transformed<Expression>> {
    Ok(Transformed::No(expr.into()))
}

impl<F> ExpressionVisitor for ReplacingVisitor<F>
where
    F: FnMut(Node<'_>) -> Option<Expression>,
{
    type Output = Result<Transformed<Expression>>;

    fn visit_explain(&mut self, explain: &Explain) -> Self::Output {
        let select = self.rewrite_select(explain.select())?;
        if !select.was_transformed() {
            return unchanged(explain.clone());
        }
        Ok(Transformed::Yes(Explain::new(select.into_inner()).into()))
    }

    fn visit_select(&mut self, select: &Select) -> Self::Output {
        let field = self.rewrite_field(&select.field)?;
        let table = match &select.table {
            Some(t) => self.rewrite_table(t)?.try_map(|t| Ok(Some(t)))?,
            None => Transformed::No(None),
        };
        let where_ = self.rewrite_optional_condition(select.where_.as_ref())?;
        let groups = self.rewrite_fields(&select.groups)?;
        let having = self.rewrite_optional_condition(select.having.as_ref())?;

        let mut changed = field.was_transformed()
            || table.was_transformed()
            || where_.was_transformed()
            || groups.was_transformed()
            || having.was_transformed();

        let mut orders = Vec::with_capacity(select.orders.len());
        for order in &select.orders {
            let f = self.rewrite_field(order.field())?;
            changed |= f.was_transformed();
            orders.push(order.with_field(f.into_inner()));
        }
        let mut combined = Vec::with_capacity(select.combined.len());
        for (operator, other) in &select.combined {
            let s = self.rewrite_select(other)?;
            changed |= s.was_transformed();
            combined.push((*operator, s.into_inner()));
        }

        if !changed {
            return unchanged(select.clone());
        }
        let rebuilt = Select {
            context: select.context.clone(),
            field: field.into_inner(),
            table: table.into_inner(),
            where_: where_.into_inner(),
            having: having.into_inner(),
            groups: groups.into_inner(),
            orders,
            distinct: select.distinct,
            paging: select.paging,
            combined,
            alias: select.alias.clone(),
        };
        Ok(Transformed::Yes(rebuilt.into()))
    }

    fn visit_distinct(&mut self, distinct: &DistinctExpr) -> Self::Output {
        let inner = self.rewrite_field(distinct.field())?;
        if !inner.was_transformed() {
            return unchanged(Field::Distinct(distinct.clone()));
        }
        let rebuilt = distinct.with_field(inner.into_inner());
        Ok(Transformed::Yes(Field::Distinct(rebuilt).into()))
    }

    fn visit_asterisk(&mut self, asterisk: &AsteriskExpr) -> Self::Output {
        unchanged(Field::Asterisk(asterisk.clone()))
    }

    fn visit_member(&mut self, member: &MemberExpr) -> Self::Output {
        let fields = self.rewrite_fields(member.fields())?;
        if !fields.was_transformed() {
            return unchanged(Field::Member(member.clone()));
        }
        let rebuilt = MemberExpr::new(fields.into_inner())?;
        Ok(Transformed::Yes(Field::Member(rebuilt).into()))
    }

    fn visit_table_field(&mut self, field: &TableFieldExpr) -> Self::Output {
        unchanged(Field::TableField(field.clone()))
    }

    fn visit_table(&mut self, table: &TableExpr) -> Self::Output {
        let fields = self.rewrite_fields(table.fields())?;
        if !fields.was_transformed() {
            return unchanged(Table::Base(table.clone()));
        }
        let rebuilt = table.with_fields(fields.into_inner());
        Ok(Transformed::Yes(Table::Base(rebuilt).into()))
    }

    fn visit_join(&mut self, join: &JoinExpr) -> Self::Output {
        let lhs = self.rewrite_table(join.lhs())?;
        let rhs = self.rewrite_table(join.rhs())?;
        let condition = self.rewrite_optional_condition(join.condition())?;
        if !(lhs.was_transformed() || rhs.was_transformed() || condition.was_transformed()) {
            return unchanged(Table::Join(join.clone()));
        }
        let rebuilt = join.rebuild(lhs.into_inner(), rhs.into_inner(), condition.into_inner());
        Ok(Transformed::Yes(Table::Join(rebuilt).into()))
    }

    fn visit_comparison(&mut self, comparison: &ComparisonExpr) -> Self::Output {
        let lhs = self.rewrite(comparison.lhs().node())?;
        let rhs = match comparison.rhs() {
            Some(r) => Some(self.rewrite(r.node())?),
            None => None,
        };
        let rhs_changed = rhs.as_ref().is_some_and(Transformed::was_transformed);
        if !(lhs.was_transformed() || rhs_changed) {
            return unchanged(Condition::Comparison(comparison.clone()));
        }
        let rebuilt = ComparisonExpr::new(
            lhs.into_inner(),
            rhs.map(Transformed::into_inner),
            comparison.operator(),
        )?;
        Ok(Transformed::Yes(Condition::Comparison(rebuilt).into()))
    }

    fn visit_logical(&mut self, logical: &LogicalExpr) -> Self::Output {
        let lhs = self.rewrite_condition(logical.lhs())?;
        let rhs = self.rewrite_condition(logical.rhs())?;
        if !(lhs.was_transformed() || rhs.was_transformed()) {
            return unchanged(Condition::Logical(logical.clone()));
        }
        let rebuilt = LogicalExpr::new(lhs.into_inner(), rhs.into_inner(), logical.operator());
        Ok(Transformed::Yes(Condition::Logical(rebuilt).into()))
    }

    fn visit_variable(&mut self, variable: &VariableExpr) -> Self::Output {
        unchanged(Field::Variable(variable.clone()))
    }

    fn visit_aggregate(&mut self, aggregate: &AggregateExpr) -> Self::Output {
        let arguments = self.rewrite_fields(aggregate.arguments())?;
        if !arguments.was_transformed() {
            return unchanged(Field::Aggregate(aggregate.clone()));
        }
        let rebuilt = aggregate.with_arguments(arguments.into_inner());
        Ok(Transformed::Yes(Field::Aggregate(rebuilt).into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CubeError;
    use crate::expr::TableName;

    fn column(name: &str) -> Field {
        TableFieldExpr::new(name, TableName::new("t")).unwrap().into()
    }

    fn swap_literal(node: Node<'_>) -> Option<Expression> {
        match node {
            Node::Field(Field::Variable(v)) if v.value().as_int64() == Some(5) => {
                Some(Field::int(7).into())
            }
            _ => None,
        }
    }

    #[test]
    fn test_replaces_nested_literal() {
        let cond = column("a").eq(5).unwrap().and(column("b").eq(6).unwrap());
        let expr = Expression::Condition(cond);
        let replaced = expr.replace(swap_literal).unwrap();
        let expected = column("a").eq(7).unwrap().and(column("b").eq(6).unwrap());
        assert_eq!(replaced, Expression::Condition(expected));
    }

    #[test]
    fn test_untouched_tree_reports_no_change() {
        let expr = Expression::Condition(column("a").eq(1).unwrap());
        let mut visitor = ReplacingVisitor::new(swap_literal);
        let result = visitor.rewrite(expr.node()).unwrap();
        assert!(!result.was_transformed());
        assert_eq!(result.into_inner(), expr);
    }

    #[test]
    fn test_family_mismatch_rejected() {
        let expr = Expression::Condition(column("a").eq(5).unwrap());
        let err = expr
            .replace(|node| match node {
                Node::Field(Field::Variable(_)) => Some(column("x").is_null().into()),
                _ => None,
            })
            .unwrap_err();
        assert!(matches!(err, CubeError::ContractViolation(_)));
    }

    #[test]
    fn test_root_replacement() {
        let expr = Expression::Field(column("a"));
        let replaced = expr
            .replace(|node| node.as_field().map(|_| column("b").into()))
            .unwrap();
        assert_eq!(replaced, Expression::Field(column("b")));
    }
}
