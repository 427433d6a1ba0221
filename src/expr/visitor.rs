//! Double-dispatch visitor over concrete node types.

use super::condition::{ComparisonExpr, LogicalExpr};
use super::field::{AggregateExpr, AsteriskExpr, DistinctExpr, MemberExpr, TableFieldExpr, VariableExpr};
use super::select::{Explain, Select};
use super::table::{JoinExpr, TableExpr};

/// A behavior over expression trees, one method per concrete node type.
///
/// Nodes call back into the visitor from their `accept` method, so adding a
/// renderer or a rewriter never touches the node definitions. Traversal into
/// children is up to each method.
pub trait ExpressionVisitor {
    type Output;

    fn visit_explain(&mut self, explain: &Explain) -> Self::Output;

    fn visit_select(&mut self, select: &Select) -> Self::Output;

    fn visit_distinct(&mut self, distinct: &DistinctExpr) -> Self::Output;

    fn visit_asterisk(&mut self, asterisk: &AsteriskExpr) -> Self::Output;

    fn visit_member(&mut self, member: &MemberExpr) -> Self::Output;

    fn visit_table_field(&mut self, field: &TableFieldExpr) -> Self::Output;

    fn visit_table(&mut self, table: &TableExpr) -> Self::Output;

    fn visit_join(&mut self, join: &JoinExpr) -> Self::Output;

    fn visit_comparison(&mut self, comparison: &ComparisonExpr) -> Self::Output;

    fn visit_logical(&mut self, logical: &LogicalExpr) -> Self::Output;

    fn visit_variable(&mut self, variable: &VariableExpr) -> Self::Output;

    fn visit_aggregate(&mut self, aggregate: &AggregateExpr) -> Self::Output;
}
