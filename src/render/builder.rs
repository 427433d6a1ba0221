//! Dialect-aware SQL builder.

use crate::error::{CubeError, Result};
use crate::expr::{
    AggregateExpr, AsteriskExpr, ComparisonExpr, Condition, DistinctExpr, Explain, Expression,
    ExpressionVisitor, Field, JoinExpr, LogicalExpr, MemberExpr, OrderField, Paging, Select,
    Table, TableExpr, TableFieldExpr, VariableExpr,
};
use crate::keyword::{Aggregate, CombineOperator, Comparator, Keyword, Operator};
use crate::types::Value;

use super::context::RenderContext;
use super::rules::PagingStyle;

/// Visitor that writes SQL text into a [`RenderContext`].
///
/// Dialect differences come from the context's [`DialectRules`]; the
/// builder itself holds nothing but the context it writes to.
///
/// [`DialectRules`]: super::DialectRules
pub struct SqlBuilder<'c, 'p> {
    ctx: &'c mut RenderContext<'p>,
}

impl<'c, 'p> SqlBuilder<'c, 'p> {
    pub fn new(ctx: &'c mut RenderContext<'p>) -> Self {
        SqlBuilder { ctx }
    }

    #[must_use]
    pub fn context(&self) -> &RenderContext<'p> {
        self.ctx
    }

    fn keyword(&mut self, keyword: &'static str) {
        self.ctx.write_keyword(&Keyword::fixed(keyword));
    }

    fn keyword_text(&self, keyword: &'static str) -> String {
        Keyword::fixed(keyword).render(self.ctx.options().keyword_case)
    }

    fn comma(&mut self) {
        self.ctx.write_raw(",");
    }

    /// Renders a group in a linked sub-context and returns its text.
    fn nested<F>(&self, render: F) -> Result<String>
    where
        F: FnOnce(&mut SqlBuilder<'_, '_>) -> Result<()>,
    {
        let mut sub = self.ctx.sub_context();
        render(&mut SqlBuilder::new(&mut sub))?;
        Ok(sub.into_sql())
    }

    fn write_alias(&mut self, alias: Option<&str>) {
        if let Some(alias) = alias {
            self.keyword("as");
            self.ctx.write_identifier(alias);
        }
    }

    fn write_list(&mut self, fields: &[Field]) -> Result<()> {
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                self.comma();
            }
            field.accept(self)?;
        }
        Ok(())
    }

    /// Projection items are the only place field aliases are written.
    fn write_projection(&mut self, field: &Field) -> Result<()> {
        let items = match field {
            Field::Member(m) => m.fields(),
            single => std::slice::from_ref(single),
        };
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.comma();
            }
            item.accept(self)?;
            self.write_alias(item.alias());
        }
        Ok(())
    }

    /// Writes an operand, parenthesizing sub-selects.
    fn write_operand(&mut self, operand: &Expression) -> Result<()> {
        match operand {
            Expression::Select(select) => {
                let inner = self.nested(|b| select.accept(b))?;
                self.ctx.write_sql(&format!("({inner})"));
                Ok(())
            }
            other => other.accept(self),
        }
    }

    fn write_lowered(&mut self, operand: &Expression) -> Result<()> {
        self.keyword("lower");
        let inner = self.nested(|b| b.write_operand(operand))?;
        self.ctx.write_raw(&format!("({inner})"));
        Ok(())
    }

    fn write_logical_side(&mut self, side: &Condition, parent: Operator) -> Result<()> {
        match side.operator() {
            Some(op) if op != parent => {
                let inner = self.nested(|b| side.accept(b))?;
                self.ctx.write_sql(&format!("({inner})"));
                Ok(())
            }
            _ => side.accept(self),
        }
    }

    fn write_order(&mut self, order: &OrderField) -> Result<()> {
        order.field().accept(self)?;
        if let Some(direction) = order.order() {
            direction.write_to(self.ctx);
        }
        if let Some(nulls) = order.null_ordering() {
            let rules = self.ctx.rules();
            rules.require(rules.nulls_ordering, "nulls ordering")?;
            nulls.write_to(self.ctx);
        }
        Ok(())
    }

    fn write_paging(&mut self, paging: Paging, ordered: bool) {
        let rules = self.ctx.rules();
        match rules.paging {
            PagingStyle::LimitOffset => {
                self.keyword("limit");
                self.ctx.write_sql(&paging.limit.to_string());
                if paging.skip > 0 {
                    self.keyword("offset");
                    self.ctx.write_sql(&paging.skip.to_string());
                }
            }
            PagingStyle::OffsetFetch => {
                if !ordered && rules.paging_requires_order {
                    self.keyword("order by");
                    let inner = format!("{} {}", self.keyword_text("select"), self.keyword_text("null"));
                    self.ctx.write_sql(&format!("({inner})"));
                }
                self.keyword("offset");
                self.ctx.write_sql(&paging.skip.to_string());
                self.keyword("rows");
                self.keyword("fetch next");
                self.ctx.write_sql(&paging.limit.to_string());
                self.keyword("rows");
                self.keyword("only");
            }
        }
    }

    fn write_combine(&mut self, operator: CombineOperator, other: &Select) -> Result<()> {
        let except = self.ctx.rules().except_keyword;
        match operator {
            CombineOperator::Except => self.keyword(except),
            CombineOperator::ExceptAll => {
                self.keyword(except);
                self.keyword("all");
            }
            other_op => other_op.write_to(self.ctx),
        }
        let inner = self.nested(|b| other.accept(b))?;
        if is_bounded(other) || !other.combined().is_empty() {
            self.ctx.write_sql(&format!("({inner})"));
        } else {
            self.ctx.write_sql(&inner);
        }
        Ok(())
    }

    /// Every clause of a select except its set operators.
    fn write_select_body(&mut self, select: &Select) -> Result<()> {
        let rules = self.ctx.rules();
        self.keyword("select");
        if select.is_distinct() {
            self.keyword("distinct");
        }
        self.write_projection(select.field())?;

        match select.table() {
            Some(table) => {
                self.keyword("from");
                table.accept(self)?;
            }
            None => {
                if let Some(placeholder) = rules.placeholder_table {
                    self.keyword("from");
                    self.keyword(placeholder);
                }
            }
        }
        if let Some(condition) = select.where_condition() {
            self.keyword("where");
            condition.accept(self)?;
        }
        if !select.groups().is_empty() {
            self.keyword("group by");
            self.write_list(select.groups())?;
        }
        if let Some(condition) = select.having_condition() {
            self.keyword("having");
            condition.accept(self)?;
        }
        if !select.orders().is_empty() {
            self.keyword("order by");
            for (i, order) in select.orders().iter().enumerate() {
                if i > 0 {
                    self.comma();
                }
                self.write_order(order)?;
            }
        }
        if let Some(paging) = select.paging() {
            self.write_paging(paging, !select.orders().is_empty());
        }
        Ok(())
    }
}

fn is_bounded(select: &Select) -> bool {
    !select.orders().is_empty() || select.paging().is_some()
}

impl ExpressionVisitor for SqlBuilder<'_, '_> {
    type Output = Result<()>;

    fn visit_explain(&mut self, explain: &Explain) -> Result<()> {
        let rules = self.ctx.rules();
        let keyword = rules.explain_keyword.ok_or_else(|| {
            CubeError::UnsupportedOperation(format!("explain is not supported by {}", rules.root))
        })?;
        self.keyword(keyword);
        explain.select().accept(self)
    }

    fn visit_select(&mut self, select: &Select) -> Result<()> {
        if select.alias().is_some() {
            return Err(CubeError::UnsupportedOperation(
                "aliasing a select is not supported".to_string(),
            ));
        }
        // Ordering and paging on a combined operand stay inside its group.
        if is_bounded(select) && !select.combined().is_empty() {
            let inner = self.nested(|b| b.write_select_body(select))?;
            self.ctx.write_sql(&format!("({inner})"));
        } else {
            self.write_select_body(select)?;
        }
        for (operator, other) in select.combined() {
            self.write_combine(*operator, other)?;
        }
        Ok(())
    }

    fn visit_distinct(&mut self, distinct: &DistinctExpr) -> Result<()> {
        self.keyword("distinct");
        distinct.field().accept(self)
    }

    fn visit_asterisk(&mut self, asterisk: &AsteriskExpr) -> Result<()> {
        match asterisk.table() {
            Some(table) => {
                let qualifier = self.ctx.identifier(table.qualifier());
                self.ctx.write_sql(&format!("{qualifier}.*"));
            }
            None => {
                self.ctx.write_sql("*");
            }
        }
        Ok(())
    }

    fn visit_member(&mut self, member: &MemberExpr) -> Result<()> {
        self.write_list(member.fields())
    }

    fn visit_table_field(&mut self, field: &TableFieldExpr) -> Result<()> {
        if self.ctx.options().qualify_columns {
            let qualifier = self.ctx.identifier(field.table().qualifier());
            let name = self.ctx.identifier(field.name());
            self.ctx.write_sql(&format!("{qualifier}.{name}"));
        } else {
            self.ctx.write_identifier(field.name());
        }
        Ok(())
    }

    fn visit_table(&mut self, table: &TableExpr) -> Result<()> {
        let rules = self.ctx.rules();
        self.ctx.write_identifier(table.name());
        if let Some(alias) = table.alias() {
            if rules.table_alias_keyword {
                self.keyword("as");
            }
            self.ctx.write_identifier(alias);
        }
        for hint in table.hints() {
            rules.require(rules.index_hints, "index hints")?;
            hint.kind().write_to(self.ctx);
            if let Some(scope) = hint.scope() {
                scope.write_to(self.ctx);
            }
            let names: Vec<String> = hint
                .indexes()
                .iter()
                .map(|index| self.ctx.identifier(index))
                .collect();
            self.ctx.write_sql(&format!("({})", names.join(", ")));
        }
        Ok(())
    }

    fn visit_join(&mut self, join: &JoinExpr) -> Result<()> {
        let rules = self.ctx.rules();
        if join.alias().is_some() {
            return Err(CubeError::UnsupportedOperation(
                "aliasing a join is not supported".to_string(),
            ));
        }
        join.lhs().accept(self)?;
        match join.hint() {
            Some(hint) => {
                rules.require(rules.join_hints, "join hints")?;
                self.keyword(join.join_type().qualifier());
                hint.write_to(self.ctx);
                self.keyword("join");
            }
            None => join.join_type().write_to(self.ctx),
        }
        match join.rhs() {
            rhs @ Table::Join(_) => {
                let inner = self.nested(|b| rhs.accept(b))?;
                self.ctx.write_sql(&format!("({inner})"));
            }
            base => base.accept(self)?,
        }
        if let Some(condition) = join.condition() {
            self.keyword("on");
            condition.accept(self)?;
        }
        Ok(())
    }

    fn visit_comparison(&mut self, comparison: &ComparisonExpr) -> Result<()> {
        let operator = comparison.operator();
        if operator.is_ignore_case() && !self.ctx.rules().native_ilike {
            let Some(rhs) = comparison.rhs() else {
                return Err(CubeError::ContractViolation(format!(
                    "{} requires a right-hand side",
                    operator.keyword()
                )));
            };
            self.write_lowered(comparison.lhs())?;
            let like = if operator == Comparator::LikeIgnoreCase {
                "like"
            } else {
                "not like"
            };
            self.keyword(like);
            return self.write_lowered(rhs);
        }

        self.write_operand(comparison.lhs())?;
        operator.write_to(self.ctx);
        match comparison.rhs() {
            None => Ok(()),
            Some(rhs) if operator.is_list() => {
                let inner = self.nested(|b| rhs.accept(b))?;
                self.ctx.write_sql(&format!("({inner})"));
                Ok(())
            }
            Some(rhs) if operator.is_range() => match rhs {
                Expression::Field(Field::Member(bounds)) => match bounds.fields() {
                    [low, high] => {
                        low.accept(self)?;
                        self.keyword("and");
                        high.accept(self)
                    }
                    _ => Err(CubeError::ContractViolation(format!(
                        "{} requires exactly two bounds",
                        operator.keyword()
                    ))),
                },
                other => Err(CubeError::ContractViolation(format!(
                    "{} requires exactly two bounds, found a {}",
                    operator.keyword(),
                    other.kind()
                ))),
            },
            Some(rhs) => self.write_operand(rhs),
        }
    }

    fn visit_logical(&mut self, logical: &LogicalExpr) -> Result<()> {
        let operator = logical.operator();
        self.write_logical_side(logical.lhs(), operator)?;
        operator.write_to(self.ctx);
        self.write_logical_side(logical.rhs(), operator)
    }

    fn visit_variable(&mut self, variable: &VariableExpr) -> Result<()> {
        match variable.value() {
            Value::Int64(v) => {
                self.ctx.write_sql(&v.to_string());
                Ok(())
            }
            other => Err(CubeError::UnsupportedLiteral(other.kind_name().to_string())),
        }
    }

    fn visit_aggregate(&mut self, aggregate: &AggregateExpr) -> Result<()> {
        if aggregate.function() == Aggregate::Median {
            let rules = self.ctx.rules();
            rules.require(rules.median, "median")?;
        }
        aggregate.function().write_to(self.ctx);
        let inner = self.nested(|b| {
            if aggregate.is_distinct() {
                b.keyword("distinct");
            }
            b.write_list(aggregate.arguments())
        })?;
        self.ctx.write_raw(&format!("({inner})"));
        Ok(())
    }
}
