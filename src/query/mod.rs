//! Query-construction facade.
//!
//! A [`QueryBuilder`] owns the one [`QueryContext`] shared by every select it
//! creates, so a tree built through it always renders against the same
//! catalog and options.

use std::sync::Arc;

use crate::catalog::{Catalog, MetaField};
use crate::dialect::SqlDialect;
use crate::error::{CubeError, Result};
use crate::expr::{
    AsteriskExpr, Explain, Expression, Field, MemberExpr, Node, Operand, Select, Table,
    VariableExpr,
};
use crate::keyword::{self, Keyword};
use crate::model::QueryModel;
use crate::render::{self, QueryContext, RenderOptions};
use crate::types::Value;

/// Entry point for building selects against one catalog.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    context: Arc<QueryContext>,
}

impl QueryBuilder {
    /// Creates a builder with default render options.
    #[must_use]
    pub fn new<C: Catalog + 'static>(catalog: Arc<C>) -> Self {
        Self::with_options(catalog, RenderOptions::default())
    }

    /// Creates a builder with the given render options.
    #[must_use]
    pub fn with_options<C: Catalog + 'static>(catalog: Arc<C>, options: RenderOptions) -> Self {
        QueryBuilder {
            context: Arc::new(QueryContext::new(catalog, options)),
        }
    }

    /// Attaches a query model for custom builders. Selects created earlier
    /// keep the previous context.
    #[must_use]
    pub fn with_model(self, model: QueryModel) -> Self {
        let context = QueryContext::new(
            Arc::clone(self.context.catalog()),
            self.context.options().clone(),
        )
        .with_model(model);
        QueryBuilder {
            context: Arc::new(context),
        }
    }

    #[must_use]
    pub fn context(&self) -> &Arc<QueryContext> {
        &self.context
    }

    #[must_use]
    pub fn catalog(&self) -> &Arc<dyn Catalog> {
        self.context.catalog()
    }

    #[must_use]
    pub fn dialect(&self) -> SqlDialect {
        self.context.dialect()
    }

    #[must_use]
    pub fn options(&self) -> &RenderOptions {
        self.context.options()
    }

    #[must_use]
    pub fn model(&self) -> Option<&QueryModel> {
        self.context.model()
    }

    // ==================== Vocabulary ====================

    /// Wraps an arbitrary token as a keyword.
    ///
    /// # Errors
    ///
    /// Returns a contract violation for a blank token.
    pub fn keyword(&self, token: &str) -> Result<Keyword> {
        Keyword::of(token)
    }

    /// Resolves a token against the reserved vocabulary.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the token is not reserved.
    pub fn reserved_keyword(&self, token: &str) -> Result<Keyword> {
        keyword::lookup(token)
    }

    // ==================== Literals ====================

    /// Wraps a native value as a literal field.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedLiteral` for value kinds that have no literal
    /// form.
    pub fn val(&self, value: impl Into<Value>) -> Result<Field> {
        VariableExpr::new(value.into()).map(Field::Variable)
    }

    #[must_use]
    pub fn int_val(&self, value: i64) -> Field {
        Field::int(value)
    }

    // ==================== Catalog access ====================

    /// Column expression of a prepared field descriptor.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` if the descriptor is not prepared.
    pub fn field(&self, field: &MetaField) -> Result<Field> {
        field.to_field()
    }

    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id and `InvalidState` if the
    /// descriptor is not prepared.
    pub fn field_by_id(&self, id: &str) -> Result<Field> {
        self.catalog().field_by_id(id)?.to_field()
    }

    /// Table expression of the first table named `name`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown name and `InvalidState` if the
    /// descriptor is not prepared.
    pub fn table(&self, name: &str) -> Result<Table> {
        self.catalog().table_by_name(name)?.to_table()
    }

    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id and `InvalidState` if the
    /// descriptor is not prepared.
    pub fn table_by_id(&self, id: &str) -> Result<Table> {
        self.catalog().table_by_id(id)?.to_table()
    }

    /// Unqualified `*`.
    #[must_use]
    pub fn asterisk(&self) -> Field {
        Field::Asterisk(AsteriskExpr::new())
    }

    // ==================== Statements ====================

    /// Starts a select projecting `items`. Raw values are wrapped as
    /// literals.
    ///
    /// # Errors
    ///
    /// Returns a contract violation for an empty projection and
    /// `UnsupportedLiteral` for a value that cannot be wrapped.
    pub fn select<I, T>(&self, items: I) -> Result<Select>
    where
        I: IntoIterator<Item = T>,
        T: Into<Operand>,
    {
        let fields = items
            .into_iter()
            .map(|item| item.into().into_field())
            .collect::<Result<Vec<_>>>()?;
        if fields.is_empty() {
            return Err(CubeError::ContractViolation(
                "select needs at least one projection".to_string(),
            ));
        }
        let projection = Field::Member(MemberExpr::new(fields)?);
        Ok(Select::new(Arc::clone(&self.context), projection))
    }

    /// Wraps `select` in an explain statement.
    #[must_use]
    pub fn explain(&self, select: Select) -> Explain {
        select.explain()
    }

    /// Renders any expression with this builder's context.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedOperation` if the dialect cannot express the
    /// tree.
    pub fn render(&self, expression: &Expression) -> Result<String> {
        render::render_node(&self.context, expression.node())
    }

    /// Renders a node borrowed from a larger tree.
    ///
    /// # Errors
    ///
    /// See [`render`](Self::render).
    pub fn render_node(&self, node: Node<'_>) -> Result<String> {
        render::render_node(&self.context, node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{MetaCatalog, MetaTable};
    use crate::error::ErrorCategory;

    fn builder(dialect: SqlDialect) -> QueryBuilder {
        let catalog = MetaCatalog::new(dialect);
        catalog.add_table(MetaTable::with_id("t1", "orders").unwrap()).unwrap();
        catalog.add_field(MetaField::with_id("f1", "t1", "id").unwrap()).unwrap();
        catalog.add_field(MetaField::with_id("f2", "t1", "total").unwrap()).unwrap();
        let catalog = Arc::new(catalog);
        catalog.prepare().unwrap();
        QueryBuilder::new(catalog)
    }

    #[test]
    fn test_select_catalog_field() {
        let q = builder(SqlDialect::Postgres);
        let id = q.field_by_id("f1").unwrap();
        let sql = q.select([id]).unwrap().render().unwrap();
        assert_eq!(sql, "SELECT orders.id");
    }

    #[test]
    fn test_select_mixed_operands() {
        let q = builder(SqlDialect::MySql);
        let select = q
            .select([Operand::from(q.field_by_id("f2").unwrap()), Operand::from(1)])
            .unwrap()
            .from(q.table("orders").unwrap())
            .unwrap();
        assert_eq!(select.render().unwrap(), "SELECT orders.total, 1 FROM orders");
    }

    #[test]
    fn test_unsupported_literal() {
        let q = builder(SqlDialect::MySql);
        let err = q.select(["text"]).unwrap_err();
        assert!(matches!(err, CubeError::UnsupportedLiteral(_)));
        assert_eq!(err.category(), ErrorCategory::Unsupported);
        assert!(q.val(2.5).is_err());
        assert!(q.val(7).is_ok());
    }

    #[test]
    fn test_empty_select() {
        let q = builder(SqlDialect::MySql);
        let err = q.select(Vec::<Field>::new()).unwrap_err();
        assert!(matches!(err, CubeError::ContractViolation(_)));
    }

    #[test]
    fn test_table_fields_follow_catalog() {
        let q = builder(SqlDialect::MySql);
        assert_eq!(q.table_by_id("t1").unwrap().field_count(), 2);
        assert!(q.table("missing").is_err());
    }

    #[test]
    fn test_keywords() {
        let q = builder(SqlDialect::MySql);
        assert_eq!(q.keyword("window").unwrap().upper(), "WINDOW");
        assert!(q.reserved_keyword("select").is_ok());
        assert!(matches!(
            q.reserved_keyword("banana"),
            Err(CubeError::NotFound { .. })
        ));
    }

    #[test]
    fn test_model_is_carried() {
        let q = builder(SqlDialect::MySql);
        assert!(q.model().is_none());
        let q = q.with_model(QueryModel::new());
        assert_eq!(q.model(), Some(&QueryModel::new()));
    }

    #[test]
    fn test_render_expression() {
        let q = builder(SqlDialect::Oracle);
        let select = q.select([q.int_val(1)]).unwrap();
        let expr = Expression::from(select);
        assert_eq!(q.render(&expr).unwrap(), "SELECT 1 FROM DUAL");
    }
}
