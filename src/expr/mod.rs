//! Expression node taxonomy.
//!
//! Every SQL fragment the facade can build is an [`Expression`]. Nodes are
//! grouped into families: [`Field`] (projected values), [`Condition`]
//! (predicates), [`Table`] (relations), plus the root [`Select`] and
//! [`Explain`] statements.
//!
//! Behavior is added through [`ExpressionVisitor`] rather than on the node
//! types: each concrete node's `accept` calls the matching `visit_*`
//! method. [`Node`] is a borrowed view used when walking children, so
//! generic tree algorithms (rewriting, search) never need to clone.

mod condition;
mod field;
mod replace;
mod select;
mod table;
mod visitor;

pub use condition::{ComparisonExpr, Condition, LogicalExpr};
pub use field::{
    AggregateExpr, AsteriskExpr, DistinctExpr, Field, MemberExpr, TableFieldExpr, TableName,
    VariableExpr,
};
pub use replace::{ReplacingVisitor, Transformed};
pub use select::{Explain, OrderField, Paging, Select};
pub use table::{IndexHint, JoinExpr, Table, TableExpr};
pub use visitor::ExpressionVisitor;

use crate::error::{CubeError, Result};
use crate::types::Value;

/// An owned expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Field(Field),
    Condition(Condition),
    Table(Table),
    Select(Box<Select>),
    Explain(Explain),
}

impl Expression {
    /// Borrows this expression as a [`Node`].
    #[must_use]
    pub fn node(&self) -> Node<'_> {
        match self {
            Expression::Field(f) => Node::Field(f),
            Expression::Condition(c) => Node::Condition(c),
            Expression::Table(t) => Node::Table(t),
            Expression::Select(s) => Node::Select(s),
            Expression::Explain(e) => Node::Explain(e),
        }
    }

    /// Dispatches to the visitor method for the concrete node type.
    pub fn accept<V: ExpressionVisitor + ?Sized>(&self, visitor: &mut V) -> V::Output {
        self.node().accept(visitor)
    }

    /// Returns the immediate structural children.
    #[must_use]
    pub fn children(&self) -> Vec<Node<'_>> {
        self.node().children()
    }

    /// Rewrites the tree, replacing every node for which `replace_fn`
    /// returns `Some`. Ancestors are rebuilt only where a child changed.
    ///
    /// # Errors
    ///
    /// Returns a contract violation if a replacement does not fit the slot
    /// it lands in (e.g. a condition where a field is required).
    pub fn replace<F>(&self, replace_fn: F) -> Result<Expression>
    where
        F: FnMut(Node<'_>) -> Option<Expression>,
    {
        ReplacingVisitor::new(replace_fn)
            .rewrite(self.node())
            .map(Transformed::into_inner)
    }

    /// Returns the family name of this expression.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        self.node().kind()
    }
}

/// Borrowed view of a node in an expression tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Node<'a> {
    Field(&'a Field),
    Condition(&'a Condition),
    Table(&'a Table),
    Select(&'a Select),
    Explain(&'a Explain),
}

impl<'a> Node<'a> {
    /// Dispatches to the visitor method for the concrete node type.
    pub fn accept<V: ExpressionVisitor + ?Sized>(self, visitor: &mut V) -> V::Output {
        match self {
            Node::Field(f) => f.accept(visitor),
            Node::Condition(c) => c.accept(visitor),
            Node::Table(t) => t.accept(visitor),
            Node::Select(s) => s.accept(visitor),
            Node::Explain(e) => e.accept(visitor),
        }
    }

    /// Returns the immediate structural children.
    #[must_use]
    pub fn children(self) -> Vec<Node<'a>> {
        match self {
            Node::Field(f) => f.children(),
            Node::Condition(c) => c.children(),
            Node::Table(t) => t.children(),
            Node::Select(s) => s.children(),
            Node::Explain(e) => e.children(),
        }
    }

    /// Clones the referenced node into an owned expression.
    #[must_use]
    pub fn to_expression(self) -> Expression {
        match self {
            Node::Field(f) => Expression::Field(f.clone()),
            Node::Condition(c) => Expression::Condition(c.clone()),
            Node::Table(t) => Expression::Table(t.clone()),
            Node::Select(s) => Expression::Select(Box::new(s.clone())),
            Node::Explain(e) => Expression::Explain(e.clone()),
        }
    }

    /// Returns the family name of this node.
    #[must_use]
    pub fn kind(self) -> &'static str {
        match self {
            Node::Field(_) => "field",
            Node::Condition(_) => "condition",
            Node::Table(_) => "table",
            Node::Select(_) => "select",
            Node::Explain(_) => "explain",
        }
    }

    /// Returns the field if this node is one.
    #[must_use]
    pub fn as_field(self) -> Option<&'a Field> {
        match self {
            Node::Field(f) => Some(f),
            _ => None,
        }
    }
}

impl From<Field> for Expression {
    fn from(f: Field) -> Self {
        Expression::Field(f)
    }
}

impl From<Condition> for Expression {
    fn from(c: Condition) -> Self {
        Expression::Condition(c)
    }
}

impl From<Table> for Expression {
    fn from(t: Table) -> Self {
        Expression::Table(t)
    }
}

impl From<Select> for Expression {
    fn from(s: Select) -> Self {
        Expression::Select(Box::new(s))
    }
}

impl From<Explain> for Expression {
    fn from(e: Explain) -> Self {
        Expression::Explain(e)
    }
}

fn wrong_family(expected: &str, found: &Expression) -> CubeError {
    CubeError::ContractViolation(format!(
        "expected a {expected}, found a {}",
        found.kind()
    ))
}

impl TryFrom<Expression> for Field {
    type Error = CubeError;

    fn try_from(expr: Expression) -> Result<Self> {
        match expr {
            Expression::Field(f) => Ok(f),
            other => Err(wrong_family("field", &other)),
        }
    }
}

impl TryFrom<Expression> for Condition {
    type Error = CubeError;

    fn try_from(expr: Expression) -> Result<Self> {
        match expr {
            Expression::Condition(c) => Ok(c),
            other => Err(wrong_family("condition", &other)),
        }
    }
}

impl TryFrom<Expression> for Table {
    type Error = CubeError;

    fn try_from(expr: Expression) -> Result<Self> {
        match expr {
            Expression::Table(t) => Ok(t),
            other => Err(wrong_family("table", &other)),
        }
    }
}

impl TryFrom<Expression> for Select {
    type Error = CubeError;

    fn try_from(expr: Expression) -> Result<Self> {
        match expr {
            Expression::Select(s) => Ok(*s),
            other => Err(wrong_family("select", &other)),
        }
    }
}

/// Argument accepted wherever either an expression or a raw value fits.
///
/// Raw values are wrapped as literals when the operand is consumed.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Expr(Expression),
    Value(Value),
}

impl Operand {
    /// Converts the operand into an expression, wrapping raw values.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedLiteral` if a raw value cannot be wrapped.
    pub fn into_expression(self) -> Result<Expression> {
        match self {
            Operand::Expr(e) => Ok(e),
            Operand::Value(v) => Ok(Expression::Field(Field::Variable(VariableExpr::new(v)?))),
        }
    }

    /// Converts the operand into a field, wrapping raw values.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedLiteral` for unwrappable values and a contract
    /// violation for expressions that are not fields.
    pub fn into_field(self) -> Result<Field> {
        Field::try_from(self.into_expression()?)
    }
}

impl From<Expression> for Operand {
    fn from(e: Expression) -> Self {
        Operand::Expr(e)
    }
}

impl From<Field> for Operand {
    fn from(f: Field) -> Self {
        Operand::Expr(Expression::Field(f))
    }
}

impl From<&Field> for Operand {
    fn from(f: &Field) -> Self {
        Operand::Expr(Expression::Field(f.clone()))
    }
}

impl From<AggregateExpr> for Operand {
    fn from(a: AggregateExpr) -> Self {
        Operand::Expr(Expression::Field(Field::Aggregate(a)))
    }
}

impl From<Select> for Operand {
    fn from(s: Select) -> Self {
        Operand::Expr(Expression::Select(Box::new(s)))
    }
}

impl From<Value> for Operand {
    fn from(v: Value) -> Self {
        Operand::Value(v)
    }
}

macro_rules! operand_from_native {
    ($($t:ty),+) => {
        $(
            impl From<$t> for Operand {
                fn from(v: $t) -> Self {
                    Operand::Value(Value::from(v))
                }
            }
        )+
    };
}

operand_from_native!(i64, i32, u32, f32, f64, bool, &str, String);

#[cfg(test)]
mod tests {
    use super::*;

    fn orders_id() -> Field {
        Field::TableField(TableFieldExpr::new("id", TableName::new("orders")).unwrap())
    }

    #[test]
    fn test_operand_wraps_integer() {
        let field = Operand::from(5).into_field().unwrap();
        assert!(matches!(field, Field::Variable(ref v) if v.value() == &Value::Int64(5)));
    }

    #[test]
    fn test_operand_rejects_string() {
        let err = Operand::from("five").into_field().unwrap_err();
        assert!(matches!(err, CubeError::UnsupportedLiteral(_)));
    }

    #[test]
    fn test_try_from_wrong_family() {
        let cond = orders_id().is_null();
        let err = Field::try_from(Expression::Condition(cond)).unwrap_err();
        assert!(err.to_string().contains("expected a field, found a condition"));
    }

    #[test]
    fn test_leaf_children_empty() {
        let expr = Expression::Field(orders_id());
        assert!(expr.children().is_empty());
        let lit = Expression::Field(Field::Variable(VariableExpr::new(Value::Int64(1)).unwrap()));
        assert!(lit.children().is_empty());
    }
}
