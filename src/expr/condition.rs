//! Condition family: comparisons and their logical combinations.

use crate::error::{CubeError, Result};
use crate::keyword::{Comparator, Operator};

use super::field::Field;
use super::visitor::ExpressionVisitor;
use super::{Expression, Node};

/// `lhs <op> rhs`, or `lhs <op>` for unary operators.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonExpr {
    lhs: Box<Expression>,
    rhs: Option<Box<Expression>>,
    operator: Comparator,
}

impl ComparisonExpr {
    /// Creates a comparison, checking the right-hand side fits the operator.
    ///
    /// # Errors
    ///
    /// Returns a contract violation when a unary operator is given a
    /// right-hand side (or a binary one is not), when a list operator's
    /// right-hand side is not a member list or select, when a range
    /// operator is not given exactly two bounds, when a single-value
    /// operator is given a member list, or when an operand is not a field
    /// or subquery.
    pub fn new(lhs: Expression, rhs: Option<Expression>, operator: Comparator) -> Result<Self> {
        let contract =
            |msg: &str| CubeError::ContractViolation(format!("{} {msg}", operator.keyword()));
        for operand in std::iter::once(&lhs).chain(rhs.as_ref()) {
            if !matches!(operand, Expression::Field(_) | Expression::Select(_)) {
                return Err(CubeError::ContractViolation(format!(
                    "expected a field or subquery operand, found a {}",
                    operand.kind()
                )));
            }
        }
        match (&rhs, operator) {
            (Some(_), op) if op.is_unary() => return Err(contract("takes no right-hand side")),
            (None, op) if !op.is_unary() => return Err(contract("requires a right-hand side")),
            (Some(Expression::Field(Field::Member(_)) | Expression::Select(_)), op)
                if op.is_list() => {}
            (Some(_), op) if op.is_list() => return Err(contract("requires a list or subquery")),
            (Some(Expression::Field(Field::Member(m))), op) if op.is_range() && m.len() == 2 => {}
            (Some(_), op) if op.is_range() => return Err(contract("requires exactly two bounds")),
            (Some(Expression::Field(Field::Member(_))), _) => {
                return Err(contract("takes a single value, not a list"))
            }
            _ => {}
        }
        Ok(ComparisonExpr {
            lhs: Box::new(lhs),
            rhs: rhs.map(Box::new),
            operator,
        })
    }

    pub(super) fn unary(lhs: Expression, operator: Comparator) -> Self {
        ComparisonExpr {
            lhs: Box::new(lhs),
            rhs: None,
            operator,
        }
    }

    #[must_use]
    pub fn lhs(&self) -> &Expression {
        &self.lhs
    }

    #[must_use]
    pub fn rhs(&self) -> Option<&Expression> {
        self.rhs.as_deref()
    }

    #[must_use]
    pub fn operator(&self) -> Comparator {
        self.operator
    }

    pub fn accept<V: ExpressionVisitor + ?Sized>(&self, visitor: &mut V) -> V::Output {
        visitor.visit_comparison(self)
    }
}

/// `lhs AND rhs` / `lhs OR rhs`.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalExpr {
    lhs: Box<Condition>,
    rhs: Box<Condition>,
    operator: Operator,
}

impl LogicalExpr {
    #[must_use]
    pub fn new(lhs: Condition, rhs: Condition, operator: Operator) -> Self {
        LogicalExpr {
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
            operator,
        }
    }

    #[must_use]
    pub fn lhs(&self) -> &Condition {
        &self.lhs
    }

    #[must_use]
    pub fn rhs(&self) -> &Condition {
        &self.rhs
    }

    #[must_use]
    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn accept<V: ExpressionVisitor + ?Sized>(&self, visitor: &mut V) -> V::Output {
        visitor.visit_logical(self)
    }
}

/// A predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Comparison(ComparisonExpr),
    Logical(LogicalExpr),
}

impl Condition {
    /// `self AND other`.
    #[must_use]
    pub fn and(self, other: Condition) -> Condition {
        Condition::Logical(LogicalExpr::new(self, other, Operator::And))
    }

    /// `self OR other`.
    #[must_use]
    pub fn or(self, other: Condition) -> Condition {
        Condition::Logical(LogicalExpr::new(self, other, Operator::Or))
    }

    pub fn accept<V: ExpressionVisitor + ?Sized>(&self, visitor: &mut V) -> V::Output {
        match self {
            Condition::Comparison(c) => c.accept(visitor),
            Condition::Logical(l) => l.accept(visitor),
        }
    }

    /// Returns the immediate structural children.
    #[must_use]
    pub fn children(&self) -> Vec<Node<'_>> {
        match self {
            Condition::Comparison(c) => {
                let mut children = vec![c.lhs().node()];
                children.extend(c.rhs().map(Expression::node));
                children
            }
            Condition::Logical(l) => vec![Node::Condition(l.lhs()), Node::Condition(l.rhs())],
        }
    }

    /// Returns the logical operator if this is a combination.
    #[must_use]
    pub fn operator(&self) -> Option<Operator> {
        match self {
            Condition::Logical(l) => Some(l.operator()),
            Condition::Comparison(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{MemberExpr, TableFieldExpr, TableName};

    fn column(name: &str) -> Field {
        TableFieldExpr::new(name, TableName::new("t")).unwrap().into()
    }

    #[test]
    fn test_unary_has_single_child() {
        let cond = column("a").is_null();
        assert_eq!(cond.children().len(), 1);
    }

    #[test]
    fn test_single_value_operator_rejects_list() {
        let list = MemberExpr::new(vec![Field::int(1), Field::int(2)]).unwrap();
        for op in [Comparator::Eq, Comparator::Gt, Comparator::Like] {
            let err = ComparisonExpr::new(
                Expression::Field(column("a")),
                Some(Expression::Field(Field::Member(list.clone()))),
                op,
            )
            .unwrap_err();
            assert!(err.to_string().contains("takes a single value"));
        }
        assert!(column("a").in_list([1, 2]).is_ok());
    }

    #[test]
    fn test_unary_rejects_rhs() {
        let err = ComparisonExpr::new(
            Expression::Field(column("a")),
            Some(Expression::Field(Field::int(1))),
            Comparator::IsNull,
        )
        .unwrap_err();
        assert!(err.to_string().contains("takes no right-hand side"));
    }

    #[test]
    fn test_range_requires_two_bounds() {
        let err = ComparisonExpr::new(
            Expression::Field(column("a")),
            Some(Expression::Field(Field::int(1))),
            Comparator::Between,
        )
        .unwrap_err();
        assert!(matches!(err, CubeError::ContractViolation(_)));
        assert!(column("a").between(1, 10).is_ok());
    }

    #[test]
    fn test_and_or_build_logical() {
        let a = column("a").eq(1).unwrap();
        let b = column("b").eq(2).unwrap();
        let c = column("c").eq(3).unwrap();
        let combined = a.and(b.or(c));
        assert_eq!(combined.operator(), Some(Operator::And));
        let children = combined.children();
        assert_eq!(children.len(), 2);
        assert!(matches!(children[1], Node::Condition(c) if c.operator() == Some(Operator::Or)));
    }
}
