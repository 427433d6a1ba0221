//! Fixed operator vocabularies.

use serde::{Deserialize, Serialize};

use crate::render::RenderContext;

use super::Keyword;

/// Declares a keyword-backed enum with `keyword()`, `write_to()` and `ALL`.
macro_rules! keyword_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $kw:literal, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )+
        }

        impl $name {
            /// Every variant in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Returns the lower-case keyword for this variant.
            #[must_use]
            pub fn keyword(&self) -> &'static str {
                match self {
                    $( $name::$variant => $kw, )+
                }
            }

            /// Writes this keyword into the render context.
            pub fn write_to(&self, ctx: &mut RenderContext<'_>) {
                ctx.write_keyword(&Keyword::fixed(self.keyword()));
            }
        }
    };
}

keyword_enum! {
    /// Comparison operators.
    pub enum Comparator {
        Eq => "=",
        Ne => "<>",
        Lt => "<",
        Gt => ">",
        Le => "<=",
        Ge => ">=",
        In => "in",
        NotIn => "not in",
        Like => "like",
        NotLike => "not like",
        LikeIgnoreCase => "ilike",
        NotLikeIgnoreCase => "not ilike",
        Between => "between",
        NotBetween => "not between",
        IsNull => "is null",
        IsNotNull => "is not null",
    }
}

impl Comparator {
    /// Returns true for operators that take no right-hand side.
    #[must_use]
    pub fn is_unary(&self) -> bool {
        matches!(self, Comparator::IsNull | Comparator::IsNotNull)
    }

    /// Returns true for operators whose right-hand side is a value list.
    #[must_use]
    pub fn is_list(&self) -> bool {
        matches!(self, Comparator::In | Comparator::NotIn)
    }

    /// Returns true for operators whose right-hand side is a lower/upper pair.
    #[must_use]
    pub fn is_range(&self) -> bool {
        matches!(self, Comparator::Between | Comparator::NotBetween)
    }

    /// Returns true for the case-insensitive LIKE forms.
    #[must_use]
    pub fn is_ignore_case(&self) -> bool {
        matches!(
            self,
            Comparator::LikeIgnoreCase | Comparator::NotLikeIgnoreCase
        )
    }
}

keyword_enum! {
    /// Aggregate functions.
    pub enum Aggregate {
        Count => "count",
        Max => "max",
        Min => "min",
        Sum => "sum",
        Avg => "avg",
        Round => "round",
        Median => "median",
    }
}

keyword_enum! {
    /// Logical operators joining two conditions.
    pub enum Operator {
        And => "and",
        Or => "or",
    }
}

keyword_enum! {
    /// Join types.
    pub enum JoinType {
        InnerJoin => "inner join",
        LeftJoin => "left join",
        LeftOuterJoin => "left outer join",
        RightJoin => "right join",
        RightOuterJoin => "right outer join",
        FullJoin => "full join",
        FullOuterJoin => "full outer join",
    }
}

impl JoinType {
    /// Splits the join type into its qualifier and the trailing `join`.
    ///
    /// Join hints are written between the two halves.
    #[must_use]
    pub fn qualifier(&self) -> &'static str {
        match self {
            JoinType::InnerJoin => "inner",
            JoinType::LeftJoin => "left",
            JoinType::LeftOuterJoin => "left outer",
            JoinType::RightJoin => "right",
            JoinType::RightOuterJoin => "right outer",
            JoinType::FullJoin => "full",
            JoinType::FullOuterJoin => "full outer",
        }
    }
}

keyword_enum! {
    /// Physical join strategy hints.
    pub enum JoinHint {
        Hash => "hash",
        Loop => "loop",
        Merge => "merge",
        Remote => "remote",
    }
}

keyword_enum! {
    /// Index hint verbs.
    pub enum IndexHintKind {
        Use => "use index",
        Ignore => "ignore index",
        Force => "force index",
    }
}

keyword_enum! {
    /// Clause an index hint is restricted to.
    pub enum IndexHintScope {
        Join => "for join",
        OrderBy => "for order by",
        GroupBy => "for group by",
    }
}

keyword_enum! {
    /// Set operators combining two selects.
    pub enum CombineOperator {
        Union => "union",
        UnionAll => "union all",
        Except => "except",
        ExceptAll => "except all",
        Intersect => "intersect",
        IntersectAll => "intersect all",
    }
}

keyword_enum! {
    /// Sort direction.
    pub enum SortOrder {
        Asc => "asc",
        Desc => "desc",
    }
}

keyword_enum! {
    /// Placement of nulls in an ordering.
    pub enum NullOrdering {
        First => "nulls first",
        Last => "nulls last",
    }
}

/// Every keyword the operator enums can emit.
pub(super) fn vocabulary() -> impl Iterator<Item = &'static str> {
    let comparators = Comparator::ALL.iter().map(Comparator::keyword);
    let aggregates = Aggregate::ALL.iter().map(Aggregate::keyword);
    let operators = Operator::ALL.iter().map(Operator::keyword);
    let joins = JoinType::ALL.iter().map(JoinType::keyword);
    let join_hints = JoinHint::ALL.iter().map(JoinHint::keyword);
    let index_hints = IndexHintKind::ALL.iter().map(IndexHintKind::keyword);
    let scopes = IndexHintScope::ALL.iter().map(IndexHintScope::keyword);
    let combines = CombineOperator::ALL.iter().map(CombineOperator::keyword);
    let orders = SortOrder::ALL.iter().map(SortOrder::keyword);
    let nulls = NullOrdering::ALL.iter().map(NullOrdering::keyword);
    comparators
        .chain(aggregates)
        .chain(operators)
        .chain(joins)
        .chain(join_hints)
        .chain(index_hints)
        .chain(scopes)
        .chain(combines)
        .chain(orders)
        .chain(nulls)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comparator_shapes() {
        assert!(Comparator::IsNull.is_unary());
        assert!(Comparator::NotIn.is_list());
        assert!(Comparator::Between.is_range());
        assert!(Comparator::NotLikeIgnoreCase.is_ignore_case());
        assert!(!Comparator::Eq.is_unary());
    }

    #[test]
    fn test_join_qualifier_prefixes_keyword() {
        for jt in JoinType::ALL {
            assert_eq!(format!("{} join", jt.qualifier()), jt.keyword());
        }
    }

    #[test]
    fn test_vocabulary_size() {
        assert_eq!(Comparator::ALL.len(), 16);
        assert_eq!(Aggregate::ALL.len(), 7);
        assert!(vocabulary().any(|k| k == "intersect all"));
    }
}
