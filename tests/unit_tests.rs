//! Unit tests for the public building blocks: vocabulary, dialects, values,
//! options and expression rewriting.

use std::sync::Arc;

use cubeql::expr::{Expression, Node, Transformed};
use cubeql::keyword::{self, Comparator, JoinType};
use cubeql::{
    CubeError, DialectVersion, Field, KeywordCase, MetaCatalog, QueryBuilder, RenderOptions,
    SqlDialect, Table, Value,
};

fn builder(dialect: SqlDialect, options: RenderOptions) -> QueryBuilder {
    QueryBuilder::with_options(Arc::new(MetaCatalog::new(dialect)), options)
}

// =============================================================================
// Vocabulary
// =============================================================================

#[test]
fn test_comparator_vocabulary_resolves() {
    for comparator in Comparator::ALL {
        let kw = keyword::lookup(comparator.keyword()).unwrap();
        assert_eq!(kw.as_is(), comparator.keyword());
    }
    assert_eq!(JoinType::LeftOuterJoin.keyword(), "left outer join");
}

#[test]
fn test_lookup_is_case_insensitive() {
    assert_eq!(keyword::lookup("Order By").unwrap().upper(), "ORDER BY");
}

// =============================================================================
// Dialects
// =============================================================================

#[test]
fn test_branch_dialects_defer_to_root() {
    assert_eq!(SqlDialect::MariaDb.root(), SqlDialect::MySql);
    assert_eq!(SqlDialect::GreenPlum.root(), SqlDialect::Postgres);
    assert_eq!(SqlDialect::Dameng.root(), SqlDialect::Oracle);
    assert!(SqlDialect::SqlServer.is_root());
    assert_eq!(
        SqlDialect::Postgres.branches(),
        vec![SqlDialect::GreenPlum, SqlDialect::GaussDb]
    );
}

#[test]
fn test_dialect_from_name() {
    assert_eq!("mariadb".parse::<SqlDialect>().unwrap(), SqlDialect::MariaDb);
    assert!(matches!(
        SqlDialect::from_name("db2"),
        Err(CubeError::NotFound { kind: "dialect", .. })
    ));
}

#[test]
fn test_dialect_version_parse() {
    assert_eq!("12".parse::<DialectVersion>().unwrap(), DialectVersion::new(12, 0));
    assert_eq!("8.4".parse::<DialectVersion>().unwrap(), DialectVersion::new(8, 4));
    assert!("x.1".parse::<DialectVersion>().is_err());
    assert!(DialectVersion::new(8, 4) < DialectVersion::new(12, 0));
}

// =============================================================================
// Values and literals
// =============================================================================

#[test]
fn test_only_integers_become_literals() {
    let q = builder(SqlDialect::MySql, RenderOptions::default());
    assert!(q.val(42i64).is_ok());
    assert!(q.val(7u32).is_ok());
    for value in [Value::from(1.5), Value::from(true), Value::from("x"), Value::Null] {
        let err = q.val(value).unwrap_err();
        assert!(matches!(err, CubeError::UnsupportedLiteral(_)));
    }
}

#[test]
fn test_unsupported_literal_names_the_kind() {
    let q = builder(SqlDialect::MySql, RenderOptions::default());
    let err = q.val(2.5f64).unwrap_err();
    assert_eq!(err.to_string(), "Unsupported literal type: FLOAT64");
}

// =============================================================================
// Options
// =============================================================================

#[test]
fn test_keyword_case_and_quoting_options() {
    let options = RenderOptions::new()
        .with_keyword_case(KeywordCase::Lower)
        .with_quote_identifiers(true);
    let q = builder(SqlDialect::Postgres, options);
    let orders = Table::new("orders", ["id"]).unwrap();
    let sql = q
        .select([orders.field("id").unwrap()])
        .unwrap()
        .from(orders)
        .unwrap()
        .render()
        .unwrap();
    assert_eq!(sql, r#"select "orders"."id" from "orders""#);
}

#[test]
fn test_unqualified_columns_option() {
    let q = builder(
        SqlDialect::MySql,
        RenderOptions::new().with_qualify_columns(false),
    );
    let orders = Table::new("orders", ["id"]).unwrap();
    let id = orders.field("id").unwrap();
    let sql = q
        .select([id.clone()])
        .unwrap()
        .from(orders)
        .unwrap()
        .where_(id.eq(3).unwrap())
        .render()
        .unwrap();
    assert_eq!(sql, "SELECT id FROM orders WHERE id = 3");
}

#[test]
fn test_options_from_json_defaults() {
    let options: RenderOptions =
        serde_json::from_str(r#"{"quote_identifiers":true,"indent":2}"#).unwrap();
    assert!(options.quote_identifiers);
    assert!(options.qualify_columns);
    assert_eq!(options.keyword_case, KeywordCase::Upper);
}

// =============================================================================
// Rewriting
// =============================================================================

#[test]
fn test_replace_swaps_matching_fields() {
    let orders = Table::new("orders", ["id", "total"]).unwrap();
    let archive = Table::new("archive", ["id"]).unwrap();
    let id = orders.field("id").unwrap();
    let replacement = archive.field("id").unwrap();

    let condition = id.eq(1).unwrap().and(orders.field("total").unwrap().gt(10).unwrap());
    let expr = Expression::from(condition);
    let rewritten = expr
        .replace(|node| match node {
            Node::Field(f) if *f == id => Some(Expression::from(replacement.clone())),
            _ => None,
        })
        .unwrap();

    let q = builder(SqlDialect::MySql, RenderOptions::default());
    assert_eq!(
        q.render(&rewritten).unwrap(),
        "archive.id = 1 AND orders.total > 10"
    );
    assert_eq!(q.render(&expr).unwrap(), "orders.id = 1 AND orders.total > 10");
}

#[test]
fn test_replace_without_match_is_identity() {
    let orders = Table::new("orders", ["id"]).unwrap();
    let expr = Expression::from(orders.field("id").unwrap().is_null());
    let rewritten = expr.replace(|_| None).unwrap();
    assert_eq!(rewritten, expr);
}

#[test]
fn test_replace_rejects_wrong_family() {
    let orders = Table::new("orders", ["id"]).unwrap();
    let id = orders.field("id").unwrap();
    let expr = Expression::from(id.eq(1).unwrap());
    let err = expr
        .replace(|node| match node {
            Node::Field(Field::Variable(_)) => Some(Expression::from(orders.clone())),
            _ => None,
        })
        .unwrap_err();
    assert!(matches!(err, CubeError::ContractViolation(_)));
}

#[test]
fn test_transformed_flag() {
    let yes = Transformed::Yes(1);
    let no = Transformed::No(2);
    assert!(yes.was_transformed());
    assert!(!no.was_transformed());
    assert_eq!(no.into_inner(), 2);
}
