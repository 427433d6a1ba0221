//! End-to-end tests: catalog loading, binding, query construction and
//! rendering across dialect families.

use std::sync::Arc;

use cubeql::{Catalog, CubeError, Field, MetaCatalog, QueryBuilder, Select, SqlDialect};

const SHOP: &str = r#"{
    "dialect": "MySql",
    "version": {"major": 8, "minor": 0},
    "tables": [
        {"id": "c", "name": "customers"},
        {"id": "o", "name": "orders"},
        {"id": "l", "name": "lines", "description": "order lines"}
    ],
    "fields": [
        {"id": "c.id", "tableId": "c", "name": "id"},
        {"id": "c.name", "tableId": "c", "name": "name"},
        {"id": "o.id", "tableId": "o", "name": "id"},
        {"id": "o.customer", "tableId": "o", "name": "customer_id"},
        {"id": "o.total", "tableId": "o", "name": "total"},
        {"id": "l.order", "tableId": "l", "name": "order_id"}
    ],
    "relations": [
        {"id": "o-c", "name": "placed_by", "lhsId": "o", "rhsId": "c"},
        {"id": "l-o", "lhsId": "l", "rhsId": "o"}
    ]
}"#;

fn shop(dialect: Option<SqlDialect>) -> Arc<MetaCatalog> {
    let json = match dialect {
        Some(d) => SHOP.replacen("\"MySql\"", &format!("\"{d:?}\""), 1),
        None => SHOP.to_string(),
    };
    let catalog = Arc::new(MetaCatalog::from_json(&json).expect("parse catalog"));
    catalog.prepare().expect("prepare catalog");
    catalog
}

/// Revenue per customer, built entirely from catalog descriptors.
fn revenue_query(q: &QueryBuilder) -> cubeql::Result<Select> {
    let orders = q.table("orders")?.with_alias("o")?;
    let customers = q.table("customers")?;
    let name = customers.field("name")?;
    let total = orders.field("total")?;
    let on = orders.field("customer_id")?.eq(customers.field("id")?)?;

    Ok(q
        .select([Field::from(name.clone()), Field::from(total.sum().with_alias("revenue")?)])?
        .from(orders.inner_join(customers, on))?
        .where_(total.gt(0)?)
        .group_by([name.clone()])
        .having(Field::from(total.sum()).gt(1000)?)
        .order_by([name.asc()])
        .page_by(3, 10))
}

// =============================================================================
// Catalog loading
// =============================================================================

#[test]
fn test_catalog_from_json() {
    let catalog = shop(None);
    assert_eq!(catalog.table_count(), 3);
    assert_eq!(catalog.field_count(), 6);
    assert_eq!(catalog.version().to_string(), "8.0");
    assert_eq!(catalog.relation_by_id("o-c").unwrap().name(), "placed_by");
    assert_eq!(catalog.relation_between("o", "c").unwrap().rhs().unwrap().name(), "customers");
    assert!(catalog.tables().iter().all(|t| t.is_prepared()));
}

#[test]
fn test_join_path_through_relations() {
    let catalog = shop(None);
    let path: Vec<String> = catalog
        .shortest_path("l", "c")
        .unwrap()
        .iter()
        .map(|t| t.name().to_string())
        .collect();
    assert_eq!(path, vec!["lines", "orders", "customers"]);
    assert!(catalog.shortest_path("c", "l").is_err());
}

#[test]
fn test_snapshot_restores_queries() {
    let catalog = shop(None);
    let bytes = catalog.serialize().unwrap();
    let restored = Arc::new(MetaCatalog::deserialize(&bytes).unwrap());

    let q = QueryBuilder::new(Arc::clone(&restored));
    assert!(matches!(q.field_by_id("o.total"), Err(CubeError::InvalidState(_))));
    restored.prepare().unwrap();
    let sql = q.select([q.field_by_id("o.total").unwrap()]).unwrap().render().unwrap();
    assert_eq!(sql, "SELECT orders.total");
}

// =============================================================================
// Rendering per family
// =============================================================================

#[test]
fn test_revenue_query_mysql() {
    let q = QueryBuilder::new(shop(Some(SqlDialect::MariaDb)));
    let sql = revenue_query(&q).unwrap().render().unwrap();
    assert_eq!(
        sql,
        "SELECT customers.name, SUM(o.total) AS revenue \
         FROM orders AS o INNER JOIN customers ON o.customer_id = customers.id \
         WHERE o.total > 0 GROUP BY customers.name HAVING SUM(o.total) > 1000 \
         ORDER BY customers.name ASC LIMIT 10 OFFSET 20"
    );
}

#[test]
fn test_revenue_query_oracle() {
    let q = QueryBuilder::new(shop(Some(SqlDialect::Oracle)));
    let sql = revenue_query(&q).unwrap().render().unwrap();
    assert_eq!(
        sql,
        "SELECT customers.name, SUM(o.total) AS revenue \
         FROM orders o INNER JOIN customers ON o.customer_id = customers.id \
         WHERE o.total > 0 GROUP BY customers.name HAVING SUM(o.total) > 1000 \
         ORDER BY customers.name ASC OFFSET 20 ROWS FETCH NEXT 10 ROWS ONLY"
    );
}

#[test]
fn test_subquery_filter_postgres() {
    let q = QueryBuilder::new(shop(Some(SqlDialect::Postgres)));
    let orders = q.table("orders").unwrap();
    let customers = q.table("customers").unwrap();

    let big_spenders = q
        .select([orders.field("customer_id").unwrap()])
        .unwrap()
        .from(orders.clone())
        .unwrap()
        .where_(orders.field("total").unwrap().ge(500).unwrap());
    let sql = q
        .select([customers.field("name").unwrap()])
        .unwrap()
        .from(customers.clone())
        .unwrap()
        .where_(customers.field("id").unwrap().in_select(big_spenders).unwrap())
        .render()
        .unwrap();
    assert_eq!(
        sql,
        "SELECT customers.name FROM customers WHERE customers.id IN \
         (SELECT orders.customer_id FROM orders WHERE orders.total >= 500)"
    );
}

#[test]
fn test_table_alias_reaches_descriptor_fields() {
    let catalog = shop(Some(SqlDialect::Postgres));
    let q = QueryBuilder::new(Arc::clone(&catalog));
    catalog.table_by_id("c").unwrap().set_alias("cu").unwrap();
    let sql = q
        .select([q.field_by_id("c.name").unwrap()])
        .unwrap()
        .from(q.table_by_id("c").unwrap())
        .unwrap()
        .render()
        .unwrap();
    assert_eq!(sql, "SELECT cu.name FROM customers AS cu");
}

// =============================================================================
// Properties
// =============================================================================

mod proptest_properties {
    use proptest::prelude::*;

    use cubeql::{Catalog, MetaCatalog, MetaTable, QueryBuilder, SqlDialect, Table};
    use std::collections::HashSet;
    use std::sync::Arc;

    fn columns(prefix: &str, n: usize) -> Vec<String> {
        (0..n).map(|i| format!("{prefix}{i}")).collect()
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// Property: a join without name collisions exposes n + m fields.
        #[test]
        fn test_join_field_union(n in 1usize..8, m in 1usize..8) {
            let a = Table::new("a", columns("a", n)).unwrap();
            let b = Table::new("b", columns("b", m)).unwrap();
            let on = a.field("a0").unwrap().eq(b.field("b0").unwrap()).unwrap();
            let join = a.left_join(b, on);
            prop_assert_eq!(join.field_count(), n + m);
            prop_assert_eq!(join.fields().len(), n + m);
        }

        /// Property: pages are one-based and a non-positive size is ignored.
        #[test]
        fn test_page_by_window(page in -5i64..50, size in -5i64..100) {
            let catalog = Arc::new(MetaCatalog::new(SqlDialect::MySql));
            let q = QueryBuilder::new(catalog);
            let select = q.select([q.int_val(1)]).unwrap().page_by(page, size);
            match select.paging() {
                None => prop_assert!(size <= 0),
                Some(paging) => {
                    prop_assert!(size > 0);
                    prop_assert_eq!(paging.limit, size as u64);
                    prop_assert_eq!(paging.skip, ((page.max(1) - 1) * size) as u64);
                }
            }
        }

        /// Property: the child's entry wins for every shared id.
        #[test]
        fn test_child_precedence(
            parent_ids in proptest::collection::hash_set(0u8..20, 0..10),
            child_ids in proptest::collection::hash_set(0u8..20, 0..10),
        ) {
            let parent = MetaCatalog::new(SqlDialect::Postgres);
            for id in &parent_ids {
                parent.add_table(MetaTable::with_id(&id.to_string(), "parent").unwrap()).unwrap();
            }
            let child = MetaCatalog::child_of(Arc::new(parent));
            for id in &child_ids {
                child.add_table(MetaTable::with_id(&id.to_string(), "child").unwrap()).unwrap();
            }

            let union: HashSet<u8> = parent_ids.union(&child_ids).copied().collect();
            prop_assert_eq!(child.tables().len(), union.len());
            for id in &child_ids {
                let table = child.table_by_id(&id.to_string()).unwrap();
                prop_assert_eq!(table.name(), "child");
            }
        }

        /// Property: rendering is a pure function of the tree and dialect.
        #[test]
        fn test_render_deterministic(
            value in any::<i64>(),
            dialect in proptest::sample::select(SqlDialect::ALL.to_vec()),
        ) {
            let q = QueryBuilder::new(Arc::new(MetaCatalog::new(dialect)));
            let t = Table::new("t", ["c"]).unwrap();
            let select = q
                .select([t.field("c").unwrap()])
                .unwrap()
                .from(t.clone())
                .unwrap()
                .where_(t.field("c").unwrap().eq(value).unwrap());
            let first = select.render().unwrap();
            prop_assert_eq!(&first, &select.render().unwrap());
            let expected_suffix = format!("= {value}");
            prop_assert!(first.ends_with(&expected_suffix));
        }
    }
}
