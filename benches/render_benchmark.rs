//! Rendering benchmarks.
//!
//! Benchmarks:
//! - Wide projection over one table
//! - Chained joins of increasing depth
//! - Catalog preparation

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use cubeql::{MetaCatalog, MetaField, MetaTable, QueryBuilder, SqlDialect, Table};

/// Helper: catalog with `tables` tables of `columns` columns each.
fn setup_catalog(tables: usize, columns: usize) -> Arc<MetaCatalog> {
    let catalog = MetaCatalog::new(SqlDialect::Postgres);
    for t in 0..tables {
        let table_id = format!("t{t}");
        catalog
            .add_table(MetaTable::with_id(&table_id, &format!("table_{t}")).unwrap())
            .unwrap();
        for c in 0..columns {
            catalog
                .add_field(
                    MetaField::with_id(&format!("{table_id}.c{c}"), &table_id, &format!("col_{c}"))
                        .unwrap(),
                )
                .unwrap();
        }
    }
    Arc::new(catalog)
}

fn bench_wide_projection(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_wide_projection");

    for size in [10, 100, 1000].iter() {
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let catalog = setup_catalog(1, size);
            catalog.prepare().unwrap();
            let q = QueryBuilder::new(catalog);
            let table = q.table_by_id("t0").unwrap();
            let select = q.select(table.fields()).unwrap().from(table).unwrap();
            b.iter(|| black_box(select.render().unwrap()));
        });
    }
    group.finish();
}

fn bench_join_depth(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_join_depth");

    for depth in [2, 8, 32].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(depth), depth, |b, &depth| {
            let q = QueryBuilder::new(Arc::new(MetaCatalog::new(SqlDialect::MySql)));
            let mut join = Table::new("t0", ["id", "next_id"]).unwrap();
            for i in 1..depth {
                let next = Table::new(&format!("t{i}"), ["id", "next_id"]).unwrap();
                let on = join
                    .field("next_id")
                    .unwrap()
                    .eq(next.field("id").unwrap())
                    .unwrap();
                join = join.inner_join(next, on);
            }
            let select = q.select([join.asterisk()]).unwrap().from(join).unwrap();
            b.iter(|| black_box(select.render().unwrap()));
        });
    }
    group.finish();
}

fn bench_prepare(c: &mut Criterion) {
    c.bench_function("catalog_prepare_50x20", |b| {
        b.iter_batched(
            || setup_catalog(50, 20),
            |catalog| catalog.prepare().unwrap(),
            criterion::BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, bench_wide_projection, bench_join_depth, bench_prepare);
criterion_main!(benches);
