//! cubeql - typed SQL construction and dialect-aware rendering
//!
//! Queries are built as expression trees through a [`QueryBuilder`] bound to
//! a [`Catalog`], then rendered to SQL for the catalog's dialect.
//!
//! ```
//! use std::sync::Arc;
//! use cubeql::{MetaCatalog, MetaField, MetaTable, QueryBuilder, SqlDialect};
//!
//! let catalog = MetaCatalog::new(SqlDialect::Oracle);
//! catalog.add_table(MetaTable::with_id("t1", "orders")?)?;
//! catalog.add_field(MetaField::with_id("f1", "t1", "id")?)?;
//! let catalog = Arc::new(catalog);
//! catalog.prepare()?;
//!
//! let q = QueryBuilder::new(catalog);
//! let sql = q.select([q.field_by_id("f1")?])?.render()?;
//! assert_eq!(sql, "SELECT orders.id FROM DUAL");
//! # Ok::<(), cubeql::CubeError>(())
//! ```

pub mod catalog;
pub mod dialect;
pub mod error;
pub mod expr;
pub mod keyword;
pub mod model;
pub mod query;
pub mod render;
pub mod types;

pub use catalog::{Catalog, MetaCatalog, MetaField, MetaRelation, MetaTable};
pub use dialect::{DialectVersion, SqlDialect};
pub use error::{CubeError, ErrorCategory, Result};
pub use expr::{Condition, Expression, Field, Operand, Select, Table};
pub use keyword::{Keyword, KeywordCase};
pub use model::QueryModel;
pub use query::QueryBuilder;
pub use render::RenderOptions;
pub use types::Value;
