//! SQL rendering.
//!
//! A render pass creates a [`RenderContext`] from the [`QueryContext`] a
//! select was built with and walks the tree with a [`SqlBuilder`]. The
//! builder consults the [`DialectRules`] of the catalog's root dialect for
//! every structural choice and fails with `UnsupportedOperation` rather
//! than emitting something the dialect would misread.

mod builder;
mod context;
mod options;
mod rules;

pub use builder::SqlBuilder;
pub use context::{QueryContext, RenderContext};
pub use options::RenderOptions;
pub use rules::{DialectRules, PagingStyle};

use std::sync::Arc;

use tracing::debug;

use crate::error::Result;
use crate::expr::Node;

/// Renders `node` with a fresh context derived from `query`.
///
/// # Errors
///
/// Propagates any error raised by the builder.
pub fn render_node(query: &Arc<QueryContext>, node: Node<'_>) -> Result<String> {
    let mut ctx = RenderContext::new(Arc::clone(query))?;
    node.accept(&mut ctx.create_sql_builder())?;
    let sql = ctx.into_sql();
    debug!(
        dialect = %query.dialect(),
        node = node.kind(),
        len = sql.len(),
        "rendered sql"
    );
    Ok(sql)
}
