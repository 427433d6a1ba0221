//! Rendering contexts.

use std::fmt;
use std::sync::Arc;

use crate::catalog::Catalog;
use crate::dialect::SqlDialect;
use crate::error::Result;
use crate::keyword::Keyword;
use crate::model::QueryModel;

use super::options::RenderOptions;
use super::rules::DialectRules;
use super::SqlBuilder;

/// Environment shared by every select a facade creates: one catalog, one
/// option set and an optional query model.
pub struct QueryContext {
    catalog: Arc<dyn Catalog>,
    options: RenderOptions,
    model: Option<QueryModel>,
}

impl QueryContext {
    #[must_use]
    pub fn new(catalog: Arc<dyn Catalog>, options: RenderOptions) -> Self {
        QueryContext {
            catalog,
            options,
            model: None,
        }
    }

    /// Attaches a query model for custom builders.
    #[must_use]
    pub fn with_model(mut self, model: QueryModel) -> Self {
        self.model = Some(model);
        self
    }

    #[must_use]
    pub fn catalog(&self) -> &Arc<dyn Catalog> {
        &self.catalog
    }

    #[must_use]
    pub fn dialect(&self) -> SqlDialect {
        self.catalog.dialect()
    }

    #[must_use]
    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    #[must_use]
    pub fn model(&self) -> Option<&QueryModel> {
        self.model.as_ref()
    }
}

impl fmt::Debug for QueryContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryContext")
            .field("dialect", &self.dialect())
            .field("options", &self.options)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

/// Output accumulator for one render pass.
///
/// A context owns its buffer. Nested groups are rendered into a
/// [`sub_context`](Self::sub_context) that links back to its parent and
/// whose text the caller splices in once the group is complete.
pub struct RenderContext<'p> {
    query: Arc<QueryContext>,
    rules: &'static DialectRules,
    buffer: String,
    parent: Option<&'p RenderContext<'p>>,
}

impl RenderContext<'static> {
    /// Creates a top-level context.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the catalog dialect has no rendering rules.
    pub fn new(query: Arc<QueryContext>) -> Result<Self> {
        let rules = DialectRules::of(query.dialect())?;
        Ok(RenderContext {
            query,
            rules,
            buffer: String::new(),
            parent: None,
        })
    }
}

impl<'p> RenderContext<'p> {
    /// Creates an empty child context linked to this one.
    #[must_use]
    pub fn sub_context(&self) -> RenderContext<'_> {
        RenderContext {
            query: Arc::clone(&self.query),
            rules: self.rules,
            buffer: String::new(),
            parent: Some(self),
        }
    }

    /// Returns a builder writing into this context.
    pub fn create_sql_builder(&mut self) -> SqlBuilder<'_, 'p> {
        SqlBuilder::new(self)
    }

    #[must_use]
    pub fn parent(&self) -> Option<&RenderContext<'p>> {
        self.parent
    }

    /// Nesting level; zero for a top-level context.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.parent.map_or(0, |p| p.depth() + 1)
    }

    #[must_use]
    pub fn query(&self) -> &Arc<QueryContext> {
        &self.query
    }

    #[must_use]
    pub fn catalog(&self) -> &Arc<dyn Catalog> {
        self.query.catalog()
    }

    #[must_use]
    pub fn dialect(&self) -> SqlDialect {
        self.query.dialect()
    }

    #[must_use]
    pub fn rules(&self) -> &'static DialectRules {
        self.rules
    }

    #[must_use]
    pub fn options(&self) -> &RenderOptions {
        self.query.options()
    }

    #[must_use]
    pub fn model(&self) -> Option<&QueryModel> {
        self.query.model()
    }

    fn needs_space(&self, token: &str) -> bool {
        !self.buffer.is_empty()
            && !self.buffer.ends_with(char::is_whitespace)
            && !token.starts_with(char::is_whitespace)
    }

    /// Appends a token, separated from the buffer by a single space.
    pub fn write_sql(&mut self, sql: &str) -> &mut Self {
        if sql.is_empty() {
            return self;
        }
        if self.needs_space(sql) {
            self.buffer.push(' ');
        }
        self.buffer.push_str(sql);
        self
    }

    /// Appends a keyword in the configured case.
    pub fn write_keyword(&mut self, keyword: &Keyword) -> &mut Self {
        let text = keyword.render(self.options().keyword_case);
        self.write_sql(&text)
    }

    /// Appends text with no separator.
    pub fn write_raw(&mut self, sql: &str) -> &mut Self {
        self.buffer.push_str(sql);
        self
    }

    /// Returns the identifier, quoted if the options ask for it.
    #[must_use]
    pub fn identifier(&self, identifier: &str) -> String {
        if self.options().quote_identifiers {
            self.rules.quote(identifier)
        } else {
            identifier.to_string()
        }
    }

    /// Appends an identifier token.
    pub fn write_identifier(&mut self, identifier: &str) -> &mut Self {
        let text = self.identifier(identifier);
        self.write_sql(&text)
    }

    /// Text accumulated so far.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.buffer
    }

    #[must_use]
    pub fn into_sql(self) -> String {
        self.buffer
    }
}

impl fmt::Debug for RenderContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderContext")
            .field("dialect", &self.dialect())
            .field("depth", &self.depth())
            .field("buffer", &self.buffer)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MetaCatalog;
    use crate::keyword::KeywordCase;

    fn query(options: RenderOptions) -> Arc<QueryContext> {
        let catalog = Arc::new(MetaCatalog::new(SqlDialect::MySql));
        Arc::new(QueryContext::new(catalog, options))
    }

    #[test]
    fn test_auto_space() {
        let mut ctx = RenderContext::new(query(RenderOptions::default())).unwrap();
        ctx.write_keyword(&Keyword::of("select").unwrap())
            .write_sql("a")
            .write_raw(",")
            .write_sql("b")
            .write_sql(" c")
            .write_raw(" ")
            .write_sql("d");
        assert_eq!(ctx.sql(), "SELECT a, b c d");
    }

    #[test]
    fn test_keyword_case_option() {
        let options = RenderOptions::new().with_keyword_case(KeywordCase::Lower);
        let mut ctx = RenderContext::new(query(options)).unwrap();
        ctx.write_keyword(&Keyword::of("FROM").unwrap());
        assert_eq!(ctx.into_sql(), "from");
    }

    #[test]
    fn test_sub_context_links_parent() {
        let mut ctx = RenderContext::new(query(RenderOptions::default())).unwrap();
        ctx.write_sql("x");
        let inner = {
            let mut sub = ctx.sub_context();
            assert_eq!(sub.depth(), 1);
            assert_eq!(sub.parent().map(RenderContext::sql), Some("x"));
            sub.write_sql("1").write_raw(",").write_sql("2");
            sub.into_sql()
        };
        ctx.write_sql(&format!("({inner})"));
        assert_eq!(ctx.sql(), "x (1, 2)");
    }

    #[test]
    fn test_identifier_quoting() {
        let options = RenderOptions::new().with_quote_identifiers(true);
        let mut ctx = RenderContext::new(query(options)).unwrap();
        ctx.write_identifier("order");
        assert_eq!(ctx.sql(), "`order`");
    }
}
