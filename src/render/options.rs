//! Rendering options.

use serde::{Deserialize, Serialize};

use crate::keyword::KeywordCase;

/// Configuration for SQL rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Letter case of keywords.
    pub keyword_case: KeywordCase,
    /// Whether identifiers are wrapped in the dialect's quote characters.
    pub quote_identifiers: bool,
    /// Whether columns are prefixed with their table name or alias.
    pub qualify_columns: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            keyword_case: KeywordCase::Upper,
            quote_identifiers: false,
            qualify_columns: true,
        }
    }
}

impl RenderOptions {
    /// Creates the default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the keyword case.
    #[must_use]
    pub fn with_keyword_case(mut self, keyword_case: KeywordCase) -> Self {
        self.keyword_case = keyword_case;
        self
    }

    /// Enables or disables identifier quoting.
    #[must_use]
    pub fn with_quote_identifiers(mut self, quote_identifiers: bool) -> Self {
        self.quote_identifiers = quote_identifiers;
        self
    }

    /// Enables or disables column qualification.
    #[must_use]
    pub fn with_qualify_columns(mut self, qualify_columns: bool) -> Self {
        self.qualify_columns = qualify_columns;
        self
    }
}
