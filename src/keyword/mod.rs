//! SQL keyword vocabulary.
//!
//! A [`Keyword`] is a token the renderer writes in the configured
//! [`KeywordCase`]. The operator enums in [`operators`] each map to a fixed
//! keyword and know how to write themselves into a render context.

mod operators;

pub use operators::{
    Aggregate, CombineOperator, Comparator, IndexHintKind, IndexHintScope, JoinHint, JoinType,
    NullOrdering, Operator, SortOrder,
};

use serde::{Deserialize, Serialize};

use crate::error::{check_not_blank, CubeError, Result};

/// Letter case used when rendering keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum KeywordCase {
    /// Render exactly as written.
    AsIs,
    /// Render in lower case.
    Lower,
    /// Render in upper case.
    #[default]
    Upper,
}

/// A SQL keyword.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Keyword {
    keyword: String,
}

impl Keyword {
    /// Creates a keyword from a token.
    ///
    /// # Errors
    ///
    /// Returns a contract violation if the token is blank.
    pub fn of(keyword: &str) -> Result<Self> {
        check_not_blank(keyword, "keyword")?;
        Ok(Keyword {
            keyword: keyword.to_string(),
        })
    }

    /// Keyword for a token known to be non-blank.
    pub(crate) fn fixed(keyword: &'static str) -> Self {
        Keyword {
            keyword: keyword.to_string(),
        }
    }

    #[must_use]
    pub fn as_is(&self) -> &str {
        &self.keyword
    }

    #[must_use]
    pub fn lower(&self) -> String {
        self.keyword.to_lowercase()
    }

    #[must_use]
    pub fn upper(&self) -> String {
        self.keyword.to_uppercase()
    }

    /// Renders the keyword in the requested case.
    #[must_use]
    pub fn render(&self, case: KeywordCase) -> String {
        match case {
            KeywordCase::AsIs => self.keyword.clone(),
            KeywordCase::Lower => self.lower(),
            KeywordCase::Upper => self.upper(),
        }
    }
}

/// Tokens the renderer itself emits, outside the operator enums.
const RESERVED: &[&str] = &[
    "select", "distinct", "from", "where", "having", "group by", "order by", "as", "on", "and",
    "or", "not", "join", "limit", "offset", "rows", "fetch next", "only", "explain",
    "explain plan for", "dual", "index", "for", "null", "case", "when", "then", "else", "end",
];

/// Resolves a token against the reserved vocabulary, ignoring case.
///
/// # Errors
///
/// Returns `NotFound` if the token is not part of the vocabulary.
pub fn lookup(token: &str) -> Result<Keyword> {
    let wanted = check_not_blank(token, "keyword")?.trim().to_lowercase();
    let known = RESERVED.iter().copied().chain(operators::vocabulary());
    known
        .into_iter()
        .find(|k| *k == wanted)
        .map(Keyword::fixed)
        .ok_or_else(|| CubeError::not_found("keyword", token))
}
