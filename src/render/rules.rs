//! Per-family rendering rules.
//!
//! One entry per root dialect. Branch dialects resolve to their root's
//! entry, so adding a branch needs no change here.

use crate::dialect::SqlDialect;
use crate::error::{CubeError, Result};

/// How a row window is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagingStyle {
    /// `LIMIT n OFFSET m`.
    LimitOffset,
    /// `OFFSET m ROWS FETCH NEXT n ROWS ONLY`.
    OffsetFetch,
}

/// Structural differences between dialect families.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialectRules {
    pub root: SqlDialect,
    /// Table selected from when a select has no source.
    pub placeholder_table: Option<&'static str>,
    /// Whether `AS` precedes a table alias.
    pub table_alias_keyword: bool,
    pub quote_open: char,
    pub quote_close: char,
    pub native_ilike: bool,
    pub index_hints: bool,
    pub join_hints: bool,
    pub median: bool,
    pub nulls_ordering: bool,
    pub paging: PagingStyle,
    /// Whether paging needs an `ORDER BY` to be valid.
    pub paging_requires_order: bool,
    pub except_keyword: &'static str,
    pub explain_keyword: Option<&'static str>,
}

static RULES: [DialectRules; 4] = [
    DialectRules {
        root: SqlDialect::MySql,
        placeholder_table: None,
        table_alias_keyword: true,
        quote_open: '`',
        quote_close: '`',
        native_ilike: false,
        index_hints: true,
        join_hints: false,
        median: false,
        nulls_ordering: false,
        paging: PagingStyle::LimitOffset,
        paging_requires_order: false,
        except_keyword: "except",
        explain_keyword: Some("explain"),
    },
    DialectRules {
        root: SqlDialect::Postgres,
        placeholder_table: None,
        table_alias_keyword: true,
        quote_open: '"',
        quote_close: '"',
        native_ilike: true,
        index_hints: false,
        join_hints: false,
        median: false,
        nulls_ordering: true,
        paging: PagingStyle::LimitOffset,
        paging_requires_order: false,
        except_keyword: "except",
        explain_keyword: Some("explain"),
    },
    DialectRules {
        root: SqlDialect::Oracle,
        placeholder_table: Some("dual"),
        table_alias_keyword: false,
        quote_open: '"',
        quote_close: '"',
        native_ilike: false,
        index_hints: false,
        join_hints: false,
        median: true,
        nulls_ordering: true,
        paging: PagingStyle::OffsetFetch,
        paging_requires_order: false,
        except_keyword: "minus",
        explain_keyword: Some("explain plan for"),
    },
    DialectRules {
        root: SqlDialect::SqlServer,
        placeholder_table: None,
        table_alias_keyword: true,
        quote_open: '[',
        quote_close: ']',
        native_ilike: false,
        index_hints: false,
        join_hints: true,
        median: false,
        nulls_ordering: false,
        paging: PagingStyle::OffsetFetch,
        paging_requires_order: true,
        except_keyword: "except",
        explain_keyword: None,
    },
];

impl DialectRules {
    /// Returns the rules of the dialect's root family.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the root has no entry.
    pub fn of(dialect: SqlDialect) -> Result<&'static DialectRules> {
        let root = dialect.root();
        RULES
            .iter()
            .find(|r| r.root == root)
            .ok_or_else(|| CubeError::not_found("dialect rules", root.name()))
    }

    /// Fails with `UnsupportedOperation` unless `supported` holds.
    pub(crate) fn require(&self, supported: bool, what: &str) -> Result<()> {
        if supported {
            Ok(())
        } else {
            Err(CubeError::UnsupportedOperation(format!(
                "{what} is not supported by {}",
                self.root
            )))
        }
    }

    /// Wraps an identifier in this family's quote characters.
    #[must_use]
    pub fn quote(&self, identifier: &str) -> String {
        let mut quoted = String::with_capacity(identifier.len() + 2);
        quoted.push(self.quote_open);
        for ch in identifier.chars() {
            if ch == self.quote_close {
                quoted.push(ch);
            }
            quoted.push(ch);
        }
        quoted.push(self.quote_close);
        quoted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_root_has_rules() {
        for root in SqlDialect::roots() {
            assert_eq!(DialectRules::of(root).unwrap().root, root);
        }
    }

    #[test]
    fn test_branches_share_root_rules() {
        for dialect in SqlDialect::ALL {
            let rules = DialectRules::of(dialect).unwrap();
            assert_eq!(rules, DialectRules::of(dialect.root()).unwrap());
        }
        assert_eq!(
            DialectRules::of(SqlDialect::Dameng).unwrap().placeholder_table,
            Some("dual")
        );
    }

    #[test]
    fn test_quote_escapes_closing_char() {
        let mysql = DialectRules::of(SqlDialect::MySql).unwrap();
        assert_eq!(mysql.quote("a`b"), "`a``b`");
        let mssql = DialectRules::of(SqlDialect::SqlServer).unwrap();
        assert_eq!(mssql.quote("order"), "[order]");
    }

    #[test]
    fn test_require_reports_root() {
        let pg = DialectRules::of(SqlDialect::GaussDb).unwrap();
        let err = pg.require(pg.median, "median").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unsupported operation: median is not supported by Postgres"
        );
    }
}
