//! SQL dialect identity.
//!
//! Every dialect either is a root (a family head such as Postgres) or
//! derives from one. Rendering decisions only ever look at the root, so a
//! new branch dialect needs no rendering code.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CubeError, Result};

/// Supported SQL dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SqlDialect {
    MySql,
    MariaDb,
    Postgres,
    GreenPlum,
    GaussDb,
    Oracle,
    Dameng,
    SqlServer,
}

impl SqlDialect {
    /// All dialects in declaration order.
    pub const ALL: [SqlDialect; 8] = [
        SqlDialect::MySql,
        SqlDialect::MariaDb,
        SqlDialect::Postgres,
        SqlDialect::GreenPlum,
        SqlDialect::GaussDb,
        SqlDialect::Oracle,
        SqlDialect::Dameng,
        SqlDialect::SqlServer,
    ];

    /// Returns the display name of the dialect.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            SqlDialect::MySql => "MySql",
            SqlDialect::MariaDb => "MariaDB",
            SqlDialect::Postgres => "Postgres",
            SqlDialect::GreenPlum => "GreenPlum",
            SqlDialect::GaussDb => "GaussDB",
            SqlDialect::Oracle => "Oracle",
            SqlDialect::Dameng => "DM",
            SqlDialect::SqlServer => "SqlServer",
        }
    }

    /// Returns the dialect this one directly derives from, if any.
    #[must_use]
    pub fn parent(&self) -> Option<SqlDialect> {
        match self {
            SqlDialect::MariaDb => Some(SqlDialect::MySql),
            SqlDialect::GreenPlum | SqlDialect::GaussDb => Some(SqlDialect::Postgres),
            SqlDialect::Dameng => Some(SqlDialect::Oracle),
            SqlDialect::MySql | SqlDialect::Postgres | SqlDialect::Oracle | SqlDialect::SqlServer => {
                None
            }
        }
    }

    /// Returns the family head of this dialect.
    #[must_use]
    pub fn root(&self) -> SqlDialect {
        let mut dialect = *self;
        while let Some(parent) = dialect.parent() {
            dialect = parent;
        }
        dialect
    }

    /// Returns true if this dialect is a family head.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent().is_none()
    }

    /// Returns the other dialects sharing this dialect as their root.
    #[must_use]
    pub fn branches(&self) -> Vec<SqlDialect> {
        Self::ALL
            .into_iter()
            .filter(|d| d != self && d.root() == *self)
            .collect()
    }

    /// Returns all root dialects in declaration order.
    #[must_use]
    pub fn roots() -> Vec<SqlDialect> {
        Self::ALL.into_iter().filter(SqlDialect::is_root).collect()
    }

    /// Returns true if both dialects belong to the same family.
    #[must_use]
    pub fn is_compatible_with(&self, other: SqlDialect) -> bool {
        self.root() == other.root()
    }

    /// Resolves a dialect by name, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no dialect carries that name.
    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|d| {
                d.name().eq_ignore_ascii_case(name) || format!("{d:?}").eq_ignore_ascii_case(name)
            })
            .ok_or_else(|| CubeError::not_found("dialect", name))
    }
}

impl fmt::Display for SqlDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SqlDialect {
    type Err = CubeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s)
    }
}

/// Version of the database server a catalog targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DialectVersion {
    pub major: u32,
    #[serde(default)]
    pub minor: u32,
}

impl DialectVersion {
    /// Creates a new version.
    #[must_use]
    pub fn new(major: u32, minor: u32) -> Self {
        DialectVersion { major, minor }
    }
}

impl fmt::Display for DialectVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for DialectVersion {
    type Err = CubeError;

    /// Parses `"12"` or `"12.1"`.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || CubeError::ContractViolation(format!("invalid dialect version '{s}'"));
        let mut parts = s.trim().splitn(2, '.');
        let major = parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(invalid)?;
        let minor = match parts.next() {
            Some(p) => p.parse().map_err(|_| invalid())?,
            None => 0,
        };
        Ok(DialectVersion { major, minor })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roots_in_declaration_order() {
        assert_eq!(
            SqlDialect::roots(),
            vec![
                SqlDialect::MySql,
                SqlDialect::Postgres,
                SqlDialect::Oracle,
                SqlDialect::SqlServer
            ]
        );
    }

    #[test]
    fn test_postgres_family() {
        assert!(SqlDialect::Postgres.is_root());
        assert_eq!(SqlDialect::Postgres.root(), SqlDialect::Postgres);
        assert_eq!(
            SqlDialect::Postgres.branches(),
            vec![SqlDialect::GreenPlum, SqlDialect::GaussDb]
        );
        assert_eq!(SqlDialect::GreenPlum.root(), SqlDialect::Postgres);
        assert!(SqlDialect::GaussDb.is_compatible_with(SqlDialect::GreenPlum));
    }

    #[test]
    fn test_branch_has_no_branches() {
        assert!(SqlDialect::Dameng.branches().is_empty());
        assert!(SqlDialect::SqlServer.branches().is_empty());
    }

    #[test]
    fn test_from_name() {
        assert_eq!(SqlDialect::from_name("dm").unwrap(), SqlDialect::Dameng);
        assert_eq!(SqlDialect::from_name("POSTGRES").unwrap(), SqlDialect::Postgres);
        assert_eq!(SqlDialect::from_name("sqlserver").unwrap(), SqlDialect::SqlServer);
        assert!(matches!(
            SqlDialect::from_name("db2"),
            Err(CubeError::NotFound { .. })
        ));
    }

    #[test]
    fn test_version_parse() {
        assert_eq!("12".parse::<DialectVersion>().unwrap(), DialectVersion::new(12, 0));
        assert_eq!("8.4".parse::<DialectVersion>().unwrap(), DialectVersion::new(8, 4));
        assert!("x.1".parse::<DialectVersion>().is_err());
        assert_eq!(DialectVersion::new(19, 3).to_string(), "19.3");
    }
}
