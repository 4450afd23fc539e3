//! Target database dialects
//!
//! A dialect selects per-mode template overrides and the identifier quote
//! character. Unknown dialect names fall back to [`Dialect::Generic`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// ANSI-ish default template set
    #[default]
    Generic,
    MySql,
    Postgres,
    Sqlite,
    Mssql,
    Oracle,
}

impl Dialect {
    pub fn name(self) -> &'static str {
        match self {
            Dialect::Generic => "generic",
            Dialect::MySql => "mysql",
            Dialect::Postgres => "postgres",
            Dialect::Sqlite => "sqlite",
            Dialect::Mssql => "mssql",
            Dialect::Oracle => "oracle",
        }
    }

    /// Resolve a dialect by name or driver alias, falling back to `Generic`
    pub fn from_name(name: &str) -> Dialect {
        match name.trim().to_ascii_lowercase().as_str() {
            "mysql" | "mariadb" => Dialect::MySql,
            "postgres" | "postgresql" | "pgsql" | "pg" => Dialect::Postgres,
            "sqlite" | "sqlite3" => Dialect::Sqlite,
            "mssql" | "sqlsrv" | "sqlserver" => Dialect::Mssql,
            "oracle" | "oci" => Dialect::Oracle,
            other => {
                log::debug!("Unknown dialect '{}', using generic templates", other);
                Dialect::Generic
            }
        }
    }

    /// Character used to quote identifiers
    pub fn identifier_quote(self) -> char {
        match self {
            Dialect::MySql => '`',
            _ => '"',
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dialect {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Dialect::from_name(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases() {
        assert_eq!(Dialect::from_name("MariaDB"), Dialect::MySql);
        assert_eq!(Dialect::from_name("pgsql"), Dialect::Postgres);
        assert_eq!(Dialect::from_name("sqlsrv"), Dialect::Mssql);
    }

    #[test]
    fn test_unknown_falls_back_to_generic() {
        assert_eq!(Dialect::from_name("firebird"), Dialect::Generic);
        assert_eq!("".parse::<Dialect>().unwrap(), Dialect::Generic);
    }

    #[test]
    fn test_identifier_quote() {
        assert_eq!(Dialect::MySql.identifier_quote(), '`');
        assert_eq!(Dialect::Postgres.identifier_quote(), '"');
    }

    #[test]
    fn test_serde_names() {
        let dialect: Dialect = serde_json::from_str(r#""mysql""#).unwrap();
        assert_eq!(dialect, Dialect::MySql);
        assert_eq!(serde_json::to_string(&Dialect::Mssql).unwrap(), r#""mssql""#);
    }
}
