//! Dialect differences between the SQL-string targets.

/// Syntax knobs that vary between SQL-like grammars. The statement shape
/// itself lives in the compiler; a dialect only decides quoting,
/// placeholder rendering and which clauses exist at all.
pub trait SqlDialect: Send + Sync {
    fn target(&self) -> &'static str;

    /// Wraps an identifier (table or column name) for the dialect.
    fn quote_identifier(&self, ident: &str) -> String;

    /// Renders the placeholder text for a bound parameter name.
    fn placeholder(&self, name: &str) -> String;

    /// Whether the dialect has a native BETWEEN primitive; without one the
    /// compiler lowers to a `>= AND <=` conjunction.
    fn supports_between(&self) -> bool;

    /// Whether the dialect can skip leading rows with OFFSET.
    fn supports_offset(&self) -> bool;
}

/// Couchbase-style query language: backtick quoting, named `$` parameters.
#[derive(Debug, Clone, Default)]
pub struct N1ql;

impl SqlDialect for N1ql {
    fn target(&self) -> &'static str {
        "n1ql"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        format!("`{ident}`")
    }

    fn placeholder(&self, name: &str) -> String {
        format!("${name}")
    }

    fn supports_between(&self) -> bool {
        true
    }

    fn supports_offset(&self) -> bool {
        true
    }
}

/// Cassandra-style query language: double-quote quoting, positional `?`
/// parameters, no BETWEEN, no OFFSET (paging happens via paging state).
#[derive(Debug, Clone, Default)]
pub struct Cql;

impl SqlDialect for Cql {
    fn target(&self) -> &'static str {
        "cql"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        format!(r#""{ident}""#)
    }

    fn placeholder(&self, _name: &str) -> String {
        "?".into()
    }

    fn supports_between(&self) -> bool {
        false
    }

    fn supports_offset(&self) -> bool {
        false
    }
}
