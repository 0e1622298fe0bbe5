//! Canonical wildcard-placement tables for the LIKE-family operators.
//!
//! The placement rule is fixed across all targets: STARTS_WITH appends a
//! wildcard, ENDS_WITH prepends one, CONTAINS does both, LIKE passes the
//! caller's pattern through. Only the escaping of characters embedded in
//! the literal differs per grammar family (SQL wildcards vs regex
//! metacharacters).

/// Which LIKE-family operator a pattern is rendered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Like,
    StartsWith,
    EndsWith,
    Contains,
}

/// Renders a pattern for targets speaking SQL LIKE (`%`/`_` wildcards).
pub fn sql_pattern(kind: MatchKind, raw: &str) -> String {
    match kind {
        MatchKind::Like => raw.to_string(),
        MatchKind::StartsWith => format!("{}%", escape_sql(raw)),
        MatchKind::EndsWith => format!("%{}", escape_sql(raw)),
        MatchKind::Contains => format!("%{}%", escape_sql(raw)),
    }
}

/// Renders a pattern for targets speaking anchored regular expressions.
/// LIKE translates its wildcards (`%` to `.*`, `_` to `.`); the derived
/// kinds treat the literal verbatim.
pub fn regex_pattern(kind: MatchKind, raw: &str) -> String {
    match kind {
        MatchKind::Like => {
            let mut out = String::with_capacity(raw.len() + 2);
            out.push('^');
            for c in raw.chars() {
                match c {
                    '%' => out.push_str(".*"),
                    '_' => out.push('.'),
                    c => push_regex_escaped(&mut out, c),
                }
            }
            out.push('$');
            out
        }
        MatchKind::StartsWith => format!("^{}", escape_regex(raw)),
        MatchKind::EndsWith => format!("{}$", escape_regex(raw)),
        MatchKind::Contains => escape_regex(raw),
    }
}

fn escape_sql(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn escape_regex(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        push_regex_escaped(&mut out, c);
    }
    out
}

fn push_regex_escaped(out: &mut String, c: char) {
    if matches!(
        c,
        '.' | '^' | '$' | '*' | '+' | '?' | '(' | ')' | '[' | ']' | '{' | '}' | '|' | '\\'
    ) {
        out.push('\\');
    }
    out.push(c);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcard_placement() {
        assert_eq!(sql_pattern(MatchKind::StartsWith, "Pol"), "Pol%");
        assert_eq!(sql_pattern(MatchKind::EndsWith, "ana"), "%ana");
        assert_eq!(sql_pattern(MatchKind::Contains, "lia"), "%lia%");
        assert_eq!(sql_pattern(MatchKind::Like, "Pol%_a"), "Pol%_a");
    }

    #[test]
    fn test_sql_escaping_of_embedded_wildcards() {
        assert_eq!(sql_pattern(MatchKind::StartsWith, "50%"), "50\\%%");
        assert_eq!(sql_pattern(MatchKind::Contains, "a_b"), "%a\\_b%");
    }

    #[test]
    fn test_regex_anchoring() {
        assert_eq!(regex_pattern(MatchKind::StartsWith, "Pol"), "^Pol");
        assert_eq!(regex_pattern(MatchKind::EndsWith, "ana"), "ana$");
        assert_eq!(regex_pattern(MatchKind::Contains, "lia"), "lia");
    }

    #[test]
    fn test_regex_escaping_of_metacharacters() {
        assert_eq!(regex_pattern(MatchKind::Contains, "a.b"), "a\\.b");
        assert_eq!(regex_pattern(MatchKind::StartsWith, "x(y)"), "^x\\(y\\)");
    }

    #[test]
    fn test_like_to_regex_translation() {
        assert_eq!(regex_pattern(MatchKind::Like, "Pol%"), "^Pol.*$");
        assert_eq!(regex_pattern(MatchKind::Like, "P_liana"), "^P.liana$");
        assert_eq!(regex_pattern(MatchKind::Like, "a.b%"), "^a\\.b.*$");
    }
}
