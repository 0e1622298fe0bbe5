//! Deterministic placeholder allocation for compiled artifacts.

use crate::error::CompileError;
use model::core::value::Value;

/// Placeholder name to literal value, in the order the compiler bound them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamMap {
    entries: Vec<(String, Value)>,
}

impl ParamMap {
    /// Appends a binding. A duplicate name means the binder invariant broke,
    /// which is fatal, not retryable.
    pub fn insert(&mut self, name: String, value: Value) -> Result<(), CompileError> {
        if self.entries.iter().any(|(existing, _)| *existing == name) {
            return Err(CompileError::BindingConflict(name));
        }
        self.entries.push((name, value));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, Value)> {
        self.entries.iter()
    }

    /// Values alone, in execution order, for positional-placeholder targets.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Allocates placeholder names from a per-compilation monotonic counter.
///
/// Names are `{field}_{ordinal}` with the field cleansed to identifier
/// characters. The counter makes a compilation reproducible: compiling the
/// same tree twice yields the same names in the same order.
#[derive(Debug, Default)]
pub struct ParamBinder {
    counter: usize,
    params: ParamMap,
}

impl ParamBinder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, field: &str, value: Value) -> Result<String, CompileError> {
        let name = format!("{}_{}", sanitize(field), self.counter);
        self.counter += 1;
        self.params.insert(name.clone(), value)?;
        Ok(name)
    }

    pub fn into_params(self) -> ParamMap {
        self.params
    }
}

/// Cleanses a field name into placeholder-safe characters; anything outside
/// ASCII alphanumerics and `_` becomes `_` plus its code point.
pub(crate) fn sanitize(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    for c in field.trim().chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            out.push(c);
        } else {
            out.push('_');
            out.push_str(&(c as u32).to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_names() {
        let mut binder = ParamBinder::new();
        assert_eq!(binder.bind("name", Value::from("Ada")).unwrap(), "name_0");
        assert_eq!(binder.bind("age", Value::Int(10)).unwrap(), "age_1");
        assert_eq!(binder.bind("age", Value::Int(20)).unwrap(), "age_2");

        let params = binder.into_params();
        assert_eq!(params.len(), 3);
        assert_eq!(params.get("age_1"), Some(&Value::Int(10)));
        assert_eq!(
            params.names().collect::<Vec<_>>(),
            ["name_0", "age_1", "age_2"]
        );
    }

    #[test]
    fn test_binding_is_deterministic_across_runs() {
        let run = || {
            let mut binder = ParamBinder::new();
            let a = binder.bind("city", Value::from("Salvador")).unwrap();
            let b = binder.bind("city", Value::from("Assis")).unwrap();
            (a, b)
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_sanitize_keeps_identifier_chars() {
        assert_eq!(sanitize("user_name2"), "user_name2");
        assert_eq!(sanitize("address.city"), "address_46city");
        assert_eq!(sanitize(" name "), "name");
    }

    #[test]
    fn test_duplicate_insert_is_a_conflict() {
        let mut params = ParamMap::default();
        params.insert("p_0".into(), Value::Int(1)).unwrap();
        let err = params.insert("p_0".into(), Value::Int(2)).unwrap_err();
        assert_eq!(err, CompileError::BindingConflict("p_0".into()));
    }
}
