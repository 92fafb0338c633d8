//! Typed access to the name/value options of one invocation.

use std::collections::BTreeMap;

use toml::{Table, Value};

use crate::domain::FilterError;

/// Options applied to a filter at construction.
///
/// Values keep their TOML types; getters convert and report type mismatches
/// as configuration errors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterArgs {
    values: Table,
}

impl FilterArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_table(values: Table) -> Self {
        Self { values }
    }

    /// Builder-style insert, mostly for tests and programmatic callers.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.values.insert(key.to_string(), value.into());
        self
    }

    pub fn insert(&mut self, key: &str, value: Value) {
        self.values.insert(key.to_string(), value);
    }

    /// Overlay `other` on top of these options.
    pub fn merge(&mut self, other: &FilterArgs) {
        for (k, v) in &other.values {
            self.values.insert(k.clone(), v.clone());
        }
    }

    /// Remove and return an option.
    pub fn take(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    #[cfg(test)]
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn table(&self) -> &Table {
        &self.values
    }

    /// Reject options not listed in `known`.
    pub fn reject_unknown(&self, filter_id: &str, known: &[&str]) -> Result<(), FilterError> {
        let unknown: Vec<&str> = self
            .values
            .keys()
            .map(String::as_str)
            .filter(|k| !known.contains(k))
            .collect();
        if unknown.is_empty() {
            Ok(())
        } else {
            Err(FilterError::config(format!(
                "{}: unknown option(s) {}; expected one of: {}",
                filter_id,
                unknown.join(", "),
                known.join(", ")
            )))
        }
    }

    pub fn get_str(&self, key: &str) -> Result<Option<String>, FilterError> {
        match self.values.get(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(type_error(key, "a string", other)),
        }
    }

    pub fn get_bool(&self, key: &str) -> Result<Option<bool>, FilterError> {
        match self.values.get(key) {
            None => Ok(None),
            Some(Value::Boolean(b)) => Ok(Some(*b)),
            Some(other) => Err(type_error(key, "a boolean", other)),
        }
    }

    pub fn get_int(&self, key: &str) -> Result<Option<i64>, FilterError> {
        match self.values.get(key) {
            None => Ok(None),
            Some(Value::Integer(i)) => Ok(Some(*i)),
            Some(other) => Err(type_error(key, "an integer", other)),
        }
    }

    /// Non-negative integer, converted to `usize`.
    pub fn get_usize(&self, key: &str) -> Result<Option<usize>, FilterError> {
        match self.get_int(key)? {
            None => Ok(None),
            Some(i) => usize::try_from(i)
                .map(Some)
                .map_err(|_| FilterError::config(format!("option '{}' must not be negative", key))),
        }
    }

    pub fn get_int_list(&self, key: &str) -> Result<Option<Vec<i64>>, FilterError> {
        match self.values.get(key) {
            None => Ok(None),
            Some(Value::Array(items)) => items
                .iter()
                .map(|v| match v {
                    Value::Integer(i) => Ok(*i),
                    other => Err(type_error(key, "a list of integers", other)),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Some),
            Some(other) => Err(type_error(key, "a list of integers", other)),
        }
    }

    pub fn get_str_list(&self, key: &str) -> Result<Option<Vec<String>>, FilterError> {
        match self.values.get(key) {
            None => Ok(None),
            Some(Value::Array(items)) => items
                .iter()
                .map(|v| match v {
                    Value::String(s) => Ok(s.clone()),
                    other => Err(type_error(key, "a list of strings", other)),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Some),
            Some(other) => Err(type_error(key, "a list of strings", other)),
        }
    }

    pub fn get_str_map(&self, key: &str) -> Result<Option<BTreeMap<String, String>>, FilterError> {
        match self.values.get(key) {
            None => Ok(None),
            Some(Value::Table(table)) => table
                .iter()
                .map(|(k, v)| match v {
                    Value::String(s) => Ok((k.clone(), s.clone())),
                    other => Err(type_error(key, "a table of strings", other)),
                })
                .collect::<Result<BTreeMap<_, _>, _>>()
                .map(Some),
            Some(other) => Err(type_error(key, "a table of strings", other)),
        }
    }

    /// Raw value access for options with more than one accepted shape.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }
}

fn type_error(key: &str, expected: &str, found: &Value) -> FilterError {
    FilterError::config(format!(
        "option '{}' must be {}, found {}",
        key,
        expected,
        found.type_str()
    ))
}

/// Parse a command-line `KEY=VALUE` pair.
///
/// The value is read as a TOML literal when possible (`true`, `16`,
/// `["a", "b"]`); anything else is taken as a plain string.
pub fn parse_key_value(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", raw))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in '{}'", raw));
    }
    let parsed = toml::from_str::<Table>(&format!("v = {}", value))
        .ok()
        .and_then(|mut t| t.remove("v"))
        .unwrap_or_else(|| Value::String(value.to_string()));
    Ok((key.to_string(), parsed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_getters() {
        let args = FilterArgs::new()
            .with("before", "ab")
            .with("wrap", 4)
            .with("decode", true)
            .with("codes", vec![0i64, 2]);

        assert_eq!(args.get_str("before").unwrap(), Some("ab".to_string()));
        assert_eq!(args.get_usize("wrap").unwrap(), Some(4));
        assert_eq!(args.get_bool("decode").unwrap(), Some(true));
        assert_eq!(args.get_int_list("codes").unwrap(), Some(vec![0, 2]));
        assert_eq!(args.get_str("missing").unwrap(), None);
    }

    #[test]
    fn test_type_mismatch_is_config_error() {
        let args = FilterArgs::new().with("wrap", "lots");
        let err = args.get_int("wrap").unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("wrap"));
    }

    #[test]
    fn test_reject_unknown() {
        let args = FilterArgs::new().with("decode", true).with("wrapp", 3);
        let err = args.reject_unknown("base64", &["decode", "wrap"]).unwrap_err();
        assert!(err.to_string().contains("wrapp"));
        assert!(FilterArgs::new()
            .with("decode", true)
            .reject_unknown("base64", &["decode"])
            .is_ok());
    }

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("decode=true").unwrap(),
            ("decode".to_string(), Value::Boolean(true))
        );
        assert_eq!(
            parse_key_value("wrap=16").unwrap(),
            ("wrap".to_string(), Value::Integer(16))
        );
        assert_eq!(
            parse_key_value("command=tr a-z A-Z").unwrap(),
            ("command".to_string(), Value::String("tr a-z A-Z".to_string()))
        );
        assert_eq!(
            parse_key_value(r#"command=["sort", "-r"]"#).unwrap().1,
            Value::Array(vec![
                Value::String("sort".to_string()),
                Value::String("-r".to_string())
            ])
        );
        assert!(parse_key_value("novalue").is_err());
    }
}
