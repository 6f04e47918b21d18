use std::collections::HashMap;

/// A single row of a dataset
/// Provides a simple interface to access column values without dealing with the storage format
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    pub(crate) values: HashMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Float64(f64),
    Int64(i64),
    Bool(bool),
    Null,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, handy for constructing rows inline
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(column.into(), value.into());
    }

    /// Get the raw value of a column
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values.get(column)
    }

    /// Get a string value from the row
    pub fn get_string(&self, column: &str) -> Option<&str> {
        match self.values.get(column)? {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get a float64 value from the row
    pub fn get_f64(&self, column: &str) -> Option<f64> {
        match self.values.get(column)? {
            Value::Float64(f) => Some(*f),
            _ => None,
        }
    }

    /// Get an int64 value from the row
    pub fn get_i64(&self, column: &str) -> Option<i64> {
        match self.values.get(column)? {
            Value::Int64(i) => Some(*i),
            _ => None,
        }
    }

    /// Get a bool value from the row
    pub fn get_bool(&self, column: &str) -> Option<bool> {
        match self.values.get(column)? {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl Value {
    /// Text form used both for CSV cells and for stratification labels.
    /// Missing values render as the empty string.
    pub fn render(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Int64(i) => i.to_string(),
            Value::Float64(f) => render_float(*f),
            Value::Bool(true) => "True".to_string(),
            Value::Bool(false) => "False".to_string(),
            Value::Null => String::new(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

/// pandas-style float text: integral values keep their decimal point
/// ("1.0"), exponents carry a sign and two digits ("1e+20", "1e-07") and
/// NaN is a missing cell.
fn render_float(f: f64) -> String {
    if f.is_nan() {
        return String::new();
    }
    if f.is_infinite() {
        return if f > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let text = format!("{:?}", f);
    match text.split_once('e') {
        Some((mantissa, exp)) => {
            let (sign, digits) = match exp.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exp),
            };
            format!("{}e{}{:0>2}", mantissa, sign, digits)
        }
        None => text,
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int64(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float64(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_getters() {
        let row = Row::new()
            .with("name", "alice")
            .with("age", 31i64)
            .with("score", 0.5)
            .with("active", true)
            .with("note", Value::Null);

        assert_eq!(row.get_string("name"), Some("alice"));
        assert_eq!(row.get_i64("age"), Some(31));
        assert_eq!(row.get_f64("score"), Some(0.5));
        assert_eq!(row.get_bool("active"), Some(true));
        assert_eq!(row.get_f64("age"), None);
        assert_eq!(row.get("note"), Some(&Value::Null));
        assert_eq!(row.get("missing"), None);
    }

    #[test]
    fn test_render() {
        assert_eq!(Value::Float64(1.0).render(), "1.0");
        assert_eq!(Value::Float64(0.25).render(), "0.25");
        assert_eq!(Value::Float64(1e20).render(), "1e+20");
        assert_eq!(Value::Float64(-2.5e-7).render(), "-2.5e-07");
        assert_eq!(Value::Float64(1.5e300).render(), "1.5e+300");
        assert_eq!(Value::Float64(f64::NAN).render(), "");
        assert_eq!(Value::Float64(f64::NEG_INFINITY).render(), "-inf");
        assert_eq!(Value::Int64(-7).render(), "-7");
        assert_eq!(Value::Bool(false).render(), "False");
        assert_eq!(Value::Null.render(), "");
        assert_eq!(Value::from(None::<i64>), Value::Null);
    }
}
