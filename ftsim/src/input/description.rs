use failure::Fail;
use std::collections::HashMap;

/// Primitive value handed over by a world-description loader.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    List(Vec<Value>),
    Map(HashMap<String, Value>),
}

pub type Attributes = HashMap<String, Value>;

/// Entries of one top-level group, keyed by a string-encoded integer id.
pub type Group = HashMap<String, Attributes>;

/// The world as described by the loader, one field per recognised
/// top-level group. Missing groups are empty.
#[derive(Clone, Debug, Default)]
pub struct WorldDescription {
    pub simulation: HashMap<String, Value>,
    pub tracks: Group,
    pub stations: Group,
    pub placeables: Group,
    pub switches: Group,
    pub journey_paths: Group,
    pub journeys: Group,
    pub trains: Group,
}

#[derive(Debug, Fail)]
pub enum AttributeError {
    #[fail(display = "missing attribute \"{}\"", _0)]
    Missing(String),
    #[fail(display = "attribute \"{}\" should be {}, found {:?}", key, expected, found)]
    WrongType {
        key: String,
        expected: &'static str,
        found: Value,
    },
}

impl Value {
    pub fn as_int(&self) -> Option<i64> {
        match *self {
            Value::Int(x) => Some(x),
            _ => None,
        }
    }

    /// Integers are accepted where a float is expected.
    pub fn as_float(&self) -> Option<f64> {
        match *self {
            Value::Float(x) => Some(x),
            Value::Int(x) => Some(x as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Value::Bool(x) => Some(x),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match *self {
            Value::Str(ref s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match *self {
            Value::List(ref l) => Some(l),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&HashMap<String, Value>> {
        match *self {
            Value::Map(ref m) => Some(m),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(x: i64) -> Value { Value::Int(x) }
}
impl From<i32> for Value {
    fn from(x: i32) -> Value { Value::Int(x as i64) }
}
impl From<f64> for Value {
    fn from(x: f64) -> Value { Value::Float(x) }
}
impl From<bool> for Value {
    fn from(x: bool) -> Value { Value::Bool(x) }
}
impl<'a> From<&'a str> for Value {
    fn from(x: &'a str) -> Value { Value::Str(x.to_string()) }
}

fn typed<'a, T>(attrs: &'a HashMap<String, Value>,
                key: &str,
                expected: &'static str,
                f: impl Fn(&'a Value) -> Option<T>)
                -> Result<Option<T>, AttributeError> {
    match attrs.get(key) {
        None => Ok(None),
        Some(v) => match f(v) {
            Some(x) => Ok(Some(x)),
            None => Err(AttributeError::WrongType {
                key: key.to_string(),
                expected: expected,
                found: v.clone(),
            }),
        },
    }
}

fn required<T>(key: &str, x: Option<T>) -> Result<T, AttributeError> {
    x.ok_or_else(|| AttributeError::Missing(key.to_string()))
}

pub fn get_int(attrs: &HashMap<String, Value>, key: &str) -> Result<i64, AttributeError> {
    required(key, typed(attrs, key, "an integer", Value::as_int)?)
}

pub fn get_int_or(attrs: &HashMap<String, Value>, key: &str, default: i64)
    -> Result<i64, AttributeError> {
    Ok(typed(attrs, key, "an integer", Value::as_int)?.unwrap_or(default))
}

pub fn get_float(attrs: &HashMap<String, Value>, key: &str) -> Result<f64, AttributeError> {
    required(key, typed(attrs, key, "a number", Value::as_float)?)
}

pub fn get_float_or(attrs: &HashMap<String, Value>, key: &str, default: f64)
    -> Result<f64, AttributeError> {
    Ok(typed(attrs, key, "a number", Value::as_float)?.unwrap_or(default))
}

pub fn get_bool_or(attrs: &HashMap<String, Value>, key: &str, default: bool)
    -> Result<bool, AttributeError> {
    Ok(typed(attrs, key, "a boolean", Value::as_bool)?.unwrap_or(default))
}

pub fn get_str_or<'a>(attrs: &'a HashMap<String, Value>, key: &str, default: &'a str)
    -> Result<&'a str, AttributeError> {
    Ok(typed(attrs, key, "a string", Value::as_str)?.unwrap_or(default))
}

pub fn get_list<'a>(attrs: &'a HashMap<String, Value>, key: &str)
    -> Result<&'a [Value], AttributeError> {
    required(key, typed(attrs, key, "a list", Value::as_list)?)
}

pub fn get_map<'a>(attrs: &'a HashMap<String, Value>, key: &str)
    -> Result<&'a HashMap<String, Value>, AttributeError> {
    required(key, typed(attrs, key, "a map", Value::as_map)?)
}

/// Integer list, e.g. the track ids of a switch leg.
pub fn get_int_list(attrs: &HashMap<String, Value>, key: &str)
    -> Result<Vec<i64>, AttributeError> {
    get_list(attrs, key)?
        .iter()
        .map(|v| v.as_int().ok_or_else(|| AttributeError::WrongType {
            key: key.to_string(),
            expected: "a list of integers",
            found: v.clone(),
        }))
        .collect()
}
