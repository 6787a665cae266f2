use std::collections::HashMap;

use crate::input::description::Value;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SignallingMode {
    FixedBlock,
    VariableBlock,
}

/// Simulation-wide key/value settings. Starts out with the defaults
/// below and is overridden by the `simulation` group of a description.
#[derive(Clone, Debug)]
pub struct Configuration {
    values: HashMap<String, Value>,
}

impl Default for Configuration {
    fn default() -> Configuration {
        let mut c = Configuration { values: HashMap::new() };
        c.add_configuration("mode", "variable_block");
        c.add_configuration("gsm_failure_rate", 0);
        c.add_configuration("ferromone_distance", 5);
        c.add_configuration("seed", 0);
        c
    }
}

impl Configuration {
    pub fn add_configuration<V: Into<Value>>(&mut self, key: &str, value: V) {
        self.values.insert(key.to_string(), value.into());
    }

    pub fn is_configuration<V: Into<Value>>(&self, key: &str, value: V) -> bool {
        self.values.get(key) == Some(&value.into())
    }

    pub fn get_configuration(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.values.get(key).and_then(Value::as_int)
    }

    pub fn get_float(&self, key: &str) -> Option<f64> {
        self.values.get(key).and_then(Value::as_float)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    pub fn signalling_mode(&self) -> SignallingMode {
        if self.is_configuration("mode", "fixed_block") {
            SignallingMode::FixedBlock
        } else {
            SignallingMode::VariableBlock
        }
    }
}
