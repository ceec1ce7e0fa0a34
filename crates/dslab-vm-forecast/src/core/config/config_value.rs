//! Config values of the form `Name[option=value,...]`.

use std::collections::HashMap;
use std::str::FromStr;

use crate::core::error::ForecastError;

/// Config value consisting of a name and optional options in square brackets,
/// e.g. `FoarDualChannel[channel=product]`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConfigValue {
    pub name: String,
    pub options: HashMap<String, String>,
}

impl ConfigValue {
    /// Returns the option value, if present.
    pub fn option(&self, name: &str) -> Option<&str> {
        self.options.get(name).map(|v| v.as_str())
    }

    /// Fails if the value has options not listed in `known`.
    pub fn check_options(&self, known: &[&str]) -> Result<(), ForecastError> {
        match self.options.keys().find(|k| !known.contains(&k.as_str())) {
            Some(unknown) => Err(ForecastError::Config(format!(
                "unknown option {} of {}",
                unknown, self.name
            ))),
            None => Ok(()),
        }
    }
}

impl FromStr for ConfigValue {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let malformed = || ForecastError::Config(format!("malformed config value: {}", s));
        let (name, options_str) = match s.split_once('[') {
            Some((name, rest)) => (name.trim(), Some(rest.strip_suffix(']').ok_or_else(malformed)?)),
            None => (s, None),
        };
        if name.is_empty() || name.contains(']') {
            return Err(malformed());
        }
        let mut options = HashMap::new();
        for option in options_str.unwrap_or("").split(',').filter(|o| !o.trim().is_empty()) {
            let (key, value) = option.split_once('=').ok_or_else(malformed)?;
            options.insert(key.trim().to_string(), value.trim().to_string());
        }
        Ok(Self {
            name: name.to_string(),
            options,
        })
    }
}
