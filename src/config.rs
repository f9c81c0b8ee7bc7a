use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::coordinates::Transformation;

/// Axis information used in place of a missing neighbouring event.
///
/// Transitions at either end of a timeline only have one adjacent event. When the reference of
/// one of their relative properties is computed, the missing event is replaced by a point at the
/// start (`time = 0`) or at the end (`time = time_end`) of the time axis, with concentration
/// `concentration_end`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineContext {
    pub time_end: f64,
    pub concentration_end: f64,
}

impl TimelineContext {
    pub fn new(time_end: f64, concentration_end: f64) -> Self {
        Self { time_end, concentration_end }
    }

    /// Context of a canvas: the end of the visible time axis and half of the visible
    /// concentration range.
    pub fn from_transformation(coord: &Transformation) -> Self {
        Self::new(coord.time_bound(), coord.concentration_bound() / 2.0)
    }
}

impl Default for TimelineContext {
    fn default() -> Self {
        Self {
            time_end: 1.0,
            concentration_end: 1.0,
        }
    }
}

/// Operators and variable names used when synthesizing a formula.
///
/// The defaults produce formulas such as `(t=5)&([X]=10)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormulaSyntax {
    pub left_parenthesis: String,
    pub right_parenthesis: String,
    pub and: String,
    pub or: String,
    pub not: String,
    pub next: String,
    pub until: String,
    pub future: String,
    pub globally: String,
    pub equals: String,
    pub lesser: String,
    pub greater: String,
    pub time: String,
    pub concentration: String,
    pub derivative: String,
}

impl Default for FormulaSyntax {
    fn default() -> Self {
        Self {
            left_parenthesis: "(".to_string(),
            right_parenthesis: ")".to_string(),
            and: "&".to_string(),
            or: "|".to_string(),
            not: "!".to_string(),
            next: "X".to_string(),
            until: "U".to_string(),
            future: "F".to_string(),
            globally: "G".to_string(),
            equals: "=".to_string(),
            lesser: "<".to_string(),
            greater: ">".to_string(),
            time: "t".to_string(),
            concentration: "[X]".to_string(),
            derivative: "d[X]".to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed configuration at line {line}, column {column}: {source}")]
    Malformed {
        line: usize,
        column: usize,
        source: serde_json::Error,
    },
}

impl From<serde_json::Error> for ConfigError {
    fn from(source: serde_json::Error) -> Self {
        Self::Malformed {
            line: source.line(),
            column: source.column(),
            source,
        }
    }
}

/// Settings of an editing session. Every field is optional in the serialized form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub syntax: FormulaSyntax,
    pub context: TimelineContext,
}

impl Config {
    pub fn from_json(input: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(input)?)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let input = fs::read_to_string(path)?;
        Self::from_json(&input)
    }
}

#[cfg(test)]
mod tests {
    use super::{Config, ConfigError, FormulaSyntax, TimelineContext};

    #[test]
    fn partial_config() -> Result<(), ConfigError> {
        let config = Config::from_json(r#"{ "syntax": { "and": " && " }, "context": { "time_end": 20.0 } }"#)?;

        assert_eq!(config.syntax.and, " && ");
        assert_eq!(config.syntax.or, FormulaSyntax::default().or);
        assert_eq!(config.context.time_end, 20.0);
        assert_eq!(config.context.concentration_end, TimelineContext::default().concentration_end);
        Ok(())
    }

    #[test]
    fn empty_config() -> Result<(), ConfigError> {
        assert_eq!(Config::from_json("{}")?, Config::default());
        Ok(())
    }

    #[test]
    fn malformed_config() {
        let result = Config::from_json("{\n  \"syntax\": 3\n}");
        assert!(matches!(result, Err(ConfigError::Malformed { line: 2, .. })));
    }
}
