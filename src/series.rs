//! Time series shown underneath a timeline.
//!
//! A series is read from delimited text, one sample per line. Either every line names its time
//! explicitly ([`SeriesFormat::Delimited`]) or lines hold values only and are spaced by a fixed
//! interval ([`SeriesFormat::Interval`]). Blank lines are skipped.
//!
//! ```rust
//! use ltl_annotator::series::{SeriesFormat, TimeSeries};
//!
//! let series = TimeSeries::parse("0.0, 1.5, 0.1\n1.0, 2.5, 1.0\n", &SeriesFormat::csv()).unwrap();
//!
//! assert_eq!(series.length(), Some(1.0));
//! assert_eq!(series.max_concentration(), Some(2.5));
//! ```

use std::fs;
use std::path::Path;

use nom::character::complete::{char, space0, space1};
use nom::combinator::all_consuming;
use nom::multi::separated_list1;
use nom::number::complete::double;
use nom::sequence::delimited;
use nom::IResult;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::TimelineContext;
use crate::coordinates::Transformation;

#[derive(Debug, Error)]
pub enum SeriesError {
    #[error("Could not read time series: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unintelligible line {line}: {content}")]
    Malformed { line: usize, content: String },

    #[error("Line {line} has no field with index {index}")]
    MissingField { line: usize, index: usize },

    #[error("Negative time on line {line}: [{value}]")]
    NegativeTime { line: usize, value: f64 },

    #[error("Negative concentration on line {line}: [{value}]")]
    NegativeConcentration { line: usize, value: f64 },

    #[error("Time on line {line} precedes the time of the previous sample")]
    Unordered { line: usize },

    #[error("Sampling interval must be positive: [{0}]")]
    InvalidInterval(f64),
}

/// Layout of the lines of a time series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum SeriesFormat {
    /// Fields split by `separator`, indices select the columns.
    Delimited {
        separator: char,
        time: usize,
        concentration: usize,
        derivative: Option<usize>,
    },

    /// Lines holding the concentration and, optionally, the derivative. The n-th sample lies at
    /// `n * interval`.
    Interval { separator: char, interval: f64 },
}

impl SeriesFormat {
    /// Comma separated `time, concentration, derivative` lines.
    pub fn csv() -> Self {
        Self::Delimited {
            separator: ',',
            time: 0,
            concentration: 1,
            derivative: Some(2),
        }
    }

    fn separator(&self) -> char {
        match self {
            Self::Delimited { separator, .. } | Self::Interval { separator, .. } => *separator,
        }
    }
}

impl Default for SeriesFormat {
    fn default() -> Self {
        Self::csv()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    pub time: f64,
    pub concentration: f64,
    pub derivative: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeSeries {
    points: Vec<TimeSeriesPoint>,
}

fn whitespace_fields(input: &str) -> IResult<&str, Vec<f64>> {
    all_consuming(delimited(space0, separated_list1(space1, double), space0))(input)
}

fn separated_fields(separator: char, input: &str) -> IResult<&str, Vec<f64>> {
    all_consuming(delimited(
        space0,
        separated_list1(delimited(space0, char(separator), space0), double),
        space0,
    ))(input)
}

fn fields(separator: char, input: &str) -> IResult<&str, Vec<f64>> {
    if separator.is_whitespace() {
        whitespace_fields(input)
    } else {
        separated_fields(separator, input)
    }
}

fn field(values: &[f64], index: usize, line: usize) -> Result<f64, SeriesError> {
    values
        .get(index)
        .copied()
        .ok_or(SeriesError::MissingField { line, index })
}

impl TimeSeries {
    pub fn new(points: Vec<TimeSeriesPoint>) -> Self {
        Self { points }
    }

    /// Read a series from text laid out as described by `format`. Reported line numbers start
    /// at one.
    pub fn parse(input: &str, format: &SeriesFormat) -> Result<Self, SeriesError> {
        if let SeriesFormat::Interval { interval, .. } = format {
            if interval.is_nan() || *interval <= 0.0 {
                return Err(SeriesError::InvalidInterval(*interval));
            }
        }

        let separator = format.separator();
        let mut points: Vec<TimeSeriesPoint> = Vec::new();

        for (number, content) in input.lines().enumerate() {
            let line = number + 1;

            if content.trim().is_empty() {
                continue;
            }

            let values = match fields(separator, content) {
                Ok((_, values)) if values.iter().all(|value| value.is_finite()) => values,
                _ => {
                    return Err(SeriesError::Malformed {
                        line,
                        content: content.to_string(),
                    })
                }
            };

            let point = match *format {
                SeriesFormat::Delimited {
                    time,
                    concentration,
                    derivative,
                    ..
                } => TimeSeriesPoint {
                    time: field(&values, time, line)?,
                    concentration: field(&values, concentration, line)?,
                    derivative: derivative.map_or(Ok(0.0), |index| field(&values, index, line))?,
                },
                SeriesFormat::Interval { interval, .. } => TimeSeriesPoint {
                    time: points.len() as f64 * interval,
                    concentration: field(&values, 0, line)?,
                    derivative: values.get(1).copied().unwrap_or(0.0),
                },
            };

            if point.time < 0.0 {
                return Err(SeriesError::NegativeTime { line, value: point.time });
            }

            if point.concentration < 0.0 {
                return Err(SeriesError::NegativeConcentration {
                    line,
                    value: point.concentration,
                });
            }

            if points.last().map_or(false, |last| point.time < last.time) {
                return Err(SeriesError::Unordered { line });
            }

            points.push(point);
        }

        debug!(points = points.len(), "parsed time series");
        Ok(Self { points })
    }

    pub fn load<P: AsRef<Path>>(path: P, format: &SeriesFormat) -> Result<Self, SeriesError> {
        let input = fs::read_to_string(path)?;
        Self::parse(&input, format)
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[TimeSeriesPoint] {
        &self.points
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TimeSeriesPoint> {
        self.points.iter()
    }

    /// Time of the last sample.
    pub fn length(&self) -> Option<f64> {
        self.points.last().map(|point| point.time)
    }

    pub fn max_concentration(&self) -> Option<f64> {
        self.points.iter().map(|point| point.concentration).reduce(f64::max)
    }

    /// Transformation showing the whole series on a canvas of the given size. An empty series
    /// is shown with the identity transformation.
    pub fn transformation(&self, width: f64, height: f64) -> Transformation {
        match (self.length(), self.max_concentration()) {
            (Some(length), Some(max)) if length > 0.0 && max > 0.0 => Transformation::fitted(width, height, length, max),
            _ => Transformation::new(width, height),
        }
    }

    /// Axis information of a timeline annotating this series on a canvas of the given size.
    pub fn context(&self, width: f64, height: f64) -> TimelineContext {
        TimelineContext::from_transformation(&self.transformation(width, height))
    }
}

impl<'a> IntoIterator for &'a TimeSeries {
    type Item = &'a TimeSeriesPoint;
    type IntoIter = std::slice::Iter<'a, TimeSeriesPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}
