use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum SeriesError {
    #[error("Series '{0}' has no observations")]
    Empty(String),

    #[error("Series '{name}' has more than one observation for {date}")]
    DuplicateDate { name: String, date: NaiveDate },

    #[error("Series '{name}' has a non-finite value at {date}")]
    NonFinite { name: String, date: NaiveDate },
}

/// A single historical observation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub date: NaiveDate,
    pub value: f64,
}

/// Read-only historical series anchored at its most recent date.
///
/// Observations are kept strictly ascending by date with no duplicates.
/// Each series keeps its own anchor; series are never resampled to a
/// common end date.
#[derive(Debug, Clone)]
pub struct TimeSeries {
    name: String,
    observations: Vec<Observation>,
}

impl TimeSeries {
    /// Build a series, sorting observations by date.
    ///
    /// Fails on an empty input, a repeated date, or a NaN/infinite value.
    pub fn new(
        name: impl Into<String>,
        mut observations: Vec<Observation>,
    ) -> Result<Self, SeriesError> {
        let name = name.into();

        if observations.is_empty() {
            return Err(SeriesError::Empty(name));
        }

        if let Some(bad) = observations.iter().find(|o| !o.value.is_finite()) {
            return Err(SeriesError::NonFinite {
                name,
                date: bad.date,
            });
        }

        observations.sort_by_key(|o| o.date);

        if let Some(pair) = observations.windows(2).find(|w| w[0].date == w[1].date) {
            return Err(SeriesError::DuplicateDate {
                name,
                date: pair[0].date,
            });
        }

        Ok(Self { name, observations })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Last observed date
    pub fn anchor(&self) -> NaiveDate {
        self.last().date
    }

    /// Value observed at the anchor
    pub fn last_value(&self) -> f64 {
        self.last().value
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    fn last(&self) -> &Observation {
        // Non-empty is guaranteed by `new`
        &self.observations[self.observations.len() - 1]
    }
}
