use crate::types::{Coords, Workout, WorkoutKind};
use crate::utils::parse_number;
use chrono::{DateTime, Utc};
use std::fmt;
use thiserror::Error;

pub const INVALID_INPUT_ALERT: &str = "Inputs have to be positive numbers!";

/// Raw values of the new-workout form, as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormInput {
    pub kind: WorkoutKind,
    pub distance: String,
    pub duration: String,
    pub cadence: String,
    pub elevation: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Position,
    Distance,
    Duration,
    Cadence,
    Elevation,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Position => "position",
            Self::Distance => "distance",
            Self::Duration => "duration",
            Self::Cadence => "cadence",
            Self::Elevation => "elevation",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is not a number")]
    NotFinite(Field),
    #[error("{0} must be positive")]
    NotPositive(Field),
}

/// Whether the form is showing and, if so, where the workout will be pinned.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum FormState {
    #[default]
    Idle,
    Open { pending: Coords, kind: WorkoutKind },
}

fn all_finite(fields: &[(Field, f64)]) -> Result<(), ValidationError> {
    match fields.iter().find(|(_, v)| !v.is_finite()) {
        Some(&(field, _)) => Err(ValidationError::NotFinite(field)),
        None => Ok(()),
    }
}

fn all_positive(fields: &[(Field, f64)]) -> Result<(), ValidationError> {
    match fields.iter().find(|(_, v)| *v <= 0.0) {
        Some(&(field, _)) => Err(ValidationError::NotPositive(field)),
        None => Ok(()),
    }
}

impl FormInput {
    pub fn running(distance: &str, duration: &str, cadence: &str) -> Self {
        Self {
            kind: WorkoutKind::Running,
            distance: distance.to_string(),
            duration: duration.to_string(),
            cadence: cadence.to_string(),
            elevation: String::new(),
        }
    }

    pub fn cycling(distance: &str, duration: &str, elevation: &str) -> Self {
        Self {
            kind: WorkoutKind::Cycling,
            distance: distance.to_string(),
            duration: duration.to_string(),
            cadence: String::new(),
            elevation: elevation.to_string(),
        }
    }

    /// Validates the inputs and builds the workout pinned at `coords`.
    ///
    /// Distance, duration and cadence must be positive. Elevation gain only
    /// has to be a number: a descent is a negative gain.
    pub fn build(&self, coords: Coords, date: DateTime<Utc>) -> Result<Workout, ValidationError> {
        if !coords.is_finite() {
            return Err(ValidationError::NotFinite(Field::Position));
        }
        let distance = (Field::Distance, parse_number(&self.distance));
        let duration = (Field::Duration, parse_number(&self.duration));

        match self.kind {
            WorkoutKind::Running => {
                let cadence = (Field::Cadence, parse_number(&self.cadence));
                let fields = [distance, duration, cadence];
                all_finite(&fields)?;
                all_positive(&fields)?;
                Ok(Workout::running_at(date, coords, distance.1, duration.1, cadence.1))
            }
            WorkoutKind::Cycling => {
                let elevation = (Field::Elevation, parse_number(&self.elevation));
                all_finite(&[distance, duration, elevation])?;
                all_positive(&[distance, duration])?;
                Ok(Workout::cycling_at(date, coords, distance.1, duration.1, elevation.1))
            }
        }
    }
}
