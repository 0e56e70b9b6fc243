use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize, Serializer, ser};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of trailing timestamp digits kept in a workout id.
pub const ID_LEN: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(from = "[f64; 2]")]
pub struct Coords {
    pub lat: f64,
    pub lng: f64,
}

impl Coords {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub const fn is_finite(self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }
}

/// Refuses non-finite coordinates, which JSON would store as `null`.
impl Serialize for Coords {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if !self.is_finite() {
            return Err(ser::Error::custom(format_args!(
                "coordinates {self} are not finite"
            )));
        }
        [self.lat, self.lng].serialize(serializer)
    }
}

impl From<[f64; 2]> for Coords {
    fn from([lat, lng]: [f64; 2]) -> Self {
        Self { lat, lng }
    }
}

impl From<Coords> for [f64; 2] {
    fn from(c: Coords) -> Self {
        [c.lat, c.lng]
    }
}

impl fmt::Display for Coords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lng)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expected LAT,LNG with finite numbers, got {0:?}")]
pub struct CoordsParseError(String);

/// Parses `"LAT,LNG"`.
impl FromStr for Coords {
    type Err = CoordsParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || CoordsParseError(s.to_string());
        let (lat, lng) = s.split_once(',').ok_or_else(err)?;
        let lat: f64 = lat.trim().parse().map_err(|_| err())?;
        let lng: f64 = lng.trim().parse().map_err(|_| err())?;
        let coords = Self { lat, lng };
        if !coords.is_finite() {
            return Err(err());
        }
        Ok(coords)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkoutKind {
    #[default]
    Running,
    Cycling,
}

impl WorkoutKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Cycling => "cycling",
        }
    }

    /// Capitalized name, as used in descriptions.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Running => "Running",
            Self::Cycling => "Cycling",
        }
    }

    pub const fn icon(self) -> &'static str {
        match self {
            Self::Running => "🏃‍♂️",
            Self::Cycling => "🚴‍♀️",
        }
    }
}

impl fmt::Display for WorkoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown workout type {0:?} (expected running or cycling)")]
pub struct KindParseError(String);

impl FromStr for WorkoutKind {
    type Err = KindParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "running" => Ok(Self::Running),
            "cycling" => Ok(Self::Cycling),
            _ => Err(KindParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkoutId(String);

impl WorkoutId {
    /// Last [`ID_LEN`] digits of the millisecond timestamp.
    pub fn from_millis(ms: i64) -> Self {
        let digits = ms.to_string();
        let start = digits.len().saturating_sub(ID_LEN);
        Self(digits[start..].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for WorkoutId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl FromStr for WorkoutId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().to_string()))
    }
}

impl fmt::Display for WorkoutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind-specific part of a workout, with its derived metric.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Activity {
    /// `pace` in min/km.
    Running { cadence: f64, pace: f64 },
    /// `speed` in km/h.
    Cycling { elevation_gain: f64, speed: f64 },
}

impl Activity {
    pub fn running(distance: f64, duration: f64, cadence: f64) -> Self {
        Self::Running {
            cadence,
            pace: duration / distance,
        }
    }

    pub fn cycling(distance: f64, duration: f64, elevation_gain: f64) -> Self {
        Self::Cycling {
            elevation_gain,
            speed: distance / (duration / 60.0),
        }
    }

    pub const fn kind(&self) -> WorkoutKind {
        match self {
            Self::Running { .. } => WorkoutKind::Running,
            Self::Cycling { .. } => WorkoutKind::Cycling,
        }
    }
}

/// One logged session.
///
/// Fields are only set by the constructors, so the derived metric and the
/// description always agree with the raw fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "WorkoutRecord", try_from = "WorkoutRecord")]
pub struct Workout {
    id: WorkoutId,
    date: DateTime<Utc>,
    coords: Coords,
    distance: f64,
    duration: f64,
    description: String,
    activity: Activity,
}

impl Workout {
    pub fn running(coords: Coords, distance: f64, duration: f64, cadence: f64) -> Self {
        Self::running_at(Utc::now(), coords, distance, duration, cadence)
    }

    pub fn cycling(coords: Coords, distance: f64, duration: f64, elevation_gain: f64) -> Self {
        Self::cycling_at(Utc::now(), coords, distance, duration, elevation_gain)
    }

    pub fn running_at(
        date: DateTime<Utc>,
        coords: Coords,
        distance: f64,
        duration: f64,
        cadence: f64,
    ) -> Self {
        let activity = Activity::running(distance, duration, cadence);
        let id = WorkoutId::from_millis(date.timestamp_millis());
        Self::build(id, date, coords, distance, duration, activity)
    }

    pub fn cycling_at(
        date: DateTime<Utc>,
        coords: Coords,
        distance: f64,
        duration: f64,
        elevation_gain: f64,
    ) -> Self {
        let activity = Activity::cycling(distance, duration, elevation_gain);
        let id = WorkoutId::from_millis(date.timestamp_millis());
        Self::build(id, date, coords, distance, duration, activity)
    }

    fn build(
        id: WorkoutId,
        date: DateTime<Utc>,
        coords: Coords,
        distance: f64,
        duration: f64,
        activity: Activity,
    ) -> Self {
        let description = describe(activity.kind(), date);
        Self {
            id,
            date,
            coords,
            distance,
            duration,
            description,
            activity,
        }
    }

    pub const fn id(&self) -> &WorkoutId {
        &self.id
    }

    pub const fn date(&self) -> DateTime<Utc> {
        self.date
    }

    pub const fn coords(&self) -> Coords {
        self.coords
    }

    /// Kilometers.
    pub const fn distance(&self) -> f64 {
        self.distance
    }

    /// Minutes.
    pub const fn duration(&self) -> f64 {
        self.duration
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub const fn activity(&self) -> &Activity {
        &self.activity
    }

    pub const fn kind(&self) -> WorkoutKind {
        self.activity.kind()
    }

    pub const fn pace(&self) -> Option<f64> {
        match self.activity {
            Activity::Running { pace, .. } => Some(pace),
            Activity::Cycling { .. } => None,
        }
    }

    pub const fn speed(&self) -> Option<f64> {
        match self.activity {
            Activity::Cycling { speed, .. } => Some(speed),
            Activity::Running { .. } => None,
        }
    }

    /// Pace for running, speed for cycling.
    pub const fn metric(&self) -> f64 {
        match self.activity {
            Activity::Running { pace, .. } => pace,
            Activity::Cycling { speed, .. } => speed,
        }
    }
}

/// `"Running on October 17"`, month and day in local time.
pub fn describe(kind: WorkoutKind, date: DateTime<Utc>) -> String {
    let local = date.with_timezone(&Local);
    format!("{} on {}", kind.label(), local.format("%B %-d"))
}

/// Storage shape of a workout.
///
/// Derived values are written for readers of the raw slot but ignored when
/// reading back: the record is rebuilt from its raw fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WorkoutRecord {
    #[serde(rename = "type")]
    kind: WorkoutKind,
    id: WorkoutId,
    date: DateTime<Utc>,
    coords: Coords,
    distance: f64,
    duration: f64,
    #[serde(default)]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cadence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pace: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    elevation_gain: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    speed: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("running workout {0} has no cadence")]
    MissingCadence(String),
    #[error("cycling workout {0} has no elevationGain")]
    MissingElevation(String),
}

impl From<Workout> for WorkoutRecord {
    fn from(w: Workout) -> Self {
        let (cadence, pace, elevation_gain, speed) = match w.activity {
            Activity::Running { cadence, pace } => (Some(cadence), Some(pace), None, None),
            Activity::Cycling {
                elevation_gain,
                speed,
            } => (None, None, Some(elevation_gain), Some(speed)),
        };
        Self {
            kind: w.activity.kind(),
            id: w.id,
            date: w.date,
            coords: w.coords,
            distance: w.distance,
            duration: w.duration,
            description: Some(w.description),
            cadence,
            pace,
            elevation_gain,
            speed,
        }
    }
}

impl TryFrom<WorkoutRecord> for Workout {
    type Error = RecordError;

    fn try_from(r: WorkoutRecord) -> Result<Self, Self::Error> {
        let activity = match r.kind {
            WorkoutKind::Running => {
                let cadence = r
                    .cadence
                    .ok_or_else(|| RecordError::MissingCadence(r.id.to_string()))?;
                Activity::running(r.distance, r.duration, cadence)
            }
            WorkoutKind::Cycling => {
                let elevation = r
                    .elevation_gain
                    .ok_or_else(|| RecordError::MissingElevation(r.id.to_string()))?;
                Activity::cycling(r.distance, r.duration, elevation)
            }
        };
        Ok(Self::build(r.id, r.date, r.coords, r.distance, r.duration, activity))
    }
}
