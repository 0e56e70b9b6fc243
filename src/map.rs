use crate::render;
use crate::types::{Coords, WorkoutKind};
use thiserror::Error;

/// Zoom used when the map first loads and when panning to a workout.
pub const DEFAULT_ZOOM: u8 = 13;

pub type ClickHandler = Box<dyn FnMut(Coords)>;
pub type PositionCallback = Box<dyn FnOnce(Result<Coords, GeoError>)>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeoError {
    #[error("geolocation is not supported")]
    Unsupported,
    #[error("permission to read the position was denied")]
    PermissionDenied,
    #[error("position unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapError {
    #[error("map is already rendered")]
    AlreadyRendered,
    #[error("map is not rendered yet")]
    NotRendered,
}

/// One-shot position lookup.
///
/// The callback runs when the provider answers, which may be immediately,
/// later, or never. Providers are asked once and never retried.
pub trait GeolocationProvider {
    fn request_position(&mut self, callback: PositionCallback);
}

/// Always answers with the configured position.
#[derive(Debug, Clone, Copy)]
pub struct FixedPosition(Coords);

impl FixedPosition {
    pub const fn new(coords: Coords) -> Self {
        Self(coords)
    }
}

impl GeolocationProvider for FixedPosition {
    fn request_position(&mut self, callback: PositionCallback) {
        callback(Ok(self.0));
    }
}

/// A platform without geolocation.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPosition;

impl GeolocationProvider for NoPosition {
    fn request_position(&mut self, callback: PositionCallback) {
        callback(Err(GeoError::Unsupported));
    }
}

/// Holds the request until [`PendingPosition::resolve`] is called.
#[derive(Default)]
pub struct PendingPosition {
    callback: Option<PositionCallback>,
}

impl PendingPosition {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn is_pending(&self) -> bool {
        self.callback.is_some()
    }

    /// Answers the outstanding request. Returns `false` if nothing was asked.
    pub fn resolve(&mut self, result: Result<Coords, GeoError>) -> bool {
        match self.callback.take() {
            Some(cb) => {
                cb(result);
                true
            }
            None => false,
        }
    }
}

impl GeolocationProvider for PendingPosition {
    fn request_position(&mut self, callback: PositionCallback) {
        self.callback = Some(callback);
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct View {
    pub center: Coords,
    pub zoom: u8,
}

/// A pin with an always-open popup labeled by workout kind.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub coords: Coords,
    pub kind: WorkoutKind,
}

impl Marker {
    pub const fn new(coords: Coords, kind: WorkoutKind) -> Self {
        Self { coords, kind }
    }

    pub fn label(&self) -> String {
        render::popup_label(self.kind)
    }

    pub fn class_name(&self) -> String {
        render::popup_class(self.kind)
    }
}

/// An embeddable map.
pub trait MapWidget {
    /// Shows the map; only the first call succeeds.
    fn render(&mut self, center: Coords, zoom: u8) -> Result<(), MapError>;

    /// Registers the handler invoked with the coordinates of each click.
    fn on_click(&mut self, handler: ClickHandler);

    /// Adds a marker. Markers are never removed individually.
    fn place_marker(&mut self, coords: Coords, kind: WorkoutKind) -> Result<(), MapError>;

    /// Recenters the view.
    fn pan_to(&mut self, coords: Coords, zoom: u8) -> Result<(), MapError>;

    fn is_rendered(&self) -> bool;
}
