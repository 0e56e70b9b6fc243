pub mod app;
pub mod cli;
pub mod form;
pub mod gpx;
pub mod map;
pub mod render;
pub mod storage;
pub mod types;
pub mod ui;
pub mod utils;

pub use app::{App, Event, Ui};
pub use form::{FormInput, FormState};
pub use storage::{FileStorage, MemoryStorage, Storage, StorageError, WorkoutStore};
pub use types::{Activity, Coords, Workout, WorkoutId, WorkoutKind};
