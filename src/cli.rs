use crate::types::{Coords, WorkoutId, WorkoutKind};
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

const DEFAULT_DATA_DIR: &str = ".mapty";

fn finite_degrees(s: &str) -> Result<f64, String> {
    match s.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(format!("expected a finite number of degrees, got {s:?}")),
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "mapty",
    version,
    about = "Log running and cycling workouts on a map"
)]
pub struct Cli {
    /// Directory holding the saved workouts.
    #[arg(long, env = "MAPTY_DATA_DIR", default_value = DEFAULT_DATA_DIR, global = true)]
    pub data_dir: PathBuf,

    /// Current position as LAT,LNG. Without it the map cannot be shown.
    #[arg(long, env = "MAPTY_POSITION", value_name = "LAT,LNG", global = true)]
    pub position: Option<Coords>,

    /// Write the map (markers and view) as GPX after the command.
    #[arg(long, value_name = "GPX", global = true)]
    pub map_out: Option<PathBuf>,

    /// Write the sidebar (form and workout list) as HTML after the command.
    #[arg(long, value_name = "HTML", global = true)]
    pub html_out: Option<PathBuf>,

    /// Refuse to save more than this many bytes of workouts.
    #[arg(long, value_name = "BYTES", global = true)]
    pub quota: Option<usize>,

    /// Increase log verbosity (-v, -vv). Defaults to INFO.
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Decrease log verbosity (-q, -qq). Defaults to INFO.
    #[arg(short = 'q', long, action = ArgAction::Count, global = true)]
    pub quiet: u8,

    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Click the map at LAT,LNG and submit a new workout there.
    Add {
        #[arg(long, allow_negative_numbers = true, value_parser = finite_degrees)]
        lat: f64,

        #[arg(long, allow_negative_numbers = true, value_parser = finite_degrees)]
        lng: f64,

        /// running or cycling
        #[arg(long = "type", value_name = "TYPE", default_value = "running")]
        kind: WorkoutKind,

        /// Kilometers.
        #[arg(long, default_value = "", allow_hyphen_values = true)]
        distance: String,

        /// Minutes.
        #[arg(long, default_value = "", allow_hyphen_values = true)]
        duration: String,

        /// Steps per minute (running).
        #[arg(long, default_value = "", allow_hyphen_values = true)]
        cadence: String,

        /// Elevation gain in meters (cycling).
        #[arg(long, default_value = "", allow_hyphen_values = true)]
        elevation: String,
    },

    /// Print the saved workouts.
    List,

    /// Center the map on a saved workout.
    Show { id: WorkoutId },

    /// Delete every saved workout.
    Clear,

    /// Print the markers of a GPX file written with --map-out.
    Markers { gpx: PathBuf },
}
