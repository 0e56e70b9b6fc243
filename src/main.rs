#![deny(warnings, clippy::all, clippy::pedantic, clippy::nursery)]

use anyhow::{Result, bail};
use clap::Parser;
use mapty::gpx::{self, GpxMap};
use mapty::map::{FixedPosition, NoPosition};
use mapty::ui::{HtmlSidebar, TerminalUi};
use mapty::{App, Coords, Event, FileStorage, FormInput, WorkoutStore, cli, utils};
use std::io;

#[macro_use]
extern crate mapty;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    utils::init_logging(cli.verbose, cli.quiet);

    if let cli::Cmd::Markers { gpx: path } = &cli.cmd {
        dlog!("mode=markers gpx={}", path.display());
        for m in gpx::read_markers(path)? {
            println!("{}\t{}\t{}", m.coords, m.kind, m.label());
        }
        return Ok(());
    }

    let mut storage = FileStorage::open(&cli.data_dir)?;
    if let Some(quota) = cli.quota {
        storage = storage.with_quota(quota);
    }
    dlog!(
        "data_dir={} position={:?}",
        cli.data_dir.display(),
        cli.position
    );

    let ui = (TerminalUi::new(io::stdout()), HtmlSidebar::new());
    let mut app = App::new(WorkoutStore::new(storage), GpxMap::new(), ui);

    match cli.position {
        Some(position) => app.start(&mut FixedPosition::new(position)),
        None => app.start(&mut NoPosition),
    }

    match cli.cmd {
        cli::Cmd::Add {
            lat,
            lng,
            kind,
            distance,
            duration,
            cadence,
            elevation,
        } => {
            if !app.is_map_loaded() {
                bail!("The map is not available; pass --position LAT,LNG to locate it.");
            }
            let before = app.workouts().len();

            app.map_mut().click(Coords::new(lat, lng))?;
            app.pump();
            app.dispatch(Event::KindChanged(kind));
            app.dispatch(Event::Submit(FormInput {
                kind,
                distance,
                duration,
                cadence,
                elevation,
            }));

            if app.workouts().len() == before {
                bail!("Workout was not recorded.");
            }
        }
        cli::Cmd::List => {
            if app.workouts().is_empty() {
                tracing::info!("no workouts saved yet");
            }
        }
        cli::Cmd::Show { id } => {
            if !app.workouts().iter().any(|w| w.id() == &id) {
                bail!("No workout with id {id}.");
            }
            app.dispatch(Event::WorkoutSelected(id));
            if let Some(view) = app.map().view() {
                println!("centered on {} (zoom {})", view.center, view.zoom);
            }
        }
        cli::Cmd::Clear => app.dispatch(Event::ClearAll),
        cli::Cmd::Markers { .. } => unreachable!("handled before start"),
    }

    if let Some(path) = &cli.map_out {
        app.map().write(path)?;
    }
    if let Some(path) = &cli.html_out {
        app.ui().1.write(path)?;
    }

    Ok(())
}
