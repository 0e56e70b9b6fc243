use mapty::app::{CLEARED_ALERT, POSITION_ALERT};
use mapty::form::INVALID_INPUT_ALERT;
use mapty::gpx::{GpxMap, read_markers};
use mapty::map::{FixedPosition, GeoError, MapWidget, PendingPosition};
use mapty::storage::WORKOUTS_KEY;
use mapty::ui::HtmlSidebar;
use mapty::{App, Coords, Event, FileStorage, FormInput, Storage, WorkoutKind, WorkoutStore};
use std::path::Path;

type FileApp = App<FileStorage, GpxMap, HtmlSidebar>;

const HOME: Coords = Coords::new(48.2082, 16.3738);

fn page_load(dir: &Path) -> FileApp {
    let storage = FileStorage::open(dir).unwrap();
    let mut app = App::new(WorkoutStore::new(storage), GpxMap::new(), HtmlSidebar::new());
    app.start(&mut FixedPosition::new(HOME));
    app
}

fn add(app: &mut FileApp, at: Coords, input: FormInput) {
    app.map_mut().click(at).unwrap();
    app.pump();
    app.dispatch(Event::KindChanged(input.kind));
    app.dispatch(Event::Submit(input));
}

#[test]
fn workouts_survive_a_reload() {
    let tmp = tempfile::tempdir().unwrap();

    let mut app = page_load(tmp.path());
    add(&mut app, Coords::new(48.21, 16.37), FormInput::running("5", "25", "150"));
    add(&mut app, Coords::new(48.19, 16.40), FormInput::cycling("20", "60", "150"));
    let saved = app.workouts().to_vec();
    assert_eq!(saved.len(), 2);
    assert_eq!(saved[0].pace(), Some(5.0));
    assert_eq!(saved[1].speed(), Some(20.0));
    drop(app);

    let app = page_load(tmp.path());
    assert_eq!(app.workouts(), saved.as_slice());
    assert_eq!(app.ui().entries().len(), 2);
    assert!(app.ui().entries()[0].contains("workout--cycling"));

    let kinds: Vec<WorkoutKind> = app.map().markers().iter().map(|m| m.kind).collect();
    assert_eq!(kinds, [WorkoutKind::Running, WorkoutKind::Cycling]);
    assert_eq!(app.map().view().unwrap().center, HOME);
}

#[test]
fn slot_uses_the_plain_record_format() {
    let tmp = tempfile::tempdir().unwrap();
    let mut app = page_load(tmp.path());
    add(&mut app, Coords::new(1.0, 2.0), FormInput::cycling("20", "60", "-20"));

    let raw = app.store().storage().get(WORKOUTS_KEY).unwrap().unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let record = &value[0];
    assert_eq!(record["type"], "cycling");
    assert_eq!(record["coords"], serde_json::json!([1.0, 2.0]));
    assert_eq!(record["distance"], 20.0);
    assert_eq!(record["duration"], 60.0);
    assert_eq!(record["elevationGain"], -20.0);
    assert_eq!(record["speed"], 20.0);
    assert_eq!(record["id"], app.workouts()[0].id().as_str());
}

#[test]
fn rejected_input_touches_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    let mut app = page_load(tmp.path());
    for input in [
        FormInput::running("", "25", "150"),
        FormInput::running("5", "abc", "150"),
        FormInput::running("-5", "25", "150"),
        FormInput::cycling("20", "0", "150"),
    ] {
        add(&mut app, Coords::new(1.0, 2.0), input);
    }
    assert!(app.workouts().is_empty());
    assert!(app.map().markers().is_empty());
    assert!(app.store().load().unwrap().is_none());
    assert!(!tmp.path().join("workouts.json").exists());
    assert_eq!(app.ui().alerts().len(), 4);
    assert!(app.ui().alerts().iter().all(|a| a == INVALID_INPUT_ALERT));
}

#[test]
fn clear_all_then_reload_starts_empty() {
    let tmp = tempfile::tempdir().unwrap();
    let mut app = page_load(tmp.path());
    add(&mut app, Coords::new(1.0, 2.0), FormInput::running("5", "25", "150"));
    app.dispatch(Event::ClearAll);
    assert_eq!(app.ui().alerts(), [CLEARED_ALERT]);
    assert!(app.ui().reload_requested());

    let app = page_load(tmp.path());
    assert!(app.workouts().is_empty());
    assert!(app.ui().entries().is_empty());
    assert!(app.map().markers().is_empty());
}

#[test]
fn late_geolocation_answer_still_loads_the_map() {
    let tmp = tempfile::tempdir().unwrap();
    let mut app = page_load(tmp.path());
    add(&mut app, Coords::new(1.0, 2.0), FormInput::running("5", "25", "150"));
    drop(app);

    let storage = FileStorage::open(tmp.path()).unwrap();
    let mut app = App::new(WorkoutStore::new(storage), GpxMap::new(), HtmlSidebar::new());
    let mut geo = PendingPosition::new();
    app.start(&mut geo);
    let tx = app.sender();

    // The list is usable before the position is known.
    assert_eq!(app.ui().entries().len(), 1);
    assert!(!app.is_map_loaded());
    tx.send(Event::MapClicked(Coords::new(5.0, 5.0))).unwrap();
    app.pump();
    assert_eq!(app.form(), mapty::FormState::Idle);

    geo.resolve(Ok(HOME));
    app.pump();
    assert!(app.is_map_loaded());
    assert_eq!(app.map().markers().len(), 1);
}

#[test]
fn denied_geolocation_keeps_the_list() {
    let tmp = tempfile::tempdir().unwrap();
    let mut app = page_load(tmp.path());
    add(&mut app, Coords::new(1.0, 2.0), FormInput::running("5", "25", "150"));
    drop(app);

    let storage = FileStorage::open(tmp.path()).unwrap();
    let mut app = App::new(WorkoutStore::new(storage), GpxMap::new(), HtmlSidebar::new());
    let mut geo = PendingPosition::new();
    app.start(&mut geo);
    geo.resolve(Err(GeoError::PermissionDenied));
    app.pump();

    assert_eq!(app.ui().alerts(), [POSITION_ALERT]);
    assert!(!app.map().is_rendered());
    assert_eq!(app.workouts().len(), 1);
    assert_eq!(app.ui().entries().len(), 1);
}

#[test]
fn exported_map_lists_every_marker() {
    let tmp = tempfile::tempdir().unwrap();
    let mut app = page_load(&tmp.path().join("data"));
    add(&mut app, Coords::new(1.0, 2.0), FormInput::running("5", "25", "150"));
    add(&mut app, Coords::new(3.0, 4.0), FormInput::cycling("10", "30", "0"));

    let gpx = tmp.path().join("out").join("map.gpx");
    app.map().write(&gpx).unwrap();
    assert_eq!(read_markers(&gpx).unwrap(), app.map().markers());

    let html = tmp.path().join("out").join("sidebar.html");
    app.ui().write(&html).unwrap();
    let page = std::fs::read_to_string(&html).unwrap();
    for w in app.workouts() {
        assert!(page.contains(&format!("data-id=\"{}\"", w.id())));
    }
}

#[test]
fn non_finite_click_never_reaches_the_slot() {
    let tmp = tempfile::tempdir().unwrap();
    let mut app = page_load(tmp.path());
    add(&mut app, Coords::new(1.0, 2.0), FormInput::running("5", "25", "150"));
    add(&mut app, Coords::new(f64::NAN, 0.0), FormInput::running("5", "25", "150"));
    assert_eq!(app.workouts().len(), 1);
    drop(app);

    let mut app = page_load(tmp.path());
    assert!(app.ui().alerts().is_empty());
    assert_eq!(app.workouts().len(), 1);
    add(&mut app, Coords::new(3.0, 4.0), FormInput::cycling("20", "60", "150"));
    drop(app);

    let app = page_load(tmp.path());
    assert_eq!(app.workouts().len(), 2);
}
