use crate::dlog;
use crate::form::{FormInput, FormState, INVALID_INPUT_ALERT};
use crate::map::{DEFAULT_ZOOM, GeoError, GeolocationProvider, MapWidget};
use crate::storage::{Storage, WorkoutStore};
use crate::types::{Coords, Workout, WorkoutId, WorkoutKind};
use chrono::Utc;
use std::sync::mpsc::{Receiver, Sender, channel};

pub const POSITION_ALERT: &str = "Could not get your position";
pub const CLEARED_ALERT: &str = "All workouts have been deleted!";

/// The page around the map: form, workout list and alerts.
pub trait Ui {
    fn alert(&mut self, message: &str);
    fn show_form(&mut self);
    fn hide_form(&mut self);
    /// Shows the cadence input for running and the elevation input for cycling.
    fn show_kind_fields(&mut self, kind: WorkoutKind);
    /// Adds a list entry; the newest entry is shown first.
    fn insert_workout(&mut self, workout: &Workout);
    fn clear_inputs(&mut self);
    fn reload(&mut self);
}

impl<A: Ui, B: Ui> Ui for (A, B) {
    fn alert(&mut self, message: &str) {
        self.0.alert(message);
        self.1.alert(message);
    }

    fn show_form(&mut self) {
        self.0.show_form();
        self.1.show_form();
    }

    fn hide_form(&mut self) {
        self.0.hide_form();
        self.1.hide_form();
    }

    fn show_kind_fields(&mut self, kind: WorkoutKind) {
        self.0.show_kind_fields(kind);
        self.1.show_kind_fields(kind);
    }

    fn insert_workout(&mut self, workout: &Workout) {
        self.0.insert_workout(workout);
        self.1.insert_workout(workout);
    }

    fn clear_inputs(&mut self) {
        self.0.clear_inputs();
        self.1.clear_inputs();
    }

    fn reload(&mut self) {
        self.0.reload();
        self.1.reload();
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    PositionResolved(Result<Coords, GeoError>),
    MapClicked(Coords),
    KindChanged(WorkoutKind),
    Submit(FormInput),
    WorkoutSelected(WorkoutId),
    ClearAll,
}

/// Owns the workout list and reacts to UI events.
///
/// Callbacks handed to the map and the geolocation provider only enqueue
/// events; [`App::pump`] handles them in arrival order.
pub struct App<S: Storage, M: MapWidget, U: Ui> {
    workouts: Vec<Workout>,
    store: WorkoutStore<S>,
    map: M,
    ui: U,
    form: FormState,
    map_loaded: bool,
    tx: Sender<Event>,
    rx: Receiver<Event>,
}

impl<S: Storage, M: MapWidget, U: Ui> App<S, M, U> {
    pub fn new(store: WorkoutStore<S>, map: M, ui: U) -> Self {
        let (tx, rx) = channel();
        Self {
            workouts: Vec::new(),
            store,
            map,
            ui,
            form: FormState::Idle,
            map_loaded: false,
            tx,
            rx,
        }
    }

    /// Page load: ask for the position, then list saved workouts.
    ///
    /// Markers for saved workouts wait until the map has loaded.
    pub fn start(&mut self, geo: &mut impl GeolocationProvider) {
        let tx = self.tx.clone();
        geo.request_position(Box::new(move |result| {
            // The receiver lives as long as the app.
            let _ = tx.send(Event::PositionResolved(result));
        }));

        self.restore();
        self.pump();
    }

    /// Handles `event` and anything it queued.
    pub fn dispatch(&mut self, event: Event) {
        self.handle(event);
        self.pump();
    }

    /// Handles queued events; returns how many.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.rx.try_recv() {
            self.handle(event);
            handled += 1;
        }
        handled
    }

    /// Sender for callbacks that outlive a borrow of the app.
    pub fn sender(&self) -> Sender<Event> {
        self.tx.clone()
    }

    fn handle(&mut self, event: Event) {
        dlog!("event {event:?}");
        match event {
            Event::PositionResolved(Ok(center)) => self.load_map(center),
            Event::PositionResolved(Err(e)) => {
                tracing::warn!(err = %e, "geolocation failed");
                self.ui.alert(POSITION_ALERT);
            }
            Event::MapClicked(coords) => self.show_form(coords),
            Event::KindChanged(kind) => self.toggle_kind(kind),
            Event::Submit(input) => self.new_workout(&input),
            Event::WorkoutSelected(id) => self.move_to_marker(&id),
            Event::ClearAll => self.clear_all(),
        }
    }

    fn restore(&mut self) {
        match self.store.load() {
            Ok(Some(workouts)) => {
                tracing::info!(workouts = workouts.len(), "restored workouts");
                self.workouts = workouts;
                for w in &self.workouts {
                    self.ui.insert_workout(w);
                }
            }
            Ok(None) => {
                dlog!("no saved workouts");
            }
            Err(e) => {
                tracing::warn!(err = %e, "could not load saved workouts");
                self.ui.alert(&format!("Could not load saved workouts: {e}"));
            }
        }
    }

    fn load_map(&mut self, center: Coords) {
        if let Err(e) = self.map.render(center, DEFAULT_ZOOM) {
            tracing::warn!(err = %e, "map not loaded");
            return;
        }

        let tx = self.tx.clone();
        self.map.on_click(Box::new(move |coords| {
            let _ = tx.send(Event::MapClicked(coords));
        }));
        self.map_loaded = true;

        for w in &self.workouts {
            if let Err(e) = self.map.place_marker(w.coords(), w.kind()) {
                tracing::warn!(id = %w.id(), err = %e, "could not place marker");
            }
        }
        tracing::info!(%center, markers = self.workouts.len(), "map loaded");
    }

    fn show_form(&mut self, coords: Coords) {
        if !self.map_loaded {
            dlog!("click before map load ignored");
            return;
        }
        if !coords.is_finite() {
            tracing::warn!(%coords, "click outside the map ignored");
            return;
        }
        let kind = match self.form {
            FormState::Open { kind, .. } => kind,
            FormState::Idle => WorkoutKind::default(),
        };
        self.form = FormState::Open {
            pending: coords,
            kind,
        };
        self.ui.show_kind_fields(kind);
        self.ui.show_form();
    }

    fn toggle_kind(&mut self, kind: WorkoutKind) {
        if let FormState::Open { kind: current, .. } = &mut self.form {
            *current = kind;
            self.ui.show_kind_fields(kind);
        } else {
            dlog!("kind change without open form ignored");
        }
    }

    /// Builds the workout from `input` as the form currently shows it.
    fn new_workout(&mut self, input: &FormInput) {
        let FormState::Open { pending, kind } = self.form else {
            dlog!("submit without open form ignored");
            return;
        };
        if input.kind != kind {
            tracing::warn!(submitted = %input.kind, shown = %kind, "using the kind the form shows");
        }
        let input = FormInput {
            kind,
            ..input.clone()
        };

        let workout = match input.build(pending, Utc::now()) {
            Ok(w) => w,
            Err(e) => {
                tracing::warn!(err = %e, "rejected workout input");
                self.ui.alert(INVALID_INPUT_ALERT);
                return;
            }
        };

        tracing::info!(id = %workout.id(), kind = %workout.kind(), "new workout");
        self.workouts.push(workout);
        let Some(workout) = self.workouts.last() else {
            return;
        };

        if let Err(e) = self.map.place_marker(workout.coords(), workout.kind()) {
            tracing::warn!(id = %workout.id(), err = %e, "could not place marker");
        }
        self.ui.insert_workout(workout);

        self.ui.clear_inputs();
        self.ui.hide_form();
        self.form = FormState::Idle;

        self.persist();
    }

    fn persist(&mut self) {
        if let Err(e) = self.store.save(&self.workouts) {
            tracing::warn!(err = %e, "could not save workouts");
            self.ui.alert(&format!("Could not save workouts: {e}"));
        }
    }

    fn move_to_marker(&mut self, id: &WorkoutId) {
        if !self.map_loaded {
            dlog!("select before map load ignored");
            return;
        }
        let Some(workout) = self.workouts.iter().find(|w| w.id() == id) else {
            tracing::warn!(%id, "no workout with this id");
            return;
        };
        if let Err(e) = self.map.pan_to(workout.coords(), DEFAULT_ZOOM) {
            tracing::warn!(%id, err = %e, "could not pan to workout");
        }
    }

    fn clear_all(&mut self) {
        if let Err(e) = self.store.clear() {
            tracing::warn!(err = %e, "could not clear workouts");
            self.ui.alert(&format!("Could not delete workouts: {e}"));
            return;
        }
        tracing::info!("cleared saved workouts");
        self.ui.alert(CLEARED_ALERT);
        self.ui.reload();
    }

    pub fn workouts(&self) -> &[Workout] {
        &self.workouts
    }

    pub const fn form(&self) -> FormState {
        self.form
    }

    pub const fn is_map_loaded(&self) -> bool {
        self.map_loaded
    }

    pub const fn store(&self) -> &WorkoutStore<S> {
        &self.store
    }

    pub const fn map(&self) -> &M {
        &self.map
    }

    pub const fn map_mut(&mut self) -> &mut M {
        &mut self.map
    }

    pub const fn ui(&self) -> &U {
        &self.ui
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpx::GpxMap;
    use crate::map::{FixedPosition, NoPosition, PendingPosition};
    use crate::storage::MemoryStorage;
    use crate::ui::HtmlSidebar;

    type TestApp = App<MemoryStorage, GpxMap, HtmlSidebar>;

    fn app_with(storage: MemoryStorage) -> TestApp {
        App::new(WorkoutStore::new(storage), GpxMap::new(), HtmlSidebar::new())
    }

    fn started(storage: MemoryStorage) -> TestApp {
        let mut app = app_with(storage);
        app.start(&mut FixedPosition::new(Coords::new(51.5, -0.1)));
        app
    }

    fn click(app: &mut TestApp, coords: Coords) {
        app.map_mut().click(coords).unwrap();
        app.pump();
    }

    #[test]
    fn click_opens_form_with_pending_coords() {
        let mut app = started(MemoryStorage::new());
        assert!(app.is_map_loaded());
        assert_eq!(app.form(), FormState::Idle);

        click(&mut app, Coords::new(51.51, -0.11));
        assert_eq!(
            app.form(),
            FormState::Open {
                pending: Coords::new(51.51, -0.11),
                kind: WorkoutKind::Running
            }
        );
        assert!(app.ui().form_visible());
    }

    #[test]
    fn valid_submit_runs_side_effects_and_returns_to_idle() {
        let mut app = started(MemoryStorage::new());
        click(&mut app, Coords::new(51.51, -0.11));
        app.dispatch(Event::Submit(FormInput::running("5", "25", "150")));

        assert_eq!(app.workouts().len(), 1);
        let w = &app.workouts()[0];
        assert_eq!(w.pace(), Some(5.0));
        assert_eq!(w.coords(), Coords::new(51.51, -0.11));

        assert_eq!(app.map().markers().len(), 1);
        assert_eq!(app.ui().entries().len(), 1);
        assert_eq!(app.ui().inputs_cleared(), 1);
        assert!(!app.ui().form_visible());
        assert_eq!(app.form(), FormState::Idle);
        assert_eq!(app.store().load().unwrap().unwrap(), app.workouts());
    }

    #[test]
    fn invalid_submit_alerts_and_keeps_form() {
        let mut app = started(MemoryStorage::new());
        click(&mut app, Coords::new(1.0, 1.0));
        let open = app.form();

        app.dispatch(Event::Submit(FormInput::running("five", "25", "150")));
        app.dispatch(Event::Submit(FormInput::cycling("20", "0", "10")));

        assert!(app.workouts().is_empty());
        assert!(app.store().load().unwrap().is_none());
        assert!(app.map().markers().is_empty());
        assert_eq!(app.form(), open);
        assert_eq!(app.ui().alerts(), [INVALID_INPUT_ALERT, INVALID_INPUT_ALERT]);
    }

    #[test]
    fn submit_without_click_is_ignored() {
        let mut app = started(MemoryStorage::new());
        app.dispatch(Event::Submit(FormInput::running("5", "25", "150")));
        assert!(app.workouts().is_empty());
        assert!(app.ui().alerts().is_empty());
    }

    #[test]
    fn kind_change_swaps_visible_field() {
        let mut app = started(MemoryStorage::new());
        app.dispatch(Event::KindChanged(WorkoutKind::Cycling));
        assert_eq!(app.ui().visible_kind(), WorkoutKind::Running);

        click(&mut app, Coords::new(1.0, 1.0));
        app.dispatch(Event::KindChanged(WorkoutKind::Cycling));
        assert_eq!(app.ui().visible_kind(), WorkoutKind::Cycling);
        assert!(matches!(
            app.form(),
            FormState::Open {
                kind: WorkoutKind::Cycling,
                ..
            }
        ));
        assert!(app.workouts().is_empty());
    }

    #[test]
    fn submit_uses_the_kind_the_form_shows() {
        let mut app = started(MemoryStorage::new());
        click(&mut app, Coords::new(1.0, 1.0));
        app.dispatch(Event::KindChanged(WorkoutKind::Cycling));

        let mut input = FormInput::running("20", "60", "150");
        input.elevation = "300".to_string();
        app.dispatch(Event::Submit(input));

        assert_eq!(app.workouts().len(), 1);
        assert_eq!(app.workouts()[0].kind(), WorkoutKind::Cycling);
        assert_eq!(app.workouts()[0].speed(), Some(20.0));
        assert_eq!(app.map().markers()[0].kind, WorkoutKind::Cycling);
    }

    #[test]
    fn non_finite_click_does_not_open_the_form() {
        let mut app = started(MemoryStorage::new());
        click(&mut app, Coords::new(f64::NAN, 0.0));
        assert_eq!(app.form(), FormState::Idle);
        assert!(!app.ui().form_visible());

        app.dispatch(Event::Submit(FormInput::running("5", "25", "150")));
        assert!(app.workouts().is_empty());
        assert!(app.store().load().unwrap().is_none());
    }

    #[test]
    fn geolocation_failure_alerts_and_leaves_map_unrendered() {
        let mut app = app_with(MemoryStorage::new());
        app.start(&mut NoPosition);
        assert!(!app.is_map_loaded());
        assert!(!app.map().is_rendered());
        assert_eq!(app.ui().alerts(), [POSITION_ALERT]);
    }

    #[test]
    fn saved_markers_wait_for_the_map() {
        let mut seed = started(MemoryStorage::new());
        click(&mut seed, Coords::new(1.0, 1.0));
        seed.dispatch(Event::Submit(FormInput::running("5", "25", "150")));
        click(&mut seed, Coords::new(2.0, 2.0));
        seed.dispatch(Event::KindChanged(WorkoutKind::Cycling));
        seed.dispatch(Event::Submit(FormInput::cycling("20", "60", "150")));
        let storage = seed.store().storage().clone();

        let mut geo = PendingPosition::new();
        let mut app = app_with(storage);
        app.start(&mut geo);

        assert_eq!(app.workouts().len(), 2);
        assert_eq!(app.ui().entries().len(), 2);
        assert!(app.map().markers().is_empty());

        geo.resolve(Ok(Coords::new(0.0, 0.0)));
        assert_eq!(app.pump(), 1);
        let coords: Vec<Coords> = app.map().markers().iter().map(|m| m.coords).collect();
        assert_eq!(coords, [Coords::new(1.0, 1.0), Coords::new(2.0, 2.0)]);
    }

    #[test]
    fn selecting_a_workout_pans_the_map() {
        let mut app = started(MemoryStorage::new());
        click(&mut app, Coords::new(10.0, 20.0));
        app.dispatch(Event::KindChanged(WorkoutKind::Cycling));
        app.dispatch(Event::Submit(FormInput::cycling("20", "60", "150")));
        let id = app.workouts()[0].id().clone();

        app.dispatch(Event::WorkoutSelected(id));
        assert_eq!(app.map().view().unwrap().center, Coords::new(10.0, 20.0));

        app.dispatch(Event::WorkoutSelected(WorkoutId::from("missing")));
        assert_eq!(app.map().view().unwrap().center, Coords::new(10.0, 20.0));
    }

    #[test]
    fn storage_failure_alerts_but_keeps_the_record() {
        let mut app = started(MemoryStorage::unavailable());
        assert_eq!(app.ui().alerts().len(), 1);

        click(&mut app, Coords::new(1.0, 1.0));
        app.dispatch(Event::Submit(FormInput::running("5", "25", "150")));
        assert_eq!(app.workouts().len(), 1);
        assert_eq!(app.ui().entries().len(), 1);
        assert!(app.ui().alerts()[1].starts_with("Could not save workouts"));
    }

    #[test]
    fn clear_all_removes_slot_and_requests_reload() {
        let mut app = started(MemoryStorage::new());
        click(&mut app, Coords::new(1.0, 1.0));
        app.dispatch(Event::Submit(FormInput::running("5", "25", "150")));

        app.dispatch(Event::ClearAll);
        assert!(app.store().load().unwrap().is_none());
        assert_eq!(app.ui().alerts(), [CLEARED_ALERT]);
        assert!(app.ui().reload_requested());
        // Only the reload resets the in-memory list.
        assert_eq!(app.workouts().len(), 1);

        let reloaded = started(app.store().storage().clone());
        assert!(reloaded.workouts().is_empty());
    }
}
