use crate::types::{Activity, Workout, WorkoutKind};

pub fn popup_label(kind: WorkoutKind) -> String {
    format!("{} {kind}", kind.icon())
}

pub fn popup_class(kind: WorkoutKind) -> String {
    format!("{kind}-popup")
}

fn detail(icon: &str, value: &str, unit: &str) -> String {
    format!(
        r#"
  <div class="workout__details">
    <span class="workout__icon">{icon}</span>
    <span class="workout__value">{value}</span>
    <span class="workout__unit">{unit}</span>
  </div>"#
    )
}

/// Sidebar list entry for one workout.
pub fn workout_html(w: &Workout) -> String {
    let kind = w.kind();
    let mut html = format!(
        r#"<li class="workout workout--{kind}" data-id="{id}">
  <h2 class="workout__title">{title}</h2>"#,
        id = w.id(),
        title = w.description(),
    );
    html.push_str(&detail(kind.icon(), &w.distance().to_string(), "km"));
    html.push_str(&detail("⏱", &w.duration().to_string(), "min"));

    match *w.activity() {
        Activity::Running { cadence, pace } => {
            html.push_str(&detail("⚡️", &format!("{pace:.1}"), "min/km"));
            html.push_str(&detail("🦶🏼", &cadence.to_string(), "spm"));
        }
        Activity::Cycling {
            elevation_gain,
            speed,
        } => {
            html.push_str(&detail("⚡️", &format!("{speed:.1}"), "km/h"));
            html.push_str(&detail("⛰", &elevation_gain.to_string(), "m"));
        }
    }
    html.push_str("\n</li>");
    html
}

/// One-line terminal rendering of a workout.
pub fn workout_line(w: &Workout) -> String {
    let extra = match *w.activity() {
        Activity::Running { cadence, pace } => format!("⚡️ {pace:.1} min/km  🦶🏼 {cadence} spm"),
        Activity::Cycling {
            elevation_gain,
            speed,
        } => format!("⚡️ {speed:.1} km/h  ⛰ {elevation_gain} m"),
    };
    format!(
        "{id}  {icon} {title}  {dist} km  ⏱ {dur} min  {extra}",
        id = w.id(),
        icon = w.kind().icon(),
        title = w.description(),
        dist = w.distance(),
        dur = w.duration(),
    )
}
