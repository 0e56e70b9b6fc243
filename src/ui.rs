use crate::app::Ui;
use crate::dlog;
use crate::render;
use crate::types::{Workout, WorkoutKind};
use crate::utils::write_file;
use anyhow::Result;
use std::io::Write;
use std::path::Path;

/// Prints list entries and alerts to a terminal.
pub struct TerminalUi<W: Write> {
    out: W,
}

impl<W: Write> TerminalUi<W> {
    pub const fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: &str) {
        if let Err(e) = writeln!(self.out, "{text}") {
            tracing::warn!(err = %e, "terminal write failed");
        }
    }
}

impl<W: Write> Ui for TerminalUi<W> {
    fn alert(&mut self, message: &str) {
        self.line(&format!("! {message}"));
    }

    fn show_form(&mut self) {
        dlog!("form shown");
    }

    fn hide_form(&mut self) {
        dlog!("form hidden");
    }

    fn show_kind_fields(&mut self, kind: WorkoutKind) {
        dlog!("form fields for {kind}");
    }

    fn insert_workout(&mut self, workout: &Workout) {
        self.line(&render::workout_line(workout));
    }

    fn clear_inputs(&mut self) {}

    fn reload(&mut self) {
        dlog!("reload requested");
    }
}

fn form_row(label: &str, kind: &str, placeholder: &str, hidden: bool) -> String {
    let class = if hidden {
        "form__row form__row--hidden"
    } else {
        "form__row"
    };
    format!(
        r#"    <div class="{class}">
      <label class="form__label">{label}</label>
      <input class="form__input form__input--{kind}" placeholder="{placeholder}" />
    </div>"#
    )
}

/// The sidebar page: form plus workout list, kept as HTML.
#[derive(Debug, Clone, Default)]
pub struct HtmlSidebar {
    entries: Vec<String>,
    alerts: Vec<String>,
    form_visible: bool,
    visible_kind: WorkoutKind,
    inputs_cleared: usize,
    reload_requested: bool,
}

impl HtmlSidebar {
    pub fn new() -> Self {
        Self::default()
    }

    /// List entries, newest first.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn alerts(&self) -> &[String] {
        &self.alerts
    }

    pub const fn form_visible(&self) -> bool {
        self.form_visible
    }

    pub const fn visible_kind(&self) -> WorkoutKind {
        self.visible_kind
    }

    pub const fn inputs_cleared(&self) -> usize {
        self.inputs_cleared
    }

    pub const fn reload_requested(&self) -> bool {
        self.reload_requested
    }

    pub fn to_html(&self) -> String {
        let form_class = if self.form_visible { "form" } else { "form hidden" };
        let running = self.visible_kind == WorkoutKind::Running;
        let selected = |k: WorkoutKind| if self.visible_kind == k { " selected" } else { "" };

        let mut html = String::from(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <title>mapty</title>
</head>
<body>
<ul class="workouts">
"#,
        );
        html.push_str(&format!(
            r#"  <form class="{form_class}">
    <div class="form__row">
      <label class="form__label">Type</label>
      <select class="form__input form__input--type">
        <option value="running"{run_sel}>Running</option>
        <option value="cycling"{cyc_sel}>Cycling</option>
      </select>
    </div>
"#,
            run_sel = selected(WorkoutKind::Running),
            cyc_sel = selected(WorkoutKind::Cycling),
        ));
        for row in [
            form_row("Distance", "distance", "km", false),
            form_row("Duration", "duration", "min", false),
            form_row("Cadence", "cadence", "step/min", !running),
            form_row("Elev Gain", "elevation", "meters", running),
        ] {
            html.push_str(&row);
            html.push('\n');
        }
        html.push_str("  </form>\n");

        for entry in &self.entries {
            html.push_str(entry);
            html.push('\n');
        }
        html.push_str("</ul>\n</body>\n</html>\n");
        html
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        write_file(path, &self.to_html())?;
        tracing::info!(path = %path.display(), entries = self.entries.len(), "wrote sidebar");
        Ok(())
    }
}

impl Ui for HtmlSidebar {
    fn alert(&mut self, message: &str) {
        self.alerts.push(message.to_string());
    }

    fn show_form(&mut self) {
        self.form_visible = true;
    }

    fn hide_form(&mut self) {
        self.form_visible = false;
    }

    fn show_kind_fields(&mut self, kind: WorkoutKind) {
        self.visible_kind = kind;
    }

    fn insert_workout(&mut self, workout: &Workout) {
        // Entries go right after the form, so the newest is on top.
        self.entries.insert(0, render::workout_html(workout));
    }

    fn clear_inputs(&mut self) {
        self.inputs_cleared += 1;
    }

    fn reload(&mut self) {
        self.reload_requested = true;
    }
}
