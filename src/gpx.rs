use crate::dlog;
use crate::map::{ClickHandler, MapError, MapWidget, Marker, View};
use crate::types::{Coords, WorkoutKind};
use crate::utils::write_file;
use anyhow::{Context, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::reader::Reader;
use quick_xml::writer::Writer;
use std::fs;
use std::io::{BufReader, Cursor};
use std::path::Path;

const GPX_NS: &str = "http://www.topografix.com/GPX/1/1";

/// Map kept in memory and exported as GPX waypoints.
#[derive(Default)]
pub struct GpxMap {
    view: Option<View>,
    markers: Vec<Marker>,
    handler: Option<ClickHandler>,
}

impl GpxMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn view(&self) -> Option<View> {
        self.view
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// Delivers a user click to the registered handler.
    pub fn click(&mut self, coords: Coords) -> Result<(), MapError> {
        if self.view.is_none() {
            return Err(MapError::NotRendered);
        }
        match self.handler.as_mut() {
            Some(handler) => handler(coords),
            None => {
                dlog!("map_click_unhandled coords={coords}");
            }
        }
        Ok(())
    }

    pub fn to_gpx(&self) -> Result<String> {
        let mut xml = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

        xml.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        xml.write_event(Event::Start(BytesStart::new("gpx").with_attributes([
            ("version", "1.1"),
            ("creator", "mapty"),
            ("xmlns", GPX_NS),
        ])))?;

        if let Some(view) = self.view {
            let desc = format!("center {} zoom {}", view.center, view.zoom);
            xml.write_event(Event::Start(BytesStart::new("metadata")))?;
            write_text_element(&mut xml, "desc", &desc)?;
            xml.write_event(Event::End(BytesEnd::new("metadata")))?;
        }

        for m in &self.markers {
            let lat = m.coords.lat.to_string();
            let lon = m.coords.lng.to_string();
            let wpt =
                BytesStart::new("wpt").with_attributes([("lat", lat.as_str()), ("lon", lon.as_str())]);
            xml.write_event(Event::Start(wpt))?;
            write_text_element(&mut xml, "name", &m.label())?;
            write_text_element(&mut xml, "desc", &m.class_name())?;
            write_text_element(&mut xml, "type", m.kind.as_str())?;
            xml.write_event(Event::End(BytesEnd::new("wpt")))?;
        }

        xml.write_event(Event::End(BytesEnd::new("gpx")))?;

        String::from_utf8(xml.into_inner().into_inner()).context("GPX output is not UTF-8")
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let gpx = self.to_gpx()?;
        write_file(path, &gpx)?;
        tracing::info!(path = %path.display(), markers = self.markers.len(), "wrote map");
        Ok(())
    }
}

fn write_text_element(xml: &mut Writer<Cursor<Vec<u8>>>, name: &str, text: &str) -> Result<()> {
    xml.write_event(Event::Start(BytesStart::new(name)))?;
    xml.write_event(Event::Text(BytesText::new(text)))?;
    xml.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

impl MapWidget for GpxMap {
    fn render(&mut self, center: Coords, zoom: u8) -> Result<(), MapError> {
        if self.view.is_some() {
            return Err(MapError::AlreadyRendered);
        }
        self.view = Some(View { center, zoom });
        tracing::info!(%center, zoom, "map rendered");
        Ok(())
    }

    fn on_click(&mut self, handler: ClickHandler) {
        self.handler = Some(handler);
    }

    fn place_marker(&mut self, coords: Coords, kind: WorkoutKind) -> Result<(), MapError> {
        if self.view.is_none() {
            return Err(MapError::NotRendered);
        }
        dlog!("marker coords={coords} kind={kind}");
        self.markers.push(Marker::new(coords, kind));
        Ok(())
    }

    fn pan_to(&mut self, coords: Coords, zoom: u8) -> Result<(), MapError> {
        let Some(view) = self.view.as_mut() else {
            return Err(MapError::NotRendered);
        };
        view.center = coords;
        view.zoom = zoom;
        dlog!("pan_to coords={coords} zoom={zoom}");
        Ok(())
    }

    fn is_rendered(&self) -> bool {
        self.view.is_some()
    }
}

/// Reads the markers back from a GPX file written by [`GpxMap::write`].
///
/// Waypoints without coordinates or a known `<type>` are skipped.
pub fn read_markers(path: &Path) -> Result<Vec<Marker>> {
    let bytes = fs::read(path).with_context(|| format!("reading GPX: {}", path.display()))?;
    if bytes.is_empty() {
        return Ok(Vec::new());
    }

    let reader = BufReader::new(Cursor::new(bytes));
    let mut xml = Reader::from_reader(reader);
    xml.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut st = WptState::default();
    let mut out: Vec<Marker> = Vec::new();

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) => handle_wpt_start(&mut st, &e),
            Ok(Event::End(e)) => handle_wpt_end(&mut st, &e, &mut out),
            Ok(Event::Text(e)) => handle_wpt_text(&mut st, &e),
            Err(e) => anyhow::bail!("GPX XML parse error: {e}"),
            _ => {}
        }
        buf.clear();
    }

    Ok(out)
}

#[derive(Default)]
struct WptState {
    in_wpt: bool,
    in_type: bool,

    cur_lat: Option<f64>,
    cur_lon: Option<f64>,
    cur_kind: Option<WorkoutKind>,
}

fn handle_wpt_start(st: &mut WptState, e: &BytesStart<'_>) {
    match e.name().as_ref() {
        b"wpt" => {
            st.in_wpt = true;
            st.in_type = false;
            st.cur_kind = None;

            let (lat, lon) = parse_wpt_lat_lon(e);
            st.cur_lat = lat;
            st.cur_lon = lon;
        }
        b"type" if st.in_wpt => st.in_type = true,
        _ => {}
    }
}

fn handle_wpt_end(st: &mut WptState, e: &BytesEnd<'_>, out: &mut Vec<Marker>) {
    match e.name().as_ref() {
        b"type" => st.in_type = false,
        b"wpt" => {
            st.in_wpt = false;

            let (Some(lat), Some(lon), Some(kind)) = (st.cur_lat, st.cur_lon, st.cur_kind) else {
                dlog!("gpx_skip_wpt lat={:?} lon={:?}", st.cur_lat, st.cur_lon);
                return;
            };
            out.push(Marker::new(Coords::new(lat, lon), kind));
        }
        _ => {}
    }
}

fn handle_wpt_text(st: &mut WptState, e: &BytesText<'_>) {
    if st.in_type
        && let Ok(s) = e.decode()
    {
        st.cur_kind = s.parse::<WorkoutKind>().ok();
    }
}

fn parse_wpt_lat_lon(e: &BytesStart<'_>) -> (Option<f64>, Option<f64>) {
    let mut lat: Option<f64> = None;
    let mut lon: Option<f64> = None;

    for a in e.attributes().with_checks(false).flatten() {
        let key = a.key.as_ref();
        if key == b"lat"
            && let Ok(v) = a.unescape_value()
        {
            lat = v.parse::<f64>().ok();
        } else if key == b"lon"
            && let Ok(v) = a.unescape_value()
        {
            lon = v.parse::<f64>().ok();
        }
    }

    (lat, lon)
}
