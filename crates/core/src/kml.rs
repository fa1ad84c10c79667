//! KML track parser
//!
//! Turns one geo-annotation payload into a [`TrackRecord`]. The document's
//! default namespace is taken from the root element rather than assumed:
//! structural elements are matched only when they carry no namespace
//! prefix, which places them in whatever default namespace the document
//! declares. Elements from other namespaces are skipped.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::QName;
use quick_xml::Reader;
use tracing::debug;
use trailsync_domain::constants::{MAP_LINK_BASE, TRACK_TIMESTAMP_FORMAT};
use trailsync_domain::{Result, TrackRecord, TrailSyncError};

const MARKER_START: &str = "start";
const MARKER_END: &str = "end";

/// Fields accumulated while walking one `Placemark`
#[derive(Debug, Default, Clone)]
struct Marker {
    when: Option<String>,
    coordinates: Option<String>,
    description: Option<String>,
}

/// Text-bearing elements captured inside a marker
enum TextField {
    StyleUrl,
    When,
    Coordinates,
    Description,
}

/// Parse one KML payload into a track record.
///
/// `title` is the display title derived from the filename. Parsing fails
/// if the required `#start`/`#end` markers are absent, a timestamp or
/// coordinate field is malformed, or the start lies after the end.
pub fn parse_track(title: &str, data: &[u8]) -> Result<TrackRecord> {
    debug!(track = title, "parsing geo-annotation payload");

    let text = std::str::from_utf8(data)
        .map_err(|e| TrailSyncError::InvalidInput(format!("track payload is not UTF-8: {e}")))?;

    let markers = collect_markers(text)?;

    let start = require_marker(&markers, MARKER_START)?;
    let end = require_marker(&markers, MARKER_END)?;

    let start_time = parse_marker_time(start, MARKER_START)?;
    let end_time = parse_marker_time(end, MARKER_END)?;
    if start_time > end_time {
        return Err(TrailSyncError::InvalidInput(format!(
            "track start {start_time} lies after end {end_time}"
        )));
    }

    let start_location =
        swap_coordinates(required_field(start.coordinates.as_deref(), MARKER_START, "coordinates")?)?;
    let end_location =
        swap_coordinates(required_field(end.coordinates.as_deref(), MARKER_END, "coordinates")?)?;

    // Description comes from the end marker, with one map link per endpoint
    // appended below it.
    let mut description = match end.description.as_deref() {
        Some(body) if !body.is_empty() => format!("{body}\n"),
        _ => String::new(),
    };
    description.push_str(&format!(
        "Start: {MAP_LINK_BASE}{start_location}\nEnd: {MAP_LINK_BASE}{end_location}"
    ));

    Ok(TrackRecord {
        title: title.to_string(),
        start: start_time,
        end: end_time,
        location: start_location,
        description,
    })
}

/// Walk the document and collect markers keyed by their style-reference
/// tag. Markers without a style reference cannot be classified and are
/// dropped.
fn collect_markers(text: &str) -> Result<HashMap<String, Marker>> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);
    reader.config_mut().check_end_names = true;

    let mut markers: HashMap<String, Marker> = HashMap::new();
    let mut root_seen = false;
    let mut in_document = false;
    let mut document_seen = false;
    let mut current: Option<(Option<String>, Marker)> = None;
    let mut field: Option<TextField> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf).map_err(xml_err)? {
            Event::Start(e) => {
                if !root_seen {
                    ensure_default_namespace(&e)?;
                    root_seen = true;
                } else if !in_document && is_unprefixed(e.name(), b"Document") {
                    in_document = true;
                    document_seen = true;
                } else if in_document && current.is_none() && is_unprefixed(e.name(), b"Placemark")
                {
                    current = Some((style_attribute(&e)?, Marker::default()));
                } else if current.is_some() {
                    field = classify_field(e.name());
                }
            }
            Event::Empty(e) => {
                // A self-closed marker still carries its style attribute,
                // just no fields.
                if in_document && current.is_none() && is_unprefixed(e.name(), b"Placemark") {
                    if let Some(tag) = style_attribute(&e)? {
                        markers.entry(tag).or_default();
                    }
                }
            }
            Event::Text(t) => {
                if let (Some((tag, marker)), Some(f)) = (current.as_mut(), field.as_ref()) {
                    let decoded = t.decode().map_err(xml_err)?;
                    let value = quick_xml::escape::unescape(&decoded).map_err(xml_err)?;
                    apply_field(tag, marker, f, &value);
                }
            }
            Event::CData(t) => {
                if let (Some((tag, marker)), Some(f)) = (current.as_mut(), field.as_ref()) {
                    let value = String::from_utf8_lossy(t.as_ref()).into_owned();
                    apply_field(tag, marker, f, &value);
                }
            }
            Event::End(e) => {
                if is_unprefixed(e.name(), b"Placemark") {
                    if let Some((tag, marker)) = current.take() {
                        if let Some(tag) = tag {
                            markers.insert(tag, marker);
                        }
                    }
                    field = None;
                } else if is_unprefixed(e.name(), b"Document") {
                    in_document = false;
                } else {
                    field = None;
                }
            }
            Event::Eof => {
                if current.is_some() {
                    return Err(TrailSyncError::InvalidInput(
                        "track document ends inside a marker".to_string(),
                    ));
                }
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    if !root_seen {
        return Err(TrailSyncError::InvalidInput("track document is empty".to_string()));
    }
    if !document_seen {
        return Err(TrailSyncError::InvalidInput(
            "track document has no Document container".to_string(),
        ));
    }

    Ok(markers)
}

/// The root must be an unprefixed `kml` element declaring a default
/// namespace. The namespace URI itself is free — it is resolved per
/// document, never compared against a fixed value.
fn ensure_default_namespace(root: &BytesStart<'_>) -> Result<()> {
    if !is_unprefixed(root.name(), b"kml") {
        return Err(TrailSyncError::InvalidInput(
            "root element is not 'kml' in the default namespace".to_string(),
        ));
    }

    for attr in root.attributes() {
        let attr = attr
            .map_err(|e| TrailSyncError::InvalidInput(format!("bad root attributes: {e}")))?;
        if attr.key.as_ref() == b"xmlns" && !attr.value.is_empty() {
            return Ok(());
        }
    }

    Err(TrailSyncError::InvalidInput(
        "track document declares no default namespace".to_string(),
    ))
}

fn is_unprefixed(name: QName<'_>, local: &[u8]) -> bool {
    name.prefix().is_none() && name.local_name().as_ref() == local
}

/// Map any quick-xml error into the crate's input error
fn xml_err<E: Into<quick_xml::Error>>(e: E) -> TrailSyncError {
    TrailSyncError::InvalidInput(format!("malformed track XML: {}", e.into()))
}

fn classify_field(name: QName<'_>) -> Option<TextField> {
    if is_unprefixed(name, b"styleUrl") {
        Some(TextField::StyleUrl)
    } else if is_unprefixed(name, b"when") {
        Some(TextField::When)
    } else if is_unprefixed(name, b"coordinates") {
        Some(TextField::Coordinates)
    } else if is_unprefixed(name, b"description") {
        Some(TextField::Description)
    } else {
        None
    }
}

/// Style reference carried as an attribute on the marker element
fn style_attribute(e: &BytesStart<'_>) -> Result<Option<String>> {
    let attr = e
        .try_get_attribute("styleUrl")
        .map_err(|err| TrailSyncError::InvalidInput(format!("bad marker attributes: {err}")))?;

    match attr {
        Some(attr) => {
            let value = std::str::from_utf8(&attr.value).map_err(|err| {
                TrailSyncError::InvalidInput(format!("style reference is not UTF-8: {err}"))
            })?;
            Ok(Some(normalize_style(value)))
        }
        None => Ok(None),
    }
}

fn apply_field(tag: &mut Option<String>, marker: &mut Marker, field: &TextField, value: &str) {
    match field {
        // The attribute form wins over a child element
        TextField::StyleUrl => {
            if tag.is_none() {
                *tag = Some(normalize_style(value));
            }
        }
        TextField::When => append(&mut marker.when, value),
        TextField::Coordinates => append(&mut marker.coordinates, value),
        TextField::Description => append(&mut marker.description, value),
    }
}

fn append(slot: &mut Option<String>, value: &str) {
    match slot {
        Some(existing) => existing.push_str(value),
        None => *slot = Some(value.to_string()),
    }
}

/// `#start` → `start`; the leading `#` is a same-document reference mark
fn normalize_style(value: &str) -> String {
    value.trim().trim_start_matches('#').to_string()
}

/// Tagged lookup into the classified marker set; a missing tag is reported
/// by name, never resolved by position.
fn require_marker<'m>(markers: &'m HashMap<String, Marker>, tag: &str) -> Result<&'m Marker> {
    markers
        .get(tag)
        .ok_or_else(|| TrailSyncError::InvalidInput(format!("required '{tag}' marker is missing")))
}

fn required_field<'a>(value: Option<&'a str>, tag: &str, field: &str) -> Result<&'a str> {
    value.ok_or_else(|| TrailSyncError::InvalidInput(format!("'{tag}' marker has no {field}")))
}

/// Timestamps carry exactly six fractional digits in UTC
fn parse_marker_time(marker: &Marker, tag: &str) -> Result<DateTime<Utc>> {
    let text = required_field(marker.when.as_deref(), tag, "timestamp")?;
    let text = text.trim();

    NaiveDateTime::parse_from_str(text, TRACK_TIMESTAMP_FORMAT)
        .map(|dt| dt.and_utc())
        .map_err(|e| {
            TrailSyncError::InvalidInput(format!("invalid '{tag}' timestamp '{text}': {e}"))
        })
}

/// `longitude,latitude[,altitude]` → `latitude,longitude`
///
/// The first two components swap places; an altitude component is dropped.
/// Components are validated as numbers but stored in their original text
/// form.
fn swap_coordinates(text: &str) -> Result<String> {
    let mut parts = text.trim().split(',');
    let longitude = parts.next().map(str::trim).unwrap_or_default();
    let latitude = parts.next().map(str::trim).unwrap_or_default();

    if longitude.is_empty() || latitude.is_empty() {
        return Err(TrailSyncError::InvalidInput(format!(
            "invalid coordinate text '{}'",
            text.trim()
        )));
    }
    for component in [longitude, latitude] {
        if component.parse::<f64>().is_err() {
            return Err(TrailSyncError::InvalidInput(format!(
                "invalid coordinate component '{component}'"
            )));
        }
    }

    Ok(format!("{latitude},{longitude}"))
}
