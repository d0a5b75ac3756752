//! Atom feed parsing for arXiv query responses.

use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;
use tracing::debug;

use super::{PaperRecord, SearchBackendError};

const ATOM_NS: &[u8] = b"http://www.w3.org/2005/Atom";

/// Depth of `<entry>` elements below the document root.
const ENTRY_DEPTH: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Summary,
    Id,
}

#[derive(Debug, Default)]
struct EntryFields {
    title: Option<String>,
    summary: Option<String>,
    id: Option<String>,
    /// Set when a field held an entity or escape that could not be decoded
    malformed: bool,
}

impl EntryFields {
    fn set(&mut self, field: Field, text: String) {
        let text = collapse_whitespace(&text);
        if text.is_empty() {
            return;
        }
        match field {
            Field::Title => self.title = Some(text),
            Field::Summary => self.summary = Some(text),
            Field::Id => self.id = Some(text),
        }
    }

    /// Returns a record only if title, summary and a valid id URL are all present
    /// and every field decoded cleanly.
    fn into_record(self) -> Option<PaperRecord> {
        if self.malformed {
            return None;
        }
        let link = reqwest::Url::parse(&self.id?).ok()?;
        Some(PaperRecord {
            title: self.title?,
            summary: self.summary?,
            link,
        })
    }
}

/// Parses an arXiv Atom feed into paper records, preserving feed order.
///
/// Entries missing a title, summary or id are skipped, as are entries whose
/// fields contain entities XML does not define. A feed with no entries yields
/// an empty list.
///
/// # Errors
///
/// Returns `SearchBackendError::Parse` if the payload is not well-formed XML or
/// its root element is not an Atom `<feed>`.
///
/// # Examples
///
/// ```
/// use docqa::arxiv::parse_feed;
///
/// let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom">
///   <entry>
///     <id>http://arxiv.org/abs/1234.5678v1</id>
///     <title>A Paper</title>
///     <summary>An abstract.</summary>
///   </entry>
/// </feed>"#;
///
/// let records = parse_feed(xml).unwrap();
/// assert_eq!(records.len(), 1);
/// assert_eq!(records[0].title, "A Paper");
/// ```
pub fn parse_feed(xml: &str) -> Result<Vec<PaperRecord>, SearchBackendError> {
    let mut reader = NsReader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut records = Vec::new();
    let mut skipped = 0usize;
    let mut depth = 0usize;
    let mut saw_feed = false;
    let mut entry: Option<EntryFields> = None;
    let mut current: Option<(Field, String)> = None;

    loop {
        let (ns, event) = match reader.read_resolved_event() {
            Ok(pair) => pair,
            Err(e) => {
                return Err(SearchBackendError::Parse(format!(
                    "XML error at position {}: {}",
                    reader.error_position(),
                    e
                )));
            }
        };
        let is_atom = matches!(ns, ResolveResult::Bound(Namespace(n)) if n == ATOM_NS);

        match event {
            Event::Start(e) => {
                depth += 1;
                let local = e.local_name();

                if depth == 1 {
                    if !(is_atom && local.as_ref() == b"feed") {
                        return Err(SearchBackendError::Parse(format!(
                            "expected Atom <feed> root element, found <{}>",
                            String::from_utf8_lossy(e.name().as_ref())
                        )));
                    }
                    saw_feed = true;
                } else if depth == ENTRY_DEPTH && is_atom && local.as_ref() == b"entry" {
                    entry = Some(EntryFields::default());
                } else if depth == ENTRY_DEPTH + 1 && entry.is_some() && is_atom {
                    current = match local.as_ref() {
                        b"title" => Some((Field::Title, String::new())),
                        b"summary" => Some((Field::Summary, String::new())),
                        b"id" => Some((Field::Id, String::new())),
                        _ => None,
                    };
                }
            }
            Event::Empty(e) => {
                if depth == 0 && !saw_feed {
                    if is_atom && e.local_name().as_ref() == b"feed" {
                        saw_feed = true;
                        continue;
                    }
                    return Err(SearchBackendError::Parse(format!(
                        "expected Atom <feed> root element, found <{}/>",
                        String::from_utf8_lossy(e.name().as_ref())
                    )));
                }
            }
            Event::Text(t) => {
                if let Some((_, buf)) = current.as_mut() {
                    match t.unescape() {
                        Ok(text) => {
                            buf.push(' ');
                            buf.push_str(&text);
                        }
                        Err(e) => {
                            debug!(error = %e, "undecodable text in feed entry");
                            if let Some(fields) = entry.as_mut() {
                                fields.malformed = true;
                            }
                        }
                    }
                }
            }
            Event::CData(c) => {
                if let Some((_, buf)) = current.as_mut() {
                    buf.push(' ');
                    buf.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Event::End(_) => {
                if depth == ENTRY_DEPTH + 1
                    && let (Some(fields), Some((field, text))) = (entry.as_mut(), current.take())
                {
                    fields.set(field, text);
                } else if depth == ENTRY_DEPTH
                    && let Some(fields) = entry.take()
                {
                    match fields.into_record() {
                        Some(record) => records.push(record),
                        None => skipped += 1,
                    }
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_feed {
        return Err(SearchBackendError::Parse(
            "expected Atom <feed> root element, found no elements".to_string(),
        ));
    }
    if depth != 0 {
        return Err(SearchBackendError::Parse(
            "feed ended before all elements were closed".to_string(),
        ));
    }

    debug!(records = records.len(), skipped, "parsed arXiv feed");
    Ok(records)
}

/// Collapses runs of whitespace (the API wraps titles and abstracts) to single spaces.
fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
