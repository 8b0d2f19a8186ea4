//! Fragment extraction from delimiter-less payload chunks
//!
//! One chunk from the reader may hold several JSON documents back to
//! back, with no separator. The concatenation is not itself valid JSON,
//! so the only cue is the boundary where one document's closing brace
//! touches the next document's opening brace. Splitting on that literal
//! `}{` and reinserting the braces recovers standalone documents. The
//! scheme assumes no document's own content ever contains the boundary
//! sequence, which holds for the reader's event shape.

use crate::tag_data::TagDataEvent;
use std::borrow::Cow;

/// Outcome of extracting one payload chunk
#[derive(Debug, Default)]
pub struct Extraction {
    /// Successfully parsed events, in document order
    pub events: Vec<TagDataEvent>,
    /// Fragments the payload split into
    pub fragments: usize,
    /// Fragments that failed to parse after reconstruction
    pub parse_failures: usize,
}

/// Recover individual tag data events from a raw payload chunk.
///
/// The payload is decoded as UTF-8 with lossy replacement, so invalid
/// byte sequences spoil at worst their own fragment. A fragment that
/// fails to parse is counted and skipped; it never blocks its siblings.
pub fn extract_tag_data_events(payload: &[u8]) -> Extraction {
    let text = String::from_utf8_lossy(payload);
    let fragments: Vec<&str> = text.split("}{").collect();
    let count = fragments.len();

    let mut extraction = Extraction {
        fragments: count,
        ..Default::default()
    };

    for (index, fragment) in fragments.iter().enumerate() {
        // A lone fragment was never split and needs no reconstruction
        let document: Cow<str> = if count == 1 {
            Cow::Borrowed(fragment)
        } else if index == 0 {
            Cow::Owned(format!("{}{}", fragment, '}'))
        } else if index == count - 1 {
            Cow::Owned(format!("{}{}", '{', fragment))
        } else {
            Cow::Owned(format!("{{{}}}", fragment))
        };

        match serde_json::from_str::<TagDataEvent>(&document) {
            Ok(event) => extraction.events.push(event),
            Err(_) => extraction.parse_failures += 1,
        }
    }

    extraction
}
