//! `[playlist]` (PLS) parser.
//!
//! ```text
//! [playlist]
//! File1=http://stream.example.org/live
//! Title1=Example Radio
//! Length1=-1
//! NumberOfEntries=1
//! Version=2
//! ```
//!
//! Entries come out in ascending index order whatever the line order in
//! the file. Keys with a malformed index and indices without a `File` are
//! skipped with a warning.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use super::{resolve, Candidate, CandidateParser, Candidates};
use crate::mime::{MimeType, PLS_TYPES};

pub struct PlsParser;

impl CandidateParser for PlsParser {
    fn name(&self) -> &'static str {
        "pls"
    }

    fn supported_types(&self) -> &[&str] {
        PLS_TYPES
    }

    fn parse(&self, body: &str, base_url: &str) -> Candidates {
        Box::new(parse_playlist(body, base_url).into_iter())
    }
}

#[derive(Debug, Default)]
struct Entry {
    file: Option<String>,
    title: Option<String>,
}

/// Parse a PLS body into candidates hinted as `audio/*`.
pub fn parse_playlist(body: &str, base_url: &str) -> Vec<Candidate> {
    let base = url::Url::parse(base_url).ok();
    let mut entries: BTreeMap<u32, Entry> = BTreeMap::new();
    let mut declared: Option<u32> = None;

    for line in body.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('[') || line.starts_with(';') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            debug!(line, "Ignoring line without '='");
            continue;
        };
        let key = key.trim().to_ascii_lowercase();
        let value = value.trim();

        if key == "numberofentries" {
            match value.parse() {
                Ok(n) => declared = Some(n),
                Err(_) => warn!(value, "Malformed NumberOfEntries"),
            }
            continue;
        }

        let (field, index) = if let Some(index) = key.strip_prefix("file") {
            ("file", index)
        } else if let Some(index) = key.strip_prefix("title") {
            ("title", index)
        } else if let Some(index) = key.strip_prefix("length") {
            ("length", index)
        } else {
            continue;
        };

        let index = match index.parse::<u32>() {
            Ok(n) if n > 0 => n,
            _ => {
                warn!(key = %key, "Skipping playlist key with malformed index");
                continue;
            }
        };

        let entry = entries.entry(index).or_default();
        match field {
            "file" => entry.file = Some(value.to_string()),
            "title" => entry.title = Some(value.to_string()),
            _ => {}
        }
    }

    if let Some(declared) = declared {
        if (1..=declared).any(|n| entries.get(&n).map_or(true, |e| e.file.is_none())) {
            warn!(declared, found = entries.len(), "Playlist entries missing");
        }
    }

    let hint = MimeType::any_audio();
    entries
        .into_iter()
        .filter_map(|(index, entry)| {
            let Some(file) = entry.file else {
                warn!(index, "Skipping playlist entry without File");
                return None;
            };
            let Some(url) = resolve(base.as_ref(), &file) else {
                warn!(index, file = %file, "Skipping unresolvable playlist entry");
                return None;
            };
            Some(Candidate::new(url, entry.title.unwrap_or_default()).with_hint(hint.clone()))
        })
        .collect()
}
