//! Line-oriented M3U / extended M3U playlists.
//!
//! `#EXTINF:<length>,<title>` names the next URI line. Other `#` lines and
//! blank lines are ignored, relative URIs resolve against the playlist.

use tracing::debug;

use super::{resolve, Candidate, CandidateParser, Candidates};
use crate::mime::{MimeType, M3U_TYPES};

pub struct M3uParser;

impl CandidateParser for M3uParser {
    fn name(&self) -> &'static str {
        "m3u"
    }

    fn supported_types(&self) -> &[&str] {
        M3U_TYPES
    }

    fn parse(&self, body: &str, base_url: &str) -> Candidates {
        Box::new(parse_m3u(body, base_url).into_iter())
    }
}

/// Parse an M3U body into candidates hinted as `audio/*`.
pub fn parse_m3u(body: &str, base_url: &str) -> Vec<Candidate> {
    let base = url::Url::parse(base_url).ok();
    let hint = MimeType::any_audio();
    let mut pending_title: Option<String> = None;
    let mut entries = Vec::new();

    for line in body.lines().map(str::trim) {
        if line.is_empty() {
            continue;
        }
        if let Some(info) = line.strip_prefix("#EXTINF:") {
            pending_title = extinf_title(info).map(str::to_string);
            continue;
        }
        if line.starts_with('#') {
            continue;
        }

        let title = pending_title.take().unwrap_or_default();
        match resolve(base.as_ref(), line) {
            Some(url) => entries.push(Candidate::new(url, title).with_hint(hint.clone())),
            None => debug!(line, "Ignoring unresolvable playlist line"),
        }
    }

    entries
}

/// Title after the first comma that is not inside a quoted attribute.
fn extinf_title(info: &str) -> Option<&str> {
    let mut quoted = false;
    for (i, c) in info.char_indices() {
        match c {
            '"' => quoted = !quoted,
            ',' if !quoted => return Some(info[i + 1..].trim()),
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "http://example.org/radio/list.m3u";

    #[test]
    fn parses_extended_playlist() {
        let body = "#EXTM3U\n\
                    #EXTINF:-1,Morning Show\n\
                    http://stream.example.org/morning\n\
                    \n\
                    #EXTINF:123,Artist - Song\n\
                    song.mp3\n";
        let entries = parse_m3u(body, BASE);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title, "Morning Show");
        assert_eq!(entries[0].url, "http://stream.example.org/morning");
        assert_eq!(entries[1].title, "Artist - Song");
        assert_eq!(entries[1].url, "http://example.org/radio/song.mp3");
        assert_eq!(entries[1].mime_hint, Some(MimeType::any_audio()));
    }

    #[test]
    fn plain_playlist_has_empty_titles() {
        let entries = parse_m3u("http://x/a\nhttp://x/b\n", BASE);
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|c| c.title.is_empty()));
    }

    #[test]
    fn title_applies_to_next_uri_only() {
        let body = "#EXTINF:-1,First\nhttp://x/a\nhttp://x/b\n";
        let entries = parse_m3u(body, BASE);
        assert_eq!(entries[0].title, "First");
        assert_eq!(entries[1].title, "");
    }

    #[test]
    fn title_after_attributes() {
        let body = "#EXTINF:-1 tvg-name=\"a,b\" group-title=\"News\",Channel One\nhttp://x/one\n";
        assert_eq!(parse_m3u(body, BASE)[0].title, "Channel One");
    }

    #[test]
    fn title_may_contain_commas() {
        let body = "#EXTINF:200,Artist, The - Song\nhttp://x/s.mp3\n";
        assert_eq!(parse_m3u(body, BASE)[0].title, "Artist, The - Song");
    }
}
