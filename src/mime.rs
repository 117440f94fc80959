//! Media type classification.
//!
//! A [`MimeType`] is a normalized `type/subtype` pair: lower-cased, trimmed
//! and stripped of any `;`-delimited parameters. Classification works from
//! either a URL's file extension ([`MimeType::guess_from_url`]) or a
//! `Content-Type` header value ([`MimeType::from_header`]).
//!
//! | Family | Playable | Traversable |
//! |--------|----------|-------------|
//! | `audio/*`, `video/*` | yes | playlists only |
//! | `text/html`, `application/xhtml+xml` | no | yes |
//! | `application/pls+xml`, `application/vnd.apple.mpegurl`, ... | no | yes |
//! | everything else | no | no |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ClassificationError;

/// Markup types the link parser understands.
pub const HTML_TYPES: &[&str] = &["text/html", "application/xhtml+xml"];

/// `[playlist]` key/value files.
pub const PLS_TYPES: &[&str] = &["audio/x-scpls", "audio/scpls", "application/pls+xml"];

/// Line-oriented `#EXTM3U` playlists.
pub const M3U_TYPES: &[&str] = &[
    "audio/x-mpegurl",
    "audio/mpegurl",
    "application/x-mpegurl",
    "application/vnd.apple.mpegurl",
];

/// Extension → media type lookup used by [`MimeType::guess_from_url`].
const EXTENSIONS: &[(&str, &str)] = &[
    // markup
    ("html", "text/html"),
    ("htm", "text/html"),
    ("xhtml", "application/xhtml+xml"),
    // playlists
    ("pls", "audio/x-scpls"),
    ("m3u", "audio/x-mpegurl"),
    ("m3u8", "application/vnd.apple.mpegurl"),
    // audio
    ("mp3", "audio/mp3"),
    ("ogg", "audio/ogg"),
    ("oga", "audio/ogg"),
    ("opus", "audio/opus"),
    ("flac", "audio/flac"),
    ("wav", "audio/wav"),
    ("aac", "audio/aac"),
    ("m4a", "audio/mp4"),
    ("wma", "audio/x-ms-wma"),
    // video
    ("mp4", "video/mp4"),
    ("m4v", "video/mp4"),
    ("webm", "video/webm"),
    ("mkv", "video/x-matroska"),
    ("ogv", "video/ogg"),
    ("avi", "video/x-msvideo"),
    ("mov", "video/quicktime"),
    ("flv", "video/x-flv"),
    ("ts", "video/mp2t"),
    // images
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("svg", "image/svg+xml"),
    ("webp", "image/webp"),
    // documents
    ("txt", "text/plain"),
    ("css", "text/css"),
    ("js", "text/javascript"),
    ("json", "application/json"),
    ("xml", "application/xml"),
    ("pdf", "application/pdf"),
    ("zip", "application/zip"),
];

/// Normalized `type/subtype` media type.
///
/// Either component may be `*`, in which case [`MimeType::matches`] treats
/// it as a wildcard.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MimeType {
    kind: String,
    subtype: String,
}

impl MimeType {
    /// Parse a `Content-Type` header value.
    ///
    /// Parameters after the first `;` are dropped, the remainder is trimmed
    /// and lower-cased. `"text/HTML ; charset: utf8"` becomes `text/html`.
    pub fn from_header(value: &str) -> Result<Self, ClassificationError> {
        let essence = value.split(';').next().unwrap_or(value).trim().to_lowercase();

        let Some((kind, subtype)) = essence.split_once('/') else {
            return Err(ClassificationError(value.to_string()));
        };
        let (kind, subtype) = (kind.trim(), subtype.trim());

        let valid = |part: &str| {
            !part.is_empty() && !part.contains('/') && !part.chars().any(char::is_whitespace)
        };
        if !valid(kind) || !valid(subtype) {
            return Err(ClassificationError(value.to_string()));
        }

        Ok(Self {
            kind: kind.to_string(),
            subtype: subtype.to_string(),
        })
    }

    /// Guess the media type from a URL's file extension.
    ///
    /// Query and fragment are ignored and the extension is matched
    /// case-insensitively, so `pic.PNG?size=2` is `image/png`. Returns `None`
    /// for unknown or missing extensions.
    pub fn guess_from_url(url: &str) -> Option<Self> {
        let path = match url::Url::parse(url) {
            Ok(parsed) => parsed.path().to_string(),
            Err(_) => url
                .split(['?', '#'])
                .next()
                .unwrap_or(url)
                .to_string(),
        };

        let file = path.rsplit('/').next()?;
        let (_, ext) = file.rsplit_once('.')?;
        let ext = ext.to_ascii_lowercase();

        EXTENSIONS
            .iter()
            .find(|(known, _)| *known == ext)
            .map(|(_, mime)| Self::from_static(mime))
    }

    /// `audio/*`: the fallback for playlist entries nothing else could classify.
    pub fn any_audio() -> Self {
        Self::from_static("audio/*")
    }

    fn from_static(value: &str) -> Self {
        let (kind, subtype) = value.split_once('/').unwrap_or((value, "*"));
        Self {
            kind: kind.to_string(),
            subtype: subtype.to_string(),
        }
    }

    /// Returns `true` if `other` falls under this type, honouring `*` in
    /// either component of `self`.
    ///
    /// `audio/*` matches `audio/mp3`; `audio/mp3` does not match `audio/*`.
    pub fn matches(&self, other: &MimeType) -> bool {
        let kind_ok = self.kind == "*" || self.kind == other.kind;
        let subtype_ok = self.subtype == "*" || self.subtype == other.subtype;
        kind_ok && subtype_ok
    }

    /// Audio and video can be handed to a player directly.
    pub fn is_playable(&self) -> bool {
        matches!(self.kind.as_str(), "audio" | "video")
    }

    pub fn is_html(&self) -> bool {
        self.is_one_of(HTML_TYPES)
    }

    pub fn is_playlist(&self) -> bool {
        self.is_one_of(PLS_TYPES) || self.is_one_of(M3U_TYPES)
    }

    /// Types that list further streams and can be crawled into.
    pub fn is_traversable(&self) -> bool {
        self.is_html() || self.is_playlist()
    }

    /// Compare against a list of `type/subtype` strings.
    pub fn is_one_of(&self, types: &[&str]) -> bool {
        types.iter().any(|t| {
            t.split_once('/')
                .is_some_and(|(kind, subtype)| kind == self.kind && subtype == self.subtype)
        })
    }
}

impl fmt::Display for MimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.subtype)
    }
}

impl FromStr for MimeType {
    type Err = ClassificationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_header(s)
    }
}

impl TryFrom<String> for MimeType {
    type Error = ClassificationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_header(&value)
    }
}

impl From<MimeType> for String {
    fn from(value: MimeType) -> Self {
        value.to_string()
    }
}
