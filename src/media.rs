//! Media reference validation and identifier extraction.
//!
//! A media reference is whatever the user typed or picked from the search
//! suggestions. [`validate`] decides whether it looks like a playable link and
//! [`extract_id`] pulls out the identifier the video page is opened with.

use std::fmt;
use std::net::SocketAddr;
use std::sync::OnceLock;

use regex::Regex;
use url::Url;

use crate::error::MediaError;

/// Longest input still checked against the short root form.
const SHORT_ROOT_MAX_LEN: usize = 32;
/// Characters of a long reference checked against the base URL form.
const BASE_PREFIX_LEN: usize = 24;
/// Characters inspected when deciding between "play this URL" and "search".
const URL_PREFIX_LEN: usize = 8;
/// Watch identifiers are always this long.
const WATCH_ID_LEN: usize = 11;

const PLAYLIST_MARKER: &str = "list=";
const WATCH_MARKER: &str = "v=";
const ARGUMENT_SEPARATOR: char = '&';
const PATH_SEPARATOR: char = '/';

/// `scheme://[www.]host.tld/`, anchored at the start only.
fn root_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^https?://(www\.)?[A-Za-z]+\.[A-Za-z]+/").expect("root pattern is valid")
    })
}

fn scheme_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^https?://").expect("scheme pattern is valid"))
}

/// Canonical identifier of a video or playlist.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaId(String);

impl MediaId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for MediaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What the owning application should do with raw input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// Nothing typed; clear the suggestions.
    Empty,
    /// Input starts like a link; resolve and play it.
    MediaUrl,
    /// Anything else goes to the search provider.
    SearchTerm,
}

/// Returns the first `n` characters of `s` (all of it when shorter).
fn char_prefix(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((end, _)) => &s[..end],
        None => s,
    }
}

/// Checks whether `reference` has an acceptable media link shape.
///
/// Up to 32 characters the whole input must start with a short root
/// (`https://youtu.be/`). Longer input only needs its first 24 characters to
/// form a base URL (`https://www.youtube.com/`).
pub fn validate(reference: &str) -> bool {
    if reference.chars().count() <= SHORT_ROOT_MAX_LEN {
        root_pattern().is_match(reference)
    } else {
        root_pattern().is_match(char_prefix(reference, BASE_PREFIX_LEN))
    }
}

/// Result of one extraction rule.
#[derive(Debug, PartialEq, Eq)]
enum Attempt {
    /// The rule's marker is absent; try the next rule.
    NotApplicable,
    Matched(MediaId),
    /// The marker is present but malformed; stop.
    Failed,
}

type Extractor = fn(&str) -> Attempt;

/// Extraction rules in priority order.
const EXTRACTORS: [(&str, Extractor); 3] = [
    ("playlist", from_playlist),
    ("watch", from_watch),
    ("trailing segment", from_trailing_segment),
];

/// `list=<id>[&...]`. An empty value counts as absent.
fn from_playlist(reference: &str) -> Attempt {
    let Some((_, tail)) = reference.split_once(PLAYLIST_MARKER) else {
        return Attempt::NotApplicable;
    };
    let id = tail.split_once(ARGUMENT_SEPARATOR).map_or(tail, |(id, _)| id);

    if id.is_empty() {
        Attempt::NotApplicable
    } else {
        Attempt::Matched(MediaId(id.to_owned()))
    }
}

/// `v=<11 characters>`.
fn from_watch(reference: &str) -> Attempt {
    let Some((_, tail)) = reference.split_once(WATCH_MARKER) else {
        return Attempt::NotApplicable;
    };

    if tail.chars().count() < WATCH_ID_LEN {
        return Attempt::Failed;
    }

    Attempt::Matched(MediaId(char_prefix(tail, WATCH_ID_LEN).to_owned()))
}

/// Everything after the last `/`, used by shortened links.
fn from_trailing_segment(reference: &str) -> Attempt {
    match reference.rsplit_once(PATH_SEPARATOR) {
        Some((_, segment)) if !segment.is_empty() => Attempt::Matched(MediaId(segment.to_owned())),
        _ => Attempt::Failed,
    }
}

/// Extracts the media identifier from `reference`.
///
/// Rules are tried in order: playlist parameter, watch parameter, trailing
/// path segment. The first rule whose marker is present decides the outcome.
///
/// # Errors
///
/// [`MediaError::NoIdentifierFound`] when no rule produces an identifier.
pub fn extract_id(reference: &str) -> Result<MediaId, MediaError> {
    for (rule, extractor) in EXTRACTORS {
        match extractor(reference) {
            Attempt::NotApplicable => continue,
            Attempt::Matched(id) => {
                tracing::trace!(rule, id = %id, "Media id extracted");
                return Ok(id);
            }
            Attempt::Failed => {
                tracing::debug!(rule, reference, "Media id rule failed");
                break;
            }
        }
    }

    Err(MediaError::NoIdentifierFound {
        reference: reference.to_owned(),
    })
}

/// Validates `reference` and extracts its identifier.
///
/// # Errors
///
/// [`MediaError::InvalidMediaReference`] if validation fails, otherwise the
/// errors of [`extract_id`].
pub fn resolve(reference: &str) -> Result<MediaId, MediaError> {
    if !validate(reference) {
        return Err(MediaError::InvalidMediaReference {
            reference: reference.to_owned(),
        });
    }

    extract_id(reference)
}

/// Decides whether raw input is a link to play or a term to search for.
pub fn classify_input(input: &str) -> InputKind {
    if input.trim().is_empty() {
        InputKind::Empty
    } else if input.chars().count() >= URL_PREFIX_LEN
        && scheme_pattern().is_match(char_prefix(input, URL_PREFIX_LEN))
    {
        InputKind::MediaUrl
    } else {
        InputKind::SearchTerm
    }
}

/// URL the embedded browser is pointed at to play `id`.
///
/// # Errors
///
/// [`MediaError::PlaybackUrl`] if the identifier does not form a valid URL.
pub fn playback_url(addr: SocketAddr, id: &MediaId) -> Result<Url, MediaError> {
    Url::parse(&format!("http://{addr}/?mediaUrl={id}")).map_err(|e| MediaError::PlaybackUrl {
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> MediaId {
        MediaId(s.to_owned())
    }

    #[test]
    fn watch_url_is_valid() {
        let reference = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

        assert!(validate(reference));
        assert_eq!(extract_id(reference).unwrap(), id("dQw4w9WgXcQ"));
    }

    #[test]
    fn short_link_is_valid() {
        let reference = "https://youtu.be/dQw4w9WgXcQ";

        assert!(validate(reference));
        assert_eq!(extract_id(reference).unwrap(), id("dQw4w9WgXcQ"));
    }

    #[test]
    fn playlist_stops_at_argument_separator() {
        let reference = "https://www.youtube.com/playlist?list=PL1234&index=2";

        assert!(validate(reference));
        assert_eq!(extract_id(reference).unwrap(), id("PL1234"));
    }

    #[test]
    fn playlist_wins_over_watch() {
        let reference = "https://www.youtube.com/watch?v=dQw4w9WgXcQ&list=PLabcdef";

        assert_eq!(extract_id(reference).unwrap(), id("PLabcdef"));
    }

    #[test]
    fn not_a_url() {
        assert!(!validate("not a url"));
        assert_eq!(
            extract_id("not a url"),
            Err(MediaError::NoIdentifierFound {
                reference: "not a url".to_owned()
            })
        );
        assert!(matches!(
            resolve("not a url"),
            Err(MediaError::InvalidMediaReference { .. })
        ));
    }

    #[test]
    fn short_inputs_without_root_are_invalid() {
        for s in [
            "",
            " ",
            "\t\n",
            "youtube.com/",
            "ftp://www.youtube.com/",
            "https://www.youtube.com",
            "https://youtu.be",
            "https://127.0.0.1/",
            "http:/youtu.be/abc",
            "watch?v=dQw4w9WgXcQ",
        ] {
            assert!(s.chars().count() <= 32);
            assert!(!validate(s), "{s:?} should be invalid");
        }
    }

    #[test]
    fn short_root_alone_is_valid() {
        assert!(validate("https://youtu.be/"));
        assert!(validate("http://www.youtube.com/"));
    }

    #[test]
    fn long_input_only_checks_prefix() {
        let long = "https://www.youtube.com/anything at all, even spaces";
        assert!(validate(long));

        let long_bad = "https://www.you-tube.com/watch?v=dQw4w9WgXcQ";
        assert!(!validate(long_bad));
    }

    #[test]
    fn multibyte_input_does_not_split_characters() {
        assert!(!validate("ééééééééééééééééééééééééééééééééééé"));
        assert_eq!(classify_input("éééééééé"), InputKind::SearchTerm);
    }

    #[test]
    fn playlist_rule() {
        assert_eq!(from_playlist("https://a.b/p?list=PLx"), Attempt::Matched(id("PLx")));
        assert_eq!(from_playlist("https://a.b/p?index=1"), Attempt::NotApplicable);
        assert_eq!(from_playlist("https://a.b/p?list=&v=1"), Attempt::NotApplicable);
    }

    #[test]
    fn empty_playlist_falls_through_to_watch() {
        let reference = "https://www.youtube.com/watch?list=&v=dQw4w9WgXcQ";

        assert_eq!(extract_id(reference).unwrap(), id("dQw4w9WgXcQ"));
    }

    #[test]
    fn watch_rule() {
        assert_eq!(
            from_watch("https://a.b/watch?v=dQw4w9WgXcQextra"),
            Attempt::Matched(id("dQw4w9WgXcQ"))
        );
        assert_eq!(from_watch("https://a.b/watch?v=short"), Attempt::Failed);
        assert_eq!(from_watch("https://a.b/watch"), Attempt::NotApplicable);
    }

    #[test]
    fn short_watch_id_does_not_fall_back_to_segment() {
        assert!(matches!(
            extract_id("https://www.youtube.com/watch?v=short"),
            Err(MediaError::NoIdentifierFound { .. })
        ));
    }

    #[test]
    fn trailing_segment_rule() {
        assert_eq!(
            from_trailing_segment("https://youtu.be/abc"),
            Attempt::Matched(id("abc"))
        );
        assert_eq!(from_trailing_segment("https://youtu.be/"), Attempt::Failed);
        assert_eq!(from_trailing_segment("no separator"), Attempt::Failed);
    }

    #[test]
    fn resolve_valid_reference() {
        assert_eq!(
            resolve("https://youtu.be/dQw4w9WgXcQ").unwrap(),
            id("dQw4w9WgXcQ")
        );
    }

    #[test]
    fn resolve_reports_missing_identifier() {
        assert!(matches!(
            resolve("https://youtu.be/"),
            Err(MediaError::NoIdentifierFound { .. })
        ));
    }

    #[test]
    fn invalid_and_missing_identifier_read_the_same() {
        let invalid = MediaError::InvalidMediaReference {
            reference: String::new(),
        };
        let missing = MediaError::NoIdentifierFound {
            reference: String::new(),
        };

        assert_eq!(invalid.user_message(), missing.user_message());
    }

    #[test]
    fn classify() {
        assert_eq!(classify_input(""), InputKind::Empty);
        assert_eq!(classify_input("   "), InputKind::Empty);
        assert_eq!(classify_input("https://youtu.be/x"), InputKind::MediaUrl);
        assert_eq!(classify_input("http://x"), InputKind::MediaUrl);
        assert_eq!(classify_input("https:/"), InputKind::SearchTerm);
        assert_eq!(classify_input("never gonna give you up"), InputKind::SearchTerm);
    }

    #[test]
    fn playback_url_embeds_id() {
        let addr: SocketAddr = "127.0.0.1:54523".parse().unwrap();
        let url = playback_url(addr, &id("dQw4w9WgXcQ")).unwrap();

        assert_eq!(url.as_str(), "http://127.0.0.1:54523/?mediaUrl=dQw4w9WgXcQ");
        assert_eq!(url.query(), Some("mediaUrl=dQw4w9WgXcQ"));
    }
}
