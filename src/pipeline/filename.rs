//! Canonical cache filenames.
//!
//! Cached tracks are named `"{title} - {artists}.mp3"` after sanitization, so
//! the same resolved metadata always maps to the same cache entry.

/// File extension of every cache entry.
pub const AUDIO_EXT: &str = "mp3";

/// Strip a name down to a filesystem-safe form.
///
/// Keeps alphanumerics, spaces, hyphens and underscores, collapses internal
/// whitespace and trims the ends. Applying it twice is a no-op.
pub fn sanitize(name: &str) -> String {
    let collapsed = name.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect::<String>()
        .trim_end()
        .to_string()
}

/// Build the canonical `"title - artists.mp3"` cache filename.
///
/// Falls back to a reduced form when either part sanitizes to nothing, and to
/// `"unknown.mp3"` when both do.
pub fn make_filename(title: &str, artists: &str) -> String {
    let t = sanitize(title);
    let a = sanitize(artists);
    match (t.is_empty(), a.is_empty()) {
        (false, false) => format!("{} - {}.{}", t, a, AUDIO_EXT),
        (false, true) => format!("{}.{}", t, AUDIO_EXT),
        (true, false) => format!("{}.{}", a, AUDIO_EXT),
        (true, true) => format!("unknown.{}", AUDIO_EXT),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_keeps_safe_characters() {
        assert_eq!(sanitize("My Song - part_2"), "My Song - part_2");
    }

    #[test]
    fn sanitize_strips_unsafe_characters() {
        assert_eq!(sanitize("a/b\\c:d*e?\"f<g>h|i"), "abcdefghi");
        assert_eq!(sanitize("song. (remix)!"), "song remix");
    }

    #[test]
    fn sanitize_collapses_whitespace() {
        assert_eq!(sanitize("  too   many\tspaces \n"), "too many spaces");
    }

    #[test]
    fn sanitize_is_idempotent() {
        for input in [
            "Song / Artist: feat. Someone",
            "  spaced   out  ",
            "plain",
            "***",
            "",
            "émigré — dash",
        ] {
            let once = sanitize(input);
            assert_eq!(sanitize(&once), once, "not idempotent for {:?}", input);
        }
    }

    #[test]
    fn make_filename_joins_title_and_artists() {
        assert_eq!(make_filename("Song", "Artist"), "Song - Artist.mp3");
        assert_eq!(
            make_filename("Song: Reprise", "A, B"),
            "Song Reprise - A B.mp3"
        );
    }

    #[test]
    fn make_filename_reduced_forms() {
        assert_eq!(make_filename("Song", ""), "Song.mp3");
        assert_eq!(make_filename("", "Artist"), "Artist.mp3");
        assert_eq!(make_filename("", ""), "unknown.mp3");
        // all-unsafe parts reduce the same way as empty ones
        assert_eq!(make_filename("???", "Artist"), "Artist.mp3");
    }

    #[test]
    fn make_filename_distinct_pairs_stay_distinct() {
        let a = make_filename("Song", "Artist");
        let b = make_filename("Song", "Other Artist");
        let c = make_filename("Other Song", "Artist");
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_ne!(b, c);
    }
}
