//! Canonical title cleaning.
//!
//! Display titles from the media catalog carry decorations ("(Official
//! Audio)", artist prefixes, featuring credits) that hurt both metadata
//! matching and filenames. `normalize_title` reduces a raw title to its
//! canonical form. The function is idempotent: applying it to its own
//! output returns the same string.

/// Decorative phrases stripped from either end of a title, checked
/// case-insensitively in order.
const DECORATIONS: &[&str] = &[
    "(Official Music Video)",
    "(Official Video)",
    "(Official Audio)",
    "(Lyric Video)",
    "(Music Video)",
    "[Official Music Video]",
    "[Official Video]",
    "[Official Audio]",
    "[Lyric Video]",
    "[Music Video]",
    "(HD)",
    "(HQ)",
    "(4K)",
    "(1080p)",
    "(720p)",
    "(Official)",
    "(Audio)",
    "(Lyrics)",
    "Official Video",
    "Official Audio",
    "Lyric Video",
    "Music Video",
    "Official Music Video",
];

/// Tokens that introduce a featuring credit. Everything from the first
/// occurrence onwards is dropped, as long as it is not at position 0.
const FEAT_INDICATORS: &[&str] = &["ft.", "feat.", "featuring", "ft", "feat"];

/// Reduce a raw display title to its canonical form.
pub fn normalize_title(raw: &str) -> String {
    let mut title = raw.trim().to_string();

    // "Artist - Title" prefixes. Applied until no separator remains so the
    // result is stable under re-normalization.
    while let Some(idx) = title.find(" - ") {
        title = title[idx + 3..].trim().to_string();
    }

    // Known decorations at either end, until a full pass changes nothing.
    loop {
        let mut changed = false;
        for phrase in DECORATIONS {
            if let Some(head) = strip_suffix_ci(&title, phrase) {
                title = head.trim().to_string();
                changed = true;
            }
            if let Some(tail) = strip_prefix_ci(&title, phrase) {
                title = tail.trim().to_string();
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    // Featuring credits: cut at the earliest indicator past the start.
    let lower = title.to_lowercase();
    let feat_at = FEAT_INDICATORS
        .iter()
        .filter_map(|indicator| lower.find(indicator))
        .filter(|&idx| idx > 0)
        .min();
    if let Some(idx) = feat_at {
        if title.is_char_boundary(idx) {
            title.truncate(idx);
            title = title.trim().to_string();
        }
    }

    // Trailing parenthesized or bracketed groups.
    while title.ends_with(')') {
        match title.rfind('(') {
            Some(idx) => {
                title.truncate(idx);
                title = title.trim_end().to_string();
            }
            None => break,
        }
    }
    while title.ends_with(']') {
        match title.rfind('[') {
            Some(idx) => {
                title.truncate(idx);
                title = title.trim_end().to_string();
            }
            None => break,
        }
    }

    title.trim().to_string()
}

fn strip_suffix_ci<'a>(text: &'a str, suffix: &str) -> Option<&'a str> {
    if text.len() < suffix.len() {
        return None;
    }
    let split = text.len() - suffix.len();
    let tail = text.get(split..)?;
    if tail.eq_ignore_ascii_case(suffix) {
        text.get(..split)
    } else {
        None
    }
}

fn strip_prefix_ci<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        text.get(prefix.len()..)
    } else {
        None
    }
}
