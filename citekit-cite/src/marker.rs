//! In-text citation marker scanning.
//!
//! Markers are matched against passage text and reported with spans in
//! the owning paper's coordinates. A compound marker such as `[1, 4]`
//! or `(Smith, 2020; Jones, 2021)` is one marker with several parts;
//! the linker expands parts into individual citations.

use std::sync::LazyLock;

use citekit_core::{CitationKind, Span};
use regex::Regex;

/// An author-year segment: `Smith`, `Smith et al.`, or `Smith and Jones`.
const AUTHOR_SEGMENT: &str =
    r"[A-Z][A-Za-z'’-]*(?:\s+et\s+al\.?)?(?:\s+(?:and|&)\s+[A-Z][A-Za-z'’-]*)?";

static NUMERIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[(\d{1,3}(?:\s*,\s*\d{1,3})*)\]")
        .expect("unreachable error: failed to compile numeric marker pattern")
});

static PAREN_AUTHOR_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    let segment = format!(r"{AUTHOR_SEGMENT},?\s*(?:18|19|20)\d{{2}}[a-z]?");
    Regex::new(&format!(r"\(({segment}(?:\s*;\s*{segment})*)\)"))
        .expect("unreachable error: failed to compile author-year marker pattern")
});

static NARRATIVE_AUTHOR_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"\b({AUTHOR_SEGMENT})\s+\(((?:18|19|20)\d{{2}}[a-z]?)\)"))
        .expect("unreachable error: failed to compile narrative marker pattern")
});

static FOOTNOTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\x{2070}\x{B9}\x{B2}\x{B3}\x{2074}-\x{2079}]+")
        .expect("unreachable error: failed to compile footnote marker pattern")
});

static YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:18|19|20)\d{2}[a-z]?")
        .expect("unreachable error: failed to compile year pattern")
});

/// One resolvable unit inside a marker.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum MarkerPart {
    /// A bibliography ordinal, from numeric or footnote markers.
    Ordinal(usize),
    /// An author-year fragment, e.g. `authors: "Smith et al."` with
    /// `year: "2020a"`.
    AuthorYear { authors: String, year: String },
}

/// A citation marker found in text, in paper coordinates.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RawMarker {
    pub literal: String,
    pub kind: CitationKind,
    pub span: Span,
    pub parts: Vec<MarkerPart>,
}

/// Scan `text` for citation markers, offsetting spans by `base`.
///
/// When patterns produce overlapping matches, the first match wins in
/// the order numeric, parenthetical author-year, narrative author-year,
/// footnote. Results are ordered by span.
pub(crate) fn scan(text: &str, base: usize) -> Vec<RawMarker> {
    let mut markers: Vec<RawMarker> = Vec::new();

    for caps in NUMERIC.captures_iter(text) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else { continue };
        let parts: Vec<MarkerPart> = inner
            .as_str()
            .split(',')
            .filter_map(|t| t.trim().parse::<usize>().ok())
            .filter(|&n| n > 0)
            .map(MarkerPart::Ordinal)
            .collect();
        push_marker(&mut markers, whole.as_str(), CitationKind::Numeric, whole.range(), base, parts);
    }

    for caps in PAREN_AUTHOR_YEAR.captures_iter(text) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else { continue };
        let parts: Vec<MarkerPart> =
            inner.as_str().split(';').filter_map(parse_author_year).collect();
        push_marker(
            &mut markers,
            whole.as_str(),
            CitationKind::AuthorYear,
            whole.range(),
            base,
            parts,
        );
    }

    for caps in NARRATIVE_AUTHOR_YEAR.captures_iter(text) {
        let (Some(whole), Some(authors), Some(year)) = (caps.get(0), caps.get(1), caps.get(2))
        else {
            continue;
        };
        let parts = vec![MarkerPart::AuthorYear {
            authors: authors.as_str().to_string(),
            year: year.as_str().to_string(),
        }];
        push_marker(
            &mut markers,
            whole.as_str(),
            CitationKind::AuthorYear,
            whole.range(),
            base,
            parts,
        );
    }

    for m in FOOTNOTE.find_iter(text) {
        let Some(ordinal) = superscript_value(m.as_str()) else { continue };
        let parts = vec![MarkerPart::Ordinal(ordinal)];
        push_marker(&mut markers, m.as_str(), CitationKind::Footnote, m.range(), base, parts);
    }

    markers.sort_by_key(|m| m.span);
    markers
}

fn push_marker(
    markers: &mut Vec<RawMarker>,
    literal: &str,
    kind: CitationKind,
    range: std::ops::Range<usize>,
    base: usize,
    parts: Vec<MarkerPart>,
) {
    if parts.is_empty() {
        return;
    }
    let span = Span::new(base + range.start, base + range.end);
    if markers.iter().any(|m| m.span.overlaps(span)) {
        return;
    }
    markers.push(RawMarker { literal: literal.to_string(), kind, span, parts });
}

fn parse_author_year(segment: &str) -> Option<MarkerPart> {
    let year = YEAR.find(segment)?;
    let authors = segment[..year.start()].trim().trim_end_matches(',').trim();
    if authors.is_empty() {
        return None;
    }
    Some(MarkerPart::AuthorYear { authors: authors.to_string(), year: year.as_str().to_string() })
}

fn superscript_value(s: &str) -> Option<usize> {
    let mut value: usize = 0;
    for c in s.chars() {
        let digit = match c {
            '\u{2070}' => 0,
            '\u{00B9}' => 1,
            '\u{00B2}' => 2,
            '\u{00B3}' => 3,
            '\u{2074}' => 4,
            '\u{2075}' => 5,
            '\u{2076}' => 6,
            '\u{2077}' => 7,
            '\u{2078}' => 8,
            '\u{2079}' => 9,
            _ => return None,
        };
        value = value.checked_mul(10)?.checked_add(digit)?;
    }
    (value > 0).then_some(value)
}
