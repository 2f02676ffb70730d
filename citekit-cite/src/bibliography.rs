//! Bibliography detection and reference entry parsing.

use std::sync::LazyLock;

use citekit_core::Reference;
use regex::Regex;
use tracing::debug;

static HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:references|bibliography|works\s+cited|literature\s+cited)\b[ \t]*:?")
        .expect("unreachable error: failed to compile bibliography heading pattern")
});

static LABELED_ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*\[(\d{1,3})\][ \t]*")
        .expect("unreachable error: failed to compile labeled entry pattern")
});

static NUMBERED_ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(\d{1,3})\.[ \t]+")
        .expect("unreachable error: failed to compile numbered entry pattern")
});

static BLANK_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\n[ \t]*\n").expect("unreachable error: failed to compile blank line pattern")
});

static YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:18|19|20)\d{2}[a-z]?\b")
        .expect("unreachable error: failed to compile year pattern")
});

/// Where the bibliography sits inside a paper's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BibliographyRegion {
    /// Absolute offset of the heading. In-text markers at or past this
    /// offset belong to the bibliography, not the body.
    pub heading_start: usize,
    /// Absolute offset where entry text begins.
    pub body_start: usize,
}

/// Find the bibliography heading, if any.
///
/// A candidate heading must either start its own line (optionally
/// prefixed by a section number) or carry a trailing colon, which
/// covers inline forms such as `... References: Smith, J. 2020. ...`.
/// The last candidate wins so that mentions of the word "references"
/// in the body do not end the scan early.
pub(crate) fn detect(text: &str) -> Option<BibliographyRegion> {
    let mut region = None;
    for m in HEADING.find_iter(text) {
        let line_start = text[..m.start()].rfind('\n').map(|p| p + 1).unwrap_or(0);
        let prefix = &text[line_start..m.start()];
        let own_line =
            prefix.chars().all(|c| c == ' ' || c == '\t' || c == '.' || c.is_ascii_digit());
        let has_colon = m.as_str().ends_with(':');
        if !(own_line || has_colon) {
            continue;
        }

        let mut body_start = m.end();
        while body_start < text.len() && text.as_bytes()[body_start].is_ascii_whitespace() {
            body_start += 1;
        }
        region = Some(BibliographyRegion { heading_start: m.start(), body_start });
    }
    region
}

/// Parse reference entries out of the bibliography body.
///
/// Entry boundaries are tried in order: `[n]` labels at line starts,
/// `n.` numbering at line starts, blank-line separation, and finally
/// one entry per line. At most `max` entries are kept.
pub(crate) fn split_entries(body: &str, max: usize) -> Vec<Reference> {
    let mut entries = labeled_entries(body, &LABELED_ENTRY);
    if entries.is_empty() {
        entries = labeled_entries(body, &NUMBERED_ENTRY);
    }
    if entries.is_empty() {
        let groups: Vec<String> = BLANK_LINE
            .split(body)
            .map(|g| g.split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|g| !g.is_empty())
            .collect();
        let lines: Vec<String> = if groups.len() > 1 {
            groups
        } else {
            body.lines().map(|l| l.trim().to_string()).filter(|l| !l.is_empty()).collect()
        };
        entries = lines.into_iter().enumerate().map(|(i, text)| (i + 1, text)).collect();
    }

    if entries.len() > max {
        debug!(entry_count = entries.len(), max, "bibliography truncated");
        entries.truncate(max);
    }
    entries.into_iter().map(|(ordinal, text)| parse_reference(ordinal, &text)).collect()
}

/// Split on explicit `[n]` / `n.` labels, keeping the labeled ordinal.
fn labeled_entries(body: &str, pattern: &Regex) -> Vec<(usize, String)> {
    let marks: Vec<(usize, usize, usize)> = pattern
        .captures_iter(body)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let ordinal = caps.get(1)?.as_str().parse::<usize>().ok()?;
            Some((whole.start(), whole.end(), ordinal))
        })
        .collect();

    let mut entries = Vec::with_capacity(marks.len());
    for (i, &(_, text_start, ordinal)) in marks.iter().enumerate() {
        if ordinal == 0 {
            continue;
        }
        let text_end = marks.get(i + 1).map(|&(next_start, _, _)| next_start).unwrap_or(body.len());
        let text = body[text_start..text_end].split_whitespace().collect::<Vec<_>>().join(" ");
        if !text.is_empty() {
            entries.push((ordinal, text));
        }
    }
    entries
}

/// Best-effort split of an entry into author, year, and title fields.
fn parse_reference(ordinal: usize, text: &str) -> Reference {
    let year_match = YEAR.find(text);
    let year = year_match.and_then(|m| m.as_str()[..4].parse::<u16>().ok());

    let authors = year_match
        .map(|m| text[..m.start()].trim().trim_end_matches(['(', ',', ' ']).trim())
        .filter(|a| !a.is_empty())
        .map(str::to_string);

    let title = year_match
        .map(|m| {
            let rest = text[m.end()..].trim_start_matches([')', '.', ',', ';', ':', ' ']);
            rest.split_once('.').map(|(t, _)| t).unwrap_or(rest).trim()
        })
        .filter(|t| !t.is_empty())
        .map(str::to_string);

    Reference { ordinal, text: text.to_string(), authors, title, year }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_heading_on_its_own_line() {
        let text = "Body text.\n\nReferences\n[1] Smith, J. 2020. A Paper.";
        let region = detect(text).unwrap();
        assert_eq!(&text[region.heading_start..region.heading_start + 10], "References");
        assert!(text[region.body_start..].starts_with("[1]"));
    }

    #[test]
    fn detects_numbered_section_heading() {
        let text = "Intro.\n\n7. References\n[1] Smith, J. 2020. A Paper.";
        assert!(detect(text).is_some());
    }

    #[test]
    fn detects_inline_heading_with_colon() {
        let text = "Deep learning improved accuracy. References: Smith, J. 2020. Advances.";
        let region = detect(text).unwrap();
        assert!(text[region.body_start..].starts_with("Smith"));
    }

    #[test]
    fn body_mention_without_colon_is_not_a_heading() {
        let text = "We cross-check references against the index before shipping.";
        assert!(detect(text).is_none());
    }

    #[test]
    fn last_heading_wins() {
        let text = "As listed in the references section below.\n\nReferences\n[1] First entry 2019.";
        let region = detect(text).unwrap();
        assert!(text[region.body_start..].starts_with("[1]"));
    }

    #[test]
    fn splits_labeled_entries_and_keeps_ordinals() {
        let body = "[1] Smith, J. 2020. Deep Learning.\n[2] Jones, K. 2019. Shallow Learning.";
        let refs = split_entries(body, 100);
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].ordinal, 1);
        assert_eq!(refs[1].ordinal, 2);
        assert_eq!(refs[1].year, Some(2019));
    }

    #[test]
    fn splits_numbered_entries() {
        let body = "1. Smith, J. 2020. Deep Learning.\n2. Jones, K. 2019. Shallow Learning.";
        let refs = split_entries(body, 100);
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].ordinal, 1);
    }

    #[test]
    fn splits_blank_line_separated_entries() {
        let body = "Smith, J. 2020. Deep Learning.\n\nJones, K. 2019. Shallow Learning.";
        let refs = split_entries(body, 100);
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].ordinal, 1);
        assert_eq!(refs[1].ordinal, 2);
    }

    #[test]
    fn falls_back_to_one_entry_per_line() {
        let body = "Smith, J. 2020. Deep Learning.\nJones, K. 2019. Shallow Learning.";
        let refs = split_entries(body, 100);
        assert_eq!(refs.len(), 2);
    }

    #[test]
    fn entry_count_is_capped() {
        let body: String =
            (1..=30).map(|i| format!("[{i}] Author {i}. 2020. Title {i}.\n")).collect();
        let refs = split_entries(&body, 10);
        assert_eq!(refs.len(), 10);
        assert_eq!(refs.last().unwrap().ordinal, 10);
    }

    #[test]
    fn parses_author_year_title_fields() {
        let r = parse_reference(1, "Smith, J. 2020. Deep Learning Advances. Journal of ML.");
        assert_eq!(r.authors.as_deref(), Some("Smith, J."));
        assert_eq!(r.year, Some(2020));
        assert_eq!(r.title.as_deref(), Some("Deep Learning Advances"));
    }

    #[test]
    fn entry_without_year_keeps_raw_text_only() {
        let r = parse_reference(3, "Anonymous. Untitled manuscript.");
        assert_eq!(r.year, None);
        assert_eq!(r.authors, None);
        assert_eq!(r.title, None);
        assert_eq!(r.text, "Anonymous. Untitled manuscript.");
    }

    #[test]
    fn multiline_entry_is_joined() {
        let body = "[1] Smith, J. 2020.\n    Deep Learning Advances.\n[2] Jones, K. 2019. Title.";
        let refs = split_entries(body, 100);
        assert_eq!(refs[0].text, "Smith, J. 2020. Deep Learning Advances.");
    }
}
