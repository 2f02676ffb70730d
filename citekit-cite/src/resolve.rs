//! Linking in-text markers to bibliography entries.

use citekit_core::Reference;

/// Look up a reference by its one-based ordinal.
pub(crate) fn resolve_ordinal(ordinal: usize, references: &[Reference]) -> Option<&Reference> {
    references.iter().find(|r| r.ordinal == ordinal)
}

/// Fuzzy-match an author-year marker against the bibliography.
///
/// Scores combine surname hits (weight 0.6) with a year match (weight
/// 0.4). The best entry scoring at or above `threshold` wins; returns
/// the winning ordinal and its score.
pub(crate) fn resolve_author_year(
    authors: &str,
    year: &str,
    references: &[Reference],
    threshold: f32,
) -> Option<(usize, f32)> {
    let surnames = surnames(authors);
    if surnames.is_empty() {
        return None;
    }
    let year_digits: String = year.chars().take(4).collect();

    let mut best: Option<(usize, f32)> = None;
    for reference in references {
        let haystack = reference.text.to_lowercase();
        let hits = surnames.iter().filter(|s| haystack.contains(s.as_str())).count();
        let name_score = hits as f32 / surnames.len() as f32;
        let year_hit = match reference.year {
            Some(y) => y.to_string() == year_digits,
            None => reference.text.contains(&year_digits),
        };
        let score = name_score * 0.6 + if year_hit { 0.4 } else { 0.0 };
        if score >= threshold && best.is_none_or(|(_, b)| score > b) {
            best = Some((reference.ordinal, score));
        }
    }
    best
}

/// Lowercased surnames from a marker's author fragment. `et al.` and
/// joining words are dropped.
fn surnames(authors: &str) -> Vec<String> {
    authors
        .split(|c: char| !(c.is_alphabetic() || c == '\'' || c == '’' || c == '-'))
        .filter(|t| t.len() > 1)
        .filter(|t| t.chars().next().is_some_and(char::is_uppercase))
        .map(str::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(ordinal: usize, text: &str, year: Option<u16>) -> Reference {
        Reference { ordinal, text: text.to_string(), authors: None, title: None, year }
    }

    #[test]
    fn ordinal_lookup_matches_labeled_ordinals() {
        let refs =
            vec![reference(4, "Smith 2020", Some(2020)), reference(7, "Jones 2019", Some(2019))];
        assert_eq!(resolve_ordinal(7, &refs).map(|r| r.ordinal), Some(7));
        assert!(resolve_ordinal(2, &refs).is_none());
    }

    #[test]
    fn surname_and_year_match_scores_one() {
        let refs = vec![reference(1, "Smith, J. 2020. Deep Learning Advances.", Some(2020))];
        let (ordinal, score) = resolve_author_year("Smith", "2020", &refs, 0.7).unwrap();
        assert_eq!(ordinal, 1);
        assert!((score - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn year_mismatch_alone_falls_below_default_threshold() {
        let refs = vec![reference(1, "Smith, J. 2020. Deep Learning Advances.", Some(2020))];
        // Surnames alone score 0.6 < 0.7.
        assert!(resolve_author_year("Smith", "1999", &refs, 0.7).is_none());
    }

    #[test]
    fn et_al_matches_on_lead_surname() {
        let refs = vec![reference(
            2,
            "Vaswani, A., Shazeer, N., et al. 2017. Attention Is All You Need.",
            Some(2017),
        )];
        let (ordinal, _) = resolve_author_year("Vaswani et al.", "2017", &refs, 0.7).unwrap();
        assert_eq!(ordinal, 2);
    }

    #[test]
    fn two_author_marker_needs_both_surnames_for_full_name_score() {
        let refs = vec![reference(1, "Smith, J. and Jones, K. 2020. A Study.", Some(2020))];
        let (_, score) = resolve_author_year("Smith and Jones", "2020", &refs, 0.7).unwrap();
        assert!((score - 1.0).abs() < f32::EPSILON);

        let partial = vec![reference(1, "Smith, J. 2020. A Study.", Some(2020))];
        let (_, score) = resolve_author_year("Smith and Jones", "2020", &partial, 0.5).unwrap();
        assert!((score - 0.7).abs() < 1e-6);
    }

    #[test]
    fn best_scoring_entry_wins() {
        let refs = vec![
            reference(1, "Smith, A. 1999. Older Work.", Some(1999)),
            reference(2, "Smith, J. 2020. Newer Work.", Some(2020)),
        ];
        let (ordinal, _) = resolve_author_year("Smith", "2020", &refs, 0.7).unwrap();
        assert_eq!(ordinal, 2);
    }

    #[test]
    fn year_suffix_letter_is_ignored_for_matching() {
        let refs = vec![reference(1, "Smith, J. 2020. Paper.", Some(2020))];
        assert!(resolve_author_year("Smith", "2020b", &refs, 0.7).is_some());
    }

    #[test]
    fn surname_splitting_drops_joiners() {
        assert_eq!(surnames("Smith and Jones"), vec!["smith", "jones"]);
        assert_eq!(surnames("Vaswani et al."), vec!["vaswani"]);
        assert_eq!(surnames("O'Brien"), vec!["o'brien"]);
    }
}
