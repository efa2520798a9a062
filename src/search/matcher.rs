//! Case-insensitive text matching and highlight spans.
//!
//! Text is folded to lowercase one character at a time, so character offsets in
//! the folded text are also character offsets in the original. Highlights are
//! reported as `[start, end)` character offsets into the field they came from.
//!
//! # Tiers
//!
//! | Tier                | Base score |
//! |---------------------|-----------:|
//! | Title prefix        | 400        |
//! | Title substring     | 300        |
//! | Description         | 200        |
//! | Fuzzy title         | 100        |
//! | Fuzzy description   | 50         |
//!
//! Fuzzy scores lose [`FUZZY_DISTANCE_PENALTY`] per edit so a closer typo ranks
//! above a farther one, but never reach an exact tier.

use super::query::SearchOptions;
use serde::{Deserialize, Serialize};

/// Score subtracted per edit in a fuzzy match.
pub const FUZZY_DISTANCE_PENALTY: u32 = 10;

/// Queries shorter than this never use the fuzzy fallback; with one edit
/// allowed, a two- or three-letter query would match almost anything.
pub const FUZZY_MIN_QUERY_CHARS: usize = 4;

/// Field a highlight span belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchField {
    /// Task title or list name.
    Title,
    Description,
}

/// A matched substring inside one field, in character offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Highlight {
    pub field: MatchField,
    pub start: usize,
    pub end: usize,
}

/// Ranking tier of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchTier {
    FuzzyDescription,
    FuzzyTitle,
    Description,
    TitleSubstring,
    TitlePrefix,
}

impl MatchTier {
    #[must_use]
    pub const fn base_score(self) -> u32 {
        match self {
            Self::TitlePrefix => 400,
            Self::TitleSubstring => 300,
            Self::Description => 200,
            Self::FuzzyTitle => 100,
            Self::FuzzyDescription => 50,
        }
    }
}

/// Outcome of matching one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemMatch {
    pub tier: MatchTier,
    pub score: u32,
    pub highlights: Vec<Highlight>,
}

/// Lowercases `text` one character at a time.
#[must_use]
pub fn fold(text: &str) -> Vec<char> {
    text.chars()
        .map(|c| c.to_lowercase().next().unwrap_or(c))
        .collect()
}

/// All non-overlapping occurrences of `needle` in `haystack`, left to right.
#[must_use]
pub fn find_all(haystack: &[char], needle: &[char]) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    if needle.is_empty() || needle.len() > haystack.len() {
        return spans;
    }

    let mut i = 0;
    while i + needle.len() <= haystack.len() {
        if haystack[i..i + needle.len()] == *needle {
            spans.push((i, i + needle.len()));
            i += needle.len();
        } else {
            i += 1;
        }
    }
    spans
}

/// Closest window of `haystack` within `max_distance` edits of `needle`.
///
/// Returns `(start, end, distance)`, preferring the smallest distance and then
/// the earliest start.
#[must_use]
pub fn fuzzy_find(haystack: &[char], needle: &[char], max_distance: usize) -> Option<(usize, usize, usize)> {
    let n = needle.len();
    if max_distance == 0 || n < FUZZY_MIN_QUERY_CHARS {
        return None;
    }

    let needle_text: String = needle.iter().collect();
    let mut best: Option<(usize, usize, usize)> = None;

    for len in n.saturating_sub(max_distance).max(1)..=n + max_distance {
        if len > haystack.len() {
            break;
        }
        for start in 0..=haystack.len() - len {
            let window: String = haystack[start..start + len].iter().collect();
            let distance = strsim::levenshtein(&window, &needle_text);
            if distance > max_distance {
                continue;
            }
            let better = best.map_or(true, |(best_start, _, best_distance)| {
                (distance, start) < (best_distance, best_start)
            });
            if better {
                best = Some((start, start + len, distance));
            }
        }
    }

    best
}

/// Matches a folded query against an item's title and description.
///
/// Exact containment is tried first in both fields and every occurrence is
/// highlighted. Only when neither field contains the query, and fuzzy matching
/// is enabled, the edit-distance fallback runs, title before description.
#[must_use]
pub fn match_item(
    title: &str,
    description: Option<&str>,
    needle: &[char],
    options: &SearchOptions,
) -> Option<ItemMatch> {
    if needle.is_empty() {
        return None;
    }

    let title_folded = fold(title);
    let description_folded = description.map(fold);

    let title_spans = find_all(&title_folded, needle);
    let description_spans = description_folded
        .as_deref()
        .map(|text| find_all(text, needle))
        .unwrap_or_default();

    let tier = match (title_spans.first(), description_spans.is_empty()) {
        (Some(&(0, _)), _) => Some(MatchTier::TitlePrefix),
        (Some(_), _) => Some(MatchTier::TitleSubstring),
        (None, false) => Some(MatchTier::Description),
        (None, true) => None,
    };

    if let Some(tier) = tier {
        let highlights = title_spans
            .iter()
            .map(|&(start, end)| Highlight { field: MatchField::Title, start, end })
            .chain(
                description_spans
                    .iter()
                    .map(|&(start, end)| Highlight { field: MatchField::Description, start, end }),
            )
            .collect();
        return Some(ItemMatch {
            tier,
            score: tier.base_score(),
            highlights,
        });
    }

    if !options.fuzzy {
        return None;
    }

    let fuzzy = |tier: MatchTier, field: MatchField, (start, end, distance): (usize, usize, usize)| {
        let penalty = u32::try_from(distance)
            .unwrap_or(u32::MAX)
            .saturating_mul(FUZZY_DISTANCE_PENALTY);
        ItemMatch {
            tier,
            score: tier.base_score().saturating_sub(penalty),
            highlights: vec![Highlight { field, start, end }],
        }
    };

    if let Some(hit) = fuzzy_find(&title_folded, needle, options.max_edit_distance) {
        return Some(fuzzy(MatchTier::FuzzyTitle, MatchField::Title, hit));
    }

    description_folded
        .as_deref()
        .and_then(|text| fuzzy_find(text, needle, options.max_edit_distance))
        .map(|hit| fuzzy(MatchTier::FuzzyDescription, MatchField::Description, hit))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn needle(text: &str) -> Vec<char> {
        fold(text.trim())
    }

    #[test]
    fn find_all_is_non_overlapping() {
        let spans = find_all(&fold("aaaa"), &fold("aa"));
        assert_eq!(spans, vec![(0, 2), (2, 4)]);
    }

    #[test]
    fn tiers_follow_field_and_position() {
        let opts = SearchOptions::default();

        let prefix = match_item("Milk run", None, &needle("milk"), &opts).unwrap();
        assert_eq!(prefix.tier, MatchTier::TitlePrefix);

        let interior = match_item("Buy milk", None, &needle("milk"), &opts).unwrap();
        assert_eq!(interior.tier, MatchTier::TitleSubstring);
        assert_eq!(interior.highlights, vec![Highlight { field: MatchField::Title, start: 4, end: 8 }]);

        let described = match_item("Groceries", Some("milk and eggs"), &needle("milk"), &opts).unwrap();
        assert_eq!(described.tier, MatchTier::Description);
        assert!(prefix.score > interior.score && interior.score > described.score);
    }

    #[test]
    fn matching_is_case_insensitive_with_original_offsets() {
        let opts = SearchOptions::default();
        let hit = match_item("Écrire RAPPORT", None, &needle("rapport"), &opts).unwrap();
        assert_eq!(hit.highlights[0].start, 7);
        assert_eq!(hit.highlights[0].end, 14);
    }

    #[test]
    fn fuzzy_fallback_only_when_enabled() {
        let strict = SearchOptions::default();
        assert!(match_item("Write report", None, &needle("reprot"), &strict).is_none());

        let fuzzy = SearchOptions { fuzzy: true, max_edit_distance: 2, ..SearchOptions::default() };
        let hit = match_item("Write report", None, &needle("reprot"), &fuzzy).unwrap();
        assert_eq!(hit.tier, MatchTier::FuzzyTitle);
        assert!(hit.score < MatchTier::Description.base_score());
    }

    #[test]
    fn fuzzy_ignores_short_queries() {
        assert_eq!(fuzzy_find(&fold("cat"), &fold("cut"), 1), None);
        assert_eq!(fuzzy_find(&fold("report"), &fold("repirt"), 1), Some((0, 6, 1)));
    }
}
