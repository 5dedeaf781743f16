//! Relevance scoring of catalog entries against a detected intent.
//!
//! # Scoring
//! Each entry earns points for a category match, an exact requested tool,
//! and per keyword for name, description and tag hits, plus a flat bonus
//! when featured. Only positive scores survive; the best few are returned in
//! descending order with ties kept in snapshot order.
//!
//! # Performance
//! O(n*k*t) where n=entries, k=keywords, t=tags per entry. Entries are scored
//! in parallel; output order does not depend on thread scheduling.

use crate::catalog::CatalogEntry;
use crate::intent::Intent;
use colored::{ColoredString, Colorize};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default number of ranked results handed back to the caller.
pub const DEFAULT_MAX_RESULTS: usize = 3;

// ============================================================================
// Scoring Weights
// ============================================================================

/// Points awarded per match type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchWeights {
    /// Intent category equals entry category
    pub category: i32,
    /// Caller-resolved tool name equals entry name
    pub specific_tool: i32,
    /// Keyword equals the entry name
    pub name_exact: i32,
    /// Keyword is a substring of the entry name
    pub name_contains: i32,
    /// Keyword is a substring of the description
    pub description: i32,
    /// Keyword equals one of the tags
    pub tag_exact: i32,
    /// Keyword is a substring of one of the tags
    pub tag_contains: i32,
    /// Entry is featured
    pub featured: i32,
}

impl Default for MatchWeights {
    fn default() -> Self {
        Self {
            category: 20,
            specific_tool: 50,
            name_exact: 15,
            name_contains: 10,
            description: 5,
            tag_exact: 8,
            tag_contains: 4,
            featured: 2,
        }
    }
}

/// Tunables for result assembly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingConfig {
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

fn default_max_results() -> usize {
    DEFAULT_MAX_RESULTS
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

// ============================================================================
// Tiers
// ============================================================================

/// Coarse relevance label derived from the top score of a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// Top score > 20
    PerfectMatch,
    /// Top score 11-20
    GreatMatch,
    /// Anything else
    MightHelp,
}

/// Score thresholds for [`Tier::classify`]; both are exclusive.
struct TierThresholds {
    perfect: i32,
    great: i32,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            perfect: 20,
            great: 10,
        }
    }
}

impl Tier {
    pub fn classify(top_score: i32) -> Tier {
        let thresholds = TierThresholds::default();
        if top_score > thresholds.perfect {
            Tier::PerfectMatch
        } else if top_score > thresholds.great {
            Tier::GreatMatch
        } else {
            Tier::MightHelp
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Tier::PerfectMatch => "🎯",
            Tier::GreatMatch => "✨",
            Tier::MightHelp => "💡",
        }
    }

    pub fn headline(&self) -> &'static str {
        match self {
            Tier::PerfectMatch => "Perfect match",
            Tier::GreatMatch => "Great match",
            Tier::MightHelp => "These might help",
        }
    }

    /// Label for terminal logs.
    pub fn colored_label(&self) -> ColoredString {
        match self {
            Tier::PerfectMatch => "PERFECT".green(),
            Tier::GreatMatch => "GREAT".yellow(),
            Tier::MightHelp => "MIGHT HELP".red(),
        }
    }
}

// ============================================================================
// Ranking
// ============================================================================

/// An entry with its relevance score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredEntry {
    pub entry: CatalogEntry,
    pub score: i32,
    /// What contributed to the score (for debugging)
    pub evidence: Vec<String>,
}

/// Score a single entry. Returns the score and its evidence.
pub fn score_entry(entry: &CatalogEntry, intent: &Intent, weights: &MatchWeights) -> (i32, Vec<String>) {
    let mut score = 0;
    let mut evidence = Vec::new();

    if intent.category == Some(entry.category) {
        score += weights.category;
        evidence.push(format!("category:{}", entry.category));
    }

    let name = entry.name.to_lowercase();
    if let Some(tool) = &intent.specific_tool {
        if tool.trim().to_lowercase() == name {
            score += weights.specific_tool;
            evidence.push(format!("tool:{}", entry.name));
        }
    }

    let description = entry.description.to_lowercase();
    let tags: Vec<String> = entry.tags.iter().map(|t| t.to_lowercase()).collect();

    for keyword in &intent.keywords {
        if keyword.is_empty() {
            continue;
        }

        if name == *keyword {
            score += weights.name_exact;
            evidence.push(format!("name:{}", keyword));
        } else if name.contains(keyword.as_str()) {
            score += weights.name_contains;
            evidence.push(format!("name~{}", keyword));
        }

        if description.contains(keyword.as_str()) {
            score += weights.description;
            evidence.push(format!("description~{}", keyword));
        }

        if tags.iter().any(|tag| tag == keyword) {
            score += weights.tag_exact;
            evidence.push(format!("tag:{}", keyword));
        } else if tags.iter().any(|tag| tag.contains(keyword.as_str())) {
            score += weights.tag_contains;
            evidence.push(format!("tag~{}", keyword));
        }
    }

    if entry.featured {
        score += weights.featured;
        evidence.push("featured".to_string());
    }

    (score, evidence)
}

/// Rank `entries` against `intent` with the default weights and cap.
pub fn rank_entries(entries: &[CatalogEntry], intent: &Intent) -> Vec<ScoredEntry> {
    rank_entries_with(entries, intent, &MatchWeights::default(), DEFAULT_MAX_RESULTS)
}

/// Rank `entries` against `intent`, keeping at most `max_results` entries with
/// a positive score, best first. Equal scores keep snapshot order.
pub fn rank_entries_with(
    entries: &[CatalogEntry],
    intent: &Intent,
    weights: &MatchWeights,
    max_results: usize,
) -> Vec<ScoredEntry> {
    // par_iter().map().collect() keeps input order, so the stable sort below
    // sees the same sequence a sequential pass would.
    let mut scored: Vec<(usize, i32, Vec<String>)> = entries
        .par_iter()
        .enumerate()
        .map(|(idx, entry)| {
            let (score, evidence) = score_entry(entry, intent, weights);
            (idx, score, evidence)
        })
        .filter(|(_, score, _)| *score > 0)
        .collect();

    scored.sort_by(|a, b| b.1.cmp(&a.1));
    scored.truncate(max_results);

    let ranked: Vec<ScoredEntry> = scored
        .into_iter()
        .map(|(idx, score, evidence)| ScoredEntry {
            entry: entries[idx].clone(),
            score,
            evidence,
        })
        .collect();

    for item in &ranked {
        debug!(
            "Ranked {} (score: {}, evidence: {:?})",
            item.entry.name, item.score, item.evidence
        );
    }

    ranked
}

/// Tier of a ranked result set, `None` when nothing matched.
pub fn result_tier(ranked: &[ScoredEntry]) -> Option<Tier> {
    ranked
        .iter()
        .map(|s| s.score)
        .max()
        .map(Tier::classify)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Category;
    use crate::intent::{detect_intent, CategoryTable};

    fn entry(id: u64, name: &str, category: Category, tags: &[&str], description: &str, featured: bool) -> CatalogEntry {
        CatalogEntry {
            id,
            name: name.to_string(),
            description: description.to_string(),
            category,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            featured,
            url: format!("https://{}.example", name.to_lowercase()),
            github_url: None,
            stars: None,
            likes: 0,
            views: 0,
        }
    }

    fn create_test_catalog() -> Vec<CatalogEntry> {
        vec![
            entry(1, "Excalidraw", Category::Design, &["diagram", "drawing"], "Hand-drawn style diagrams", true),
            entry(2, "Coolors", Category::Design, &["color", "palette"], "Color palette generator", false),
        ]
    }

    fn keywords(words: &[&str]) -> Intent {
        Intent {
            keywords: words.iter().map(|w| w.to_string()).collect(),
            ..Intent::default()
        }
    }

    #[test]
    fn test_drawing_scenario() {
        let catalog = create_test_catalog();
        let intent = detect_intent("Find a tool for drawing diagrams", &CategoryTable::default());
        assert_eq!(intent.category, Some(Category::Design));

        let ranked = rank_entries(&catalog, &intent);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].entry.name, "Excalidraw");
        // 20 category + 5 + 8 (diagram) + 10 + 5 + 4 (draw) + 8 (drawing) + 2 featured
        assert_eq!(ranked[0].score, 62);
        assert_eq!(ranked[1].entry.name, "Coolors");
        assert_eq!(ranked[1].score, 20);
        assert_eq!(result_tier(&ranked), Some(Tier::PerfectMatch));
    }

    #[test]
    fn test_exact_name_beats_substring() {
        let catalog = vec![
            entry(1, "Notion", Category::Productivity, &[], "", false),
            entry(2, "Notion Calendar", Category::Productivity, &[], "", false),
        ];
        let ranked = rank_entries(&catalog, &keywords(&["notion"]));
        assert_eq!(ranked[0].entry.name, "Notion");
        assert_eq!(ranked[0].score, 15);
        assert_eq!(ranked[1].score, 10);
    }

    #[test]
    fn test_exact_name_query_scores_at_least_fifteen() {
        let catalog = create_test_catalog();
        for item in &catalog {
            let intent = keywords(&[&item.name.to_lowercase()]);
            let (score, _) = score_entry(item, &intent, &MatchWeights::default());
            assert!(score >= 15, "{} scored {}", item.name, score);
        }
    }

    #[test]
    fn test_tag_exact_excludes_substring_bonus() {
        let item = entry(1, "X", Category::Writing, &["markdown", "markdown-editor"], "", false);
        let (score, evidence) = score_entry(&item, &keywords(&["markdown"]), &MatchWeights::default());
        assert_eq!(score, 8);
        assert_eq!(evidence, vec!["tag:markdown"]);

        let (score, _) = score_entry(&item, &keywords(&["mark"]), &MatchWeights::default());
        assert_eq!(score, 4);
    }

    #[test]
    fn test_specific_tool_bonus() {
        let catalog = create_test_catalog();
        let intent = Intent::default().with_specific_tool("COOLORS");
        let ranked = rank_entries(&catalog, &intent);
        assert_eq!(ranked[0].entry.name, "Coolors");
        assert_eq!(ranked[0].score, 50);
    }

    #[test]
    fn test_featured_alone_is_positive() {
        // featured entries surface even for an empty intent
        let ranked = rank_entries(&create_test_catalog(), &Intent::default());
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].entry.name, "Excalidraw");
        assert_eq!(ranked[0].score, 2);
        assert_eq!(result_tier(&ranked), Some(Tier::MightHelp));
    }

    #[test]
    fn test_cap_and_positive_scores() {
        let catalog: Vec<CatalogEntry> = (1..=10)
            .map(|i| entry(i, &format!("Tool {}", i), Category::Development, &[], "", false))
            .collect();
        let intent = Intent {
            category: Some(Category::Development),
            ..Intent::default()
        };
        let ranked = rank_entries(&catalog, &intent);
        assert_eq!(ranked.len(), 3);
        assert!(ranked.iter().all(|s| s.score > 0));
        // ties keep snapshot order
        let ids: Vec<u64> = ranked.iter().map(|s| s.entry.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_empty_catalog() {
        let intent = detect_intent("color palette", &CategoryTable::default());
        assert!(rank_entries(&[], &intent).is_empty());
        assert_eq!(result_tier(&[]), None);
    }

    #[test]
    fn test_ranking_is_idempotent() {
        let catalog = create_test_catalog();
        let intent = detect_intent("color palette for drawing", &CategoryTable::default());
        assert_eq!(rank_entries(&catalog, &intent), rank_entries(&catalog, &intent));
    }

    #[test]
    fn test_tier_thresholds() {
        assert_eq!(Tier::classify(21), Tier::PerfectMatch);
        assert_eq!(Tier::classify(20), Tier::GreatMatch);
        assert_eq!(Tier::classify(11), Tier::GreatMatch);
        assert_eq!(Tier::classify(10), Tier::MightHelp);
    }

    #[test]
    fn test_custom_cap() {
        let catalog = create_test_catalog();
        let intent = Intent {
            category: Some(Category::Design),
            ..Intent::default()
        };
        let ranked = rank_entries_with(&catalog, &intent, &MatchWeights::default(), 1);
        assert_eq!(ranked.len(), 1);
    }
}
