//! Intent detection: which category a free-text request is about, and which
//! keywords should drive scoring.

use crate::catalog::Category;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

lazy_static! {
    static ref RE_PUNCT: Regex = Regex::new(r"[^\w\s]").unwrap();
}

/// Words that carry no signal in a tool request.
const STOP_WORDS: &[&str] = &[
    "i", "need", "a", "for", "the", "to", "help", "me", "find", "tool", "tools", "want", "looking",
];

/// Fallback tokens this short are dropped.
const MIN_TOKEN_LEN: usize = 3;

// ============================================================================
// Category trigger table
// ============================================================================

/// Ordered mapping from category to trigger keywords.
///
/// Row order is the tie-break priority when two categories match the same
/// number of triggers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTable {
    rows: Vec<(Category, Vec<String>)>,
}

impl Default for CategoryTable {
    fn default() -> Self {
        let rows: Vec<(Category, &[&str])> = vec![
            (
                Category::Development,
                &[
                    "code", "coding", "developer", "programming", "api", "debug", "github",
                    "terminal", "database", "deploy", "testing", "http", "rest client",
                ],
            ),
            (
                Category::Design,
                &[
                    "design", "color", "colour", "palette", "diagram", "draw", "drawing",
                    "figma", "prototype", "mockup", "icon", "font", "illustration", "wireframe",
                ],
            ),
            (
                Category::Productivity,
                &[
                    "productivity", "productive", "task", "todo", "note", "calendar",
                    "schedule", "focus", "organize", "workflow", "habit",
                ],
            ),
            (
                Category::AiTools,
                &[
                    "artificial intelligence", "chatbot", "gpt", "llm", "machine learning",
                    "prompt", "openai", "neural",
                ],
            ),
            (
                Category::ImageProcessing,
                &[
                    "image", "photo", "picture", "compress", "resize", "png", "jpeg", "jpg",
                    "crop", "background remov",
                ],
            ),
            (
                Category::Writing,
                &[
                    "spelling", "grammar", "grammarly", "write", "writing", "editor", "text",
                    "proofread",
                ],
            ),
            (
                Category::DataAnalytics,
                &[
                    "data", "analytics", "chart", "dashboard", "visualiz", "spreadsheet", "sql",
                    "metrics", "statistic",
                ],
            ),
            (
                Category::Marketing,
                &[
                    "marketing", "seo", "newsletter", "email campaign", "social media",
                    "campaign", "advertis", "landing page", "audience",
                ],
            ),
        ];

        Self {
            rows: rows
                .into_iter()
                .map(|(category, triggers)| {
                    (category, triggers.iter().map(|t| t.to_string()).collect())
                })
                .collect(),
        }
    }
}

impl CategoryTable {
    /// Build a table from explicit rows, keeping their order. Triggers are
    /// lowercased; blank triggers are dropped.
    pub fn from_rows(rows: Vec<(Category, Vec<String>)>) -> Self {
        Self {
            rows: rows
                .into_iter()
                .map(|(category, triggers)| {
                    let triggers = triggers
                        .into_iter()
                        .map(|t| t.trim().to_lowercase())
                        .filter(|t| !t.is_empty())
                        .collect();
                    (category, triggers)
                })
                .collect(),
        }
    }

    /// Build a table from a configuration map, ordered by category priority.
    pub fn from_map(map: BTreeMap<Category, Vec<String>>) -> Self {
        Self::from_rows(map.into_iter().collect())
    }

    pub fn rows(&self) -> &[(Category, Vec<String>)] {
        &self.rows
    }

    pub fn triggers(&self, category: Category) -> &[String] {
        self.rows
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, triggers)| triggers.as_slice())
            .unwrap_or(&[])
    }

    /// Triggers of every row matching the (lowercased) query, in table order.
    fn matches<'a>(&'a self, query_lower: &'a str) -> impl Iterator<Item = (Category, Vec<&'a str>)> + 'a {
        self.rows.iter().filter_map(move |(category, triggers)| {
            let hits: Vec<&str> = triggers
                .iter()
                .filter(|t| query_lower.contains(t.as_str()))
                .map(String::as_str)
                .collect();
            (!hits.is_empty()).then_some((*category, hits))
        })
    }
}

// ============================================================================
// Intent
// ============================================================================

/// What a single query is asking for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Intent {
    /// Primary category, if any trigger matched
    pub category: Option<Category>,
    /// Every category that matched, primary first
    pub matched_categories: Vec<Category>,
    /// Lowercase scoring tokens; may repeat
    pub keywords: Vec<String>,
    /// Exact catalog name the caller resolved from the query
    pub specific_tool: Option<String>,
}

impl Intent {
    pub fn with_specific_tool(mut self, name: impl Into<String>) -> Self {
        self.specific_tool = Some(name.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.keywords.is_empty() && self.specific_tool.is_none()
    }
}

/// Detect the intent of `query` against `table`.
///
/// When several categories trigger, the one with the most matched triggers
/// becomes primary; ties go to the row listed first. Keywords from every
/// matched category are kept. With no trigger at all the query is tokenized
/// instead.
pub fn detect_intent(query: &str, table: &CategoryTable) -> Intent {
    let query_lower = query.to_lowercase();
    let mut intent = Intent::default();
    let mut best: Option<(Category, usize)> = None;

    for (category, hits) in table.matches(&query_lower) {
        if best.map_or(true, |(_, count)| hits.len() > count) {
            best = Some((category, hits.len()));
        }
        intent.matched_categories.push(category);
        intent.keywords.extend(hits.into_iter().map(str::to_string));
    }

    match best {
        Some((primary, _)) => {
            intent.category = Some(primary);
            intent.matched_categories.retain(|c| *c != primary);
            intent.matched_categories.insert(0, primary);
        }
        None => intent.keywords = tokenize(&query_lower),
    }

    debug!(
        "Intent: category={:?} keywords={:?}",
        intent.category, intent.keywords
    );
    intent
}

/// Generic tokenization used when no category trigger fires. Punctuation is
/// removed in place, so "e-mail" stays one token.
pub fn tokenize(query: &str) -> Vec<String> {
    let cleaned = RE_PUNCT.replace_all(query, "").to_lowercase();
    cleaned
        .split_whitespace()
        .filter(|token| token.chars().count() >= MIN_TOKEN_LEN)
        .filter(|token| !STOP_WORDS.contains(token))
        .map(str::to_string)
        .collect()
}
