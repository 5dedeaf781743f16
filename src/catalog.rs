//! Catalog records: gems, their categories, and community submissions.
//!
//! Records arrive from the store (or from an import file) and are treated as
//! read-only snapshots by the ranking and browse code. Missing or `null`
//! `tags` and `description` deserialize as empty; older rows, backend exports
//! and hand-written import files often leave them out.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Categories
// ============================================================================

/// The closed set of catalog categories.
///
/// Declaration order doubles as the fixed priority order used when a query
/// triggers several categories equally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Development,
    Design,
    Productivity,
    #[serde(rename = "AI Tools")]
    AiTools,
    #[serde(rename = "Image Processing")]
    ImageProcessing,
    Writing,
    #[serde(rename = "Data & Analytics")]
    DataAnalytics,
    Marketing,
}

impl Category {
    /// Every category, in priority order.
    pub const ALL: [Category; 8] = [
        Category::Development,
        Category::Design,
        Category::Productivity,
        Category::AiTools,
        Category::ImageProcessing,
        Category::Writing,
        Category::DataAnalytics,
        Category::Marketing,
    ];

    /// Display name, identical to the serialized form.
    pub fn name(&self) -> &'static str {
        match self {
            Category::Development => "Development",
            Category::Design => "Design",
            Category::Productivity => "Productivity",
            Category::AiTools => "AI Tools",
            Category::ImageProcessing => "Image Processing",
            Category::Writing => "Writing",
            Category::DataAnalytics => "Data & Analytics",
            Category::Marketing => "Marketing",
        }
    }

    /// URL slug of the category (`"Data & Analytics"` -> `data-analytics`).
    pub fn slug(&self) -> String {
        slugify(self.name())
    }

    /// Sidebar icon shown next to the category.
    pub fn icon(&self) -> &'static str {
        match self {
            Category::Development => "💻",
            Category::Design => "🎨",
            Category::Productivity => "⚡",
            Category::AiTools => "🤖",
            Category::ImageProcessing => "🖼️",
            Category::Writing => "✍️",
            Category::DataAnalytics => "📊",
            Category::Marketing => "📣",
        }
    }

    /// Resolve a display name or a slug, case-insensitively.
    pub fn parse(value: &str) -> Option<Category> {
        let wanted = slugify(value);
        Category::ALL.into_iter().find(|c| c.slug() == wanted)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::parse(s).ok_or_else(|| format!("unknown category: {}", s))
    }
}

/// Normalize a label into a slug: lowercase, punctuation dropped, whitespace
/// runs collapsed into single hyphens.
pub fn slugify(value: &str) -> String {
    value
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '-')
        .map(|word| {
            word.chars()
                .filter(|c| c.is_alphanumeric())
                .collect::<String>()
        })
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Treat an explicit `null` like an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ============================================================================
// Gems
// ============================================================================

/// A published catalog entry ("gem").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Store-issued identifier, unique and monotonically increasing
    pub id: u64,

    /// Display name
    pub name: String,

    /// Free-text description
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,

    pub category: Category,

    /// Short lowercase labels; order carries no meaning
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,

    /// Featured entries get a small ranking bonus
    #[serde(default, deserialize_with = "null_as_default")]
    pub featured: bool,

    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_url: Option<String>,

    /// Display-only star count as the source shows it (e.g. "12.3k")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stars: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub likes: u64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub views: u64,
}

impl CatalogEntry {
    /// True when the entry links to a non-empty source repository.
    pub fn is_open_source(&self) -> bool {
        self.github_url
            .as_deref()
            .is_some_and(|url| !url.trim().is_empty())
    }
}

/// An entry about to be inserted; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEntry {
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    pub category: Category,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub featured: bool,
    pub url: String,
    #[serde(default)]
    pub github_url: Option<String>,
    #[serde(default)]
    pub stars: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub likes: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub views: u64,
}

impl NewEntry {
    pub fn into_entry(self, id: u64) -> CatalogEntry {
        CatalogEntry {
            id,
            name: self.name,
            description: self.description,
            category: self.category,
            tags: self.tags,
            featured: self.featured,
            url: self.url,
            github_url: self.github_url,
            stars: self.stars,
            likes: self.likes,
            views: self.views,
        }
    }
}

// ============================================================================
// Submissions
// ============================================================================

/// Review state of a community submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    Pending,
    Approved,
    Rejected,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Pending => "pending",
            SubmissionStatus::Approved => "approved",
            SubmissionStatus::Rejected => "rejected",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SubmissionStatus::Pending => "Pending",
            SubmissionStatus::Approved => "Approved",
            SubmissionStatus::Rejected => "Rejected",
        }
    }
}

impl FromStr for SubmissionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(SubmissionStatus::Pending),
            "approved" => Ok(SubmissionStatus::Approved),
            "rejected" => Ok(SubmissionStatus::Rejected),
            other => Err(format!("unknown submission status: {}", other)),
        }
    }
}

/// A tool proposed by a community member, awaiting votes and review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub id: u64,
    pub tool_name: String,
    pub url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    pub category: Category,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub github_url: Option<String>,
    /// Contact address of the submitter, never shown publicly
    #[serde(default)]
    pub email: Option<String>,
    pub submitted_by: String,
    pub status: SubmissionStatus,
    /// Net community votes (up minus down)
    #[serde(default)]
    pub votes: i64,
    pub created_at: DateTime<Utc>,
}

impl Submission {
    /// The gem published when this submission is approved.
    pub fn to_new_entry(&self) -> NewEntry {
        NewEntry {
            name: self.tool_name.clone(),
            description: self.description.clone(),
            category: self.category,
            tags: self.tags.clone(),
            featured: false,
            url: self.url.clone(),
            github_url: self.github_url.clone(),
            stars: None,
            likes: 0,
            views: 0,
        }
    }
}

/// A submission as entered in the submit form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSubmission {
    pub tool_name: String,
    pub url: String,
    pub description: String,
    pub category: Category,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub github_url: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub submitted_by: String,
}
