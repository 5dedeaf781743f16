//! Browse page pipeline: text search, category and type filters, sorting.

use crate::catalog::{slugify, CatalogEntry, Category};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::str::FromStr;

/// Category selector; `All` disables the filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl FromStr for CategoryFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if slugify(s) == "all" {
            return Ok(CategoryFilter::All);
        }
        Category::parse(s)
            .map(CategoryFilter::Only)
            .ok_or_else(|| format!("unknown category: {}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TypeFilter {
    #[default]
    All,
    /// Only entries with a source repository
    OpenSource,
}

impl FromStr for TypeFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match slugify(s).as_str() {
            "all" => Ok(TypeFilter::All),
            "open-source" | "opensource" => Ok(TypeFilter::OpenSource),
            other => Err(format!("unknown type filter: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortBy {
    /// Most viewed first
    #[default]
    Popular,
    /// Most recently issued id first
    Newest,
    MostLiked,
}

impl FromStr for SortBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match slugify(s).as_str() {
            "popular" => Ok(SortBy::Popular),
            "newest" => Ok(SortBy::Newest),
            "most-liked" => Ok(SortBy::MostLiked),
            other => Err(format!("unknown sort order: {}", other)),
        }
    }
}

/// Browse page selections. Owned by whoever renders the page; a fresh value
/// is the page's initial state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrowseFilters {
    pub query: String,
    pub category: CategoryFilter,
    pub type_filter: TypeFilter,
    pub sort_by: SortBy,
}

/// Apply `filters` to `entries` and return the survivors in display order.
pub fn filter_and_sort(entries: &[CatalogEntry], filters: &BrowseFilters) -> Vec<CatalogEntry> {
    let query = filters.query.trim().to_lowercase();

    let mut result: Vec<CatalogEntry> = entries
        .iter()
        .filter(|entry| query.is_empty() || matches_query(entry, &query))
        .filter(|entry| match filters.category {
            CategoryFilter::All => true,
            CategoryFilter::Only(category) => entry.category.slug() == category.slug(),
        })
        .filter(|entry| match filters.type_filter {
            TypeFilter::All => true,
            TypeFilter::OpenSource => entry.is_open_source(),
        })
        .cloned()
        .collect();

    match filters.sort_by {
        SortBy::Popular => result.sort_by_key(|e| Reverse(e.views)),
        SortBy::Newest => result.sort_by_key(|e| Reverse(e.id)),
        SortBy::MostLiked => result.sort_by_key(|e| Reverse(e.likes)),
    }

    result
}

fn matches_query(entry: &CatalogEntry, query: &str) -> bool {
    entry.name.to_lowercase().contains(query)
        || entry.description.to_lowercase().contains(query)
        || entry.tags.iter().any(|tag| tag.to_lowercase().contains(query))
}

/// Entry count per category, for the sidebar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryCounts {
    pub total: usize,
    /// Every category in priority order, including empty ones
    pub per_category: Vec<(Category, usize)>,
}

pub fn category_counts(entries: &[CatalogEntry]) -> CategoryCounts {
    let per_category = Category::ALL
        .into_iter()
        .map(|category| {
            let count = entries.iter().filter(|e| e.category == category).count();
            (category, count)
        })
        .collect();

    CategoryCounts {
        total: entries.len(),
        per_category,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gem(id: u64, name: &str, category: Category, views: u64, likes: u64, github: Option<&str>) -> CatalogEntry {
        CatalogEntry {
            id,
            name: name.to_string(),
            description: format!("{} description", name),
            category,
            tags: vec![name.to_lowercase()],
            featured: false,
            url: format!("https://{}.example", name.to_lowercase()),
            github_url: github.map(str::to_string),
            stars: None,
            likes,
            views,
        }
    }

    fn create_test_gems() -> Vec<CatalogEntry> {
        vec![
            gem(1, "Excalidraw", Category::Design, 500, 20, Some("https://github.com/excalidraw/excalidraw")),
            gem(2, "Metabase", Category::DataAnalytics, 900, 5, Some("https://github.com/metabase/metabase")),
            gem(3, "Coolors", Category::Design, 100, 90, None),
            gem(4, "Hemingway", Category::Writing, 300, 40, None),
        ]
    }

    fn names(entries: &[CatalogEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn test_neutral_filters_return_everything() {
        let gems = create_test_gems();
        let popular = filter_and_sort(&gems, &BrowseFilters::default());
        assert_eq!(names(&popular), vec!["Metabase", "Excalidraw", "Hemingway", "Coolors"]);

        let newest = filter_and_sort(
            &gems,
            &BrowseFilters {
                sort_by: SortBy::Newest,
                ..BrowseFilters::default()
            },
        );
        assert_eq!(names(&newest), vec!["Hemingway", "Coolors", "Metabase", "Excalidraw"]);

        let liked = filter_and_sort(
            &gems,
            &BrowseFilters {
                sort_by: SortBy::MostLiked,
                ..BrowseFilters::default()
            },
        );
        assert_eq!(names(&liked), vec!["Coolors", "Hemingway", "Excalidraw", "Metabase"]);
    }

    #[test]
    fn test_query_matches_name_description_or_tag() {
        let mut gems = create_test_gems();
        gems[3].tags = vec!["Readability".to_string()];
        let filters = BrowseFilters {
            query: "READ".to_string(),
            ..BrowseFilters::default()
        };
        assert_eq!(names(&filter_and_sort(&gems, &filters)), vec!["Hemingway"]);

        let filters = BrowseFilters {
            query: "description".to_string(),
            ..BrowseFilters::default()
        };
        assert_eq!(filter_and_sort(&gems, &filters).len(), 4);
    }

    #[test]
    fn test_category_filter_by_slug() {
        let gems = create_test_gems();
        let filters = BrowseFilters {
            category: "data-analytics".parse().unwrap(),
            ..BrowseFilters::default()
        };
        assert_eq!(names(&filter_and_sort(&gems, &filters)), vec!["Metabase"]);

        let filters = BrowseFilters {
            category: CategoryFilter::Only(Category::Design),
            sort_by: SortBy::MostLiked,
            ..BrowseFilters::default()
        };
        assert_eq!(names(&filter_and_sort(&gems, &filters)), vec!["Coolors", "Excalidraw"]);
    }

    #[test]
    fn test_open_source_filter() {
        let gems = create_test_gems();
        let filters = BrowseFilters {
            type_filter: TypeFilter::OpenSource,
            ..BrowseFilters::default()
        };
        assert_eq!(names(&filter_and_sort(&gems, &filters)), vec!["Metabase", "Excalidraw"]);
    }

    #[test]
    fn test_sort_is_stable_on_ties() {
        let gems = vec![
            gem(1, "A", Category::Design, 10, 0, None),
            gem(2, "B", Category::Design, 10, 0, None),
            gem(3, "C", Category::Design, 10, 0, None),
        ];
        assert_eq!(names(&filter_and_sort(&gems, &BrowseFilters::default())), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_filter_parsing() {
        assert_eq!("all".parse::<CategoryFilter>(), Ok(CategoryFilter::All));
        assert_eq!("AI Tools".parse::<CategoryFilter>(), Ok(CategoryFilter::Only(Category::AiTools)));
        assert!("everything".parse::<CategoryFilter>().is_err());
        assert_eq!("open-source".parse::<TypeFilter>(), Ok(TypeFilter::OpenSource));
        assert_eq!("most-liked".parse::<SortBy>(), Ok(SortBy::MostLiked));
        assert!("oldest".parse::<SortBy>().is_err());
    }

    #[test]
    fn test_category_counts() {
        let counts = category_counts(&create_test_gems());
        assert_eq!(counts.total, 4);
        assert_eq!(counts.per_category.len(), Category::ALL.len());
        let design = counts
            .per_category
            .iter()
            .find(|(c, _)| *c == Category::Design)
            .map(|(_, n)| *n);
        assert_eq!(design, Some(2));
    }
}
