//! Gronckle - a discovery catalog for developer tools ("gems").
//!
//! - [`intent`] and [`ranking`]: turn a free-text request into the best few
//!   gems, with a relevance tier
//! - [`browse`]: search box, category/type filters and sort orders of the
//!   catalog page
//! - [`chat`]: the gem finder assistant and its conversation state
//! - [`community`]: submissions, votes and admin review
//! - [`store`]: the catalog store trait and its cozo-backed implementation

pub mod browse;
pub mod catalog;
pub mod chat;
pub mod community;
pub mod config;
pub mod error;
pub mod intent;
pub mod ranking;
pub mod store;

pub use browse::{filter_and_sort, BrowseFilters, CategoryFilter, SortBy, TypeFilter};
pub use catalog::{CatalogEntry, Category, NewEntry, NewSubmission, Submission, SubmissionStatus};
pub use chat::{Assistant, ChatSession};
pub use config::Config;
pub use error::{GronckleError, StoreError};
pub use intent::{detect_intent, CategoryTable, Intent};
pub use ranking::{rank_entries, ScoredEntry, Tier};
pub use store::{CatalogStore, CozoStore};
