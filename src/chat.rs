//! Gem finder chat: turns a free-text request into a formatted reply, and
//! keeps the conversation transcript.
//!
//! Every turn fetches a fresh catalog snapshot, detects the intent, ranks the
//! snapshot and formats the top entries. Replies for turns that were
//! overtaken by a newer turn (or by a clear) are dropped.

use crate::browse::category_counts;
use crate::catalog::CatalogEntry;
use crate::intent::{detect_intent, CategoryTable};
use crate::ranking::{rank_entries_with, result_tier, MatchWeights, RankingConfig, ScoredEntry};
use crate::store::CatalogStore;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, error, info, warn};

pub const GREETING: &str = "Hi! I'm the GRONCKLE AI assistant. I can help you discover the perfect development tools. What are you trying to accomplish today?";

pub const CLEARED: &str = "Chat cleared! What would you like to find today?";

pub const FETCH_FAILED: &str =
    "Sorry, I couldn't reach the gem catalog right now. Please try again in a moment.";

/// Suggested requests shown in the empty chat and in the no-match reply.
pub const EXAMPLE_PROMPTS: [&str; 4] = [
    "Find a tool for drawing diagrams",
    "Best free API testing tools",
    "Help me compress images",
    "Color palette generator",
];

lazy_static! {
    static ref RE_SHOW_ALL: Regex =
        Regex::new(r"(?i)\b(show|list|see|browse|view)\b(\s+me)?\s+(all|every|everything)\b").unwrap();
    // "all tools" with nothing else worth ranking on
    static ref RE_ALL_ONLY: Regex = Regex::new(
        r"(?i)^\s*(what\s+are\s+|give\s+me\s+)?all\s+(the\s+|your\s+)?(tools|gems)\s*[?.!]*\s*$"
    )
    .unwrap();
}

// ============================================================================
// Assistant
// ============================================================================

/// Answers single requests against a catalog store.
pub struct Assistant<S: CatalogStore> {
    store: S,
    table: CategoryTable,
    weights: MatchWeights,
    ranking: RankingConfig,
}

impl<S: CatalogStore> Assistant<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, CategoryTable::default(), RankingConfig::default())
    }

    pub fn with_config(store: S, table: CategoryTable, ranking: RankingConfig) -> Self {
        Self {
            store,
            table,
            weights: MatchWeights::default(),
            ranking,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Produce the reply text for `query`. Never fails: store errors become
    /// an apology, an empty ranking becomes the example list.
    pub fn respond(&self, query: &str) -> String {
        let entries = match self.store.fetch_all() {
            Ok(entries) => entries,
            Err(e) => {
                error!("Catalog fetch failed: {}", e);
                return FETCH_FAILED.to_string();
            }
        };

        if is_show_all(query) {
            debug!("Show-all request over {} entries", entries.len());
            return format_summary(&entries);
        }

        let ranked = self.rank(query, &entries);
        if ranked.is_empty() {
            debug!("No matches for {:?}", query);
            return no_match_reply();
        }
        format_results(&ranked)
    }

    /// Rank `entries` for `query`, naming a specific tool when the query is
    /// exactly an entry's name.
    pub fn rank(&self, query: &str, entries: &[CatalogEntry]) -> Vec<ScoredEntry> {
        let mut intent = detect_intent(query, &self.table);
        let wanted = query.trim().to_lowercase();
        if let Some(entry) = entries.iter().find(|e| e.name.to_lowercase() == wanted) {
            intent = intent.with_specific_tool(entry.name.clone());
        }

        let ranked = rank_entries_with(entries, &intent, &self.weights, self.ranking.max_results);
        if let Some(tier) = result_tier(&ranked) {
            info!(
                "{} {} result(s) for {:?}",
                tier.colored_label(),
                ranked.len(),
                query
            );
        }
        ranked
    }
}

/// True for "show me all tools"-style requests.
pub fn is_show_all(query: &str) -> bool {
    RE_SHOW_ALL.is_match(query) || RE_ALL_ONLY.is_match(query)
}

// ============================================================================
// Reply formatting
// ============================================================================

pub fn format_results(ranked: &[ScoredEntry]) -> String {
    let Some(tier) = result_tier(ranked) else {
        return no_match_reply();
    };

    let mut reply = format!("{} {}! Here's what I found:\n", tier.emoji(), tier.headline());
    for item in ranked {
        let entry = &item.entry;
        reply.push_str(&format!("\n**{}**", entry.name));
        if !entry.description.is_empty() {
            reply.push_str(&format!(" - {}", entry.description));
        }
        reply.push_str(&format!("\n{} {}", entry.category.icon(), entry.category));
        reply.push_str(&format!("\n🔗 {}", entry.url));
        if let Some(github) = entry.github_url.as_deref().filter(|u| !u.trim().is_empty()) {
            reply.push_str(&format!("\n⭐ GitHub: {}", github));
        }
        reply.push('\n');
    }
    reply.trim_end().to_string()
}

pub fn format_summary(entries: &[CatalogEntry]) -> String {
    let counts = category_counts(entries);
    let mut reply = format!(
        "📚 We currently have {} gem{} in the catalog.",
        counts.total,
        if counts.total == 1 { "" } else { "s" }
    );
    let populated: Vec<String> = counts
        .per_category
        .iter()
        .filter(|(_, n)| *n > 0)
        .map(|(category, n)| format!("{} {}: {}", category.icon(), category, n))
        .collect();
    if !populated.is_empty() {
        reply.push_str("\n\n");
        reply.push_str(&populated.join("\n"));
    }
    reply.push_str("\n\nBrowse the Gems page to see them all, or tell me what you need and I'll pick the best ones.");
    reply
}

pub fn no_match_reply() -> String {
    let mut reply = String::from(
        "I couldn't find a gem that matches that yet. Try describing the task, for example:\n",
    );
    for prompt in EXAMPLE_PROMPTS {
        reply.push_str(&format!("\n• {}", prompt));
    }
    reply
}

// ============================================================================
// Conversation state
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Handle for one in-flight turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnTicket {
    epoch: u64,
    seq: u64,
}

/// One chat panel's conversation. Create it when the panel mounts and drop
/// it when the panel goes away.
#[derive(Debug, Clone)]
pub struct ChatSession {
    messages: Vec<Message>,
    open: bool,
    /// Bumped by `clear`; tickets from an older epoch are void
    epoch: u64,
    last_issued: u64,
    pending: bool,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    pub fn new() -> Self {
        Self {
            messages: vec![Message::assistant(GREETING)],
            open: false,
            epoch: 0,
            last_issued: 0,
            pending: false,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    /// True while a reply is outstanding.
    pub fn is_loading(&self) -> bool {
        self.pending
    }

    /// Example prompts are offered until the conversation gets going.
    pub fn show_examples(&self) -> bool {
        self.messages.len() <= 2
    }

    /// Reset the transcript. Replies still in flight are discarded.
    pub fn clear(&mut self) {
        self.messages = vec![Message::assistant(CLEARED)];
        self.epoch += 1;
        self.pending = false;
    }

    /// Record the user's message and issue a ticket for the reply. Blank
    /// input is ignored.
    pub fn begin_turn(&mut self, input: &str) -> Option<TurnTicket> {
        let text = input.trim();
        if text.is_empty() {
            return None;
        }
        self.messages.push(Message {
            role: Role::User,
            content: text.to_string(),
        });
        self.last_issued += 1;
        self.pending = true;
        Some(TurnTicket {
            epoch: self.epoch,
            seq: self.last_issued,
        })
    }

    /// Append the reply for `ticket` unless a newer turn or a clear has
    /// superseded it. Returns whether the reply was kept.
    pub fn complete_turn(&mut self, ticket: TurnTicket, reply: String) -> bool {
        if ticket.epoch != self.epoch || ticket.seq != self.last_issued {
            warn!(
                "Dropping stale reply (turn {}, latest {})",
                ticket.seq, self.last_issued
            );
            return false;
        }
        self.messages.push(Message::assistant(reply));
        self.pending = false;
        true
    }

    /// Run a whole turn synchronously. Returns the reply that was appended.
    pub fn ask<S: CatalogStore>(&mut self, assistant: &Assistant<S>, input: &str) -> Option<String> {
        let ticket = self.begin_turn(input)?;
        let reply = assistant.respond(input.trim());
        self.complete_turn(ticket, reply.clone()).then_some(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Category, NewEntry, NewSubmission, Submission, SubmissionStatus};
    use crate::community::Vote;
    use crate::error::StoreError;
    use crate::store::CozoStore;

    /// A store whose every call fails, standing in for an unreachable backend.
    struct BrokenStore;

    impl CatalogStore for BrokenStore {
        fn fetch_all(&self) -> Result<Vec<CatalogEntry>, StoreError> {
            Err(StoreError::Query("connection refused".to_string()))
        }
        fn insert_entry(&self, _: NewEntry) -> Result<CatalogEntry, StoreError> {
            Err(StoreError::Query("connection refused".to_string()))
        }
        fn submissions(&self) -> Result<Vec<Submission>, StoreError> {
            Err(StoreError::Query("connection refused".to_string()))
        }
        fn insert_submission(&self, _: NewSubmission) -> Result<Submission, StoreError> {
            Err(StoreError::Query("connection refused".to_string()))
        }
        fn update_submission_status(&self, _: u64, _: SubmissionStatus) -> Result<Submission, StoreError> {
            Err(StoreError::Query("connection refused".to_string()))
        }
        fn record_vote(&self, _: u64, _: Vote) -> Result<i64, StoreError> {
            Err(StoreError::Query("connection refused".to_string()))
        }
    }

    fn seeded_store() -> CozoStore {
        let store = CozoStore::in_memory().unwrap();
        let rows = [
            ("Excalidraw", Category::Design, vec!["diagram", "drawing"], "Hand-drawn style diagrams", true, Some("https://github.com/excalidraw/excalidraw")),
            ("Coolors", Category::Design, vec!["color", "palette"], "Color palette generator", false, None),
            ("TinyPNG", Category::ImageProcessing, vec!["compression", "png"], "Smart PNG and JPEG compression", false, None),
        ];
        for (name, category, tags, description, featured, github) in rows {
            store
                .insert_entry(NewEntry {
                    name: name.to_string(),
                    description: description.to_string(),
                    category,
                    tags: tags.into_iter().map(str::to_string).collect(),
                    featured,
                    url: format!("https://{}.example", name.to_lowercase()),
                    github_url: github.map(str::to_string),
                    stars: None,
                    likes: 0,
                    views: 0,
                })
                .unwrap();
        }
        store
    }

    #[test]
    fn test_drawing_request() {
        let assistant = Assistant::new(seeded_store());
        let reply = assistant.respond("Find a tool for drawing diagrams");
        assert!(reply.starts_with("🎯 Perfect match"));
        let excalidraw = reply.find("**Excalidraw**").unwrap();
        let coolors = reply.find("**Coolors**").unwrap();
        assert!(excalidraw < coolors);
        assert!(reply.contains("🔗 https://excalidraw.example"));
        assert!(reply.contains("GitHub: https://github.com/excalidraw/excalidraw"));
        assert!(!reply.contains("TinyPNG"));
    }

    #[test]
    fn test_show_all_is_a_summary() {
        let assistant = Assistant::new(seeded_store());
        let reply = assistant.respond("show all tools");
        assert!(reply.contains("3 gems"));
        assert!(reply.contains("Design: 2"));
        assert!(reply.contains("Image Processing: 1"));
        assert!(!reply.contains("**"));

        let empty = Assistant::new(CozoStore::in_memory().unwrap());
        assert!(empty.respond("Show me all the tools").contains("0 gems"));
    }

    #[test]
    fn test_show_all_detection() {
        assert!(is_show_all("show all tools"));
        assert!(is_show_all("Can you list every gem?"));
        assert!(is_show_all("what are all the tools"));
        assert!(!is_show_all("show me a color picker"));
        assert!(!is_show_all("install tools"));
        assert!(is_show_all("All gems?"));
        assert!(!is_show_all("compare all tools for image compression"));
        assert!(!is_show_all("all tools that resize png"));
    }

    #[test]
    fn test_all_tools_with_a_task_is_ranked() {
        let assistant = Assistant::new(seeded_store());
        let reply = assistant.respond("compare all tools for png compression");
        assert!(!reply.starts_with("📚"));
        assert!(reply.contains("**TinyPNG**"));
    }

    #[test]
    fn test_empty_catalog_falls_back() {
        let assistant = Assistant::new(CozoStore::in_memory().unwrap());
        for query in ["Find a tool for drawing diagrams", "", "kubernetes helm"] {
            let reply = assistant.respond(query);
            assert_eq!(reply, no_match_reply());
            assert!(reply.contains("Help me compress images"));
        }
    }

    #[test]
    fn test_fetch_failure_is_apology() {
        let assistant = Assistant::new(BrokenStore);
        assert_eq!(assistant.respond("color palette"), FETCH_FAILED);
    }

    #[test]
    fn test_exact_name_sets_specific_tool() {
        let assistant = Assistant::new(seeded_store());
        let entries = assistant.store().fetch_all().unwrap();
        let ranked = assistant.rank("  tinypng ", &entries);
        assert_eq!(ranked[0].entry.name, "TinyPNG");
        assert!(ranked[0].score >= 50 + 15);
    }

    #[test]
    fn test_session_transcript() {
        let assistant = Assistant::new(seeded_store());
        let mut session = ChatSession::new();
        assert!(!session.is_open());
        session.open();
        assert!(session.is_open());
        assert!(session.show_examples());

        assert_eq!(session.ask(&assistant, "   "), None);
        assert_eq!(session.messages().len(), 1);

        let reply = session.ask(&assistant, "Color palette generator").unwrap();
        assert!(reply.contains("**Coolors**"));
        assert_eq!(session.messages().len(), 3);
        assert_eq!(session.messages()[1].role, Role::User);
        assert_eq!(session.messages()[2].role, Role::Assistant);
        assert!(!session.show_examples());
        assert!(!session.is_loading());

        session.clear();
        assert_eq!(session.messages(), &[Message::assistant(CLEARED)]);
        session.close();
        assert!(!session.is_open());
    }

    #[test]
    fn test_stale_reply_is_dropped() {
        let mut session = ChatSession::new();
        let first = session.begin_turn("first").unwrap();
        let second = session.begin_turn("second").unwrap();

        // the newer turn resolves first
        assert!(session.complete_turn(second, "reply two".to_string()));
        assert!(!session.complete_turn(first, "reply one".to_string()));

        let contents: Vec<&str> = session.messages().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec![GREETING, "first", "second", "reply two"]);
    }

    #[test]
    fn test_clear_voids_in_flight_turns() {
        let mut session = ChatSession::new();
        let ticket = session.begin_turn("anything").unwrap();
        session.clear();
        assert!(!session.complete_turn(ticket, "late".to_string()));
        assert_eq!(session.messages().len(), 1);
        assert!(!session.is_loading());
    }
}
