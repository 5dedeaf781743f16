//! Catalog persistence.
//!
//! [`CatalogStore`] is the seam between the catalog logic and whatever holds
//! the data. [`CozoStore`] is the embedded implementation: two cozo
//! relations, `gem` and `submission`, on either the sqlite engine (on disk)
//! or the mem engine (tests, throwaway sessions).

use crate::catalog::{
    CatalogEntry, Category, NewEntry, NewSubmission, Submission, SubmissionStatus,
};
use crate::community::Vote;
use crate::error::StoreError;
use chrono::{DateTime, Utc};
use cozo::{DataValue, DbInstance, NamedRows, ScriptMutability};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

// ============================================================================
// Store trait
// ============================================================================

/// Query/insert/update surface the rest of the crate relies on.
pub trait CatalogStore {
    /// Every published entry, ordered by id.
    fn fetch_all(&self) -> Result<Vec<CatalogEntry>, StoreError>;

    /// Publish a new entry; the store issues the id.
    fn insert_entry(&self, entry: NewEntry) -> Result<CatalogEntry, StoreError>;

    fn entry_count(&self) -> Result<usize, StoreError> {
        Ok(self.fetch_all()?.len())
    }

    /// Every submission, ordered by id.
    fn submissions(&self) -> Result<Vec<Submission>, StoreError>;

    fn submission(&self, id: u64) -> Result<Submission, StoreError> {
        self.submissions()?
            .into_iter()
            .find(|s| s.id == id)
            .ok_or(StoreError::SubmissionNotFound(id))
    }

    /// Submissions awaiting review, newest first.
    fn pending_submissions(&self) -> Result<Vec<Submission>, StoreError> {
        let mut pending: Vec<Submission> = self
            .submissions()?
            .into_iter()
            .filter(|s| s.status == SubmissionStatus::Pending)
            .collect();
        pending.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(pending)
    }

    fn insert_submission(&self, submission: NewSubmission) -> Result<Submission, StoreError>;

    fn update_submission_status(
        &self,
        id: u64,
        status: SubmissionStatus,
    ) -> Result<Submission, StoreError>;

    /// Apply a vote and return the new net tally.
    fn record_vote(&self, id: u64, vote: Vote) -> Result<i64, StoreError>;
}

// ============================================================================
// Cozo-backed store
// ============================================================================

const GEM_COLUMNS: &str =
    "id, name, description, category, tags, featured, url, github_url, stars, likes, views";

const SUBMISSION_COLUMNS: &str = "id, tool_name, url, description, category, tags, github_url, email, submitted_by, status, votes, created_at";

const CREATE_GEM: &str = r#"
:create gem {
    id: Int
    =>
    name: String,
    description: String,
    category: String,
    tags: [String],
    featured: Bool,
    url: String,
    github_url: String?,
    stars: String?,
    likes: Int,
    views: Int
}
"#;

const CREATE_SUBMISSION: &str = r#"
:create submission {
    id: Int
    =>
    tool_name: String,
    url: String,
    description: String,
    category: String,
    tags: [String],
    github_url: String?,
    email: String?,
    submitted_by: String,
    status: String,
    votes: Int,
    created_at: String
}
"#;

pub struct CozoStore {
    db: DbInstance,
}

impl CozoStore {
    /// Open (or create) an on-disk catalog using cozo's sqlite engine.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| StoreError::Open {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
            }
        }
        let db = DbInstance::new("sqlite", path, "").map_err(|e| StoreError::Open {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        info!("Opened catalog database at {:?}", path);
        Self::with_db(db)
    }

    /// A catalog that lives only as long as this value.
    pub fn in_memory() -> Result<Self, StoreError> {
        let db = DbInstance::new("mem", "", "").map_err(|e| StoreError::Open {
            path: PathBuf::from(":memory:"),
            message: e.to_string(),
        })?;
        Self::with_db(db)
    }

    fn with_db(db: DbInstance) -> Result<Self, StoreError> {
        let store = Self { db };
        store.ensure_schema()?;
        Ok(store)
    }

    fn ensure_schema(&self) -> Result<(), StoreError> {
        let relations = self.run("::relations", BTreeMap::new(), ScriptMutability::Mutable)?;
        let existing: Vec<String> = relations
            .rows
            .iter()
            .filter_map(|row| row.first().and_then(|v| v.get_str()).map(str::to_string))
            .collect();

        for (name, script) in [("gem", CREATE_GEM), ("submission", CREATE_SUBMISSION)] {
            if !existing.iter().any(|r| r == name) {
                debug!("Creating relation {}", name);
                self.run(script, BTreeMap::new(), ScriptMutability::Mutable)?;
            }
        }
        Ok(())
    }

    fn run(
        &self,
        script: &str,
        params: BTreeMap<String, DataValue>,
        mutability: ScriptMutability,
    ) -> Result<NamedRows, StoreError> {
        self.db
            .run_script(script, params, mutability)
            .map_err(|e| StoreError::Query(e.to_string()))
    }

    fn next_id(&self, relation: &str) -> Result<u64, StoreError> {
        let script = format!("?[id] := *{}{{id}}", relation);
        let rows = self.run(&script, BTreeMap::new(), ScriptMutability::Immutable)?;
        let max = rows
            .rows
            .iter()
            .filter_map(|row| row.first().and_then(|v| v.get_int()))
            .max()
            .unwrap_or(0);
        Ok(max.max(0) as u64 + 1)
    }

    fn put_gem(&self, entry: &CatalogEntry) -> Result<(), StoreError> {
        let mut params = BTreeMap::new();
        params.insert("id".to_string(), int(entry.id));
        params.insert("name".to_string(), DataValue::from(entry.name.as_str()));
        params.insert("description".to_string(), DataValue::from(entry.description.as_str()));
        params.insert("category".to_string(), DataValue::from(entry.category.name()));
        params.insert("tags".to_string(), string_list(&entry.tags));
        params.insert("featured".to_string(), DataValue::Bool(entry.featured));
        params.insert("url".to_string(), DataValue::from(entry.url.as_str()));
        params.insert("github_url".to_string(), optional(entry.github_url.as_deref()));
        params.insert("stars".to_string(), optional(entry.stars.as_deref()));
        params.insert("likes".to_string(), int(entry.likes));
        params.insert("views".to_string(), int(entry.views));

        let script = format!(
            "?[{cols}] <- [[$id, $name, $description, $category, $tags, $featured, $url, $github_url, $stars, $likes, $views]]\n:put gem {{id => name, description, category, tags, featured, url, github_url, stars, likes, views}}",
            cols = GEM_COLUMNS
        );
        self.run(&script, params, ScriptMutability::Mutable)?;
        Ok(())
    }

    fn put_submission(&self, submission: &Submission) -> Result<(), StoreError> {
        let mut params = BTreeMap::new();
        params.insert("id".to_string(), int(submission.id));
        params.insert("tool_name".to_string(), DataValue::from(submission.tool_name.as_str()));
        params.insert("url".to_string(), DataValue::from(submission.url.as_str()));
        params.insert("description".to_string(), DataValue::from(submission.description.as_str()));
        params.insert("category".to_string(), DataValue::from(submission.category.name()));
        params.insert("tags".to_string(), string_list(&submission.tags));
        params.insert("github_url".to_string(), optional(submission.github_url.as_deref()));
        params.insert("email".to_string(), optional(submission.email.as_deref()));
        params.insert("submitted_by".to_string(), DataValue::from(submission.submitted_by.as_str()));
        params.insert("status".to_string(), DataValue::from(submission.status.as_str()));
        params.insert("votes".to_string(), DataValue::from(submission.votes));
        params.insert(
            "created_at".to_string(),
            DataValue::from(submission.created_at.to_rfc3339().as_str()),
        );

        let script = format!(
            "?[{cols}] <- [[$id, $tool_name, $url, $description, $category, $tags, $github_url, $email, $submitted_by, $status, $votes, $created_at]]\n:put submission {{id => tool_name, url, description, category, tags, github_url, email, submitted_by, status, votes, created_at}}",
            cols = SUBMISSION_COLUMNS
        );
        self.run(&script, params, ScriptMutability::Mutable)?;
        Ok(())
    }
}

impl CatalogStore for CozoStore {
    fn fetch_all(&self) -> Result<Vec<CatalogEntry>, StoreError> {
        let script = format!(
            "?[{cols}] := *gem{{{cols}}}\n:order id",
            cols = GEM_COLUMNS
        );
        let rows = self.run(&script, BTreeMap::new(), ScriptMutability::Immutable)?;
        let entries = rows
            .rows
            .iter()
            .map(|row| decode_gem(row))
            .collect::<Result<Vec<_>, _>>()?;
        debug!("Fetched {} entries", entries.len());
        Ok(entries)
    }

    fn insert_entry(&self, entry: NewEntry) -> Result<CatalogEntry, StoreError> {
        let entry = entry.into_entry(self.next_id("gem")?);
        self.put_gem(&entry)?;
        info!("Published gem {} ({})", entry.id, entry.name);
        Ok(entry)
    }

    fn submissions(&self) -> Result<Vec<Submission>, StoreError> {
        let script = format!(
            "?[{cols}] := *submission{{{cols}}}\n:order id",
            cols = SUBMISSION_COLUMNS
        );
        let rows = self.run(&script, BTreeMap::new(), ScriptMutability::Immutable)?;
        rows.rows.iter().map(|row| decode_submission(row)).collect()
    }

    fn insert_submission(&self, submission: NewSubmission) -> Result<Submission, StoreError> {
        let record = Submission {
            id: self.next_id("submission")?,
            tool_name: submission.tool_name,
            url: submission.url,
            description: submission.description,
            category: submission.category,
            tags: submission.tags,
            github_url: submission.github_url,
            email: submission.email,
            submitted_by: submission.submitted_by,
            status: SubmissionStatus::Pending,
            votes: 0,
            created_at: Utc::now(),
        };
        self.put_submission(&record)?;
        info!("Recorded submission {} ({})", record.id, record.tool_name);
        Ok(record)
    }

    fn update_submission_status(
        &self,
        id: u64,
        status: SubmissionStatus,
    ) -> Result<Submission, StoreError> {
        let mut record = self.submission(id)?;
        record.status = status;
        self.put_submission(&record)?;
        debug!("Submission {} is now {}", id, status.as_str());
        Ok(record)
    }

    fn record_vote(&self, id: u64, vote: Vote) -> Result<i64, StoreError> {
        let mut record = self.submission(id)?;
        record.votes += vote.delta();
        self.put_submission(&record)?;
        Ok(record.votes)
    }
}

/// Load a JSON array of entries from `path` into `store`. Rows may omit
/// `tags` and `description` or set them to `null`; any `id` in the file is
/// ignored.
pub fn import_entries(store: &impl CatalogStore, path: &Path) -> Result<Vec<CatalogEntry>, StoreError> {
    let content = fs::read_to_string(path).map_err(|e| StoreError::ImportRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    let rows: Vec<NewEntry> = serde_json::from_str(&content)?;
    let imported = rows
        .into_iter()
        .map(|row| store.insert_entry(row))
        .collect::<Result<Vec<_>, _>>()?;
    info!("Imported {} entries from {:?}", imported.len(), path);
    Ok(imported)
}

// ============================================================================
// DataValue conversions
// ============================================================================

fn int(value: u64) -> DataValue {
    DataValue::from(i64::try_from(value).unwrap_or(i64::MAX))
}

fn optional(value: Option<&str>) -> DataValue {
    match value {
        Some(v) => DataValue::from(v),
        None => DataValue::Null,
    }
}

fn string_list(values: &[String]) -> DataValue {
    DataValue::List(values.iter().map(|v| DataValue::from(v.as_str())).collect())
}

struct RowReader<'a> {
    relation: &'static str,
    row: &'a [DataValue],
}

impl<'a> RowReader<'a> {
    fn value(&self, idx: usize) -> Result<&'a DataValue, StoreError> {
        self.row.get(idx).ok_or_else(|| self.error(format!("missing column {}", idx)))
    }

    fn error(&self, message: String) -> StoreError {
        StoreError::Decode {
            relation: self.relation,
            message,
        }
    }

    fn int(&self, idx: usize) -> Result<i64, StoreError> {
        self.value(idx)?
            .get_int()
            .ok_or_else(|| self.error(format!("column {} is not an integer", idx)))
    }

    fn uint(&self, idx: usize) -> Result<u64, StoreError> {
        Ok(self.int(idx)?.max(0) as u64)
    }

    fn string(&self, idx: usize) -> Result<String, StoreError> {
        self.value(idx)?
            .get_str()
            .map(str::to_string)
            .ok_or_else(|| self.error(format!("column {} is not a string", idx)))
    }

    fn optional_string(&self, idx: usize) -> Result<Option<String>, StoreError> {
        match self.value(idx)? {
            DataValue::Null => Ok(None),
            other => other
                .get_str()
                .map(|s| Some(s.to_string()))
                .ok_or_else(|| self.error(format!("column {} is not a string", idx))),
        }
    }

    fn bool(&self, idx: usize) -> Result<bool, StoreError> {
        match self.value(idx)? {
            DataValue::Bool(b) => Ok(*b),
            _ => Err(self.error(format!("column {} is not a bool", idx))),
        }
    }

    fn strings(&self, idx: usize) -> Result<Vec<String>, StoreError> {
        match self.value(idx)? {
            DataValue::Null => Ok(Vec::new()),
            DataValue::List(items) => Ok(items
                .iter()
                .filter_map(|v| v.get_str().map(str::to_string))
                .collect()),
            _ => Err(self.error(format!("column {} is not a list", idx))),
        }
    }

    fn category(&self, idx: usize) -> Result<Category, StoreError> {
        let raw = self.string(idx)?;
        Category::parse(&raw).ok_or_else(|| self.error(format!("unknown category {:?}", raw)))
    }
}

fn decode_gem(row: &[DataValue]) -> Result<CatalogEntry, StoreError> {
    let r = RowReader { relation: "gem", row };
    Ok(CatalogEntry {
        id: r.uint(0)?,
        name: r.string(1)?,
        description: r.optional_string(2)?.unwrap_or_default(),
        category: r.category(3)?,
        tags: r.strings(4)?,
        featured: r.bool(5)?,
        url: r.string(6)?,
        github_url: r.optional_string(7)?,
        stars: r.optional_string(8)?,
        likes: r.uint(9)?,
        views: r.uint(10)?,
    })
}

fn decode_submission(row: &[DataValue]) -> Result<Submission, StoreError> {
    let r = RowReader {
        relation: "submission",
        row,
    };
    let status = r
        .string(9)?
        .parse::<SubmissionStatus>()
        .map_err(|e| r.error(e))?;
    let created_raw = r.string(11)?;
    let created_at = DateTime::parse_from_rfc3339(&created_raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| r.error(format!("bad created_at {:?}: {}", created_raw, e)))?;

    Ok(Submission {
        id: r.uint(0)?,
        tool_name: r.string(1)?,
        url: r.string(2)?,
        description: r.optional_string(3)?.unwrap_or_default(),
        category: r.category(4)?,
        tags: r.strings(5)?,
        github_url: r.optional_string(6)?,
        email: r.optional_string(7)?,
        submitted_by: r.string(8)?,
        status,
        votes: r.int(10)?,
        created_at,
    })
}
