use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

pub type ArticleId = u64;

/// Treats an explicit JSON `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Catalog entry as returned by the listing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleDescriptor {
    pub id: ArticleId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    /// Catalog page this entry was listed on
    #[serde(skip)]
    pub page: u32,
}

impl ArticleDescriptor {
    pub fn new(id: ArticleId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            page: 1,
        }
    }
}

/// Full article as returned by the item endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleContent {
    pub id: ArticleId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub html_url: String,
    /// Informational only; never used to detect changes
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(skip, default = "Utc::now")]
    pub fetched_at: DateTime<Utc>,
}

impl ArticleContent {
    pub fn title_or_untitled(&self) -> &str {
        self.title
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or("Untitled")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedArticle {
    pub markdown: String,
    pub fingerprint: String,
}

/// Durable per-article checkpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FingerprintRecord {
    #[serde(alias = "hash")]
    pub fingerprint: String,
    pub url: String,
    pub title: String,
    pub filename: String,
    /// RFC 3339 timestamp of the run that last wrote this record
    #[serde(alias = "last_updated")]
    pub last_seen: String,
}

/// Outcome for one catalog entry in one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Added,
    Updated,
    Unchanged,
    Failed,
}

impl Classification {
    pub fn label(&self) -> &'static str {
        match self {
            Classification::Added => "+ Added",
            Classification::Updated => "↻ Updated",
            Classification::Unchanged => "✓ Unchanged",
            Classification::Failed => "✗ Failed",
        }
    }

    pub fn needs_upload(&self) -> bool {
        matches!(self, Classification::Added | Classification::Updated)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClassificationCounts {
    pub added: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub failed: usize,
}

impl ClassificationCounts {
    pub fn record(&mut self, classification: Classification) {
        match classification {
            Classification::Added => self.added += 1,
            Classification::Updated => self.updated += 1,
            Classification::Unchanged => self.unchanged += 1,
            Classification::Failed => self.failed += 1,
        }
    }

    /// Articles that produced usable content this run.
    pub fn processed(&self) -> usize {
        self.added + self.updated + self.unchanged
    }

    pub fn total(&self) -> usize {
        self.processed() + self.failed
    }
}

/// Filenames classified `Added` or `Updated` in this run, in catalog order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeltaSet(Vec<String>);

impl DeltaSet {
    pub fn push(&mut self, filename: impl Into<String>) {
        self.0.push(filename.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn filenames(&self) -> &[String] {
        &self.0
    }
}

impl From<Vec<String>> for DeltaSet {
    fn from(filenames: Vec<String>) -> Self {
        Self(filenames)
    }
}

/// One page of the catalog.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArticlePage {
    #[serde(default)]
    pub articles: Vec<ArticleDescriptor>,
    #[serde(default)]
    pub next_page: Option<String>,
}

impl ArticlePage {
    pub fn has_next(&self) -> bool {
        self.next_page.as_deref().is_some_and(|p| !p.is_empty())
    }
}

/// Catalog listing, flagged when pagination stopped on an error.
#[derive(Debug, Clone, Default)]
pub struct Listing {
    pub items: Vec<ArticleDescriptor>,
    pub truncated: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UploadReport {
    pub uploaded: usize,
    pub failed: usize,
    pub total: usize,
}
