//! Pushes changed articles into the remote vector store.
//!
//! Each file goes through two independent calls: register the bytes as a
//! file object, then attach that object to the vector store. An attach
//! failure leaves the registered object orphaned; nothing deletes it.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{rejection_from, SyncError};
use crate::models::UploadReport;
use crate::pacing::Pacer;
use crate::store::ArticleCache;

/// Chunks OpenAI produces for an average help article (800-token chunks).
const CHUNKS_PER_FILE: f64 = 2.5;

#[async_trait]
pub trait VectorStoreApi: Send + Sync {
    /// Uploads the bytes as a new file object and returns its id.
    async fn register(&self, filename: &str, bytes: Vec<u8>) -> Result<String, SyncError>;

    /// Associates a registered file object with the target vector store.
    async fn attach(&self, file_id: &str) -> Result<(), SyncError>;

    async fn index_info(&self) -> Result<IndexInfo, SyncError>;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileCounts {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub completed: u64,
    #[serde(default)]
    pub in_progress: u64,
    #[serde(default)]
    pub failed: u64,
    #[serde(default)]
    pub cancelled: u64,
}

/// Vector store status; informational only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexInfo {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub file_counts: FileCounts,
}

impl IndexInfo {
    pub fn estimated_chunks(&self) -> u64 {
        (self.file_counts.completed as f64 * CHUNKS_PER_FILE) as u64
    }
}

impl fmt::Display for IndexInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts = &self.file_counts;
        writeln!(f, "ID:              {}", self.id)?;
        writeln!(f, "Name:            {}", self.name.as_deref().unwrap_or("-"))?;
        writeln!(f, "Status:          {}", self.status.as_deref().unwrap_or("-"))?;
        writeln!(f, "\nFile Counts:")?;
        writeln!(f, "  - Total:       {}", counts.total)?;
        writeln!(f, "  - Completed:   {}", counts.completed)?;
        writeln!(f, "  - In Progress: {}", counts.in_progress)?;
        writeln!(f, "  - Failed:      {}", counts.failed)?;
        write!(
            f,
            "\nEstimated Chunks: ~{} ({} files x ~{} chunks/file)",
            self.estimated_chunks(),
            counts.completed,
            CHUNKS_PER_FILE
        )
    }
}

#[derive(Deserialize)]
struct FileObject {
    id: String,
}

#[derive(Serialize)]
struct AttachRequest<'a> {
    file_id: &'a str,
}

pub struct OpenAiVectorStore {
    client: Client,
    base_url: String,
    vector_store_id: String,
}

impl OpenAiVectorStore {
    pub fn new(api_key: &str, base_url: &Url, vector_store_id: &str) -> Result<Self, SyncError> {
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {}", api_key.trim()))
            .map_err(|_| SyncError::Config("OPENAI_API_KEY is not a valid header value".into()))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert("openai-beta", HeaderValue::from_static("assistants=v2"));

        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
            vector_store_id: vector_store_id.to_string(),
        })
    }

    fn vector_store_url(&self) -> String {
        format!("{}/vector_stores/{}", self.base_url, self.vector_store_id)
    }
}

#[async_trait]
impl VectorStoreApi for OpenAiVectorStore {
    async fn register(&self, filename: &str, bytes: Vec<u8>) -> Result<String, SyncError> {
        let part = Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str("text/markdown")?;
        let form = Form::new().text("purpose", "assistants").part("file", part);

        let response = self
            .client
            .post(format!("{}/files", self.base_url))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(rejection_from("files", response).await);
        }

        Ok(response.json::<FileObject>().await?.id)
    }

    async fn attach(&self, file_id: &str) -> Result<(), SyncError> {
        let response = self
            .client
            .post(format!("{}/files", self.vector_store_url()))
            .json(&AttachRequest { file_id })
            .send()
            .await?;

        let status = response.status().as_u16();
        if status != 200 && status != 201 {
            return Err(rejection_from("vector_stores/files", response).await);
        }
        Ok(())
    }

    async fn index_info(&self) -> Result<IndexInfo, SyncError> {
        let response = self.client.get(self.vector_store_url()).send().await?;
        if !response.status().is_success() {
            return Err(rejection_from("vector_stores", response).await);
        }
        Ok(response.json::<IndexInfo>().await?)
    }
}

pub struct DeltaUploader<'a> {
    api: &'a dyn VectorStoreApi,
    pacer: &'a dyn Pacer,
    cache: &'a ArticleCache,
}

impl<'a> DeltaUploader<'a> {
    pub fn new(api: &'a dyn VectorStoreApi, pacer: &'a dyn Pacer, cache: &'a ArticleCache) -> Self {
        Self { api, pacer, cache }
    }

    /// Uploads exactly the given cached files, one at a time.
    ///
    /// A failure on one file never skips the rest. An empty list makes no
    /// remote calls.
    pub async fn upload(&self, filenames: &[String]) -> UploadReport {
        let mut report = UploadReport {
            total: filenames.len(),
            ..Default::default()
        };

        if filenames.is_empty() {
            log::info!("No new files to upload");
            return report;
        }

        for (i, filename) in filenames.iter().enumerate() {
            if i > 0 {
                self.pacer.wait().await;
            }

            match self.upload_one(filename).await {
                Ok(file_id) => {
                    log::info!("[{}/{}] {}... ✓ Success ({})", i + 1, report.total, filename, file_id);
                    report.uploaded += 1;
                }
                Err(e) => {
                    log::warn!("[{}/{}] {}... ✗ Failed: {}", i + 1, report.total, filename, e);
                    report.failed += 1;
                }
            }
        }

        report
    }

    /// Uploads every cached article. Used to seed an empty vector store.
    pub async fn upload_all(&self) -> Result<UploadReport, SyncError> {
        let filenames = self.cache.list_markdown()?;
        log::info!(
            "Found {} markdown files in {}",
            filenames.len(),
            self.cache.dir().display()
        );
        Ok(self.upload(&filenames).await)
    }

    async fn upload_one(&self, filename: &str) -> Result<String, SyncError> {
        let bytes = self.cache.read(filename)?;
        let file_id = self.api.register(filename, bytes).await?;

        if let Err(e) = self.api.attach(&file_id).await {
            log::warn!(
                "{} registered as {} but not attached; leaving orphan",
                filename,
                file_id
            );
            return Err(e);
        }

        Ok(file_id)
    }
}
