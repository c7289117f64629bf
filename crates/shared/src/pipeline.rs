//! Lister → change detection → delta upload.

use crate::config::SyncOptions;
use crate::engine::ChangeDetector;
use crate::error::SyncError;
use crate::helpcenter::{HelpCenterApi, SourceLister};
use crate::pacing::Pacer;
use crate::store::{ArticleCache, FingerprintStore};
use crate::summary::RunSummary;
use crate::uploader::{DeltaUploader, VectorStoreApi};

pub struct SyncPipeline<'a> {
    pub help_center: &'a dyn HelpCenterApi,
    pub vector_store: &'a dyn VectorStoreApi,
    pub pacer: &'a dyn Pacer,
    pub cache: &'a ArticleCache,
    pub options: &'a SyncOptions,
}

impl SyncPipeline<'_> {
    /// Runs one full sync. Only the delta reaches the uploader.
    ///
    /// Fails only when the fingerprint store cannot be saved.
    pub async fn run<S>(&self, store: &mut S) -> Result<RunSummary, SyncError>
    where
        S: FingerprintStore + ?Sized,
    {
        let listing = SourceLister::new(self.help_center, self.pacer, self.options.per_page)
            .list_all()
            .await;

        let mut summary = RunSummary {
            listed: listing.items.len(),
            listing_truncated: listing.truncated,
            ..Default::default()
        };

        if listing.items.is_empty() {
            log::warn!("No articles found");
            return Ok(summary);
        }

        let (counts, delta) = ChangeDetector::new(self.help_center, self.pacer, self.cache)
            .run(&listing.items, self.options.limit, store)
            .await?;
        summary.counts = counts;

        if delta.is_empty() {
            log::info!("No new or updated articles to upload; vector store is up to date");
            return Ok(summary);
        }

        log::info!("Found {} new/updated articles to upload", delta.len());
        summary.upload = DeltaUploader::new(self.vector_store, self.pacer, self.cache)
            .upload(delta.filenames())
            .await;

        Ok(summary)
    }
}
