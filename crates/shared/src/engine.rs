//! Change detection: decides for each catalog entry whether its content is
//! new, changed or unchanged since the last run, and keeps the local cache
//! and fingerprint store in step with that decision.

use crate::error::SyncError;
use crate::helpcenter::HelpCenterApi;
use crate::models::{
    ArticleContent, ArticleDescriptor, Classification, ClassificationCounts, DeltaSet,
    FingerprintRecord, NormalizedArticle,
};
use crate::normalize::normalize;
use crate::pacing::Pacer;
use crate::store::{ArticleCache, FingerprintStore};

pub struct ChangeDetector<'a> {
    api: &'a dyn HelpCenterApi,
    pacer: &'a dyn Pacer,
    cache: &'a ArticleCache,
}

impl<'a> ChangeDetector<'a> {
    pub fn new(api: &'a dyn HelpCenterApi, pacer: &'a dyn Pacer, cache: &'a ArticleCache) -> Self {
        Self { api, pacer, cache }
    }

    /// Classifies the first `limit` descriptors and persists the store.
    ///
    /// Per-article failures are counted, never returned. The only error is
    /// a failure to save the store.
    pub async fn run<S>(
        &self,
        descriptors: &[ArticleDescriptor],
        limit: usize,
        store: &mut S,
    ) -> Result<(ClassificationCounts, DeltaSet), SyncError>
    where
        S: FingerprintStore + ?Sized,
    {
        let batch = &descriptors[..limit.min(descriptors.len())];
        let mut counts = ClassificationCounts::default();
        let mut delta = DeltaSet::default();

        if batch.is_empty() {
            return Ok((counts, delta));
        }

        log::info!("Processing {} articles...", batch.len());

        for (i, descriptor) in batch.iter().enumerate() {
            if i > 0 {
                self.pacer.wait().await;
            }

            let classification = self.classify(descriptor, store).await;
            counts.record(classification);
            if classification.needs_upload() {
                delta.push(ArticleCache::filename_for(descriptor.id));
            }

            let title: String = descriptor.title.chars().take(50).collect();
            log::info!(
                "[{}/{}] {}... {}",
                i + 1,
                batch.len(),
                title,
                classification.label()
            );
        }

        store.save()?;
        Ok((counts, delta))
    }

    /// Fetches, normalizes and classifies one article.
    ///
    /// Nothing is written unless the article is `Added` or `Updated`.
    pub async fn classify<S>(&self, descriptor: &ArticleDescriptor, store: &mut S) -> Classification
    where
        S: FingerprintStore + ?Sized,
    {
        let content = match self.api.fetch_article(descriptor.id).await {
            Ok(Some(content)) => content,
            Ok(None) => {
                log::warn!(
                    "Article {} (catalog page {}) returned no content",
                    descriptor.id,
                    descriptor.page
                );
                return Classification::Failed;
            }
            Err(e) => {
                log::warn!(
                    "Failed to fetch article {} (catalog page {}): {}",
                    descriptor.id,
                    descriptor.page,
                    e
                );
                return Classification::Failed;
            }
        };

        let normalized = match normalize(&content) {
            Ok(normalized) => normalized,
            Err(e) => {
                log::warn!("{}", e);
                return Classification::Failed;
            }
        };

        match self.apply(descriptor, &content, &normalized, store) {
            Ok(classification) => classification,
            Err(e) => {
                log::warn!("Failed to cache article {}: {}", descriptor.id, e);
                Classification::Failed
            }
        }
    }

    fn apply<S>(
        &self,
        descriptor: &ArticleDescriptor,
        content: &ArticleContent,
        normalized: &NormalizedArticle,
        store: &mut S,
    ) -> Result<Classification, SyncError>
    where
        S: FingerprintStore + ?Sized,
    {
        let key = descriptor.id.to_string();
        let filename = ArticleCache::filename_for(descriptor.id);
        let now = content.fetched_at.to_rfc3339();

        match store.get(&key).cloned() {
            None => {
                self.cache.write(&filename, &normalized.markdown)?;
                store.upsert(
                    &key,
                    FingerprintRecord {
                        fingerprint: normalized.fingerprint.clone(),
                        url: content.html_url.clone(),
                        title: content.title_or_untitled().to_string(),
                        filename,
                        last_seen: now,
                    },
                );
                Ok(Classification::Added)
            }
            Some(mut record) if record.fingerprint != normalized.fingerprint => {
                self.cache.write(&filename, &normalized.markdown)?;
                record.fingerprint = normalized.fingerprint.clone();
                record.last_seen = now;
                store.upsert(&key, record);
                Ok(Classification::Updated)
            }
            Some(_) => Ok(Classification::Unchanged),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ArticleId;
    use crate::pacing::{CountingPacer, NoDelay};
    use crate::store::MemoryFingerprintStore;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Articles {
        bodies: HashMap<ArticleId, &'static str>,
        rejected: Vec<ArticleId>,
        fetched: Mutex<Vec<ArticleId>>,
    }

    impl Articles {
        fn with(bodies: &[(ArticleId, &'static str)]) -> Self {
            Self {
                bodies: bodies.iter().copied().collect(),
                ..Default::default()
            }
        }

        fn fetch_count(&self) -> usize {
            self.fetched.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl HelpCenterApi for Articles {
        async fn list_page(
            &self,
            _page: u32,
            _per_page: u32,
        ) -> Result<crate::models::ArticlePage, SyncError> {
            Ok(Default::default())
        }

        async fn fetch_article(&self, id: ArticleId) -> Result<Option<ArticleContent>, SyncError> {
            self.fetched.lock().unwrap().push(id);
            if self.rejected.contains(&id) {
                return Err(SyncError::rejection("articles", 500, "boom"));
            }
            Ok(self.bodies.get(&id).map(|body| ArticleContent {
                id,
                title: Some(format!("Article {id}")),
                body: Some(body.to_string()),
                html_url: format!("https://help.example.com/articles/{id}"),
                updated_at: None,
                fetched_at: Utc::now(),
            }))
        }
    }

    fn descriptors(ids: &[ArticleId]) -> Vec<ArticleDescriptor> {
        ids.iter()
            .map(|id| ArticleDescriptor::new(*id, format!("Article {id}")))
            .collect()
    }

    #[tokio::test]
    async fn empty_store_adds_everything() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ArticleCache::new(dir.path());
        let api = Articles::with(&[(1, "<p>foo</p>"), (2, "<p>bar</p>")]);
        let mut store = MemoryFingerprintStore::new();

        let (counts, delta) = ChangeDetector::new(&api, &NoDelay, &cache)
            .run(&descriptors(&[1, 2]), 50, &mut store)
            .await
            .unwrap();

        assert_eq!(counts.added, 2);
        assert_eq!(delta.filenames(), ["1.md", "2.md"]);
        assert_eq!(store.len(), 2);
        assert!(cache.path("1.md").exists());
        let record = store.get("1").unwrap();
        assert_eq!(record.filename, "1.md");
        assert_eq!(record.title, "Article 1");
    }

    #[tokio::test]
    async fn changed_content_is_updated_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ArticleCache::new(dir.path());
        let mut store = MemoryFingerprintStore::new();

        let first = Articles::with(&[(1, "<p>foo</p>")]);
        ChangeDetector::new(&first, &NoDelay, &cache)
            .run(&descriptors(&[1]), 50, &mut store)
            .await
            .unwrap();
        let before = store.get("1").unwrap().clone();

        let second = Articles::with(&[(1, "<p>foo, revised</p>")]);
        let (counts, delta) = ChangeDetector::new(&second, &NoDelay, &cache)
            .run(&descriptors(&[1]), 50, &mut store)
            .await
            .unwrap();

        assert_eq!(counts.updated, 1);
        assert_eq!(delta.filenames(), ["1.md"]);
        let after = store.get("1").unwrap();
        assert_ne!(after.fingerprint, before.fingerprint);
        assert_eq!(after.title, before.title);
        assert_eq!(after.filename, before.filename);
        let cached = String::from_utf8(cache.read("1.md").unwrap()).unwrap();
        assert!(cached.contains("revised"));
    }

    #[tokio::test]
    async fn identical_content_is_unchanged_and_not_resent() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ArticleCache::new(dir.path());
        let api = Articles::with(&[(1, "<p>foo</p>")]);
        let mut store = MemoryFingerprintStore::new();
        let detector = ChangeDetector::new(&api, &NoDelay, &cache);

        detector.run(&descriptors(&[1]), 50, &mut store).await.unwrap();
        let snapshot = store.clone();
        let (counts, delta) = detector.run(&descriptors(&[1]), 50, &mut store).await.unwrap();

        assert_eq!(counts.unchanged, 1);
        assert!(delta.is_empty());
        assert_eq!(store.get("1"), snapshot.get("1"));
    }

    #[tokio::test]
    async fn fetch_failure_and_empty_body_fail_without_mutation() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ArticleCache::new(dir.path());
        let mut api = Articles::with(&[(1, "<p>ok</p>"), (3, "<script>only()</script>")]);
        api.rejected.push(2);
        let mut store = MemoryFingerprintStore::new();

        let (counts, delta) = ChangeDetector::new(&api, &NoDelay, &cache)
            .run(&descriptors(&[1, 2, 3, 4]), 50, &mut store)
            .await
            .unwrap();

        assert_eq!(counts.added, 1);
        assert_eq!(counts.failed, 3);
        assert_eq!(delta.filenames(), ["1.md"]);
        assert!(store.get("2").is_none());
        assert!(store.get("3").is_none());
        assert!(!cache.path("3.md").exists());
    }

    #[tokio::test]
    async fn empty_body_does_not_touch_existing_record() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ArticleCache::new(dir.path());
        let mut store = MemoryFingerprintStore::new();

        let first = Articles::with(&[(1, "<p>foo</p>")]);
        let detector = ChangeDetector::new(&first, &NoDelay, &cache);
        detector.run(&descriptors(&[1]), 50, &mut store).await.unwrap();
        let before = store.get("1").unwrap().clone();

        let emptied = Articles::with(&[(1, "")]);
        let (counts, delta) = ChangeDetector::new(&emptied, &NoDelay, &cache)
            .run(&descriptors(&[1]), 50, &mut store)
            .await
            .unwrap();

        assert_eq!(counts.failed, 1);
        assert!(delta.is_empty());
        assert_eq!(store.get("1"), Some(&before));
    }

    #[tokio::test]
    async fn limit_truncates_in_listing_order() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ArticleCache::new(dir.path());
        let api = Articles::with(&[(1, "<p>a</p>"), (2, "<p>b</p>"), (3, "<p>c</p>")]);
        let mut store = MemoryFingerprintStore::new();

        let (counts, delta) = ChangeDetector::new(&api, &NoDelay, &cache)
            .run(&descriptors(&[3, 1, 2]), 2, &mut store)
            .await
            .unwrap();

        assert_eq!(counts.total(), 2);
        assert_eq!(delta.filenames(), ["3.md", "1.md"]);
        assert_eq!(*api.fetched.lock().unwrap(), vec![3, 1]);
    }

    #[tokio::test]
    async fn zero_limit_or_empty_catalog_does_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ArticleCache::new(dir.path());
        let api = Articles::with(&[(1, "<p>a</p>")]);
        let mut store = MemoryFingerprintStore::new();
        let detector = ChangeDetector::new(&api, &NoDelay, &cache);

        let (counts, delta) = detector.run(&descriptors(&[1]), 0, &mut store).await.unwrap();
        assert_eq!(counts, ClassificationCounts::default());
        assert!(delta.is_empty());

        let (counts, delta) = detector.run(&[], 50, &mut store).await.unwrap();
        assert_eq!(counts, ClassificationCounts::default());
        assert!(delta.is_empty());
        assert_eq!(api.fetch_count(), 0);
    }

    #[tokio::test]
    async fn delta_size_matches_added_plus_updated() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ArticleCache::new(dir.path());
        let mut store = MemoryFingerprintStore::new();

        let first = Articles::with(&[(1, "<p>a</p>"), (2, "<p>b</p>")]);
        ChangeDetector::new(&first, &NoDelay, &cache)
            .run(&descriptors(&[1, 2]), 50, &mut store)
            .await
            .unwrap();

        let second = Articles::with(&[(1, "<p>a</p>"), (2, "<p>b2</p>"), (3, "<p>c</p>")]);
        let (counts, delta) = ChangeDetector::new(&second, &NoDelay, &cache)
            .run(&descriptors(&[1, 2, 3, 4]), 50, &mut store)
            .await
            .unwrap();

        assert_eq!(counts.unchanged, 1);
        assert_eq!(counts.updated, 1);
        assert_eq!(counts.added, 1);
        assert_eq!(counts.failed, 1);
        assert_eq!(delta.len(), counts.added + counts.updated);
        assert_eq!(delta.filenames(), ["2.md", "3.md"]);
    }

    #[tokio::test]
    async fn waits_between_articles_including_failures() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ArticleCache::new(dir.path());
        let mut api = Articles::with(&[(1, "<p>a</p>"), (3, "<p>c</p>")]);
        api.rejected.push(2);
        let mut store = MemoryFingerprintStore::new();
        let pacer = CountingPacer::default();

        let (counts, _) = ChangeDetector::new(&api, &pacer, &cache)
            .run(&descriptors(&[1, 2, 3, 4]), 50, &mut store)
            .await
            .unwrap();

        assert_eq!(counts.failed, 2);
        assert_eq!(pacer.waits(), 3);
    }

    #[tokio::test]
    async fn no_wait_for_empty_or_single_article() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ArticleCache::new(dir.path());
        let api = Articles::with(&[(1, "<p>a</p>")]);
        let mut store = MemoryFingerprintStore::new();
        let pacer = CountingPacer::default();
        let detector = ChangeDetector::new(&api, &pacer, &cache);

        detector.run(&[], 50, &mut store).await.unwrap();
        detector.run(&descriptors(&[1, 2]), 0, &mut store).await.unwrap();
        detector.run(&descriptors(&[1]), 50, &mut store).await.unwrap();

        assert_eq!(pacer.waits(), 0);
    }
}
