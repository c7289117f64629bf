//! Help-center catalog and article endpoints (Zendesk Help Center API).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::error::{rejection_from, SyncError};
use crate::models::{ArticleContent, ArticleId, ArticlePage, Listing};
use crate::pacing::Pacer;

#[async_trait]
pub trait HelpCenterApi: Send + Sync {
    /// Fetches one catalog page; pages are numbered from 1.
    async fn list_page(&self, page: u32, per_page: u32) -> Result<ArticlePage, SyncError>;

    /// Fetches one article. `None` when the response carries no article.
    async fn fetch_article(&self, id: ArticleId) -> Result<Option<ArticleContent>, SyncError>;
}

#[derive(Debug, Deserialize)]
struct ArticleResponse {
    #[serde(default)]
    article: Option<ArticleContent>,
}

pub struct ZendeskClient {
    client: Client,
    api_base: String,
}

impl ZendeskClient {
    pub fn new(base_url: &Url, locale: &str) -> Result<Self, SyncError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (compatible; ArticleSync/1.0)")
            .build()?;

        let api_base = format!(
            "{}/api/v2/help_center/{}",
            base_url.as_str().trim_end_matches('/'),
            urlencoding::encode(locale)
        );

        Ok(Self { client, api_base })
    }

    pub fn articles_url(&self, page: u32, per_page: u32) -> String {
        format!(
            "{}/articles.json?page={}&per_page={}",
            self.api_base, page, per_page
        )
    }

    pub fn article_url(&self, id: ArticleId) -> String {
        format!("{}/articles/{}.json", self.api_base, id)
    }
}

#[async_trait]
impl HelpCenterApi for ZendeskClient {
    async fn list_page(&self, page: u32, per_page: u32) -> Result<ArticlePage, SyncError> {
        let url = self.articles_url(page, per_page);
        log::debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(rejection_from("articles.json", response).await);
        }

        Ok(response.json::<ArticlePage>().await?)
    }

    async fn fetch_article(&self, id: ArticleId) -> Result<Option<ArticleContent>, SyncError> {
        let url = self.article_url(id);
        log::debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(rejection_from(&format!("articles/{id}.json"), response).await);
        }

        Ok(response.json::<ArticleResponse>().await?.article)
    }
}

/// Walks the paginated catalog.
pub struct SourceLister<'a> {
    api: &'a dyn HelpCenterApi,
    pacer: &'a dyn Pacer,
    per_page: u32,
}

impl<'a> SourceLister<'a> {
    pub fn new(api: &'a dyn HelpCenterApi, pacer: &'a dyn Pacer, per_page: u32) -> Self {
        Self {
            api,
            pacer,
            per_page,
        }
    }

    /// Lists the whole catalog in listing order.
    ///
    /// A failed page ends pagination without retry; whatever was gathered
    /// so far is returned with `truncated` set.
    pub async fn list_all(&self) -> Listing {
        let mut listing = Listing::default();
        let mut page = 1;

        loop {
            let response = match self.api.list_page(page, self.per_page).await {
                Ok(response) => response,
                Err(e) => {
                    log::warn!(
                        "Catalog page {} failed: {}. Continuing with {} articles",
                        page,
                        e,
                        listing.items.len()
                    );
                    listing.truncated = true;
                    break;
                }
            };

            if response.articles.is_empty() {
                log::info!("Catalog page {}: no more articles", page);
                break;
            }

            log::info!("Catalog page {}: {} articles", page, response.articles.len());
            let has_next = response.has_next();
            listing
                .items
                .extend(response.articles.into_iter().map(|mut a| {
                    a.page = page;
                    a
                }));

            if !has_next {
                break;
            }

            page += 1;
            self.pacer.wait().await;
        }

        log::info!("Total articles found: {}", listing.items.len());
        listing
    }
}
