// Public modules
pub mod config;
pub mod engine;
pub mod error;
pub mod helpcenter;
pub mod models;
pub mod normalize;
pub mod pacing;
pub mod pipeline;
pub mod reset;
pub mod store;
pub mod summary;
pub mod uploader;

// Re-export commonly used types
pub use config::{Config, SyncOptions, SyncPaths};
pub use engine::ChangeDetector;
pub use error::SyncError;
pub use helpcenter::{HelpCenterApi, SourceLister, ZendeskClient};
pub use models::{
    ArticleContent, ArticleDescriptor, Classification, ClassificationCounts, DeltaSet,
    FingerprintRecord, Listing, UploadReport,
};
pub use pacing::{FixedDelay, NoDelay, Pacer};
pub use pipeline::SyncPipeline;
pub use store::{ArticleCache, FingerprintStore, JsonFingerprintStore, MemoryFingerprintStore};
pub use summary::RunSummary;
pub use uploader::{DeltaUploader, IndexInfo, OpenAiVectorStore, VectorStoreApi};
