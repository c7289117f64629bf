use std::fmt;

use serde::Serialize;

use crate::models::{ClassificationCounts, UploadReport};

/// What a sync run did, end to end.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub listed: usize,
    pub listing_truncated: bool,
    pub counts: ClassificationCounts,
    pub upload: UploadReport,
}

impl RunSummary {
    pub fn has_failures(&self) -> bool {
        self.counts.failed > 0 || self.upload.failed > 0 || self.listing_truncated
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts = &self.counts;
        writeln!(f, "Articles listed:     {}", self.listed)?;
        if self.listing_truncated {
            writeln!(f, "  ⚠ Catalog listing stopped early; some articles were not seen")?;
        }
        writeln!(f, "Articles processed:  {}", counts.processed())?;
        writeln!(f, "  - Added:           {}", counts.added)?;
        writeln!(f, "  - Updated:         {}", counts.updated)?;
        writeln!(f, "  - Skipped:         {}", counts.unchanged)?;
        writeln!(f, "  - Failed:          {}", counts.failed)?;
        if self.upload.total == 0 {
            write!(f, "Files uploaded:      0 (no changes detected)")
        } else {
            write!(
                f,
                "Files uploaded:      {} of {} ({} failed)",
                self.upload.uploaded, self.upload.total, self.upload.failed
            )
        }
    }
}
