use thiserror::Error;

/// Failures raised while syncing articles.
///
/// Everything except `ConfigMissing` and `Config` is scoped to a single
/// article or file: callers catch it at the item boundary and count it.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Network failure or timeout
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success status from a remote endpoint
    #[error("{endpoint} returned {status}: {body}")]
    RemoteRejection {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// Normalization produced nothing beyond the header line
    #[error("article {id} has no usable content")]
    ContentEmpty { id: String },

    /// Required credential absent at startup
    #[error("{0} not found. Set it as an environment variable or add it to ~/.config/article-sync/.env")]
    ConfigMissing(String),

    /// Configuration present but unusable
    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SyncError {
    pub fn rejection(endpoint: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self::RemoteRejection {
            endpoint: endpoint.into(),
            status,
            body: body.into(),
        }
    }

    pub fn content_empty(id: impl ToString) -> Self {
        Self::ContentEmpty { id: id.to_string() }
    }
}

/// Reads a failed response into a `RemoteRejection`.
pub(crate) async fn rejection_from(endpoint: &str, response: reqwest::Response) -> SyncError {
    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| String::from("unknown error"));
    SyncError::rejection(endpoint, status, body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_empty_names_the_article() {
        assert_eq!(
            SyncError::content_empty(42).to_string(),
            "article 42 has no usable content"
        );
    }

    #[test]
    fn rejection_message_names_endpoint_and_status() {
        let err = SyncError::rejection("vector_stores/vs_1/files", 404, "not found");
        assert_eq!(
            err.to_string(),
            "vector_stores/vs_1/files returned 404: not found"
        );
    }
}
