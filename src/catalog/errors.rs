//! Error types for the catalog client.

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Failed to obtain catalog access token: {0}")]
    Token(String),
    #[error("Catalog responded with status {status}")]
    Upstream { status: u16, details: String },
    #[error("Catalog request failed")]
    Request(#[from] reqwest::Error),
    #[error("Failed to parse catalog response")]
    Parse {
        url: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("Catalog returned no candidate games")]
    EmptyPool,
}
