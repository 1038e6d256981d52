//! Raw text acquisition.
//!
//! Reading the whole input is the single asynchronous step of the pipeline;
//! parsing starts only once the full content is available.

use std::path::Path;

use crate::error::{SourceError, SourceResult};

/// Read a whole file.
pub async fn read_file(path: impl AsRef<Path>) -> SourceResult<Vec<u8>> {
    Ok(tokio::fs::read(path.as_ref()).await?)
}

/// Fetch a whole document over HTTP(S).
pub async fn fetch_url(url: &str) -> SourceResult<Vec<u8>> {
    let response = reqwest::get(url).await?;

    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    Ok(response.bytes().await?.to_vec())
}

/// True when the input looks like an HTTP(S) URL rather than a path.
pub fn is_url(input: &str) -> bool {
    let lower = input.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}
