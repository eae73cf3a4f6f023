// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Asset fetching — turn an image reference into raw bytes.
//
// References may be `data:` URIs, `file://` URIs, bare filesystem paths or
// `http(s)://` URLs (the latter behind the "http" feature). Fetchers return
// errors; the loader is the one that folds them into absent assets.

use std::collections::HashMap;
use std::future::Future;

use base64::Engine;
use tracing::debug;
use vitalcard_core::error::{Result, VitalcardError};

/// Source of raw asset bytes.
pub trait AssetFetcher: Send + Sync {
    /// Resolve `url` to its raw bytes.
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Vec<u8>>> + Send;
}

/// Resolves data URIs, local files and, with the "http" feature, remote URLs.
#[derive(Debug, Clone, Default)]
pub struct DefaultFetcher {
    #[cfg(feature = "http")]
    client: reqwest::Client,
}

impl DefaultFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(feature = "http")]
    async fn fetch_remote(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| fetch_error(url, e))?;
        let bytes = response.bytes().await.map_err(|e| fetch_error(url, e))?;
        Ok(bytes.to_vec())
    }

    #[cfg(not(feature = "http"))]
    async fn fetch_remote(&self, url: &str) -> Result<Vec<u8>> {
        Err(fetch_error(url, "remote assets need the \"http\" feature"))
    }
}

impl AssetFetcher for DefaultFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let url = url.trim();
        if url.is_empty() {
            return Err(fetch_error(url, "empty reference"));
        }

        if let Some(rest) = url.strip_prefix("data:") {
            return decode_data_uri(rest).map_err(|reason| fetch_error("data:…", reason));
        }

        if url.starts_with("http://") || url.starts_with("https://") {
            debug!(url, "Fetching remote asset");
            return self.fetch_remote(url).await;
        }

        if url.starts_with("blob:") {
            return Err(fetch_error(url, "blob references only exist inside a browser"));
        }

        let path = url.strip_prefix("file://").unwrap_or(url);
        tokio::fs::read(path)
            .await
            .map_err(|e| fetch_error(url, e))
    }
}

/// Pre-resolved assets keyed by reference. Useful when the caller already
/// holds the bytes, and for deterministic rendering.
#[derive(Debug, Clone, Default)]
pub struct MemoryFetcher {
    assets: HashMap<String, Vec<u8>>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.insert(url, bytes);
        self
    }

    pub fn insert(&mut self, url: impl Into<String>, bytes: Vec<u8>) {
        self.assets.insert(url.into(), bytes);
    }
}

impl AssetFetcher for MemoryFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self.assets
            .get(url)
            .cloned()
            .ok_or_else(|| fetch_error(url, "not found"))
    }
}

/// Decode the part of a data URI after `data:`.
fn decode_data_uri(rest: &str) -> std::result::Result<Vec<u8>, String> {
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| "malformed data URI".to_string())?;

    if meta.split(';').any(|part| part.eq_ignore_ascii_case("base64")) {
        // Whitespace is tolerated by browsers; strip it before decoding.
        let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        base64::engine::general_purpose::STANDARD
            .decode(compact.as_bytes())
            .map_err(|e| format!("invalid base64 payload: {e}"))
    } else {
        Ok(percent_decode(payload))
    }
}

fn percent_decode(input: &str) -> Vec<u8> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let high = (bytes[i + 1] as char).to_digit(16);
            let low = (bytes[i + 2] as char).to_digit(16);
            if let (Some(high), Some(low)) = (high, low) {
                out.push((high * 16 + low) as u8);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    out
}

fn fetch_error(url: &str, reason: impl std::fmt::Display) -> VitalcardError {
    VitalcardError::AssetFetch {
        url: url.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn decodes_base64_data_uri() {
        let fetcher = DefaultFetcher::new();
        let bytes = fetcher.fetch("data:image/png;base64,aGVsbG8=").await.unwrap();
        assert_eq!(bytes, b"hello");
    }

    #[tokio::test]
    async fn decodes_percent_encoded_data_uri() {
        let fetcher = DefaultFetcher::new();
        let bytes = fetcher.fetch("data:text/plain,a%20b").await.unwrap();
        assert_eq!(bytes, b"a b");
    }

    #[tokio::test]
    async fn reads_local_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logo.bin");
        std::fs::write(&path, [1u8, 2, 3]).unwrap();

        let fetcher = DefaultFetcher::new();
        let plain = fetcher.fetch(path.to_str().unwrap()).await.unwrap();
        let uri = format!("file://{}", path.display());
        let via_uri = fetcher.fetch(&uri).await.unwrap();
        assert_eq!(plain, vec![1, 2, 3]);
        assert_eq!(via_uri, plain);
    }

    #[tokio::test]
    async fn rejects_empty_and_blob_references() {
        let fetcher = DefaultFetcher::new();
        assert!(matches!(
            fetcher.fetch("  ").await,
            Err(VitalcardError::AssetFetch { .. })
        ));
        assert!(fetcher.fetch("blob:https://app/1234").await.is_err());
        assert!(fetcher.fetch("/definitely/not/here.png").await.is_err());
    }

    #[tokio::test]
    async fn memory_fetcher_serves_known_urls() {
        let fetcher = MemoryFetcher::new().with("mem://photo", vec![9, 9]);
        assert_eq!(fetcher.fetch("mem://photo").await.unwrap(), vec![9, 9]);
        assert!(fetcher.fetch("mem://other").await.is_err());
    }
}
