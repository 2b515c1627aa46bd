/**
 * Everything the site loads from or keeps outside the process: text assets
 * fetched over HTTP (or read from an assets directory natively), the small
 * key/value store the theme is persisted in, and the stylesheet link the
 * active theme is applied through.
 */
pub mod storage;
pub mod stylesheet;

#[cfg(not(target_arch = "wasm32"))]
use std::path::{Component, Path, PathBuf};

use anyhow::Context;

/// Loads text by absolute site path, e.g. `/assets/posts/articles.json`.
#[allow(async_fn_in_trait)]
pub trait Fetch {
    async fn fetch_text(&self, path: &str) -> anyhow::Result<String>;
}

impl<F: Fetch> Fetch for &F {
    async fn fetch_text(&self, path: &str) -> anyhow::Result<String> {
        (**self).fetch_text(path).await
    }
}

/// Fetches over HTTP relative to a base URL. Non-2xx responses are errors.
#[derive(Clone, Debug)]
pub struct HttpFetcher {
    client: reqwest::Client,
    base: reqwest::Url,
}

impl HttpFetcher {
    pub fn new(base: &str) -> anyhow::Result<Self> {
        let base = reqwest::Url::parse(base).with_context(|| format!("invalid base URL {:?}", base))?;
        Ok(Self {
            client: reqwest::Client::new(),
            base,
        })
    }

    /// A fetcher for the origin the page was served from.
    #[cfg(target_arch = "wasm32")]
    pub fn from_origin() -> anyhow::Result<Self> {
        let origin = web_sys::window()
            .ok_or_else(|| anyhow::anyhow!("no window"))?
            .location()
            .origin()
            .map_err(|e| anyhow::anyhow!("cannot read the page origin: {:?}", e))?;
        Self::new(&format!("{}/", origin))
    }

    pub fn url(&self, path: &str) -> anyhow::Result<reqwest::Url> {
        Ok(self.base.join(path)?)
    }
}

impl Fetch for HttpFetcher {
    async fn fetch_text(&self, path: &str) -> anyhow::Result<String> {
        let url = self.url(path)?;
        log::debug!("GET {}", url);
        let response = self.client.get(url.clone()).send().await?;
        let text = response
            .error_for_status()
            .with_context(|| format!("GET {} failed", url))?
            .text()
            .await?;
        Ok(text)
    }
}

/// Reads site paths from a local assets directory, so `/assets/x` maps to
/// `<root>/assets/x`.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Clone, Debug)]
pub struct AssetFetcher {
    root: PathBuf,
}

#[cfg(not(target_arch = "wasm32"))]
impl AssetFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn resolve(&self, path: &str) -> anyhow::Result<PathBuf> {
        let relative = Path::new(path.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            anyhow::bail!("refusing to read {:?} outside the asset root", path);
        }
        Ok(self.root.join(relative))
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl Default for AssetFetcher {
    fn default() -> Self {
        Self::new("./")
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl Fetch for AssetFetcher {
    async fn fetch_text(&self, path: &str) -> anyhow::Result<String> {
        let file = self.resolve(path)?;
        log::debug!("reading {}", file.display());
        tokio::fs::read_to_string(&file)
            .await
            .with_context(|| format!("cannot read {}", file.display()))
    }
}
