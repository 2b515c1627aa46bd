//! Article manifest and markdown bodies.

use serde::{Deserialize, Serialize};

use crate::resources::Fetch;

pub const MANIFEST_PATH: &str = "/assets/posts/articles.json";
pub const POSTS_DIR: &str = "/assets/posts";

/// One entry of the article manifest.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticlePreview {
    pub name: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Article {
    /// `None` when the manifest has no entry for the article.
    pub metadata: Option<ArticlePreview>,
    /// The body rendered to HTML.
    pub content: String,
}

pub fn post_path(name: &str) -> String {
    format!("{}/{}.md", POSTS_DIR, name)
}

/// CommonMark plus tables and strikethrough.
pub fn render_markdown(markdown: &str) -> String {
    let options = pulldown_cmark::Options::ENABLE_TABLES | pulldown_cmark::Options::ENABLE_STRIKETHROUGH;
    let parser = pulldown_cmark::Parser::new_ext(markdown, options);
    let mut html = String::with_capacity(markdown.len() * 3 / 2);
    pulldown_cmark::html::push_html(&mut html, parser);
    html
}

#[derive(Clone, Debug)]
pub struct ArticleService<F: Fetch> {
    fetcher: F,
}

impl<F: Fetch> ArticleService<F> {
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// The full manifest. Fetched on every call.
    pub async fn get_article_metadata(&self) -> anyhow::Result<Vec<ArticlePreview>> {
        let text = self.fetcher.fetch_text(MANIFEST_PATH).await?;
        let previews = serde_json::from_str(&text)
            .map_err(|e| anyhow::anyhow!("malformed {}: {}", MANIFEST_PATH, e))?;
        Ok(previews)
    }

    /// Fetches the manifest entry and the body of `name` concurrently.
    pub async fn get_article_by_name(&self, name: &str) -> anyhow::Result<Article> {
        let metadata = async {
            let previews = self.get_article_metadata().await?;
            anyhow::Ok(previews.into_iter().find(|preview| preview.name == name))
        };
        let path = post_path(name);
        let body = self.fetcher.fetch_text(&path);

        let (metadata, body) = futures::join!(metadata, body);
        let metadata = metadata?;
        if metadata.is_none() {
            log::warn!("article {:?} is not listed in {}", name, MANIFEST_PATH);
        }
        Ok(Article {
            metadata,
            content: render_markdown(&body?),
        })
    }
}
