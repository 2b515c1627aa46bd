use std::{cell::RefCell, collections::HashMap};

use folio::resources::Fetch;

/// Serves fixed text per path and records every request. Unknown paths fail
/// like a 404 would.
#[derive(Default)]
pub(crate) struct StaticFetcher {
    files: HashMap<String, String>,
    requests: RefCell<Vec<String>>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, path: &str, text: &str) -> Self {
        self.files.insert(path.to_string(), text.to_string());
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }
}

impl Fetch for StaticFetcher {
    async fn fetch_text(&self, path: &str) -> anyhow::Result<String> {
        self.requests.borrow_mut().push(path.to_string());
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("404 Not Found: {}", path))
    }
}

pub(crate) const MANIFEST: &str = r#"[
    {"name": "k8s-operator-go", "title": "Writing a Kubernetes operator", "description": "Go edition"},
    {"name": "k8s-operator-rust", "title": "Writing a Kubernetes operator", "description": "Rust edition"},
    {"name": "hello", "title": "Hello"}
]"#;

pub(crate) fn site_fetcher() -> StaticFetcher {
    StaticFetcher::new()
        .with("/assets/posts/articles.json", MANIFEST)
        .with("/assets/posts/hello.md", "# Hi")
        .with("/assets/posts/unlisted.md", "Not in the manifest.")
        .with("/assets/posts/k8s-operator-rust.md", "## Setup\n\nUse `kube-rs`.")
}
