//! Renders site pages from a local checkout of the assets.
//!
//! Usage: `site [ROOT] [PATH] [--next-theme]`. ROOT defaults to the current
//! directory and must contain `assets/`; PATH defaults to `/`.

use folio::{
    pages::Site,
    resources::{AssetFetcher, storage::FileStore, stylesheet::DetachedLink},
    theme::ThemeSwitcher,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = env_logger::try_init() {
        println!("Warning: Could not initialize logger: {}", e);
    };

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let next_theme = args.iter().any(|a| a == "--next-theme");
    args.retain(|a| a != "--next-theme");
    let root = args.first().cloned().unwrap_or_else(|| "./".to_string());
    let path = args.get(1).cloned().unwrap_or_else(|| "/".to_string());

    let fetcher = AssetFetcher::new(&root);
    let store = FileStore::open(std::path::Path::new(&root).join(".folio-settings.json"))?;
    let mut themes = ThemeSwitcher::new(fetcher.clone(), store, DetachedLink::new());
    let mut theme = themes.default_theme().await;
    if next_theme {
        theme = themes.next_theme(theme).await?;
    }
    log::info!("theme: {} ({})", theme.name, theme.icon.css_class());

    let mut site = Site::new(fetcher);
    let (route, page) = site.load(&path).await?;
    println!("<!-- {} -->", route);
    print!("{}", page.to_html());
    Ok(())
}
