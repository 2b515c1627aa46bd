//! Browser entry points of the site shell.
//!
//! Every call builds its services from the page: assets are fetched from the
//! page origin, the theme lives in `localStorage` and is applied through
//! `link#global-theme`. The about scene itself is started with `runAbout`.

use wasm_bindgen::prelude::*;

use crate::{
    pages::Site,
    resources::{HttpFetcher, storage::LocalStorage, stylesheet::DocumentLink},
    theme::{ThemeName, ThemeSwitcher, theme},
};

type PageThemes = ThemeSwitcher<HttpFetcher, LocalStorage, DocumentLink>;

fn to_js(e: anyhow::Error) -> JsValue {
    JsValue::from_str(&format!("{:#}", e))
}

fn init_logging() {
    if console_log::init_with_level(log::Level::Info).is_err() {
        log::debug!("logger already initialized");
    }
}

fn page_themes() -> anyhow::Result<PageThemes> {
    Ok(ThemeSwitcher::new(
        HttpFetcher::from_origin()?,
        LocalStorage::new()?,
        DocumentLink::new()?,
    ))
}

/// Applies the stored theme and resolves to its name.
#[wasm_bindgen(js_name = defaultTheme)]
pub async fn default_theme() -> Result<String, JsValue> {
    init_logging();
    let mut themes = page_themes().map_err(to_js)?;
    Ok(themes.default_theme().await.name.to_string())
}

#[wasm_bindgen(js_name = setTheme)]
pub async fn set_theme(name: String) -> Result<(), JsValue> {
    init_logging();
    let name: ThemeName = name.parse().map_err(to_js)?;
    let mut themes = page_themes().map_err(to_js)?;
    themes.set_theme(theme(name)).await.map_err(to_js)
}

/// Switches from the stored theme to the next one in the ring and resolves to
/// the new theme's name.
#[wasm_bindgen(js_name = nextTheme)]
pub async fn next_theme() -> Result<String, JsValue> {
    init_logging();
    let mut themes = page_themes().map_err(to_js)?;
    let current = themes.stored_theme();
    let next = themes.next_theme(current).await.map_err(to_js)?;
    Ok(next.name.to_string())
}

/// Font Awesome class of the icon shown for `name`.
#[wasm_bindgen(js_name = themeIcon)]
pub fn theme_icon(name: &str) -> Result<String, JsValue> {
    let name: ThemeName = name.parse().map_err(to_js)?;
    Ok(theme(name).icon.css_class().to_string())
}

/// Loads the page for `path` and resolves to its HTML.
#[wasm_bindgen(js_name = renderPage)]
pub async fn render_page(path: String) -> Result<String, JsValue> {
    init_logging();
    let mut site = Site::new(HttpFetcher::from_origin().map_err(to_js)?);
    let (route, page) = site.load(&path).await.map_err(to_js)?;
    log::info!("rendered {}", route);
    Ok(page.to_html())
}
