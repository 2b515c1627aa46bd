use folio::{
    resources::{
        storage::{KeyValueStore, MemoryStore},
        stylesheet::{DetachedLink, StylesheetLink},
    },
    theme::{THEME_STORAGE_KEY, THEMES, ThemeName, ThemeSwitcher, theme},
};

use crate::common::test_utils::StaticFetcher;

mod common;

/// A link element that has been removed from the page.
struct RemovedLink;

impl StylesheetLink for RemovedLink {
    fn href(&self) -> Option<String> {
        None
    }

    fn set_href(&mut self, _href: &str) -> anyhow::Result<()> {
        anyhow::bail!("link is not in the document")
    }

    fn clear_href(&mut self) -> anyhow::Result<()> {
        anyhow::bail!("link is not in the document")
    }
}

/// Storage that refuses writes, as a full or disabled localStorage does.
struct ReadOnlyStore;

impl KeyValueStore for ReadOnlyStore {
    fn get(&self, _key: &str) -> Option<String> {
        None
    }

    fn set(&mut self, _key: &str, _value: &str) -> anyhow::Result<()> {
        anyhow::bail!("quota exceeded")
    }
}

fn all_stylesheets() -> StaticFetcher {
    THEMES
        .iter()
        .fold(StaticFetcher::new(), |fetcher, t| fetcher.with(t.css_path, "/* css */"))
}

fn store_with(value: &str) -> MemoryStore {
    let mut store = MemoryStore::new();
    store.set(THEME_STORAGE_KEY, value).unwrap();
    store
}

#[tokio::test]
async fn defaults_to_light_without_a_stored_theme() {
    let mut switcher = ThemeSwitcher::new(all_stylesheets(), MemoryStore::new(), DetachedLink::new());

    let applied = switcher.default_theme().await;

    assert_eq!(applied.name, ThemeName::Light);
    assert_eq!(switcher.link().href().as_deref(), Some("/assets/css/bulma.min.css"));
    assert_eq!(switcher.store().get(THEME_STORAGE_KEY).as_deref(), Some("light"));
}

#[tokio::test]
async fn restores_the_stored_theme() {
    let mut switcher = ThemeSwitcher::new(all_stylesheets(), store_with("nuclear"), DetachedLink::new());

    let applied = switcher.default_theme().await;

    assert_eq!(applied.name, ThemeName::Nuclear);
    assert_eq!(switcher.active().name, ThemeName::Nuclear);
    assert_eq!(switcher.link().href().as_deref(), Some("/assets/css/nuclear.min.css"));
}

#[tokio::test]
async fn unknown_stored_theme_falls_back_to_light() {
    let mut switcher = ThemeSwitcher::new(all_stylesheets(), store_with("solarized"), DetachedLink::new());

    assert_eq!(switcher.default_theme().await.name, ThemeName::Light);
    assert_eq!(switcher.store().get(THEME_STORAGE_KEY).as_deref(), Some("light"));
}

#[tokio::test]
async fn default_theme_is_returned_even_when_it_cannot_be_applied() {
    let mut switcher = ThemeSwitcher::new(StaticFetcher::new(), store_with("dark"), DetachedLink::new());

    let applied = switcher.default_theme().await;

    assert_eq!(applied.name, ThemeName::Dark);
    assert_eq!(switcher.link().href(), None);
}

#[tokio::test]
async fn three_switches_close_the_ring() {
    let mut switcher = ThemeSwitcher::new(all_stylesheets(), MemoryStore::new(), DetachedLink::new());
    let start = switcher.default_theme().await;

    let mut current = start;
    for expected in [ThemeName::Dark, ThemeName::Nuclear, ThemeName::Light] {
        current = switcher.next_theme(current).await.unwrap();
        assert_eq!(current.name, expected);
        assert_eq!(switcher.link().href().as_deref(), Some(current.css_path));
        assert_eq!(switcher.store().get(THEME_STORAGE_KEY).as_deref(), Some(current.name.as_str()));
    }

    assert_eq!(current, start);
}

#[tokio::test]
async fn failed_stylesheet_fetch_changes_nothing() {
    let fetcher = StaticFetcher::new().with("/assets/css/bulma.min.css", "/* css */");
    let mut switcher = ThemeSwitcher::new(fetcher, MemoryStore::new(), DetachedLink::new());
    let light = switcher.default_theme().await;

    let result = switcher.next_theme(light).await;

    assert!(result.is_err());
    assert_eq!(switcher.active().name, ThemeName::Light);
    assert_eq!(switcher.link().href().as_deref(), Some("/assets/css/bulma.min.css"));
    assert_eq!(switcher.store().get(THEME_STORAGE_KEY).as_deref(), Some("light"));
}

#[tokio::test]
async fn set_theme_fetches_the_stylesheet_first() {
    let mut switcher = ThemeSwitcher::new(all_stylesheets(), MemoryStore::new(), DetachedLink::new());

    switcher.set_theme(theme(ThemeName::Dark)).await.unwrap();

    assert_eq!(switcher.link().href().as_deref(), Some("/assets/css/darkly.min.css"));
}

#[tokio::test]
async fn failed_link_update_does_not_persist_the_theme() {
    let mut switcher = ThemeSwitcher::new(all_stylesheets(), MemoryStore::new(), RemovedLink);

    let result = switcher.set_theme(theme(ThemeName::Dark)).await;

    assert!(result.is_err());
    assert_eq!(switcher.store().get(THEME_STORAGE_KEY), None);
    assert_eq!(switcher.active().name, ThemeName::Light);
}

#[tokio::test]
async fn failed_persist_restores_the_previous_stylesheet() {
    let mut link = DetachedLink::new();
    link.set_href("/assets/css/bulma.min.css").unwrap();
    let mut switcher = ThemeSwitcher::new(all_stylesheets(), ReadOnlyStore, link);

    let result = switcher.set_theme(theme(ThemeName::Nuclear)).await;

    assert!(result.is_err());
    assert_eq!(switcher.link().href().as_deref(), Some("/assets/css/bulma.min.css"));
    assert_eq!(switcher.active().name, ThemeName::Light);
}

#[tokio::test]
async fn failed_first_persist_leaves_the_link_empty() {
    let mut switcher = ThemeSwitcher::new(all_stylesheets(), ReadOnlyStore, DetachedLink::new());

    assert!(switcher.set_theme(theme(ThemeName::Dark)).await.is_err());
    assert_eq!(switcher.link().href(), None);
}

#[test]
fn stored_theme_reads_without_applying() {
    let switcher = ThemeSwitcher::new(StaticFetcher::new(), store_with("dark"), DetachedLink::new());

    assert_eq!(switcher.stored_theme().name, ThemeName::Dark);
    assert_eq!(switcher.link().href(), None);
    assert!(switcher.fetcher().requests().is_empty());
}
