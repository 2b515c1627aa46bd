//! Site themes and the switcher that applies them.
//!
//! Three themes form a ring: light → dark → nuclear → light. The active
//! theme's name is persisted under [`THEME_STORAGE_KEY`], and its stylesheet
//! is applied through the page's `link#global-theme` element. The
//! [`ThemeSwitcher`] owns both, so it is the only code that writes either,
//! and a theme is only persisted and applied after its stylesheet was
//! fetched successfully.

use std::{fmt, str::FromStr};

use crate::resources::{Fetch, storage::KeyValueStore, stylesheet::StylesheetLink};

pub const THEME_STORAGE_KEY: &str = "theme";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ThemeName {
    Light,
    Dark,
    Nuclear,
}

impl ThemeName {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeName::Light => "light",
            ThemeName::Dark => "dark",
            ThemeName::Nuclear => "nuclear",
        }
    }
}

impl fmt::Display for ThemeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThemeName {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(ThemeName::Light),
            "dark" => Ok(ThemeName::Dark),
            "nuclear" => Ok(ThemeName::Nuclear),
            other => anyhow::bail!("unknown theme {:?}", other),
        }
    }
}

/// Icon shown in the navigation bar while a theme is active.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Icon {
    Sun,
    Moon,
    RadiationAlt,
}

impl Icon {
    /// Font Awesome class name.
    pub fn css_class(&self) -> &'static str {
        match self {
            Icon::Sun => "fa-sun",
            Icon::Moon => "fa-moon",
            Icon::RadiationAlt => "fa-radiation-alt",
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct ThemeConfig {
    pub name: ThemeName,
    pub css_path: &'static str,
    pub next: ThemeName,
    pub icon: Icon,
}

pub static THEMES: [ThemeConfig; 3] = [
    ThemeConfig {
        name: ThemeName::Light,
        css_path: "/assets/css/bulma.min.css",
        next: ThemeName::Dark,
        icon: Icon::Sun,
    },
    ThemeConfig {
        name: ThemeName::Dark,
        css_path: "/assets/css/darkly.min.css",
        next: ThemeName::Nuclear,
        icon: Icon::Moon,
    },
    ThemeConfig {
        name: ThemeName::Nuclear,
        css_path: "/assets/css/nuclear.min.css",
        next: ThemeName::Light,
        icon: Icon::RadiationAlt,
    },
];

pub const DEFAULT_THEME: ThemeName = ThemeName::Light;

pub fn theme(name: ThemeName) -> &'static ThemeConfig {
    match name {
        ThemeName::Light => &THEMES[0],
        ThemeName::Dark => &THEMES[1],
        ThemeName::Nuclear => &THEMES[2],
    }
}

pub struct ThemeSwitcher<F: Fetch, S: KeyValueStore, L: StylesheetLink> {
    fetcher: F,
    store: S,
    link: L,
    active: &'static ThemeConfig,
}

impl<F: Fetch, S: KeyValueStore, L: StylesheetLink> ThemeSwitcher<F, S, L> {
    pub fn new(fetcher: F, store: S, link: L) -> Self {
        Self {
            fetcher,
            store,
            link,
            active: theme(DEFAULT_THEME),
        }
    }

    /// The persisted theme, or light when none (or an unknown one) is
    /// stored. Nothing is applied.
    pub fn stored_theme(&self) -> &'static ThemeConfig {
        let name = self
            .store
            .get(THEME_STORAGE_KEY)
            .and_then(|stored| match stored.parse() {
                Ok(name) => Some(name),
                Err(e) => {
                    log::warn!("ignoring stored theme: {}", e);
                    None
                }
            })
            .unwrap_or(DEFAULT_THEME);
        theme(name)
    }

    /// Applies [`Self::stored_theme`]. Applying it is best effort: a failure
    /// is logged and the theme is returned anyway.
    pub async fn default_theme(&mut self) -> &'static ThemeConfig {
        let config = self.stored_theme();
        if let Err(e) = self.set_theme(config).await {
            log::error!("Unable to apply the {} theme: {}", config.name, e);
        }
        config
    }

    /// Fetches the stylesheet of `config`; only once that succeeded, points
    /// the stylesheet link at it and persists the theme. Either both change
    /// or neither does.
    pub async fn set_theme(&mut self, config: &'static ThemeConfig) -> anyhow::Result<()> {
        self.fetcher.fetch_text(config.css_path).await?;
        let previous = self.link.href();
        self.link.set_href(config.css_path)?;
        if let Err(e) = self.store.set(THEME_STORAGE_KEY, config.name.as_str()) {
            let restored = match previous {
                Some(href) => self.link.set_href(&href),
                None => self.link.clear_href(),
            };
            if let Err(restore) = restored {
                log::error!("Unable to restore the previous stylesheet: {}", restore);
            }
            return Err(e.context(format!("cannot persist the {} theme", config.name)));
        }
        self.active = config;
        log::info!("switched to the {} theme", config.name);
        Ok(())
    }

    /// Applies the successor of `current` in the ring.
    pub async fn next_theme(&mut self, current: &ThemeConfig) -> anyhow::Result<&'static ThemeConfig> {
        let next = theme(current.next);
        self.set_theme(next).await?;
        Ok(next)
    }

    /// The theme most recently applied successfully.
    pub fn active(&self) -> &'static ThemeConfig {
        self.active
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn link(&self) -> &L {
        &self.link
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_visits_every_theme_and_closes() {
        let mut current = theme(ThemeName::Light);
        let mut seen = Vec::new();
        for _ in 0..THEMES.len() {
            seen.push(current.name);
            current = theme(current.next);
        }

        assert_eq!(current.name, ThemeName::Light);
        assert_eq!(seen, vec![ThemeName::Light, ThemeName::Dark, ThemeName::Nuclear]);
    }

    #[test]
    fn names_round_trip_through_storage_strings() {
        for config in &THEMES {
            assert_eq!(config.name.as_str().parse::<ThemeName>().unwrap(), config.name);
        }
        assert!("solarized".parse::<ThemeName>().is_err());
    }
}
