//! Path to page mapping and the navigation menu state.

use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Route {
    Articles,
    Article { name: String },
    About,
    NotFound,
}

impl Route {
    /// The canonical path of the route.
    pub fn path(&self) -> String {
        match self {
            Route::Articles => "/articles".to_string(),
            Route::Article { name } => format!("/articles/{}", name),
            Route::About => "/about".to_string(),
            Route::NotFound => "/404".to_string(),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Result of resolving a path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    Render(Route),
    /// The path is an alias; navigate to the route's path instead.
    Redirect(Route),
}

impl Resolution {
    pub fn route(&self) -> &Route {
        match self {
            Resolution::Render(route) | Resolution::Redirect(route) => route,
        }
    }
}

/// Maps a location path to a route. Query strings, fragments and trailing
/// slashes are ignored.
pub fn resolve(path: &str) -> Resolution {
    let path = path
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .trim_end_matches('/');
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    match segments.as_slice() {
        [] => Resolution::Redirect(Route::Articles),
        ["articles"] => Resolution::Render(Route::Articles),
        ["articles", name] => Resolution::Render(Route::Article {
            name: name.to_string(),
        }),
        ["about"] => Resolution::Render(Route::About),
        _ => Resolution::Render(Route::NotFound),
    }
}

/// The burger menu shown on narrow screens.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NavigationMenu {
    burger_active: bool,
}

impl NavigationMenu {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle(&mut self) -> bool {
        self.burger_active = !self.burger_active;
        self.burger_active
    }

    pub fn is_open(&self) -> bool {
        self.burger_active
    }

    /// Closes the menu, e.g. after following one of its links.
    pub fn close(&mut self) {
        self.burger_active = false;
    }
}
