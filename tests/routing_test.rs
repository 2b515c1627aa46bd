use folio::{
    pages::{Page, Site},
    routing::{NavigationMenu, Resolution, Route, resolve},
};

use crate::common::test_utils::site_fetcher;

mod common;

#[test]
fn root_redirects_to_the_article_list() {
    assert_eq!(resolve("/"), Resolution::Redirect(Route::Articles));
    assert_eq!(resolve(""), Resolution::Redirect(Route::Articles));
}

#[test]
fn known_paths_resolve() {
    assert_eq!(resolve("/articles"), Resolution::Render(Route::Articles));
    assert_eq!(resolve("/about"), Resolution::Render(Route::About));
    assert_eq!(
        resolve("/articles/hello"),
        Resolution::Render(Route::Article {
            name: "hello".to_string()
        })
    );
}

#[test]
fn trailing_slashes_queries_and_fragments_are_ignored() {
    assert_eq!(resolve("/about/"), Resolution::Render(Route::About));
    assert_eq!(resolve("/articles?page=2"), Resolution::Render(Route::Articles));
    assert_eq!(
        resolve("/articles/hello#setup").route(),
        &Route::Article {
            name: "hello".to_string()
        }
    );
}

#[test]
fn everything_else_is_not_found() {
    for path in ["/404", "/blog", "/articles/a/b", "/about/me"] {
        assert_eq!(resolve(path), Resolution::Render(Route::NotFound), "{}", path);
    }
}

#[test]
fn route_paths_resolve_back_to_the_route() {
    let routes = [
        Route::Articles,
        Route::About,
        Route::NotFound,
        Route::Article {
            name: "k8s-operator-rust".to_string(),
        },
    ];
    for route in routes {
        assert_eq!(resolve(&route.path()).route(), &route);
    }
}

#[test]
fn burger_menu_toggles() {
    let mut menu = NavigationMenu::new();
    assert!(!menu.is_open());

    assert!(menu.toggle());
    assert!(!menu.toggle());
}

#[tokio::test]
async fn site_loads_page_data_per_route() {
    let mut site = Site::new(site_fetcher());

    let (route, page) = site.load("/").await.unwrap();
    assert_eq!(route, Route::Articles);
    assert!(matches!(page, Page::Articles(previews) if previews.len() == 3));

    let (_, page) = site.load("/articles/hello").await.unwrap();
    assert!(matches!(page, Page::Article(article) if article.content == "<h1>Hi</h1>\n"));

    assert_eq!(site.load("/about").await.unwrap().1, Page::About);
    assert_eq!(site.load("/nowhere").await.unwrap().1, Page::NotFound);
}

#[tokio::test]
async fn navigating_closes_the_menu() {
    let mut site = Site::new(site_fetcher());
    site.menu_mut().toggle();

    site.load("/about").await.unwrap();

    assert!(!site.menu().is_open());
}

#[tokio::test]
async fn missing_article_body_fails_the_page() {
    let mut site = Site::new(site_fetcher());

    assert!(site.load("/articles/k8s-operator-go").await.is_err());
}
