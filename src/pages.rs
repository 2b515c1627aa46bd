//! Page data for each route, and the about page's scene mount.

use pulldown_cmark::{CowStr, Event, HeadingLevel, LinkType, Tag, TagEnd};

use crate::{
    about,
    articles::{Article, ArticlePreview, ArticleService},
    frame::FrameScheduler,
    render::Renderer,
    resources::Fetch,
    routing::{self, NavigationMenu, Resolution, Route},
    flow::CANVAS_ID,
    scene::{DisposalReport, SceneManager, SceneParameters},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Page {
    Articles(Vec<ArticlePreview>),
    Article(Article),
    About,
    NotFound,
}

impl Page {
    /// The page body as HTML. Text from the manifest is escaped; article
    /// content is already HTML.
    pub fn to_html(&self) -> String {
        let mut events: Vec<Event> = Vec::new();
        match self {
            Page::Articles(previews) => {
                events.push(Event::Start(Tag::List(None)));
                for preview in previews {
                    events.push(Event::Start(Tag::Item));
                    events.push(Event::Start(Tag::Link {
                        link_type: LinkType::Inline,
                        dest_url: Route::Article {
                            name: preview.name.clone(),
                        }
                        .path()
                        .into(),
                        title: CowStr::Borrowed(""),
                        id: CowStr::Borrowed(""),
                    }));
                    events.push(Event::Text(preview.title.as_str().into()));
                    events.push(Event::End(TagEnd::Link));
                    if !preview.description.is_empty() {
                        events.push(Event::Start(Tag::Paragraph));
                        events.push(Event::Text(preview.description.as_str().into()));
                        events.push(Event::End(TagEnd::Paragraph));
                    }
                    events.push(Event::End(TagEnd::Item));
                }
                events.push(Event::End(TagEnd::List(false)));
            }
            Page::Article(article) => {
                if let Some(metadata) = &article.metadata {
                    events.push(Event::Start(Tag::Heading {
                        level: HeadingLevel::H1,
                        id: None,
                        classes: vec!["title".into()],
                        attrs: vec![],
                    }));
                    events.push(Event::Text(metadata.title.as_str().into()));
                    events.push(Event::End(TagEnd::Heading(HeadingLevel::H1)));
                }
                events.push(Event::Html(article.content.as_str().into()));
            }
            Page::About => events.push(Event::Html(
                format!("<canvas id=\"{}\"></canvas>\n", CANVAS_ID).into(),
            )),
            Page::NotFound => {
                events.push(Event::Start(Tag::Paragraph));
                events.push(Event::Text("Page not found".into()));
                events.push(Event::End(TagEnd::Paragraph));
            }
        }
        let mut html = String::new();
        pulldown_cmark::html::push_html(&mut html, events.into_iter());
        html
    }
}

/// The site shell: article data, routing and the navigation menu.
#[derive(Debug)]
pub struct Site<F: Fetch> {
    articles: ArticleService<F>,
    menu: NavigationMenu,
}

impl<F: Fetch> Site<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            articles: ArticleService::new(fetcher),
            menu: NavigationMenu::new(),
        }
    }

    pub fn articles(&self) -> &ArticleService<F> {
        &self.articles
    }

    pub fn menu(&self) -> &NavigationMenu {
        &self.menu
    }

    pub fn menu_mut(&mut self) -> &mut NavigationMenu {
        &mut self.menu
    }

    /// Resolves `path` and loads what its page shows. Returns the route that
    /// was rendered, which differs from `path` after a redirect.
    pub async fn load(&mut self, path: &str) -> anyhow::Result<(Route, Page)> {
        let route = match routing::resolve(path) {
            Resolution::Render(route) => route,
            Resolution::Redirect(route) => {
                log::debug!("redirecting {:?} to {}", path, route);
                route
            }
        };
        self.menu.close();
        let page = match &route {
            Route::Articles => Page::Articles(self.articles.get_article_metadata().await?),
            Route::Article { name } => Page::Article(self.articles.get_article_by_name(name).await?),
            Route::About => Page::About,
            Route::NotFound => Page::NotFound,
        };
        Ok((route, page))
    }
}

/// Owns the about page's scene while the page is shown.
pub struct AboutPage<R: Renderer> {
    scene: Option<SceneManager<R>>,
}

impl<R: Renderer> AboutPage<R> {
    pub fn new() -> Self {
        Self { scene: None }
    }

    /// Starts the demo scene on `renderer`. A scene that is still mounted is
    /// destroyed first.
    pub fn mount(
        &mut self,
        renderer: R,
        scheduler: Box<dyn FrameScheduler>,
        parameters: SceneParameters,
        device_pixel_ratio: f64,
    ) -> &mut SceneManager<R> {
        if self.scene.is_some() {
            log::warn!("about page mounted twice, replacing its scene");
            self.unmount();
        }
        let mut scene = SceneManager::new(renderer, scheduler, parameters, device_pixel_ratio);
        about::populate(&mut scene);
        self.scene.insert(scene)
    }

    pub fn unmount(&mut self) -> Option<DisposalReport> {
        self.scene.take().map(|mut scene| scene.on_destroy())
    }

    pub fn is_mounted(&self) -> bool {
        self.scene.is_some()
    }

    pub fn scene(&self) -> Option<&SceneManager<R>> {
        self.scene.as_ref()
    }

    pub fn scene_mut(&mut self) -> Option<&mut SceneManager<R>> {
        self.scene.as_mut()
    }
}

impl<R: Renderer> Default for AboutPage<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Renderer> Drop for AboutPage<R> {
    fn drop(&mut self) {
        self.unmount();
    }
}
