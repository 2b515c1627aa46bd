//! The `<link>` element the site-wide stylesheet is loaded through.

/// Id of the stylesheet link element in the page.
pub const GLOBAL_THEME_LINK_ID: &str = "global-theme";

pub trait StylesheetLink {
    fn href(&self) -> Option<String>;
    fn set_href(&mut self, href: &str) -> anyhow::Result<()>;
    /// Removes the `href`, leaving the link without a stylesheet.
    fn clear_href(&mut self) -> anyhow::Result<()>;
}

/// A link that is not part of any document, for native hosts and tests.
#[derive(Clone, Debug, Default)]
pub struct DetachedLink {
    href: Option<String>,
}

impl DetachedLink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StylesheetLink for DetachedLink {
    fn href(&self) -> Option<String> {
        self.href.clone()
    }

    fn set_href(&mut self, href: &str) -> anyhow::Result<()> {
        self.href = Some(href.to_string());
        Ok(())
    }

    fn clear_href(&mut self) -> anyhow::Result<()> {
        self.href = None;
        Ok(())
    }
}

/// The `link#global-theme` element of the current document, created in
/// `<head>` when the page has none.
#[cfg(target_arch = "wasm32")]
#[derive(Debug)]
pub struct DocumentLink {
    element: web_sys::Element,
}

#[cfg(target_arch = "wasm32")]
impl DocumentLink {
    pub fn new() -> anyhow::Result<Self> {
        let js = |e: wasm_bindgen::JsValue| anyhow::anyhow!("{:?}", e);
        let document = web_sys::window()
            .and_then(|window| window.document())
            .ok_or_else(|| anyhow::anyhow!("no document"))?;
        if let Some(element) = document.get_element_by_id(GLOBAL_THEME_LINK_ID) {
            return Ok(Self { element });
        }

        let element = document.create_element("link").map_err(js)?;
        element.set_id(GLOBAL_THEME_LINK_ID);
        element.set_attribute("rel", "stylesheet").map_err(js)?;
        let head = document
            .head()
            .ok_or_else(|| anyhow::anyhow!("document has no <head>"))?;
        head.append_child(&element).map_err(js)?;
        Ok(Self { element })
    }
}

#[cfg(target_arch = "wasm32")]
impl StylesheetLink for DocumentLink {
    fn href(&self) -> Option<String> {
        self.element.get_attribute("href")
    }

    fn set_href(&mut self, href: &str) -> anyhow::Result<()> {
        self.element
            .set_attribute("href", href)
            .map_err(|e| anyhow::anyhow!("cannot set the stylesheet href: {:?}", e))
    }

    fn clear_href(&mut self) -> anyhow::Result<()> {
        self.element
            .remove_attribute("href")
            .map_err(|e| anyhow::anyhow!("cannot clear the stylesheet href: {:?}", e))
    }
}
