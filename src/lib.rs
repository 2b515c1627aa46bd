//! folio
//!
//! The runtime of a personal blog and portfolio site: an article list and
//! markdown article pages loaded from static assets, a three-way theme
//! switcher, path routing, and a small interactive wgpu scene on the about
//! page. Builds natively and for WASM, where the scene renders into the
//! page's `<canvas id="canvas">`.
//!
//! High-level modules
//! - `scene`: scene lifecycle (construct, configure, resize, frame, destroy)
//! - `elements`: reusable scene content (box, plane, light, fog)
//! - `debug`: live-editable debug fields bound to scene properties
//! - `camera`: perspective camera and orbit controls
//! - `frame`: frame clock, lifetime token and frame scheduling
//! - `flow`: the winit event loop driving a scene in a window
//! - `render`, `context`, `pipelines`: the wgpu renderer
//! - `data_structures`: scene graph, geometries, materials, colours
//! - `articles`: article manifest and markdown rendering
//! - `theme`: themes and the switcher applying them
//! - `resources`: fetching, persistent storage and the stylesheet link
//! - `routing`, `pages`, `about`: routes, page data and the about scene
//! - `web`: the browser entry points (WASM only)
//!

pub mod about;
pub mod articles;
pub mod camera;
pub mod context;
pub mod data_structures;
pub mod debug;
pub mod elements;
pub mod flow;
pub mod frame;
pub mod pages;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod routing;
pub mod scene;
pub mod theme;
#[cfg(target_arch = "wasm32")]
pub mod web;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports commonly used types for convenience in downstream code.
pub use data_structures::color::Color;
pub use render::{RenderSettings, Renderer, WgpuRenderer};
pub use scene::{SceneManager, SceneParameters};
pub use winit::event::WindowEvent;
