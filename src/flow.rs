//! Application event loop.
//!
//! [`run`] opens a window (the `<canvas id="canvas">` element on the web),
//! creates a [`SceneManager`] on it and hands it to a setup closure that
//! populates the scene. From then on the runner only forwards events:
//!
//! 1. `Resized` and `ScaleFactorChanged` go to the scene's resize hooks,
//! 2. pointer input goes to the orbit controls,
//! 3. `RedrawRequested` advances one frame, which requests the next,
//! 4. `CloseRequested` destroys the scene and leaves the loop.

use std::{fmt::Debug, sync::Arc};

use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::Window,
};

use crate::{
    render::{RenderSettings, WgpuRenderer},
    scene::{SceneManager, SceneParameters},
};

/// Id of the canvas the scene renders into on the web.
pub const CANVAS_ID: &str = "canvas";

/// Populates a freshly constructed scene.
pub type SceneSetup = Box<dyn FnOnce(&mut SceneManager<WgpuRenderer>)>;

pub(crate) enum FlowEvent {
    #[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
    Initialized(anyhow::Result<SceneManager<WgpuRenderer>>),
}

impl Debug for FlowEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initialized(Ok(scene)) => f.debug_tuple("Initialized").field(scene).finish(),
            Self::Initialized(Err(e)) => f.debug_tuple("Initialized").field(e).finish(),
        }
    }
}

pub(crate) struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    #[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
    proxy: winit::event_loop::EventLoopProxy<FlowEvent>,
    parameters: SceneParameters,
    settings: RenderSettings,
    setup: Option<SceneSetup>,
    initializing: bool,
    scene: Option<SceneManager<WgpuRenderer>>,
}

impl App {
    fn new(
        event_loop: &EventLoop<FlowEvent>,
        parameters: SceneParameters,
        settings: RenderSettings,
        setup: SceneSetup,
    ) -> anyhow::Result<Self> {
        let proxy = event_loop.create_proxy();
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime: tokio::runtime::Runtime::new()?,
            proxy,
            parameters,
            settings,
            setup: Some(setup),
            initializing: false,
            scene: None,
        })
    }

    fn create_window(&self, event_loop: &ActiveEventLoop) -> anyhow::Result<Arc<Window>> {
        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes().with_title("folio");

        #[cfg(not(target_arch = "wasm32"))]
        {
            window_attributes = window_attributes.with_inner_size(winit::dpi::LogicalSize::new(
                self.parameters.width,
                self.parameters.height,
            ));
        }

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            let canvas = web_sys::window()
                .and_then(|window| window.document())
                .and_then(|document| document.get_element_by_id(CANVAS_ID))
                .ok_or_else(|| anyhow::anyhow!("no element with id {:?}", CANVAS_ID))?;
            let html_canvas_element = canvas.unchecked_into();
            window_attributes = window_attributes.with_canvas(Some(html_canvas_element));
        }

        Ok(Arc::new(event_loop.create_window(window_attributes)?))
    }

    /// Runs the setup closure and syncs the scene with the real window size.
    fn start(&mut self, event_loop: &ActiveEventLoop, scene: anyhow::Result<SceneManager<WgpuRenderer>>) {
        let mut scene = match scene {
            Ok(scene) => scene,
            Err(e) => {
                log::error!("Cannot create the scene: {}", e);
                event_loop.exit();
                return;
            }
        };
        if let Some(setup) = self.setup.take() {
            setup(&mut scene);
        }
        let window = scene.renderer().context().window().clone();
        scene.set_device_pixel_ratio(window.scale_factor());
        let size = window.inner_size().to_logical::<f64>(window.scale_factor());
        scene.on_resize(size.width.round() as u32, size.height.round() as u32);
        window.request_redraw();
        self.scene = Some(scene);
    }
}

impl ApplicationHandler<FlowEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.initializing || self.scene.is_some() {
            return;
        }
        self.initializing = true;

        let window = match self.create_window(event_loop) {
            Ok(window) => window,
            Err(e) => {
                log::error!("Cannot create a window: {}", e);
                event_loop.exit();
                return;
            }
        };
        let init_future = SceneManager::for_window(window, self.parameters, self.settings);

        #[cfg(not(target_arch = "wasm32"))]
        {
            let scene = self.async_runtime.block_on(init_future);
            self.start(event_loop, scene);
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let scene = init_future.await;
                if proxy.send_event(FlowEvent::Initialized(scene)).is_err() {
                    log::error!("event loop closed before the scene was initialized");
                }
            });
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: FlowEvent) {
        match event {
            // Sent by the wasm `spawn_local` in `resumed`.
            FlowEvent::Initialized(scene) => self.start(event_loop, scene),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let scene = match &mut self.scene {
            Some(scene) => scene,
            None => return,
        };

        if scene.handle_window_event(&event) {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                scene.on_destroy();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                let scale_factor = scene.renderer().context().window().scale_factor();
                let size = size.to_logical::<f64>(scale_factor);
                scene.on_resize(size.width.round() as u32, size.height.round() as u32);
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                log::debug!("scale factor changed to {}", scale_factor);
                scene.set_device_pixel_ratio(scale_factor);
            }
            WindowEvent::RedrawRequested => scene.on_frame(),
            _ => {}
        }
    }
}

/// Opens a window and runs a scene in it until the window is closed.
pub fn run(
    parameters: SceneParameters,
    settings: RenderSettings,
    setup: SceneSetup,
) -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        if console_log::init_with_level(log::Level::Info).is_err() {
            log::debug!("logger already initialized");
        }
    }

    let event_loop: EventLoop<FlowEvent> = EventLoop::with_user_event().build()?;

    let mut app = App::new(&event_loop, parameters, settings, setup)?;

    event_loop.run_app(&mut app)?;

    Ok(())
}
