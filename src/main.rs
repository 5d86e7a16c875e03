//! Fractal Grove entry point
//!
//! Handles platform-specific initialization and runs the render loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_app {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlInputElement};

    use fractal_grove::fractal::{
        ComplexParameter, FractalFormula, RenderJob, RenderReply, RenderRequest, RenderParams,
        FractalView, Tile,
    };
    use fractal_grove::growth::{self, GrowthConfig, GrowthResult};
    use fractal_grove::renderer::FractalSurface;
    use fractal_grove::settings::{RenderBackend, Settings};

    /// Application state shared by the render loop and input handlers
    struct App {
        settings: Settings,
        backend: RenderBackend,

        // Fractal inputs
        depth: f64,
        amplifiers: u32,
        center: ComplexParameter,
        julia_mode: bool,
        julia_constant: Option<ComplexParameter>,

        // Fractal backends
        gpu: Option<FractalSurface>,
        cpu_ctx: Option<CanvasRenderingContext2d>,
        cpu_job: Option<RenderJob>,
        canvas_size: (u32, u32),

        // Growth state
        growth: GrowthConfig,
        growth_result: Option<GrowthResult>,
        growth_dirty: bool,
    }

    impl App {
        fn new(settings: Settings) -> Self {
            let growth = GrowthConfig {
                max_segments: settings.max_segments,
                max_sentence_length: settings.max_sentence_length,
                ..GrowthConfig::default()
            };
            Self {
                backend: settings.backend,
                settings,
                depth: 0.0,
                amplifiers: 0,
                center: ComplexParameter::new(-0.75, 0.11),
                julia_mode: false,
                julia_constant: None,
                gpu: None,
                cpu_ctx: None,
                cpu_job: None,
                canvas_size: (0, 0),
                growth,
                growth_result: None,
                growth_dirty: true,
            }
        }

        fn formula(&self) -> FractalFormula {
            if self.julia_mode {
                FractalFormula::julia(self.julia_constant, self.center)
            } else {
                FractalFormula::Mandelbrot
            }
        }

        fn view(&self) -> FractalView {
            FractalView::new(
                self.canvas_size.0,
                self.canvas_size.1,
                self.center,
                self.formula(),
                RenderParams::derive(self.depth, self.amplifiers),
            )
        }

        /// Replace any in-flight CPU render with one for the current inputs.
        /// The stale job is dropped outright so its tiles never mix in.
        fn restart_cpu_render(&mut self) {
            let (w, h) = self.canvas_size;
            if w == 0 || h == 0 {
                return;
            }
            let request = RenderRequest {
                tile_height: self.settings.tile_height,
                ..RenderRequest::new(w, h, self.depth, self.amplifiers, self.center, self.formula())
            };
            // Dropping the previous job terminates its worker
            match RenderJob::spawn(request) {
                Ok(job) => self.cpu_job = Some(job),
                Err(e) => {
                    log::warn!("failed to start render worker: {e:?}");
                    self.cpu_job = None;
                }
            }
        }

        fn on_fractal_input_changed(&mut self) {
            if self.backend == RenderBackend::Cpu {
                self.restart_cpu_render();
            }
            // The GPU path re-derives uniforms every frame; nothing to do
        }

        /// Paint whatever strips the render worker has delivered so far.
        fn step_cpu_render(&mut self) {
            let Some(job) = self.cpu_job.as_ref() else {
                return;
            };
            for reply in job.poll() {
                match reply {
                    RenderReply::Tile(tile) => {
                        if let Some(ctx) = &self.cpu_ctx {
                            paint_tile(ctx, &tile);
                        }
                    }
                    RenderReply::Done => {
                        log::debug!("cpu render complete");
                        self.cpu_job = None;
                        return;
                    }
                }
            }
        }

        fn render(&mut self) {
            match self.backend {
                RenderBackend::Gpu => {
                    let view = self.view();
                    if let Some(gpu) = self.gpu.as_mut() {
                        match gpu.render(&view) {
                            Ok(_) => {}
                            Err(wgpu::SurfaceError::Lost) => {
                                gpu.resize(gpu.size.0, gpu.size.1);
                            }
                            Err(wgpu::SurfaceError::OutOfMemory) => {
                                log::error!("Out of memory!");
                            }
                            Err(e) => log::warn!("Render error: {:?}", e),
                        }
                    }
                }
                RenderBackend::Cpu => self.step_cpu_render(),
            }
        }

        fn regenerate_growth(&mut self) {
            if !self.growth_dirty {
                return;
            }
            self.growth_dirty = false;
            self.growth_result = Some(growth::generate(&self.growth));
        }

        /// Push the growth stats into the HUD
        fn update_hud(&self) {
            let Some(result) = &self.growth_result else {
                return;
            };
            let stats = &result.stats;
            let window = web_sys::window().unwrap();
            let document = window.document().unwrap();

            let fields: [(&str, String); 6] = [
                ("stat-leaves", stats.leaf_count.to_string()),
                ("stat-segments", stats.segment_count.to_string()),
                ("stat-exposure", format!("{:.0}%", stats.avg_exposure * 100.0)),
                ("stat-volume", format!("{:.2}", stats.total_volume)),
                ("stat-height", format!("{:.1}", stats.max_height)),
                ("stat-angle-hint", format!("{:.0}\u{b0}", stats.suggested_angle)),
            ];
            for (id, value) in fields {
                if let Some(el) = document.get_element_by_id(id) {
                    el.set_text_content(Some(&value));
                }
            }
        }
    }

    fn paint_tile(ctx: &CanvasRenderingContext2d, tile: &Tile) {
        let image = web_sys::ImageData::new_with_u8_clamped_array_and_sh(
            wasm_bindgen::Clamped(&tile.pixels),
            tile.width,
            tile.height,
        );
        match image {
            Ok(image) => {
                let _ = ctx.put_image_data(&image, 0.0, f64::from(tile.y_offset));
            }
            Err(e) => log::warn!("tile upload failed: {:?}", e),
        }
    }

    fn canvas_by_id(document: &web_sys::Document, id: &str) -> Option<HtmlCanvasElement> {
        document.get_element_by_id(id)?.dyn_into().ok()
    }

    fn read_input_f64(document: &web_sys::Document, id: &str) -> Option<f64> {
        let input: HtmlInputElement = document.get_element_by_id(id)?.dyn_into().ok()?;
        input.value().parse().ok()
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Fractal Grove starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");
        let settings = Settings::load();

        let canvas = canvas_by_id(&document, "fractal-canvas").expect("no fractal canvas");
        let dpr = window.device_pixel_ratio();
        let width = (canvas.client_width() as f64 * dpr) as u32;
        let height = (canvas.client_height() as f64 * dpr) as u32;
        canvas.set_width(width);
        canvas.set_height(height);

        // Try the GPU path first; any failure downgrades to CPU tiles.
        // The adapter is probed before the surface is created so a failed
        // probe leaves the canvas free for a 2D context.
        let mut gpu = None;
        if settings.backend == RenderBackend::Gpu {
            let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
                backends: wgpu::Backends::BROWSER_WEBGPU,
                ..Default::default()
            });
            let adapter = instance
                .request_adapter(&wgpu::RequestAdapterOptions {
                    power_preference: wgpu::PowerPreference::HighPerformance,
                    compatible_surface: None,
                    force_fallback_adapter: false,
                })
                .await;
            match adapter {
                Ok(adapter) => {
                    log::info!("Using adapter: {:?}", adapter.get_info().name);
                    match instance.create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone())) {
                        Ok(surface) => {
                            gpu = Some(FractalSurface::new(surface, &adapter, width, height).await);
                        }
                        Err(e) => log::warn!("No WebGPU surface ({e}), falling back to CPU"),
                    }
                }
                Err(e) => log::warn!("No WebGPU adapter ({e:?}), falling back to CPU"),
            }
        }

        let backend = settings.backend.effective(gpu.is_some());
        log::info!("Fractal backend: {}", backend.as_str());

        let app = Rc::new(RefCell::new(App::new(settings)));
        {
            let mut a = app.borrow_mut();
            a.backend = backend;
            a.canvas_size = (width, height);
            a.gpu = gpu;
            if backend == RenderBackend::Cpu {
                // The same canvas switches to a 2D context for tile painting
                a.cpu_ctx = canvas
                    .get_context("2d")
                    .ok()
                    .flatten()
                    .and_then(|ctx| ctx.dyn_into().ok());
                a.restart_cpu_render();
            }
        }

        setup_input_handlers(&document, app.clone());
        request_animation_frame(app);

        log::info!("Fractal Grove running!");
    }

    fn setup_input_handlers(document: &web_sys::Document, app: Rc<RefCell<App>>) {
        // Fractal parameter sliders
        for id in ["depth", "amplifiers", "center-real", "center-imag"] {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                let document = web_sys::window().unwrap().document().unwrap();
                let mut a = app.borrow_mut();
                if let Some(v) = read_input_f64(&document, "depth") {
                    a.depth = v;
                }
                if let Some(v) = read_input_f64(&document, "amplifiers") {
                    a.amplifiers = v.max(0.0) as u32;
                }
                if let Some(v) = read_input_f64(&document, "center-real") {
                    a.center.real = v;
                }
                if let Some(v) = read_input_f64(&document, "center-imag") {
                    a.center.imaginary = v;
                }
                a.on_fractal_input_changed();
            });
            if let Some(el) = document.get_element_by_id(id) {
                let _ = el
                    .add_event_listener_with_callback("input", closure.as_ref().unchecked_ref());
            }
            closure.forget();
        }

        // Growth parameter sliders
        for id in ["iterations", "angle", "step", "width"] {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                let document = web_sys::window().unwrap().document().unwrap();
                let mut a = app.borrow_mut();
                if let Some(v) = read_input_f64(&document, "iterations") {
                    a.growth.iterations = v.max(0.0) as u32;
                }
                if let Some(v) = read_input_f64(&document, "angle") {
                    a.growth.angle_degrees = v as f32;
                }
                if let Some(v) = read_input_f64(&document, "step") {
                    a.growth.step = v as f32;
                }
                if let Some(v) = read_input_f64(&document, "width") {
                    a.growth.width = v as f32;
                }
                a.growth_dirty = true;
            });
            if let Some(el) = document.get_element_by_id(id) {
                let _ = el
                    .add_event_listener_with_callback("input", closure.as_ref().unchecked_ref());
            }
            closure.forget();
        }

        // Keyboard: 'b' toggles the backend, 'j' julia mode, 'p'/'r' pitch/roll
        {
            let app = app.clone();
            let window = web_sys::window().unwrap();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                let mut a = app.borrow_mut();
                match event.key().as_str() {
                    "b" | "B" => {
                        a.settings.backend = a.backend.toggled();
                        a.settings.save();
                        log::info!(
                            "Backend set to {}; reloading",
                            a.settings.backend.as_str()
                        );
                        // A canvas binds one context kind for life, so the
                        // switch takes effect on a fresh page
                        if let Some(win) = web_sys::window() {
                            let _ = win.location().reload();
                        }
                    }
                    "j" | "J" => {
                        a.julia_mode = !a.julia_mode;
                        log::info!("Julia mode: {}", a.julia_mode);
                        a.on_fractal_input_changed();
                    }
                    "p" | "P" => {
                        a.growth.enable_pitch = !a.growth.enable_pitch;
                        a.growth_dirty = true;
                    }
                    "r" | "R" => {
                        a.growth.enable_roll = !a.growth.enable_roll;
                        a.growth_dirty = true;
                    }
                    _ => {}
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(app: Rc<RefCell<App>>) {
        let window = web_sys::window().unwrap();
        let closure = Closure::once(move |_time: f64| {
            frame_loop(app);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn frame_loop(app: Rc<RefCell<App>>) {
        {
            let mut a = app.borrow_mut();
            a.regenerate_growth();
            a.render();
            a.update_hud();
        }
        request_animation_frame(app);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_app::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use fractal_grove::fractal::{ComplexParameter, FractalFormula, RenderJob, RenderRequest};
    use fractal_grove::growth::{self, GrowthConfig};

    env_logger::init();
    log::info!("Fractal Grove (native) starting...");

    // Smoke-run both engines; the interactive build targets wasm
    let request = RenderRequest::new(
        120,
        80,
        2.0,
        1,
        ComplexParameter::new(-0.75, 0.11),
        FractalFormula::Mandelbrot,
    );
    let tiles = RenderJob::spawn(request).wait();
    let rows: u32 = tiles.iter().map(|t| t.height).sum();
    log::info!("fractal: {} tiles covering {} rows", tiles.len(), rows);
    assert_eq!(rows, 80);

    let result = growth::generate(&GrowthConfig::default());
    log::info!(
        "growth: {} segments, {} leaves, avg exposure {:.2}, suggested angle {:.0}",
        result.stats.segment_count,
        result.stats.leaf_count,
        result.stats.avg_exposure,
        result.stats.suggested_angle,
    );
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
