//! Window, surface and input around a [`Stage`] and its [`RendererSlot`].

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use manylights_render::config::step_light_count;
use manylights_render::context::{request_device, GpuContext};
use manylights_render::renderers::create_renderer;
use manylights_render::scene::SceneLayouts;
use manylights_render::{RenderError, RenderMode, RendererSlot, Stage};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::ActiveEventLoop;
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowId};

use crate::cli::Args;
use crate::demo_scene;

/// Lights added or removed per key press.
const LIGHT_STEP: i64 = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Action {
    SetMode(RenderMode),
    StepLights(i64),
    Exit,
}

fn key_action(key: &Key) -> Option<Action> {
    match key {
        Key::Named(NamedKey::Escape) => Some(Action::Exit),
        Key::Character(c) => match c.as_str() {
            "1" => Some(Action::SetMode(RenderMode::Naive)),
            "2" => Some(Action::SetMode(RenderMode::ForwardPlus)),
            "3" => Some(Action::SetMode(RenderMode::ClusteredDeferred)),
            "+" | "=" => Some(Action::StepLights(LIGHT_STEP)),
            "-" | "_" => Some(Action::StepLights(-LIGHT_STEP)),
            _ => None,
        },
        _ => None,
    }
}

/// Frame time averaged over roughly one second of frames.
#[derive(Debug, Default)]
struct FrameStats {
    window_start: Option<f64>,
    frames: u32,
}

impl FrameStats {
    /// Counts a frame at `now` seconds. Returns the mean frame time in
    /// milliseconds once a second has elapsed since the window opened.
    fn record(&mut self, now: f64) -> Option<f64> {
        let start = *self.window_start.get_or_insert(now);
        self.frames += 1;
        let elapsed = now - start;
        if elapsed < 1.0 {
            return None;
        }
        let frame_ms = elapsed * 1000.0 / self.frames as f64;
        self.window_start = Some(now);
        self.frames = 0;
        Some(frame_ms)
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

struct Viewer {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    surface_config: wgpu::SurfaceConfiguration,
    stage: Stage,
    slot: RendererSlot<Stage>,
    clock: Instant,
    stats: FrameStats,
}

impl Viewer {
    fn new(event_loop: &ActiveEventLoop, args: &Args) -> Result<Self> {
        let attributes = Window::default_attributes()
            .with_title("manylights")
            .with_inner_size(PhysicalSize::new(args.width, args.height));
        let window = Arc::new(event_loop.create_window(attributes)?);
        let size = window.inner_size();
        let (width, height) = (size.width.max(1), size.height.max(1));

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window.clone())
            .context("failed to create surface")?;
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or(RenderError::AdapterUnavailable)?;
        let (device, queue) = pollster::block_on(request_device(&adapter))?;

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first())
            .copied()
            .ok_or_else(|| RenderError::surface("surface reports no supported formats"))?;
        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);
        log::info!("Surface configured: {}x{} {:?}", width, height, format);

        let gpu = GpuContext::from_parts(adapter, device, queue, format, width, height);
        let layouts = SceneLayouts::new(&gpu.device);
        let scene = demo_scene::build_scene(&gpu.device, &gpu.queue, &layouts);
        let config = args.renderer_config();
        let stage = Stage::new(
            gpu,
            layouts,
            scene,
            demo_scene::orbit_camera(width, height),
            config,
        )?;

        let mut slot = RendererSlot::new();
        slot.set_on_frame(|stage: &mut Stage, time| stage.advance(time));
        slot.set_strategy(|| create_renderer(config.mode, &stage))?;

        window.request_redraw();
        Ok(Self {
            window,
            surface,
            surface_config,
            stage,
            slot,
            clock: Instant::now(),
            stats: FrameStats::default(),
        })
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.surface_config.width = width;
        self.surface_config.height = height;
        self.surface
            .configure(&self.stage.gpu.device, &self.surface_config);
        self.stage.resize(width, height)?;
        Ok(())
    }

    fn redraw(&mut self) -> Result<()> {
        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(e @ (wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                log::warn!("Surface {:?}, reconfiguring and skipping frame", e);
                self.surface
                    .configure(&self.stage.gpu.device, &self.surface_config);
                self.window.request_redraw();
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Surface timeout, skipping frame");
                self.window.request_redraw();
                return Ok(());
            }
            Err(e) => return Err(RenderError::surface(e).into()),
        };

        self.stage.target = Some(
            frame
                .texture
                .create_view(&wgpu::TextureViewDescriptor::default()),
        );
        let now = self.clock.elapsed().as_secs_f64();
        let ran = self.slot.run_frame(&mut self.stage, now);
        self.stage.target = None;

        if ran? {
            self.window.pre_present_notify();
            frame.present();
            if let Some(frame_ms) = self.stats.record(now) {
                log::info!(
                    "{} | {} lights | {:.2} ms/frame",
                    self.stage_mode(),
                    self.stage.lights.num_lights(),
                    frame_ms
                );
            }
        }
        if self.slot.frame_loop().pending().is_some() {
            self.window.request_redraw();
        }
        Ok(())
    }

    fn stage_mode(&self) -> String {
        self.slot
            .mode()
            .map_or_else(|| "none".to_string(), |mode| mode.to_string())
    }

    fn apply(&mut self, action: Action, event_loop: &ActiveEventLoop) -> Result<()> {
        match action {
            Action::Exit => event_loop.exit(),
            Action::SetMode(mode) => {
                if self.slot.mode() != Some(mode) {
                    let stage = &self.stage;
                    self.slot.set_strategy(|| create_renderer(mode, stage))?;
                    self.stats.reset();
                    self.window.request_redraw();
                }
            }
            Action::StepLights(step) => {
                let count = step_light_count(self.stage.lights.num_lights(), step);
                self.stage.set_light_count(count)?;
                log::info!("{} lights", count);
            }
        }
        Ok(())
    }

    fn handle_event(&mut self, event_loop: &ActiveEventLoop, event: WindowEvent) -> Result<()> {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Shutdown requested, exiting event loop...");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => self.resize(size.width, size.height)?,
            WindowEvent::RedrawRequested => self.redraw()?,
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key,
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                if let Some(action) = key_action(&logical_key) {
                    self.apply(action, event_loop)?;
                }
            }
            _ => {}
        }
        Ok(())
    }
}

pub struct App {
    args: Args,
    viewer: Option<Viewer>,
    error: Option<anyhow::Error>,
}

impl App {
    pub fn new(args: Args) -> Self {
        Self {
            args,
            viewer: None,
            error: None,
        }
    }

    /// Result of the run once the event loop has returned.
    pub fn finish(mut self) -> Result<()> {
        match self.error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{:#}", error);
        self.error = Some(error);
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.viewer.is_some() {
            return;
        }
        match Viewer::new(event_loop, &self.args) {
            Ok(viewer) => self.viewer = Some(viewer),
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        let Some(viewer) = self.viewer.as_mut() else {
            return;
        };
        if viewer.window.id() != id {
            return;
        }
        if let Err(e) = viewer.handle_event(event_loop, event) {
            self.fail(event_loop, e);
        }
    }
}
