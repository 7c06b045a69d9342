mod atlas;
mod hud;

use std::time::Instant;

use anyhow::{Context, Result};
use ouroboros::self_referencing;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use hudkit_engine::device::{Gpu, GpuInit, SurfaceErrorAction};
use hudkit_engine::logging::{init_logging, LoggingConfig};
use hudkit_engine::render::WgpuDriver;

use atlas::Atlas;
use hud::Hud;

/// Window configuration.
#[derive(Debug, Clone)]
struct DemoConfig {
    title: String,
    initial_size: LogicalSize<f64>,
    clear_color: wgpu::Color,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            title: "hudkit demo".to_string(),
            initial_size: LogicalSize::new(800.0, 480.0),
            clear_color: wgpu::Color {
                r: 0.28,
                g: 0.45,
                b: 0.75,
                a: 1.0,
            },
        }
    }
}

#[self_referencing]
struct WindowEntry {
    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

/// Everything created once the window exists.
struct Session {
    id: WindowId,
    entry: WindowEntry,
    hud: Hud,
    // Bound into the driver; kept alive for the session.
    _atlas: Atlas,
}

struct DemoApp {
    config: DemoConfig,
    gpu_init: GpuInit,
    session: Option<Session>,
    started: Instant,
}

impl DemoApp {
    fn new(config: DemoConfig, gpu_init: GpuInit) -> Self {
        Self {
            config,
            gpu_init,
            session: None,
            started: Instant::now(),
        }
    }

    fn create_session(&self, event_loop: &ActiveEventLoop) -> Result<Session> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);
        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;
        let id = window.id();

        let gpu_init = self.gpu_init.clone();
        let entry = WindowEntry::try_new(window, |w| pollster::block_on(Gpu::new(w, gpu_init)))
            .context("GPU initialization failed")?;

        let (atlas, hud) = entry.with_gpu(|gpu| {
            let atlas = Atlas::new(gpu.device(), gpu.queue());
            let mut driver = WgpuDriver::new(gpu.device(), gpu.queue());
            driver.set_atlas(&atlas.view);
            let hud = Hud::new(driver, atlas.textures.clone());
            (atlas, hud)
        });

        Ok(Session {
            id,
            entry,
            hud,
            _atlas: atlas,
        })
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(session) = self.session.take() {
            session.hud.shutdown();
        }
        event_loop.exit();
    }

    /// Draws one frame. Returns `false` when the loop must stop.
    fn redraw(&mut self) -> bool {
        let Some(session) = self.session.as_mut() else {
            return true;
        };
        let seconds = self.started.elapsed().as_secs_f32();
        let clear_color = self.config.clear_color;
        let hud = &mut session.hud;

        session.entry.with_gpu_mut(|gpu| {
            let mut frame = match gpu.begin_frame() {
                Ok(frame) => frame,
                Err(e) => {
                    return match gpu.handle_surface_error(e) {
                        SurfaceErrorAction::Fatal => {
                            log::error!("surface out of memory");
                            false
                        }
                        action => {
                            log::debug!("frame skipped: {action:?}");
                            true
                        }
                    };
                }
            };

            clear(&mut frame.encoder, &frame.view, clear_color);

            if let Err(e) = hud.frame(seconds) {
                log::error!("overlay frame failed: {e}");
                return false;
            }

            {
                let mut target = gpu.render_target(&mut frame);
                hud.driver_mut().encode(&mut target);
            }

            gpu.submit(frame);
            true
        })
    }

    fn on_key(&mut self, event: &KeyEvent) -> bool {
        if event.state != ElementState::Pressed {
            return true;
        }
        let PhysicalKey::Code(code) = event.physical_key else {
            return true;
        };
        let Some(session) = self.session.as_mut() else {
            return true;
        };

        match code {
            KeyCode::Escape => return false,
            KeyCode::ArrowLeft => session.hud.step_selection(-1),
            KeyCode::ArrowRight => session.hud.step_selection(1),
            KeyCode::Digit1 => session.hud.select(0),
            KeyCode::Digit2 => session.hud.select(1),
            KeyCode::Digit3 => session.hud.select(2),
            KeyCode::Digit4 => session.hud.select(3),
            KeyCode::Digit5 => session.hud.select(4),
            KeyCode::Digit6 => session.hud.select(5),
            KeyCode::Digit7 => session.hud.select(6),
            KeyCode::Digit8 => session.hud.select(7),
            KeyCode::Digit9 => session.hud.select(8),
            _ => {}
        }
        true
    }
}

fn clear(encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView, color: wgpu::Color) {
    let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("demo clear pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(color),
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
        multiview_mask: None,
    });
}

impl ApplicationHandler for DemoApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.session.is_some() {
            return;
        }

        match self.create_session(event_loop) {
            Ok(session) => {
                session.entry.with_window(|w| w.request_redraw());
                self.session = Some(session);
            }
            Err(e) => {
                log::error!("failed to start: {e:#}");
                event_loop.exit();
            }
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::Wait);
        if let Some(session) = &self.session {
            session.entry.with_window(|w| w.request_redraw());
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        if self.session.as_ref().is_none_or(|s| s.id != window_id) {
            return;
        }

        let keep_running = match &event {
            WindowEvent::CloseRequested => false,
            WindowEvent::KeyboardInput { event, .. } => self.on_key(event),
            WindowEvent::Resized(size) => {
                if let Some(session) = self.session.as_mut() {
                    session.entry.with_gpu_mut(|gpu| gpu.resize(*size));
                }
                true
            }
            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(session) = self.session.as_mut() {
                    let size = session.entry.with_window(|w| w.inner_size());
                    session.entry.with_gpu_mut(|gpu| gpu.resize(size));
                }
                true
            }
            WindowEvent::RedrawRequested => self.redraw(),
            _ => true,
        };

        if !keep_running {
            self.shutdown(event_loop);
        }
    }
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
    let mut app = DemoApp::new(DemoConfig::default(), GpuInit::default());

    event_loop
        .run_app(&mut app)
        .context("winit event loop terminated with error")?;

    Ok(())
}
