//! Interactive viewer for the ant-trail simulation.
//!
//! Owns the window, surface and parameter state; the keyboard bindings stand
//! in for the slider panel of the original host app (see the key map in
//! [`Viewer::handle_key`]).

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use wgpu::{Device, Instance, Queue, RequestAdapterOptions, Surface, SurfaceConfiguration};
use winit::{
    dpi::LogicalSize,
    event::{ElementState, Event, KeyEvent, WindowEvent},
    event_loop::EventLoop,
    window::{Window, WindowBuilder},
};

use myrmex_core::Simulation;
use myrmex_params::{ranges, AntVariables, SimulationConfig, TrailVariables};

use crate::renderer::BlitRenderer;

/// Central GPU context that owns the device, queue and presentation surface.
pub struct GpuContext {
    pub device: Device,
    pub queue: Queue,
    pub surface: Surface<'static>,
    pub config: SurfaceConfiguration,
}

/// Main viewer state.
pub struct Viewer {
    window: Arc<Window>,

    sim: Simulation,
    renderer: BlitRenderer,

    // Live-tunable parameter blocks; the core snapshots them every frame.
    ants: AntVariables,
    trail: TrailVariables,

    last_frame_time: Instant,
    frame_count: u32,
}

impl Viewer {
    pub fn new(window: Arc<Window>, gpu: &GpuContext, config: SimulationConfig) -> Result<Self> {
        let size = [gpu.config.width, gpu.config.height];
        let sim = Simulation::new(&gpu.device, &gpu.queue, size, &config.ants, config.seed);
        let renderer = BlitRenderer::new(&gpu.device, &gpu.config, sim.display_view())?;

        Ok(Self {
            window,
            sim,
            renderer,
            ants: config.ants,
            trail: config.trail,
            last_frame_time: Instant::now(),
            frame_count: 0,
        })
    }

    /// Apply a new window size. Runs on the event-loop thread between
    /// frames, so the reseed + reallocation is never interleaved with an
    /// in-flight frame's bindings.
    pub fn resize(&mut self, gpu: &mut GpuContext, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        gpu.config.width = new_size.width;
        gpu.config.height = new_size.height;
        gpu.surface.configure(&gpu.device, &gpu.config);

        self.sim.resize(
            &gpu.device,
            &gpu.queue,
            [new_size.width, new_size.height],
            &self.ants,
        );
        self.renderer.rebind(&gpu.device, self.sim.display_view());
    }

    /// Run one frame: acquire a drawable, advance the simulation, blit and
    /// present. A frame without a drawable is dropped, not queued.
    pub fn render_frame(&mut self, gpu: &GpuContext) -> Result<()> {
        let output = match gpu.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost) | Err(wgpu::SurfaceError::Outdated) => {
                // Reconfigure and retry next tick.
                gpu.surface.configure(&gpu.device, &gpu.config);
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::debug!("no drawable this tick, frame dropped");
                return Ok(());
            }
            Err(e @ wgpu::SurfaceError::OutOfMemory) => {
                return Err(e).context("surface out of memory");
            }
        };

        let now = Instant::now();
        let delta_time = (now - self.last_frame_time).as_secs_f32().min(0.1);
        self.last_frame_time = now;

        self.sim
            .step(&gpu.device, &gpu.queue, delta_time, &self.ants, &self.trail);

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("blit_encoder"),
            });
        self.renderer.render(&mut encoder, &view);
        gpu.queue.submit(Some(encoder.finish()));
        output.present();

        self.frame_count += 1;
        if self.frame_count % 300 == 0 {
            log::debug!(
                "frame {}: {} ants on {}x{}",
                self.frame_count,
                self.sim.particles.count(),
                self.sim.size()[0],
                self.sim.size()[1]
            );
        }
        Ok(())
    }

    /// Keyboard stand-in for the slider panel.
    ///
    /// 1/2 move speed, 3/4 turn speed, 5/6 sensor size, 7/8 sensor distance,
    /// 9/0 sensor angle, q/w trail weight, a/s diffuse rate, z/x decay rate.
    pub fn handle_key(&mut self, key: &winit::keyboard::Key) {
        let c = match key {
            winit::keyboard::Key::Character(c) => c.as_str(),
            _ => return,
        };
        match c {
            "1" => self.ants.move_speed -= 0.5,
            "2" => self.ants.move_speed += 0.5,
            "3" => self.ants.turn_speed -= 0.02,
            "4" => self.ants.turn_speed += 0.02,
            "5" => self.ants.sensor_size -= 1,
            "6" => self.ants.sensor_size += 1,
            "7" => self.ants.sensor_distance -= 1.0,
            "8" => self.ants.sensor_distance += 1.0,
            "9" => self.ants.sensor_angle -= 0.05,
            "0" => self.ants.sensor_angle += 0.05,
            "q" => self.ants.trail_weight -= 0.05,
            "w" => self.ants.trail_weight += 0.05,
            "a" => self.trail.diffuse_rate -= 0.05,
            "s" => self.trail.diffuse_rate += 0.05,
            "z" => self.trail.decay_rate -= 0.0005,
            "x" => self.trail.decay_rate += 0.0005,
            _ => return,
        }
        self.clamp_variables();
        ranges::log_variables(&self.ants, &self.trail);
    }

    /// The core never validates; clamp to the original slider ranges here.
    fn clamp_variables(&mut self) {
        self.ants.move_speed = ranges::clamp_f32(self.ants.move_speed, ranges::MOVE_SPEED);
        self.ants.turn_speed = ranges::clamp_f32(self.ants.turn_speed, ranges::TURN_SPEED);
        self.ants.sensor_size = ranges::clamp_i32(self.ants.sensor_size, ranges::SENSOR_SIZE);
        self.ants.sensor_distance =
            ranges::clamp_f32(self.ants.sensor_distance, ranges::SENSOR_DISTANCE);
        self.ants.sensor_angle = ranges::clamp_f32(self.ants.sensor_angle, ranges::SENSOR_ANGLE);
        self.ants.trail_weight = ranges::clamp_f32(self.ants.trail_weight, ranges::TRAIL_WEIGHT);
        self.trail.diffuse_rate = ranges::clamp_f32(self.trail.diffuse_rate, ranges::DIFFUSE_RATE);
        self.trail.decay_rate = ranges::clamp_f32(self.trail.decay_rate, ranges::DECAY_RATE);
    }
}

/// Run the interactive viewer until the window closes.
pub async fn run_viewer(config: SimulationConfig) -> Result<()> {
    let event_loop = EventLoop::new()?;

    let window = Arc::new(
        WindowBuilder::new()
            .with_title("Myrmex")
            .with_inner_size(LogicalSize::new(
                config.size[0] as f64,
                config.size[1] as f64,
            ))
            .build(&event_loop)?,
    );

    let instance = Instance::default();
    let surface = instance.create_surface(window.clone())?;
    let adapter = instance
        .request_adapter(&RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        })
        .await
        .context("no suitable GPU adapter")?;

    let (device, queue) = adapter
        .request_device(
            &wgpu::DeviceDescriptor {
                // Read-write storage textures (the deposit step's trail
                // binding) need this native-only feature.
                required_features: wgpu::Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES,
                required_limits: wgpu::Limits::default(),
                label: None,
            },
            None,
        )
        .await
        .context("failed to create device")?;

    let surface_caps = surface.get_capabilities(&adapter);
    let surface_format = surface_caps
        .formats
        .iter()
        .copied()
        .find(|f| f.is_srgb())
        .unwrap_or(surface_caps.formats[0]);

    let surface_config = SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format: surface_format,
        width: window.inner_size().width.max(1),
        height: window.inner_size().height.max(1),
        present_mode: surface_caps.present_modes[0],
        alpha_mode: surface_caps.alpha_modes[0],
        view_formats: vec![],
        desired_maximum_frame_latency: 2,
    };
    surface.configure(&device, &surface_config);

    let mut gpu = GpuContext {
        device,
        queue,
        surface,
        config: surface_config,
    };

    let mut viewer = Viewer::new(window.clone(), &gpu, config)?;
    log::info!("viewer ready");

    window.request_redraw();

    event_loop.run(move |event, elwt| match event {
        Event::WindowEvent {
            ref event,
            window_id,
        } if window_id == viewer.window.id() => match event {
            WindowEvent::CloseRequested => elwt.exit(),
            WindowEvent::Resized(physical_size) => {
                viewer.resize(&mut gpu, *physical_size);
                viewer.window.request_redraw();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key: winit::keyboard::Key::Named(winit::keyboard::NamedKey::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => elwt.exit(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key,
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => viewer.handle_key(logical_key),
            WindowEvent::RedrawRequested => {
                if let Err(e) = viewer.render_frame(&gpu) {
                    log::error!("render error: {e:#}");
                    elwt.exit();
                }
                viewer.window.request_redraw();
            }
            _ => {}
        },
        _ => {}
    })?;

    Ok(())
}
