//! GPU-driven water-wave simulation built on particle-based wave
//! superposition.
//!
//! A bounded pool of short-lived wave particles is advected on the CPU,
//! packed into GPU textures each frame, splatted additively into a height
//! map, and converted to a normal map by a compute pass. The resulting
//! texture pair is consumed by a downstream water-surface shader.
//!
//! ```no_run
//! use wavefield::{Vec2, WaveConfig, WaveField};
//!
//! let mut field = WaveField::new(WaveConfig::default())?;
//! field.splash(Vec2::new(0.5, 0.5), 16, 0.1, 1.0);
//! field.step(1.0 / 60.0);
//! let _normals = field.normal_map_view();
//! # Ok::<(), wavefield::WavefieldError>(())
//! ```

#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

use std::f32::consts::TAU;
use std::sync::Arc;

use thiserror::Error;

pub use glam::{Vec2, Vec3};
pub use wavefield_core::{CoreError, ParticleSeed, WaveConfig, WaveParticle, WaveParticleManager};
pub use wavefield_render::{GpuContext, RenderError, WaveParticlePass};

/// Errors surfaced by the top-level simulation.
#[derive(Error, Debug)]
pub enum WavefieldError {
    /// Simulation configuration or pool error.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// GPU setup or readback error.
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// A specialized Result type for wavefield operations.
pub type Result<T> = std::result::Result<T, WavefieldError>;

/// Initializes logging from the environment (`RUST_LOG`).
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_logging() {
    let _ = env_logger::try_init();
}

/// The whole wave simulation: particle pool, GPU context, and pipeline.
///
/// One `WaveField` is driven from a single render thread via [`step`];
/// spawner threads share the pool through [`manager`]. GPU resources are
/// owned here and released on drop.
///
/// [`step`]: WaveField::step
/// [`manager`]: WaveField::manager
pub struct WaveField {
    context: GpuContext,
    manager: Arc<WaveParticleManager>,
    pass: WaveParticlePass,
}

impl WaveField {
    /// Creates a simulation with its own headless GPU context.
    pub fn new(config: WaveConfig) -> Result<Self> {
        let context = GpuContext::new_blocking()?;
        Self::with_context(context, config)
    }

    /// Creates a simulation on an existing GPU context.
    pub fn with_context(context: GpuContext, config: WaveConfig) -> Result<Self> {
        let manager = Arc::new(WaveParticleManager::new(&config)?);
        let pass = WaveParticlePass::new(&context.device, &config)?;
        log::info!(
            "wavefield ready: pool capacity {}, {}x{} height map",
            config.pool_capacity,
            config.height_map_width,
            config.height_map_height
        );
        Ok(Self {
            context,
            manager,
            pass,
        })
    }

    /// A shared handle to the particle pool for spawner threads.
    pub fn manager(&self) -> Arc<WaveParticleManager> {
        Arc::clone(&self.manager)
    }

    /// Spawns a single wave particle. Never fails; a saturated pool
    /// recycles its oldest slot.
    pub fn spawn(&self, seed: ParticleSeed) -> usize {
        self.manager.spawn(seed)
    }

    /// Emits a ring of `count` particles radiating from `center`.
    ///
    /// This is the usual emission pattern for a point disturbance (a
    /// raindrop, an impact): directions are distributed evenly over the
    /// circle so superposition forms an expanding circular wavefront.
    pub fn splash(&self, center: Vec2, count: usize, speed: f32, amplitude: f32) {
        for i in 0..count {
            let angle = TAU * i as f32 / count as f32;
            self.spawn(ParticleSeed {
                start_point: center,
                direction: Vec2::new(angle.cos(), angle.sin()),
                speed,
                amplitude,
            });
        }
    }

    /// Runs one simulation tick and re-synthesizes the height/normal maps.
    pub fn step(&mut self, delta_time: f32) {
        let snapshot = self.manager.snapshot_and_advance(delta_time);

        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("wavefield frame encoder"),
                });
        self.pass
            .encode_frame(&self.context.queue, &mut encoder, &snapshot);
        self.context.queue.submit(std::iter::once(encoder.finish()));
    }

    /// Number of particles contributing to the next frame.
    pub fn alive_count(&self) -> usize {
        self.manager.alive_count()
    }

    /// The GPU context backing this simulation.
    pub fn context(&self) -> &GpuContext {
        &self.context
    }

    /// Height map view for the downstream water-surface shader.
    pub fn height_map_view(&self) -> &wgpu::TextureView {
        self.pass.height_map_view()
    }

    /// Normal map view for the downstream water-surface shader.
    pub fn normal_map_view(&self) -> &wgpu::TextureView {
        self.pass.normal_map_view()
    }

    /// Reads back the height map's R channel. Diagnostics only.
    pub fn read_height_map(&self) -> Result<Vec<f32>> {
        let (width, height) = self.pass.height_map_size();
        Ok(wavefield_render::read_r16f_channel(
            &self.context.device,
            &self.context.queue,
            self.pass.height_map(),
            width,
            height,
        )?)
    }
}
