//! Rendering backend for wavefield.
//!
//! This crate provides the wgpu-based height-field synthesis pipeline:
//! - Headless GPU context acquisition
//! - The wave-particle pass (data textures, additive splat, normal compute)
//! - Height-map readback for diagnostics

#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

pub mod engine;
pub mod error;
pub mod readback;
pub mod wave_particle_pass;

pub use engine::GpuContext;
pub use error::{RenderError, RenderResult};
pub use readback::read_r16f_channel;
pub use wave_particle_pass::{
    pack_attributes, upload_rows, NormalUniforms, SplatUniforms, WaveParticlePass,
};
