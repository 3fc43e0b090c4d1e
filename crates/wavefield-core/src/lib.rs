//! Core abstractions for wavefield.
//!
//! This crate holds the CPU side of the wave-particle simulation:
//! - [`WaveConfig`] simulation and texture-grid configuration
//! - [`WaveParticle`] and its activation/advance/expiry rules
//! - [`WaveParticleManager`], the fixed-capacity recycling pool
//!
//! Nothing in here touches the GPU; the render backend consumes
//! snapshots produced by the pool.

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

pub mod config;
pub mod error;
pub mod particle;
pub mod pool;

pub use config::WaveConfig;
pub use error::{CoreError, Result};
pub use particle::{ParticleSeed, WaveParticle};
pub use pool::WaveParticleManager;

// Re-export glam types for convenience
pub use glam::{Vec2, Vec3};
