//! Configuration for the wave-particle simulation.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Configuration for the particle pool and the GPU height-field pipeline.
///
/// Values are fixed for the lifetime of the simulation; [`WaveConfig::validate`]
/// runs at construction time and rejects configurations the pipeline cannot
/// operate with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaveConfig {
    /// Number of particle slots in the pool.
    pub pool_capacity: usize,

    /// Width of the particle data textures, in texels.
    pub particle_grid_width: u32,

    /// Height of the particle data textures, in texels.
    pub particle_grid_height: u32,

    /// Width of the height/normal map targets, in texels.
    pub height_map_width: u32,

    /// Height of the height/normal map targets, in texels.
    pub height_map_height: u32,

    /// Wavefront radius growth, in height-map UV units per second.
    pub radius_growth: f32,

    /// Radius at which a particle expires.
    pub max_radius: f32,

    /// Lifetime at which a particle expires, in seconds.
    pub max_lifetime: f32,

    /// Horizontal/vertical slope scale for normal derivation.
    pub normal_scale: Vec3,
}

impl Default for WaveConfig {
    fn default() -> Self {
        Self {
            pool_capacity: 4096,
            particle_grid_width: 64,
            particle_grid_height: 64,
            height_map_width: 512,
            height_map_height: 512,
            radius_growth: 0.05,
            max_radius: 0.5,
            max_lifetime: 10.0,
            normal_scale: Vec3::new(30.0, 1.0, 30.0),
        }
    }
}

impl WaveConfig {
    /// Maximum number of particles representable by the data textures.
    pub fn grid_capacity(&self) -> usize {
        self.particle_grid_width as usize * self.particle_grid_height as usize
    }

    /// Checks that the configuration is usable.
    ///
    /// A broken configuration cannot self-heal at runtime, so every
    /// constructor in the workspace calls this and fails fast.
    pub fn validate(&self) -> Result<()> {
        if self.pool_capacity == 0 {
            return Err(CoreError::ZeroCapacity);
        }
        for (name, value) in [
            ("particle_grid_width", self.particle_grid_width),
            ("particle_grid_height", self.particle_grid_height),
            ("height_map_width", self.height_map_width),
            ("height_map_height", self.height_map_height),
        ] {
            if value == 0 {
                return Err(CoreError::ZeroDimension { name });
            }
        }
        if self.pool_capacity > self.grid_capacity() {
            return Err(CoreError::PoolExceedsGrid {
                capacity: self.pool_capacity,
                grid_capacity: self.grid_capacity(),
            });
        }
        for (name, value) in [
            ("radius_growth", self.radius_growth),
            ("max_radius", self.max_radius),
            ("max_lifetime", self.max_lifetime),
        ] {
            if value <= 0.0 {
                return Err(CoreError::NonPositiveBound { name, value });
            }
        }
        Ok(())
    }

    /// Parses a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes the configuration to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
