//! A single simulated wave-emission event.

use glam::Vec2;

use crate::config::WaveConfig;

/// Parameters for (re)activating a particle slot.
#[derive(Debug, Clone, Copy)]
pub struct ParticleSeed {
    /// Emission origin, in height-map UV space.
    pub start_point: Vec2,
    /// Travel direction; normalized on activation.
    pub direction: Vec2,
    /// Travel speed, in UV units per second.
    pub speed: f32,
    /// Wave amplitude.
    pub amplitude: f32,
}

/// One wave particle: a point source of a radiating wave with finite lifetime.
///
/// Particles carry no locking; the pool owns and serializes all access.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveParticle {
    /// Current emission origin, in height-map UV space.
    pub start_point: Vec2,
    /// Unit travel direction.
    pub direction: Vec2,
    /// Travel speed, in UV units per second.
    pub speed: f32,
    /// Elapsed lifetime, in seconds.
    pub time: f32,
    /// Wave amplitude.
    pub amplitude: f32,
    /// Current wavefront radius; grows monotonically while alive.
    pub radius: f32,
}

impl WaveParticle {
    /// A zeroed slot, used to fill the pool at construction.
    pub(crate) fn dormant() -> Self {
        Self {
            start_point: Vec2::ZERO,
            direction: Vec2::X,
            speed: 0.0,
            time: 0.0,
            amplitude: 0.0,
            radius: 0.0,
        }
    }

    /// Resets this slot to a freshly emitted particle.
    pub fn activate(&mut self, seed: &ParticleSeed) {
        self.start_point = seed.start_point;
        self.direction = seed.direction.normalize_or(Vec2::X);
        self.speed = seed.speed;
        self.amplitude = seed.amplitude;
        self.time = 0.0;
        self.radius = 0.0;
    }

    /// Advances the particle one tick.
    ///
    /// The radius is recomputed from elapsed time (linear growth capped at
    /// `max_radius`), so it never decreases while the particle is alive.
    pub fn advance(&mut self, delta_time: f32, config: &WaveConfig) {
        self.time += delta_time;
        self.radius = (config.radius_growth * self.time).min(config.max_radius);
        self.start_point += self.direction * self.speed * delta_time;
    }

    /// Whether the particle has hit either termination bound.
    pub fn is_expired(&self, config: &WaveConfig) -> bool {
        self.radius >= config.max_radius || self.time >= config.max_lifetime
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> WaveConfig {
        WaveConfig {
            radius_growth: 0.1,
            max_radius: 1.0,
            max_lifetime: 4.0,
            ..WaveConfig::default()
        }
    }

    fn seeded() -> WaveParticle {
        let mut p = WaveParticle::dormant();
        p.activate(&ParticleSeed {
            start_point: Vec2::new(0.5, 0.5),
            direction: Vec2::new(3.0, 0.0),
            speed: 0.2,
            amplitude: 1.0,
        });
        p
    }

    #[test]
    fn activation_normalizes_direction() {
        let p = seeded();
        assert!((p.direction.length() - 1.0).abs() < 1e-6);
        assert_eq!(p.time, 0.0);
        assert_eq!(p.radius, 0.0);
    }

    #[test]
    fn zero_direction_falls_back_to_unit_x() {
        let mut p = WaveParticle::dormant();
        p.activate(&ParticleSeed {
            start_point: Vec2::ZERO,
            direction: Vec2::ZERO,
            speed: 0.0,
            amplitude: 0.0,
        });
        assert_eq!(p.direction, Vec2::X);
    }

    #[test]
    fn advance_moves_origin_and_grows_radius() {
        let config = test_config();
        let mut p = seeded();
        p.advance(0.5, &config);
        assert!((p.start_point.x - 0.6).abs() < 1e-6);
        assert!((p.radius - 0.05).abs() < 1e-6);
        assert!(!p.is_expired(&config));
    }

    #[test]
    fn radius_is_monotonic_and_capped() {
        let config = test_config();
        let mut p = seeded();
        let mut last = p.radius;
        for _ in 0..200 {
            p.advance(0.1, &config);
            assert!(p.radius >= last);
            assert!(p.radius <= config.max_radius);
            last = p.radius;
        }
    }

    #[test]
    fn expires_on_lifetime_bound() {
        let config = test_config();
        let mut p = seeded();
        p.advance(config.max_lifetime + 0.1, &config);
        assert!(p.is_expired(&config));
    }

    #[test]
    fn expires_on_radius_bound() {
        let config = WaveConfig {
            radius_growth: 10.0,
            max_radius: 0.5,
            max_lifetime: 100.0,
            ..WaveConfig::default()
        };
        let mut p = seeded();
        p.advance(1.0, &config);
        assert!(p.is_expired(&config));
    }
}
