//! Headless demo: random raindrop splashes on a quiet pool.
//!
//! Run with: cargo run --example ripples

use rand::Rng;
use wavefield::{Vec2, WaveConfig, WaveField};

fn main() -> Result<(), wavefield::WavefieldError> {
    wavefield::init_logging();

    let mut field = WaveField::new(WaveConfig::default())?;
    let mut rng = rand::thread_rng();

    for frame in 0..300 {
        // A drop lands every ~20 frames.
        if frame % 20 == 0 {
            let center = Vec2::new(rng.gen_range(0.2..0.8), rng.gen_range(0.2..0.8));
            field.splash(center, 24, rng.gen_range(0.02..0.08), 1.0);
            println!("frame {frame:3}: splash at ({:.2}, {:.2})", center.x, center.y);
        }

        field.step(1.0 / 60.0);

        if frame % 60 == 0 {
            let heights = field.read_height_map()?;
            let peak = heights.iter().fold(0.0f32, |acc, &h| acc.max(h));
            println!(
                "frame {frame:3}: {} alive particles, peak height {peak:.3}",
                field.alive_count()
            );
        }
    }

    Ok(())
}
