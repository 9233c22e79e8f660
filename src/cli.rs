use std::path::PathBuf;

use clap::Parser;
use glam::Vec2;

use crate::physics::SimParams;

/// A GPU particle simulation attracted to the mouse cursor
#[derive(Parser, Debug)]
#[command()]
pub struct Args {
    /// Total Particles
    #[arg(short = 'n', long, default_value_t = 1024 * 1000, value_parser = clap::value_parser!(u32).range(1..))]
    pub particles: u32,

    /// Gravity factor, equals `G * (m_1 + m_2)`
    #[arg(short, long, default_value_t = 0.6f32)]
    pub gravity: f32,

    /// Maximum magnitude of the acceleration applied in one step
    #[arg(short, long, default_value_t = 5.0f32, value_parser = parse_positive)]
    pub acceleration_cap: f32,

    /// Multiplicative velocity damping per step, in `(0, 1]`
    #[arg(short, long, default_value_t = 0.998f32, value_parser = parse_damping)]
    pub damping: f32,

    /// The framerate the simulation will run at
    ///
    /// `0` runs as fast as possible
    #[arg(short, long, default_value_t = 300)]
    pub framerate: u32,

    /// Window width in pixels
    #[arg(long, default_value_t = 800, value_parser = clap::value_parser!(u32).range(1..))]
    pub width: u32,

    /// Window height in pixels
    #[arg(long, default_value_t = 800, value_parser = clap::value_parser!(u32).range(1..))]
    pub height: u32,

    /// Seed for the particle generator, random if unset
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Directory containing the shader files
    #[arg(long, default_value = "assets/shaders")]
    pub shaders: PathBuf,
}

impl Args {
    /// Parameters uploaded to the compute pass, the attractor and `dt` are
    /// rewritten every frame.
    pub fn simulation_params(&self) -> SimParams {
        SimParams {
            attractor: Vec2::ZERO,
            dt: 0.0,
            damping: self.damping,
            gravity: self.gravity,
            acceleration_cap: self.acceleration_cap,
        }
    }

    pub fn shader_path(&self, name: &str) -> PathBuf {
        self.shaders.join(name)
    }
}

fn parse_positive(s: &str) -> Result<f32, String> {
    let value: f32 = s.parse().map_err(|e| format!("{e}"))?;
    if value > 0.0 && value.is_finite() {
        Ok(value)
    } else {
        Err(format!("`{value}` must be a finite number above 0"))
    }
}

fn parse_damping(s: &str) -> Result<f32, String> {
    let value: f32 = s.parse().map_err(|e| format!("{e}"))?;
    if value > 0.0 && value <= 1.0 {
        Ok(value)
    } else {
        Err(format!("`{value}` is not in (0, 1]"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_fixed_surface() {
        let args = Args::try_parse_from(["particle_attractor"]).unwrap();
        assert_eq!(args.particles, 1_024_000);
        assert_eq!(args.framerate, 300);
        assert_eq!((args.width, args.height), (800, 800));
        assert!(args.seed.is_none());
        assert_eq!(
            args.shader_path("base.frag.wgsl"),
            PathBuf::from("assets/shaders/base.frag.wgsl")
        );

        let params = args.simulation_params();
        assert_eq!(params.gravity, 0.6);
        assert_eq!(params.acceleration_cap, 5.0);
        assert_eq!(params.damping, 0.998);
        assert_eq!(params.attractor, Vec2::ZERO);
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(Args::try_parse_from(["particle_attractor", "-n", "0"]).is_err());
        assert!(Args::try_parse_from(["particle_attractor", "-d", "1.5"]).is_err());
        assert!(Args::try_parse_from(["particle_attractor", "-d", "0"]).is_err());
        assert!(Args::try_parse_from(["particle_attractor", "-a", "-1"]).is_err());
    }

    #[test]
    fn overrides() {
        let args = Args::try_parse_from([
            "particle_attractor",
            "-n",
            "4096",
            "-g",
            "1.5",
            "--seed",
            "7",
            "-f",
            "0",
        ])
        .unwrap();
        assert_eq!(args.particles, 4096);
        assert_eq!(args.gravity, 1.5);
        assert_eq!(args.seed, Some(7));
        assert_eq!(args.framerate, 0);
    }
}
