use glam::Vec4;
use rand::Rng;
use wgpu::util::DeviceExt;

/// Alpha of every randomly generated particle
pub const PARTICLE_ALPHA: f32 = 0.2;

/// Triangle of debug particles placed before the random fill
pub const MARKER_POSITIONS: [Vec4; 3] = [
    Vec4::new(-0.4, -0.3, 0.0, 1.0),
    Vec4::new(0.4, -0.3, 0.0, 1.0),
    Vec4::new(0.0, 0.5, 0.0, 1.0),
];

pub const MARKER_COLORS: [Vec4; 3] = [
    Vec4::new(1.0, 0.0, 0.0, 1.0),
    Vec4::new(0.0, 1.0, 0.0, 1.0),
    Vec4::new(0.0, 0.0, 1.0, 1.0),
];

/// Initial particle state, index aligned across all three arrays.
///
/// Only used to seed the storage buffers; the GPU owns the state afterwards.
pub struct ParticleSet {
    pub positions: Vec<Vec4>,
    pub velocities: Vec<Vec4>,
    pub colors: Vec<Vec4>,
}

impl ParticleSet {
    pub fn generate(count: usize, rng: &mut impl Rng) -> Self {
        let mut positions = Vec::with_capacity(count);
        let mut colors = Vec::with_capacity(count);

        // Markers
        let markers = count.min(MARKER_POSITIONS.len());
        positions.extend_from_slice(&MARKER_POSITIONS[..markers]);
        colors.extend_from_slice(&MARKER_COLORS[..markers]);

        // Random fill
        let range = count as i64;
        let extent = count as f32;
        for _ in markers..count {
            positions.push(Vec4::new(
                rng.gen_range(-range..=range) as f32 / extent,
                rng.gen_range(-range..=range) as f32 / extent,
                0.0,
                1.0,
            ));
            colors.push(Vec4::new(
                rng.gen_range(0..=255u8) as f32 / 255.0,
                rng.gen_range(0..=255u8) as f32 / 255.0,
                rng.gen_range(0..=255u8) as f32 / 255.0,
                PARTICLE_ALPHA,
            ));
        }

        Self {
            positions,
            velocities: vec![Vec4::ZERO; count],
            colors,
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }
}

/// Storage buffers holding one `vec4<f32>` per particle
pub struct ParticleBuffers {
    pub positions: wgpu::Buffer,
    pub velocities: wgpu::Buffer,
    pub colors: wgpu::Buffer,
    pub count: u32,
}

impl ParticleBuffers {
    pub fn upload(device: &wgpu::Device, set: &ParticleSet) -> Self {
        let create = |label, data: &[Vec4]| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(data),
                usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            })
        };

        Self {
            positions: create("Particle Positions", &set.positions),
            velocities: create("Particle Velocities", &set.velocities),
            colors: create("Particle Colors", &set.colors),
            count: set.len() as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    fn generate(count: usize) -> ParticleSet {
        ParticleSet::generate(count, &mut StdRng::seed_from_u64(42))
    }

    #[test]
    fn arrays_are_index_aligned() {
        let set = generate(4096);
        assert_eq!(set.len(), 4096);
        assert_eq!(set.velocities.len(), 4096);
        assert_eq!(set.colors.len(), 4096);
    }

    #[test]
    fn markers_come_first() {
        let set = generate(1024);
        assert_eq!(set.positions[..3], MARKER_POSITIONS);
        assert_eq!(set.colors[..3], MARKER_COLORS);
    }

    #[test]
    fn random_fill_stays_in_range() {
        let set = generate(10_000);
        for (position, color) in set.positions.iter().zip(&set.colors).skip(3) {
            assert!((-1.0..=1.0).contains(&position.x));
            assert!((-1.0..=1.0).contains(&position.y));
            assert_eq!(position.z, 0.0);
            assert!((0.0..=1.0).contains(&color.x));
            assert!((0.0..=1.0).contains(&color.y));
            assert!((0.0..=1.0).contains(&color.z));
            assert_eq!(color.w, PARTICLE_ALPHA);
        }
    }

    #[test]
    fn velocities_start_at_zero() {
        assert!(generate(2048).velocities.iter().all(|v| *v == Vec4::ZERO));
    }

    #[test]
    fn fewer_particles_than_markers() {
        let set = generate(2);
        assert_eq!(set.positions, MARKER_POSITIONS[..2]);
        assert_eq!(set.colors, MARKER_COLORS[..2]);
        assert!(generate(0).positions.is_empty());
    }

    #[test]
    fn same_seed_same_particles() {
        assert_eq!(generate(512).positions, generate(512).positions);
    }
}
