// initial particle layouts, generated on the host and uploaded once
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::constants::{PARTICLE_NUM_BASE, RADIUS};
use crate::gpu::ffi::GPUParticle;

const RANDOM_CUBE_X: (f32, f32) = (-2.0, -1.0);
const RANDOM_CUBE_Y: (f32, f32) = (0.5, 1.0);
const RANDOM_CUBE_Z: (f32, f32) = (0.25, 0.5);

const PLANE_A_OFFSET_Y: f32 = 0.02;
const PLANE_A_JITTER_Z: f32 = 0.04;
const PLANE_B_OFFSET_Y: f32 = 0.5;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum GenerationMode {
    RandomCube,
    DenseCube,
    SortedPlaneA,
    SortedPlaneB,
    #[default]
    SparseCube,
    /// Unrecognised mode code. Generates nothing.
    Empty,
}

impl GenerationMode {
    pub const ALL: [GenerationMode; 5] = [
        GenerationMode::RandomCube,
        GenerationMode::DenseCube,
        GenerationMode::SortedPlaneA,
        GenerationMode::SortedPlaneB,
        GenerationMode::SparseCube,
    ];

    pub fn from_index(index: i32) -> Self {
        match index {
            0 => Self::RandomCube,
            1 => Self::DenseCube,
            2 => Self::SortedPlaneA,
            3 => Self::SortedPlaneB,
            4 => Self::SparseCube,
            _ => Self::Empty,
        }
    }

    pub fn index(self) -> Option<i32> {
        Self::ALL.iter().position(|m| *m == self).map(|i| i as i32)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::RandomCube => "Random Cube",
            Self::DenseCube => "Dense Cube",
            Self::SortedPlaneA => "Sorted Plane A",
            Self::SortedPlaneB => "Sorted Plane B",
            Self::SparseCube => "Sparse Cube",
            Self::Empty => "Empty",
        }
    }

    /// Distance between neighbouring grid points, `None` for the random cube.
    pub fn spacing(self) -> Option<f32> {
        let d = 2.0 * RADIUS;
        match self {
            Self::DenseCube | Self::SortedPlaneA => Some(d),
            Self::SortedPlaneB => Some(2.0 * d),
            Self::SparseCube => Some(4.0 * d),
            Self::RandomCube | Self::Empty => None,
        }
    }

    /// How many particles `generate` returns for a requested count.
    /// Only the random cube honours the request; the cubes use the fixed
    /// base and the planes round down to an even square.
    pub fn expected_len(self, particle_count: u32) -> usize {
        let base = PARTICLE_NUM_BASE as usize;
        match self {
            Self::RandomCube => particle_count as usize,
            Self::DenseCube | Self::SparseCube => base * base * base,
            Self::SortedPlaneA | Self::SortedPlaneB => {
                let side = 2 * plane_range(particle_count) as usize;
                side * side
            }
            Self::Empty => 0,
        }
    }
}

/// Where the random cube draws its positions from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SeedPolicy {
    /// A new OS-seeded source for every `generate` call.
    #[default]
    Fresh,
    Fixed(u64),
}

impl SeedPolicy {
    pub fn rng(self) -> StdRng {
        match self {
            Self::Fresh => StdRng::from_os_rng(),
            Self::Fixed(seed) => StdRng::seed_from_u64(seed),
        }
    }
}

// half the side of the plane layouts: floor(sqrt(n)) / 2, integer
fn plane_range(particle_count: u32) -> u32 {
    ((particle_count as f32).sqrt() as u32) / 2
}

pub fn generate_with(mode: GenerationMode, particle_count: u32, seed: SeedPolicy) -> Vec<GPUParticle> {
    let mut rng = seed.rng();
    generate(mode, particle_count, &mut rng)
}

pub fn generate<R: Rng + ?Sized>(
    mode: GenerationMode,
    particle_count: u32,
    rng: &mut R,
) -> Vec<GPUParticle> {
    let particles = match mode {
        GenerationMode::RandomCube => random_cube(particle_count, rng),
        GenerationMode::DenseCube => cube(2.0 * RADIUS, -(RADIUS * 2.0 * PARTICLE_NUM_BASE as f32 / 2.0) + RADIUS),
        GenerationMode::SortedPlaneA => sorted_plane_a(particle_count),
        GenerationMode::SortedPlaneB => sorted_plane_b(particle_count),
        GenerationMode::SparseCube => {
            let d = 2.0 * RADIUS;
            let range = (PARTICLE_NUM_BASE / 2) as f32;
            cube(4.0 * d, -range * 4.0 * d + d)
        }
        GenerationMode::Empty => Vec::new(),
    };
    debug_assert_eq!(particles.len(), mode.expected_len(particle_count));
    particles
}

fn random_cube<R: Rng + ?Sized>(n: u32, rng: &mut R) -> Vec<GPUParticle> {
    (0..n)
        .map(|_| {
            GPUParticle::at_rest([
                rng.random_range(RANDOM_CUBE_X.0..=RANDOM_CUBE_X.1),
                rng.random_range(RANDOM_CUBE_Y.0..=RANDOM_CUBE_Y.1),
                rng.random_range(RANDOM_CUBE_Z.0..=RANDOM_CUBE_Z.1),
            ])
        })
        .collect()
}

// B x B x B points starting at `offset` on every axis
fn cube(spacing: f32, offset: f32) -> Vec<GPUParticle> {
    let base = PARTICLE_NUM_BASE;
    let mut particles = Vec::with_capacity((base * base * base) as usize);
    for i in 0..base {
        for j in 0..base {
            for k in 0..base {
                particles.push(GPUParticle::at_rest([
                    offset + spacing * i as f32,
                    offset + spacing * j as f32,
                    offset + spacing * k as f32,
                ]));
            }
        }
    }
    particles
}

fn sorted_plane_a(particle_count: u32) -> Vec<GPUParticle> {
    let range = plane_range(particle_count);
    let d = 2.0 * RADIUS;
    let offset = -(range as f32) * d + RADIUS;
    let side = range * 2;

    let mut particles = Vec::with_capacity((side * side) as usize);
    for i in 0..side {
        for j in 0..side {
            // odd columns sit behind the plane, even ones in front
            let z = if j % 2 == 1 { -PLANE_A_JITTER_Z } else { PLANE_A_JITTER_Z };
            particles.push(GPUParticle::at_rest([
                offset + d * i as f32,
                offset + d * j as f32 + PLANE_A_OFFSET_Y,
                z,
            ]));
        }
    }
    particles
}

fn sorted_plane_b(particle_count: u32) -> Vec<GPUParticle> {
    let range = plane_range(particle_count);
    let d = 2.0 * RADIUS;
    let offset = -(range as f32) * 2.0 * d + d;
    let side = range * 2;

    let mut particles = Vec::with_capacity((side * side) as usize);
    for i in 0..side {
        for j in 0..side {
            particles.push(GPUParticle::at_rest([
                offset + 2.0 * d * i as f32,
                offset + 2.0 * d * j as f32 + PLANE_B_OFFSET_Y,
                0.0,
            ]));
        }
    }
    particles
}
