use glam::{Mat4, Vec2, Vec3};

use super::{Extent2D, LandIslandInterface};
use crate::graphics::{FrameBuffer, Gpu, Mesh, Texture2D, TextureError, Vertex};

/// World-space side length of one landscape block
pub const BLOCK_SIZE: f32 = 160.0;
/// Height samples per block side
const CELLS_PER_BLOCK: usize = 16;
const CELL_SIZE: f32 = BLOCK_SIZE / CELLS_PER_BLOCK as f32;
const FOOTPRINT_TARGET_SIZE: u32 = 512;
const ORTHO_HEIGHT: f32 = 1000.0;
/// World height of a full-intensity heightmap texel
pub const HEIGHT_MAP_SCALE: f32 = 256.0;

/// Sand, grass, rock and snow
const ALBEDO_LAYERS: [[u8; 4]; 4] = [
    [194, 178, 128, 255],
    [86, 125, 70, 255],
    [120, 110, 100, 255],
    [240, 240, 245, 255],
];

/// One square block of terrain, positioned in block units
#[derive(Debug)]
pub struct LandBlock {
    pub map_position: Vec2,
    pub mesh: Mesh,
}

/// Height field landscape split into [`BLOCK_SIZE`] blocks
#[derive(Debug)]
pub struct LandIsland {
    blocks: Vec<LandBlock>,
    heights: Vec<f32>,
    samples_x: usize,
    samples_z: usize,
    albedo: Texture2D,
    bump: Texture2D,
    height_map: Texture2D,
    footprints: FrameBuffer,
}

fn block_mesh(heights: &[f32], samples_x: usize, block_x: usize, block_z: usize) -> Mesh {
    let sample = |x: usize, z: usize| heights[z * samples_x + x];
    let samples_z = heights.len() / samples_x;
    let mut vertices = Vec::with_capacity((CELLS_PER_BLOCK + 1) * (CELLS_PER_BLOCK + 1));
    for z in 0..=CELLS_PER_BLOCK {
        for x in 0..=CELLS_PER_BLOCK {
            let gx = block_x * CELLS_PER_BLOCK + x;
            let gz = block_z * CELLS_PER_BLOCK + z;
            let left = sample(gx.saturating_sub(1), gz);
            let right = sample((gx + 1).min(samples_x - 1), gz);
            let back = sample(gx, gz.saturating_sub(1));
            let front = sample(gx, (gz + 1).min(samples_z - 1));
            let normal = Vec3::new(left - right, 2.0 * CELL_SIZE, back - front).normalize();
            vertices.push(Vertex::new(
                [x as f32 * CELL_SIZE, sample(gx, gz), z as f32 * CELL_SIZE],
                normal.to_array(),
                [x as f32 / CELLS_PER_BLOCK as f32, z as f32 / CELLS_PER_BLOCK as f32],
            ));
        }
    }

    let row = (CELLS_PER_BLOCK + 1) as u16;
    let cells = CELLS_PER_BLOCK as u16;
    let mut indices = Vec::with_capacity(CELLS_PER_BLOCK * CELLS_PER_BLOCK * 6);
    for z in 0..cells {
        for x in 0..cells {
            let i = z * row + x;
            indices.extend([i, i + row, i + 1, i + 1, i + row, i + row + 1]);
        }
    }

    Mesh::from_u16(&format!("land block {block_x},{block_z}"), &vertices, &indices)
}

impl LandIsland {
    /// Sample `height` every [`CELL_SIZE`] units over `blocks_x` by `blocks_z` blocks
    pub fn from_height_field(
        blocks_x: usize,
        blocks_z: usize,
        height: impl Fn(Vec2) -> f32,
    ) -> Result<Self, TextureError> {
        let blocks_x = blocks_x.max(1);
        let blocks_z = blocks_z.max(1);
        let samples_x = blocks_x * CELLS_PER_BLOCK + 1;
        let samples_z = blocks_z * CELLS_PER_BLOCK + 1;

        let mut heights = Vec::with_capacity(samples_x * samples_z);
        for z in 0..samples_z {
            for x in 0..samples_x {
                heights.push(height(Vec2::new(x as f32, z as f32) * CELL_SIZE));
            }
        }

        let mut blocks = Vec::with_capacity(blocks_x * blocks_z);
        for z in 0..blocks_z {
            for x in 0..blocks_x {
                blocks.push(LandBlock {
                    map_position: Vec2::new(x as f32, z as f32),
                    mesh: block_mesh(&heights, samples_x, x, z),
                });
            }
        }

        let mut height_texels = Vec::with_capacity(heights.len() * 4);
        for &h in &heights {
            let v = ((h / HEIGHT_MAP_SCALE).clamp(0.0, 1.0) * 255.0).round() as u8;
            height_texels.extend([v, v, v, 255]);
        }

        let albedo = Texture2D::from_rgba_layers(
            "island albedo",
            1,
            1,
            ALBEDO_LAYERS.len() as u32,
            ALBEDO_LAYERS.concat(),
        )?;

        Ok(Self {
            blocks,
            height_map: Texture2D::from_rgba("island heightmap", samples_x as u32, samples_z as u32, height_texels)?,
            heights,
            samples_x,
            samples_z,
            albedo,
            bump: Texture2D::solid_color("island bump", [128, 128, 255, 255]),
            footprints: FrameBuffer::new("footprints", FOOTPRINT_TARGET_SIZE, FOOTPRINT_TARGET_SIZE, false),
        })
    }

    pub fn flat(blocks_x: usize, blocks_z: usize) -> Result<Self, TextureError> {
        Self::from_height_field(blocks_x, blocks_z, |_| 0.0)
    }

    fn sample(&self, x: usize, z: usize) -> f32 {
        let x = x.min(self.samples_x - 1);
        let z = z.min(self.samples_z - 1);
        self.heights[z * self.samples_x + x]
    }
}

impl LandIslandInterface for LandIsland {
    /// Bilinear height, clamped to the island edge
    fn height_at(&self, position: Vec2) -> f32 {
        let cell = (position / CELL_SIZE).max(Vec2::ZERO);
        let (x, z) = (cell.x.floor() as usize, cell.y.floor() as usize);
        let t = cell.fract();
        let top = self.sample(x, z) + (self.sample(x + 1, z) - self.sample(x, z)) * t.x;
        let bottom = self.sample(x, z + 1) + (self.sample(x + 1, z + 1) - self.sample(x, z + 1)) * t.x;
        top + (bottom - top) * t.y
    }

    fn blocks(&self) -> &[LandBlock] {
        &self.blocks
    }

    fn albedo_array(&self) -> &Texture2D {
        &self.albedo
    }

    fn bump(&self) -> &Texture2D {
        &self.bump
    }

    fn height_map(&self) -> &Texture2D {
        &self.height_map
    }

    fn footprint_frame_buffer(&self) -> &FrameBuffer {
        &self.footprints
    }

    fn ortho_view(&self) -> Mat4 {
        let extent = self.extent();
        let center = (extent.minimum + extent.maximum) * 0.5;
        let eye = Vec3::new(center.x, ORTHO_HEIGHT, center.y);
        Mat4::look_at_rh(eye, Vec3::new(center.x, 0.0, center.y), Vec3::NEG_Z)
    }

    fn ortho_proj(&self) -> Mat4 {
        let half = (self.extent().maximum - self.extent().minimum) * 0.5;
        Mat4::orthographic_rh(-half.x, half.x, -half.y, half.y, 0.0, ORTHO_HEIGHT * 2.0)
    }

    fn extent(&self) -> Extent2D {
        let blocks = Vec2::new(
            ((self.samples_x - 1) / CELLS_PER_BLOCK) as f32,
            ((self.samples_z - 1) / CELLS_PER_BLOCK) as f32,
        );
        Extent2D {
            minimum: Vec2::ZERO,
            maximum: blocks * BLOCK_SIZE,
        }
    }

    fn upload(&mut self, gpu: &Gpu) {
        for block in &mut self.blocks {
            block.mesh.upload(gpu);
        }
        self.albedo.upload(gpu);
        self.bump.upload(gpu);
        self.height_map.upload(gpu);
        self.footprints.upload(gpu);
    }
}
