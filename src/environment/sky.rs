use glam::{Vec2, Vec3};

use super::SkyInterface;
use crate::graphics::{Gpu, Texture2D, TextureError};
use crate::l3d::{L3dFile, L3dMaterial, L3dMeshFlags, L3dVertex, PrimitiveData, SubmeshFlags};
use crate::mesh::{L3dMesh, MaterialType, MeshError};

const DOME_RADIUS: f32 = 5000.0;
const DOME_RINGS: u16 = 8;
const DOME_SEGMENTS: u16 = 16;

/// Day, dusk and night zenith/horizon colors
const SKY_COLORS: [([u8; 3], [u8; 3]); 3] = [
    ([70, 130, 220], [190, 220, 250]),
    ([90, 60, 140], [250, 160, 90]),
    ([5, 5, 25], [30, 40, 70]),
];

#[derive(Debug, thiserror::Error)]
pub enum SkyError {
    #[error(transparent)]
    Mesh(#[from] MeshError),
    #[error(transparent)]
    Texture(#[from] TextureError),
}

/// Hemisphere with a layered gradient texture, one layer per sky type
#[derive(Debug)]
pub struct Sky {
    mesh: L3dMesh,
    texture: Texture2D,
    time_of_day: f32,
}

fn dome_file() -> L3dFile {
    let mut vertices = Vec::new();
    for ring in 0..=DOME_RINGS {
        let v = f32::from(ring) / f32::from(DOME_RINGS);
        let elevation = v * std::f32::consts::FRAC_PI_2;
        for segment in 0..=DOME_SEGMENTS {
            let u = f32::from(segment) / f32::from(DOME_SEGMENTS);
            let azimuth = u * std::f32::consts::TAU;
            let direction = Vec3::new(
                elevation.cos() * azimuth.cos(),
                elevation.sin(),
                elevation.cos() * azimuth.sin(),
            );
            vertices.push(L3dVertex::new(direction * DOME_RADIUS, Vec2::new(u, 1.0 - v), -direction));
        }
    }

    let row = DOME_SEGMENTS + 1;
    let mut indices = Vec::new();
    for ring in 0..DOME_RINGS {
        for segment in 0..DOME_SEGMENTS {
            let i = ring * row + segment;
            indices.extend([i, i + 1, i + row, i + 1, i + row + 1, i + row]);
        }
    }

    let mut file = L3dFile::new("sky dome", L3dMeshFlags::empty());
    file.add_submesh(
        SubmeshFlags::drawable(),
        vec![PrimitiveData {
            material: L3dMaterial {
                kind: MaterialType::Textured as u32,
                ..Default::default()
            },
            vertices,
            indices,
            groups: vec![],
        }],
    );
    file
}

fn gradient_texture() -> Result<Texture2D, TextureError> {
    const HEIGHT: u32 = 64;
    let mut rgba = Vec::with_capacity((HEIGHT * 4) as usize * SKY_COLORS.len());
    for (zenith, horizon) in SKY_COLORS {
        for y in 0..HEIGHT {
            let t = y as f32 / (HEIGHT - 1) as f32;
            for channel in 0..3 {
                let a = f32::from(zenith[channel]);
                let b = f32::from(horizon[channel]);
                rgba.push((a + (b - a) * t) as u8);
            }
            rgba.push(255);
        }
    }
    Texture2D::from_rgba_layers("sky", 1, HEIGHT, SKY_COLORS.len() as u32, rgba)
}

impl Sky {
    pub fn new() -> Result<Self, SkyError> {
        Ok(Self {
            mesh: L3dMesh::load(&dome_file())?,
            texture: gradient_texture()?,
            time_of_day: 12.0,
        })
    }

    /// Hour of the day in `[0, 24)`
    pub fn set_time_of_day(&mut self, hours: f32) {
        self.time_of_day = hours.rem_euclid(24.0);
    }

    pub fn time_of_day(&self) -> f32 {
        self.time_of_day
    }
}

impl SkyInterface for Sky {
    fn mesh(&self) -> &L3dMesh {
        &self.mesh
    }

    fn texture(&self) -> &Texture2D {
        &self.texture
    }

    /// 0 at noon, 1 at six, 2 at midnight
    fn current_sky_type(&self) -> f32 {
        ((12.0 - self.time_of_day).abs() / 6.0).clamp(0.0, 2.0)
    }

    fn upload(&mut self, gpu: &Gpu) {
        self.mesh.upload(gpu);
        self.texture.upload(gpu);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sky_type_follows_time() {
        let mut sky = Sky::new().unwrap();
        assert!(sky.current_sky_type().abs() < 0.0001);
        sky.set_time_of_day(18.0);
        assert!((sky.current_sky_type() - 1.0).abs() < 0.0001);
        sky.set_time_of_day(24.0);
        assert!((sky.current_sky_type() - 2.0).abs() < 0.0001);
        sky.set_time_of_day(-6.0);
        assert!((sky.time_of_day() - 18.0).abs() < 0.0001);
    }

    #[test]
    fn test_dome() {
        let sky = Sky::new().unwrap();
        assert_eq!(sky.mesh().num_sub_meshes(), 1);
        assert_eq!(sky.texture().layers(), 3);
        let aabb = sky.mesh().bounding_box();
        assert!(aabb.minima.y > -0.01);
        assert!((aabb.maxima.y - DOME_RADIUS).abs() < 0.1);
    }
}
