//! Components the renderer reads from the world

use glam::{Mat4, Quat, Vec2, Vec3, Vec4};

use crate::resources::ResourceId;

/// Transform component for position, rotation, and scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Position in world space
    pub position: Vec3,
    /// Rotation as a quaternion
    pub rotation: Quat,
    /// Scale factor
    pub scale: Vec3,
}

impl Transform {
    /// Create a new transform at the origin
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transform with just a position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a transform with position and rotation
    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            ..Default::default()
        }
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Get the transformation matrix
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

/// Renderable model reference
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mesh {
    /// Id of the model in the mesh resources
    pub id: ResourceId,
    /// Submesh to draw, `-1` for all
    pub sub_mesh_id: i8,
    pub bounding_radius: f32,
}

impl Mesh {
    pub fn new(id: ResourceId) -> Self {
        Self {
            id,
            sub_mesh_id: -1,
            bounding_radius: 0.0,
        }
    }
}

/// Tag: the model bends to follow the terrain height map
#[derive(Debug, Clone, Copy, Default)]
pub struct MorphWithTerrain;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TempleRoom {
    Main,
    Challenge,
    CreatureCave,
    Credits,
    Multiplayer,
    Options,
    SaveGame,
}

/// Piece of the temple interior belonging to one room
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TempleInteriorPart {
    pub room: TempleRoom,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FootpathNode {
    pub position: Vec3,
}

/// Walkable path through consecutive nodes
#[derive(Debug, Clone, Default)]
pub struct Footpath {
    pub nodes: Vec<FootpathNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StreamNode {
    pub position: Vec3,
    /// Indices of the nodes this one flows into
    pub edges: Vec<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct Stream {
    pub nodes: Vec<StreamNode>,
}

impl Stream {
    /// Segment endpoints of every edge, skipping dangling indices
    pub fn segments(&self) -> impl Iterator<Item = (Vec3, Vec3)> + '_ {
        self.nodes.iter().flat_map(move |from| {
            from.edges
                .iter()
                .filter_map(move |&to| self.nodes.get(to).map(|to| (from.position, to.position)))
        })
    }
}

/// Camera-facing billboard
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sprite {
    /// Id of the texture in the texture resources
    pub texture: ResourceId,
    pub uv_min: Vec2,
    pub uv_extent: Vec2,
    pub tint: Vec4,
}

impl Sprite {
    pub fn new(texture: ResourceId) -> Self {
        Self {
            texture,
            uv_min: Vec2::ZERO,
            uv_extent: Vec2::ONE,
            tint: Vec4::ONE,
        }
    }
}

/// Axis cross drawn at a fixed pose
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DebugCross {
    pub pose: Mat4,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_segments() {
        let stream = Stream {
            nodes: vec![
                StreamNode {
                    position: Vec3::ZERO,
                    edges: vec![1, 2],
                },
                StreamNode {
                    position: Vec3::X,
                    edges: vec![7],
                },
                StreamNode {
                    position: Vec3::Z,
                    edges: vec![],
                },
            ],
        };
        let segments: Vec<_> = stream.segments().collect();
        assert_eq!(segments, vec![(Vec3::ZERO, Vec3::X), (Vec3::ZERO, Vec3::Z)]);
    }

    #[test]
    fn test_transform_matrix() {
        let transform = Transform::from_position(Vec3::new(1.0, 2.0, 3.0)).with_scale(Vec3::splat(2.0));
        let p = transform.matrix().transform_point3(Vec3::ONE);
        assert!((p - Vec3::new(3.0, 4.0, 5.0)).length() < 0.0001);
    }
}
