//! Decoded ANM animation container

/// Animation header fields the engine uses
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnmHeader {
    pub name: String,
    /// Declared keyframe count, checked against the decoded keyframes
    pub frame_count: u32,
    /// Length of one loop in animation time units
    pub animation_duration: u32,
}

/// 3x4 bone matrix: three orientation axes then translation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnmBone {
    pub matrix: [f32; 12],
}

impl AnmBone {
    pub const IDENTITY: Self = Self {
        matrix: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0],
    };

    pub fn from_translation(x: f32, y: f32, z: f32) -> Self {
        let mut bone = Self::IDENTITY;
        bone.matrix[9] = x;
        bone.matrix[10] = y;
        bone.matrix[11] = z;
        bone
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnmKeyframe {
    pub time: u32,
    pub bones: Vec<AnmBone>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnmFile {
    pub header: AnmHeader,
    pub keyframes: Vec<AnmKeyframe>,
}

impl AnmFile {
    /// Build a file whose header agrees with its keyframes
    pub fn new(name: impl Into<String>, duration: u32, keyframes: Vec<AnmKeyframe>) -> Self {
        Self {
            header: AnmHeader {
                name: name.into(),
                frame_count: keyframes.len() as u32,
                animation_duration: duration,
            },
            keyframes,
        }
    }
}
