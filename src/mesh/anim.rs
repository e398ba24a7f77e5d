//! Keyframed bone animation

use glam::{Mat4, Vec4};

use crate::l3d::{AnmBone, AnmFile};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnimError {
    #[error("{name}: header declares {declared} frames, found {found}")]
    FrameCount {
        name: String,
        declared: u32,
        found: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub time: u32,
    pub bones: Vec<Mat4>,
}

fn bone_matrix(bone: &AnmBone) -> Mat4 {
    let m = &bone.matrix;
    Mat4::from_cols(
        Vec4::new(m[0], m[1], m[2], 0.0),
        Vec4::new(m[3], m[4], m[5], 0.0),
        Vec4::new(m[6], m[7], m[8], 0.0),
        Vec4::new(m[9], m[10], m[11], 1.0),
    )
}

fn lerp_matrix(a: &Mat4, b: &Mat4, alpha: f32) -> Mat4 {
    Mat4::from_cols(
        a.x_axis.lerp(b.x_axis, alpha),
        a.y_axis.lerp(b.y_axis, alpha),
        a.z_axis.lerp(b.z_axis, alpha),
        a.w_axis.lerp(b.w_axis, alpha),
    )
}

#[derive(Debug, Clone, PartialEq)]
pub struct L3dAnim {
    name: String,
    duration: u32,
    frames: Vec<Frame>,
}

impl L3dAnim {
    pub fn load(file: &AnmFile) -> Result<Self, AnimError> {
        let header = &file.header;
        if header.frame_count as usize != file.keyframes.len() {
            return Err(AnimError::FrameCount {
                name: header.name.clone(),
                declared: header.frame_count,
                found: file.keyframes.len(),
            });
        }

        let frames = file
            .keyframes
            .iter()
            .map(|keyframe| Frame {
                time: keyframe.time,
                bones: keyframe.bones.iter().map(bone_matrix).collect(),
            })
            .collect();

        Ok(Self {
            name: header.name.clone(),
            duration: header.animation_duration,
            frames,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn duration(&self) -> u32 {
        self.duration
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Bone pose at `time`, looping over the animation duration.
    ///
    /// Interpolates linearly between the two frames around `time`; before the
    /// first frame time it holds the first frame and past the last one it
    /// holds the last.
    pub fn bone_matrices(&self, time: u32) -> Vec<Mat4> {
        let Some(first) = self.frames.first() else {
            return Vec::new();
        };
        if self.duration == 0 {
            return first.bones.clone();
        }

        let time = time % self.duration;
        let mut previous_time = 0;
        let mut index = 0;
        for frame in &self.frames {
            if frame.time >= time {
                break;
            }
            previous_time = frame.time;
            index += 1;
        }

        if index == 0 {
            return first.bones.clone();
        }
        let Some(next) = self.frames.get(index) else {
            return self.frames[self.frames.len() - 1].bones.clone();
        };

        let previous = &self.frames[index - 1];
        let span = next.time - previous_time;
        let alpha = if span == 0 {
            0.0
        } else {
            (time - previous_time) as f32 / span as f32
        };
        previous
            .bones
            .iter()
            .zip(&next.bones)
            .map(|(a, b)| lerp_matrix(a, b, alpha))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::l3d::AnmKeyframe;
    use glam::Vec3;

    fn walk() -> L3dAnim {
        let file = AnmFile::new(
            "walk",
            100,
            vec![
                AnmKeyframe {
                    time: 0,
                    bones: vec![AnmBone::from_translation(0.0, 0.0, 0.0)],
                },
                AnmKeyframe {
                    time: 50,
                    bones: vec![AnmBone::from_translation(10.0, 0.0, 0.0)],
                },
                AnmKeyframe {
                    time: 80,
                    bones: vec![AnmBone::from_translation(10.0, 6.0, 0.0)],
                },
            ],
        );
        L3dAnim::load(&file).unwrap()
    }

    fn translation(m: &Mat4) -> Vec3 {
        m.w_axis.truncate()
    }

    #[test]
    fn test_frame_count_mismatch() {
        let mut file = AnmFile::new("bad", 10, vec![]);
        file.header.frame_count = 2;
        assert!(matches!(
            L3dAnim::load(&file),
            Err(AnimError::FrameCount { declared: 2, found: 0, .. })
        ));
    }

    #[test]
    fn test_interpolates_between_frames() {
        let anim = walk();
        assert_eq!(anim.name(), "walk");
        let pose = anim.bone_matrices(25);
        assert!((translation(&pose[0]) - Vec3::new(5.0, 0.0, 0.0)).length() < 0.0001);
        let pose = anim.bone_matrices(65);
        assert!((translation(&pose[0]) - Vec3::new(10.0, 3.0, 0.0)).length() < 0.0001);
    }

    #[test]
    fn test_exact_frame_and_edges() {
        let anim = walk();
        assert!((translation(&anim.bone_matrices(50)[0]) - Vec3::new(10.0, 0.0, 0.0)).length() < 0.0001);
        assert!(translation(&anim.bone_matrices(0)[0]).length() < 0.0001);
        // Past the last keyframe the pose holds
        assert!((translation(&anim.bone_matrices(95)[0]) - Vec3::new(10.0, 6.0, 0.0)).length() < 0.0001);
    }

    #[test]
    fn test_time_wraps() {
        let anim = walk();
        assert_eq!(anim.bone_matrices(125), anim.bone_matrices(25));
    }

    #[test]
    fn test_empty_animation() {
        let anim = L3dAnim::load(&AnmFile::new("none", 10, vec![])).unwrap();
        assert!(anim.bone_matrices(3).is_empty());
    }
}
