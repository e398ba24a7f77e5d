//! Fixed-function render state word
//!
//! Depth is reverse-Z: nearer fragments have larger depth and pass a
//! `GREATER` test against a buffer cleared to zero.

use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RenderState: u32 {
        const WRITE_RGB = 1 << 0;
        const WRITE_A = 1 << 1;
        const WRITE_Z = 1 << 2;
        const DEPTH_TEST_GREATER = 1 << 3;
        const DEPTH_TEST_ALWAYS = 1 << 4;
        /// Cull clockwise-wound triangles
        const CULL_CW = 1 << 5;
        /// Cull counter-clockwise-wound triangles
        const CULL_CCW = 1 << 6;
        /// `src * a + dst * (1 - a)`
        const BLEND_ALPHA = 1 << 7;
        /// `src * a + dst`
        const BLEND_ADD = 1 << 8;
        const PT_LINES = 1 << 9;
        const MSAA = 1 << 10;

        const WRITE_MASK = Self::WRITE_RGB.bits() | Self::WRITE_A.bits() | Self::WRITE_Z.bits();
        const CULL_MASK = Self::CULL_CW.bits() | Self::CULL_CCW.bits();
        const BLEND_MASK = Self::BLEND_ALPHA.bits() | Self::BLEND_ADD.bits();
    }
}

impl RenderState {
    /// Opaque geometry against the inverted depth buffer
    pub const DEFAULT_INVERTED_Z: Self = Self::WRITE_MASK
        .union(Self::DEPTH_TEST_GREATER)
        .union(Self::CULL_CW)
        .union(Self::MSAA);

    /// Replace the cull bits
    pub fn with_cull(self, cull: Self) -> Self {
        (self - Self::CULL_MASK) | (cull & Self::CULL_MASK)
    }

    /// Replace the blend bits
    pub fn with_blend(self, blend: Self) -> Self {
        (self - Self::BLEND_MASK) | (blend & Self::BLEND_MASK)
    }

    pub(crate) fn cull_mode(self) -> Option<wgpu::Face> {
        // Front faces are counter-clockwise
        if self.contains(Self::CULL_CW) {
            Some(wgpu::Face::Back)
        } else if self.contains(Self::CULL_CCW) {
            Some(wgpu::Face::Front)
        } else {
            None
        }
    }

    pub(crate) fn topology(self) -> wgpu::PrimitiveTopology {
        if self.contains(Self::PT_LINES) {
            wgpu::PrimitiveTopology::LineList
        } else {
            wgpu::PrimitiveTopology::TriangleList
        }
    }

    pub(crate) fn blend_state(self) -> Option<wgpu::BlendState> {
        if self.contains(Self::BLEND_ADD) {
            Some(wgpu::BlendState {
                color: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::SrcAlpha,
                    dst_factor: wgpu::BlendFactor::One,
                    operation: wgpu::BlendOperation::Add,
                },
                alpha: wgpu::BlendComponent::OVER,
            })
        } else if self.contains(Self::BLEND_ALPHA) {
            Some(wgpu::BlendState::ALPHA_BLENDING)
        } else {
            Some(wgpu::BlendState::REPLACE)
        }
    }

    pub(crate) fn color_writes(self) -> wgpu::ColorWrites {
        let mut writes = wgpu::ColorWrites::empty();
        if self.contains(Self::WRITE_RGB) {
            writes |= wgpu::ColorWrites::COLOR;
        }
        if self.contains(Self::WRITE_A) {
            writes |= wgpu::ColorWrites::ALPHA;
        }
        writes
    }

    pub(crate) fn depth_compare(self) -> wgpu::CompareFunction {
        if self.contains(Self::DEPTH_TEST_GREATER) {
            wgpu::CompareFunction::Greater
        } else {
            wgpu::CompareFunction::Always
        }
    }
}
