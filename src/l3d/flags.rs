//! Mesh-level and submesh-level flag words

use bitflags::bitflags;

bitflags! {
    /// 32-bit mesh flag word from the L3D header.
    ///
    /// Only the named bits have known meaning; the numbered ones are kept
    /// opaque so a round trip never loses information.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct L3dMeshFlags: u32 {
        const UNKNOWN_1 = 1 << 0;
        const UNKNOWN_2 = 1 << 1;
        const UNKNOWN_3 = 1 << 2;
        const UNKNOWN_4 = 1 << 3;
        const UNKNOWN_5 = 1 << 4;
        const UNKNOWN_6 = 1 << 5;
        const UNKNOWN_7 = 1 << 6;
        const UNKNOWN_8 = 1 << 7;
        const HAS_BONES = 1 << 8;
        const HAS_DOOR_POSITION = 1 << 9;
        const UNKNOWN_11 = 1 << 10;
        const UNKNOWN_12 = 1 << 11;
        const PACKED = 1 << 12;
        const NO_DRAW = 1 << 13;
        const UNKNOWN_15 = 1 << 14;
        const CONTAINS_LANDSCAPE_FEATURE = 1 << 15;
        const UNKNOWN_17 = 1 << 16;
        const UNKNOWN_18 = 1 << 17;
        const CONTAINS_UV2 = 1 << 18;
        const CONTAINS_NAME_DATA = 1 << 19;
        const CONTAINS_EXTRA_METRICS = 1 << 20;
        const CONTAINS_EBONE = 1 << 21;
        const CONTAINS_TNL_DATA = 1 << 22;
        const CONTAINS_NEW_EP = 1 << 23;
        const UNKNOWN_25 = 1 << 24;
        const UNKNOWN_26 = 1 << 25;
        const UNKNOWN_27 = 1 << 26;
        const UNKNOWN_28 = 1 << 27;
        const UNKNOWN_29 = 1 << 28;
        const UNKNOWN_30 = 1 << 29;
        const UNKNOWN_31 = 1 << 30;
        const UNKNOWN_32 = 1 << 31;
    }
}

/// Decoded submesh flag word.
///
/// Layout from the low bit: `lod_mask:3, status:6, unknown:3, is_window:1,
/// is_physics:1`, upper 18 bits unused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SubmeshFlags {
    pub lod_mask: u8,
    pub status: u8,
    pub unknown: u8,
    pub is_window: bool,
    pub is_physics: bool,
}

impl SubmeshFlags {
    pub fn from_bits(bits: u32) -> Self {
        Self {
            lod_mask: (bits & 0b111) as u8,
            status: ((bits >> 3) & 0b11_1111) as u8,
            unknown: ((bits >> 9) & 0b111) as u8,
            is_window: (bits >> 12) & 1 == 1,
            is_physics: (bits >> 13) & 1 == 1,
        }
    }

    pub fn bits(&self) -> u32 {
        u32::from(self.lod_mask & 0b111)
            | u32::from(self.status & 0b11_1111) << 3
            | u32::from(self.unknown & 0b111) << 9
            | u32::from(self.is_window) << 12
            | u32::from(self.is_physics) << 13
    }

    /// Flags of an ordinary, drawable, full-detail submesh
    pub fn drawable() -> Self {
        Self {
            lod_mask: 0b111,
            unknown: 0b101,
            ..Default::default()
        }
    }

    /// Flags of a collision-only submesh
    pub fn physics() -> Self {
        Self {
            is_physics: true,
            ..Self::drawable()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_bits() {
        assert_eq!(L3dMeshFlags::HAS_BONES.bits(), 0x100);
        assert_eq!(L3dMeshFlags::CONTAINS_LANDSCAPE_FEATURE.bits(), 0x8000);
        assert_eq!(L3dMeshFlags::CONTAINS_NEW_EP.bits(), 0x80_0000);
        assert_eq!(L3dMeshFlags::all().bits(), u32::MAX);
    }

    #[test]
    fn test_unknown_bits_survive() {
        let flags = L3dMeshFlags::from_bits_retain(0x8000_0101);
        assert!(flags.contains(L3dMeshFlags::HAS_BONES));
        assert!(flags.contains(L3dMeshFlags::UNKNOWN_32));
        assert_eq!(flags.bits(), 0x8000_0101);
    }

    #[test]
    fn test_submesh_flags_decode() {
        // lod 0b011, status 2, unknown 0b101, window, physics
        let bits = 0b011 | (2 << 3) | (0b101 << 9) | (1 << 12) | (1 << 13);
        let flags = SubmeshFlags::from_bits(bits);
        assert_eq!(flags.lod_mask, 0b011);
        assert_eq!(flags.status, 2);
        assert_eq!(flags.unknown, 0b101);
        assert!(flags.is_window);
        assert!(flags.is_physics);
        assert_eq!(flags.bits(), bits);
    }
}
