//! Material types and render-ready primitives

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendMode {
    #[default]
    Disabled,
    Standard,
    Additive,
}

/// Render state a material type implies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialState {
    pub depth_write: bool,
    pub alpha_test: bool,
    pub blend: BlendMode,
    pub modulate_alpha: bool,
    pub threshold_alpha: bool,
}

impl MaterialState {
    const OPAQUE: Self = Self {
        depth_write: true,
        alpha_test: false,
        blend: BlendMode::Disabled,
        modulate_alpha: false,
        threshold_alpha: false,
    };

    const fn blended(blend: BlendMode) -> Self {
        Self {
            blend,
            ..Self::OPAQUE
        }
    }

    const fn no_z(self) -> Self {
        Self {
            depth_write: false,
            ..self
        }
    }

    const fn chroma(self) -> Self {
        Self {
            alpha_test: true,
            threshold_alpha: true,
            ..self
        }
    }

    const fn modulated(self) -> Self {
        Self {
            modulate_alpha: true,
            ..self
        }
    }
}

/// Material types of the primitive header.
///
/// Values `0xE` and `0x11` are unassigned and never appear in shipped files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum MaterialType {
    Smooth = 0,
    SmoothAlpha = 1,
    Textured = 2,
    TexturedAlpha = 3,
    AlphaTextured = 4,
    AlphaTexturedAlpha = 5,
    AlphaTexturedAlphaNz = 6,
    SmoothAlphaNz = 7,
    TexturedAlphaNz = 8,
    TexturedChroma = 9,
    AlphaTexturedAlphaAdditiveChroma = 10,
    AlphaTexturedAlphaAdditiveChromaNz = 11,
    AlphaTexturedAlphaAdditive = 12,
    AlphaTexturedAlphaAdditiveNz = 13,
    TexturedChromaAlpha = 15,
    TexturedChromaAlphaNz = 16,
    ChromaJustZ = 18,
}

impl MaterialType {
    pub const COUNT: u32 = 19;

    pub fn from_raw(raw: u32) -> Option<Self> {
        use MaterialType::*;
        Some(match raw {
            0 => Smooth,
            1 => SmoothAlpha,
            2 => Textured,
            3 => TexturedAlpha,
            4 => AlphaTextured,
            5 => AlphaTexturedAlpha,
            6 => AlphaTexturedAlphaNz,
            7 => SmoothAlphaNz,
            8 => TexturedAlphaNz,
            9 => TexturedChroma,
            10 => AlphaTexturedAlphaAdditiveChroma,
            11 => AlphaTexturedAlphaAdditiveChromaNz,
            12 => AlphaTexturedAlphaAdditive,
            13 => AlphaTexturedAlphaAdditiveNz,
            15 => TexturedChromaAlpha,
            16 => TexturedChromaAlphaNz,
            18 => ChromaJustZ,
            _ => return None,
        })
    }

    pub const fn render_state(self) -> MaterialState {
        use BlendMode::{Additive, Standard};
        use MaterialType::*;
        match self {
            Smooth | Textured => MaterialState::OPAQUE,
            SmoothAlpha | TexturedAlpha => MaterialState::blended(Standard),
            AlphaTextured | AlphaTexturedAlpha => MaterialState::blended(Standard).modulated(),
            AlphaTexturedAlphaNz => MaterialState::blended(Standard).modulated().no_z(),
            SmoothAlphaNz | TexturedAlphaNz => MaterialState::blended(Standard).no_z(),
            TexturedChroma | ChromaJustZ => MaterialState::OPAQUE.chroma(),
            AlphaTexturedAlphaAdditiveChroma => MaterialState::blended(Additive).modulated().chroma(),
            AlphaTexturedAlphaAdditiveChromaNz => {
                MaterialState::blended(Additive).modulated().chroma().no_z()
            }
            AlphaTexturedAlphaAdditive => MaterialState::blended(Additive).modulated(),
            AlphaTexturedAlphaAdditiveNz => MaterialState::blended(Additive).modulated().no_z(),
            TexturedChromaAlpha => MaterialState::blended(Standard).chroma(),
            TexturedChromaAlphaNz => MaterialState::blended(Standard).chroma().no_z(),
        }
    }
}

/// Render state of a raw material type.
///
/// Reserved slots trip a debug assertion and render opaque otherwise.
pub fn material_state(raw: u32) -> MaterialState {
    match MaterialType::from_raw(raw) {
        Some(kind) => kind.render_state(),
        None => {
            debug_assert!(false, "reserved material type {raw:#x}");
            log::error!("Reserved material type {raw:#x}, rendering opaque");
            MaterialState::OPAQUE
        }
    }
}

/// One run of triangles sharing a material, ready to draw
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Primitive {
    pub skin_id: u32,
    pub indices_offset: u32,
    pub indices_count: u32,
    pub depth_write: bool,
    pub alpha_test: bool,
    pub blend: BlendMode,
    pub modulate_alpha: bool,
    pub threshold_alpha: bool,
    /// In `[0, 1]`
    pub alpha_cutout_threshold: f32,
}

impl Primitive {
    pub fn new(skin_id: u32, indices_offset: u32, indices_count: u32, material_type: u32, cutout: u8) -> Self {
        let state = material_state(material_type);
        Self {
            skin_id,
            indices_offset,
            indices_count,
            depth_write: state.depth_write,
            alpha_test: state.alpha_test,
            blend: state.blend,
            modulate_alpha: state.modulate_alpha,
            threshold_alpha: state.threshold_alpha,
            alpha_cutout_threshold: f32::from(cutout) / 255.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_slots() {
        assert!(MaterialType::from_raw(0xE).is_none());
        assert!(MaterialType::from_raw(0x11).is_none());
        assert!(MaterialType::from_raw(MaterialType::COUNT).is_none());
        let defined = (0..MaterialType::COUNT)
            .filter(|raw| MaterialType::from_raw(*raw).is_some())
            .count();
        assert_eq!(defined, 17);
    }

    #[test]
    fn test_raw_value_round_trip() {
        for raw in 0..MaterialType::COUNT {
            if let Some(kind) = MaterialType::from_raw(raw) {
                assert_eq!(kind as u32, raw);
            }
        }
    }

    #[test]
    fn test_lookup_table_values() {
        let state = |depth_write, alpha_test, blend, modulate_alpha, threshold_alpha| MaterialState {
            depth_write,
            alpha_test,
            blend,
            modulate_alpha,
            threshold_alpha,
        };
        assert_eq!(material_state(0), state(true, false, BlendMode::Disabled, false, false));
        assert_eq!(material_state(6), state(false, false, BlendMode::Standard, true, false));
        assert_eq!(material_state(11), state(false, true, BlendMode::Additive, true, true));
        assert_eq!(material_state(18), state(true, true, BlendMode::Disabled, false, true));
    }

    #[test]
    fn test_state_rules() {
        let textured = MaterialType::Textured.render_state();
        assert!(textured.depth_write);
        assert_eq!(textured.blend, BlendMode::Disabled);

        let additive = MaterialType::AlphaTexturedAlphaAdditiveChromaNz.render_state();
        assert!(!additive.depth_write);
        assert!(additive.alpha_test);
        assert!(additive.threshold_alpha);
        assert!(additive.modulate_alpha);
        assert_eq!(additive.blend, BlendMode::Additive);

        let chroma = MaterialType::TexturedChroma.render_state();
        assert!(chroma.threshold_alpha);
        assert_eq!(chroma.blend, BlendMode::Disabled);
    }

    #[test]
    fn test_cutout_threshold_normalized() {
        let primitive = Primitive::new(1, 0, 3, MaterialType::TexturedChroma as u32, 255);
        assert!((primitive.alpha_cutout_threshold - 1.0).abs() < 0.0001);
        let primitive = Primitive::new(1, 0, 3, 0, 0);
        assert!(primitive.alpha_cutout_threshold.abs() < 0.0001);
    }
}
