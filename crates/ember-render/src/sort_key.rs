//! 64-bit draw-order keys.
//!
//! A key packs `(layer, batch, depth, id)`. The layer always occupies the top
//! byte and the entity id the low 24 bits; the batch and depth shifts are
//! configurable so a preset can decide whether depth or batch dominates.

use ember_bus::RenderDepth;
use glam::Vec2;
use thiserror::Error;

pub const LAYER_BITS: u32 = 8;
pub const BATCH_BITS: u32 = 8;
pub const DEPTH_BITS: u32 = 24;
pub const ID_BITS: u32 = 24;

pub const LAYER_SHIFT: u32 = 56;

pub const LAYER_MASK: u64 = (1 << LAYER_BITS) - 1;
pub const BATCH_MASK: u64 = (1 << BATCH_BITS) - 1;
pub const DEPTH_MASK: u64 = (1 << DEPTH_BITS) - 1;
pub const ID_MASK: u64 = (1 << ID_BITS) - 1;

/// Largest quantized depth.
pub const DEPTH_MAX: u32 = DEPTH_MASK as u32;

pub const DEFAULT_DEPTH_BIAS: f32 = 100_000.0;
pub const DEFAULT_DEPTH_PRECISION: f32 = 100.0;

/// Map a raw depth onto the 24-bit depth field.
#[inline]
pub fn quantize_depth(raw: f32, bias: f32, precision: f32) -> u32 {
    let quantized = (raw + bias) * precision;
    if quantized.is_nan() || quantized <= 0.0 {
        0
    } else if quantized >= DEPTH_MAX as f32 {
        DEPTH_MAX
    } else {
        quantized as u32
    }
}

/// Why a [`DepthMath`] was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DepthMathError {
    #[error("depth weights must be finite")]
    NonFiniteWeight,

    #[error("{field} field at shift {shift} does not fit in 64 bits")]
    FieldOverflow { field: &'static str, shift: u8 },

    #[error("{a} and {b} fields overlap")]
    Overlap { a: &'static str, b: &'static str },
}

/// Fields recovered from a key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SortFields {
    pub layer: u8,
    pub batch: u8,
    pub depth: u32,
    pub id: u32,
}

/// Linear depth weights and the batch/depth shift positions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DepthMath {
    pub w_x: f32,
    pub w_y: f32,
    pub w_h: f32,
    pub shift_batch: u8,
    pub shift_depth: u8,
}

impl Default for DepthMath {
    fn default() -> Self {
        Self::FLAT
    }
}

impl DepthMath {
    /// No depth: layer, then batch, then id.
    pub const FLAT: Self = Self::new(0.0, 0.0, 0.0, 48, 24);
    /// Sort by pivot y.
    pub const Y_ORIGIN: Self = Self::new(0.0, 1.0, 0.0, 24, 32);
    /// Sort by y plus height, for sprites pivoted at their top edge.
    pub const Y_BOTTOM: Self = Self::new(0.0, 1.0, 1.0, 24, 32);
    pub const ISOMETRIC: Self = Self::new(0.5, 0.5, 1.0, 24, 32);

    pub const fn new(w_x: f32, w_y: f32, w_h: f32, shift_batch: u8, shift_depth: u8) -> Self {
        Self {
            w_x,
            w_y,
            w_h,
            shift_batch,
            shift_depth,
        }
    }

    /// Check weights are finite and the four fields are disjoint within 64 bits.
    pub fn validate(&self) -> Result<(), DepthMathError> {
        if !(self.w_x.is_finite() && self.w_y.is_finite() && self.w_h.is_finite()) {
            return Err(DepthMathError::NonFiniteWeight);
        }
        if u32::from(self.shift_batch) + BATCH_BITS > 64 {
            return Err(DepthMathError::FieldOverflow {
                field: "batch",
                shift: self.shift_batch,
            });
        }
        if u32::from(self.shift_depth) + DEPTH_BITS > 64 {
            return Err(DepthMathError::FieldOverflow {
                field: "depth",
                shift: self.shift_depth,
            });
        }

        let fields = [
            ("layer", LAYER_MASK << LAYER_SHIFT),
            ("batch", BATCH_MASK << self.shift_batch),
            ("depth", DEPTH_MASK << self.shift_depth),
            ("id", ID_MASK),
        ];
        for (i, &(a, mask_a)) in fields.iter().enumerate() {
            for &(b, mask_b) in &fields[i + 1..] {
                if mask_a & mask_b != 0 {
                    return Err(DepthMathError::Overlap { a, b });
                }
            }
        }
        Ok(())
    }

    /// Unquantized depth of an entity at `pos` with height `height`.
    #[inline]
    pub fn raw_depth(&self, pos: Vec2, height: f32) -> f32 {
        pos.x * self.w_x + pos.y * self.w_y + height * self.w_h
    }

    #[inline]
    pub fn pack(&self, layer: u8, batch: u8, depth: u32, id: u32) -> u64 {
        (u64::from(layer) & LAYER_MASK) << LAYER_SHIFT
            | (u64::from(batch) & BATCH_MASK) << self.shift_batch
            | (u64::from(depth) & DEPTH_MASK) << self.shift_depth
            | u64::from(id) & ID_MASK
    }

    #[inline]
    pub fn unpack(&self, key: u64) -> SortFields {
        SortFields {
            layer: ((key >> LAYER_SHIFT) & LAYER_MASK) as u8,
            batch: self.batch_of(key),
            depth: ((key >> self.shift_depth) & DEPTH_MASK) as u32,
            id: (key & ID_MASK) as u32,
        }
    }

    #[inline]
    pub fn batch_of(&self, key: u64) -> u8 {
        ((key >> self.shift_batch) & BATCH_MASK) as u8
    }

    /// Payload of a `SET_DEPTH_MATH` command selecting this configuration.
    pub fn to_command(self) -> RenderDepth {
        RenderDepth {
            w_x: self.w_x,
            w_y: self.w_y,
            w_h: self.w_h,
            shift_batch: self.shift_batch,
            shift_depth: self.shift_depth,
        }
    }
}

impl From<RenderDepth> for DepthMath {
    fn from(d: RenderDepth) -> Self {
        Self::new(d.w_x, d.w_y, d.w_h, d.shift_batch, d.shift_depth)
    }
}

/// Named depth configurations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DepthPreset {
    Flat,
    YOrigin,
    YBottom,
    Isometric,
}

impl DepthPreset {
    /// Parse a config name (`flat`, `y_origin`, `y_bottom`, `isometric`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "flat" => Some(Self::Flat),
            "y_origin" => Some(Self::YOrigin),
            "y_bottom" => Some(Self::YBottom),
            "isometric" | "iso" => Some(Self::Isometric),
            _ => None,
        }
    }

    pub const fn math(self) -> DepthMath {
        match self {
            Self::Flat => DepthMath::FLAT,
            Self::YOrigin => DepthMath::Y_ORIGIN,
            Self::YBottom => DepthMath::Y_BOTTOM,
            Self::Isometric => DepthMath::ISOMETRIC,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        for preset in [
            DepthPreset::Flat,
            DepthPreset::YOrigin,
            DepthPreset::YBottom,
            DepthPreset::Isometric,
        ] {
            assert_eq!(preset.math().validate(), Ok(()), "{preset:?}");
        }
    }

    #[test]
    fn test_pack_unpack() {
        for math in [DepthMath::FLAT, DepthMath::Y_ORIGIN] {
            let fields = SortFields {
                layer: 0xAB,
                batch: 0x12,
                depth: 0xABCDEF,
                id: 0x123456,
            };
            let key = math.pack(fields.layer, fields.batch, fields.depth, fields.id);
            assert_eq!(math.unpack(key), fields);
        }
    }

    #[test]
    fn test_flat_orders_layer_batch_depth_id() {
        let m = DepthMath::FLAT;
        let ordered = [
            m.pack(0, 0, 0, 5),
            m.pack(0, 0, 1, 0),
            m.pack(0, 1, 0, 0),
            m.pack(1, 0, 0, 0),
        ];
        assert!(ordered.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_y_presets_put_depth_above_batch() {
        let m = DepthMath::Y_ORIGIN;
        assert!(m.pack(0, 9, 10, 0) < m.pack(0, 0, 11, 0));
        assert!(m.pack(0, 9, 10, 0) > m.pack(0, 0, 10, 0));
    }

    #[test]
    fn test_overlapping_shifts_rejected() {
        let err = DepthMath::new(0.0, 1.0, 0.0, 24, 24).validate();
        assert_eq!(err, Err(DepthMathError::Overlap { a: "batch", b: "depth" }));

        let err = DepthMath::new(0.0, 0.0, 0.0, 16, 32).validate();
        assert_eq!(err, Err(DepthMathError::Overlap { a: "batch", b: "id" }));

        let err = DepthMath::new(0.0, 0.0, 0.0, 48, 41).validate();
        assert!(matches!(err, Err(DepthMathError::FieldOverflow { field: "depth", .. })));

        let err = DepthMath::new(0.0, 0.0, 0.0, 56, 24).validate();
        assert_eq!(err, Err(DepthMathError::Overlap { a: "layer", b: "batch" }));
    }

    #[test]
    fn test_non_finite_weight_rejected() {
        let err = DepthMath::new(f32::NAN, 0.0, 0.0, 48, 24).validate();
        assert_eq!(err, Err(DepthMathError::NonFiniteWeight));
    }

    #[test]
    fn test_quantize_clamps() {
        assert_eq!(quantize_depth(-200_000.0, DEFAULT_DEPTH_BIAS, DEFAULT_DEPTH_PRECISION), 0);
        assert_eq!(quantize_depth(0.0, DEFAULT_DEPTH_BIAS, DEFAULT_DEPTH_PRECISION), 10_000_000);
        assert_eq!(quantize_depth(1e9, DEFAULT_DEPTH_BIAS, DEFAULT_DEPTH_PRECISION), DEPTH_MAX);
        assert_eq!(quantize_depth(f32::NAN, DEFAULT_DEPTH_BIAS, DEFAULT_DEPTH_PRECISION), 0);
    }

    #[test]
    fn test_quantize_is_monotonic() {
        let a = quantize_depth(5.0, DEFAULT_DEPTH_BIAS, DEFAULT_DEPTH_PRECISION);
        let b = quantize_depth(10.0, DEFAULT_DEPTH_BIAS, DEFAULT_DEPTH_PRECISION);
        assert!(a < b);
    }

    #[test]
    fn test_preset_names() {
        assert_eq!(DepthPreset::from_name("y_bottom"), Some(DepthPreset::YBottom));
        assert_eq!(DepthPreset::from_name(" Flat "), Some(DepthPreset::Flat));
        assert_eq!(DepthPreset::from_name("sideways"), None);
    }

    #[test]
    fn test_command_round_trip() {
        let math = DepthMath::ISOMETRIC;
        assert_eq!(DepthMath::from(math.to_command()), math);
    }
}
