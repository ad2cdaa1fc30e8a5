//! Value types of a band's persisted fields.
//!
//! [`NoData`] models the three mutually exclusive nodata representations as
//! one sum type, so at most one arm can ever be active. [`DataType`] is the
//! declared element type of a band, which decides how integer nodata text
//! is decoded. [`ColorInterp`] carries the symbolic names used in
//! description trees.

use core::fmt;

/// Declared element type of a raster band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DataType {
    #[default]
    Unknown,
    Byte,
    Int8,
    UInt16,
    Int16,
    UInt32,
    Int32,
    UInt64,
    Int64,
    Float32,
    Float64,
    CInt16,
    CInt32,
    CFloat32,
    CFloat64,
}

impl DataType {
    /// Type name as used in band descriptions (`Byte`, `UInt64`, ...).
    pub fn name(self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::Byte => "Byte",
            Self::Int8 => "Int8",
            Self::UInt16 => "UInt16",
            Self::Int16 => "Int16",
            Self::UInt32 => "UInt32",
            Self::Int32 => "Int32",
            Self::UInt64 => "UInt64",
            Self::Int64 => "Int64",
            Self::Float32 => "Float32",
            Self::Float64 => "Float64",
            Self::CInt16 => "CInt16",
            Self::CInt32 => "CInt32",
            Self::CFloat32 => "CFloat32",
            Self::CFloat64 => "CFloat64",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A nodata value in exactly one representation.
///
/// The record stores `Option<NoData>`; `None` means no nodata value is set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NoData {
    /// Generic double, used for all element types except the 64-bit integers.
    Real(f64),
    /// Signed 64-bit value of an `Int64` band.
    Int64(i64),
    /// Unsigned 64-bit value of a `UInt64` band.
    UInt64(u64),
}

impl NoData {
    /// Widens the value to a double.
    ///
    /// 64-bit integers beyond 2^53 lose precision; this is logged since the
    /// caller then reads a different value than was stored.
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Real(v) => v,
            Self::Int64(v) => {
                let d = v as f64;
                if d as i64 != v || d >= 9_223_372_036_854_775_808.0 {
                    log::warn!(
                        "[pam] nodata value {v} not exactly representable as a double, returning {d}"
                    );
                }
                d
            }
            Self::UInt64(v) => {
                let d = v as f64;
                if d as u64 != v || d >= 18_446_744_073_709_551_616.0 {
                    log::warn!(
                        "[pam] nodata value {v} not exactly representable as a double, returning {d}"
                    );
                }
                d
            }
        }
    }

    /// Equality that treats two NaN reals as the same value.
    pub fn same_value(&self, other: &NoData) -> bool {
        match (self, other) {
            (Self::Real(a), Self::Real(b)) => a == b || (a.is_nan() && b.is_nan()),
            _ => self == other,
        }
    }
}

/// Color interpretation of a band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColorInterp {
    #[default]
    Undefined,
    Gray,
    Palette,
    Red,
    Green,
    Blue,
    Alpha,
    Hue,
    Saturation,
    Lightness,
    Cyan,
    Magenta,
    Yellow,
    Black,
    YCbCrY,
    YCbCrCb,
    YCbCrCr,
    Pan,
    Coastal,
    RedEdge,
    Nir,
    Swir,
    Mwir,
    Lwir,
    Tir,
    OtherIr,
    SarKa,
    SarK,
    SarKu,
    SarX,
    SarC,
    SarS,
    SarL,
    SarP,
}

/// Symbolische Namen in Aufzaehlungsreihenfolge.
const COLOR_INTERP_NAMES: &[(ColorInterp, &str)] = &[
    (ColorInterp::Undefined, "Undefined"),
    (ColorInterp::Gray, "Gray"),
    (ColorInterp::Palette, "Palette"),
    (ColorInterp::Red, "Red"),
    (ColorInterp::Green, "Green"),
    (ColorInterp::Blue, "Blue"),
    (ColorInterp::Alpha, "Alpha"),
    (ColorInterp::Hue, "Hue"),
    (ColorInterp::Saturation, "Saturation"),
    (ColorInterp::Lightness, "Lightness"),
    (ColorInterp::Cyan, "Cyan"),
    (ColorInterp::Magenta, "Magenta"),
    (ColorInterp::Yellow, "Yellow"),
    (ColorInterp::Black, "Black"),
    (ColorInterp::YCbCrY, "YCbCr_Y"),
    (ColorInterp::YCbCrCb, "YCbCr_Cb"),
    (ColorInterp::YCbCrCr, "YCbCr_Cr"),
    (ColorInterp::Pan, "Pan"),
    (ColorInterp::Coastal, "Coastal"),
    (ColorInterp::RedEdge, "RedEdge"),
    (ColorInterp::Nir, "NIR"),
    (ColorInterp::Swir, "SWIR"),
    (ColorInterp::Mwir, "MWIR"),
    (ColorInterp::Lwir, "LWIR"),
    (ColorInterp::Tir, "TIR"),
    (ColorInterp::OtherIr, "OtherIR"),
    (ColorInterp::SarKa, "SAR_Ka"),
    (ColorInterp::SarK, "SAR_K"),
    (ColorInterp::SarKu, "SAR_Ku"),
    (ColorInterp::SarX, "SAR_X"),
    (ColorInterp::SarC, "SAR_C"),
    (ColorInterp::SarS, "SAR_S"),
    (ColorInterp::SarL, "SAR_L"),
    (ColorInterp::SarP, "SAR_P"),
];

impl ColorInterp {
    /// Symbolic name written to description trees.
    pub fn name(self) -> &'static str {
        COLOR_INTERP_NAMES
            .iter()
            .find(|(ci, _)| *ci == self)
            .map_or("Undefined", |(_, name)| name)
    }

    /// Looks up a symbolic name (case-insensitive); unknown names map to
    /// [`ColorInterp::Undefined`].
    pub fn from_name(name: &str) -> Self {
        let name = name.trim();
        COLOR_INTERP_NAMES
            .iter()
            .find(|(_, n)| n.eq_ignore_ascii_case(name))
            .map_or(Self::Undefined, |(ci, _)| *ci)
    }
}

impl fmt::Display for ColorInterp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widening_is_exact_for_small_integers() {
        assert_eq!(NoData::Int64(-5).as_f64(), -5.0);
        assert_eq!(NoData::UInt64(4_294_967_295).as_f64(), 4_294_967_295.0);
        assert_eq!(NoData::Real(0.25).as_f64(), 0.25);
    }

    #[test]
    fn widening_large_integers_rounds() {
        assert_eq!(NoData::UInt64(u64::MAX).as_f64(), 18_446_744_073_709_551_616.0);
        assert_eq!(NoData::Int64(i64::MAX).as_f64(), 9_223_372_036_854_775_808.0);
    }

    #[test]
    fn same_value_treats_nan_equal() {
        assert!(NoData::Real(f64::NAN).same_value(&NoData::Real(f64::NAN)));
        assert!(!NoData::Real(1.0).same_value(&NoData::Int64(1)));
        assert!(NoData::UInt64(7).same_value(&NoData::UInt64(7)));
    }

    #[test]
    fn color_interp_names_round_trip() {
        for (ci, name) in COLOR_INTERP_NAMES {
            assert_eq!(ci.name(), *name);
            assert_eq!(ColorInterp::from_name(name), *ci);
        }
    }

    #[test]
    fn color_interp_lookup_is_case_insensitive() {
        assert_eq!(ColorInterp::from_name("palette"), ColorInterp::Palette);
        assert_eq!(ColorInterp::from_name("ycbcr_y"), ColorInterp::YCbCrY);
        assert_eq!(ColorInterp::from_name("bogus"), ColorInterp::Undefined);
    }

    #[test]
    fn data_type_display() {
        assert_eq!(DataType::UInt64.to_string(), "UInt64");
        assert_eq!(DataType::default(), DataType::Unknown);
    }
}
