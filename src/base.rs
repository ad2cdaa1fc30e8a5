//! Base band behavior used when no PAM record backs a band.
//!
//! [`RasterBandBase`] is the fallback strategy of a
//! [`PamRasterBand`](crate::PamRasterBand): every accessor the PAM layer
//! overrides has a base version here. The defaults describe a band without
//! any native metadata support: getters report "not set" and setters fail
//! with [`Error::NotSupported`]. The base band is also the raw computation
//! engine for histograms.

use crate::color_table::ColorTable;
use crate::histogram::{HistogramEntry, HistogramRequest};
use crate::rat::AttributeTable;
use crate::value::{ColorInterp, DataType};
use crate::{Error, Result};

/// Whether failures of unsupported base operations are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Diagnostics {
    /// Log failures as errors.
    #[default]
    Report,
    /// Stay silent; used for best-effort copies.
    Ignore,
}

impl Diagnostics {
    /// Logs an error unless diagnostics are suppressed.
    pub(crate) fn report(self, err: &Error) {
        if self == Self::Report {
            log::error!("[pam] {err}");
        }
    }
}

/// Non-persistent band behavior.
pub trait RasterBandBase {
    /// Declared element type.
    fn data_type(&self) -> DataType;

    /// 1-based band index; `0` for bands outside a container.
    fn band_number(&self) -> usize {
        0
    }

    fn no_data_value(&self) -> Option<f64> {
        None
    }

    fn no_data_value_as_int64(&self) -> Option<i64> {
        None
    }

    fn no_data_value_as_uint64(&self) -> Option<u64> {
        None
    }

    fn set_no_data_value(&mut self, _value: f64) -> Result<()> {
        Err(Error::not_supported("SetNoDataValue"))
    }

    fn set_no_data_value_as_int64(&mut self, _value: i64) -> Result<()> {
        Err(Error::not_supported("SetNoDataValueAsInt64"))
    }

    fn set_no_data_value_as_uint64(&mut self, _value: u64) -> Result<()> {
        Err(Error::not_supported("SetNoDataValueAsUInt64"))
    }

    fn delete_no_data_value(&mut self) -> Result<()> {
        Err(Error::not_supported("DeleteNoDataValue"))
    }

    fn offset(&self) -> Option<f64> {
        None
    }

    fn set_offset(&mut self, _offset: f64) -> Result<()> {
        Err(Error::not_supported("SetOffset"))
    }

    fn scale(&self) -> Option<f64> {
        None
    }

    fn set_scale(&mut self, _scale: f64) -> Result<()> {
        Err(Error::not_supported("SetScale"))
    }

    fn unit_type(&self) -> Option<String> {
        None
    }

    fn set_unit_type(&mut self, _unit: &str) -> Result<()> {
        Err(Error::not_supported("SetUnitType"))
    }

    fn color_interpretation(&self) -> ColorInterp {
        ColorInterp::Undefined
    }

    fn set_color_interpretation(&mut self, _interp: ColorInterp) -> Result<()> {
        Err(Error::not_supported("SetColorInterpretation"))
    }

    fn category_names(&self) -> Option<Vec<String>> {
        None
    }

    fn set_category_names(&mut self, _names: Option<&[String]>) -> Result<()> {
        Err(Error::not_supported("SetCategoryNames"))
    }

    fn color_table(&self) -> Option<ColorTable> {
        None
    }

    fn set_color_table(&mut self, _table: Option<&ColorTable>) -> Result<()> {
        Err(Error::not_supported("SetColorTable"))
    }

    fn default_rat(&self) -> Option<AttributeTable> {
        None
    }

    fn set_default_rat(&mut self, _rat: Option<&AttributeTable>) -> Result<()> {
        Err(Error::not_supported("SetDefaultRAT"))
    }

    /// Computes a histogram directly from pixel data, without caching.
    fn compute_histogram(&mut self, _req: &HistogramRequest) -> Result<Vec<u64>> {
        Err(Error::not_supported("GetHistogram"))
    }

    fn set_default_histogram(&mut self, _entry: &HistogramEntry) -> Result<()> {
        Err(Error::not_supported("SetDefaultHistogram"))
    }

    /// Default histogram of the band.
    ///
    /// Without `force` nothing is computed and `Ok(None)` is returned. With
    /// `force`, 8-bit bands get a 256-bucket histogram centered on the
    /// integer values; other element types are not supported.
    fn default_histogram(&mut self, force: bool) -> Result<Option<HistogramEntry>> {
        if !force {
            return Ok(None);
        }
        let (min, max) = match self.data_type() {
            DataType::Byte => (-0.5, 255.5),
            DataType::Int8 => (-128.5, 127.5),
            _ => return Err(Error::not_supported("GetDefaultHistogram")),
        };
        let req = HistogramRequest::new(min, max, 256).with_include_out_of_range(true);
        let counts = self.compute_histogram(&req)?;
        Ok(Some(HistogramEntry {
            min,
            max,
            counts,
            include_out_of_range: true,
            approximate: false,
        }))
    }
}

/// In-memory band over a pixel buffer.
///
/// Has no native metadata support; it only computes histograms. Useful as
/// the base of a [`PamRasterBand`](crate::PamRasterBand) in tests and for
/// bands whose pixels are already in memory.
#[derive(Debug, Clone, Default)]
pub struct SimpleBand {
    band: usize,
    data_type: DataType,
    pixels: Vec<f64>,
    histogram_computations: usize,
}

impl SimpleBand {
    pub fn new(band: usize, data_type: DataType) -> Self {
        Self {
            band,
            data_type,
            ..Self::default()
        }
    }

    pub fn with_pixels(mut self, pixels: Vec<f64>) -> Self {
        self.pixels = pixels;
        self
    }

    /// Number of histograms computed from pixel data so far.
    pub fn histogram_computations(&self) -> usize {
        self.histogram_computations
    }
}

impl RasterBandBase for SimpleBand {
    fn data_type(&self) -> DataType {
        self.data_type
    }

    fn band_number(&self) -> usize {
        self.band
    }

    fn compute_histogram(&mut self, req: &HistogramRequest) -> Result<Vec<u64>> {
        let n = req.bucket_count;
        if n == 0 || req.max <= req.min {
            return Err(Error::malformed(
                "histogram request",
                format!("{n} buckets over [{}, {}]", req.min, req.max),
            ));
        }
        self.histogram_computations += 1;

        let scale = n as f64 / (req.max - req.min);
        let mut counts = vec![0u64; n];
        for &v in self.pixels.iter().filter(|v| !v.is_nan()) {
            let pos = ((v - req.min) * scale).floor();
            let bucket = if pos < 0.0 {
                if !req.include_out_of_range {
                    continue;
                }
                0
            } else if pos >= n as f64 {
                if !req.include_out_of_range {
                    continue;
                }
                n - 1
            } else {
                pos as usize
            };
            counts[bucket] += 1;
        }
        Ok(counts)
    }
}
