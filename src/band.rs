//! Raster band with persistent auxiliary metadata.
//!
//! [`PamRasterBand`] wraps a base band and routes every metadata accessor
//! through a lazily created [`PamRecord`]. While no record exists, all
//! operations fall back to the base band.
//!
//! Lifecycle of the record:
//!
//! - **Unattached**: no record. The first mutator asks the container
//!   whether it takes part in PAM; if not, the band stays unattached.
//! - **Attached**: the container initialized its own state and the band
//!   holds a record linked back to it. If the container staged a record for
//!   this band during its initialization, that record is adopted.
//! - **Standalone**: a record without container, giving field semantics
//!   without persistence. Normal attachment later replaces it.
//!
//! [`pam_clear`](PamRasterBand::pam_clear) drops the record in either state.

use std::rc::{Rc, Weak};

use crate::base::{Diagnostics, RasterBandBase};
use crate::color_table::ColorTable;
use crate::container::{PamContainer, ParentLink};
use crate::metadata::MetadataDomains;
use crate::rat::AttributeTable;
use crate::record::PamRecord;
use crate::value::{ColorInterp, DataType, NoData};
use crate::{Error, Result};

/// Lifecycle state of a band's PAM record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PamState {
    Unattached,
    Standalone,
    Attached,
}

/// A band whose metadata is kept in a PAM record.
#[derive(Debug)]
pub struct PamRasterBand<B: RasterBandBase> {
    pub(crate) base: B,
    pub(crate) description: String,
    pub(crate) metadata: MetadataDomains,
    container: Option<Weak<dyn PamContainer>>,
    pub(crate) pam: Option<PamRecord>,
}

impl<B: RasterBandBase> PamRasterBand<B> {
    pub fn new(base: B) -> Self {
        Self {
            base,
            description: String::new(),
            metadata: MetadataDomains::new(),
            container: None,
            pam: None,
        }
    }

    pub fn base(&self) -> &B {
        &self.base
    }

    pub fn base_mut(&mut self) -> &mut B {
        &mut self.base
    }

    pub fn into_base(self) -> B {
        self.base
    }

    pub fn band_number(&self) -> usize {
        self.base.band_number()
    }

    pub fn data_type(&self) -> DataType {
        self.base.data_type()
    }

    // ========================================================================
    // Lebenszyklus
    // ========================================================================

    /// Places the band in `container`. The record is not created until
    /// the first metadata change.
    pub fn attach_container<C: PamContainer + 'static>(&mut self, container: &Rc<C>) {
        let weak = Rc::downgrade(container);
        let weak: Weak<dyn PamContainer> = weak;
        self.container = Some(weak);
    }

    /// Ensures the band holds a record attached to its container.
    ///
    /// Does nothing if an attached record already exists, if the band has
    /// no live container, or if the container does not take part in PAM.
    /// A standalone record is replaced once the container has materialized
    /// its state; if that fails the band keeps its previous state.
    pub fn pam_initialize(&mut self) {
        if self.pam.as_ref().is_some_and(PamRecord::is_attached) {
            return;
        }
        let Some(weak) = self.container.clone() else {
            return;
        };
        let Some(container) = weak.upgrade() else {
            return;
        };
        if !container.is_pam_capable() {
            return;
        }
        if let Err(e) = container.initialize_pam() {
            log::error!("[pam] band {}: {e}", self.band_number());
            return;
        }
        if !container.has_pam_state() {
            return;
        }

        if self.pam.take().is_some() {
            log::debug!("[pam] band {}: standalone record discarded", self.band_number());
        }
        let link = ParentLink::from_weak(weak);
        let record = match container.take_staged_record(self.band_number()) {
            Some(mut staged) => {
                staged.attach(link);
                staged
            }
            None => PamRecord::attached(link),
        };
        self.pam = Some(record);
        log::debug!("[pam] band {}: record attached", self.band_number());
    }

    /// Creates a standalone record unless a record exists.
    pub fn pam_initialize_standalone(&mut self) {
        if self.pam.is_none() {
            self.pam = Some(PamRecord::standalone());
            log::debug!("[pam] band {}: standalone record created", self.band_number());
        }
    }

    /// Drops the record and everything it owns.
    pub fn pam_clear(&mut self) {
        if self.pam.take().is_some() {
            log::debug!("[pam] band {}: record cleared", self.band_number());
        }
    }

    pub fn pam_state(&self) -> PamState {
        match &self.pam {
            None => PamState::Unattached,
            Some(r) if r.is_attached() => PamState::Attached,
            Some(_) => PamState::Standalone,
        }
    }

    pub fn pam_record(&self) -> Option<&PamRecord> {
        self.pam.as_ref()
    }

    /// Forwards a dirty signal to the container, if attached.
    pub fn mark_pam_dirty(&self) {
        if let Some(pam) = &self.pam {
            pam.mark_dirty();
        }
    }

    /// Ruft die Basisimplementierung auf und protokolliert Fehler gemaess
    /// der Diagnose-Policy.
    fn fallback<T>(
        &mut self,
        diag: Diagnostics,
        op: impl FnOnce(&mut B) -> Result<T>,
    ) -> Result<T> {
        let result = op(&mut self.base);
        if let Err(e) = &result {
            if e.is_not_supported() {
                diag.report(e);
            } else {
                log::error!("[pam] {e}");
            }
        }
        result
    }

    // ========================================================================
    // Beschreibung und Metadaten
    // ========================================================================

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Sets the description; marks dirty when it changes.
    pub fn set_description(&mut self, description: &str) {
        self.pam_initialize();
        if self.description != description {
            self.mark_pam_dirty();
            self.description = description.to_string();
        }
    }

    pub fn metadata(&self) -> &MetadataDomains {
        &self.metadata
    }

    pub fn metadata_item(&self, key: &str, domain: &str) -> Option<&str> {
        self.metadata.item(key, domain)
    }

    /// Replaces all items of `domain`.
    pub fn set_metadata<K: AsRef<str>, V: AsRef<str>>(&mut self, items: &[(K, V)], domain: &str) {
        self.pam_initialize();
        self.mark_pam_dirty();
        self.metadata.set_domain(items, domain);
    }

    /// Sets or, with `None`, removes one item.
    pub fn set_metadata_item(&mut self, key: &str, value: Option<&str>, domain: &str) {
        self.pam_initialize();
        self.mark_pam_dirty();
        self.metadata.set_item(key, value, domain);
    }

    // ========================================================================
    // Nodata
    // ========================================================================

    /// Nodata value as a double; 64-bit integer values are widened.
    pub fn no_data_value(&self) -> Option<f64> {
        match &self.pam {
            Some(pam) => pam.no_data().map(NoData::as_f64),
            None => self.base.no_data_value(),
        }
    }

    /// Nodata value of an `Int64` band.
    ///
    /// Fails without touching state when the band has another element type.
    pub fn no_data_value_as_int64(&self) -> Result<Option<i64>> {
        let Some(pam) = &self.pam else {
            return Ok(self.base.no_data_value_as_int64());
        };
        match self.data_type() {
            DataType::Int64 => Ok(pam.no_data_int64()),
            DataType::UInt64 => Err(mismatch("GetNoDataValueAsInt64", "GetNoDataValueAsUInt64")),
            _ => Err(mismatch("GetNoDataValueAsInt64", "GetNoDataValue")),
        }
    }

    /// Nodata value of a `UInt64` band.
    ///
    /// Fails without touching state when the band has another element type.
    pub fn no_data_value_as_uint64(&self) -> Result<Option<u64>> {
        let Some(pam) = &self.pam else {
            return Ok(self.base.no_data_value_as_uint64());
        };
        match self.data_type() {
            DataType::UInt64 => Ok(pam.no_data_uint64()),
            DataType::Int64 => Err(mismatch("GetNoDataValueAsUInt64", "GetNoDataValueAsInt64")),
            _ => Err(mismatch("GetNoDataValueAsUInt64", "GetNoDataValue")),
        }
    }

    pub fn set_no_data_value(&mut self, value: f64) -> Result<()> {
        self.set_no_data_with(NoData::Real(value), Diagnostics::Report)
    }

    pub fn set_no_data_value_as_int64(&mut self, value: i64) -> Result<()> {
        self.set_no_data_with(NoData::Int64(value), Diagnostics::Report)
    }

    pub fn set_no_data_value_as_uint64(&mut self, value: u64) -> Result<()> {
        self.set_no_data_with(NoData::UInt64(value), Diagnostics::Report)
    }

    pub(crate) fn set_no_data_with(&mut self, value: NoData, diag: Diagnostics) -> Result<()> {
        self.pam_initialize();
        let Some(pam) = self.pam.as_mut() else {
            return self.fallback(diag, |b| match value {
                NoData::Real(v) => b.set_no_data_value(v),
                NoData::Int64(v) => b.set_no_data_value_as_int64(v),
                NoData::UInt64(v) => b.set_no_data_value_as_uint64(v),
            });
        };
        pam.set_no_data(Some(value));
        pam.mark_dirty();
        Ok(())
    }

    /// Removes the nodata value in every representation.
    pub fn delete_no_data_value(&mut self) -> Result<()> {
        self.pam_initialize();
        let Some(pam) = self.pam.as_mut() else {
            return self.fallback(Diagnostics::Report, |b| b.delete_no_data_value());
        };
        pam.set_no_data(None);
        pam.mark_dirty();
        Ok(())
    }

    // ========================================================================
    // Offset, Scale, Einheit, Farbinterpretation
    // ========================================================================

    /// `(offset, explicitly_set)`; the offset defaults to `0.0`.
    pub fn offset(&self) -> (f64, bool) {
        match &self.pam {
            Some(pam) => pam.offset(),
            None => self.base.offset().map_or((0.0, false), |v| (v, true)),
        }
    }

    pub fn set_offset(&mut self, offset: f64) -> Result<()> {
        self.set_offset_with(offset, Diagnostics::Report)
    }

    pub(crate) fn set_offset_with(&mut self, offset: f64, diag: Diagnostics) -> Result<()> {
        self.pam_initialize();
        let Some(pam) = self.pam.as_mut() else {
            return self.fallback(diag, |b| b.set_offset(offset));
        };
        if !pam.offset_set || pam.offset != offset {
            pam.offset = offset;
            pam.offset_set = true;
            pam.mark_dirty();
        }
        Ok(())
    }

    /// `(scale, explicitly_set)`; the scale defaults to `1.0`.
    pub fn scale(&self) -> (f64, bool) {
        match &self.pam {
            Some(pam) => pam.scale(),
            None => self.base.scale().map_or((1.0, false), |v| (v, true)),
        }
    }

    pub fn set_scale(&mut self, scale: f64) -> Result<()> {
        self.set_scale_with(scale, Diagnostics::Report)
    }

    pub(crate) fn set_scale_with(&mut self, scale: f64, diag: Diagnostics) -> Result<()> {
        self.pam_initialize();
        let Some(pam) = self.pam.as_mut() else {
            return self.fallback(diag, |b| b.set_scale(scale));
        };
        if !pam.scale_set || pam.scale != scale {
            pam.scale = scale;
            pam.scale_set = true;
            pam.mark_dirty();
        }
        Ok(())
    }

    /// Unit of the pixel values; empty when unset.
    pub fn unit_type(&self) -> String {
        match &self.pam {
            Some(pam) => pam.unit_type().unwrap_or_default().to_string(),
            None => self.base.unit_type().unwrap_or_default(),
        }
    }

    /// Sets the unit; an empty string clears it.
    pub fn set_unit_type(&mut self, unit: &str) -> Result<()> {
        self.set_unit_type_with(unit, Diagnostics::Report)
    }

    pub(crate) fn set_unit_type_with(&mut self, unit: &str, diag: Diagnostics) -> Result<()> {
        self.pam_initialize();
        let Some(pam) = self.pam.as_mut() else {
            return self.fallback(diag, |b| b.set_unit_type(unit));
        };
        if unit.is_empty() {
            if pam.unit_type.take().is_some() {
                pam.mark_dirty();
            }
        } else if pam.unit_type.as_deref() != Some(unit) {
            pam.unit_type = Some(unit.to_string());
            pam.mark_dirty();
        }
        Ok(())
    }

    pub fn color_interpretation(&self) -> ColorInterp {
        match &self.pam {
            Some(pam) => pam.color_interp(),
            None => self.base.color_interpretation(),
        }
    }

    pub fn set_color_interpretation(&mut self, interp: ColorInterp) -> Result<()> {
        self.set_color_interpretation_with(interp, Diagnostics::Report)
    }

    pub(crate) fn set_color_interpretation_with(
        &mut self,
        interp: ColorInterp,
        diag: Diagnostics,
    ) -> Result<()> {
        self.pam_initialize();
        let Some(pam) = self.pam.as_mut() else {
            return self.fallback(diag, |b| b.set_color_interpretation(interp));
        };
        pam.mark_dirty();
        pam.color_interp = interp;
        Ok(())
    }

    // ========================================================================
    // Kategorien, Farbtabelle, Attributtabelle
    // ========================================================================

    pub fn category_names(&self) -> Option<Vec<String>> {
        match &self.pam {
            Some(pam) => pam.category_names().map(<[String]>::to_vec),
            None => self.base.category_names(),
        }
    }

    /// Replaces the category names with a copy of `names`.
    pub fn set_category_names(&mut self, names: Option<&[String]>) -> Result<()> {
        self.set_category_names_with(names, Diagnostics::Report)
    }

    pub(crate) fn set_category_names_with(
        &mut self,
        names: Option<&[String]>,
        diag: Diagnostics,
    ) -> Result<()> {
        self.pam_initialize();
        let Some(pam) = self.pam.as_mut() else {
            return self.fallback(diag, |b| b.set_category_names(names));
        };
        pam.category_names = names.map(<[String]>::to_vec);
        pam.mark_dirty();
        Ok(())
    }

    pub fn color_table(&self) -> Option<ColorTable> {
        match &self.pam {
            Some(pam) => pam.color_table().cloned(),
            None => self.base.color_table(),
        }
    }

    /// Stores a copy of `table`; a table switches the interpretation to
    /// [`ColorInterp::Palette`].
    pub fn set_color_table(&mut self, table: Option<&ColorTable>) -> Result<()> {
        self.set_color_table_with(table, Diagnostics::Report)
    }

    pub(crate) fn set_color_table_with(
        &mut self,
        table: Option<&ColorTable>,
        diag: Diagnostics,
    ) -> Result<()> {
        self.pam_initialize();
        let Some(pam) = self.pam.as_mut() else {
            return self.fallback(diag, |b| b.set_color_table(table));
        };
        pam.color_table = table.cloned();
        if pam.color_table.is_some() {
            pam.color_interp = ColorInterp::Palette;
        }
        pam.mark_dirty();
        Ok(())
    }

    pub fn default_rat(&self) -> Option<AttributeTable> {
        match &self.pam {
            Some(pam) => pam.default_rat().cloned(),
            None => self.base.default_rat(),
        }
    }

    /// Stores a copy of `rat`.
    pub fn set_default_rat(&mut self, rat: Option<&AttributeTable>) -> Result<()> {
        self.set_default_rat_with(rat, Diagnostics::Report)
    }

    pub(crate) fn set_default_rat_with(
        &mut self,
        rat: Option<&AttributeTable>,
        diag: Diagnostics,
    ) -> Result<()> {
        self.pam_initialize();
        let Some(pam) = self.pam.as_mut() else {
            return self.fallback(diag, |b| b.set_default_rat(rat));
        };
        pam.mark_dirty();
        pam.default_rat = rat.cloned();
        Ok(())
    }

    // ========================================================================
    // Statistik
    // ========================================================================

    /// Persisted `(minimum, maximum)`.
    pub fn min_max(&self) -> Option<(f64, f64)> {
        self.pam.as_ref().and_then(PamRecord::min_max)
    }

    pub fn set_min_max(&mut self, min: f64, max: f64) -> Result<()> {
        self.pam_initialize();
        let pam = self.pam.as_mut().ok_or(Error::NoPamRecord)?;
        pam.set_min_max(min, max);
        pam.mark_dirty();
        Ok(())
    }

    /// Persisted `(mean, standard_deviation)`.
    pub fn statistics(&self) -> Option<(f64, f64)> {
        self.pam.as_ref().and_then(PamRecord::mean_std_dev)
    }

    pub fn set_statistics(&mut self, mean: f64, std_dev: f64) -> Result<()> {
        self.pam_initialize();
        let pam = self.pam.as_mut().ok_or(Error::NoPamRecord)?;
        pam.set_mean_std_dev(mean, std_dev);
        pam.mark_dirty();
        Ok(())
    }
}

/// Erzeugt und protokolliert einen Typ-Fehler eines Nodata-Accessors.
fn mismatch(accessor: &'static str, expected: &'static str) -> Error {
    log::error!("[pam] {expected}() should be called instead of {accessor}()");
    Error::DataTypeMismatch { accessor, expected }
}

// ============================================================================
// BandInfo
// ============================================================================

/// Read-only view of a band's metadata, used as the source of
/// [`clone_info`](PamRasterBand::clone_info).
pub trait BandInfo {
    fn data_type(&self) -> DataType;
    fn description(&self) -> &str;
    fn metadata(&self) -> &MetadataDomains;
    fn no_data_value(&self) -> Option<f64>;
    fn no_data_value_as_int64(&self) -> Result<Option<i64>>;
    fn no_data_value_as_uint64(&self) -> Result<Option<u64>>;
    fn offset(&self) -> (f64, bool);
    fn scale(&self) -> (f64, bool);
    fn unit_type(&self) -> String;
    fn color_interpretation(&self) -> ColorInterp;
    fn category_names(&self) -> Option<Vec<String>>;
    fn color_table(&self) -> Option<ColorTable>;
    fn default_rat(&self) -> Option<AttributeTable>;
}

impl<B: RasterBandBase> BandInfo for PamRasterBand<B> {
    fn data_type(&self) -> DataType {
        Self::data_type(self)
    }

    fn description(&self) -> &str {
        Self::description(self)
    }

    fn metadata(&self) -> &MetadataDomains {
        Self::metadata(self)
    }

    fn no_data_value(&self) -> Option<f64> {
        Self::no_data_value(self)
    }

    fn no_data_value_as_int64(&self) -> Result<Option<i64>> {
        Self::no_data_value_as_int64(self)
    }

    fn no_data_value_as_uint64(&self) -> Result<Option<u64>> {
        Self::no_data_value_as_uint64(self)
    }

    fn offset(&self) -> (f64, bool) {
        Self::offset(self)
    }

    fn scale(&self) -> (f64, bool) {
        Self::scale(self)
    }

    fn unit_type(&self) -> String {
        Self::unit_type(self)
    }

    fn color_interpretation(&self) -> ColorInterp {
        Self::color_interpretation(self)
    }

    fn category_names(&self) -> Option<Vec<String>> {
        Self::category_names(self)
    }

    fn color_table(&self) -> Option<ColorTable> {
        Self::color_table(self)
    }

    fn default_rat(&self) -> Option<AttributeTable> {
        Self::default_rat(self)
    }
}
