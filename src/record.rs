//! Per-band PAM record.
//!
//! A record is created lazily by its band and holds every persisted field.
//! It is either standalone (field semantics only, no persistence) or
//! attached to a container through a [`ParentLink`], in which case every
//! change is forwarded to the container as a dirty signal.

use crate::color_table::ColorTable;
use crate::container::ParentLink;
use crate::histogram::SavedHistograms;
use crate::rat::AttributeTable;
use crate::value::{ColorInterp, NoData};

/// Persisted metadata of one band.
#[derive(Debug, Clone)]
pub struct PamRecord {
    pub(crate) no_data: Option<NoData>,
    pub(crate) offset: f64,
    pub(crate) offset_set: bool,
    pub(crate) scale: f64,
    pub(crate) scale_set: bool,
    pub(crate) unit_type: Option<String>,
    pub(crate) color_interp: ColorInterp,
    pub(crate) category_names: Option<Vec<String>>,
    pub(crate) color_table: Option<ColorTable>,
    pub(crate) default_rat: Option<AttributeTable>,
    pub(crate) min_max: Option<(f64, f64)>,
    pub(crate) mean_std_dev: Option<(f64, f64)>,
    pub(crate) saved_histograms: Option<SavedHistograms>,
    parent: Option<ParentLink>,
}

impl Default for PamRecord {
    fn default() -> Self {
        Self::standalone()
    }
}

impl PamRecord {
    /// Record without a container.
    pub fn standalone() -> Self {
        Self {
            no_data: None,
            offset: 0.0,
            offset_set: false,
            scale: 1.0,
            scale_set: false,
            unit_type: None,
            color_interp: ColorInterp::Undefined,
            category_names: None,
            color_table: None,
            default_rat: None,
            min_max: None,
            mean_std_dev: None,
            saved_histograms: None,
            parent: None,
        }
    }

    /// Record linked to a container.
    pub fn attached(parent: ParentLink) -> Self {
        Self {
            parent: Some(parent),
            ..Self::standalone()
        }
    }

    /// Links the record to a container, replacing any previous link.
    pub fn attach(&mut self, parent: ParentLink) {
        self.parent = Some(parent);
    }

    pub fn is_attached(&self) -> bool {
        self.parent.is_some()
    }

    pub fn parent(&self) -> Option<&ParentLink> {
        self.parent.as_ref()
    }

    /// Forwards a dirty signal to the container, if attached.
    pub fn mark_dirty(&self) {
        if let Some(parent) = &self.parent {
            parent.mark_dirty();
        }
    }

    // ------------------------------------------------------------------
    // Nodata
    // ------------------------------------------------------------------

    pub fn no_data(&self) -> Option<NoData> {
        self.no_data
    }

    /// Replaces the nodata value; the previous arm is always cleared.
    pub fn set_no_data(&mut self, value: Option<NoData>) {
        self.no_data = value;
    }

    /// The value only if it was set as a generic double.
    pub fn no_data_real(&self) -> Option<f64> {
        match self.no_data {
            Some(NoData::Real(v)) => Some(v),
            _ => None,
        }
    }

    pub fn no_data_int64(&self) -> Option<i64> {
        match self.no_data {
            Some(NoData::Int64(v)) => Some(v),
            _ => None,
        }
    }

    pub fn no_data_uint64(&self) -> Option<u64> {
        match self.no_data {
            Some(NoData::UInt64(v)) => Some(v),
            _ => None,
        }
    }

    // ------------------------------------------------------------------
    // Skalare Felder
    // ------------------------------------------------------------------

    /// `(offset, explicitly_set)`.
    pub fn offset(&self) -> (f64, bool) {
        (self.offset, self.offset_set)
    }

    /// `(scale, explicitly_set)`.
    pub fn scale(&self) -> (f64, bool) {
        (self.scale, self.scale_set)
    }

    pub fn unit_type(&self) -> Option<&str> {
        self.unit_type.as_deref()
    }

    pub fn color_interp(&self) -> ColorInterp {
        self.color_interp
    }

    pub fn category_names(&self) -> Option<&[String]> {
        self.category_names.as_deref()
    }

    pub fn color_table(&self) -> Option<&ColorTable> {
        self.color_table.as_ref()
    }

    pub fn default_rat(&self) -> Option<&AttributeTable> {
        self.default_rat.as_ref()
    }

    pub fn saved_histograms(&self) -> Option<&SavedHistograms> {
        self.saved_histograms.as_ref()
    }

    // ------------------------------------------------------------------
    // Statistik-Paare (beide oder keiner)
    // ------------------------------------------------------------------

    pub fn min_max(&self) -> Option<(f64, f64)> {
        self.min_max
    }

    pub fn set_min_max(&mut self, min: f64, max: f64) {
        self.min_max = Some((min, max));
    }

    pub fn mean_std_dev(&self) -> Option<(f64, f64)> {
        self.mean_std_dev
    }

    pub fn set_mean_std_dev(&mut self, mean: f64, std_dev: f64) {
        self.mean_std_dev = Some((mean, std_dev));
    }

    /// Whether every field holds its default.
    pub fn is_default(&self) -> bool {
        self.no_data.is_none()
            && self.offset == 0.0
            && self.scale == 1.0
            && self.unit_type.is_none()
            && self.color_interp == ColorInterp::Undefined
            && self.category_names.is_none()
            && self.color_table.is_none()
            && self.default_rat.is_none()
            && self.min_max.is_none()
            && self.mean_std_dev.is_none()
            && self.saved_histograms.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::{PamContainer, PamDataset};
    use crate::options::PamOptions;
    use std::rc::Rc;

    #[test]
    fn defaults() {
        let rec = PamRecord::standalone();
        assert_eq!(rec.offset(), (0.0, false));
        assert_eq!(rec.scale(), (1.0, false));
        assert_eq!(rec.color_interp(), ColorInterp::Undefined);
        assert!(!rec.is_attached());
        assert!(rec.is_default());
    }

    #[test]
    fn nodata_arms_are_exclusive() {
        let mut rec = PamRecord::standalone();
        rec.set_no_data(Some(NoData::Real(-1.0)));
        assert_eq!(rec.no_data_real(), Some(-1.0));
        rec.set_no_data(Some(NoData::UInt64(7)));
        assert_eq!(rec.no_data_real(), None);
        assert_eq!(rec.no_data_int64(), None);
        assert_eq!(rec.no_data_uint64(), Some(7));
        rec.set_no_data(None);
        assert!(rec.no_data().is_none());
    }

    #[test]
    fn pairs() {
        let mut rec = PamRecord::standalone();
        rec.set_min_max(1.0, 9.0);
        rec.set_mean_std_dev(4.0, 0.5);
        assert_eq!(rec.min_max(), Some((1.0, 9.0)));
        assert_eq!(rec.mean_std_dev(), Some((4.0, 0.5)));
        assert!(!rec.is_default());
    }

    #[test]
    fn attached_record_forwards_dirty() {
        let ds = Rc::new(PamDataset::new(PamOptions::default()));
        ds.initialize_pam().unwrap();
        let rec = PamRecord::attached(ParentLink::new(&ds));
        assert!(rec.is_attached());
        rec.mark_dirty();
        assert!(ds.is_dirty());
    }

    #[test]
    fn standalone_record_dirty_is_noop() {
        let rec = PamRecord::standalone();
        rec.mark_dirty();
        assert!(rec.parent().is_none());
    }
}
