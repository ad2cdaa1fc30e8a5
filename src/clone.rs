//! Copying metadata between bands.

use bitflags::bitflags;

use crate::band::{BandInfo, PamRasterBand};
use crate::base::{Diagnostics, RasterBandBase};
use crate::value::{ColorInterp, DataType, NoData};
use crate::Result;

bitflags! {
    /// Categories copied by [`PamRasterBand::clone_info`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CloneFlags: u32 {
        const BAND_METADATA    = 1 << 0;
        const BAND_DESCRIPTION = 1 << 1;
        const NODATA           = 1 << 2;
        const CATEGORY_NAMES   = 1 << 3;
        const SCALE_OFFSET     = 1 << 4;
        const UNIT_TYPE        = 1 << 5;
        const COLOR_INTERP     = 1 << 6;
        const COLOR_TABLE      = 1 << 7;
        const RAT              = 1 << 8;
        /// Copy a field only if the destination lacks it or holds another value.
        const ONLY_IF_MISSING  = 1 << 16;

        /// Every band-level category.
        const PAM_DEFAULT = Self::BAND_METADATA.bits()
            | Self::BAND_DESCRIPTION.bits()
            | Self::NODATA.bits()
            | Self::CATEGORY_NAMES.bits()
            | Self::SCALE_OFFSET.bits()
            | Self::UNIT_TYPE.bits()
            | Self::COLOR_INTERP.bits()
            | Self::COLOR_TABLE.bits()
            | Self::RAT.bits();
    }
}

impl Default for CloneFlags {
    fn default() -> Self {
        Self::PAM_DEFAULT
    }
}

impl<B: RasterBandBase> PamRasterBand<B> {
    /// Copies the categories selected by `flags` from `src`.
    ///
    /// Each copy is best effort: a field the destination cannot store is
    /// skipped silently, and the call itself always succeeds. With
    /// [`CloneFlags::ONLY_IF_MISSING`] scalar fields are copied when the
    /// destination lacks them or holds a different value; category names,
    /// color tables and attribute tables only when the destination has
    /// none.
    ///
    /// ```
    /// use bandpam::{CloneFlags, DataType, PamRasterBand, SimpleBand};
    ///
    /// let mut src = PamRasterBand::new(SimpleBand::new(1, DataType::Float32));
    /// src.pam_initialize_standalone();
    /// src.set_unit_type("m").unwrap();
    /// src.set_no_data_value(-1.0).unwrap();
    ///
    /// let mut dst = PamRasterBand::new(SimpleBand::new(1, DataType::Float32));
    /// dst.pam_initialize_standalone();
    /// dst.clone_info(&src, CloneFlags::UNIT_TYPE).unwrap();
    ///
    /// assert_eq!(dst.unit_type(), "m");
    /// assert_eq!(dst.no_data_value(), None);
    /// ```
    pub fn clone_info(&mut self, src: &dyn BandInfo, flags: CloneFlags) -> Result<()> {
        let only = flags.contains(CloneFlags::ONLY_IF_MISSING);
        let quiet = Diagnostics::Ignore;
        self.pam_initialize();

        if flags.contains(CloneFlags::BAND_METADATA) {
            let items: Vec<(&str, &str)> = src.metadata().items("").collect();
            if !items.is_empty() && (!only || items.len() != self.metadata.item_count("")) {
                self.set_metadata(&items, "");
            }
        }

        if flags.contains(CloneFlags::BAND_DESCRIPTION) {
            let desc = src.description();
            if !desc.is_empty() && (!only || self.description.is_empty()) {
                self.set_description(desc);
            }
        }

        if flags.contains(CloneFlags::NODATA) {
            self.clone_no_data(src, only, quiet);
        }

        if flags.contains(CloneFlags::CATEGORY_NAMES)
            && let Some(names) = src.category_names()
            && (!only || self.category_names().is_none())
        {
            let _ = self.set_category_names_with(Some(names.as_slice()), quiet);
        }

        if flags.contains(CloneFlags::SCALE_OFFSET) {
            if let (offset, true) = src.offset()
                && (!only || self.offset().0 != offset)
            {
                let _ = self.set_offset_with(offset, quiet);
            }
            if let (scale, true) = src.scale()
                && (!only || self.scale().0 != scale)
            {
                let _ = self.set_scale_with(scale, quiet);
            }
        }

        if flags.contains(CloneFlags::UNIT_TYPE) {
            let unit = src.unit_type();
            if !unit.is_empty() && (!only || !self.unit_type().eq_ignore_ascii_case(&unit)) {
                let _ = self.set_unit_type_with(&unit, quiet);
            }
        }

        if flags.contains(CloneFlags::COLOR_INTERP) {
            let interp = src.color_interpretation();
            if interp != ColorInterp::Undefined
                && (!only || self.color_interpretation() != interp)
            {
                let _ = self.set_color_interpretation_with(interp, quiet);
            }
        }

        if flags.contains(CloneFlags::COLOR_TABLE)
            && let Some(table) = src.color_table()
            && (!only || self.color_table().is_none())
        {
            let _ = self.set_color_table_with(Some(&table), quiet);
        }

        if flags.contains(CloneFlags::RAT)
            && let Some(rat) = src.default_rat()
            && (rat.row_count() > 0 || rat.column_count() > 0)
            && (!only || self.default_rat().is_none())
        {
            let _ = self.set_default_rat_with(Some(&rat), quiet);
        }

        Ok(())
    }

    /// Kopiert Nodata in der Darstellung, die der Quelltyp vorgibt.
    fn clone_no_data(&mut self, src: &dyn BandInfo, only: bool, quiet: Diagnostics) {
        let value = match src.data_type() {
            DataType::Int64 => src.no_data_value_as_int64().ok().flatten().map(NoData::Int64),
            DataType::UInt64 => src.no_data_value_as_uint64().ok().flatten().map(NoData::UInt64),
            _ => src.no_data_value().map(NoData::Real),
        };
        let Some(value) = value else {
            return;
        };

        if only {
            let current = match value {
                NoData::Int64(_) => self.no_data_value_as_int64().ok().flatten().map(NoData::Int64),
                NoData::UInt64(_) => {
                    self.no_data_value_as_uint64().ok().flatten().map(NoData::UInt64)
                }
                NoData::Real(_) => self.no_data_value().map(NoData::Real),
            };
            if current.is_some_and(|c| c.same_value(&value)) {
                return;
            }
        }
        let _ = self.set_no_data_with(value, quiet);
    }
}
