//! Mapping between a band's PAM record and its description tree.
//!
//! Encoding is sparse: only fields that differ from their defaults produce
//! elements, and a band without anything to persist yields no tree at all.
//! Real nodata values that do not survive their 14-digit text form carry
//! the exact bit pattern in a `le_hex_equiv` attribute, which decoding
//! prefers over the text.

use crate::base::{Diagnostics, RasterBandBase};
use crate::band::PamRasterBand;
use crate::color_table::{ColorEntry, ColorTable};
use crate::histogram::{SavedHistograms, HISTOGRAMS_ELEMENT};
use crate::numeric::{
    f64_from_hex_le, format_general, format_scientific, hex_le_bits, parse_i32, parse_i64,
    parse_real, parse_u64,
};
use crate::rat::{AttributeTable, RAT_ELEMENT};
use crate::tree::{NodeKind, XmlNode};
use crate::value::{ColorInterp, DataType, NoData};
use crate::{Error, Result};

/// Root element of a band's description tree.
pub const PAM_BAND_ELEMENT: &str = "PAMRasterBand";

// ============================================================================
// Nodata
// ============================================================================

/// Encodes a nodata value as `(text, le_hex_equiv)`.
///
/// ```
/// use bandpam::{encode_no_data, NoData};
///
/// assert_eq!(encode_no_data(NoData::Real(-9999.0)), ("-9.99900000000000E+03".to_string(), None));
/// let (text, hex) = encode_no_data(NoData::Real(0.1));
/// assert_eq!(text, "1.00000000000000E-01");
/// assert_eq!(hex.as_deref(), Some("9a9999999999b93f"));
/// assert_eq!(encode_no_data(NoData::UInt64(u64::MAX)).0, "18446744073709551615");
/// ```
pub fn encode_no_data(value: NoData) -> (String, Option<String>) {
    match value {
        NoData::Real(v) => {
            let text = if v.is_nan() { "nan".to_string() } else { format_scientific(v, 14) };
            // Hex nur wenn der Text den Wert nicht exakt wiedergibt
            let exact = v == v.floor() && parse_real(&text) == v;
            let hex = (!exact).then(|| hex_le_bits(v));
            (text, hex)
        }
        NoData::Int64(v) => (v.to_string(), None),
        NoData::UInt64(v) => (v.to_string(), None),
    }
}

/// Decodes a persisted nodata value for a band of `data_type`.
///
/// A well-formed `le_hex_equiv` always yields the exact double. Without
/// it, `Int64` and `UInt64` bands parse the text as integers and all other
/// types as a double. A malformed hex dump falls back to the text.
pub fn decode_no_data(text: &str, le_hex: Option<&str>, data_type: DataType) -> NoData {
    if let Some(hex) = le_hex {
        return match f64_from_hex_le(hex) {
            Ok(v) => NoData::Real(v),
            Err(e) => {
                log::warn!("[pam] {e}, using text value '{text}'");
                NoData::Real(parse_real(text))
            }
        };
    }
    match data_type {
        DataType::Int64 => NoData::Int64(parse_i64(text)),
        DataType::UInt64 => NoData::UInt64(parse_u64(text)),
        _ => NoData::Real(parse_real(text)),
    }
}

// ============================================================================
// Band <-> Baum
// ============================================================================

impl<B: RasterBandBase> PamRasterBand<B> {
    /// Encodes the band's record as a `PAMRasterBand` tree.
    ///
    /// Returns `None` without a record, or when nothing besides the band
    /// number would be written.
    pub fn serialize_to_xml(&self) -> Option<XmlNode> {
        let pam = self.pam.as_ref()?;
        let mut tree = XmlNode::element(PAM_BAND_ELEMENT);

        let band = self.band_number();
        if band > 0 {
            tree.set_value("#band", band.to_string());
        }

        if !self.description.is_empty() {
            tree.set_value("Description", self.description.as_str());
        }

        if let Some(nodata) = pam.no_data() {
            let (text, hex) = encode_no_data(nodata);
            tree.set_value("NoDataValue", text);
            if let Some(hex) = hex {
                tree.set_value("NoDataValue.#le_hex_equiv", hex);
            }
        }

        if let Some(unit) = pam.unit_type() {
            tree.set_value("UnitType", unit);
        }
        if pam.offset != 0.0 {
            tree.set_value("Offset", format_general(pam.offset, 16));
        }
        if pam.scale != 1.0 {
            tree.set_value("Scale", format_general(pam.scale, 16));
        }
        if pam.color_interp != ColorInterp::Undefined {
            tree.set_value("ColorInterp", pam.color_interp.name());
        }

        if let Some(names) = pam.category_names() {
            let mut node = XmlNode::element("CategoryNames");
            for name in names {
                node.add_child(XmlNode::leaf("Category", name.as_str()));
            }
            tree.add_child(node);
        }

        if let Some(table) = pam.color_table() {
            tree.add_child(color_table_to_xml(table));
        }

        if let Some((min, max)) = pam.min_max() {
            tree.set_value("Minimum", format_general(min, 16));
            tree.set_value("Maximum", format_general(max, 16));
        }
        if let Some((mean, std_dev)) = pam.mean_std_dev() {
            tree.set_value("Mean", format_general(mean, 16));
            tree.set_value("StandardDeviation", format_general(std_dev, 16));
        }

        if let Some(saved) = pam.saved_histograms() {
            tree.add_child(saved.as_xml().clone());
        }
        if let Some(rat) = pam.default_rat().and_then(AttributeTable::to_xml) {
            tree.add_child(rat);
        }
        for md in self.metadata.to_xml() {
            tree.add_child(md);
        }

        tree.has_content().then_some(tree)
    }

    /// Loads a `PAMRasterBand` tree into the band's record.
    ///
    /// Fields absent from the tree keep their current values, except the
    /// description, which is reset when the tree has none. Saved histograms
    /// and the attribute table are replaced as a whole. Fails with
    /// [`Error::NoPamRecord`] when no record can be attached.
    pub fn xml_init(&mut self, tree: &XmlNode) -> Result<()> {
        self.pam_initialize();
        if self.pam.is_none() {
            return Err(Error::NoPamRecord);
        }
        let diag = Diagnostics::Report;

        self.metadata.merge_xml(tree);
        self.description = tree.value_or("Description", "").to_string();

        if let Some(text) = tree.value_at("NoDataValue") {
            let hex = tree.value_at("NoDataValue.#le_hex_equiv");
            let nodata = decode_no_data(text, hex, self.data_type());
            self.set_no_data_with(nodata, diag)?;
        }

        let offset = tree.value_at("Offset");
        let scale = tree.value_at("Scale");
        if offset.is_some() || scale.is_some() {
            self.set_offset_with(offset.map_or(0.0, parse_real), diag)?;
            self.set_scale_with(scale.map_or(1.0, parse_real), diag)?;
        }

        if let Some(unit) = tree.value_at("UnitType") {
            self.set_unit_type_with(unit, diag)?;
        }
        if let Some(name) = tree.value_at("ColorInterp") {
            self.set_color_interpretation_with(ColorInterp::from_name(name), diag)?;
        }

        if let Some(node) = tree.node("CategoryNames") {
            let names = category_names_from_xml(node);
            self.set_category_names_with(Some(names.as_slice()), diag)?;
        }
        if let Some(node) = tree.node("ColorTable") {
            let table = color_table_from_xml(node);
            self.set_color_table_with(Some(&table), diag)?;
        }

        let pam = self.pam.as_mut().ok_or(Error::NoPamRecord)?;
        if let (Some(min), Some(max)) = (tree.value_at("Minimum"), tree.value_at("Maximum")) {
            pam.set_min_max(parse_real(min), parse_real(max));
        }
        if let (Some(mean), Some(std_dev)) =
            (tree.value_at("Mean"), tree.value_at("StandardDeviation"))
        {
            pam.set_mean_std_dev(parse_real(mean), parse_real(std_dev));
        }
        if let Some(node) = tree.node(HISTOGRAMS_ELEMENT) {
            pam.saved_histograms = Some(SavedHistograms::from_xml(node));
        }
        if let Some(node) = tree.node(RAT_ELEMENT) {
            pam.default_rat = Some(AttributeTable::from_xml(node));
        }
        Ok(())
    }
}

/// Liest `Category` Eintraege; leere Elemente ergeben einen Leerstring,
/// Elemente mit Nicht-Text-Inhalt werden uebersprungen.
fn category_names_from_xml(node: &XmlNode) -> Vec<String> {
    node.elements_named("Category")
        .filter_map(|entry| match entry.children().first() {
            None => Some(String::new()),
            Some(child) if child.kind() == NodeKind::Text => Some(child.name().to_string()),
            Some(_) => None,
        })
        .collect()
}

fn color_table_to_xml(table: &ColorTable) -> XmlNode {
    let mut node = XmlNode::element("ColorTable");
    for e in table.entries() {
        let mut entry = XmlNode::element("Entry");
        entry.set_value("#c1", e.c1.to_string());
        entry.set_value("#c2", e.c2.to_string());
        entry.set_value("#c3", e.c3.to_string());
        entry.set_value("#c4", e.c4.to_string());
        node.add_child(entry);
    }
    node
}

fn color_table_from_xml(node: &XmlNode) -> ColorTable {
    let mut table = ColorTable::new();
    for (i, entry) in node.elements_named("Entry").enumerate() {
        let channel = |name: &str, default: &str| parse_i32(entry.value_or(name, default)) as i16;
        table.set_entry(
            i,
            ColorEntry {
                c1: channel("#c1", "0"),
                c2: channel("#c2", "0"),
                c3: channel("#c3", "0"),
                c4: channel("#c4", "255"),
            },
        );
    }
    table
}
