//! Raster attribute table attached to a band.
//!
//! The table is persisted as a `GDALRasterAttributeTable` subtree:
//!
//! ```text
//! <GDALRasterAttributeTable Row0Min="0" BinSize="1">
//!   <FieldDefn index="0">
//!     <Name>Value</Name>
//!     <Type>0</Type>
//!     <Usage>0</Usage>
//!   </FieldDefn>
//!   <Row index="0">
//!     <F>1</F>
//!   </Row>
//! </GDALRasterAttributeTable>
//! ```

use crate::numeric::{format_general, parse_i32, parse_real};
use crate::tree::XmlNode;

/// Name of the root element of a persisted attribute table.
pub const RAT_ELEMENT: &str = "GDALRasterAttributeTable";

/// Value type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldType {
    #[default]
    Integer,
    Real,
    String,
}

impl FieldType {
    fn code(self) -> i32 {
        match self {
            Self::Integer => 0,
            Self::Real => 1,
            Self::String => 2,
        }
    }

    fn from_code(code: i32) -> Self {
        match code {
            1 => Self::Real,
            2 => Self::String,
            _ => Self::Integer,
        }
    }
}

/// Semantic role of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldUsage {
    #[default]
    Generic,
    PixelCount,
    Name,
    Min,
    Max,
    MinMax,
    Red,
    Green,
    Blue,
    Alpha,
    RedMin,
    GreenMin,
    BlueMin,
    AlphaMin,
    RedMax,
    GreenMax,
    BlueMax,
    AlphaMax,
}

const USAGES: [FieldUsage; 18] = [
    FieldUsage::Generic,
    FieldUsage::PixelCount,
    FieldUsage::Name,
    FieldUsage::Min,
    FieldUsage::Max,
    FieldUsage::MinMax,
    FieldUsage::Red,
    FieldUsage::Green,
    FieldUsage::Blue,
    FieldUsage::Alpha,
    FieldUsage::RedMin,
    FieldUsage::GreenMin,
    FieldUsage::BlueMin,
    FieldUsage::AlphaMin,
    FieldUsage::RedMax,
    FieldUsage::GreenMax,
    FieldUsage::BlueMax,
    FieldUsage::AlphaMax,
];

impl FieldUsage {
    fn code(self) -> i32 {
        USAGES.iter().position(|u| *u == self).map_or(0, |p| p as i32)
    }

    fn from_code(code: i32) -> Self {
        usize::try_from(code)
            .ok()
            .and_then(|i| USAGES.get(i).copied())
            .unwrap_or_default()
    }
}

/// Column definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDefn {
    pub name: String,
    pub field_type: FieldType,
    pub usage: FieldUsage,
}

/// Tabular attribute data; cells are kept in their text form.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AttributeTable {
    columns: Vec<FieldDefn>,
    rows: Vec<Vec<String>>,
    linear_binning: Option<(f64, f64)>,
}

impl AttributeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn columns(&self) -> &[FieldDefn] {
        &self.columns
    }

    /// Appends a column; existing rows get an empty cell.
    pub fn create_column(
        &mut self,
        name: impl Into<String>,
        field_type: FieldType,
        usage: FieldUsage,
    ) {
        self.columns.push(FieldDefn { name: name.into(), field_type, usage });
        for row in &mut self.rows {
            row.push(String::new());
        }
    }

    /// Grows or truncates the table to `rows` rows.
    pub fn set_row_count(&mut self, rows: usize) {
        let width = self.columns.len();
        self.rows.resize_with(rows, || vec![String::new(); width]);
    }

    /// Sets a cell from text, growing the row count as needed.
    /// Out-of-range columns are ignored.
    pub fn set_value(&mut self, row: usize, col: usize, value: impl Into<String>) {
        if col >= self.columns.len() {
            return;
        }
        if row >= self.rows.len() {
            self.set_row_count(row + 1);
        }
        self.rows[row][col] = value.into();
    }

    pub fn set_value_int(&mut self, row: usize, col: usize, value: i32) {
        self.set_value(row, col, value.to_string());
    }

    pub fn set_value_real(&mut self, row: usize, col: usize, value: f64) {
        self.set_value(row, col, format_general(value, 16));
    }

    pub fn value_as_string(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row)?.get(col).map(String::as_str)
    }

    pub fn value_as_int(&self, row: usize, col: usize) -> i32 {
        self.value_as_string(row, col).map_or(0, parse_i32)
    }

    pub fn value_as_real(&self, row: usize, col: usize) -> f64 {
        self.value_as_string(row, col).map_or(0.0, parse_real)
    }

    /// `(row0_min, bin_size)` when rows map to equal-width value bins.
    pub fn linear_binning(&self) -> Option<(f64, f64)> {
        self.linear_binning
    }

    pub fn set_linear_binning(&mut self, row0_min: f64, bin_size: f64) {
        self.linear_binning = Some((row0_min, bin_size));
    }

    /// Serializes the table; an empty table yields `None`.
    pub fn to_xml(&self) -> Option<XmlNode> {
        if self.columns.is_empty() && self.rows.is_empty() {
            return None;
        }
        let mut root = XmlNode::element(RAT_ELEMENT);
        if let Some((row0_min, bin_size)) = self.linear_binning {
            root.set_value("#Row0Min", format_general(row0_min, 16));
            root.set_value("#BinSize", format_general(bin_size, 16));
        }

        for (i, col) in self.columns.iter().enumerate() {
            let mut defn = XmlNode::element("FieldDefn");
            defn.add_child(XmlNode::attribute("index", i.to_string()));
            defn.add_child(XmlNode::leaf("Name", col.name.as_str()));
            defn.add_child(XmlNode::leaf("Type", col.field_type.code().to_string()));
            defn.add_child(XmlNode::leaf("Usage", col.usage.code().to_string()));
            root.add_child(defn);
        }

        for (i, cells) in self.rows.iter().enumerate() {
            let mut row = XmlNode::element("Row");
            row.add_child(XmlNode::attribute("index", i.to_string()));
            for cell in cells {
                row.add_child(XmlNode::leaf("F", cell.as_str()));
            }
            root.add_child(row);
        }
        Some(root)
    }

    /// Reads a `GDALRasterAttributeTable` subtree.
    ///
    /// Rows are placed at their `index` attribute (falling back to document
    /// order); missing cells stay empty. Rows whose index is not below the
    /// number of `Row` elements are skipped.
    pub fn from_xml(node: &XmlNode) -> Self {
        let mut rat = Self::new();
        if let (Some(min), Some(size)) = (node.value_at("#Row0Min"), node.value_at("#BinSize")) {
            rat.set_linear_binning(parse_real(min), parse_real(size));
        }

        for defn in node.elements_named("FieldDefn") {
            rat.create_column(
                defn.value_or("Name", ""),
                FieldType::from_code(parse_i32(defn.value_or("Type", "1"))),
                FieldUsage::from_code(parse_i32(defn.value_or("Usage", "0"))),
            );
        }

        // Ein Index jenseits der Anzahl Row-Elemente kann nicht aus einer
        // geschriebenen Tabelle stammen.
        let row_limit = node.elements_named("Row").count();
        for (ordinal, row) in node.elements_named("Row").enumerate() {
            let index = row
                .value_at("#index")
                .and_then(|v| usize::try_from(parse_i32(v)).ok())
                .unwrap_or(ordinal);
            if index >= row_limit {
                log::warn!("[pam] attribute table row {index} beyond {row_limit} rows, skipped");
                continue;
            }
            if index >= rat.row_count() {
                rat.set_row_count(index + 1);
            }
            for (col, cell) in row.elements_named("F").enumerate() {
                rat.set_value(index, col, cell.value_or("", ""));
            }
        }
        rat
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AttributeTable {
        let mut rat = AttributeTable::new();
        rat.create_column("Value", FieldType::Integer, FieldUsage::MinMax);
        rat.create_column("Class", FieldType::String, FieldUsage::Name);
        rat.set_value_int(0, 0, 1);
        rat.set_value(0, 1, "water");
        rat.set_value_int(1, 0, 2);
        rat.set_value(1, 1, "forest & field");
        rat
    }

    #[test]
    fn to_xml_layout() {
        let node = sample().to_xml().unwrap();
        assert_eq!(node.name(), RAT_ELEMENT);
        assert_eq!(node.elements_named("FieldDefn").count(), 2);
        assert_eq!(node.elements_named("Row").count(), 2);
        let first = node.node("FieldDefn").unwrap();
        assert_eq!(first.value_at("#index"), Some("0"));
        assert_eq!(first.value_at("Type"), Some("0"));
        assert_eq!(first.value_at("Usage"), Some("5"));
    }

    #[test]
    fn xml_round_trip_preserves_cells() {
        let mut rat = sample();
        rat.set_linear_binning(-0.5, 1.0);
        let back = AttributeTable::from_xml(&rat.to_xml().unwrap());
        assert_eq!(back, rat);
        assert_eq!(back.value_as_string(1, 1), Some("forest & field"));
        assert_eq!(back.value_as_int(1, 0), 2);
    }

    #[test]
    fn empty_table_serializes_to_none() {
        assert!(AttributeTable::new().to_xml().is_none());
    }

    #[test]
    fn set_value_grows_rows_and_ignores_bad_column() {
        let mut rat = AttributeTable::new();
        rat.create_column("Area", FieldType::Real, FieldUsage::Generic);
        rat.set_value_real(4, 0, 2.5);
        rat.set_value(0, 7, "ignored");
        assert_eq!(rat.row_count(), 5);
        assert_eq!(rat.value_as_real(4, 0), 2.5);
        assert_eq!(rat.value_as_string(0, 0), Some(""));
    }

    #[test]
    fn out_of_range_row_index_is_skipped() {
        let text = r#"<GDALRasterAttributeTable>
  <FieldDefn index="0"><Name>Value</Name><Type>0</Type><Usage>0</Usage></FieldDefn>
  <Row index="50000000"><F>9</F></Row>
  <Row index="1"><F>2</F></Row>
</GDALRasterAttributeTable>"#;
        let rat = AttributeTable::from_xml(&crate::tree::parse_xml(text).unwrap());
        assert_eq!(rat.row_count(), 2);
        assert_eq!(rat.value_as_int(1, 0), 2);
        assert_eq!(rat.value_as_string(0, 0), Some(""));
    }

    #[test]
    fn usage_codes_are_stable() {
        assert_eq!(FieldUsage::AlphaMax.code(), 17);
        assert_eq!(FieldUsage::from_code(8), FieldUsage::Blue);
        assert_eq!(FieldUsage::from_code(99), FieldUsage::Generic);
        assert_eq!(FieldType::from_code(2), FieldType::String);
    }
}
