//! Round-Trip-Tests: Band -> PAMRasterBand-Baum -> Text -> Baum -> Band.
//!
//! Prueft die Sparse-Kodierung, die exakte Rekonstruktion von Nodata ueber
//! `le_hex_equiv` und die Wohlgeformtheit des erzeugten Textes gegen einen
//! unabhaengigen Parser (roxmltree).

use bandpam::tree::parse_xml;
use bandpam::{
    AttributeTable, ColorEntry, ColorInterp, ColorTable, DataType, FieldType, FieldUsage,
    HistogramEntry, PamRasterBand, SimpleBand,
};
use proptest::prelude::*;

// ============================================================================
// Hilfsfunktionen
// ============================================================================

fn standalone(band: usize, dt: DataType) -> PamRasterBand<SimpleBand> {
    let mut b = PamRasterBand::new(SimpleBand::new(band, dt));
    b.pam_initialize_standalone();
    b
}

/// Serialisiert, schreibt als Text, parst zurueck und laedt in ein frisches Band.
fn round_trip(src: &PamRasterBand<SimpleBand>) -> (String, PamRasterBand<SimpleBand>) {
    let tree = src.serialize_to_xml().expect("band has content");
    let text = tree.to_xml_string().expect("write");
    let parsed = parse_xml(&text).expect("reparse");
    let mut dst = standalone(src.band_number(), src.data_type());
    dst.xml_init(&parsed).expect("xml_init");
    (text, dst)
}

// ============================================================================
// Nodata
// ============================================================================

#[test]
fn uint64_nodata_above_i32_range() {
    let mut src = standalone(1, DataType::UInt64);
    src.set_no_data_value_as_uint64(4_294_967_295).unwrap();
    let (text, dst) = round_trip(&src);

    assert!(text.contains("<NoDataValue>4294967295</NoDataValue>"), "{text}");
    assert!(!text.contains("le_hex_equiv"));
    assert_eq!(dst.no_data_value_as_uint64(), Ok(Some(4_294_967_295)));
}

#[test]
fn int64_nodata_extremes() {
    let mut src = standalone(1, DataType::Int64);
    src.set_no_data_value_as_int64(i64::MIN).unwrap();
    let (_, dst) = round_trip(&src);
    assert_eq!(dst.no_data_value_as_int64(), Ok(Some(i64::MIN)));
}

#[test]
fn fractional_nodata_carries_hex() {
    let mut src = standalone(2, DataType::Float32);
    src.set_no_data_value(0.1).unwrap();
    let (text, dst) = round_trip(&src);

    assert!(text.contains(r#"le_hex_equiv="9a9999999999b93f""#), "{text}");
    assert_eq!(dst.no_data_value(), Some(0.1));
}

#[test]
fn nan_nodata_round_trips() {
    let mut src = standalone(1, DataType::Float64);
    src.set_no_data_value(f64::NAN).unwrap();
    let (text, dst) = round_trip(&src);

    assert!(text.contains(">nan</NoDataValue>"), "{text}");
    assert!(dst.no_data_value().is_some_and(f64::is_nan));
}

proptest! {
    #[test]
    fn real_nodata_is_bit_exact(v in any::<f64>()) {
        let mut src = standalone(1, DataType::Float64);
        src.set_no_data_value(v).unwrap();
        let (_, dst) = round_trip(&src);
        let back = dst.no_data_value().unwrap();
        // -0.0 darf als 0.0 zurueckkommen, alles andere bitgenau
        prop_assert!(back.to_bits() == v.to_bits() || back == v, "{v:e} -> {back:e}");
    }

    #[test]
    fn int64_nodata_exact(v in any::<i64>()) {
        let mut src = standalone(1, DataType::Int64);
        src.set_no_data_value_as_int64(v).unwrap();
        let (_, dst) = round_trip(&src);
        prop_assert_eq!(dst.no_data_value_as_int64(), Ok(Some(v)));
    }
}

// ============================================================================
// Vollstaendiger Datensatz
// ============================================================================

fn populated() -> PamRasterBand<SimpleBand> {
    let mut b = standalone(3, DataType::Byte);
    b.set_description("Land cover <2024>");
    b.set_metadata_item("SOURCE", Some("survey & model"), "");
    b.set_metadata_item("SENSOR", Some("L8"), "IMAGERY");
    b.set_no_data_value(0.0).unwrap();
    b.set_offset(-10.0).unwrap();
    b.set_scale(0.25).unwrap();
    b.set_unit_type("m").unwrap();

    let names = ["".to_string(), "water".to_string(), "forest".to_string()];
    b.set_category_names(Some(names.as_slice())).unwrap();

    let ct = ColorTable::from_entries(vec![
        ColorEntry::rgba(0, 0, 0, 0),
        ColorEntry::rgb(0, 0, 255),
        ColorEntry::rgb(0, 128, 0),
    ]);
    b.set_color_table(Some(&ct)).unwrap();

    let mut rat = AttributeTable::new();
    rat.create_column("Value", FieldType::Integer, FieldUsage::MinMax);
    rat.create_column("Name", FieldType::String, FieldUsage::Name);
    rat.set_row_count(2);
    rat.set_value_int(0, 0, 1);
    rat.set_value(0, 1, "water");
    rat.set_value_int(1, 0, 2);
    rat.set_value(1, 1, "forest");
    b.set_default_rat(Some(&rat)).unwrap();

    b.set_min_max(0.0, 2.0).unwrap();
    b.set_statistics(1.25, 0.5).unwrap();
    b.set_default_histogram(&HistogramEntry::new(-0.5, 2.5, vec![10, 20, 30])).unwrap();
    b
}

#[test]
fn full_record_round_trips() {
    let src = populated();
    let (_, dst) = round_trip(&src);

    assert_eq!(dst.description(), "Land cover <2024>");
    assert_eq!(dst.metadata_item("SOURCE", ""), Some("survey & model"));
    assert_eq!(dst.metadata_item("SENSOR", "IMAGERY"), Some("L8"));
    assert_eq!(dst.no_data_value(), Some(0.0));
    assert_eq!(dst.offset(), (-10.0, true));
    assert_eq!(dst.scale(), (0.25, true));
    assert_eq!(dst.unit_type(), "m");
    assert_eq!(dst.color_interpretation(), ColorInterp::Palette);
    assert_eq!(dst.category_names(), src.category_names());
    assert_eq!(dst.color_table(), src.color_table());
    assert_eq!(dst.default_rat(), src.default_rat());
    assert_eq!(dst.min_max(), Some((0.0, 2.0)));
    assert_eq!(dst.statistics(), Some((1.25, 0.5)));

    let mut dst = dst;
    let hist = dst.default_histogram(false).unwrap().unwrap();
    assert_eq!(hist.counts, vec![10, 20, 30]);
    assert!(hist.include_out_of_range);
}

#[test]
fn output_is_well_formed_xml() {
    let text = populated().serialize_to_xml().unwrap().to_xml_string().unwrap();
    let doc = roxmltree::Document::parse(&text).expect("well-formed");
    let root = doc.root_element();

    assert_eq!(root.tag_name().name(), "PAMRasterBand");
    assert_eq!(root.attribute("band"), Some("3"));
    let desc = root.children().find(|n| n.has_tag_name("Description")).unwrap();
    assert_eq!(desc.text(), Some("Land cover <2024>"));
    let entries = root
        .descendants()
        .filter(|n| n.has_tag_name("Entry"))
        .count();
    assert_eq!(entries, 3);
}

#[test]
fn whitespace_values_survive_text_round_trip() {
    let mut src = standalone(1, DataType::Byte);
    src.set_description(" ");
    let names = ["  ".to_string(), "a".to_string(), "\t".to_string()];
    src.set_category_names(Some(names.as_slice())).unwrap();
    let (_, dst) = round_trip(&src);

    assert_eq!(dst.description(), " ");
    assert_eq!(dst.category_names(), Some(names.to_vec()));
}

#[test]
fn second_round_trip_is_stable() {
    let (first, dst) = round_trip(&populated());
    let (second, _) = round_trip(&dst);
    assert_eq!(first, second);
}

// ============================================================================
// Sparse-Kodierung
// ============================================================================

#[test]
fn default_record_produces_no_tree() {
    let b = standalone(1, DataType::Float32);
    assert!(b.serialize_to_xml().is_none());
}

#[test]
fn band_zero_has_no_band_attribute() {
    let mut b = standalone(0, DataType::Float32);
    b.set_unit_type("K").unwrap();
    let text = b.serialize_to_xml().unwrap().to_xml_string().unwrap();
    assert!(!text.contains("band="));
    assert!(text.contains("<UnitType>K</UnitType>"));
}

#[test]
fn explicit_default_scale_is_not_written() {
    let mut b = standalone(1, DataType::Float32);
    b.set_scale(1.0).unwrap();
    b.set_offset(0.0).unwrap();
    assert!(b.serialize_to_xml().is_none());
}

#[test]
fn unknown_color_interp_name_reads_as_undefined() {
    let text = "<PAMRasterBand><ColorInterp>Chartreuse</ColorInterp></PAMRasterBand>";
    let tree = parse_xml(text).unwrap();
    let mut b = standalone(1, DataType::Byte);
    b.xml_init(&tree).unwrap();
    assert_eq!(b.color_interpretation(), ColorInterp::Undefined);
}

#[test]
fn handwritten_document_loads() {
    let text = r#"<PAMRasterBand band="1">
  <NoDataValue le_hex_equiv="000000000000F03F">123</NoDataValue>
  <Offset>5</Offset>
  <CategoryNames>
    <Category>a</Category>
    <Category />
  </CategoryNames>
  <ColorTable>
    <Entry c1="1" c2="2" c3="3" />
  </ColorTable>
  <Minimum>1</Minimum>
</PAMRasterBand>"#;
    let mut b = standalone(1, DataType::Int16);
    b.xml_init(&parse_xml(text).unwrap()).unwrap();

    assert_eq!(b.no_data_value(), Some(1.0));
    assert_eq!(b.offset(), (5.0, true));
    assert_eq!(b.scale(), (1.0, true));
    assert_eq!(b.category_names(), Some(vec!["a".to_string(), String::new()]));
    assert_eq!(b.color_table().unwrap().entry(0), Some(&ColorEntry::rgba(1, 2, 3, 255)));
    assert_eq!(b.min_max(), None);
}

#[test]
fn attribute_table_row_index_beyond_row_count_is_skipped() {
    let text = r#"<PAMRasterBand>
  <GDALRasterAttributeTable>
    <FieldDefn index="0">
      <Name>Value</Name>
      <Type>0</Type>
      <Usage>0</Usage>
    </FieldDefn>
    <Row index="2147483647">
      <F>7</F>
    </Row>
    <Row index="0">
      <F>1</F>
    </Row>
  </GDALRasterAttributeTable>
</PAMRasterBand>"#;
    let mut b = standalone(1, DataType::Byte);
    b.xml_init(&parse_xml(text).unwrap()).unwrap();

    let rat = b.default_rat().unwrap();
    assert_eq!(rat.row_count(), 1);
    assert_eq!(rat.value_as_int(0, 0), 1);
}
