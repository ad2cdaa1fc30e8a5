//! Kopierregeln von `clone_info`: Kategorien, "nur wenn fehlend" und
//! Verhalten gegenueber Zielen ohne PAM-Unterstuetzung.

use bandpam::tree::parse_xml;
use bandpam::{
    CloneFlags, ColorInterp, DataType, PamDataset, PamOptions, PamRasterBand, SimpleBand,
};
use std::rc::Rc;

fn standalone(dt: DataType) -> PamRasterBand<SimpleBand> {
    let mut b = PamRasterBand::new(SimpleBand::new(1, dt));
    b.pam_initialize_standalone();
    b
}

fn source() -> PamRasterBand<SimpleBand> {
    let text = r#"<PAMRasterBand band="1">
  <Description>temperature</Description>
  <NoDataValue>-9.99900000000000E+03</NoDataValue>
  <UnitType>K</UnitType>
  <Offset>273.15</Offset>
  <Scale>0.01</Scale>
  <ColorInterp>Gray</ColorInterp>
  <Metadata>
    <MDI key="SOURCE">model</MDI>
    <MDI key="RUN">12</MDI>
  </Metadata>
</PAMRasterBand>"#;
    let mut b = standalone(DataType::Int16);
    b.xml_init(&parse_xml(text).unwrap()).unwrap();
    b
}

#[test]
fn selected_categories_only() {
    let src = source();
    let mut dst = standalone(DataType::Int16);
    dst.clone_info(&src, CloneFlags::SCALE_OFFSET | CloneFlags::UNIT_TYPE).unwrap();

    assert_eq!(dst.offset(), (273.15, true));
    assert_eq!(dst.scale(), (0.01, true));
    assert_eq!(dst.unit_type(), "K");
    assert_eq!(dst.description(), "");
    assert_eq!(dst.no_data_value(), None);
    assert_eq!(dst.color_interpretation(), ColorInterp::Undefined);
}

#[test]
fn only_if_missing_overwrites_differing_scalars() {
    let src = source();
    let mut dst = standalone(DataType::Int16);
    dst.set_no_data_value(0.0).unwrap();
    dst.set_unit_type("k").unwrap();
    dst.set_description("mine");

    dst.clone_info(&src, CloneFlags::default() | CloneFlags::ONLY_IF_MISSING).unwrap();

    // abweichender Wert wird ersetzt
    assert_eq!(dst.no_data_value(), Some(-9999.0));
    // Einheiten vergleichen ohne Gross-/Kleinschreibung
    assert_eq!(dst.unit_type(), "k");
    // Beschreibung nur wenn leer
    assert_eq!(dst.description(), "mine");
    assert_eq!(dst.color_interpretation(), ColorInterp::Gray);
}

#[test]
fn only_if_missing_metadata_compares_counts() {
    let src = source();
    let mut dst = standalone(DataType::Int16);
    dst.set_metadata(&[("A", "1"), ("B", "2")], "");
    dst.clone_info(&src, CloneFlags::BAND_METADATA | CloneFlags::ONLY_IF_MISSING).unwrap();
    assert_eq!(dst.metadata_item("A", ""), Some("1"));
    assert_eq!(dst.metadata_item("SOURCE", ""), None);

    dst.clone_info(&src, CloneFlags::BAND_METADATA).unwrap();
    assert_eq!(dst.metadata_item("A", ""), None);
    assert_eq!(dst.metadata_item("SOURCE", ""), Some("model"));
}

#[test]
fn identical_destination_stays_clean() {
    let src = source();
    let ds = Rc::new(PamDataset::new(PamOptions::default()));
    let mut dst = PamRasterBand::new(SimpleBand::new(1, DataType::Int16));
    dst.attach_container(&ds);
    dst.clone_info(&src, CloneFlags::default()).unwrap();
    assert!(ds.is_dirty());

    ds.clear_dirty();
    let flags = CloneFlags::NODATA
        | CloneFlags::SCALE_OFFSET
        | CloneFlags::UNIT_TYPE
        | CloneFlags::COLOR_INTERP
        | CloneFlags::ONLY_IF_MISSING;
    dst.clone_info(&src, flags).unwrap();
    assert!(!ds.is_dirty());
}

#[test]
fn clone_then_serialize_matches_source() {
    let src = source();
    let mut dst = standalone(DataType::Int16);
    dst.clone_info(&src, CloneFlags::default()).unwrap();
    let a = src.serialize_to_xml().unwrap().to_xml_string().unwrap();
    let b = dst.serialize_to_xml().unwrap().to_xml_string().unwrap();
    assert_eq!(a, b);
}

#[test]
fn int64_source_copies_integer_nodata() {
    let mut src = standalone(DataType::Int64);
    src.set_no_data_value_as_int64(-(1 << 60)).unwrap();
    let mut dst = standalone(DataType::Int64);
    dst.clone_info(&src, CloneFlags::NODATA).unwrap();
    assert_eq!(dst.no_data_value_as_int64(), Ok(Some(-(1 << 60))));
}
