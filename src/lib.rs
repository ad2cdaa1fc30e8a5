//! bandpam – Persistent Auxiliary Metadata (PAM) for raster bands
//!
//! A band without a native place for side information (nodata value,
//! scale/offset, color table, category names, attribute table, statistics,
//! histograms) keeps it in a lazily created [`PamRecord`] and persists it
//! through a description tree ([`XmlNode`]).
//!
//! # Beispiel
//!
//! ```
//! use bandpam::{DataType, PamRasterBand, SimpleBand};
//!
//! let mut band = PamRasterBand::new(SimpleBand::new(1, DataType::Float32));
//! band.pam_initialize_standalone();
//! band.set_no_data_value(-9999.0).unwrap();
//! band.set_offset(10.0).unwrap();
//!
//! let tree = band.serialize_to_xml().unwrap();
//! let text = tree.to_xml_string().unwrap();
//! assert!(text.contains("<NoDataValue>-9.99900000000000E+03</NoDataValue>"));
//!
//! let mut restored = PamRasterBand::new(SimpleBand::new(1, DataType::Float32));
//! restored.pam_initialize_standalone();
//! restored.xml_init(&bandpam::tree::parse_xml(&text).unwrap()).unwrap();
//! assert_eq!(restored.no_data_value(), Some(-9999.0));
//! ```

pub mod band;
pub mod base;
pub mod clone;
pub mod codec;
pub mod color_table;
pub mod container;
pub mod error;
pub mod histogram;
pub mod metadata;
pub mod numeric;
pub mod options;
pub mod rat;
pub mod record;
pub mod tree;
pub mod value;

pub use error::{Error, Result};

/// HashMap mit ahash fuer interne Tabellen.
pub(crate) type FastHashMap<K, V> = hashbrown::HashMap<K, V, ahash::RandomState>;

/// IndexMap mit ahash, Iteration in Einfuegereihenfolge.
pub(crate) type FastIndexMap<K, V> = indexmap::IndexMap<K, V, ahash::RandomState>;

// Public API: Band und Lebenszyklus
pub use band::{BandInfo, PamRasterBand, PamState};
pub use base::{Diagnostics, RasterBandBase, SimpleBand};
pub use container::{PamContainer, PamDataset, ParentLink};
pub use record::PamRecord;

// Public API: Werte
pub use color_table::{ColorEntry, ColorTable};
pub use metadata::MetadataDomains;
pub use rat::{AttributeTable, FieldType, FieldUsage};
pub use value::{ColorInterp, DataType, NoData};

// Public API: Histogramme, Codec, Clone
pub use clone::CloneFlags;
pub use codec::{decode_no_data, encode_no_data};
pub use histogram::{HistogramEntry, HistogramRequest, SavedHistograms};
pub use options::PamOptions;
pub use tree::{NodeKind, XmlNode};
