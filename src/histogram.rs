//! Histogram cache of a band.
//!
//! Saved histograms are kept as an owned `Histograms` subtree of
//! `HistItem` elements, exactly as they are persisted:
//!
//! ```text
//! <Histograms>
//!   <HistItem>
//!     <HistMin>-0.5</HistMin>
//!     <HistMax>255.5</HistMax>
//!     <BucketCount>256</BucketCount>
//!     <IncludeOutOfRange>0</IncludeOutOfRange>
//!     <Approximate>0</Approximate>
//!     <HistCounts>0|12|...</HistCounts>
//!   </HistItem>
//! </Histograms>
//! ```
//!
//! Item order matters: the first `HistItem` is the default histogram of the
//! band.

use crate::band::PamRasterBand;
use crate::base::RasterBandBase;
use crate::error::Error;
use crate::numeric::{are_real_equal, format_general, parse_i32, parse_real, parse_u64};
use crate::record::PamRecord;
use crate::tree::XmlNode;
use crate::Result;

/// Element name of the saved-histograms subtree.
pub const HISTOGRAMS_ELEMENT: &str = "Histograms";
/// Element name of one saved histogram.
pub const HIST_ITEM_ELEMENT: &str = "HistItem";

/// Largest bucket count that can be encoded.
pub const MAX_ENCODED_BUCKETS: usize = ((i32::MAX - 10) / 12) as usize;

/// Signature of a histogram request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramRequest {
    pub min: f64,
    pub max: f64,
    pub bucket_count: usize,
    pub include_out_of_range: bool,
    /// Whether an approximate histogram is acceptable.
    pub approx_ok: bool,
}

impl HistogramRequest {
    /// Exact request without out-of-range folding.
    pub fn new(min: f64, max: f64, bucket_count: usize) -> Self {
        Self {
            min,
            max,
            bucket_count,
            include_out_of_range: false,
            approx_ok: false,
        }
    }

    pub fn with_include_out_of_range(mut self, include: bool) -> Self {
        self.include_out_of_range = include;
        self
    }

    pub fn with_approx_ok(mut self, approx_ok: bool) -> Self {
        self.approx_ok = approx_ok;
        self
    }
}

/// A decoded histogram.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramEntry {
    pub min: f64,
    pub max: f64,
    pub counts: Vec<u64>,
    pub include_out_of_range: bool,
    pub approximate: bool,
}

impl HistogramEntry {
    pub fn new(min: f64, max: f64, counts: Vec<u64>) -> Self {
        Self {
            min,
            max,
            counts,
            include_out_of_range: false,
            approximate: false,
        }
    }

    pub fn bucket_count(&self) -> usize {
        self.counts.len()
    }

    /// Encodes the entry as a `HistItem` element.
    pub fn to_xml(&self) -> Result<XmlNode> {
        histogram_to_xml(
            self.min,
            self.max,
            &self.counts,
            self.include_out_of_range,
            self.approximate,
        )
    }
}

/// Encodes one histogram as a `HistItem` element.
///
/// Fails with [`Error::InvalidBucketCount`] for an empty histogram or one
/// whose counts text could not be sized within 32-bit limits.
pub fn histogram_to_xml(
    min: f64,
    max: f64,
    counts: &[u64],
    include_out_of_range: bool,
    approximate: bool,
) -> Result<XmlNode> {
    let n = counts.len();
    if n == 0 || n > MAX_ENCODED_BUCKETS {
        return Err(Error::InvalidBucketCount(n as i64));
    }

    let mut text = String::with_capacity(n * 4);
    for (i, c) in counts.iter().enumerate() {
        if i > 0 {
            text.push('|');
        }
        text.push_str(&c.to_string());
    }

    let mut item = XmlNode::element(HIST_ITEM_ELEMENT);
    item.set_value("HistMin", format_general(min, 16));
    item.set_value("HistMax", format_general(max, 16));
    item.set_value("BucketCount", n.to_string());
    item.set_value("IncludeOutOfRange", if include_out_of_range { "1" } else { "0" });
    item.set_value("Approximate", if approximate { "1" } else { "0" });
    item.set_value("HistCounts", text);
    Ok(item)
}

/// Decodes a `HistItem` element.
///
/// Missing bounds default to `0` and `1`, a missing bucket count to `2`.
/// The counts text must be at least `2 * BucketCount - 1` bytes long before
/// it is trusted; missing trailing counts read as zero.
pub fn parse_histogram_item(item: &XmlNode) -> Result<HistogramEntry> {
    let min = parse_real(item.value_or("HistMin", "0"));
    let max = parse_real(item.value_or("HistMax", "1"));
    let declared = parse_i32(item.value_or("BucketCount", "2"));
    if declared <= 0 || declared > i32::MAX / 2 {
        return Err(Error::InvalidBucketCount(i64::from(declared)));
    }
    let n = declared as usize;

    let text = item.value_or("HistCounts", "");
    if text.len() < 2 * n - 1 {
        log::error!("[pam] HistCounts content isn't consistent with BucketCount value");
        return Err(Error::HistogramCountsMismatch {
            bucket_count: n,
            text_len: text.len(),
        });
    }

    let counts = text
        .split('|')
        .map(parse_u64)
        .chain(std::iter::repeat(0))
        .take(n)
        .collect();

    Ok(HistogramEntry {
        min,
        max,
        counts,
        include_out_of_range: parse_i32(item.value_or("IncludeOutOfRange", "0")) != 0,
        approximate: parse_i32(item.value_or("Approximate", "0")) != 0,
    })
}

/// Owned `Histograms` subtree of a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedHistograms {
    root: XmlNode,
}

impl Default for SavedHistograms {
    fn default() -> Self {
        Self::new()
    }
}

impl SavedHistograms {
    pub fn new() -> Self {
        Self { root: XmlNode::element(HISTOGRAMS_ELEMENT) }
    }

    /// Takes an independent copy of a persisted `Histograms` subtree.
    pub fn from_xml(node: &XmlNode) -> Self {
        Self { root: node.clone() }
    }

    pub fn as_xml(&self) -> &XmlNode {
        &self.root
    }

    /// `HistItem` elements in order.
    pub fn items(&self) -> impl Iterator<Item = &XmlNode> {
        self.root.elements_named(HIST_ITEM_ELEMENT)
    }

    pub fn len(&self) -> usize {
        self.items().count()
    }

    pub fn is_empty(&self) -> bool {
        self.items().next().is_none()
    }

    /// Child position of the first item matching `req`.
    ///
    /// Bounds compare with tolerance, the bucket count and the
    /// out-of-range flag exactly. A stored approximate item matches only
    /// when the request accepts approximate results.
    pub fn find_matching(&self, req: &HistogramRequest) -> Option<usize> {
        self.root.children().iter().position(|item| {
            item.is_element()
                && item.name().eq_ignore_ascii_case(HIST_ITEM_ELEMENT)
                && item_matches(item, req)
        })
    }

    /// Child at `index` as returned by [`find_matching`](Self::find_matching).
    pub fn get(&self, index: usize) -> Option<&XmlNode> {
        self.root.children().get(index)
    }

    /// The default histogram item: the first `HistItem`.
    pub fn first_item(&self) -> Option<&XmlNode> {
        self.items().next()
    }

    pub fn append(&mut self, item: XmlNode) {
        self.root.add_child(item);
    }

    pub fn prepend(&mut self, item: XmlNode) {
        self.root.insert_child(0, item);
    }

    pub fn remove(&mut self, index: usize) -> Option<XmlNode> {
        self.root.remove_child(index)
    }
}

/// Prueft die Signatur eines gespeicherten HistItem gegen eine Anfrage.
fn item_matches(item: &XmlNode, req: &HistogramRequest) -> bool {
    let min = parse_real(item.value_or("HistMin", "0"));
    let max = parse_real(item.value_or("HistMax", "0"));
    let buckets = i64::from(parse_i32(item.value_or("BucketCount", "0")));
    let include = parse_i32(item.value_or("IncludeOutOfRange", "0")) != 0;
    let approximate = parse_i32(item.value_or("Approximate", "0")) != 0;

    are_real_equal(min, req.min)
        && are_real_equal(max, req.max)
        && usize::try_from(buckets).is_ok_and(|b| b == req.bucket_count)
        && include == req.include_out_of_range
        && (req.approx_ok || !approximate)
}

// ============================================================================
// Band-Operationen
// ============================================================================

impl<B: RasterBandBase> PamRasterBand<B> {
    /// Histogram for `req`, served from the saved histograms when possible.
    ///
    /// A saved item matching the request signature is returned without
    /// touching pixel data. Otherwise the base band computes the histogram
    /// and, if it can be encoded, it is appended to the saved histograms.
    pub fn histogram(&mut self, req: &HistogramRequest) -> Result<Vec<u64>> {
        self.pam_initialize();
        if self.pam.is_none() {
            return self.base.compute_histogram(req);
        }

        if let Some(item) = self
            .pam
            .as_ref()
            .and_then(PamRecord::saved_histograms)
            .and_then(|saved| saved.find_matching(req).and_then(|i| saved.get(i)))
        {
            match parse_histogram_item(item) {
                Ok(entry) => return Ok(entry.counts),
                Err(e) => log::warn!(
                    "[pam] band {}: saved histogram unusable, recomputing: {e}",
                    self.band_number()
                ),
            }
        }

        let counts = self.base.compute_histogram(req)?;
        if counts.len() != req.bucket_count {
            return Err(Error::HistogramLengthMismatch {
                expected: req.bucket_count,
                found: counts.len(),
            });
        }
        self.cache_histogram(req.min, req.max, &counts, req.include_out_of_range, req.approx_ok);
        Ok(counts)
    }

    /// Haengt ein berechnetes Histogramm an; nicht kodierbare werden nur
    /// nicht gespeichert.
    fn cache_histogram(&mut self, min: f64, max: f64, counts: &[u64], include: bool, approx: bool) {
        let Some(pam) = self.pam.as_mut() else {
            return;
        };
        match histogram_to_xml(min, max, counts, include, approx) {
            Ok(item) => {
                pam.mark_dirty();
                pam.saved_histograms.get_or_insert_with(SavedHistograms::new).append(item);
            }
            Err(e) => log::debug!("[pam] histogram not cached: {e}"),
        }
    }

    /// Makes `entry` the band's default histogram.
    ///
    /// An existing item with the same range and bucket count is replaced,
    /// and the new item is placed first. The stored item is always marked
    /// as including out-of-range values and as exact.
    pub fn set_default_histogram(&mut self, entry: &HistogramEntry) -> Result<()> {
        self.pam_initialize();
        let Some(pam) = self.pam.as_mut() else {
            return self.base.set_default_histogram(entry);
        };

        // erst kodieren: ein Fehler laesst den Datensatz unveraendert
        let item = histogram_to_xml(entry.min, entry.max, &entry.counts, true, false)?;
        let req = HistogramRequest::new(entry.min, entry.max, entry.bucket_count())
            .with_include_out_of_range(true)
            .with_approx_ok(true);
        if let Some(saved) = pam.saved_histograms.as_mut()
            && let Some(index) = saved.find_matching(&req)
        {
            saved.remove(index);
        }

        pam.mark_dirty();
        pam.saved_histograms.get_or_insert_with(SavedHistograms::new).prepend(item);
        Ok(())
    }

    /// The band's default histogram: the first saved item.
    ///
    /// Without a usable saved item the base band decides; with `force` it
    /// may compute one, which is then cached like any computed histogram.
    pub fn default_histogram(&mut self, force: bool) -> Result<Option<HistogramEntry>> {
        if let Some(item) = self
            .pam
            .as_ref()
            .and_then(PamRecord::saved_histograms)
            .and_then(SavedHistograms::first_item)
        {
            match parse_histogram_item(item) {
                Ok(entry) => return Ok(Some(entry)),
                Err(e) => log::warn!(
                    "[pam] band {}: default histogram unusable: {e}",
                    self.band_number()
                ),
            }
        }

        let entry = self.base.default_histogram(force)?;
        if let Some(entry) = &entry {
            self.cache_histogram(
                entry.min,
                entry.max,
                &entry.counts,
                entry.include_out_of_range,
                entry.approximate,
            );
        }
        Ok(entry)
    }
}
