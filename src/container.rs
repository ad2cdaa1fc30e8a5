//! Enclosing containers of PAM bands.
//!
//! A band links to its container through a non-owning [`ParentLink`]; the
//! container owns persistence and consumes the dirty signal. Bands never
//! keep their container alive.

use core::fmt;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::options::PamOptions;
use crate::record::PamRecord;
use crate::tree::XmlNode;
use crate::{Error, FastHashMap, Result};

/// Capabilities a band needs from its enclosing container.
pub trait PamContainer {
    /// Whether the container participates in PAM at all.
    fn is_pam_capable(&self) -> bool;

    /// Materializes the container's own PAM state.
    fn initialize_pam(&self) -> Result<()>;

    /// Whether the container's PAM state exists.
    fn has_pam_state(&self) -> bool;

    /// Notification that persisted state is stale.
    fn mark_pam_dirty(&self);

    /// Hands over a record the container built for `band` while
    /// initializing its own state.
    fn take_staged_record(&self, _band: usize) -> Option<PamRecord> {
        None
    }
}

/// Non-owning handle from a record to its container.
#[derive(Clone)]
pub struct ParentLink(Weak<dyn PamContainer>);

impl ParentLink {
    pub fn new<C: PamContainer + 'static>(container: &Rc<C>) -> Self {
        let weak = Rc::downgrade(container);
        let weak: Weak<dyn PamContainer> = weak;
        Self(weak)
    }

    pub fn from_weak(weak: Weak<dyn PamContainer>) -> Self {
        Self(weak)
    }

    pub fn upgrade(&self) -> Option<Rc<dyn PamContainer>> {
        self.0.upgrade()
    }

    /// Forwards the dirty signal; no-op once the container is gone.
    pub fn mark_dirty(&self) {
        if let Some(container) = self.0.upgrade() {
            container.mark_pam_dirty();
        }
    }
}

impl fmt::Debug for ParentLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParentLink")
            .field("alive", &(self.0.strong_count() > 0))
            .finish()
    }
}

/// A dataset-level container with PAM state.
///
/// Bands `1..=band_count` get a record staged when the container
/// initializes; additional records can be staged explicitly, e.g. by a
/// loader that has already decoded persisted state.
///
/// ```
/// use std::rc::Rc;
/// use bandpam::{DataType, PamDataset, PamOptions, PamRasterBand, PamState, SimpleBand};
///
/// let ds = Rc::new(PamDataset::new(PamOptions::default()));
/// let mut band = PamRasterBand::new(SimpleBand::new(1, DataType::Byte));
/// band.attach_container(&ds);
/// band.set_offset(1.5).unwrap();
///
/// assert_eq!(band.pam_state(), PamState::Attached);
/// assert!(ds.is_dirty());
/// ```
#[derive(Debug, Default)]
pub struct PamDataset {
    options: PamOptions,
    band_count: usize,
    initialized: Cell<bool>,
    dirty: Cell<bool>,
    staged: RefCell<FastHashMap<usize, PamRecord>>,
}

impl PamDataset {
    pub fn new(options: PamOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Number of bands whose records are built eagerly on initialization.
    pub fn with_band_count(mut self, band_count: usize) -> Self {
        self.band_count = band_count;
        self
    }

    pub fn options(&self) -> &PamOptions {
        &self.options
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    pub fn clear_dirty(&self) {
        self.dirty.set(false);
    }

    /// Stages a record to be adopted by `band` on attachment.
    pub fn stage_record(&self, band: usize, record: PamRecord) {
        self.staged.borrow_mut().insert(band, record);
    }

    pub fn has_staged_record(&self, band: usize) -> bool {
        self.staged.borrow().contains_key(&band)
    }

    /// Renders a band's description tree as text with the configured
    /// indentation.
    pub fn render(&self, tree: &XmlNode) -> Result<String> {
        tree.to_xml_string_with_indent(self.options.indent())
    }
}

impl PamContainer for PamDataset {
    fn is_pam_capable(&self) -> bool {
        self.options.enabled()
    }

    fn initialize_pam(&self) -> Result<()> {
        if !self.options.enabled() {
            return Err(Error::ContainerInit("PAM is disabled for this container".into()));
        }
        if self.initialized.replace(true) {
            return Ok(());
        }
        log::debug!("[pam] container initialized, staging {} band records", self.band_count);
        let mut staged = self.staged.borrow_mut();
        for band in 1..=self.band_count {
            staged.entry(band).or_insert_with(PamRecord::standalone);
        }
        Ok(())
    }

    fn has_pam_state(&self) -> bool {
        self.initialized.get()
    }

    fn mark_pam_dirty(&self) {
        self.dirty.set(true);
    }

    fn take_staged_record(&self, band: usize) -> Option<PamRecord> {
        self.staged.borrow_mut().remove(&band)
    }
}
