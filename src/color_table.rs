//! RGB(A) palette assigned to a band.

/// One palette entry; channels are usually in `0..=255`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ColorEntry {
    pub c1: i16,
    pub c2: i16,
    pub c3: i16,
    pub c4: i16,
}

impl ColorEntry {
    /// Opaque RGB entry (`c4 = 255`).
    pub fn rgb(r: i16, g: i16, b: i16) -> Self {
        Self { c1: r, c2: g, c3: b, c4: 255 }
    }

    pub fn rgba(r: i16, g: i16, b: i16, a: i16) -> Self {
        Self { c1: r, c2: g, c3: b, c4: a }
    }
}

/// Ordered palette.
///
/// ```
/// use bandpam::{ColorEntry, ColorTable};
///
/// let mut ct = ColorTable::new();
/// ct.set_entry(2, ColorEntry::rgb(255, 0, 0));
/// assert_eq!(ct.len(), 3);
/// assert_eq!(ct.entry(0), Some(&ColorEntry::default()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ColorTable {
    entries: Vec<ColorEntry>,
}

impl ColorTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<ColorEntry>) -> Self {
        Self { entries }
    }

    /// Sets entry `index`, growing the table with zeroed entries as needed.
    pub fn set_entry(&mut self, index: usize, entry: ColorEntry) {
        if index >= self.entries.len() {
            self.entries.resize(index + 1, ColorEntry::default());
        }
        self.entries[index] = entry;
    }

    pub fn entry(&self, index: usize) -> Option<&ColorEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ColorEntry] {
        &self.entries
    }
}
