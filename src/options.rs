//! PAM configuration.
//!
//! Controls whether a container participates in PAM at all and how
//! description trees are rendered as text.
//!
//! # Beispiel
//!
//! ```
//! use bandpam::options::PamOptions;
//!
//! let opts = PamOptions::default().with_indent(4);
//! assert!(opts.enabled());
//! assert_eq!(opts.indent(), 4);
//!
//! let off = PamOptions::default().with_enabled(false);
//! assert!(!off.enabled());
//! ```

/// Name of the environment variable consulted by [`PamOptions::from_env`].
pub const PAM_ENABLED_ENV: &str = "GDAL_PAM_ENABLED";

/// Options for PAM containers and the text serializer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PamOptions {
    pub(crate) enabled: bool,
    pub(crate) indent: usize,
}

impl Default for PamOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            indent: 2,
        }
    }
}

impl PamOptions {
    /// Builds options from the process environment.
    ///
    /// `GDAL_PAM_ENABLED` set to `NO`, `OFF`, `FALSE` or `0` disables PAM;
    /// any other value, or an unset variable, leaves it enabled.
    pub fn from_env() -> Self {
        let enabled = std::env::var(PAM_ENABLED_ENV)
            .map(|v| parse_bool_flag(&v))
            .unwrap_or(true);
        Self::default().with_enabled(enabled)
    }

    /// Whether containers built with these options take part in PAM.
    pub fn enabled(&self) -> bool { self.enabled }

    /// Number of spaces per nesting level in serialized text.
    pub fn indent(&self) -> usize { self.indent }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }
}

/// Interpretiert einen Konfigurationswert als Boolean (NO/OFF/FALSE/0 → false).
fn parse_bool_flag(value: &str) -> bool {
    let v = value.trim();
    !(v.eq_ignore_ascii_case("no")
        || v.eq_ignore_ascii_case("off")
        || v.eq_ignore_ascii_case("false")
        || v == "0")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let opts = PamOptions::default();
        assert!(opts.enabled());
        assert_eq!(opts.indent(), 2);
    }

    #[test]
    fn builder_chain() {
        let opts = PamOptions::default().with_enabled(false).with_indent(0);
        assert!(!opts.enabled());
        assert_eq!(opts.indent(), 0);
    }

    #[test]
    fn bool_flag_values() {
        for off in ["NO", "no", "Off", "FALSE", "0", " no "] {
            assert!(!parse_bool_flag(off), "{off}");
        }
        for on in ["YES", "on", "TRUE", "1", "", "whatever"] {
            assert!(parse_bool_flag(on), "{on}");
        }
    }
}
