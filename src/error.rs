//! Central error types for the PAM subsystem.
//!
//! The variants follow the failure taxonomy of the subsystem: unsupported
//! base-band operations, usage errors, malformed persisted values, and
//! failures of the enclosing container.

use core::fmt;
use std::borrow::Cow;

/// All errors reported by this crate.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// The base band has no implementation for the operation.
    ///
    /// Reported when no PAM record backs the band and the fallback
    /// implementation does not support the requested setter or computation.
    NotSupported {
        /// Name of the operation (e.g. `SetNoDataValue`).
        operation: Cow<'static, str>,
    },
    /// A typed nodata accessor was called that does not match the declared
    /// element type of the band.
    DataTypeMismatch {
        /// The accessor that was called.
        accessor: &'static str,
        /// The accessor that should be called instead.
        expected: &'static str,
    },
    /// No PAM record could be attached to the band.
    NoPamRecord,
    /// A persisted value could not be parsed into a valid value.
    MalformedValue {
        /// Element or attribute the value was read from.
        field: Cow<'static, str>,
        /// Why the value was rejected.
        reason: String,
    },
    /// A histogram bucket count is not positive or would overflow the
    /// encoding buffer sizing.
    InvalidBucketCount(i64),
    /// The `HistCounts` text is too short for the declared `BucketCount`.
    HistogramCountsMismatch {
        /// Declared bucket count.
        bucket_count: usize,
        /// Length of the `|`-delimited counts text in bytes.
        text_len: usize,
    },
    /// A computed histogram does not have the requested number of buckets.
    HistogramLengthMismatch { expected: usize, found: usize },
    /// The enclosing container could not materialize its PAM state.
    ContainerInit(String),
    /// Parsing description text into a tree failed.
    XmlParseError(String),
    /// Writing description text failed.
    IoError(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotSupported { operation } => {
                write!(f, "{operation}() not supported for this band")
            }
            Self::DataTypeMismatch { accessor, expected } => {
                write!(f, "{accessor}() called on a band of another data type, {expected}() should be called instead")
            }
            Self::NoPamRecord => write!(f, "no PAM record could be attached to the band"),
            Self::MalformedValue { field, reason } => {
                write!(f, "malformed value for '{field}': {reason}")
            }
            Self::InvalidBucketCount(n) => write!(f, "invalid histogram bucket count {n}"),
            Self::HistogramCountsMismatch { bucket_count, text_len } => write!(
                f,
                "HistCounts content ({text_len} bytes) isn't consistent with BucketCount value {bucket_count}"
            ),
            Self::HistogramLengthMismatch { expected, found } => {
                write!(f, "histogram has {found} buckets, expected {expected}")
            }
            Self::ContainerInit(msg) => write!(f, "container PAM initialization failed: {msg}"),
            Self::XmlParseError(msg) => write!(f, "XML parse error: {msg}"),
            Self::IoError(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    /// Erstellt einen `NotSupported` Fehler fuer eine Operation.
    pub fn not_supported(operation: impl Into<Cow<'static, str>>) -> Self {
        Self::NotSupported {
            operation: operation.into(),
        }
    }

    /// Erstellt einen `MalformedValue` Fehler mit Feldname und Grund.
    pub fn malformed(field: impl Into<Cow<'static, str>>, reason: impl Into<String>) -> Self {
        Self::MalformedValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// True for errors raised by a base band that lacks the operation.
    pub fn is_not_supported(&self) -> bool {
        matches!(self, Self::NotSupported { .. })
    }
}

/// A convenience `Result` type alias using [`Error`].
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_supported_display() {
        let e = Error::not_supported("SetOffset");
        let msg = e.to_string();
        assert!(msg.contains("SetOffset"), "{msg}");
        assert!(msg.contains("not supported"), "{msg}");
        assert!(e.is_not_supported());
    }

    #[test]
    fn data_type_mismatch_display() {
        let e = Error::DataTypeMismatch {
            accessor: "GetNoDataValueAsInt64",
            expected: "GetNoDataValueAsUInt64",
        };
        let msg = e.to_string();
        assert!(msg.contains("GetNoDataValueAsInt64"), "{msg}");
        assert!(msg.contains("GetNoDataValueAsUInt64"), "{msg}");
        assert!(!e.is_not_supported());
    }

    #[test]
    fn malformed_value_display() {
        let e = Error::malformed("NoDataValue.le_hex_equiv", "expected 8 bytes, got 3");
        let msg = e.to_string();
        assert!(msg.contains("le_hex_equiv"), "{msg}");
        assert!(msg.contains("8 bytes"), "{msg}");
    }

    #[test]
    fn histogram_counts_mismatch_display() {
        let e = Error::HistogramCountsMismatch {
            bucket_count: 256,
            text_len: 3,
        };
        let msg = e.to_string();
        assert!(msg.contains("HistCounts"), "{msg}");
        assert!(msg.contains("256"), "{msg}");
    }

    #[test]
    fn invalid_bucket_count_display() {
        let msg = Error::InvalidBucketCount(-4).to_string();
        assert!(msg.contains("-4"), "{msg}");
    }

    #[test]
    fn container_init_display() {
        let msg = Error::ContainerInit("out of memory".into()).to_string();
        assert!(msg.contains("container"), "{msg}");
        assert!(msg.contains("out of memory"), "{msg}");
    }

    #[test]
    fn error_implements_std_error() {
        let e: Box<dyn std::error::Error> = Box::new(Error::NoPamRecord);
        assert!(!e.to_string().is_empty());
    }

    #[test]
    fn error_is_clone_and_eq() {
        let e1 = Error::InvalidBucketCount(0);
        let e2 = e1.clone();
        assert_eq!(e1, e2);
    }
}
