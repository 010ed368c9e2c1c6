//! Error types for PowerSeq

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using PowerSeq Error
pub type Result<T> = std::result::Result<T, Error>;

/// PowerSeq error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Entry form parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Unknown test kind: {0}")]
    UnknownTestKind(String),

    #[error("Test {test} uses preset picture role '{role}' with no operator binding")]
    UnresolvedRole { test: String, role: String },

    #[error("Error in {}\n\n\"{field}\" cannot be blank.", form.display())]
    MissingField { form: PathBuf, field: String },

    #[error("Invalid entry form: {0}")]
    InvalidEntryForm(String),

    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),

    #[error("Invalid special command annotation: {0}")]
    InvalidAnnotation(String),

    #[error("Permission denied writing {}", .0.display())]
    PermissionDenied(PathBuf),
}

impl Error {
    /// Whether the operator can fix the cause and retry the same step.
    ///
    /// Blank entry form fields and files held open by another program are
    /// recoverable; catalog mismatches and everything else are fatal.
    pub fn is_operator_recoverable(&self) -> bool {
        matches!(self, Error::MissingField { .. } | Error::PermissionDenied(_))
    }

    /// Attach the destination path to permission failures from a write.
    pub(crate) fn from_write(err: std::io::Error, path: &std::path::Path) -> Self {
        if err.kind() == std::io::ErrorKind::PermissionDenied {
            Error::PermissionDenied(path.to_path_buf())
        } else {
            Error::Io(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_display() {
        let err = Error::MissingField {
            form: PathBuf::from("data/entry-forms.toml"),
            field: "Default SDR PPS".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Error in data/entry-forms.toml\n\n\"Default SDR PPS\" cannot be blank."
        );
        assert!(err.is_operator_recoverable());
    }

    #[test]
    fn test_catalog_errors_are_fatal() {
        assert!(!Error::UnknownTestKind("pps99".to_string()).is_operator_recoverable());
        let err = Error::UnresolvedRole {
            test: "hdr10".to_string(),
            role: "hdr10_default".to_string(),
        };
        assert!(!err.is_operator_recoverable());
    }

    #[test]
    fn test_from_write_maps_permission_denied() {
        let path = std::path::Path::new("out/test-sequence.csv");
        let denied = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "locked");
        let err = Error::from_write(denied, path);
        assert!(matches!(err, Error::PermissionDenied(ref p) if p == path));
        assert!(err.is_operator_recoverable());

        let other = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert!(matches!(Error::from_write(other, path), Error::Io(_)));
    }
}
