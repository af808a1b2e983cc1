//! Structural validation of b3dm headers and containers.
//!
//! Issues are returned as data in a fixed check order. An empty list only
//! means the container framing is sound; the payload is not examined.

use std::fmt;

use super::container::Container;
use super::format::*;
use super::header::Header;

/// Settings for [`validate_container`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationConfig {
    /// Versions accepted without an [`ValidationIssue::UnsupportedVersion`].
    pub supported_versions: Vec<u32>,
    /// Required multiple for JSON segment lengths. Zero disables the check.
    pub alignment: u32,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            supported_versions: vec![CURRENT_VERSION],
            alignment: SEGMENT_ALIGNMENT as u32,
        }
    }
}

/// A structural defect in an otherwise readable container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationIssue {
    UnsupportedVersion { version: u32 },
    UnalignedFeatureTable { byte_length: u32 },
    UnalignedBatchTable { byte_length: u32 },
    /// Binary table bodies are not supported by this crate.
    BinaryFeatureTable { byte_length: u32 },
    BinaryBatchTable { byte_length: u32 },
    ByteLengthMismatch { declared: u32, actual: u64 },
}

impl ValidationIssue {
    /// Stable short name, used for display and filtering.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnsupportedVersion { .. } => "UnsupportedVersion",
            Self::UnalignedFeatureTable { .. } => "UnalignedFeatureTable",
            Self::UnalignedBatchTable { .. } => "UnalignedBatchTable",
            Self::BinaryFeatureTable { .. } => "BinaryFeatureTable",
            Self::BinaryBatchTable { .. } => "BinaryBatchTable",
            Self::ByteLengthMismatch { .. } => "ByteLengthMismatch",
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::UnsupportedVersion { version } => {
                write!(f, "{}: version {} is not supported", self.kind(), version)
            }
            Self::UnalignedFeatureTable { byte_length } | Self::UnalignedBatchTable { byte_length } => {
                write!(
                    f,
                    "{}: JSON length {} is not a multiple of {}",
                    self.kind(),
                    byte_length,
                    SEGMENT_ALIGNMENT
                )
            }
            Self::BinaryFeatureTable { byte_length } | Self::BinaryBatchTable { byte_length } => {
                write!(f, "{}: {} byte binary body ignored", self.kind(), byte_length)
            }
            Self::ByteLengthMismatch { declared, actual } => {
                write!(f, "{}: header declares {} bytes, content is {}", self.kind(), declared, actual)
            }
        }
    }
}

/// Check JSON segment alignment on a header.
pub fn validate(header: &Header) -> Vec<ValidationIssue> {
    alignment_issues(header, SEGMENT_ALIGNMENT as u32)
}

fn alignment_issues(header: &Header, alignment: u32) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    if !is_aligned(header.feature_table_json_byte_length, alignment) {
        issues.push(ValidationIssue::UnalignedFeatureTable {
            byte_length: header.feature_table_json_byte_length,
        });
    }
    if !is_aligned(header.batch_table_json_byte_length, alignment) {
        issues.push(ValidationIssue::UnalignedBatchTable {
            byte_length: header.batch_table_json_byte_length,
        });
    }
    issues
}

/// Run every structural check against a parsed container.
pub fn validate_container(container: &Container, config: &ValidationConfig) -> Vec<ValidationIssue> {
    let header = container.header();
    let mut issues = Vec::new();

    if !config.supported_versions.contains(&header.version) {
        issues.push(ValidationIssue::UnsupportedVersion { version: header.version });
    }

    issues.extend(alignment_issues(header, config.alignment));

    if header.feature_table_binary_byte_length != 0 {
        issues.push(ValidationIssue::BinaryFeatureTable {
            byte_length: header.feature_table_binary_byte_length,
        });
    }
    if header.batch_table_binary_byte_length != 0 {
        issues.push(ValidationIssue::BinaryBatchTable {
            byte_length: header.batch_table_binary_byte_length,
        });
    }

    let actual = header.expected_byte_length(container.payload().len());
    if header.byte_length as u64 != actual {
        issues.push(ValidationIssue::ByteLengthMismatch {
            declared: header.byte_length,
            actual,
        });
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::read_container;

    #[test]
    fn test_single_unaligned_feature_table() {
        let header = Header {
            feature_table_json_byte_length: 5,
            ..Header::default()
        };
        assert_eq!(
            validate(&header),
            vec![ValidationIssue::UnalignedFeatureTable { byte_length: 5 }]
        );
    }

    #[test]
    fn test_issue_order() {
        let header = Header {
            feature_table_json_byte_length: 3,
            batch_table_json_byte_length: 9,
            ..Header::default()
        };
        let kinds: Vec<_> = validate(&header).iter().map(|i| i.kind()).collect();
        assert_eq!(kinds, ["UnalignedFeatureTable", "UnalignedBatchTable"]);
    }

    #[test]
    fn test_clean_container() {
        let c = Container::new("{\"BATCH_LENGTH\":0}", "", vec![0; 12]).unwrap();
        assert!(validate(c.header()).is_empty());
        assert!(validate_container(&c, &ValidationConfig::default()).is_empty());
    }

    #[test]
    fn test_container_checks() {
        // version 2, unaligned feature JSON, binary batch body, wrong byteLength
        let mut data = b"b3dm".to_vec();
        for v in [2u32, 100, 4, 0, 0, 4] {
            data.extend_from_slice(&v.to_le_bytes());
        }
        data.extend_from_slice(b"{}  ");
        data.extend_from_slice(&[0; 4]);
        data.extend_from_slice(&[0; 64]);
        let c = read_container(data.as_slice()).unwrap();

        let issues = validate_container(&c, &ValidationConfig::default());
        assert_eq!(
            issues,
            vec![
                ValidationIssue::UnsupportedVersion { version: 2 },
                ValidationIssue::UnalignedFeatureTable { byte_length: 4 },
                ValidationIssue::BinaryBatchTable { byte_length: 4 },
            ]
        );
    }

    #[test]
    fn test_byte_length_mismatch() {
        let mut data = b"b3dm".to_vec();
        for v in [1u32, 20, 8, 0, 0, 0] {
            data.extend_from_slice(&v.to_le_bytes());
        }
        data.extend_from_slice(b"{}      ");
        let c = read_container(data.as_slice()).unwrap();

        let issues = validate_container(&c, &ValidationConfig::default());
        assert_eq!(
            issues,
            vec![ValidationIssue::ByteLengthMismatch { declared: 20, actual: 36 }]
        );
        assert!(issues[0].to_string().contains("ByteLengthMismatch"));
    }

    #[test]
    fn test_config_controls_checks() {
        let header = Header { version: 2, ..Header::default() };
        let c = Container::from_parts(header, String::new(), String::new(), Vec::new()).unwrap();
        let config = ValidationConfig { supported_versions: vec![1, 2], alignment: 0 };
        assert!(validate_container(&c, &config).is_empty());
    }
}
