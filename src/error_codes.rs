//! Stitcher-specific error codes
//!
//! Error codes follow the pattern: STI-{CATEGORY}-{3-digit number}
//!
//! Categories (1-3 uppercase letters):
//! - URI: Method-URI codec errors
//! - COO: Coordinate parsing errors
//! - DEP: Dependency closure errors
//! - GR: Graph fetch errors
//! - ST: External store errors
//! - RES: Resolver errors
//!
//! Each error code is stable and should not be reused.

/// Malformed method URI
pub const STI_URI_001_MALFORMED: &str = "STI-URI-001";

/// Malformed coordinate string
pub const STI_COO_001_MALFORMED: &str = "STI-COO-001";

/// Dependency coordinate not found under the target forge
pub const STI_DEP_001_NOT_FOUND: &str = "STI-DEP-001";

/// Dependency partial graph fetch failed
pub const STI_DEP_002_FETCH_FAILED: &str = "STI-DEP-002";

/// Focal artifact not found
pub const STI_GR_001_FOCAL_NOT_FOUND: &str = "STI-GR-001";

/// Focal partial graph missing
pub const STI_GR_002_FOCAL_GRAPH_MISSING: &str = "STI-GR-002";

/// External store unavailable
pub const STI_ST_001_UNAVAILABLE: &str = "STI-ST-001";

/// Dynamic invocation site with fail policy
pub const STI_RES_001_DYNAMIC_SITE: &str = "STI-RES-001";

/// Merge cancelled
pub const STI_RES_002_CANCELLED: &str = "STI-RES-002";

/// Map a merge error to its stable code.
pub fn code_for(error: &crate::error::MergeError) -> &'static str {
    use crate::error::MergeError;
    match error {
        MergeError::CoordinateMalformed(_) => STI_COO_001_MALFORMED,
        MergeError::FocalArtifactMissing(_) => STI_GR_001_FOCAL_NOT_FOUND,
        MergeError::FocalGraphMissing(_) => STI_GR_002_FOCAL_GRAPH_MISSING,
        MergeError::DependencyFetchFailed { .. } => STI_DEP_002_FETCH_FAILED,
        MergeError::DynamicSite { .. } => STI_RES_001_DYNAMIC_SITE,
        MergeError::StoreUnavailable(_) => STI_ST_001_UNAVAILABLE,
        MergeError::Cancelled => STI_RES_002_CANCELLED,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Verify all error codes are unique
    #[test]
    fn test_error_codes_are_unique() {
        let codes = vec![
            STI_URI_001_MALFORMED,
            STI_COO_001_MALFORMED,
            STI_DEP_001_NOT_FOUND,
            STI_DEP_002_FETCH_FAILED,
            STI_GR_001_FOCAL_NOT_FOUND,
            STI_GR_002_FOCAL_GRAPH_MISSING,
            STI_ST_001_UNAVAILABLE,
            STI_RES_001_DYNAMIC_SITE,
            STI_RES_002_CANCELLED,
        ];

        let mut unique = std::collections::HashSet::new();
        for code in codes {
            assert!(unique.insert(code), "Duplicate error code detected: {}", code);
        }
    }

    /// Verify error code format
    #[test]
    fn test_error_code_format() {
        let codes = vec![
            STI_URI_001_MALFORMED,
            STI_COO_001_MALFORMED,
            STI_DEP_001_NOT_FOUND,
            STI_DEP_002_FETCH_FAILED,
            STI_GR_001_FOCAL_NOT_FOUND,
            STI_GR_002_FOCAL_GRAPH_MISSING,
            STI_ST_001_UNAVAILABLE,
            STI_RES_001_DYNAMIC_SITE,
            STI_RES_002_CANCELLED,
        ];

        for code in codes {
            assert!(
                code.starts_with("STI-"),
                "Error code must start with 'STI-': {}",
                code
            );
            let parts: Vec<&str> = code.split('-').collect();
            assert_eq!(parts.len(), 3, "Error code must have 3 parts: {}", code);
            assert!(parts[1].len() >= 1 && parts[1].len() <= 3);
            assert!(parts[1].chars().all(|c| c.is_ascii_uppercase()));
            assert_eq!(parts[2].len(), 3, "Number must be 3 digits: {}", code);
            assert!(parts[2].chars().all(|c| c.is_ascii_digit()));
        }
    }
}
