//! Forge coordinate parsing
//!
//! Coordinates name one package revision as `group:artifact:version`. The
//! split is positional: group ends at the first colon, version starts after
//! the last. Fewer than two colons or an empty component is rejected.

use thiserror::Error;

/// Error raised when a coordinate string fails to split into three parts.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("malformed coordinate '{0}': expected group:artifact:version")]
pub struct CoordinateError(pub String);

/// One `group:artifact:version` package revision.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coordinate {
    pub group: String,
    pub artifact: String,
    pub version: String,
}

impl Coordinate {
    /// Parse `group:artifact:version`, splitting at the first and last colon.
    pub fn parse(s: &str) -> Result<Self, CoordinateError> {
        let first = s.find(':').ok_or_else(|| CoordinateError(s.to_string()))?;
        let last = s.rfind(':').expect("find succeeded");
        if first == last {
            return Err(CoordinateError(s.to_string()));
        }

        let group = &s[..first];
        let artifact = &s[first + 1..last];
        let version = &s[last + 1..];
        if group.is_empty() || artifact.is_empty() || version.is_empty() {
            return Err(CoordinateError(s.to_string()));
        }

        Ok(Coordinate {
            group: group.to_string(),
            artifact: artifact.to_string(),
            version: version.to_string(),
        })
    }

    /// Package name as stored in the dependency store, `group:artifact`.
    pub fn package_name(&self) -> String {
        format!("{}:{}", self.group, self.artifact)
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.artifact, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_coordinate() {
        let c = Coordinate::parse("org.example:widget:1.2.3").unwrap();
        assert_eq!(c.group, "org.example");
        assert_eq!(c.artifact, "widget");
        assert_eq!(c.version, "1.2.3");
        assert_eq!(c.package_name(), "org.example:widget");
    }

    #[test]
    fn test_parse_extra_colons_go_to_artifact() {
        // First and last colon split; anything between belongs to artifact
        let c = Coordinate::parse("g:a:b:1.0").unwrap();
        assert_eq!(c.group, "g");
        assert_eq!(c.artifact, "a:b");
        assert_eq!(c.version, "1.0");
    }

    #[test]
    fn test_reject_too_few_colons() {
        assert!(Coordinate::parse("group-only").is_err());
        assert!(Coordinate::parse("group:artifact").is_err());
    }

    #[test]
    fn test_reject_empty_components() {
        assert!(Coordinate::parse(":artifact:1.0").is_err());
        assert!(Coordinate::parse("group::1.0").is_err());
        assert!(Coordinate::parse("group:artifact:").is_err());
    }

    #[test]
    fn test_display_round_trip() {
        let c = Coordinate::parse("org.example:widget:1.2.3").unwrap();
        assert_eq!(Coordinate::parse(&c.to_string()).unwrap(), c);
    }
}
