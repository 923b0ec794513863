//! Merge configuration
//!
//! Operational knobs for one merge invocation. All knobs have defaults;
//! the CLI maps its flags onto this struct.

/// What to do when an invocation site has the `dynamic` kind.
///
/// CHA cannot resolve dynamic sites; the policy decides whether that is
/// worth a log line, silence, or a failed merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DynamicSitePolicy {
    /// Skip the site and log a warning (counted in the report)
    #[default]
    Warn,
    /// Skip the site silently (still counted in the report)
    Drop,
    /// Abort the merge
    Fail,
}

impl DynamicSitePolicy {
    /// Parse from CLI string form.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "warn" => Some(DynamicSitePolicy::Warn),
            "drop" => Some(DynamicSitePolicy::Drop),
            "fail" => Some(DynamicSitePolicy::Fail),
            _ => None,
        }
    }
}

/// What to do when a dependency cannot be resolved or fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingDepPolicy {
    /// Drop the dependency and merge against the smaller closure
    #[default]
    Skip,
    /// Abort the merge
    Fail,
}

impl MissingDepPolicy {
    /// Parse from CLI string form.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "skip" => Some(MissingDepPolicy::Skip),
            "fail" => Some(MissingDepPolicy::Fail),
            _ => None,
        }
    }
}

/// Configuration for one merge invocation.
#[derive(Debug, Clone)]
pub struct MergeConfig {
    /// Policy for `dynamic` invocation sites
    pub dynamic_site_policy: DynamicSitePolicy,
    /// Policy for unresolvable or unfetchable dependencies
    pub missing_dep_policy: MissingDepPolicy,
    /// Store hierarchy closures as sorted interned-id vectors
    ///
    /// When disabled the closures are kept as hash sets, which is easier to
    /// inspect in a debugger but roughly an order of magnitude larger on big
    /// closures.
    pub intern_type_uris: bool,
}

impl Default for MergeConfig {
    fn default() -> Self {
        MergeConfig {
            dynamic_site_policy: DynamicSitePolicy::default(),
            missing_dep_policy: MissingDepPolicy::default(),
            intern_type_uris: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_parsing() {
        assert_eq!(
            DynamicSitePolicy::from_str("warn"),
            Some(DynamicSitePolicy::Warn)
        );
        assert_eq!(
            DynamicSitePolicy::from_str("fail"),
            Some(DynamicSitePolicy::Fail)
        );
        assert_eq!(DynamicSitePolicy::from_str("bogus"), None);
        assert_eq!(
            MissingDepPolicy::from_str("skip"),
            Some(MissingDepPolicy::Skip)
        );
        assert_eq!(MissingDepPolicy::from_str("bogus"), None);
    }

    #[test]
    fn test_defaults() {
        let config = MergeConfig::default();
        assert_eq!(config.dynamic_site_policy, DynamicSitePolicy::Warn);
        assert_eq!(config.missing_dep_policy, MissingDepPolicy::Skip);
        assert!(config.intern_type_uris);
    }
}
