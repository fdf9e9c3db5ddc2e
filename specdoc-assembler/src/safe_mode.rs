use std::str::FromStr;

/// How much a build may reach outside the root document. Modes are ordered
/// from least to most restrictive.
#[derive(Debug, Clone, Default, PartialOrd, Ord, PartialEq, Eq, Copy)]
pub enum SafeMode {
    /// Any file the host can load may be included.
    #[default]
    Unsafe = 0,

    /// Includes must resolve to a file inside the root document's directory.
    Safe,

    /// Same include rules as `Safe`. Kept as its own level so callers can map
    /// their own mode names onto it.
    Server,

    /// Include directives are disabled: every include is vetoed and dropped
    /// with a warning.
    Secure,
}

impl SafeMode {
    /// Whether includes have to stay under the root document's directory.
    #[must_use]
    pub fn confines_includes(self) -> bool {
        self >= SafeMode::Safe
    }

    #[must_use]
    pub fn allows_includes(self) -> bool {
        self < SafeMode::Secure
    }
}

impl FromStr for SafeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "unsafe" => Ok(Self::Unsafe),
            "safe" => Ok(Self::Safe),
            "server" => Ok(Self::Server),
            "secure" => Ok(Self::Secure),
            _ => Err(format!(
                "invalid safe mode: '{s}', expected: unsafe, safe, server, secure"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str() -> Result<(), String> {
        assert_eq!(SafeMode::from_str("UNSAFE")?, SafeMode::Unsafe);
        assert_eq!(SafeMode::from_str("safe")?, SafeMode::Safe);
        assert_eq!(SafeMode::from_str("server")?, SafeMode::Server);
        assert_eq!(SafeMode::from_str("secure")?, SafeMode::Secure);
        assert!(SafeMode::from_str("invalid").is_err());
        Ok(())
    }

    #[test]
    fn test_include_rules_follow_ordering() {
        assert!(SafeMode::Unsafe.allows_includes());
        assert!(!SafeMode::Unsafe.confines_includes());
        assert!(SafeMode::Server.allows_includes());
        assert!(SafeMode::Server.confines_includes());
        assert!(!SafeMode::Secure.allows_includes());
    }
}
