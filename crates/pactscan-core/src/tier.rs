//! Entitlement tiers and the limits they carry.

use serde::{Deserialize, Serialize};

/// Entitlement tier for an analysis request.
///
/// Drives prompt selection (field set and finding counts), response-schema
/// expectations (severity/impact levels are premium-only), and the stored
/// analysis quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Free,
    Premium,
}

impl Tier {
    /// Maximum number of stored analyses, or `None` for unlimited.
    pub fn stored_quota(&self) -> Option<usize> {
        match self {
            Self::Free => Some(3),
            Self::Premium => None,
        }
    }

    /// Whether records at this tier carry severity/impact levels and the
    /// extended premium field set.
    pub fn supports_levels(&self) -> bool {
        matches!(self, Self::Premium)
    }

    /// Finding count requested from the model: free asks for at most this
    /// many risks/opportunities, premium for at least this many.
    pub fn finding_count(&self) -> usize {
        match self {
            Self::Free => 6,
            Self::Premium => 10,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Premium => "premium",
        }
    }
}

impl std::str::FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "free" => Ok(Self::Free),
            "premium" => Ok(Self::Premium),
            other => Err(format!("unknown tier: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_quota_is_bounded() {
        assert_eq!(Tier::Free.stored_quota(), Some(3));
        assert_eq!(Tier::Premium.stored_quota(), None);
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("Premium".parse::<Tier>().unwrap(), Tier::Premium);
        assert_eq!(" free ".parse::<Tier>().unwrap(), Tier::Free);
        assert!("gold".parse::<Tier>().is_err());
    }

    #[test]
    fn serde_lowercase() {
        assert_eq!(serde_json::to_string(&Tier::Free).unwrap(), "\"free\"");
        let t: Tier = serde_json::from_str("\"premium\"").unwrap();
        assert_eq!(t, Tier::Premium);
    }
}
