//! Validation results.
//!
//! License: MIT OR APACHE 2.0

use std::collections::BTreeMap;

use serde::{Serialize, Serializer};

/// Failing path → message of the first failing step on that path.
pub type IssueMap = BTreeMap<String, String>;

/// Outcome of [`crate::is_valid`]: either valid, or the issues found.
///
/// Serializes as `true` or as the issue map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validity {
    Valid,
    Invalid(IssueMap),
}

impl Validity {
    pub fn is_valid(&self) -> bool {
        matches!(self, Validity::Valid)
    }

    pub fn issues(&self) -> Option<&IssueMap> {
        match self {
            Validity::Valid => None,
            Validity::Invalid(issues) => Some(issues),
        }
    }

    pub fn into_issues(self) -> IssueMap {
        match self {
            Validity::Valid => IssueMap::new(),
            Validity::Invalid(issues) => issues,
        }
    }
}

impl From<IssueMap> for Validity {
    fn from(issues: IssueMap) -> Self {
        if issues.is_empty() {
            Validity::Valid
        } else {
            Validity::Invalid(issues)
        }
    }
}

impl Serialize for Validity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Validity::Valid => serializer.serialize_bool(true),
            Validity::Invalid(issues) => issues.serialize(serializer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_issue_map_is_valid() {
        assert_eq!(Validity::from(IssueMap::new()), Validity::Valid);
        assert_eq!(serde_json::to_value(Validity::Valid).unwrap(), json!(true));
    }

    #[test]
    fn invalid_serializes_as_the_map() {
        let mut issues = IssueMap::new();
        issues.insert("email".into(), "bad email".into());
        let validity = Validity::from(issues.clone());
        assert!(!validity.is_valid());
        assert_eq!(validity.issues(), Some(&issues));
        assert_eq!(serde_json::to_value(&validity).unwrap(), json!({"email": "bad email"}));
        assert_eq!(validity.into_issues(), issues);
    }
}
