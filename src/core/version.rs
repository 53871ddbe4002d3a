//! Dotted numeric versions and comparison constraints (`>= 2.6`, `!= 1.4.2`).
//!
//! Versions compare component-wise as integers; the shorter one is padded
//! with zeros, so `1.0 == 1` and `2.6.4 > 2.6`.

use super::error::VersionSyntaxError;
use regex::Regex;
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// A dotted numeric version.
#[derive(Debug, Clone)]
pub struct Version {
    parts: Vec<u64>,
}

impl Version {
    /// At least one component is required.
    pub fn new(parts: Vec<u64>) -> Result<Self, VersionSyntaxError> {
        if parts.is_empty() {
            return Err(VersionSyntaxError::new("", "empty version"));
        }
        Ok(Self { parts })
    }

    pub fn parts(&self) -> &[u64] {
        &self.parts
    }

    /// Pull the first dotted number out of free-form `--version` output.
    pub fn extract(output: &str) -> Option<Self> {
        static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
        let re = PATTERN
            .get_or_init(|| Regex::new(r"\d+(?:\.\d+)*").ok())
            .as_ref()?;
        re.find(output).and_then(|m| m.as_str().parse().ok())
    }
}

impl FromStr for Version {
    type Err = VersionSyntaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(VersionSyntaxError::new(s, "empty version"));
        }
        let parts = s
            .split('.')
            .map(|p| {
                if p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(VersionSyntaxError::new(
                        s,
                        format!("'{}' is not a number", p),
                    ));
                }
                p.parse::<u64>()
                    .map_err(|e| VersionSyntaxError::new(s, e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { parts })
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.parts.len().max(other.parts.len());
        for i in 0..len {
            let a = self.parts.get(i).copied().unwrap_or(0);
            let b = other.parts.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => continue,
                ord => return ord,
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s: Vec<String> = self.parts.iter().map(|p| p.to_string()).collect();
        write!(f, "{}", s.join("."))
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl Comparator {
    pub fn holds(self, ord: Ordering) -> bool {
        match self {
            Self::Eq => ord == Ordering::Equal,
            Self::Ne => ord != Ordering::Equal,
            Self::Gt => ord == Ordering::Greater,
            Self::Ge => ord != Ordering::Less,
            Self::Lt => ord == Ordering::Less,
            Self::Le => ord != Ordering::Greater,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Lt => "<",
            Self::Le => "<=",
        }
    }
}

/// One `comparator version` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    pub op: Comparator,
    pub version: Version,
}

impl Constraint {
    pub fn matches(&self, version: &Version) -> bool {
        self.op.holds(version.cmp(&self.version))
    }
}

impl FromStr for Constraint {
    type Err = VersionSyntaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        // Two-character operators first so ">=" is not read as ">".
        let (op, rest) = if let Some(r) = text.strip_prefix(">=") {
            (Comparator::Ge, r)
        } else if let Some(r) = text.strip_prefix("<=") {
            (Comparator::Le, r)
        } else if let Some(r) = text.strip_prefix("!=") {
            (Comparator::Ne, r)
        } else if let Some(r) = text.strip_prefix("==") {
            (Comparator::Eq, r)
        } else if let Some(r) = text.strip_prefix('=') {
            (Comparator::Eq, r)
        } else if let Some(r) = text.strip_prefix('>') {
            (Comparator::Gt, r)
        } else if let Some(r) = text.strip_prefix('<') {
            (Comparator::Lt, r)
        } else {
            (Comparator::Eq, text)
        };

        let rest = rest.trim_start();
        if rest.starts_with(|c: char| !c.is_ascii_digit()) {
            return Err(VersionSyntaxError::new(s, "malformed comparator"));
        }
        let version = rest
            .parse::<Version>()
            .map_err(|e| VersionSyntaxError::new(s, e.reason))?;
        Ok(Self { op, version })
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.op.symbol(), self.version)
    }
}

/// All constraints must hold. Empty means anything goes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionSpec {
    constraints: Vec<Constraint>,
}

impl VersionSpec {
    /// Parse a comma-separated constraint list. Blank input is the empty spec.
    pub fn parse(s: &str) -> Result<Self, VersionSyntaxError> {
        if s.trim().is_empty() {
            return Ok(Self::default());
        }
        let constraints = s
            .split(',')
            .map(str::parse)
            .collect::<Result<Vec<Constraint>, _>>()?;
        Ok(Self { constraints })
    }

    /// Parse a list of constraint strings, as written in a build description.
    pub fn from_constraints<S: AsRef<str>>(items: &[S]) -> Result<Self, VersionSyntaxError> {
        let mut constraints = Vec::new();
        for item in items {
            constraints.extend(Self::parse(item.as_ref())?.constraints);
        }
        Ok(Self { constraints })
    }

    /// Both specs must hold.
    pub fn and(&self, other: &VersionSpec) -> VersionSpec {
        let mut constraints = self.constraints.clone();
        constraints.extend(other.constraints.iter().cloned());
        Self { constraints }
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    pub fn satisfied_by(&self, version: &Version) -> bool {
        self.constraints.iter().all(|c| c.matches(version))
    }
}

impl fmt::Display for VersionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s: Vec<String> = self.constraints.iter().map(|c| c.to_string()).collect();
        write!(f, "{}", s.join(", "))
    }
}

/// Does `version` satisfy every constraint in `spec`?
pub fn satisfies(version: &Version, spec: &VersionSpec) -> bool {
    spec.satisfied_by(version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn v(s: &str) -> Version {
        s.parse().unwrap()
    }

    fn spec(s: &str) -> VersionSpec {
        VersionSpec::parse(s).unwrap()
    }

    #[test]
    fn test_version_zero_padding() {
        assert_eq!(v("1.0"), v("1"));
        assert_eq!(v("2.6.0.0"), v("2.6"));
        assert!(v("2.6.4") > v("2.6"));
        assert!(v("2.10") > v("2.9"));
    }

    #[test]
    fn test_version_new_needs_components() {
        assert!(Version::new(vec![]).is_err());
        let x = Version::new(vec![2, 6]).unwrap();
        assert_eq!(x.parts(), &[2, 6]);
        assert_eq!(x, v("2.6.0"));
    }

    #[test]
    fn test_version_display() {
        assert_eq!(v("3.8.2").to_string(), "3.8.2");
    }

    #[test]
    fn test_version_rejects_garbage() {
        assert!("".parse::<Version>().is_err());
        assert!("1.x".parse::<Version>().is_err());
        assert!("1..2".parse::<Version>().is_err());
        assert!("v1.2".parse::<Version>().is_err());
    }

    #[test]
    fn test_extract_from_tool_output() {
        assert_eq!(Version::extract("flex 2.6.4").unwrap(), v("2.6.4"));
        assert_eq!(
            Version::extract("bison (GNU Bison) 3.8.2\nWritten by ...").unwrap(),
            v("3.8.2")
        );
        assert_eq!(Version::extract("byacc - 2.0 20230219").unwrap(), v("2.0"));
        assert!(Version::extract("no digits here").is_none());
    }

    #[test]
    fn test_comparators() {
        let x = v("2.6.4");
        assert!(satisfies(&x, &spec(">=2.6")));
        assert!(satisfies(&x, &spec("> 2.6")));
        assert!(satisfies(&x, &spec("<3")));
        assert!(satisfies(&x, &spec("<=2.6.4")));
        assert!(satisfies(&x, &spec("=2.6.4")));
        assert!(satisfies(&x, &spec("==2.6.4")));
        assert!(satisfies(&x, &spec("2.6.4")));
        assert!(satisfies(&x, &spec("!= 1.4.2")));
        assert!(!satisfies(&x, &spec("!=2.6.4.0")));
        assert!(!satisfies(&x, &spec("<2.6.4")));
    }

    #[test]
    fn test_spec_is_conjunction() {
        let s = VersionSpec::from_constraints(&[">=2.6", "<3"]).unwrap();
        assert_eq!(s.constraints().len(), 2);
        assert!(satisfies(&v("2.7"), &s));
        assert!(!satisfies(&v("3.0"), &s));
        assert!(!satisfies(&v("2.5.9"), &s));

        let inline = spec(">=2.6, <3");
        assert_eq!(inline, s);
        assert_eq!(spec(">=2.6").and(&spec("<3")), s);
    }

    #[test]
    fn test_empty_spec_always_satisfied() {
        assert!(spec("").is_empty());
        assert!(satisfies(&v("0.0.1"), &VersionSpec::default()));
        let none: [&str; 0] = [];
        assert!(VersionSpec::from_constraints(&none).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_syntax() {
        for bad in [">>2", ">=", "~1.2", "1.x", "=>1", ">= 1.", "<=,"] {
            let err = VersionSpec::parse(bad);
            assert!(err.is_err(), "{bad} should not parse");
        }
        let err = VersionSpec::parse("~1.2").unwrap_err();
        assert_eq!(err.input, "~1.2");
    }

    #[test]
    fn test_spec_display() {
        assert_eq!(spec(">= 2.6,<3").to_string(), ">=2.6, <3");
    }

    fn version_strategy() -> impl Strategy<Value = Vec<u64>> {
        prop::collection::vec(0u64..50, 1..5)
    }

    proptest! {
        #[test]
        fn prop_ordering_matches_constraints(a in version_strategy(), b in version_strategy()) {
            let va = Version::new(a).unwrap();
            let vb = Version::new(b).unwrap();
            prop_assume!(va > vb);
            let ge = VersionSpec::parse(&format!(">={}", vb)).unwrap();
            let gt = VersionSpec::parse(&format!(">{}", va)).unwrap();
            prop_assert!(satisfies(&va, &ge));
            prop_assert!(!satisfies(&vb, &gt));
        }

        #[test]
        fn prop_display_parse_is_equal(a in version_strategy()) {
            let va = Version::new(a).unwrap();
            let back: Version = va.to_string().parse().unwrap();
            prop_assert_eq!(back, va);
        }
    }
}
