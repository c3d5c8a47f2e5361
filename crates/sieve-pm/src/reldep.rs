//! Relational dependencies: a capability name optionally qualified by a
//! comparison operator and an `[epoch:]version[-release]` string.

use std::cmp::Ordering;
use std::fmt;

/// Comparison operator of a relational dependency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CmpType {
    Eq,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl CmpType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "=" | "==" => Some(CmpType::Eq),
            "<" => Some(CmpType::Lt),
            "<=" | "=<" => Some(CmpType::Lte),
            ">" => Some(CmpType::Gt),
            ">=" | "=>" => Some(CmpType::Gte),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CmpType::Eq => "=",
            CmpType::Lt => "<",
            CmpType::Lte => "<=",
            CmpType::Gt => ">",
            CmpType::Gte => ">=",
        }
    }

    fn has_lt(self) -> bool {
        matches!(self, CmpType::Lt | CmpType::Lte)
    }

    fn has_gt(self) -> bool {
        matches!(self, CmpType::Gt | CmpType::Gte)
    }

    fn has_eq(self) -> bool {
        matches!(self, CmpType::Eq | CmpType::Lte | CmpType::Gte)
    }
}

/// A capability, e.g. `libc.so.6`, `python3 >= 3.11` or `/usr/bin/sh`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reldep {
    name: String,
    constraint: Option<(CmpType, String)>,
}

impl Reldep {
    /// An unversioned capability
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            constraint: None,
        }
    }

    /// A versioned capability
    pub fn with_version(name: impl Into<String>, cmp: CmpType, evr: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            constraint: Some((cmp, evr.into())),
        }
    }

    /// Parse `name` or `name <op> evr`. Returns `None` for an empty name or an unknown operator.
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.split_whitespace();
        let name = parts.next()?;
        match (parts.next(), parts.next(), parts.next()) {
            (None, _, _) => Some(Self::new(name)),
            (Some(op), Some(evr), None) => Some(Self::with_version(name, CmpType::from_str(op)?, evr)),
            _ => None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cmp_type(&self) -> Option<CmpType> {
        self.constraint.as_ref().map(|(cmp, _)| *cmp)
    }

    pub fn evr(&self) -> Option<&str> {
        self.constraint.as_ref().map(|(_, evr)| evr.as_str())
    }

    /// True if the ranges described by `self` and `provide` overlap.
    ///
    /// An unversioned side matches every version of the same name.
    pub fn matches(&self, provide: &Reldep) -> bool {
        if self.name != provide.name {
            return false;
        }
        let (Some((req_cmp, req_evr)), Some((prov_cmp, prov_evr))) = (&self.constraint, &provide.constraint) else {
            return true;
        };

        match evr_cmp(prov_evr, req_evr) {
            Ordering::Less => prov_cmp.has_gt() || req_cmp.has_lt(),
            Ordering::Greater => prov_cmp.has_lt() || req_cmp.has_gt(),
            Ordering::Equal => {
                (prov_cmp.has_eq() && req_cmp.has_eq())
                    || (prov_cmp.has_lt() && req_cmp.has_lt())
                    || (prov_cmp.has_gt() && req_cmp.has_gt())
            }
        }
    }
}

impl fmt::Display for Reldep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.constraint {
            Some((cmp, evr)) => write!(f, "{} {} {}", self.name, cmp.as_str(), evr),
            None => f.write_str(&self.name),
        }
    }
}

/// Split `[epoch:]version[-release]` into its parts
fn split_evr(evr: &str) -> (u64, &str, Option<&str>) {
    let (epoch, rest) = match evr.split_once(':') {
        Some((e, rest)) if !e.is_empty() && e.bytes().all(|b| b.is_ascii_digit()) => {
            (e.parse().unwrap_or(0), rest)
        }
        _ => (0, evr),
    };
    match rest.rsplit_once('-') {
        Some((version, release)) => (epoch, version, Some(release)),
        None => (epoch, rest, None),
    }
}

/// Compare two `[epoch:]version[-release]` strings.
///
/// Releases are compared only when both sides carry one.
pub fn evr_cmp(a: &str, b: &str) -> Ordering {
    let (ea, va, ra) = split_evr(a);
    let (eb, vb, rb) = split_evr(b);
    ea.cmp(&eb)
        .then_with(|| vercmp(va, vb))
        .then_with(|| match (ra, rb) {
            (Some(ra), Some(rb)) => vercmp(ra, rb),
            _ => Ordering::Equal,
        })
}

/// rpm segment-wise version comparison, including `~` (sorts before
/// everything) and `^` (sorts after the bare version) markers.
pub fn vercmp(a: &str, b: &str) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }

    let mut one = a.as_bytes();
    let mut two = b.as_bytes();
    let is_sep = |c: u8| !c.is_ascii_alphanumeric() && c != b'~' && c != b'^';

    loop {
        while one.first().is_some_and(|c| is_sep(*c)) {
            one = &one[1..];
        }
        while two.first().is_some_and(|c| is_sep(*c)) {
            two = &two[1..];
        }

        if one.first() == Some(&b'~') || two.first() == Some(&b'~') {
            if one.first() != Some(&b'~') {
                return Ordering::Greater;
            }
            if two.first() != Some(&b'~') {
                return Ordering::Less;
            }
            one = &one[1..];
            two = &two[1..];
            continue;
        }

        if one.first() == Some(&b'^') || two.first() == Some(&b'^') {
            if one.is_empty() {
                return Ordering::Less;
            }
            if two.is_empty() {
                return Ordering::Greater;
            }
            if one[0] != b'^' {
                return Ordering::Greater;
            }
            if two[0] != b'^' {
                return Ordering::Less;
            }
            one = &one[1..];
            two = &two[1..];
            continue;
        }

        if one.is_empty() || two.is_empty() {
            break;
        }

        let numeric = one[0].is_ascii_digit();
        let segment_len = |s: &[u8]| {
            s.iter()
                .take_while(|c| if numeric { c.is_ascii_digit() } else { c.is_ascii_alphabetic() })
                .count()
        };
        let (len_one, len_two) = (segment_len(one), segment_len(two));
        let (mut seg_one, mut seg_two) = (&one[..len_one], &two[..len_two]);
        one = &one[len_one..];
        two = &two[len_two..];

        // numeric segments are newer than alpha segments
        if seg_two.is_empty() {
            return if numeric { Ordering::Greater } else { Ordering::Less };
        }

        if numeric {
            while seg_one.first() == Some(&b'0') {
                seg_one = &seg_one[1..];
            }
            while seg_two.first() == Some(&b'0') {
                seg_two = &seg_two[1..];
            }
            match seg_one.len().cmp(&seg_two.len()) {
                Ordering::Equal => {}
                longer => return longer,
            }
        }

        match seg_one.cmp(seg_two) {
            Ordering::Equal => {}
            other => return other,
        }
    }

    match (one.is_empty(), two.is_empty()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        _ => Ordering::Greater,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_unversioned() {
        let dep = Reldep::parse("libc.so.6()(64bit)").unwrap();
        assert_eq!(dep.name(), "libc.so.6()(64bit)");
        assert_eq!(dep.cmp_type(), None);
        assert_eq!(dep.to_string(), "libc.so.6()(64bit)");
    }

    #[test]
    fn test_parse_versioned() {
        let dep = Reldep::parse("python3 >= 3.11").unwrap();
        assert_eq!(dep.name(), "python3");
        assert_eq!(dep.cmp_type(), Some(CmpType::Gte));
        assert_eq!(dep.evr(), Some("3.11"));
        assert_eq!(dep.to_string(), "python3 >= 3.11");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(Reldep::parse("").is_none());
        assert!(Reldep::parse("foo ~> 1").is_none());
        assert!(Reldep::parse("foo >=").is_none());
        assert!(Reldep::parse("foo >= 1 2").is_none());
    }

    #[test]
    fn test_vercmp_basic() {
        assert_eq!(vercmp("1.0", "1.0"), Ordering::Equal);
        assert_eq!(vercmp("1.0", "1.1"), Ordering::Less);
        assert_eq!(vercmp("1.10", "1.9"), Ordering::Greater);
        assert_eq!(vercmp("1.010", "1.10"), Ordering::Equal);
        assert_eq!(vercmp("1.0a", "1.0"), Ordering::Greater);
        assert_eq!(vercmp("1a", "1.1"), Ordering::Less);
        assert_eq!(vercmp("2.0", "2_0"), Ordering::Equal);
    }

    #[test]
    fn test_vercmp_tilde_and_caret() {
        assert_eq!(vercmp("1.0~rc1", "1.0"), Ordering::Less);
        assert_eq!(vercmp("1.0~rc1", "1.0~rc2"), Ordering::Less);
        assert_eq!(vercmp("1.0^git1", "1.0"), Ordering::Greater);
        assert_eq!(vercmp("1.0^git1", "1.0.1"), Ordering::Less);
    }

    #[test]
    fn test_evr_cmp() {
        assert_eq!(evr_cmp("1:1.0-1", "2.0-1"), Ordering::Greater);
        assert_eq!(evr_cmp("1.0-2", "1.0-10"), Ordering::Less);
        // release ignored when one side lacks it
        assert_eq!(evr_cmp("1.0", "1.0-5"), Ordering::Equal);
    }

    #[test]
    fn test_matches_ranges() {
        let provide = Reldep::with_version("foo", CmpType::Eq, "1.5-1");
        assert!(Reldep::parse("foo >= 1.0").unwrap().matches(&provide));
        assert!(Reldep::parse("foo < 2").unwrap().matches(&provide));
        assert!(!Reldep::parse("foo > 1.5").unwrap().matches(&provide));
        assert!(Reldep::parse("foo = 1.5").unwrap().matches(&provide));
        assert!(Reldep::parse("foo").unwrap().matches(&provide));
        assert!(!Reldep::parse("bar").unwrap().matches(&provide));

        // unversioned provide satisfies any version
        assert!(Reldep::parse("foo >= 9").unwrap().matches(&Reldep::new("foo")));
    }
}
