//! Package-spec parsing in the `name-[epoch:]version-release.arch` family.

use std::fmt;

use glob::{MatchOptions, Pattern};

use crate::pool::Solvable;

/// Shape a package spec is interpreted as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NevraForm {
    Nevra,
    Nevr,
    Nev,
    Na,
    Name,
}

/// Order in which forms are tried when resolving a package spec
pub const PKG_SPEC_FORMS: [NevraForm; 5] = [
    NevraForm::Nevra,
    NevraForm::Na,
    NevraForm::Name,
    NevraForm::Nevr,
    NevraForm::Nev,
];

/// A parsed package spec. Empty components are unconstrained; every
/// component may hold a glob pattern.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Nevra {
    pub name: String,
    pub epoch: String,
    pub version: String,
    pub release: String,
    pub arch: String,
}

impl Nevra {
    /// Parse `spec` as the given form. Returns `None` if the spec does not have that shape.
    pub fn parse(spec: &str, form: NevraForm) -> Option<Self> {
        if spec.is_empty() {
            return None;
        }

        let mut nevra = Nevra::default();
        let mut rest = spec;

        match form {
            NevraForm::Nevra | NevraForm::Na => {
                let (head, arch) = rest.rsplit_once('.')?;
                if arch.is_empty() || arch.contains('-') {
                    return None;
                }
                nevra.arch = arch.to_string();
                rest = head;
            }
            _ => {}
        }

        match form {
            NevraForm::Nevra | NevraForm::Nevr => {
                let (head, release) = rest.rsplit_once('-')?;
                if release.is_empty() {
                    return None;
                }
                nevra.release = release.to_string();
                rest = head;
            }
            _ => {}
        }

        match form {
            NevraForm::Nevra | NevraForm::Nevr | NevraForm::Nev => {
                let (name, ev) = rest.rsplit_once('-')?;
                let (epoch, version) = match ev.split_once(':') {
                    Some((epoch, version)) => (epoch, version),
                    None => ("", ev),
                };
                if version.is_empty() || version.contains(':') {
                    return None;
                }
                nevra.epoch = epoch.to_string();
                nevra.version = version.to_string();
                rest = name;
            }
            _ => {}
        }

        if rest.is_empty() {
            return None;
        }
        nevra.name = rest.to_string();
        Some(nevra)
    }

    /// True if only the name component is set
    pub fn has_just_name(&self) -> bool {
        !self.name.is_empty()
            && self.epoch.is_empty()
            && self.version.is_empty()
            && self.release.is_empty()
            && self.arch.is_empty()
    }

    /// True if every set component matches the corresponding field of `solvable`
    pub fn matches(&self, solvable: &Solvable, ignore_case: bool) -> bool {
        let component = |pattern: &str, value: &str| pattern.is_empty() || glob_matches(pattern, value, ignore_case);

        if !component(&self.name, &solvable.name) {
            return false;
        }
        if !self.epoch.is_empty() && !glob_matches(&self.epoch, &solvable.epoch.to_string(), false) {
            return false;
        }
        component(&self.version, &solvable.version)
            && component(&self.release, &solvable.release)
            && component(&self.arch, &solvable.arch)
    }
}

impl fmt::Display for Nevra {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.version.is_empty() {
            f.write_str("-")?;
            if !self.epoch.is_empty() {
                write!(f, "{}:", self.epoch)?;
            }
            f.write_str(&self.version)?;
        }
        if !self.release.is_empty() {
            write!(f, "-{}", self.release)?;
        }
        if !self.arch.is_empty() {
            write!(f, ".{}", self.arch)?;
        }
        Ok(())
    }
}

/// Glob match; a pattern that does not compile is compared literally.
pub(crate) fn glob_matches(pattern: &str, value: &str, ignore_case: bool) -> bool {
    let options = MatchOptions {
        case_sensitive: !ignore_case,
        require_literal_separator: false,
        require_literal_leading_dot: false,
    };
    match Pattern::new(pattern) {
        Ok(compiled) => compiled.matches_with(value, options),
        Err(_) if ignore_case => pattern.eq_ignore_ascii_case(value),
        Err(_) => pattern == value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solvable() -> Solvable {
        Solvable::new("bash", "5.2.15", "3.fc38", "x86_64").with_epoch(1)
    }

    #[test]
    fn test_parse_nevra() {
        let nevra = Nevra::parse("bash-1:5.2.15-3.fc38.x86_64", NevraForm::Nevra).unwrap();
        assert_eq!(nevra.name, "bash");
        assert_eq!(nevra.epoch, "1");
        assert_eq!(nevra.version, "5.2.15");
        assert_eq!(nevra.release, "3.fc38");
        assert_eq!(nevra.arch, "x86_64");
        assert_eq!(nevra.to_string(), "bash-1:5.2.15-3.fc38.x86_64");
    }

    #[test]
    fn test_parse_name_with_dashes() {
        let nevra = Nevra::parse("python3-libs-3.11.4-1.noarch", NevraForm::Nevra).unwrap();
        assert_eq!(nevra.name, "python3-libs");
        assert_eq!(nevra.version, "3.11.4");
        assert_eq!(nevra.release, "1");
        assert_eq!(nevra.arch, "noarch");
    }

    #[test]
    fn test_parse_other_forms() {
        let nevr = Nevra::parse("bash-5.2-3", NevraForm::Nevr).unwrap();
        assert_eq!((nevr.name.as_str(), nevr.version.as_str(), nevr.release.as_str()), ("bash", "5.2", "3"));

        let nev = Nevra::parse("bash-5.2", NevraForm::Nev).unwrap();
        assert_eq!((nev.name.as_str(), nev.version.as_str()), ("bash", "5.2"));

        let na = Nevra::parse("bash.x86_64", NevraForm::Na).unwrap();
        assert_eq!((na.name.as_str(), na.arch.as_str()), ("bash", "x86_64"));

        let name = Nevra::parse("bash", NevraForm::Name).unwrap();
        assert!(name.has_just_name());
    }

    #[test]
    fn test_parse_rejects_wrong_shape() {
        assert!(Nevra::parse("bash", NevraForm::Nevra).is_none());
        assert!(Nevra::parse("bash", NevraForm::Na).is_none());
        assert!(Nevra::parse("bash-", NevraForm::Nev).is_none());
        assert!(Nevra::parse("-1.0", NevraForm::Nev).is_none());
        assert!(Nevra::parse("", NevraForm::Name).is_none());
    }

    #[test]
    fn test_matches_with_globs() {
        let pkg = solvable();
        assert!(Nevra::parse("ba*", NevraForm::Name).unwrap().matches(&pkg, false));
        assert!(Nevra::parse("bash-5.2.*", NevraForm::Nev).unwrap().matches(&pkg, false));
        assert!(Nevra::parse("bash-1:5.2.15-3.fc38.x86_64", NevraForm::Nevra).unwrap().matches(&pkg, false));
        assert!(!Nevra::parse("bash-0:5.2.15-3.fc38.x86_64", NevraForm::Nevra).unwrap().matches(&pkg, false));
        assert!(!Nevra::parse("bash.i686", NevraForm::Na).unwrap().matches(&pkg, false));
    }

    #[test]
    fn test_matches_ignore_case() {
        let pkg = solvable();
        let spec = Nevra::parse("BASH", NevraForm::Name).unwrap();
        assert!(!spec.matches(&pkg, false));
        assert!(spec.matches(&pkg, true));
    }

    #[test]
    fn test_invalid_glob_is_literal() {
        assert!(glob_matches("foo[", "foo[", false));
        assert!(!glob_matches("foo[", "foo", false));
    }
}
