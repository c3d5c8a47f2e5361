use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Which exclusion layers a considered-map computation bypasses.
///
/// The default, [`ExcludeFlags::APPLY_EXCLUDES`], applies every layer.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ExcludeFlags(u8);

impl ExcludeFlags {
    /// Apply every layer
    pub const APPLY_EXCLUDES: Self = Self(0);
    /// Skip the module exclusion layer
    pub const IGNORE_MODULAR_EXCLUDES: Self = Self(1 << 0);
    /// Skip the package exclude and include layers
    pub const IGNORE_REGULAR_EXCLUDES: Self = Self(1 << 1);
    /// Skip the disabled-repository layer
    pub const USE_DISABLED_REPOSITORIES: Self = Self(1 << 2);
    /// Skip modular and regular layers; disabled repositories stay hidden
    pub const IGNORE_EXCLUDES: Self = Self(Self::IGNORE_MODULAR_EXCLUDES.0 | Self::IGNORE_REGULAR_EXCLUDES.0);

    /// True if every flag in `other` is set in `self`.
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_apply_excludes(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for ExcludeFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for ExcludeFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for ExcludeFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_apply_excludes() {
            return f.write_str("APPLY_EXCLUDES");
        }
        let names = [
            (Self::IGNORE_MODULAR_EXCLUDES, "IGNORE_MODULAR_EXCLUDES"),
            (Self::IGNORE_REGULAR_EXCLUDES, "IGNORE_REGULAR_EXCLUDES"),
            (Self::USE_DISABLED_REPOSITORIES, "USE_DISABLED_REPOSITORIES"),
        ];
        let set: Vec<&str> = names
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        f.write_str(&set.join(" | "))
    }
}
