//! Feature flag bit-set selecting the active presentation channels.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{SubtitleError, SubtitleResult};

/// Bit-set of presentation channels. Flags combine freely.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FeatureFlags(u8);

impl FeatureFlags {
    pub const NONE: FeatureFlags = FeatureFlags(0);
    pub const SUBTITLE: FeatureFlags = FeatureFlags(1 << 0);
    pub const NAME: FeatureFlags = FeatureFlags(1 << 1);
    pub const PORTRAIT: FeatureFlags = FeatureFlags(1 << 2);
    pub const CHARACTER_POSE: FeatureFlags = FeatureFlags(1 << 3);
    pub const TYPEWRITER: FeatureFlags = FeatureFlags(1 << 4);
    pub const AUDIO: FeatureFlags = FeatureFlags(1 << 5);
    pub const HAVE_CHOICES: FeatureFlags = FeatureFlags(1 << 6);

    const NAMED: [(&'static str, FeatureFlags); 7] = [
        ("subtitle", Self::SUBTITLE),
        ("name", Self::NAME),
        ("portrait", Self::PORTRAIT),
        ("character_pose", Self::CHARACTER_POSE),
        ("typewriter", Self::TYPEWRITER),
        ("audio", Self::AUDIO),
        ("have_choices", Self::HAVE_CHOICES),
    ];

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & 0x7F)
    }

    /// Returns true when every bit of `other` is set.
    pub const fn contains(self, other: FeatureFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns true when any bit of `other` is set.
    pub const fn intersects(self, other: FeatureFlags) -> bool {
        self.0 & other.0 != 0
    }

    pub fn insert(&mut self, other: FeatureFlags) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: FeatureFlags) {
        self.0 &= !other.0;
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Parses a single flag name such as `"character_pose"`.
    pub fn from_name(name: &str) -> SubtitleResult<Self> {
        Self::NAMED
            .iter()
            .find(|(label, _)| *label == name)
            .map(|(_, flag)| *flag)
            .ok_or_else(|| SubtitleError::InvalidConfig(format!("unknown feature '{name}'")))
    }

    /// Names of the set flags, in bit order.
    pub fn names(self) -> Vec<&'static str> {
        Self::NAMED
            .iter()
            .filter(|(_, flag)| self.contains(*flag))
            .map(|(label, _)| *label)
            .collect()
    }
}

impl BitOr for FeatureFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for FeatureFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for FeatureFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FeatureFlags({})", self.names().join(" | "))
    }
}

impl Serialize for FeatureFlags {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.names().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FeatureFlags {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let names = Vec::<String>::deserialize(deserializer)?;
        let mut flags = FeatureFlags::NONE;
        for name in &names {
            flags |= FeatureFlags::from_name(name).map_err(serde::de::Error::custom)?;
        }
        Ok(flags)
    }
}
