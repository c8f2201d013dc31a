//! Release classification and the per-subscription release filter.

use serde::{Deserialize, Serialize};

/// How a version was classified by its authors.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ReleaseType {
    /// Unstable early build.
    Alpha,
    /// Feature complete, not yet stable.
    Beta,
    /// Stable release.
    Release,
}

impl ReleaseType {
    /// The filter bit for this release type.
    pub const fn bit(self) -> u8 {
        match self {
            Self::Alpha => 0b001,
            Self::Beta => 0b010,
            Self::Release => 0b100,
        }
    }
}

/// Set of release types a subscription wants to hear about, stored as bit flags.
///
/// Defaults to every release type.
///
/// # Examples
///
/// ```
/// use modwatch_core::{ReleaseFilter, ReleaseType};
///
/// let filter = ReleaseFilter::only(&[ReleaseType::Release]);
/// assert!(filter.admits(ReleaseType::Release));
/// assert!(!filter.admits(ReleaseType::Beta));
/// assert_eq!(filter.bits(), 0b100);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReleaseFilter(u8);

impl ReleaseFilter {
    /// Every release type.
    pub const ALL: Self = Self(0b111);
    /// No release type at all.
    pub const NONE: Self = Self(0);

    /// Build a filter from raw bits, ignoring unknown bits.
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & Self::ALL.0)
    }

    /// Build a filter admitting exactly the given types.
    pub fn only(types: &[ReleaseType]) -> Self {
        Self(types.iter().fold(0, |acc, t| acc | t.bit()))
    }

    /// Raw bit representation.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Whether versions of `release_type` pass this filter.
    pub const fn admits(self, release_type: ReleaseType) -> bool {
        self.0 & release_type.bit() != 0
    }

    /// Return a copy with `release_type` added.
    pub const fn with(self, release_type: ReleaseType) -> Self {
        Self(self.0 | release_type.bit())
    }

    /// Return a copy with `release_type` removed.
    pub const fn without(self, release_type: ReleaseType) -> Self {
        Self(self.0 & !release_type.bit())
    }
}

impl Default for ReleaseFilter {
    fn default() -> Self {
        Self::ALL
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn default_admits_everything() {
        let filter = ReleaseFilter::default();
        assert!(ReleaseType::iter().all(|t| filter.admits(t)));
    }

    #[test]
    fn unknown_bits_are_dropped() {
        assert_eq!(ReleaseFilter::from_bits(0xff), ReleaseFilter::ALL);
    }

    #[test]
    fn with_and_without_toggle_one_bit() {
        let filter = ReleaseFilter::NONE.with(ReleaseType::Beta);
        assert!(filter.admits(ReleaseType::Beta));
        assert!(!filter.without(ReleaseType::Beta).admits(ReleaseType::Beta));
    }

    #[test]
    fn parses_lowercase_names() {
        assert_eq!("beta".parse::<ReleaseType>().ok(), Some(ReleaseType::Beta));
        assert_eq!(ReleaseType::Release.to_string(), "release");
    }
}
