//! Star rating value.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::RatingsError;

/// A single vote: whole stars from 1 to 5.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Rating(u8);

impl Rating {
    pub const MIN: Self = Self(1);
    pub const MAX: Self = Self(5);

    pub fn new(stars: u8) -> Result<Self, RatingsError> {
        if (Self::MIN.0..=Self::MAX.0).contains(&stars) {
            Ok(Self(stars))
        } else {
            Err(RatingsError::InvalidRating(stars))
        }
    }

    pub fn stars(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u8> for Rating {
    type Error = RatingsError;

    fn try_from(stars: u8) -> Result<Self, Self::Error> {
        Self::new(stars)
    }
}

impl From<Rating> for u64 {
    fn from(rating: Rating) -> Self {
        u64::from(rating.0)
    }
}

impl<'de> Deserialize<'de> for Rating {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let stars = u8::deserialize(deserializer)?;
        Self::new(stars).map_err(serde::de::Error::custom)
    }
}
