//! Exactly-once bookkeeping for the keyed random strategies.

use std::collections::HashSet;
use std::hash::Hash;

use log::error;

use crate::error::SteganoError;
use crate::result::Result;

/// Lower limit of random draws before giving up on finding a free location
pub const MIN_DRAW_ATTEMPTS: u64 = 1 << 16;
/// Draws allowed per location of the drawing space
pub const DRAW_ATTEMPTS_PER_LOCATION: u64 = 32;

/// A single bit of one color channel of one pixel
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct PixelLocation {
    pub x: u32,
    pub y: u32,
    pub channel: u8,
    pub bit: u8,
}

/// An 8x8 block, addressed in block coordinates
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct BlockLocation {
    pub x: u32,
    pub y: u32,
}

/// How many random draws may be spent on finding one free location in a space of `space` locations.
///
/// With only one location left the chance to miss it `32 * space` times in a row is about `e^-32`.
pub fn draw_attempt_cap(space: u64) -> u64 {
    space
        .saturating_mul(DRAW_ATTEMPTS_PER_LOCATION)
        .max(MIN_DRAW_ATTEMPTS)
}

/// Set of already visited locations, bounded by the number of bits that are going to be placed.
#[derive(Debug)]
pub struct CollisionSet<L> {
    claimed: HashSet<L>,
    bound: u64,
}

impl<L: Eq + Hash + Copy + std::fmt::Debug> CollisionSet<L> {
    pub fn new(bound: u64) -> Self {
        Self {
            claimed: HashSet::new(),
            bound,
        }
    }

    /// `Ok(false)` when the location was visited before and the caller has to draw again.
    ///
    /// Claiming a new location beyond the bound means the capacity was planned wrong
    /// upstream, that is reported as [`SteganoError::CollisionExhausted`].
    pub fn try_claim(&mut self, location: L) -> Result<bool> {
        if self.claimed.contains(&location) {
            return Ok(false);
        }
        if self.len() >= self.bound {
            error!(
                "claiming {location:?} would exceed the bound of {} locations",
                self.bound
            );
            return Err(SteganoError::CollisionExhausted {
                claimed: self.len(),
                bound: self.bound,
                attempts: 0,
            });
        }

        Ok(self.claimed.insert(location))
    }

    /// Raises the bound, used when the payload phase starts.
    pub fn extend_bound(&mut self, additional: u64) {
        self.bound = self.bound.saturating_add(additional);
    }

    pub fn len(&self) -> u64 {
        self.claimed.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.claimed.is_empty()
    }

    pub fn bound(&self) -> u64 {
        self.bound
    }

    pub fn contains(&self, location: &L) -> bool {
        self.claimed.contains(location)
    }

    /// Draws from `draw` until a free location is claimed.
    ///
    /// Gives up with [`SteganoError::CollisionExhausted`] after `cap` draws.
    pub fn claim_with<F>(&mut self, cap: u64, mut draw: F) -> Result<L>
    where
        F: FnMut() -> L,
    {
        for _ in 0..cap {
            let location = draw();
            if self.try_claim(location)? {
                return Ok(location);
            }
        }

        error!(
            "no free location found after {cap} draws, {} of {} claimed",
            self.len(),
            self.bound
        );
        Err(SteganoError::CollisionExhausted {
            claimed: self.len(),
            bound: self.bound,
            attempts: cap,
        })
    }
}
