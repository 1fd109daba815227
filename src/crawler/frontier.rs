//! Frontier state machine for depth-bounded breadth-first crawling
//!
//! The frontier owns the pending and visited sets. It is only ever mutated
//! between levels by [`FrontierState::complete_level`]; during a level the
//! coordinator works from an owned snapshot of the pending set, so workers
//! never touch it.

use crate::url::Address;
use crate::ScribeError;
use std::collections::HashSet;

/// Lifecycle of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlPhase {
    /// Seeded, not started
    Idle,
    /// Processing the level at `depth` (0-based)
    Running { depth: u32 },
    /// Depth exhausted or frontier empty
    Done,
}

impl CrawlPhase {
    /// Returns true once no further level will run
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }
}

/// Pending / visited sets plus the current phase
#[derive(Debug)]
pub struct FrontierState {
    pending: HashSet<Address>,
    visited: HashSet<Address>,
    phase: CrawlPhase,
    max_depth: u32,
}

impl FrontierState {
    /// Creates a frontier seeded with the root address
    pub fn new(seed: Address, max_depth: u32) -> Self {
        Self {
            pending: HashSet::from([seed]),
            visited: HashSet::new(),
            phase: CrawlPhase::Idle,
            max_depth,
        }
    }

    /// Moves from `Idle` to the first level
    ///
    /// A `max_depth` of zero means no level is ever run.
    pub fn start(&mut self) -> Result<CrawlPhase, ScribeError> {
        if self.phase != CrawlPhase::Idle {
            return Err(ScribeError::InvalidTransition(self.phase));
        }

        self.phase = if self.max_depth == 0 || self.pending.is_empty() {
            CrawlPhase::Done
        } else {
            CrawlPhase::Running { depth: 0 }
        };

        Ok(self.phase)
    }

    /// Applies the level barrier and advances the phase
    ///
    /// 1. `visited := visited ∪ pending`
    /// 2. `pending := discovered − visited`
    /// 3. Advance to the next level unless `max_depth` is reached or
    ///    `pending` is empty
    ///
    /// # Arguments
    ///
    /// * `discovered` - Every address found across the whole level
    pub fn complete_level(
        &mut self,
        discovered: HashSet<Address>,
    ) -> Result<CrawlPhase, ScribeError> {
        let CrawlPhase::Running { depth } = self.phase else {
            return Err(ScribeError::InvalidTransition(self.phase));
        };

        self.visited.extend(self.pending.drain());

        self.pending = discovered
            .into_iter()
            .filter(|address| !self.visited.contains(address))
            .collect();

        let next_depth = depth + 1;
        self.phase = if next_depth >= self.max_depth || self.pending.is_empty() {
            CrawlPhase::Done
        } else {
            CrawlPhase::Running { depth: next_depth }
        };

        Ok(self.phase)
    }

    /// Returns an owned snapshot of the addresses to process this level
    ///
    /// The snapshot is sorted so that a level is dispatched in a stable order.
    pub fn level_batch(&self) -> Vec<Address> {
        let mut batch: Vec<Address> = self.pending.iter().cloned().collect();
        batch.sort();
        batch
    }

    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    pub fn pending(&self) -> &HashSet<Address> {
        &self.pending
    }

    pub fn visited(&self) -> &HashSet<Address> {
        &self.visited
    }

    pub fn is_visited(&self, address: &Address) -> bool {
        self.visited.contains(address)
    }
}
