//! Bounded per-clan memories.
//!
//! Both buffers here cap their size on every write and evict oldest-first,
//! so a long run never grows them past their configured capacity.
//!
//! - [`ResourceMemory`] caches the last observed level of each scanned cell.
//!   It is a cache, not a ledger: re-scanning a cell overwrites its entry
//!   and refreshes its age, and cells the clan no longer sees keep their
//!   stale value until evicted. A scan grows the capacity to the disc size
//!   so one scan never evicts its own cells.
//! - [`MovementHistory`] records the cells a clan has stood on, used to
//!   steer migration towards rarely visited ground.

use std::collections::{BTreeMap, VecDeque};

use clanfield_world::Cell;

// ---------------------------------------------------------------------------
// Resource memory
// ---------------------------------------------------------------------------

/// A remembered observation of one cell.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Observation {
    level: f64,
    stamp: u64,
}

/// Cell-to-level cache with least-recently-written eviction.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceMemory {
    capacity: usize,
    entries: BTreeMap<Cell, Observation>,
    by_stamp: BTreeMap<u64, Cell>,
    next_stamp: u64,
}

impl ResourceMemory {
    /// An empty memory holding at most `capacity` cells (at least one).
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: BTreeMap::new(),
            by_stamp: BTreeMap::new(),
            next_stamp: 0,
        }
    }

    /// Maximum number of remembered cells.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Raise the capacity to at least `min` cells. Never shrinks.
    pub fn ensure_capacity(&mut self, min: usize) {
        self.capacity = self.capacity.max(min);
    }

    /// Number of remembered cells.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is remembered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Last observed level of `cell`, if still remembered.
    pub fn get(&self, cell: Cell) -> Option<f64> {
        self.entries.get(&cell).map(|o| o.level)
    }

    /// Record an observation, evicting the oldest entries past capacity.
    pub fn record(&mut self, cell: Cell, level: f64) {
        let stamp = self.next_stamp;
        self.next_stamp = self.next_stamp.saturating_add(1);
        if let Some(previous) = self.entries.insert(cell, Observation { level, stamp }) {
            self.by_stamp.remove(&previous.stamp);
        }
        self.by_stamp.insert(stamp, cell);

        while self.entries.len() > self.capacity {
            let Some((_, oldest)) = self.by_stamp.pop_first() else {
                break;
            };
            self.entries.remove(&oldest);
        }
    }

}

// ---------------------------------------------------------------------------
// Movement history
// ---------------------------------------------------------------------------

/// The most recent cells a clan has occupied, oldest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovementHistory {
    capacity: usize,
    cells: VecDeque<Cell>,
}

impl MovementHistory {
    /// An empty history holding at most `capacity` cells (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            cells: VecDeque::with_capacity(capacity),
        }
    }

    /// Append a visited cell, dropping the oldest past capacity.
    pub fn push(&mut self, cell: Cell) {
        self.cells.push_back(cell);
        while self.cells.len() > self.capacity {
            self.cells.pop_front();
        }
    }

    /// How many recorded visits landed on `cell`.
    pub fn visits(&self, cell: Cell) -> usize {
        self.cells.iter().filter(|&&c| c == cell).count()
    }

    /// Number of recorded visits.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether no visit is recorded.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Most recent cell, if any.
    pub fn last(&self) -> Option<Cell> {
        self.cells.back().copied()
    }

    /// Recorded cells, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = Cell> + '_ {
        self.cells.iter().copied()
    }
}
