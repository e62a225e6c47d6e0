pub const TT_DEFAULT_ENTRIES: usize = 1 << 20;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NodeType {
    Exact,
    UpperBound,
    LowerBound,
}

#[derive(Copy, Clone, Debug)]
struct Entry {
    key: u64,
    depth: i8,
    score: i32,
    node_type: NodeType,
}

/// Cache of search results keyed by position fingerprint. Bounded: a fixed
/// power-of-two slot count indexed by the low hash bits, always-replace on
/// store. Entries found at the slot must still match the full key, so an
/// index collision reads as a miss, not a wrong score. Single-threaded.
pub struct TranspositionTable {
    table: Vec<Option<Entry>>,
}

impl TranspositionTable {
    /// `entries` is rounded up to a power of two; zero disables the table
    /// (every lookup misses, every store is dropped).
    pub fn new(entries: usize) -> Self {
        let len = if entries == 0 {
            0
        } else {
            entries.next_power_of_two()
        };
        Self {
            table: vec![None; len],
        }
    }

    pub fn entries(&self) -> usize {
        self.table.len()
    }

    pub fn clear(&mut self) {
        self.table.fill(None);
    }

    /// A cached score usable at this node, if one exists. The stored depth
    /// must cover the requested depth, and then the bound decides:
    /// exact scores return as-is, a lower bound at or above beta fails
    /// high, an upper bound at or below alpha fails low. Anything else is
    /// a miss and the caller searches in full.
    pub fn lookup(&self, hash: u64, depth: i8, alpha: i32, beta: i32) -> Option<i32> {
        if self.table.is_empty() {
            return None;
        }
        let index = hash as usize & (self.table.len() - 1);
        let entry = self.table[index]?;
        if entry.key != hash || entry.depth < depth {
            return None;
        }
        match entry.node_type {
            NodeType::Exact => Some(entry.score),
            NodeType::LowerBound if entry.score >= beta => Some(beta),
            NodeType::UpperBound if entry.score <= alpha => Some(alpha),
            _ => None,
        }
    }

    /// Unconditionally replaces whatever occupies the slot.
    pub fn store(&mut self, hash: u64, depth: i8, score: i32, node_type: NodeType) {
        if self.table.is_empty() {
            return;
        }
        let index = hash as usize & (self.table.len() - 1);
        self.table[index] = Some(Entry {
            key: hash,
            depth,
            score,
            node_type,
        });
    }
}
