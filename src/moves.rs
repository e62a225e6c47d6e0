use std::fmt::{self, Display};
use std::ops::Index;

use crate::types::{Piece, Square};
use Piece::*;

/// A move in the collaborator's coordinates. The ordering score used during
/// search lives in [`SortingMove`], never here, so moves handed back to the
/// caller carry no search residue.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<Piece>,
}

impl Move {
    pub fn new(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            promotion: None,
        }
    }

    pub fn promoting(from: Square, to: Square, piece: Piece) -> Self {
        Self {
            from,
            to,
            promotion: Some(piece),
        }
    }

    /// Coordinate text, `e2e4` / `e7e8q` style.
    pub fn coords(&self) -> String {
        format!("{self}")
    }

    pub fn from_coords(coords: &str) -> Option<Self> {
        let from = Square::from_coord(coords.get(0..2)?)?;
        let to = Square::from_coord(coords.get(2..4)?)?;
        let promotion = match coords.as_bytes().get(4) {
            Some(b'n') => Some(Knight),
            Some(b'b') => Some(Bishop),
            Some(b'r') => Some(Rook),
            Some(b'q') => Some(Queen),
            Some(_) => return None,
            None => None,
        };
        Some(Self {
            from,
            to,
            promotion,
        })
    }
}

impl Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let promo = match self.promotion {
            Some(Knight) => "n",
            Some(Bishop) => "b",
            Some(Rook) => "r",
            Some(Queen) => "q",
            _ => "",
        };
        write!(f, "{}{}{}", self.from, self.to, promo)
    }
}

impl Default for Move {
    fn default() -> Self {
        Self::new(Square::from(0), Square::from(0))
    }
}

/// A move paired with its transient ordering score.
#[derive(Copy, Clone, Debug)]
pub struct SortingMove {
    pub mv: Move,
    pub score: i32,
}

impl SortingMove {
    pub fn new(mv: Move) -> Self {
        Self { mv, score: 0 }
    }
}

/// 218 is the most moves any legal chess position allows.
pub const MAX_MOVES: usize = 218;

#[derive(Copy, Clone)]
pub struct MoveList {
    len: usize,
    inner: [SortingMove; MAX_MOVES],
}

impl MoveList {
    pub fn new() -> Self {
        Self {
            len: 0,
            inner: [SortingMove::new(Move::default()); MAX_MOVES],
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn push(&mut self, mv: Move) {
        self.inner[self.len] = SortingMove::new(mv);
        self.len += 1;
    }

    pub fn inner(&self) -> &[SortingMove] {
        &self.inner[..self.len]
    }

    pub fn inner_mut(&mut self) -> &mut [SortingMove] {
        &mut self.inner[..self.len]
    }

    pub fn iter(&self) -> impl Iterator<Item = Move> + '_ {
        self.inner().iter().map(|sm| sm.mv)
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&Move) -> bool) {
        let mut kept = 0;
        for i in 0..self.len {
            if keep(&self.inner[i].mv) {
                self.inner[kept] = self.inner[i];
                kept += 1;
            }
        }
        self.len = kept;
    }

    /// Swap the best-scored remaining move into `current_index` and return
    /// it. Calling this for each index in turn yields the list in
    /// descending score order without sorting moves that a cutoff will
    /// never reach.
    pub fn pick_move(&mut self, current_index: usize) -> (Move, i32) {
        let mut best_index = current_index;
        let mut best_score = self.inner[current_index].score;
        for i in (current_index + 1)..self.len {
            if self.inner[i].score > best_score {
                best_index = i;
                best_score = self.inner[i].score;
            }
        }
        self.inner.swap(current_index, best_index);
        (
            self.inner[current_index].mv,
            self.inner[current_index].score,
        )
    }
}

impl Index<usize> for MoveList {
    type Output = Move;

    fn index(&self, index: usize) -> &Self::Output {
        &self.inner[index].mv
    }
}

impl Default for MoveList {
    fn default() -> Self {
        Self::new()
    }
}
