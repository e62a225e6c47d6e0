use rand::prelude::*;

use crate::board::Board;
use crate::types::{Color, Piece, Square};

/// Zobrist numbers for position fingerprinting: one 64-bit value per
/// (color, piece, square), plus one for the side to move. Generated once
/// per engine instance from a seed and held for its lifetime, so every
/// hash within a search session uses the same numbers.
pub struct ZobristTable {
    pieces: [[[u64; 64]; 6]; 2],
    white_to_move: u64,
}

impl ZobristTable {
    pub fn new(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut pieces = [[[0u64; 64]; 6]; 2];
        for color in pieces.iter_mut() {
            for piece in color.iter_mut() {
                rng.fill(&mut piece[..]);
            }
        }
        Self {
            pieces,
            white_to_move: rng.gen(),
        }
    }

    #[inline]
    pub fn piece(&self, color: Color, piece: Piece, square: Square) -> u64 {
        self.pieces[color][piece][square.index()]
    }

    /// Fingerprint of piece placement plus side to move. Positions with
    /// identical placement and mover hash identically; collisions between
    /// distinct positions are tolerated as a cache approximation.
    pub fn hash<B: Board>(&self, board: &B) -> u64 {
        let mut hash = 0;
        for index in 0..64u8 {
            let square = Square::from(index);
            if let Some((color, piece)) = board.piece_on(square) {
                hash ^= self.piece(color, piece, square);
            }
        }
        if board.current_player() == Color::White {
            hash ^= self.white_to_move;
        }
        hash
    }
}
