use crate::moves::{Move, MoveList};
use crate::types::{Color, GameStatus, Piece, Square};

/// The game-state collaborator the engine searches over.
///
/// The engine never owns a position. It drives whatever the host supplies
/// through this trait, and every `make_move` it performs is matched by an
/// `unmake_move` before a search call returns (deadline expiry included),
/// so the host's position is always restored exactly.
pub trait Board {
    /// Append every legal move for the side to move to `moves`.
    fn legal_moves(&mut self, moves: &mut MoveList);

    /// Apply `mv`. Returns `false`, leaving the position untouched, if the
    /// move is refused; the engine skips refused moves silently.
    fn make_move(&mut self, mv: Move) -> bool;

    /// Revert the most recent successful `make_move`.
    fn unmake_move(&mut self);

    fn piece_on(&self, square: Square) -> Option<(Color, Piece)>;

    fn current_player(&self) -> Color;

    /// Terminal verdict for the current position. Only consulted when
    /// `legal_moves` produced nothing.
    fn status(&self) -> GameStatus;
}
