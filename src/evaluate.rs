use crate::board::Board;
use crate::eval_params::EvalParams;
use crate::types::{Color, Square};

/// Static score of the position from the side to move's perspective:
/// positive favors whoever moves next. Material plus piece-square bonus
/// over all occupied squares, O(64), no side effects.
pub fn evaluate<B: Board>(board: &B, params: &EvalParams) -> i32 {
    let mut score = 0;
    for index in 0..64u8 {
        let square = Square::from(index);
        if let Some((color, piece)) = board.piece_on(square) {
            let table_square = match color {
                Color::White => square.flip(),
                Color::Black => square,
            };
            let value = params.piece_values[piece] + params.piece_tables[piece][table_square.index()];
            match color {
                Color::White => score += value,
                Color::Black => score -= value,
            }
        }
    }
    match board.current_player() {
        Color::White => score,
        Color::Black => -score,
    }
}
