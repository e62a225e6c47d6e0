//! Minimal mailbox chess position used as the engine's collaborator in
//! tests. Legality lives here, as it would in a host game: full piece
//! movement, promotion, and check-aware move filtering, but no castling
//! and no en passant.

use crate::board::Board;
use crate::moves::{Move, MoveList};
use crate::types::{Color, GameStatus, Piece, Square};
use Color::*;
use Piece::*;

const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];
const KING_OFFSETS: [(i8, i8); 8] = [
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
];
const BISHOP_DIRS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];
const ROOK_DIRS: [(i8, i8); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];

fn offset(square: Square, df: i8, dr: i8) -> Option<Square> {
    let file = square.file() as i8 + df;
    let rank = square.rank() as i8 + dr;
    if (0..8).contains(&file) && (0..8).contains(&rank) {
        Some(Square::new(file as usize, rank as usize))
    } else {
        None
    }
}

#[derive(Clone)]
pub struct Mailbox {
    squares: [Option<(Color, Piece)>; 64],
    to_move: Color,
    undo_stack: Vec<Undo>,
}

#[derive(Clone)]
struct Undo {
    mv: Move,
    moved: (Color, Piece),
    captured: Option<(Color, Piece)>,
}

impl Mailbox {
    pub fn start_position() -> Self {
        Self::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w")
    }

    /// Piece placement and side to move; any later FEN fields are ignored.
    pub fn from_fen(fen: &str) -> Self {
        let mut squares = [None; 64];
        let mut fields = fen.split_whitespace();
        let placement = fields.next().expect("empty FEN");

        let mut rank = 7usize;
        let mut file = 0usize;
        for c in placement.chars() {
            match c {
                '/' => {
                    rank -= 1;
                    file = 0;
                }
                '1'..='8' => file += c as usize - '0' as usize,
                _ => {
                    let color = if c.is_ascii_uppercase() { White } else { Black };
                    let piece = match c.to_ascii_lowercase() {
                        'p' => Pawn,
                        'n' => Knight,
                        'b' => Bishop,
                        'r' => Rook,
                        'q' => Queen,
                        'k' => King,
                        _ => panic!("bad FEN piece: {c}"),
                    };
                    squares[rank * 8 + file] = Some((color, piece));
                    file += 1;
                }
            }
        }
        let to_move = match fields.next() {
            Some("b") => Black,
            _ => White,
        };

        Self {
            squares,
            to_move,
            undo_stack: Vec::new(),
        }
    }

    fn king_square(&self, color: Color) -> Option<Square> {
        (0..64u8)
            .map(Square::from)
            .find(|sq| self.squares[sq.index()] == Some((color, King)))
    }

    fn in_check(&self, color: Color) -> bool {
        match self.king_square(color) {
            Some(king) => self.attacked_by(king, color.opponent()),
            None => false,
        }
    }

    fn attacked_by(&self, target: Square, attacker: Color) -> bool {
        for &(df, dr) in &KNIGHT_OFFSETS {
            if let Some(sq) = offset(target, df, dr) {
                if self.squares[sq.index()] == Some((attacker, Knight)) {
                    return true;
                }
            }
        }
        for &(df, dr) in &KING_OFFSETS {
            if let Some(sq) = offset(target, df, dr) {
                if self.squares[sq.index()] == Some((attacker, King)) {
                    return true;
                }
            }
        }
        // a pawn attacks the squares diagonally ahead of it
        let pawn_rank = match attacker {
            White => -1,
            Black => 1,
        };
        for df in [-1, 1] {
            if let Some(sq) = offset(target, df, pawn_rank) {
                if self.squares[sq.index()] == Some((attacker, Pawn)) {
                    return true;
                }
            }
        }
        for &(df, dr) in &ROOK_DIRS {
            let mut sq = target;
            while let Some(next) = offset(sq, df, dr) {
                sq = next;
                if let Some((color, piece)) = self.squares[sq.index()] {
                    if color == attacker && (piece == Rook || piece == Queen) {
                        return true;
                    }
                    break;
                }
            }
        }
        for &(df, dr) in &BISHOP_DIRS {
            let mut sq = target;
            while let Some(next) = offset(sq, df, dr) {
                sq = next;
                if let Some((color, piece)) = self.squares[sq.index()] {
                    if color == attacker && (piece == Bishop || piece == Queen) {
                        return true;
                    }
                    break;
                }
            }
        }
        false
    }

    fn pseudo_moves(&self, out: &mut Vec<Move>) {
        for index in 0..64u8 {
            let from = Square::from(index);
            match self.squares[from.index()] {
                Some((color, piece)) if color == self.to_move => match piece {
                    Pawn => self.pawn_moves(from, out),
                    Knight => self.leaper_moves(from, &KNIGHT_OFFSETS, out),
                    King => self.leaper_moves(from, &KING_OFFSETS, out),
                    Bishop => self.slider_moves(from, &BISHOP_DIRS, out),
                    Rook => self.slider_moves(from, &ROOK_DIRS, out),
                    Queen => {
                        self.slider_moves(from, &BISHOP_DIRS, out);
                        self.slider_moves(from, &ROOK_DIRS, out);
                    }
                },
                _ => {}
            }
        }
    }

    fn leaper_moves(&self, from: Square, offsets: &[(i8, i8)], out: &mut Vec<Move>) {
        for &(df, dr) in offsets {
            if let Some(to) = offset(from, df, dr) {
                match self.squares[to.index()] {
                    Some((color, _)) if color == self.to_move => {}
                    _ => out.push(Move::new(from, to)),
                }
            }
        }
    }

    fn slider_moves(&self, from: Square, dirs: &[(i8, i8)], out: &mut Vec<Move>) {
        for &(df, dr) in dirs {
            let mut sq = from;
            while let Some(to) = offset(sq, df, dr) {
                sq = to;
                match self.squares[to.index()] {
                    None => out.push(Move::new(from, to)),
                    Some((color, _)) => {
                        if color != self.to_move {
                            out.push(Move::new(from, to));
                        }
                        break;
                    }
                }
            }
        }
    }

    fn pawn_moves(&self, from: Square, out: &mut Vec<Move>) {
        let (step, start_rank) = match self.to_move {
            White => (1, 1),
            Black => (-1, 6),
        };

        if let Some(to) = offset(from, 0, step) {
            if self.squares[to.index()].is_none() {
                self.push_pawn_move(from, to, out);
                if from.rank() == start_rank {
                    if let Some(two) = offset(from, 0, 2 * step) {
                        if self.squares[two.index()].is_none() {
                            out.push(Move::new(from, two));
                        }
                    }
                }
            }
        }
        for df in [-1, 1] {
            if let Some(to) = offset(from, df, step) {
                if matches!(self.squares[to.index()], Some((color, _)) if color != self.to_move) {
                    self.push_pawn_move(from, to, out);
                }
            }
        }
    }

    fn push_pawn_move(&self, from: Square, to: Square, out: &mut Vec<Move>) {
        let promotion_rank = match self.to_move {
            White => 7,
            Black => 0,
        };
        if to.rank() == promotion_rank {
            for piece in [Queen, Rook, Bishop, Knight] {
                out.push(Move::promoting(from, to, piece));
            }
        } else {
            out.push(Move::new(from, to));
        }
    }

    fn apply(&mut self, mv: Move) {
        let moved = self.squares[mv.from.index()].expect("apply from an empty square");
        let captured = self.squares[mv.to.index()];
        self.squares[mv.from.index()] = None;
        self.squares[mv.to.index()] = Some(match mv.promotion {
            Some(piece) => (moved.0, piece),
            None => moved,
        });
        self.undo_stack.push(Undo {
            mv,
            moved,
            captured,
        });
        self.to_move = self.to_move.opponent();
    }

    fn revert(&mut self) {
        let undo = self.undo_stack.pop().expect("revert with no history");
        self.squares[undo.mv.from.index()] = Some(undo.moved);
        self.squares[undo.mv.to.index()] = undo.captured;
        self.to_move = self.to_move.opponent();
    }
}

impl Board for Mailbox {
    fn legal_moves(&mut self, moves: &mut MoveList) {
        let mut pseudo = Vec::with_capacity(64);
        self.pseudo_moves(&mut pseudo);
        let mover = self.to_move;
        for mv in pseudo {
            self.apply(mv);
            let safe = !self.in_check(mover);
            self.revert();
            if safe {
                moves.push(mv);
            }
        }
    }

    fn make_move(&mut self, mv: Move) -> bool {
        match self.squares[mv.from.index()] {
            Some((color, _)) if color == self.to_move => {
                self.apply(mv);
                true
            }
            _ => false,
        }
    }

    fn unmake_move(&mut self) {
        self.revert();
    }

    fn piece_on(&self, square: Square) -> Option<(Color, Piece)> {
        self.squares[square.index()]
    }

    fn current_player(&self) -> Color {
        self.to_move
    }

    fn status(&self) -> GameStatus {
        let mut probe = self.clone();
        let mut moves = MoveList::new();
        probe.legal_moves(&mut moves);
        if !moves.is_empty() {
            GameStatus::Ongoing
        } else if self.in_check(self.to_move) {
            GameStatus::Checkmate
        } else {
            GameStatus::Stalemate
        }
    }
}
