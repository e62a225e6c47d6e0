use std::time::{Duration, Instant};

use crate::board::Board;
use crate::error::{DeadlineExceeded, SearchResult};
use crate::eval_params::EvalParams;
use crate::evaluate::evaluate;
use crate::moves::{Move, MoveList};
use crate::options::SearchOptions;
use crate::transposition_table::{NodeType, TranspositionTable};
use crate::types::{Color, GameStatus};
use crate::zobrist::ZobristTable;

pub const CHECKMATE_SCORE: i32 = 100_000;
pub const DRAW_SCORE: i32 = 0;
/// Scores at or beyond this magnitude encode a forced mate.
pub const MATE_BOUND: i32 = CHECKMATE_SCORE - 1_000;

const MINUS_INF: i32 = i32::MIN + 1;
const INF: i32 = i32::MAX - 1;

/// The move-search engine. Owns the Zobrist numbers and transposition
/// table for its lifetime; both persist across `choose_best` calls so
/// later searches reuse earlier results.
pub struct Search {
    options: SearchOptions,
    params: EvalParams,
    zobrist: ZobristTable,
    transposition_table: TranspositionTable,
    deadline: Instant,
    nodes: u64,
    tt_hits: u64,
}

impl Search {
    pub fn new() -> Self {
        Self::with_options(SearchOptions::default())
    }

    pub fn with_options(options: SearchOptions) -> Self {
        Self {
            params: EvalParams::default(),
            zobrist: ZobristTable::new(options.zobrist_seed),
            transposition_table: TranspositionTable::new(options.tt_entries),
            deadline: Instant::now(),
            nodes: 0,
            tt_hits: 0,
            options,
        }
    }

    /// Drop every cached search result.
    pub fn reset_tables(&mut self) {
        self.transposition_table.clear();
    }

    /// Nodes visited by the most recent `choose_best` call.
    pub fn nodes(&self) -> u64 {
        self.nodes
    }

    /// Pick the strongest move available within `budget`, or `None` when
    /// the game is already over or the budget does not cover even a
    /// depth-1 pass. Deepens iteratively and always answers with the move
    /// from the last depth that ran to completion; an aborted pass never
    /// replaces it. The board comes back exactly as it went in.
    pub fn choose_best<B: Board>(&mut self, board: &mut B, budget: Duration) -> Option<Move> {
        let start = Instant::now();
        self.deadline = start + budget;
        self.nodes = 0;
        self.tt_hits = 0;

        let mut best_move = None;
        for depth in 1..=self.options.max_depth {
            match self.search_root(board, depth) {
                Ok((score, Some(mv))) => {
                    best_move = Some(mv);
                    log::debug!(
                        "depth {depth} score {score} best {mv} nodes {} tt_hits {} time {}ms",
                        self.nodes,
                        self.tt_hits,
                        start.elapsed().as_millis(),
                    );
                    if score.abs() >= MATE_BOUND {
                        // forced mate, deeper passes cannot improve on it
                        break;
                    }
                }
                // no legal moves: the game is already over
                Ok((_, None)) => return None,
                Err(DeadlineExceeded) => {
                    log::trace!(
                        "depth {depth} cancelled after {}ms",
                        start.elapsed().as_millis()
                    );
                    break;
                }
            }
        }
        best_move
    }

    /// One pass over the root moves at the given depth. The same move loop
    /// as `negamax`, except it keeps *which* move scored best and never
    /// takes a transposition cutoff: the root has to produce a move, not
    /// just a score.
    fn search_root<B: Board>(
        &mut self,
        board: &mut B,
        depth: i8,
    ) -> SearchResult<(i32, Option<Move>)> {
        self.check_deadline()?;
        self.nodes += 1;

        let mut moves = MoveList::new();
        board.legal_moves(&mut moves);
        if moves.is_empty() {
            return Ok((self.terminal_score(board, depth), None));
        }
        self.order_moves(board, &mut moves);

        let hash = self.zobrist.hash(board);
        let mut alpha = MINUS_INF;
        let mut best_move = None;
        for i in 0..moves.len() {
            let (mv, _) = moves.pick_move(i);
            if !board.make_move(mv) {
                continue;
            }
            let result = self.negamax(board, depth - 1, -INF, -alpha);
            board.unmake_move();
            let score = -result?;
            if score > alpha || best_move.is_none() {
                alpha = score;
                best_move = Some(mv);
            }
        }
        self.transposition_table
            .store(hash, depth, alpha, NodeType::Exact);
        Ok((alpha, best_move))
    }

    /// Fail-hard negamax alpha-beta. Scores are always from the
    /// perspective of the side to move at this node; a child's result is
    /// negated before use. Deadline expiry unwinds as `Err`, with every
    /// frame undoing its applied move first.
    fn negamax<B: Board>(
        &mut self,
        board: &mut B,
        depth: i8,
        mut alpha: i32,
        beta: i32,
    ) -> SearchResult<i32> {
        self.check_deadline()?;

        if depth <= 0 {
            return self.quiesce(board, alpha, beta, self.options.qsearch_depth);
        }
        self.nodes += 1;

        let hash = self.zobrist.hash(board);
        if let Some(score) = self.transposition_table.lookup(hash, depth, alpha, beta) {
            self.tt_hits += 1;
            return Ok(score);
        }

        let mut moves = MoveList::new();
        board.legal_moves(&mut moves);
        if moves.is_empty() {
            return Ok(self.terminal_score(board, depth));
        }
        self.order_moves(board, &mut moves);

        let mut raised_alpha = false;
        for i in 0..moves.len() {
            let (mv, _) = moves.pick_move(i);
            if !board.make_move(mv) {
                continue;
            }
            let result = self.negamax(board, depth - 1, -beta, -alpha);
            board.unmake_move();
            let score = -result?;
            if score >= beta {
                self.transposition_table
                    .store(hash, depth, beta, NodeType::LowerBound);
                return Ok(beta);
            }
            if score > alpha {
                alpha = score;
                raised_alpha = true;
            }
        }

        let node_type = if raised_alpha {
            NodeType::Exact
        } else {
            NodeType::UpperBound
        };
        self.transposition_table.store(hash, depth, alpha, node_type);
        Ok(alpha)
    }

    /// Capture-only search run at the horizon so a position mid-exchange
    /// is never judged by its static score alone.
    fn quiesce<B: Board>(
        &mut self,
        board: &mut B,
        mut alpha: i32,
        beta: i32,
        cap_depth: i8,
    ) -> SearchResult<i32> {
        self.check_deadline()?;
        self.nodes += 1;

        // stand pat: some quiet move is assumed to be at least this good
        let stand_pat = evaluate(board, &self.params);
        if stand_pat >= beta {
            return Ok(beta);
        }
        alpha = alpha.max(stand_pat);
        if cap_depth <= 0 {
            // capture budget spent, treat remaining tactics as settled
            return Ok(alpha);
        }

        let mut moves = MoveList::new();
        board.legal_moves(&mut moves);
        moves.retain(|mv| board.piece_on(mv.to).is_some() || mv.promotion.is_some());

        // biggest victims first
        for sm in moves.inner_mut() {
            let mut score = 0;
            if let Some((_, victim)) = board.piece_on(sm.mv.to) {
                score += self.params.piece_values[victim];
            }
            if sm.mv.promotion.is_some() {
                score += 900;
            }
            sm.score = score;
        }

        for i in 0..moves.len() {
            let (mv, _) = moves.pick_move(i);
            if !board.make_move(mv) {
                continue;
            }
            let result = self.quiesce(board, -beta, -alpha, cap_depth - 1);
            board.unmake_move();
            let score = -result?;
            if score >= beta {
                return Ok(beta);
            }
            alpha = alpha.max(score);
        }
        Ok(alpha)
    }

    /// Rank moves best-guess-first so the alpha-beta loop prunes early.
    /// Ordering never changes the search value, only how soon cutoffs
    /// arrive. Scores live on the `SortingMove` slots, not the moves.
    fn order_moves<B: Board>(&self, board: &B, moves: &mut MoveList) {
        for sm in moves.inner_mut() {
            let mut score = 0;

            if let (Some((_, victim)), Some((_, attacker))) =
                (board.piece_on(sm.mv.to), board.piece_on(sm.mv.from))
            {
                // most valuable victim, least valuable attacker
                score += 1_000 + 10 * self.params.piece_values[victim]
                    - self.params.piece_values[attacker];
            }
            if sm.mv.promotion.is_some() {
                score += 900;
            }
            if let Some((color, piece)) = board.piece_on(sm.mv.from) {
                let table = &self.params.piece_tables[piece];
                let (from, to) = match color {
                    Color::White => (sm.mv.from.flip(), sm.mv.to.flip()),
                    Color::Black => (sm.mv.from, sm.mv.to),
                };
                score += table[to.index()] - table[from.index()];
            }

            sm.score = score;
        }
    }

    /// Score for a node with no legal moves. Mate scores carry the
    /// remaining depth so lines that mate sooner outrank lines that mate
    /// later; they are returned directly and never cached, since the bias
    /// makes them wrong at any other depth.
    fn terminal_score<B: Board>(&self, board: &B, depth: i8) -> i32 {
        match board.status() {
            GameStatus::Checkmate => -CHECKMATE_SCORE + (self.options.max_depth - depth) as i32,
            _ => DRAW_SCORE,
        }
    }

    #[inline]
    fn check_deadline(&self) -> SearchResult<()> {
        if Instant::now() >= self.deadline {
            Err(DeadlineExceeded)
        } else {
            Ok(())
        }
    }
}

impl Default for Search {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval_params::EVAL_PARAMS;
    use crate::mailbox::Mailbox;
    use crate::options::MAX_DEPTH;
    use crate::types::{GameStatus, Piece, Square};

    fn far_deadline(search: &mut Search) {
        search.deadline = Instant::now() + Duration::from_secs(3600);
    }

    fn snapshot(board: &Mailbox) -> ([Option<(Color, Piece)>; 64], Color) {
        let mut squares = [None; 64];
        for index in 0..64u8 {
            let square = Square::from(index);
            squares[square.index()] = board.piece_on(square);
        }
        (squares, board.current_player())
    }

    /// Full-width negamax with no pruning, no caching, no quiescence:
    /// the value the engine has to agree with.
    fn plain_negamax(board: &mut Mailbox, depth: i8, max_depth: i8) -> i32 {
        if depth <= 0 {
            return evaluate(board, &EVAL_PARAMS);
        }
        let mut moves = MoveList::new();
        board.legal_moves(&mut moves);
        if moves.is_empty() {
            return match board.status() {
                GameStatus::Checkmate => -CHECKMATE_SCORE + (max_depth - depth) as i32,
                _ => DRAW_SCORE,
            };
        }
        let mut best = MINUS_INF;
        for mv in moves.iter().collect::<Vec<_>>() {
            if !board.make_move(mv) {
                continue;
            }
            let score = -plain_negamax(board, depth - 1, max_depth);
            board.unmake_move();
            best = best.max(score);
        }
        best
    }

    #[test]
    fn finds_mate_in_one() {
        let mut board = Mailbox::from_fen("6k1/5ppp/8/8/8/8/5PPP/R5K1 w");
        let mut search = Search::new();

        let best = search
            .choose_best(&mut board, Duration::from_millis(2000))
            .unwrap();
        assert_eq!(best.coords(), "a1a8");
    }

    #[test]
    fn mate_scores_carry_the_bias() {
        let mut board = Mailbox::from_fen("6k1/5ppp/8/8/8/8/5PPP/R5K1 w");
        let mut search = Search::new();
        far_deadline(&mut search);

        let (score, best) = search.search_root(&mut board, 2).unwrap();
        assert!(score >= MATE_BOUND, "got a plain material score: {score}");
        assert_eq!(best.unwrap().coords(), "a1a8");
    }

    #[test]
    fn finished_games_yield_no_move() {
        // checkmated
        let mut board = Mailbox::from_fen("R5k1/5ppp/8/8/8/8/8/6K1 b");
        let mut search = Search::new();
        assert_eq!(
            search.choose_best(&mut board, Duration::from_millis(100)),
            None
        );

        // stalemated
        let mut board = Mailbox::from_fen("7k/5Q2/6K1/8/8/8/8/8 b");
        assert_eq!(
            search.choose_best(&mut board, Duration::from_millis(100)),
            None
        );
    }

    #[test]
    fn stalemate_scores_as_a_draw() {
        let mut board = Mailbox::from_fen("7k/5Q2/6K1/8/8/8/8/8 b");
        let mut search = Search::new();
        far_deadline(&mut search);

        assert_eq!(
            search.negamax(&mut board, 3, MINUS_INF, INF),
            Ok(DRAW_SCORE)
        );
    }

    #[test]
    fn zero_budget_yields_no_move_and_no_damage() {
        let mut board = Mailbox::start_position();
        let before = snapshot(&board);
        let mut search = Search::new();

        assert_eq!(search.choose_best(&mut board, Duration::ZERO), None);
        assert_eq!(snapshot(&board), before);
    }

    #[test]
    fn cancelled_search_restores_the_board() {
        let mut board = Mailbox::start_position();
        let before = snapshot(&board);
        let mut search = Search::new();

        // small enough to cancel somewhere mid-pass
        let _ = search.choose_best(&mut board, Duration::from_millis(25));
        assert_eq!(snapshot(&board), before);
    }

    #[test]
    fn completed_search_restores_the_board() {
        let mut board = Mailbox::from_fen("r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w");
        let before = snapshot(&board);
        let mut search = Search::new();
        far_deadline(&mut search);

        search.negamax(&mut board, 3, MINUS_INF, INF).unwrap();
        assert_eq!(snapshot(&board), before);
    }

    #[test]
    fn repeated_searches_pick_the_same_move() {
        let options = SearchOptions {
            max_depth: 3,
            ..SearchOptions::default()
        };
        let mut board = Mailbox::start_position();
        let mut search = Search::with_options(options);

        let first = search.choose_best(&mut board, Duration::from_secs(600));
        search.reset_tables();
        let second = search.choose_best(&mut board, Duration::from_secs(600));

        assert!(first.is_some());
        assert_eq!(first, second);
    }

    #[test]
    fn pruning_preserves_the_minimax_value() {
        for fen in [
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w",
            "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w",
            "4k3/8/8/3q4/8/2B5/8/4K2R b",
        ] {
            let mut board = Mailbox::from_fen(fen);
            let mut search = Search::with_options(SearchOptions {
                tt_entries: 0,
                qsearch_depth: 0,
                ..SearchOptions::default()
            });
            far_deadline(&mut search);

            for depth in 1..=3 {
                let expected = plain_negamax(&mut board, depth, MAX_DEPTH);
                let got = search.negamax(&mut board, depth, MINUS_INF, INF).unwrap();
                assert_eq!(got, expected, "fen {fen} depth {depth}");
            }
        }
    }

    #[test]
    fn quiescence_stays_within_its_window() {
        let mut board = Mailbox::from_fen("rnb1kbnr/pppp1ppp/8/4p3/3P4/8/PPP1PPPP/RNBQKBNR w");
        let mut search = Search::new();
        far_deadline(&mut search);

        for (alpha, beta) in [(-50, 50), (-1000, -900), (0, 1), (MINUS_INF, INF)] {
            let score = search
                .quiesce(&mut board, alpha, beta, search.options.qsearch_depth)
                .unwrap();
            assert!(score <= beta, "window ({alpha}, {beta}) gave {score}");
            assert!(score >= alpha, "window ({alpha}, {beta}) gave {score}");
        }
    }

    #[test]
    fn cached_results_feed_later_sessions() {
        let options = SearchOptions {
            max_depth: 3,
            ..SearchOptions::default()
        };
        let mut board = Mailbox::start_position();
        let mut search = Search::with_options(options);

        let _ = search.choose_best(&mut board, Duration::from_secs(600));
        let _ = search.choose_best(&mut board, Duration::from_secs(600));
        assert!(search.tt_hits > 0);
    }

    #[test]
    fn promotion_is_chosen_when_it_wins() {
        let options = SearchOptions {
            max_depth: 3,
            ..SearchOptions::default()
        };
        let mut board = Mailbox::from_fen("8/4P1k1/8/8/8/8/8/4K3 w");
        let mut search = Search::with_options(options);

        let best = search
            .choose_best(&mut board, Duration::from_secs(600))
            .unwrap();
        assert_eq!(best.coords(), "e7e8q");
        assert_eq!(best.promotion, Some(Piece::Queen));
    }

    /// Collaborator that lists a move it then refuses to apply; the
    /// engine must skip it without penalty.
    struct Glitchy {
        inner: Mailbox,
    }

    impl Board for Glitchy {
        fn legal_moves(&mut self, moves: &mut MoveList) {
            // from an empty square, refused at apply time
            moves.push(Move::from_coords("a3a4").unwrap());
            self.inner.legal_moves(moves);
        }
        fn make_move(&mut self, mv: Move) -> bool {
            self.inner.make_move(mv)
        }
        fn unmake_move(&mut self) {
            self.inner.unmake_move()
        }
        fn piece_on(&self, square: Square) -> Option<(Color, Piece)> {
            self.inner.piece_on(square)
        }
        fn current_player(&self) -> Color {
            self.inner.current_player()
        }
        fn status(&self) -> GameStatus {
            self.inner.status()
        }
    }

    #[test]
    fn refused_moves_are_skipped_silently() {
        let mut board = Glitchy {
            inner: Mailbox::from_fen("6k1/5ppp/8/8/8/8/5PPP/R5K1 w"),
        };
        let mut search = Search::new();

        let best = search
            .choose_best(&mut board, Duration::from_millis(2000))
            .unwrap();
        assert_eq!(best.coords(), "a1a8");
    }

    #[test]
    fn chosen_move_is_always_legal() {
        let mut board = Mailbox::start_position();
        let mut search = Search::new();

        let best = search
            .choose_best(&mut board, Duration::from_millis(200))
            .unwrap();
        let mut legal = MoveList::new();
        board.legal_moves(&mut legal);
        assert!(legal.iter().any(|mv| mv == best));
    }
}
