use serde::Serialize;

use crate::models::Mark;

pub const BOARD_CELLS: usize = 9;

/// Rows, columns, then diagonals.
pub const WINNING_LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "winner")]
pub enum MatchStatus {
    InProgress,
    Won(Mark),
    Draw,
}

impl MatchStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, MatchStatus::InProgress)
    }
}

/// Result of a placement attempt. Invalid placements leave the board
/// untouched and are reported as `Ignored`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Placed { mark: Mark, status: MatchStatus },
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Board {
    cells: [Option<Mark>; BOARD_CELLS],
    next_turn: Mark,
    status: MatchStatus,
}

impl Default for Board {
    fn default() -> Self {
        Self {
            cells: [None; BOARD_CELLS],
            next_turn: Mark::X,
            status: MatchStatus::InProgress,
        }
    }
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cells(&self) -> &[Option<Mark>; BOARD_CELLS] {
        &self.cells
    }

    pub fn next_turn(&self) -> Mark {
        self.next_turn
    }

    pub fn status(&self) -> MatchStatus {
        self.status
    }

    /// Places the mark whose turn it is. Only an empty cell of an
    /// in-progress board is accepted.
    pub fn place_mark(&mut self, index: usize) -> Placement {
        if self.status.is_terminal() || index >= BOARD_CELLS || self.cells[index].is_some() {
            return Placement::Ignored;
        }

        let mark = self.next_turn;
        self.cells[index] = Some(mark);
        self.next_turn = mark.other();
        self.status = evaluate(&self.cells);

        Placement::Placed {
            mark,
            status: self.status,
        }
    }
}

/// First complete line wins; a full board with no line is a draw.
pub fn evaluate(cells: &[Option<Mark>; BOARD_CELLS]) -> MatchStatus {
    if let Some(mark) = winner(cells) {
        return MatchStatus::Won(mark);
    }
    if cells.iter().all(Option::is_some) {
        return MatchStatus::Draw;
    }
    MatchStatus::InProgress
}

pub fn winner(cells: &[Option<Mark>; BOARD_CELLS]) -> Option<Mark> {
    WINNING_LINES.iter().find_map(|&[a, b, c]| match cells[a] {
        Some(mark) if cells[b] == Some(mark) && cells[c] == Some(mark) => Some(mark),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn play(board: &mut Board, moves: &[usize]) -> Placement {
        let mut last = Placement::Ignored;
        for &index in moves {
            last = board.place_mark(index);
        }
        last
    }

    #[test]
    fn challenger_wins_top_row() {
        let mut board = Board::new();
        let last = play(&mut board, &[0, 4, 1, 5, 2]);
        assert_eq!(
            last,
            Placement::Placed {
                mark: Mark::X,
                status: MatchStatus::Won(Mark::X)
            }
        );
        assert_eq!(board.status(), MatchStatus::Won(Mark::X));
    }

    #[test]
    fn every_winning_line_wins_before_board_is_full() {
        for line in WINNING_LINES {
            for mark in [Mark::X, Mark::O] {
                let mut cells = [None; BOARD_CELLS];
                for index in line {
                    cells[index] = Some(mark);
                }
                assert_eq!(evaluate(&cells), MatchStatus::Won(mark), "line {line:?}");
                assert!(cells.iter().any(Option::is_none));
            }
        }
    }

    #[test]
    fn every_winning_line_wins_through_play() {
        for line in WINNING_LINES {
            // Fill the line with X, answering with O on cells outside it.
            let mut others = (0..BOARD_CELLS).filter(|i| !line.contains(i));
            let mut board = Board::new();
            let mut last = Placement::Ignored;
            for (turn, &index) in line.iter().enumerate() {
                last = board.place_mark(index);
                if turn < 2 {
                    let reply = others.next().unwrap();
                    assert!(matches!(board.place_mark(reply), Placement::Placed { .. }));
                }
            }
            assert_eq!(
                last,
                Placement::Placed {
                    mark: Mark::X,
                    status: MatchStatus::Won(Mark::X)
                },
                "line {line:?}"
            );
        }
    }

    #[test]
    fn full_board_without_line_is_draw() {
        // X O X / X O O / O X X
        let mut board = Board::new();
        let last = play(&mut board, &[0, 1, 2, 4, 3, 5, 7, 6, 8]);
        assert_eq!(
            last,
            Placement::Placed {
                mark: Mark::X,
                status: MatchStatus::Draw
            }
        );
        assert_eq!(winner(board.cells()), None);
    }

    #[test]
    fn occupied_cell_is_ignored() {
        let mut board = Board::new();
        board.place_mark(4);
        let before = board.clone();
        assert_eq!(board.place_mark(4), Placement::Ignored);
        assert_eq!(board, before);
        assert_eq!(board.next_turn(), Mark::O);
    }

    #[test]
    fn no_placement_after_terminal_state() {
        let mut board = Board::new();
        play(&mut board, &[0, 4, 1, 5, 2]);
        assert_eq!(board.place_mark(8), Placement::Ignored);
        assert_eq!(board.cells()[8], None);
    }

    #[test]
    fn out_of_range_index_is_ignored() {
        let mut board = Board::new();
        assert_eq!(board.place_mark(BOARD_CELLS), Placement::Ignored);
    }

    #[test]
    fn turns_alternate_from_x() {
        let mut board = Board::new();
        assert_eq!(board.next_turn(), Mark::X);
        assert!(matches!(board.place_mark(0), Placement::Placed { mark: Mark::X, .. }));
        assert!(matches!(board.place_mark(1), Placement::Placed { mark: Mark::O, .. }));
        assert_eq!(board.next_turn(), Mark::X);
    }

    #[test]
    fn status_serializes_with_winner() {
        let json = serde_json::to_value(MatchStatus::Won(Mark::O)).unwrap();
        assert_eq!(json["state"], "Won");
        assert_eq!(json["winner"], "O");
        let json = serde_json::to_value(MatchStatus::Draw).unwrap();
        assert_eq!(json["state"], "Draw");
    }
}
