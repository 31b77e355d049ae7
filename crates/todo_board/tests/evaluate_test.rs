//! Exhaustive checks of board evaluation over every possible board.

use todo_board::{evaluate, Board, Mark, Outcome, Square};

/// Decodes `n` (0..3^9) into a board, one base-3 digit per square.
fn board_from_code(mut n: u32) -> Board {
    let mut squares = [Square::Empty; 9];
    for square in squares.iter_mut() {
        *square = match n % 3 {
            0 => Square::Empty,
            1 => Square::Occupied(Mark::X),
            _ => Square::Occupied(Mark::O),
        };
        n /= 3;
    }
    Board::from_squares(squares)
}

fn uniform_lines(board: &Board) -> Vec<Mark> {
    const TRIPLES: [[usize; 3]; 8] = [
        [0, 1, 2],
        [3, 4, 5],
        [6, 7, 8],
        [0, 3, 6],
        [1, 4, 7],
        [2, 5, 8],
        [0, 4, 8],
        [2, 4, 6],
    ];
    let squares = board.squares();
    TRIPLES
        .iter()
        .filter_map(|[a, b, c]| match (squares[*a], squares[*b], squares[*c]) {
            (Square::Occupied(x), Square::Occupied(y), Square::Occupied(z)) if x == y && y == z => {
                Some(x)
            }
            _ => None,
        })
        .collect()
}

#[test]
fn test_evaluate_matches_definition_for_all_boards() {
    for code in 0..3u32.pow(9) {
        let board = board_from_code(code);
        let lines = uniform_lines(&board);
        let full = board.squares().iter().all(|s| *s != Square::Empty);

        match evaluate(&board) {
            Some(Outcome::Winner(mark)) => {
                assert!(lines.contains(&mark), "code {code}: winner without a line");
            }
            Some(Outcome::Draw) => {
                assert!(full && lines.is_empty(), "code {code}: bad draw");
            }
            None => {
                assert!(!full && lines.is_empty(), "code {code}: missed outcome");
            }
        }
    }
}

#[test]
fn test_evaluate_is_deterministic() {
    let board: Board = "XOXOXO...".parse().unwrap();
    assert_eq!(evaluate(&board), evaluate(&board.clone()));
}
