// Board model: mine placement, adjacency counts and per-cell reveal/flag transitions
// Knows nothing about timers, outcomes or rendering; see xtm_game for the session layer

use std::collections::VecDeque;

use rand::Rng;
use tracing::debug;

use crate::xtm_error::{Error, Result};

/// Largest width or height a board may have; keeps the drawn board within terminal coordinates
pub const MAX_BOARD_SIDE: usize = 1000;

/// Cell position as (row, col)
pub type Coord = (usize, usize);

const NEIGHBOR_OFFSETS: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Enumerate the grid-adjacent positions of `(row, col)`, clipped to a `width x height` board.
/// Positions that would fall off the board are simply not produced.
pub fn neighbors(width: usize, height: usize, (row, col): Coord) -> impl Iterator<Item = Coord> {
    NEIGHBOR_OFFSETS.into_iter().filter_map(move |(dr, dc)| {
        let r = row.checked_add_signed(dr)?;
        let c = col.checked_add_signed(dc)?;
        (r < height && c < width).then_some((r, c))
    })
}

/// Dimensions and per-cell mine probability for a new board
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoardParams {
    pub width: usize,
    pub height: usize,
    pub mine_probability: f64,
}

impl Default for BoardParams {
    fn default() -> Self {
        BoardParams {
            width: 10,
            height: 10,
            mine_probability: 0.1,
        }
    }
}

impl BoardParams {
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::EmptyBoard {
                width: self.width,
                height: self.height,
            });
        }
        if self.width > MAX_BOARD_SIDE || self.height > MAX_BOARD_SIDE {
            return Err(self.too_large());
        }
        // NaN fails the range check as well
        if !(0.0..=1.0).contains(&self.mine_probability) {
            return Err(Error::MineProbability(self.mine_probability));
        }
        Ok(())
    }

    /// Total number of cells, or an error if the product does not fit
    pub fn cell_count(&self) -> Result<usize> {
        self.width
            .checked_mul(self.height)
            .ok_or_else(|| self.too_large())
    }

    fn too_large(&self) -> Error {
        Error::BoardTooLarge {
            width: self.width,
            height: self.height,
            max: MAX_BOARD_SIDE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealState {
    Hidden,
    Revealed,
    Flagged,
}

/// A single board position. Mine and adjacency data are fixed once the board exists.
#[derive(Debug, Clone, Copy)]
pub struct Cell {
    mine: bool,
    adj: u8,
    state: RevealState,
}

impl Cell {
    pub fn is_mine(&self) -> bool {
        self.mine
    }

    pub fn adjacent_mines(&self) -> u8 {
        self.adj
    }

    pub fn state(&self) -> RevealState {
        self.state
    }
}

/// Outcome of a primary interaction at the board level
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reveal {
    /// Target was flagged or already revealed
    Ignored,
    /// Target holds a mine; no cell was touched
    Mine,
    /// Cells that flipped from Hidden to Revealed, target first
    Opened(Vec<Coord>),
}

#[derive(Debug, Clone)]
pub struct Board {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
    mines: usize,
    revealed: usize,
    flagged: usize,
    correctly_flagged: usize,
}

impl Board {
    /// Draw every cell's mine status as an independent Bernoulli trial.
    /// The realized mine count varies from board to board.
    pub fn generate<R: Rng + ?Sized>(params: &BoardParams, rng: &mut R) -> Result<Board> {
        params.validate()?;
        let mask = (0..params.cell_count()?)
            .map(|_| rng.gen_bool(params.mine_probability))
            .collect();
        let board = Board::from_mask(params.width, params.height, mask);
        debug!(
            width = board.width,
            height = board.height,
            mines = board.mines,
            "generated board"
        );
        Ok(board)
    }

    /// Build a board from a row-major mine mask and compute adjacency counts
    pub fn from_mask(width: usize, height: usize, mask: Vec<bool>) -> Board {
        assert_eq!(
            mask.len(),
            width * height,
            "mine mask does not match a {}x{} board",
            width,
            height
        );
        let mut board = Board {
            width,
            height,
            mines: mask.iter().filter(|m| **m).count(),
            cells: mask
                .into_iter()
                .map(|mine| Cell {
                    mine,
                    adj: 0,
                    state: RevealState::Hidden,
                })
                .collect(),
            revealed: 0,
            flagged: 0,
            correctly_flagged: 0,
        };
        for idx in 0..board.cells.len() {
            let adj = neighbors(width, height, board.coord(idx))
                .filter(|&(r, c)| board.cells[r * width + c].mine)
                .count() as u8;
            board.cells[idx].adj = adj;
        }
        board
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn mine_count(&self) -> usize {
        self.mines
    }

    pub fn revealed_count(&self) -> usize {
        self.revealed
    }

    pub fn flagged_count(&self) -> usize {
        self.flagged
    }

    pub fn correctly_flagged_count(&self) -> usize {
        self.correctly_flagged
    }

    /// Number of cells that must be revealed to win
    pub fn safe_cells(&self) -> usize {
        self.width * self.height - self.mines
    }

    pub fn all_safe_revealed(&self) -> bool {
        self.revealed == self.safe_cells()
    }

    /// Linear offset of `(row, col)`. Coordinates outside the board are a caller bug.
    pub fn index(&self, row: usize, col: usize) -> usize {
        assert!(
            row < self.height && col < self.width,
            "cell ({}, {}) is outside the {}x{} board",
            row,
            col,
            self.width,
            self.height
        );
        row * self.width + col
    }

    pub fn coord(&self, idx: usize) -> Coord {
        (idx / self.width, idx % self.width)
    }

    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        &self.cells[self.index(row, col)]
    }

    /// All cells in row-major order together with their coordinates
    pub fn iter(&self) -> impl Iterator<Item = (Coord, &Cell)> {
        self.cells
            .iter()
            .enumerate()
            .map(move |(idx, cell)| (self.coord(idx), cell))
    }

    /// Primary interaction. Opens the target and, from a zero-count target,
    /// flood-reveals the connected blank region and its numbered border.
    pub fn reveal(&mut self, row: usize, col: usize) -> Reveal {
        let idx = self.index(row, col);
        match self.cells[idx].state {
            RevealState::Flagged | RevealState::Revealed => return Reveal::Ignored,
            RevealState::Hidden => {}
        }
        if self.cells[idx].mine {
            return Reveal::Mine;
        }
        let mut opened = Vec::new();
        self.open(idx, &mut opened);
        if self.cells[idx].adj == 0 {
            self.flood(idx, &mut opened);
        }
        Reveal::Opened(opened)
    }

    fn open(&mut self, idx: usize, opened: &mut Vec<Coord>) {
        debug_assert!(self.cells[idx].state == RevealState::Hidden && !self.cells[idx].mine);
        self.cells[idx].state = RevealState::Revealed;
        self.revealed += 1;
        opened.push(self.coord(idx));
    }

    // Breadth-first over linear offsets. A cell leaves Hidden before it is queued,
    // so the reveal state doubles as the visited marker.
    fn flood(&mut self, origin: usize, opened: &mut Vec<Coord>) {
        let mut queue = VecDeque::from([origin]);
        while let Some(idx) = queue.pop_front() {
            for (r, c) in neighbors(self.width, self.height, self.coord(idx)) {
                let nidx = r * self.width + c;
                if self.cells[nidx].state != RevealState::Hidden {
                    continue;
                }
                self.open(nidx, opened);
                if self.cells[nidx].adj == 0 {
                    queue.push_back(nidx);
                }
            }
        }
    }

    /// Secondary interaction: Hidden <-> Flagged. Revealed cells are left alone.
    /// Returns the new state, or None when nothing changed.
    pub fn toggle_flag(&mut self, row: usize, col: usize) -> Option<RevealState> {
        let idx = self.index(row, col);
        let cell = &mut self.cells[idx];
        match cell.state {
            RevealState::Hidden => {
                cell.state = RevealState::Flagged;
                self.flagged += 1;
                if cell.mine {
                    self.correctly_flagged += 1;
                }
            }
            RevealState::Flagged => {
                cell.state = RevealState::Hidden;
                self.flagged -= 1;
                if cell.mine {
                    self.correctly_flagged -= 1;
                }
            }
            RevealState::Revealed => return None,
        }
        Some(cell.state)
    }
}

#[cfg(test)]
pub(crate) fn board_with_mines(width: usize, height: usize, mines: &[Coord]) -> Board {
    let mut mask = vec![false; width * height];
    for &(r, c) in mines {
        mask[r * width + c] = true;
    }
    Board::from_mask(width, height, mask)
}
