// Session layer on top of the board
// Tracks the timer and the game outcome, and maps cells to the tiles the UI draws

use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use tracing::{debug, info, instrument, warn};

use crate::xtm_board::{Board, BoardParams, Coord, Reveal, RevealState};
use crate::xtm_error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    InProgress,
    Won,
    Lost,
}

/// Visual state of one cell as seen by the front end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tile {
    Hidden,
    RevealedBlank,
    RevealedCount(u8), // 1..=8
    Flagged,
    ExplodedMine,  // the mine that ended the game
    UnflaggedMine, // any other mine left unflagged at a loss
    WrongFlag,     // flag on a safe cell, shown only after a loss
}

/// Result of one interaction: cells whose tile changed, and the outcome afterwards
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Update {
    pub changed: Vec<Coord>,
    pub outcome: Outcome,
}

impl Update {
    fn unchanged(outcome: Outcome) -> Self {
        Update {
            changed: Vec::new(),
            outcome,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.outcome != Outcome::InProgress
    }
}

/// Main game state
pub struct GameState {
    params: BoardParams,
    rng: StdRng,
    board: Board,
    outcome: Outcome,
    detonated: Option<Coord>,    // mine hit on a loss
    start_time: Option<Instant>, // set on the first reveal or flag
    end_time: Option<Instant>,   // set when the outcome leaves InProgress
}

impl GameState {
    /// Start a session; the same RNG keeps feeding every restarted board
    pub fn new(params: BoardParams, mut rng: StdRng) -> Result<Self> {
        let board = Board::generate(&params, &mut rng)?;
        info!(
            width = params.width,
            height = params.height,
            mines = board.mine_count(),
            "new game"
        );
        Ok(GameState {
            params,
            rng,
            board,
            outcome: Outcome::InProgress,
            detonated: None,
            start_time: None,
            end_time: None,
        })
    }

    /// Throw the board away and deal a fresh one with the same parameters
    pub fn restart(&mut self) -> Result<()> {
        self.board = Board::generate(&self.params, &mut self.rng)?;
        self.outcome = Outcome::InProgress;
        self.detonated = None;
        self.start_time = None;
        self.end_time = None;
        info!(mines = self.board.mine_count(), "game restarted");
        Ok(())
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn width(&self) -> usize {
        self.board.width()
    }

    pub fn height(&self) -> usize {
        self.board.height()
    }

    pub fn mine_count(&self) -> usize {
        self.board.mine_count()
    }

    pub fn flag_count(&self) -> usize {
        self.board.flagged_count()
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    fn touch(&mut self) {
        if self.start_time.is_none() {
            self.start_time = Some(Instant::now());
            debug!("timer started");
        }
    }

    fn finish(&mut self, outcome: Outcome) {
        self.outcome = outcome;
        self.end_time = Some(Instant::now());
        info!(
            ?outcome,
            revealed = self.board.revealed_count(),
            flags = self.board.flagged_count(),
            correct_flags = self.board.correctly_flagged_count(),
            elapsed = %format_elapsed(self.elapsed()),
            "game over"
        );
    }

    /// Primary interaction on `(row, col)`
    #[instrument(level = "trace", skip(self))]
    pub fn reveal(&mut self, row: usize, col: usize) -> Update {
        if self.outcome != Outcome::InProgress {
            debug!(row, col, "ignoring reveal on finished game");
            return Update::unchanged(self.outcome);
        }
        match self.board.reveal(row, col) {
            Reveal::Ignored => {
                debug!(row, col, "ignoring reveal on flagged or revealed cell");
                Update::unchanged(self.outcome)
            }
            Reveal::Mine => {
                self.touch();
                warn!(row, col, "mine hit");
                self.detonated = Some((row, col));
                self.finish(Outcome::Lost);
                Update {
                    changed: self.loss_sweep(),
                    outcome: self.outcome,
                }
            }
            Reveal::Opened(opened) => {
                self.touch();
                debug!(row, col, opened = opened.len(), "cells revealed");
                if self.board.all_safe_revealed() {
                    self.finish(Outcome::Won);
                }
                Update {
                    changed: opened,
                    outcome: self.outcome,
                }
            }
        }
    }

    /// Secondary interaction on `(row, col)`: toggle a flag on a hidden cell
    #[instrument(level = "trace", skip(self))]
    pub fn flag(&mut self, row: usize, col: usize) -> Update {
        if self.outcome != Outcome::InProgress {
            debug!(row, col, "ignoring flag on finished game");
            return Update::unchanged(self.outcome);
        }
        match self.board.toggle_flag(row, col) {
            Some(state) => {
                self.touch();
                debug!(row, col, flagged = state == RevealState::Flagged, "flag toggled");
                Update {
                    changed: vec![(row, col)],
                    outcome: self.outcome,
                }
            }
            None => {
                debug!(row, col, "ignoring flag on revealed cell");
                Update::unchanged(self.outcome)
            }
        }
    }

    // Cells whose tile differs once the game is lost: unflagged mines and misplaced flags
    fn loss_sweep(&self) -> Vec<Coord> {
        self.board
            .iter()
            .filter(|(_, cell)| cell.is_mine() != (cell.state() == RevealState::Flagged))
            .map(|(pos, _)| pos)
            .collect()
    }

    pub fn tile(&self, row: usize, col: usize) -> Tile {
        let cell = self.board.cell(row, col);
        if self.outcome == Outcome::Lost {
            match (cell.is_mine(), cell.state()) {
                (true, RevealState::Flagged) => return Tile::Flagged,
                (true, _) if self.detonated == Some((row, col)) => return Tile::ExplodedMine,
                (true, _) => return Tile::UnflaggedMine,
                (false, RevealState::Flagged) => return Tile::WrongFlag,
                _ => {}
            }
        }
        match cell.state() {
            RevealState::Hidden => Tile::Hidden,
            RevealState::Flagged => Tile::Flagged,
            RevealState::Revealed => match cell.adjacent_mines() {
                0 => Tile::RevealedBlank,
                n => Tile::RevealedCount(n),
            },
        }
    }

    /// Time since the first interaction, frozen once the game is over
    pub fn elapsed_at(&self, now: Instant) -> Duration {
        match self.start_time {
            Some(t0) => self.end_time.unwrap_or(now).saturating_duration_since(t0),
            None => Duration::ZERO,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed_at(Instant::now())
    }
}

/// Format a duration as `HH:MM:SS`; hours keep growing past 99
pub fn format_elapsed(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, secs / 60 % 60, secs % 60)
}

#[cfg(test)]
impl GameState {
    pub(crate) fn start_time(&self) -> Option<Instant> {
        self.start_time
    }

    pub(crate) fn with_board(board: Board) -> Self {
        use rand::SeedableRng;
        GameState {
            params: BoardParams {
                width: board.width(),
                height: board.height(),
                mine_probability: 0.1,
            },
            rng: StdRng::seed_from_u64(0),
            board,
            outcome: Outcome::InProgress,
            detonated: None,
            start_time: None,
            end_time: None,
        }
    }
}
