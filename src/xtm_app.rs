// Application context
// Built once in main and handed to the UI; the only home for session-wide settings

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::xtm_color::Palette;
use crate::xtm_config::Config;
use crate::xtm_error::Result;
use crate::xtm_game::GameState;
use crate::xtm_lang::Lang;

pub struct AppContext {
    pub config: Config,
    pub lang: Lang,
    pub palette: Palette,
    pub seed: Option<u64>, // fixed seed for reproducible boards
}

impl AppContext {
    pub fn new(config: Config, seed: Option<u64>, palette: Palette) -> Self {
        let lang = Lang::new(&config.language);
        AppContext {
            config,
            lang,
            palette,
            seed,
        }
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// Start a game with the configured board parameters
    pub fn new_game(&self) -> Result<GameState> {
        GameState::new(self.config.board_params(), self.rng())
    }
}
