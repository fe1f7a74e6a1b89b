use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{cursor, execute, terminal};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Span, Spans, Text};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::{Frame, Terminal};
use std::error::Error;
use std::io;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use unicode_width::UnicodeWidthStr;

use crate::xtm_app::AppContext;
use crate::xtm_board::Coord;
use crate::xtm_color::Palette;
use crate::xtm_game::{GameState, Outcome, Tile, Update, format_elapsed};
use crate::xtm_lang::fill;

const MIN_TERM_WIDTH: u16 = 64;

/// Last tile drawn for every cell. Only cells named by an `Update` are refreshed.
struct TileCache {
    width: usize,
    tiles: Vec<Tile>,
}

impl TileCache {
    fn new(game: &GameState) -> Self {
        let tiles = game
            .board()
            .iter()
            .map(|((r, c), _)| game.tile(r, c))
            .collect();
        TileCache {
            width: game.width(),
            tiles,
        }
    }

    fn apply(&mut self, game: &GameState, update: &Update) {
        for &(r, c) in &update.changed {
            self.tiles[r * self.width + c] = game.tile(r, c);
        }
    }

    fn get(&self, r: usize, c: usize) -> Tile {
        self.tiles[r * self.width + c]
    }
}

// Runtime UI variables grouped into a single structure
#[derive(Debug)]
struct UiState {
    cursor: Coord,
    prompt: Option<Outcome>, // game over prompt showing for this outcome
    prompt_yes: bool,        // keyboard focus on the Yes button
    board_rect: Option<Rect>,
    yes_rect: Option<Rect>,
    no_rect: Option<Rect>,
    quit: bool,
}

impl UiState {
    fn new() -> Self {
        UiState {
            cursor: (0, 0),
            prompt: None,
            prompt_yes: true,
            board_rect: None,
            yes_rect: None,
            no_rect: None,
            quit: false,
        }
    }

    fn step_cursor(&mut self, game: &GameState, dr: isize, dc: isize) {
        let r = (self.cursor.0 as isize + dr).clamp(0, game.height() as isize - 1) as usize;
        let c = (self.cursor.1 as isize + dc).clamp(0, game.width() as isize - 1) as usize;
        self.cursor = (r, c);
    }
}

struct Glyphs {
    hidden: &'static str,
    flag: &'static str,
    mine: &'static str,
    wrong: &'static str,
}

impl Glyphs {
    fn new(ascii: bool) -> Self {
        if ascii {
            Glyphs {
                hidden: "#",
                flag: "F",
                mine: "*",
                wrong: "X",
            }
        } else {
            Glyphs {
                hidden: "■",
                flag: "⚑",
                mine: "☼",
                wrong: "✗",
            }
        }
    }
}

fn tile_cell(tile: Tile, glyphs: &Glyphs, palette: &Palette) -> (String, Style) {
    let base = Style::default().bg(palette.board_bg);
    match tile {
        Tile::Hidden => (glyphs.hidden.to_string(), base.fg(palette.hidden_fg)),
        Tile::RevealedBlank => (" ".to_string(), base),
        Tile::RevealedCount(n) => (
            n.to_string(),
            base.fg(palette.number(n)).add_modifier(Modifier::BOLD),
        ),
        Tile::Flagged => (glyphs.flag.to_string(), base.fg(palette.flag_fg)),
        Tile::ExplodedMine => (
            glyphs.mine.to_string(),
            base.fg(palette.mine_fg).bg(palette.exploded_bg),
        ),
        Tile::UnflaggedMine => (glyphs.mine.to_string(), base.fg(palette.mine_fg)),
        Tile::WrongFlag => (
            glyphs.wrong.to_string(),
            base.fg(palette.wrong_fg).add_modifier(Modifier::BOLD),
        ),
    }
}

/// Map a terminal position to the board cell drawn there (two columns per cell)
fn cell_at(board: Rect, width: usize, height: usize, column: u16, row: u16) -> Option<Coord> {
    let (x0, y0) = (board.x + 1, board.y + 1);
    if column < x0 || row < y0 {
        return None;
    }
    let r = (row - y0) as usize;
    let c = ((column - x0) / 2) as usize;
    (r < height && c < width).then_some((r, c))
}

fn hit(rect: Option<Rect>, column: u16, row: u16) -> bool {
    rect.is_some_and(|r| {
        column >= r.x && column < r.x + r.width && row >= r.y && row < r.y + r.height
    })
}

// Outer size of the bordered board: two columns per cell plus padding
fn board_extent(game: &GameState) -> (u16, u16) {
    let clamp = |n: usize| u16::try_from(n).unwrap_or(u16::MAX);
    (
        clamp(game.width().saturating_mul(2).saturating_add(3)),
        clamp(game.height().saturating_add(2)),
    )
}

fn min_size(game: &GameState) -> (u16, u16) {
    let (w, h) = board_extent(game);
    (w.max(MIN_TERM_WIDTH), h.saturating_add(6))
}

/// Lay out left and right spans on one line, padding the gap by display width
fn spread<'a>(left: Vec<Span<'a>>, right: Vec<Span<'a>>, inner_w: usize) -> Spans<'a> {
    let used: usize = left
        .iter()
        .chain(right.iter())
        .map(|s| UnicodeWidthStr::width(&*s.content))
        .sum();
    let mut spans = left;
    spans.push(Span::raw(" ".repeat(inner_w.saturating_sub(used).max(1))));
    spans.extend(right);
    Spans::from(spans)
}

fn draw<B: Backend>(
    f: &mut Frame<B>,
    ctx: &AppContext,
    game: &GameState,
    tiles: &TileCache,
    ui: &mut UiState,
) {
    let size = f.size();
    let assets = &ctx.lang.assets;
    let palette = &ctx.palette;

    // If terminal too small, render a centered warning and skip normal UI
    let (min_w, min_h) = min_size(game);
    if size.width < min_w || size.height < min_h {
        let warn_lines = vec![
            Spans::from(Span::raw(assets.tsmsg_line1)),
            Spans::from(Span::raw(fill(
                assets.tsmsg_line2,
                format!("{} x {}", min_w, min_h),
            ))),
        ];
        let warn = Paragraph::new(Text::from(warn_lines))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(assets.tsmsg_title),
            )
            .alignment(Alignment::Center);
        f.render_widget(Clear, size);
        let area = center_rect(
            40u16.min(size.width.saturating_sub(2)),
            5u16.min(size.height.saturating_sub(2)),
            size,
        );
        f.render_widget(warn, area);
        ui.board_rect = None;
        ui.yes_rect = None;
        ui.no_rect = None;
        return;
    }

    // layout: top row (time + key hints), center board, bottom row (mines + flags)
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(0)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Min(board_extent(game).1),
                Constraint::Length(3),
            ]
            .as_ref(),
        )
        .split(size);

    let key_style = Style::default()
        .fg(palette.key_fg)
        .add_modifier(Modifier::BOLD);
    let mut hints = Vec::new();
    for (key, label) in [
        ("Space", assets.hint_reveal),
        ("F", assets.hint_flag),
        ("F2", assets.hint_new),
        ("Esc", assets.hint_exit),
    ] {
        if !hints.is_empty() {
            hints.push(Span::raw("   "));
        }
        hints.push(Span::styled(key, key_style));
        hints.push(Span::raw(format!(": {}", label)));
    }
    hints.push(Span::raw(" "));
    let time_label = format!(" {}", format_elapsed(game.elapsed()));
    let top = spread(
        vec![Span::styled(time_label, Style::default().add_modifier(Modifier::BOLD))],
        hints,
        chunks[0].width.saturating_sub(2) as usize,
    );
    f.render_widget(
        Paragraph::new(top).block(Block::default().borders(Borders::ALL)),
        chunks[0],
    );

    let status = spread(
        vec![Span::raw(format!(" {}", fill(assets.mines_fmt, game.mine_count())))],
        vec![Span::raw(format!("{} ", fill(assets.flags_fmt, game.flag_count())))],
        chunks[2].width.saturating_sub(2) as usize,
    );
    f.render_widget(
        Paragraph::new(status).block(Block::default().borders(Borders::ALL)),
        chunks[2],
    );

    // board area
    let glyphs = Glyphs::new(ctx.config.ascii_icons);
    let (board_w, board_h) = board_extent(game);
    let board_area = center_rect(board_w, board_h, chunks[1]);
    ui.board_rect = Some(board_area);
    let mut lines = vec![];
    for r in 0..game.height() {
        let mut spans = vec![];
        for c in 0..game.width() {
            let (s, mut style) = tile_cell(tiles.get(r, c), &glyphs, palette);
            if ui.cursor == (r, c) && ui.prompt.is_none() {
                style = style.bg(palette.cursor_bg);
            }
            spans.push(Span::styled(format!(" {}", s), style));
        }
        // one-character padding column so the right edge keeps the board background
        spans.push(Span::styled(" ", Style::default().bg(palette.board_bg)));
        lines.push(Spans::from(spans));
    }
    let board = Paragraph::new(Text::from(lines)).block(
        Block::default()
            .borders(Borders::ALL)
            .title(assets.board_title)
            .title_alignment(Alignment::Center),
    );
    f.render_widget(board, board_area);

    ui.yes_rect = None;
    ui.no_rect = None;
    if let Some(outcome) = ui.prompt {
        let message = if outcome == Outcome::Won {
            assets.win_prompt
        } else {
            assets.loss_prompt
        };
        let pb = bottom_centered_block(36, 7, size);
        f.render_widget(Clear, pb);
        f.render_widget(
            Block::default()
                .borders(Borders::ALL)
                .title(assets.game_over_title),
            pb,
        );
        let inner = Rect::new(
            pb.x + 1,
            pb.y + 1,
            pb.width.saturating_sub(2),
            pb.height.saturating_sub(2),
        );
        let lines = vec![Spans::from(Span::raw("")), Spans::from(Span::raw(message))];
        f.render_widget(
            Paragraph::new(Text::from(lines)).alignment(Alignment::Center),
            inner,
        );

        // Yes / No buttons on the last inner row
        let yes_w = assets.btn_yes.width() as u16;
        let no_w = assets.btn_no.width() as u16;
        let gap = 4u16;
        let bx = inner.x + inner.width.saturating_sub(yes_w + gap + no_w) / 2;
        let by = inner.y + inner.height.saturating_sub(1);
        let yes_rect = Rect::new(bx, by, yes_w, 1);
        let no_rect = Rect::new(bx + yes_w + gap, by, no_w, 1);
        let button = |focused: bool| {
            let bg = if focused {
                palette.cursor_bg
            } else {
                palette.button_bg
            };
            Style::default()
                .bg(bg)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD)
        };
        f.render_widget(
            Paragraph::new(Span::styled(assets.btn_yes, button(ui.prompt_yes))),
            yes_rect,
        );
        f.render_widget(
            Paragraph::new(Span::styled(assets.btn_no, button(!ui.prompt_yes))),
            no_rect,
        );
        ui.yes_rect = Some(yes_rect);
        ui.no_rect = Some(no_rect);
    }
}

fn apply(update: Update, game: &GameState, tiles: &mut TileCache, ui: &mut UiState) {
    tiles.apply(game, &update);
    if update.is_finished() {
        ui.prompt = Some(update.outcome);
        ui.prompt_yes = true;
    }
}

fn restart(
    game: &mut GameState,
    tiles: &mut TileCache,
    ui: &mut UiState,
) -> Result<(), Box<dyn Error>> {
    game.restart()?;
    *tiles = TileCache::new(game);
    ui.prompt = None;
    ui.prompt_yes = true;
    Ok(())
}

// Game over prompt: yes deals a new board, no ends the session
fn answer(
    yes: bool,
    game: &mut GameState,
    tiles: &mut TileCache,
    ui: &mut UiState,
) -> Result<(), Box<dyn Error>> {
    debug!(play_again = yes, "game over prompt answered");
    if yes {
        restart(game, tiles, ui)
    } else {
        ui.quit = true;
        Ok(())
    }
}

fn handle_key(
    code: KeyCode,
    game: &mut GameState,
    tiles: &mut TileCache,
    ui: &mut UiState,
) -> Result<(), Box<dyn Error>> {
    if ui.prompt.is_some() {
        match code {
            KeyCode::Char('y') | KeyCode::Char('Y') => answer(true, game, tiles, ui)?,
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                answer(false, game, tiles, ui)?
            }
            KeyCode::Enter | KeyCode::Char(' ') => answer(ui.prompt_yes, game, tiles, ui)?,
            KeyCode::Left | KeyCode::Right | KeyCode::Tab => ui.prompt_yes = !ui.prompt_yes,
            _ => {}
        }
        return Ok(());
    }

    let (r, c) = ui.cursor;
    match code {
        KeyCode::Esc | KeyCode::Char('q') => ui.quit = true,
        KeyCode::F(2) => restart(game, tiles, ui)?,
        KeyCode::Left => ui.step_cursor(game, 0, -1),
        KeyCode::Right => ui.step_cursor(game, 0, 1),
        KeyCode::Up => ui.step_cursor(game, -1, 0),
        KeyCode::Down => ui.step_cursor(game, 1, 0),
        KeyCode::Char(' ') | KeyCode::Enter => {
            let update = game.reveal(r, c);
            apply(update, game, tiles, ui);
        }
        KeyCode::Char('f') | KeyCode::Char('F') => {
            let update = game.flag(r, c);
            apply(update, game, tiles, ui);
        }
        _ => {}
    }
    Ok(())
}

fn handle_mouse(
    me: MouseEvent,
    game: &mut GameState,
    tiles: &mut TileCache,
    ui: &mut UiState,
) -> Result<(), Box<dyn Error>> {
    if ui.prompt.is_some() {
        match me.kind {
            MouseEventKind::Moved => {
                if hit(ui.yes_rect, me.column, me.row) {
                    ui.prompt_yes = true;
                } else if hit(ui.no_rect, me.column, me.row) {
                    ui.prompt_yes = false;
                }
            }
            MouseEventKind::Down(MouseButton::Left) => {
                if hit(ui.yes_rect, me.column, me.row) {
                    answer(true, game, tiles, ui)?;
                } else if hit(ui.no_rect, me.column, me.row) {
                    answer(false, game, tiles, ui)?;
                }
            }
            _ => {}
        }
        return Ok(());
    }

    let Some(board) = ui.board_rect else {
        return Ok(());
    };
    let Some((r, c)) = cell_at(board, game.width(), game.height(), me.column, me.row) else {
        return Ok(());
    };
    match me.kind {
        MouseEventKind::Moved => ui.cursor = (r, c),
        MouseEventKind::Down(MouseButton::Left) => {
            ui.cursor = (r, c);
            let update = game.reveal(r, c);
            apply(update, game, tiles, ui);
        }
        MouseEventKind::Down(MouseButton::Right) => {
            ui.cursor = (r, c);
            let update = game.flag(r, c);
            apply(update, game, tiles, ui);
        }
        _ => {}
    }
    Ok(())
}

fn handle_event(
    ev: Event,
    game: &mut GameState,
    tiles: &mut TileCache,
    ui: &mut UiState,
) -> Result<(), Box<dyn Error>> {
    match ev {
        Event::Key(KeyEvent {
            code,
            kind: KeyEventKind::Press,
            ..
        }) => handle_key(code, game, tiles, ui),
        Event::Mouse(me) => handle_mouse(me, game, tiles, ui),
        // resize and the rest are picked up by the next draw
        _ => Ok(()),
    }
}

fn event_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    ctx: &AppContext,
    game: &mut GameState,
    tiles: &mut TileCache,
    ui: &mut UiState,
) -> Result<(), Box<dyn Error>> {
    let tick_rate = ctx.config.tick_rate();
    let mut last_tick = Instant::now();

    while !ui.quit {
        terminal.draw(|f| draw(f, ctx, game, tiles, ui))?;

        // the time label is refreshed by the redraw at the top of every tick
        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));
        if event::poll(timeout)? {
            handle_event(event::read()?, game, tiles, ui)?;
        }
        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }
    }
    Ok(())
}

/// Raw mode, alternate screen and mouse capture for as long as the guard lives.
/// Dropping it restores the terminal, including while unwinding from a panic.
struct TerminalGuard {
    restore: fn(),
}

impl TerminalGuard {
    fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        let guard = TerminalGuard {
            restore: restore_terminal,
        };
        execute!(io::stdout(), EnableMouseCapture, terminal::EnterAlternateScreen)?;
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        (self.restore)();
    }
}

fn restore_terminal() {
    // best effort: there is nowhere left to report a failure
    let _ = disable_raw_mode();
    let _ = execute!(
        io::stdout(),
        DisableMouseCapture,
        terminal::LeaveAlternateScreen,
        cursor::Show
    );
}

pub fn run(ctx: &AppContext) -> Result<(), Box<dyn Error>> {
    // Deal the first board before touching the terminal so setup errors print normally
    let mut game = ctx.new_game()?;
    let mut tiles = TileCache::new(&game);
    let mut ui = UiState::new();

    let guard = TerminalGuard::enter()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
    info!("terminal UI started");

    let result = event_loop(&mut terminal, ctx, &mut game, &mut tiles, &mut ui);

    drop(guard);
    info!("terminal UI closed");
    result
}

fn center_rect(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

fn bottom_centered_block(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + r.height.saturating_sub(height);
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xtm_board::{MAX_BOARD_SIDE, board_with_mines};
    use std::sync::atomic::{AtomicBool, Ordering};
    use crate::xtm_color::Depth;
    use crate::xtm_config::Config;
    use crossterm::event::KeyModifiers;
    use ratatui::backend::TestBackend;
    use ratatui::buffer::Buffer;

    fn context() -> AppContext {
        let mut config = Config::default();
        config.language = "en".to_string();
        AppContext::new(config, Some(5), Palette::new(Depth::Basic))
    }

    fn screen(buffer: &Buffer) -> String {
        let width = buffer.area.width as usize;
        buffer
            .content()
            .chunks(width)
            .map(|row| row.iter().map(|cell| cell.symbol.as_str()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn render(
        terminal: &mut Terminal<TestBackend>,
        ctx: &AppContext,
        game: &GameState,
        tiles: &TileCache,
        ui: &mut UiState,
    ) -> String {
        terminal.draw(|f| draw(f, ctx, game, tiles, ui)).unwrap();
        screen(terminal.backend().buffer())
    }

    fn click(button: MouseButton, column: u16, row: u16) -> Event {
        Event::Mouse(MouseEvent {
            kind: MouseEventKind::Down(button),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        })
    }

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    // terminal position of the glyph for cell (r, c)
    fn cell_pos(ui: &UiState, (r, c): Coord) -> (u16, u16) {
        let b = ui.board_rect.expect("board drawn");
        (b.x + 1 + c as u16 * 2 + 1, b.y + 1 + r as u16)
    }

    #[test]
    fn cell_hit_testing() {
        let board = Rect::new(10, 5, 2 * 4 + 3, 3 + 2);
        assert_eq!(cell_at(board, 4, 3, 11, 6), Some((0, 0)));
        assert_eq!(cell_at(board, 4, 3, 12, 6), Some((0, 0)));
        assert_eq!(cell_at(board, 4, 3, 13, 7), Some((1, 1)));
        assert_eq!(cell_at(board, 4, 3, 18, 8), Some((2, 3)));
        assert_eq!(cell_at(board, 4, 3, 10, 6), None);
        assert_eq!(cell_at(board, 4, 3, 19, 6), None);
        assert_eq!(cell_at(board, 4, 3, 11, 9), None);
    }

    #[test]
    fn labels_and_hidden_board_are_drawn() {
        let ctx = context();
        let game = GameState::with_board(board_with_mines(4, 4, &[(3, 3)]));
        let tiles = TileCache::new(&game);
        let mut ui = UiState::new();
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();

        let text = render(&mut terminal, &ctx, &game, &tiles, &mut ui);
        assert!(text.contains("00:00:00"));
        assert!(text.contains("Mines: 1"));
        assert!(text.contains("Flags: 0"));
        assert_eq!(text.matches('■').count(), 16);
    }

    #[test]
    fn small_terminal_shows_resize_notice() {
        let ctx = context();
        let game = GameState::with_board(board_with_mines(10, 10, &[]));
        let tiles = TileCache::new(&game);
        let mut ui = UiState::new();
        let mut terminal = Terminal::new(TestBackend::new(50, 12)).unwrap();

        let text = render(&mut terminal, &ctx, &game, &tiles, &mut ui);
        assert!(text.contains("Resize needed"));
        assert!(ui.board_rect.is_none());
    }

    #[test]
    fn mouse_clicks_reveal_and_flag() {
        let ctx = context();
        let mut game = GameState::with_board(board_with_mines(3, 3, &[(1, 1)]));
        let mut tiles = TileCache::new(&game);
        let mut ui = UiState::new();
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        render(&mut terminal, &ctx, &game, &tiles, &mut ui);

        let (x, y) = cell_pos(&ui, (0, 2));
        handle_event(click(MouseButton::Right, x, y), &mut game, &mut tiles, &mut ui).unwrap();
        assert_eq!(tiles.get(0, 2), Tile::Flagged);

        // a flagged cell ignores the primary button
        handle_event(click(MouseButton::Left, x, y), &mut game, &mut tiles, &mut ui).unwrap();
        assert_eq!(tiles.get(0, 2), Tile::Flagged);

        let (x, y) = cell_pos(&ui, (2, 0));
        handle_event(click(MouseButton::Left, x, y), &mut game, &mut tiles, &mut ui).unwrap();
        assert_eq!(tiles.get(2, 0), Tile::RevealedCount(1));
        assert_eq!(ui.cursor, (2, 0));

        let text = render(&mut terminal, &ctx, &game, &tiles, &mut ui);
        assert!(text.contains("Flags: 1"));
        assert!(text.contains('⚑'));
    }

    #[test]
    fn losing_shows_prompt_and_yes_restarts() {
        let ctx = context();
        let mut game = GameState::with_board(board_with_mines(3, 3, &[(1, 1)]));
        let mut tiles = TileCache::new(&game);
        let mut ui = UiState::new();
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();

        handle_event(key(KeyCode::Char('f')), &mut game, &mut tiles, &mut ui).unwrap();
        handle_event(key(KeyCode::Down), &mut game, &mut tiles, &mut ui).unwrap();
        handle_event(key(KeyCode::Right), &mut game, &mut tiles, &mut ui).unwrap();
        handle_event(key(KeyCode::Char(' ')), &mut game, &mut tiles, &mut ui).unwrap();

        assert_eq!(ui.prompt, Some(Outcome::Lost));
        assert_eq!(tiles.get(1, 1), Tile::ExplodedMine);
        assert_eq!(tiles.get(0, 0), Tile::WrongFlag);

        let text = render(&mut terminal, &ctx, &game, &tiles, &mut ui);
        assert!(text.contains("YOU LOSE! PLAY AGAIN?"));
        assert!(text.contains('✗'));

        // board input is ignored while the prompt is up
        handle_event(key(KeyCode::Char('f')), &mut game, &mut tiles, &mut ui).unwrap();
        assert_eq!(game.flag_count(), 1);

        let yes = ui.yes_rect.expect("prompt drawn");
        handle_event(click(MouseButton::Left, yes.x, yes.y), &mut game, &mut tiles, &mut ui)
            .unwrap();
        assert!(ui.prompt.is_none());
        assert!(!ui.quit);
        assert_eq!(game.outcome(), Outcome::InProgress);
        assert_eq!(game.flag_count(), 0);
        assert!(game.start_time().is_none());
    }

    #[test]
    fn winning_prompt_no_quits() {
        let ctx = context();
        let mut game = GameState::with_board(board_with_mines(4, 4, &[(3, 3)]));
        let mut tiles = TileCache::new(&game);
        let mut ui = UiState::new();
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();

        handle_event(key(KeyCode::Enter), &mut game, &mut tiles, &mut ui).unwrap();
        assert_eq!(ui.prompt, Some(Outcome::Won));
        assert_eq!(tiles.get(3, 3), Tile::Hidden);

        let text = render(&mut terminal, &ctx, &game, &tiles, &mut ui);
        assert!(text.contains("YOU WIN! PLAY AGAIN?"));

        handle_event(key(KeyCode::Char('n')), &mut game, &mut tiles, &mut ui).unwrap();
        assert!(ui.quit);
    }

    #[test]
    fn widest_board_fits_terminal_coordinates() {
        let game = GameState::with_board(board_with_mines(MAX_BOARD_SIDE, 1, &[]));
        assert_eq!(min_size(&game), (2003, 9));

        let ctx = context();
        let tiles = TileCache::new(&game);
        let mut ui = UiState::new();
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        let text = render(&mut terminal, &ctx, &game, &tiles, &mut ui);
        assert!(text.contains("Resize needed"));
    }

    #[test]
    fn terminal_is_restored_when_the_loop_panics() {
        static RESTORED: AtomicBool = AtomicBool::new(false);
        fn mark_restored() {
            RESTORED.store(true, Ordering::SeqCst);
        }

        let result = std::panic::catch_unwind(|| {
            let _guard = TerminalGuard {
                restore: mark_restored,
            };
            panic!("event loop failed");
        });
        assert!(result.is_err());
        assert!(RESTORED.load(Ordering::SeqCst));
    }

    #[test]
    fn cursor_stays_on_the_board() {
        let mut game = GameState::with_board(board_with_mines(2, 2, &[]));
        let mut tiles = TileCache::new(&game);
        let mut ui = UiState::new();
        for code in [KeyCode::Up, KeyCode::Left] {
            handle_event(key(code), &mut game, &mut tiles, &mut ui).unwrap();
        }
        assert_eq!(ui.cursor, (0, 0));
        for _ in 0..3 {
            handle_event(key(KeyCode::Down), &mut game, &mut tiles, &mut ui).unwrap();
            handle_event(key(KeyCode::Right), &mut game, &mut tiles, &mut ui).unwrap();
        }
        assert_eq!(ui.cursor, (1, 1));
    }
}
