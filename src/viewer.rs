//! Interactive slice viewer
//!
//! The screen is a pure function of [`ViewState`]. Key presses become
//! [`ViewMessage`]s, [`ViewState::update`] folds them into a new state, and
//! the frame is redrawn before the next key is read.

use crate::display::{print_image_at, DisplaySize};
use crate::image::{render_view, RenderSettings};
use crate::volume::{CanonicalVolume, Plane};
use crate::window::{WindowFormula, WindowLimits, WindowParams};
use anyhow::{Context, Result};
use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen,
};
use std::io::{self, Write};
use tracing::{debug, info};

const HELP: &str = "<-/-> slice  Tab plane  Up/Down level  +/- width  r reset  q quit";

/// One user intent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMessage {
    PrevSlice,
    NextSlice,
    NextPlane,
    LevelUp,
    LevelDown,
    WidthUp,
    WidthDown,
    Reset,
    Quit,
}

impl ViewMessage {
    #[must_use]
    pub fn from_key(key: KeyEvent) -> Option<Self> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Some(Self::Quit);
        }

        let message = match key.code {
            KeyCode::Left | KeyCode::Char('h') => Self::PrevSlice,
            KeyCode::Right | KeyCode::Char('l') => Self::NextSlice,
            KeyCode::Tab => Self::NextPlane,
            KeyCode::Up | KeyCode::Char('k') => Self::LevelUp,
            KeyCode::Down | KeyCode::Char('j') => Self::LevelDown,
            KeyCode::Char('+' | '=') => Self::WidthUp,
            KeyCode::Char('-' | '_') => Self::WidthDown,
            KeyCode::Char('r') => Self::Reset,
            KeyCode::Char('q') | KeyCode::Esc => Self::Quit,
            _ => return None,
        };
        Some(message)
    }
}

/// Everything `update` may not move past
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBounds {
    /// Canonical volume extents along x, y, z
    pub extents: [usize; 3],
    /// `None` when windowing is off
    pub limits: Option<WindowLimits>,
    pub initial_window: Option<WindowParams>,
    pub start_plane: Plane,
    pub multiview: bool,
}

/// What the screen shows
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewState {
    /// Plane the slice keys act on
    pub plane: Plane,
    /// Current slice index per plane, indexed by axis
    pub indices: [usize; 3],
    pub window: Option<WindowParams>,
}

impl ViewState {
    /// Mid slices and the starting window
    #[must_use]
    pub fn initial(bounds: &ViewBounds) -> Self {
        Self {
            plane: bounds.start_plane,
            indices: bounds.extents.map(|n| n / 2),
            window: bounds.initial_window,
        }
    }

    #[must_use]
    pub fn index(&self, plane: Plane) -> usize {
        self.indices[plane.axis()]
    }

    #[must_use]
    pub fn update(self, message: ViewMessage, bounds: &ViewBounds) -> Self {
        let axis = self.plane.axis();
        let last = bounds.extents[axis].saturating_sub(1);
        let mut next = self;

        match message {
            ViewMessage::PrevSlice => next.indices[axis] = self.indices[axis].saturating_sub(1),
            ViewMessage::NextSlice => next.indices[axis] = (self.indices[axis] + 1).min(last),
            ViewMessage::NextPlane if bounds.multiview => next.plane = self.plane.next(),
            ViewMessage::NextPlane | ViewMessage::Quit => {}
            ViewMessage::LevelUp | ViewMessage::LevelDown => {
                next.window = self.adjust(bounds, |w, limits| {
                    let step = limits.level_step();
                    let level = if message == ViewMessage::LevelUp {
                        w.level() + step
                    } else {
                        w.level() - step
                    };
                    limits.clamp(level, w.width())
                });
            }
            ViewMessage::WidthUp | ViewMessage::WidthDown => {
                next.window = self.adjust(bounds, |w, limits| {
                    let step = limits.width_step();
                    let width = if message == ViewMessage::WidthUp {
                        w.width() + step
                    } else {
                        w.width() - step
                    };
                    limits.clamp(w.level(), width)
                });
            }
            ViewMessage::Reset => next = Self::initial(bounds),
        }

        next
    }

    fn adjust(
        &self,
        bounds: &ViewBounds,
        f: impl FnOnce(&WindowParams, &WindowLimits) -> WindowParams,
    ) -> Option<WindowParams> {
        match (self.window, bounds.limits) {
            (Some(window), Some(limits)) => Some(f(&window, &limits)),
            (window, _) => window,
        }
    }

    fn status_line(&self, bounds: &ViewBounds) -> String {
        let axis = self.plane.axis();
        let slice = format!(
            "{} {}/{}",
            self.plane,
            self.indices[axis],
            bounds.extents[axis].saturating_sub(1)
        );
        match self.window {
            Some(w) => format!("{slice}  {w}  |  {HELP}"),
            None => format!("{slice}  |  {HELP}"),
        }
    }
}

/// Raw mode and alternate screen for the lifetime of the guard
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<Self> {
        terminal::enable_raw_mode().context("Failed to enable raw terminal mode")?;
        let guard = Self;
        execute!(io::stdout(), EnterAlternateScreen, Hide)
            .context("Failed to enter alternate screen")?;
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), Show, LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

/// Run the key loop until the user quits
pub fn run_interactive(
    volume: &CanonicalVolume,
    planes: &[Plane],
    bounds: &ViewBounds,
    formula: WindowFormula,
    settings: RenderSettings,
    size: DisplaySize,
) -> Result<()> {
    let _guard = TerminalGuard::enter()?;
    let mut state = ViewState::initial(bounds);
    info!("Interactive viewer started on {} plane(s)", planes.len());

    loop {
        draw(volume, planes, bounds, &state, formula, settings, &size)?;

        let message = next_message()?;
        if message == ViewMessage::Quit {
            break;
        }
        state = state.update(message, bounds);
        debug!("{message:?} -> {state:?}");
    }

    Ok(())
}

fn next_message() -> Result<ViewMessage> {
    loop {
        if let Event::Key(key) = event::read().context("Failed to read terminal event")?
            && key.kind == KeyEventKind::Press
            && let Some(message) = ViewMessage::from_key(key)
        {
            return Ok(message);
        }
    }
}

fn draw(
    volume: &CanonicalVolume,
    planes: &[Plane],
    bounds: &ViewBounds,
    state: &ViewState,
    formula: WindowFormula,
    settings: RenderSettings,
    size: &DisplaySize,
) -> Result<()> {
    let views: Vec<(Plane, usize)> = planes.iter().map(|&p| (p, state.index(p))).collect();
    let settings = RenderSettings {
        windowing: state.window.map(|w| (w, formula)),
        ..settings
    };
    let image = render_view(volume, &views, &settings)?;

    let mut stdout = io::stdout();
    execute!(stdout, Clear(ClearType::All), MoveTo(0, 0)).context("Failed to clear screen")?;
    write!(stdout, "{}\r\n", state.status_line(bounds)).context("Failed to write status line")?;

    print_image_at(&image, size, 1)
}
