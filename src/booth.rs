// SPDX-License-Identifier: GPL-3.0-only

//! The kiosk render loop
//!
//! Pulls camera frames, feeds the state machine, and renders the returned
//! frame to the terminal using Unicode half-block characters. Keyboard
//! events are mapped to the same semantic actions as the physical buttons.

use crate::camera::Camera;
use crate::config::Config;
use crate::constants::LOOP_INTERVAL;
use crate::errors::{BoothResult, CameraError};
use crate::frame::Frame;
use crate::input::{ButtonDriver, ButtonPanel, NullButtons, SysfsButtons};
use crate::printing::PrintSpooler;
use crate::state::{BoothContext, KeyInput, KioskState};
use crate::storage::SessionStore;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal, backend::CrosstermBackend, buffer::Buffer, layout::Rect, style::Color,
    widgets::Widget,
};
use std::io::{self, stdout};
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use v4l::io::traits::CaptureStream;

/// How the kiosk should come up
pub struct RunOptions {
    /// Run the button/light diagnostic instead of the welcome flow
    pub test_buttons: bool,
    /// Stay in the current terminal screen instead of going fullscreen
    pub windowed: bool,
}

/// Run the kiosk until ESC is pressed or the camera fails
pub fn run(config: Config, options: RunOptions) -> BoothResult<()> {
    let driver: Box<dyn ButtonDriver> = match SysfsButtons::open(&config) {
        Some(buttons) => Box::new(buttons),
        None => {
            warn!("Running with keyboard input only");
            Box::new(NullButtons)
        }
    };

    let mut cx = BoothContext {
        panel: ButtonPanel::new(driver),
        store: SessionStore::new(&config.output_root),
        spooler: PrintSpooler::from_config(&config),
        mask_path: config.mask_path.clone(),
    };

    let camera = Camera::open(config.camera_index, config.camera_width, config.camera_height)?;

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    if !options.windowed {
        execute!(stdout, EnterAlternateScreen)?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_loop(&mut terminal, &camera, &mut cx, &options);

    // Restore terminal
    disable_raw_mode()?;
    if !options.windowed {
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    }
    terminal.show_cursor()?;

    result
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    camera: &Camera,
    cx: &mut BoothContext,
    options: &RunOptions,
) -> BoothResult<()> {
    let mut stream = camera.stream()?;

    let mut state = if options.test_buttons {
        KioskState::button_test()
    } else {
        KioskState::welcome()
    };
    let mut last_tick = Instant::now();

    loop {
        // A camera that stops yielding frames is fatal to the loop
        let (data, _meta) = stream
            .next()
            .map_err(|e| CameraError::StreamFailed(e.to_string()))?;
        let frame = camera.decode(data)?.mirrored();

        let now = Instant::now();
        let delta_time_s = now.duration_since(last_tick).as_secs_f64();
        last_tick = now;

        cx.panel.tick();

        let key = match poll_key(input_budget(delta_time_s))? {
            KeyPoll::Exit => break,
            KeyPoll::Input(key) => Some(key),
            KeyPoll::None => None,
        };

        let previous = state.name();
        let (display, next) = state.tick(frame, delta_time_s, key, cx);
        if next.name() != previous {
            debug!(from = previous, to = next.name(), "State transition");
        }
        state = next;

        terminal.draw(|f| {
            f.render_widget(FrameWidget { frame: &display }, f.area());
        })?;
    }

    Ok(())
}

/// Spend whatever is left of the loop interval waiting for input, at
/// least 1 ms so a slow camera cannot starve the keyboard
fn input_budget(delta_time_s: f64) -> Duration {
    LOOP_INTERVAL
        .saturating_sub(Duration::from_secs_f64(delta_time_s.max(0.0)))
        .max(Duration::from_millis(1))
}

enum KeyPoll {
    None,
    Input(KeyInput),
    Exit,
}

fn poll_key(timeout: Duration) -> io::Result<KeyPoll> {
    if event::poll(timeout)?
        && let Event::Key(key) = event::read()?
        && key.kind == KeyEventKind::Press
    {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Ok(KeyPoll::Exit);
        }
        return Ok(match key.code {
            KeyCode::Esc => KeyPoll::Exit,
            KeyCode::Char(' ') => KeyPoll::Input(KeyInput::Start),
            KeyCode::Char('y') => KeyPoll::Input(KeyInput::Confirm),
            KeyCode::Char('n') => KeyPoll::Input(KeyInput::Deny),
            _ => KeyPoll::None,
        });
    }
    Ok(KeyPoll::None)
}

/// Renders a frame with half-block characters, letterboxed to the area
struct FrameWidget<'a> {
    frame: &'a Frame,
}

impl Widget for FrameWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let image = self.frame.image();
        if image.width() == 0 || image.height() == 0 || area.width == 0 || area.height == 0 {
            return;
        }

        // Each terminal cell shows 2 vertical pixels: upper half (▀) with
        // the fg color, lower half with the bg color
        let frame_aspect = image.width() as f64 / image.height() as f64;
        let term_width = area.width as f64;
        let term_height = (area.height * 2) as f64;

        let (display_width, display_height) = if term_width / term_height > frame_aspect {
            let h = term_height;
            let w = h * frame_aspect;
            (w as u16, (h / 2.0) as u16)
        } else {
            let w = term_width;
            let h = w / frame_aspect;
            (w as u16, (h / 2.0) as u16)
        };

        let x_offset = area.x + (area.width.saturating_sub(display_width)) / 2;
        let y_offset = area.y + (area.height.saturating_sub(display_height)) / 2;

        let x_scale = image.width() as f64 / display_width.max(1) as f64;
        let y_scale = image.height() as f64 / (display_height.max(1) * 2) as f64;

        for ty in 0..display_height {
            for tx in 0..display_width {
                let term_x = x_offset + tx;
                let term_y = y_offset + ty;
                if term_x >= area.x + area.width || term_y >= area.y + area.height {
                    continue;
                }

                let src_x = (tx as f64 * x_scale) as u32;
                let src_y_top = (ty as f64 * 2.0 * y_scale) as u32;
                let src_y_bottom = ((ty as f64 * 2.0 + 1.0) * y_scale) as u32;

                let top = sample(image, src_x, src_y_top);
                let bottom = sample(image, src_x, src_y_bottom);

                if let Some(cell) = buf.cell_mut((term_x, term_y)) {
                    cell.set_char('▀');
                    cell.set_fg(top);
                    cell.set_bg(bottom);
                }
            }
        }
    }
}

fn sample(image: &image::RgbImage, x: u32, y: u32) -> Color {
    let pixel = image.get_pixel(x.min(image.width() - 1), y.min(image.height() - 1));
    Color::Rgb(pixel[0], pixel[1], pixel[2])
}
