// SPDX-License-Identifier: GPL-3.0-only

//! The kiosk state machine
//!
//! One closed enum with a variant per kiosk phase. `tick` consumes the
//! current state and returns the frame to display plus the next state, so
//! a transition always replaces the state wholly and the elapsed-time
//! accumulators restart from zero. Every slow operation is either a fast
//! local file write or a child process polled across ticks; `tick` itself
//! never blocks and never panics on I/O failure.

use crate::compositor;
use crate::constants::{
    CAPTURE_FADE_SECS, COUNTDOWN_SECS, DISPLAY_SIZE, PHOTOS_PER_SESSION, PRINTING_IDLE_SECS,
};
use crate::frame::Frame;
use crate::input::ButtonPanel;
use crate::printing::{PrintJob, PrintSpooler};
use crate::storage::{Session, SessionStore};
use image::Rgb;
use std::path::PathBuf;
use tracing::{error, info, warn};

/// Discrete keyboard input, equivalent to the debounced button edges
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    /// Space: begin a session, or skip the countdown
    Start,
    /// 'y': print the composite
    Confirm,
    /// 'n': end the session without printing
    Deny,
}

/// External collaborators injected into every tick
pub struct BoothContext {
    pub panel: ButtonPanel,
    pub store: SessionStore,
    pub spooler: PrintSpooler,
    pub mask_path: Option<PathBuf>,
}

/// Current kiosk phase; exactly one is live at any tick
pub enum KioskState {
    Welcome(Welcome),
    Countdown(Countdown),
    CapturingPhoto(CapturingPhoto),
    PrintDialog(PrintDialog),
    Printing(Printing),
    ButtonTest(ButtonTest),
}

impl KioskState {
    pub fn welcome() -> KioskState {
        KioskState::Welcome(Welcome)
    }

    pub fn button_test() -> KioskState {
        KioskState::ButtonTest(ButtonTest)
    }

    /// Advance the machine by one render cycle. Always returns a frame to
    /// display and a valid next state, which may be `self` unchanged.
    pub fn tick(
        self,
        frame: Frame,
        delta_time_s: f64,
        key: Option<KeyInput>,
        cx: &mut BoothContext,
    ) -> (Frame, KioskState) {
        match self {
            KioskState::Welcome(state) => state.tick(frame, delta_time_s, key, cx),
            KioskState::Countdown(state) => state.tick(frame, delta_time_s, key, cx),
            KioskState::CapturingPhoto(state) => state.tick(frame, delta_time_s, key, cx),
            KioskState::PrintDialog(state) => state.tick(frame, delta_time_s, key, cx),
            KioskState::Printing(state) => state.tick(frame, delta_time_s, key, cx),
            KioskState::ButtonTest(state) => state.tick(frame, delta_time_s, key, cx),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            KioskState::Welcome(_) => "welcome",
            KioskState::Countdown(_) => "countdown",
            KioskState::CapturingPhoto(_) => "capturing_photo",
            KioskState::PrintDialog(_) => "print_dialog",
            KioskState::Printing(_) => "printing",
            KioskState::ButtonTest(_) => "button_test",
        }
    }
}

/// Attract screen; waits for a guest to start a session
pub struct Welcome;

impl Welcome {
    fn tick(
        self,
        mut frame: Frame,
        _delta_time_s: f64,
        key: Option<KeyInput>,
        cx: &mut BoothContext,
    ) -> (Frame, KioskState) {
        cx.panel.set_primary_light(true);
        cx.panel.set_secondary_light(false);

        frame.stamp_text_shadowed("WELCOME TO THE PHOTO BOOTH!", 100, 100, 4);
        frame.stamp_text_shadowed("GET READY FOR FOUR PHOTOS.", 100, 200, 4);
        frame.stamp_text_shadowed("PRESS THE BLUE BUTTON TO START.", 100, 300, 4);

        if key == Some(KeyInput::Start) || cx.panel.primary() {
            cx.panel.set_primary_light(false);
            match cx.store.create_session_dir() {
                Ok(dir) => {
                    info!(dir = %dir.display(), "Session started");
                    let session = Session::new(dir);
                    return (frame, KioskState::Countdown(Countdown::new(session, 0)));
                }
                Err(e) => {
                    // Stay on the welcome screen; the next press retries
                    error!(error = %e, "Could not allocate a session directory");
                }
            }
        }
        (frame, KioskState::Welcome(self))
    }
}

/// Counts down before one capture
pub struct Countdown {
    session: Session,
    photo_index: usize,
    elapsed_s: f64,
}

impl Countdown {
    fn new(session: Session, photo_index: usize) -> Self {
        Self {
            session,
            photo_index,
            elapsed_s: 0.0,
        }
    }

    pub fn photo_index(&self) -> usize {
        self.photo_index
    }

    /// The number shown on screen: ceiling of the remaining seconds, so
    /// the guest sees 3, 2, 1 and never 0
    pub fn remaining_display(&self) -> i64 {
        (COUNTDOWN_SECS - self.elapsed_s).ceil() as i64
    }

    fn tick(
        mut self,
        mut frame: Frame,
        delta_time_s: f64,
        key: Option<KeyInput>,
        _cx: &mut BoothContext,
    ) -> (Frame, KioskState) {
        self.elapsed_s += delta_time_s;
        let remaining = COUNTDOWN_SECS - self.elapsed_s;

        if remaining <= 0.0 || key == Some(KeyInput::Start) {
            let next = CapturingPhoto::begin(&frame, self.session, self.photo_index);
            return (frame, KioskState::CapturingPhoto(next));
        }

        let digits = (remaining.ceil() as i64).to_string();
        frame.stamp_text(&digits, 100, 100, 8, Rgb([0, 0, 0]));
        (frame, KioskState::Countdown(self))
    }
}

/// A capture just happened; plays the flash crossfade back to live video
pub struct CapturingPhoto {
    session: Session,
    photo_index: usize,
    elapsed_s: f64,
    white: Frame,
}

impl CapturingPhoto {
    /// Persist the capture synchronously and snapshot a matching white
    /// frame for the crossfade. A failed write is logged and the sequence
    /// continues; the session then aborts at composite time.
    fn begin(frame: &Frame, mut session: Session, photo_index: usize) -> CapturingPhoto {
        let path = session.photo_path(photo_index);
        info!(path = %path.display(), "Saving photo");
        if let Err(e) = frame.save(&path) {
            error!(path = %path.display(), error = %e, "Failed to save photo");
        }
        session.record_photo(path);

        CapturingPhoto {
            white: frame.white_like(),
            session,
            photo_index,
            elapsed_s: 0.0,
        }
    }

    pub fn photo_index(&self) -> usize {
        self.photo_index
    }

    fn tick(
        mut self,
        frame: Frame,
        delta_time_s: f64,
        _key: Option<KeyInput>,
        cx: &mut BoothContext,
    ) -> (Frame, KioskState) {
        self.elapsed_s += delta_time_s;

        let t = self.elapsed_s / CAPTURE_FADE_SECS;
        if t < 1.0 {
            let blended = frame.flash_blend(&self.white, t);
            return (blended, KioskState::CapturingPhoto(self));
        }

        let next_photo = self.photo_index + 1;
        if next_photo < PHOTOS_PER_SESSION {
            (
                frame,
                KioskState::Countdown(Countdown::new(self.session, next_photo)),
            )
        } else {
            PrintDialog::begin(frame, self.session, cx)
        }
    }
}

/// Shows the assembled composite and asks whether to print it
pub struct PrintDialog {
    session: Session,
    screen: Frame,
}

impl PrintDialog {
    /// Build the composite and the confirmation screen. Any failure here
    /// (unreadable photo, unwritable composite) abandons the session back
    /// to Welcome; the captured files stay on disk for later salvage.
    fn begin(frame: Frame, session: Session, cx: &mut BoothContext) -> (Frame, KioskState) {
        let composite = match compositor::join_photos(session.photos(), cx.mask_path.as_deref()) {
            Ok(composite) => composite,
            Err(e) => {
                error!(error = %e, "Compositing failed, abandoning session");
                return (frame, KioskState::welcome());
            }
        };

        let path = session.composite_path();
        if let Err(e) = composite.save(&path) {
            error!(path = %path.display(), error = %e, "Failed to save composite, abandoning session");
            return (frame, KioskState::welcome());
        }
        info!(path = %path.display(), "Composite saved");

        let screen = confirmation_screen(&composite);
        let dialog = PrintDialog { session, screen };
        (dialog.screen.clone(), KioskState::PrintDialog(dialog))
    }

    fn tick(
        self,
        frame: Frame,
        _delta_time_s: f64,
        key: Option<KeyInput>,
        cx: &mut BoothContext,
    ) -> (Frame, KioskState) {
        cx.panel.set_primary_light(true);
        cx.panel.set_secondary_light(true);

        if key == Some(KeyInput::Confirm) || cx.panel.primary() {
            cx.panel.set_primary_light(false);
            cx.panel.set_secondary_light(false);
            return Printing::begin(frame, self.session, cx);
        }

        if key == Some(KeyInput::Deny) || cx.panel.secondary() {
            cx.panel.set_primary_light(false);
            cx.panel.set_secondary_light(false);
            info!(dir = %self.session.dir().display(), "Session ended without printing, keeping files");
            return (frame, KioskState::welcome());
        }

        (self.screen.clone(), KioskState::PrintDialog(self))
    }
}

/// Supervises the convert and submit steps, then idles back to Welcome
pub struct Printing {
    session: Session,
    job: PrintJob,
    elapsed_s: f64,
}

impl Printing {
    fn begin(mut frame: Frame, session: Session, cx: &mut BoothContext) -> (Frame, KioskState) {
        let job = PrintJob::start(&cx.spooler, &session.composite_path(), session.print_path());
        frame.stamp_text_shadowed("PRINTING...", 100, 100, 4);
        (
            frame,
            KioskState::Printing(Printing {
                session,
                job,
                elapsed_s: 0.0,
            }),
        )
    }

    pub fn job(&self) -> &PrintJob {
        &self.job
    }

    fn tick(
        mut self,
        mut frame: Frame,
        delta_time_s: f64,
        _key: Option<KeyInput>,
        cx: &mut BoothContext,
    ) -> (Frame, KioskState) {
        self.elapsed_s += delta_time_s;
        self.job.poll(&cx.spooler);

        // The printing screen does not distinguish success from failure;
        // either way the booth resets after the idle period. A child that
        // never exits keeps us here, since cancellation is never issued.
        frame.stamp_text_shadowed("PRINTING...", 100, 100, 4);

        if self.job.is_settled() && self.elapsed_s > PRINTING_IDLE_SECS {
            if self.job.succeeded() {
                info!(dir = %self.session.dir().display(), "Print cycle complete");
            } else {
                warn!(dir = %self.session.dir().display(), "Print job failed, returning to welcome");
            }
            return (frame, KioskState::welcome());
        }

        (frame, KioskState::Printing(self))
    }
}

/// Diagnostic mode: mirrors the raw button states onto the lights
pub struct ButtonTest;

impl ButtonTest {
    fn tick(
        self,
        frame: Frame,
        _delta_time_s: f64,
        _key: Option<KeyInput>,
        cx: &mut BoothContext,
    ) -> (Frame, KioskState) {
        let primary = cx.panel.primary();
        let secondary = cx.panel.secondary();
        cx.panel.set_primary_light(primary);
        cx.panel.set_secondary_light(secondary);
        (frame, KioskState::ButtonTest(self))
    }
}

/// Dark screen with the composite preview and the print question
fn confirmation_screen(composite: &image::RgbaImage) -> Frame {
    let (display_w, display_h) = DISPLAY_SIZE;
    let mut screen = Frame::solid(display_w, display_h, Rgb([24, 24, 24]));

    let preview = Frame::new(image::DynamicImage::ImageRgba8(composite.clone()).to_rgb8())
        .fit_to(display_w / 2, display_h - 240);
    let x = (display_w.saturating_sub(preview.width())) as i64 / 2;
    screen.overlay(&preview, x, 120);

    screen.stamp_text_shadowed("PRINT YOUR PHOTOS?", 100, 20, 4);
    screen.stamp_text_shadowed("BLUE = YES   RED = NO", 100, display_h - 80, 4);
    screen
}
