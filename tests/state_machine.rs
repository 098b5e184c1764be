// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the kiosk state machine
//!
//! Drives whole guest cycles with in-memory buttons, a scratch output
//! root, and `cp`/`false` standing in for the convert and print commands.

use image::{Rgb, RgbImage};
use photobooth::Frame;
use photobooth::input::{ButtonFlags, ButtonPanel, MemoryButtons};
use photobooth::printing::{PrintSpooler, PrintStage};
use photobooth::state::{BoothContext, KeyInput, KioskState};
use photobooth::storage::SessionStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// A small, uniform "live camera" frame
fn live_frame() -> Frame {
    Frame::new(RgbImage::from_pixel(64, 48, Rgb([40, 60, 80])))
}

fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

fn context(root: &Path, convert: &[&str], submit: &[&str]) -> (BoothContext, Arc<ButtonFlags>) {
    let flags = Arc::new(ButtonFlags::default());
    let cx = BoothContext {
        panel: ButtonPanel::new(Box::new(MemoryButtons::new(flags.clone()))),
        store: SessionStore::new(root),
        spooler: PrintSpooler::new(argv(convert), argv(submit), "test-printer"),
        mask_path: None,
    };
    (cx, flags)
}

fn working_context(root: &Path) -> (BoothContext, Arc<ButtonFlags>) {
    context(
        root,
        &["cp", "{src}", "{dst}"],
        &["cp", "{pdf}", "{pdf}.sent"],
    )
}

fn tick(
    state: KioskState,
    dt: f64,
    key: Option<KeyInput>,
    cx: &mut BoothContext,
) -> (Frame, KioskState) {
    state.tick(live_frame(), dt, key, cx)
}

fn next_state(state: KioskState, dt: f64, key: Option<KeyInput>, cx: &mut BoothContext) -> KioskState {
    tick(state, dt, key, cx).1
}

/// The single session directory created under `root`
fn session_dir(root: &Path) -> PathBuf {
    let mut dirs: Vec<_> = std::fs::read_dir(root)
        .expect("read output root")
        .map(|e| e.expect("dir entry").path())
        .collect();
    assert_eq!(dirs.len(), 1, "expected exactly one session directory");
    dirs.pop().expect("session dir")
}

/// Run from Welcome through all four captures to the print dialog
fn run_to_print_dialog(cx: &mut BoothContext) -> KioskState {
    let mut state = next_state(KioskState::welcome(), 0.016, Some(KeyInput::Start), cx);

    for expected_index in 0..4 {
        match &state {
            KioskState::Countdown(countdown) => {
                assert_eq!(countdown.photo_index(), expected_index)
            }
            other => panic!("expected countdown, got {}", other.name()),
        }
        // Let the countdown expire, then let the flash fade out
        state = next_state(state, 3.5, None, cx);
        match &state {
            KioskState::CapturingPhoto(capture) => {
                assert_eq!(capture.photo_index(), expected_index)
            }
            other => panic!("expected capture, got {}", other.name()),
        }
        state = next_state(state, 1.5, None, cx);
    }

    assert_eq!(state.name(), "print_dialog");
    state
}

/// Tick the Printing state until its job settles
fn settle_printing(mut state: KioskState, cx: &mut BoothContext) -> KioskState {
    for _ in 0..500 {
        state = next_state(state, 0.0, None, cx);
        if let KioskState::Printing(printing) = &state
            && printing.job().is_settled()
        {
            return state;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    panic!("print job never settled");
}

#[test]
fn welcome_is_idempotent_without_input() {
    let root = tempfile::tempdir().expect("tempdir");
    let (mut cx, _flags) = working_context(root.path());

    let mut state = KioskState::welcome();
    for _ in 0..10 {
        state = next_state(state, 1.0, None, &mut cx);
        assert_eq!(state.name(), "welcome");
    }
    assert_eq!(
        std::fs::read_dir(root.path()).expect("read root").count(),
        0,
        "idle welcome must not allocate sessions"
    );
}

#[test]
fn tick_is_total_for_any_key_and_delta() {
    let root = tempfile::tempdir().expect("tempdir");
    let (mut cx, _flags) = working_context(root.path());

    for key in [
        None,
        Some(KeyInput::Start),
        Some(KeyInput::Confirm),
        Some(KeyInput::Deny),
    ] {
        for dt in [0.0, 0.016, 1e6] {
            let (frame, state) = tick(KioskState::welcome(), dt, key, &mut cx);
            assert!(frame.width() > 0);
            let _ = state.name();
        }
    }
}

#[test]
fn start_key_allocates_a_session_and_starts_the_countdown() {
    let root = tempfile::tempdir().expect("tempdir");
    let (mut cx, _flags) = working_context(root.path());

    let state = next_state(KioskState::welcome(), 0.016, Some(KeyInput::Start), &mut cx);
    match &state {
        KioskState::Countdown(countdown) => {
            assert_eq!(countdown.photo_index(), 0);
            assert_eq!(countdown.remaining_display(), 3);
        }
        other => panic!("expected countdown, got {}", other.name()),
    }
    assert!(session_dir(root.path()).is_dir());
}

#[test]
fn debounced_button_press_is_equivalent_to_the_start_key() {
    let root = tempfile::tempdir().expect("tempdir");
    let (mut cx, flags) = working_context(root.path());

    flags.press_primary(true);
    // Two polls are not enough for a stable press
    cx.panel.tick();
    cx.panel.tick();
    let state = next_state(KioskState::welcome(), 0.016, None, &mut cx);
    assert_eq!(state.name(), "welcome");

    cx.panel.tick();
    let state = next_state(state, 0.016, None, &mut cx);
    assert_eq!(state.name(), "countdown");
}

#[test]
fn welcome_lights_invite_the_primary_button() {
    let root = tempfile::tempdir().expect("tempdir");
    let (mut cx, flags) = working_context(root.path());

    let _ = next_state(KioskState::welcome(), 0.016, None, &mut cx);
    assert!(flags.primary_light());
    assert!(!flags.secondary_light());
}

#[test]
fn countdown_shows_three_two_one_then_fires_once() {
    let root = tempfile::tempdir().expect("tempdir");
    let (mut cx, _flags) = working_context(root.path());

    let mut state = next_state(KioskState::welcome(), 0.0, Some(KeyInput::Start), &mut cx);
    let mut shown = Vec::new();

    for _ in 0..3 {
        match &state {
            KioskState::Countdown(countdown) => shown.push(countdown.remaining_display()),
            other => panic!("expected countdown, got {}", other.name()),
        }
        state = next_state(state, 1.0, None, &mut cx);
    }

    assert_eq!(shown, [3, 2, 1]);
    assert_eq!(
        state.name(),
        "capturing_photo",
        "elapsed >= 3.0 must transition exactly once"
    );
}

#[test]
fn start_key_skips_the_countdown() {
    let root = tempfile::tempdir().expect("tempdir");
    let (mut cx, _flags) = working_context(root.path());

    let state = next_state(KioskState::welcome(), 0.016, Some(KeyInput::Start), &mut cx);
    let state = next_state(state, 0.016, Some(KeyInput::Start), &mut cx);
    assert_eq!(state.name(), "capturing_photo");
}

#[test]
fn capture_persists_the_photo_and_fades_from_white() {
    let root = tempfile::tempdir().expect("tempdir");
    let (mut cx, _flags) = working_context(root.path());

    let state = next_state(KioskState::welcome(), 0.016, Some(KeyInput::Start), &mut cx);
    let state = next_state(state, 3.5, None, &mut cx);
    assert_eq!(state.name(), "capturing_photo");
    assert!(
        session_dir(root.path()).join("photo_1.png").exists(),
        "entering the capture state must persist the frame"
    );

    // t=0: the saturating blend pins the whole frame to white
    let (display, state) = tick(state, 0.0, None, &mut cx);
    assert_eq!(*display.image().get_pixel(10, 10), Rgb([255, 255, 255]));
    assert_eq!(state.name(), "capturing_photo");

    // t=0.5: white admixture has faded but still over-brightens
    let (display, state) = tick(state, 0.5, None, &mut cx);
    assert_eq!(display.image().get_pixel(10, 10)[0], 167); // 40 + 255*0.5
    assert_eq!(state.name(), "capturing_photo");

    // Only elapsed >= 1.0 leaves the capture state
    let state = next_state(state, 0.5, None, &mut cx);
    assert_eq!(state.name(), "countdown");
}

#[test]
fn four_captures_visit_photo_indices_in_order() {
    let root = tempfile::tempdir().expect("tempdir");
    let (mut cx, _flags) = working_context(root.path());

    let state = run_to_print_dialog(&mut cx);
    assert_eq!(state.name(), "print_dialog");

    let dir = session_dir(root.path());
    for n in 1..=4 {
        assert!(
            dir.join(format!("photo_{}.png", n)).exists(),
            "photo_{}.png missing",
            n
        );
    }
    assert!(dir.join("composite.png").exists());
}

#[test]
fn print_dialog_is_idempotent_without_input() {
    let root = tempfile::tempdir().expect("tempdir");
    let (mut cx, flags) = working_context(root.path());

    let mut state = run_to_print_dialog(&mut cx);
    let dir = session_dir(root.path());
    let files_before = std::fs::read_dir(&dir).expect("read session").count();

    for _ in 0..5 {
        state = next_state(state, 1.0, None, &mut cx);
        assert_eq!(state.name(), "print_dialog");
    }
    assert!(flags.primary_light(), "both lights invite a choice");
    assert!(flags.secondary_light());
    assert_eq!(
        std::fs::read_dir(&dir).expect("read session").count(),
        files_before,
        "idle dialog must not touch session files"
    );
}

#[test]
fn deny_ends_the_session_without_printing() {
    let root = tempfile::tempdir().expect("tempdir");
    let (mut cx, _flags) = working_context(root.path());

    let state = run_to_print_dialog(&mut cx);
    let state = next_state(state, 0.016, Some(KeyInput::Deny), &mut cx);
    assert_eq!(state.name(), "welcome");
    assert!(
        !session_dir(root.path()).join("print.pdf").exists(),
        "deny must not start the print pipeline"
    );
}

#[test]
fn confirm_runs_the_full_print_pipeline() {
    let root = tempfile::tempdir().expect("tempdir");
    let (mut cx, _flags) = working_context(root.path());

    let state = run_to_print_dialog(&mut cx);
    let state = next_state(state, 0.016, Some(KeyInput::Confirm), &mut cx);
    assert_eq!(state.name(), "printing");

    let state = settle_printing(state, &mut cx);
    match &state {
        KioskState::Printing(printing) => {
            assert_eq!(printing.job().stage(), PrintStage::Done)
        }
        other => panic!("expected printing, got {}", other.name()),
    }

    // The idle timeout holds the screen before resetting
    let state = next_state(state, 0.1, None, &mut cx);
    assert_eq!(state.name(), "printing");
    let state = next_state(state, 11.0, None, &mut cx);
    assert_eq!(state.name(), "welcome");

    let dir = session_dir(root.path());
    assert!(dir.join("print.pdf").exists(), "convert step output missing");
    assert!(dir.join("print.pdf.sent").exists(), "submit step never ran");
}

#[test]
fn convert_failure_suppresses_submit_and_still_resets() {
    let root = tempfile::tempdir().expect("tempdir");
    let (mut cx, _flags) = context(root.path(), &["false"], &["cp", "{pdf}", "{pdf}.sent"]);

    let state = run_to_print_dialog(&mut cx);
    let state = next_state(state, 0.016, Some(KeyInput::Confirm), &mut cx);
    let state = settle_printing(state, &mut cx);

    match &state {
        KioskState::Printing(printing) => {
            assert_eq!(printing.job().stage(), PrintStage::Failed);
            assert!(!printing.job().succeeded());
        }
        other => panic!("expected printing, got {}", other.name()),
    }
    assert!(
        !session_dir(root.path()).join("print.pdf.sent").exists(),
        "submit must never start after a failed convert"
    );

    // Failure falls back to welcome after the same idle timeout
    let state = next_state(state, 11.0, None, &mut cx);
    assert_eq!(state.name(), "welcome");
}

#[test]
fn end_to_end_cycle_produces_the_expected_files() {
    let root = tempfile::tempdir().expect("tempdir");
    let (mut cx, _flags) = working_context(root.path());

    let state = run_to_print_dialog(&mut cx);
    let state = next_state(state, 0.016, Some(KeyInput::Confirm), &mut cx);
    let state = settle_printing(state, &mut cx);
    let state = next_state(state, 11.0, None, &mut cx);
    assert_eq!(state.name(), "welcome");

    let dir = session_dir(root.path());
    let mut names: Vec<String> = std::fs::read_dir(&dir)
        .expect("read session")
        .map(|e| e.expect("entry").file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(
        names,
        [
            "composite.png",
            "photo_1.png",
            "photo_2.png",
            "photo_3.png",
            "photo_4.png",
            "print.pdf",
            "print.pdf.sent",
        ]
    );
}

#[test]
fn button_test_mirrors_buttons_onto_lights() {
    let root = tempfile::tempdir().expect("tempdir");
    let (mut cx, flags) = working_context(root.path());

    let mut state = KioskState::button_test();
    flags.press_primary(true);
    for _ in 0..3 {
        cx.panel.tick();
        state = next_state(state, 0.016, None, &mut cx);
    }
    assert_eq!(state.name(), "button_test");
    assert!(flags.primary_light());
    assert!(!flags.secondary_light());

    flags.press_primary(false);
    flags.press_secondary(true);
    for _ in 0..3 {
        cx.panel.tick();
        state = next_state(state, 0.016, None, &mut cx);
    }
    assert_eq!(state.name(), "button_test");
    assert!(!flags.primary_light());
    assert!(flags.secondary_light());
}
