// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Photos captured per guest session
pub const PHOTOS_PER_SESSION: usize = 4;

/// Seconds counted down before each capture
pub const COUNTDOWN_SECS: f64 = 3.0;

/// Seconds over which the capture flash fades back to the live feed
pub const CAPTURE_FADE_SECS: f64 = 1.0;

/// Seconds the printing screen stays up once the print job has settled
pub const PRINTING_IDLE_SECS: f64 = 10.0;

/// Target render loop interval (~60 Hz input polling)
pub const LOOP_INTERVAL: Duration = Duration::from_millis(16);

/// Number of raw button polls kept per debounce window
pub const BUTTON_HISTORY_LEN: usize = 5;

/// Consecutive asserted polls required for a button to read "pressed"
pub const REQUIRED_STABLE_POLLS: usize = 3;

/// Logical resolution the confirmation screen is composed at
pub const DISPLAY_SIZE: (u32, u32) = (1920, 1080);
