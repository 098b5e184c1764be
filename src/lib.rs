// SPDX-License-Identifier: GPL-3.0-only

//! Photo-booth kiosk
//!
//! Drives an unattended photo-booth: a live camera feed, a timed
//! four-photo sequence, a print composite, and an asynchronous hand-off
//! to a physical printer.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`state`]: the kiosk state machine, the core of the booth
//! - [`booth`]: the render loop that drives it
//! - [`camera`]: V4L frame source
//! - [`input`]: debounced buttons and indicator lights
//! - [`compositor`]: print layout assembly
//! - [`printing`]: convert/submit subprocess supervision
//! - [`storage`]: per-session output directories
//! - [`config`]: user configuration handling

pub mod booth;
pub mod camera;
pub mod compositor;
pub mod config;
pub mod constants;
pub mod errors;
pub mod frame;
pub mod input;
pub mod printing;
pub mod state;
pub mod storage;

// Re-export commonly used types
pub use config::Config;
pub use frame::Frame;
pub use state::{BoothContext, KeyInput, KioskState};
