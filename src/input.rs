// SPDX-License-Identifier: GPL-3.0-only

//! Physical button and indicator-light service
//!
//! Buttons are wired to GPIO pins exposed through `/sys/class/gpio`. Raw
//! levels are polled once per render loop turn into a short history; a
//! button reads "pressed" only once the last three polls were asserted,
//! which filters contact bounce without blocking the loop.

use crate::config::Config;
use crate::constants::{BUTTON_HISTORY_LEN, REQUIRED_STABLE_POLLS};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

/// Raw access to the two buttons and two lights
pub trait ButtonDriver {
    fn read_primary(&self) -> bool;
    fn read_secondary(&self) -> bool;
    fn set_primary_light(&mut self, on: bool);
    fn set_secondary_light(&mut self, on: bool);
}

/// Debounced view over a [`ButtonDriver`], plus light pass-through.
///
/// Owned by the render loop and handed to the state machine each tick;
/// only one state writes the lights per tick, last writer wins.
pub struct ButtonPanel {
    driver: Box<dyn ButtonDriver>,
    primary_history: [bool; BUTTON_HISTORY_LEN],
    secondary_history: [bool; BUTTON_HISTORY_LEN],
}

impl ButtonPanel {
    pub fn new(driver: Box<dyn ButtonDriver>) -> Self {
        Self {
            driver,
            primary_history: [false; BUTTON_HISTORY_LEN],
            secondary_history: [false; BUTTON_HISTORY_LEN],
        }
    }

    /// Advance both debounce windows by one raw poll
    pub fn tick(&mut self) {
        self.primary_history.rotate_left(1);
        self.primary_history[BUTTON_HISTORY_LEN - 1] = self.driver.read_primary();
        self.secondary_history.rotate_left(1);
        self.secondary_history[BUTTON_HISTORY_LEN - 1] = self.driver.read_secondary();
    }

    /// Guest-action (blue) button, debounced
    pub fn primary(&self) -> bool {
        stable(&self.primary_history)
    }

    /// Deny (red) button, debounced
    pub fn secondary(&self) -> bool {
        stable(&self.secondary_history)
    }

    pub fn set_primary_light(&mut self, on: bool) {
        self.driver.set_primary_light(on);
    }

    pub fn set_secondary_light(&mut self, on: bool) {
        self.driver.set_secondary_light(on);
    }
}

fn stable(history: &[bool; BUTTON_HISTORY_LEN]) -> bool {
    history[BUTTON_HISTORY_LEN - REQUIRED_STABLE_POLLS..]
        .iter()
        .all(|&pressed| pressed)
}

/// Buttons and lights on sysfs GPIO pins
pub struct SysfsButtons {
    primary_button: GpioPin,
    secondary_button: GpioPin,
    primary_light: GpioPin,
    secondary_light: GpioPin,
}

impl SysfsButtons {
    /// Set up the four configured pins. Returns `None` when the sysfs GPIO
    /// interface is missing or a pin cannot be prepared, so the caller can
    /// fall back to keyboard-only operation.
    pub fn open(config: &Config) -> Option<SysfsButtons> {
        if !Path::new("/sys/class/gpio").exists() {
            warn!("No /sys/class/gpio interface, buttons disabled");
            return None;
        }

        let primary_button = GpioPin::input(config.primary_button_pin)?;
        let secondary_button = GpioPin::input(config.secondary_button_pin)?;
        let mut primary_light = GpioPin::output(config.primary_light_pin)?;
        let mut secondary_light = GpioPin::output(config.secondary_light_pin)?;

        // Lights idle dark until a state asks for them
        primary_light.write_light(false);
        secondary_light.write_light(false);

        info!(
            primary = config.primary_button_pin,
            secondary = config.secondary_button_pin,
            "GPIO buttons ready"
        );

        Some(SysfsButtons {
            primary_button,
            secondary_button,
            primary_light,
            secondary_light,
        })
    }
}

impl ButtonDriver for SysfsButtons {
    fn read_primary(&self) -> bool {
        self.primary_button.read_level()
    }

    fn read_secondary(&self) -> bool {
        self.secondary_button.read_level()
    }

    fn set_primary_light(&mut self, on: bool) {
        self.primary_light.write_light(on);
    }

    fn set_secondary_light(&mut self, on: bool) {
        self.secondary_light.write_light(on);
    }
}

/// One exported sysfs GPIO pin
struct GpioPin {
    value_path: PathBuf,
    pin: u32,
}

impl GpioPin {
    fn input(pin: u32) -> Option<GpioPin> {
        Self::prepare(pin, "in")
    }

    fn output(pin: u32) -> Option<GpioPin> {
        Self::prepare(pin, "out")
    }

    fn prepare(pin: u32, direction: &str) -> Option<GpioPin> {
        let pin_dir = PathBuf::from(format!("/sys/class/gpio/gpio{}", pin));

        if !pin_dir.exists() {
            // Export may fail with EBUSY when the pin is already exported
            if let Err(e) = std::fs::write("/sys/class/gpio/export", pin.to_string())
                && !pin_dir.exists()
            {
                warn!(pin, error = %e, "Cannot export GPIO pin");
                return None;
            }
        }

        if let Err(e) = std::fs::write(pin_dir.join("direction"), direction) {
            warn!(pin, error = %e, "Cannot set GPIO direction");
            return None;
        }

        let value_path = pin_dir.join("value");
        match std::fs::read_to_string(&value_path) {
            Ok(_) => Some(GpioPin { value_path, pin }),
            Err(e) => {
                warn!(
                    pin,
                    error = %e,
                    "GPIO value file not accessible, user may need gpio group membership"
                );
                None
            }
        }
    }

    fn read_level(&self) -> bool {
        match std::fs::read_to_string(&self.value_path) {
            Ok(s) => s.trim() == "1",
            Err(e) => {
                warn!(pin = self.pin, error = %e, "Failed to read GPIO level");
                false
            }
        }
    }

    /// Indicator lights are wired active-low: driving the pin low turns
    /// the lamp on
    fn write_light(&mut self, on: bool) {
        let level = if on { "0" } else { "1" };
        if let Err(e) = std::fs::write(&self.value_path, level) {
            warn!(pin = self.pin, error = %e, "Failed to drive GPIO light");
        }
    }
}

/// Shared flags backing [`MemoryButtons`]
#[derive(Debug, Default)]
pub struct ButtonFlags {
    primary_pressed: AtomicBool,
    secondary_pressed: AtomicBool,
    primary_light: AtomicBool,
    secondary_light: AtomicBool,
}

impl ButtonFlags {
    pub fn press_primary(&self, pressed: bool) {
        self.primary_pressed.store(pressed, Ordering::Relaxed);
    }

    pub fn press_secondary(&self, pressed: bool) {
        self.secondary_pressed.store(pressed, Ordering::Relaxed);
    }

    pub fn primary_light(&self) -> bool {
        self.primary_light.load(Ordering::Relaxed)
    }

    pub fn secondary_light(&self) -> bool {
        self.secondary_light.load(Ordering::Relaxed)
    }
}

/// In-memory driver for tests and development hosts
pub struct MemoryButtons {
    flags: Arc<ButtonFlags>,
}

impl MemoryButtons {
    pub fn new(flags: Arc<ButtonFlags>) -> Self {
        Self { flags }
    }
}

impl ButtonDriver for MemoryButtons {
    fn read_primary(&self) -> bool {
        self.flags.primary_pressed.load(Ordering::Relaxed)
    }

    fn read_secondary(&self) -> bool {
        self.flags.secondary_pressed.load(Ordering::Relaxed)
    }

    fn set_primary_light(&mut self, on: bool) {
        self.flags.primary_light.store(on, Ordering::Relaxed);
    }

    fn set_secondary_light(&mut self, on: bool) {
        self.flags.secondary_light.store(on, Ordering::Relaxed);
    }
}

/// Driver for hosts without button wiring; reads released, drops writes
pub struct NullButtons;

impl ButtonDriver for NullButtons {
    fn read_primary(&self) -> bool {
        false
    }

    fn read_secondary(&self) -> bool {
        false
    }

    fn set_primary_light(&mut self, _on: bool) {}

    fn set_secondary_light(&mut self, _on: bool) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_panel() -> (ButtonPanel, Arc<ButtonFlags>) {
        let flags = Arc::new(ButtonFlags::default());
        let panel = ButtonPanel::new(Box::new(MemoryButtons::new(flags.clone())));
        (panel, flags)
    }

    #[test]
    fn button_needs_three_stable_polls() {
        let (mut panel, flags) = memory_panel();
        flags.press_primary(true);

        panel.tick();
        assert!(!panel.primary());
        panel.tick();
        assert!(!panel.primary());
        panel.tick();
        assert!(panel.primary());
    }

    #[test]
    fn bounce_resets_the_window() {
        let (mut panel, flags) = memory_panel();
        flags.press_primary(true);
        panel.tick();
        panel.tick();

        flags.press_primary(false);
        panel.tick();
        assert!(!panel.primary());

        flags.press_primary(true);
        panel.tick();
        panel.tick();
        assert!(!panel.primary());
        panel.tick();
        assert!(panel.primary());
    }

    #[test]
    fn buttons_are_independent() {
        let (mut panel, flags) = memory_panel();
        flags.press_secondary(true);
        for _ in 0..3 {
            panel.tick();
        }
        assert!(!panel.primary());
        assert!(panel.secondary());
    }

    #[test]
    fn lights_pass_through_to_the_driver() {
        let (mut panel, flags) = memory_panel();
        panel.set_primary_light(true);
        panel.set_secondary_light(false);
        assert!(flags.primary_light());
        assert!(!flags.secondary_light());
    }
}
