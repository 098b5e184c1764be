// SPDX-License-Identifier: GPL-3.0-only

//! Session output allocation and path bookkeeping

use crate::constants::PHOTOS_PER_SESSION;
use chrono::Local;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Allocates one fresh output directory per guest session
pub struct SessionStore {
    root: PathBuf,
}

impl SessionStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create a unique, timestamp-named session directory under the root.
    /// The directory exists when this returns.
    pub fn create_session_dir(&self) -> io::Result<PathBuf> {
        let stamp = Local::now().format("%Y-%m-%dT%H-%M-%S%.3f").to_string();
        let mut dir = self.root.join(&stamp);
        let mut suffix = 1;
        while dir.exists() {
            dir = self.root.join(format!("{}-{}", stamp, suffix));
            suffix += 1;
        }
        std::fs::create_dir_all(&dir)?;
        debug!(dir = %dir.display(), "Created session directory");
        Ok(dir)
    }
}

/// One guest's welcome-to-print cycle: the output directory and the files
/// produced into it. Owned by the chain of states for that cycle and
/// dropped when the machine returns to Welcome.
#[derive(Debug)]
pub struct Session {
    dir: PathBuf,
    photos: Vec<PathBuf>,
}

impl Session {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            photos: Vec::with_capacity(PHOTOS_PER_SESSION),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Target path for the capture at `index` (zero-based), named
    /// photo_1.png through photo_4.png
    pub fn photo_path(&self, index: usize) -> PathBuf {
        self.dir.join(format!("photo_{}.png", index + 1))
    }

    pub fn record_photo(&mut self, path: PathBuf) {
        self.photos.push(path);
    }

    pub fn photos(&self) -> &[PathBuf] {
        &self.photos
    }

    pub fn is_complete(&self) -> bool {
        self.photos.len() == PHOTOS_PER_SESSION
    }

    pub fn composite_path(&self) -> PathBuf {
        self.dir.join("composite.png")
    }

    pub fn print_path(&self) -> PathBuf {
        self.dir.join("print.pdf")
    }
}
