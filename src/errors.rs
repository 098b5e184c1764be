// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the photo-booth kiosk

use std::fmt;

/// Result type alias using BoothError
pub type BoothResult<T> = Result<T, BoothError>;

/// Main application error type
#[derive(Debug, Clone)]
pub enum BoothError {
    /// Camera-related errors
    Camera(CameraError),
    /// Composite assembly errors
    Composite(CompositeError),
    /// Print pipeline errors
    Print(PrintError),
    /// Storage/filesystem errors
    Storage(String),
}

/// Camera-specific errors
#[derive(Debug, Clone)]
pub enum CameraError {
    /// Capture device could not be opened
    OpenFailed(String),
    /// No pixel format both the device and the booth understand
    UnsupportedFormat(String),
    /// Streaming setup or frame read failed
    StreamFailed(String),
}

/// Composite assembly errors
#[derive(Debug, Clone)]
pub enum CompositeError {
    /// Session did not provide exactly four photos
    WrongPhotoCount(usize),
    /// A captured photo could not be read back
    Photo(String),
    /// The decorative mask could not be read
    Mask(String),
}

/// Print pipeline errors
#[derive(Debug, Clone)]
pub enum PrintError {
    /// Configured command template is empty
    EmptyCommand,
    /// Child process could not be spawned
    SpawnFailed(String),
}

impl fmt::Display for BoothError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoothError::Camera(e) => write!(f, "Camera error: {}", e),
            BoothError::Composite(e) => write!(f, "Composite error: {}", e),
            BoothError::Print(e) => write!(f, "Print error: {}", e),
            BoothError::Storage(msg) => write!(f, "Storage error: {}", msg),
        }
    }
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::OpenFailed(msg) => write!(f, "Failed to open device: {}", msg),
            CameraError::UnsupportedFormat(msg) => write!(f, "Unsupported format: {}", msg),
            CameraError::StreamFailed(msg) => write!(f, "Stream failed: {}", msg),
        }
    }
}

impl fmt::Display for CompositeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompositeError::WrongPhotoCount(n) => {
                write!(f, "Expected 4 photos, session has {}", n)
            }
            CompositeError::Photo(msg) => write!(f, "Cannot read photo: {}", msg),
            CompositeError::Mask(msg) => write!(f, "Cannot read mask: {}", msg),
        }
    }
}

impl fmt::Display for PrintError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrintError::EmptyCommand => write!(f, "Empty command template"),
            PrintError::SpawnFailed(msg) => write!(f, "Failed to spawn process: {}", msg),
        }
    }
}

impl std::error::Error for BoothError {}
impl std::error::Error for CameraError {}
impl std::error::Error for CompositeError {}
impl std::error::Error for PrintError {}

// Conversions from sub-errors to BoothError
impl From<CameraError> for BoothError {
    fn from(err: CameraError) -> Self {
        BoothError::Camera(err)
    }
}

impl From<CompositeError> for BoothError {
    fn from(err: CompositeError) -> Self {
        BoothError::Composite(err)
    }
}

impl From<PrintError> for BoothError {
    fn from(err: PrintError) -> Self {
        BoothError::Print(err)
    }
}

impl From<std::io::Error> for BoothError {
    fn from(err: std::io::Error) -> Self {
        BoothError::Storage(err.to_string())
    }
}
