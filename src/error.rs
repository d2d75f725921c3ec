//! Error types for pinchfield.
//!
//! One enum per failure domain: GPU initialization, asset decoding, hand
//! tracking transport, configuration, and the top-level application error.
//! None of these are fatal to a running render loop; callers log them and
//! degrade (no particle buffer, tracking disabled) as documented on each
//! operation.

use std::fmt;
use std::path::PathBuf;

/// Errors that can occur during GPU initialization.
#[derive(Debug)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    SurfaceCreation(wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    NoAdapter,
    /// Failed to create GPU device.
    DeviceCreation(wgpu::RequestDeviceError),
    /// The surface reports no usable texture format.
    NoSurfaceFormat,
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuError::SurfaceCreation(e) => write!(f, "Failed to create GPU surface: {}", e),
            GpuError::NoAdapter => write!(
                f,
                "No compatible GPU adapter found (Vulkan, Metal, DX12 or WebGPU required)"
            ),
            GpuError::DeviceCreation(e) => write!(f, "Failed to create GPU device: {}", e),
            GpuError::NoSurfaceFormat => write!(f, "Surface reports no supported texture format"),
        }
    }
}

impl std::error::Error for GpuError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GpuError::SurfaceCreation(e) => Some(e),
            GpuError::DeviceCreation(e) => Some(e),
            GpuError::NoAdapter | GpuError::NoSurfaceFormat => None,
        }
    }
}

impl From<wgpu::CreateSurfaceError> for GpuError {
    fn from(e: wgpu::CreateSurfaceError) -> Self {
        GpuError::SurfaceCreation(e)
    }
}

impl From<wgpu::RequestDeviceError> for GpuError {
    fn from(e: wgpu::RequestDeviceError) -> Self {
        GpuError::DeviceCreation(e)
    }
}

/// Errors that can occur while loading the source image of a point cloud.
#[derive(Debug)]
pub enum AssetError {
    /// Failed to open the file or sniff its format.
    Io(std::io::Error),
    /// Failed to decode the image data.
    Decode(image::ImageError),
    /// Scaling to the working width would produce an oversized raster.
    Dimensions { width: u32, height: u32 },
}

impl fmt::Display for AssetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetError::Io(e) => write!(f, "Failed to read image file: {}", e),
            AssetError::Decode(e) => write!(f, "Failed to decode image: {}", e),
            AssetError::Dimensions { width, height } => write!(
                f,
                "Image of {}x{} is too tall to rasterize at the working width",
                width, height
            ),
        }
    }
}

impl std::error::Error for AssetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AssetError::Io(e) => Some(e),
            AssetError::Decode(e) => Some(e),
            AssetError::Dimensions { .. } => None,
        }
    }
}

impl From<std::io::Error> for AssetError {
    fn from(e: std::io::Error) -> Self {
        AssetError::Io(e)
    }
}

impl From<image::ImageError> for AssetError {
    fn from(e: image::ImageError) -> Self {
        AssetError::Decode(e)
    }
}

/// Errors from the hand tracking transport and sidecar process.
#[derive(Debug)]
pub enum TrackingError {
    /// Failed to bind the landmark socket.
    Bind {
        addr: String,
        source: std::io::Error,
    },
    /// Socket receive failed for a reason other than "no data yet".
    Receive(std::io::Error),
    /// A datagram was not valid landmark JSON.
    Parse(serde_json::Error),
    /// A hand was reported with the wrong number of landmarks.
    Landmarks(usize),
    /// The tracker sidecar could not be started.
    Launch {
        script: PathBuf,
        source: std::io::Error,
    },
}

impl fmt::Display for TrackingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackingError::Bind { addr, source } => {
                write!(f, "Failed to bind landmark socket on {}: {}", addr, source)
            }
            TrackingError::Receive(e) => write!(f, "Landmark socket receive error: {}", e),
            TrackingError::Parse(e) => write!(f, "Malformed landmark packet: {}", e),
            TrackingError::Landmarks(n) => write!(
                f,
                "Hand reported with {} landmarks, expected {}",
                n,
                crate::gesture::LANDMARK_COUNT
            ),
            TrackingError::Launch { script, source } => write!(
                f,
                "Failed to launch hand tracker '{}': {}",
                script.display(),
                source
            ),
        }
    }
}

impl std::error::Error for TrackingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TrackingError::Bind { source, .. } => Some(source),
            TrackingError::Receive(e) => Some(e),
            TrackingError::Parse(e) => Some(e),
            TrackingError::Launch { source, .. } => Some(source),
            TrackingError::Landmarks(_) => None,
        }
    }
}

impl From<serde_json::Error> for TrackingError {
    fn from(e: serde_json::Error) -> Self {
        TrackingError::Parse(e)
    }
}

/// Errors that can occur while loading or validating configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read the config file.
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The file is not valid TOML for the config schema.
    Parse(toml::de::Error),
    /// A value is outside its allowed range.
    Invalid {
        field: &'static str,
        message: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Read { path, source } => write!(
                f,
                "Failed to read config file {}: {}",
                path.display(),
                source
            ),
            ConfigError::Parse(e) => write!(f, "Failed to parse config: {}", e),
            ConfigError::Invalid { field, message } => {
                write!(f, "Invalid configuration value: {} - {}", field, message)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Parse(e) => Some(e),
            ConfigError::Invalid { .. } => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::Parse(e)
    }
}

/// Errors that stop the application from starting.
#[derive(Debug)]
pub enum AppError {
    /// Failed to create event loop.
    EventLoop(winit::error::EventLoopError),
    /// Failed to create window.
    Window(winit::error::OsError),
    /// GPU initialization failed.
    Gpu(GpuError),
    /// Configuration could not be loaded.
    Config(ConfigError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::EventLoop(e) => write!(f, "Failed to create event loop: {}", e),
            AppError::Window(e) => write!(f, "Failed to create window: {}", e),
            AppError::Gpu(e) => write!(f, "GPU error: {}", e),
            AppError::Config(e) => write!(f, "Configuration error: {}", e),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::EventLoop(e) => Some(e),
            AppError::Window(e) => Some(e),
            AppError::Gpu(e) => Some(e),
            AppError::Config(e) => Some(e),
        }
    }
}

impl From<winit::error::EventLoopError> for AppError {
    fn from(e: winit::error::EventLoopError) -> Self {
        AppError::EventLoop(e)
    }
}

impl From<winit::error::OsError> for AppError {
    fn from(e: winit::error::OsError) -> Self {
        AppError::Window(e)
    }
}

impl From<GpuError> for AppError {
    fn from(e: GpuError) -> Self {
        AppError::Gpu(e)
    }
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        AppError::Config(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landmark_error_mentions_expected_count() {
        let msg = TrackingError::Landmarks(5).to_string();
        assert!(msg.contains("5 landmarks"));
        assert!(msg.contains("21"));
    }

    #[test]
    fn test_invalid_config_display() {
        let err = ConfigError::invalid("gesture.smoothing", "must be in (0, 1]");
        assert_eq!(
            err.to_string(),
            "Invalid configuration value: gesture.smoothing - must be in (0, 1]"
        );
    }
}
