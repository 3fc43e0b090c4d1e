//! Rendering error types.

use thiserror::Error;

/// Errors that can occur during rendering operations.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Failed to create wgpu adapter.
    #[error("failed to create graphics adapter")]
    AdapterCreationFailed,

    /// Failed to create wgpu device.
    #[error("failed to create graphics device: {0}")]
    DeviceCreationFailed(#[from] wgpu::RequestDeviceError),

    /// GPU buffer mapping failed during readback.
    #[error("GPU buffer mapping failed: {0}")]
    BufferMapFailed(#[from] wgpu::BufferAsyncError),

    /// Waiting on the device failed during readback.
    #[error("device poll failed: {0}")]
    PollFailed(#[from] wgpu::PollError),

    /// The readback completion channel closed before the map resolved.
    #[error("readback channel closed before map completed")]
    ReadbackChannelClosed,

    /// Readback returned a buffer of unexpected size.
    #[error("readback size mismatch: expected {expected} bytes, got {actual}")]
    ReadbackSizeMismatch { expected: usize, actual: usize },
}

/// A specialized Result type for rendering operations.
pub type RenderResult<T> = std::result::Result<T, RenderError>;
