//! Call contract for the vendor camera SDK.
//!
//! The SDK itself is opaque native code. Constructing a bridge corresponds to
//! initialising the SDK and dropping it releases the SDK, so every
//! `FrameSource` owns exactly one bridge and no SDK state is process-global.

use crate::{Error, Result};

/// Opaque live-view/capture surface of the vendor SDK.
///
/// Implementations must be `Send`: the bridge is moved into the acquisition
/// worker and only ever used from that thread.
pub trait CameraBridge: Send {
    /// Connect to the first camera found
    ///
    /// # Errors
    ///
    /// Returns an error if the SDK is missing or no camera answers
    fn connect(&mut self) -> Result<()>;

    /// Whether a camera handle is currently open
    fn is_connected(&self) -> bool;

    /// Turn live-view streaming on or off
    ///
    /// # Errors
    ///
    /// Returns an error if the SDK rejects the request
    fn set_streaming(&mut self, enabled: bool) -> Result<()>;

    /// Buffer size the next live-view frame needs; 0 means no frame yet
    ///
    /// # Errors
    ///
    /// Returns an error if the query call fails
    fn buffer_size(&mut self) -> Result<usize>;

    /// Copy the current live-view frame into `buf`, returning bytes used
    ///
    /// # Errors
    ///
    /// Returns an error if the fetch call fails
    fn fetch_frame(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Trigger a single still capture
    ///
    /// # Errors
    ///
    /// Returns an error if no handle is open or the camera refuses
    fn shoot_one(&mut self) -> Result<()>;

    /// Close the camera handle; a no-op when nothing is open
    fn disconnect(&mut self);
}

impl<B: CameraBridge + ?Sized> CameraBridge for Box<B> {
    fn connect(&mut self) -> Result<()> {
        (**self).connect()
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    fn set_streaming(&mut self, enabled: bool) -> Result<()> {
        (**self).set_streaming(enabled)
    }

    fn buffer_size(&mut self) -> Result<usize> {
        (**self).buffer_size()
    }

    fn fetch_frame(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).fetch_frame(buf)
    }

    fn shoot_one(&mut self) -> Result<()> {
        (**self).shoot_one()
    }

    fn disconnect(&mut self) {
        (**self).disconnect();
    }
}

/// Bridge for machines without the vendor SDK.
///
/// `connect` always fails, which keeps a `FrameSource` in file mode.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullBridge;

impl CameraBridge for NullBridge {
    fn connect(&mut self) -> Result<()> {
        Err(Error::BridgeUnavailable("camera SDK not installed".to_string()))
    }

    fn is_connected(&self) -> bool {
        false
    }

    fn set_streaming(&mut self, _enabled: bool) -> Result<()> {
        Err(Error::NoCameraHandle)
    }

    fn buffer_size(&mut self) -> Result<usize> {
        Err(Error::NoCameraHandle)
    }

    fn fetch_frame(&mut self, _buf: &mut [u8]) -> Result<usize> {
        Err(Error::NoCameraHandle)
    }

    fn shoot_one(&mut self) -> Result<()> {
        Err(Error::NoCameraHandle)
    }

    fn disconnect(&mut self) {}
}
