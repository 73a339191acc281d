use crate::{frame::FrameOrigin, Error};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Which feed the frames given to the guidance engine come from.
///
/// The SDK live view and saved files are mirrored opposite to each other,
/// so the sign of the detected yaw depends on the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputSource {
    /// Vendor SDK live view
    Sdk,
    /// Sentinel or saved image files
    #[default]
    File,
}

impl InputSource {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sdk => "sdk",
            Self::File => "file",
        }
    }
}

impl fmt::Display for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InputSource {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sdk" => Ok(Self::Sdk),
            "file" => Ok(Self::File),
            other => Err(Error::InvalidInput(format!("Unknown input source: {other}"))),
        }
    }
}

impl From<FrameOrigin> for InputSource {
    fn from(origin: FrameOrigin) -> Self {
        match origin {
            FrameOrigin::Sdk => Self::Sdk,
            FrameOrigin::File => Self::File,
        }
    }
}

/// Linear yaw correction `scale * yaw + offset_deg` for one input source
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YawCalibration {
    pub scale: f64,
    pub offset_deg: f64,
}

impl YawCalibration {
    /// Pass yaw through unchanged
    pub const IDENTITY: Self = Self {
        scale: 1.0,
        offset_deg: 0.0,
    };

    /// Flip the sign of yaw
    pub const MIRRORED: Self = Self {
        scale: -1.0,
        offset_deg: 0.0,
    };

    #[must_use]
    pub fn apply(&self, yaw_deg: f64) -> f64 {
        self.scale * yaw_deg + self.offset_deg
    }
}

impl Default for YawCalibration {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_input_source() {
        assert_eq!("sdk".parse::<InputSource>().unwrap(), InputSource::Sdk);
        assert_eq!(" FILE ".parse::<InputSource>().unwrap(), InputSource::File);
        assert!("usb".parse::<InputSource>().is_err());
        assert_eq!(InputSource::Sdk.to_string(), "sdk");
    }

    #[test]
    fn test_source_from_origin() {
        assert_eq!(InputSource::from(FrameOrigin::Sdk), InputSource::Sdk);
        assert_eq!(InputSource::from(FrameOrigin::File), InputSource::File);
    }

    #[test]
    fn test_calibrations() {
        assert_eq!(YawCalibration::MIRRORED.apply(10.0), -10.0);
        assert_eq!(YawCalibration::IDENTITY.apply(10.0), 10.0);
        let shifted = YawCalibration {
            scale: 1.0,
            offset_deg: -2.5,
        };
        assert_eq!(shifted.apply(10.0), 7.5);
    }
}
