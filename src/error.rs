use std::fmt;

/// Errors raised by obstacle construction and overlap computation.
#[derive(Clone, Debug, PartialEq)]
pub enum VolumeError {
    /// Cylinder radius was not a positive finite number.
    InvalidRadius(f64),
    /// Cylinder height was not a positive finite number.
    InvalidHeight(f64),
    /// Prism corners do not span a positive extent along `axis`.
    DegenerateBox { axis: usize, min: f64, max: f64 },
    /// The grid cell handed in has no volume.
    InvalidCell,
    /// The computed coincident proportion exceeded one. Indicates a geometry bug.
    ProportionOverflow { proportion: f64 },
    /// A configuration entry could not be turned into an obstacle.
    InvalidConfig(String),
}

impl fmt::Display for VolumeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VolumeError::InvalidRadius(r) => write!(f, "cylinder radius must be positive, got {}", r),
            VolumeError::InvalidHeight(h) => write!(f, "cylinder height must be positive, got {}", h),
            VolumeError::DegenerateBox { axis, min, max } => {
                write!(f, "prism corners must be well ordered on axis {}: {} >= {}", axis, min, max)
            }
            VolumeError::InvalidCell => write!(f, "grid cell has no volume"),
            VolumeError::ProportionOverflow { proportion } => {
                write!(f, "coincident proportion {} exceeds 1", proportion)
            }
            VolumeError::InvalidConfig(msg) => write!(f, "invalid volume object configuration: {}", msg),
        }
    }
}

impl std::error::Error for VolumeError {}
