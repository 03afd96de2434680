use crate::nifti::ScanMetadata;
use crate::volume::VolumeError;
use thiserror::Error;

/// Error type that preserves metadata when available
#[derive(Debug, Error)]
pub enum ProcessError {
    /// File could not be read as NIfTI - no metadata available
    #[error("{0}")]
    NotANiftiFile(String),

    /// Valid header but voxel extraction failed
    #[error("{0}")]
    ExtractionFailed(String),

    /// Multi-volume scan without a volume selector
    #[error("Missing information! This scan contains {volumes} volumes")]
    MissingVolume {
        metadata: Box<ScanMetadata>,
        volumes: usize,
    },

    /// Volume selector outside the scan's range
    #[error("Invalid volume! Volume {requested} requested, this scan contains {volumes} volumes")]
    InvalidVolume {
        metadata: Box<ScanMetadata>,
        requested: i64,
        volumes: usize,
    },

    /// Metadata extracted successfully, but reorientation failed
    #[error("{error}")]
    OrientationFailed {
        metadata: Box<ScanMetadata>,
        error: String,
    },

    /// Volume ready but rendering or display failed
    #[error("{error}")]
    DisplayFailed {
        metadata: Box<ScanMetadata>,
        error: String,
    },
}

impl ProcessError {
    /// Map a volume selection failure onto the user-facing variants
    #[must_use]
    pub fn from_selection(error: VolumeError, metadata: ScanMetadata) -> Self {
        let metadata = Box::new(metadata);
        match error {
            VolumeError::MissingSelection { volumes } => Self::MissingVolume { metadata, volumes },
            VolumeError::InvalidSelection { requested, volumes } => Self::InvalidVolume {
                metadata,
                requested,
                volumes,
            },
            other => Self::OrientationFailed {
                metadata,
                error: other.to_string(),
            },
        }
    }

    /// Returns metadata if available
    pub fn metadata(&self) -> Option<&ScanMetadata> {
        match self {
            ProcessError::MissingVolume { metadata, .. }
            | ProcessError::InvalidVolume { metadata, .. }
            | ProcessError::OrientationFailed { metadata, .. }
            | ProcessError::DisplayFailed { metadata, .. } => Some(metadata.as_ref()),
            _ => None,
        }
    }

    /// Valid volume range to report, for volume selection errors
    #[must_use]
    pub fn volume_range(&self) -> Option<(usize, usize)> {
        match self {
            ProcessError::MissingVolume { volumes, .. }
            | ProcessError::InvalidVolume { volumes, .. } => Some((0, volumes.saturating_sub(1))),
            _ => None,
        }
    }

    /// Volume selection errors are usage errors and come with the help text
    #[must_use]
    pub fn is_usage_error(&self) -> bool {
        self.volume_range().is_some()
    }
}
