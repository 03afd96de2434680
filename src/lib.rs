pub mod cli;
pub mod nifti;
pub mod image;
pub mod display;
pub mod display_metadata;
pub mod orientation;
pub mod types;
pub mod viewer;
pub mod volume;
pub mod window;

// Re-export commonly used functions
pub use display_metadata::{print_metadata, print_reorientation};
pub use orientation::{normalize, OrientationCode};
pub use volume::{CanonicalVolume, Plane, VoxelVolume};
pub use window::window;
