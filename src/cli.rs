use crate::volume::Plane;
use crate::window::WindowFormula;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// A terminal-based NIfTI brain scan viewer
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// NIfTI file path (.nii or .nii.gz)
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// Slice view to display
    #[arg(short, long, value_enum, default_value_t = ViewMode::Multiview)]
    pub view: ViewMode,

    /// Print a static snapshot of the mid slices instead of the interactive viewer
    #[arg(long)]
    pub image: bool,

    /// Enable intensity windowing
    #[arg(short, long)]
    pub window: bool,

    /// Window calibrated units (scl_slope * value + scl_inter) instead of stored values
    #[arg(short, long, requires = "window")]
    pub calibrated: bool,

    /// Initial window level
    #[arg(long, requires = "window")]
    pub level: Option<f32>,

    /// Initial window width
    #[arg(long, requires = "window")]
    pub window_width: Option<f32>,

    /// Mapping applied inside the window
    #[arg(long, value_enum, default_value_t = WindowFormula::Rescale)]
    pub formula: WindowFormula,

    /// Volume to display when the scan contains more than one
    #[arg(long, allow_negative_numbers = true)]
    pub volume: Option<i64>,

    /// Output width in terminal columns
    #[arg(short = 'W', long)]
    pub width: Option<u32>,

    /// Output height in terminal rows
    #[arg(short = 'H', long)]
    pub height: Option<u32>,
}

impl Args {
    /// Arguments for `input` with every option at its default
    #[must_use]
    pub fn for_input(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            view: ViewMode::Multiview,
            image: false,
            window: false,
            calibrated: false,
            level: None,
            window_width: None,
            formula: WindowFormula::Rescale,
            volume: None,
            width: None,
            height: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ViewMode {
    /// Sagittal, coronal and axial side by side
    Multiview,
    /// Sagittal only
    Sag,
    /// Coronal only
    Cor,
    /// Axial only
    Axi,
}

impl ViewMode {
    /// Planes shown, left to right
    #[must_use]
    pub fn planes(self) -> &'static [Plane] {
        match self {
            Self::Multiview => &Plane::ALL,
            Self::Sag => &[Plane::Sagittal],
            Self::Cor => &[Plane::Coronal],
            Self::Axi => &[Plane::Axial],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_full_command_line() {
        let args = Args::try_parse_from([
            "niiview", "-i", "brain.nii.gz", "-v", "axi", "-w", "-c", "--level", "40",
            "--window-width", "80", "--formula", "clamp", "--volume", "2",
        ])
        .unwrap();
        assert_eq!(args.view, ViewMode::Axi);
        assert!(args.window && args.calibrated);
        assert_eq!(args.level, Some(40.0));
        assert_eq!(args.window_width, Some(80.0));
        assert_eq!(args.formula, WindowFormula::Clamp);
        assert_eq!(args.volume, Some(2));
    }

    #[test]
    fn test_negative_volume_is_parsed() {
        let args = Args::try_parse_from(["niiview", "-i", "scan.nii", "--volume", "-1"]).unwrap();
        assert_eq!(args.volume, Some(-1));
    }

    #[test]
    fn test_input_is_required() {
        assert!(Args::try_parse_from(["niiview"]).is_err());
    }

    #[test]
    fn test_calibrated_requires_window() {
        assert!(Args::try_parse_from(["niiview", "-i", "scan.nii", "--calibrated"]).is_err());
    }

    #[test]
    fn test_multiview_planes() {
        assert_eq!(ViewMode::Multiview.planes().len(), 3);
        assert_eq!(ViewMode::Cor.planes(), &[Plane::Coronal]);
    }
}
