use clap::{CommandFactory, Parser};
use niiview::cli::Args;
use niiview::display::{self, DisplaySize};
use niiview::image::{self, RenderSettings};
use niiview::nifti::{self, NiftiScan, ProcessError};
use niiview::viewer::{self, ViewBounds};
use niiview::types::{Calibration, VoxelSpacing};
use niiview::window::{DisplayMode, WindowLimits, WindowParams};
use niiview::{normalize, CanonicalVolume, Plane};
use std::io::IsTerminal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() {
    init_tracing();
    let args = Args::parse();

    if let Err(e) = process_file(&args) {
        report_error(&e);
        std::process::exit(1);
    }
}

/// Log to stderr, filtered by `RUST_LOG` (default `warn`)
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn report_error(e: &ProcessError) {
    if !e.is_usage_error() {
        println!("Error: {e}");
        return;
    }

    println!("{e}");
    if let Some((first, last)) = e.volume_range() {
        println!("Valid volume indices: [{first}, {last}]");
    }
    println!();
    let _ = Args::command().print_help();
    println!();
}

/// Load, reorient and show one NIfTI file
fn process_file(args: &Args) -> Result<(), ProcessError> {
    // Stage 1: Open NIfTI file
    let obj = nifti::open_nifti_file(&args.input)
        .map_err(|e| ProcessError::NotANiftiFile(format!("{e:#}")))?;

    // Stage 2: Extract metadata and decode voxels
    let partial_metadata = nifti::extract_header_metadata(&obj);
    let NiftiScan { metadata, volume } = match nifti::extract_nifti_data(obj) {
        Ok(scan) => scan,
        Err(e) => {
            if let Ok(meta) = partial_metadata {
                niiview::print_metadata(&meta);
            }
            return Err(ProcessError::ExtractionFailed(format!("{e:#}")));
        }
    };

    // Stage 3: Metadata
    niiview::print_metadata(&metadata);
    if !metadata.is_multi_volume()
        && let Some(index) = args.volume
    {
        warn!("Ignoring --volume {index}: scan has a single volume");
    }

    // Stage 4: Reorient to RAS, then pick the acquisition
    let code = metadata.orientation;
    let ops = code.ops_to_ras();
    let (canonical, shape) = normalize(volume, code).map_err(|e| ProcessError::OrientationFailed {
        metadata: Box::new(metadata.clone()),
        error: e.to_string(),
    })?;
    niiview::print_reorientation(code, &shape);
    info!("Reoriented {code} to RAS with {} op(s)", ops.len());

    let canonical = canonical
        .select_volume(args.volume)
        .map_err(|e| ProcessError::from_selection(e, metadata.clone()))?;

    // Stage 5: Display
    let spacing = metadata.spacing.reoriented(&ops);
    show(&canonical, spacing, metadata.calibration, args).map_err(|e| ProcessError::DisplayFailed {
        metadata: Box::new(metadata),
        error: format!("{e:#}"),
    })
}

fn show(
    canonical: &CanonicalVolume,
    spacing: VoxelSpacing,
    calibration: Calibration,
    args: &Args,
) -> anyhow::Result<()> {
    let mode = args.window.then_some(if args.calibrated {
        DisplayMode::Calibrated(calibration)
    } else {
        DisplayMode::Raw
    });

    let volume = match mode {
        Some(DisplayMode::Calibrated(calibration)) => canonical.calibrated(&calibration),
        _ => canonical.clone(),
    };
    let (_, max) = volume.intensity_range();

    let window = mode
        .map(|mode| {
            let initial = mode.initial_window(max);
            WindowParams::new(
                args.level.unwrap_or(initial.level()),
                args.window_width.unwrap_or(initial.width()),
            )
        })
        .transpose()?;
    if let (Some(mode), Some(w)) = (mode, window) {
        info!("Windowing {mode}: {w}");
    }

    let planes = args.view.planes();
    let size = DisplaySize {
        width: args.width,
        height: args.height,
        panes: u32::try_from(planes.len()).unwrap_or(1),
    };
    let settings = RenderSettings {
        windowing: window.map(|w| (w, args.formula)),
        spacing,
    };

    if !args.image && std::io::stdout().is_terminal() {
        let spatial = volume.spatial()?;
        let (x, y, z) = spatial.dim();
        let bounds = ViewBounds {
            extents: [x, y, z],
            limits: window.map(|w| WindowLimits::for_volume(max, &w)),
            initial_window: window,
            start_plane: planes.first().copied().unwrap_or(Plane::Axial),
            multiview: planes.len() > 1,
        };
        viewer::run_interactive(&volume, planes, &bounds, args.formula, settings, size)
    } else {
        let frame = image::render_mid_slices(&volume, planes, &settings)?;
        display::print_image(&frame, &size)
    }
}
