use crate::nifti::ScanMetadata;
use crate::orientation::OrientationCode;

pub fn print_metadata(metadata: &ScanMetadata) {
    print_field("Description", metadata.description.as_ref());

    print_dimensions(metadata);
    println!("{:20}: {} ({} bits)", "Datatype", metadata.datatype, metadata.bitpix);
    print_spacing(metadata);

    println!(
        "{:20}: {} (qform_code {}, sform_code {})",
        "Affine Source", metadata.affine_source, metadata.qform_code, metadata.sform_code
    );
    for (i, row) in metadata.affine.to_string().lines().enumerate() {
        let (label, sep) = if i == 0 { ("Affine", ':') } else { ("", ' ') };
        println!("{label:20}{sep} {row}");
    }
    println!("{:20}: {}", "Orientation", metadata.orientation);

    if !metadata.calibration.is_identity() {
        println!("{:20}: {}", "Calibration", metadata.calibration);
    }

    if let Some((min, max)) = metadata.intensity_range {
        println!("{:20}: {min} .. {max}", "Intensity Range");
    }

    println!();
}

/// Report the reorientation applied before display
pub fn print_reorientation(from: OrientationCode, shape: &[usize]) {
    let shape = shape.iter().map(ToString::to_string).collect::<Vec<_>>().join("x");
    if from.is_canonical() {
        println!("{:20}: {from} (unchanged), shape {shape}", "Reoriented");
    } else {
        println!("{:20}: {from} -> {}, shape {shape}", "Reoriented", OrientationCode::RAS);
    }
}

fn print_field(name: &str, value: Option<&String>) {
    if let Some(v) = value {
        println!("{name:20}: {v}");
    }
}

fn print_dimensions(metadata: &ScanMetadata) {
    let dims = metadata.dims.iter().map(ToString::to_string).collect::<Vec<_>>().join("x");
    match metadata.volume_count() {
        Some(volumes) => println!("{:20}: {dims} [{}D, {volumes} volumes]", "Dimensions", metadata.ndim),
        None => println!("{:20}: {dims} [{}D]", "Dimensions", metadata.ndim),
    }
}

fn print_spacing(metadata: &ScanMetadata) {
    let unit = metadata.spatial_unit.unwrap_or("");
    println!("{:20}: {}{unit}", "Voxel Size", metadata.spacing);
}
