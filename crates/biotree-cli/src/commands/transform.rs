use super::{load_input, resolve_target};
use crate::cli::TransformArgs;
use crate::config::build_settings;
use crate::error::{CliError, Result};
use crate::io::writer::describe;
use nalgebra::{Matrix3, Vector3};
use tracing::info;

fn parse_rotation(values: Option<&[f64]>) -> Result<Matrix3<f64>> {
    match values {
        None => Ok(Matrix3::identity()),
        Some(values) if values.len() == 9 => Ok(Matrix3::from_row_slice(values)),
        Some(values) => Err(CliError::Argument(format!(
            "--rotation expects 9 values, got {}",
            values.len()
        ))),
    }
}

fn parse_translation(values: Option<&[f64]>) -> Result<Vector3<f64>> {
    match values {
        None => Ok(Vector3::zeros()),
        Some(values) if values.len() == 3 => Ok(Vector3::from_row_slice(values)),
        Some(values) => Err(CliError::Argument(format!(
            "--translation expects 3 values, got {}",
            values.len()
        ))),
    }
}

pub fn run(args: TransformArgs) -> Result<()> {
    let rotation = parse_rotation(args.rotation.as_deref())?;
    let translation = parse_translation(args.translation.as_deref())?;

    let settings = build_settings(&args.input, None)?;
    let mut loaded = load_input(&args.input, &settings)?;
    let target = resolve_target(&loaded, &args.target)?;

    info!("Applying rigid-body transform to {:?}", target);
    loaded.hierarchy.transform(target, &rotation, &translation)?;

    let description = describe(loaded.root()?)?;
    description.to_file(&args.output)?;
    println!("Wrote transformed structure to {}", args.output.display());
    Ok(())
}
