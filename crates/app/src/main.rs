//! Entry point: loads an OBJ and its material libraries from disk and reports what was parsed.
//!
//! Usage: `app <model.obj> [--mtl=<extra.mtl>]... [--strict]`

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use asset::{ColorSource, ObjDocument, ParseOptions};

#[derive(Debug, Default, PartialEq)]
struct CliArgs {
    obj_path: PathBuf,
    extra_mtl: Vec<PathBuf>,
    strict: bool,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<CliArgs> {
    let mut obj_path: Option<PathBuf> = None;
    let mut extra_mtl = Vec::new();
    let mut strict = false;

    for arg in args {
        if let Some(val) = arg.strip_prefix("--mtl=") {
            extra_mtl.push(PathBuf::from(val));
        } else if arg == "--strict" {
            strict = true;
        } else if let Some(val) = arg.strip_prefix("--strict=") {
            strict = matches!(
                val.to_ascii_lowercase().as_str(),
                "1" | "true" | "on" | "yes"
            );
        } else if arg.starts_with("--") {
            log::warn!("Unknown flag '{}', ignoring.", arg);
        } else if obj_path.is_none() {
            obj_path = Some(PathBuf::from(arg));
        } else {
            bail!("Only one OBJ path may be given (extra: '{}')", arg);
        }
    }

    let Some(obj_path) = obj_path else {
        bail!("Usage: app <model.obj> [--mtl=<extra.mtl>]... [--strict]");
    };
    Ok(CliArgs {
        obj_path,
        extra_mtl,
        strict,
    })
}

/// Reads every `mtllib` relative to the OBJ's directory, plus any extra files.
/// Missing libraries are logged and skipped; their materials fall back to defaults.
fn read_material_texts(obj_path: &Path, doc: &ObjDocument, extra: &[PathBuf]) -> Vec<String> {
    let base = obj_path.parent().unwrap_or_else(|| Path::new(""));
    doc.material_libs
        .iter()
        .map(|name| base.join(name))
        .chain(extra.iter().cloned())
        .filter_map(|path| match fs::read_to_string(&path) {
            Ok(text) => {
                log::info!("Loaded material library {}", path.display());
                Some(text)
            }
            Err(e) => {
                log::warn!("Failed to read material library {}: {}", path.display(), e);
                None
            }
        })
        .collect()
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = parse_args(std::env::args().skip(1))?;
    let options = ParseOptions {
        strict: args.strict,
    };
    log::info!(
        "Loading {} (strict={})",
        args.obj_path.display(),
        options.strict
    );

    let obj_text = fs::read_to_string(&args.obj_path)
        .with_context(|| format!("Failed to open OBJ file: {}", args.obj_path.display()))?;
    let doc = asset::parse_obj_with(&obj_text, &options)
        .with_context(|| format!("Failed to parse {}", args.obj_path.display()))?;

    let mtl_texts = read_material_texts(&args.obj_path, &doc, &args.extra_mtl);
    let library = asset::parse_mtl_with(&mtl_texts.join("\n"), &options)
        .context("Failed to parse material libraries")?;

    log::info!(
        "{} geometries, {} materials, {} OBJ diagnostics, {} MTL diagnostics",
        doc.geometries.len(),
        library.len(),
        doc.diagnostics.len(),
        library.diagnostics.len()
    );

    for (i, geometry) in doc.geometries.iter().enumerate() {
        let material = library.resolve(geometry.material());
        let color = match geometry.color_source() {
            ColorSource::PerVertex(_) => "per-vertex".to_owned(),
            ColorSource::Uniform(rgba) => format!("uniform {:?}", rgba),
        };
        log::info!(
            "#{} object={:?} material={:?}: {} triangles, normals={}, texcoords={}, color={}, diffuse={:?}",
            i,
            geometry.object,
            geometry.material(),
            geometry.triangle_count(),
            geometry.normal.is_some(),
            geometry.texcoord.is_some(),
            color,
            material.diffuse
        );
    }

    match doc.extents() {
        Some(extents) => log::info!(
            "Extents min={:?} max={:?}; centering offset {:?}",
            extents.min,
            extents.max,
            extents.offset_to_origin()
        ),
        None => log::info!("No geometry to measure."),
    }

    Ok(())
}
