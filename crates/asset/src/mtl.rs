//! MTL parser: material definitions keyed by `newmtl` name.

use crate::{
    ParseOptions,
    error::{Diagnostic, Diagnostics, LineError, ParseResult},
    lines::{Directive, directives, exact_floats, parse_number},
    material::{Material, MaterialLibrary},
};

/// Recognized MTL keywords.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MtlKeyword {
    NewMaterial,
    Property(Property),
    Unknown,
}

/// Keywords that set a field on the active material.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Property {
    Ambient,
    Diffuse,
    Specular,
    Emissive,
    Shininess,
    OpticalDensity,
    Opacity,
    Illumination,
    Roughness,
    Metallic,
    SpecularIntensity,
    ClearCoat,
    ClearCoatRoughness,
    Anisotropy,
    AnisotropyRotation,
}

impl MtlKeyword {
    fn from_token(token: &str) -> Self {
        let property = match token {
            "newmtl" => return Self::NewMaterial,
            "Ka" => Property::Ambient,
            "Kd" => Property::Diffuse,
            "Ks" => Property::Specular,
            "Ke" => Property::Emissive,
            "Ns" => Property::Shininess,
            "Ni" => Property::OpticalDensity,
            "d" => Property::Opacity,
            "illum" => Property::Illumination,
            "Pr" => Property::Roughness,
            "Pm" => Property::Metallic,
            "Ps" => Property::SpecularIntensity,
            "Pc" => Property::ClearCoat,
            "Pcr" => Property::ClearCoatRoughness,
            "aniso" => Property::Anisotropy,
            "anisor" => Property::AnisotropyRotation,
            _ => return Self::Unknown,
        };
        Self::Property(property)
    }
}

impl Property {
    fn apply(self, material: &mut Material, args: &[&str]) -> Result<(), LineError> {
        match self {
            Property::Ambient => material.ambient = Some(exact_floats::<3>(args)?),
            Property::Diffuse => material.diffuse = Some(exact_floats::<3>(args)?),
            Property::Specular => material.specular = Some(exact_floats::<3>(args)?),
            Property::Emissive => material.emissive = Some(exact_floats::<3>(args)?),
            Property::Shininess => material.shininess = Some(scalar(args)?),
            Property::OpticalDensity => material.optical_density = Some(scalar(args)?),
            Property::Opacity => material.opacity = Some(scalar(args)?),
            Property::Illumination => {
                let [token] = exact_tokens::<1>(args)?;
                material.illumination = Some(parse_number(token)?);
            }
            Property::Roughness => material.roughness = Some(scalar(args)?),
            Property::Metallic => material.metallic = Some(scalar(args)?),
            Property::SpecularIntensity => material.specular_intensity = Some(scalar(args)?),
            Property::ClearCoat => material.clear_coat = Some(scalar(args)?),
            Property::ClearCoatRoughness => material.clear_coat_roughness = Some(scalar(args)?),
            Property::Anisotropy => material.anisotropy = Some(scalar(args)?),
            Property::AnisotropyRotation => material.anisotropy_rotation = Some(scalar(args)?),
        }
        Ok(())
    }
}

/// Working state for one MTL parse.
#[derive(Debug, Default)]
struct MtlContext {
    library: MaterialLibrary,
    /// Name of the material receiving properties.
    active: Option<String>,
}

impl MtlContext {
    fn apply(&mut self, directive: Directive<'_>) -> Result<(), LineError> {
        match MtlKeyword::from_token(directive.keyword) {
            MtlKeyword::NewMaterial => {
                if directive.rest.is_empty() {
                    return Err(LineError::MissingName);
                }
                let name = directive.rest.to_owned();
                let previous = self
                    .library
                    .materials
                    .insert(name.clone(), Material::default());
                if previous.is_some() {
                    log::debug!("Material '{}' redefined on line {}", name, directive.line);
                }
                self.active = Some(name);
                Ok(())
            }
            MtlKeyword::Property(property) => {
                let material = self
                    .active
                    .as_deref()
                    .and_then(|name| self.library.materials.get_mut(name))
                    .ok_or(LineError::PropertyBeforeMaterial)?;
                let args: Vec<&str> = directive.args().collect();
                property.apply(material, &args)
            }
            MtlKeyword::Unknown => Err(LineError::UnknownKeyword),
        }
    }
}

fn scalar(args: &[&str]) -> Result<f32, LineError> {
    let [value] = exact_floats::<1>(args)?;
    Ok(value)
}

fn exact_tokens<'a, const N: usize>(args: &[&'a str]) -> Result<[&'a str; N], LineError> {
    <[&str; N]>::try_from(args).map_err(|_| {
        if args.len() < N {
            LineError::NotEnoughData {
                found: args.len(),
                expected: N,
            }
        } else {
            LineError::TooManyValues {
                found: args.len(),
                expected: N,
            }
        }
    })
}

/// Parses MTL text with default options.
pub fn parse_mtl(text: &str) -> MaterialLibrary {
    // Permissive parsing has no fatal MTL errors.
    parse_mtl_with(text, &ParseOptions::default()).unwrap_or_default()
}

/// Parses several MTL texts as one, in order; later definitions of a name win.
pub fn parse_mtl_sources<S: AsRef<str>>(sources: &[S]) -> MaterialLibrary {
    let joined = sources
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join("\n");
    parse_mtl(&joined)
}

pub fn parse_mtl_with(text: &str, options: &ParseOptions) -> ParseResult<MaterialLibrary> {
    let mut context = MtlContext::default();
    let mut diagnostics = Diagnostics::new(options.strict);

    for directive in directives(text) {
        if let Err(error) = context.apply(directive) {
            diagnostics.report(Diagnostic::new(directive.line, directive.keyword, error))?;
        }
    }

    let mut library = context.library;
    library.diagnostics = diagnostics.into_vec();
    log::debug!(
        "Parsed MTL: {} materials, {} diagnostics",
        library.len(),
        library.diagnostics.len()
    );
    Ok(library)
}
