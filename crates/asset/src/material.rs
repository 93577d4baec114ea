//! Material records parsed from MTL and their renderer-facing resolution.

use std::collections::HashMap;

use crate::error::Diagnostic;

pub type Color = [f32; 3];

/// One `newmtl` block. Unset fields stay `None`, distinct from an explicit zero.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Material {
    /// `Ka`
    pub ambient: Option<Color>,
    /// `Kd`
    pub diffuse: Option<Color>,
    /// `Ks`
    pub specular: Option<Color>,
    /// `Ke`
    pub emissive: Option<Color>,
    /// `Ns`
    pub shininess: Option<f32>,
    /// `Ni`
    pub optical_density: Option<f32>,
    /// `d`
    pub opacity: Option<f32>,
    /// `illum`
    pub illumination: Option<u32>,
    /// `Pr`
    pub roughness: Option<f32>,
    /// `Pm`
    pub metallic: Option<f32>,
    /// `Ps`
    pub specular_intensity: Option<f32>,
    /// `Pc`
    pub clear_coat: Option<f32>,
    /// `Pcr`
    pub clear_coat_roughness: Option<f32>,
    /// `aniso`
    pub anisotropy: Option<f32>,
    /// `anisor`
    pub anisotropy_rotation: Option<f32>,
}

/// Fully populated material values handed to a renderer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolvedMaterial {
    pub diffuse: Color,
    pub ambient: Color,
    pub emissive: Color,
    pub specular: Color,
    pub shininess: f32,
    pub opacity: f32,
    pub clear_coat: f32,
    pub clear_coat_roughness: f32,
    pub specular_intensity: f32,
    pub anisotropy: f32,
    pub anisotropy_rotation: f32,
}

/// Fallback used for missing materials and for unset fields.
pub const fn default_material() -> ResolvedMaterial {
    ResolvedMaterial {
        diffuse: [1.0, 1.0, 1.0],
        ambient: [0.1, 0.1, 0.1],
        emissive: [0.0, 0.0, 0.0],
        specular: [1.0, 1.0, 1.0],
        shininess: 32.0,
        opacity: 1.0,
        clear_coat: 0.0,
        clear_coat_roughness: 0.5,
        specular_intensity: 1.0,
        anisotropy: 0.0,
        anisotropy_rotation: 0.0,
    }
}

impl Default for ResolvedMaterial {
    fn default() -> Self {
        default_material()
    }
}

impl Material {
    /// Fills every unset field from [`default_material`].
    pub fn resolved(&self) -> ResolvedMaterial {
        let d = default_material();
        ResolvedMaterial {
            diffuse: self.diffuse.unwrap_or(d.diffuse),
            ambient: self.ambient.unwrap_or(d.ambient),
            emissive: self.emissive.unwrap_or(d.emissive),
            specular: self.specular.unwrap_or(d.specular),
            shininess: self.shininess.unwrap_or(d.shininess),
            opacity: self.opacity.unwrap_or(d.opacity),
            clear_coat: self.clear_coat.unwrap_or(d.clear_coat),
            clear_coat_roughness: self.clear_coat_roughness.unwrap_or(d.clear_coat_roughness),
            specular_intensity: self.specular_intensity.unwrap_or(d.specular_intensity),
            anisotropy: self.anisotropy.unwrap_or(d.anisotropy),
            anisotropy_rotation: self.anisotropy_rotation.unwrap_or(d.anisotropy_rotation),
        }
    }
}

/// Output of the MTL parser: material name to record.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MaterialLibrary {
    pub materials: HashMap<String, Material>,
    pub diagnostics: Vec<Diagnostic>,
}

impl MaterialLibrary {
    pub fn get(&self, name: &str) -> Option<&Material> {
        self.materials.get(name)
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    /// Resolves a geometry's material reference, falling back to [`default_material`]
    /// when the name is `None` or not defined here.
    pub fn resolve(&self, name: Option<&str>) -> ResolvedMaterial {
        match name.and_then(|n| self.materials.get(n)) {
            Some(material) => material.resolved(),
            None => {
                if let Some(n) = name {
                    log::debug!("Material '{}' not defined; using default", n);
                }
                default_material()
            }
        }
    }
}
