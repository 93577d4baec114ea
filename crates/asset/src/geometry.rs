//! CPU-side geometry produced by the OBJ parser.
//!
//! Attributes are flattened per emitted triangle-vertex; there is no index buffer.

use glam::Vec3;

use crate::error::Diagnostic;

/// Uniform color used when a geometry carries no per-vertex colors.
pub const UNIFORM_WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

/// A run of triangles sharing one material, object and group set.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Geometry {
    pub object: Option<String>,
    pub groups: Vec<String>,
    pub material: Option<String>,
    /// xyz per vertex.
    pub position: Vec<f32>,
    /// xyz per vertex; `None` unless every vertex referenced a normal.
    pub normal: Option<Vec<f32>>,
    /// uv per vertex; `None` unless every vertex referenced a texcoord.
    pub texcoord: Option<Vec<f32>>,
    /// rgb per vertex; `None` unless every referenced position carried a color.
    pub color: Option<Vec<f32>>,
}

/// Where a consumer should take vertex color from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ColorSource<'a> {
    /// rgb triplets, one per vertex.
    PerVertex(&'a [f32]),
    /// rgba applied to the whole geometry.
    Uniform([f32; 4]),
}

impl Geometry {
    pub fn material(&self) -> Option<&str> {
        self.material.as_deref()
    }

    pub fn vertex_count(&self) -> usize {
        self.position.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.vertex_count() / 3
    }

    /// Returns `true` if every populated attribute agrees on the vertex count.
    pub fn is_consistent(&self) -> bool {
        let n = self.vertex_count();
        self.position.len() % 9 == 0
            && self.normal.as_ref().is_none_or(|a| a.len() == n * 3)
            && self.texcoord.as_ref().is_none_or(|a| a.len() == n * 2)
            && self.color.as_ref().is_none_or(|a| a.len() == n * 3)
    }

    pub fn color_source(&self) -> ColorSource<'_> {
        match &self.color {
            Some(colors) if colors.len() == self.position.len() => ColorSource::PerVertex(colors),
            _ => ColorSource::Uniform(UNIFORM_WHITE),
        }
    }

    pub fn extents(&self) -> Option<Extents> {
        Extents::from_positions(&self.position)
    }
}

/// Everything recovered from one OBJ text.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObjDocument {
    /// `mtllib` filenames in source order, duplicates kept.
    pub material_libs: Vec<String>,
    /// Geometries in creation order.
    pub geometries: Vec<Geometry>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ObjDocument {
    pub fn is_empty(&self) -> bool {
        self.geometries.is_empty()
    }

    /// Union of the extents of every geometry.
    pub fn extents(&self) -> Option<Extents> {
        self.geometries
            .iter()
            .filter_map(Geometry::extents)
            .reduce(|a, b| a.union(&b))
    }
}

/// Axis-aligned bounds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Extents {
    pub min: Vec3,
    pub max: Vec3,
}

impl Extents {
    /// `None` for an empty buffer.
    pub fn from_positions(positions: &[f32]) -> Option<Self> {
        let mut points = positions
            .chunks_exact(3)
            .map(|p| Vec3::new(p[0], p[1], p[2]));
        let first = points.next()?;
        let (min, max) = points.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Some(Self { min, max })
    }

    pub fn union(&self, other: &Extents) -> Extents {
        Extents {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec3 {
        self.min + self.size() * 0.5
    }

    /// Translation that moves the center to the origin.
    pub fn offset_to_origin(&self) -> Vec3 {
        -self.center()
    }
}
