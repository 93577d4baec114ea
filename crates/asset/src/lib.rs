//! Wavefront OBJ/MTL ingestion.
//! Text in, renderer-agnostic geometry and materials out; no I/O happens here.

pub mod error;
pub mod geometry;
mod lines;
pub mod material;
pub mod mtl;
pub mod obj;

pub use error::{Diagnostic, LineError, ParseError, ParseResult, Pool};
pub use geometry::{ColorSource, Extents, Geometry, ObjDocument};
pub use material::{Material, MaterialLibrary, ResolvedMaterial, default_material};
pub use mtl::{parse_mtl, parse_mtl_sources, parse_mtl_with};
pub use obj::{parse_obj, parse_obj_with};

/// Parser behaviour shared by OBJ and MTL.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Treat the first rejected directive as fatal. Unknown keywords are still skipped.
    pub strict: bool,
}
