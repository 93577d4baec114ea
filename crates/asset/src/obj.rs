//! OBJ parser producing flattened, per-material geometries.
//!
//! Faces are fan-triangulated and every triangle-vertex is written out in full, so
//! the output needs no index buffer. Index references are resolved against the pool
//! lengths at the moment the face is read.

use crate::{
    ParseOptions,
    error::{Diagnostic, Diagnostics, LineError, ParseError, ParseResult, Pool},
    geometry::{Geometry, ObjDocument},
    lines::{Directive, directives, leading_floats},
};

/// Recognized OBJ keywords.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ObjKeyword {
    Vertex,
    Normal,
    TexCoord,
    Face,
    UseMaterial,
    MaterialLib,
    Object,
    Group,
    Smoothing,
    Unknown,
}

impl ObjKeyword {
    fn from_token(token: &str) -> Self {
        match token {
            "v" => Self::Vertex,
            "vn" => Self::Normal,
            "vt" => Self::TexCoord,
            "f" => Self::Face,
            "usemtl" => Self::UseMaterial,
            "mtllib" => Self::MaterialLib,
            "o" => Self::Object,
            "g" => Self::Group,
            "s" => Self::Smoothing,
            _ => Self::Unknown,
        }
    }
}

/// A line is either skipped with a diagnostic or ends the parse.
#[derive(Debug)]
enum Rejection {
    Line(LineError),
    Fatal(ParseError),
}

impl From<LineError> for Rejection {
    fn from(error: LineError) -> Self {
        Rejection::Line(error)
    }
}

/// Raw attributes in declaration order.
#[derive(Debug, Default)]
struct Pools {
    positions: Vec<[f32; 3]>,
    /// Parallel to `positions`.
    colors: Vec<Option<[f32; 3]>>,
    normals: Vec<[f32; 3]>,
    texcoords: Vec<[f32; 2]>,
}

impl Pools {
    fn len(&self, pool: Pool) -> usize {
        match pool {
            Pool::Position => self.positions.len(),
            Pool::TexCoord => self.texcoords.len(),
            Pool::Normal => self.normals.len(),
        }
    }
}

/// Zero-based pool indices of one face vertex.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct VertexRef {
    position: usize,
    texcoord: Option<usize>,
    normal: Option<usize>,
}

/// Working state for one OBJ parse.
#[derive(Debug, Default)]
struct ObjContext {
    pools: Pools,
    material_libs: Vec<String>,
    geometries: Vec<Geometry>,
    /// Geometry receiving faces; opened lazily by the first face after a boundary.
    current: Option<Geometry>,
    material: Option<String>,
    object: Option<String>,
    groups: Vec<String>,
}

impl ObjContext {
    fn apply(&mut self, directive: Directive<'_>) -> Result<(), Rejection> {
        let args: Vec<&str> = directive.args().collect();
        match ObjKeyword::from_token(directive.keyword) {
            ObjKeyword::Vertex => {
                let position = leading_floats::<3>(&args)?;
                let color = if args.len() >= 6 {
                    Some(leading_floats::<3>(&args[3..])?)
                } else {
                    None
                };
                self.pools.positions.push(position);
                self.pools.colors.push(color);
            }
            ObjKeyword::Normal => self.pools.normals.push(leading_floats::<3>(&args)?),
            ObjKeyword::TexCoord => self.pools.texcoords.push(leading_floats::<2>(&args)?),
            ObjKeyword::Face => self.face(&args, directive.line)?,
            ObjKeyword::UseMaterial => {
                if directive.rest.is_empty() {
                    return Err(LineError::MissingName.into());
                }
                self.material = Some(directive.rest.to_owned());
                if self
                    .current
                    .as_ref()
                    .is_some_and(|geometry| geometry.material != self.material)
                {
                    self.close_geometry();
                }
            }
            ObjKeyword::MaterialLib => {
                if args.is_empty() {
                    return Err(LineError::MissingName.into());
                }
                self.material_libs
                    .extend(args.iter().map(|name| (*name).to_owned()));
            }
            ObjKeyword::Object => {
                self.close_geometry();
                self.object = (!directive.rest.is_empty()).then(|| directive.rest.to_owned());
            }
            ObjKeyword::Group => {
                self.close_geometry();
                self.groups = args.iter().map(|name| (*name).to_owned()).collect();
            }
            ObjKeyword::Smoothing => {}
            ObjKeyword::Unknown => return Err(LineError::UnknownKeyword.into()),
        }
        Ok(())
    }

    fn face(&mut self, args: &[&str], line: usize) -> Result<(), Rejection> {
        if args.len() < 3 {
            return Err(LineError::DegenerateFace { found: args.len() }.into());
        }

        // Resolve everything up front so a bad reference drops the whole face.
        let refs = args
            .iter()
            .map(|token| parse_face_vertex(token, &self.pools, line))
            .collect::<Result<Vec<_>, _>>()?;

        let geometry = self.current.get_or_insert_with(|| Geometry {
            object: self.object.clone(),
            groups: self.groups.clone(),
            material: self.material.clone(),
            normal: Some(Vec::new()),
            texcoord: Some(Vec::new()),
            color: Some(Vec::new()),
            ..Default::default()
        });

        // Fan around the first vertex.
        for tri in 1..(refs.len() - 1) {
            for vertex in [refs[0], refs[tri], refs[tri + 1]] {
                emit_vertex(geometry, &self.pools, vertex);
            }
        }
        Ok(())
    }

    fn close_geometry(&mut self) {
        if let Some(geometry) = self.current.take() {
            log::trace!(
                "Closing geometry (material={:?}, {} vertices)",
                geometry.material,
                geometry.vertex_count()
            );
            self.geometries.push(geometry);
        }
    }

    fn finish(mut self, diagnostics: Vec<Diagnostic>) -> ObjDocument {
        self.close_geometry();
        ObjDocument {
            material_libs: self.material_libs,
            geometries: self.geometries,
            diagnostics,
        }
    }
}

/// Appends one triangle-vertex; an attribute missing on any vertex is dropped for the geometry.
fn emit_vertex(geometry: &mut Geometry, pools: &Pools, vertex: VertexRef) {
    geometry
        .position
        .extend_from_slice(&pools.positions[vertex.position]);
    push_attribute(
        &mut geometry.normal,
        vertex.normal.map(|i| pools.normals[i]),
    );
    push_attribute(
        &mut geometry.texcoord,
        vertex.texcoord.map(|i| pools.texcoords[i]),
    );
    push_attribute(&mut geometry.color, pools.colors[vertex.position]);
}

fn push_attribute<const N: usize>(buffer: &mut Option<Vec<f32>>, value: Option<[f32; N]>) {
    match value {
        Some(value) => {
            if let Some(data) = buffer {
                data.extend_from_slice(&value);
            }
        }
        None => *buffer = None,
    }
}

/// Parses `v`, `v/vt`, `v//vn` or `v/vt/vn`.
fn parse_face_vertex(token: &str, pools: &Pools, line: usize) -> Result<VertexRef, Rejection> {
    let parts: Vec<&str> = token.split('/').collect();
    if parts.len() > 3 || parts[0].is_empty() {
        return Err(LineError::InvalidFaceVertex {
            token: token.to_owned(),
        }
        .into());
    }

    let position = resolve_index(parts[0], pools, Pool::Position, line)?;

    let texcoord = match parts.get(1) {
        Some(value) if !value.is_empty() => Some(resolve_index(value, pools, Pool::TexCoord, line)?),
        _ => None,
    };

    let normal = match parts.get(2) {
        Some(value) if !value.is_empty() => Some(resolve_index(value, pools, Pool::Normal, line)?),
        _ => None,
    };

    Ok(VertexRef {
        position,
        texcoord,
        normal,
    })
}

/// Turns a 1-based or negative (relative) index into a zero-based one.
fn resolve_index(token: &str, pools: &Pools, pool: Pool, line: usize) -> Result<usize, Rejection> {
    let raw = token
        .parse::<i64>()
        .map_err(|_| LineError::MalformedNumber {
            token: token.to_owned(),
        })?;
    if raw == 0 {
        return Err(LineError::InvalidIndex.into());
    }

    let len = pools.len(pool);
    if len == 0 {
        return Err(Rejection::Fatal(ParseError::EmptyPool { line, pool }));
    }

    let idx = if raw > 0 { raw - 1 } else { len as i64 + raw };
    if idx < 0 || idx as usize >= len {
        return Err(LineError::IndexOutOfRange { index: raw, len }.into());
    }

    Ok(idx as usize)
}

/// Parses OBJ text with default (permissive) options.
pub fn parse_obj(text: &str) -> ParseResult<ObjDocument> {
    parse_obj_with(text, &ParseOptions::default())
}

pub fn parse_obj_with(text: &str, options: &ParseOptions) -> ParseResult<ObjDocument> {
    let mut context = ObjContext::default();
    let mut diagnostics = Diagnostics::new(options.strict);

    for directive in directives(text) {
        match context.apply(directive) {
            Ok(()) => {}
            Err(Rejection::Line(error)) => {
                diagnostics.report(Diagnostic::new(directive.line, directive.keyword, error))?;
            }
            Err(Rejection::Fatal(error)) => {
                log::error!("OBJ parse aborted: {}", error);
                return Err(error);
            }
        }
    }

    let document = context.finish(diagnostics.into_vec());
    log::debug!(
        "Parsed OBJ: {} geometries, {} material libs, {} diagnostics",
        document.geometries.len(),
        document.material_libs.len(),
        document.diagnostics.len()
    );
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUAD: &str = "
        v 0 0 0
        v 1 0 0
        v 1 1 0
        v 0 1 0
    ";

    fn vertex(geometry: &Geometry, i: usize) -> [f32; 3] {
        let p = &geometry.position[i * 3..i * 3 + 3];
        [p[0], p[1], p[2]]
    }

    #[test]
    fn parse_simple_triangle() {
        let src = r#"
            v 0.0 0.0 0.0
            v 1.0 0.0 0.0
            v 0.0 1.0 0.0
            vn 0.0 0.0 1.0
            vt 0.0 0.0
            vt 1.0 0.0
            vt 0.0 1.0
            f 1/1/1 2/2/1 3/3/1
        "#;
        let doc = parse_obj(src).expect("parse triangle");
        assert_eq!(doc.geometries.len(), 1);
        let g = &doc.geometries[0];
        assert_eq!(g.position, vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
        let normals: Vec<f32> = [0.0, 0.0, 1.0].repeat(3);
        assert_eq!(g.normal.as_deref(), Some(normals.as_slice()));
        assert_eq!(
            g.texcoord.as_deref(),
            Some(&[0.0, 0.0, 1.0, 0.0, 0.0, 1.0][..])
        );
        assert_eq!(g.color, None);
        assert_eq!(g.material, None);
        assert!(g.is_consistent());
        assert!(doc.diagnostics.is_empty());
    }

    #[test]
    fn quad_is_fan_triangulated() {
        let doc = parse_obj(&format!("{QUAD}f 1 2 3 4")).expect("parse quad");
        let g = &doc.geometries[0];
        assert_eq!(g.vertex_count(), 6);
        assert_eq!(g.triangle_count(), 2);
        // Second triangle is (0, 2, 3): shares the apex and the closing edge vertex.
        assert_eq!(vertex(g, 3), vertex(g, 0));
        assert_eq!(vertex(g, 4), vertex(g, 2));
        assert_eq!(vertex(g, 5), [0.0, 1.0, 0.0]);
    }

    #[test]
    fn pentagon_yields_three_triangles() {
        let src = format!("{QUAD}v 0.5 1.5 0\nf 1 2 3 5 4");
        let doc = parse_obj(&src).expect("parse pentagon");
        assert_eq!(doc.geometries[0].triangle_count(), 3);
    }

    #[test]
    fn negative_indices_match_positive_equivalent() {
        let head = "v 0 0 0\nv 1 0 0\nv 0 1 0\n";
        let relative = parse_obj(&format!("{head}f -1 -2 -3")).expect("relative");
        let absolute = parse_obj(&format!("{head}f 3 2 1")).expect("absolute");
        assert_eq!(relative.geometries, absolute.geometries);
    }

    #[test]
    fn negative_indices_use_pool_length_at_reference() {
        let src = "
            v 0 0 0
            v 1 0 0
            v 0 1 0
            f -3 -2 -1
            v 5 5 5
            f -4 -3 -1
        ";
        let doc = parse_obj(src).expect("parse");
        let g = &doc.geometries[0];
        assert_eq!(g.vertex_count(), 6);
        assert_eq!(vertex(g, 2), [0.0, 1.0, 0.0]);
        assert_eq!(vertex(g, 3), [0.0, 0.0, 0.0]);
        assert_eq!(vertex(g, 5), [5.0, 5.0, 5.0]);
    }

    #[test]
    fn usemtl_starts_new_geometry() {
        let src = format!("{QUAD}usemtl A\nf 1 2 3\nusemtl B\nf 1 2 3 4");
        let doc = parse_obj(&src).expect("parse");
        assert_eq!(doc.geometries.len(), 2);
        assert_eq!(doc.geometries[0].material(), Some("A"));
        assert_eq!(doc.geometries[0].vertex_count(), 3);
        assert_eq!(doc.geometries[1].material(), Some("B"));
        assert_eq!(doc.geometries[1].vertex_count(), 6);
    }

    #[test]
    fn repeated_usemtl_keeps_geometry() {
        let src = format!("{QUAD}usemtl A\nf 1 2 3\nusemtl A\nf 1 3 4");
        let doc = parse_obj(&src).expect("parse");
        assert_eq!(doc.geometries.len(), 1);
        assert_eq!(doc.geometries[0].vertex_count(), 6);
    }

    #[test]
    fn object_and_group_boundaries() {
        let src = format!(
            "{QUAD}o lid\ng top rim\nf 1 2 3\ng body\nf 1 3 4\no handle\ng\n# no faces here\no base\nf 1 2 4"
        );
        let doc = parse_obj(&src).expect("parse");
        assert_eq!(doc.geometries.len(), 3);
        assert_eq!(doc.geometries[0].object.as_deref(), Some("lid"));
        assert_eq!(doc.geometries[0].groups, vec!["top", "rim"]);
        assert_eq!(doc.geometries[1].groups, vec!["body"]);
        assert_eq!(doc.geometries[2].object.as_deref(), Some("base"));
        assert!(doc.geometries[2].groups.is_empty());
    }

    #[test]
    fn partial_normals_are_dropped() {
        let src = format!("{QUAD}vn 0 0 1\nf 1//1 2//1 3//1\nf 1 3 4");
        let doc = parse_obj(&src).expect("parse");
        let g = &doc.geometries[0];
        assert_eq!(g.vertex_count(), 6);
        assert_eq!(g.normal, None);
        assert_eq!(g.texcoord, None);
        assert!(g.is_consistent());
    }

    #[test]
    fn vertex_colors_are_carried_when_complete() {
        let src = "
            v 0 0 0 1 0 0
            v 1 0 0 0 1 0
            v 0 1 0 0 0 1
            v 1 1 0
            f 1 2 3
        ";
        let doc = parse_obj(src).expect("parse");
        assert_eq!(
            doc.geometries[0].color.as_deref(),
            Some(&[1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0][..])
        );

        let doc = parse_obj(&format!("{src}\nf 1 3 4")).expect("parse");
        assert_eq!(doc.geometries[0].color, None);
    }

    #[test]
    fn degenerate_face_is_skipped() {
        let src = format!("{QUAD}f 1 2\nf 1 2 3");
        let doc = parse_obj(&src).expect("parse");
        assert_eq!(doc.geometries[0].vertex_count(), 3);
        assert_eq!(doc.diagnostics.len(), 1);
        assert_eq!(doc.diagnostics[0].line, 6);
        assert_eq!(
            doc.diagnostics[0].error,
            LineError::DegenerateFace { found: 2 }
        );
    }

    #[test]
    fn bad_references_drop_the_whole_face() {
        let src = format!("{QUAD}f 1 2 9\nf 0 1 2\nf 1 a 2\nf 1/1/1/1 2 3");
        let doc = parse_obj(&src).expect("parse");
        assert!(doc.geometries.is_empty());
        let errors: Vec<_> = doc.diagnostics.iter().map(|d| d.error.clone()).collect();
        assert_eq!(
            errors,
            vec![
                LineError::IndexOutOfRange { index: 9, len: 4 },
                LineError::InvalidIndex,
                LineError::MalformedNumber { token: "a".into() },
                LineError::InvalidFaceVertex {
                    token: "1/1/1/1".into()
                },
            ]
        );
    }

    #[test]
    fn reference_into_empty_pool_is_fatal() {
        let err = parse_obj("f 1 2 3").unwrap_err();
        assert_eq!(
            err,
            ParseError::EmptyPool {
                line: 1,
                pool: Pool::Position
            }
        );

        let err = parse_obj(&format!("{QUAD}f 1//1 2//1 3//1")).unwrap_err();
        assert!(matches!(
            err,
            ParseError::EmptyPool {
                pool: Pool::Normal,
                ..
            }
        ));
    }

    #[test]
    fn malformed_vertex_is_reported_and_skipped() {
        let src = "v 0 0 0\nv 1 nope 0\nv 1 0 0\nv 0 1 0\nf 1 2 3";
        let doc = parse_obj(src).expect("parse");
        assert_eq!(doc.geometries[0].vertex_count(), 3);
        assert_eq!(doc.diagnostics.len(), 1);
        assert_eq!(doc.diagnostics[0].line, 2);
        assert_eq!(doc.diagnostics[0].keyword, "v");
    }

    #[test]
    fn unknown_keywords_are_tolerated() {
        let src = format!("{QUAD}usemtl A\ncstype bspline\nl 1 2\ns 1\nf 1 2 3");
        let doc = parse_obj(&src).expect("parse");
        assert_eq!(doc.geometries.len(), 1);
        let unknown: Vec<_> = doc
            .diagnostics
            .iter()
            .filter(|d| d.is_unknown_keyword())
            .map(|d| d.keyword.as_str())
            .collect();
        assert_eq!(unknown, vec!["cstype", "l"]);
    }

    #[test]
    fn material_libs_keep_order_and_duplicates() {
        let src = "mtllib a.mtl b.mtl\nmtllib a.mtl\n";
        let doc = parse_obj(src).expect("parse");
        assert_eq!(doc.material_libs, vec!["a.mtl", "b.mtl", "a.mtl"]);
        assert!(doc.geometries.is_empty());
    }

    #[test]
    fn empty_input_is_valid() {
        for src in ["", "\n\n", "# only a comment\n   # another"] {
            let doc = parse_obj(src).expect("empty input parses");
            assert_eq!(doc, ObjDocument::default());
        }
    }

    #[test]
    fn reparsing_is_deterministic() {
        let src = format!("mtllib m.mtl\n{QUAD}vt 0 0\nusemtl A\nf 1/1 2/1 3/1 4/1\nfoo bar");
        let first = parse_obj(&src).expect("first");
        let second = parse_obj(&src).expect("second");
        assert_eq!(first, second);
    }

    #[test]
    fn independent_parses_run_concurrently() {
        let src = format!("{QUAD}usemtl A\nf 1 2 3 4");
        let expected = parse_obj(&src).expect("parse");
        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4).map(|_| scope.spawn(|| parse_obj(&src))).collect();
            for handle in handles {
                let doc = handle.join().expect("thread").expect("parse");
                assert_eq!(doc, expected);
            }
        });
    }

    #[test]
    fn strict_mode_stops_at_first_rejected_line() {
        let options = ParseOptions { strict: true };
        let src = format!("{QUAD}foo\nf 1 2\nf 1 2 3");
        let err = parse_obj_with(&src, &options).unwrap_err();
        assert!(matches!(err, ParseError::Strict(ref d) if d.keyword == "f" && d.line == 7));
    }
}
