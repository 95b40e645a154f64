use crate::core::geometry::Vertex;
use log::info;
use nalgebra::{Point3, Vector2, Vector3};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read '{path}': {source}")]
    IoFailure {
        path: String,
        source: std::io::Error,
    },
    #[error("malformed directive on line {line}: '{text}'")]
    MalformedLine { line: usize, text: String },
    #[error("face index {index} out of range on line {line} ({available} entries available)")]
    IndexOutOfRange {
        line: usize,
        index: usize,
        available: usize,
    },
    #[error("face on line {line} has {count} corners, only triangles are supported")]
    NonTriangularFace { line: usize, count: usize },
}

/// Parses the line-oriented mesh text format: `v`, `vn`, `vt` attribute
/// lines followed by `f` lines of three 1-based `pos/tex/norm` triplets.
///
/// Every face corner becomes its own vertex (no welding), so the returned
/// index list is always the sequence `0..3N` for `N` faces.
pub fn parse_obj(source: &str) -> Result<(Vec<Vertex>, Vec<u32>), ParseError> {
    let mut positions: Vec<Point3<f32>> = Vec::new();
    let mut normals: Vec<Vector3<f32>> = Vec::new();
    let mut texcoords: Vec<Vector2<f32>> = Vec::new();
    let mut vertices: Vec<Vertex> = Vec::new();
    let mut indices: Vec<u32> = Vec::new();

    for (number, raw_line) in source.lines().enumerate() {
        let line = number + 1;
        let text = raw_line.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }

        let mut tokens = text.split_whitespace();
        match tokens.next() {
            Some("v") => {
                positions.push(Point3::from(parse_vec3(tokens, line, text)?));
            }
            Some("vn") => {
                normals.push(parse_vec3(tokens, line, text)?);
            }
            Some("vt") => {
                texcoords.push(parse_vec2(tokens, line, text)?);
            }
            Some("f") => {
                let corners: Vec<&str> = tokens.collect();
                if corners.len() != 3 {
                    return Err(ParseError::NonTriangularFace {
                        line,
                        count: corners.len(),
                    });
                }
                for corner in corners {
                    let vertex =
                        resolve_corner(corner, &positions, &texcoords, &normals, line, text)?;
                    indices.push(vertices.len() as u32);
                    vertices.push(vertex);
                }
            }
            // Unrecognized directives (mtllib, o, s, ...) are skipped.
            _ => {}
        }
    }

    Ok((vertices, indices))
}

/// Reads and parses a mesh file from disk.
pub fn load_obj(path: &Path) -> Result<(Vec<Vertex>, Vec<u32>), ParseError> {
    let source = std::fs::read_to_string(path).map_err(|source| ParseError::IoFailure {
        path: path.display().to_string(),
        source,
    })?;
    let (vertices, indices) = parse_obj(&source)?;
    info!(
        "parsed {}: {} vertices, {} triangles",
        path.display(),
        vertices.len(),
        indices.len() / 3
    );
    Ok((vertices, indices))
}

fn parse_vec3<'a>(
    mut tokens: impl Iterator<Item = &'a str>,
    line: usize,
    text: &str,
) -> Result<Vector3<f32>, ParseError> {
    let malformed = || ParseError::MalformedLine {
        line,
        text: text.to_string(),
    };
    let x = tokens.next().ok_or_else(malformed)?;
    let y = tokens.next().ok_or_else(malformed)?;
    let z = tokens.next().ok_or_else(malformed)?;
    Ok(Vector3::new(
        x.parse().map_err(|_| malformed())?,
        y.parse().map_err(|_| malformed())?,
        z.parse().map_err(|_| malformed())?,
    ))
}

fn parse_vec2<'a>(
    mut tokens: impl Iterator<Item = &'a str>,
    line: usize,
    text: &str,
) -> Result<Vector2<f32>, ParseError> {
    let malformed = || ParseError::MalformedLine {
        line,
        text: text.to_string(),
    };
    let u = tokens.next().ok_or_else(malformed)?;
    let v = tokens.next().ok_or_else(malformed)?;
    Ok(Vector2::new(
        u.parse().map_err(|_| malformed())?,
        v.parse().map_err(|_| malformed())?,
    ))
}

/// Resolves one `pos/tex/norm` triplet against the attribute lists seen so
/// far. Indices are 1-based; referencing an entry that does not yet exist
/// is an error.
fn resolve_corner(
    corner: &str,
    positions: &[Point3<f32>],
    texcoords: &[Vector2<f32>],
    normals: &[Vector3<f32>],
    line: usize,
    text: &str,
) -> Result<Vertex, ParseError> {
    let malformed = || ParseError::MalformedLine {
        line,
        text: text.to_string(),
    };

    let mut parts = corner.split('/');
    let pos_idx: usize = parts
        .next()
        .ok_or_else(malformed)?
        .parse()
        .map_err(|_| malformed())?;
    let tex_idx: usize = parts
        .next()
        .ok_or_else(malformed)?
        .parse()
        .map_err(|_| malformed())?;
    let norm_idx: usize = parts
        .next()
        .ok_or_else(malformed)?
        .parse()
        .map_err(|_| malformed())?;
    if parts.next().is_some() {
        return Err(malformed());
    }

    let position = *lookup(positions, pos_idx, line)?;
    let texcoord = *lookup(texcoords, tex_idx, line)?;
    let normal = *lookup(normals, norm_idx, line)?;

    Ok(Vertex::new(position, normal, texcoord))
}

fn lookup<T>(list: &[T], index: usize, line: usize) -> Result<&T, ParseError> {
    if index == 0 || index > list.len() {
        return Err(ParseError::IndexOutOfRange {
            line,
            index,
            available: list.len(),
        });
    }
    Ok(&list[index - 1])
}
