//! STL import for binary and ASCII files
use log::{debug, warn};
use nom::{
    bytes::complete::{tag, take},
    character::complete::{multispace0, multispace1, not_line_ending},
    multi::{count, many0},
    number::complete::{float, le_f32, le_u16},
    sequence::{preceded, tuple},
    IResult,
};
use std::path::Path;

use crate::buffer::Color;
use crate::error::StlError;
use crate::math::Vector3;
use crate::mesh::Mesh;

const HEADER_LEN: usize = 80;
const FACET_LEN: usize = 50;

/// Parse a binary STL file
pub fn parse_binary_stl(data: &[u8], color: Color) -> Result<Mesh, StlError> {
    if data.len() < HEADER_LEN + 4 {
        return Err(StlError::TooShort(data.len()));
    }

    let declared = u32::from_le_bytes([data[80], data[81], data[82], data[83]]) as usize;
    let expected = HEADER_LEN + 4 + declared * FACET_LEN;
    if data.len() < expected {
        return Err(StlError::Truncated {
            expected,
            actual: data.len(),
        });
    }

    let (_, triangles) = count(binary_facet, declared)(&data[HEADER_LEN + 4..]).map_err(|_| {
        StlError::Truncated {
            expected,
            actual: data.len(),
        }
    })?;

    Ok(build(&triangles, color))
}

/// Parse an ASCII STL file
pub fn parse_ascii_stl(input: &str, color: Color) -> Result<Mesh, StlError> {
    match ascii_solid(input) {
        Ok((_, triangles)) => Ok(build(&triangles, color)),
        Err(e) => Err(StlError::Ascii(format!("{:?}", e))),
    }
}

/// Detect the STL flavour and parse it.
///
/// Binary files may also start with `solid`, so a failed ASCII parse falls
/// back to the binary reader.
pub fn parse_stl(data: &[u8], color: Color) -> Result<Mesh, StlError> {
    if data.starts_with(b"solid") {
        if let Ok(text) = std::str::from_utf8(data) {
            match parse_ascii_stl(text, color) {
                Ok(mesh) => return Ok(mesh),
                Err(e) => debug!("not an ASCII STL ({}), trying binary", e),
            }
        }
    }

    parse_binary_stl(data, color)
}

/// Read and parse an STL file from disk
pub fn load_stl(path: impl AsRef<Path>, color: Color) -> Result<Mesh, StlError> {
    let path = path.as_ref();
    let data = std::fs::read(path)?;
    let mesh = parse_stl(&data, color)?;
    debug!(
        "loaded {}: {} faces, {} unique vertices",
        path.display(),
        mesh.face_count(),
        mesh.vertices().len()
    );
    Ok(mesh)
}

fn build(triangles: &[[Vector3; 3]], color: Color) -> Mesh {
    if triangles.is_empty() {
        warn!("STL data contains no facets");
    }
    Mesh::from_triangles(triangles, color)
}

fn binary_facet(input: &[u8]) -> IResult<&[u8], [Vector3; 3]> {
    // Stored normal is ignored; faces are flat colored
    let (input, _) = take(12usize)(input)?;
    let (input, a) = binary_vector3(input)?;
    let (input, b) = binary_vector3(input)?;
    let (input, c) = binary_vector3(input)?;
    let (input, _attributes) = le_u16(input)?;
    Ok((input, [a, b, c]))
}

fn binary_vector3(input: &[u8]) -> IResult<&[u8], Vector3> {
    let (input, (x, y, z)) = tuple((le_f32, le_f32, le_f32))(input)?;
    Ok((input, Vector3::new(x, y, z)))
}

fn ascii_solid(input: &str) -> IResult<&str, Vec<[Vector3; 3]>> {
    let (input, _) = preceded(multispace0, tag("solid"))(input)?;
    let (input, _name) = not_line_ending(input)?;
    let (input, triangles) = many0(ascii_facet)(input)?;
    let (input, _) = preceded(multispace0, tag("endsolid"))(input)?;
    let (input, _) = not_line_ending(input)?;
    Ok((input, triangles))
}

fn ascii_facet(input: &str) -> IResult<&str, [Vector3; 3]> {
    let (input, _) = preceded(multispace0, tag("facet"))(input)?;
    let (input, _) = preceded(multispace1, tag("normal"))(input)?;
    let (input, _normal) = ascii_vector3(input)?;
    let (input, _) = preceded(multispace0, tag("outer"))(input)?;
    let (input, _) = preceded(multispace1, tag("loop"))(input)?;
    let (input, a) = ascii_vertex(input)?;
    let (input, b) = ascii_vertex(input)?;
    let (input, c) = ascii_vertex(input)?;
    let (input, _) = preceded(multispace0, tag("endloop"))(input)?;
    let (input, _) = preceded(multispace0, tag("endfacet"))(input)?;
    Ok((input, [a, b, c]))
}

fn ascii_vertex(input: &str) -> IResult<&str, Vector3> {
    preceded(preceded(multispace0, tag("vertex")), ascii_vector3)(input)
}

fn ascii_vector3(input: &str) -> IResult<&str, Vector3> {
    let (input, _) = multispace0(input)?;
    let (input, x) = float(input)?;
    let (input, _) = multispace1(input)?;
    let (input, y) = float(input)?;
    let (input, _) = multispace1(input)?;
    let (input, z) = float(input)?;
    Ok((input, Vector3::new(x, y, z)))
}
