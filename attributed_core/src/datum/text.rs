//! Textual round-trip formats for datum elements.
//!
//! Scalars use plain decimal notation; vectors render as
//! `vector<x|y|z|w>` and matrices as `matrix[<..>,<..>,<..>,<..>]` with one
//! vector body per row.

use super::{BufferRef, DatumType};
use crate::error::{Error, Result};
use crate::math::{Mat4, Vec4};

const VECTOR_PREFIX: &str = "vector";
const MATRIX_PREFIX: &str = "matrix";

fn parse_error(input: &str, expected: DatumType) -> Error {
    Error::Parse {
        input: input.to_string(),
        expected,
    }
}

fn vector_body(v: Vec4) -> String {
    format!("<{}|{}|{}|{}>", v.x, v.y, v.z, v.w)
}

/// Render a vector as `vector<x|y|z|w>`.
pub fn format_vector(v: Vec4) -> String {
    format!("{VECTOR_PREFIX}{}", vector_body(v))
}

/// Render a matrix as `matrix[<..>,<..>,<..>,<..>]`.
pub fn format_matrix(m: &Mat4) -> String {
    let rows: Vec<String> = m.rows.iter().map(|row| vector_body(*row)).collect();
    format!("{MATRIX_PREFIX}[{}]", rows.join(","))
}

pub fn parse_integer(input: &str) -> Result<i32> {
    input
        .trim()
        .parse()
        .map_err(|_| parse_error(input, DatumType::Integer))
}

pub fn parse_float(input: &str) -> Result<f32> {
    input
        .trim()
        .parse()
        .map_err(|_| parse_error(input, DatumType::Float))
}

// Parses `<x|y|z|w>`; `original` is only used for the error message.
fn parse_vector_body(body: &str, original: &str, expected: DatumType) -> Result<Vec4> {
    let inner = body
        .trim()
        .strip_prefix('<')
        .and_then(|rest| rest.strip_suffix('>'))
        .ok_or_else(|| parse_error(original, expected))?;

    let mut components = [0.0f32; 4];
    let mut parts = inner.split('|');
    for component in components.iter_mut() {
        let part = parts.next().ok_or_else(|| parse_error(original, expected))?;
        *component = part
            .trim()
            .parse()
            .map_err(|_| parse_error(original, expected))?;
    }
    if parts.next().is_some() {
        return Err(parse_error(original, expected));
    }
    Ok(Vec4::from_array(components))
}

/// Parse `vector<x|y|z|w>`.
pub fn parse_vector(input: &str) -> Result<Vec4> {
    let body = input
        .trim()
        .strip_prefix(VECTOR_PREFIX)
        .ok_or_else(|| parse_error(input, DatumType::Vector))?;
    parse_vector_body(body, input, DatumType::Vector)
}

/// Parse `matrix[<..>,<..>,<..>,<..>]`.
pub fn parse_matrix(input: &str) -> Result<Mat4> {
    let inner = input
        .trim()
        .strip_prefix(MATRIX_PREFIX)
        .and_then(|rest| rest.trim_start().strip_prefix('['))
        .and_then(|rest| rest.trim_end().strip_suffix(']'))
        .ok_or_else(|| parse_error(input, DatumType::Matrix))?;

    let mut rows = [Vec4::ZERO; 4];
    let mut parts = inner.split(',');
    for row in rows.iter_mut() {
        let part = parts
            .next()
            .ok_or_else(|| parse_error(input, DatumType::Matrix))?;
        *row = parse_vector_body(part, input, DatumType::Matrix)?;
    }
    if parts.next().is_some() {
        return Err(parse_error(input, DatumType::Matrix));
    }
    Ok(Mat4::from_rows(rows))
}

/// Render the element at `index`; the caller has checked bounds.
pub(crate) fn format_element(buffer: BufferRef<'_>, index: usize) -> Option<String> {
    let text = match buffer {
        BufferRef::Unknown => return None,
        BufferRef::Integer(values) => values.get(index)?.to_string(),
        BufferRef::Float(values) => values.get(index)?.to_string(),
        BufferRef::String(values) => values.get(index)?.clone(),
        BufferRef::Vector(values) => format_vector(*values.get(index)?),
        BufferRef::Matrix(values) => format_matrix(values.get(index)?),
        BufferRef::Pointer(values) => values.get(index)?.to_string(),
        BufferRef::InternalTable(ids) | BufferRef::ExternalTable(ids) => {
            format!("scope:{}", ids.get(index)?)
        }
    };
    Some(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_format() {
        let v = Vec4::new(1.0, 2.5, -3.0, 0.0);
        assert_eq!(format_vector(v), "vector<1|2.5|-3|0>");
    }

    #[test]
    fn test_vector_round_trip() {
        let v = Vec4::new(0.1, 1e-7, 12345.678, -0.5);
        assert_eq!(parse_vector(&format_vector(v)).unwrap(), v);
    }

    #[test]
    fn test_matrix_round_trip() {
        let m = Mat4::from_rows([
            Vec4::new(1.0, 2.0, 3.0, 4.0),
            Vec4::new(5.0, 6.0, 7.0, 8.0),
            Vec4::new(9.0, 10.0, 11.0, 12.0),
            Vec4::new(13.0, 14.0, 15.0, 16.5),
        ]);
        let text = format_matrix(&m);
        assert!(text.starts_with("matrix[<1|2|3|4>,"));
        assert_eq!(parse_matrix(&text).unwrap(), m);
    }

    #[test]
    fn test_parse_tolerates_whitespace() {
        let v = parse_vector(" vector< 1 | 2 | 3 | 4 > ").unwrap();
        assert_eq!(v, Vec4::new(1.0, 2.0, 3.0, 4.0));
        assert_eq!(parse_integer(" 42 ").unwrap(), 42);
    }

    #[test]
    fn test_parse_failures() {
        assert!(matches!(parse_integer("4x"), Err(Error::Parse { .. })));
        assert!(matches!(parse_float("abc"), Err(Error::Parse { .. })));
        assert!(parse_vector("vector<1|2|3>").is_err());
        assert!(parse_vector("vector<1|2|3|4|5>").is_err());
        assert!(parse_vector("<1|2|3|4>").is_err());
        assert!(parse_matrix("matrix[<1|2|3|4>]").is_err());
        assert!(parse_matrix("vector<1|2|3|4>").is_err());
    }
}
