//! PLY byte decoding.
//!
//! Decodes a fetched byte buffer into [`RawGeometry`]. Splatting exports
//! are PLY files whose vertex element carries at least x/y/z; colors show
//! up as `red/green/blue` or `r/g/b` u8 properties when present at all.

use crate::error::AssetError;
use crate::geometry::RawGeometry;
use glam::Vec3;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::io::Cursor;
use tracing::{debug, info, warn};

// Face structure for PLY files; many point-cloud exports still carry an
// empty face element.
#[derive(Deserialize, Debug)]
#[allow(dead_code)]
struct PlyFace {
    vertex_indices: Vec<i32>,
}

// Map-based rows keep the decoder tolerant of the extra splat properties
// (scale_*, rot_*, f_dc_*, opacity) this viewer does not consume.
#[derive(Deserialize, Debug)]
struct PlyFile {
    #[serde(rename = "vertex")]
    vertex: Vec<HashMap<String, JsonValue>>,
    #[serde(default, rename = "face", skip_serializing_if = "Vec::is_empty")]
    face: Vec<PlyFace>,
}

/// Decode point positions and optional colors from PLY bytes.
///
/// Supports ASCII and binary PLY via serde_ply. Geometry without any color
/// properties comes back with `colors: None`; the normalizer synthesizes
/// white before display.
#[tracing::instrument(skip_all, fields(len = bytes.len()))]
pub fn decode_points(bytes: &[u8]) -> Result<RawGeometry, AssetError> {
    let reader = Cursor::new(bytes);

    let ply_data: PlyFile = serde_ply::from_reader(reader).map_err(|e| {
        warn!("failed to parse PLY data: {}", e);
        AssetError::Decode(format!("PLY parsing error: {}", e))
    })?;

    info!(
        "PLY parsed: {} vertices, {} faces",
        ply_data.vertex.len(),
        ply_data.face.len()
    );

    fn get_f32(prop: Option<&JsonValue>) -> Option<f32> {
        prop.and_then(|v| match v {
            JsonValue::Number(n) => n.as_f64().map(|f| f as f32),
            _ => None,
        })
    }

    fn get_u8(prop: Option<&JsonValue>) -> Option<u8> {
        prop.and_then(|v| match v {
            JsonValue::Number(n) => n
                .as_u64()
                .map(|u| u as u8)
                .or_else(|| n.as_i64().map(|i| i as u8)),
            _ => None,
        })
    }

    let mut positions = Vec::with_capacity(ply_data.vertex.len());
    let mut colors = Vec::with_capacity(ply_data.vertex.len());
    let mut any_color = false;

    for (i, vertex) in ply_data.vertex.iter().enumerate() {
        let x = get_f32(vertex.get("x"))
            .ok_or_else(|| AssetError::Decode(format!("missing 'x' at vertex {}", i)))?;
        let y = get_f32(vertex.get("y"))
            .ok_or_else(|| AssetError::Decode(format!("missing 'y' at vertex {}", i)))?;
        let z = get_f32(vertex.get("z"))
            .ok_or_else(|| AssetError::Decode(format!("missing 'z' at vertex {}", i)))?;
        positions.push(Vec3::new(x, y, z));

        let color = if let (Some(r), Some(g), Some(b)) = (
            get_u8(vertex.get("red")),
            get_u8(vertex.get("green")),
            get_u8(vertex.get("blue")),
        ) {
            Some(Vec3::new(
                r as f32 / 255.0,
                g as f32 / 255.0,
                b as f32 / 255.0,
            ))
        } else if let (Some(r), Some(g), Some(b)) = (
            get_u8(vertex.get("r")),
            get_u8(vertex.get("g")),
            get_u8(vertex.get("b")),
        ) {
            Some(Vec3::new(
                r as f32 / 255.0,
                g as f32 / 255.0,
                b as f32 / 255.0,
            ))
        } else {
            None
        };

        match color {
            Some(c) => {
                any_color = true;
                colors.push(c);
            }
            // Vertices missing color in a colored file read as black.
            None => colors.push(Vec3::ZERO),
        }
    }

    debug!("decoded {} points (colors: {})", positions.len(), any_color);

    if any_color {
        Ok(RawGeometry::with_colors(positions, colors))
    } else {
        Ok(RawGeometry::from_positions(positions))
    }
}
