//! Fixture builders shared by the unit tests.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::reference::ReferenceData;

pub const WGS84_PRJ: &str = r#"GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137.0,298.257223563]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]]"#;

pub const GOOD_META: &str = "Boundary Representative of Year: 2020
ISO-3166-1 (Alpha-3): AFG
Boundary Type: ADM1
Canonical Boundary Type Name: Province
Source 1: Afghanistan Geodesy and Cartography Head Office
Source 2:
Release Type: gbOpen
License: Creative Commons Attribution 3.0 Intergovernmental Organisations (CC BY 3.0 IGO)
License Notes: NA
License Source: https://data.humdata.org/dataset/afg-admin-boundaries
Link to Source Data: https://data.humdata.org/dataset/afg-admin-boundaries
Other Notes: Province boundaries
";

pub fn reference() -> ReferenceData {
    ReferenceData::from_lists(
        ["AFG", "ALB", "USA", "ZWE"],
        [
            "Creative Commons Attribution 3.0 Intergovernmental Organisations (CC BY 3.0 IGO)",
            "Open Data Commons Open Database License 1.0",
            "Public Domain",
        ],
    )
}

/// Polygon records, each a list of rings of (x, y) pairs
pub fn shp_bytes(records: &[Vec<Vec<(f64, f64)>>]) -> Vec<u8> {
    shp_typed_bytes(5, records)
}

/// Polygon records of `shape_type` 5, 15 (Z) or 25 (M). Z values are the
/// point index, M values are zero.
pub fn shp_typed_bytes(shape_type: i32, records: &[Vec<Vec<(f64, f64)>>]) -> Vec<u8> {
    let mut body = Vec::new();
    for (i, rings) in records.iter().enumerate() {
        let num_points: usize = rings.iter().map(Vec::len).sum();
        let mut content = Vec::new();
        content.extend_from_slice(&shape_type.to_le_bytes());
        for _ in 0..4 {
            content.extend_from_slice(&0f64.to_le_bytes());
        }
        content.extend_from_slice(&(rings.len() as i32).to_le_bytes());
        content.extend_from_slice(&(num_points as i32).to_le_bytes());
        let mut start = 0i32;
        for ring in rings {
            content.extend_from_slice(&start.to_le_bytes());
            start += ring.len() as i32;
        }
        for ring in rings {
            for (x, y) in ring {
                content.extend_from_slice(&x.to_le_bytes());
                content.extend_from_slice(&y.to_le_bytes());
            }
        }
        if shape_type == 15 {
            content.extend_from_slice(&0f64.to_le_bytes());
            content.extend_from_slice(&(num_points as f64).to_le_bytes());
            for z in 0..num_points {
                content.extend_from_slice(&(z as f64).to_le_bytes());
            }
        }
        if shape_type == 15 || shape_type == 25 {
            for _ in 0..num_points + 2 {
                content.extend_from_slice(&0f64.to_le_bytes());
            }
        }

        body.extend_from_slice(&((i + 1) as i32).to_be_bytes());
        body.extend_from_slice(&((content.len() / 2) as i32).to_be_bytes());
        body.extend_from_slice(&content);
    }

    let mut out = vec![0u8; 100];
    out[0..4].copy_from_slice(&9994i32.to_be_bytes());
    out[24..28].copy_from_slice(&(((100 + body.len()) / 2) as i32).to_be_bytes());
    out[28..32].copy_from_slice(&1000i32.to_le_bytes());
    out[32..36].copy_from_slice(&shape_type.to_le_bytes());
    out.extend_from_slice(&body);
    out
}

/// dBase III table of character fields, 50 bytes wide
pub fn dbf_bytes(fields: &[&str], rows: &[Vec<&str>]) -> Vec<u8> {
    const WIDTH: usize = 50;
    let header_len = 32 + 32 * fields.len() + 1;
    let record_len = 1 + WIDTH * fields.len();

    let mut out = vec![0x03, 124, 1, 1];
    out.extend_from_slice(&(rows.len() as u32).to_le_bytes());
    out.extend_from_slice(&(header_len as u16).to_le_bytes());
    out.extend_from_slice(&(record_len as u16).to_le_bytes());
    out.resize(32, 0);

    for field in fields {
        let mut desc = [0u8; 32];
        desc[..field.len()].copy_from_slice(field.as_bytes());
        desc[11] = b'C';
        desc[16] = WIDTH as u8;
        out.extend_from_slice(&desc);
    }
    out.push(0x0D);

    for row in rows {
        out.push(b' ');
        for value in row {
            let mut cell = value.as_bytes().to_vec();
            cell.resize(WIDTH, b' ');
            out.extend_from_slice(&cell);
        }
    }
    out.push(0x1A);
    out
}

pub fn write_shapefile(
    dir: &Path,
    stem: &str,
    records: &[Vec<Vec<(f64, f64)>>],
    fields: &[&str],
    rows: &[Vec<&str>],
    prj: Option<&str>,
) -> PathBuf {
    let shp = dir.join(format!("{}.shp", stem));
    fs::write(&shp, shp_bytes(records)).unwrap();
    fs::write(dir.join(format!("{}.dbf", stem)), dbf_bytes(fields, rows)).unwrap();
    if let Some(prj) = prj {
        fs::write(dir.join(format!("{}.prj", stem)), prj).unwrap();
    }
    shp
}

/// FeatureCollection of single-ring polygons with the given properties
pub fn geojson(features: &[(serde_json::Value, Vec<(f64, f64)>)]) -> String {
    let features: Vec<serde_json::Value> = features
        .iter()
        .map(|(properties, ring)| {
            let coords: Vec<[f64; 2]> = ring.iter().map(|(x, y)| [*x, *y]).collect();
            serde_json::json!({
                "type": "Feature",
                "properties": properties,
                "geometry": {"type": "Polygon", "coordinates": [coords]},
            })
        })
        .collect();
    serde_json::json!({"type": "FeatureCollection", "features": features}).to_string()
}

pub fn square(x: f64, y: f64, size: f64) -> Vec<(f64, f64)> {
    vec![(x, y), (x + size, y), (x + size, y + size), (x, y + size), (x, y)]
}

pub fn png_bytes() -> Vec<u8> {
    let mut buf = Vec::new();
    image::DynamicImage::new_rgb8(2, 2)
        .write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

pub fn write_zip(path: &Path, entries: &[(&str, Vec<u8>)]) {
    let file = File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default();
    for (name, bytes) in entries {
        zip.start_file(*name, options).unwrap();
        zip.write_all(bytes).unwrap();
    }
    zip.finish().unwrap();
}

/// A complete, valid GeoJSON submission archive named `AFG_ADM1.zip`
pub fn good_zip(dir: &Path) -> PathBuf {
    let layer = geojson(&[
        (
            serde_json::json!({"shapeName": "Kabul", "shapeISO": "AF-KAB"}),
            square(69.0, 34.0, 0.5),
        ),
        (
            serde_json::json!({"shapeName": "Herat", "shapeISO": "AF-HER"}),
            square(62.0, 34.0, 0.5),
        ),
    ]);
    let path = dir.join("AFG_ADM1.zip");
    write_zip(
        &path,
        &[
            ("AFG_ADM1.geojson", layer.into_bytes()),
            ("meta.txt", GOOD_META.as_bytes().to_vec()),
            ("license.png", png_bytes()),
        ],
    );
    path
}
