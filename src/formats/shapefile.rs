//! ESRI Shapefile reader: `.shp` geometry, `.dbf` attributes, `.prj` CRS.
//!
//! Only the parts of the format that boundary submissions use are decoded.
//! Z and M values are read past and dropped.

use geo::coordinate_position::{CoordPos, CoordinatePosition};
use geo::{Coord, Geometry, LineString, MultiLineString, MultiPoint, MultiPolygon, Point, Polygon};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::crs::crs_from_wkt;
use crate::error::{Error, Result};
use crate::models::{AttrValue, BoundaryLayer, Crs, Feature};

const FILE_CODE: i32 = 9994;
const HEADER_LEN: usize = 100;
const DBF_HEADER_LEN: usize = 32;
const DBF_FIELD_TERMINATOR: u8 = 0x0D;

/// Bounds-checked little/big endian reader over a byte slice
struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
    path: &'a Path,
}

impl<'a> ByteReader<'a> {
    fn new(bytes: &'a [u8], path: &'a Path) -> Self {
        Self {
            bytes,
            pos: 0,
            path,
        }
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N]> {
        let bytes = self.bytes;
        let end = self.pos + N;
        let slice = bytes.get(self.pos..end).ok_or_else(|| {
            Error::shapefile(self.path, format!("unexpected end of data at byte {}", self.pos))
        })?;
        self.pos = end;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        Ok(out)
    }

    fn skip(&mut self, n: usize) -> Result<()> {
        if self.pos + n > self.bytes.len() {
            return Err(Error::shapefile(
                self.path,
                format!("unexpected end of data at byte {}", self.pos),
            ));
        }
        self.pos += n;
        Ok(())
    }

    fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.pos)
    }

    /// Fail unless `n` items of `width` bytes each can still be read
    fn ensure_fits(&self, n: usize, width: usize, what: &str) -> Result<()> {
        match n.checked_mul(width) {
            Some(needed) if needed <= self.remaining() => Ok(()),
            _ => Err(Error::shapefile(
                self.path,
                format!(
                    "{} count {} does not fit in the {} bytes left in the record",
                    what,
                    n,
                    self.remaining()
                ),
            )),
        }
    }

    fn le_i32(&mut self) -> Result<i32> {
        Ok(i32::from_le_bytes(self.take()?))
    }

    fn le_f64(&mut self) -> Result<f64> {
        Ok(f64::from_le_bytes(self.take()?))
    }

    fn count(&mut self, what: &str) -> Result<usize> {
        let n = self.le_i32()?;
        usize::try_from(n)
            .map_err(|_| Error::shapefile(self.path, format!("negative {} count {}", what, n)))
    }

    fn coord(&mut self) -> Result<Coord<f64>> {
        let x = self.le_f64()?;
        let y = self.le_f64()?;
        Ok(Coord { x, y })
    }
}

/// Signed ring area; negative for clockwise rings
fn signed_area(ring: &[Coord<f64>]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..ring.len() {
        let a = ring[i];
        let b = ring[(i + 1) % ring.len()];
        sum += a.x * b.y - b.x * a.y;
    }
    sum / 2.0
}

/// True when no vertex of `ring` lies outside `shell`
fn ring_within(ring: &[Coord<f64>], shell: &Polygon<f64>) -> bool {
    ring.iter()
        .all(|c| shell.coordinate_position(c) != CoordPos::Outside)
}

/// Group shapefile rings into polygons.
///
/// Clockwise rings start a new polygon. A counter-clockwise ring becomes a
/// hole of the latest shell that contains it, or a shell of its own when no
/// shell does (writers that ignore the winding rule emit islands that way).
fn group_rings(rings: Vec<Vec<Coord<f64>>>) -> Geometry<f64> {
    let mut shells: Vec<(Polygon<f64>, Vec<LineString<f64>>)> = Vec::new();

    for ring in rings {
        let clockwise = signed_area(&ring) < 0.0;
        if !clockwise {
            if let Some((_, holes)) = shells
                .iter_mut()
                .rev()
                .find(|(shell, _)| ring_within(&ring, shell))
            {
                holes.push(LineString::new(ring));
                continue;
            }
        }
        shells.push((Polygon::new(LineString::new(ring), vec![]), Vec::new()));
    }

    let mut polygons: Vec<Polygon<f64>> = shells
        .into_iter()
        .map(|(shell, holes)| {
            let (exterior, _) = shell.into_inner();
            Polygon::new(exterior, holes)
        })
        .collect();

    if polygons.len() == 1 {
        Geometry::Polygon(polygons.remove(0))
    } else {
        Geometry::MultiPolygon(MultiPolygon::new(polygons))
    }
}

fn parse_parts(reader: &mut ByteReader<'_>) -> Result<Vec<Vec<Coord<f64>>>> {
    reader.skip(32)?; // bounding box
    let num_parts = reader.count("part")?;
    let num_points = reader.count("point")?;
    reader.ensure_fits(num_parts, 4, "part")?;

    let mut starts = Vec::with_capacity(num_parts);
    for _ in 0..num_parts {
        starts.push(reader.count("part index")?);
    }

    reader.ensure_fits(num_points, 16, "point")?;
    let mut points = Vec::with_capacity(num_points);
    for _ in 0..num_points {
        points.push(reader.coord()?);
    }

    let mut parts = Vec::with_capacity(num_parts);
    for (i, &start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(num_points);
        if start > end || end > num_points {
            return Err(Error::shapefile(
                reader.path,
                format!("part {} spans invalid point range {}..{}", i, start, end),
            ));
        }
        parts.push(points[start..end].to_vec());
    }
    Ok(parts)
}

fn parse_record(content: &[u8], path: &Path) -> Result<Option<Geometry<f64>>> {
    let mut reader = ByteReader::new(content, path);
    let shape_type = reader.le_i32()?;

    let geometry = match shape_type {
        0 => None,
        1 | 11 | 21 => Some(Geometry::Point(Point::from(reader.coord()?))),
        8 | 18 | 28 => {
            reader.skip(32)?;
            let n = reader.count("point")?;
            reader.ensure_fits(n, 16, "point")?;
            let mut points = Vec::with_capacity(n);
            for _ in 0..n {
                points.push(Point::from(reader.coord()?));
            }
            Some(Geometry::MultiPoint(MultiPoint::new(points)))
        }
        3 | 13 | 23 => {
            let mut lines: Vec<LineString<f64>> = parse_parts(&mut reader)?
                .into_iter()
                .map(LineString::new)
                .collect();
            if lines.len() == 1 {
                Some(Geometry::LineString(lines.remove(0)))
            } else {
                Some(Geometry::MultiLineString(MultiLineString::new(lines)))
            }
        }
        5 | 15 | 25 => {
            let rings = parse_parts(&mut reader)?;
            if rings.is_empty() {
                None
            } else {
                Some(group_rings(rings))
            }
        }
        other => {
            return Err(Error::shapefile(
                path,
                format!("unsupported shape type {}", other),
            ))
        }
    };
    Ok(geometry)
}

/// Decode the geometries of a `.shp` file, one entry per record
pub fn parse_shp(bytes: &[u8], path: &Path) -> Result<Vec<Option<Geometry<f64>>>> {
    if bytes.len() < HEADER_LEN {
        return Err(Error::shapefile(path, "file is shorter than the 100 byte header"));
    }
    let code = i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    if code != FILE_CODE {
        return Err(Error::shapefile(path, format!("bad file code {}", code)));
    }

    let mut geometries = Vec::new();
    let mut pos = HEADER_LEN;

    while pos + 8 <= bytes.len() {
        let number = i32::from_be_bytes([bytes[pos], bytes[pos + 1], bytes[pos + 2], bytes[pos + 3]]);
        let words =
            i32::from_be_bytes([bytes[pos + 4], bytes[pos + 5], bytes[pos + 6], bytes[pos + 7]]);
        let len = usize::try_from(words).map_err(|_| {
            Error::shapefile(path, format!("record {} has negative length", number))
        })? * 2;

        let start = pos + 8;
        let content = bytes
            .get(start..start + len)
            .ok_or_else(|| Error::shapefile(path, format!("record {} is truncated", number)))?;

        geometries.push(parse_record(content, path)?);
        pos = start + len;
    }

    debug!("Decoded {} shape records", geometries.len());
    Ok(geometries)
}

fn decode_field(kind: u8, raw: &[u8]) -> AttrValue {
    let text = String::from_utf8_lossy(raw);
    let text = text.trim_matches(|c: char| c.is_whitespace() || c == '\0');

    match kind {
        b'C' => AttrValue::Text(text.to_string()),
        b'N' | b'F' => text
            .parse::<f64>()
            .map(AttrValue::Number)
            .unwrap_or(AttrValue::Null),
        b'L' => match text {
            "T" | "t" | "Y" | "y" => AttrValue::Bool(true),
            "F" | "f" | "N" | "n" => AttrValue::Bool(false),
            _ => AttrValue::Null,
        },
        _ if text.is_empty() => AttrValue::Null,
        _ => AttrValue::Text(text.to_string()),
    }
}

/// Rows of a `.dbf` file. Deleted records are kept as `None` so that row
/// indices stay aligned with the `.shp` records.
pub type DbfRows = Vec<Option<HashMap<String, AttrValue>>>;

/// Decode a dBase table into column names and rows
pub fn parse_dbf(bytes: &[u8], path: &Path) -> Result<(Vec<String>, DbfRows)> {
    if bytes.len() < DBF_HEADER_LEN {
        return Err(Error::shapefile(path, "dbf is shorter than its header"));
    }
    let record_count = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) as usize;
    let header_len = u16::from_le_bytes([bytes[8], bytes[9]]) as usize;
    let record_len = u16::from_le_bytes([bytes[10], bytes[11]]) as usize;

    if record_len == 0 && record_count > 0 {
        return Err(Error::shapefile(
            path,
            format!("dbf declares {} records of zero length", record_count),
        ));
    }

    let mut fields: Vec<(String, u8, usize)> = Vec::new();
    let mut pos = DBF_HEADER_LEN;
    while pos < header_len && bytes.get(pos) != Some(&DBF_FIELD_TERMINATOR) {
        let desc = bytes
            .get(pos..pos + 32)
            .ok_or_else(|| Error::shapefile(path, "dbf field descriptor is truncated"))?;
        let name_end = desc[..11].iter().position(|&b| b == 0).unwrap_or(11);
        let name = String::from_utf8_lossy(&desc[..name_end]).trim().to_string();
        fields.push((name, desc[11].to_ascii_uppercase(), desc[16] as usize));
        pos += 32;
    }

    let stored = bytes.len().saturating_sub(header_len) / record_len.max(1);
    let mut rows = Vec::with_capacity(record_count.min(stored));
    for i in 0..record_count {
        let start = header_len + i * record_len;
        let record = match bytes.get(start..start + record_len) {
            Some(r) => r,
            None => {
                warn!("{}: dbf ends after {} of {} records", path.display(), i, record_count);
                break;
            }
        };

        if record.first() == Some(&b'*') {
            rows.push(None);
            continue;
        }

        let mut offset = 1;
        let mut row = HashMap::with_capacity(fields.len());
        for (name, kind, len) in &fields {
            let raw = record.get(offset..offset + len).unwrap_or(&[]);
            row.insert(name.clone(), decode_field(*kind, raw));
            offset += len;
        }
        rows.push(Some(row));
    }

    let columns = fields.into_iter().map(|(name, _, _)| name).collect();
    Ok((columns, rows))
}

/// Find `stem.ext` next to `path`, accepting either case of the extension
fn sibling(path: &Path, ext: &str) -> Option<PathBuf> {
    [ext.to_lowercase(), ext.to_uppercase()]
        .iter()
        .map(|e| path.with_extension(e))
        .find(|p| p.is_file())
}

/// Read a shapefile from its `.shp` path
pub fn read_shapefile(path: &Path) -> Result<BoundaryLayer> {
    info!("Reading shapefile {}", path.display());

    let shp = fs::read(path)?;
    let geometries = parse_shp(&shp, path)?;

    let (columns, rows) = match sibling(path, "dbf") {
        Some(dbf_path) => parse_dbf(&fs::read(&dbf_path)?, &dbf_path)?,
        None => {
            warn!("No .dbf found next to {}; attributes will be empty", path.display());
            (Vec::new(), Vec::new())
        }
    };

    let crs = match sibling(path, "prj") {
        Some(prj_path) => crs_from_wkt(&String::from_utf8_lossy(&fs::read(&prj_path)?)),
        None => Crs::Missing,
    };

    if !rows.is_empty() && rows.len() != geometries.len() {
        warn!(
            "{}: {} shapes but {} attribute rows",
            path.display(),
            geometries.len(),
            rows.len()
        );
    }

    let mut rows = rows.into_iter();
    let mut features = Vec::with_capacity(geometries.len());
    for geometry in geometries {
        let properties = match rows.next() {
            Some(Some(row)) => row,
            Some(None) => continue,
            None => HashMap::new(),
        };
        features.push(Feature {
            properties,
            geometry,
        });
    }

    info!("Loaded {} features ({})", features.len(), crs);

    Ok(BoundaryLayer {
        columns,
        features,
        crs,
    })
}
