//! In-memory representation of a loaded boundary layer.

use geo_types::Geometry;
use serde::Serialize;
use std::collections::HashMap;

/// Attribute value read from GeoJSON properties or a DBF record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttrValue {
    Text(String),
    Number(f64),
    Bool(bool),
    Null,
}

impl AttrValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttrValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, AttrValue::Null)
    }
}

impl std::fmt::Display for AttrValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttrValue::Text(s) => write!(f, "{}", s),
            AttrValue::Number(n) => write!(f, "{}", n),
            AttrValue::Bool(b) => write!(f, "{}", b),
            AttrValue::Null => write!(f, "null"),
        }
    }
}

/// Coordinate reference system declared by a layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Crs {
    /// Identified by EPSG code
    Epsg(u32),
    /// Geographic CRS we could not map to an EPSG code
    Named(String),
    /// Any projected CRS
    Projected(String),
    /// Declared but not understood
    Unknown(String),
    /// No CRS information at all (e.g. shapefile without .prj)
    Missing,
}

impl Crs {
    pub const WGS84: Crs = Crs::Epsg(4326);

    pub fn is_wgs84(&self) -> bool {
        *self == Self::WGS84
    }
}

impl std::fmt::Display for Crs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Crs::Epsg(code) => write!(f, "EPSG:{}", code),
            Crs::Named(name) | Crs::Projected(name) | Crs::Unknown(name) => write!(f, "{}", name),
            Crs::Missing => write!(f, "None"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Feature {
    pub properties: HashMap<String, AttrValue>,
    pub geometry: Option<Geometry<f64>>,
}

/// A boundary layer: attribute columns, features and CRS
#[derive(Debug, Clone)]
pub struct BoundaryLayer {
    /// Column names in file order
    pub columns: Vec<String>,
    pub features: Vec<Feature>,
    pub crs: Crs,
}

impl BoundaryLayer {
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Values of one column, one entry per feature (Null when absent)
    pub fn column<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a AttrValue> + 'a {
        self.features
            .iter()
            .map(move |f| f.properties.get(name).unwrap_or(&AttrValue::Null))
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}
