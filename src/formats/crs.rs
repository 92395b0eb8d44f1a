//! CRS identification from `.prj` WKT and GeoJSON `crs` members.

use regex::Regex;
use std::sync::OnceLock;

use crate::models::Crs;

/// A parsed WKT node: `KEYWORD["text", 1.0, CHILD[...]]`
#[derive(Debug, Clone, PartialEq)]
pub struct WktNode {
    pub keyword: String,
    pub args: Vec<WktArg>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WktArg {
    Text(String),
    Raw(String),
    Node(WktNode),
}

impl WktNode {
    /// First quoted argument, usually the object's name
    pub fn name(&self) -> Option<&str> {
        self.args.iter().find_map(|a| match a {
            WktArg::Text(s) => Some(s.as_str()),
            _ => None,
        })
    }

    /// Direct children with the given keyword (case-insensitive)
    pub fn children<'a>(&'a self, keyword: &'a str) -> impl Iterator<Item = &'a WktNode> + 'a {
        self.args.iter().filter_map(move |a| match a {
            WktArg::Node(n) if n.keyword.eq_ignore_ascii_case(keyword) => Some(n),
            _ => None,
        })
    }

    /// EPSG code from a direct AUTHORITY["EPSG","n"] (WKT1) or ID["EPSG",n] (WKT2) child
    pub fn epsg(&self) -> Option<u32> {
        self.children("AUTHORITY")
            .chain(self.children("ID"))
            .find_map(|auth| {
                let mut args = auth.args.iter();
                match args.next() {
                    Some(WktArg::Text(org)) if org.eq_ignore_ascii_case("EPSG") => {}
                    _ => return None,
                }
                match args.next() {
                    Some(WktArg::Text(code)) | Some(WktArg::Raw(code)) => code.trim().parse().ok(),
                    _ => None,
                }
            })
    }
}

struct WktParser<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
}

impl<'a> WktParser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
        }
    }

    fn skip_ws(&mut self) {
        while matches!(self.chars.peek(), Some(c) if c.is_whitespace()) {
            self.chars.next();
        }
    }

    fn node(&mut self) -> Option<WktNode> {
        self.skip_ws();
        let mut keyword = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                keyword.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        if keyword.is_empty() {
            return None;
        }

        self.skip_ws();
        match self.chars.peek() {
            Some('[') | Some('(') => {
                self.chars.next();
            }
            _ => {
                return Some(WktNode {
                    keyword,
                    args: Vec::new(),
                })
            }
        }

        let mut args = Vec::new();
        loop {
            self.skip_ws();
            match self.chars.peek().copied() {
                Some(']') | Some(')') => {
                    self.chars.next();
                    break;
                }
                Some(',') => {
                    self.chars.next();
                }
                Some('"') => {
                    self.chars.next();
                    args.push(WktArg::Text(self.quoted()));
                }
                Some(c) if c.is_ascii_alphabetic() => args.push(WktArg::Node(self.node()?)),
                Some(_) => args.push(WktArg::Raw(self.raw())),
                None => return None,
            }
        }

        Some(WktNode { keyword, args })
    }

    fn quoted(&mut self) -> String {
        let mut out = String::new();
        while let Some(c) = self.chars.next() {
            if c == '"' {
                // "" is an escaped quote
                if self.chars.peek() == Some(&'"') {
                    self.chars.next();
                    out.push('"');
                    continue;
                }
                break;
            }
            out.push(c);
        }
        out
    }

    fn raw(&mut self) -> String {
        let mut out = String::new();
        while let Some(&c) = self.chars.peek() {
            if matches!(c, ',' | ']' | ')') {
                break;
            }
            out.push(c);
            self.chars.next();
        }
        out.trim().to_string()
    }
}

/// Parse a WKT string into its node tree
pub fn parse_wkt(input: &str) -> Option<WktNode> {
    WktParser::new(input.trim_start_matches('\u{feff}')).node()
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_uppercase()
}

/// Classify the contents of a `.prj` file
pub fn crs_from_wkt(input: &str) -> Crs {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Crs::Missing;
    }

    let root = match parse_wkt(trimmed) {
        Some(root) => root,
        None => return Crs::Unknown(trimmed.chars().take(60).collect()),
    };

    let label = root.name().unwrap_or(&root.keyword).to_string();
    match root.keyword.to_uppercase().as_str() {
        "PROJCS" | "PROJCRS" | "PROJECTEDCRS" => Crs::Projected(label),
        "GEOGCS" | "GEOGCRS" | "GEODCRS" | "GEOGRAPHICCRS" | "GEODETICCRS" => {
            if let Some(code) = root.epsg() {
                return Crs::Epsg(code);
            }
            let datum = root
                .children("DATUM")
                .next()
                .and_then(|d| d.name())
                .map(normalize)
                .unwrap_or_default();
            let name = normalize(&label);
            let is_wgs84 = |s: &str| s.contains("WGS1984") || s.contains("WGS84");
            if is_wgs84(&datum) || (datum.is_empty() && is_wgs84(&name)) {
                Crs::WGS84
            } else {
                Crs::Named(label)
            }
        }
        _ => Crs::Unknown(label),
    }
}

fn crs84_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)CRS:?84$").expect("valid regex"))
}

fn epsg_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)EPSG:(?:[0-9.]*:)?(\d+)$").expect("valid regex"))
}

/// Classify a legacy GeoJSON `crs.properties.name` such as
/// `urn:ogc:def:crs:OGC:1.3:CRS84` or `EPSG:3857`.
pub fn crs_from_name(name: &str) -> Crs {
    let name = name.trim();
    if crs84_regex().is_match(name) {
        return Crs::WGS84;
    }
    if let Some(code) = epsg_regex()
        .captures(name)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
    {
        return Crs::Epsg(code);
    }
    Crs::Unknown(name.to_string())
}
