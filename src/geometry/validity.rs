//! OGC-style validity checks for boundary polygons.
//!
//! Ring segments are bulk loaded into an R-tree so that intersection tests
//! only compare segments whose envelopes overlap.

use geo::coordinate_position::{CoordPos, CoordinatePosition};
use geo::{Coord, Geometry, LineString, Polygon};
use rstar::{RTree, RTreeObject, AABB};

/// Why a geometry is invalid, with the offending location
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Problem {
    InvalidCoordinate(Coord<f64>),
    TooFewPoints(Coord<f64>),
    SelfIntersection(Coord<f64>),
    RingSelfIntersection(Coord<f64>),
    HoleOutsideShell(Coord<f64>),
    NestedHoles(Coord<f64>),
    NestedShells(Coord<f64>),
}

impl Problem {
    /// Problems a buffer/cleanup pass can remove
    pub fn is_repairable(&self) -> bool {
        matches!(self, Problem::TooFewPoints(_))
    }
}

impl std::fmt::Display for Problem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (label, at) = match self {
            Problem::InvalidCoordinate(c) => ("Invalid Coordinate", c),
            Problem::TooFewPoints(c) => ("Too few points in geometry component", c),
            Problem::SelfIntersection(c) => ("Self-intersection", c),
            Problem::RingSelfIntersection(c) => ("Ring Self-intersection", c),
            Problem::HoleOutsideShell(c) => ("Hole lies outside shell", c),
            Problem::NestedHoles(c) => ("Holes are nested", c),
            Problem::NestedShells(c) => ("Nested shells", c),
        };
        write!(f, "{}[{} {}]", label, at.x, at.y)
    }
}

/// Ring coordinates with consecutive duplicates removed
pub fn dedup_ring(ring: &LineString<f64>) -> Vec<Coord<f64>> {
    let mut out: Vec<Coord<f64>> = Vec::with_capacity(ring.0.len());
    for c in ring.coords() {
        if out.last() != Some(c) {
            out.push(*c);
        }
    }
    out
}

#[derive(Debug, Clone, Copy)]
struct Segment {
    /// Component of a multipolygon
    part: usize,
    ring: usize,
    index: usize,
    a: Coord<f64>,
    b: Coord<f64>,
}

impl RTreeObject for Segment {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners([self.a.x, self.a.y], [self.b.x, self.b.y])
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Hit {
    None,
    Touch(Coord<f64>),
    Cross(Coord<f64>),
    Overlap(Coord<f64>),
}

fn orient(a: Coord<f64>, b: Coord<f64>, c: Coord<f64>) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

fn within_box(a: Coord<f64>, b: Coord<f64>, p: Coord<f64>) -> bool {
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}

fn intersect(p1: Coord<f64>, p2: Coord<f64>, q1: Coord<f64>, q2: Coord<f64>) -> Hit {
    let d1 = orient(q1, q2, p1);
    let d2 = orient(q1, q2, p2);
    let d3 = orient(p1, p2, q1);
    let d4 = orient(p1, p2, q2);

    if d1 * d2 < 0.0 && d3 * d4 < 0.0 {
        let t = d1 / (d1 - d2);
        return Hit::Cross(Coord {
            x: p1.x + (p2.x - p1.x) * t,
            y: p1.y + (p2.y - p1.y) * t,
        });
    }

    if d1 == 0.0 && d2 == 0.0 && d3 == 0.0 && d4 == 0.0 {
        // Collinear: project onto the dominant axis
        let use_x = (p2.x - p1.x).abs() >= (p2.y - p1.y).abs();
        let key = |c: Coord<f64>| if use_x { c.x } else { c.y };
        let (pa, pb) = if key(p1) <= key(p2) { (p1, p2) } else { (p2, p1) };
        let (qa, qb) = if key(q1) <= key(q2) { (q1, q2) } else { (q2, q1) };
        let start = if key(pa) >= key(qa) { pa } else { qa };
        let end = if key(pb) <= key(qb) { pb } else { qb };
        return if key(start) < key(end) {
            Hit::Overlap(start)
        } else if key(start) == key(end) {
            Hit::Touch(start)
        } else {
            Hit::None
        };
    }

    for (d, point, a, b) in [(d1, p1, q1, q2), (d2, p2, q1, q2), (d3, q1, p1, p2), (d4, q2, p1, p2)] {
        if d == 0.0 && within_box(a, b, point) {
            return Hit::Touch(point);
        }
    }
    Hit::None
}

fn polygon_problems(polygon: &Polygon<f64>, out: &mut Vec<Problem>) {
    let rings: Vec<Vec<Coord<f64>>> = std::iter::once(polygon.exterior())
        .chain(polygon.interiors().iter())
        .map(dedup_ring)
        .collect();

    for ring in &rings {
        if let Some(bad) = ring.iter().find(|c| !c.x.is_finite() || !c.y.is_finite()) {
            out.push(Problem::InvalidCoordinate(*bad));
            return;
        }
    }

    let mut too_few = false;
    for ring in &rings {
        // An empty exterior is an empty polygon, which is valid
        if !ring.is_empty() && ring.len() < 4 {
            out.push(Problem::TooFewPoints(ring[0]));
            too_few = true;
        }
    }
    if too_few {
        return;
    }

    let segments: Vec<Segment> = rings
        .iter()
        .enumerate()
        .flat_map(|(r, ring)| {
            ring.windows(2).enumerate().map(move |(i, w)| Segment {
                part: 0,
                ring: r,
                index: i,
                a: w[0],
                b: w[1],
            })
        })
        .collect();
    let ring_sizes: Vec<usize> = rings.iter().map(|r| r.len().saturating_sub(1)).collect();
    let tree = RTree::bulk_load(segments.clone());

    for s in &segments {
        for t in tree.locate_in_envelope_intersecting(&s.envelope()) {
            if (t.ring, t.index) <= (s.ring, s.index) {
                continue;
            }
            let hit = intersect(s.a, s.b, t.a, t.b);
            let problem = if s.ring == t.ring {
                let n = ring_sizes[s.ring];
                let adjacent = t.index == s.index + 1 || (s.index == 0 && t.index + 1 == n);
                match hit {
                    Hit::Overlap(c) => Some(Problem::RingSelfIntersection(c)),
                    Hit::Touch(c) | Hit::Cross(c) if !adjacent => {
                        Some(Problem::RingSelfIntersection(c))
                    }
                    _ => None,
                }
            } else {
                match hit {
                    Hit::Cross(c) | Hit::Overlap(c) => Some(Problem::SelfIntersection(c)),
                    _ => None,
                }
            };
            if let Some(problem) = problem {
                out.push(problem);
                return;
            }
        }
    }

    if rings[0].is_empty() {
        return;
    }
    let shell = Polygon::new(polygon.exterior().clone(), vec![]);
    for hole in &rings[1..] {
        if let Some(outside) = hole
            .iter()
            .find(|c| shell.coordinate_position(*c) == CoordPos::Outside)
        {
            out.push(Problem::HoleOutsideShell(*outside));
            return;
        }
    }

    let holes: Vec<Polygon<f64>> = polygon
        .interiors()
        .iter()
        .map(|h| Polygon::new(h.clone(), vec![]))
        .collect();
    for (i, outer) in holes.iter().enumerate() {
        for (j, inner) in rings[1..].iter().enumerate() {
            if i == j {
                continue;
            }
            if let Some(nested) = inner
                .iter()
                .find(|c| outer.coordinate_position(*c) == CoordPos::Inside)
            {
                out.push(Problem::NestedHoles(*nested));
                return;
            }
        }
    }
}

/// Problems between the components of a multipolygon: crossing or shared
/// edges, and shells lying inside another component.
fn multipolygon_problems(polygons: &[Polygon<f64>], out: &mut Vec<Problem>) {
    let before = out.len();
    polygons.iter().for_each(|p| polygon_problems(p, out));
    if out.len() > before || polygons.len() < 2 {
        return;
    }

    let segments: Vec<Segment> = polygons
        .iter()
        .enumerate()
        .flat_map(|(part, p)| {
            std::iter::once(p.exterior())
                .chain(p.interiors().iter())
                .enumerate()
                .flat_map(move |(r, ring)| {
                    ring.lines().enumerate().map(move |(i, line)| Segment {
                        part,
                        ring: r,
                        index: i,
                        a: line.start,
                        b: line.end,
                    })
                })
        })
        .collect();
    let tree = RTree::bulk_load(segments.clone());

    for s in &segments {
        for t in tree.locate_in_envelope_intersecting(&s.envelope()) {
            if t.part <= s.part {
                continue;
            }
            if let Hit::Cross(c) | Hit::Overlap(c) = intersect(s.a, s.b, t.a, t.b) {
                out.push(Problem::SelfIntersection(c));
                return;
            }
        }
    }

    for (i, polygon) in polygons.iter().enumerate() {
        for (j, other) in polygons.iter().enumerate() {
            if i == j {
                continue;
            }
            if let Some(nested) = polygon
                .exterior()
                .coords()
                .find(|c| other.coordinate_position(*c) == CoordPos::Inside)
            {
                out.push(Problem::NestedShells(*nested));
                return;
            }
        }
    }
}

fn line_problems(line: &LineString<f64>, out: &mut Vec<Problem>) {
    let coords = dedup_ring(line);
    if let Some(bad) = coords.iter().find(|c| !c.x.is_finite() || !c.y.is_finite()) {
        out.push(Problem::InvalidCoordinate(*bad));
    } else if coords.len() == 1 {
        out.push(Problem::TooFewPoints(coords[0]));
    }
}

/// All problems found in a geometry, in traversal order
pub fn problems(geometry: &Geometry<f64>) -> Vec<Problem> {
    let mut out = Vec::new();
    collect(geometry, &mut out);
    out
}

fn collect(geometry: &Geometry<f64>, out: &mut Vec<Problem>) {
    match geometry {
        Geometry::Polygon(p) => polygon_problems(p, out),
        Geometry::MultiPolygon(mp) => multipolygon_problems(&mp.0, out),
        Geometry::LineString(l) => line_problems(l, out),
        Geometry::MultiLineString(ml) => ml.iter().for_each(|l| line_problems(l, out)),
        Geometry::Point(p) => {
            if !p.x().is_finite() || !p.y().is_finite() {
                out.push(Problem::InvalidCoordinate(p.0));
            }
        }
        Geometry::MultiPoint(mp) => {
            for p in mp.iter() {
                if !p.x().is_finite() || !p.y().is_finite() {
                    out.push(Problem::InvalidCoordinate(p.0));
                }
            }
        }
        Geometry::GeometryCollection(gc) => gc.iter().for_each(|g| collect(g, out)),
        Geometry::Line(_) | Geometry::Rect(_) | Geometry::Triangle(_) => {}
    }
}

pub fn is_valid(geometry: &Geometry<f64>) -> bool {
    problems(geometry).is_empty()
}

/// Human readable validity explanation ("Valid Geometry" when valid).
///
/// Unlike GEOS, a hole set that disconnects the polygon interior (holes
/// touching each other in a chain across the shell) is not detected.
pub fn explain_validity(geometry: &Geometry<f64>) -> String {
    match problems(geometry).first() {
        Some(problem) => problem.to_string(),
        None => "Valid Geometry".to_string(),
    }
}
