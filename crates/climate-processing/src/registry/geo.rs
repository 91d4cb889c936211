//! Geospatial vector layers: GeoJSON and shapefile readers, coordinate
//! reference systems and reprojection between the two supported systems.
//!
//! A [`GeoLayer`] keeps its geometries next to an attribute DataFrame so it
//! can be inspected like any tabular dataset. The attribute table carries a
//! trailing `geometry` column holding each feature's geometry kind.

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};
use std::fmt;
use std::path::Path;
use tracing::debug;

use super::cells::{CellValue, frame_from_columns};
use crate::error::{PreprocessingError, Result};

/// Semi-major axis of the WGS84 ellipsoid, used as the Web Mercator sphere.
const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Latitude limit of the Web Mercator square.
const MAX_MERCATOR_LATITUDE: f64 = 85.051_128_779_806_59;

// =============================================================================
// Coordinate reference systems
// =============================================================================

/// Coordinate reference system of a layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Crs {
    /// Geographic longitude/latitude on WGS84 (EPSG:4326, CRS84).
    Wgs84,
    /// Spherical Web Mercator (EPSG:3857).
    WebMercator,
    /// Any other EPSG code.
    Epsg(u32),
    /// A projection only described by its WKT text.
    Wkt(String),
    /// No reference system was declared.
    Unknown,
}

impl Crs {
    /// Build from an EPSG code, folding the two supported systems.
    pub fn from_epsg(code: u32) -> Crs {
        match code {
            4326 => Crs::Wgs84,
            3857 | 900913 | 102100 => Crs::WebMercator,
            other => Crs::Epsg(other),
        }
    }

    /// Parse a GeoJSON `crs.properties.name` value.
    ///
    /// Accepts `EPSG:4326`, `urn:ogc:def:crs:EPSG::3857` and the OGC CRS84 URN.
    pub fn from_name(name: &str) -> Crs {
        let upper = name.trim().to_ascii_uppercase();
        if upper.ends_with("CRS84") {
            return Crs::Wgs84;
        }
        upper
            .rsplit(':')
            .next()
            .and_then(|code| code.parse::<u32>().ok())
            .map(Crs::from_epsg)
            .unwrap_or_else(|| Crs::Wkt(name.to_string()))
    }

    /// Interpret the WKT of a shapefile `.prj` sidecar.
    pub fn from_wkt(wkt: &str) -> Crs {
        let normalized = wkt.to_ascii_uppercase().replace(' ', "_");
        if normalized.contains("MERCATOR_AUXILIARY_SPHERE")
            || normalized.contains("PSEUDO-MERCATOR")
            || normalized.contains("PSEUDO_MERCATOR")
        {
            return Crs::WebMercator;
        }
        if normalized.trim_start().starts_with("GEOGCS")
            && (normalized.contains("WGS_1984") || normalized.contains("WGS_84"))
        {
            return Crs::Wgs84;
        }
        authority_code(wkt)
            .map(Crs::from_epsg)
            .unwrap_or_else(|| Crs::Wkt(wkt.trim().to_string()))
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Crs::Unknown)
    }
}

/// Last `AUTHORITY["EPSG","<code>"]` entry of a WKT string.
fn authority_code(wkt: &str) -> Option<u32> {
    let marker = "AUTHORITY[\"EPSG\",\"";
    let start = wkt.rfind(marker)? + marker.len();
    let rest = &wkt[start..];
    let end = rest.find('"')?;
    rest[..end].parse().ok()
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Crs::Wgs84 => f.write_str("EPSG:4326"),
            Crs::WebMercator => f.write_str("EPSG:3857"),
            Crs::Epsg(code) => write!(f, "EPSG:{code}"),
            Crs::Wkt(_) => f.write_str("custom WKT"),
            Crs::Unknown => f.write_str("unknown"),
        }
    }
}

// =============================================================================
// Geometry
// =============================================================================

/// A 2D coordinate in the layer's reference system.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coord {
    pub x: f64,
    pub y: f64,
}

impl Coord {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Feature geometry.
///
/// Polygons are stored as rings, the first ring being the exterior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Point(Coord),
    MultiPoint(Vec<Coord>),
    LineString(Vec<Coord>),
    MultiLineString(Vec<Vec<Coord>>),
    Polygon(Vec<Vec<Coord>>),
    MultiPolygon(Vec<Vec<Vec<Coord>>>),
    /// A feature without geometry.
    Empty,
}

impl Geometry {
    pub fn kind(&self) -> &'static str {
        match self {
            Geometry::Point(_) => "Point",
            Geometry::MultiPoint(_) => "MultiPoint",
            Geometry::LineString(_) => "LineString",
            Geometry::MultiLineString(_) => "MultiLineString",
            Geometry::Polygon(_) => "Polygon",
            Geometry::MultiPolygon(_) => "MultiPolygon",
            Geometry::Empty => "Empty",
        }
    }

    /// Apply a coordinate transform to every vertex.
    pub fn map_coords(&self, f: &impl Fn(Coord) -> Coord) -> Geometry {
        let line = |coords: &Vec<Coord>| coords.iter().map(|c| f(*c)).collect::<Vec<_>>();
        let rings = |rings: &Vec<Vec<Coord>>| rings.iter().map(line).collect::<Vec<_>>();
        match self {
            Geometry::Point(c) => Geometry::Point(f(*c)),
            Geometry::MultiPoint(cs) => Geometry::MultiPoint(line(cs)),
            Geometry::LineString(cs) => Geometry::LineString(line(cs)),
            Geometry::MultiLineString(ls) => Geometry::MultiLineString(rings(ls)),
            Geometry::Polygon(rs) => Geometry::Polygon(rings(rs)),
            Geometry::MultiPolygon(ps) => Geometry::MultiPolygon(ps.iter().map(rings).collect()),
            Geometry::Empty => Geometry::Empty,
        }
    }

    /// Visit every vertex.
    pub fn for_each_coord(&self, f: &mut impl FnMut(Coord)) {
        match self {
            Geometry::Point(c) => f(*c),
            Geometry::MultiPoint(cs) | Geometry::LineString(cs) => cs.iter().for_each(|c| f(*c)),
            Geometry::MultiLineString(ls) | Geometry::Polygon(ls) => {
                ls.iter().flatten().for_each(|c| f(*c))
            }
            Geometry::MultiPolygon(ps) => ps.iter().flatten().flatten().for_each(|c| f(*c)),
            Geometry::Empty => {}
        }
    }
}

/// Axis-aligned extent of a layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

// =============================================================================
// Layers
// =============================================================================

/// A loaded vector layer.
#[derive(Debug, Clone)]
pub struct GeoLayer {
    pub crs: Crs,
    pub geometries: Vec<Geometry>,
    /// One row per feature, attributes followed by the `geometry` kind column.
    pub attributes: DataFrame,
}

impl GeoLayer {
    /// Assemble a layer, appending the `geometry` column to the attributes.
    pub fn new(crs: Crs, geometries: Vec<Geometry>, attributes: DataFrame) -> Result<Self> {
        let mut attributes = if attributes.width() == 0 {
            DataFrame::empty_with_height(geometries.len())
        } else {
            attributes
        };
        let kinds: Vec<&str> = geometries.iter().map(Geometry::kind).collect();
        attributes.with_column(Series::new("geometry".into(), kinds))?;
        Ok(Self {
            crs,
            geometries,
            attributes,
        })
    }

    pub fn len(&self) -> usize {
        self.geometries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.geometries.is_empty()
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let mut bbox: Option<BoundingBox> = None;
        for geometry in &self.geometries {
            geometry.for_each_coord(&mut |c| {
                let b = bbox.get_or_insert(BoundingBox {
                    min_x: c.x,
                    min_y: c.y,
                    max_x: c.x,
                    max_y: c.y,
                });
                b.min_x = b.min_x.min(c.x);
                b.min_y = b.min_y.min(c.y);
                b.max_x = b.max_x.max(c.x);
                b.max_y = b.max_y.max(c.y);
            });
        }
        bbox
    }

    /// Return a copy of the layer expressed in `target`.
    ///
    /// Only the identity and WGS84 ⇄ Web Mercator are supported.
    pub fn to_crs(&self, target: &Crs) -> Result<GeoLayer> {
        if &self.crs == target {
            return Ok(self.clone());
        }

        let transform: fn(Coord) -> Coord = match (&self.crs, target) {
            (Crs::Wgs84, Crs::WebMercator) => lonlat_to_mercator,
            (Crs::WebMercator, Crs::Wgs84) => mercator_to_lonlat,
            (from, to) => {
                return Err(PreprocessingError::Projection {
                    from: from.to_string(),
                    to: to.to_string(),
                });
            }
        };

        debug!("Reprojecting {} features {} -> {}", self.len(), self.crs, target);
        Ok(GeoLayer {
            crs: target.clone(),
            geometries: self
                .geometries
                .iter()
                .map(|g| g.map_coords(&transform))
                .collect(),
            attributes: self.attributes.clone(),
        })
    }
}

fn lonlat_to_mercator(c: Coord) -> Coord {
    let lat = c.y.clamp(-MAX_MERCATOR_LATITUDE, MAX_MERCATOR_LATITUDE).to_radians();
    Coord::new(
        EARTH_RADIUS_M * c.x.to_radians(),
        EARTH_RADIUS_M * (FRAC_PI_4 + lat / 2.0).tan().ln(),
    )
}

fn mercator_to_lonlat(c: Coord) -> Coord {
    let lon = (c.x / EARTH_RADIUS_M).to_degrees();
    let lat = (2.0 * (c.y / EARTH_RADIUS_M).exp().atan() - FRAC_PI_2).to_degrees();
    Coord::new(lon, lat)
}

/// Display title for a boundary or river layer.
///
/// River layers get fixed titles; boundary labels lose any parenthesised
/// suffix, e.g. "District Boundary (SHP)" becomes "Nepal's District Boundary".
pub fn layer_title(label: &str, region: &str) -> String {
    let lower = label.to_lowercase();
    if lower.contains("river line") {
        return format!("{region}'s River Line");
    }
    if lower.contains("river polygon") || lower.contains("river poly") {
        return format!("{region}'s Water Bodies");
    }
    let base = match label.find('(') {
        Some(index) => &label[..index],
        None => label,
    };
    let base = base.replace("Boundary", "");
    format!("{region}'s {} Boundary", base.trim())
}

// =============================================================================
// Attribute tables
// =============================================================================

/// Collect attribute records into columns in first-seen key order.
fn attribute_frame(records: Vec<Vec<(String, CellValue)>>) -> Result<DataFrame> {
    let mut order: Vec<String> = Vec::new();
    let mut columns: HashMap<String, Vec<CellValue>> = HashMap::new();
    let rows = records.len();

    for (row, record) in records.into_iter().enumerate() {
        for (key, value) in record {
            let column = columns.entry(key.clone()).or_insert_with(|| {
                order.push(key);
                vec![CellValue::Empty; rows]
            });
            column[row] = value;
        }
    }

    let ordered = order
        .into_iter()
        .map(|name| {
            let cells = columns.remove(&name).unwrap_or_default();
            (name, cells)
        })
        .collect();
    Ok(frame_from_columns(ordered)?)
}

// =============================================================================
// GeoJSON
// =============================================================================

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
    crs: Option<NamedCrs>,
}

#[derive(Debug, Deserialize)]
struct NamedCrs {
    properties: NamedCrsProperties,
}

#[derive(Debug, Deserialize)]
struct NamedCrsProperties {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Feature {
    geometry: Option<GeometryObject>,
    #[serde(default)]
    properties: Option<serde_json::Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum GeometryObject {
    Point { coordinates: Vec<f64> },
    MultiPoint { coordinates: Vec<Vec<f64>> },
    LineString { coordinates: Vec<Vec<f64>> },
    MultiLineString { coordinates: Vec<Vec<Vec<f64>>> },
    Polygon { coordinates: Vec<Vec<Vec<f64>>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Vec<f64>>>> },
}

fn position(values: &[f64]) -> Result<Coord> {
    match values {
        [x, y, ..] => Ok(Coord::new(*x, *y)),
        _ => Err(PreprocessingError::InvalidConfig(
            "GeoJSON position needs at least two numbers".to_string(),
        )),
    }
}

fn positions(values: &[Vec<f64>]) -> Result<Vec<Coord>> {
    values.iter().map(|p| position(p)).collect()
}

fn position_rings(values: &[Vec<Vec<f64>>]) -> Result<Vec<Vec<Coord>>> {
    values.iter().map(|ring| positions(ring)).collect()
}

impl GeometryObject {
    fn into_geometry(self) -> Result<Geometry> {
        Ok(match self {
            GeometryObject::Point { coordinates } => Geometry::Point(position(&coordinates)?),
            GeometryObject::MultiPoint { coordinates } => {
                Geometry::MultiPoint(positions(&coordinates)?)
            }
            GeometryObject::LineString { coordinates } => {
                Geometry::LineString(positions(&coordinates)?)
            }
            GeometryObject::MultiLineString { coordinates } => {
                Geometry::MultiLineString(position_rings(&coordinates)?)
            }
            GeometryObject::Polygon { coordinates } => {
                Geometry::Polygon(position_rings(&coordinates)?)
            }
            GeometryObject::MultiPolygon { coordinates } => Geometry::MultiPolygon(
                coordinates
                    .iter()
                    .map(|polygon| position_rings(polygon))
                    .collect::<Result<_>>()?,
            ),
        })
    }
}

fn json_cell(value: Value) -> CellValue {
    match value {
        Value::Null => CellValue::Empty,
        Value::Bool(b) => CellValue::Bool(b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => CellValue::Int(i),
            None => n.as_f64().map(CellValue::Float).unwrap_or(CellValue::Empty),
        },
        Value::String(s) => CellValue::Text(s),
        other => CellValue::Text(other.to_string()),
    }
}

/// Parse a GeoJSON FeatureCollection from text.
///
/// Without a `crs` member the layer is WGS84 longitude/latitude.
pub fn parse_geojson(text: &str) -> Result<GeoLayer> {
    let collection: FeatureCollection = serde_json::from_str(text)?;
    let crs = collection
        .crs
        .map(|named| Crs::from_name(&named.properties.name))
        .unwrap_or(Crs::Wgs84);

    let mut geometries = Vec::with_capacity(collection.features.len());
    let mut records = Vec::with_capacity(collection.features.len());
    for feature in collection.features {
        geometries.push(match feature.geometry {
            Some(object) => object.into_geometry()?,
            None => Geometry::Empty,
        });
        records.push(
            feature
                .properties
                .unwrap_or_default()
                .into_iter()
                .map(|(key, value)| (key, json_cell(value)))
                .collect(),
        );
    }

    GeoLayer::new(crs, geometries, attribute_frame(records)?)
}

/// Read a GeoJSON file.
pub fn read_geojson(path: &Path) -> Result<GeoLayer> {
    let text = std::fs::read_to_string(path)?;
    parse_geojson(&text)
}

// =============================================================================
// Shapefile
// =============================================================================

trait PlanarPoint {
    fn coord(&self) -> Coord;
}

impl PlanarPoint for shapefile::Point {
    fn coord(&self) -> Coord {
        Coord::new(self.x, self.y)
    }
}

impl PlanarPoint for shapefile::PointM {
    fn coord(&self) -> Coord {
        Coord::new(self.x, self.y)
    }
}

impl PlanarPoint for shapefile::PointZ {
    fn coord(&self) -> Coord {
        Coord::new(self.x, self.y)
    }
}

fn coords<P: PlanarPoint>(points: &[P]) -> Vec<Coord> {
    points.iter().map(PlanarPoint::coord).collect()
}

fn polyline<P: PlanarPoint>(parts: &[Vec<P>]) -> Geometry {
    match parts {
        [single] => Geometry::LineString(coords(single)),
        _ => Geometry::MultiLineString(parts.iter().map(|p| coords(p)).collect()),
    }
}

/// Group shapefile rings into polygons: each outer ring starts a polygon and
/// the inner rings that follow it are its holes.
fn polygon<P: PlanarPoint>(rings: &[shapefile::PolygonRing<P>]) -> Geometry {
    let mut polygons: Vec<Vec<Vec<Coord>>> = Vec::new();
    for ring in rings {
        let points = coords(ring.points());
        match ring {
            shapefile::PolygonRing::Outer(_) => polygons.push(vec![points]),
            shapefile::PolygonRing::Inner(_) => match polygons.last_mut() {
                Some(current) => current.push(points),
                None => polygons.push(vec![points]),
            },
        }
    }
    match polygons.len() {
        0 => Geometry::Empty,
        1 => Geometry::Polygon(polygons.remove(0)),
        _ => Geometry::MultiPolygon(polygons),
    }
}

fn shape_geometry(shape: shapefile::Shape) -> Geometry {
    use shapefile::Shape;
    match shape {
        Shape::NullShape => Geometry::Empty,
        Shape::Point(p) => Geometry::Point(p.coord()),
        Shape::PointM(p) => Geometry::Point(p.coord()),
        Shape::PointZ(p) => Geometry::Point(p.coord()),
        Shape::Multipoint(m) => Geometry::MultiPoint(coords(m.points())),
        Shape::MultipointM(m) => Geometry::MultiPoint(coords(m.points())),
        Shape::MultipointZ(m) => Geometry::MultiPoint(coords(m.points())),
        Shape::Polyline(l) => polyline(l.parts()),
        Shape::PolylineM(l) => polyline(l.parts()),
        Shape::PolylineZ(l) => polyline(l.parts()),
        Shape::Polygon(p) => polygon(p.rings()),
        Shape::PolygonM(p) => polygon(p.rings()),
        Shape::PolygonZ(p) => polygon(p.rings()),
        Shape::Multipatch(_) => Geometry::Empty,
    }
}

fn field_cell(value: shapefile::dbase::FieldValue) -> CellValue {
    use shapefile::dbase::FieldValue;
    match value {
        FieldValue::Character(Some(s)) if !s.trim().is_empty() => {
            CellValue::Text(s.trim().to_string())
        }
        FieldValue::Character(_) => CellValue::Empty,
        FieldValue::Numeric(Some(v)) if v.fract() == 0.0 && v.abs() < i64::MAX as f64 => {
            CellValue::Int(v as i64)
        }
        FieldValue::Numeric(Some(v)) => CellValue::Float(v),
        FieldValue::Numeric(None) => CellValue::Empty,
        FieldValue::Float(Some(v)) => CellValue::Float(f64::from(v)),
        FieldValue::Float(None) => CellValue::Empty,
        FieldValue::Integer(v) => CellValue::Int(i64::from(v)),
        FieldValue::Double(v) => CellValue::Float(v),
        FieldValue::Currency(v) => CellValue::Float(v),
        FieldValue::Logical(Some(b)) => CellValue::Bool(b),
        FieldValue::Logical(None) => CellValue::Empty,
        FieldValue::Date(None) => CellValue::Empty,
        other => CellValue::Text(other.to_string()),
    }
}

fn shapefile_error(error: impl ToString) -> PreprocessingError {
    PreprocessingError::Io(std::io::Error::other(error.to_string()))
}

/// Read a shapefile with its `.dbf` attributes and `.prj` reference system.
///
/// Attribute columns keep the `.dbf` field order.
pub fn read_shapefile(path: &Path) -> Result<GeoLayer> {
    let table = shapefile::dbase::Reader::from_path(path.with_extension("dbf"))
        .map_err(shapefile_error)?;
    let field_names: Vec<String> = table
        .fields()
        .iter()
        .map(|field| field.name().to_string())
        .collect();
    let shapes = shapefile::ShapeReader::from_path(path).map_err(shapefile_error)?;
    let mut reader = shapefile::Reader::new(shapes, table);

    let mut geometries = Vec::new();
    let mut records = Vec::new();
    for item in reader.iter_shapes_and_records() {
        let (shape, mut record) = item.map_err(shapefile_error)?;
        geometries.push(shape_geometry(shape));
        records.push(
            field_names
                .iter()
                .filter_map(|name| {
                    record
                        .remove(name)
                        .map(|value| (name.clone(), field_cell(value)))
                })
                .collect::<Vec<_>>(),
        );
    }

    let crs = match std::fs::read_to_string(path.with_extension("prj")) {
        Ok(wkt) => Crs::from_wkt(&wkt),
        Err(_) => Crs::Unknown,
    };
    debug!("Read {} shapes from {} ({})", geometries.len(), path.display(), crs);

    GeoLayer::new(crs, geometries, attribute_frame(records)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DISTRICTS: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": {"DISTRICT": "Jumla", "PROVINCE": 6},
                "geometry": {"type": "Polygon", "coordinates": [[[82.0, 29.0], [82.5, 29.0], [82.5, 29.5], [82.0, 29.0]]]}
            },
            {
                "type": "Feature",
                "properties": {"DISTRICT": "Kathmandu", "PROVINCE": 3, "HQ": "Kathmandu"},
                "geometry": {"type": "Point", "coordinates": [85.3, 27.7]}
            }
        ]
    }"#;

    #[test]
    fn test_parse_geojson_defaults_to_wgs84() {
        let layer = parse_geojson(DISTRICTS).unwrap();
        assert_eq!(layer.crs, Crs::Wgs84);
        assert_eq!(layer.len(), 2);
        assert_eq!(
            layer.attributes.get_column_names(),
            vec!["DISTRICT", "PROVINCE", "HQ", "geometry"]
        );
        assert_eq!(layer.attributes.column("HQ").unwrap().null_count(), 1);
        assert_eq!(layer.attributes.column("PROVINCE").unwrap().dtype(), &DataType::Int64);
    }

    #[test]
    fn test_parse_geojson_named_crs() {
        let text = r#"{"type":"FeatureCollection","crs":{"type":"name","properties":{"name":"urn:ogc:def:crs:EPSG::3857"}},"features":[]}"#;
        let layer = parse_geojson(text).unwrap();
        assert_eq!(layer.crs, Crs::WebMercator);
        assert!(layer.is_empty());
    }

    #[test]
    fn test_crs_from_wkt() {
        let wgs = r#"GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137.0,298.257223563]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]]"#;
        assert_eq!(Crs::from_wkt(wgs), Crs::Wgs84);
        let utm = r#"PROJCS["WGS 84 / UTM zone 45N",AUTHORITY["EPSG","32645"]]"#;
        assert_eq!(Crs::from_wkt(utm), Crs::Epsg(32645));
        assert_eq!(Crs::from_name("EPSG:4326"), Crs::Wgs84);
    }

    #[test]
    fn test_reproject_round_trip() {
        let layer = parse_geojson(DISTRICTS).unwrap();
        let mercator = layer.to_crs(&Crs::WebMercator).unwrap();
        assert_eq!(mercator.crs, Crs::WebMercator);
        let back = mercator.to_crs(&Crs::Wgs84).unwrap();
        match (&layer.geometries[1], &back.geometries[1]) {
            (Geometry::Point(a), Geometry::Point(b)) => {
                assert!((a.x - b.x).abs() < 1e-9);
                assert!((a.y - b.y).abs() < 1e-9);
            }
            other => panic!("unexpected geometries {:?}", other),
        }
    }

    #[test]
    fn test_reproject_unsupported() {
        let layer = parse_geojson(DISTRICTS).unwrap();
        let result = layer.to_crs(&Crs::Epsg(32645));
        assert!(matches!(result, Err(PreprocessingError::Projection { .. })));
    }

    #[test]
    fn test_bounding_box() {
        let layer = parse_geojson(DISTRICTS).unwrap();
        let bbox = layer.bounding_box().unwrap();
        assert_eq!(bbox.min_x, 82.0);
        assert_eq!(bbox.max_x, 85.3);
        assert_eq!(bbox.min_y, 27.7);
        assert_eq!(bbox.max_y, 29.5);
    }

    #[test]
    fn test_layer_title() {
        assert_eq!(layer_title("River Line", "Nepal"), "Nepal's River Line");
        assert_eq!(layer_title("River Polygon", "Nepal"), "Nepal's Water Bodies");
        assert_eq!(
            layer_title("District Boundary (SHP)", "Nepal"),
            "Nepal's District Boundary"
        );
        assert_eq!(
            layer_title("National Boundary", "Nepal"),
            "Nepal's National Boundary"
        );
    }
}
