//! Type definitions shared by the catalog and the provider connection

use std::fmt;

use serde::{Deserialize, Serialize};

/// Classification of a table for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TableFlag {
    Vector,
    Aspatial,
    View,
}

impl TableFlag {
    const fn bit(self) -> u8 {
        1 << self as u8
    }
}

/// Set of table flags. An empty set used as a filter matches every table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TableFlags(u8);

impl TableFlags {
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    #[must_use]
    pub const fn with(self, flag: TableFlag) -> Self {
        Self(self.0 | flag.bit())
    }

    #[must_use]
    pub const fn contains(&self, flag: TableFlag) -> bool {
        self.0 & flag.bit() != 0
    }

    #[must_use]
    pub const fn intersects(&self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Filter semantics: empty matches all, otherwise any shared flag.
    #[must_use]
    pub const fn matches(&self, flags: Self) -> bool {
        self.is_empty() || self.intersects(flags)
    }
}

impl From<TableFlag> for TableFlags {
    fn from(flag: TableFlag) -> Self {
        Self::empty().with(flag)
    }
}

impl FromIterator<TableFlag> for TableFlags {
    fn from_iter<T: IntoIterator<Item = TableFlag>>(iter: T) -> Self {
        iter.into_iter().fold(Self::empty(), Self::with)
    }
}

/// Geometry type of a spatial column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WkbType {
    NoGeometry,
    #[default]
    Unknown,
    Point,
    LineString,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
    GeometryCollection,
}

impl WkbType {
    /// Whether a table of this type carries a geometry column.
    #[must_use]
    pub const fn has_geometry(&self) -> bool {
        !matches!(self, Self::NoGeometry | Self::Unknown)
    }

    /// HANA spatial type name (`ST_POINT`, `ST_GEOMETRY`, ...)
    #[must_use]
    pub const fn hana_type_name(&self) -> &'static str {
        match self {
            Self::Point => "ST_POINT",
            _ => "ST_GEOMETRY",
        }
    }

    /// OGC name as stored in `SYS.ST_GEOMETRY_COLUMNS` / returned by `ST_GeometryType()`.
    #[must_use]
    pub const fn ogc_name(&self) -> &'static str {
        match self {
            Self::NoGeometry => "NONE",
            Self::Unknown => "GEOMETRY",
            Self::Point => "ST_Point",
            Self::LineString => "ST_LineString",
            Self::Polygon => "ST_Polygon",
            Self::MultiPoint => "ST_MultiPoint",
            Self::MultiLineString => "ST_MultiLineString",
            Self::MultiPolygon => "ST_MultiPolygon",
            Self::GeometryCollection => "ST_GeometryCollection",
        }
    }

    /// Parse an OGC / HANA geometry type name, case-insensitive.
    #[must_use]
    pub fn from_type_name(name: &str) -> Self {
        let upper = name.trim().to_uppercase();
        let stripped = upper.strip_prefix("ST_").unwrap_or(&upper);
        match stripped {
            "POINT" => Self::Point,
            "LINESTRING" => Self::LineString,
            "POLYGON" => Self::Polygon,
            "MULTIPOINT" => Self::MultiPoint,
            "MULTILINESTRING" => Self::MultiLineString,
            "MULTIPOLYGON" => Self::MultiPolygon,
            "GEOMETRYCOLLECTION" => Self::GeometryCollection,
            "" | "NONE" => Self::NoGeometry,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for WkbType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.ogc_name())
    }
}

/// Coordinate reference system resolved from a HANA spatial reference system
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Crs {
    pub srid: Option<i32>,
    /// Authority identifier, e.g. `EPSG:4326`
    pub auth_id: String,
    pub description: String,
}

impl Crs {
    #[must_use]
    pub fn invalid() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.srid.is_some()
    }
}

/// Geometry type and CRS of a geometry column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeometryColumnType {
    pub wkb_type: WkbType,
    pub crs: Crs,
}

/// Table as presented to the application
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TableProperty {
    pub table_name: String,
    pub schema: String,
    pub flags: TableFlags,
    pub geometry_column: String,
    pub geometry_column_count: usize,
    pub geometry_column_types: Vec<GeometryColumnType>,
    pub primary_key_columns: Vec<String>,
    pub comment: String,
}

impl TableProperty {
    pub fn add_geometry_column_type(&mut self, wkb_type: WkbType, crs: Crs) {
        let column_type = GeometryColumnType { wkb_type, crs };
        if !self.geometry_column_types.contains(&column_type) {
            self.geometry_column_types.push(column_type);
        }
    }
}

/// Table or view read from the HANA catalog
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LayerProperty {
    pub schema_name: String,
    pub table_name: String,
    pub geometry_column: String,
    pub srid: Option<i32>,
    pub wkb_type: WkbType,
    pub is_view: bool,
    /// Key candidates for views, which have no declared primary key
    pub pk_candidates: Vec<String>,
    pub table_comment: String,
}

/// Schema read from the HANA catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaProperty {
    pub name: String,
    pub owner: String,
}

/// Logical attribute type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    Bool,
    Int,
    LongLong,
    Double,
    Decimal,
    String,
    Date,
    Time,
    DateTime,
    Binary,
}

/// Attribute definition for a new table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub field_type: FieldType,
    /// Length for strings, precision for decimals (0 = default)
    #[serde(default)]
    pub length: u32,
    #[serde(default)]
    pub precision: u32,
    #[serde(default)]
    pub comment: String,
}

impl Field {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            length: 0,
            precision: 0,
            comment: String::new(),
        }
    }

    #[must_use]
    pub const fn with_length(mut self, length: u32) -> Self {
        self.length = length;
        self
    }

    #[must_use]
    pub const fn with_precision(mut self, precision: u32) -> Self {
        self.precision = precision;
        self
    }
}

/// Native column type supported by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeType {
    pub description: String,
    pub type_name: String,
    pub field_type: FieldType,
    pub min_len: i32,
    pub max_len: i32,
    pub min_prec: i32,
    pub max_prec: i32,
}
