//! Reads of the HANA system views
//!
//! Every function runs against a borrowed [`Session`] and decodes the rows
//! positionally, in the column order of its SQL.

use std::collections::{HashMap, HashSet};

use serde_json::Value;

use crate::capability::Privilege;
use crate::constants::{EFFECTIVE_PRIVILEGES_QUERY, UNDEFINED_SRID};
use crate::identifier::quoted_string;
use crate::session::Session;
use crate::types::{Crs, FieldType, LayerProperty, NativeType, SchemaProperty, WkbType};
use crate::value::{as_flag, as_i64, as_text};
use crate::Result;

const SCHEMAS_QUERY: &str =
    "SELECT SCHEMA_NAME, SCHEMA_OWNER FROM SYS.SCHEMAS WHERE HAS_PRIVILEGES = 'TRUE'";

const GEOMETRY_COLUMNS_QUERY: &str = "SELECT SCHEMA_NAME, TABLE_NAME, COLUMN_NAME, SRS_ID, DATA_TYPE_NAME FROM SYS.ST_GEOMETRY_COLUMNS";

const TABLES_QUERY: &str = "SELECT SCHEMA_NAME, TABLE_NAME, COMMENTS, 'FALSE' AS IS_VIEW FROM SYS.TABLES WHERE IS_SYSTEM_TABLE = 'FALSE' AND IS_USER_DEFINED_TYPE = 'FALSE'";

const VIEWS_QUERY: &str =
    "SELECT SCHEMA_NAME, VIEW_NAME AS TABLE_NAME, COMMENTS, 'TRUE' AS IS_VIEW FROM SYS.VIEWS WHERE 1 = 1";

const VIEW_KEY_CANDIDATES_QUERY: &str = "SELECT SCHEMA_NAME, VIEW_NAME, COLUMN_NAME FROM SYS.VIEW_COLUMNS WHERE DATA_TYPE_NAME IN ('TINYINT', 'SMALLINT', 'INTEGER', 'BIGINT')";

const USER_SCHEMAS_FILTER: &str =
    " AND SCHEMA_NAME IN (SELECT SCHEMA_NAME FROM SYS.SCHEMAS WHERE SCHEMA_OWNER = CURRENT_USER)";

const PRIMARY_KEY_TEMPLATE: &str = "SELECT COLUMN_NAME FROM SYS.CONSTRAINTS WHERE SCHEMA_NAME = {SCHEMA} AND TABLE_NAME = {TABLE} AND IS_PRIMARY_KEY = 'TRUE' ORDER BY POSITION";

const TABLE_EXISTS_TEMPLATE: &str =
    "SELECT COUNT(*) FROM SYS.TABLES WHERE SCHEMA_NAME = {SCHEMA} AND TABLE_NAME = {TABLE}";

const CRS_TEMPLATE: &str = "SELECT SRS_NAME, ORGANIZATION, ORGANIZATION_COORDSYS_ID FROM SYS.ST_SPATIAL_REFERENCE_SYSTEMS WHERE SRS_ID = {SRID}";

const DATA_TYPES_QUERY: &str = "SELECT TYPE_NAME FROM SYS.DATA_TYPES";

/// HANA column types the provider knows how to map:
/// (description, type name, field type, min len, max len, min prec, max prec)
const KNOWN_NATIVE_TYPES: &[(&str, &str, FieldType, i32, i32, i32, i32)] = &[
    ("Boolean", "BOOLEAN", FieldType::Bool, -1, -1, -1, -1),
    ("8 Bytes integer", "BIGINT", FieldType::LongLong, -1, -1, -1, -1),
    ("4 Bytes integer", "INTEGER", FieldType::Int, -1, -1, -1, -1),
    ("2 Bytes integer", "SMALLINT", FieldType::Int, -1, -1, -1, -1),
    ("1 Byte integer", "TINYINT", FieldType::Int, -1, -1, -1, -1),
    ("Decimal number", "DECIMAL", FieldType::Decimal, 1, 38, 0, 38),
    ("Single precision float", "REAL", FieldType::Double, -1, -1, -1, -1),
    ("Double precision float", "DOUBLE", FieldType::Double, -1, -1, -1, -1),
    ("Fixed-length string", "CHAR", FieldType::String, 1, 5000, -1, -1),
    ("Variable-length string", "VARCHAR", FieldType::String, 1, 5000, -1, -1),
    ("Fixed-length Unicode string", "NCHAR", FieldType::String, 1, 5000, -1, -1),
    ("Variable-length Unicode string", "NVARCHAR", FieldType::String, 1, 5000, -1, -1),
    ("Alphanumeric string", "ALPHANUM", FieldType::String, 1, 127, -1, -1),
    ("Short text", "SHORTTEXT", FieldType::String, 1, 5000, -1, -1),
    ("Character large object", "CLOB", FieldType::String, -1, -1, -1, -1),
    ("Unicode character large object", "NCLOB", FieldType::String, -1, -1, -1, -1),
    ("Date", "DATE", FieldType::Date, -1, -1, -1, -1),
    ("Time", "TIME", FieldType::Time, -1, -1, -1, -1),
    ("Date & Time", "SECONDDATE", FieldType::DateTime, -1, -1, -1, -1),
    ("Timestamp", "TIMESTAMP", FieldType::DateTime, -1, -1, -1, -1),
    ("Variable-length binary", "VARBINARY", FieldType::Binary, 1, 5000, -1, -1),
    ("Binary large object", "BLOB", FieldType::Binary, -1, -1, -1, -1),
];

fn text_at(row: &[Value], index: usize) -> String {
    row.get(index).and_then(as_text).unwrap_or_default()
}

fn srid_at(row: &[Value], index: usize) -> Option<i32> {
    row.get(index)
        .and_then(as_i64)
        .and_then(|srid| i32::try_from(srid).ok())
}

fn schema_filter(schema: Option<&str>) -> String {
    schema.map_or_else(String::new, |name| {
        format!(" AND SCHEMA_NAME = {}", quoted_string(name))
    })
}

/// Schemas the current user holds privileges on, optionally by owner.
pub async fn schemas(session: &mut dyn Session, owner: Option<&str>) -> Result<Vec<SchemaProperty>> {
    let mut sql = SCHEMAS_QUERY.to_string();
    if let Some(owner) = owner {
        sql.push_str(&format!(" AND SCHEMA_OWNER = {}", quoted_string(owner)));
    }
    sql.push_str(" ORDER BY SCHEMA_NAME");

    let rows = session.query_rows(&sql).await?;
    Ok(rows
        .iter()
        .map(|row| SchemaProperty {
            name: text_at(row, 0),
            owner: text_at(row, 1),
        })
        .collect())
}

/// Tables and views with their geometry columns
///
/// A table with several geometry columns yields one layer per column. Tables
/// without geometry are returned only when `include_aspatial` is set; views
/// carry their integer columns as key candidates.
pub async fn layers(
    session: &mut dyn Session,
    schema: Option<&str>,
    include_aspatial: bool,
    user_tables_only: bool,
) -> Result<Vec<LayerProperty>> {
    let mut filter = schema_filter(schema);
    if user_tables_only {
        filter.push_str(USER_SCHEMAS_FILTER);
    }

    let mut geometry_columns: HashMap<(String, String), Vec<(String, Option<i32>, WkbType)>> =
        HashMap::new();
    let geometry_sql = if filter.is_empty() {
        GEOMETRY_COLUMNS_QUERY.to_string()
    } else {
        format!("{GEOMETRY_COLUMNS_QUERY} WHERE 1 = 1{filter}")
    };
    for row in session.query_rows(&geometry_sql).await? {
        geometry_columns
            .entry((text_at(&row, 0), text_at(&row, 1)))
            .or_default()
            .push((
                text_at(&row, 2),
                srid_at(&row, 3),
                WkbType::from_type_name(&text_at(&row, 4)),
            ));
    }

    let mut view_keys: HashMap<(String, String), Vec<String>> = HashMap::new();
    let view_keys_sql = format!("{VIEW_KEY_CANDIDATES_QUERY}{filter} ORDER BY POSITION");
    for row in session.query_rows(&view_keys_sql).await? {
        view_keys
            .entry((text_at(&row, 0), text_at(&row, 1)))
            .or_default()
            .push(text_at(&row, 2));
    }

    let tables_sql = format!(
        "{TABLES_QUERY}{filter} UNION ALL {VIEWS_QUERY}{filter} ORDER BY SCHEMA_NAME, TABLE_NAME"
    );
    let mut layers = Vec::new();
    for row in session.query_rows(&tables_sql).await? {
        let key = (text_at(&row, 0), text_at(&row, 1));
        let is_view = row.get(3).is_some_and(as_flag);
        let template = LayerProperty {
            schema_name: key.0.clone(),
            table_name: key.1.clone(),
            is_view,
            pk_candidates: if is_view {
                view_keys.get(&key).cloned().unwrap_or_default()
            } else {
                Vec::new()
            },
            table_comment: text_at(&row, 2),
            ..LayerProperty::default()
        };

        match geometry_columns.get(&key) {
            Some(columns) => {
                for (column, srid, wkb_type) in columns {
                    layers.push(LayerProperty {
                        geometry_column: column.clone(),
                        srid: *srid,
                        wkb_type: *wkb_type,
                        ..template.clone()
                    });
                }
            }
            None if include_aspatial => layers.push(LayerProperty {
                wkb_type: WkbType::NoGeometry,
                ..template
            }),
            None => {}
        }
    }

    tracing::debug!(
        schema = schema.unwrap_or("<all>"),
        count = layers.len(),
        "Read layers from catalog"
    );
    Ok(layers)
}

/// Primary key columns of a table, in key order.
pub async fn primary_key(session: &mut dyn Session, schema: &str, table: &str) -> Result<Vec<String>> {
    let sql = PRIMARY_KEY_TEMPLATE
        .replace("{SCHEMA}", &quoted_string(schema))
        .replace("{TABLE}", &quoted_string(table));
    let rows = session.query_rows(&sql).await?;
    Ok(rows.iter().map(|row| text_at(row, 0)).collect())
}

pub async fn table_exists(session: &mut dyn Session, schema: &str, table: &str) -> Result<bool> {
    let sql = TABLE_EXISTS_TEMPLATE
        .replace("{SCHEMA}", &quoted_string(schema))
        .replace("{TABLE}", &quoted_string(table));
    let rows = session.query_rows(&sql).await?;
    Ok(rows
        .first()
        .and_then(|row| row.first())
        .and_then(as_i64)
        .is_some_and(|count| count > 0))
}

/// Coordinate reference system registered under `srid`
///
/// Unknown or undefined SRIDs give an invalid [`Crs`].
pub async fn crs(session: &mut dyn Session, srid: Option<i32>) -> Result<Crs> {
    let Some(srid) = srid.filter(|srid| *srid != UNDEFINED_SRID) else {
        return Ok(Crs::invalid());
    };

    let sql = CRS_TEMPLATE.replace("{SRID}", &srid.to_string());
    let rows = session.query_rows(&sql).await?;
    let Some(row) = rows.first() else {
        tracing::debug!(srid, "Spatial reference system not found");
        return Ok(Crs::invalid());
    };

    let organization = text_at(row, 1);
    let auth_id = match row.get(2).and_then(as_i64) {
        Some(id) if !organization.is_empty() => format!("{}:{id}", organization.to_uppercase()),
        _ => format!("HANA:{srid}"),
    };
    Ok(Crs {
        srid: Some(srid),
        auth_id,
        description: text_at(row, 0),
    })
}

/// Effective privileges of the current user.
pub async fn privileges(session: &mut dyn Session) -> Result<Vec<Privilege>> {
    let rows = session.query_rows(EFFECTIVE_PRIVILEGES_QUERY).await?;
    Ok(rows
        .iter()
        .map(|row| Privilege {
            object_type: text_at(row, 0),
            privilege: text_at(row, 1),
            schema_name: text_at(row, 2),
            object_name: text_at(row, 3),
        })
        .collect())
}

/// Known native types the server actually offers.
pub async fn native_types(session: &mut dyn Session) -> Result<Vec<NativeType>> {
    let rows = session.query_rows(DATA_TYPES_QUERY).await?;
    let available: HashSet<String> = rows
        .iter()
        .map(|row| text_at(row, 0).to_uppercase())
        .collect();

    Ok(KNOWN_NATIVE_TYPES
        .iter()
        .filter(|(_, type_name, ..)| available.contains(*type_name))
        .map(
            |&(description, type_name, field_type, min_len, max_len, min_prec, max_prec)| {
                NativeType {
                    description: description.to_string(),
                    type_name: type_name.to_string(),
                    field_type,
                    min_len,
                    max_len,
                    min_prec,
                    max_prec,
                }
            },
        )
        .collect())
}
