//! DDL for new vector tables

use crate::identifier::{is_valid_identifier, qualified_name, quoted_identifier, quoted_string};
use crate::types::{Field, FieldType, WkbType};
use crate::{Error, Result};

const MAX_VARCHAR_LENGTH: u32 = 5000;
const MAX_DECIMAL_PRECISION: u32 = 38;

/// Layout of a table to create
#[derive(Debug, Clone)]
pub struct TableLayout<'a> {
    pub schema: &'a str,
    pub name: &'a str,
    pub fields: &'a [Field],
    pub primary_key: &'a str,
    /// Geometry column name, type and SRID; `None` for aspatial tables
    pub geometry: Option<(&'a str, WkbType, Option<i32>)>,
}

/// HANA column type for a field
pub fn column_type(field: &Field) -> String {
    match field.field_type {
        FieldType::Bool => "BOOLEAN".to_string(),
        FieldType::Int => "INTEGER".to_string(),
        FieldType::LongLong => "BIGINT".to_string(),
        FieldType::Double => "DOUBLE".to_string(),
        FieldType::Decimal if field.length == 0 => "DECIMAL".to_string(),
        FieldType::Decimal => {
            let precision = field.length.min(MAX_DECIMAL_PRECISION);
            format!("DECIMAL({precision},{})", field.precision.min(precision))
        }
        FieldType::String if field.length == 0 || field.length > MAX_VARCHAR_LENGTH => {
            "NCLOB".to_string()
        }
        FieldType::String => format!("NVARCHAR({})", field.length),
        FieldType::Date => "DATE".to_string(),
        FieldType::Time => "TIME".to_string(),
        FieldType::DateTime => "TIMESTAMP".to_string(),
        FieldType::Binary if field.length == 0 || field.length > MAX_VARCHAR_LENGTH => {
            "BLOB".to_string()
        }
        FieldType::Binary => format!("VARBINARY({})", field.length),
    }
}

fn geometry_type(wkb_type: WkbType, srid: Option<i32>) -> String {
    let type_name = wkb_type.hana_type_name();
    match srid.filter(|srid| *srid >= 0) {
        Some(srid) => format!("{type_name}({srid})"),
        None => type_name.to_string(),
    }
}

impl TableLayout<'_> {
    fn validate(&self) -> Result<()> {
        let mut names = vec![self.primary_key];
        names.extend(self.geometry.map(|(column, ..)| column));
        names.extend(self.fields.iter().map(|field| field.name.as_str()));
        if let Some(invalid) = names.iter().find(|name| !is_valid_identifier(name)) {
            return Err(Error::CreateVectorTable(format!(
                "Invalid column name '{invalid}'"
            )));
        }

        if let Some((column, ..)) = self.geometry
            && self.fields.iter().any(|field| field.name == column)
        {
            return Err(Error::CreateVectorTable(format!(
                "Field '{column}' clashes with the geometry column"
            )));
        }
        Ok(())
    }

    /// `CREATE COLUMN TABLE` statement
    ///
    /// A field named like the primary key becomes the key; otherwise a
    /// `BIGINT` identity column is added in front.
    pub fn create_table_sql(&self) -> Result<String> {
        self.validate()?;

        let mut columns = Vec::with_capacity(self.fields.len() + 2);
        if !self.fields.iter().any(|field| field.name == self.primary_key) {
            columns.push(format!(
                "{} BIGINT GENERATED BY DEFAULT AS IDENTITY",
                quoted_identifier(self.primary_key)
            ));
        }
        columns.extend(
            self.fields
                .iter()
                .map(|field| format!("{} {}", quoted_identifier(&field.name), column_type(field))),
        );
        if let Some((column, wkb_type, srid)) = self.geometry {
            columns.push(format!(
                "{} {}",
                quoted_identifier(column),
                geometry_type(wkb_type, srid)
            ));
        }
        columns.push(format!("PRIMARY KEY ({})", quoted_identifier(self.primary_key)));

        Ok(format!(
            "CREATE COLUMN TABLE {} ({})",
            qualified_name(self.schema, self.name),
            columns.join(", ")
        ))
    }

    /// `COMMENT ON COLUMN` statements for fields carrying a comment.
    pub fn comment_sql(&self) -> Vec<String> {
        let table = qualified_name(self.schema, self.name);
        self.fields
            .iter()
            .filter(|field| !field.comment.is_empty())
            .map(|field| {
                format!(
                    "COMMENT ON COLUMN {table}.{} IS {}",
                    quoted_identifier(&field.name),
                    quoted_string(&field.comment)
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout<'a>(fields: &'a [Field], geometry: Option<(&'a str, WkbType, Option<i32>)>) -> TableLayout<'a> {
        TableLayout {
            schema: "GIS",
            name: "ROADS",
            fields,
            primary_key: "id",
            geometry,
        }
    }

    #[test]
    fn test_column_types() {
        assert_eq!(column_type(&Field::new("a", FieldType::Bool)), "BOOLEAN");
        assert_eq!(column_type(&Field::new("a", FieldType::LongLong)), "BIGINT");
        assert_eq!(column_type(&Field::new("a", FieldType::String).with_length(80)), "NVARCHAR(80)");
        assert_eq!(column_type(&Field::new("a", FieldType::String)), "NCLOB");
        assert_eq!(
            column_type(&Field::new("a", FieldType::Decimal).with_length(12).with_precision(3)),
            "DECIMAL(12,3)"
        );
        assert_eq!(
            column_type(&Field::new("a", FieldType::Decimal).with_length(50).with_precision(45)),
            "DECIMAL(38,38)"
        );
        assert_eq!(column_type(&Field::new("a", FieldType::Decimal)), "DECIMAL");
        assert_eq!(column_type(&Field::new("a", FieldType::Binary).with_length(16)), "VARBINARY(16)");
        assert_eq!(column_type(&Field::new("a", FieldType::DateTime)), "TIMESTAMP");
    }

    #[test]
    fn test_create_spatial_table() {
        let fields = [Field::new("name", FieldType::String).with_length(100)];
        let sql = layout(&fields, Some(("geom", WkbType::LineString, Some(4326))))
            .create_table_sql()
            .unwrap();
        assert_eq!(
            sql,
            "CREATE COLUMN TABLE \"GIS\".\"ROADS\" (\"id\" BIGINT GENERATED BY DEFAULT AS IDENTITY, \
             \"name\" NVARCHAR(100), \"geom\" ST_GEOMETRY(4326), PRIMARY KEY (\"id\"))"
        );
    }

    #[test]
    fn test_point_without_srid() {
        let sql = layout(&[], Some(("shape", WkbType::Point, None)))
            .create_table_sql()
            .unwrap();
        assert!(sql.contains("\"shape\" ST_POINT,"));
    }

    #[test]
    fn test_existing_field_used_as_key() {
        let fields = [Field::new("id", FieldType::Int), Field::new("label", FieldType::String).with_length(10)];
        let sql = layout(&fields, None).create_table_sql().unwrap();
        assert_eq!(
            sql,
            "CREATE COLUMN TABLE \"GIS\".\"ROADS\" (\"id\" INTEGER, \"label\" NVARCHAR(10), PRIMARY KEY (\"id\"))"
        );
    }

    #[test]
    fn test_geometry_column_clash() {
        let fields = [Field::new("geom", FieldType::String)];
        let err = layout(&fields, Some(("geom", WkbType::Polygon, None)))
            .create_table_sql()
            .unwrap_err();
        assert!(matches!(err, Error::CreateVectorTable(_)));
    }

    #[test]
    fn test_invalid_column_name() {
        let fields = [Field::new("", FieldType::Int)];
        assert!(layout(&fields, None).create_table_sql().is_err());
    }

    #[test]
    fn test_comments() {
        let mut described = Field::new("name", FieldType::String);
        described.comment = "Street's name".into();
        let fields = [described, Field::new("lanes", FieldType::Int)];
        assert_eq!(
            layout(&fields, None).comment_sql(),
            vec!["COMMENT ON COLUMN \"GIS\".\"ROADS\".\"name\" IS 'Street''s name'".to_string()]
        );
    }
}
