//! Constants for the HANA provider connection

/// Key identifying this provider to the application
pub const PROVIDER_KEY: &str = "hana";

/// SQL query to check database connection health
pub const VALIDATION_QUERY: &str = "SELECT 1 FROM DUMMY";

/// Privileges of the current user, used to derive capabilities
pub const EFFECTIVE_PRIVILEGES_QUERY: &str = "SELECT OBJECT_TYPE, PRIVILEGE, SCHEMA_NAME, OBJECT_NAME FROM PUBLIC.EFFECTIVE_PRIVILEGES WHERE USER_NAME = CURRENT_USER AND IS_VALID = 'TRUE'";

/// Default geometry column name for new vector tables
pub const DEFAULT_GEOMETRY_COLUMN: &str = "geom";

/// Default primary key column name for new tables
pub const DEFAULT_PRIMARY_KEY: &str = "id";

/// Option key overriding the geometry column name
pub const OPTION_GEOMETRY_COLUMN: &str = "geometryColumn";

/// Option key overriding the primary key column name
pub const OPTION_PRIMARY_KEY: &str = "primaryKey";

/// SRID marking "no spatial reference"
pub const UNDEFINED_SRID: i32 = -1;
