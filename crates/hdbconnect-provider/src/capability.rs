//! Connection capabilities
//!
//! A capability gates one family of provider operations. The set a connection
//! offers is derived from the privileges HANA reports for the current user.

use std::fmt;

/// Single provider capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    CreateVectorTable,
    DropVectorTable,
    RenameVectorTable,
    ExecuteSql,
    SqlLayers,
    Spatial,
    CreateSchema,
    DropSchema,
    RenameSchema,
    Schemas,
    Tables,
    TableExists,
}

impl Capability {
    pub const ALL: [Self; 12] = [
        Self::CreateVectorTable,
        Self::DropVectorTable,
        Self::RenameVectorTable,
        Self::ExecuteSql,
        Self::SqlLayers,
        Self::Spatial,
        Self::CreateSchema,
        Self::DropSchema,
        Self::RenameSchema,
        Self::Schemas,
        Self::Tables,
        Self::TableExists,
    ];

    const fn bit(self) -> u32 {
        1 << self as u32
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CreateVectorTable => "CreateVectorTable",
            Self::DropVectorTable => "DropVectorTable",
            Self::RenameVectorTable => "RenameVectorTable",
            Self::ExecuteSql => "ExecuteSql",
            Self::SqlLayers => "SqlLayers",
            Self::Spatial => "Spatial",
            Self::CreateSchema => "CreateSchema",
            Self::DropSchema => "DropSchema",
            Self::RenameSchema => "RenameSchema",
            Self::Schemas => "Schemas",
            Self::Tables => "Tables",
            Self::TableExists => "TableExists",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of capabilities
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities(u32);

impl Capabilities {
    /// Capabilities every HANA user has. Statements may still fail on
    /// individual objects the user cannot access.
    pub const BASE: Self = Self::empty()
        .with(Capability::CreateVectorTable)
        .with(Capability::DropVectorTable)
        .with(Capability::RenameVectorTable)
        .with(Capability::ExecuteSql)
        .with(Capability::SqlLayers)
        .with(Capability::Spatial);

    /// Granted by the `CREATE SCHEMA` system privilege.
    pub const SCHEMA_DDL: Self = Self::empty()
        .with(Capability::CreateSchema)
        .with(Capability::DropSchema)
        .with(Capability::RenameSchema);

    /// Granted by catalog read access.
    pub const CATALOG: Self = Self::empty()
        .with(Capability::Schemas)
        .with(Capability::Tables)
        .with(Capability::TableExists);

    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    #[must_use]
    pub const fn all() -> Self {
        Self::BASE.union(Self::SCHEMA_DDL).union(Self::CATALOG)
    }

    #[must_use]
    pub const fn with(self, capability: Capability) -> Self {
        Self(self.0 | capability.bit())
    }

    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn insert(&mut self, capability: Capability) {
        self.0 |= capability.bit();
    }

    #[must_use]
    pub const fn contains(&self, capability: Capability) -> bool {
        self.0 & capability.bit() != 0
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        Capability::ALL
            .into_iter()
            .filter(move |capability| self.contains(*capability))
    }

    /// Derive capabilities from rows of `PUBLIC.EFFECTIVE_PRIVILEGES`.
    ///
    /// The result always includes [`Self::BASE`].
    pub fn from_privileges<'a, I>(privileges: I) -> Self
    where
        I: IntoIterator<Item = &'a Privilege>,
    {
        let mut caps = Self::BASE;
        for privilege in privileges {
            caps = caps.union(privilege.grants());
        }
        caps
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl FromIterator<Capability> for Capabilities {
    fn from_iter<T: IntoIterator<Item = Capability>>(iter: T) -> Self {
        iter.into_iter().fold(Self::empty(), Self::with)
    }
}

/// Effective privilege of the current user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Privilege {
    pub object_type: String,
    pub privilege: String,
    pub schema_name: String,
    pub object_name: String,
}

impl Privilege {
    /// Capabilities this single privilege grants.
    #[must_use]
    pub fn grants(&self) -> Capabilities {
        match self.object_type.as_str() {
            "SYSTEMPRIVILEGE" => match self.privilege.as_str() {
                "CREATE SCHEMA" => Capabilities::SCHEMA_DDL,
                "CATALOG READ" | "DATA ADMIN" => Capabilities::CATALOG,
                _ => Capabilities::empty(),
            },
            "TABLE" | "VIEW" if self.privilege == "SELECT" => {
                if self.schema_name == "SYS" && self.object_name == "SCHEMAS" {
                    Capabilities::empty().with(Capability::Schemas)
                } else if self.object_name == "TABLE_COLUMNS" {
                    Capabilities::empty()
                        .with(Capability::Tables)
                        .with(Capability::TableExists)
                } else {
                    Capabilities::empty()
                }
            }
            _ => Capabilities::empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn privilege(object_type: &str, privilege: &str, schema: &str, object: &str) -> Privilege {
        Privilege {
            object_type: object_type.to_string(),
            privilege: privilege.to_string(),
            schema_name: schema.to_string(),
            object_name: object.to_string(),
        }
    }

    #[test]
    fn test_base_capabilities() {
        let caps = Capabilities::from_privileges(&[]);
        assert_eq!(caps, Capabilities::BASE);
        assert!(caps.contains(Capability::ExecuteSql));
        assert!(caps.contains(Capability::Spatial));
        assert!(!caps.contains(Capability::Schemas));
        assert!(!caps.contains(Capability::CreateSchema));
    }

    #[test]
    fn test_create_schema_privilege() {
        let rows = [privilege("SYSTEMPRIVILEGE", "CREATE SCHEMA", "", "")];
        let caps = Capabilities::from_privileges(&rows);
        assert!(caps.contains(Capability::CreateSchema));
        assert!(caps.contains(Capability::DropSchema));
        assert!(caps.contains(Capability::RenameSchema));
        assert!(!caps.contains(Capability::Tables));
    }

    #[test]
    fn test_catalog_read_and_data_admin() {
        for name in ["CATALOG READ", "DATA ADMIN"] {
            let rows = [privilege("SYSTEMPRIVILEGE", name, "", "")];
            let caps = Capabilities::from_privileges(&rows);
            assert!(caps.contains(Capability::Schemas));
            assert!(caps.contains(Capability::Tables));
            assert!(caps.contains(Capability::TableExists));
        }
    }

    #[test]
    fn test_select_on_sys_schemas() {
        let rows = [privilege("VIEW", "SELECT", "SYS", "SCHEMAS")];
        let caps = Capabilities::from_privileges(&rows);
        assert!(caps.contains(Capability::Schemas));
        assert!(!caps.contains(Capability::Tables));
    }

    #[test]
    fn test_select_on_table_columns_any_schema() {
        let rows = [privilege("TABLE", "SELECT", "PUBLIC", "TABLE_COLUMNS")];
        let caps = Capabilities::from_privileges(&rows);
        assert!(caps.contains(Capability::Tables));
        assert!(caps.contains(Capability::TableExists));
        assert!(!caps.contains(Capability::Schemas));
    }

    #[test]
    fn test_schemas_outside_sys_ignored() {
        let rows = [
            privilege("VIEW", "SELECT", "APP", "SCHEMAS"),
            privilege("VIEW", "INSERT", "SYS", "SCHEMAS"),
            privilege("SYSTEMPRIVILEGE", "USER ADMIN", "", ""),
        ];
        assert_eq!(Capabilities::from_privileges(&rows), Capabilities::BASE);
    }

    #[test]
    fn test_all_contains_everything() {
        let caps = Capabilities::all();
        assert_eq!(caps.iter().count(), Capability::ALL.len());
    }

    #[test]
    fn test_collect_and_debug() {
        let caps: Capabilities = [Capability::Tables, Capability::Schemas]
            .into_iter()
            .collect();
        let debug = format!("{caps:?}");
        assert!(debug.contains("Tables"));
        assert!(debug.contains("Schemas"));
        assert!(!caps.is_empty());
        assert!(Capabilities::empty().is_empty());
    }
}
