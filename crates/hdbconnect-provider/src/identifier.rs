//! SQL identifier and literal quoting for HANA statements

/// Maximum length for SQL identifiers (HANA limit is 127)
pub const MAX_IDENTIFIER_LENGTH: usize = 127;

/// Quote an identifier for HANA, doubling embedded double quotes.
///
/// Quoted identifiers are case sensitive, so names are passed through unchanged.
pub fn quoted_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Quote a string literal, doubling embedded single quotes.
pub fn quoted_string(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Schema-qualified object name: `"SCHEMA"."NAME"`.
pub fn qualified_name(schema: &str, name: &str) -> String {
    format!("{}.{}", quoted_identifier(schema), quoted_identifier(name))
}

/// Whether a name can be used as an identifier at all.
pub fn is_valid_identifier(name: &str) -> bool {
    !name.is_empty() && name.chars().count() <= MAX_IDENTIFIER_LENGTH && !name.contains('\0')
}
