//! Query builder helper functions.

use crate::{QuarryError, Result};
use unicode_normalization::UnicodeNormalization;

/// Longest identifier part accepted, in bytes.
const MAX_IDENTIFIER_LEN: usize = 63;

const SQL_KEYWORDS: &[&str] = &[
    "select", "insert", "update", "delete", "drop", "create", "alter",
    "truncate", "grant", "revoke", "exec", "execute", "union", "declare",
    "table", "index", "view", "schema", "database", "user", "role",
    "from", "where", "join", "inner", "outer", "left", "right",
    "on", "using", "and", "or", "not", "in", "exists", "between",
    "like", "ilike", "is", "null", "true", "false", "case", "when",
    "then", "else", "end", "as", "order", "by", "group", "having",
    "limit", "offset", "distinct", "all", "any", "some",
];

/// Validates a table name.
///
/// Supports both simple identifiers and schema-qualified names (e.g., "public.users").
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(QuarryError::InvalidIdentifier("Identifier cannot be empty".to_string()));
    }

    if name.contains('.') {
        let parts: Vec<&str> = name.split('.').collect();

        // Only allow schema.table format (two parts)
        if parts.len() != 2 {
            return Err(QuarryError::InvalidIdentifier(format!(
                "Invalid schema-qualified identifier '{}': must be in format 'schema.table'",
                name
            )));
        }

        for part in parts {
            validate_identifier_part(part)?;
        }

        return Ok(());
    }

    validate_identifier_part(name)
}

/// Validates a single part of an identifier (no dots allowed).
///
/// Used for aliases and column names.
pub fn validate_identifier_part(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(QuarryError::InvalidIdentifier("Identifier part cannot be empty".to_string()));
    }

    // Normalize to NFKC to prevent Unicode confusables
    let name = name.nfkc().collect::<String>();

    if name.len() > MAX_IDENTIFIER_LEN {
        return Err(QuarryError::InvalidIdentifier(format!(
            "Identifier '{}' exceeds maximum length of {}",
            name, MAX_IDENTIFIER_LEN
        )));
    }

    let first_char = name.chars().next().ok_or_else(|| {
        QuarryError::InvalidIdentifier(format!("Identifier '{}' is empty or invalid", name))
    })?;
    if !first_char.is_ascii_alphabetic() && first_char != '_' {
        return Err(QuarryError::InvalidIdentifier(format!(
            "Identifier '{}' must start with a letter or underscore",
            name
        )));
    }

    for ch in name.chars() {
        if !ch.is_ascii_alphanumeric() && ch != '_' {
            return Err(QuarryError::InvalidIdentifier(format!(
                "Identifier '{}' contains invalid character '{}'",
                name, ch
            )));
        }
    }

    if SQL_KEYWORDS.contains(&name.to_lowercase().as_str()) {
        return Err(QuarryError::InvalidIdentifier(format!(
            "Identifier '{}' is a reserved SQL keyword",
            name
        )));
    }

    Ok(())
}

/// Normalizes an optional alias: empty means "no alias", anything else must
/// be a valid identifier part.
pub fn normalize_alias(alias: Option<&str>) -> Result<Option<String>> {
    match alias {
        None | Some("") => Ok(None),
        Some(a) => {
            validate_identifier_part(a)?;
            Ok(Some(a.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_identifier_valid() {
        assert!(validate_identifier("users").is_ok());
        assert!(validate_identifier("user_table").is_ok());
        assert!(validate_identifier("_private").is_ok());
        assert!(validate_identifier("table123").is_ok());
        assert!(validate_identifier("public.person").is_ok());
    }

    #[test]
    fn test_validate_identifier_invalid() {
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("123table").is_err());
        assert!(validate_identifier("user-table").is_err());
        assert!(validate_identifier("user$table").is_err());
        assert!(validate_identifier("select").is_err());
        assert!(validate_identifier("DELETE").is_err());
        assert!(validate_identifier("a.b.c").is_err());
        assert!(validate_identifier(".table").is_err());
        assert!(validate_identifier(&"a".repeat(64)).is_err());
    }

    #[test]
    fn test_validate_identifier_part_rejects_dots() {
        assert!(validate_identifier_part("p").is_ok());
        assert!(validate_identifier_part("public.person").is_err());
    }

    #[test]
    fn test_normalize_alias() {
        assert_eq!(normalize_alias(None).unwrap(), None);
        assert_eq!(normalize_alias(Some("")).unwrap(), None);
        assert_eq!(normalize_alias(Some("p")).unwrap(), Some("p".to_string()));
        assert!(matches!(
            normalize_alias(Some("on")),
            Err(QuarryError::InvalidIdentifier(_))
        ));
    }
}
