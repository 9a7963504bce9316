//! Tenant id validation and tenant-to-schema resolution.
//!
//! Every identifier that ends up spliced into SQL text goes through
//! [`quote_ident`]. Values never do; they are bound as parameters.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Schema used when no tenant identity is present.
pub const DEFAULT_SCHEMA: &str = "public";

/// Prefix of every tenant schema.
pub const TENANT_SCHEMA_PREFIX: &str = "schema_clinica_";

/// PostgreSQL truncates identifiers longer than 63 bytes.
const MAX_IDENT_LEN: usize = 63;

/// Longest tenant id whose schema name still fits in [`MAX_IDENT_LEN`].
pub const MAX_TENANT_ID_LEN: usize = MAX_IDENT_LEN - TENANT_SCHEMA_PREFIX.len();

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TenantResolutionError {
    #[error("tenant id is empty")]
    Empty,

    #[error("tenant id consists only of whitespace")]
    Blank,

    #[error("tenant id is longer than {max} characters")]
    TooLong { max: usize },

    #[error("tenant id contains unsupported character {0:?}")]
    InvalidCharacter(char),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    #[error("identifier is empty")]
    Empty,

    #[error("identifier is longer than {MAX_IDENT_LEN} bytes")]
    TooLong,

    #[error("identifier contains unsupported character {0:?}")]
    InvalidCharacter(char),
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'
}

/// Validate an identifier and return it double-quoted.
///
/// Only lowercase ASCII letters, digits and `_` are accepted, so the quoted
/// form never needs escaping and always matches the unquoted catalog name.
///
/// # Errors
/// Returns [`IdentifierError`] when the identifier is empty, too long or
/// contains a character outside the allowed set.
pub fn quote_ident(ident: &str) -> Result<String, IdentifierError> {
    if ident.is_empty() {
        return Err(IdentifierError::Empty);
    }
    if ident.len() > MAX_IDENT_LEN {
        return Err(IdentifierError::TooLong);
    }
    if let Some(bad) = ident.chars().find(|c| !is_ident_char(*c)) {
        return Err(IdentifierError::InvalidCharacter(bad));
    }
    Ok(format!("\"{ident}\""))
}

/// A validated tenant identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TenantId(String);

impl TenantId {
    /// # Errors
    /// Returns [`TenantResolutionError`] if `raw` is empty, whitespace-only,
    /// too long, or contains characters outside `[a-z0-9_]`.
    pub fn parse(raw: &str) -> Result<Self, TenantResolutionError> {
        if raw.is_empty() {
            return Err(TenantResolutionError::Empty);
        }
        if raw.trim().is_empty() {
            return Err(TenantResolutionError::Blank);
        }
        if raw.len() > MAX_TENANT_ID_LEN {
            return Err(TenantResolutionError::TooLong {
                max: MAX_TENANT_ID_LEN,
            });
        }
        if let Some(bad) = raw.chars().find(|c| !is_ident_char(*c)) {
            return Err(TenantResolutionError::InvalidCharacter(bad));
        }
        Ok(Self(raw.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn schema(&self) -> SchemaName {
        SchemaName(format!("{TENANT_SCHEMA_PREFIX}{}", self.0))
    }
}

impl TryFrom<String> for TenantId {
    type Error = TenantResolutionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TenantId> for String {
    fn from(value: TenantId) -> Self {
        value.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A physical schema name. Only obtainable from a validated [`TenantId`]
/// or as [`SchemaName::public`], so it is always a safe identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SchemaName(String);

impl SchemaName {
    #[must_use]
    pub fn public() -> Self {
        Self(DEFAULT_SCHEMA.to_owned())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_public(&self) -> bool {
        self.0 == DEFAULT_SCHEMA
    }

    /// The schema name as a double-quoted identifier.
    #[must_use]
    pub fn quoted(&self) -> String {
        format!("\"{}\"", self.0)
    }

    /// `"schema"."table"`.
    ///
    /// # Errors
    /// Returns [`IdentifierError`] if `table` is not a valid identifier.
    pub fn qualify(&self, table: &str) -> Result<String, IdentifierError> {
        Ok(format!("{}.{}", self.quoted(), quote_ident(table)?))
    }

    /// The session directive that routes unqualified names to this schema
    /// first and to the shared schema second.
    #[must_use]
    pub fn search_path_directive(&self) -> String {
        if self.is_public() {
            format!("SET search_path TO \"{DEFAULT_SCHEMA}\"")
        } else {
            format!("SET search_path TO {}, \"{DEFAULT_SCHEMA}\"", self.quoted())
        }
    }
}

impl fmt::Display for SchemaName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Map an optional tenant id to its schema.
///
/// Absent or empty ids resolve to `public`. Anything else must be a valid
/// tenant id; an invalid one is an error, never a fallback to `public`.
///
/// # Errors
/// Returns [`TenantResolutionError`] for non-empty ids that fail validation.
pub fn resolve_schema(tenant_id: Option<&str>) -> Result<SchemaName, TenantResolutionError> {
    match tenant_id {
        None | Some("") => Ok(SchemaName::public()),
        Some(raw) => TenantId::parse(raw).map(|t| t.schema()),
    }
}
