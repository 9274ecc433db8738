// ABOUTME: Error types for Harvest including the ErrorCode enum and HarvestError struct.
// ABOUTME: Provides categorized errors with convenience constructors and boolean helpers.

use std::fmt;

/// Error codes representing the categories of harvest failures.
///
/// Absence (a selector or attribute that matched nothing) is never an error;
/// it flows through cleaning as `Value::Null` or an empty related sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidSource,
    RecordNotFound,
    Fetch,
    InvalidUrl,
    SettingDerivedField,
    ReadOnlyField,
    UnknownMember,
    Coercion,
    InvalidSchema,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::InvalidSource => "invalid source",
            ErrorCode::RecordNotFound => "record not found",
            ErrorCode::Fetch => "fetch error",
            ErrorCode::InvalidUrl => "invalid URL",
            ErrorCode::SettingDerivedField => "related records cannot be set",
            ErrorCode::ReadOnlyField => "field is read-only",
            ErrorCode::UnknownMember => "unknown member",
            ErrorCode::Coercion => "coercion failed",
            ErrorCode::InvalidSchema => "invalid schema",
        };
        write!(f, "{}", s)
    }
}

/// The main error type for harvest operations.
///
/// `target` names what the operation was working on: a URL for fetches,
/// `Schema.member` for record access, a schema name for lookups.
#[derive(Debug, thiserror::Error)]
pub struct HarvestError {
    pub code: ErrorCode,
    pub target: String,
    pub op: String,
    #[source]
    pub source: Option<anyhow::Error>,
}

impl fmt::Display for HarvestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "harvest: {} {}: {}", self.op, self.target, self.code)?;
        if let Some(ref src) = self.source {
            write!(f, ": {}", src)?;
        }
        Ok(())
    }
}

impl HarvestError {
    fn new(
        code: ErrorCode,
        target: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self {
            code,
            target: target.into(),
            op: op.into(),
            source,
        }
    }

    /// Create an InvalidSource error.
    pub fn invalid_source(
        target: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::new(ErrorCode::InvalidSource, target, op, source)
    }

    /// Create a RecordNotFound error for the named schema.
    pub fn record_not_found(schema: impl Into<String>, index: usize) -> Self {
        Self::new(
            ErrorCode::RecordNotFound,
            schema,
            "One",
            Some(anyhow::anyhow!("no match at index {}", index)),
        )
    }

    /// Create a Fetch error.
    pub fn fetch(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::new(ErrorCode::Fetch, url, op, source)
    }

    /// Create an InvalidUrl error.
    pub fn invalid_url(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::new(ErrorCode::InvalidUrl, url, op, source)
    }

    /// Create a SettingDerivedField error.
    pub fn setting_derived_field(member: impl Into<String>) -> Self {
        Self::new(ErrorCode::SettingDerivedField, member, "Set", None)
    }

    /// Create a ReadOnlyField error.
    pub fn read_only_field(member: impl Into<String>) -> Self {
        Self::new(ErrorCode::ReadOnlyField, member, "Set", None)
    }

    /// Create an UnknownMember error.
    pub fn unknown_member(member: impl Into<String>, op: impl Into<String>) -> Self {
        Self::new(ErrorCode::UnknownMember, member, op, None)
    }

    /// Wrap a failure raised by a user-supplied coercion or clean hook.
    pub fn coercion(member: impl Into<String>, source: anyhow::Error) -> Self {
        Self::new(ErrorCode::Coercion, member, "Clean", Some(source))
    }

    /// Create an InvalidSchema error.
    pub fn invalid_schema(
        schema: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::new(ErrorCode::InvalidSchema, schema, op, source)
    }

    /// Returns true if this is an InvalidSource error.
    pub fn is_invalid_source(&self) -> bool {
        self.code == ErrorCode::InvalidSource
    }

    /// Returns true if this is a RecordNotFound error.
    pub fn is_record_not_found(&self) -> bool {
        self.code == ErrorCode::RecordNotFound
    }

    /// Returns true if this is a Fetch error.
    pub fn is_fetch(&self) -> bool {
        self.code == ErrorCode::Fetch
    }

    /// Returns true if this is an InvalidUrl error.
    pub fn is_invalid_url(&self) -> bool {
        self.code == ErrorCode::InvalidUrl
    }

    /// Returns true if this is a SettingDerivedField error.
    pub fn is_setting_derived_field(&self) -> bool {
        self.code == ErrorCode::SettingDerivedField
    }

    /// Returns true if this is a Coercion error.
    pub fn is_coercion(&self) -> bool {
        self.code == ErrorCode::Coercion
    }

    /// Returns true if this is an InvalidSchema error.
    pub fn is_invalid_schema(&self) -> bool {
        self.code == ErrorCode::InvalidSchema
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, HarvestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_op_target_and_code() {
        let err = HarvestError::fetch(
            "http://localhost/links",
            "Fetch",
            Some(anyhow::anyhow!("HTTP status 500")),
        );
        assert_eq!(
            err.to_string(),
            "harvest: Fetch http://localhost/links: fetch error: HTTP status 500"
        );
        assert!(err.is_fetch());
        assert!(!err.is_record_not_found());
    }

    #[test]
    fn record_not_found_names_schema_and_index() {
        let err = HarvestError::record_not_found("Link", 3);
        assert!(err.is_record_not_found());
        assert_eq!(
            err.to_string(),
            "harvest: One Link: record not found: no match at index 3"
        );
    }

    #[test]
    fn coercion_keeps_source_chain() {
        let err = HarvestError::coercion("Link.count", anyhow::anyhow!("not a number"));
        assert!(err.is_coercion());
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("not a number"));
    }
}
