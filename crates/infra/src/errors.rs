//! Infra-level error aliases.

use idconsole_shared::ErrorEnvelope;

/// Infra-level error type (shared error envelope).
pub type InfraError = ErrorEnvelope;

/// Infra-level result type.
pub type InfraResult<T> = Result<T, InfraError>;
