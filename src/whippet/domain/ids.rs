//! Identifier and validated scalar types for Whippet entities.

use super::WhippetDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Maximum tenant code length, matching `VARCHAR(64)`.
const MAX_TENANT_CODE_LENGTH: usize = 64;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an identifier from an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the wrapped UUID.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl AsRef<Uuid> for $name {
            fn as_ref(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(formatter, "{}", self.0)
            }
        }
    };
}

uuid_id!(
    /// Unique identifier for a tenant.
    TenantId
);
uuid_id!(
    /// Unique identifier for a tenant application.
    ApplicationId
);
uuid_id!(
    /// Unique identifier for a stored setting.
    SettingId
);
uuid_id!(
    /// Unique identifier for a tracked job.
    JobId
);

/// Validated tenant slug such as `acme-outdoor`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantCode(String);

impl TenantCode {
    /// Creates a validated tenant code.
    ///
    /// The value is trimmed and lowercased before validation.
    ///
    /// # Errors
    ///
    /// Returns [`WhippetDomainError::InvalidTenantCode`] when the value is
    /// empty, longer than 64 characters, contains characters other than
    /// `[a-z0-9-]`, or begins or ends with a dash.
    pub fn new(value: impl Into<String>) -> Result<Self, WhippetDomainError> {
        let raw = value.into();
        let normalized = raw.trim().to_ascii_lowercase();
        let is_valid = !normalized.is_empty()
            && normalized.len() <= MAX_TENANT_CODE_LENGTH
            && normalized
                .chars()
                .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-')
            && !normalized.starts_with('-')
            && !normalized.ends_with('-');

        if !is_valid {
            return Err(WhippetDomainError::InvalidTenantCode(raw));
        }
        Ok(Self(normalized))
    }

    /// Returns the code as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for TenantCode {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for TenantCode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}
