use std::fmt;

use crate::error::{ModelError, Result};

/// Role assigned to a contact in the uploaded list.
///
/// Uploads are free-form, so role strings the platform does not know about
/// survive deserialization as [`ContactRole::Unrecognized`] instead of
/// failing the whole list. The classifier decides what to do with them.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ContactRole {
    #[default]
    Regular,
    Elevated,
    #[cfg_attr(feature = "serde", serde(other))]
    Unrecognized,
}

impl fmt::Display for ContactRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContactRole::Regular => write!(f, "regular"),
            ContactRole::Elevated => write!(f, "elevated"),
            ContactRole::Unrecognized => write!(f, "unrecognized"),
        }
    }
}

/// A single destination contact.
///
/// `identifier` is the canonical destination handle (fixed prefix plus
/// digits). Normalization happens upstream in the upload validation layer;
/// the model only refuses empty identifiers.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Contact {
    pub display_name: Option<String>,
    pub identifier: String,
    pub role: ContactRole,
}

impl Contact {
    pub fn new(
        display_name: Option<String>,
        identifier: impl Into<String>,
        role: ContactRole,
    ) -> Result<Self> {
        let identifier = identifier.into();
        if identifier.is_empty() {
            return Err(ModelError::EmptyIdentifier);
        }
        Ok(Self {
            display_name,
            identifier,
            role,
        })
    }

    /// Name shown in logs and search terms: display name when present,
    /// identifier otherwise.
    pub fn search_term(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.identifier)
    }
}
