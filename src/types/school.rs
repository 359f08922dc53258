use serde::{Deserialize, Serialize};

use super::{AssetReference, UploadedAsset};

/// Untrusted registration input as decoded by a transport.
#[derive(Clone, Debug, Default)]
pub struct SchoolSubmission {
    pub name: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub contact: Option<String>,
    pub image: Option<UploadedAsset>,
}

/// A submission that passed every validation rule.
///
/// Only [`crate::validation::validate`] builds one, so holding a value is
/// proof the fields are well formed. Text fields are trimmed.
#[derive(Clone, Debug)]
pub struct ValidatedSchool {
    pub(crate) name: String,
    pub(crate) email: String,
    pub(crate) address: String,
    pub(crate) city: String,
    pub(crate) state: String,
    pub(crate) contact: String,
    pub(crate) image: UploadedAsset,
}

impl ValidatedSchool {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn contact(&self) -> &str {
        &self.contact
    }

    pub fn image(&self) -> &UploadedAsset {
        &self.image
    }

    /// Splits the record into its fields and the owned upload.
    pub fn into_parts(self) -> (NewSchool, UploadedAsset) {
        let fields = NewSchool {
            name: self.name,
            email: self.email,
            address: self.address,
            city: self.city,
            state: self.state,
            contact: self.contact,
        };
        (fields, self.image)
    }
}

/// Structured columns of a school about to be inserted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewSchool {
    pub name: String,
    pub email: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub contact: String,
}

impl NewSchool {
    pub fn into_record(self, id: i64, image: AssetReference) -> SchoolRecord {
        SchoolRecord {
            id,
            name: self.name,
            email: self.email,
            address: self.address,
            city: self.city,
            state: self.state,
            contact: self.contact,
            image,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchoolRecord {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub contact: String,
    pub image: AssetReference,
}

/// Listing projection of a [`SchoolRecord`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchoolSummary {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub city: String,
    pub image: AssetReference,
}
