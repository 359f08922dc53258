mod asset;
mod school;

pub use asset::{AssetReference, UploadedAsset};
pub use school::{NewSchool, SchoolRecord, SchoolSubmission, SchoolSummary, ValidatedSchool};
