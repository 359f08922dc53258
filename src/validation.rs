//! Field rules applied to a [`SchoolSubmission`] before any side effect.
//!
//! Every rule is evaluated, so a rejected submission reports all of its
//! problems at once rather than the first one found.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;

use crate::assets::is_plain_file_name;
use crate::types::{SchoolSubmission, UploadedAsset, ValidatedSchool};

pub const MIN_TEXT_LEN: usize = 2;
pub const MIN_CONTACT_LEN: usize = 10;
pub const MAX_CONTACT_LEN: usize = 15;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$",
    )
    .expect("valid email regex")
});

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Name,
    Email,
    Address,
    City,
    State,
    Contact,
    Image,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Email => "email",
            Field::Address => "address",
            Field::City => "city",
            Field::State => "state",
            Field::Contact => "contact",
            Field::Image => "image",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One violated rule.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub field: Field,
    pub message: &'static str,
}

impl Violation {
    fn new(field: Field, message: &'static str) -> Self {
        Self { field, message }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("invalid submission: {}", render(.violations))]
pub struct ValidationErrors {
    violations: Vec<Violation>,
}

impl ValidationErrors {
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn has(&self, field: Field) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }
}

fn render(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| format!("{}: {}", v.field, v.message))
        .collect::<Vec<_>>()
        .join("; ")
}

pub fn validate(submission: SchoolSubmission) -> Result<ValidatedSchool, ValidationErrors> {
    let mut violations = Vec::new();

    let name = required_text(submission.name, Field::Name, "Name is required", &mut violations);
    let email = email(submission.email, &mut violations);
    let address = required_text(
        submission.address,
        Field::Address,
        "Address is required",
        &mut violations,
    );
    let city = required_text(submission.city, Field::City, "City is required", &mut violations);
    let state = required_text(
        submission.state,
        Field::State,
        "State is required",
        &mut violations,
    );
    let contact = contact(submission.contact, &mut violations);
    let image = image(submission.image, &mut violations);

    match (name, email, address, city, state, contact, image) {
        (
            Some(name),
            Some(email),
            Some(address),
            Some(city),
            Some(state),
            Some(contact),
            Some(image),
        ) if violations.is_empty() => Ok(ValidatedSchool {
            name,
            email,
            address,
            city,
            state,
            contact,
            image,
        }),
        _ => Err(ValidationErrors { violations }),
    }
}

pub fn is_valid_email(candidate: &str) -> bool {
    EMAIL_RE.is_match(candidate)
}

fn trimmed(value: Option<String>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}

fn required_text(
    value: Option<String>,
    field: Field,
    message: &'static str,
    violations: &mut Vec<Violation>,
) -> Option<String> {
    let value = trimmed(value);
    if value.chars().count() < MIN_TEXT_LEN {
        violations.push(Violation::new(field, message));
        return None;
    }
    Some(value)
}

fn email(value: Option<String>, violations: &mut Vec<Violation>) -> Option<String> {
    let value = trimmed(value);
    if !is_valid_email(&value) {
        violations.push(Violation::new(Field::Email, "Invalid email address"));
        return None;
    }
    Some(value)
}

fn contact(value: Option<String>, violations: &mut Vec<Violation>) -> Option<String> {
    let value = trimmed(value);
    let len = value.chars().count();
    if len < MIN_CONTACT_LEN {
        violations.push(Violation::new(Field::Contact, "Contact is required"));
        return None;
    }
    if len > MAX_CONTACT_LEN {
        violations.push(Violation::new(Field::Contact, "Contact too long"));
        return None;
    }
    Some(value)
}

fn image(value: Option<UploadedAsset>, violations: &mut Vec<Violation>) -> Option<UploadedAsset> {
    let asset = match value {
        Some(asset) if !asset.is_empty() && !asset.filename.trim().is_empty() => asset,
        _ => {
            violations.push(Violation::new(Field::Image, "Image is required"));
            return None;
        }
    };

    let mut ok = true;
    if !is_plain_file_name(&asset.filename) {
        violations.push(Violation::new(Field::Image, "Image filename is invalid"));
        ok = false;
    }
    if let Some(content_type) = asset.content_type.as_deref() {
        if !content_type.trim().to_ascii_lowercase().starts_with("image/") {
            violations.push(Violation::new(Field::Image, "Image must be an image file"));
            ok = false;
        }
    }
    ok.then_some(asset)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oak_hill() -> SchoolSubmission {
        SchoolSubmission {
            name: Some("Oak Hill".into()),
            email: Some("a@b.com".into()),
            address: Some("12 Elm".into()),
            city: Some("Springfield".into()),
            state: Some("IL".into()),
            contact: Some("5551234567".into()),
            image: Some(UploadedAsset::new("oak.jpg", vec![0xff, 0xd8, 0xff]).with_content_type("image/jpeg")),
        }
    }

    fn fields(err: &ValidationErrors) -> Vec<Field> {
        err.violations().iter().map(|v| v.field).collect()
    }

    #[test]
    fn accepts_well_formed_submission() {
        let school = validate(oak_hill()).expect("valid");
        assert_eq!(school.name(), "Oak Hill");
        assert_eq!(school.email(), "a@b.com");
        assert_eq!(school.contact(), "5551234567");
        assert_eq!(school.image().filename, "oak.jpg");
    }

    #[test]
    fn trims_surrounding_whitespace() {
        let mut submission = oak_hill();
        submission.name = Some("  Oak Hill \n".into());
        submission.email = Some(" a@b.com ".into());
        let school = validate(submission).expect("valid");
        assert_eq!(school.name(), "Oak Hill");
        assert_eq!(school.email(), "a@b.com");
    }

    #[test]
    fn rejects_missing_required_fields() {
        let mut submission = oak_hill();
        submission.name = None;
        submission.email = None;
        submission.image = None;

        let err = validate(submission).unwrap_err();
        assert_eq!(fields(&err), vec![Field::Name, Field::Email, Field::Image]);
    }

    #[test]
    fn collects_every_violation() {
        let err = validate(SchoolSubmission::default()).unwrap_err();
        assert_eq!(
            fields(&err),
            vec![
                Field::Name,
                Field::Email,
                Field::Address,
                Field::City,
                Field::State,
                Field::Contact,
                Field::Image
            ]
        );
    }

    #[test]
    fn whitespace_only_counts_as_missing() {
        let mut submission = oak_hill();
        submission.city = Some("   ".into());
        let err = validate(submission).unwrap_err();
        assert_eq!(err.violations(), &[Violation::new(Field::City, "City is required")]);
    }

    #[test]
    fn single_character_text_is_too_short() {
        let mut submission = oak_hill();
        submission.state = Some("I".into());
        let err = validate(submission).unwrap_err();
        assert!(err.has(Field::State));
    }

    #[test]
    fn short_contact_cites_contact_rule() {
        let mut submission = oak_hill();
        submission.contact = Some("123".into());
        let err = validate(submission).unwrap_err();
        assert_eq!(
            err.violations(),
            &[Violation::new(Field::Contact, "Contact is required")]
        );
        assert!(err.to_string().contains("contact: Contact is required"));
    }

    #[test]
    fn contact_length_bounds_are_inclusive() {
        for (contact, ok) in [
            ("123456789", false),
            ("1234567890", true),
            ("123456789012345", true),
            ("1234567890123456", false),
        ] {
            let mut submission = oak_hill();
            submission.contact = Some(contact.into());
            assert_eq!(validate(submission).is_ok(), ok, "contact {contact:?}");
        }
    }

    #[test]
    fn long_contact_reports_too_long() {
        let mut submission = oak_hill();
        submission.contact = Some("+1 555 123 4567 89".into());
        let err = validate(submission).unwrap_err();
        assert_eq!(err.violations()[0].message, "Contact too long");
    }

    #[test]
    fn email_grammar() {
        for good in ["a@b.com", "first.last+tag@mail.example.org", "x_y@sub-domain.io"] {
            assert!(is_valid_email(good), "{good}");
        }
        for bad in [
            "",
            "plain",
            "a@b",
            "@b.com",
            "a@.com",
            "a@b.",
            "a b@c.com",
            "a@@b.com",
            ".a@b.com",
            "a..b@c.com",
            "a@-b.com",
        ] {
            assert!(!is_valid_email(bad), "{bad}");
        }
    }

    #[test]
    fn rejects_empty_image_payload() {
        let mut submission = oak_hill();
        submission.image = Some(UploadedAsset::new("oak.jpg", Vec::new()));
        let err = validate(submission).unwrap_err();
        assert_eq!(err.violations(), &[Violation::new(Field::Image, "Image is required")]);
    }

    #[test]
    fn rejects_image_without_filename() {
        let mut submission = oak_hill();
        submission.image = Some(UploadedAsset::new("", vec![1, 2, 3]));
        assert!(validate(submission).unwrap_err().has(Field::Image));
    }

    #[test]
    fn rejects_path_like_image_filename() {
        for name in ["../oak.jpg", "dir/oak.jpg", "dir\\oak.jpg", ".."] {
            let mut submission = oak_hill();
            submission.image = Some(UploadedAsset::new(name, vec![1]));
            let err = validate(submission).unwrap_err();
            assert_eq!(
                err.violations(),
                &[Violation::new(Field::Image, "Image filename is invalid")],
                "{name}"
            );
        }
    }

    #[test]
    fn rejects_non_image_content_type() {
        let mut submission = oak_hill();
        submission.image =
            Some(UploadedAsset::new("notes.pdf", vec![1]).with_content_type("application/pdf"));
        let err = validate(submission).unwrap_err();
        assert_eq!(err.violations()[0].message, "Image must be an image file");
    }

    #[test]
    fn accepts_image_without_declared_content_type() {
        let mut submission = oak_hill();
        submission.image = Some(UploadedAsset::new("oak.jpg", vec![1]));
        assert!(validate(submission).is_ok());
    }
}
