use email_address::EmailAddress;
use serde::{Deserialize, Serialize};

use crate::cv::patch::CvPatch;
use crate::models::cv::{CvDraft, Education, Experience};

const MAX_SUMMARY_CHARS: usize = 5000;
const MAX_FIELD_CHARS: usize = 500;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Form-level checks applied before a draft reaches the store.
/// Collects every failure rather than stopping at the first.
pub fn validate_draft(draft: &CvDraft) -> Vec<FieldError> {
    let mut errors = Vec::new();

    match draft.full_name.as_deref() {
        Some(name) if !name.trim().is_empty() => {
            check_length(&mut errors, "fullName", name, MAX_FIELD_CHARS)
        }
        _ => errors.push(FieldError::new("fullName", "Full name is required")),
    }

    check_email(&mut errors, draft.email.as_deref());
    check_optional(&mut errors, "email", draft.email.as_deref(), MAX_FIELD_CHARS);
    check_optional(&mut errors, "phone", draft.phone.as_deref(), MAX_FIELD_CHARS);
    check_optional(&mut errors, "location", draft.location.as_deref(), MAX_FIELD_CHARS);
    check_optional(&mut errors, "summary", draft.summary.as_deref(), MAX_SUMMARY_CHARS);
    check_optional(&mut errors, "skills", draft.skills.as_deref(), MAX_FIELD_CHARS);
    check_optional(
        &mut errors,
        "certifications",
        draft.certifications.as_deref(),
        MAX_FIELD_CHARS,
    );
    check_experiences(&mut errors, &draft.experiences);
    check_education(&mut errors, &draft.education);

    errors
}

/// Same rules as `validate_draft`, applied only to the supplied fields.
pub fn validate_patch(patch: &CvPatch) -> Vec<FieldError> {
    let mut errors = Vec::new();

    if !patch.full_name.is_unset() {
        match patch.full_name.as_value() {
            Some(name) if !name.trim().is_empty() => {
                check_length(&mut errors, "fullName", name, MAX_FIELD_CHARS)
            }
            _ => errors.push(FieldError::new("fullName", "Full name cannot be cleared")),
        }
    }

    let email = patch.email.as_value().map(String::as_str);
    check_email(&mut errors, email);
    check_optional(&mut errors, "email", email, MAX_FIELD_CHARS);
    check_optional(
        &mut errors,
        "phone",
        patch.phone.as_value().map(String::as_str),
        MAX_FIELD_CHARS,
    );
    check_optional(
        &mut errors,
        "location",
        patch.location.as_value().map(String::as_str),
        MAX_FIELD_CHARS,
    );
    check_optional(
        &mut errors,
        "summary",
        patch.summary.as_value().map(String::as_str),
        MAX_SUMMARY_CHARS,
    );
    check_optional(
        &mut errors,
        "skills",
        patch.skills.as_value().map(String::as_str),
        MAX_FIELD_CHARS,
    );
    check_optional(
        &mut errors,
        "certifications",
        patch.certifications.as_value().map(String::as_str),
        MAX_FIELD_CHARS,
    );
    if let Some(experiences) = patch.experiences.as_value() {
        check_experiences(&mut errors, experiences);
    }
    if let Some(education) = patch.education.as_value() {
        check_education(&mut errors, education);
    }

    errors
}

/// Blank addresses are allowed; anything else must parse.
fn check_email(errors: &mut Vec<FieldError>, value: Option<&str>) {
    let Some(value) = value.map(str::trim) else { return };
    if !value.is_empty() && !EmailAddress::is_valid(value) {
        errors.push(FieldError::new("email", "Email address is not valid"));
    }
}

fn check_optional(
    errors: &mut Vec<FieldError>,
    field: &str,
    value: Option<&str>,
    limit: usize,
) {
    if let Some(value) = value {
        check_length(errors, field, value, limit);
    }
}

fn check_length(errors: &mut Vec<FieldError>, field: &str, value: &str, limit: usize) {
    if value.chars().count() > limit {
        errors.push(FieldError::new(
            field,
            format!("Must be at most {limit} characters"),
        ));
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

fn check_experiences(errors: &mut Vec<FieldError>, experiences: &[Experience]) {
    for (i, exp) in experiences.iter().enumerate() {
        if is_blank(&exp.company) {
            errors.push(FieldError::new(
                format!("experiences[{i}].company"),
                "Company is required",
            ));
        }
        if is_blank(&exp.role) {
            errors.push(FieldError::new(
                format!("experiences[{i}].role"),
                "Role is required",
            ));
        }
        let limits = [
            ("company", exp.company.as_deref(), MAX_FIELD_CHARS),
            ("role", exp.role.as_deref(), MAX_FIELD_CHARS),
            ("duration", exp.duration.as_deref(), MAX_FIELD_CHARS),
            ("description", exp.description.as_deref(), MAX_SUMMARY_CHARS),
        ];
        for (name, value, limit) in limits {
            check_optional(errors, &format!("experiences[{i}].{name}"), value, limit);
        }
    }
}

fn check_education(errors: &mut Vec<FieldError>, education: &[Education]) {
    for (i, edu) in education.iter().enumerate() {
        if is_blank(&edu.institution) {
            errors.push(FieldError::new(
                format!("education[{i}].institution"),
                "Institution is required",
            ));
        }
        let limits = [
            ("institution", edu.institution.as_deref()),
            ("degree", edu.degree.as_deref()),
            ("year", edu.year.as_deref()),
            ("gpa", edu.gpa.as_deref()),
        ];
        for (name, value) in limits {
            check_optional(
                errors,
                &format!("education[{i}].{name}"),
                value,
                MAX_FIELD_CHARS,
            );
        }
    }
}
