use serde::Deserialize;

use crate::models::cv::{CvRecord, Education, Experience};

// Patch semantics for a single field:
// - Unset: omitted from the request, keep the stored value
// - Null: explicit null, clear the stored value
// - Value(v): replace with v (lists are replaced whole, never merged)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PatchField<T> {
    #[serde(skip)]
    Unset,
    Null,
    Value(T),
}

impl<T> Default for PatchField<T> {
    fn default() -> Self {
        PatchField::Unset
    }
}

impl<T> PatchField<T> {
    pub fn is_unset(&self) -> bool {
        matches!(self, PatchField::Unset)
    }

    pub fn as_value(&self) -> Option<&T> {
        if let PatchField::Value(v) = self {
            Some(v)
        } else {
            None
        }
    }

    fn apply_optional(self, slot: &mut Option<T>) {
        match self {
            PatchField::Unset => {}
            PatchField::Null => *slot = None,
            PatchField::Value(v) => *slot = Some(v),
        }
    }
}

impl<T> PatchField<Vec<T>> {
    fn apply_list(self, slot: &mut Vec<T>) {
        match self {
            PatchField::Unset => {}
            PatchField::Null => slot.clear(),
            PatchField::Value(v) => *slot = v,
        }
    }
}

/// Sparse update for a `CvRecord`. Identity and timestamps are not patchable.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CvPatch {
    pub full_name: PatchField<String>,
    pub email: PatchField<String>,
    pub phone: PatchField<String>,
    pub location: PatchField<String>,
    pub summary: PatchField<String>,
    pub experiences: PatchField<Vec<Experience>>,
    pub education: PatchField<Vec<Education>>,
    pub skills: PatchField<String>,
    pub certifications: PatchField<String>,
}

impl CvPatch {
    /// Shallow-merges this patch over `record`. Does not touch `updated_at`.
    pub fn apply_to(self, record: &mut CvRecord) {
        // Destructured so that a new record field fails to compile until handled here.
        let CvPatch {
            full_name,
            email,
            phone,
            location,
            summary,
            experiences,
            education,
            skills,
            certifications,
        } = self;

        full_name.apply_optional(&mut record.full_name);
        email.apply_optional(&mut record.email);
        phone.apply_optional(&mut record.phone);
        location.apply_optional(&mut record.location);
        summary.apply_optional(&mut record.summary);
        experiences.apply_list(&mut record.experiences);
        education.apply_list(&mut record.education);
        skills.apply_optional(&mut record.skills);
        certifications.apply_optional(&mut record.certifications);
    }
}
