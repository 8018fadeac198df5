use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque CV identifier. Generated by the store, never reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CvId(String);

impl CvId {
    pub fn new(value: impl Into<String>) -> Self {
        CvId(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CvId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Experience {
    pub company: Option<String>,
    pub role: Option<String>,
    pub duration: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Education {
    pub institution: Option<String>,
    pub degree: Option<String>,
    pub year: Option<String>,
    pub gpa: Option<String>,
}

/// A stored CV document. Only `CvStore` constructs or mutates these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CvRecord {
    pub id: CvId,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub experiences: Vec<Experience>,
    #[serde(default)]
    pub education: Vec<Education>,
    #[serde(default)]
    pub skills: Option<String>,
    #[serde(default)]
    pub certifications: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Caller-supplied fields for a new CV, without identity or timestamps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CvDraft {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub summary: Option<String>,
    pub experiences: Vec<Experience>,
    pub education: Vec<Education>,
    pub skills: Option<String>,
    pub certifications: Option<String>,
}

impl CvRecord {
    /// Builds a fresh record from a draft. Both timestamps are `now`.
    pub fn from_draft(id: CvId, draft: CvDraft, now: DateTime<Utc>) -> Self {
        let CvDraft {
            full_name,
            email,
            phone,
            location,
            summary,
            experiences,
            education,
            skills,
            certifications,
        } = draft;

        CvRecord {
            id,
            full_name,
            email,
            phone,
            location,
            summary,
            experiences,
            education,
            skills,
            certifications,
            created_at: now,
            updated_at: now,
        }
    }
}
