use serde::{Deserialize, Serialize};

use super::Revision;

/// Whether a registrant was invited directly, or added as a side effect of
/// committee membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrantType {
    Direct,
    Committee,
}

/// An invited participant of a specific meeting ("Registrant").
/// Invariant: at most one registrant per `(meeting_uid, email)`, compared
/// case-insensitively (enforced by the repository layer, C4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registrant {
    pub uid: String,
    pub meeting_uid: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub username: Option<String>,
    pub host: bool,
    pub registrant_type: RegistrantType,
    pub committee_uid: Option<String>,
    pub org_name: Option<String>,
    pub job_title: Option<String>,
    pub revision: Revision,
}

impl Registrant {
    pub fn email_key(&self) -> String {
        self.email.to_ascii_lowercase()
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
