use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The closed set of application roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Faculty,
    Staff,
    Student,
}

impl Role {
    /// Normalizes a raw role string from profile data into the closed enum.
    ///
    /// This is the single boundary where external role strings are ingested;
    /// anything unrecognized degrades to `Student`, never to an absent role.
    pub fn from_raw(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "admin" => Role::Admin,
            "faculty" => Role::Faculty,
            "staff" => Role::Staff,
            _ => Role::Student,
        }
    }

    /// The canonical lowercase name for this role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Faculty => "faculty",
            Role::Staff => "staff",
            Role::Student => "student",
        }
    }
}

/// A profile row joining an issuer principal to application identity.
#[derive(Debug, Clone)]
pub struct Profile {
    /// The issuer principal this profile belongs to.
    pub user_id: Uuid,
    /// The raw role string as stored; normalize with [`Role::from_raw`].
    pub role: String,
    /// The display name.
    pub name: String,
    /// The avatar image URL, if any.
    pub avatar_url: Option<String>,
}

/// Role-specific fields for a student principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentDetail {
    pub roll_no: String,
    pub semester: u8,
    pub year: Option<u8>,
    pub status: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Role-specific fields for a faculty principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacultyDetail {
    pub branch: Option<String>,
    /// The short uppercase code stamped on authored attendance periods.
    pub abbreviation: String,
    pub phone: Option<String>,
    pub status: Option<String>,
}

/// Role-specific detail merged into a resolved user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleDetail {
    None,
    Student(StudentDetail),
    Faculty(FacultyDetail),
}

/// The application-level principal: the issuer's identity enriched with
/// role and profile data.
///
/// `role` is always one of the four enumerated values; absence of profile
/// data degrades to `Student`, never to an unset role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedUser {
    /// The issuer-assigned principal id.
    pub id: Uuid,
    /// The principal's email address.
    pub email: String,
    /// The normalized application role.
    pub role: Role,
    /// The display name; falls back to the email when no profile exists.
    pub name: String,
    /// The avatar image URL, if any.
    pub avatar_url: Option<String>,
    /// Role-specific fields, when the role-detail lookup succeeded.
    pub detail: RoleDetail,
}

impl ResolvedUser {
    /// The degraded principal used when enrichment fails: base identity,
    /// default role, email as display name.
    pub fn fallback(id: Uuid, email: &str) -> Self {
        Self {
            id,
            email: email.to_string(),
            role: Role::Student,
            name: email.to_string(),
            avatar_url: None,
            detail: RoleDetail::None,
        }
    }

    /// The operator's faculty abbreviation, if this principal carries one.
    pub fn faculty_abbreviation(&self) -> Option<&str> {
        match &self.detail {
            RoleDetail::Faculty(detail) => Some(detail.abbreviation.as_str()),
            _ => None,
        }
    }
}

/// A roster entry for attendance-taking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Student {
    /// The student's record id.
    pub id: Uuid,
    /// The display name.
    pub name: String,
    /// The roll number shown in roster order.
    pub roll_no: String,
    /// The semester this student is enrolled in.
    pub semester: u8,
}
