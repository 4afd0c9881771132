use serde::{Deserialize, Serialize};

/// Identity record collected at the first wizard step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentInfo {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub major: String,
}

impl StudentInfo {
    /// Name as printed on the summary sheet: upper-cased last name, then first name.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.last_name.to_uppercase(), self.first_name)
    }
}

/// Partial edit of a `StudentInfo`. Fields left as `None` are untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudentPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub major: Option<String>,
}
