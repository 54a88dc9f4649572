use serde::{Deserialize, Serialize};

/// Owner record for plans and reports.
///
/// Authentication and credential storage are the surrounding application's
/// concern; the engine only needs a stable id and a by-email lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
}

impl User {
    pub fn new(id: impl Into<String>, email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            name: name.into(),
        }
    }
}
