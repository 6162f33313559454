use serde::{Deserialize, Serialize};

/// Which flavour of remote table we are talking to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Document,
    Relational,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Document => "document",
            SourceKind::Relational => "relational",
        }
    }

    /// Roles in priority order. The first one is the required primary role.
    pub fn roles(&self) -> &'static [Role] {
        match self {
            SourceKind::Document => &[
                Role::Group,
                Role::Assignee,
                Role::Progress,
                Role::Priority,
                Role::Notes,
            ],
            SourceKind::Relational => &[
                Role::Title,
                Role::Status,
                Role::Assignee,
                Role::Description,
                Role::DueDate,
            ],
        }
    }

    pub fn primary_role(&self) -> Role {
        self.roles()[0]
    }

    /// The role used to bucket rows (the "group" filter).
    pub fn group_role(&self) -> Role {
        match self {
            SourceKind::Document => Role::Group,
            SourceKind::Relational => Role::Status,
        }
    }

    /// The append-only free-text role written by note entries.
    pub fn notes_role(&self) -> Role {
        match self {
            SourceKind::Document => Role::Notes,
            SourceKind::Relational => Role::Description,
        }
    }
}

/// A semantic role a column can play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Group,
    Assignee,
    Progress,
    Priority,
    Notes,
    Title,
    Status,
    Description,
    DueDate,
}

impl Role {
    pub fn code(&self) -> &'static str {
        match self {
            Role::Group => "group",
            Role::Assignee => "assignee",
            Role::Progress => "progress",
            Role::Priority => "priority",
            Role::Notes => "notes",
            Role::Title => "title",
            Role::Status => "status",
            Role::Description => "description",
            Role::DueDate => "due_date",
        }
    }

    /// Helper: convert input code from CLI (lowercase or uppercase)
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_lowercase().replace('-', "_").as_str() {
            "group" => Some(Role::Group),
            "assignee" => Some(Role::Assignee),
            "progress" => Some(Role::Progress),
            "priority" => Some(Role::Priority),
            "notes" | "comments" => Some(Role::Notes),
            "title" => Some(Role::Title),
            "status" => Some(Role::Status),
            "description" => Some(Role::Description),
            "due_date" | "due" => Some(Role::DueDate),
            _ => None,
        }
    }
}
