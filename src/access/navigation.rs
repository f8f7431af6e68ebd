use serde::Serialize;
use std::fmt;

use crate::survey::types::Role;

/// Dashboard sections a role can open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Section {
    Surveys,
    TakeSurvey,
    Users,
    Reports,
    Settings,
}

impl Section {
    pub fn title(&self) -> &'static str {
        match self {
            Self::Surveys => "Manage Surveys",
            Self::TakeSurvey => "Take Survey",
            Self::Users => "Manage Users",
            Self::Reports => "Reports",
            Self::Settings => "Profile Settings",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

pub fn sections_for(role: Role) -> &'static [Section] {
    match role {
        Role::Administrator => &[
            Section::Surveys,
            Section::Users,
            Section::Reports,
            Section::Settings,
        ],
        Role::SurveyCreator => &[Section::Surveys, Section::Reports, Section::Settings],
        Role::DataEntry => &[Section::TakeSurvey, Section::Settings],
    }
}
