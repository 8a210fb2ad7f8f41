use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::str::FromStr;

/// Category of mentor, each with its own visibility toggle and scheduling rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MentorType {
    FounderMentor,
    Expert,
    Coach,
}

impl MentorType {
    pub fn all() -> &'static [MentorType] {
        &[MentorType::FounderMentor, MentorType::Expert, MentorType::Coach]
    }

    pub fn code(&self) -> &'static str {
        match self {
            MentorType::FounderMentor => "founder_mentor",
            MentorType::Expert => "expert",
            MentorType::Coach => "coach",
        }
    }
}

impl Display for MentorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for MentorType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "founder_mentor" => Ok(MentorType::FounderMentor),
            "expert" => Ok(MentorType::Expert),
            "coach" => Ok(MentorType::Coach),
            _ => Err(format!("Unknown mentor type: {}", s)),
        }
    }
}
