//! Combat-ready character records shared by both peers

use serde::{Deserialize, Serialize};

/// Class label derived from a profile; selects the special ability formula
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ClassTag {
    FrontendWarrior,
    BackendMage,
    DevOpsPaladin,
    FullStackSorcerer,
    Novice,
}

impl ClassTag {
    /// Parse a display label like "Backend Mage".
    ///
    /// Unknown labels map to [`ClassTag::Novice`], which takes the default
    /// special ability branch.
    pub fn parse(s: &str) -> Self {
        match s {
            "Frontend Warrior" => ClassTag::FrontendWarrior,
            "Backend Mage" => ClassTag::BackendMage,
            "DevOps Paladin" => ClassTag::DevOpsPaladin,
            "Full Stack Sorcerer" => ClassTag::FullStackSorcerer,
            _ => ClassTag::Novice,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ClassTag::FrontendWarrior => "Frontend Warrior",
            ClassTag::BackendMage => "Backend Mage",
            ClassTag::DevOpsPaladin => "DevOps Paladin",
            ClassTag::FullStackSorcerer => "Full Stack Sorcerer",
            ClassTag::Novice => "Novice Adventurer",
        }
    }
}

impl From<String> for ClassTag {
    fn from(s: String) -> Self {
        ClassTag::parse(&s)
    }
}

impl From<ClassTag> for String {
    fn from(tag: ClassTag) -> Self {
        tag.as_str().to_string()
    }
}

impl std::fmt::Display for ClassTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Base combat stats (all positive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub hp: u32,
    pub attack: u32,
    pub defense: u32,
    pub speed: u32,
}

/// A fighter, immutable once a battle starts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    pub username: String,
    pub avatar_url: String,
    pub class_tag: ClassTag,
    pub stats: Stats,
}

impl Character {
    pub fn new(
        username: impl Into<String>,
        avatar_url: impl Into<String>,
        class_tag: ClassTag,
        stats: Stats,
    ) -> Self {
        Self {
            username: username.into(),
            avatar_url: avatar_url.into(),
            class_tag,
            stats,
        }
    }
}
