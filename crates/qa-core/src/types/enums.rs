use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Ceo,
    TechnicalDirector,
    #[serde(alias = "firm")]
    MemberFirm,
    Reviewer,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Ceo => "ceo",
            Self::TechnicalDirector => "technical_director",
            Self::MemberFirm => "member_firm",
            Self::Reviewer => "reviewer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two parties whose consent moves a review out of acceptance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AcceptanceParty {
    Reviewer,
    Firm,
}

impl AcceptanceParty {
    pub fn from_role(role: Role) -> Option<Self> {
        match role {
            Role::Reviewer => Some(Self::Reviewer),
            Role::MemberFirm => Some(Self::Firm),
            Role::Admin | Role::Ceo | Role::TechnicalDirector => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReviewType {
    Normal,
    Reduce,
    Quick,
}

impl ReviewType {
    /// Canonical number of review hours budgeted for this type.
    pub fn hours(self) -> u32 {
        match self {
            Self::Normal => 40,
            Self::Reduce => 24,
            Self::Quick => 16,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReviewMode {
    Remote,
    Onsite,
    Other,
}

/// Ordinal review grade, "1" (best) through "5" (poor).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
pub enum Grade {
    #[serde(rename = "1")]
    One,
    #[serde(rename = "2")]
    Two,
    #[serde(rename = "3")]
    Three,
    #[serde(rename = "4")]
    Four,
    #[serde(rename = "5")]
    Five,
}

impl Grade {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::One => "1",
            Self::Two => "2",
            Self::Three => "3",
            Self::Four => "4",
            Self::Five => "5",
        }
    }

    /// Distance between two grades on the 1..5 scale.
    pub fn distance(self, other: Self) -> u8 {
        (self as u8).abs_diff(other as u8)
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Grade {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1" => Ok(Self::One),
            "2" => Ok(Self::Two),
            "3" => Ok(Self::Three),
            "4" => Ok(Self::Four),
            "5" => Ok(Self::Five),
            other => Err(format!("grade must be one of 1..5, got {other:?}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AgreementLevel {
    Full,
    Partial,
    Disagree,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DocumentCategory {
    Original,
    Reviewed,
    Supporting,
    Final,
    Correspondence,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grades_serialize_as_digit_strings() {
        assert_eq!(serde_json::to_string(&Grade::Two).unwrap(), "\"2\"");
        let parsed: Grade = serde_json::from_str("\"5\"").unwrap();
        assert_eq!(parsed, Grade::Five);
        assert!(serde_json::from_str::<Grade>("\"A\"").is_err());
    }

    #[test]
    fn grade_parsing_and_distance() {
        assert_eq!(" 3 ".parse::<Grade>(), Ok(Grade::Three));
        assert!("6".parse::<Grade>().is_err());
        assert_eq!(Grade::One.distance(Grade::Four), 3);
        assert!(Grade::One < Grade::Five);
    }

    #[test]
    fn only_reviewer_and_firm_roles_are_parties() {
        assert_eq!(
            AcceptanceParty::from_role(Role::Reviewer),
            Some(AcceptanceParty::Reviewer)
        );
        assert_eq!(
            AcceptanceParty::from_role(Role::MemberFirm),
            Some(AcceptanceParty::Firm)
        );
        assert_eq!(AcceptanceParty::from_role(Role::Ceo), None);
    }
}
