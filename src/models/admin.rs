//! Administrative level and release type vocabularies.

use serde::{Deserialize, Serialize};

/// geoBoundaries administrative level.
/// ADM0 is the country outline, ADM5 the finest subdivision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub enum AdmLevel {
    #[serde(rename = "ADM0")]
    Adm0,
    #[serde(rename = "ADM1")]
    Adm1,
    #[serde(rename = "ADM2")]
    Adm2,
    #[serde(rename = "ADM3")]
    Adm3,
    #[serde(rename = "ADM4")]
    Adm4,
    #[serde(rename = "ADM5")]
    Adm5,
}

impl AdmLevel {
    /// Parse a boundary type as written in meta.txt.
    ///
    /// Case and embedded spaces are ignored, so "adm 1" is ADM1.
    pub fn parse(value: &str) -> Option<Self> {
        let cleaned: String = value
            .chars()
            .filter(|c| *c != ' ')
            .collect::<String>()
            .to_uppercase();

        Self::all().iter().copied().find(|l| l.as_str() == cleaned)
    }

    /// Numeric depth of the level (0 for ADM0)
    pub fn depth(&self) -> u8 {
        match self {
            AdmLevel::Adm0 => 0,
            AdmLevel::Adm1 => 1,
            AdmLevel::Adm2 => 2,
            AdmLevel::Adm3 => 3,
            AdmLevel::Adm4 => 4,
            AdmLevel::Adm5 => 5,
        }
    }

    /// All levels, country first
    pub fn all() -> &'static [AdmLevel] {
        &[
            AdmLevel::Adm0,
            AdmLevel::Adm1,
            AdmLevel::Adm2,
            AdmLevel::Adm3,
            AdmLevel::Adm4,
            AdmLevel::Adm5,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AdmLevel::Adm0 => "ADM0",
            AdmLevel::Adm1 => "ADM1",
            AdmLevel::Adm2 => "ADM2",
            AdmLevel::Adm3 => "ADM3",
            AdmLevel::Adm4 => "ADM4",
            AdmLevel::Adm5 => "ADM5",
        }
    }
}

impl std::fmt::Display for AdmLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Release stream a submission is published under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReleaseType {
    GeoBoundaries,
    GbAuthoritative,
    GbHumanitarian,
    GbOpen,
    UnSalb,
    UnOcha,
}

impl ReleaseType {
    /// Parse a release type, ignoring case
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "geoboundaries" => Some(ReleaseType::GeoBoundaries),
            "gbauthoritative" => Some(ReleaseType::GbAuthoritative),
            "gbhumanitarian" => Some(ReleaseType::GbHumanitarian),
            "gbopen" => Some(ReleaseType::GbOpen),
            "un_salb" => Some(ReleaseType::UnSalb),
            "un_ocha" => Some(ReleaseType::UnOcha),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReleaseType::GeoBoundaries => "geoBoundaries",
            ReleaseType::GbAuthoritative => "gbAuthoritative",
            ReleaseType::GbHumanitarian => "gbHumanitarian",
            ReleaseType::GbOpen => "gbOpen",
            ReleaseType::UnSalb => "UN_SALB",
            ReleaseType::UnOcha => "UN_OCHA",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adm_level_parse_ignores_case_and_spaces() {
        assert_eq!(AdmLevel::parse("ADM1"), Some(AdmLevel::Adm1));
        assert_eq!(AdmLevel::parse("adm 3"), Some(AdmLevel::Adm3));
        assert_eq!(AdmLevel::parse(" A D M 0 "), Some(AdmLevel::Adm0));
        assert_eq!(AdmLevel::parse("ADM6"), None);
        assert_eq!(AdmLevel::parse("region"), None);
    }

    #[test]
    fn test_adm_level_order() {
        assert!(AdmLevel::Adm0 < AdmLevel::Adm5);
        assert_eq!(AdmLevel::Adm4.depth(), 4);
    }

    #[test]
    fn test_release_type_parse() {
        assert_eq!(ReleaseType::parse("gbOpen"), Some(ReleaseType::GbOpen));
        assert_eq!(ReleaseType::parse("UN_OCHA"), Some(ReleaseType::UnOcha));
        assert_eq!(ReleaseType::parse("gbClosed"), None);
    }
}
