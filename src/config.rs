/// Engine configuration
///
/// Everything that used to be a magic number or a hard-coded list: the
/// subject whitelist, fallback preferences, the chapter model and weights.
/// Loaded from camelCase JSON; every field is optional.

use crate::error::{RecommendError, Result};
use crate::intelligence::{ScoringWeights, SubjectWhitelist};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Subjects the catalog currently carries
pub const DEFAULT_KNOWN_SUBJECTS: [&str; 10] = [
    "Mathematics",
    "English",
    "Arabic",
    "Physics",
    "Chemistry",
    "Biology",
    "Geography",
    "History",
    "Science",
    "French",
];

/// Preferred subjects for a student with no solved history
pub const DEFAULT_FALLBACK_SUBJECTS: [&str; 2] = ["Mathematics", "English"];

pub const DEFAULT_LIMIT: i64 = 5;

/// Courses are modelled as this many chapters when mapping chapter -> progress
pub const DEFAULT_CHAPTERS_PER_COURSE: u32 = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RecommenderConfig {
    pub known_subjects: Vec<String>,
    pub fallback_subjects: Vec<String>,
    pub default_limit: i64,
    pub chapters_per_course: u32,
    pub weights: ScoringWeights,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            known_subjects: DEFAULT_KNOWN_SUBJECTS.iter().map(|s| s.to_string()).collect(),
            fallback_subjects: DEFAULT_FALLBACK_SUBJECTS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            default_limit: DEFAULT_LIMIT,
            chapters_per_course: DEFAULT_CHAPTERS_PER_COURSE,
            weights: ScoringWeights::default(),
        }
    }
}

impl RecommenderConfig {
    /// Load and validate a JSON config file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: RecommenderConfig = serde_json::from_str(&raw)?;
        config.validate()?;

        log::debug!(
            "Loaded config from {} ({} subjects)",
            path.as_ref().display(),
            config.known_subjects.len()
        );

        Ok(config)
    }

    /// Load the file if it exists, otherwise fall back to defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.weights.validate()?;

        if self.known_subjects.is_empty() {
            return Err(RecommendError::Config(
                "knownSubjects must list at least one subject".to_string(),
            ));
        }

        if self.fallback_subjects.is_empty() {
            return Err(RecommendError::Config(
                "fallbackSubjects must list at least one subject".to_string(),
            ));
        }

        if self.chapters_per_course == 0 {
            return Err(RecommendError::Config(
                "chaptersPerCourse must be at least 1".to_string(),
            ));
        }

        if self.default_limit < 0 {
            return Err(RecommendError::Config(format!(
                "defaultLimit must not be negative, got {}",
                self.default_limit
            )));
        }

        Ok(())
    }
}

impl SubjectWhitelist for RecommenderConfig {
    fn known_subjects(&self) -> &[String] {
        &self.known_subjects
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config_is_valid() {
        let config = RecommenderConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.default_limit, 5);
        assert_eq!(config.chapters_per_course, 10);
        assert!(config.is_known_subject("Geography"));
        assert!(!config.is_known_subject("Astrology"));
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"knownSubjects": ["Mathematics", "Astronomy"], "chaptersPerCourse": 12}}"#
        )
        .unwrap();

        let config = RecommenderConfig::load(file.path()).unwrap();
        assert_eq!(config.known_subjects.len(), 2);
        assert_eq!(config.chapters_per_course, 12);
        assert_eq!(config.default_limit, 5);
        assert_eq!(config.weights, ScoringWeights::default());
    }

    #[test]
    fn test_load_rejects_bad_weights() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"weights": {{"difficultyMatch": 0.9}}}}"#).unwrap();

        let err = RecommenderConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, RecommendError::Config(_)));
    }

    #[test]
    fn test_load_rejects_malformed_json() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = RecommenderConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, RecommendError::Serialization(_)));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = RecommenderConfig::load_or_default("/definitely/not/here.json").unwrap();
        assert_eq!(config, RecommenderConfig::default());
    }

    #[test]
    fn test_validate_rejects_zero_chapters() {
        let config = RecommenderConfig {
            chapters_per_course: 0,
            ..RecommenderConfig::default()
        };
        assert!(config.validate().is_err());

        let config = RecommenderConfig {
            known_subjects: vec![],
            ..RecommenderConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
