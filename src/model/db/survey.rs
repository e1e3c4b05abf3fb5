use std::ops::{Deref, DerefMut};

use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::model::{common::survey::SurveyStatus, mongodb::Id};

/// A survey's top-level metadata, without its question structure.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct SurveyMetadata {
    /// Survey title.
    pub title: String,
    /// Lifecycle state.
    pub status: SurveyStatus,
    /// The coordinator that created the survey.
    pub created_by: Id,
    /// Creation time.
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    /// Time of the last structural or status change.
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

/// A single question, with its possible answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Question unique ID.
    pub id: Id,
    /// Question text.
    pub text: String,
    /// 1-based position within the survey.
    pub order: u32,
    /// Possible answers, in display order.
    pub options: Vec<QuestionOption>,
}

impl Question {
    /// Get the option with the given ID, if it exists.
    pub fn option(&self, option_id: Id) -> Option<&QuestionOption> {
        self.options.iter().find(|option| option.id == option_id)
    }
}

/// A single option of a single question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    /// Option unique ID.
    pub id: Id,
    /// Option text.
    pub text: String,
    /// 1-based position within the question.
    pub order: u32,
}

/// Core survey data, as stored in the database.
///
/// Questions and their options are embedded subdocuments, so a structural
/// replace is a single-document write and therefore atomic: concurrent
/// readers see either the fully-old or fully-new structure.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct SurveyCore {
    /// Top-level metadata.
    #[serde(flatten)]
    pub metadata: SurveyMetadata,
    /// Questions in display order.
    pub questions: Vec<Question>,
}

impl SurveyCore {
    /// Create a new survey. New surveys immediately accept responses.
    pub fn new(title: String, questions: Vec<Question>, created_by: Id) -> Self {
        let now = Utc::now();
        Self {
            metadata: SurveyMetadata {
                title,
                status: SurveyStatus::Open,
                created_by,
                created_at: now,
                updated_at: now,
            },
            questions,
        }
    }

    /// Get the question with the given ID, if it exists.
    pub fn question(&self, question_id: Id) -> Option<&Question> {
        self.questions
            .iter()
            .find(|question| question.id == question_id)
    }
}

/// A survey without an ID.
pub type NewSurvey = SurveyCore;

/// A survey from the database, with its unique ID.
#[derive(Debug, Serialize, Deserialize)]
pub struct Survey {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub survey: SurveyCore,
}

impl Deref for Survey {
    type Target = SurveyCore;

    fn deref(&self) -> &Self::Target {
        &self.survey
    }
}

impl DerefMut for Survey {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.survey
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl Question {
        pub fn example(text: &str, order: u32, options: &[&str]) -> Self {
            Self {
                id: Id::new(),
                text: text.to_string(),
                order,
                options: options
                    .iter()
                    .enumerate()
                    .map(|(i, text)| QuestionOption {
                        id: Id::new(),
                        text: text.to_string(),
                        order: i as u32 + 1,
                    })
                    .collect(),
            }
        }
    }

    impl SurveyCore {
        pub fn example() -> Self {
            Self::new(
                "Colors".to_string(),
                vec![Question::example("Favorite?", 1, &["Red", "Blue"])],
                Id::new(),
            )
        }
    }

    impl Survey {
        pub fn example() -> Self {
            Self {
                id: Id::new(),
                survey: SurveyCore::example(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_surveys_open_immediately() {
        let survey = SurveyCore::example();
        assert_eq!(survey.metadata.status, SurveyStatus::Open);
        assert_eq!(survey.metadata.created_at, survey.metadata.updated_at);
    }

    #[test]
    fn question_and_option_lookup() {
        let survey = SurveyCore::example();
        let question = &survey.questions[0];
        assert_eq!(survey.question(question.id).unwrap().text, "Favorite?");
        assert!(survey.question(Id::new()).is_none());

        let option = &question.options[0];
        assert_eq!(question.option(option.id).unwrap().text, "Red");
        assert!(question.option(Id::new()).is_none());
    }
}
