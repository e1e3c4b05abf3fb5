use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    common::survey::SurveyStatus,
    db::survey::{NewSurvey, Question, QuestionOption, Survey},
    mongodb::Id,
};

use super::id::ApiId;

pub const MAX_TITLE_LENGTH: usize = 200;
pub const MAX_QUESTIONS: usize = 10;
pub const MAX_QUESTION_LENGTH: usize = 500;
pub const MAX_OPTIONS: usize = 5;
pub const MAX_OPTION_LENGTH: usize = 200;

/// A survey specification: the coordinator-supplied structure, used for
/// both creation and full replacement.
#[derive(Debug, Serialize, Deserialize)]
pub struct SurveySpec {
    /// Survey title.
    pub title: String,
    /// Question specifications, in display order.
    pub questions: Vec<QuestionSpec>,
}

impl SurveySpec {
    /// Check the shape constraints: title 1-200 chars, 1-10 questions of
    /// 1-500 chars, each with 1-5 options of 1-200 chars.
    pub fn validate(&self) -> Result<(), String> {
        check_text("title", &self.title, MAX_TITLE_LENGTH)?;
        if self.questions.is_empty() || self.questions.len() > MAX_QUESTIONS {
            return Err(format!("surveys must have 1 to {} questions", MAX_QUESTIONS));
        }
        for question in &self.questions {
            check_text("question text", &question.text, MAX_QUESTION_LENGTH)?;
            if question.options.is_empty() || question.options.len() > MAX_OPTIONS {
                return Err(format!("questions must have 1 to {} options", MAX_OPTIONS));
            }
            for option in &question.options {
                check_text("option text", &option.text, MAX_OPTION_LENGTH)?;
            }
        }
        Ok(())
    }

    /// Convert this spec into a proper survey owned by the given coordinator,
    /// with fresh unique IDs throughout.
    pub fn into_survey(self, created_by: Id) -> NewSurvey {
        let (title, questions) = self.into_parts();
        NewSurvey::new(title, questions, created_by)
    }

    /// Split this spec into a title and fully-built questions, assigning
    /// sequential 1-based orders from the input order.
    pub fn into_parts(self) -> (String, Vec<Question>) {
        let questions = self
            .questions
            .into_iter()
            .enumerate()
            .map(|(i, question)| question.into_question(i as u32 + 1))
            .collect();
        (self.title, questions)
    }
}

fn check_text(what: &str, text: &str, max: usize) -> Result<(), String> {
    if text.is_empty() {
        Err(format!("{} must not be empty", what))
    } else if text.chars().count() > max {
        Err(format!("{} must be at most {} characters", what, max))
    } else {
        Ok(())
    }
}

/// A question specification.
#[derive(Debug, Serialize, Deserialize)]
pub struct QuestionSpec {
    /// Question text.
    pub text: String,
    /// Option specifications, in display order.
    pub options: Vec<OptionSpec>,
}

impl QuestionSpec {
    /// Convert this spec into a question at the given 1-based position.
    pub fn into_question(self, order: u32) -> Question {
        Question {
            id: Id::new(),
            text: self.text,
            order,
            options: self
                .options
                .into_iter()
                .enumerate()
                .map(|(j, option)| QuestionOption {
                    id: Id::new(),
                    text: option.text,
                    order: j as u32 + 1,
                })
                .collect(),
        }
    }
}

/// An option specification.
#[derive(Debug, Serialize, Deserialize)]
pub struct OptionSpec {
    /// Option text.
    pub text: String,
}

/// A summary of a survey, as returned by the listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveySummary {
    /// Survey unique ID.
    pub id: ApiId,
    /// Survey title.
    pub title: String,
    /// Lifecycle state.
    pub status: SurveyStatus,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Time of the last structural or status change.
    pub updated_at: DateTime<Utc>,
}

impl From<Survey> for SurveySummary {
    fn from(survey: Survey) -> Self {
        Self {
            id: survey.id.into(),
            title: survey.survey.metadata.title,
            status: survey.survey.metadata.status,
            created_at: survey.survey.metadata.created_at,
            updated_at: survey.survey.metadata.updated_at,
        }
    }
}

/// A full survey description with its ordered questions and options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveyDescription {
    /// Survey unique ID.
    pub id: ApiId,
    /// Survey title.
    pub title: String,
    /// Lifecycle state.
    pub status: SurveyStatus,
    /// The coordinator that created the survey.
    pub created_by: ApiId,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Time of the last structural or status change.
    pub updated_at: DateTime<Utc>,
    /// Questions in ascending order.
    pub questions: Vec<QuestionDescription>,
}

/// A question within a [`SurveyDescription`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionDescription {
    pub id: ApiId,
    pub text: String,
    pub order: u32,
    /// Options in ascending order.
    pub options: Vec<OptionDescription>,
}

/// An option within a [`QuestionDescription`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionDescription {
    pub id: ApiId,
    pub text: String,
    pub order: u32,
}

impl From<Survey> for SurveyDescription {
    fn from(survey: Survey) -> Self {
        Self {
            id: survey.id.into(),
            title: survey.survey.metadata.title,
            status: survey.survey.metadata.status,
            created_by: survey.survey.metadata.created_by.into(),
            created_at: survey.survey.metadata.created_at,
            updated_at: survey.survey.metadata.updated_at,
            questions: survey
                .survey
                .questions
                .into_iter()
                .map(|question| QuestionDescription {
                    id: question.id.into(),
                    text: question.text,
                    order: question.order,
                    options: question
                        .options
                        .into_iter()
                        .map(|option| OptionDescription {
                            id: option.id.into(),
                            text: option.text,
                            order: option.order,
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

/// The result of a status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveyStatusChange {
    pub id: ApiId,
    pub status: SurveyStatus,
}

/// Requested status change; only `OPEN` and `CLOSED` are accepted targets.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StatusRequest {
    pub status: SurveyStatus,
}

/// Confirmation of a deletion.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DeleteConfirmation {
    pub ok: bool,
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl SurveySpec {
        pub fn example() -> Self {
            Self {
                title: "Colors".to_string(),
                questions: vec![QuestionSpec::example()],
            }
        }
    }

    impl QuestionSpec {
        pub fn example() -> Self {
            Self {
                text: "Favorite?".to_string(),
                options: vec![
                    OptionSpec {
                        text: "Red".to_string(),
                    },
                    OptionSpec {
                        text: "Blue".to_string(),
                    },
                ],
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec_with(questions: usize, options: usize) -> SurveySpec {
        SurveySpec {
            title: "Colors".to_string(),
            questions: (0..questions)
                .map(|_| QuestionSpec {
                    text: "Favorite?".to_string(),
                    options: (0..options)
                        .map(|_| OptionSpec {
                            text: "Red".to_string(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    #[test]
    fn example_spec_is_valid() {
        assert!(SurveySpec::example().validate().is_ok());
    }

    #[test]
    fn title_bounds() {
        let mut spec = SurveySpec::example();
        spec.title = String::new();
        assert!(spec.validate().is_err());
        spec.title = "t".repeat(MAX_TITLE_LENGTH);
        assert!(spec.validate().is_ok());
        spec.title = "t".repeat(MAX_TITLE_LENGTH + 1);
        assert!(spec.validate().is_err());
    }

    #[test]
    fn question_count_bounds() {
        assert!(spec_with(0, 2).validate().is_err());
        assert!(spec_with(1, 2).validate().is_ok());
        assert!(spec_with(MAX_QUESTIONS, 2).validate().is_ok());
        assert!(spec_with(MAX_QUESTIONS + 1, 2).validate().is_err());
    }

    #[test]
    fn option_count_bounds() {
        assert!(spec_with(1, 0).validate().is_err());
        assert!(spec_with(1, 1).validate().is_ok());
        assert!(spec_with(1, MAX_OPTIONS).validate().is_ok());
        assert!(spec_with(1, MAX_OPTIONS + 1).validate().is_err());
    }

    #[test]
    fn text_length_bounds() {
        let mut spec = SurveySpec::example();
        spec.questions[0].text = "q".repeat(MAX_QUESTION_LENGTH + 1);
        assert!(spec.validate().is_err());

        let mut spec = SurveySpec::example();
        spec.questions[0].options[0].text = String::new();
        assert!(spec.validate().is_err());
        spec.questions[0].options[0].text = "o".repeat(MAX_OPTION_LENGTH + 1);
        assert!(spec.validate().is_err());
    }

    #[test]
    fn orders_are_sequential_and_one_based() {
        let spec = spec_with(3, 4);
        let (_, questions) = spec.into_parts();
        for (i, question) in questions.iter().enumerate() {
            assert_eq!(question.order, i as u32 + 1);
            for (j, option) in question.options.iter().enumerate() {
                assert_eq!(option.order, j as u32 + 1);
            }
        }
    }

    #[test]
    fn into_survey_preserves_input_order() {
        let spec = SurveySpec {
            title: "Colors".to_string(),
            questions: vec![
                QuestionSpec {
                    text: "First".to_string(),
                    options: vec![OptionSpec {
                        text: "A".to_string(),
                    }],
                },
                QuestionSpec {
                    text: "Second".to_string(),
                    options: vec![OptionSpec {
                        text: "B".to_string(),
                    }],
                },
            ],
        };
        let survey = spec.into_survey(Id::new());
        assert_eq!(survey.questions[0].text, "First");
        assert_eq!(survey.questions[1].text, "Second");
        assert_eq!(survey.metadata.status, SurveyStatus::Open);
    }
}
