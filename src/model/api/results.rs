use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::{
    db::{response::Answer, survey::Survey},
    mongodb::Id,
};

use super::id::ApiId;

/// Aggregated results for a whole survey: every current question with every
/// current option and its answer count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveyResults {
    /// Survey unique ID.
    pub id: ApiId,
    /// Survey title.
    pub title: String,
    /// Questions in ascending order.
    pub questions: Vec<QuestionResults>,
}

/// Aggregated results for a single question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionResults {
    pub id: ApiId,
    pub text: String,
    /// Options in ascending order.
    pub options: Vec<OptionTally>,
}

/// The answer count for a single option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionTally {
    pub id: ApiId,
    pub text: String,
    pub count: u64,
}

impl SurveyResults {
    /// Tally the given answers against the survey's current structure.
    ///
    /// Counts are grouped purely by option ID: respondent identity and
    /// response recency are irrelevant. Every current option appears in the
    /// output, with count 0 if nothing references it; answers referencing
    /// structure that a replace has since discarded match no current option
    /// and are dropped.
    pub fn tally<'a>(survey: Survey, answers: impl IntoIterator<Item = &'a Answer>) -> Self {
        let mut counts: HashMap<Id, u64> = HashMap::new();
        for answer in answers {
            *counts.entry(answer.option_id).or_default() += 1;
        }

        Self {
            id: survey.id.into(),
            title: survey.survey.metadata.title,
            questions: survey
                .survey
                .questions
                .into_iter()
                .map(|question| QuestionResults {
                    id: question.id.into(),
                    text: question.text,
                    options: question
                        .options
                        .into_iter()
                        .map(|option| OptionTally {
                            count: counts.get(&option.id).copied().unwrap_or(0),
                            id: option.id.into(),
                            text: option.text,
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::model::db::survey::{Question, SurveyCore};

    fn example_survey() -> Survey {
        Survey {
            id: Id::new(),
            survey: SurveyCore::new(
                "Colors".to_string(),
                vec![Question::example("Favorite?", 1, &["Red", "Blue"])],
                Id::new(),
            ),
        }
    }

    fn answer(question_id: Id, option_id: Id) -> Answer {
        Answer {
            question_id,
            option_id,
        }
    }

    #[test]
    fn counts_group_by_option() {
        let survey = example_survey();
        let question = &survey.questions[0];
        let (red, blue) = (question.options[0].id, question.options[1].id);
        let answers = vec![
            answer(question.id, red),
            answer(question.id, red),
            answer(question.id, red),
        ];

        let results = SurveyResults::tally(survey, &answers);
        assert_eq!(results.title, "Colors");
        assert_eq!(results.questions.len(), 1);
        let options = &results.questions[0].options;
        assert_eq!(options.len(), 2);
        assert_eq!(*options[0].id, red);
        assert_eq!(options[0].count, 3);
        // Unanswered options still appear, with count 0.
        assert_eq!(*options[1].id, blue);
        assert_eq!(options[1].count, 0);
    }

    #[test]
    fn zero_responses_give_all_zero_counts() {
        let results = SurveyResults::tally(example_survey(), &[]);
        for question in &results.questions {
            for option in &question.options {
                assert_eq!(option.count, 0);
            }
        }
    }

    #[test]
    fn orphaned_answers_are_dropped() {
        let survey = example_survey();
        let question = &survey.questions[0];
        let red = question.options[0].id;
        // Answers left over from a replaced structure reference IDs that no
        // longer exist on the survey.
        let answers = vec![answer(question.id, red), answer(Id::new(), Id::new())];

        let results = SurveyResults::tally(survey, &answers);
        let options = &results.questions[0].options;
        assert_eq!(options[0].count, 1);
        assert_eq!(options[1].count, 0);
        let total: u64 = options.iter().map(|option| option.count).sum();
        assert_eq!(total, 1);
    }
}
