use serde::{Deserialize, Serialize};

use crate::model::{db::response::Answer, mongodb::Id};

/// A submitted answer set: one chosen option per answered question.
#[derive(Debug, Serialize, Deserialize)]
pub struct ResponseSpec {
    pub answers: Vec<AnswerSpec>,
}

/// One answer that the respondent wishes to submit.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerSpec {
    pub question_id: Id,
    pub option_id: Id,
}

impl From<AnswerSpec> for Answer {
    fn from(spec: AnswerSpec) -> Self {
        Self {
            question_id: spec.question_id,
            option_id: spec.option_id,
        }
    }
}
