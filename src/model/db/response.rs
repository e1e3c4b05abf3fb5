use std::ops::Deref;

use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// A single answer within a response: one chosen option for one question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub question_id: Id,
    pub option_id: Id,
}

/// Core response data, as stored in the database.
///
/// Answers are embedded, so a response and its answers live and die as one
/// document. `user_id` is omitted entirely for anonymous submissions; the
/// partial unique index on `(survey_id, user_id)` therefore only constrains
/// identified respondents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseCore {
    /// The survey this response answers.
    pub survey_id: Id,
    /// The identified respondent, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Id>,
    /// Submission time.
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    /// One entry per answered question.
    pub answers: Vec<Answer>,
}

impl ResponseCore {
    /// Create a new response submitted now.
    pub fn new(survey_id: Id, user_id: Option<Id>, answers: Vec<Answer>) -> Self {
        Self {
            survey_id,
            user_id,
            created_at: Utc::now(),
            answers,
        }
    }
}

/// A response without an ID.
pub type NewResponse = ResponseCore;

/// A response from the database, with its unique ID.
#[derive(Debug, Serialize, Deserialize)]
pub struct Response {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub response: ResponseCore,
}

impl Deref for Response {
    type Target = ResponseCore;

    fn deref(&self) -> &Self::Target {
        &self.response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use mongodb::bson::to_document;

    #[test]
    fn anonymous_responses_omit_user_id() {
        let response = ResponseCore::new(Id::new(), None, Vec::new());
        let doc = to_document(&response).unwrap();
        // Absent, not null: the partial unique index must not see it.
        assert!(!doc.contains_key("user_id"));

        let identified = ResponseCore::new(Id::new(), Some(Id::new()), Vec::new());
        let doc = to_document(&identified).unwrap();
        assert!(doc.contains_key("user_id"));
    }
}
