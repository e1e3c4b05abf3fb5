use mongodb::bson::{to_bson, Bson};
use serde::{Deserialize, Serialize};

/// States in the survey lifecycle.
///
/// Transitions are caller-initiated and deliberately unconstrained:
/// a coordinator may open and close a survey in either direction.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, FromFormField)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SurveyStatus {
    /// Under construction, not yet accepting responses.
    Draft,
    /// Accepting responses.
    Open,
    /// No longer accepting responses; results are final.
    Closed,
}

impl SurveyStatus {
    /// Can responses currently be submitted?
    pub fn accepts_responses(self) -> bool {
        self == Self::Open
    }
}

impl From<SurveyStatus> for Bson {
    fn from(status: SurveyStatus) -> Self {
        to_bson(&status).expect("Serialisation is infallible")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_gates_submission() {
        assert!(SurveyStatus::Open.accepts_responses());
        assert!(!SurveyStatus::Draft.accepts_responses());
        assert!(!SurveyStatus::Closed.accepts_responses());
    }

    #[test]
    fn status_serialises_as_upper_case() {
        assert_eq!(Bson::from(SurveyStatus::Open), Bson::String("OPEN".into()));
        assert_eq!(
            Bson::from(SurveyStatus::Closed),
            Bson::String("CLOSED".into())
        );
        assert_eq!(Bson::from(SurveyStatus::Draft), Bson::String("DRAFT".into()));
    }
}
