use chrono::Utc;
use mongodb::{
    bson::{doc, ser::Error as BsonSerError, to_bson, DateTime, Document},
    error::Error as DbError,
    Client,
};
use rocket::{http::Status, response::status::Created, serde::json::Json, Route, State};

use crate::{
    error::{Error, Result},
    model::{
        api::{
            auth::{AuthToken, Coordinator},
            id::ResourceId,
            survey::{DeleteConfirmation, StatusRequest, SurveySpec, SurveyStatusChange},
        },
        common::survey::SurveyStatus,
        db::{
            response::Response,
            survey::{NewSurvey, Survey},
        },
        mongodb::{Coll, Id},
    },
};

pub fn routes() -> Vec<Route> {
    routes![create_survey, replace_survey, set_survey_status, delete_survey]
}

#[post("/surveys", data = "<spec>", format = "json")]
async fn create_survey(
    token: AuthToken<Coordinator>,
    spec: Json<SurveySpec>,
    new_surveys: Coll<NewSurvey>,
) -> Result<Created<Json<ResourceId>>> {
    spec.validate()
        .map_err(|msg| Error::Status(Status::BadRequest, msg))?;

    // Create and insert the survey.
    let survey = spec.0.into_survey(token.id);
    let id: Id = new_surveys
        .insert_one(survey, None)
        .await?
        .inserted_id
        .as_object_id()
        .unwrap() // Valid because the ID comes directly from the DB
        .into();

    Ok(Created::new(format!("/surveys/{}", id)).body(Json(id.into())))
}

#[put("/surveys/<survey_id>", data = "<spec>", format = "json")]
async fn replace_survey(
    _token: AuthToken<Coordinator>,
    survey_id: Id,
    spec: Json<SurveySpec>,
    surveys: Coll<Survey>,
) -> Result<Json<ResourceId>> {
    spec.validate()
        .map_err(|msg| Error::Status(Status::BadRequest, msg))?;

    // Swap in the new structure, discarding the old questions and options.
    // A single `$set` on the one document means concurrent readers and
    // respondents observe either the fully-old or fully-new structure, and
    // a concurrent status change is never overwritten.
    let update = replacement_update(spec.0).map_err(DbError::from)?;
    let result = surveys.update_one(survey_id.as_doc(), update, None).await?;
    if result.matched_count != 1 {
        return Err(Error::not_found(format!("Survey {}", survey_id)));
    }

    Ok(Json(survey_id.into()))
}

/// Build the structural-replace update from a validated spec. Status,
/// creator, and creation time are untouched.
///
/// Answers referencing the old structure keep their old IDs and simply stop
/// matching anything; the results aggregation tolerates this.
fn replacement_update(spec: SurveySpec) -> std::result::Result<Document, BsonSerError> {
    let (title, questions) = spec.into_parts();
    Ok(doc! {
        "$set": {
            "title": title,
            "questions": to_bson(&questions)?,
            "updated_at": DateTime::from_chrono(Utc::now()),
        }
    })
}

#[patch("/surveys/<survey_id>", data = "<request>", format = "json")]
async fn set_survey_status(
    _token: AuthToken<Coordinator>,
    survey_id: Id,
    request: Json<StatusRequest>,
    surveys: Coll<Survey>,
) -> Result<Json<SurveyStatusChange>> {
    let status = request.status;
    if status == SurveyStatus::Draft {
        return Err(Error::Status(
            Status::BadRequest,
            "Status must be OPEN or CLOSED".to_string(),
        ));
    }

    let update = doc! {
        "$set": {
            "status": status,
            "updated_at": DateTime::from_chrono(Utc::now()),
        }
    };
    let result = surveys.update_one(survey_id.as_doc(), update, None).await?;
    if result.matched_count != 1 {
        return Err(Error::not_found(format!("Survey {}", survey_id)));
    }

    Ok(Json(SurveyStatusChange {
        id: survey_id.into(),
        status,
    }))
}

#[delete("/surveys/<survey_id>")]
async fn delete_survey(
    _token: AuthToken<Coordinator>,
    survey_id: Id,
    surveys: Coll<Survey>,
    responses: Coll<Response>,
    db_client: &State<Client>,
) -> Result<Json<DeleteConfirmation>> {
    // Atomically delete the survey and all of its responses. Questions,
    // options, and answers are embedded, so they go with their documents.
    let mut session = db_client.start_session(None).await?;
    session.start_transaction(None).await?;

    let result = surveys
        .delete_one_with_session(survey_id.as_doc(), None, &mut session)
        .await?;
    if result.deleted_count == 0 {
        session.abort_transaction().await?;
        return Err(Error::not_found(format!("Survey {}", survey_id)));
    }

    let filter = doc! {
        "survey_id": *survey_id,
    };
    responses
        .delete_many_with_session(filter, None, &mut session)
        .await?;

    session.commit_transaction().await?;

    Ok(Json(DeleteConfirmation { ok: true }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replacement_touches_structure_only() {
        let update = replacement_update(SurveySpec::example()).unwrap();
        let set = update.get_document("$set").unwrap();
        assert!(set.contains_key("title"));
        assert!(set.contains_key("questions"));
        assert!(set.contains_key("updated_at"));
        // Lifecycle and provenance fields stay as they are, even if they
        // changed since the caller last read the survey.
        assert!(!set.contains_key("status"));
        assert!(!set.contains_key("created_by"));
        assert!(!set.contains_key("created_at"));
    }
}
