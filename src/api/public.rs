use mongodb::{
    bson::doc,
    options::{FindOptions, SessionOptions},
    Client,
};
use rocket::{
    futures::TryStreamExt, http::Status, response::status::Created, serde::json::Json, Route,
    State,
};

use crate::error::{Error, Result};
use crate::model::{
    api::{
        auth::{AnyUser, AuthToken},
        id::ResourceId,
        pagination::{Paginated, PaginationRequest},
        response::ResponseSpec,
        results::SurveyResults,
        survey::{SurveyDescription, SurveySummary},
    },
    common::survey::SurveyStatus,
    db::{
        response::{Answer, NewResponse, Response},
        survey::Survey,
    },
    mongodb::{is_duplicate_key_error, Coll, Id},
};

pub fn routes() -> Vec<Route> {
    routes![list_surveys, get_survey, get_results, submit_response]
}

#[get("/surveys?<status>&<q>")]
async fn list_surveys(
    status: Option<SurveyStatus>,
    q: Option<String>,
    pagination: PaginationRequest,
    surveys: Coll<Survey>,
) -> Result<Json<Paginated<SurveySummary>>> {
    let mut filter = doc! {};
    if let Some(status) = status {
        filter.insert("status", status);
    }
    if let Some(q) = q {
        let q = q.trim();
        if !q.is_empty() {
            // Case-insensitive literal substring match on the title.
            filter.insert(
                "title",
                doc! {
                    "$regex": regex_escape(q),
                    "$options": "i",
                },
            );
        }
    }

    let total = surveys.count_documents(filter.clone(), None).await?;

    let find_options = FindOptions::builder()
        .sort(doc! {"created_at": -1})
        .skip(pagination.skip())
        .limit(pagination.limit())
        .build();
    let page = surveys
        .find(filter, find_options)
        .await?
        .map_ok(SurveySummary::from)
        .try_collect::<Vec<_>>()
        .await?;

    Ok(Json(pagination.to_paginated(total, page)))
}

#[get("/surveys/<survey_id>")]
async fn get_survey(survey_id: Id, surveys: Coll<Survey>) -> Result<Json<SurveyDescription>> {
    let survey = surveys
        .find_one(survey_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Survey {}", survey_id)))?;
    Ok(Json(survey.into()))
}

#[get("/surveys/<survey_id>/results")]
async fn get_results(
    survey_id: Id,
    surveys: Coll<Survey>,
    responses: Coll<Response>,
    db_client: &State<Client>,
) -> Result<Json<SurveyResults>> {
    // Ensure we read a consistent snapshot of the survey and its responses,
    // even if a replace or submission lands mid-aggregation.
    let session_options = SessionOptions::builder().snapshot(true).build();
    let mut session = db_client.start_session(Some(session_options)).await?;

    let survey = surveys
        .find_one_with_session(survey_id.as_doc(), None, &mut session)
        .await?
        .ok_or_else(|| Error::not_found(format!("Survey {}", survey_id)))?;

    let filter = doc! {
        "survey_id": *survey_id,
    };
    let mut cursor = responses
        .find_with_session(filter, None, &mut session)
        .await?;
    let mut answers = Vec::new();
    while let Some(response) = cursor.next(&mut session).await {
        answers.extend(response?.response.answers);
    }

    Ok(Json(SurveyResults::tally(survey, &answers)))
}

#[post("/surveys/<survey_id>/responses", data = "<spec>", format = "json")]
async fn submit_response(
    user: Option<AuthToken<AnyUser>>,
    survey_id: Id,
    spec: Json<ResponseSpec>,
    surveys: Coll<Survey>,
    responses: Coll<NewResponse>,
) -> Result<Created<Json<ResourceId>>> {
    // A survey that does not exist and one that is not accepting responses
    // are rejected alike, so a submission cannot distinguish the two.
    let survey = open_survey(surveys.find_one(survey_id.as_doc(), None).await?, survey_id)?;

    if spec.answers.is_empty() {
        return Err(Error::Status(
            Status::BadRequest,
            "A response must contain at least one answer".to_string(),
        ));
    }

    // Ensure the referenced questions and options exist on this survey.
    for answer in &spec.answers {
        let question = survey.question(answer.question_id).ok_or_else(|| {
            Error::not_found(format!(
                "Question {} on survey {}",
                answer.question_id, survey_id
            ))
        })?;
        if question.option(answer.option_id).is_none() {
            return Err(Error::not_found(format!(
                "Option {} for question {}",
                answer.option_id, answer.question_id
            )));
        }
    }

    let response = NewResponse::new(
        survey_id,
        user.map(|token| token.id),
        spec.0.answers.into_iter().map(Answer::from).collect(),
    );

    // The unique index on (survey_id, user_id) is what rejects a duplicate
    // identified submission; a check-then-insert would leave a race open
    // between two concurrent submissions from the same respondent.
    let result = responses.insert_one(&response, None).await;
    if is_duplicate_key_error(result.as_ref()) {
        return Err(Error::Status(
            Status::Conflict,
            format!("Already submitted to survey {}", survey_id),
        ));
    }
    let id: Id = result?
        .inserted_id
        .as_object_id()
        .unwrap() // Valid because the ID comes directly from the DB
        .into();

    Ok(Created::new(format!("/surveys/{}/responses/{}", survey_id, id)).body(Json(id.into())))
}

/// Extract a survey that is accepting responses. A missing survey and a
/// draft or closed one both map to the same rejection.
fn open_survey(survey: Option<Survey>, survey_id: Id) -> Result<Survey> {
    survey
        .filter(|survey| survey.metadata.status.accepts_responses())
        .ok_or_else(|| {
            Error::Status(
                Status::BadRequest,
                format!("Survey {} is not open", survey_id),
            )
        })
}

/// Escape regex metacharacters so a filter string matches literally.
fn regex_escape(pattern: &str) -> String {
    let mut escaped = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        if matches!(
            c,
            '\\' | '.' | '+' | '*' | '?' | '(' | ')' | '|' | '[' | ']' | '{' | '}' | '^' | '$'
        ) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submissions_need_an_existing_open_survey() {
        let survey = Survey::example();
        let id = survey.id;
        assert!(open_survey(Some(survey), id).is_ok());

        let mut survey = Survey::example();
        let id = survey.id;
        survey.survey.metadata.status = SurveyStatus::Closed;
        let not_open = |result: Result<Survey>| match result {
            Err(Error::Status(status, message)) => {
                assert_eq!(status, Status::BadRequest);
                assert_eq!(message, format!("Survey {} is not open", id));
            }
            other => panic!("Expected a bad request, got {:?}", other),
        };
        not_open(open_survey(Some(survey), id));
        // A nonexistent survey is indistinguishable from one that is not open.
        not_open(open_survey(None, id));
    }

    #[test]
    fn regex_escape_neutralises_metacharacters() {
        assert_eq!(regex_escape("plain title"), "plain title");
        assert_eq!(regex_escape("what?"), "what\\?");
        assert_eq!(regex_escape("a.b*c"), "a\\.b\\*c");
        assert_eq!(regex_escape("(x|y)"), "\\(x\\|y\\)");
        assert_eq!(regex_escape("\\"), "\\\\");
    }
}
