//! Event polls and voting.
//!
//! Response counters live inside the poll's question list, so a vote
//! rewrites that list. The rewrite is conditioned on `total_responses`
//! still holding the value it was computed from; a lost race re-reads
//! the poll and tries again.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use social_common::{generate_id, Poll, PollCreate, Question, Vote, VoteCreate, VoteResponse};

use super::{active_event, require_organizer, require_participant, touch, viewable_event};
use crate::auth::Identity;
use crate::error::AppError;
use crate::storage::{collections, repo, DocumentStore, Filter, FindOptions, StoreError};
use crate::validation::ValidatedJson;
use crate::{metrics, AppState};

/// Attempts at the conditional counter update before giving up
const MAX_COUNTER_ATTEMPTS: usize = 5;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_poll))
        .route("/vote", post(vote))
        .route("/events/{event_id}", get(event_polls))
        .route("/{id}", get(get_poll))
}

async fn active_poll(store: &dyn DocumentStore, id: &str) -> Result<Poll, AppError> {
    repo::find_one(store, &repo::active(id))
        .await?
        .ok_or_else(|| AppError::not_found("Poll"))
}

async fn event_polls(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(event_id): Path<String>,
) -> Result<Json<Vec<Poll>>, AppError> {
    let store = state.store.as_ref();
    viewable_event(store, &identity, &event_id).await?;
    let filter = Filter::eq("event_id", event_id).and(Filter::eq("is_active", true));
    let polls = repo::find(store, &filter, &FindOptions::new().sort_asc("created_at")).await?;
    Ok(Json(polls))
}

async fn get_poll(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<Json<Poll>, AppError> {
    let store = state.store.as_ref();
    let poll = active_poll(store, &id).await?;
    viewable_event(store, &identity, &poll.event_id).await?;
    Ok(Json(poll))
}

async fn create_poll(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    ValidatedJson(payload): ValidatedJson<PollCreate>,
) -> Result<(StatusCode, Json<Poll>), AppError> {
    let store = state.store.as_ref();
    let event = active_event(store, &payload.event_id).await?;
    require_organizer(&identity, &event, "create polls")?;

    let questions = payload
        .questions
        .into_iter()
        .map(|q| Question {
            id: generate_id("question"),
            response_counts: q.answers.iter().map(|a| (a.clone(), 0)).collect::<BTreeMap<_, _>>(),
            text: q.text,
            answers: q.answers,
        })
        .collect();

    let now = Utc::now();
    let poll = Poll {
        id: generate_id("poll"),
        event_id: payload.event_id,
        title: payload.title,
        description: payload.description,
        questions,
        is_anonymous: payload.is_anonymous,
        allow_multiple_votes: payload.allow_multiple_votes,
        total_responses: 0,
        creator_id: identity.user_id.clone(),
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    repo::insert(store, &poll).await?;

    metrics::resource_created("poll");
    Ok((StatusCode::CREATED, Json(poll)))
}

/// Add one response for `answer`; returns the new total.
async fn record_response(
    store: &dyn DocumentStore,
    poll_id: &str,
    question_id: &str,
    answer: &str,
) -> Result<u64, AppError> {
    for _ in 0..MAX_COUNTER_ATTEMPTS {
        let poll = active_poll(store, poll_id).await?;
        let mut questions = poll.questions;
        let question = questions
            .iter_mut()
            .find(|q| q.id == question_id)
            .ok_or_else(|| AppError::not_found("Question"))?;
        *question.response_counts.entry(answer.to_string()).or_insert(0) += 1;

        let unchanged =
            repo::active(poll_id).and(Filter::eq("total_responses", poll.total_responses));
        let update = touch()
            .set("questions", serde_json::to_value(&questions)?)
            .inc("total_responses", 1);
        if let Some(updated) = repo::update::<Poll>(store, &unchanged, &update).await? {
            return Ok(updated.total_responses);
        }
        tracing::debug!(poll_id, "poll counters changed concurrently, retrying");
    }
    Err(AppError::Conflict(
        "Poll was modified concurrently, please retry".to_string(),
    ))
}

async fn vote(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    ValidatedJson(payload): ValidatedJson<VoteCreate>,
) -> Result<Json<VoteResponse>, AppError> {
    let store = state.store.as_ref();
    let poll = active_poll(store, &payload.poll_id).await?;
    let event = active_event(store, &poll.event_id).await?;
    require_participant(&identity, &event, "vote in polls")?;

    let question = poll
        .question(&payload.question_id)
        .ok_or_else(|| AppError::NotFound("Question not found in this poll".to_string()))?;
    if !question.answers.contains(&payload.answer) {
        return Err(AppError::BadRequest("Invalid answer for this question".to_string()));
    }

    let ballot = (!poll.allow_multiple_votes)
        .then(|| format!("{}:{}:{}", poll.id, question.id, identity.user_id));
    let vote = Vote {
        id: generate_id("vote"),
        poll_id: poll.id.clone(),
        question_id: question.id.clone(),
        user_id: identity.user_id.clone(),
        answer: payload.answer.clone(),
        ballot,
        created_at: Utc::now(),
    };
    match repo::insert(store, &vote).await {
        Err(StoreError::DuplicateKey { .. }) => {
            return Err(AppError::BadRequest(
                "You have already voted on this question".to_string(),
            ));
        },
        other => other?,
    };

    let total_votes = match record_response(store, &poll.id, &question.id, &vote.answer).await {
        Ok(total) => total,
        Err(e) => {
            // keep votes and counters in step
            store.delete_one(collections::VOTES, &Filter::id(vote.id.as_str())).await?;
            return Err(e);
        },
    };

    tracing::info!(poll_id = %poll.id, user_id = %identity.user_id, "vote recorded");
    Ok(Json(VoteResponse {
        success: true,
        message: "Vote recorded successfully".to_string(),
        poll_id: vote.poll_id,
        question_id: vote.question_id,
        chosen_answer: vote.answer,
        total_votes,
    }))
}
