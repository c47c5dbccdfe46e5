//! Event polls, their questions and votes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::Timestamp;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Question {
    pub id: String,
    pub text: String,
    pub answers: Vec<String>,
    /// Votes per answer, every answer present from creation on.
    pub response_counts: BTreeMap<String, u64>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct QuestionCreate {
    pub text: String,
    pub answers: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Poll {
    pub id: String,
    pub event_id: String,
    pub title: String,
    pub description: Option<String>,
    pub questions: Vec<Question>,
    pub is_anonymous: bool,
    pub allow_multiple_votes: bool,
    pub total_responses: u64,
    pub creator_id: String,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Poll {
    pub fn question(&self, question_id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == question_id)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PollCreate {
    pub event_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub questions: Vec<QuestionCreate>,
    #[serde(default)]
    pub is_anonymous: bool,
    #[serde(default)]
    pub allow_multiple_votes: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Vote {
    pub id: String,
    pub poll_id: String,
    pub question_id: String,
    pub user_id: String,
    pub answer: String,
    /// `poll:question:user`, unique while the poll takes one vote per person.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ballot: Option<String>,
    pub created_at: Timestamp,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct VoteCreate {
    pub poll_id: String,
    pub question_id: String,
    pub answer: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct VoteResponse {
    pub success: bool,
    pub message: String,
    pub poll_id: String,
    pub question_id: String,
    pub chosen_answer: String,
    pub total_votes: u64,
}
