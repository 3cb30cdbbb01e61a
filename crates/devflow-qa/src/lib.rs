//! Questions, answers, voting and acceptance for DevFlow.
//!
//! Every mutating operation takes the acting user explicitly as an
//! [`Actor`](devflow_types::Actor), runs inside an IMMEDIATE SQLite
//! transaction, and finishes with a compare-and-swap on the entity's version
//! stamp. Vote totals are never stored; they are counted from the voter rows
//! in `question_votes` and `answer_votes`.
//!
//! Reputation for every user whose activity changed is recomputed inside the
//! same transaction. Notifications are emitted after commit and never fail
//! the operation that triggered them.

mod accept;
mod answer;
mod error;
mod listing;
mod question;
mod tx;
mod vote;

pub use accept::accept_answer;
pub use answer::{get_answer, list_answers, list_answers_by_user, post_answer, Answer, NewAnswer, VoterRecord};
pub use error::QaError;
pub use listing::{list_questions, question_thread, QuestionFilter, QuestionSummary, QuestionThread};
pub use question::{
    create_question, delete_question, get_question, list_questions_by_user, update_question,
    validate_question, AuthorSummary, Question, QuestionInput, QuestionUpdate,
};
pub use vote::{vote_answer, vote_question, QuestionVoteOutcome};
