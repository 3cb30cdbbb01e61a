//! Question listing, filtering and the merged question thread.

use devflow_db::FOLD_CASE_FUNCTION;
use devflow_types::QuestionStatus;
use rusqlite::Connection;
use serde::Serialize;

use crate::answer::{list_answers, Answer};
use crate::error::QaError;
use crate::question::{get_question, map_row_to_question, Question, SELECT_QUESTION};

/// Criteria for [`list_questions`]. Empty fields do not filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionFilter {
    /// Matches questions carrying any of these tags.
    pub tags: Vec<String>,
    /// Case-insensitive substring of the title or body.
    pub search: Option<String>,
    /// Inclusive lower bound on the net vote total.
    pub min_votes: Option<i64>,
    /// Inclusive upper bound on the net vote total.
    pub max_votes: Option<i64>,
    pub status: Option<QuestionStatus>,
}

/// A listed question annotated with how many answers it has.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionSummary {
    #[serde(flatten)]
    pub question: Question,
    pub answer_count: i64,
}

/// A question together with all its answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionThread {
    pub question: Question,
    pub answers: Vec<Answer>,
}

/// Lists questions matching `filter`, newest first.
///
/// Text search needs a connection set up by
/// [`devflow_db::prepare_connection`], which every pooled connection is.
pub fn list_questions(
    conn: &Connection,
    filter: &QuestionFilter,
) -> Result<Vec<QuestionSummary>, QaError> {
    // Clauses and bind values are collected separately so no user input is
    // interpolated into the SQL text.
    let mut clauses: Vec<String> = Vec::new();
    let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();
    let mut idx = 1usize;

    let tags: Vec<&str> = filter
        .tags
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect();
    if !tags.is_empty() {
        let placeholders: Vec<String> = (idx..idx + tags.len()).map(|i| format!("?{i}")).collect();
        clauses.push(format!(
            "EXISTS (SELECT 1 FROM json_each(listed.tags_json) t WHERE t.value IN ({}))",
            placeholders.join(", ")
        ));
        for tag in &tags {
            values.push(Box::new(tag.to_string()));
        }
        idx += tags.len();
    }

    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        // The built-in lower() only folds ASCII.
        clauses.push(format!(
            "(instr({fold}(listed.title), ?{idx}) > 0 OR instr({fold}(listed.body), ?{idx}) > 0)",
            fold = FOLD_CASE_FUNCTION
        ));
        values.push(Box::new(search.to_lowercase()));
        idx += 1;
    }

    if let Some(min) = filter.min_votes {
        clauses.push(format!("(listed.upvotes - listed.downvotes) >= ?{idx}"));
        values.push(Box::new(min));
        idx += 1;
    }

    if let Some(max) = filter.max_votes {
        clauses.push(format!("(listed.upvotes - listed.downvotes) <= ?{idx}"));
        values.push(Box::new(max));
        idx += 1;
    }

    if let Some(status) = filter.status {
        clauses.push(format!("listed.status = ?{idx}"));
        values.push(Box::new(status.as_str()));
    }

    let where_clause = if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    };
    let sql = format!(
        "SELECT * FROM ({SELECT_QUESTION}) AS listed
         {where_clause}
         ORDER BY listed.created_at DESC, listed.id DESC"
    );

    let params: Vec<&dyn rusqlite::types::ToSql> = values.iter().map(|v| v.as_ref()).collect();
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params.as_slice(), |row| {
        Ok(QuestionSummary {
            question: map_row_to_question(row)?,
            answer_count: row.get(13)?,
        })
    })?;

    let mut summaries = Vec::new();
    for row in rows {
        summaries.push(row?);
    }
    tracing::trace!(count = summaries.len(), "listed questions");
    Ok(summaries)
}

/// Loads a question and its answers, newest answer first.
///
/// # Errors
///
/// Returns `QaError::QuestionNotFound` if no question has this ID.
pub fn question_thread(conn: &Connection, question_id: i64) -> Result<QuestionThread, QaError> {
    let question = get_question(conn, question_id)?;
    let answers = list_answers(conn, question_id)?;
    Ok(QuestionThread { question, answers })
}
