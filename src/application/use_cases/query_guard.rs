//! The gate between free-text generation and the store.
//!
//! Enforcement is deliberately syntactic: the statement must start with the
//! retrieval keyword, carry no interior statement separator, and end up with
//! a row-limit bound. That is the whole policy; anything stricter (a real SQL
//! parser) can replace `PrefixPolicy` behind the `SqlPolicy` trait without
//! touching the rest of the pipeline.

use crate::domain::error::{AppError, Result};
use crate::domain::query::{CandidateQuery, QueryOrigin, ValidatedQuery};
use once_cell::sync::Lazy;
use regex::Regex;

static MUTATION_INTENT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(delete|drop|insert|update|alter|truncate|create)\b").unwrap()
});

static LIMIT_CLAUSE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bLIMIT\b").unwrap());

pub trait SqlPolicy: Send + Sync {
    fn validate(&self, candidate: CandidateQuery, origin: QueryOrigin) -> Result<ValidatedQuery>;
}

#[derive(Debug, Clone, Default)]
pub struct PrefixPolicy;

impl PrefixPolicy {
    pub fn new() -> Self {
        Self
    }
}

impl SqlPolicy for PrefixPolicy {
    fn validate(&self, candidate: CandidateQuery, origin: QueryOrigin) -> Result<ValidatedQuery> {
        let text = candidate.into_text();
        let trimmed = text.trim();

        if !trimmed.to_uppercase().starts_with("SELECT") {
            return Err(AppError::UnsafeStatement(format!(
                "Generated query is not a SELECT statement: {}",
                trimmed
            )));
        }

        // One trailing separator is tolerated; a separator anywhere else means
        // more than one statement.
        let (body, terminated) = match trimmed.strip_suffix(';') {
            Some(body) => (body.trim_end(), true),
            None => (trimmed, false),
        };
        if body.contains(';') {
            return Err(AppError::UnsafeStatement(
                "Statement separator found mid-query; only a single statement is allowed"
                    .to_string(),
            ));
        }

        if terminated {
            // Preserve the statement verbatim, terminator included. A query the
            // author chose to terminate is never rewritten.
            return Ok(ValidatedQuery::new(trimmed.to_string()));
        }

        if LIMIT_CLAUSE_PATTERN.is_match(body) {
            return Ok(ValidatedQuery::new(body.to_string()));
        }

        Ok(ValidatedQuery::new(format!(
            "{} LIMIT {}",
            body,
            origin.default_limit()
        )))
    }
}

/// Screen applied to the natural-language question itself before any
/// generation cost is spent. Same spirit as the statement check: a syntactic
/// mutation-verb scan, not semantic understanding.
pub fn ensure_retrieval_intent(question: &str) -> Result<()> {
    if MUTATION_INTENT_PATTERN.is_match(question) {
        return Err(AppError::UnsafeStatement(format!(
            "Request is not a retrieval query: {}",
            question
        )));
    }
    Ok(())
}
