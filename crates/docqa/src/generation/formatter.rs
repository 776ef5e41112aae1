//! Split generated text into one answer per question

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::generation::composer::{Generation, ALL_FAILED};
use crate::generation::prompt::NOT_AVAILABLE;
use crate::types::{AnswerStatus, QuestionAnswer};

/// Placeholder for a question the model left unanswered
pub const MISSING_ANSWER: &str = "Error: No answer was returned for this question.";

static NUMBERED_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*\d+\.\s+").expect("valid numbered-list regex"));

/// Split a numbered list ("1. ...\n2. ...") into its items.
///
/// Text before the first marker is discarded; items are trimmed and a leading
/// "- " is stripped. An empty item keeps its position so later answers stay
/// aligned; only trailing empty items are dropped.
pub fn split_numbered_answers(text: &str) -> Vec<String> {
    let mut items: Vec<String> = NUMBERED_MARKER
        .split(text)
        .skip(1)
        .map(|segment| {
            let segment = segment.trim();
            segment.strip_prefix("- ").unwrap_or(segment).trim().to_string()
        })
        .collect();

    while items.last().is_some_and(|item| item.is_empty()) {
        items.pop();
    }
    items
}

/// Parse `{"answers": [...]}` or a bare JSON array, optionally fenced in Markdown.
///
/// A bare array is only accepted when it is the whole body. Inside surrounding
/// prose only an object with an `answers` array counts, so bracketed text in a
/// plain answer (`see clause [4]`) is never mistaken for the answer list.
pub fn parse_structured_answers(text: &str) -> Option<Vec<String>> {
    let body = strip_code_fence(text.trim());

    let items = match serde_json::from_str::<Value>(body) {
        Ok(Value::Array(items)) => items,
        Ok(Value::Object(map)) => answers_array(map)?,
        Ok(_) => return None,
        Err(_) => {
            let start = body.find('{')?;
            let end = body.rfind('}')?;
            if start >= end {
                return None;
            }
            match serde_json::from_str::<Value>(&body[start..=end]).ok()? {
                Value::Object(map) => answers_array(map)?,
                _ => return None,
            }
        }
    };

    Some(
        items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => s.trim().to_string(),
                Value::Null => String::new(),
                other => other.to_string(),
            })
            .collect(),
    )
}

fn answers_array(mut map: serde_json::Map<String, Value>) -> Option<Vec<Value>> {
    match map.remove("answers") {
        Some(Value::Array(items)) => Some(items),
        _ => None,
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.split_once('\n').map(|(_, body)| body).unwrap_or(rest);
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

/// Status for a single generated answer
pub fn classify(answer: &str) -> AnswerStatus {
    let trimmed = answer.trim();
    if trimmed.is_empty() {
        AnswerStatus::Missing
    } else if trimmed == ALL_FAILED {
        AnswerStatus::Failed
    } else if trimmed.trim_matches(|c| c == '\'' || c == '"') == NOT_AVAILABLE {
        AnswerStatus::NotFound
    } else {
        AnswerStatus::Answered
    }
}

/// Align a generation with `expected` questions.
///
/// Structured output is preferred, then a numbered list; a single-question
/// generation with neither is taken whole. Extra items are dropped and
/// absent ones are reported as [`AnswerStatus::Missing`].
pub fn format_answers(generation: &Generation, expected: usize) -> Vec<QuestionAnswer> {
    if generation.is_exhausted() {
        return vec![QuestionAnswer::new(ALL_FAILED, AnswerStatus::Failed); expected];
    }

    let mut items = parse_structured_answers(&generation.text)
        .or_else(|| {
            let numbered = split_numbered_answers(&generation.text);
            (!numbered.is_empty()).then_some(numbered)
        })
        .unwrap_or_else(|| {
            if expected == 1 && !generation.text.trim().is_empty() {
                vec![generation.text.trim().to_string()]
            } else {
                Vec::new()
            }
        });

    if items.len() > expected {
        tracing::warn!(
            "Model returned {} answers for {} questions, dropping the extra ones",
            items.len(),
            expected
        );
        items.truncate(expected);
    } else if items.len() < expected {
        tracing::warn!(
            "Model returned {} answers for {} questions",
            items.len(),
            expected
        );
    }

    let mut answers: Vec<QuestionAnswer> = items
        .into_iter()
        .map(|item| match classify(&item) {
            AnswerStatus::Missing => QuestionAnswer::new(MISSING_ANSWER, AnswerStatus::Missing),
            status => QuestionAnswer::new(item, status),
        })
        .collect();
    answers.resize(expected, QuestionAnswer::new(MISSING_ANSWER, AnswerStatus::Missing));
    answers
}
