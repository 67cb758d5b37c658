use serde::Deserialize;
use serde_json::{json, Value};

use crate::assembly_engine::models::{
    canonical_subject, normalize_grade, Difficulty, GeneratedTest, Question,
};

// ---------------------------------------------------------------------------
// Inbound: raw bank records
// ---------------------------------------------------------------------------

/// A question record as it appears in a bank file.
///
/// Bank files come from several authoring tools, so the shape is loose:
/// `_id` or `id`, grade as string or number, difficulty in any case.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankRecord {
    #[serde(alias = "_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(alias = "correct_answer")]
    pub correct_answer: Option<String>,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub grade: Value,
    pub difficulty: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, alias = "is_generated")]
    pub is_generated: bool,
}

fn grade_from_value(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.trim().is_empty() => Some(normalize_grade(s)),
        Value::Number(n) => n
            .as_u64()
            .map(|g| g.to_string())
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| format!("{f:.0}"))),
        _ => None,
    }
}

impl TryFrom<BankRecord> for Question {
    type Error = String;

    /// Convert a raw record into the canonical question, normalizing subject
    /// and grade and enforcing the option invariants.
    fn try_from(record: BankRecord) -> Result<Self, Self::Error> {
        let id = record
            .id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| "missing id".to_string())?;
        let grade = grade_from_value(&record.grade)
            .ok_or_else(|| format!("{id}: missing or invalid grade"))?;
        let difficulty = record
            .difficulty
            .as_deref()
            .and_then(Difficulty::parse)
            .ok_or_else(|| format!("{id}: missing or invalid difficulty"))?;
        let correct_answer = record
            .correct_answer
            .ok_or_else(|| format!("{id}: missing correct answer"))?;

        let question = Question {
            id,
            content: record.content,
            options: record.options,
            correct_answer,
            explanation: record.explanation,
            subject: canonical_subject(&record.subject),
            topic: record.topic,
            grade,
            difficulty,
            tags: record.tags.into_iter().collect(),
            is_generated: record.is_generated,
        };
        question.check().map_err(|reason| format!("{}: {reason}", question.id))?;
        Ok(question)
    }
}

// ---------------------------------------------------------------------------
// Outbound: client view-models
// ---------------------------------------------------------------------------

/// Map a question to the JSON shape the practice UI renders.
///
/// The answer key and explanation are only included when `reveal` is set,
/// e.g. after the learner has submitted.
pub fn to_client_question(q: &Question, reveal: bool) -> Value {
    let mut view = json!({
        "id": q.id,
        "content": q.content,
        "options": q.options,
        "subject": q.subject,
        "topic": q.topic,
        "grade": q.grade,
        "difficulty": q.difficulty.to_string(),
        "tags": q.tags,
        "isGenerated": q.is_generated,
    });
    if reveal {
        view["correctAnswer"] = json!(q.correct_answer);
        view["explanation"] = json!(q.explanation);
    }
    view
}

/// Map an assembled test to the timed-test client shape with answers hidden.
pub fn to_client_test(test: &GeneratedTest) -> Value {
    let sections: Vec<Value> = test
        .sections
        .iter()
        .map(|s| {
            json!({
                "name": s.name,
                "subject": s.subject,
                "startIndex": s.start_index,
                "endIndex": s.end_index,
                "questionCount": s.questions.len(),
                "supplemented": s.supplemented,
            })
        })
        .collect();

    json!({
        "id": test.id,
        "format": test.format_name,
        "grade": test.grade,
        "timeLimitMinutes": test.time_limit_minutes,
        "totalQuestions": test.total_questions,
        "sections": sections,
        "questions": test.questions.iter().map(|q| to_client_question(q, false)).collect::<Vec<_>>(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> Result<Question, String> {
        let record: BankRecord = serde_json::from_str(raw).expect("record json");
        Question::try_from(record)
    }

    #[test]
    fn legacy_record_shape_is_normalized() {
        let q = parse(
            r#"{"_id":"abc","content":"2+2?","options":["3","4"],"correctAnswer":"4",
                "subject":"Mathematics","grade":5,"difficulty":"EASY"}"#,
        )
        .unwrap();
        assert_eq!(q.id, "abc");
        assert_eq!(q.subject, "math");
        assert_eq!(q.grade, "5");
        assert_eq!(q.difficulty, Difficulty::Easy);
        assert!(!q.is_generated);
    }

    #[test]
    fn record_with_answer_outside_options_is_rejected() {
        let err = parse(
            r#"{"id":"bad","content":"?","options":["a","b"],"correctAnswer":"c",
                "subject":"english","grade":"4","difficulty":"medium"}"#,
        )
        .unwrap_err();
        assert!(err.contains("bad"));
    }

    #[test]
    fn record_without_grade_is_rejected() {
        assert!(parse(
            r#"{"id":"g","content":"?","options":["a","b"],"correctAnswer":"a",
                "subject":"english","difficulty":"medium"}"#,
        )
        .is_err());
    }

    #[test]
    fn client_view_hides_answer_until_revealed() {
        let q = parse(
            r#"{"id":"v","content":"Pick b","options":["a","b"],"correctAnswer":"b",
                "explanation":"it is b","subject":"english","grade":"3","difficulty":"hard"}"#,
        )
        .unwrap();
        let hidden = to_client_question(&q, false);
        assert!(hidden.get("correctAnswer").is_none());
        assert_eq!(hidden["difficulty"], "hard");

        let shown = to_client_question(&q, true);
        assert_eq!(shown["correctAnswer"], "b");
        assert_eq!(shown["explanation"], "it is b");
    }
}
