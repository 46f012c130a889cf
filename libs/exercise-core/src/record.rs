//! Decoding of exercise record files.
//!
//! Record files are JSON objects. The `type` tag selects which payload fields
//! are read; an absent tag means a free-text exercise.
//!
//! ```json
//! {
//!   "id": "ohm-01",
//!   "grade": 11,
//!   "topic": "Elektra ir magnetizmas",
//!   "question": "R = 2 Ω, I = 1,75 A. U = ?",
//!   "correctAnswer": "3,5",
//!   "unit": "V"
//! }
//! ```

use crate::error::{RecordError, Result};
use crate::template::BlankTemplate;
use crate::types::{
    AnswerKind, Composite, CompositeFlavor, Exercise, ExerciseBody, ExerciseType, FillInBlanks,
    FreeText, Grade, MatchItem, MatchPair, Matching, MultipleChoice, QuestionEntry, SecondPart,
    SubQuestion,
};
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::collections::HashSet;
use std::fmt;

/// Entry tag marking a display-only header inside a composite exercise.
const GROUP_TAG: &str = "group";

/// Decode one record file.
pub fn decode(bytes: &[u8]) -> Result<Exercise> {
    let raw: RawRecord = serde_json::from_slice(bytes)?;
    raw.build()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRecord {
    id: String,
    grade: RawGrade,
    #[serde(default)]
    topic: Option<String>,
    #[serde(default)]
    subtopic: Option<String>,
    #[serde(default)]
    subsubtopic: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    question: String,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    solution: Option<String>,
    #[serde(default, alias = "simulation")]
    simulation_file: Option<String>,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    questions: Vec<RawEntry>,
    #[serde(flatten)]
    payload: RawPayload,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEntry {
    #[serde(default)]
    id: Option<String>,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    question: String,
    #[serde(default)]
    solution: Option<String>,
    #[serde(flatten)]
    payload: RawPayload,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPayload {
    #[serde(default)]
    correct_answer: Option<RawAnswer>,
    #[serde(default)]
    unit: Option<String>,
    #[serde(default)]
    options: Option<Vec<String>>,
    #[serde(default)]
    match_items: Option<Vec<MatchItem>>,
    #[serde(default)]
    second_part: Option<RawSecondPart>,
    #[serde(default)]
    pairs: Option<OrderedPairs>,
    #[serde(default)]
    template: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawGrade {
    Number(i64),
    Text(String),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawAnswer {
    Text(String),
    Number(serde_json::Number),
    List(Vec<String>),
}

impl RawAnswer {
    fn into_list(self) -> Vec<String> {
        match self {
            RawAnswer::Text(s) => vec![s],
            RawAnswer::Number(n) => vec![n.to_string()],
            RawAnswer::List(list) => list,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSecondPart {
    correct_answer: RawAnswer,
    #[serde(default)]
    unit: Option<String>,
}

/// JSON object of key/value pairs, decoded in document order.
#[derive(Debug)]
struct OrderedPairs(Vec<MatchPair>);

impl<'de> Deserialize<'de> for OrderedPairs {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct PairsVisitor;

        impl<'de> Visitor<'de> for PairsVisitor {
            type Value = OrderedPairs;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object of matching pairs")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut map: A,
            ) -> std::result::Result<Self::Value, A::Error> {
                let mut pairs = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, value)) = map.next_entry::<String, String>()? {
                    pairs.push(MatchPair { key, value });
                }
                Ok(OrderedPairs(pairs))
            }
        }

        deserializer.deserialize_map(PairsVisitor)
    }
}

impl RawRecord {
    fn build(self) -> Result<Exercise> {
        let id = self.id;
        let grade = parse_grade(&id, self.grade)?;
        let topic = self.topic.ok_or_else(|| RecordError::MissingField {
            id: id.clone(),
            field: "topic",
        })?;
        let tag = parse_tag(&id, self.kind.as_deref())?;

        let body = if tag.is_composite() {
            let flavor = match tag {
                ExerciseType::Simulation => CompositeFlavor::Simulation,
                _ => CompositeFlavor::Structural,
            };
            ExerciseBody::Composite(Composite {
                flavor,
                simulation_file: self.simulation_file,
                entries: build_entries(&id, self.questions)?,
            })
        } else {
            ExerciseBody::Single(build_answer_kind(&id, tag, self.payload)?)
        };

        Ok(Exercise {
            id,
            grade,
            topic,
            subtopic: self.subtopic,
            subsubtopic: self.subsubtopic,
            category: self.category,
            question: self.question,
            image: self.image,
            solution: self.solution,
            body,
            source: None,
        })
    }
}

fn parse_grade(id: &str, raw: RawGrade) -> Result<Grade> {
    let value = match raw {
        RawGrade::Number(n) => n,
        RawGrade::Text(s) => s.trim().parse().map_err(|_| RecordError::InvalidPayload {
            id: id.to_string(),
            reason: format!("grade {s:?} is not a number"),
        })?,
    };
    Grade::new(value).ok_or(RecordError::InvalidGrade {
        id: id.to_string(),
        grade: value,
    })
}

fn parse_tag(id: &str, tag: Option<&str>) -> Result<ExerciseType> {
    match tag {
        None | Some("") => Ok(ExerciseType::FreeText),
        Some(tag) => ExerciseType::from_tag(tag).ok_or_else(|| RecordError::UnknownType {
            id: id.to_string(),
            tag: tag.to_string(),
        }),
    }
}

fn build_entries(id: &str, entries: Vec<RawEntry>) -> Result<Vec<QuestionEntry>> {
    let mut seen = HashSet::new();
    let mut built = Vec::with_capacity(entries.len());

    for entry in entries {
        if entry.kind.as_deref() == Some(GROUP_TAG) {
            built.push(QuestionEntry::Group {
                heading: entry.question,
            });
            continue;
        }

        let question_id = entry.id.ok_or_else(|| RecordError::MissingField {
            id: id.to_string(),
            field: "questions[].id",
        })?;
        if !seen.insert(question_id.clone()) {
            return Err(RecordError::DuplicateQuestionId {
                id: id.to_string(),
                question_id,
            });
        }

        let scope = format!("{id}/{question_id}");
        let tag = parse_tag(&scope, entry.kind.as_deref())?;
        if tag.is_composite() {
            return Err(RecordError::InvalidPayload {
                id: scope,
                reason: "composite exercises cannot be nested".to_string(),
            });
        }

        built.push(QuestionEntry::Question(SubQuestion {
            kind: build_answer_kind(&scope, tag, entry.payload)?,
            id: question_id,
            question: entry.question,
            solution: entry.solution,
        }));
    }

    Ok(built)
}

fn build_answer_kind(id: &str, tag: ExerciseType, payload: RawPayload) -> Result<AnswerKind> {
    let missing = |field: &'static str| RecordError::MissingField {
        id: id.to_string(),
        field,
    };

    match tag {
        ExerciseType::FreeText => {
            let mut answers = payload
                .correct_answer
                .ok_or_else(|| missing("correctAnswer"))?
                .into_list();
            if answers.len() != 1 {
                return Err(RecordError::InvalidPayload {
                    id: id.to_string(),
                    reason: format!("free-text answer must be a single value, got {}", answers.len()),
                });
            }
            Ok(AnswerKind::FreeText(FreeText {
                correct_answer: answers.remove(0),
                unit: payload.unit,
            }))
        }
        ExerciseType::MultipleChoice => {
            let options = payload.options.ok_or_else(|| missing("options"))?;
            let correct_answers = payload
                .correct_answer
                .ok_or_else(|| missing("correctAnswer"))?
                .into_list();
            if correct_answers.is_empty() {
                return Err(missing("correctAnswer"));
            }
            Ok(AnswerKind::MultipleChoice(MultipleChoice {
                options,
                correct_answers,
            }))
        }
        ExerciseType::Matching => {
            if let Some(items) = payload.match_items {
                let second_part = payload.second_part.map(|part| SecondPart {
                    correct_answer: part.correct_answer.into_list().join(", "),
                    unit: part.unit,
                });
                Ok(AnswerKind::Matching(Matching::Items { items, second_part }))
            } else if let Some(OrderedPairs(pairs)) = payload.pairs {
                Ok(AnswerKind::Matching(Matching::Pairs { pairs }))
            } else {
                Err(missing("matchItems"))
            }
        }
        ExerciseType::FillInBlanks => {
            let template = BlankTemplate::parse(&payload.template.ok_or_else(|| missing("template"))?);
            let answers = payload
                .correct_answer
                .map(RawAnswer::into_list)
                .unwrap_or_default();
            if answers.len() != template.slot_count() {
                return Err(RecordError::BlankCountMismatch {
                    id: id.to_string(),
                    slots: template.slot_count(),
                    answers: answers.len(),
                });
            }
            Ok(AnswerKind::FillInBlanks(FillInBlanks { template, answers }))
        }
        ExerciseType::Simulation | ExerciseType::Structural => Err(RecordError::InvalidPayload {
            id: id.to_string(),
            reason: "composite type where a single question was expected".to_string(),
        }),
    }
}
