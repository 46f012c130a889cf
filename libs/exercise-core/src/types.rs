//! Core types for the exercise catalog.

use crate::template::BlankTemplate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// School grade an exercise belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Grade(u8);

impl Grade {
    /// Every grade the catalog knows about, in display order.
    pub const ALL: [Grade; 4] = [Grade(9), Grade(10), Grade(11), Grade(12)];

    /// Create a grade from a raw number, rejecting anything outside 9-12.
    pub fn new(value: i64) -> Option<Self> {
        match value {
            9..=12 => Some(Self(value as u8)),
            _ => None,
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Grade {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(i64::from(value)).ok_or_else(|| format!("grade {value} outside 9-12"))
    }
}

impl From<Grade> for u8 {
    fn from(grade: Grade) -> Self {
        grade.0
    }
}

impl FromStr for Grade {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .ok()
            .and_then(Self::new)
            .ok_or_else(|| format!("invalid grade {s:?}"))
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Exercise type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseType {
    FreeText,
    MultipleChoice,
    Matching,
    FillInBlanks,
    Simulation,
    Structural,
}

impl Default for ExerciseType {
    fn default() -> Self {
        Self::FreeText
    }
}

impl ExerciseType {
    /// Get the type tag as written in record files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FreeText => "free_text",
            Self::MultipleChoice => "multiple_choice",
            Self::Matching => "matching",
            Self::FillInBlanks => "fill_in_blanks",
            Self::Simulation => "simulation",
            Self::Structural => "structural",
        }
    }

    /// Parse from a record file tag.
    pub fn from_tag(s: &str) -> Option<Self> {
        match s {
            "free_text" | "text" => Some(Self::FreeText),
            "multiple_choice" => Some(Self::MultipleChoice),
            "matching" => Some(Self::Matching),
            "fill_in_blanks" => Some(Self::FillInBlanks),
            "simulation" => Some(Self::Simulation),
            "structural" => Some(Self::Structural),
            _ => None,
        }
    }

    /// Whether records of this type hold sub-questions.
    pub fn is_composite(self) -> bool {
        matches!(self, Self::Simulation | Self::Structural)
    }
}

/// Where an exercise comes from, derived when the record is loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceTag {
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subsource: Option<String>,
}

impl SourceTag {
    pub fn new(source: impl Into<String>, subsource: Option<&str>) -> Self {
        Self {
            source: source.into(),
            subsource: subsource.map(str::to_string),
        }
    }
}

/// One exercise record as loaded from its source file. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Exercise {
    pub id: String,
    pub grade: Grade,
    pub topic: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtopic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subsubtopic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Rich text, may embed math markup.
    pub question: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solution: Option<String>,
    pub body: ExerciseBody,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceTag>,
}

impl Exercise {
    /// The type tag that governs this record's payload.
    pub fn exercise_type(&self) -> ExerciseType {
        match &self.body {
            ExerciseBody::Single(kind) => kind.exercise_type(),
            ExerciseBody::Composite(composite) => match composite.flavor {
                CompositeFlavor::Simulation => ExerciseType::Simulation,
                CompositeFlavor::Structural => ExerciseType::Structural,
            },
        }
    }

    pub fn is_composite(&self) -> bool {
        matches!(self.body, ExerciseBody::Composite(_))
    }

    /// Topic, subtopic and subsubtopic, skipping the absent levels.
    pub fn topic_levels(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.topic.as_str())
            .chain(self.subtopic.as_deref())
            .chain(self.subsubtopic.as_deref())
    }
}

/// Payload of an exercise: one answerable question, or a composite of sub-questions.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum ExerciseBody {
    Single(AnswerKind),
    Composite(Composite),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompositeFlavor {
    Simulation,
    Structural,
}

/// A simulation or structural exercise: ordered headers and sub-questions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Composite {
    pub flavor: CompositeFlavor,
    /// Applet file embedded by the presentation layer for simulations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub simulation_file: Option<String>,
    pub entries: Vec<QuestionEntry>,
}

impl Composite {
    /// Answerable sub-questions in display order.
    pub fn questions(&self) -> impl Iterator<Item = &SubQuestion> {
        self.entries.iter().filter_map(|entry| match entry {
            QuestionEntry::Question(q) => Some(q),
            QuestionEntry::Group { .. } => None,
        })
    }

    pub fn question(&self, id: &str) -> Option<&SubQuestion> {
        self.questions().find(|q| q.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "entry", rename_all = "snake_case")]
pub enum QuestionEntry {
    /// Display-only header, carries no answer.
    Group { heading: String },
    Question(SubQuestion),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubQuestion {
    pub id: String,
    pub question: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solution: Option<String>,
    pub kind: AnswerKind,
}

/// The answerable question kinds, each with its own verification rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnswerKind {
    FreeText(FreeText),
    MultipleChoice(MultipleChoice),
    Matching(Matching),
    FillInBlanks(FillInBlanks),
}

impl AnswerKind {
    pub fn exercise_type(&self) -> ExerciseType {
        match self {
            Self::FreeText(_) => ExerciseType::FreeText,
            Self::MultipleChoice(_) => ExerciseType::MultipleChoice,
            Self::Matching(_) => ExerciseType::Matching,
            Self::FillInBlanks(_) => ExerciseType::FillInBlanks,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FreeText {
    pub correct_answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MultipleChoice {
    pub options: Vec<String>,
    pub correct_answers: Vec<String>,
}

impl MultipleChoice {
    pub fn is_multi_select(&self) -> bool {
        self.correct_answers.len() > 1
    }

    /// How many options may be selected at the same time.
    pub fn selection_cap(&self) -> usize {
        self.correct_answers.len().max(1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "layout", rename_all = "snake_case")]
pub enum Matching {
    /// Independent selectors, each with its own options and designated answer.
    Items {
        items: Vec<MatchItem>,
        #[serde(skip_serializing_if = "Option::is_none")]
        second_part: Option<SecondPart>,
    },
    /// Legacy key/value pairs; values are offered shuffled.
    Pairs { pairs: Vec<MatchPair> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchItem {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
}

/// Free-text follow-up answered after the matching selectors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecondPart {
    pub correct_answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchPair {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FillInBlanks {
    pub template: BlankTemplate,
    /// Reference answer per slot, in slot order.
    pub answers: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grade_bounds() {
        assert_eq!(Grade::new(9).map(Grade::value), Some(9));
        assert_eq!(Grade::new(12).map(Grade::value), Some(12));
        assert!(Grade::new(8).is_none());
        assert!(Grade::new(13).is_none());
    }

    #[test]
    fn grade_from_str() {
        assert_eq!("11".parse::<Grade>(), Ok(Grade(11)));
        assert_eq!(" 10 ".parse::<Grade>(), Ok(Grade(10)));
        assert!("eleven".parse::<Grade>().is_err());
        assert_eq!(Grade(11).to_string(), "11");
    }

    #[test]
    fn exercise_type_tags() {
        for ty in [
            ExerciseType::FreeText,
            ExerciseType::MultipleChoice,
            ExerciseType::Matching,
            ExerciseType::FillInBlanks,
            ExerciseType::Simulation,
            ExerciseType::Structural,
        ] {
            assert_eq!(ExerciseType::from_tag(ty.as_str()), Some(ty));
        }
        assert_eq!(ExerciseType::from_tag("essay"), None);
        assert!(ExerciseType::Structural.is_composite());
        assert!(!ExerciseType::Matching.is_composite());
    }

    #[test]
    fn selection_cap_follows_answer_count() {
        let single = MultipleChoice {
            options: vec!["A".into(), "B".into()],
            correct_answers: vec!["A".into()],
        };
        assert!(!single.is_multi_select());
        assert_eq!(single.selection_cap(), 1);

        let multi = MultipleChoice {
            options: vec!["A".into(), "B".into(), "C".into()],
            correct_answers: vec!["A".into(), "C".into()],
        };
        assert!(multi.is_multi_select());
        assert_eq!(multi.selection_cap(), 2);
    }
}
