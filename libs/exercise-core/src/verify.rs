//! Answer verification for every question kind.

use crate::answer::{AnswerInput, MatchingInput};
use crate::error::VerifyError;
use crate::types::{AnswerKind, FillInBlanks, FreeText, Matching, MultipleChoice};
use serde::{Deserialize, Serialize};

/// Outcome of grading an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Correct,
    Incorrect,
}

impl Verdict {
    pub fn from_correct(correct: bool) -> Self {
        if correct { Self::Correct } else { Self::Incorrect }
    }

    pub fn is_correct(self) -> bool {
        self == Self::Correct
    }
}

/// Result of a submit action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "verdict", rename_all = "snake_case")]
pub enum Submission {
    Graded(Verdict),
    /// A required input was left empty; nothing was scored.
    Incomplete,
}

impl Submission {
    pub fn verdict(self) -> Option<Verdict> {
        match self {
            Self::Graded(verdict) => Some(verdict),
            Self::Incomplete => None,
        }
    }
}

/// Normalize an answer for comparison: decimal commas become dots and
/// surrounding whitespace is trimmed.
pub fn normalize_answer(s: &str) -> String {
    s.replace(',', ".").trim().to_string()
}

/// Compare two answers after normalization.
pub fn answers_match(typed: &str, correct: &str) -> bool {
    normalize_answer(typed) == normalize_answer(correct)
}

/// Grading capability shared by every question kind.
pub trait Verify {
    /// Shape of the input surface this kind is answered with.
    type Input: ?Sized;

    /// Grade an input, or report it incomplete when a required field is empty.
    fn verify(&self, input: &Self::Input) -> Result<Submission, VerifyError>;
}

impl Verify for FreeText {
    type Input = str;

    fn verify(&self, input: &str) -> Result<Submission, VerifyError> {
        if input.trim().is_empty() {
            return Ok(Submission::Incomplete);
        }
        Ok(Submission::Graded(Verdict::from_correct(answers_match(
            input,
            &self.correct_answer,
        ))))
    }
}

impl Verify for MultipleChoice {
    type Input = [String];

    fn verify(&self, selected: &[String]) -> Result<Submission, VerifyError> {
        if selected.is_empty() {
            return Ok(Submission::Incomplete);
        }

        let correct = if self.is_multi_select() {
            sorted_normalized(selected) == sorted_normalized(&self.correct_answers)
        } else {
            match (selected, self.correct_answers.first()) {
                ([choice], Some(correct)) => answers_match(choice, correct),
                _ => false,
            }
        };
        Ok(Submission::Graded(Verdict::from_correct(correct)))
    }
}

fn sorted_normalized(values: &[String]) -> Vec<String> {
    let mut normalized: Vec<String> = values.iter().map(|v| normalize_answer(v)).collect();
    normalized.sort();
    normalized.dedup();
    normalized
}

impl Verify for Matching {
    type Input = MatchingInput;

    fn verify(&self, input: &MatchingInput) -> Result<Submission, VerifyError> {
        match (self, input) {
            (
                Matching::Items { items, second_part },
                MatchingInput::Items {
                    selections,
                    second_part: typed_second,
                },
            ) => {
                if selections.len() != items.len() {
                    return Err(VerifyError::SlotCountMismatch {
                        expected: items.len(),
                        actual: selections.len(),
                    });
                }
                if selections.iter().any(|s| is_blank(s.as_deref())) {
                    return Ok(Submission::Incomplete);
                }

                let mut all_correct = items
                    .iter()
                    .zip(selections)
                    .all(|(item, chosen)| chosen.as_deref() == Some(item.correct_answer.as_str()));

                if let Some(part) = second_part {
                    let typed = typed_second.as_deref();
                    if is_blank(typed) {
                        return Ok(Submission::Incomplete);
                    }
                    all_correct &= answers_match(typed.unwrap_or_default(), &part.correct_answer);
                }

                Ok(Submission::Graded(Verdict::from_correct(all_correct)))
            }
            (Matching::Pairs { pairs }, MatchingInput::Pairs { selections }) => {
                if pairs
                    .iter()
                    .any(|pair| is_blank(selections.get(&pair.key).map(String::as_str)))
                {
                    return Ok(Submission::Incomplete);
                }

                let all_correct = pairs
                    .iter()
                    .all(|pair| selections.get(&pair.key) == Some(&pair.value));
                Ok(Submission::Graded(Verdict::from_correct(all_correct)))
            }
            (Matching::Items { .. }, MatchingInput::Pairs { .. }) => {
                Err(VerifyError::InputMismatch {
                    expected: "item selectors",
                    actual: "pair selectors",
                })
            }
            (Matching::Pairs { .. }, MatchingInput::Items { .. }) => {
                Err(VerifyError::InputMismatch {
                    expected: "pair selectors",
                    actual: "item selectors",
                })
            }
        }
    }
}

impl Verify for FillInBlanks {
    type Input = [String];

    fn verify(&self, slots: &[String]) -> Result<Submission, VerifyError> {
        if slots.len() != self.answers.len() {
            return Err(VerifyError::SlotCountMismatch {
                expected: self.answers.len(),
                actual: slots.len(),
            });
        }
        if slots.iter().any(|s| s.trim().is_empty()) {
            return Ok(Submission::Incomplete);
        }

        let all_correct = slots
            .iter()
            .zip(&self.answers)
            .all(|(typed, correct)| answers_match(typed, correct));
        Ok(Submission::Graded(Verdict::from_correct(all_correct)))
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

impl AnswerKind {
    /// Grade an input surface against this question, dispatching on the kind.
    pub fn verify(&self, input: &AnswerInput) -> Result<Submission, VerifyError> {
        match (self, input) {
            (AnswerKind::FreeText(q), AnswerInput::Text(text)) => q.verify(text),
            (AnswerKind::MultipleChoice(q), AnswerInput::Choice(choice)) => {
                q.verify(choice.selected())
            }
            (AnswerKind::Matching(q), AnswerInput::Matching(matching)) => q.verify(matching),
            (AnswerKind::FillInBlanks(q), AnswerInput::Blanks(slots)) => q.verify(slots),
            (kind, input) => Err(VerifyError::InputMismatch {
                expected: kind.exercise_type().as_str(),
                actual: input.shape(),
            }),
        }
    }
}
