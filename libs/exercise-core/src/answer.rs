//! Answer surfaces and the per-question answer state machine.
//!
//! A question starts unanswered. Submitting a complete surface grades it;
//! submitting with an empty required field is rejected without a state change.
//! Showing or hiding the solution never re-scores the last attempt.

use crate::error::VerifyError;
use crate::types::{AnswerKind, Composite, MatchPair, Matching};
use crate::verify::{Submission, Verdict};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use std::collections::BTreeMap;

/// What the user has entered for one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "surface", content = "value", rename_all = "snake_case")]
pub enum AnswerInput {
    Text(String),
    Choice(ChoiceInput),
    Matching(MatchingInput),
    Blanks(Vec<String>),
}

impl AnswerInput {
    /// An empty surface shaped for the given question.
    pub fn empty(kind: &AnswerKind) -> Self {
        match kind {
            AnswerKind::FreeText(_) => Self::Text(String::new()),
            AnswerKind::MultipleChoice(q) => Self::Choice(ChoiceInput::new(q.selection_cap())),
            AnswerKind::Matching(Matching::Items { items, .. }) => {
                Self::Matching(MatchingInput::Items {
                    selections: vec![None; items.len()],
                    second_part: None,
                })
            }
            AnswerKind::Matching(Matching::Pairs { .. }) => Self::Matching(MatchingInput::Pairs {
                selections: BTreeMap::new(),
            }),
            AnswerKind::FillInBlanks(q) => Self::Blanks(vec![String::new(); q.answers.len()]),
        }
    }

    /// A surface populated with the reference answer(s).
    pub fn reference(kind: &AnswerKind) -> Self {
        match kind {
            AnswerKind::FreeText(q) => Self::Text(q.correct_answer.clone()),
            AnswerKind::MultipleChoice(q) => Self::Choice(ChoiceInput {
                selected: q.correct_answers.clone(),
                cap: q.selection_cap(),
            }),
            AnswerKind::Matching(Matching::Items { items, second_part }) => {
                Self::Matching(MatchingInput::Items {
                    selections: items.iter().map(|i| Some(i.correct_answer.clone())).collect(),
                    second_part: second_part.as_ref().map(|p| p.correct_answer.clone()),
                })
            }
            AnswerKind::Matching(Matching::Pairs { pairs }) => Self::Matching(MatchingInput::Pairs {
                selections: pairs
                    .iter()
                    .map(|p| (p.key.clone(), p.value.clone()))
                    .collect(),
            }),
            AnswerKind::FillInBlanks(q) => Self::Blanks(q.answers.clone()),
        }
    }

    /// Short name of the surface shape, used in mismatch errors.
    pub fn shape(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Choice(_) => "choice",
            Self::Matching(_) => "matching",
            Self::Blanks(_) => "blanks",
        }
    }
}

/// Option selection for multiple-choice questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChoiceInput {
    selected: Vec<String>,
    cap: usize,
}

impl ChoiceInput {
    /// Empty selection allowing up to `cap` options at once.
    pub fn new(cap: usize) -> Self {
        Self {
            selected: Vec::new(),
            cap: cap.max(1),
        }
    }

    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Apply a click on an option. Returns whether the selection changed.
    ///
    /// Single-select replaces the current choice. Multi-select toggles the
    /// option; once the cap is reached further new options are ignored.
    pub fn click(&mut self, option: &str) -> bool {
        if self.cap == 1 {
            if self.selected.len() == 1 && self.selected[0] == option {
                return false;
            }
            self.selected = vec![option.to_string()];
            return true;
        }

        if let Some(pos) = self.selected.iter().position(|s| s == option) {
            self.selected.remove(pos);
            return true;
        }
        if self.selected.len() >= self.cap {
            return false;
        }
        self.selected.push(option.to_string());
        true
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }
}

/// Selector values for matching questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "layout", rename_all = "snake_case")]
pub enum MatchingInput {
    /// One slot per item, in item order, plus the optional second-part text.
    Items {
        selections: Vec<Option<String>>,
        second_part: Option<String>,
    },
    /// Chosen value per pair key.
    Pairs { selections: BTreeMap<String, String> },
}

/// Values offered in every selector of a legacy pair matching, in random order.
pub fn offered_values<R: Rng + ?Sized>(pairs: &[MatchPair], rng: &mut R) -> Vec<String> {
    let mut values: Vec<String> = pairs.iter().map(|p| p.value.clone()).collect();
    values.shuffle(rng);
    values
}

/// Where a question is in its lifecycle, ignoring the solution view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", content = "verdict", rename_all = "snake_case")]
pub enum AnswerPhase {
    Unanswered,
    Attempted(Verdict),
}

/// Answer state of one displayed question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerState {
    input: AnswerInput,
    verdict: Option<Verdict>,
    solution_shown: bool,
}

impl AnswerState {
    pub fn new(kind: &AnswerKind) -> Self {
        Self {
            input: AnswerInput::empty(kind),
            verdict: None,
            solution_shown: false,
        }
    }

    pub fn input(&self) -> &AnswerInput {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut AnswerInput {
        &mut self.input
    }

    pub fn phase(&self) -> AnswerPhase {
        match self.verdict {
            Some(verdict) => AnswerPhase::Attempted(verdict),
            None => AnswerPhase::Unanswered,
        }
    }

    /// Verdict of the most recent graded attempt.
    pub fn verdict(&self) -> Option<Verdict> {
        self.verdict
    }

    pub fn is_showing_answer(&self) -> bool {
        self.solution_shown
    }

    /// Whether the feedback box has anything to show.
    pub fn feedback_visible(&self) -> bool {
        self.verdict.is_some() || self.solution_shown
    }

    /// Grade the current surface. An incomplete surface leaves the state untouched.
    pub fn submit(&mut self, kind: &AnswerKind) -> Result<Submission, VerifyError> {
        let submission = kind.verify(&self.input)?;
        if let Submission::Graded(verdict) = submission {
            self.verdict = Some(verdict);
        }
        Ok(submission)
    }

    /// Fill the surface with the reference answer and tag it as showing the answer.
    pub fn show_solution(&mut self, kind: &AnswerKind) {
        self.input = AnswerInput::reference(kind);
        self.solution_shown = true;
    }

    /// Clear the surface and drop the tag. The last verdict stays displayed.
    pub fn hide_solution(&mut self, kind: &AnswerKind) {
        self.input = AnswerInput::empty(kind);
        self.solution_shown = false;
    }

    /// Flip the solution view. Returns whether the solution is now shown.
    pub fn toggle_solution(&mut self, kind: &AnswerKind) -> bool {
        if self.solution_shown {
            self.hide_solution(kind);
        } else {
            self.show_solution(kind);
        }
        self.solution_shown
    }
}

/// Independent answer states for every sub-question of a composite exercise.
///
/// There is no aggregate verdict; each sub-question reports its own phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompositeAnswers {
    states: Vec<(String, AnswerState)>,
}

impl CompositeAnswers {
    pub fn new(composite: &Composite) -> Self {
        Self {
            states: composite
                .questions()
                .map(|q| (q.id.clone(), AnswerState::new(&q.kind)))
                .collect(),
        }
    }

    pub fn get(&self, question_id: &str) -> Option<&AnswerState> {
        self.states
            .iter()
            .find(|(id, _)| id == question_id)
            .map(|(_, state)| state)
    }

    pub fn get_mut(&mut self, question_id: &str) -> Option<&mut AnswerState> {
        self.states
            .iter_mut()
            .find(|(id, _)| id == question_id)
            .map(|(_, state)| state)
    }

    /// Phase of every sub-question, in display order.
    pub fn phases(&self) -> Vec<(&str, AnswerPhase)> {
        self.states
            .iter()
            .map(|(id, state)| (id.as_str(), state.phase()))
            .collect()
    }
}
