//! Event-driven catalog session.
//!
//! Every inbound trigger runs to completion and reports its results through
//! the [`Presenter`]. Load failures are logged and shown as a load state;
//! they never abort the session.

use crate::error::{CatalogError, Result};
use crate::loader::{BatchOutcome, CatalogLoader, LoadState, Pagination};
use crate::source::RecordSource;
use crate::view::{View, ViewResolver};
use exercise_core::{
    offered_values, AnswerInput, AnswerKind, AnswerPhase, AnswerState, CompositeAnswers, Exercise,
    ExerciseBody, Facet, FacetState, Matching, SourceTaxonomy, Submission, Taxonomy, TopicScope,
    Verdict, VerifyError,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Shown when a solution is revealed for a question without solution text.
pub const SOLUTION_PLACEHOLDER: &str = "Teisingas atsakymas parodytas.";

/// Identifies one answerable question: a standalone exercise, or one
/// sub-question of a composite exercise.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct QuestionKey {
    pub exercise_id: String,
    pub question_id: Option<String>,
}

impl QuestionKey {
    pub fn exercise(exercise_id: impl Into<String>) -> Self {
        Self {
            exercise_id: exercise_id.into(),
            question_id: None,
        }
    }

    pub fn sub_question(exercise_id: impl Into<String>, question_id: impl Into<String>) -> Self {
        Self {
            exercise_id: exercise_id.into(),
            question_id: Some(question_id.into()),
        }
    }
}

/// Feedback for one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum Feedback {
    Graded { verdict: Verdict },
    /// A required field is empty; nothing was scored.
    Incomplete,
    SolutionShown { solution: String, input: AnswerInput },
    /// The surface is cleared. A verdict, if any, stays on display.
    SolutionHidden {
        verdict: Option<Verdict>,
        input: AnswerInput,
    },
}

/// The rendering surface driven by the session.
///
/// Legacy pair matchings draw their selector values from
/// [`CatalogSession::offered_values`].
pub trait Presenter {
    fn render_view(&mut self, view: &View);

    fn render_facet_controls(
        &mut self,
        taxonomy: &Taxonomy,
        sources: &SourceTaxonomy,
        state: &FacetState,
    );

    fn render_feedback(&mut self, question: &QuestionKey, feedback: &Feedback);

    fn render_load_state(&mut self, state: &LoadState, pagination: &Pagination);
}

/// Answers given so far for one exercise.
#[derive(Debug, Clone)]
enum AnswerBoard {
    Single(AnswerState),
    Composite(CompositeAnswers),
}

impl AnswerBoard {
    fn new(exercise: &Exercise) -> Self {
        match &exercise.body {
            ExerciseBody::Single(kind) => Self::Single(AnswerState::new(kind)),
            ExerciseBody::Composite(composite) => Self::Composite(CompositeAnswers::new(composite)),
        }
    }
}

/// Catalog browsing and answering for one user session.
pub struct CatalogSession<S, P> {
    loader: CatalogLoader<S>,
    taxonomy: Taxonomy,
    sources: SourceTaxonomy,
    facets: FacetState,
    resolver: ViewResolver,
    answers: HashMap<String, AnswerBoard>,
    presenter: P,
}

impl<S: RecordSource, P: Presenter> CatalogSession<S, P> {
    pub fn new(loader: CatalogLoader<S>, presenter: P) -> Self {
        Self {
            loader,
            taxonomy: Taxonomy::empty(),
            sources: SourceTaxonomy::builtin(),
            facets: FacetState::new(),
            resolver: ViewResolver::new(),
            answers: HashMap::new(),
            presenter,
        }
    }

    pub fn loader(&self) -> &CatalogLoader<S> {
        &self.loader
    }

    pub fn facets(&self) -> &FacetState {
        &self.facets
    }

    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    pub fn answer_state(&self, key: &QuestionKey) -> Option<&AnswerState> {
        match (self.answers.get(&key.exercise_id)?, key.question_id.as_deref()) {
            (AnswerBoard::Single(state), None) => Some(state),
            (AnswerBoard::Composite(answers), Some(id)) => answers.get(id),
            _ => None,
        }
    }

    /// Phase of every sub-question of a composite exercise, in display order.
    pub fn composite_phases(&self, exercise_id: &str) -> Option<Vec<(&str, AnswerPhase)>> {
        match self.answers.get(exercise_id)? {
            AnswerBoard::Composite(answers) => Some(answers.phases()),
            AnswerBoard::Single(_) => None,
        }
    }

    /// Read the taxonomy, draw the facet controls and show the first batch.
    pub async fn start(&mut self) {
        self.taxonomy = self.loader.load_taxonomy().await;
        self.render_controls();
        self.load_more().await;
        info!("Catalog session started");
    }

    /// Scroll-proximity signal. Loads one more batch unless one is in flight
    /// or the catalog is exhausted.
    pub async fn notify_load_more(&mut self) {
        if !self.loader.pagination().await.has_more() {
            debug!("Catalog exhausted, nothing more to load");
            return;
        }
        self.load_more().await;
    }

    /// Isolate one record by id, loading the whole catalog first.
    pub async fn request_single_record(&mut self, id: &str) {
        self.ensure_complete().await;
        self.resolver.select_single(id);
        self.refresh_view().await;
    }

    pub async fn request_return_to_catalog(&mut self) {
        if self.resolver.return_to_catalog() {
            self.refresh_view().await;
        }
    }

    pub async fn request_clear_all(&mut self) {
        if self.facets.clear_all() {
            self.render_controls();
            self.refresh_view().await;
        }
    }

    /// Select or deselect a facet value. Topic and source values the
    /// taxonomies do not list cannot be selected.
    pub async fn request_facet_toggle(&mut self, facet: Facet, selected: bool) {
        if selected && !self.offers(&facet) {
            warn!("Ignoring unknown facet value {:?}", facet);
            return;
        }
        if self.facets.toggle(facet, selected, &self.taxonomy) {
            self.render_controls();
            self.on_facets_changed().await;
        }
    }

    pub async fn set_search(&mut self, term: &str) {
        if self.facets.set_search(term) {
            self.on_facets_changed().await;
        }
    }

    /// Click an option of a multiple-choice question.
    pub async fn select_option(&mut self, key: &QuestionKey, option: &str) -> Result<bool> {
        let exercise = self.exercise(key).await?;
        let state = board_state(&mut self.answers, &exercise, key)?;

        match state.input_mut() {
            AnswerInput::Choice(choice) => Ok(choice.click(option)),
            other => Err(VerifyError::InputMismatch {
                expected: "choice",
                actual: other.shape(),
            }
            .into()),
        }
    }

    /// Replace the whole input surface of a question.
    pub async fn set_input(&mut self, key: &QuestionKey, input: AnswerInput) -> Result<()> {
        let exercise = self.exercise(key).await?;
        *board_state(&mut self.answers, &exercise, key)?.input_mut() = input;
        Ok(())
    }

    /// Grade the current input of a question.
    pub async fn submit_answer(&mut self, key: &QuestionKey) -> Result<Submission> {
        let exercise = self.exercise(key).await?;
        let kind = question_kind(&exercise, key)?.0;
        let submission = board_state(&mut self.answers, &exercise, key)?.submit(kind)?;
        let feedback = match submission {
            Submission::Graded(verdict) => Feedback::Graded { verdict },
            Submission::Incomplete => Feedback::Incomplete,
        };
        self.presenter.render_feedback(key, &feedback);
        Ok(submission)
    }

    /// Show or hide the reference answer. Returns whether it is now shown.
    pub async fn toggle_solution(&mut self, key: &QuestionKey) -> Result<bool> {
        let exercise = self.exercise(key).await?;
        let (kind, solution) = question_kind(&exercise, key)?;
        let state = board_state(&mut self.answers, &exercise, key)?;

        let shown = state.toggle_solution(kind);
        let feedback = if shown {
            Feedback::SolutionShown {
                solution: solution.unwrap_or(SOLUTION_PLACEHOLDER).to_string(),
                input: state.input().clone(),
            }
        } else {
            Feedback::SolutionHidden {
                verdict: state.verdict(),
                input: state.input().clone(),
            }
        };
        self.presenter.render_feedback(key, &feedback);
        Ok(shown)
    }

    /// Selector values of a legacy pair matching, shuffled for display.
    /// `None` for questions without pair selectors.
    pub async fn offered_values(&self, key: &QuestionKey) -> Result<Option<Vec<String>>> {
        let exercise = self.exercise(key).await?;
        match question_kind(&exercise, key)?.0 {
            AnswerKind::Matching(Matching::Pairs { pairs }) => {
                Ok(Some(offered_values(pairs, &mut rand::thread_rng())))
            }
            _ => Ok(None),
        }
    }

    async fn exercise(&self, key: &QuestionKey) -> Result<Arc<Exercise>> {
        self.loader
            .catalog()
            .await
            .get(&key.exercise_id)
            .cloned()
            .ok_or_else(|| CatalogError::UnknownRecord(key.exercise_id.clone()))
    }

    async fn on_facets_changed(&mut self) {
        if self.facets.is_active() {
            self.ensure_complete().await;
        }
        self.refresh_view().await;
    }

    async fn load_more(&mut self) {
        match self.loader.load_next_batch().await {
            Ok(BatchOutcome::Loaded { added }) => {
                debug!("Appended {} records", added);
                self.refresh_view().await;
            }
            Ok(BatchOutcome::InFlight) => return,
            Ok(BatchOutcome::Exhausted) => {}
            Err(e) => warn!("Load more failed: {}", e),
        }
        self.report_load_state().await;
    }

    /// Drain the manifest so filtering sees every record.
    async fn ensure_complete(&mut self) {
        if let Err(e) = self.loader.load_all().await {
            warn!("Catalog incomplete, filtering loaded records only: {}", e);
        }
        self.report_load_state().await;
    }

    async fn refresh_view(&mut self) {
        let catalog = self.loader.catalog().await;
        let view = self.resolver.resolve(&self.facets, &catalog);
        self.presenter.render_view(&view);
    }

    async fn report_load_state(&mut self) {
        let state = self.loader.load_state().await;
        let pagination = self.loader.pagination().await;
        self.presenter.render_load_state(&state, &pagination);
    }

    /// Whether the taxonomies list this facet value.
    fn offers(&self, facet: &Facet) -> bool {
        match facet {
            Facet::Topic(name) => {
                let grade = match self.facets.topic_scope(&self.taxonomy) {
                    TopicScope::Topics(grade) | TopicScope::NoTopics(grade) => Some(grade),
                    TopicScope::SelectGrade | TopicScope::SingleGradeOnly => None,
                };
                self.taxonomy.contains(grade, name)
            }
            Facet::Source(name) => self.sources.contains(name),
            Facet::Grade(_) | Facet::Type(_) => true,
        }
    }

    fn render_controls(&mut self) {
        self.presenter
            .render_facet_controls(&self.taxonomy, &self.sources, &self.facets);
    }
}

fn unknown_question(exercise: &Exercise, key: &QuestionKey) -> CatalogError {
    CatalogError::UnknownQuestion {
        exercise_id: exercise.id.clone(),
        question_id: key.question_id.clone().unwrap_or_default(),
    }
}

/// The answer kind and solution text a key points at.
fn question_kind<'e>(
    exercise: &'e Exercise,
    key: &QuestionKey,
) -> Result<(&'e AnswerKind, Option<&'e str>)> {
    match (&exercise.body, key.question_id.as_deref()) {
        (ExerciseBody::Single(kind), None) => Ok((kind, exercise.solution.as_deref())),
        (ExerciseBody::Composite(composite), Some(id)) => composite
            .question(id)
            .map(|q| (&q.kind, q.solution.as_deref()))
            .ok_or_else(|| unknown_question(exercise, key)),
        _ => Err(unknown_question(exercise, key)),
    }
}

/// The answer state a key points at, creating the exercise's board on first use.
fn board_state<'a>(
    answers: &'a mut HashMap<String, AnswerBoard>,
    exercise: &Exercise,
    key: &QuestionKey,
) -> Result<&'a mut AnswerState> {
    let board = answers
        .entry(exercise.id.clone())
        .or_insert_with(|| AnswerBoard::new(exercise));
    match (board, key.question_id.as_deref()) {
        (AnswerBoard::Single(state), None) => Ok(state),
        (AnswerBoard::Composite(answers), Some(id)) => answers
            .get_mut(id)
            .ok_or_else(|| unknown_question(exercise, key)),
        _ => Err(unknown_question(exercise, key)),
    }
}
