//! Shared test infrastructure for catalog integration tests.
//!
//! - `fixtures` builds record JSON and in-memory sources
//! - `RecordingPresenter` captures everything a session renders

#![allow(dead_code)]

pub mod fixtures;

use exercise_catalog::{Feedback, LoadState, Pagination, Presenter, QuestionKey, View};
use exercise_core::{FacetState, SourceTaxonomy, Taxonomy};

/// Presenter that keeps every render call for later inspection.
#[derive(Debug, Default)]
pub struct RecordingPresenter {
    pub views: Vec<View>,
    pub feedback: Vec<(QuestionKey, Feedback)>,
    pub load_states: Vec<(LoadState, Pagination)>,
    /// Facet state versions the controls were drawn for.
    pub controls: Vec<u64>,
}

impl RecordingPresenter {
    pub fn last_view(&self) -> &View {
        self.views.last().expect("no view rendered")
    }

    pub fn last_feedback(&self) -> &Feedback {
        &self.feedback.last().expect("no feedback rendered").1
    }

    pub fn last_load_state(&self) -> &(LoadState, Pagination) {
        self.load_states.last().expect("no load state rendered")
    }

    /// Ids of the records in the most recent view.
    pub fn shown_ids(&self) -> Vec<String> {
        self.last_view()
            .records()
            .iter()
            .map(|ex| ex.id.clone())
            .collect()
    }
}

impl Presenter for RecordingPresenter {
    fn render_view(&mut self, view: &View) {
        self.views.push(view.clone());
    }

    fn render_facet_controls(
        &mut self,
        _taxonomy: &Taxonomy,
        _sources: &SourceTaxonomy,
        state: &FacetState,
    ) {
        self.controls.push(state.version());
    }

    fn render_feedback(&mut self, question: &QuestionKey, feedback: &Feedback) {
        self.feedback.push((question.clone(), feedback.clone()));
    }

    fn render_load_state(&mut self, state: &LoadState, pagination: &Pagination) {
        self.load_states.push((state.clone(), *pagination));
    }
}
