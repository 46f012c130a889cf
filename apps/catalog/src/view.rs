//! View-state resolution: filtered catalog or one isolated record.

use exercise_core::{apply_filters, Catalog, Exercise, FacetState, FacetTag};
use std::sync::Arc;

/// What the presentation layer should show.
#[derive(Debug, Clone, PartialEq)]
pub enum View {
    /// The filtered catalog. An empty list means the facets matched nothing.
    Catalog {
        records: Vec<Arc<Exercise>>,
        tags: Vec<FacetTag>,
    },
    /// One record selected by id. Facet tags are not shown.
    Single { record: Arc<Exercise> },
    /// The requested id is not in the catalog.
    NotFound { id: String },
}

impl View {
    pub fn records(&self) -> &[Arc<Exercise>] {
        match self {
            Self::Catalog { records, .. } => records,
            Self::Single { record } => std::slice::from_ref(record),
            Self::NotFound { .. } => &[],
        }
    }

    pub fn tags(&self) -> &[FacetTag] {
        match self {
            Self::Catalog { tags, .. } => tags,
            _ => &[],
        }
    }

    /// Whether the facets filtered everything out. Never true for a missing id.
    pub fn is_no_match(&self) -> bool {
        matches!(self, Self::Catalog { records, .. } if records.is_empty())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Tracks whether a single record is isolated and builds the current view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewResolver {
    single: Option<String>,
}

impl ViewResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Isolate the record with this id. The catalog should be fully loaded
    /// before resolving, since the id may lie beyond the loaded prefix.
    pub fn select_single(&mut self, id: impl Into<String>) {
        self.single = Some(id.into());
    }

    /// Go back to the filtered catalog under the current facets.
    pub fn return_to_catalog(&mut self) -> bool {
        self.single.take().is_some()
    }

    pub fn resolve(&self, facets: &FacetState, catalog: &Catalog) -> View {
        match &self.single {
            Some(id) => match catalog.get(id) {
                Some(record) => View::Single {
                    record: Arc::clone(record),
                },
                None => View::NotFound { id: id.clone() },
            },
            None => View::Catalog {
                records: apply_filters(facets, catalog),
                tags: facets.tags(),
            },
        }
    }
}
