//! Facet state, the in-memory catalog and the filter engine.
//!
//! Facets combine with AND; values selected within one facet combine with OR.
//! [`apply_filters`] is pure: the same state and catalog always give the same view.

use crate::taxonomy::Taxonomy;
use crate::types::{Exercise, ExerciseType, Grade};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Values of the exercise-type facet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeFacet {
    Simulation,
    Structural,
    /// Neither simulation nor structural.
    Normal,
}

impl TypeFacet {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Simulation => "simulation",
            Self::Structural => "structural",
            Self::Normal => "normal",
        }
    }

    pub fn from_tag(s: &str) -> Option<Self> {
        match s {
            "simulation" => Some(Self::Simulation),
            "structural" => Some(Self::Structural),
            "normal" => Some(Self::Normal),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Simulation => "Simuliacinės",
            Self::Structural => "Struktūrinės",
            Self::Normal => "Vienos dalies",
        }
    }

    pub fn admits(self, ty: ExerciseType) -> bool {
        match self {
            Self::Simulation => ty == ExerciseType::Simulation,
            Self::Structural => ty == ExerciseType::Structural,
            Self::Normal => !ty.is_composite(),
        }
    }
}

/// One selectable value of a toggleable facet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "facet", content = "value", rename_all = "snake_case")]
pub enum Facet {
    Grade(Grade),
    Topic(String),
    Type(TypeFacet),
    Source(String),
}

/// A removable tag describing one active selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FacetTag {
    pub facet: Facet,
    pub label: String,
}

/// What the topic control can offer for the current grade selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "scope", content = "grade", rename_all = "snake_case")]
pub enum TopicScope {
    /// No grade selected yet.
    SelectGrade,
    /// More than one grade selected.
    SingleGradeOnly,
    /// The one selected grade has no topics.
    NoTopics(Grade),
    Topics(Grade),
}

/// The five filter dimensions. Created empty, reset by [`FacetState::clear_all`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FacetState {
    version: u64,
    search: String,
    grades: BTreeSet<Grade>,
    topics: Vec<String>,
    types: BTreeSet<TypeFacet>,
    sources: Vec<String>,
}

impl FacetState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bumped on every change, so callers can tell stale views apart.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn grades(&self) -> &BTreeSet<Grade> {
        &self.grades
    }

    pub fn topics(&self) -> &[String] {
        &self.topics
    }

    pub fn types(&self) -> &BTreeSet<TypeFacet> {
        &self.types
    }

    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    /// Whether any facet narrows the catalog.
    pub fn is_active(&self) -> bool {
        !self.search.is_empty()
            || !self.grades.is_empty()
            || !self.topics.is_empty()
            || !self.types.is_empty()
            || !self.sources.is_empty()
    }

    /// Set the search term. Stored lowercased, whitespace kept as typed;
    /// returns whether it changed.
    pub fn set_search(&mut self, term: &str) -> bool {
        let normalized = term.to_lowercase();
        if normalized == self.search {
            return false;
        }
        self.search = normalized;
        self.bump();
        true
    }

    /// Select or deselect one facet value. Returns whether the state changed.
    ///
    /// Changing the grade selection clears the topic facet. Selecting a topic
    /// drops any selected ancestor or descendant on the same branch.
    pub fn toggle(&mut self, facet: Facet, selected: bool, taxonomy: &Taxonomy) -> bool {
        let changed = match facet {
            Facet::Grade(grade) => {
                let changed = if selected {
                    self.grades.insert(grade)
                } else {
                    self.grades.remove(&grade)
                };
                if changed {
                    self.topics.clear();
                }
                changed
            }
            Facet::Topic(name) => {
                if selected {
                    self.select_topic(name, taxonomy)
                } else {
                    remove_value(&mut self.topics, &name)
                }
            }
            Facet::Type(ty) => {
                if selected {
                    self.types.insert(ty)
                } else {
                    self.types.remove(&ty)
                }
            }
            Facet::Source(name) => {
                if selected {
                    insert_value(&mut self.sources, name)
                } else {
                    remove_value(&mut self.sources, &name)
                }
            }
        };
        if changed {
            self.bump();
        }
        changed
    }

    fn select_topic(&mut self, name: String, taxonomy: &Taxonomy) -> bool {
        if self.topics.contains(&name) {
            return false;
        }
        let scope = match self.grades.iter().collect::<Vec<_>>().as_slice() {
            [only] => Some(**only),
            _ => None,
        };
        let conflicts = taxonomy.conflicts(scope, &name);
        self.topics.retain(|t| !conflicts.contains(t));
        self.topics.push(name);
        true
    }

    /// Reset every facet.
    pub fn clear_all(&mut self) -> bool {
        if !self.is_active() {
            return false;
        }
        let version = self.version;
        *self = Self::default();
        self.version = version + 1;
        true
    }

    /// Which topics the topic control may offer.
    pub fn topic_scope(&self, taxonomy: &Taxonomy) -> TopicScope {
        let mut grades = self.grades.iter();
        match (grades.next(), grades.next()) {
            (None, _) => TopicScope::SelectGrade,
            (Some(_), Some(_)) => TopicScope::SingleGradeOnly,
            (Some(grade), None) if taxonomy.has_topics(*grade) => TopicScope::Topics(*grade),
            (Some(grade), None) => TopicScope::NoTopics(*grade),
        }
    }

    /// Removable tags for every active selection, grades first.
    pub fn tags(&self) -> Vec<FacetTag> {
        let grades = self.grades.iter().map(|g| FacetTag {
            facet: Facet::Grade(*g),
            label: format!("{g} klasė"),
        });
        let topics = self.topics.iter().map(|t| FacetTag {
            facet: Facet::Topic(t.clone()),
            label: t.clone(),
        });
        let types = self.types.iter().map(|t| FacetTag {
            facet: Facet::Type(*t),
            label: t.label().to_string(),
        });
        let sources = self.sources.iter().map(|s| FacetTag {
            facet: Facet::Source(s.clone()),
            label: s.clone(),
        });
        grades.chain(topics).chain(types).chain(sources).collect()
    }

    pub fn matches_search(&self, ex: &Exercise) -> bool {
        if self.search.is_empty() {
            return true;
        }
        std::iter::once(ex.question.as_str())
            .chain(ex.topic_levels())
            .any(|field| field.to_lowercase().contains(&self.search))
    }

    pub fn matches_grade(&self, ex: &Exercise) -> bool {
        self.grades.is_empty() || self.grades.contains(&ex.grade)
    }

    pub fn matches_topic(&self, ex: &Exercise) -> bool {
        self.topics.is_empty()
            || ex
                .topic_levels()
                .any(|level| self.topics.iter().any(|t| t == level))
    }

    pub fn matches_type(&self, ex: &Exercise) -> bool {
        let ty = ex.exercise_type();
        self.types.is_empty() || self.types.iter().any(|facet| facet.admits(ty))
    }

    pub fn matches_source(&self, ex: &Exercise) -> bool {
        if self.sources.is_empty() {
            return true;
        }
        let Some(tag) = &ex.source else {
            return false;
        };
        self.sources
            .iter()
            .any(|s| *s == tag.source || tag.subsource.as_deref() == Some(s.as_str()))
    }

    /// Whether a record passes every active facet.
    pub fn matches(&self, ex: &Exercise) -> bool {
        self.matches_search(ex)
            && self.matches_grade(ex)
            && self.matches_topic(ex)
            && self.matches_type(ex)
            && self.matches_source(ex)
    }

    fn bump(&mut self) {
        self.version += 1;
    }
}

fn insert_value(values: &mut Vec<String>, value: String) -> bool {
    if values.contains(&value) {
        return false;
    }
    values.push(value);
    true
}

fn remove_value(values: &mut Vec<String>, value: &str) -> bool {
    let before = values.len();
    values.retain(|v| v != value);
    values.len() != before
}

/// Append-only store of loaded records, in manifest order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    version: u64,
    records: Vec<Arc<Exercise>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Arc<Exercise>] {
        &self.records
    }

    pub fn get(&self, id: &str) -> Option<&Arc<Exercise>> {
        self.records.iter().find(|ex| ex.id == id)
    }

    /// Append a batch. An empty batch leaves the version unchanged.
    pub fn extend<I>(&mut self, batch: I)
    where
        I: IntoIterator<Item = Exercise>,
    {
        let before = self.records.len();
        self.records.extend(batch.into_iter().map(Arc::new));
        if self.records.len() != before {
            self.version += 1;
        }
    }
}

/// Records of the catalog that pass every active facet, in catalog order.
pub fn apply_filters(state: &FacetState, catalog: &Catalog) -> Vec<Arc<Exercise>> {
    catalog
        .records()
        .iter()
        .filter(|ex| state.matches(ex))
        .cloned()
        .collect()
}
