//! Reference hierarchies behind the topic and source facets.
//!
//! The topic taxonomy is grade → topic → subtopic → subsubtopic. A topic
//! without subtopics keeps a flat list of leaf names instead of a nested map.
//!
//! # Description format
//! ```json
//! {
//!   "11": {
//!     "Energija": { "Energija, darbas, galia.": ["Mechaninė energija"] },
//!     "Laboratoriniai darbai": ["Matavimai"]
//!   }
//! }
//! ```
//! A subtopic body may also be an object (its keys become the leaf names) or a
//! description string (no leaves).

use crate::error::TaxonomyError;
use crate::types::{Grade, SourceTag};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

/// Catch-all topic injected into grade 11 when a description lacks it.
pub const CATCH_ALL_TOPIC: &str = "Bendra";

const CATCH_ALL_GRADE: u8 = 11;

const BUILTIN_TOPICS: &str = include_str!("../data/topics.json");

/// Children of a topic, preserving which hierarchy levels exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "shape", content = "children", rename_all = "snake_case")]
pub enum TopicChildren {
    LeafList(Vec<String>),
    SubtopicMap(Vec<Subtopic>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Subtopic {
    pub name: String,
    pub leaves: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Topic {
    pub name: String,
    pub children: TopicChildren,
}

impl Topic {
    /// Every name below this topic, at any depth.
    fn descendants(&self) -> Vec<&str> {
        match &self.children {
            TopicChildren::LeafList(leaves) => leaves.iter().map(String::as_str).collect(),
            TopicChildren::SubtopicMap(subtopics) => subtopics
                .iter()
                .flat_map(|sub| {
                    std::iter::once(sub.name.as_str()).chain(sub.leaves.iter().map(String::as_str))
                })
                .collect(),
        }
    }

    /// Names on the same branch as `name`, excluding `name` itself.
    fn branch_conflicts<'a>(&'a self, name: &str, out: &mut Vec<&'a str>) {
        if self.name == name {
            out.extend(self.descendants());
        }
        match &self.children {
            TopicChildren::LeafList(leaves) => {
                if leaves.iter().any(|leaf| leaf == name) {
                    out.push(&self.name);
                }
            }
            TopicChildren::SubtopicMap(subtopics) => {
                for sub in subtopics {
                    if sub.name == name {
                        out.push(&self.name);
                        out.extend(sub.leaves.iter().map(String::as_str));
                    }
                    if sub.leaves.iter().any(|leaf| leaf == name) {
                        out.push(&self.name);
                        out.push(&sub.name);
                    }
                }
            }
        }
    }
}

/// Grade → topic hierarchy. Read-only once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Taxonomy {
    grades: BTreeMap<Grade, Vec<Topic>>,
}

impl Default for Taxonomy {
    fn default() -> Self {
        Self::empty()
    }
}

impl Taxonomy {
    /// Every grade present with no topics.
    pub fn empty() -> Self {
        Self {
            grades: Grade::ALL.iter().map(|g| (*g, Vec::new())).collect(),
        }
    }

    /// The hierarchy bundled with the crate.
    pub fn builtin() -> Self {
        Self::load(BUILTIN_TOPICS)
    }

    /// Read a description, degrading instead of failing.
    ///
    /// A malformed grade is logged and left empty. An unreadable description
    /// leaves every grade empty.
    pub fn load(json: &str) -> Self {
        match Self::parse(json) {
            Ok(taxonomy) => taxonomy,
            Err(e) => {
                warn!("Topic taxonomy unavailable: {}", e);
                Self::empty()
            }
        }
    }

    /// Read a description. Only a document that is not a JSON object is an
    /// error; problems inside a single grade degrade that grade.
    pub fn parse(json: &str) -> Result<Self, TaxonomyError> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, TaxonomyError> {
        let Value::Object(entries) = value else {
            return Err(TaxonomyError::NotAnObject);
        };

        let mut taxonomy = Self::empty();
        let mut catch_all_grade_listed = false;
        for (key, body) in entries {
            let grade = match key.parse::<Grade>() {
                Ok(grade) => grade,
                Err(_) => {
                    warn!("Skipping taxonomy entry: {}", TaxonomyError::InvalidGrade(key));
                    continue;
                }
            };
            catch_all_grade_listed |= grade.value() == CATCH_ALL_GRADE;

            match parse_grade_topics(grade, body) {
                Ok(mut topics) => {
                    if grade.value() == CATCH_ALL_GRADE {
                        inject_catch_all(&mut topics);
                    }
                    taxonomy.grades.insert(grade, topics);
                }
                Err(e) => warn!("Grade {} has no topics: {}", grade, e),
            }
        }

        // A grade 11 missing from the description still gets the catch-all.
        if !catch_all_grade_listed {
            if let Some(grade) = Grade::ALL.into_iter().find(|g| g.value() == CATCH_ALL_GRADE) {
                inject_catch_all(taxonomy.grades.entry(grade).or_default());
            }
        }
        Ok(taxonomy)
    }

    /// Topics for a grade, in description order.
    pub fn topics(&self, grade: Grade) -> &[Topic] {
        self.grades.get(&grade).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_topics(&self, grade: Grade) -> bool {
        !self.topics(grade).is_empty()
    }

    /// Whether `name` appears at any level under the given grades.
    pub fn contains(&self, grade: Option<Grade>, name: &str) -> bool {
        self.scoped(grade).any(|topic| {
            topic.name == name || topic.descendants().into_iter().any(|d| d == name)
        })
    }

    /// Ancestors and descendants of `name` on every branch it appears in.
    ///
    /// With `grade` set only that grade's hierarchy is consulted.
    pub fn conflicts(&self, grade: Option<Grade>, name: &str) -> Vec<String> {
        let mut found = Vec::new();
        for topic in self.scoped(grade) {
            topic.branch_conflicts(name, &mut found);
        }

        let mut names: Vec<String> = Vec::new();
        for candidate in found {
            if candidate != name && !names.iter().any(|n| n == candidate) {
                names.push(candidate.to_string());
            }
        }
        names
    }

    fn scoped(&self, grade: Option<Grade>) -> impl Iterator<Item = &Topic> {
        self.grades
            .iter()
            .filter(move |(g, _)| grade.map_or(true, |only| **g == only))
            .flat_map(|(_, topics)| topics.iter())
    }
}

fn parse_grade_topics(grade: Grade, body: Value) -> Result<Vec<Topic>, TaxonomyError> {
    let Value::Object(topics) = body else {
        return Err(TaxonomyError::InvalidTopic {
            grade: grade.value(),
            topic: String::new(),
        });
    };

    topics
        .into_iter()
        .map(|(name, children)| {
            let children = match children {
                Value::Array(_) | Value::String(_) => {
                    TopicChildren::LeafList(leaf_names(grade, &name, children)?)
                }
                Value::Object(subtopics) => TopicChildren::SubtopicMap(
                    subtopics
                        .into_iter()
                        .map(|(sub, leaves)| {
                            Ok(Subtopic {
                                leaves: leaf_names(grade, &sub, leaves)?,
                                name: sub,
                            })
                        })
                        .collect::<Result<_, TaxonomyError>>()?,
                ),
                _ => {
                    return Err(TaxonomyError::InvalidTopic {
                        grade: grade.value(),
                        topic: name,
                    })
                }
            };
            Ok(Topic { name, children })
        })
        .collect()
}

/// Normalize a leaf body: array of names, object of descriptions, or a
/// bare description string.
fn leaf_names(grade: Grade, owner: &str, body: Value) -> Result<Vec<String>, TaxonomyError> {
    let invalid = || TaxonomyError::InvalidTopic {
        grade: grade.value(),
        topic: owner.to_string(),
    };

    match body {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => Ok(s),
                _ => Err(invalid()),
            })
            .collect(),
        Value::Object(described) => Ok(described.into_iter().map(|(name, _)| name).collect()),
        Value::String(_) => Ok(Vec::new()),
        _ => Err(invalid()),
    }
}

fn inject_catch_all(topics: &mut Vec<Topic>) {
    if topics.iter().any(|t| t.name == CATCH_ALL_TOPIC) {
        return;
    }
    topics.push(Topic {
        name: CATCH_ALL_TOPIC.to_string(),
        children: TopicChildren::SubtopicMap(vec![Subtopic {
            name: CATCH_ALL_TOPIC.to_string(),
            leaves: vec![CATCH_ALL_TOPIC.to_string()],
        }]),
    });
}

/// A source and its subsources. No subsources means the source is a leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceNode {
    pub name: String,
    pub subsources: Vec<String>,
}

/// Source → subsource hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceTaxonomy {
    sources: Vec<SourceNode>,
}

pub const SOURCE_VBE: &str = "VBE";
pub const SOURCE_OTHER: &str = "Kita";
pub const SUBSOURCE_VBE_FIRST: &str = "2025 (1)";
pub const SUBSOURCE_VBE_SECOND: &str = "2025 (2)";

impl SourceTaxonomy {
    pub fn new(sources: Vec<SourceNode>) -> Self {
        Self { sources }
    }

    pub fn builtin() -> Self {
        Self::new(vec![
            SourceNode {
                name: SOURCE_VBE.to_string(),
                subsources: vec![
                    SUBSOURCE_VBE_FIRST.to_string(),
                    SUBSOURCE_VBE_SECOND.to_string(),
                ],
            },
            SourceNode {
                name: SOURCE_OTHER.to_string(),
                subsources: Vec::new(),
            },
        ])
    }

    pub fn sources(&self) -> &[SourceNode] {
        &self.sources
    }

    /// Whether `name` is a source or subsource.
    pub fn contains(&self, name: &str) -> bool {
        self.sources
            .iter()
            .any(|s| s.name == name || s.subsources.iter().any(|sub| sub == name))
    }
}

impl Default for SourceTaxonomy {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Derive the source tag of a record from its category and grade.
pub fn classify_source(category: Option<&str>, grade: Grade) -> SourceTag {
    match category {
        Some("VBE-2025-2") => SourceTag::new(SOURCE_VBE, Some(SUBSOURCE_VBE_SECOND)),
        Some("VBE-2025") => SourceTag::new(SOURCE_VBE, Some(SUBSOURCE_VBE_FIRST)),
        _ if grade.value() == 11 => SourceTag::new(SOURCE_VBE, Some(SUBSOURCE_VBE_FIRST)),
        _ => SourceTag::new(SOURCE_OTHER, None),
    }
}
