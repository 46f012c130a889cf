//! Core exercise library shared by the catalog runtime and its tools.
//!
//! Provides:
//! - Exercise record decoding and validation
//! - Blank template parser for fill-in-the-blanks exercises
//! - Per-kind answer verification and the answer state machine
//! - Topic and source taxonomies
//! - Facet state and the filter engine

pub mod answer;
pub mod error;
pub mod filter;
pub mod record;
pub mod taxonomy;
pub mod template;
pub mod types;
pub mod verify;

pub use answer::{
    offered_values, AnswerInput, AnswerPhase, AnswerState, ChoiceInput, CompositeAnswers,
    MatchingInput,
};
pub use error::{RecordError, Result, TaxonomyError, VerifyError};
pub use filter::{apply_filters, Catalog, Facet, FacetState, FacetTag, TopicScope, TypeFacet};
pub use record::decode;
pub use taxonomy::{
    classify_source, SourceNode, SourceTaxonomy, Subtopic, Taxonomy, Topic, TopicChildren,
};
pub use template::{BlankTemplate, Segment};
pub use types::{
    AnswerKind, Composite, CompositeFlavor, Exercise, ExerciseBody, ExerciseType, FillInBlanks,
    FreeText, Grade, MatchItem, MatchPair, Matching, MultipleChoice, QuestionEntry, SecondPart,
    SourceTag, SubQuestion,
};
pub use verify::{answers_match, normalize_answer, Submission, Verdict, Verify};
