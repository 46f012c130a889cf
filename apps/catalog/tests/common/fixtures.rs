//! Record fixtures and source factories.

use exercise_catalog::MemorySource;
use serde_json::json;

/// Manifest entry name for an exercise id.
pub fn entry(id: &str) -> String {
    format!("{id}.json")
}

/// A free-text record.
pub fn free_text(id: &str, grade: u8, topic: &str, answer: &str) -> String {
    json!({
        "id": id,
        "grade": grade,
        "topic": topic,
        "question": format!("Question {id}"),
        "correctAnswer": answer,
    })
    .to_string()
}

/// A free-text record with a solution text and category.
pub fn with_solution(id: &str, grade: u8, category: &str, solution: &str) -> String {
    json!({
        "id": id,
        "grade": grade,
        "topic": "Energija",
        "category": category,
        "question": "E = ?",
        "correctAnswer": "3,5",
        "solution": solution,
    })
    .to_string()
}

/// A multi-select record with options A..D and answers A and C.
pub fn multi_select(id: &str, grade: u8) -> String {
    json!({
        "id": id,
        "grade": grade,
        "topic": "Judėjimas ir jėgos",
        "type": "multiple_choice",
        "question": "Pick two",
        "options": ["A", "B", "C", "D"],
        "correctAnswer": ["A", "C"],
    })
    .to_string()
}

/// A structural record with a group header and two sub-questions.
pub fn structural(id: &str, grade: u8) -> String {
    json!({
        "id": id,
        "grade": grade,
        "topic": "Elektra ir magnetizmas",
        "subtopic": "Elektros srovės šaltiniai.",
        "type": "structural",
        "question": "Circuit",
        "questions": [
            {"type": "group", "question": "Part 1"},
            {"id": "a", "question": "I = ?", "correctAnswer": "0,5", "solution": "I = U / R"},
            {"id": "b", "type": "multiple_choice", "question": "Which?", "options": ["x", "y"], "correctAnswer": "y"},
        ],
    })
    .to_string()
}

/// A legacy pair matching: quantity symbols to their units.
pub fn pairs_matching(id: &str, grade: u8) -> String {
    json!({
        "id": id,
        "grade": grade,
        "topic": "Elektra ir magnetizmas",
        "type": "matching",
        "question": "Match the units",
        "pairs": {"R": "Ω", "U": "V", "I": "A"},
    })
    .to_string()
}

/// Source with `n` grade-9 free-text records, ids `ex-0` .. `ex-{n-1}`.
pub fn numbered_source(n: usize) -> MemorySource {
    (0..n).fold(MemorySource::new(), |source, i| {
        let id = format!("ex-{i}");
        source.with_record(entry(&id), free_text(&id, 9, "Optika", "1"))
    })
}

/// Ids `ex-{start}` .. `ex-{end-1}`.
pub fn ids(start: usize, end: usize) -> Vec<String> {
    (start..end).map(|i| format!("ex-{i}")).collect()
}
