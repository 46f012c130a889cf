//! Blank template parser for fill-in-the-blanks exercises.
//!
//! # Format
//! ```text
//! Current I = ___ A flows through R = ___2___ Ω.
//! ```
//!
//! A slot is a run of three or more underscores. A slot may carry a number
//! between two such runs (`___2___`); the number is kept as a label only,
//! slots are always matched to answers by their position.

use serde::Serialize;

/// Minimum underscore run that opens a slot.
const SLOT_MARKER_LEN: usize = 3;

/// A parsed fill-in-the-blanks template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlankTemplate {
    segments: Vec<Segment>,
}

/// Piece of a template: literal text or a slot to fill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Segment {
    Text { text: String },
    Blank { index: usize, label: Option<u32> },
}

impl BlankTemplate {
    /// Parse a template. Any text is a valid template; one with no markers has zero slots.
    pub fn parse(source: &str) -> Self {
        let mut scanner = Scanner::new(source);
        scanner.run();
        scanner.finish()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn slot_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| matches!(s, Segment::Blank { .. }))
            .count()
    }
}

struct Scanner {
    chars: Vec<char>,
    pos: usize,
    text: String,
    segments: Vec<Segment>,
    slots: usize,
}

impl Scanner {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            text: String::new(),
            segments: Vec::new(),
            slots: 0,
        }
    }

    fn run(&mut self) {
        while self.pos < self.chars.len() {
            let run = self.underscore_run(self.pos);
            if run >= SLOT_MARKER_LEN {
                self.pos += run;
                let label = self.labelled_close();
                self.push_blank(label);
            } else if run > 0 {
                self.text.extend(&self.chars[self.pos..self.pos + run]);
                self.pos += run;
            } else {
                self.text.push(self.chars[self.pos]);
                self.pos += 1;
            }
        }
    }

    /// After an opening run, consume `<digits>___` if present and return the label.
    fn labelled_close(&mut self) -> Option<u32> {
        let digits_end = self.chars[self.pos..]
            .iter()
            .position(|c| !c.is_ascii_digit())
            .map_or(self.chars.len(), |offset| self.pos + offset);
        if digits_end == self.pos {
            return None;
        }

        let close = self.underscore_run(digits_end);
        if close < SLOT_MARKER_LEN {
            return None;
        }

        let label: String = self.chars[self.pos..digits_end].iter().collect();
        self.pos = digits_end + close;
        label.parse().ok()
    }

    fn underscore_run(&self, from: usize) -> usize {
        self.chars[from..].iter().take_while(|c| **c == '_').count()
    }

    fn push_blank(&mut self, label: Option<u32>) {
        self.flush_text();
        self.segments.push(Segment::Blank {
            index: self.slots,
            label,
        });
        self.slots += 1;
    }

    fn flush_text(&mut self) {
        if !self.text.is_empty() {
            self.segments.push(Segment::Text {
                text: std::mem::take(&mut self.text),
            });
        }
    }

    fn finish(mut self) -> BlankTemplate {
        self.flush_text();
        BlankTemplate {
            segments: self.segments,
        }
    }
}
