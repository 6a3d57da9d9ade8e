//! Splitting of composite commit-classification prompts.
//!
//! A raw prompt is a single document made of five sections. The first one
//! (the instructions) has no heading; the remaining four are introduced by a
//! title line underlined with `=` characters:
//!
//! ```text
//! <instructions>
//!
//! Rules
//! =====
//! <rules>
//!
//! The Summary of the Commit
//! =========================
//! <summary>
//!
//! The Commit's affected files
//! ===========================
//! <affected files>
//!
//! Result
//! ======
//! <result>
//! ```
//!
//! [`split`] takes such a document apart so that each backend can compose a
//! prompt in the shape its model was tuned for.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The five sections of a composite prompt, in document order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Section {
    Instructions,
    Rules,
    Summary,
    AffectedFiles,
    Result,
}

impl Section {
    /// Sections introduced by a marker, in the order they must appear.
    pub const MARKED: [Section; 4] = [
        Section::Rules,
        Section::Summary,
        Section::AffectedFiles,
        Section::Result,
    ];

    /// Heading line of the section. The instructions have none.
    pub fn title(self) -> Option<&'static str> {
        match self {
            Section::Instructions => None,
            Section::Rules => Some("Rules"),
            Section::Summary => Some("The Summary of the Commit"),
            Section::AffectedFiles => Some("The Commit's affected files"),
            Section::Result => Some("Result"),
        }
    }

    /// Literal marker (title plus underline) introducing the section.
    pub fn marker(self) -> Option<&'static str> {
        match self {
            Section::Instructions => None,
            Section::Rules => Some("Rules\n====="),
            Section::Summary => Some("The Summary of the Commit\n========================="),
            Section::AffectedFiles => {
                Some("The Commit's affected files\n===========================")
            }
            Section::Result => Some("Result\n======"),
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title().unwrap_or("Instructions"))
    }
}

/// Reasons a raw prompt cannot be split.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("section marker for \"{0}\" is missing")]
    MissingMarker(Section),
    #[error("section marker for \"{0}\" occurs more than once")]
    DuplicateMarker(Section),
    #[error("section \"{0}\" is empty")]
    EmptySection(Section),
}

/// A composite prompt taken apart into its five sections.
///
/// Every field is trimmed and non-empty.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredPrompt {
    pub instructions: String,
    pub rules: String,
    pub summary: String,
    pub affected_files: String,
    pub result: String,
}

impl StructuredPrompt {
    /// Text of a single section.
    pub fn section(&self, section: Section) -> &str {
        match section {
            Section::Instructions => &self.instructions,
            Section::Rules => &self.rules,
            Section::Summary => &self.summary,
            Section::AffectedFiles => &self.affected_files,
            Section::Result => &self.result,
        }
    }

    /// Rebuild the composite document, optionally leaving out the rules.
    ///
    /// With `include_rules` set, [`split`] applied to the output yields `self`
    /// again.
    pub fn render(&self, include_rules: bool) -> String {
        let mut out = self.instructions.clone();
        for section in Section::MARKED {
            if section == Section::Rules && !include_rules {
                continue;
            }
            if let Some(marker) = section.marker() {
                out.push_str("\n\n");
                out.push_str(marker);
                out.push_str("\n\n");
                out.push_str(self.section(section));
            }
        }
        out
    }
}

impl FromStr for StructuredPrompt {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        split(s)
    }
}

/// Split `raw` on the four section markers.
///
/// Each marker has to occur exactly once in the whole document, and the
/// markers have to appear in [`Section::MARKED`] order.
///
/// ```
/// let raw = "Do it.\nRules\n=====\nr\nThe Summary of the Commit\n=========================\ns\n\
///            The Commit's affected files\n===========================\nf\nResult\n======\nnow";
/// let p = dispatch::prompt::split(raw).unwrap();
/// assert_eq!(p.instructions, "Do it.");
/// assert_eq!(p.result, "now");
/// ```
pub fn split(raw: &str) -> Result<StructuredPrompt, ParseError> {
    for section in Section::MARKED {
        let marker = section.marker().ok_or(ParseError::MissingMarker(section))?;
        match raw.matches(marker).count() {
            0 => return Err(ParseError::MissingMarker(section)),
            1 => {}
            _ => return Err(ParseError::DuplicateMarker(section)),
        }
    }

    let (instructions, rest) = split_once_exactly(raw, Section::Rules)?;
    let (rules, rest) = split_once_exactly(rest, Section::Summary)?;
    let (summary, rest) = split_once_exactly(rest, Section::AffectedFiles)?;
    let (affected_files, result) = split_once_exactly(rest, Section::Result)?;

    Ok(StructuredPrompt {
        instructions: non_empty(instructions, Section::Instructions)?,
        rules: non_empty(rules, Section::Rules)?,
        summary: non_empty(summary, Section::Summary)?,
        affected_files: non_empty(affected_files, Section::AffectedFiles)?,
        result: non_empty(result, Section::Result)?,
    })
}

fn split_once_exactly(text: &str, section: Section) -> Result<(&str, &str), ParseError> {
    let marker = section.marker().ok_or(ParseError::MissingMarker(section))?;
    let mut parts = text.splitn(3, marker);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(head), Some(tail), None) => Ok((head, tail)),
        (_, None, _) => Err(ParseError::MissingMarker(section)),
        _ => Err(ParseError::DuplicateMarker(section)),
    }
}

fn non_empty(text: &str, section: Section) -> Result<String, ParseError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ParseError::EmptySection(section));
    }
    Ok(text.to_string())
}
