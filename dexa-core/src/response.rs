//! Splits model replies into labelled sections and pulls out code.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[\s#*_>]*(analysis|hypothesis|code|explanation|summary)[*_\s]*:[*_]*")
        .expect("marker pattern is valid")
});

static FENCED_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```[A-Za-z0-9_+-]*(.*?)```").expect("fence pattern is valid")
});

const FENCE: &str = "```";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Analysis,
    Code,
    Explanation,
    Summary,
}

impl Section {
    fn from_label(label: &str) -> Option<Self> {
        match label.to_ascii_lowercase().as_str() {
            "analysis" | "hypothesis" => Some(Section::Analysis),
            "code" => Some(Section::Code),
            "explanation" => Some(Section::Explanation),
            "summary" => Some(Section::Summary),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnalysisSections {
    pub analysis: String,
    pub code: String,
    pub explanation: String,
    pub summary: String,
}

impl AnalysisSections {
    fn slot(&mut self, section: Section) -> &mut String {
        match section {
            Section::Analysis => &mut self.analysis,
            Section::Code => &mut self.code,
            Section::Explanation => &mut self.explanation,
            Section::Summary => &mut self.summary,
        }
    }
}

/// Splits a reply on `Analysis:`/`Code:`/`Explanation:`/`Summary:` markers.
///
/// Markers inside fenced code are ignored and only the first occurrence of
/// each label counts. A reply without any marker lands in `analysis`, with
/// `code` taken from its fenced blocks.
pub fn split_sections(text: &str) -> AnalysisSections {
    // (section, start of its body, start of its marker line)
    let mut markers: Vec<(Section, usize, usize)> = Vec::new();
    let mut in_fence = false;
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        if !in_fence {
            if let Some(caps) = MARKER.captures(line) {
                let seen = |s: Section| markers.iter().any(|(m, _, _)| *m == s);
                if let Some(section) = caps.get(1).and_then(|m| Section::from_label(m.as_str())) {
                    if !seen(section) {
                        let body_start = offset + caps.get(0).map_or(0, |m| m.end());
                        markers.push((section, body_start, offset));
                    }
                }
            }
        }
        if line.matches(FENCE).count() % 2 == 1 {
            in_fence = !in_fence;
        }
        offset += line.len();
    }

    let mut sections = AnalysisSections::default();

    if markers.is_empty() {
        sections.analysis = text.trim().to_string();
        sections.code = fenced_code(text).unwrap_or_default();
        return sections;
    }

    for (index, (section, body_start, _)) in markers.iter().enumerate() {
        let end = markers
            .get(index + 1)
            .map_or(text.len(), |(_, _, line_start)| *line_start);
        *sections.slot(*section) = text[*body_start..end].trim().to_string();
    }

    sections
}

/// Joined bodies of all fenced blocks, or the trimmed text when there are
/// none.
pub fn extract_code(text: &str) -> String {
    fenced_code(text).unwrap_or_else(|| text.trim().to_string())
}

/// Joined bodies of all non-empty fenced blocks, if any.
pub fn fenced_code(text: &str) -> Option<String> {
    let blocks: Vec<&str> = FENCED_BLOCK
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|body| !body.is_empty())
        .collect();

    if blocks.is_empty() {
        None
    } else {
        Some(blocks.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn splits_two_sections() {
        assert_eq!(
            split_sections("Analysis: X\nCode: Y"),
            AnalysisSections {
                analysis: "X".into(),
                code: "Y".into(),
                explanation: String::new(),
                summary: String::new(),
            }
        );
    }

    #[test]
    fn accepts_markdown_decoration_and_case() {
        let sections = split_sections("## ANALYSIS:\nlooks skewed\n**Code:**\nprint(1)\n> summary: done");
        assert_eq!(sections.analysis, "looks skewed");
        assert_eq!(sections.code, "print(1)");
        assert_eq!(sections.summary, "done");
    }

    #[test]
    fn hypothesis_is_analysis() {
        let sections = split_sections("Hypothesis: class matters\nCode: ```python\nx = 1\n```");
        assert_eq!(sections.analysis, "class matters");
        assert_eq!(sections.code, "```python\nx = 1\n```");
    }

    #[test]
    fn markers_inside_fences_are_ignored() {
        let text = "Code:\n```python\n# Summary: not a marker\nx = 1\n```\nSummary: real";
        let sections = split_sections(text);
        assert_eq!(sections.code, "```python\n# Summary: not a marker\nx = 1\n```");
        assert_eq!(sections.summary, "real");
    }

    #[test]
    fn only_first_occurrence_counts() {
        let sections = split_sections("Analysis: one\nAnalysis: two\nSummary: s");
        assert_eq!(sections.analysis, "one\nAnalysis: two");
    }

    #[test]
    fn no_markers_falls_back_to_analysis() {
        let sections = split_sections("  Here you go:\n```py\nprint(df.shape)\n```\n");
        assert_eq!(sections.analysis, "Here you go:\n```py\nprint(df.shape)\n```");
        assert_eq!(sections.code, "print(df.shape)");
    }

    #[test]
    fn label_must_start_the_line() {
        let sections = split_sections("The analysis: is fine");
        assert_eq!(sections.analysis, "The analysis: is fine");
        assert_eq!(sections.code, "");
    }

    #[test]
    fn extract_code_joins_blocks() {
        let text = "a\n```python\nx = 1\n```\nb\n```\ny = 2\n```";
        assert_eq!(extract_code(text), "x = 1\ny = 2");
    }

    #[test]
    fn extract_code_without_fences_is_trimmed_text() {
        assert_eq!(extract_code("  df.head()  \n"), "df.head()");
    }
}
