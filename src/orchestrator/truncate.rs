//! `max_content_length`/`max_diff_length` truncation: cut at the nearest
//! preceding space rather than mid-word, and for section lists, fill a
//! shared character budget in document order rather than truncating each
//! section independently.

use crate::parser::Section;
use crate::utils::safe_truncate_boundary;

/// Truncate `s` to at most `max_chars` characters, backing off to the
/// nearest preceding space. `max_chars == 0` means "no limit".
#[must_use]
pub fn truncate_text(s: &str, max_chars: usize) -> String {
    if max_chars == 0 || s.chars().count() <= max_chars {
        return s.to_string();
    }
    let idx = safe_truncate_boundary(s, max_chars, "");
    s[..idx].to_string()
}

/// Fill `sections` in document order against a shared character budget of
/// `max_chars` applied to each section's `body_markdown`. A section that
/// fits entirely is kept as-is; the first section that doesn't fit is
/// truncated at a word boundary to exhaust the remaining budget, and every
/// section after it is dropped. `max_chars == 0` means "no limit".
#[must_use]
pub fn truncate_sections(sections: &[Section], max_chars: usize) -> Vec<Section> {
    if max_chars == 0 {
        return sections.to_vec();
    }
    let mut budget = max_chars;
    let mut out = Vec::with_capacity(sections.len());
    for section in sections {
        if budget == 0 {
            break;
        }
        let len = section.body_markdown.chars().count();
        if len <= budget {
            budget -= len;
            out.push(section.clone());
        } else {
            let idx = safe_truncate_boundary(&section.body_markdown, budget, "");
            out.push(Section { body_markdown: section.body_markdown[..idx].to_string(), ..section.clone() });
            budget = 0;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_budget_is_unlimited() {
        assert_eq!(truncate_text("hello world", 0), "hello world");
    }

    #[test]
    fn truncates_at_preceding_space() {
        assert_eq!(truncate_text("hello wonderful world", 12), "hello");
    }

    #[test]
    fn truncation_is_idempotent() {
        let once = truncate_text("hello wonderful world", 12);
        let twice = truncate_text(&once, 12);
        assert_eq!(once, twice);
    }

    #[test]
    fn section_budget_drops_tail_sections() {
        let sections = vec![
            Section { id: "s1".into(), heading_level: 0, heading_text: String::new(), body_markdown: "a".repeat(10) },
            Section { id: "s2".into(), heading_level: 1, heading_text: "H".into(), body_markdown: "b".repeat(10) },
        ];
        let truncated = truncate_sections(&sections, 15);
        assert_eq!(truncated.len(), 2);
        assert_eq!(truncated[0].body_markdown.chars().count(), 10);
        assert_eq!(truncated[1].body_markdown.chars().count(), 5);
    }

    #[test]
    fn exhausted_budget_drops_remaining_sections() {
        let sections = vec![
            Section { id: "s1".into(), heading_level: 0, heading_text: String::new(), body_markdown: "a".repeat(10) },
            Section { id: "s2".into(), heading_level: 1, heading_text: "H".into(), body_markdown: "b".repeat(10) },
        ];
        let truncated = truncate_sections(&sections, 10);
        assert_eq!(truncated.len(), 1);
    }
}
