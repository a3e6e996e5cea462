//! Diff computation and rendering-impact classification, applied once
//! both compare legs have succeeded.

use crate::parser::{Image, Link, ParseResult, Section};
use crate::utils::safe_truncate_boundary;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

#[derive(Debug, Clone, Serialize)]
pub struct ScalarDiff {
    pub js_value: String,
    pub non_js_value: String,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct HeadingDiff {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionDiff {
    pub id: String,
    pub heading_level: u8,
    pub heading_text: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub non_js_body_markdown: Option<String>,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct LinkDiff {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct ImageDiff {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct StructuredDataDiff {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub changed: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct Diff {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<ScalarDiff>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_description: Option<ScalarDiff>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canonical_url: Option<ScalarDiff>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_robots: Option<ScalarDiff>,
    pub h1: HeadingDiff,
    pub h2: HeadingDiff,
    pub h3: HeadingDiff,
    pub sections: Vec<SectionDiff>,
    pub links: LinkDiff,
    pub images: ImageDiff,
    pub structured_data: StructuredDataDiff,
}

#[derive(Debug, Clone, Serialize)]
pub struct RenderingImpact {
    pub title_changed: bool,
    pub meta_desc_changed: bool,
    pub canonical_changed: bool,
    pub h1_changed: bool,
    pub content_change_percent: f64,
    pub overall_change: &'static str,
}

#[must_use]
pub fn compute(js: &ParseResult, non_js: &ParseResult, max_diff_length: usize) -> Diff {
    Diff {
        title: scalar_diff(&js.title, &non_js.title),
        meta_description: scalar_diff(&js.meta_description, &non_js.meta_description),
        canonical_url: scalar_diff(&js.canonical_url, &non_js.canonical_url),
        meta_robots: scalar_diff(&js.meta_robots, &non_js.meta_robots),
        h1: heading_diff(&js.h1, &non_js.h1),
        h2: heading_diff(&js.h2, &non_js.h2),
        h3: heading_diff(&js.h3, &non_js.h3),
        sections: section_diff(&js.sections, &non_js.sections, max_diff_length),
        links: link_diff(&js.links, &non_js.links),
        images: image_diff(&js.images, &non_js.images),
        structured_data: structured_data_diff(&js.structured_data, &non_js.structured_data),
    }
}

fn scalar_diff(js: &str, non_js: &str) -> Option<ScalarDiff> {
    (js != non_js).then(|| ScalarDiff { js_value: js.to_string(), non_js_value: non_js.to_string() })
}

fn heading_diff(js: &[String], non_js: &[String]) -> HeadingDiff {
    let non_js_set: HashSet<&String> = non_js.iter().collect();
    let js_set: HashSet<&String> = js.iter().collect();
    HeadingDiff {
        added: js.iter().filter(|h| !non_js_set.contains(h)).cloned().collect(),
        removed: non_js.iter().filter(|h| !js_set.contains(h)).cloned().collect(),
    }
}

/// Match sections by `(headingLevel, headingText)`. Duplicate keys within
/// one document match pairwise in the order they appear.
fn section_diff(js: &[Section], non_js: &[Section], max_diff_length: usize) -> Vec<SectionDiff> {
    let mut js_by_key: HashMap<(u8, String), VecDeque<&Section>> = HashMap::new();
    for section in js {
        js_by_key.entry((section.heading_level, section.heading_text.clone())).or_default().push_back(section);
    }

    let mut matched_js_ids = HashSet::new();
    let mut out = Vec::new();
    let mut diff_budget = max_diff_length;

    for ns in non_js {
        let key = (ns.heading_level, ns.heading_text.clone());
        let matched = js_by_key.get_mut(&key).and_then(VecDeque::pop_front);
        match matched {
            Some(js_section) => {
                matched_js_ids.insert(js_section.id.clone());
                if js_section.body_markdown != ns.body_markdown {
                    out.push(SectionDiff {
                        id: js_section.id.clone(),
                        heading_level: ns.heading_level,
                        heading_text: ns.heading_text.clone(),
                        status: "changed",
                        non_js_body_markdown: budgeted_truncate(&ns.body_markdown, max_diff_length, &mut diff_budget),
                    });
                }
            }
            None => out.push(SectionDiff {
                id: ns.id.clone(),
                heading_level: ns.heading_level,
                heading_text: ns.heading_text.clone(),
                status: "removed_by_js",
                non_js_body_markdown: budgeted_truncate(&ns.body_markdown, max_diff_length, &mut diff_budget),
            }),
        }
    }

    for section in js {
        if !matched_js_ids.contains(&section.id) {
            out.push(SectionDiff {
                id: section.id.clone(),
                heading_level: section.heading_level,
                heading_text: section.heading_text.clone(),
                status: "added_by_js",
                non_js_body_markdown: None,
            });
        }
    }

    out
}

/// Truncate against a shared running budget, mirroring
/// `truncate::truncate_sections`: a field that still fits consumes its
/// share of the budget, the first one that doesn't fit is truncated at a
/// word boundary to exhaust the remainder, and every field after that is
/// dropped entirely. `max_chars == 0` means "no limit".
fn budgeted_truncate(body: &str, max_chars: usize, budget: &mut usize) -> Option<String> {
    if max_chars == 0 {
        return Some(body.to_string());
    }
    if *budget == 0 {
        return None;
    }
    let len = body.chars().count();
    if len <= *budget {
        *budget -= len;
        Some(body.to_string())
    } else {
        let idx = safe_truncate_boundary(body, *budget, "");
        *budget = 0;
        Some(body[..idx].to_string())
    }
}

fn link_diff(js: &[Link], non_js: &[Link]) -> LinkDiff {
    let js_set: HashSet<&str> = js.iter().map(|l| l.href.as_str()).collect();
    let non_js_set: HashSet<&str> = non_js.iter().map(|l| l.href.as_str()).collect();
    let (mut added, mut removed) = set_diff(&js_set, &non_js_set);
    added.sort();
    removed.sort();
    LinkDiff { added, removed }
}

fn image_diff(js: &[Image], non_js: &[Image]) -> ImageDiff {
    let js_set: HashSet<&str> = js.iter().map(|i| i.src.as_str()).collect();
    let non_js_set: HashSet<&str> = non_js.iter().map(|i| i.src.as_str()).collect();
    let (mut added, mut removed) = set_diff(&js_set, &non_js_set);
    added.sort();
    removed.sort();
    ImageDiff { added, removed }
}

fn set_diff(js: &HashSet<&str>, non_js: &HashSet<&str>) -> (Vec<String>, Vec<String>) {
    let added = js.difference(non_js).map(|s| (*s).to_string()).collect();
    let removed = non_js.difference(js).map(|s| (*s).to_string()).collect();
    (added, removed)
}

/// Bucket by JSON-LD `@type`. Items sharing a type within one side collapse
/// to the last one seen — compare is a diagnostic tool, not a structured
/// data linter, so per-type multiplicity within one side isn't modeled.
fn bucket_by_type(items: &[Value]) -> BTreeMap<String, Value> {
    let mut map = BTreeMap::new();
    for item in items {
        let ty = item.get("@type").and_then(Value::as_str).unwrap_or("Unknown").to_string();
        map.insert(ty, item.clone());
    }
    map
}

fn structured_data_diff(js: &[Value], non_js: &[Value]) -> StructuredDataDiff {
    let js_map = bucket_by_type(js);
    let non_js_map = bucket_by_type(non_js);

    let mut added = Vec::new();
    let mut changed = Vec::new();
    for (ty, js_val) in &js_map {
        match non_js_map.get(ty) {
            None => added.push(ty.clone()),
            Some(non_js_val) if non_js_val != js_val => changed.push(ty.clone()),
            Some(_) => {}
        }
    }
    let mut removed: Vec<String> = non_js_map.keys().filter(|ty| !js_map.contains_key(*ty)).cloned().collect();
    added.sort();
    removed.sort();
    changed.sort();
    StructuredDataDiff { added, removed, changed }
}

#[must_use]
pub fn classify(diff: &Diff, wc_js: usize, wc_non_js: usize) -> RenderingImpact {
    let title_changed = diff.title.is_some();
    let meta_desc_changed = diff.meta_description.is_some();
    let canonical_changed = diff.canonical_url.is_some();
    let h1_changed = !diff.h1.added.is_empty() || !diff.h1.removed.is_empty();
    let content_change_percent = 100.0 * (wc_js as f64 - wc_non_js as f64).abs() / (wc_js.max(1) as f64);

    let any_set_changed = !diff.links.added.is_empty()
        || !diff.links.removed.is_empty()
        || !diff.images.added.is_empty()
        || !diff.images.removed.is_empty()
        || !diff.structured_data.added.is_empty()
        || !diff.structured_data.removed.is_empty();
    let any_metadata_changed = title_changed || meta_desc_changed || canonical_changed || h1_changed;

    let overall_change = if !any_metadata_changed && content_change_percent < 5.0 && !any_set_changed {
        "none"
    } else if title_changed || content_change_percent > 30.0 || diff.links.added.len() > 10 || diff.images.added.len() > 5 {
        "major"
    } else {
        "minor"
    };

    RenderingImpact { title_changed, meta_desc_changed, canonical_changed, h1_changed, content_change_percent, overall_change }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(title: &str) -> ParseResult {
        ParseResult { title: title.to_string(), ..ParseResult::default() }
    }

    #[test]
    fn identical_results_have_no_scalar_diffs() {
        let diff = compute(&result("Same"), &result("Same"), 0);
        assert!(diff.title.is_none());
        assert!(diff.sections.is_empty());
        assert!(diff.links.added.is_empty() && diff.links.removed.is_empty());
        let impact = classify(&diff, 10, 10);
        assert_eq!(impact.overall_change, "none");
    }

    #[test]
    fn differing_titles_are_reported_and_classified_major() {
        let diff = compute(&result("Ready"), &result("Loading..."), 0);
        let scalar = diff.title.as_ref().unwrap();
        assert_eq!(scalar.js_value, "Ready");
        assert_eq!(scalar.non_js_value, "Loading...");
        let impact = classify(&diff, 10, 10);
        assert_eq!(impact.overall_change, "major");
    }

    #[test]
    fn section_added_by_js_is_reported() {
        let js_sections = vec![Section { id: "s1".into(), heading_level: 2, heading_text: "Features".into(), body_markdown: "new".into() }];
        let diff = section_diff(&js_sections, &[], 0);
        assert_eq!(diff.len(), 1);
        assert_eq!(diff[0].status, "added_by_js");
    }

    #[test]
    fn section_changed_reports_non_js_body() {
        let js_sections = vec![Section { id: "s1".into(), heading_level: 1, heading_text: "Intro".into(), body_markdown: "new body".into() }];
        let non_js_sections = vec![Section { id: "s1".into(), heading_level: 1, heading_text: "Intro".into(), body_markdown: "old body".into() }];
        let diff = section_diff(&js_sections, &non_js_sections, 0);
        assert_eq!(diff.len(), 1);
        assert_eq!(diff[0].status, "changed");
        assert_eq!(diff[0].non_js_body_markdown.as_deref(), Some("old body"));
    }

    #[test]
    fn max_diff_length_is_a_shared_budget_across_sections() {
        let js_sections = vec![
            Section { id: "s1".into(), heading_level: 1, heading_text: "One".into(), body_markdown: "new-1".into() },
            Section { id: "s2".into(), heading_level: 1, heading_text: "Two".into(), body_markdown: "new-2".into() },
        ];
        let non_js_sections = vec![
            Section { id: "s1".into(), heading_level: 1, heading_text: "One".into(), body_markdown: "a".repeat(10) },
            Section { id: "s2".into(), heading_level: 1, heading_text: "Two".into(), body_markdown: "b".repeat(10) },
        ];
        let diff = section_diff(&js_sections, &non_js_sections, 15);
        assert_eq!(diff.len(), 2);
        assert_eq!(diff[0].non_js_body_markdown.as_ref().unwrap().chars().count(), 10);
        assert_eq!(diff[1].non_js_body_markdown.as_ref().unwrap().chars().count(), 5);
    }

    #[test]
    fn exhausted_diff_budget_drops_remaining_bodies() {
        let js_sections = vec![
            Section { id: "s1".into(), heading_level: 1, heading_text: "One".into(), body_markdown: "new-1".into() },
            Section { id: "s2".into(), heading_level: 1, heading_text: "Two".into(), body_markdown: "new-2".into() },
        ];
        let non_js_sections = vec![
            Section { id: "s1".into(), heading_level: 1, heading_text: "One".into(), body_markdown: "a".repeat(10) },
            Section { id: "s2".into(), heading_level: 1, heading_text: "Two".into(), body_markdown: "b".repeat(10) },
        ];
        let diff = section_diff(&js_sections, &non_js_sections, 10);
        assert_eq!(diff.len(), 2);
        assert!(diff[0].non_js_body_markdown.is_some());
        assert!(diff[1].non_js_body_markdown.is_none());
    }

    #[test]
    fn duplicate_headings_match_pairwise_in_document_order() {
        let js_sections = vec![
            Section { id: "s1".into(), heading_level: 2, heading_text: "Q&A".into(), body_markdown: "first-js".into() },
            Section { id: "s2".into(), heading_level: 2, heading_text: "Q&A".into(), body_markdown: "second-js".into() },
        ];
        let non_js_sections = vec![
            Section { id: "s1".into(), heading_level: 2, heading_text: "Q&A".into(), body_markdown: "first-js".into() },
            Section { id: "s2".into(), heading_level: 2, heading_text: "Q&A".into(), body_markdown: "second-non-js".into() },
        ];
        let diff = section_diff(&js_sections, &non_js_sections, 0);
        assert_eq!(diff.len(), 1);
        assert_eq!(diff[0].id, "s2");
    }
}
