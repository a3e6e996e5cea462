//! Flat section extraction: every heading opens a new section; content is
//! the markdown of everything until the next heading.

use super::dom::Block;
use super::types::Section;

#[must_use]
pub fn extract_sections(blocks: &[Block]) -> Vec<Section> {
    struct Open {
        level: u8,
        heading_text: String,
        body: Vec<String>,
    }

    let mut open = Open { level: 0, heading_text: String::new(), body: Vec::new() };
    let mut finished = Vec::new();

    for block in blocks {
        match block {
            Block::Heading { level, text, .. } => {
                finished.push(Open {
                    level: open.level,
                    heading_text: std::mem::take(&mut open.heading_text),
                    body: std::mem::take(&mut open.body),
                });
                open = Open { level: *level, heading_text: text.clone(), body: Vec::new() };
            }
            Block::Paragraph(md) => open.body.push(md.clone()),
        }
    }
    finished.push(open);

    let mut sections = Vec::new();
    let mut next_id = 1usize;
    for section in finished {
        let body_markdown = section.body.join("\n\n");
        if section.heading_text.is_empty() && body_markdown.trim().is_empty() {
            continue;
        }
        sections.push(Section {
            id: format!("s{next_id}"),
            heading_level: section.level,
            heading_text: section.heading_text,
            body_markdown,
        });
        next_id += 1;
    }
    sections
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn omits_empty_intro_section() {
        let blocks = vec![Block::Heading { level: 1, text: "Title".into(), markdown: "# Title".into() }];
        let sections = extract_sections(&blocks);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].id, "s1");
        assert_eq!(sections[0].heading_level, 1);
    }

    #[test]
    fn keeps_nonempty_intro_section() {
        let blocks = vec![
            Block::Paragraph("intro text".into()),
            Block::Heading { level: 1, text: "Title".into(), markdown: "# Title".into() },
        ];
        let sections = extract_sections(&blocks);
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].heading_level, 0);
        assert_eq!(sections[0].id, "s1");
        assert_eq!(sections[1].id, "s2");
    }

    #[test]
    fn ids_stable_in_document_order() {
        let blocks = vec![
            Block::Heading { level: 1, text: "A".into(), markdown: "# A".into() },
            Block::Paragraph("body a".into()),
            Block::Heading { level: 2, text: "B".into(), markdown: "## B".into() },
            Block::Paragraph("body b".into()),
        ];
        let sections = extract_sections(&blocks);
        let ids: Vec<_> = sections.iter().map(|s| s.id.clone()).collect();
        assert_eq!(ids, vec!["s1", "s2"]);
    }
}
