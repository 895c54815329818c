//! Markdown syntax tree.
//!
//! `pulldown-cmark` hands out a flat stream of start/end events. The compilers
//! want to recurse into children, so this module folds the stream into a small
//! owned tree that only keeps what we can express in a Google Doc. Anything
//! the tree doesn't model (block quotes, HTML blocks, images) becomes a
//! `Container` whose children are still walked.

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag};

#[derive(Debug, Clone, PartialEq)]
pub enum MdNode {
    // Blocks
    Heading { level: u8, children: Vec<MdNode> },
    Paragraph(Vec<MdNode>),
    List { ordered: bool, items: Vec<MdNode> },
    Item(Vec<MdNode>),
    CodeBlock(String),
    ThematicBreak,
    /// Anything without a dedicated variant. Compilers recurse into it.
    Container(Vec<MdNode>),

    // Inlines
    Text(String),
    SoftBreak,
    HardBreak,
    Emphasis(Vec<MdNode>),
    Strong(Vec<MdNode>),
    Strikethrough(Vec<MdNode>),
    Code(String),
    Link { url: String, children: Vec<MdNode> },
}

impl MdNode {
    pub fn is_inline(&self) -> bool {
        matches!(
            self,
            MdNode::Text(_)
                | MdNode::SoftBreak
                | MdNode::HardBreak
                | MdNode::Emphasis(_)
                | MdNode::Strong(_)
                | MdNode::Strikethrough(_)
                | MdNode::Code(_)
                | MdNode::Link { .. }
        )
    }
}

/// What kind of node an open start event will become once its end arrives.
#[derive(Debug)]
enum Frame {
    Heading(u8),
    Paragraph,
    List(bool),
    Item,
    CodeBlock,
    Container,
    Emphasis,
    Strong,
    Strikethrough,
    Link(String),
}

struct OpenNode {
    frame: Frame,
    children: Vec<MdNode>,
    code: String,
}

impl OpenNode {
    fn new(frame: Frame) -> Self {
        Self {
            frame,
            children: Vec::new(),
            code: String::new(),
        }
    }

    fn finish(self) -> MdNode {
        let children = self.children;
        match self.frame {
            Frame::Heading(level) => MdNode::Heading { level, children },
            Frame::Paragraph => MdNode::Paragraph(children),
            Frame::List(ordered) => MdNode::List {
                ordered,
                items: children,
            },
            Frame::Item => MdNode::Item(children),
            Frame::CodeBlock => MdNode::CodeBlock(self.code),
            Frame::Container => MdNode::Container(children),
            Frame::Emphasis => MdNode::Emphasis(children),
            Frame::Strong => MdNode::Strong(children),
            Frame::Strikethrough => MdNode::Strikethrough(children),
            Frame::Link(url) => MdNode::Link { url, children },
        }
    }
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn frame_for(tag: Tag<'_>) -> Frame {
    match tag {
        Tag::Heading { level, .. } => Frame::Heading(heading_level(level)),
        Tag::Paragraph => Frame::Paragraph,
        Tag::List(first_number) => Frame::List(first_number.is_some()),
        Tag::Item => Frame::Item,
        Tag::CodeBlock(_) => Frame::CodeBlock,
        Tag::Emphasis => Frame::Emphasis,
        Tag::Strong => Frame::Strong,
        Tag::Strikethrough => Frame::Strikethrough,
        Tag::Link { dest_url, .. } => Frame::Link(dest_url.to_string()),
        _ => Frame::Container,
    }
}

/// Parses Markdown into top-level block nodes.
///
/// Never fails: the parser accepts any input, and unbalanced state at the end
/// of the stream (which pulldown-cmark doesn't produce) is folded back into
/// the root.
pub fn parse_markdown(source: &str) -> Vec<MdNode> {
    let parser = Parser::new_ext(source, Options::ENABLE_STRIKETHROUGH);
    let mut stack: Vec<OpenNode> = vec![OpenNode::new(Frame::Container)];

    for event in parser {
        match event {
            Event::Start(tag) => stack.push(OpenNode::new(frame_for(tag))),
            Event::End(_) => {
                if stack.len() > 1 {
                    if let Some(open) = stack.pop() {
                        push_child(&mut stack, open.finish());
                    }
                }
            }
            Event::Text(text) => {
                if let Some(top) = stack.last_mut() {
                    if matches!(top.frame, Frame::CodeBlock) {
                        top.code.push_str(&text);
                    } else {
                        top.children.push(MdNode::Text(text.to_string()));
                    }
                }
            }
            Event::Code(text) => push_child(&mut stack, MdNode::Code(text.to_string())),
            Event::SoftBreak => push_child(&mut stack, MdNode::SoftBreak),
            Event::HardBreak => push_child(&mut stack, MdNode::HardBreak),
            Event::Rule => push_child(&mut stack, MdNode::ThematicBreak),
            // Raw HTML, task markers, footnote refs and math have no doc equivalent.
            _ => {}
        }
    }

    while stack.len() > 1 {
        if let Some(open) = stack.pop() {
            push_child(&mut stack, open.finish());
        }
    }

    stack
        .pop()
        .map(|root| root.children)
        .unwrap_or_default()
}

fn push_child(stack: &mut [OpenNode], node: MdNode) {
    if let Some(top) = stack.last_mut() {
        top.children.push(node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_and_paragraph() {
        let nodes = parse_markdown("# Title\n\nSome *text*.\n");
        assert_eq!(
            nodes,
            vec![
                MdNode::Heading {
                    level: 1,
                    children: vec![MdNode::Text("Title".to_string())]
                },
                MdNode::Paragraph(vec![
                    MdNode::Text("Some ".to_string()),
                    MdNode::Emphasis(vec![MdNode::Text("text".to_string())]),
                    MdNode::Text(".".to_string()),
                ]),
            ]
        );
    }

    #[test]
    fn test_code_block_keeps_raw_lines() {
        let nodes = parse_markdown("```rust\nfn main() {}\nlet x = 1;\n```\n");
        assert_eq!(
            nodes,
            vec![MdNode::CodeBlock("fn main() {}\nlet x = 1;\n".to_string())]
        );
    }

    #[test]
    fn test_lists_and_rules() {
        let nodes = parse_markdown("1. one\n2. two\n\n---\n\n- a\n");
        assert!(matches!(&nodes[0], MdNode::List { ordered: true, items } if items.len() == 2));
        assert_eq!(nodes[1], MdNode::ThematicBreak);
        assert!(matches!(&nodes[2], MdNode::List { ordered: false, items } if items.len() == 1));
    }

    #[test]
    fn test_link_and_strikethrough() {
        let nodes = parse_markdown("[site](https://example.com) ~~gone~~\n");
        let MdNode::Paragraph(children) = &nodes[0] else {
            panic!("expected paragraph, got {:?}", nodes[0]);
        };
        assert_eq!(
            children[0],
            MdNode::Link {
                url: "https://example.com".to_string(),
                children: vec![MdNode::Text("site".to_string())]
            }
        );
        assert!(matches!(children[2], MdNode::Strikethrough(_)));
    }

    #[test]
    fn test_block_quote_becomes_container() {
        let nodes = parse_markdown("> quoted\n");
        assert!(
            matches!(&nodes[0], MdNode::Container(children) if matches!(children[0], MdNode::Paragraph(_)))
        );
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_markdown("").is_empty());
        assert!(parse_markdown("   \n\n").is_empty());
    }
}
