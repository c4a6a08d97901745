//! Main-content extraction
//!
//! Documentation generators wrap the interesting part of a page in a handful
//! of well-known containers. The extractor tries them in a fixed order and
//! falls back to Doxygen member-documentation blocks when none has any text.

use crate::HarvestError;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};

/// Content regions, most specific first
pub const CONTENT_REGIONS: [&str; 6] = [
    r#"[itemprop="articleBody"]"#,
    r#"[role="main"]"#,
    "div.textblock",
    "div.contents",
    "#doc-content",
    "#content",
];

/// Separator placed between member-documentation items
pub const MEMBER_SEPARATOR: &str = "\n\n---\n\n";

pub const UNTITLED: &str = "Untitled";
pub const UNTITLED_MEMBER_DOCS: &str = "Untitled (member documentation)";

const PERMALINK_GLYPH: char = '¶';

const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript"];

const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "details", "div", "dl", "dt",
    "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5",
    "h6", "header", "hr", "li", "main", "nav", "ol", "p", "pre", "section", "summary",
    "table", "tbody", "td", "th", "tr", "ul",
];

/// Title and rendered text of the extracted region
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentBlock {
    pub title: String,
    pub text: String,
}

/// Outcome of running the extractor over one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// One of [`CONTENT_REGIONS`] matched with non-empty text
    Primary {
        region: &'static str,
        block: ContentBlock,
    },
    /// No region matched; the page is a list of member-documentation items
    MemberDocs { items: usize, block: ContentBlock },
    /// Nothing recognisable on the page
    NotFound,
}

impl Extraction {
    pub fn block(&self) -> Option<&ContentBlock> {
        match self {
            Extraction::Primary { block, .. } | Extraction::MemberDocs { block, .. } => Some(block),
            Extraction::NotFound => None,
        }
    }

    pub fn into_block(self) -> Option<ContentBlock> {
        match self {
            Extraction::Primary { block, .. } | Extraction::MemberDocs { block, .. } => Some(block),
            Extraction::NotFound => None,
        }
    }
}

/// Compiled selectors for the content regions and fallbacks
#[derive(Debug)]
pub struct Extractor {
    regions: Vec<(&'static str, Selector)>,
    heading: Selector,
    title: Selector,
    member_item: Selector,
    member_name: Selector,
    member_proto: Selector,
    member_doc: Selector,
}

impl Extractor {
    pub fn new() -> Result<Self, HarvestError> {
        let regions = CONTENT_REGIONS
            .iter()
            .map(|region| compile(region).map(|selector| (*region, selector)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            regions,
            heading: compile("h1")?,
            title: compile("title")?,
            member_item: compile("div.memitem")?,
            member_name: compile(".memname")?,
            member_proto: compile(".memproto")?,
            member_doc: compile(".memdoc")?,
        })
    }

    pub fn extract(&self, document: &Html) -> Extraction {
        for (region, selector) in &self.regions {
            let text = document
                .select(selector)
                .next()
                .map(render_text)
                .unwrap_or_default();

            if !text.is_empty() {
                return Extraction::Primary {
                    region: *region,
                    block: ContentBlock {
                        title: self.page_title(document).unwrap_or_else(|| UNTITLED.to_string()),
                        text,
                    },
                };
            }
        }

        let items: Vec<String> = document
            .select(&self.member_item)
            .filter_map(|item| self.render_member(item))
            .collect();

        if items.is_empty() {
            return Extraction::NotFound;
        }

        Extraction::MemberDocs {
            items: items.len(),
            block: ContentBlock {
                title: self
                    .page_title(document)
                    .unwrap_or_else(|| UNTITLED_MEMBER_DOCS.to_string()),
                text: items.join(MEMBER_SEPARATOR),
            },
        }
    }

    /// First non-empty `<h1>`, else `<title>`
    fn page_title(&self, document: &Html) -> Option<String> {
        [&self.heading, &self.title].into_iter().find_map(|selector| {
            document
                .select(selector)
                .map(inline_text)
                .find(|text| !text.is_empty())
        })
    }

    fn render_member(&self, item: ElementRef<'_>) -> Option<String> {
        let name = item
            .select(&self.member_name)
            .next()
            .or_else(|| item.select(&self.member_proto).next())
            .map(inline_text)
            .unwrap_or_default();

        let doc = item
            .select(&self.member_doc)
            .next()
            .map(render_text)
            .unwrap_or_default();

        match (name.is_empty(), doc.is_empty()) {
            (true, true) => None,
            (false, true) => Some(name),
            (true, false) => Some(doc),
            (false, false) => Some(format!("{}\n{}", name, doc)),
        }
    }
}

pub(crate) fn compile(selector: &str) -> Result<Selector, HarvestError> {
    Selector::parse(selector).map_err(|e| HarvestError::Selector {
        selector: selector.to_string(),
        message: format!("{:?}", e),
    })
}

/// Text of an element on a single line
fn inline_text(element: ElementRef<'_>) -> String {
    let text: String = element.text().collect();
    text.replace(PERMALINK_GLYPH, "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Renders an element as newline-separated text lines
///
/// Block-level elements and `<br>` break lines; whitespace collapses except
/// inside `<pre>`; lines are trimmed and blank lines dropped.
pub fn render_text(element: ElementRef<'_>) -> String {
    let mut renderer = TextRenderer::default();
    renderer.walk(element, false);
    renderer.finish()
}

#[derive(Default)]
struct TextRenderer {
    lines: Vec<String>,
    current: String,
}

impl TextRenderer {
    fn walk(&mut self, element: ElementRef<'_>, in_pre: bool) {
        let name = element.value().name();
        if SKIPPED_ELEMENTS.contains(&name) {
            return;
        }
        if name == "br" {
            self.break_line();
            return;
        }

        let block = BLOCK_ELEMENTS.contains(&name);
        let preformatted = in_pre || name == "pre";
        if block {
            self.break_line();
        }

        for child in element.children() {
            match child.value() {
                Node::Text(text) => self.push_text(text, preformatted),
                Node::Element(_) => {
                    if let Some(child) = ElementRef::wrap(child) {
                        self.walk(child, preformatted);
                    }
                }
                _ => {}
            }
        }

        if block {
            self.break_line();
        }
    }

    fn push_text(&mut self, text: &str, preformatted: bool) {
        if preformatted {
            let mut parts = text.split('\n');
            if let Some(first) = parts.next() {
                self.current.push_str(first);
            }
            for part in parts {
                self.break_line();
                self.current.push_str(part);
            }
            return;
        }

        for c in text.chars() {
            if c.is_ascii_whitespace() {
                if !self.current.is_empty() && !self.current.ends_with(' ') {
                    self.current.push(' ');
                }
            } else {
                self.current.push(c);
            }
        }
    }

    fn break_line(&mut self) {
        let line = self.current.replace(PERMALINK_GLYPH, "");
        let line = line.trim();
        if !line.is_empty() {
            self.lines.push(line.to_string());
        }
        self.current.clear();
    }

    fn finish(mut self) -> String {
        self.break_line();
        self.lines.join("\n")
    }
}
