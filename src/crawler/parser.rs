//! HTML parser for a fetched page
//!
//! Parses the document once and pulls out everything later steps need:
//! - the extracted main content (see [`Extractor`])
//! - the raw href of every link, in document order
//!
//! `scraper::Html` is not `Send`, so the parsed document never outlives this
//! module; callers get owned data back and can hold it across awaits.

use crate::crawler::extractor::{compile, Extraction, Extractor};
use crate::HarvestError;
use scraper::{Html, Selector};

/// Owned results of parsing one page
#[derive(Debug, Clone)]
pub struct ParsedPage {
    pub extraction: Extraction,

    /// Raw href values of `<a>` tags, unresolved
    pub hrefs: Vec<String>,
}

/// Parses fetched pages into owned [`ParsedPage`]s
#[derive(Debug)]
pub struct PageParser {
    extractor: Extractor,
    links: Selector,
}

impl PageParser {
    pub fn new() -> Result<Self, HarvestError> {
        Ok(Self {
            extractor: Extractor::new()?,
            links: compile("a[href]")?,
        })
    }

    /// Parses HTML content and runs the extractor over it
    ///
    /// # Link Extraction Rules
    ///
    /// **Include:**
    /// - `<a href="...">` tags anywhere in the document
    ///
    /// **Exclude:**
    /// - `<a href="..." download>`
    /// - empty hrefs
    ///
    /// Hrefs are returned as written; resolution and classification happen in
    /// [`crate::crawler::LinkClassifier`].
    ///
    /// # Example
    ///
    /// ```
    /// use doc_harvest::crawler::PageParser;
    ///
    /// let html = r#"<html><body><div role="main"><p>Hi</p><a href="next.html">Next</a></div></body></html>"#;
    /// let parsed = PageParser::new().unwrap().parse(html);
    /// assert_eq!(parsed.hrefs, vec!["next.html".to_string()]);
    /// assert!(parsed.extraction.block().is_some());
    /// ```
    pub fn parse(&self, html: &str) -> ParsedPage {
        let document = Html::parse_document(html);

        let extraction = self.extractor.extract(&document);
        let hrefs = self.collect_hrefs(&document);

        ParsedPage { extraction, hrefs }
    }

    /// Collects every link href from the document
    fn collect_hrefs(&self, document: &Html) -> Vec<String> {
        document
            .select(&self.links)
            .filter(|element| element.value().attr("download").is_none())
            .filter_map(|element| element.value().attr("href"))
            .map(str::trim)
            .filter(|href| !href.is_empty())
            .map(str::to_string)
            .collect()
    }
}
