//! Registered accessibility rules

use serde::{Deserialize, Serialize};

use crate::core::issue::RuleType;

/// A rule the scanner checks content against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDefinition {
    pub slug: String,
    pub rule_type: RuleType,
    pub title: String,
}

impl RuleDefinition {
    pub fn new(slug: impl Into<String>, rule_type: RuleType, title: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            rule_type,
            title: title.into(),
        }
    }
}

/// Source of the registered rule list
pub trait RuleRegistry {
    fn rules(&self) -> &[RuleDefinition];

    fn rule_count(&self) -> usize {
        self.rules().len()
    }
}

/// Fixed list of rules
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<RuleDefinition>,
}

impl RuleSet {
    pub fn new(rules: Vec<RuleDefinition>) -> Self {
        Self { rules }
    }

    /// The rules shipped with the accessibility checker
    pub fn builtin() -> Self {
        use RuleType::{Error, Warning};

        let rules = [
            ("img_alt_missing", Error, "Image Missing Alternative Text"),
            ("img_alt_invalid", Warning, "Low-quality Alternative Text"),
            ("img_linked_alt_missing", Error, "Linked Image Missing Alternative Text"),
            ("img_linked_alt_empty", Error, "Linked Image Empty Alternative Text"),
            ("img_alt_empty", Warning, "Image Empty Alternative Text"),
            ("img_alt_redundant", Warning, "Duplicate Alternative Text"),
            ("img_alt_long", Warning, "Image Alternative Text Too Long"),
            ("img_animated_gif", Warning, "Image Animated GIF"),
            ("imagemap_missing_alt_text", Error, "Image Map Missing Alternative Text"),
            ("incorrect_heading_order", Error, "Incorrect Heading Order"),
            ("missing_headings", Warning, "Missing Subheadings"),
            ("empty_heading_tag", Error, "Empty Heading Tag"),
            ("possible_heading", Warning, "Possible Heading"),
            ("iframe_missing_title", Error, "iFrame Missing Title"),
            ("empty_paragraph_tag", Warning, "Empty Paragraph Tag"),
            ("empty_link", Error, "Empty Link"),
            ("empty_button", Error, "Empty Button"),
            ("link_ambiguous", Warning, "Ambiguous Anchor Text"),
            ("link_blank", Warning, "Link Opens New Window or Tab"),
            ("link_improper", Error, "Improper Use of Link"),
            ("link_non_html_file", Warning, "Link to Non-HTML Document"),
            ("link_pdf", Warning, "Link to PDF"),
            ("link_ms_office_file", Warning, "Link to MS Office File"),
            ("broken_skip_anchor_link", Error, "Broken Skip or Anchor Link"),
            ("missing_form_label", Error, "Missing Form Label"),
            ("duplicate_form_label", Error, "Duplicate Form Label"),
            ("missing_table_header", Error, "Missing Table Header"),
            ("empty_table_header", Warning, "Empty Table Header"),
            ("color_contrast_failure", Error, "Insufficient Color Contrast"),
            ("text_small", Warning, "Text Too Small"),
            ("text_justified", Warning, "Text Justified"),
            ("text_underlined", Warning, "Underlined Text"),
            ("text_blinking_scrolling", Error, "Blinking or Scrolling Content"),
            ("missing_lang_attr", Error, "Missing Language Declaration"),
            ("missing_title", Error, "Missing Title"),
            ("long_description_invalid", Warning, "Long Description Invalid"),
            ("tab_order_modified", Warning, "Tab Order Modified"),
            ("aria_hidden", Warning, "ARIA Hidden"),
            ("video_present", Warning, "A Video is Present"),
            ("audio_present", Warning, "Audio is Present"),
            ("slider_present", Warning, "A Slider is Present"),
            ("transcript_missing", Warning, "Missing Transcript"),
        ];

        Self::new(
            rules
                .into_iter()
                .map(|(slug, rule_type, title)| RuleDefinition::new(slug, rule_type, title))
                .collect(),
        )
    }
}

impl RuleRegistry for RuleSet {
    fn rules(&self) -> &[RuleDefinition] {
        &self.rules
    }
}
