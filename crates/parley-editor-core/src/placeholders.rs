//! Sample text inserted by toolbar commands when nothing is selected.

use serde::{Deserialize, Serialize};

/// Localizable placeholder strings.
///
/// Missing fields fall back to the English defaults, so a partial locale
/// file only needs to list what it translates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Placeholders {
    pub bold: String,
    pub italic: String,
    pub strikethrough: String,
    pub code: String,
    pub code_block: String,
    pub formula: String,
    pub heading: String,
    pub list_item: String,
    pub quote: String,
    pub link_text: String,
    pub link_url: String,
    pub image_alt: String,
    pub uploading: String,
    pub table_header: String,
    pub table_cell: String,
    pub chart: String,
}

impl Default for Placeholders {
    fn default() -> Self {
        Self {
            bold: "strong text".into(),
            italic: "emphasized text".into(),
            strikethrough: "strikethrough text".into(),
            code: "code".into(),
            code_block: "code here".into(),
            formula: "E = mc^2".into(),
            heading: "Heading".into(),
            list_item: "List item".into(),
            quote: "Blockquote".into(),
            link_text: "link description".into(),
            link_url: "https://".into(),
            image_alt: "image description".into(),
            uploading: "Uploading...".into(),
            table_header: "Column".into(),
            table_cell: "Cell".into(),
            chart: "graph TD;\n    A-->B;".into(),
        }
    }
}
