//! fashionbench-report: Renders suite reports for humans.
//!
//! JSON persistence lives with the report type in `fashionbench-core`;
//! this crate adds a self-contained HTML page and a Markdown summary.

pub mod html;
pub mod markdown;

pub use html::{generate_html, write_html_report};
pub use markdown::{generate_markdown, write_markdown_report};
