//! Rendering module for converting reports to output formats.

mod html;
mod json;
mod text;

pub use html::{to_html, HtmlOptions};
pub use json::{to_json, JsonFormat};
pub use text::to_text;
