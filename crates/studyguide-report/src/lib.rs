//! studyguide-report — Review reports for completed quiz runs.

pub mod html;

pub use html::{generate_html, write_html_report};
