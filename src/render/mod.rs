//! Report rendering: template, HTML fragments, output files, PDF

pub mod html;
pub mod pdf;
pub mod template;
pub mod writer;

pub use pdf::convert_to_pdf;
pub use template::{escape_html, leftover_placeholders, Template};
pub use writer::{next_portfolio_number, portfolio_dir, render_portfolio, RenderOutput, PDF_FILE};
