//! LetterRender - turns questionnaire answers into formatted letters
//!
//! A letter template is markdown with Jinja-style directives. Rendering runs
//! the template against a field-value map, collapses stray blank lines, and
//! derives two outputs from the same text: HTML for display and plain text
//! for copying or email.
//!
//! # Pipeline
//!
//! ```text
//! template + fields + today
//!     │
//!     ├─ inject `date` (long-form today)
//!     ├─ substitute (filters: money, formatDate, depositInterest)
//!     ├─ collapse blank-line runs
//!     │
//!     ├──► presentation (markdown → HTML, newlines as <br />)
//!     └──► plain text   (markdown markers stripped)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use letterrender::{Compositor, FieldValues, LetterTemplate, RenderRequest};
//!
//! let template = LetterTemplate::parse("greeting", "Dear {{ name }},")?;
//! let fields = FieldValues::new().with("name", "Alex");
//! let letter = Compositor::default().render(&template, &RenderRequest::for_today(fields))?;
//! println!("{}", letter.plain_text);
//! ```
//!
//! # Modules
//!
//! - [`filters`] - `money`, `formatDate` and `depositInterest` transforms
//! - [`rates`] - interest-rate table for deposit projections
//! - [`compositor`] - template parsing and the render pipeline
//! - [`markup`] - blank-line collapse, HTML and plain-text conversion
//! - [`fields`] - field-value map produced by a questionnaire

pub mod compositor;
pub mod error;
pub mod fields;
pub mod filters;
pub mod markup;
pub mod rates;

pub use compositor::{Compositor, LetterTemplate, RenderRequest, RenderedLetter, TODAY_FIELD, render_letter};
pub use error::LetterError;
pub use fields::FieldValues;
pub use filters::{FilterLibrary, InterestOutcome};
pub use rates::RateTable;
