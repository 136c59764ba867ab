//! Sheet recognition.
//!
//! The pass that turns scanned images into box data lives here. Page
//! identity comes from the survey's [`Style`](crate::style::Style), box
//! measurements from [`checkbox`](crate::checkbox) and
//! [`textbox`](crate::textbox).
//!
//! Entry point is [`Recognizer`](crate::Recognizer); this module holds the
//! stage order and the duplex rules.

mod boxes;
mod duplex;
mod loader;
mod result;
mod run;

pub use duplex::duplex_partner;
pub use loader::{FileLoader, PageLoader};
pub use result::{ImageFailure, RecognitionStage, SheetReport};

pub(crate) use run::{recognize_sheet, PassInputs};
