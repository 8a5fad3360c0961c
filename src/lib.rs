//! Weekly plain-text timesheets in, per-period task summaries out.
//!
//! A timesheet is one file per week named `YYYYMMDD.txt` after its first day.
//! [`parse`] turns each file into [`model::Slot`]s, [`validate`] checks them,
//! [`aggregate`] rolls them up by period and task path, and [`render`]
//! prints the result as text or JSON.

pub mod aggregate;
pub mod cli;
pub mod clock;
pub mod commits;
pub mod error;
pub mod filters;
pub mod gitio;
pub mod model;
pub mod params;
pub mod parse;
pub mod processor;
pub mod render;
pub mod util;
pub mod validate;
pub mod window;
