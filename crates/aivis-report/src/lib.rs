//! Mention detection, scorecard aggregation and report formatting.
//!
//! Everything here is pure: the same catalog, outcomes and run label always
//! produce the same [`WeeklyReport`] and the same rendered text.

pub mod aggregate;
pub mod detector;
pub mod format;

pub use aggregate::{aggregate, percent, FailedQuery, Gap, Hit, ProviderScore, WeeklyReport};
pub use detector::MentionDetector;
pub use format::{format_report, progress_bar, FormatOptions};
