//! Status reconciliation: from two paginated listings to a pass/fail report.
//!
//! # Pipeline
//!
//! ```text
//! StatusSource ──fetch_all──▶ FetchedStatuses ──reconcile──▶ [JobOutcome]
//!                                                               │
//!                                   AggregatedReport ◀──aggregate (ExclusionPolicy)
//! ```
//!
//! `StatusValidator` runs the whole pipeline once per call to `validate`.
//! Nothing is carried over between passes.

pub mod config;
pub mod fetch;
pub mod format;
pub mod reconcile;
pub mod report;
pub mod source;
pub mod validator;

pub use config::{ConfigError, ConfigErrors, ReconciliationConfig, ValidatorBuilder};
pub use fetch::{FetchError, FetchedStatuses, MAX_PAGES, PER_PAGE, fetch_all};
pub use format::quoted_list;
pub use reconcile::{CheckRunClass, IdentityResolution, classify_check_run, reconcile};
pub use report::{AggregatedReport, ExclusionPolicy, aggregate};
pub use source::{CheckRunEntry, Page, PageRequest, StatusEntry, StatusSource};
pub use validator::{StatusValidator, ValidateError, Validator};
