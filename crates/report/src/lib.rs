//! Audit report records and their JSON Schema.
//!
//! The typed records reject unknown fields, mirroring the
//! `additionalProperties: false` of the published schemas.

pub mod report;
pub mod schema;
pub mod validation;

pub use report::{
    Control, ControlGroup, ControlResult, MinControl, MinReport, Profile, Ref, Report,
    ResultStatus, SourceLocation, Statistics, Supports,
};
pub use validation::{validate_min_report, validate_report, ValidationError, ValidationResult};
