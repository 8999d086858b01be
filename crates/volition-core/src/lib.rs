//! Core data model for the volition agent runtime: interned names, typed
//! variable storage and diagnostics.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod error;
pub mod name;
pub mod trace;
pub mod variables;

pub use error::{Diagnostic, ErrorCategory, ErrorCode, ErrorReport};
pub use name::{init_pool, Name};
pub use trace::{NullTraceSink, TraceEvent, TraceLog, TraceSink};
pub use variables::{ExpType, SlotIndex, VariableLayout, VariablePack};
