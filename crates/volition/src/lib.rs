//! Umbrella crate that re-exports the `volition-*` building blocks.
//!
//! This crate is intended as a convenient entrypoint: declare variables with
//! [`core`], compile expressions with [`expr`], build and tick behaviour
//! trees with [`bt`].

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

#[cfg(feature = "core")]
#[cfg_attr(docsrs, doc(cfg(feature = "core")))]
pub use volition_core as core;

#[cfg(feature = "expr")]
#[cfg_attr(docsrs, doc(cfg(feature = "expr")))]
pub use volition_expr as expr;

#[cfg(feature = "bt")]
#[cfg_attr(docsrs, doc(cfg(feature = "bt")))]
pub use volition_bt as bt;
