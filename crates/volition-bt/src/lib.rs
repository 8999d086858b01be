//! Behaviour trees for volition agents.
//!
//! An authoring tree of composites (Sequence, Selector) and leaves
//! (Condition, Behaviour) compiles to a flat bytecode; [`BtEvaluator`] drives
//! that bytecode one tick at a time, evaluating conditions through the
//! expression VM and running host-supplied behaviour executors with explicit
//! interrupt and cleanup semantics.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod behaviour;
pub mod compile;
pub mod eval;
pub mod node;
pub mod opcode;
pub mod walk;

pub use behaviour::{BehaviourExec, BehaviourSpec, BtContext, BtResult, CompileContext};
pub use compile::{BtCompiler, BtRuntimeData};
pub use eval::BtEvaluator;
pub use node::BtNode;
pub use opcode::BtOp;
pub use walk::{PreparedTree, TreeEvaluator};
