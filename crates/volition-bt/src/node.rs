//! Authoring-time tree model.
//!
//! Trees are built programmatically; composites own their children
//! exclusively. Conditions hold source text (compiled when the tree is
//! lowered), behaviours hold an owned spec. Node names are carried through to
//! the runtime for diagnostics.

use volition_core::Name;

use crate::behaviour::BehaviourSpec;

pub enum BtNode<W> {
    Sequence {
        name: Name,
        children: Vec<BtNode<W>>,
    },
    Selector {
        name: Name,
        children: Vec<BtNode<W>>,
    },
    Condition {
        name: Name,
        expression: String,
    },
    Behaviour {
        name: Name,
        spec: Box<dyn BehaviourSpec<W>>,
    },
}

impl<W> BtNode<W> {
    pub fn sequence(name: impl Into<Name>, children: Vec<BtNode<W>>) -> Self {
        BtNode::Sequence {
            name: name.into(),
            children,
        }
    }

    pub fn selector(name: impl Into<Name>, children: Vec<BtNode<W>>) -> Self {
        BtNode::Selector {
            name: name.into(),
            children,
        }
    }

    pub fn condition(name: impl Into<Name>, expression: impl Into<String>) -> Self {
        BtNode::Condition {
            name: name.into(),
            expression: expression.into(),
        }
    }

    pub fn behaviour(name: impl Into<Name>, spec: impl BehaviourSpec<W> + 'static) -> Self {
        BtNode::Behaviour {
            name: name.into(),
            spec: Box::new(spec),
        }
    }

    pub fn name(&self) -> Name {
        match self {
            BtNode::Sequence { name, .. }
            | BtNode::Selector { name, .. }
            | BtNode::Condition { name, .. }
            | BtNode::Behaviour { name, .. } => *name,
        }
    }
}
