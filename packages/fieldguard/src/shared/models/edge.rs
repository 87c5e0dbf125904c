//! Value-flow edges
//!
//! Edge kinds form a closed vocabulary. Every traversal rule in the
//! propagation engine matches on [`EdgeTag`]; adding a kind here forces the
//! engine's match arms to account for it.

use serde::{Deserialize, Serialize};

use super::node::NodeId;
use super::types::ModuleId;

/// Unique identifier for edges in the value-flow graph
pub type EdgeId = u32;

/// Field-address index payload of a Gep edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GepIndex {
    /// Constant struct field index (declaration order)
    Field(u32),
    /// Constant array element index
    Element(i64),
    /// Non-constant or otherwise unresolvable index
    Variant,
}

/// Payload of a field-address (Gep) edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GepDescriptor {
    pub index: GepIndex,
    /// Address computation reached the consumer through a copy-like call
    /// rather than a direct operand, so the declared base type is unreliable.
    pub via_copy_call: bool,
}

/// Call-site attribution of a Call/Return edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRef {
    /// Node standing for the call site
    pub callsite: NodeId,
    /// Callee name, as resolved by the front-end
    pub callee: String,
}

/// Semantic kind of a value-flow edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeKind {
    /// Address-of: src is an object, dst the node holding its address.
    /// Never traversed; feeds constant suppression during indexing.
    Address,
    /// Direct value copy (bitcast, assignment, trivial conversion)
    Copy,
    /// Memory write: src is the stored value, dst the address
    Store,
    /// Memory read: src is the address, dst the loaded value
    Load,
    /// Field or element address computation
    Gep(GepDescriptor),
    /// Control-flow merge operand into result
    Phi,
    /// Conditional select operand into result
    Select,
    /// Actual argument into callee formal
    Call(CallRef),
    /// Callee return value back to the call site
    Return(CallRef),
}

/// Payload-free discriminant of [`EdgeKind`], used as adjacency key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeTag {
    Address,
    Copy,
    Store,
    Load,
    Gep,
    Phi,
    Select,
    Call,
    Return,
}

impl EdgeKind {
    pub fn tag(&self) -> EdgeTag {
        match self {
            EdgeKind::Address => EdgeTag::Address,
            EdgeKind::Copy => EdgeTag::Copy,
            EdgeKind::Store => EdgeTag::Store,
            EdgeKind::Load => EdgeTag::Load,
            EdgeKind::Gep(_) => EdgeTag::Gep,
            EdgeKind::Phi => EdgeTag::Phi,
            EdgeKind::Select => EdgeTag::Select,
            EdgeKind::Call(_) => EdgeTag::Call,
            EdgeKind::Return(_) => EdgeTag::Return,
        }
    }

    /// Call-site attribution, for kinds that carry one.
    pub fn call_ref(&self) -> Option<&CallRef> {
        match self {
            EdgeKind::Call(r) | EdgeKind::Return(r) => Some(r),
            _ => None,
        }
    }

    pub fn gep(&self) -> Option<&GepDescriptor> {
        match self {
            EdgeKind::Gep(d) => Some(d),
            _ => None,
        }
    }
}

/// A value-flow graph edge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VfgEdge {
    pub id: EdgeId,
    pub src: NodeId,
    pub dst: NodeId,
    pub kind: EdgeKind,
    /// Module the originating instruction lives in, when attributable
    pub module: Option<ModuleId>,
    /// Enclosing function name, when attributable
    pub in_function: Option<String>,
}
