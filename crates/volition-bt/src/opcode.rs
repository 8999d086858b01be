//! Behaviour-tree instruction set.
//!
//! Instructions begin with one 32-bit word: opcode in the low half, operand A
//! in the high half. `StoreSeqIdx`/`CondStoreSeqIdx` carry operand B in the
//! low half of the following word. `JumpTable` is followed inline by one
//! 16-bit target word per sequence child.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum BtOp {
    /// operand = node-name table index.
    IndicateNodeStart = 1,
    SetFail,
    SetSuccess,
    /// operand = sequence index; word B = value to store.
    StoreSeqIdx,
    /// operand = sequence index; word B = value to store when the last
    /// result was in-progress, 0 otherwise.
    CondStoreSeqIdx,
    /// operand = expression table index.
    EvalExpr,
    /// operand = behaviour-spec table index.
    ExecBehaviour,
    /// operand = sequence index; the resume counter selects the inline
    /// target.
    JumpTable,
    /// operand = target address.
    JumpNotFail,
    /// operand = target address.
    JumpNotSuccess,
}

impl BtOp {
    pub(crate) fn from_bits(bits: u16) -> Option<BtOp> {
        Some(match bits {
            1 => BtOp::IndicateNodeStart,
            2 => BtOp::SetFail,
            3 => BtOp::SetSuccess,
            4 => BtOp::StoreSeqIdx,
            5 => BtOp::CondStoreSeqIdx,
            6 => BtOp::EvalExpr,
            7 => BtOp::ExecBehaviour,
            8 => BtOp::JumpTable,
            9 => BtOp::JumpNotFail,
            10 => BtOp::JumpNotSuccess,
            _ => return None,
        })
    }
}

pub(crate) fn pack(op: BtOp, operand: u16) -> u32 {
    u32::from(op as u16) | (u32::from(operand) << 16)
}

pub(crate) fn unpack(word: u32) -> (u16, u16) {
    ((word & 0xffff) as u16, (word >> 16) as u16)
}
