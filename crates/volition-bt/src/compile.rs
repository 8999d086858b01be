//! Tree-to-bytecode lowering.
//!
//! The compiler walks the authoring tree once, emitting into a single flat
//! word stream with placeholder halfwords for forward references, then
//! resolves every recorded fixup once all labels are known. Condition errors
//! accumulate across the whole tree so one build surfaces every problem.

use std::fmt::Write as _;
use std::sync::Arc;

use volition_core::{
    ErrorCategory, ErrorCode, ErrorReport, ExpType, Name, VariableLayout,
};
use volition_expr::{ExpressionCompiler, ExpressionData};

use crate::behaviour::{BehaviourSpec, CompileContext};
use crate::node::BtNode;
use crate::opcode::{pack, unpack, BtOp};

/// Placeholder halfword written where a label address belongs.
const INVALID_ADDRESS: u16 = 0xcdcd;

/// Label address before the label's position is emitted.
const UNRESOLVED: u16 = u16::MAX;

/// A compiled behaviour tree. Immutable after compilation; share across
/// evaluators via `Arc`.
pub struct BtRuntimeData<W> {
    pub(crate) layout: Arc<VariableLayout>,
    pub(crate) seq_node_count: u16,
    /// Child count per sequence, in allocation order. The inline jump tables
    /// do not carry their own length, so the disassembler and bounds checks
    /// read it from here.
    pub(crate) seq_child_counts: Vec<u16>,
    pub(crate) bytecode: Vec<u32>,
    pub(crate) expressions: Vec<ExpressionData>,
    pub(crate) node_names: Vec<Name>,
    pub(crate) behaviour_specs: Vec<Box<dyn BehaviourSpec<W>>>,
}

impl<W> std::fmt::Debug for BtRuntimeData<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BtRuntimeData")
            .field("layout", &self.layout)
            .field("seq_node_count", &self.seq_node_count)
            .field("seq_child_counts", &self.seq_child_counts)
            .field("bytecode", &self.bytecode)
            .field("expressions", &self.expressions)
            .field("node_names", &self.node_names)
            .field("behaviour_specs", &self.behaviour_specs.len())
            .finish()
    }
}

impl<W> BtRuntimeData<W> {
    pub fn layout(&self) -> &Arc<VariableLayout> {
        &self.layout
    }

    /// Number of Sequence nodes; sizes an evaluator's resume-counter array.
    pub fn seq_node_count(&self) -> u16 {
        self.seq_node_count
    }

    pub fn bytecode(&self) -> &[u32] {
        &self.bytecode
    }

    pub fn expressions(&self) -> &[ExpressionData] {
        &self.expressions
    }

    pub fn node_names(&self) -> &[Name] {
        &self.node_names
    }

    /// Human-readable listing, one instruction per line.
    pub fn disassemble(&self) -> String {
        let mut out = String::new();
        let code = &self.bytecode;
        let mut ip = 0usize;

        while ip < code.len() {
            let (bits, operand) = unpack(code[ip]);
            let Some(op) = BtOp::from_bits(bits) else {
                let _ = writeln!(out, "{ip:04}  ??? ({bits:#06x})");
                ip += 1;
                continue;
            };

            match op {
                BtOp::IndicateNodeStart => {
                    let name = self.node_names[operand as usize];
                    let _ = writeln!(out, "{ip:04}  IndicateNodeStart {name}");
                    ip += 1;
                }
                BtOp::SetFail => {
                    let _ = writeln!(out, "{ip:04}  SetFail");
                    ip += 1;
                }
                BtOp::SetSuccess => {
                    let _ = writeln!(out, "{ip:04}  SetSuccess");
                    ip += 1;
                }
                BtOp::StoreSeqIdx | BtOp::CondStoreSeqIdx => {
                    let value = code[ip + 1] & 0xffff;
                    let _ = writeln!(out, "{ip:04}  {op:?} s{operand}, {value}");
                    ip += 2;
                }
                BtOp::EvalExpr => {
                    let _ = writeln!(out, "{ip:04}  EvalExpr e{operand}");
                    ip += 1;
                }
                BtOp::ExecBehaviour => {
                    let _ = writeln!(out, "{ip:04}  ExecBehaviour b{operand}");
                    ip += 1;
                }
                BtOp::JumpTable => {
                    let targets = self.seq_child_counts[operand as usize] as usize;
                    let _ = writeln!(out, "{ip:04}  JumpTable s{operand}");
                    for t in 0..targets {
                        let target = code[ip + 1 + t] & 0xffff;
                        let _ = writeln!(out, "{:04}    -> {target:04}", ip + 1 + t);
                    }
                    ip += 1 + targets;
                }
                BtOp::JumpNotFail | BtOp::JumpNotSuccess => {
                    let _ = writeln!(out, "{ip:04}  {op:?} -> {operand:04}");
                    ip += 1;
                }
            }
        }

        out
    }
}

/// Compiles an authoring tree against a variable layout.
pub struct BtCompiler {
    layout: Arc<VariableLayout>,
}

impl BtCompiler {
    pub fn new(layout: Arc<VariableLayout>) -> Self {
        Self { layout }
    }

    pub fn compile<W>(&self, root: &BtNode<W>) -> Result<BtRuntimeData<W>, ErrorReport> {
        let mut emitter = Emitter {
            layout: self.layout.clone(),
            errors: ErrorReport::new(),
            bytecode: Vec::new(),
            expressions: Vec::new(),
            node_names: Vec::new(),
            behaviour_specs: Vec::new(),
            seq_node_count: 0,
            seq_child_counts: Vec::new(),
            labels: Vec::new(),
            fixups: Vec::new(),
        };

        emitter.compile_node(root);

        if !emitter.errors.is_empty() {
            return Err(emitter.errors);
        }

        emitter.fixup_labels();

        let data = BtRuntimeData {
            layout: self.layout.clone(),
            seq_node_count: emitter.seq_node_count,
            seq_child_counts: emitter.seq_child_counts,
            bytecode: emitter.bytecode,
            expressions: emitter.expressions,
            node_names: emitter.node_names,
            behaviour_specs: emitter.behaviour_specs,
        };
        tracing::debug!("compiled behaviour tree:\n{}", data.disassemble());
        Ok(data)
    }
}

struct Fixup {
    address: usize,
    high_half: bool,
    label: usize,
}

struct Emitter<W> {
    layout: Arc<VariableLayout>,
    errors: ErrorReport,
    bytecode: Vec<u32>,
    expressions: Vec<ExpressionData>,
    node_names: Vec<Name>,
    behaviour_specs: Vec<Box<dyn BehaviourSpec<W>>>,
    seq_node_count: u16,
    seq_child_counts: Vec<u16>,
    labels: Vec<u16>,
    fixups: Vec<Fixup>,
}

impl<W> Emitter<W> {
    fn allocate_label(&mut self) -> usize {
        self.labels.push(UNRESOLVED);
        self.labels.len() - 1
    }

    /// Bind `label` to the next emitted address.
    fn emit_label(&mut self, label: usize) {
        self.labels[label] = self.bytecode.len() as u16;
    }

    fn record_fixup(&mut self, address: usize, high_half: bool, label: usize) {
        self.fixups.push(Fixup {
            address,
            high_half,
            label,
        });
    }

    fn emit(&mut self, op: BtOp, operand: u16) -> usize {
        self.bytecode.push(pack(op, operand));
        self.bytecode.len() - 1
    }

    fn emit_wide(&mut self, op: BtOp, operand_a: u16, operand_b: u16) -> usize {
        self.bytecode.push(pack(op, operand_a));
        self.bytecode.push(u32::from(operand_b));
        self.bytecode.len() - 2
    }

    fn emit_data(&mut self, high: u16, low: u16) -> usize {
        self.bytecode
            .push((u32::from(high) << 16) | u32::from(low));
        self.bytecode.len() - 1
    }

    fn fixup_labels(&mut self) {
        for fixup in &self.fixups {
            let address = self.labels[fixup.label];
            debug_assert!(address != UNRESOLVED, "label never emitted");

            let word = self.bytecode[fixup.address];
            self.bytecode[fixup.address] = if fixup.high_half {
                (u32::from(address) << 16) | (word & 0xffff)
            } else {
                (word & 0xffff_0000) | u32::from(address)
            };
        }
        self.fixups.clear();
    }

    fn compile_node(&mut self, node: &BtNode<W>) {
        match node {
            BtNode::Condition { name, expression } => {
                self.compile_condition(*name, expression)
            }
            BtNode::Behaviour { name, spec } => self.compile_behaviour(*name, spec.as_ref()),
            BtNode::Sequence { children, .. } => self.compile_sequence(children),
            BtNode::Selector { children, .. } => self.compile_selector(children),
        }
    }

    fn compile_condition(&mut self, name: Name, expression: &str) {
        let compiled = ExpressionCompiler::new(&self.layout).compile(expression);
        match compiled {
            Err(report) => self.errors.combine(&report),
            Ok(program) if program.result_type() != ExpType::Bool => {
                self.errors.push(
                    ErrorCategory::ExpressionType,
                    ErrorCode::ConditionTypeNotBool,
                    format!("Condition node '{name}' must be a boolean expression"),
                );
            }
            Ok(program) => {
                let index = self.expressions.len() as u16;
                self.expressions.push(program);
                self.emit(BtOp::EvalExpr, index);
            }
        }
    }

    fn compile_behaviour(&mut self, name: Name, spec: &dyn BehaviourSpec<W>) {
        let mut clone = spec.duplicate();
        let mut ctx = CompileContext {
            layout: &self.layout,
            errors: &mut self.errors,
        };
        clone.compile_expressions(&mut ctx);

        let spec_index = self.behaviour_specs.len() as u16;
        self.behaviour_specs.push(clone);
        let name_index = self.node_names.len() as u16;
        self.node_names.push(name);

        self.emit(BtOp::IndicateNodeStart, name_index);
        self.emit(BtOp::ExecBehaviour, spec_index);
    }

    /// A sequence resumes from the child that last reported in-progress: a
    /// per-sequence jump table dispatches on the resume counter, and each
    /// child's tail updates the counter and bails to the end on anything but
    /// success.
    fn compile_sequence(&mut self, children: &[BtNode<W>]) {
        let seq = self.seq_node_count;
        self.seq_node_count += 1;
        self.seq_child_counts.push(children.len() as u16);

        // A childless sequence succeeds outright and needs no dispatch.
        if children.is_empty() {
            self.emit_wide(BtOp::StoreSeqIdx, seq, 0);
            self.emit(BtOp::SetSuccess, 0);
            return;
        }

        let end_label = self.allocate_label();

        self.emit(BtOp::JumpTable, seq);
        let entry_labels: Vec<usize> = children
            .iter()
            .map(|_| {
                let label = self.allocate_label();
                let address = self.emit_data(INVALID_ADDRESS, INVALID_ADDRESS);
                self.record_fixup(address, false, label);
                label
            })
            .collect();

        for (index, (child, label)) in children.iter().zip(entry_labels).enumerate() {
            self.emit_label(label);
            self.compile_node(child);

            self.emit_wide(BtOp::CondStoreSeqIdx, seq, index as u16);
            let jump = self.emit(BtOp::JumpNotSuccess, INVALID_ADDRESS);
            self.record_fixup(jump, true, end_label);
        }

        // Reached only when every child succeeded.
        self.emit_wide(BtOp::StoreSeqIdx, seq, 0);
        self.emit(BtOp::SetSuccess, 0);
        self.emit_label(end_label);
    }

    /// Selectors carry no resume state: every tick re-evaluates the children
    /// from the start, so branch flips interrupt whatever ran below.
    fn compile_selector(&mut self, children: &[BtNode<W>]) {
        let end_label = self.allocate_label();

        for child in children {
            self.compile_node(child);
            let jump = self.emit(BtOp::JumpNotFail, INVALID_ADDRESS);
            self.record_fixup(jump, true, end_label);
        }

        self.emit_label(end_label);
    }
}
