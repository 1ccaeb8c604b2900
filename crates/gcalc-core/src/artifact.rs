//! Compiled artifacts and the GPU bytecode instruction set.
//!
//! The external compiler returns, for every renderable equation, a stack
//! bytecode body plus the shader-source snippet it was lowered from. On the
//! wire and in the program texture each instruction is an `(opcode, operand)`
//! pair: basic ops occupy `0..32`, binary ops are tagged with `32`, unary ops
//! with `64`.
//!
//! Artifacts carry body instructions only. Slot markers ([`Instruction::StExpr`])
//! and the terminator ([`Instruction::End`]) are emitted by the program
//! encoder, so an artifact containing either is rejected as malformed.

use std::convert::TryFrom;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

const OP_ST_EXPR: u8 = 0;
const OP_PUSH: u8 = 1;
const OP_PUSH_X: u8 = 2;
const OP_PUSH_Y: u8 = 3;
const OP_CPY: u8 = 4;
const OP_POP: u8 = 5;
const OP_STORE: u8 = 6;
const OP_END: u8 = 7;

const BINARY_TAG: u8 = 32;
const UNARY_TAG: u8 = 64;

/// Unary operations understood by the shading stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    Minus,
    Sin,
    Cos,
    Floor,
    Abs,
    Ceil,
    Log,
    Ln,
    Sqrt,
    Tan,
}

impl UnaryOp {
    const ALL: [UnaryOp; 10] = [
        UnaryOp::Minus,
        UnaryOp::Sin,
        UnaryOp::Cos,
        UnaryOp::Floor,
        UnaryOp::Abs,
        UnaryOp::Ceil,
        UnaryOp::Log,
        UnaryOp::Ln,
        UnaryOp::Sqrt,
        UnaryOp::Tan,
    ];

    fn code(self) -> u8 {
        match self {
            UnaryOp::Minus => 0,
            UnaryOp::Sin => 1,
            UnaryOp::Cos => 2,
            UnaryOp::Floor => 3,
            UnaryOp::Abs => 4,
            UnaryOp::Ceil => 5,
            UnaryOp::Log => 6,
            UnaryOp::Ln => 7,
            UnaryOp::Sqrt => 8,
            UnaryOp::Tan => 9,
        }
    }

    fn from_code(code: u8) -> Option<UnaryOp> {
        UnaryOp::ALL.get(code as usize).copied()
    }
}

/// One stack-machine instruction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "(u8, f64)", try_from = "(u8, f64)")]
pub enum Instruction {
    /// Begin the program of the given slot.
    StExpr(u32),
    Push(f64),
    PushX,
    PushY,
    Cpy,
    Pop,
    /// Store the top of the stack as the slot's value.
    Store,
    /// End-of-program sentinel.
    End,
    Add,
    Mul,
    Div,
    Pow,
    Unary(UnaryOp),
}

impl Instruction {
    /// Returns the `(opcode, operand)` pair used on the wire and in textures.
    pub fn to_pair(self) -> (u8, f64) {
        match self {
            Instruction::StExpr(slot) => (OP_ST_EXPR, f64::from(slot)),
            Instruction::Push(value) => (OP_PUSH, value),
            Instruction::PushX => (OP_PUSH_X, 0.0),
            Instruction::PushY => (OP_PUSH_Y, 0.0),
            Instruction::Cpy => (OP_CPY, 0.0),
            Instruction::Pop => (OP_POP, 0.0),
            Instruction::Store => (OP_STORE, 0.0),
            Instruction::End => (OP_END, 0.0),
            Instruction::Add => (BINARY_TAG, 0.0),
            Instruction::Mul => (BINARY_TAG | 1, 0.0),
            Instruction::Div => (BINARY_TAG | 2, 0.0),
            Instruction::Pow => (BINARY_TAG | 3, 0.0),
            Instruction::Unary(op) => (UNARY_TAG | op.code(), 0.0),
        }
    }

    /// Decodes an `(opcode, operand)` pair.
    pub fn from_pair(opcode: u8, operand: f64) -> Result<Instruction, CoreError> {
        let instruction = match opcode {
            OP_ST_EXPR => {
                if operand < 0.0 || operand.fract() != 0.0 || operand > f64::from(u32::MAX) {
                    return Err(CoreError::InvalidInstruction {
                        opcode,
                        reason: format!("slot index {} is not a non-negative integer", operand),
                    });
                }
                Instruction::StExpr(operand as u32)
            }
            OP_PUSH => Instruction::Push(operand),
            OP_PUSH_X => Instruction::PushX,
            OP_PUSH_Y => Instruction::PushY,
            OP_CPY => Instruction::Cpy,
            OP_POP => Instruction::Pop,
            OP_STORE => Instruction::Store,
            OP_END => Instruction::End,
            op if op == BINARY_TAG => Instruction::Add,
            op if op == BINARY_TAG | 1 => Instruction::Mul,
            op if op == BINARY_TAG | 2 => Instruction::Div,
            op if op == BINARY_TAG | 3 => Instruction::Pow,
            op if op & UNARY_TAG != 0 => {
                let unary = UnaryOp::from_code(op & !UNARY_TAG).ok_or_else(|| {
                    CoreError::InvalidInstruction {
                        opcode,
                        reason: "unknown unary operation".to_string(),
                    }
                })?;
                Instruction::Unary(unary)
            }
            _ => {
                return Err(CoreError::InvalidInstruction {
                    opcode,
                    reason: "unknown opcode".to_string(),
                })
            }
        };
        Ok(instruction)
    }

    /// Returns true for the instructions only the encoder may emit.
    pub fn is_framing(self) -> bool {
        matches!(self, Instruction::StExpr(_) | Instruction::End)
    }
}

impl From<Instruction> for (u8, f64) {
    fn from(instruction: Instruction) -> Self {
        instruction.to_pair()
    }
}

impl TryFrom<(u8, f64)> for Instruction {
    type Error = CoreError;

    fn try_from((opcode, operand): (u8, f64)) -> Result<Self, Self::Error> {
        Instruction::from_pair(opcode, operand)
    }
}

/// The renderable output of compiling one equation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ArtifactWire")]
pub struct CompiledArtifact {
    /// Shader-source snippet the bytecode was lowered from.
    code: String,
    /// Body instructions, without slot framing.
    bytecode: Vec<Instruction>,
}

#[derive(Deserialize)]
struct ArtifactWire {
    #[serde(default)]
    code: String,
    bytecode: Vec<Instruction>,
}

impl TryFrom<ArtifactWire> for CompiledArtifact {
    type Error = CoreError;

    fn try_from(wire: ArtifactWire) -> Result<Self, Self::Error> {
        CompiledArtifact::new(wire.code, wire.bytecode)
    }
}

impl CompiledArtifact {
    /// Builds an artifact, rejecting empty bodies and framing instructions.
    pub fn new(code: impl Into<String>, bytecode: Vec<Instruction>) -> Result<Self, CoreError> {
        if bytecode.is_empty() {
            return Err(CoreError::MalformedArtifact {
                reason: "artifact has no instructions".to_string(),
            });
        }
        if let Some(framing) = bytecode.iter().find(|i| i.is_framing()) {
            return Err(CoreError::MalformedArtifact {
                reason: format!("artifact contains framing instruction {:?}", framing),
            });
        }
        Ok(CompiledArtifact {
            code: code.into(),
            bytecode,
        })
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn bytecode(&self) -> &[Instruction] {
        &self.bytecode
    }
}
