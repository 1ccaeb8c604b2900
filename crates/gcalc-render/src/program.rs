//! Program Encoder: packages compiled equations into one GPU program.
//!
//! [`encode`] is a pure function of a [`ProgramSnapshot`]. Every equation with
//! a compiled artifact becomes one slot: the stream gets `StExpr(slot)`
//! followed by the artifact body, and the slot table gets the equation's
//! normalized color with visibility packed into alpha. A single `End` closes a
//! non-empty stream. An empty snapshot encodes to an empty stream and an empty
//! slot table.

use std::sync::Arc;

use gcalc_core::{CompiledArtifact, EntityRegistry, Equation, EquationId, HslColor, Instruction};
use serde::Serialize;

use crate::error::EncodeError;

/// Largest slot count whose indices survive the trip through an `f32` texel.
pub const MAX_SLOTS: usize = 1 << 24;

/// One compiled equation as seen by the encoder.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgramEntry {
    pub id: EquationId,
    pub artifact: Arc<CompiledArtifact>,
    pub color: HslColor,
    pub visible: bool,
}

impl ProgramEntry {
    /// Returns `None` for equations without a compiled artifact.
    pub fn from_equation(equation: &Equation) -> Option<ProgramEntry> {
        equation.compiled().map(|artifact| ProgramEntry {
            id: equation.id(),
            artifact: Arc::clone(artifact),
            color: equation.color(),
            visible: equation.visible(),
        })
    }
}

/// The encoder's input: compiled equations in display order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgramSnapshot {
    entries: Vec<ProgramEntry>,
}

impl ProgramSnapshot {
    pub fn new(entries: Vec<ProgramEntry>) -> Self {
        ProgramSnapshot { entries }
    }

    /// Captures every compiled equation of the registry, in display order.
    pub fn from_registry(registry: &EntityRegistry) -> Self {
        ProgramSnapshot {
            entries: registry.iter().filter_map(ProgramEntry::from_equation).collect(),
        }
    }

    pub fn entries(&self) -> &[ProgramEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Content hash over everything that reaches the GPU.
    ///
    /// Two snapshots with equal fingerprints encode to identical programs.
    pub fn fingerprint(&self) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&(self.entries.len() as u64).to_le_bytes());
        for entry in &self.entries {
            hasher.update(&entry.id.0.to_le_bytes());
            hasher.update(&entry.color.hue.to_le_bytes());
            hasher.update(&[entry.color.saturation, entry.color.lightness, entry.visible as u8]);
            let body = entry.artifact.bytecode();
            hasher.update(&(body.len() as u64).to_le_bytes());
            for instruction in body {
                let (opcode, operand) = instruction.to_pair();
                hasher.update(&[opcode]);
                hasher.update(&operand.to_bits().to_le_bytes());
            }
            hasher.update(entry.artifact.code().as_bytes());
            hasher.update(&[0]);
        }
        *hasher.finalize().as_bytes()
    }
}

/// Per-slot metadata handed to the shading stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Slot {
    pub id: EquationId,
    /// Normalized RGB plus visibility as alpha (`1.0` or `0.0`).
    pub rgba: [f32; 4],
}

/// The encoded program: instruction stream plus the parallel slot table.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RenderProgram {
    instructions: Vec<Instruction>,
    slots: Vec<Slot>,
    /// Shader-source snippet per slot, for backends that splice source
    /// instead of interpreting bytecode.
    #[serde(skip)]
    sources: Vec<String>,
}

impl RenderProgram {
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Flattened `rgba` of every slot, ready for a `vec4` uniform array.
    pub fn color_array(&self) -> Vec<f32> {
        self.slots.iter().flat_map(|slot| slot.rgba).collect()
    }

    /// An `eval` shader function dispatching on the slot index.
    pub fn eval_source(&self) -> String {
        let mut branches = String::new();
        for (slot, source) in self.sources.iter().enumerate() {
            let body = if source.is_empty() { "return 0;" } else { source.as_str() };
            branches.push_str(&format!("if(opt == {}) {{\n    {}\n}}\n", slot, body));
        }
        format!(
            "int eval(ivec2 p, int opt) {{\nfloat x = float(p.x)*UNIT, y = float(p.y)*UNIT;\n{}return 0;\n}}",
            branches
        )
    }
}

/// Converts a host color and visibility flag into a slot's `rgba`.
pub fn slot_rgba(color: HslColor, visible: bool) -> [f32; 4] {
    let [r, g, b] = color.to_rgb8().normalized();
    [r, g, b, if visible { 1.0 } else { 0.0 }]
}

/// Encodes a snapshot into a render program.
pub fn encode(snapshot: &ProgramSnapshot) -> Result<RenderProgram, EncodeError> {
    let entries = snapshot.entries();
    if entries.len() > MAX_SLOTS {
        return Err(EncodeError::TooManySlots(entries.len()));
    }

    let body_len: usize = entries.iter().map(|e| e.artifact.bytecode().len() + 1).sum();
    let mut program = RenderProgram {
        instructions: Vec::with_capacity(body_len + 1),
        slots: Vec::with_capacity(entries.len()),
        sources: Vec::with_capacity(entries.len()),
    };

    for (slot, entry) in (0u32..).zip(entries) {
        program.instructions.push(Instruction::StExpr(slot));
        program
            .instructions
            .extend_from_slice(entry.artifact.bytecode());
        program.slots.push(Slot {
            id: entry.id,
            rgba: slot_rgba(entry.color, entry.visible),
        });
        program.sources.push(entry.artifact.code().to_string());
    }

    if !program.slots.is_empty() {
        program.instructions.push(Instruction::End);
    }
    Ok(program)
}
