//! Frame response type.

use gcalc_core::Instruction;
use gcalc_render::{Frame, Slot, Viewport};
use serde::Serialize;

/// The latest frame the render loop presented.
#[derive(Debug, Clone, Serialize)]
pub struct FrameResponse {
    pub number: u64,
    pub rebuilt: bool,
    pub viewport: Viewport,
    pub slots: Vec<Slot>,
    /// `(opcode, operand)` pairs, `End`-terminated when non-empty.
    pub instructions: Vec<Instruction>,
    pub texture: TextureInfo,
    /// The `eval` shader function for source-splicing backends.
    pub eval_source: String,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct TextureInfo {
    pub width: usize,
    pub height: usize,
}

impl From<&Frame> for FrameResponse {
    fn from(frame: &Frame) -> Self {
        FrameResponse {
            number: frame.number,
            rebuilt: frame.rebuilt,
            viewport: frame.viewport,
            slots: frame.program.slots().to_vec(),
            instructions: frame.program.instructions().to_vec(),
            texture: TextureInfo {
                width: frame.texture.width,
                height: frame.texture.height,
            },
            eval_source: frame.program.eval_source(),
        }
    }
}
