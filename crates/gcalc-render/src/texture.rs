//! Packing of the instruction stream into a two-channel float texture.
//!
//! Each texel holds one `(opcode, operand)` pair in its red and green
//! channels. Rows are `width` texels wide; the last row is padded with the
//! terminator so a shader walking past the program stops immediately.

use gcalc_core::Instruction;
use serde::{Deserialize, Serialize};

use crate::error::EncodeError;
use crate::program::RenderProgram;

/// Texture width used when none is configured.
pub const DEFAULT_TEXTURE_WIDTH: usize = 256;

/// Largest width or height accepted for the program texture.
pub const MAX_TEXTURE_DIMENSION: usize = 16384;

/// Encoder settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderConfig {
    pub texture_width: usize,
}

impl EncoderConfig {
    /// Checks the width against `1..=MAX_TEXTURE_DIMENSION`.
    pub fn validate(&self) -> Result<(), EncodeError> {
        if (1..=MAX_TEXTURE_DIMENSION).contains(&self.texture_width) {
            Ok(())
        } else {
            Err(EncodeError::InvalidTextureWidth {
                width: self.texture_width,
                max: MAX_TEXTURE_DIMENSION,
            })
        }
    }
}

impl Default for EncoderConfig {
    fn default() -> Self {
        EncoderConfig {
            texture_width: DEFAULT_TEXTURE_WIDTH,
        }
    }
}

/// An RG32F texture image of the instruction stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgramTexture {
    pub width: usize,
    pub height: usize,
    /// Row-major `[opcode, operand]` texels, `width * height` of them.
    pub texels: Vec<[f32; 2]>,
}

impl ProgramTexture {
    /// The texel data as a flat channel buffer for upload.
    pub fn as_channels(&self) -> Vec<f32> {
        self.texels.iter().flat_map(|t| *t).collect()
    }
}

/// Lays the program's instruction stream out as a texture.
///
/// An empty program still yields one row so the texture is never zero-sized.
pub fn pack(program: &RenderProgram, config: &EncoderConfig) -> Result<ProgramTexture, EncodeError> {
    config.validate()?;
    let width = config.texture_width;

    let len = program.instructions().len();
    let height = len.div_ceil(width).max(1);
    if height > MAX_TEXTURE_DIMENSION {
        return Err(EncodeError::ProgramTooLarge {
            len,
            height,
            max: MAX_TEXTURE_DIMENSION,
        });
    }

    let texel = |i: Instruction| {
        let (opcode, operand) = i.to_pair();
        [f32::from(opcode), operand as f32]
    };

    let mut texels: Vec<[f32; 2]> = program.instructions().iter().copied().map(texel).collect();
    texels.resize(width * height, texel(Instruction::End));

    Ok(ProgramTexture {
        width,
        height,
        texels,
    })
}
