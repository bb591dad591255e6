// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! RDP command table and per-worker dispatch
//!
//! Every command is identified by the 6-bit opcode in bits 24-29 of its
//! first word. The table records each command's length and how the
//! dispatcher schedules it:
//!
//! - `single`: run inline on the dispatcher's own pipeline
//! - `multi`: replay on every render worker
//! - `sync`: flush the pending batch to the workers first
//!
//! # Command groups
//!
//! - 0x08-0x0F: triangles ([`primitives`])
//! - 0x24-0x25, 0x36: rectangles ([`primitives`])
//! - 0x26-0x29: syncs
//! - 0x2A-0x2F, 0x37-0x3F: register writes ([`modes`])
//! - 0x30-0x35: tiles and TMEM loads ([`tiles`])

mod modes;
mod primitives;
mod tiles;

use super::Pipeline;

pub const CMD_NO_OP: u32 = 0x00;
pub const CMD_FILL_TRIANGLE: u32 = 0x08;
pub const CMD_TEXTURE_RECTANGLE: u32 = 0x24;
pub const CMD_TEXTURE_RECTANGLE_FLIP: u32 = 0x25;
pub const CMD_SYNC_LOAD: u32 = 0x26;
pub const CMD_SYNC_PIPE: u32 = 0x27;
pub const CMD_SYNC_TILE: u32 = 0x28;
pub const CMD_SYNC_FULL: u32 = 0x29;
pub const CMD_SET_KEY_GB: u32 = 0x2A;
pub const CMD_SET_KEY_R: u32 = 0x2B;
pub const CMD_SET_CONVERT: u32 = 0x2C;
pub const CMD_SET_SCISSOR: u32 = 0x2D;
pub const CMD_SET_PRIM_DEPTH: u32 = 0x2E;
pub const CMD_SET_OTHER_MODES: u32 = 0x2F;
pub const CMD_LOAD_TLUT: u32 = 0x30;
pub const CMD_SET_TILE_SIZE: u32 = 0x32;
pub const CMD_LOAD_BLOCK: u32 = 0x33;
pub const CMD_LOAD_TILE: u32 = 0x34;
pub const CMD_SET_TILE: u32 = 0x35;
pub const CMD_FILL_RECTANGLE: u32 = 0x36;
pub const CMD_SET_FILL_COLOR: u32 = 0x37;
pub const CMD_SET_FOG_COLOR: u32 = 0x38;
pub const CMD_SET_BLEND_COLOR: u32 = 0x39;
pub const CMD_SET_PRIM_COLOR: u32 = 0x3A;
pub const CMD_SET_ENV_COLOR: u32 = 0x3B;
pub const CMD_SET_COMBINE: u32 = 0x3C;
pub const CMD_SET_TEXTURE_IMAGE: u32 = 0x3D;
pub const CMD_SET_MASK_IMAGE: u32 = 0x3E;
pub const CMD_SET_COLOR_IMAGE: u32 = 0x3F;

/// Largest command, in 32-bit words
pub const CMD_MAX_WORDS: usize = 44;

/// Opcode of the command starting with `word0`
#[inline(always)]
pub fn command_id(word0: u32) -> u32 {
    (word0 >> 24) & 0x3f
}

/// Static description of one opcode
///
/// # Examples
///
/// ```
/// use rdpx::core::rdp::commands::{command_info, CMD_SYNC_FULL};
///
/// let info = command_info(CMD_SYNC_FULL);
/// assert_eq!(info.name, "Sync_Full");
/// assert_eq!(info.words(), 2);
/// assert!(info.sync);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandInfo {
    pub name: &'static str,
    /// Length in bytes
    pub length: usize,
    pub single: bool,
    pub multi: bool,
    pub sync: bool,
}

impl CommandInfo {
    const fn control(name: &'static str) -> Self {
        Self {
            name,
            length: 8,
            single: true,
            multi: false,
            sync: false,
        }
    }

    const fn render(name: &'static str, length: usize) -> Self {
        Self {
            name,
            length,
            single: false,
            multi: true,
            sync: false,
        }
    }

    const fn with_sync(self) -> Self {
        Self { sync: true, ..self }
    }

    const fn with_single(self) -> Self {
        Self { single: true, ..self }
    }

    /// Length in 32-bit words
    pub const fn words(&self) -> usize {
        self.length >> 2
    }

    /// Whether the opcode has no handler
    pub fn is_invalid(&self) -> bool {
        self.name == "???"
    }
}

/// All 64 opcodes
pub static COMMANDS: [CommandInfo; 64] = {
    let mut t = [CommandInfo::control("???"); 64];
    t[0x00] = CommandInfo::control("No_Op");
    t[0x08] = CommandInfo::render("Fill_Triangle", 32);
    t[0x09] = CommandInfo::render("Fill_ZBuffer_Triangle", 48);
    t[0x0A] = CommandInfo::render("Texture_Triangle", 96);
    t[0x0B] = CommandInfo::render("Texture_ZBuffer_Triangle", 112);
    t[0x0C] = CommandInfo::render("Shade_Triangle", 96);
    t[0x0D] = CommandInfo::render("Shade_ZBuffer_Triangle", 112);
    t[0x0E] = CommandInfo::render("Shade_Texture_Triangle", 160);
    t[0x0F] = CommandInfo::render("Shade_Texture_Z_Buffer_Triangle", 176);
    t[0x24] = CommandInfo::render("Texture_Rectangle", 16);
    t[0x25] = CommandInfo::render("Texture_Rectangle_Flip", 16);
    t[0x26] = CommandInfo::control("Sync_Load");
    t[0x27] = CommandInfo::control("Sync_Pipe");
    t[0x28] = CommandInfo::control("Sync_Tile");
    t[0x29] = CommandInfo::control("Sync_Full").with_sync();
    t[0x2A] = CommandInfo::render("Set_Key_GB", 8);
    t[0x2B] = CommandInfo::render("Set_Key_R", 8);
    t[0x2C] = CommandInfo::render("Set_Convert", 8);
    t[0x2D] = CommandInfo::render("Set_Scissor", 8);
    t[0x2E] = CommandInfo::render("Set_Prim_Depth", 8);
    t[0x2F] = CommandInfo::render("Set_Other_Modes", 8);
    t[0x30] = CommandInfo::render("Load_TLUT", 8);
    t[0x32] = CommandInfo::render("Set_Tile_Size", 8);
    t[0x33] = CommandInfo::render("Load_Block", 8);
    t[0x34] = CommandInfo::render("Load_Tile", 8);
    t[0x35] = CommandInfo::render("Set_Tile", 8);
    t[0x36] = CommandInfo::render("Fill_Rectangle", 8);
    t[0x37] = CommandInfo::render("Set_Fill_Color", 8);
    t[0x38] = CommandInfo::render("Set_Fog_Color", 8);
    t[0x39] = CommandInfo::render("Set_Blend_Color", 8);
    t[0x3A] = CommandInfo::render("Set_Prim_Color", 8);
    t[0x3B] = CommandInfo::render("Set_Env_Color", 8);
    t[0x3C] = CommandInfo::render("Set_Combine", 8);
    t[0x3D] = CommandInfo::render("Set_Texture_Image", 8);
    t[0x3E] = CommandInfo::render("Set_Mask_Image", 8).with_single().with_sync();
    t[0x3F] = CommandInfo::render("Set_Color_Image", 8).with_sync();
    t
};

/// Table entry for opcode `id`
pub fn command_info(id: u32) -> &'static CommandInfo {
    &COMMANDS[(id & 0x3f) as usize]
}

/// Triangles and rectangles: the commands that write pixels
fn is_primitive(id: u32) -> bool {
    matches!(
        id,
        0x08..=0x0F | CMD_TEXTURE_RECTANGLE | CMD_TEXTURE_RECTANGLE_FLIP | CMD_FILL_RECTANGLE
    )
}

impl Pipeline {
    /// Execute one complete command on this pipeline
    ///
    /// `cmd` must hold at least the table length of the command. Sync
    /// commands are no-ops here; the dispatcher handles them. Primitives
    /// draw nothing while the crash latch is set.
    pub fn execute(&mut self, cmd: &[u32]) {
        let Some(&w0) = cmd.first() else {
            return;
        };
        let id = command_id(w0);
        let w1 = cmd.get(1).copied().unwrap_or(0);

        if is_primitive(id) {
            if self.crash.is_crashed() {
                return;
            }
            self.primitives = self.primitives.wrapping_add(1);
        }

        match id {
            0x08..=0x0F => self.triangle(id, cmd),
            CMD_TEXTURE_RECTANGLE => self.texture_rectangle(cmd, false),
            CMD_TEXTURE_RECTANGLE_FLIP => self.texture_rectangle(cmd, true),
            CMD_FILL_RECTANGLE => self.fill_rectangle(w0, w1),

            CMD_NO_OP | CMD_SYNC_LOAD | CMD_SYNC_PIPE | CMD_SYNC_TILE | CMD_SYNC_FULL => {}

            CMD_SET_KEY_GB => self.set_key_gb(w0, w1),
            CMD_SET_KEY_R => self.set_key_r(w1),
            CMD_SET_CONVERT => self.set_convert(w0, w1),
            CMD_SET_SCISSOR => self.set_scissor(w0, w1),
            CMD_SET_PRIM_DEPTH => self.set_prim_depth(w1),
            CMD_SET_OTHER_MODES => self.set_other_modes(w0, w1),
            CMD_SET_FILL_COLOR => self.fill_color = w1,
            CMD_SET_FOG_COLOR => self.fog_color = super::types::Color::from_rgba32(w1),
            CMD_SET_BLEND_COLOR => self.blend_color = super::types::Color::from_rgba32(w1),
            CMD_SET_PRIM_COLOR => self.set_prim_color(w0, w1),
            CMD_SET_ENV_COLOR => self.env_color = super::types::Color::from_rgba32(w1),
            CMD_SET_COMBINE => self.set_combine(w0, w1),
            CMD_SET_TEXTURE_IMAGE => self.set_texture_image(w0, w1),
            CMD_SET_MASK_IMAGE => self.zb_address = w1 & 0x00ff_ffff,
            CMD_SET_COLOR_IMAGE => self.set_color_image(w0, w1),

            CMD_SET_TILE => self.set_tile(w0, w1),
            CMD_SET_TILE_SIZE => self.set_tile_size(w0, w1),
            CMD_LOAD_BLOCK => self.load_block(w0, w1),
            CMD_LOAD_TILE | CMD_LOAD_TLUT => self.load_tile_or_tlut(id, w0, w1),

            _ => log::trace!("Ignoring invalid RDP command 0x{:02X}", id),
        }
    }
}

#[cfg(test)]
mod tests;
