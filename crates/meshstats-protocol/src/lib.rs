//! MeshCore Companion UART Protocol
//!
//! Types and codecs for talking to a MeshCore companion radio over its
//! framed UART protocol. Messages are length-prefixed frames whose payload
//! starts with an opcode byte:
//!
//! - **Commands** (host → device): `CMD_*` opcodes
//! - **Responses** (device → host): `RESP_CODE_*` opcodes, correlated 1:1
//!   with the command that triggered them
//! - **Push notifications** (device → host): `PUSH_CODE_*` opcodes (0x80+),
//!   sent unprompted or as delayed results of `send-*` commands
//!
//! This crate is the only place that knows wire offsets; it performs no I/O
//! beyond the generic frame reader in [`frame`].
//!
//! # Example
//!
//! ```rust,ignore
//! use meshstats_protocol::{Command, Message, frame};
//!
//! let cmd = Command::GetStats { stats_type: meshstats_protocol::STATS_TYPE_CORE };
//! frame::write_frame(&mut port, &cmd.encode())?;
//! let reply = Message::decode(&frame::read_frame(&mut port)?)?;
//! ```

mod commands;
mod constants;
mod error;
pub mod frame;
mod responses;
mod types;

pub use commands::*;
pub use constants::*;
pub use error::*;
pub use responses::*;
pub use types::*;
