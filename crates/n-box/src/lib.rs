// SPDX-License-Identifier: MIT
//
// n-box: minimal terminal control for full-screen text programs.
//
// A small termbox-style layer over a raw terminal. The application paints
// a grid of cells (a character plus 16-color foreground and background
// attributes) into a back buffer; `flush` compares it against what the
// terminal already shows and writes only the difference, in one write,
// with cursor moves and attribute changes elided wherever the previous
// cell already left the terminal in the right state.
//
// Input is read on a background thread and decoded on the caller's thread:
// escape sequences from the capability key table, UTF-8 characters,
// control keys, and the ESC prefix as either a key of its own or an Alt
// modifier. Terminal resizes arrive as events in the same stream.
//
// Nothing is process-global. A `Session` owns the device, the saved
// attributes, the buffers, and both background units; closing or dropping
// it puts the terminal back the way it was found.

pub mod ansi;
pub mod buffer;
pub mod caps;
pub mod cell;
pub mod color;
pub mod config;
pub mod diff;
pub mod error;
pub mod event_loop;
pub mod input;
pub mod output;
pub mod reader;
pub mod session;
pub mod terminal;
#[cfg(unix)]
pub mod tty;

#[cfg(test)]
mod mock;

pub use caps::{Capabilities, Func};
pub use cell::{Attribute, Cell, Style};
pub use color::Color;
pub use config::{Config, InputMode};
pub use error::{Error, Result};
pub use input::{Event, InputError, KeyCode, KeyEvent, Modifiers};
pub use session::Session;
pub use terminal::Size;
