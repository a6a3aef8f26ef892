// lib.rs      animgif crate.
//
// Copyright (c) 2019-2023  Douglas Lau
//
//! Incremental GIF animation encoder.
//!
//! Frames are drawn into an indexed frame buffer owned by a [Session], and
//! only the region changed since the previous frame is compressed.
//!
//! [Session]: struct.Session.html
#![forbid(unsafe_code)]

#[macro_use]
extern crate log;

pub mod block;
mod diff;
mod encode;
mod error;
mod lzw;
mod pack;
mod private;

pub use crate::diff::{changed_region, Region};
pub use crate::error::{Error, Result};
pub use crate::private::{Encoder, FrameBuf, Session};
