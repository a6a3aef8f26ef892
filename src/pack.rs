// pack.rs
//
// Copyright (c) 2019-2023  Douglas Lau
//
//! Bit packing of variable-width codes into GIF data sub-blocks
use crate::lzw::CodeSink;
use std::io::{self, Write};

/// Maximum length of a data sub-block
const SUB_BLOCK_SZ: usize = 0xFF;

/// Packs codes LSB-first into bytes, and bytes into sub-blocks
pub(crate) struct BitPacker<'a, W: Write> {
    /// Writer for sub-blocks
    writer: &'a mut W,
    /// Pending bits (not yet a full byte)
    code: u32,
    /// Number of pending bits
    n_bits: u8,
    /// Current sub-block
    buf: Vec<u8>,
    /// Total payload bytes written
    n_bytes: usize,
}

impl<'a, W: Write> BitPacker<'a, W> {
    /// Create a new bit packer
    pub fn new(writer: &'a mut W) -> Self {
        BitPacker {
            writer,
            code: 0,
            n_bits: 0,
            buf: Vec::with_capacity(SUB_BLOCK_SZ),
            n_bytes: 0,
        }
    }

    /// Append one byte to the current sub-block
    fn push_byte(&mut self, byte: u8) -> io::Result<()> {
        self.buf.push(byte);
        if self.buf.len() == SUB_BLOCK_SZ {
            self.flush_sub_block()?;
        }
        Ok(())
    }

    /// Write the current sub-block, if not empty
    pub fn flush_sub_block(&mut self) -> io::Result<()> {
        let len = self.buf.len();
        if len > 0 {
            self.writer.write_all(&[len as u8])?; // block size
            self.writer.write_all(&self.buf)?;
            self.n_bytes += len;
            self.buf.clear();
        }
        Ok(())
    }

    /// Pad the partial byte, flush everything and terminate the block.
    ///
    /// Returns the number of payload bytes written.
    pub fn flush_final(mut self) -> io::Result<usize> {
        if self.n_bits > 0 {
            let byte = self.code as u8;
            self.code = 0;
            self.n_bits = 0;
            self.push_byte(byte)?;
        }
        self.flush_sub_block()?;
        self.writer.write_all(&[0])?; // block terminator
        Ok(self.n_bytes)
    }
}

impl<'a, W: Write> CodeSink for BitPacker<'a, W> {
    fn push_code(&mut self, code: u16, bits: u8) -> io::Result<()> {
        debug_assert!(bits > 0 && bits <= 12);
        let mask = (1 << bits) - 1;
        self.code |= (u32::from(code) & mask) << self.n_bits;
        self.n_bits += bits;
        while self.n_bits >= 8 {
            let byte = self.code as u8;
            self.code >>= 8;
            self.n_bits -= 8;
            self.push_byte(byte)?;
        }
        Ok(())
    }
}
