// encode.rs
//
// Copyright (c) 2019-2023  Douglas Lau
//
//! GIF stream writer
use crate::block::*;
use crate::diff::Region;
use crate::lzw::Compressor;
use crate::pack::BitPacker;
use std::convert::TryFrom;
use std::io::{self, Write};

/// Block encoder: writes blocks to the output stream, in order
pub(crate) struct BlockEnc<W: Write> {
    /// Writer for output data
    writer: W,
    /// Minimum code size for image data
    min_code_size: u8,
    /// LZW compressor, reused for every frame
    compressor: Compressor,
}

impl<W: Write> BlockEnc<W> {
    /// Create a new block encoder for a color table depth
    pub fn new(writer: W, depth: u8) -> Self {
        let min_code_size = depth.max(2);
        BlockEnc {
            writer,
            min_code_size,
            compressor: Compressor::new(min_code_size),
        }
    }

    /// Encode the blocks before the first frame
    pub fn encode_preamble(
        &mut self,
        header: &Header,
        screen: &LogicalScreenDesc,
        table: &GlobalColorTable,
        loop_ext: Option<&Application>,
    ) -> io::Result<()> {
        let w = &mut self.writer;
        header.format(w)?;
        screen.format(w)?;
        table.format(w)?;
        if let Some(app) = loop_ext {
            app.format(w)?;
        }
        Ok(())
    }

    /// Encode one frame: graphic control, image descriptor and image data.
    ///
    /// * `pixels` Indexed pixels of the whole canvas
    /// * `stride` Canvas width
    ///
    /// Returns the number of compressed payload bytes.
    pub fn encode_frame(
        &mut self,
        control: &GraphicControl,
        region: Region,
        pixels: &[u8],
        stride: usize,
    ) -> io::Result<usize> {
        let desc = ImageDesc::default()
            .with_left(region.x)
            .with_top(region.y)
            .with_width(region.width)
            .with_height(region.height);
        control.format(&mut self.writer)?;
        desc.format(&mut self.writer)?;
        let w = &mut self.writer;
        w.write_all(&[self.min_code_size])?;
        let mut packer = BitPacker::new(w);
        let bytes = region
            .rows(stride)
            .flat_map(|row| pixels[row].iter().copied());
        self.compressor.compress(bytes, &mut packer)?;
        packer.flush_final()
    }

    /// Encode the trailer and flush the writer
    pub fn encode_trailer(&mut self) -> io::Result<()> {
        Trailer::default().format(&mut self.writer)?;
        self.writer.flush()
    }

    /// Get the writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl Header {
    fn format<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(b"GIF")?;
        w.write_all(&self.version())
    }
}

impl LogicalScreenDesc {
    fn format<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let mut buf = Vec::with_capacity(7);
        buf.extend_from_slice(&self.screen_width().to_le_bytes());
        buf.extend_from_slice(&self.screen_height().to_le_bytes());
        buf.push(self.flags());
        buf.push(self.background_color_idx());
        buf.push(self.pixel_aspect_ratio());
        w.write_all(&buf)
    }
}

impl GlobalColorTable {
    fn format<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(self.colors())
    }
}

impl Application {
    fn format<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(BlockCode::Extension_.signature())?;
        w.write_all(&[ExtensionCode::Application_.into()])?;
        for c in self.app_data() {
            let len = u8::try_from(c.len())
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            w.write_all(&[len])?; // block size
            w.write_all(c)?;
        }
        w.write_all(&[0]) // block size
    }
}

impl GraphicControl {
    fn format<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(BlockCode::Extension_.signature())?;
        let mut buf = Vec::with_capacity(7);
        buf.push(ExtensionCode::GraphicControl_.into());
        buf.push(4); // block size
        buf.push(self.flags());
        buf.extend_from_slice(&self.delay_time_cs().to_le_bytes());
        buf.push(self.transparent_color_idx());
        buf.push(0); // block size
        w.write_all(&buf)
    }
}

impl ImageDesc {
    fn format<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(BlockCode::ImageDesc_.signature())?;
        let mut buf = Vec::with_capacity(9);
        buf.extend_from_slice(&self.left().to_le_bytes());
        buf.extend_from_slice(&self.top().to_le_bytes());
        buf.extend_from_slice(&self.width().to_le_bytes());
        buf.extend_from_slice(&self.height().to_le_bytes());
        buf.push(self.flags());
        w.write_all(&buf)
    }
}

impl Trailer {
    fn format<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(BlockCode::Trailer_.signature())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pix::rgb::SRgb8;

    #[test]
    fn preamble() {
        let tbl = ColorTableConfig::with_depth(1);
        let palette = [SRgb8::new(0, 0, 0), SRgb8::new(255, 255, 255)];
        let mut enc = BlockEnc::new(vec![], 1);
        enc.encode_preamble(
            &Header::for_features(false, true),
            &LogicalScreenDesc::default()
                .with_screen_width(2)
                .with_screen_height(0x102)
                .with_color_table_config(&tbl),
            &GlobalColorTable::with_palette(&palette, &tbl),
            Some(&Application::with_loop_count(0)),
        )
        .unwrap();
        #[rustfmt::skip]
        assert_eq!(enc.into_inner(), [
            b'G', b'I', b'F', b'8', b'9', b'a',
            0x02, 0x00, 0x02, 0x01, 0x80, 0x00, 0x00,
            0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF,
            0x21, 0xFF, 0x0B,
            b'N', b'E', b'T', b'S', b'C', b'A', b'P', b'E',
            b'2', b'.', b'0',
            0x03, 0x01, 0x00, 0x00, 0x00,
        ]);
    }

    #[test]
    fn frame() {
        let mut control = GraphicControl::default();
        control.set_disposal_method(DisposalMethod::Keep);
        control.set_delay_time_cs(0x0105);
        let mut enc = BlockEnc::new(vec![], 1);
        let pixels = [0, 0, 0, 0, 0, 0, 1, 1];
        let n = enc
            .encode_frame(&control, Region::new(0, 1, 4, 1), &pixels, 4)
            .unwrap();
        assert_eq!(n, 3);
        enc.encode_trailer().unwrap();
        #[rustfmt::skip]
        assert_eq!(enc.into_inner(), [
            0x21, 0xF9, 0x04, 0x04, 0x05, 0x01, 0x00, 0x00,
            0x2C, 0x00, 0x00, 0x01, 0x00, 0x04, 0x00, 0x01, 0x00, 0x00,
            0x02, 0x03, 0x04, 0x12, 0x05, 0x00,
            0x3B,
        ]);
    }
}
