// private.rs
//
// Copyright (c) 2019-2023  Douglas Lau
//
//! Private module for top-level items
use crate::block::*;
use crate::diff::changed_region;
use crate::encode::BlockEnc;
use crate::{Error, Result};
use pix::gray::Gray8;
use pix::rgb::SRgb8;
use pix::Raster;
use std::convert::TryFrom;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::ops::{Deref, DerefMut};
use std::path::Path;

/// GIF animation encoder
///
/// Holds the settings needed to open a [Session].  The settings can not be
/// changed once the session is open.
///
/// ## Example
/// ```
/// use animgif::Encoder;
/// use pix::rgb::SRgb8;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let palette = [SRgb8::new(0, 0, 0), SRgb8::new(255, 255, 255)];
/// let mut session = Encoder::new(Vec::new(), 2, 2)
///     .with_palette(&palette, 1)
///     .with_loop_count(Some(0))
///     .into_session()?;
/// session.frame_buf().copy_from_slice(&[0, 0, 0, 0]);
/// session.add_frame(50)?;
/// session.frame_buf().copy_from_slice(&[0, 0, 1, 1]);
/// session.add_frame(50)?;
/// let gif = session.close()?;
/// assert_eq!(&gif[..6], b"GIF89a");
/// assert_eq!(gif.last(), Some(&0x3B));
/// # Ok(())
/// # }
/// ```
///
/// [Session]: struct.Session.html
pub struct Encoder<W: Write> {
    /// Writer for output data
    writer: W,
    /// Canvas width
    width: u32,
    /// Canvas height
    height: u32,
    /// Color table depth (bits per index)
    depth: u8,
    /// Color table entries
    palette: Vec<SRgb8>,
    /// Transparent color index
    transparent_color: Option<u8>,
    /// Loop count (zero means loop forever)
    loop_count: Option<u16>,
    /// Disposal method for every frame
    disposal_method: DisposalMethod,
}

/// Session state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    /// Accepting frames
    Open,
    /// Output stream failed
    Poisoned,
    /// Trailer written
    Closed,
}

/// Open encoding session
///
/// Created by [Encoder::into_session].  Frames are drawn into the
/// [frame_buf] and then submitted with [add_frame].  Only the region which
/// changed since the previous frame is encoded.
///
/// [Encoder::into_session]: struct.Encoder.html#method.into_session
/// [add_frame]: struct.Session.html#method.add_frame
/// [frame_buf]: struct.Session.html#method.frame_buf
pub struct Session<W: Write> {
    /// Block encoder (taken on close)
    enc: Option<BlockEnc<W>>,
    /// Session state
    state: State,
    /// Color table depth
    depth: u8,
    /// Graphic control for every frame
    control: GraphicControl,
    /// Whether delta frames can be used
    delta: bool,
    /// Frame being drawn by the caller
    current: Raster<Gray8>,
    /// Frame most recently encoded
    reference: Raster<Gray8>,
    /// Number of frames encoded
    n_frames: usize,
}

/// Mutable view of a session's frame buffer
///
/// Dereferences to the canvas indices in row-major order.  The view borrows
/// the session, so it must be dropped before the frame is added.
pub struct FrameBuf<'a> {
    raster: &'a mut Raster<Gray8>,
}

impl Encoder<BufWriter<File>> {
    /// Create an encoder writing to a new file.
    pub fn create<P: AsRef<Path>>(
        path: P,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        let file = File::create(path).map_err(Error::StreamOpen)?;
        Ok(Self::new(BufWriter::new(file), width, height))
    }
}

impl<W: Write> Encoder<W> {
    /// Create a new GIF encoder.
    ///
    /// By default, the color table is 2 entries of black, with no
    /// transparency or looping.
    pub fn new(writer: W, width: u32, height: u32) -> Self {
        Encoder {
            writer,
            width,
            height,
            depth: 1,
            palette: vec![],
            transparent_color: None,
            loop_count: None,
            disposal_method: DisposalMethod::default(),
        }
    }

    /// Set the color table and its depth (bits per index, 1 to 8).
    ///
    /// A palette with fewer than 2^depth entries is padded with black.
    pub fn with_palette(mut self, palette: &[SRgb8], depth: u8) -> Self {
        self.palette = palette.to_vec();
        self.depth = depth;
        self
    }

    /// Set the transparent color index.
    pub fn with_transparent_color(mut self, clr: Option<u8>) -> Self {
        self.transparent_color = clr;
        self
    }

    /// Set the loop count (zero means loop forever).
    ///
    /// With `None`, no looping extension is written.
    pub fn with_loop_count(mut self, loop_count: Option<u16>) -> Self {
        self.loop_count = loop_count;
        self
    }

    /// Set the disposal method for every frame.
    ///
    /// Only `Keep` and `NoAction` leave the canvas outside of a frame intact;
    /// with other methods, every frame covers the full canvas.
    pub fn with_disposal_method(mut self, method: DisposalMethod) -> Self {
        self.disposal_method = method;
        self
    }

    /// Check settings
    fn validate(&self) -> Result<(u16, u16)> {
        let width = u16::try_from(self.width)
            .map_err(|_| Error::InvalidDimensions)?;
        let height = u16::try_from(self.height)
            .map_err(|_| Error::InvalidDimensions)?;
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimensions);
        }
        if self.depth < 1 || self.depth > 8 {
            return Err(Error::InvalidDepth(self.depth));
        }
        let len = 1 << self.depth;
        if self.palette.len() > len {
            return Err(Error::InvalidColorTable);
        }
        match self.transparent_color {
            Some(t) if usize::from(t) >= len => {
                Err(Error::InvalidTransparentColor(t))
            }
            _ => Ok((width, height)),
        }
    }

    /// Open a session, writing the header, screen descriptor, global color
    /// table and loop extension.
    pub fn into_session(self) -> Result<Session<W>> {
        let (width, height) = self.validate()?;
        let header = Header::for_features(
            self.transparent_color.is_some(),
            self.loop_count.is_some(),
        );
        let tbl = ColorTableConfig::with_depth(self.depth);
        let screen = LogicalScreenDesc::default()
            .with_screen_width(width)
            .with_screen_height(height)
            .with_color_table_config(&tbl)
            .with_background_color_idx(0);
        let table = GlobalColorTable::with_palette(&self.palette, &tbl);
        let loop_ext = self.loop_count.map(Application::with_loop_count);
        let mut enc = BlockEnc::new(self.writer, self.depth);
        enc.encode_preamble(&header, &screen, &table, loop_ext.as_ref())?;
        debug!(
            "open GIF{}: {}x{}, {} colors, loop: {:?}",
            String::from_utf8_lossy(&header.version()),
            width,
            height,
            table.len(),
            self.loop_count,
        );
        let mut control = GraphicControl::default();
        control.set_disposal_method(self.disposal_method);
        control.set_transparent_color(self.transparent_color);
        let (w, h) = (u32::from(width), u32::from(height));
        Ok(Session {
            enc: Some(enc),
            state: State::Open,
            depth: self.depth,
            control,
            delta: self.disposal_method.keeps_canvas(),
            current: Raster::with_clear(w, h),
            reference: Raster::with_clear(w, h),
            n_frames: 0,
        })
    }
}

impl<W: Write> Session<W> {
    /// Get the canvas width
    pub fn width(&self) -> u16 {
        self.current.width() as u16
    }

    /// Get the canvas height
    pub fn height(&self) -> u16 {
        self.current.height() as u16
    }

    /// Get the color table depth
    pub fn depth(&self) -> u8 {
        self.depth
    }

    /// Get the number of frames added
    pub fn frame_count(&self) -> usize {
        self.n_frames
    }

    /// Borrow the frame buffer, to draw the next frame.
    ///
    /// The buffer retains the contents of the previous frame.
    pub fn frame_buf(&mut self) -> FrameBuf<'_> {
        FrameBuf {
            raster: &mut self.current,
        }
    }

    /// Check that the session accepts more blocks
    fn check_open(&self) -> Result<()> {
        match self.state {
            State::Open => Ok(()),
            _ => Err(Error::SessionClosed),
        }
    }

    /// Check every index of the frame buffer
    fn check_indices(&self) -> Result<()> {
        if self.depth < 8 {
            let len = 1 << self.depth;
            let pixels = self.current.as_u8_slice();
            if let Some(i) = pixels.iter().find(|i| usize::from(**i) >= len) {
                return Err(Error::InvalidPixelIndex(*i));
            }
        }
        Ok(())
    }

    /// Encode the frame buffer as a new frame.
    ///
    /// * `delay_cs` Delay after the frame, in centiseconds (hundredths of a
    ///   second).  Values above 65535 are clamped.
    pub fn add_frame(&mut self, delay_cs: u32) -> Result<()> {
        self.check_open()?;
        self.check_indices()?;
        let delay = u16::try_from(delay_cs).unwrap_or_else(|_| {
            warn!("frame delay {} clamped to {}", delay_cs, u16::MAX);
            u16::MAX
        });
        let mut control = self.control;
        control.set_delay_time_cs(delay);
        let first = self.n_frames == 0 || !self.delta;
        let width = self.width();
        let pixels = self.current.as_u8_slice();
        let region =
            changed_region(pixels, self.reference.as_u8_slice(), width, first);
        let enc = self.enc.as_mut().ok_or(Error::SessionClosed)?;
        let n_bytes = match enc.encode_frame(
            &control,
            region,
            pixels,
            usize::from(width),
        ) {
            Ok(n) => n,
            Err(e) => {
                self.state = State::Poisoned;
                return Err(e.into());
            }
        };
        debug!(
            "frame {}: {:?}, {} bytes ({:.1}% of {} pixels)",
            self.n_frames,
            region,
            n_bytes,
            100.0 * n_bytes as f32 / region.area() as f32,
            region.area(),
        );
        self.reference
            .as_u8_slice_mut()
            .copy_from_slice(self.current.as_u8_slice());
        self.n_frames += 1;
        Ok(())
    }

    /// Write the trailer and release the writer.
    ///
    /// Calling this a second time returns `Error::DoubleClose`.
    pub fn close(&mut self) -> Result<W> {
        match self.state {
            State::Open => (),
            State::Poisoned => return Err(Error::SessionClosed),
            State::Closed => return Err(Error::DoubleClose),
        }
        let mut enc = self.enc.take().ok_or(Error::DoubleClose)?;
        if let Err(e) = enc.encode_trailer() {
            self.state = State::Poisoned;
            return Err(e.into());
        }
        self.state = State::Closed;
        debug!("closed after {} frames", self.n_frames);
        Ok(enc.into_inner())
    }
}

impl<'a> FrameBuf<'a> {
    /// Get the width
    pub fn width(&self) -> u32 {
        self.raster.width()
    }

    /// Get the height
    pub fn height(&self) -> u32 {
        self.raster.height()
    }

    /// Set one pixel's color index
    pub fn set_pixel(&mut self, x: u32, y: u32, idx: u8) {
        debug_assert!(x < self.width() && y < self.height());
        *self.raster.pixel_mut(x as i32, y as i32) = Gray8::new(idx);
    }

    /// Set every pixel to one color index
    pub fn fill(&mut self, idx: u8) {
        for p in self.raster.as_u8_slice_mut() {
            *p = idx;
        }
    }
}

impl<'a> Deref for FrameBuf<'a> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.raster.as_u8_slice()
    }
}

impl<'a> DerefMut for FrameBuf<'a> {
    fn deref_mut(&mut self) -> &mut [u8] {
        self.raster.as_u8_slice_mut()
    }
}
