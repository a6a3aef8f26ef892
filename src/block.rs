// block.rs
//
// Copyright (c) 2019-2023  Douglas Lau
//
//! GIF blocks written by the encoder
use pix::rgb::{Rgb, SRgb8};

/// Bytes per color table entry
const CHANNELS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorTableExistence {
    Absent,
    Present,
}

/// Color table configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorTableConfig {
    existence: ColorTableExistence,
    table_len: usize, // must be between 2...256
}

impl Default for ColorTableConfig {
    fn default() -> Self {
        let existence = ColorTableExistence::Absent;
        let table_len = 2;
        ColorTableConfig {
            existence,
            table_len,
        }
    }
}

impl ColorTableConfig {
    /// Create a color table configuration.
    ///
    /// The length is rounded up to a power of two between 2 and 256.
    pub fn new(existence: ColorTableExistence, table_len: u16) -> Self {
        let table_len =
            (table_len as usize).max(2).next_power_of_two().min(256);
        ColorTableConfig {
            existence,
            table_len,
        }
    }

    /// Create a present, unsorted table with depth bits per index
    pub fn with_depth(depth: u8) -> Self {
        Self::new(ColorTableExistence::Present, 1 << depth.min(8))
    }

    /// Get the number of entries
    pub fn len(&self) -> usize {
        match self.existence {
            ColorTableExistence::Absent => 0,
            ColorTableExistence::Present => self.table_len,
        }
    }

    /// Get the size field (number of bits per index, minus one)
    fn len_bits(&self) -> u8 {
        let sz = self.table_len;
        for b in 0..7 {
            if (sz >> (b + 1)) == 1 {
                return b;
            }
        }
        7
    }

    /// Get the size in bytes
    pub fn size_bytes(&self) -> usize {
        self.len() * CHANNELS
    }
}

/// Method to dispose a frame before drawing the next one
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DisposalMethod {
    /// No disposal specified
    NoAction,
    /// Leave the frame in place
    Keep,
    /// Restore the frame area to the background color
    Background,
    /// Restore the frame area to the previous contents
    Previous,
}

impl Default for DisposalMethod {
    fn default() -> Self {
        DisposalMethod::Keep
    }
}

impl DisposalMethod {
    /// Check whether pixels outside of a frame survive disposal
    pub fn keeps_canvas(self) -> bool {
        matches!(self, DisposalMethod::NoAction | DisposalMethod::Keep)
    }
}

impl From<DisposalMethod> for u8 {
    fn from(d: DisposalMethod) -> Self {
        use self::DisposalMethod::*;
        match d {
            NoAction => 0,
            Keep => 1,
            Background => 2,
            Previous => 3,
        }
    }
}

/// Block introducer codes
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum BlockCode {
    Extension_,
    ImageDesc_,
    Trailer_,
}

impl BlockCode {
    pub fn signature(self) -> &'static [u8] {
        use self::BlockCode::*;
        match self {
            ImageDesc_ => b",", // (0x2C) Image separator
            Extension_ => b"!", // (0x21) Extension introducer
            Trailer_ => b";",   // (0x3B) GIF trailer
        }
    }
}

/// Extension labels
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum ExtensionCode {
    GraphicControl_,
    Application_,
}

impl From<ExtensionCode> for u8 {
    fn from(t: ExtensionCode) -> Self {
        use self::ExtensionCode::*;
        match t {
            GraphicControl_ => 0xF9,
            Application_ => 0xFF,
        }
    }
}

/// Header block (signature and version)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    version: [u8; 3],
}

impl Header {
    pub fn with_version(version: [u8; 3]) -> Self {
        Header { version }
    }

    /// Pick the oldest version which supports the requested features
    pub fn for_features(transparent: bool, looping: bool) -> Self {
        if transparent || looping {
            Self::with_version(*b"89a")
        } else {
            Self::with_version(*b"87a")
        }
    }

    pub fn version(&self) -> [u8; 3] {
        self.version
    }
}

/// Logical screen descriptor block
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LogicalScreenDesc {
    screen_width: u16,
    screen_height: u16,
    flags: u8,
    background_color_idx: u8, // index into global color table
    pixel_aspect_ratio: u8,
}

impl LogicalScreenDesc {
    const COLOR_TABLE_PRESENT: u8 = 0b1000_0000;
    const COLOR_RESOLUTION: u8 = 0b0111_0000;
    const COLOR_TABLE_SIZE: u8 = 0b0000_0111;

    pub fn with_screen_width(mut self, screen_width: u16) -> Self {
        self.screen_width = screen_width;
        self
    }

    pub fn screen_width(&self) -> u16 {
        self.screen_width
    }

    pub fn with_screen_height(mut self, screen_height: u16) -> Self {
        self.screen_height = screen_height;
        self
    }

    pub fn screen_height(&self) -> u16 {
        self.screen_height
    }

    pub fn flags(&self) -> u8 {
        self.flags
    }

    /// Set the global color table flags.
    ///
    /// Color resolution is set to match the table size.
    pub fn with_color_table_config(mut self, tbl: &ColorTableConfig) -> Self {
        let mut flags = tbl.len_bits() & Self::COLOR_TABLE_SIZE;
        flags |= (flags << 4) & Self::COLOR_RESOLUTION;
        if tbl.existence == ColorTableExistence::Present {
            flags |= Self::COLOR_TABLE_PRESENT;
        }
        self.flags = flags;
        self
    }

    pub fn with_background_color_idx(mut self, idx: u8) -> Self {
        self.background_color_idx = idx;
        self
    }

    pub fn background_color_idx(&self) -> u8 {
        self.background_color_idx
    }

    pub fn pixel_aspect_ratio(&self) -> u8 {
        self.pixel_aspect_ratio
    }
}

/// Global color table block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalColorTable {
    colors: Vec<u8>,
}

impl GlobalColorTable {
    /// Create a color table from a palette.
    ///
    /// Missing entries are padded with black, up to the configured length.
    pub fn with_palette(palette: &[SRgb8], tbl: &ColorTableConfig) -> Self {
        let mut colors = Vec::with_capacity(tbl.size_bytes());
        for clr in palette.iter().take(tbl.len()) {
            colors.push(u8::from(Rgb::red(*clr)));
            colors.push(u8::from(Rgb::green(*clr)));
            colors.push(u8::from(Rgb::blue(*clr)));
        }
        colors.resize(tbl.size_bytes(), 0);
        GlobalColorTable { colors }
    }

    /// Get the number of entries
    pub fn len(&self) -> usize {
        self.colors.len() / CHANNELS
    }

    pub fn colors(&self) -> &[u8] {
        &self.colors
    }
}

/// Application extension block
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Application {
    app_data: Vec<Vec<u8>>, // sequence of sub-blocks
}

impl Application {
    /// Create a Netscape looping extension (zero means loop forever)
    pub fn with_loop_count(loop_count: u16) -> Self {
        let mut app_data = vec![];
        app_data.push(b"NETSCAPE2.0".to_vec());
        let c = loop_count.to_le_bytes();
        app_data.push(vec![1, c[0], c[1]]);
        Application { app_data }
    }

    pub fn app_data(&self) -> &[Vec<u8>] {
        &self.app_data
    }
}

/// Graphic control extension block
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GraphicControl {
    flags: u8,
    delay_time_cs: u16, // delay in centiseconds (hundredths of a second)
    transparent_color_idx: u8,
}

impl GraphicControl {
    const DISPOSAL_METHOD: u8 = 0b0001_1100;
    const TRANSPARENT_COLOR: u8 = 0b0000_0001;

    pub fn flags(&self) -> u8 {
        self.flags
    }

    pub fn set_disposal_method(&mut self, disposal_method: DisposalMethod) {
        let d: u8 = disposal_method.into();
        self.flags = (self.flags & !Self::DISPOSAL_METHOD) | (d << 2);
    }

    pub fn delay_time_cs(&self) -> u16 {
        self.delay_time_cs
    }

    pub fn set_delay_time_cs(&mut self, delay_time_cs: u16) {
        self.delay_time_cs = delay_time_cs;
    }

    pub fn transparent_color_idx(&self) -> u8 {
        self.transparent_color_idx
    }

    pub fn set_transparent_color(&mut self, transparent_color: Option<u8>) {
        match transparent_color {
            Some(t) => {
                self.flags |= Self::TRANSPARENT_COLOR;
                self.transparent_color_idx = t;
            }
            None => {
                self.flags &= !Self::TRANSPARENT_COLOR;
                self.transparent_color_idx = 0;
            }
        }
    }
}

/// Image descriptor block
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImageDesc {
    left: u16,
    top: u16,
    width: u16,
    height: u16,
    flags: u8,
}

impl ImageDesc {
    pub fn with_left(mut self, left: u16) -> Self {
        self.left = left;
        self
    }

    pub fn left(&self) -> u16 {
        self.left
    }

    pub fn with_top(mut self, top: u16) -> Self {
        self.top = top;
        self
    }

    pub fn top(&self) -> u16 {
        self.top
    }

    pub fn with_width(mut self, width: u16) -> Self {
        self.width = width;
        self
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn with_height(mut self, height: u16) -> Self {
        self.height = height;
        self
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    /// Get flags (no local color table, not interlaced)
    pub fn flags(&self) -> u8 {
        self.flags
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Trailer {}
