// diff.rs
//
// Copyright (c) 2023  Douglas Lau
//
//! Changed region between animation frames
use std::convert::TryFrom;
use std::ops::Range;

/// Rectangular region of the canvas
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Region {
    /// Left edge
    pub x: u16,
    /// Top edge
    pub y: u16,
    /// Width in pixels
    pub width: u16,
    /// Height in pixels
    pub height: u16,
}

impl Region {
    /// Create a new region
    pub fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Region {
            x,
            y,
            width,
            height,
        }
    }

    /// Get the number of pixels
    pub fn area(self) -> usize {
        usize::from(self.width) * usize::from(self.height)
    }

    /// Get the buffer ranges covered by each row of the region
    pub(crate) fn rows(
        self,
        stride: usize,
    ) -> impl Iterator<Item = Range<usize>> {
        let x = usize::from(self.x);
        let w = usize::from(self.width);
        let y = usize::from(self.y);
        (y..y + usize::from(self.height)).map(move |row| {
            let start = row * stride + x;
            start..start + w
        })
    }
}

/// Compute the region to encode for a frame.
///
/// * `current` Indexed pixels of the frame to encode
/// * `reference` Indexed pixels of the previous frame
/// * `width` Canvas width (row stride)
/// * `first` Whether no frame has been encoded yet
///
/// Unchanged frames produce a 1x1 region at the origin, since GIF frames
/// may not be empty.
///
/// Both buffers must hold the same whole number of rows, and no more than
/// 65535 of them, so that every region fits in a GIF image descriptor.
///
/// # Panics
///
/// Panics if the buffers have different lengths, are not a multiple of
/// `width`, or hold more than 65535 rows.
pub fn changed_region(
    current: &[u8],
    reference: &[u8],
    width: u16,
    first: bool,
) -> Region {
    assert_eq!(current.len(), reference.len());
    let stride = usize::from(width).max(1);
    assert_eq!(current.len() % stride, 0, "partial row");
    let height = u16::try_from(current.len() / stride)
        .unwrap_or_else(|_| panic!("more than {} rows", u16::MAX));
    if first {
        return Region::new(0, 0, width, height);
    }
    let mut bounds: Option<(usize, usize, usize, usize)> = None;
    let rows = current.chunks_exact(stride).zip(reference.chunks_exact(stride));
    for (y, (cur, prev)) in rows.enumerate() {
        let left = cur.iter().zip(prev).position(|(c, p)| c != p);
        if let Some(left) = left {
            // a differing pixel exists, so rposition will find one
            let right = cur
                .iter()
                .zip(prev)
                .rposition(|(c, p)| c != p)
                .unwrap_or(left);
            bounds = Some(match bounds {
                None => (left, y, right, y),
                Some((x0, y0, x1, _)) => (x0.min(left), y0, x1.max(right), y),
            });
        }
    }
    match bounds {
        Some((x0, y0, x1, y1)) => Region::new(
            x0 as u16,
            y0 as u16,
            (x1 - x0 + 1) as u16,
            (y1 - y0 + 1) as u16,
        ),
        None => Region::new(0, 0, 1, 1),
    }
}
