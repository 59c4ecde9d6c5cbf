//! Resize and crop arithmetic for FIT and FILL.
//!
//! All ratios are compared with integer cross-multiplication so the limiting
//! axis always lands exactly on the target dimension. FILL crops the source
//! to the target aspect before resizing, so no intermediate image is ever
//! larger than the source or the target.

use autothumb_core::types::thumbnail::{ResizeMode, ThumbnailSize};

/// Region of the source kept before resizing, in source coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropBox {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width kept.
    pub width: u32,
    /// Height kept.
    pub height: u32,
}

/// What to do to a source image of known size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizePlan {
    /// Optional center crop applied to the source first.
    pub crop: Option<CropBox>,
    /// Dimensions the (cropped) source is resized to.
    pub resize_to: (u32, u32),
}

impl ResizePlan {
    /// Dimensions of the final image.
    pub fn output(&self) -> (u32, u32) {
        self.resize_to
    }
}

/// Plan the resize of a `source` sized image for `target` and `mode`.
pub fn plan(source: (u32, u32), target: ThumbnailSize, mode: ResizeMode) -> ResizePlan {
    match mode {
        ResizeMode::Fit => ResizePlan {
            crop: None,
            resize_to: fit_dimensions(source, target),
        },
        ResizeMode::Fill => {
            let crop = fill_crop(source, target);
            let whole = crop.x == 0 && crop.y == 0 && (crop.width, crop.height) == source;
            ResizePlan {
                crop: (!whole).then_some(crop),
                resize_to: (target.width, target.height),
            }
        }
    }
}

/// FIT: `scale = min(tw/sw, th/sh)`, capped at 1 so sources already inside
/// the box keep their size. The non-limiting axis is floored, never below 1.
pub fn fit_dimensions(source: (u32, u32), target: ThumbnailSize) -> (u32, u32) {
    let (sw, sh) = (source.0.max(1) as u64, source.1.max(1) as u64);
    let (tw, th) = (target.width as u64, target.height as u64);

    if sw <= tw && sh <= th {
        return (sw as u32, sh as u32);
    }

    // tw/sw <= th/sh  <=>  tw*sh <= th*sw
    if tw * sh <= th * sw {
        let h = (sh * tw / sw).max(1);
        (tw as u32, h as u32)
    } else {
        let w = (sw * th / sh).max(1);
        (w as u32, th as u32)
    }
}

/// FILL: the largest centered region of the source with the target's
/// aspect ratio. Resizing it to `target` equals scaling by
/// `max(tw/sw, th/sh)` and center-cropping.
pub fn fill_crop(source: (u32, u32), target: ThumbnailSize) -> CropBox {
    let (sw, sh) = (source.0.max(1) as u64, source.1.max(1) as u64);
    let (tw, th) = (target.width as u64, target.height as u64);

    let (width, height) = if tw * sh >= th * sw {
        // Source is relatively taller: keep the full width.
        (sw, round_div(sw * th, tw).clamp(1, sh))
    } else {
        (round_div(sh * tw, th).clamp(1, sw), sh)
    };

    CropBox {
        x: ((sw - width) / 2) as u32,
        y: ((sh - height) / 2) as u32,
        width: width as u32,
        height: height as u32,
    }
}

fn round_div(num: u64, den: u64) -> u64 {
    (num * 2 + den) / (den * 2)
}
