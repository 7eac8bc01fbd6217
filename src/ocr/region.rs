//! Candidate name regions of a card photo.

use image::GrayImage;
use serde::Serialize;

/// A rectangle given by its edges in relative coordinates (0.0 to 1.0).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RelativeRect {
    /// Left edge (0.0 = left of image)
    pub left: f64,
    /// Top edge (0.0 = top of image)
    pub top: f64,
    /// Right edge, exclusive
    pub right: f64,
    /// Bottom edge, exclusive
    pub bottom: f64,
}

/// Horizontal bands expected to hold the printed card name.
///
/// Name bands overlap on purpose: the title bar sits at slightly different
/// heights across frames and crops, so several bands are read and the most
/// confident one wins.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum CardRegion {
    Top25,
    Top20,
    Top30,
    /// 5%–25% from the top
    Band5To25,
    /// 35%–65% from the top; only read by the diagnostic report
    Middle,
}

impl CardRegion {
    /// Regions scanned when identifying a name, in evaluation order.
    pub const NAME_BANDS: [CardRegion; 4] = [
        CardRegion::Top25,
        CardRegion::Top20,
        CardRegion::Top30,
        CardRegion::Band5To25,
    ];

    /// Regions included in the diagnostic report.
    pub const DIAGNOSTIC: [CardRegion; 5] = [
        CardRegion::Top20,
        CardRegion::Top25,
        CardRegion::Top30,
        CardRegion::Band5To25,
        CardRegion::Middle,
    ];

    pub fn rect(self) -> RelativeRect {
        let (top, bottom) = match self {
            CardRegion::Top25 => (0.0, 0.25),
            CardRegion::Top20 => (0.0, 0.20),
            CardRegion::Top30 => (0.0, 0.30),
            CardRegion::Band5To25 => (0.05, 0.25),
            CardRegion::Middle => (0.35, 0.65),
        };
        RelativeRect {
            left: 0.0,
            top,
            right: 1.0,
            bottom,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CardRegion::Top25 => "Top 25%",
            CardRegion::Top20 => "Top 20%",
            CardRegion::Top30 => "Top 30%",
            CardRegion::Band5To25 => "5%-25% band",
            CardRegion::Middle => "Middle",
        }
    }
}

/// Crops a sub-region from an image using relative coordinates.
///
/// Each edge is truncated to a pixel index independently and clamped to
/// the image, so adjacent bands share their boundary rows exactly. A
/// region that rounds to zero pixels yields an empty image.
pub fn crop_region(img: &GrayImage, region: &RelativeRect) -> GrayImage {
    let (w, h) = img.dimensions();
    let edge = |fraction: f64, extent: u32| ((fraction * extent as f64) as u32).min(extent);

    let x0 = edge(region.left, w);
    let y0 = edge(region.top, h);
    let x1 = edge(region.right, w).max(x0);
    let y1 = edge(region.bottom, h).max(y0);

    image::imageops::crop_imm(img, x0, y0, x1 - x0, y1 - y0).to_image()
}
