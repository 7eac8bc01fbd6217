use image::{GrayImage, ImageBuffer, Luma};
use imageproc::contrast::otsu_level;
use imageproc::filter::{gaussian_blur_f32, median_filter};
use serde::Serialize;

/// Gaussian sigma of the adaptive threshold neighborhood (roughly 11x11).
const ADAPTIVE_SIGMA: f32 = 2.0;
/// Offset subtracted from the local weighted mean.
const ADAPTIVE_OFFSET: i16 = 2;
/// Median filter radius used for denoising.
const DENOISE_RADIUS: u32 = 1;
/// Tile grid for local histogram equalization.
const EQUALIZE_TILES: u32 = 8;
/// Histogram clip limit, as a multiple of the mean bin height.
const EQUALIZE_CLIP_LIMIT: f32 = 2.0;

/// Binarization applied to a region before recognition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum PreprocessMethod {
    /// Global Otsu threshold
    Otsu,
    /// Gaussian-weighted local threshold
    Adaptive,
    /// Median denoise, then Otsu
    DenoiseOtsu,
    /// Tiled histogram equalization, then Otsu
    EqualizeOtsu,
}

impl PreprocessMethod {
    pub const ALL: [PreprocessMethod; 4] = [
        PreprocessMethod::Otsu,
        PreprocessMethod::Adaptive,
        PreprocessMethod::DenoiseOtsu,
        PreprocessMethod::EqualizeOtsu,
    ];

    pub fn apply(self, gray: &GrayImage) -> GrayImage {
        // Filters below assume at least one pixel
        if gray.width() == 0 || gray.height() == 0 {
            return gray.clone();
        }

        match self {
            PreprocessMethod::Otsu => threshold_otsu(gray),
            PreprocessMethod::Adaptive => threshold_adaptive(gray),
            PreprocessMethod::DenoiseOtsu => {
                threshold_otsu(&median_filter(gray, DENOISE_RADIUS, DENOISE_RADIUS))
            }
            PreprocessMethod::EqualizeOtsu => threshold_otsu(&equalize_local_contrast(
                gray,
                EQUALIZE_TILES,
                EQUALIZE_CLIP_LIMIT,
            )),
        }
    }
}

/// One binarized rendition of a region.
pub struct PreprocessedVariant {
    pub method: PreprocessMethod,
    pub image: GrayImage,
}

/// Produces the four binarized variants of a grayscale region, in fixed order.
pub fn preprocess_variants(gray: &GrayImage) -> Vec<PreprocessedVariant> {
    PreprocessMethod::ALL
        .iter()
        .map(|&method| PreprocessedVariant {
            method,
            image: method.apply(gray),
        })
        .collect()
}

/// Pixels strictly above `level` become white, the rest black.
pub fn binarize(img: &GrayImage, level: u8) -> GrayImage {
    let (width, height) = img.dimensions();
    ImageBuffer::from_fn(width, height, |x, y| {
        if img.get_pixel(x, y)[0] > level {
            Luma([255u8])
        } else {
            Luma([0u8])
        }
    })
}

fn threshold_otsu(img: &GrayImage) -> GrayImage {
    binarize(img, otsu_level(img))
}

/// A pixel is white when it is brighter than its gaussian-weighted
/// neighborhood mean minus [`ADAPTIVE_OFFSET`].
fn threshold_adaptive(img: &GrayImage) -> GrayImage {
    let local_mean = gaussian_blur_f32(img, ADAPTIVE_SIGMA);
    let (width, height) = img.dimensions();

    ImageBuffer::from_fn(width, height, |x, y| {
        let value = img.get_pixel(x, y)[0] as i16;
        let mean = local_mean.get_pixel(x, y)[0] as i16;
        if value > mean - ADAPTIVE_OFFSET {
            Luma([255u8])
        } else {
            Luma([0u8])
        }
    })
}

/// Contrast-limited histogram equalization over a `tiles` x `tiles` grid.
///
/// Each tile gets its own clipped-histogram lookup table; pixels are mapped
/// by bilinear interpolation between the four nearest tile tables, which
/// avoids visible seams at tile borders.
pub fn equalize_local_contrast(img: &GrayImage, tiles: u32, clip_limit: f32) -> GrayImage {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return img.clone();
    }

    let tiles_x = tiles.clamp(1, width);
    let tiles_y = tiles.clamp(1, height);

    let mut luts: Vec<[u8; 256]> = Vec::with_capacity((tiles_x * tiles_y) as usize);
    for ty in 0..tiles_y {
        let (y0, y1) = tile_bounds(ty, tiles_y, height);
        for tx in 0..tiles_x {
            let (x0, x1) = tile_bounds(tx, tiles_x, width);
            luts.push(tile_lut(img, x0, x1, y0, y1, clip_limit));
        }
    }

    let tile_w = width as f32 / tiles_x as f32;
    let tile_h = height as f32 / tiles_y as f32;

    ImageBuffer::from_fn(width, height, |x, y| {
        let (tx0, tx1, ax) = interpolation_axis(x, tile_w, tiles_x);
        let (ty0, ty1, ay) = interpolation_axis(y, tile_h, tiles_y);
        let value = img.get_pixel(x, y)[0] as usize;

        let lut = |tx: u32, ty: u32| luts[(ty * tiles_x + tx) as usize][value] as f32;
        let top = lut(tx0, ty0) * (1.0 - ax) + lut(tx1, ty0) * ax;
        let bottom = lut(tx0, ty1) * (1.0 - ax) + lut(tx1, ty1) * ax;
        let mapped = top * (1.0 - ay) + bottom * ay;

        Luma([mapped.round().clamp(0.0, 255.0) as u8])
    })
}

fn tile_bounds(index: u32, count: u32, extent: u32) -> (u32, u32) {
    (index * extent / count, (index + 1) * extent / count)
}

/// Returns the two neighboring tile indices along one axis and the weight
/// of the second one.
fn interpolation_axis(pos: u32, tile_size: f32, count: u32) -> (u32, u32, f32) {
    let grid = (pos as f32 + 0.5) / tile_size - 0.5;
    let first = (grid.floor().max(0.0) as u32).min(count - 1);
    let second = (first + 1).min(count - 1);
    let weight = (grid - first as f32).clamp(0.0, 1.0);
    (first, second, weight)
}

fn tile_lut(img: &GrayImage, x0: u32, x1: u32, y0: u32, y1: u32, clip_limit: f32) -> [u8; 256] {
    let mut hist = [0u32; 256];
    for y in y0..y1 {
        for x in x0..x1 {
            hist[img.get_pixel(x, y)[0] as usize] += 1;
        }
    }
    let total: u32 = hist.iter().sum();
    let mut lut = [0u8; 256];
    if total == 0 {
        for (v, slot) in lut.iter_mut().enumerate() {
            *slot = v as u8;
        }
        return lut;
    }

    // Clip and spread the excess evenly over all bins
    let limit = ((clip_limit * total as f32 / 256.0) as u32).max(1);
    let mut excess = 0u32;
    for bin in hist.iter_mut() {
        if *bin > limit {
            excess += *bin - limit;
            *bin = limit;
        }
    }
    let share = excess / 256;
    let remainder = (excess % 256) as usize;
    for (i, bin) in hist.iter_mut().enumerate() {
        *bin += share + u32::from(i < remainder);
    }

    let mut cdf = 0u32;
    for (v, count) in hist.iter().enumerate() {
        cdf += count;
        lut[v] = ((cdf as f32 * 255.0 / total as f32).round()).min(255.0) as u8;
    }
    lut
}
