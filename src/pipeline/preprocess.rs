//! Preprocessor: deterministic image cleanup before the model call.
//!
//! Scanned and photographed bills arrive with colour casts, sensor noise,
//! and uneven lighting. Three fixed passes run in order:
//!
//! 1. **Grayscale** — drop colour channels; the model reads glyph shapes.
//! 2. **Denoising** — a light Gaussian blur smooths sensor speckle.
//! 3. **Adaptive Thresholding** — binarise against a local mean so shadowed
//!    regions keep their text.
//!
//! ## Chosen policy: best effort
//!
//! The spec for this stage leaves the failure policy to the implementer.
//! We never fail the request here: if decoding or any pass errors, the
//! original bytes are forwarded untouched and the applied-steps list stays
//! empty, so the response's `preprocessing_applied` echo is always truthful.

use image::{DynamicImage, GrayImage, ImageFormat, Luma};
use std::io::Cursor;
use tracing::{debug, warn};

/// Step names echoed in the response, in application order.
pub const STEP_GRAYSCALE: &str = "Grayscale";
pub const STEP_DENOISING: &str = "Denoising";
pub const STEP_THRESHOLDING: &str = "Adaptive Thresholding";

/// Gaussian sigma for the denoise pass. Large enough to kill single-pixel
/// speckle, small enough to keep 8 pt glyph edges.
const DENOISE_SIGMA: f32 = 0.8;

/// Side length of the local-mean window for adaptive thresholding.
const THRESHOLD_WINDOW: u32 = 15;

/// Offset subtracted from the local mean; pixels brighter than
/// `mean - THRESHOLD_C` become white.
const THRESHOLD_C: i32 = 10;

/// Apply the cleanup passes to `bytes`, returning the transformed image and
/// the ordered list of steps that actually ran.
///
/// On any failure the original bytes come back with an empty step list.
pub fn preprocess(bytes: &[u8]) -> (Vec<u8>, Vec<String>) {
    match run_pipeline(bytes) {
        Ok((out, steps)) => {
            debug!(
                "Preprocessing applied {} steps, {} → {} bytes",
                steps.len(),
                bytes.len(),
                out.len()
            );
            (out, steps)
        }
        Err(e) => {
            warn!("Preprocessing failed, sending original bytes: {}", e);
            (bytes.to_vec(), Vec::new())
        }
    }
}

fn run_pipeline(bytes: &[u8]) -> Result<(Vec<u8>, Vec<String>), image::ImageError> {
    let img = image::load_from_memory(bytes)?;
    let mut steps = Vec::with_capacity(3);

    let gray: GrayImage = img.to_luma8();
    steps.push(STEP_GRAYSCALE.to_string());

    let denoised = image::imageops::blur(&gray, DENOISE_SIGMA);
    steps.push(STEP_DENOISING.to_string());

    let binarised = adaptive_threshold(&denoised, THRESHOLD_WINDOW, THRESHOLD_C);
    steps.push(STEP_THRESHOLDING.to_string());

    let mut buf = Vec::new();
    DynamicImage::ImageLuma8(binarised).write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;

    Ok((buf, steps))
}

/// Binarise `img` against the mean of a `window`×`window` neighbourhood.
///
/// Uses an integral image so the cost is O(pixels) regardless of window
/// size. A pixel is kept white when it is brighter than its local mean
/// minus `c`; the offset keeps faint paper texture from flipping to black.
fn adaptive_threshold(img: &GrayImage, window: u32, c: i32) -> GrayImage {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return img.clone();
    }

    let stride = (w + 1) as usize;
    let mut integral = vec![0u64; stride * (h + 1) as usize];
    for y in 0..h {
        let mut row_sum = 0u64;
        for x in 0..w {
            row_sum += u64::from(img.get_pixel(x, y)[0]);
            let idx = (y as usize + 1) * stride + (x as usize + 1);
            integral[idx] = integral[idx - stride] + row_sum;
        }
    }

    let r = window / 2;
    let mut out = GrayImage::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let x0 = x.saturating_sub(r) as usize;
            let y0 = y.saturating_sub(r) as usize;
            let x1 = (x + r + 1).min(w) as usize;
            let y1 = (y + r + 1).min(h) as usize;

            let count = ((x1 - x0) * (y1 - y0)) as u64;
            let sum = integral[y1 * stride + x1] + integral[y0 * stride + x0]
                - integral[y0 * stride + x1]
                - integral[y1 * stride + x0];
            let mean = (sum / count) as i32;

            let px = i32::from(img.get_pixel(x, y)[0]);
            let v = if px > mean - c { 255 } else { 0 };
            out.put_pixel(x, y, Luma([v]));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    fn tiny_png() -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            32,
            32,
            image::Rgba([200, 180, 160, 255]),
        ));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .expect("encode test png");
        buf
    }

    #[test]
    fn applies_all_three_steps_to_a_valid_image() {
        let (out, steps) = preprocess(&tiny_png());
        assert_eq!(
            steps,
            vec![
                STEP_GRAYSCALE.to_string(),
                STEP_DENOISING.to_string(),
                STEP_THRESHOLDING.to_string()
            ]
        );
        // Output must itself be a decodable image
        let decoded = image::load_from_memory(&out).expect("output decodes");
        assert_eq!(decoded.to_luma8().dimensions(), (32, 32));
    }

    #[test]
    fn garbage_bytes_fall_back_to_original() {
        let garbage = b"definitely not an image".to_vec();
        let (out, steps) = preprocess(&garbage);
        assert_eq!(out, garbage);
        assert!(steps.is_empty());
    }

    #[test]
    fn uniform_image_thresholds_to_white() {
        let img = GrayImage::from_pixel(20, 20, Luma([128]));
        let out = adaptive_threshold(&img, 15, 10);
        assert!(out.pixels().all(|p| p[0] == 255));
    }

    #[test]
    fn dark_text_on_light_background_stays_dark() {
        // Light field with a dark 3x3 blob in the middle.
        let mut img = GrayImage::from_pixel(21, 21, Luma([230]));
        for y in 9..12 {
            for x in 9..12 {
                img.put_pixel(x, y, Luma([20]));
            }
        }
        let out = adaptive_threshold(&img, 15, 10);
        assert_eq!(out.get_pixel(10, 10)[0], 0, "text pixel should be black");
        assert_eq!(out.get_pixel(0, 0)[0], 255, "background should be white");
    }
}
