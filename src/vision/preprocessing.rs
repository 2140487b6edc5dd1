// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image preprocessing for detection and OCR
//!
//! - Letterboxing and tensor conversion for the YOLO model
//! - Cropping detected regions out of the source image
//! - Otsu binarisation of crops before OCR
//! - Drawing detection boxes onto stream frames

use image::{DynamicImage, GenericImageView, GrayImage, Luma, Rgb, RgbImage};
use imageproc::contrast::otsu_level;
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use ndarray::Array4;

use super::detector::Detection;

/// Padding colour used when letterboxing
const PAD_GRAY: u8 = 114;

/// Box outline colour for annotated frames
const BOX_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

/// Box outline thickness in pixels
const BOX_THICKNESS: u32 = 2;

/// Scale and padding applied by `letterbox`, used to map boxes back
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LetterboxInfo {
    pub scale: f32,
    pub offset_x: u32,
    pub offset_y: u32,
}

impl LetterboxInfo {
    /// Map a point from letterboxed space back to source pixels
    pub fn to_source(&self, x: f32, y: f32) -> (f32, f32) {
        (
            (x - self.offset_x as f32) / self.scale,
            (y - self.offset_y as f32) / self.scale,
        )
    }
}

/// Resize preserving aspect ratio, then pad to `target_size` square.
///
/// The resized image is centred on a gray background.
pub fn letterbox(image: &DynamicImage, target_size: u32) -> (RgbImage, LetterboxInfo) {
    let (orig_w, orig_h) = image.dimensions();

    if orig_w == 0 || orig_h == 0 {
        let blank = RgbImage::from_pixel(target_size, target_size, Rgb([PAD_GRAY; 3]));
        let info = LetterboxInfo {
            scale: 1.0,
            offset_x: 0,
            offset_y: 0,
        };
        return (blank, info);
    }

    let scale = (target_size as f32 / orig_w as f32).min(target_size as f32 / orig_h as f32);

    let new_w = ((orig_w as f32 * scale).round() as u32).clamp(1, target_size);
    let new_h = ((orig_h as f32 * scale).round() as u32).clamp(1, target_size);

    let resized = image
        .resize_exact(new_w, new_h, image::imageops::FilterType::Triangle)
        .to_rgb8();

    let mut output = RgbImage::from_pixel(target_size, target_size, Rgb([PAD_GRAY; 3]));

    let offset_x = (target_size - new_w) / 2;
    let offset_y = (target_size - new_h) / 2;
    image::imageops::replace(&mut output, &resized, offset_x as i64, offset_y as i64);

    (
        output,
        LetterboxInfo {
            scale,
            offset_x,
            offset_y,
        },
    )
}

/// Convert an RGB image to an NCHW tensor with values in [0, 1]
pub fn to_nchw_tensor(rgb: &RgbImage) -> Array4<f32> {
    let (w, h) = rgb.dimensions();
    let mut tensor = Array4::zeros((1, 3, h as usize, w as usize));

    for (x, y, pixel) in rgb.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, y as usize, x as usize]] = pixel[c] as f32 / 255.0;
        }
    }

    tensor
}

/// Pixel rectangle of a detection clamped to the image, as (x, y, w, h).
///
/// Corner coordinates are truncated toward zero before clamping.
pub fn detection_rect(detection: &Detection, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
    let (left, top, right, bottom) = detection.corners();

    let clamp = |v: f32, max: u32| -> u32 { (v.trunc().max(0.0) as u32).min(max) };

    let x0 = clamp(left, width);
    let y0 = clamp(top, height);
    let x1 = clamp(right, width);
    let y1 = clamp(bottom, height);

    if x1 <= x0 || y1 <= y0 {
        return None;
    }

    Some((x0, y0, x1 - x0, y1 - y0))
}

/// Crop a detected region out of the source image
pub fn crop_detection(image: &DynamicImage, detection: &Detection) -> Option<DynamicImage> {
    let (x, y, w, h) = detection_rect(detection, image.width(), image.height())?;
    Some(image.crop_imm(x, y, w, h))
}

/// Grayscale then binarise with Otsu's threshold (pixels above it become white)
pub fn binarize(image: &DynamicImage) -> DynamicImage {
    let gray = image.to_luma8();
    let threshold = otsu_level(&gray);

    let binary = GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        if gray.get_pixel(x, y)[0] > threshold {
            Luma([255u8])
        } else {
            Luma([0u8])
        }
    });

    DynamicImage::ImageLuma8(binary)
}

/// Draw detection outlines onto a frame
pub fn draw_detections(frame: &mut RgbImage, detections: &[Detection]) {
    let (width, height) = frame.dimensions();

    for detection in detections {
        let Some((x, y, w, h)) = detection_rect(detection, width, height) else {
            continue;
        };

        // Nested rects, one per pixel of thickness
        for t in 0..BOX_THICKNESS.min((w + 1) / 2).min((h + 1) / 2) {
            let rect = Rect::at((x + t) as i32, (y + t) as i32).of_size(w - 2 * t, h - 2 * t);
            draw_hollow_rect_mut(frame, rect, BOX_COLOR);
        }
    }
}
