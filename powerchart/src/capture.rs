//! Screen capture and region cropping.

use crate::coordinates::ScreenSection;
use crate::{AutomationError, ScreenshotResult};
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageBuffer, ImageEncoder, Rgba, RgbaImage};
use std::io::Cursor;
use tracing::debug;

/// Capture the primary monitor with `xcap`.
pub fn capture_primary_monitor() -> Result<ScreenshotResult, AutomationError> {
    let monitors = xcap::Monitor::all()
        .map_err(|e| AutomationError::PlatformError(format!("Failed to get monitors: {e}")))?;
    let mut primary_monitor: Option<xcap::Monitor> = None;
    for monitor in monitors {
        match monitor.is_primary() {
            Ok(true) => {
                primary_monitor = Some(monitor);
                break;
            }
            Ok(false) => continue,
            Err(e) => {
                return Err(AutomationError::PlatformError(format!(
                    "Error checking monitor primary status: {e}"
                )));
            }
        }
    }
    let primary_monitor = primary_monitor.ok_or_else(|| {
        AutomationError::PlatformError("Could not find primary monitor".to_string())
    })?;

    let scale_factor = primary_monitor.scale_factor().map_err(|e| {
        AutomationError::PlatformError(format!("Failed to get monitor scale factor: {e}"))
    })?;
    let image = primary_monitor
        .capture_image()
        .map_err(|e| AutomationError::PlatformError(format!("Failed to capture screen: {e}")))?;

    Ok(ScreenshotResult {
        width: image.width(),
        height: image.height(),
        image_data: image.into_raw(),
        scale_factor,
    })
}

/// Crop a screenshot to a region given in screen points.
///
/// Points are scaled by the screenshot's scale factor and clamped to the
/// image. A region that falls entirely outside the image is an error.
pub fn capture_region(
    screenshot: &ScreenshotResult,
    section: &ScreenSection,
) -> Result<RgbaImage, AutomationError> {
    // Borrow the pixels; only the cropped region is copied.
    let image = ImageBuffer::<Rgba<u8>, &[u8]>::from_raw(
        screenshot.width,
        screenshot.height,
        screenshot.image_data.as_slice(),
    )
    .ok_or_else(|| {
        AutomationError::PlatformError(format!(
            "Screenshot buffer does not match {}x{}",
            screenshot.width, screenshot.height
        ))
    })?;

    let scale = if screenshot.scale_factor > 0.0 {
        screenshot.scale_factor
    } else {
        1.0
    };
    let to_pixels = |v: i32, max: u32| ((v as f32 * scale).round().max(0.0) as u32).min(max);

    let left = to_pixels(section.left_x, image.width());
    let top = to_pixels(section.upper_y, image.height());
    let right = to_pixels(section.right_x, image.width());
    let bottom = to_pixels(section.lower_y, image.height());

    if right <= left || bottom <= top {
        return Err(AutomationError::InvalidArgument(format!(
            "Region '{}' lies outside the {}x{} screenshot",
            section.name,
            image.width(),
            image.height()
        )));
    }

    debug!(
        region = %section.name,
        left, top, right, bottom, scale, "Cropping screenshot"
    );
    Ok(image::imageops::crop_imm(&image, left, top, right - left, bottom - top).to_image())
}

/// Encode an RGBA image as PNG.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, AutomationError> {
    let mut png_data = Vec::new();
    PngEncoder::new(Cursor::new(&mut png_data))
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(|e| AutomationError::PlatformError(format!("Failed to encode PNG: {e}")))?;
    Ok(png_data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn screenshot(width: u32, height: u32, scale_factor: f32) -> ScreenshotResult {
        let image = RgbaImage::from_fn(width, height, |x, y| Rgba([x as u8, y as u8, 0, 255]));
        ScreenshotResult {
            width,
            height,
            image_data: image.into_raw(),
            scale_factor,
        }
    }

    fn region(left_x: i32, upper_y: i32, right_x: i32, lower_y: i32) -> ScreenSection {
        ScreenSection {
            left_x,
            upper_y,
            right_x,
            lower_y,
            name: "test".to_string(),
        }
    }

    #[test]
    fn crop_uses_screen_points_times_scale() {
        let shot = screenshot(100, 80, 2.0);
        let cropped = capture_region(&shot, &region(5, 10, 15, 20)).unwrap();
        assert_eq!(cropped.dimensions(), (20, 20));
        assert_eq!(cropped.get_pixel(0, 0), &Rgba([10, 20, 0, 255]));
    }

    #[test]
    fn crop_is_clamped_to_the_image() {
        let shot = screenshot(50, 40, 1.0);
        let cropped = capture_region(&shot, &region(40, 30, 500, 500)).unwrap();
        assert_eq!(cropped.dimensions(), (10, 10));
    }

    #[test]
    fn region_outside_the_image_is_rejected() {
        let shot = screenshot(50, 40, 1.0);
        let err = capture_region(&shot, &region(60, 50, 70, 60)).unwrap_err();
        assert!(matches!(err, AutomationError::InvalidArgument(_)));
    }

    #[test]
    fn crop_borrows_the_screenshot() {
        let shot = screenshot(30, 20, 1.0);
        let before = shot.image_data.clone();
        let first = capture_region(&shot, &region(0, 0, 10, 10)).unwrap();
        let second = capture_region(&shot, &region(10, 10, 30, 20)).unwrap();

        assert_eq!(shot.image_data, before);
        assert_eq!(first.dimensions(), (10, 10));
        assert_eq!(second.get_pixel(0, 0), &Rgba([10, 10, 0, 255]));
    }

    #[test]
    fn short_pixel_buffer_is_rejected() {
        let mut shot = screenshot(10, 10, 1.0);
        shot.image_data.truncate(40);
        let err = capture_region(&shot, &region(0, 0, 5, 5)).unwrap_err();
        assert!(matches!(err, AutomationError::PlatformError(_)));
    }

    #[test]
    fn png_output_has_signature() {
        let shot = screenshot(8, 8, 1.0);
        let cropped = capture_region(&shot, &region(0, 0, 4, 4)).unwrap();
        let png = encode_png(&cropped).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (4, 4));
    }
}
