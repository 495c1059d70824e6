//! Pixel-level segmentation helpers shared by the localizer and cell recovery.

use image::{imageops, GrayImage, Luma, RgbImage};
use imageproc::contours::{find_contours, BorderType, Contour};
use imageproc::contrast::otsu_level;

use crate::model::{BoundingBox, Color};

const FOREGROUND: u8 = 255;
const BACKGROUND: u8 = 0;

/// Binary mask of pixels exactly equal to `color`.
pub fn color_mask(image: &RgbImage, color: Color) -> GrayImage {
    let target = color.to_rgb();
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        if *image.get_pixel(x, y) == target {
            Luma([FOREGROUND])
        } else {
            Luma([BACKGROUND])
        }
    })
}

/// Whether any pixel inside `region` is exactly `color`.
///
/// The region is clamped to the image.
pub fn contains_color(image: &RgbImage, region: &BoundingBox, color: Color) -> bool {
    let target = color.to_rgb();
    let right = region.right().min(image.width());
    let bottom = region.bottom().min(image.height());
    (region.y..bottom).any(|y| (region.x..right).any(|x| *image.get_pixel(x, y) == target))
}

/// Inverted Otsu threshold: pixels at or below the automatic level become
/// foreground.
///
/// Returns the mask and the chosen level.
pub fn threshold_inverted(image: &GrayImage) -> (GrayImage, u8) {
    let level = otsu_level(image);
    let mask = GrayImage::from_fn(image.width(), image.height(), |x, y| {
        if image.get_pixel(x, y).0[0] > level {
            Luma([BACKGROUND])
        } else {
            Luma([FOREGROUND])
        }
    });
    (mask, level)
}

/// Bounding boxes of the outermost foreground contours of a mask.
///
/// Contours nested inside holes of other shapes are not reported.
pub fn external_boxes(mask: &GrayImage) -> Vec<BoundingBox> {
    let contours: Vec<Contour<u32>> = find_contours(mask);
    contours
        .iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .filter_map(|c| BoundingBox::from_points(c.points.iter().map(|p| (p.x, p.y))))
        .collect()
}

/// Copy the region `bbox` out of `image`, clamped to its bounds.
pub fn crop(image: &RgbImage, bbox: &BoundingBox) -> RgbImage {
    imageops::crop_imm(image, bbox.x, bbox.y, bbox.width, bbox.height).to_image()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn page_with_rect(color: Color, rect: BoundingBox) -> RgbImage {
        let mut img = RgbImage::from_pixel(80, 60, Rgb([255, 255, 255]));
        for y in rect.y..rect.bottom() {
            for x in rect.x..rect.right() {
                img.put_pixel(x, y, color.to_rgb());
            }
        }
        img
    }

    #[test]
    fn test_color_mask_exact_match() {
        let color = Color::new(10, 20, 30);
        let mut img = page_with_rect(color, BoundingBox::new(5, 5, 10, 10));
        // One channel off by one is not a match
        img.put_pixel(0, 0, Rgb([10, 20, 31]));

        let mask = color_mask(&img, color);
        assert_eq!(mask.get_pixel(5, 5).0[0], 255);
        assert_eq!(mask.get_pixel(0, 0).0[0], 0);
        assert_eq!(mask.pixels().filter(|p| p.0[0] == 255).count(), 100);
    }

    #[test]
    fn test_external_boxes_inclusive_extent() {
        let rect = BoundingBox::new(12, 7, 30, 20);
        let img = page_with_rect(Color::FUCHSIA, rect);
        let boxes = external_boxes(&color_mask(&img, Color::FUCHSIA));
        assert_eq!(boxes, vec![rect]);
    }

    #[test]
    fn test_external_boxes_skip_shapes_in_holes() {
        // Hollow square with a dot in the middle: only the outer square counts
        let mut mask = GrayImage::new(50, 50);
        for i in 10..40 {
            for j in [10, 11, 38, 39] {
                mask.put_pixel(i, j, Luma([255]));
                mask.put_pixel(j, i, Luma([255]));
            }
        }
        for y in 24..27 {
            for x in 24..27 {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
        let boxes = external_boxes(&mask);
        assert_eq!(boxes, vec![BoundingBox::new(10, 10, 30, 30)]);
    }

    #[test]
    fn test_contains_color() {
        let img = page_with_rect(Color::AQUA, BoundingBox::new(20, 20, 5, 5));
        assert!(contains_color(&img, &BoundingBox::new(15, 15, 20, 20), Color::AQUA));
        assert!(!contains_color(&img, &BoundingBox::new(0, 0, 20, 20), Color::AQUA));
        assert!(contains_color(&img, &BoundingBox::new(24, 24, 500, 500), Color::AQUA));
    }

    #[test]
    fn test_threshold_inverted_dark_is_foreground() {
        let mut img = GrayImage::from_pixel(20, 20, Luma([250]));
        for x in 0..20 {
            img.put_pixel(x, 10, Luma([5]));
        }
        let (mask, level) = threshold_inverted(&img);
        assert!(level >= 5 && level < 250);
        assert_eq!(mask.get_pixel(3, 10).0[0], 255);
        assert_eq!(mask.get_pixel(3, 3).0[0], 0);
    }

    #[test]
    fn test_crop_clamps() {
        let img = RgbImage::new(30, 30);
        let cropped = crop(&img, &BoundingBox::new(20, 25, 50, 50));
        assert_eq!(cropped.dimensions(), (10, 5));
    }
}
