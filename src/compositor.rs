//! Side-by-side frame compositing.
//!
//! The composite buffer is one monochrome image partitioned into fixed,
//! non-overlapping slots, one per camera, assigned left to right. The layout
//! is computed once at startup and never changes; correctness of the copies
//! rests on the slots being disjoint, not on any locking.

use image::imageops;
use image::GrayImage;

use crate::camera::Resolution;

/// Downscaled frame geometry for a given scale factor.
///
/// Dimensions are rounded to the nearest pixel and floored at 1 so a tiny
/// scale factor can never produce an empty image.
pub fn scaled_dims(resolution: Resolution, scale: f64) -> (u32, u32) {
    let w = (resolution.width as f64 * scale).round().max(1.0) as u32;
    let h = (resolution.height as f64 * scale).round().max(1.0) as u32;
    (w, h)
}

/// A fixed rectangular region of the composite buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Ordered slot rectangles for an arbitrary camera count.
#[derive(Debug, Clone)]
pub struct SlotLayout {
    slots: Vec<SlotRect>,
    slot_width: u32,
    slot_height: u32,
}

impl SlotLayout {
    /// Lay out `count` slots of `slot_width` x `slot_height` left to right.
    pub fn horizontal(count: usize, slot_width: u32, slot_height: u32) -> Self {
        let slots = (0..count)
            .map(|i| SlotRect {
                x: i as u32 * slot_width,
                y: 0,
                width: slot_width,
                height: slot_height,
            })
            .collect();
        Self {
            slots,
            slot_width,
            slot_height,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<SlotRect> {
        self.slots.get(index).copied()
    }

    /// Total width of the composite holding all slots.
    pub fn composite_width(&self) -> u32 {
        self.slot_width * self.slots.len() as u32
    }

    /// Height of the composite (all slots sit on one row).
    pub fn composite_height(&self) -> u32 {
        self.slot_height
    }
}

/// Owns the composite buffer and copies resized frames into their slots.
pub struct Compositor {
    layout: SlotLayout,
    composite: GrayImage,
}

impl Compositor {
    /// Allocate the composite buffer for the given layout. Done once at
    /// startup; the buffer is overwritten in place every iteration.
    pub fn new(layout: SlotLayout) -> Self {
        let composite = GrayImage::new(layout.composite_width(), layout.composite_height());
        Self { layout, composite }
    }

    /// Copy a resized frame into slot `index`.
    ///
    /// The frame must match the slot geometry exactly; a mismatched frame is
    /// dropped with a warning rather than allowed to bleed into a neighbor
    /// slot.
    pub fn blit(&mut self, index: usize, image: &GrayImage) {
        let Some(slot) = self.layout.get(index) else {
            log::warn!("blit into nonexistent slot {}", index);
            return;
        };
        if image.width() != slot.width || image.height() != slot.height {
            log::warn!(
                "slot {} expects {}x{} but frame is {}x{}; dropping frame",
                index,
                slot.width,
                slot.height,
                image.width(),
                image.height()
            );
            return;
        }
        imageops::replace(&mut self.composite, image, slot.x as i64, slot.y as i64);
    }

    /// The assembled side-by-side preview image.
    pub fn buffer(&self) -> &GrayImage {
        &self.composite
    }

    pub fn width(&self) -> u32 {
        self.composite.width()
    }

    pub fn height(&self) -> u32 {
        self.composite.height()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaled_dims_rounding() {
        // 640x480 at 0.4 scales to 256x192 exactly.
        assert_eq!(scaled_dims(Resolution::new(640, 480), 0.4), (256, 192));
        // 3x3 at 0.5 rounds 1.5 up to 2.
        assert_eq!(scaled_dims(Resolution::new(3, 3), 0.5), (2, 2));
        // Identity scale changes nothing.
        assert_eq!(scaled_dims(Resolution::new(640, 480), 1.0), (640, 480));
    }

    #[test]
    fn test_scaled_dims_floor_at_one_pixel() {
        assert_eq!(scaled_dims(Resolution::new(640, 480), 0.0001), (1, 1));
    }

    #[test]
    fn test_horizontal_layout_two_slots() {
        let layout = SlotLayout::horizontal(2, 256, 192);
        assert_eq!(layout.len(), 2);
        assert_eq!(
            layout.get(0).unwrap(),
            SlotRect {
                x: 0,
                y: 0,
                width: 256,
                height: 192
            }
        );
        assert_eq!(
            layout.get(1).unwrap(),
            SlotRect {
                x: 256,
                y: 0,
                width: 256,
                height: 192
            }
        );
        assert_eq!(layout.composite_width(), 512);
        assert_eq!(layout.composite_height(), 192);
    }

    #[test]
    fn test_horizontal_layout_generalizes_beyond_two() {
        let layout = SlotLayout::horizontal(4, 100, 50);
        assert_eq!(layout.len(), 4);
        assert_eq!(layout.get(3).unwrap().x, 300);
        assert_eq!(layout.composite_width(), 400);
    }

    #[test]
    fn test_slots_are_disjoint() {
        let layout = SlotLayout::horizontal(3, 10, 10);
        for i in 0..layout.len() {
            for j in (i + 1)..layout.len() {
                let a = layout.get(i).unwrap();
                let b = layout.get(j).unwrap();
                assert!(a.x + a.width <= b.x || b.x + b.width <= a.x);
            }
        }
    }

    #[test]
    fn test_blit_fills_exact_slot() {
        let layout = SlotLayout::horizontal(2, 4, 2);
        let mut compositor = Compositor::new(layout);
        let white = GrayImage::from_pixel(4, 2, image::Luma([255]));

        compositor.blit(0, &white);

        let buf = compositor.buffer();
        for y in 0..2 {
            for x in 0..4 {
                assert_eq!(buf.get_pixel(x, y)[0], 255, "left half at ({},{})", x, y);
            }
            for x in 4..8 {
                assert_eq!(buf.get_pixel(x, y)[0], 0, "right half at ({},{})", x, y);
            }
        }
    }

    #[test]
    fn test_blit_rejects_mismatched_frame() {
        let layout = SlotLayout::horizontal(2, 4, 2);
        let mut compositor = Compositor::new(layout);
        let oversized = GrayImage::from_pixel(6, 2, image::Luma([255]));

        compositor.blit(0, &oversized);

        // Nothing written: the oversized frame would have bled into slot 1.
        assert!(compositor.buffer().pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn test_blit_out_of_range_slot_is_ignored() {
        let layout = SlotLayout::horizontal(1, 2, 2);
        let mut compositor = Compositor::new(layout);
        let frame = GrayImage::from_pixel(2, 2, image::Luma([7]));
        compositor.blit(5, &frame);
        assert!(compositor.buffer().pixels().all(|p| p[0] == 0));
    }
}
