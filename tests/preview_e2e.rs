//! End-to-end tests for the compositing and timing pipeline, driven with
//! synthetic frames instead of live cameras.

use std::time::Duration;

use image::imageops::{self, FilterType};
use image::GrayImage;

use twincam::camera::{validate_geometry, CameraDescriptor, CameraError, Resolution};
use twincam::compositor::{scaled_dims, Compositor, SlotLayout};
use twincam::stats::FpsStats;

fn descriptor(index: u32, width: u32, height: u32) -> CameraDescriptor {
    CameraDescriptor {
        index,
        resolution: Resolution::new(width, height),
        reported_fps: 30,
        exposure_before: None,
    }
}

/// Two 640x480 cameras at scale 0.4: slots are 256x192, the composite is
/// 512x192, and a white/black frame pair fills exactly one half each.
#[test]
fn test_two_camera_white_black_composite() {
    let resolution = Resolution::new(640, 480);
    let (slot_w, slot_h) = scaled_dims(resolution, 0.4);
    assert_eq!((slot_w, slot_h), (256, 192));

    let layout = SlotLayout::horizontal(2, slot_w, slot_h);
    assert_eq!(layout.composite_width(), 512);
    assert_eq!(layout.composite_height(), 192);

    let mut compositor = Compositor::new(layout);

    let white = GrayImage::from_pixel(slot_w, slot_h, image::Luma([255]));
    let black = GrayImage::from_pixel(slot_w, slot_h, image::Luma([0]));
    compositor.blit(0, &white);
    compositor.blit(1, &black);

    let buf = compositor.buffer();
    for (x, _y, pixel) in buf.enumerate_pixels() {
        if x < slot_w {
            assert_eq!(pixel[0], 255, "left half must be white at x={}", x);
        } else {
            assert_eq!(pixel[0], 0, "right half must be black at x={}", x);
        }
    }
}

/// Slot assignment never moves: camera 0 always lands at the origin and
/// camera 1 at (slot_width, 0), no matter how many iterations run.
#[test]
fn test_slot_assignment_is_stable_across_iterations() {
    let layout = SlotLayout::horizontal(2, 8, 4);
    let mut compositor = Compositor::new(layout);

    for iteration in 0u8..50 {
        let left = GrayImage::from_pixel(8, 4, image::Luma([iteration]));
        let right = GrayImage::from_pixel(8, 4, image::Luma([255 - iteration]));
        compositor.blit(0, &left);
        compositor.blit(1, &right);

        let buf = compositor.buffer();
        assert_eq!(buf.get_pixel(0, 0)[0], iteration);
        assert_eq!(buf.get_pixel(8, 0)[0], 255 - iteration);
    }
}

/// Resizing is deterministic: the same source and scale always produce the
/// same output.
#[test]
fn test_resize_is_deterministic() {
    let mut source = GrayImage::new(64, 48);
    for (x, y, pixel) in source.enumerate_pixels_mut() {
        *pixel = image::Luma([((x * 3 + y * 7) % 256) as u8]);
    }

    let (w, h) = scaled_dims(Resolution::new(64, 48), 0.4);
    let first = imageops::resize(&source, w, h, FilterType::Triangle);
    let second = imageops::resize(&source, w, h, FilterType::Triangle);

    assert_eq!(first.dimensions(), (26, 19));
    assert_eq!(first.as_raw(), second.as_raw());
}

/// A simulated 100ms iteration computes to exactly 10 fps, and the running
/// average is the exact mean of all samples.
#[test]
fn test_frame_rate_accounting() {
    let mut stats = FpsStats::new();

    let sample = stats.record(Duration::from_millis(100));
    assert!((sample.fps - 10.0).abs() < 1e-9);
    assert!((sample.avg_fps - 10.0).abs() < 1e-9);

    let sample = stats.record(Duration::from_millis(50));
    assert!((sample.fps - 20.0).abs() < 1e-9);
    assert!((sample.avg_fps - 15.0).abs() < 1e-9);
    assert_eq!(sample.frame, 2);
}

/// Mismatched geometry is rejected during rig validation, before any
/// composite buffer or preview window exists.
#[test]
fn test_geometry_mismatch_fails_before_compositing() {
    let descriptors = vec![descriptor(0, 640, 480), descriptor(1, 800, 600)];

    match validate_geometry(&descriptors) {
        Err(CameraError::GeometryMismatch { index, .. }) => assert_eq!(index, 1),
        other => panic!("Expected GeometryMismatch, got {:?}", other),
    }
}

/// The layout generalizes: N cameras produce N adjacent slots and an
/// N-slots-wide composite.
#[test]
fn test_composite_width_scales_with_camera_count() {
    for count in 1..=4 {
        let layout = SlotLayout::horizontal(count, 100, 80);
        assert_eq!(layout.composite_width(), 100 * count as u32);
        assert_eq!(layout.composite_height(), 80);
        assert_eq!(layout.get(count - 1).unwrap().x, 100 * (count as u32 - 1));
    }
}
