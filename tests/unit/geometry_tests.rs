// Geometry unit tests: offsets, placement, tile gaps and scaled sizes

use imgmark::imaging::{GravityOptions, GravityType, ImageData, ImageType};
use imgmark::imath::{round_to_even, scale_to_even};
use imgmark::watermark::processor::watermark_processing_options;
use imgmark::watermark::{
    resolve_offset, resolve_placement, resolve_tile_gap, split_inset, PlacementPosition,
    WatermarkOptions,
};
use rstest::rstest;

#[rstest]
#[case(0.0)]
#[case(0.1)]
#[case(0.25)]
#[case(-0.3)]
#[case(0.999)]
fn test_fractional_offset_scales_with_target(#[case] x: f64) {
    for width in [1u32, 99, 640, 801, 4096] {
        assert_eq!(
            resolve_offset(x, width, 3.0),
            round_to_even(x * width as f64)
        );
    }
}

#[rstest]
#[case(1.0)]
#[case(10.0)]
#[case(-7.0)]
#[case(33.3)]
fn test_absolute_offset_ignores_target(#[case] x: f64) {
    for offset_scale in [1.0, 1.5, 2.0, 3.0] {
        let expected = round_to_even(x * offset_scale);
        for width in [1u32, 640, 4096] {
            assert_eq!(resolve_offset(x, width, offset_scale), expected);
        }
    }
}

#[test]
fn test_resolved_offsets_are_even() {
    for value in [0.13, 0.5, 3.0, 17.0, -9.0] {
        for width in [7u32, 101, 999] {
            assert_eq!(resolve_offset(value, width, 1.25) % 2, 0);
        }
    }
}

#[test]
fn test_split_inset_sums_to_offset() {
    for offset in -101..=101 {
        let (first, second) = split_inset(offset);
        assert_eq!(first + second, offset);
        assert_eq!(first, offset / 2);
    }
}

#[rstest]
#[case(800, 600, 0.1)]
#[case(801, 599, 0.25)]
#[case(3, 3, 0.1)]
#[case(1920, 1080, 0.333)]
#[case(10, 10, 2.0)]
fn test_scaled_watermark_target(#[case] width: u32, #[case] height: u32, #[case] scale: f64) {
    let data = ImageData::new(vec![0u8; 4], ImageType::Png);
    let opts = WatermarkOptions {
        scale,
        ..WatermarkOptions::enabled()
    };

    let po = watermark_processing_options(&data, &opts, width, height, 1.0);

    assert_eq!(po.width, scale_to_even(width, scale).max(1) as u32);
    assert_eq!(po.height, scale_to_even(height, scale).max(1) as u32);
    for dim in [po.width, po.height] {
        assert!(dim == 1 || dim % 2 == 0, "dimension {dim} is odd");
    }
}

#[test]
fn test_center_scenario() {
    let gravity = GravityOptions::new(GravityType::Center, 0.0, 0.0);
    for (wm_w, wm_h) in [(100u32, 50u32), (101, 51), (333, 77)] {
        let pos = resolve_placement(800, 600, wm_w, wm_h, &gravity, 1.0, true);
        assert_eq!(pos.x, round_to_even((800 - wm_w) as f64 / 2.0));
        assert_eq!(pos.y, round_to_even((600 - wm_h) as f64 / 2.0));
    }
}

#[test]
fn test_absolute_offset_scenario() {
    let gravity = GravityOptions::new(GravityType::NorthWest, 10.0, 0.0);
    let pos = resolve_placement(800, 600, 100, 50, &gravity, 2.0, true);
    assert_eq!(pos, PlacementPosition::new(20, 0));
}

#[rstest]
#[case(GravityType::NorthWest, 0, 0)]
#[case(GravityType::North, 350, 0)]
#[case(GravityType::NorthEast, 700, 0)]
#[case(GravityType::West, 0, 276)]
#[case(GravityType::Center, 350, 276)]
#[case(GravityType::East, 700, 276)]
#[case(GravityType::SouthWest, 0, 550)]
#[case(GravityType::South, 350, 550)]
#[case(GravityType::SouthEast, 700, 550)]
fn test_gravity_anchors(#[case] kind: GravityType, #[case] x: i32, #[case] y: i32) {
    let gravity = GravityOptions::new(kind, 0.0, 0.0);
    let pos = resolve_placement(800, 600, 100, 50, &gravity, 1.0, false);
    assert_eq!(pos, PlacementPosition::new(x, y));
}

#[test]
fn test_tile_gap_uses_gap_semantics() {
    // The same gravity that would push a single watermark 20px right and
    // 30px down becomes a 20x30 gap around every tile
    let gravity = GravityOptions::new(GravityType::SouthEast, 20.0, 30.0);
    let insets = resolve_tile_gap(800, 600, &gravity, 1.0);

    assert_eq!(insets.horizontal(), 20);
    assert_eq!(insets.vertical(), 30);
    assert_eq!((insets.left, insets.right), split_inset(20));
    assert_eq!((insets.top, insets.bottom), split_inset(30));
}

#[rstest]
#[case(GravityType::Center, 1e12, 1e12, PlacementPosition::new(799, 599))]
#[case(GravityType::Center, -1e12, -1e12, PlacementPosition::new(-99, -49))]
#[case(GravityType::SouthEast, -1e12, -1e12, PlacementPosition::new(799, 599))]
#[case(GravityType::SouthEast, 1e12, 1e12, PlacementPosition::new(-99, -49))]
#[case(GravityType::NorthWest, 1e12, -1e12, PlacementPosition::new(799, -49))]
fn test_huge_offsets_clamp_to_visible_pixel(
    #[case] kind: GravityType,
    #[case] x: f64,
    #[case] y: f64,
    #[case] expected: PlacementPosition,
) {
    let gravity = GravityOptions::new(kind, x, y);
    let pos = resolve_placement(800, 600, 100, 50, &gravity, 1.0, true);

    assert_eq!(pos, expected);
    assert!((-99..=799).contains(&pos.x));
    assert!((-49..=599).contains(&pos.y));
}

#[rstest]
#[case(1e12, PlacementPosition::new(0, 0))]
#[case(-1e12, PlacementPosition::new(700, 550))]
fn test_huge_offsets_stay_inside_without_overflow(
    #[case] offset: f64,
    #[case] expected: PlacementPosition,
) {
    let gravity = GravityOptions::new(GravityType::SouthEast, offset, offset);
    assert_eq!(
        resolve_placement(800, 600, 100, 50, &gravity, 1.0, false),
        expected
    );
}
