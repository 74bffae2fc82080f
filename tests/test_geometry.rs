//! Tests for bounding box geometry and IoU.

mod common;

use common::*;

#[test]
fn test_iou_identical_boxes_is_one() {
    let a = BoundingBox::new(10.0, 10.0, 50.0, 50.0);
    assert_close(a.iou(&a), 1.0);
}

#[test]
fn test_iou_disjoint_and_touching_boxes_is_zero() {
    let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
    let far = BoundingBox::new(100.0, 100.0, 110.0, 110.0);
    let touching = BoundingBox::new(10.0, 0.0, 20.0, 10.0);

    assert_eq!(a.iou(&far), 0.0);
    assert_eq!(a.iou(&touching), 0.0);
}

#[test]
fn test_iou_partial_overlap() {
    let a = BoundingBox::new(10.0, 10.0, 50.0, 50.0);
    let b = BoundingBox::new(12.0, 11.0, 48.0, 49.0);

    // b lies inside a: 36 * 38 / (40 * 40)
    assert_close(a.iou(&b), 1368.0 / 1600.0);
    assert_close(b.iou(&a), a.iou(&b));
}

#[test]
fn test_degenerate_boxes_have_zero_area_and_iou() {
    let normal = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
    let inverted = BoundingBox::new(10.0, 10.0, 0.0, 0.0);
    let flat = BoundingBox::new(0.0, 5.0, 10.0, 5.0);
    let nan = BoundingBox::new(f32::NAN, 0.0, 10.0, 10.0);

    for b in [inverted, flat, nan] {
        assert!(b.is_degenerate());
        assert_eq!(b.area(), 0.0);
        assert_eq!(normal.iou(&b), 0.0);
        assert_eq!(b.iou(&normal), 0.0);
        assert_eq!(b.iou(&b), 0.0);
    }
}

#[test]
fn test_infinite_extent_is_not_clamped() {
    let normal = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
    let wide = BoundingBox::new(0.0, 0.0, f32::INFINITY, 10.0);

    assert!(!wide.is_degenerate());
    assert_eq!(wide.width(), f32::INFINITY);
    assert_eq!(wide.height(), 10.0);
    // finite overlap over an infinite union
    assert_eq!(normal.iou(&wide), 0.0);
}

#[test]
fn test_center_and_size() {
    let b = BoundingBox::new(10.0, 20.0, 50.0, 30.0);
    assert_eq!(b.center(), (30.0, 25.0));
    assert_eq!(b.size(), 40.0);
}

#[test]
fn test_bbox_serializes_as_array() -> anyhow::Result<()> {
    let b = BoundingBox::new(1.0, 2.0, 3.0, 4.0);
    assert_eq!(serde_json::to_string(&b)?, "[1.0,2.0,3.0,4.0]");

    let parsed: BoundingBox = serde_json::from_str("[1, 2, 3, 4]")?;
    assert_eq!(parsed, b);
    Ok(())
}

#[test]
fn test_class_catalog_defaults() {
    let catalog = ClassCatalog::default();
    assert_eq!(catalog.len(), 4);
    assert_eq!(catalog.name(2), Some("Crack"));
    assert!(catalog.contains(3));
    assert!(!catalog.contains(4));
    assert_eq!(catalog.name(4), None);
}
