//! Integration tests for greedy NMS deduplication.
//!
//! Tests cover:
//! - Empty input and non-overlapping input
//! - Suppression at and around the IoU threshold
//! - Cross-class suppression and the per-class mode
//! - Degenerate boxes never suppressing or being suppressed
//! - Input left untouched, ties kept in input order

mod common;

use common::*;

#[test]
fn test_empty_input_returns_empty() {
    let dedup = Deduplicator::new(0.5);
    assert!(dedup.deduplicate(&[]).is_empty());
}

#[test]
fn test_non_overlapping_boxes_all_survive() {
    let input = vec![
        weighted(0.0, 0.0, 10.0, 10.0, 0.3, 0),
        weighted(20.0, 20.0, 30.0, 30.0, 0.9, 1),
        weighted(40.0, 0.0, 50.0, 10.0, 0.6, 2),
        // shares an edge with the first box, zero intersection
        weighted(10.0, 0.0, 20.0, 10.0, 0.5, 0),
    ];

    let result = Deduplicator::new(0.5).deduplicate(&input);

    assert_eq!(result.len(), input.len());
    let confidences: Vec<f32> = result.iter().map(|d| d.confidence).collect();
    assert_eq!(confidences, vec![0.9, 0.6, 0.5, 0.3]);
}

#[test]
fn test_identical_boxes_keep_most_confident() {
    let input = vec![
        weighted(10.0, 10.0, 50.0, 50.0, 0.7, 0),
        weighted(10.0, 10.0, 50.0, 50.0, 0.9, 0),
    ];

    let result = Deduplicator::new(0.5).deduplicate(&input);

    assert_eq!(result.len(), 1);
    assert_eq!(result[0].confidence, 0.9);
}

#[test]
fn test_suppression_ignores_class() {
    // IoU = 60 / 100 = 0.6
    let input = vec![
        weighted(0.0, 0.0, 10.0, 10.0, 0.9, 0),
        weighted(0.0, 0.0, 10.0, 6.0, 0.8, 2),
    ];

    let result = Deduplicator::new(0.5).deduplicate(&input);

    assert_eq!(result.len(), 1);
    assert_eq!(result[0].class_id, 0);
    assert_eq!(result[0].confidence, 0.9);
}

#[test]
fn test_per_class_mode_keeps_other_classes() {
    let input = vec![
        weighted(0.0, 0.0, 10.0, 10.0, 0.9, 0),
        weighted(0.0, 0.0, 10.0, 6.0, 0.8, 2),
        weighted(0.0, 0.0, 10.0, 9.0, 0.7, 0),
    ];

    let result = Deduplicator::new(0.5)
        .with_mode(SuppressionMode::PerClass)
        .deduplicate(&input);

    let kept: Vec<(usize, f32)> = result.iter().map(|d| (d.class_id, d.confidence)).collect();
    assert_eq!(kept, vec![(0, 0.9), (2, 0.8)]);
}

#[test]
fn test_iou_equal_to_threshold_is_suppressed() {
    // IoU = 50 / 100 = 0.5 exactly
    let input = vec![
        weighted(0.0, 0.0, 10.0, 10.0, 0.9, 0),
        weighted(0.0, 0.0, 10.0, 5.0, 0.8, 0),
    ];

    let result = Deduplicator::new(0.5).deduplicate(&input);
    assert_eq!(result.len(), 1);
}

#[test]
fn test_iou_below_threshold_survives() {
    // IoU = 40 / 100 = 0.4
    let input = vec![
        weighted(0.0, 0.0, 10.0, 10.0, 0.9, 0),
        weighted(0.0, 0.0, 10.0, 4.0, 0.8, 0),
    ];

    let result = Deduplicator::new(0.5).deduplicate(&input);
    assert_eq!(result.len(), 2);
}

#[test]
fn test_suppressed_box_does_not_suppress_others() {
    // B overlaps A heavily and is dropped; C overlaps only B, so it stays
    let input = vec![
        weighted(0.0, 0.0, 10.0, 10.0, 0.9, 0),
        weighted(2.0, 0.0, 12.0, 10.0, 0.8, 0),
        weighted(4.0, 0.0, 14.0, 10.0, 0.7, 0),
    ];

    let result = Deduplicator::new(0.5).deduplicate(&input);

    let confidences: Vec<f32> = result.iter().map(|d| d.confidence).collect();
    assert_eq!(confidences, vec![0.9, 0.7]);
}

#[test]
fn test_degenerate_boxes_always_survive() {
    let input = vec![
        weighted(10.0, 10.0, 50.0, 50.0, 0.8, 0),
        // x2 < x1, sits on top of the first box
        weighted(50.0, 10.0, 10.0, 50.0, 0.95, 1),
        // zero height
        weighted(10.0, 30.0, 50.0, 30.0, 0.5, 0),
        weighted(10.0, 10.0, 50.0, 50.0, 0.6, 0),
    ];

    let result = Deduplicator::new(0.5).deduplicate(&input);

    let confidences: Vec<f32> = result.iter().map(|d| d.confidence).collect();
    assert_eq!(confidences, vec![0.95, 0.8, 0.5]);
}

#[test]
fn test_degenerate_boxes_survive_zero_threshold() {
    let input = vec![
        weighted(0.0, 0.0, 10.0, 10.0, 0.9, 0),
        weighted(5.0, 5.0, 5.0, 5.0, 0.4, 0),
        weighted(f32::NAN, 0.0, 10.0, 10.0, 0.3, 0),
    ];

    let result = Deduplicator::new(0.0).deduplicate(&input);
    assert_eq!(result.len(), 3);
}

#[test]
fn test_input_is_not_modified() {
    let input = vec![
        weighted(0.0, 0.0, 10.0, 10.0, 0.2, 0),
        weighted(0.0, 0.0, 10.0, 10.0, 0.9, 0),
        weighted(30.0, 30.0, 40.0, 40.0, 0.5, 0),
    ];
    let before = input.clone();

    let result = Deduplicator::new(0.5).deduplicate(&input);

    assert_eq!(result.len(), 2);
    assert_eq!(input, before);
}

#[test]
fn test_ties_keep_input_order() {
    let mut first = weighted(0.0, 0.0, 10.0, 10.0, 0.5, 0);
    first.detector = "first".to_string();
    let mut second = weighted(0.0, 0.0, 10.0, 10.0, 0.5, 0);
    second.detector = "second".to_string();

    let result = Deduplicator::new(0.5).deduplicate(&[first, second]);

    assert_eq!(result.len(), 1);
    assert_eq!(result[0].detector, "first");
}
