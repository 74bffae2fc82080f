use crate::models::{BoundingBox, ClassCatalog};
use crate::pipeline::Analysis;
use crate::report::{Criticality, CriticalityTable};
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

const LINE_WIDTH: i32 = 2;

pub fn criticality_color(level: Criticality) -> Rgb<u8> {
    match level {
        Criticality::Critical => Rgb([255, 0, 0]),
        Criticality::High => Rgb([255, 165, 0]),
        Criticality::Medium => Rgb([255, 255, 0]),
        Criticality::Low => Rgb([0, 255, 0]),
    }
}

/// Draw every detection as a hollow rectangle on a copy of the image.
/// Boxes are clipped to the image first; boxes with NaN coordinates or
/// nothing left after clipping are skipped.
pub fn draw_detections(
    image: &RgbImage,
    analysis: &Analysis,
    catalog: &ClassCatalog,
    table: &CriticalityTable,
) -> RgbImage {
    let mut canvas = image.clone();

    for det in &analysis.detections {
        let level = catalog
            .name(det.class_id)
            .map(|name| table.level(name))
            .unwrap_or(Criticality::Medium);
        let color = criticality_color(level);

        let Some((x, y, w, h)) = clamp_to_image(&det.bbox, canvas.width(), canvas.height()) else {
            continue;
        };

        // Concentric rectangles give the line its width
        for inset in 0..LINE_WIDTH {
            let (rw, rh) = (w - 2 * inset, h - 2 * inset);
            if rw <= 0 || rh <= 0 {
                break;
            }
            let rect = Rect::at(x + inset, y + inset).of_size(rw as u32, rh as u32);
            draw_hollow_rect_mut(&mut canvas, rect, color);
        }
    }

    canvas
}

/// Pixel rectangle `(x, y, width, height)` of the part of `bbox` inside a
/// `width` x `height` image, or `None` when nothing of it is visible
fn clamp_to_image(bbox: &BoundingBox, width: u32, height: u32) -> Option<(i32, i32, i32, i32)> {
    let coords = [bbox.x1, bbox.y1, bbox.x2, bbox.y2];
    if coords.iter().any(|v| v.is_nan()) {
        return None;
    }

    let (max_x, max_y) = (width as f32, height as f32);
    let x1 = bbox.x1.clamp(0.0, max_x).round() as i32;
    let x2 = bbox.x2.clamp(0.0, max_x).round() as i32;
    let y1 = bbox.y1.clamp(0.0, max_y).round() as i32;
    let y2 = bbox.y2.clamp(0.0, max_y).round() as i32;

    let (w, h) = (x2 - x1, y2 - y1);
    if w <= 0 || h <= 0 {
        return None;
    }
    Some((x1, y1, w, h))
}
