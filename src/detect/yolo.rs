//! YOLO output decoding
//!
//! Pure functions over the detector's raw output tensor: per-anchor score
//! extraction, confidence filtering, non-maximum suppression, and the
//! class-index-to-letter table. Nothing here touches the runtime, so the
//! whole decode path is testable without a model.

use thiserror::Error;

use super::{Detection, DetectorParams};

/// Letters the model can recognize, in class-index order
pub const LETTER_CLASSES: [char; 26] = [
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R',
    'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z',
];

/// Map a class index to its letter
pub fn class_letter(class: usize) -> Option<char> {
    LETTER_CLASSES.get(class).copied()
}

/// Raw output did not have the `[1, 4 + classes, anchors]` layout
#[derive(Error, Debug)]
#[error("unexpected detector output shape {0:?}")]
pub struct BadShape(pub Vec<usize>);

/// Decode a YOLO output tensor into detections with confidence >= threshold.
///
/// Layout is `[1, 4 + classes, anchors]`: rows 0-3 are the box center,
/// width, and height in input-image pixels, the remaining rows are per-class
/// scores. Box coordinates come back normalized to `[0, 1]`.
pub fn decode_detections(
    data: &[f32],
    dims: &[usize],
    params: &DetectorParams,
    conf_threshold: f32,
) -> Result<Vec<Detection>, BadShape> {
    let &[1, rows, anchors] = dims else {
        return Err(BadShape(dims.to_vec()));
    };
    if rows <= 4 || rows - 4 > LETTER_CLASSES.len() || data.len() != rows * anchors {
        return Err(BadShape(dims.to_vec()));
    }

    let classes = rows - 4;
    let at = |row: usize, anchor: usize| data[row * anchors + anchor];
    let scale = params.input_size as f32;

    let mut detections = Vec::new();
    for anchor in 0..anchors {
        let (mut best_class, mut best_score) = (0, 0.0f32);
        for class in 0..classes {
            let score = at(4 + class, anchor);
            if score > best_score {
                best_class = class;
                best_score = score;
            }
        }
        if best_score < conf_threshold {
            continue;
        }
        let Some(label) = class_letter(best_class) else {
            continue;
        };

        let (cx, cy) = (at(0, anchor) / scale, at(1, anchor) / scale);
        let (w, h) = (at(2, anchor) / scale, at(3, anchor) / scale);
        detections.push(Detection {
            label,
            confidence: best_score,
            bbox: [
                (cx - w / 2.0).clamp(0.0, 1.0),
                (cy - h / 2.0).clamp(0.0, 1.0),
                (cx + w / 2.0).clamp(0.0, 1.0),
                (cy + h / 2.0).clamp(0.0, 1.0),
            ],
        });
    }

    Ok(non_max_suppression(detections, params.iou_threshold))
}

/// The single best detection at or above the confidence threshold, or `None`
pub fn best_detection(
    data: &[f32],
    dims: &[usize],
    params: &DetectorParams,
    conf_threshold: f32,
) -> Result<Option<Detection>, BadShape> {
    let detections = decode_detections(data, dims, params, conf_threshold)?;
    Ok(detections.into_iter().next())
}

/// Greedy NMS: keep the highest-confidence box, drop everything that
/// overlaps it past the IoU threshold, repeat. Returns survivors sorted by
/// descending confidence.
fn non_max_suppression(mut detections: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    detections.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut kept: Vec<Detection> = Vec::new();
    for candidate in detections {
        if kept.iter().all(|k| iou(&k.bbox, &candidate.bbox) <= iou_threshold) {
            kept.push(candidate);
        }
    }
    kept
}

/// Intersection-over-union of two `[x1, y1, x2, y2]` boxes
fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    let ix = (a[2].min(b[2]) - a[0].max(b[0])).max(0.0);
    let iy = (a[3].min(b[3]) - a[1].max(b[1])).max(0.0);
    let intersection = ix * iy;

    let area_a = (a[2] - a[0]) * (a[3] - a[1]);
    let area_b = (b[2] - b[0]) * (b[3] - b[1]);
    let union = area_a + area_b - intersection;

    if union <= 0.0 {
        0.0
    } else {
        intersection / union
    }
}

/// Resize an RGBA frame to the model's square input and convert to RGB float
/// `[0, 1]` in NCHW layout
pub fn preprocess_rgba(data: &[u8], width: u32, height: u32, input_size: u32) -> Vec<f32> {
    let size = input_size as usize;
    let mut output = vec![0.0f32; 3 * size * size];

    let x_ratio = width as f32 / input_size as f32;
    let y_ratio = height as f32 / input_size as f32;
    let channel_stride = size * size;

    for y in 0..size {
        for x in 0..size {
            let src_x = ((x as f32 * x_ratio) as u32).min(width.saturating_sub(1));
            let src_y = ((y as f32 * y_ratio) as u32).min(height.saturating_sub(1));
            let src = ((src_y * width + src_x) * 4) as usize;
            if src + 2 >= data.len() {
                continue;
            }

            let pixel = y * size + x;
            output[pixel] = data[src] as f32 / 255.0;
            output[channel_stride + pixel] = data[src + 1] as f32 / 255.0;
            output[2 * channel_stride + pixel] = data[src + 2] as f32 / 255.0;
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> DetectorParams {
        DetectorParams::default()
    }

    /// Build a `[1, 4 + 26, anchors]` tensor from (cx, cy, w, h, class,
    /// score) rows, in input-image pixel coordinates
    fn raw_output(boxes: &[(f32, f32, f32, f32, usize, f32)]) -> (Vec<f32>, Vec<usize>) {
        let anchors = boxes.len();
        let rows = 4 + LETTER_CLASSES.len();
        let mut data = vec![0.0f32; rows * anchors];
        for (anchor, &(cx, cy, w, h, class, score)) in boxes.iter().enumerate() {
            data[anchor] = cx;
            data[anchors + anchor] = cy;
            data[2 * anchors + anchor] = w;
            data[3 * anchors + anchor] = h;
            data[(4 + class) * anchors + anchor] = score;
        }
        (data, vec![1, rows, anchors])
    }

    #[test]
    fn test_best_detection_picks_highest_confidence() {
        let (data, dims) = raw_output(&[
            (100.0, 100.0, 50.0, 50.0, 0, 0.90),  // A
            (400.0, 400.0, 50.0, 50.0, 1, 0.95),  // B, higher confidence
        ]);
        let best = best_detection(&data, &dims, &params(), 0.5).unwrap().unwrap();
        assert_eq!(best.label, 'B');
        assert!((best.confidence - 0.95).abs() < 1e-6);
    }

    #[test]
    fn test_sub_threshold_boxes_yield_none() {
        let (data, dims) = raw_output(&[(100.0, 100.0, 50.0, 50.0, 2, 0.40)]);
        assert!(best_detection(&data, &dims, &params(), 0.83).unwrap().is_none());
    }

    #[test]
    fn test_empty_output_yields_none() {
        let (data, dims) = raw_output(&[(100.0, 100.0, 50.0, 50.0, 0, 0.0)]);
        assert!(best_detection(&data, &dims, &params(), 0.25).unwrap().is_none());
    }

    #[test]
    fn test_nms_merges_overlapping_boxes() {
        // Two near-identical boxes for the same sign: NMS keeps only the
        // stronger one
        let (data, dims) = raw_output(&[
            (100.0, 100.0, 60.0, 60.0, 4, 0.90),
            (102.0, 101.0, 60.0, 60.0, 4, 0.85),
        ]);
        let detections = decode_detections(&data, &dims, &params(), 0.5).unwrap();
        assert_eq!(detections.len(), 1);
        assert!((detections[0].confidence - 0.90).abs() < 1e-6);
    }

    #[test]
    fn test_distant_boxes_both_survive() {
        let (data, dims) = raw_output(&[
            (100.0, 100.0, 50.0, 50.0, 0, 0.90),
            (500.0, 500.0, 50.0, 50.0, 1, 0.85),
        ]);
        let detections = decode_detections(&data, &dims, &params(), 0.5).unwrap();
        assert_eq!(detections.len(), 2);
    }

    #[test]
    fn test_bbox_is_normalized() {
        let (data, dims) = raw_output(&[(320.0, 320.0, 320.0, 320.0, 0, 0.9)]);
        let best = best_detection(&data, &dims, &params(), 0.5).unwrap().unwrap();
        let [x1, y1, x2, y2] = best.bbox;
        assert!((x1 - 0.25).abs() < 1e-5);
        assert!((y1 - 0.25).abs() < 1e-5);
        assert!((x2 - 0.75).abs() < 1e-5);
        assert!((y2 - 0.75).abs() < 1e-5);
    }

    #[test]
    fn test_bad_shape_is_rejected() {
        let data = vec![0.0f32; 10];
        assert!(best_detection(&data, &[1, 2, 5], &params(), 0.5).is_err());
        assert!(best_detection(&data, &[2, 30, 5], &params(), 0.5).is_err());
    }

    #[test]
    fn test_class_letter_table() {
        assert_eq!(class_letter(0), Some('A'));
        assert_eq!(class_letter(25), Some('Z'));
        assert_eq!(class_letter(26), None);
    }

    #[test]
    fn test_preprocess_dimensions_and_range() {
        // 2x2 solid red frame upscaled to 4x4
        let frame = [255u8, 0, 0, 255].repeat(4);
        let tensor = preprocess_rgba(&frame, 2, 2, 4);
        assert_eq!(tensor.len(), 3 * 4 * 4);
        // R channel all ones, G and B all zeros
        assert!(tensor[..16].iter().all(|&v| (v - 1.0).abs() < 1e-6));
        assert!(tensor[16..].iter().all(|&v| v.abs() < 1e-6));
    }
}
