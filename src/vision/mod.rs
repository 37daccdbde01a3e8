use bytes::Bytes;
use derive_getters::Getters;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// One camera frame.
#[derive(Debug, Clone, Getters)]
pub struct Image {
    width: u32,
    height: u32,
    data: Bytes,
}

impl Image {
    pub fn new(width: u32, height: u32, data: Bytes) -> Self {
        Self {
            width,
            height,
            data,
        }
    }
}

/// A single bounding box recognition, in pixel coordinates.
#[derive(Debug, Clone, PartialEq, Getters, Serialize, Deserialize)]
pub struct Detection {
    label: String,
    confidence: f64,
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
}

impl Detection {
    pub fn new(
        label: impl Into<String>,
        confidence: f64,
        (x_min, x_max): (f64, f64),
        (y_min, y_max): (f64, f64),
    ) -> Self {
        Self {
            label: label.into(),
            confidence,
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    /// Bounding box width as a fraction of the image width.
    pub fn relative_size(&self, image_width: f64) -> f64 {
        (self.x_max - self.x_min) / image_width
    }

    /// Signed offset of the box center from the image center, normalized to the width.
    ///
    /// Negative is left of center, positive right. Range is roughly [-0.5, 0.5].
    pub fn horizontal_offset(&self, image_width: f64) -> f64 {
        (self.x_min + (self.x_max - self.x_min) / 2.0) / image_width - 0.5
    }
}

/// Keeps only detections of `class`.
pub fn of_class(detections: Vec<Detection>, class: &str) -> Vec<Detection> {
    detections
        .into_iter()
        .filter(|d| d.label == class)
        .collect_vec()
}
