//! Input batches

use ndarray::{Array1, Array4, ArrayD};

/// A batch of images handed to a module step
#[derive(Debug, Clone)]
pub struct Batch {
    /// Images, `[N, C, H, W]`
    pub images: Array4<f32>,
    /// Image-level ground truth (1 = anomalous), `[N]`
    pub labels: Option<Array1<f32>>,
    /// Pixel-level ground truth, `[N, ...]`
    pub masks: Option<ArrayD<f32>>,
    /// Source path of each image
    pub image_paths: Vec<String>,
}

impl Batch {
    /// Create a batch from images only
    pub fn new(images: Array4<f32>) -> Self {
        Self {
            images,
            labels: None,
            masks: None,
            image_paths: Vec::new(),
        }
    }

    /// Attach image-level labels
    pub fn with_labels(mut self, labels: Array1<f32>) -> Self {
        self.labels = Some(labels);
        self
    }

    /// Attach ground-truth masks
    pub fn with_masks(mut self, masks: ArrayD<f32>) -> Self {
        self.masks = Some(masks);
        self
    }

    /// Attach image paths
    pub fn with_image_paths(mut self, paths: Vec<String>) -> Self {
        self.image_paths = paths;
        self
    }

    /// Number of samples in the batch
    pub fn len(&self) -> usize {
        self.images.shape()[0]
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
