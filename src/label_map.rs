use crate::errors::{FaceSegError, Result};
use image::{GrayImage, Luma};
use ndarray::prelude::*;
use ndarray::Zip;
use num_traits::Float;

/// Per-pixel class indices predicted for one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelMap {
    labels: Array2<i64>,
    num_classes: usize,
}

impl LabelMap {
    /// Reduce a `(classes, height, width)` score tensor by arg-max over the class axis.
    ///
    /// Ties go to the lowest class index and a NaN score wins its pixel,
    /// which is how NumPy's `argmax` behaves.
    pub fn from_scores<F: Float>(scores: ArrayView3<F>) -> Result<Self> {
        let num_classes = scores.len_of(Axis(0));
        if num_classes == 0 {
            return Err(FaceSegError::validation(
                "score tensor",
                "has no class channels",
            ));
        }

        let labels = Zip::from(scores.lanes(Axis(0))).map_collect(argmax);

        Ok(Self {
            labels,
            num_classes,
        })
    }

    /// Wrap labels read back from disk. Every value must lie in `[0, num_classes)`.
    pub fn from_labels(labels: Array2<i64>, num_classes: usize) -> Result<Self> {
        if let Some(bad) = labels
            .iter()
            .find(|&&label| label < 0 || label as usize >= num_classes)
        {
            return Err(FaceSegError::validation(
                "label map",
                format!("contains {bad} outside [0, {num_classes})"),
            ));
        }
        Ok(Self {
            labels,
            num_classes,
        })
    }

    pub fn labels(&self) -> ArrayView2<'_, i64> {
        self.labels.view()
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// `(width, height)`, in image order.
    pub fn dimensions(&self) -> (u32, u32) {
        let (height, width) = self.labels.dim();
        (width as u32, height as u32)
    }

    pub fn into_inner(self) -> Array2<i64> {
        self.labels
    }

    /// Labels as an 8-bit grayscale image; ids above 255 saturate.
    pub fn to_luma8(&self) -> GrayImage {
        let (width, height) = self.dimensions();
        GrayImage::from_fn(width, height, |x, y| {
            Luma([self.labels[[y as usize, x as usize]].clamp(0, 255) as u8])
        })
    }
}

fn argmax<F: Float>(lane: ArrayView1<F>) -> i64 {
    let mut best = 0;
    let mut best_value = lane[0];
    for (index, &value) in lane.iter().enumerate().skip(1) {
        if best_value.is_nan() {
            break;
        }
        if value.is_nan() || value > best_value {
            best = index;
            best_value = value;
        }
    }
    best as i64
}
