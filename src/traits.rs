use crate::errors::Result;
use ndarray::prelude::*;

/// A pretrained segmentation network seen as a pure function.
///
/// Implementations take one preprocessed `(channels, height, width)` tensor and
/// return the per-class score tensor `(classes, height, width)` of that image.
/// Buffer management inside the inference runtime stays behind this call.
pub trait SegmentationNetwork: Send + Sync {
    fn infer(&self, tensor: ArrayView3<f32>) -> Result<Array3<f32>>;
}

impl<N: SegmentationNetwork + ?Sized> SegmentationNetwork for &N {
    fn infer(&self, tensor: ArrayView3<f32>) -> Result<Array3<f32>> {
        (**self).infer(tensor)
    }
}

impl<N: SegmentationNetwork + ?Sized> SegmentationNetwork for Box<N> {
    fn infer(&self, tensor: ArrayView3<f32>) -> Result<Array3<f32>> {
        (**self).infer(tensor)
    }
}
