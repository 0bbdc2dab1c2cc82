//! Visualisations of a label map: the debug overlay written next to the
//! outputs, and the colour-mapped image shown by the viewer.

use crate::{
    errors::{FaceSegError, Result},
    label_map::LabelMap,
};
use image::{
    imageops, imageops::FilterType, DynamicImage, GenericImageView, ImageBuffer, Luma, Pixel,
    Primitive, Rgb, RgbImage,
};
use num_traits::AsPrimitive;

pub const OVERLAY_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
pub const OVERLAY_ALPHA: f32 = 0.5;

/// Anchors of the viridis colour map, evenly spaced over `[0, 1]`.
const VIRIDIS: [[u8; 3]; 5] = [
    [68, 1, 84],
    [59, 82, 139],
    [33, 145, 140],
    [94, 201, 98],
    [253, 231, 37],
];

/// Blend `color` into every pixel whose mask value is non-zero.
///
/// Each channel becomes `round(color * alpha + pixel * (1 - alpha))`.
pub fn blend_mask<I, SM>(
    image: &I,
    mask: &ImageBuffer<Luma<SM>, Vec<SM>>,
    color: Rgb<u8>,
    alpha: f32,
) -> Result<RgbImage>
where
    I: GenericImageView<Pixel = Rgb<u8>>,
    Luma<SM>: Pixel<Subpixel = SM>,
    SM: Primitive + 'static,
{
    if image.dimensions() != mask.dimensions() {
        return Err(FaceSegError::validation(
            "overlay mask",
            format!(
                "is {:?} but the image is {:?}",
                mask.dimensions(),
                image.dimensions()
            ),
        ));
    }
    if !(0.0..=1.0).contains(&alpha) {
        return Err(FaceSegError::validation(
            "overlay alpha",
            format!("{alpha} is outside [0, 1]"),
        ));
    }

    let (width, height) = image.dimensions();
    let zero = SM::zero();
    let mut out = RgbImage::new(width, height);
    for ((x, y, pixel), Luma([m])) in image.pixels().zip(mask.pixels()) {
        let pixel = if *m != zero {
            let Rgb(channels) = pixel;
            Rgb(std::array::from_fn(|i| blend_channel(color.0[i], channels[i], alpha)))
        } else {
            pixel
        };
        out.put_pixel(x, y, pixel);
    }
    Ok(out)
}

fn blend_channel(color: u8, value: u8, alpha: f32) -> u8 {
    let color: f32 = color.as_();
    let value: f32 = value.as_();
    (color * alpha + value * (1.0 - alpha)).round().as_()
}

/// Debug render: the source image at its own resolution with every
/// non-background pixel tinted with [`OVERLAY_COLOR`].
pub fn render_overlay(image: &DynamicImage, labels: &LabelMap) -> Result<RgbImage> {
    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();
    let mask = imageops::resize(&labels.to_luma8(), width, height, FilterType::Nearest);
    blend_mask(&rgb, &mask, OVERLAY_COLOR, OVERLAY_ALPHA)
}

/// Colour-map a label map, class 0 at the dark end of viridis and the
/// highest class at the bright end.
pub fn colorize(labels: &LabelMap) -> RgbImage {
    let (width, height) = labels.dimensions();
    let top = labels.num_classes().saturating_sub(1).max(1) as f32;
    let view = labels.labels();
    ImageBuffer::from_fn(width, height, |x, y| {
        let label: f32 = view[[y as usize, x as usize]].as_();
        viridis(label / top)
    })
}

fn viridis(t: f32) -> Rgb<u8> {
    let t = t.clamp(0.0, 1.0) * (VIRIDIS.len() - 1) as f32;
    let lower = (t.floor() as usize).min(VIRIDIS.len() - 2);
    let frac = t - lower as f32;
    let (a, b) = (VIRIDIS[lower], VIRIDIS[lower + 1]);
    Rgb(std::array::from_fn(|i| {
        let a: f32 = a[i].as_();
        let b: f32 = b[i].as_();
        (a + (b - a) * frac).round().as_()
    }))
}

/// Pack RGB pixels as `0RGB` words, the framebuffer layout of the viewer window.
pub fn to_argb(image: &RgbImage) -> Vec<u32> {
    image
        .pixels()
        .map(|Rgb([r, g, b])| (u32::from(*r) << 16) | (u32::from(*g) << 8) | u32::from(*b))
        .collect()
}
