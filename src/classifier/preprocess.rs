use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use ndarray::Array4;

/// Per-channel normalisation applied after scaling pixels to `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalization {
    pub mean: [f32; 3],
    pub std: [f32; 3],
}

/// Scales the image so its longer side is `size`, keeping the aspect ratio,
/// and centres it on a black `size x size` canvas.
pub fn letterbox(image: &RgbImage, size: u32) -> RgbImage {
    let (width, height) = image.dimensions();
    let (new_width, new_height) = if width > height {
        (size, scale_side(height, width, size))
    } else {
        (scale_side(width, height, size), size)
    };

    let resized = imageops::resize(image, new_width, new_height, FilterType::Triangle);

    let mut canvas = RgbImage::from_pixel(size, size, Rgb([0, 0, 0]));
    let pad_x = (size - new_width) / 2;
    let pad_y = (size - new_height) / 2;

    for (x, y, pixel) in resized.enumerate_pixels() {
        canvas.put_pixel(x + pad_x, y + pad_y, *pixel);
    }

    canvas
}

fn scale_side(side: u32, longer: u32, size: u32) -> u32 {
    let scaled = u64::from(size) * u64::from(side) / u64::from(longer.max(1));
    (scaled as u32).clamp(1, size)
}

/// NCHW float tensor `[1, 3, h, w]`.
pub fn to_input(image: &RgbImage, norm: &Normalization) -> Array4<f32> {
    let (width, height) = image.dimensions();
    Array4::from_shape_fn(
        (1, 3, height as usize, width as usize),
        |(_, c, y, x)| {
            let value = image.get_pixel(x as u32, y as u32)[c] as f32 / 255.0;
            (value - norm.mean[c]) / norm.std[c]
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const IDENTITY: Normalization = Normalization {
        mean: [0.0, 0.0, 0.0],
        std: [1.0, 1.0, 1.0],
    };

    #[test]
    fn square_image_fills_canvas() {
        let img = RgbImage::from_pixel(100, 100, Rgb([255, 0, 0]));

        let boxed = letterbox(&img, 224);

        assert_eq!(boxed.dimensions(), (224, 224));
        assert_eq!(boxed.get_pixel(0, 0), &Rgb([255, 0, 0]));
        assert_eq!(boxed.get_pixel(223, 223), &Rgb([255, 0, 0]));
    }

    #[test]
    fn wide_image_is_centred_with_padding() {
        let img = RgbImage::from_pixel(200, 100, Rgb([255, 0, 0]));

        let boxed = letterbox(&img, 224);

        // 200x100 scales to 224x112, leaving 56 rows above and below
        assert_eq!(boxed.get_pixel(112, 112), &Rgb([255, 0, 0]));
        assert_eq!(boxed.get_pixel(112, 10), &Rgb([0, 0, 0]));
        assert_eq!(boxed.get_pixel(112, 213), &Rgb([0, 0, 0]));
    }

    #[test]
    fn extreme_aspect_ratio_keeps_one_pixel() {
        let img = RgbImage::from_pixel(4000, 1, Rgb([9, 9, 9]));

        let boxed = letterbox(&img, 32);

        assert_eq!(boxed.dimensions(), (32, 32));
    }

    #[test]
    fn tensor_is_nchw_and_normalised() {
        let img = RgbImage::from_pixel(4, 2, Rgb([255, 0, 128]));

        let input = to_input(&img, &IDENTITY);

        assert_eq!(input.shape(), &[1, 3, 2, 4]);
        assert_eq!(input[[0, 0, 1, 3]], 1.0);
        assert_eq!(input[[0, 1, 0, 0]], 0.0);
        assert!((input[[0, 2, 0, 0]] - 128.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn imagenet_normalisation_is_applied_per_channel() {
        let img = RgbImage::from_pixel(1, 1, Rgb([255, 255, 255]));
        let norm = Normalization {
            mean: [0.485, 0.456, 0.406],
            std: [0.229, 0.224, 0.225],
        };

        let input = to_input(&img, &norm);

        assert!((input[[0, 0, 0, 0]] - (1.0 - 0.485) / 0.229).abs() < 1e-5);
        assert!((input[[0, 2, 0, 0]] - (1.0 - 0.406) / 0.225).abs() < 1e-5);
    }
}
