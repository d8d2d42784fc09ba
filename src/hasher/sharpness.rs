use image::imageops::{self, FilterType};
use image::GrayImage;
use std::borrow::Cow;

/// Working size cap; sharpness is a relative tie-breaker, so convolving the
/// full sensor resolution buys nothing.
const MAX_WORKING_DIM: u32 = 512;

/// Sharpness score: variance of a 3×3 Laplacian response over the grayscale
/// image. Higher means more edge energy; a blurred copy of the same photo
/// scores lower than the original.
pub fn laplacian_variance(gray: &GrayImage) -> f64 {
    let gray: Cow<GrayImage> = if gray.width() > MAX_WORKING_DIM || gray.height() > MAX_WORKING_DIM
    {
        let scale = MAX_WORKING_DIM as f64 / gray.width().max(gray.height()) as f64;
        let w = ((gray.width() as f64 * scale) as u32).max(3);
        let h = ((gray.height() as f64 * scale) as u32).max(3);
        Cow::Owned(imageops::resize(gray, w, h, FilterType::Triangle))
    } else {
        Cow::Borrowed(gray)
    };

    let (w, h) = (gray.width(), gray.height());
    if w < 3 || h < 3 {
        return 0.0;
    }

    let mut responses: Vec<f64> = Vec::with_capacity(((w - 2) * (h - 2)) as usize);
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let center = gray.get_pixel(x, y)[0] as f64;
            let up = gray.get_pixel(x, y - 1)[0] as f64;
            let down = gray.get_pixel(x, y + 1)[0] as f64;
            let left = gray.get_pixel(x - 1, y)[0] as f64;
            let right = gray.get_pixel(x + 1, y)[0] as f64;
            responses.push(4.0 * center - up - down - left - right);
        }
    }

    let n = responses.len() as f64;
    let mean = responses.iter().sum::<f64>() / n;
    responses.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn flat_image_has_zero_sharpness() {
        let img = GrayImage::from_pixel(32, 32, Luma([128]));
        assert_eq!(laplacian_variance(&img), 0.0);
    }

    #[test]
    fn checkerboard_sharper_than_gradient() {
        let checker = GrayImage::from_fn(32, 32, |x, y| {
            if (x + y) % 2 == 0 {
                Luma([255])
            } else {
                Luma([0])
            }
        });
        let gradient = GrayImage::from_fn(32, 32, |x, _| Luma([(x * 8) as u8]));
        assert!(laplacian_variance(&checker) > laplacian_variance(&gradient));
    }

    #[test]
    fn tiny_image_does_not_panic() {
        let img = GrayImage::from_pixel(2, 2, Luma([10]));
        assert_eq!(laplacian_variance(&img), 0.0);
    }
}
