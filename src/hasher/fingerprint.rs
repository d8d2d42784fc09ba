use image::imageops::{self, FilterType};
use image::GrayImage;

/// Number of 16-bit bands a fingerprint splits into for cluster indexing.
pub const BAND_COUNT: usize = 4;

/// 64-bit perceptual fingerprint (difference hash).
///
/// The image is reduced to a 9×8 grayscale grid and each bit records the sign
/// of one horizontal gradient. Visually similar images land within a small
/// Hamming distance; byte-identical files always produce the same value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint(pub u64);

impl Fingerprint {
    /// Hamming distance in bits.
    pub fn distance(&self, other: &Fingerprint) -> u32 {
        (self.0 ^ other.0).count_ones()
    }

    pub fn is_within(&self, other: &Fingerprint, threshold: u32) -> bool {
        self.distance(other) <= threshold
    }

    /// One of the four 16-bit slices, used as a coarse bucket key.
    pub fn band(&self, index: usize) -> u16 {
        debug_assert!(index < BAND_COUNT);
        (self.0 >> (index * 16)) as u16
    }
}

/// Compute the difference hash of a grayscale image.
pub fn fingerprint(gray: &GrayImage) -> Fingerprint {
    let small = imageops::resize(gray, 9, 8, FilterType::Triangle);

    let mut bits: u64 = 0;
    let mut bit = 0;
    for y in 0..8 {
        for x in 0..8 {
            let left = small.get_pixel(x, y)[0];
            let right = small.get_pixel(x + 1, y)[0];
            if left < right {
                bits |= 1 << bit;
            }
            bit += 1;
        }
    }

    Fingerprint(bits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn ramp(width: u32, height: u32) -> GrayImage {
        GrayImage::from_fn(width, height, |x, _| {
            Luma([(x * 255 / width.max(1)) as u8])
        })
    }

    fn reverse_ramp(width: u32, height: u32) -> GrayImage {
        GrayImage::from_fn(width, height, |x, _| {
            Luma([255 - (x * 255 / width.max(1)) as u8])
        })
    }

    #[test]
    fn identical_images_identical_fingerprints() {
        let img = ramp(64, 64);
        assert_eq!(fingerprint(&img), fingerprint(&img));
    }

    #[test]
    fn resized_image_stays_close() {
        let large = ramp(128, 128);
        let small = ramp(32, 32);
        let d = fingerprint(&large).distance(&fingerprint(&small));
        assert!(d <= 6, "resized copies should be near-identical, got {}", d);
    }

    #[test]
    fn opposite_gradients_are_far_apart() {
        let a = fingerprint(&ramp(64, 64));
        let b = fingerprint(&reverse_ramp(64, 64));
        assert!(a.distance(&b) > 32);
    }

    #[test]
    fn distance_is_symmetric_and_zero_on_self() {
        let a = Fingerprint(0b1010_1100);
        let b = Fingerprint(0b0110_0001);
        assert_eq!(a.distance(&b), b.distance(&a));
        assert_eq!(a.distance(&a), 0);
        assert!(a.is_within(&a, 0));
    }

    #[test]
    fn bands_cover_all_bits() {
        let fp = Fingerprint(0x1111_2222_3333_4444);
        assert_eq!(fp.band(0), 0x4444);
        assert_eq!(fp.band(1), 0x3333);
        assert_eq!(fp.band(2), 0x2222);
        assert_eq!(fp.band(3), 0x1111);
    }
}
