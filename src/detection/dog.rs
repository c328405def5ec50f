//! Difference-of-Gaussians band-pass filter, applied slice by slice.

use crate::geom::{IntensityVolume, Shape, Volume};

/// Normalized 1D Gaussian kernel with radius `ceil(3σ)`.
pub fn gaussian_kernel_1d(sigma: f32) -> Vec<f32> {
    let radius = (3.0 * sigma).ceil().max(0.0) as usize;
    let size = 2 * radius + 1;
    let mut kernel = vec![0.0f32; size];

    let two_sigma_sq = 2.0 * sigma * sigma;
    let mut sum = 0.0f32;

    for (i, k) in kernel.iter_mut().enumerate() {
        let x = i as f32 - radius as f32;
        let value = (-x * x / two_sigma_sq).exp();
        *k = value;
        sum += value;
    }

    for v in &mut kernel {
        *v /= sum;
    }

    kernel
}

/// Separable Gaussian blur of every XY slice. Edges are replicated.
pub fn gaussian_blur_2d(volume: &IntensityVolume, sigma: f32) -> IntensityVolume {
    let shape = volume.shape();
    if shape.is_empty() {
        return volume.clone();
    }
    let kernel = gaussian_kernel_1d(sigma);
    let radius = (kernel.len() / 2) as isize;
    let Shape { width, height, .. } = shape;
    let plane = width * height;

    let src = volume.as_slice();
    let mut tmp = vec![0.0f32; src.len()];
    let mut out = vec![0.0f32; src.len()];

    for (slice_in, slice_tmp) in src.chunks(plane.max(1)).zip(tmp.chunks_mut(plane.max(1))) {
        for y in 0..height {
            let row = &slice_in[y * width..(y + 1) * width];
            for x in 0..width {
                let mut acc = 0.0f32;
                for (k, w) in kernel.iter().enumerate() {
                    let sx = clamp(x as isize + k as isize - radius, width);
                    acc += w * row[sx];
                }
                slice_tmp[y * width + x] = acc;
            }
        }
    }

    for (slice_tmp, slice_out) in tmp.chunks(plane.max(1)).zip(out.chunks_mut(plane.max(1))) {
        for y in 0..height {
            for x in 0..width {
                let mut acc = 0.0f32;
                for (k, w) in kernel.iter().enumerate() {
                    let sy = clamp(y as isize + k as isize - radius, height);
                    acc += w * slice_tmp[sy * width + x];
                }
                slice_out[y * width + x] = acc;
            }
        }
    }

    Volume::from_parts(shape, out)
}

#[inline]
fn clamp(i: isize, len: usize) -> usize {
    i.clamp(0, len as isize - 1) as usize
}

/// `blur(σ1) - blur(σ2)`: with `σ1 < σ2`, spots of about σ1 come out bright.
pub fn difference_of_gaussians(volume: &IntensityVolume, sigma1: f32, sigma2: f32) -> IntensityVolume {
    let narrow = gaussian_blur_2d(volume, sigma1);
    let wide = gaussian_blur_2d(volume, sigma2);
    let data = narrow
        .as_slice()
        .iter()
        .zip(wide.as_slice())
        .map(|(a, b)| a - b)
        .collect();
    Volume::from_parts(volume.shape(), data)
}
