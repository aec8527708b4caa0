use crate::rng::lattice_hash;

#[inline]
fn fade(t: f32) -> f32 {
    t * t * (3.0 - 2.0 * t)
}

#[inline]
fn corner(ix: i32, iy: i32, seed: u32) -> f32 {
    (lattice_hash(ix, iy, seed) >> 8) as f32 / 8388608.0 - 1.0
}

/// Smooth value noise in [-1, 1].
pub fn value_noise(x: f32, y: f32, seed: u32) -> f32 {
    let ix = x.floor() as i32;
    let iy = y.floor() as i32;
    let sx = fade(x - ix as f32);
    let sy = fade(y - iy as f32);

    let top = corner(ix, iy, seed) * (1.0 - sx) + corner(ix + 1, iy, seed) * sx;
    let bottom = corner(ix, iy + 1, seed) * (1.0 - sx) + corner(ix + 1, iy + 1, seed) * sx;
    top * (1.0 - sy) + bottom * sy
}

/// Sum of `octaves` layers, each at double frequency and half amplitude.
/// Normalised back to [-1, 1].
pub fn fractal(x: f32, y: f32, seed: u32, octaves: u32) -> f32 {
    let mut sum = 0.0;
    let mut norm = 0.0;
    let mut amp = 1.0;
    let mut freq = 1.0;
    for octave in 0..octaves {
        sum += value_noise(x * freq, y * freq, seed.wrapping_add(octave)) * amp;
        norm += amp;
        amp *= 0.5;
        freq *= 2.0;
    }
    if norm > 0.0 { sum / norm } else { 0.0 }
}
