//! Sample-wise float summation.
//!
//! The block paths process [`MIX_LANES`] samples per iteration over
//! fixed-width chunks, which the compiler lowers to SIMD adds, and hand the
//! tail to the scalar path. Every output sample is a single IEEE addition in
//! both paths, so results are bit-identical whichever path runs.

/// Samples processed per block iteration.
pub const MIX_LANES: usize = 8;

/// `dst[i] = a[i] + b[i]` over the common length of the three slices.
///
/// ```rust
/// use floatmix_core::mix_2;
///
/// let mut out = [0.0; 4];
/// mix_2(&mut out, &[1.0, 2.0, 3.0, 4.0], &[0.5; 4]);
/// assert_eq!(out, [1.5, 2.5, 3.5, 4.5]);
/// ```
#[inline]
pub fn mix_2(dst: &mut [f32], a: &[f32], b: &[f32]) {
    let n = dst.len().min(a.len()).min(b.len());
    let mut dst = dst[..n].chunks_exact_mut(MIX_LANES);
    let mut a = a[..n].chunks_exact(MIX_LANES);
    let mut b = b[..n].chunks_exact(MIX_LANES);

    for ((d, x), y) in dst.by_ref().zip(a.by_ref()).zip(b.by_ref()) {
        for i in 0..MIX_LANES {
            d[i] = x[i] + y[i];
        }
    }
    mix_2_scalar(dst.into_remainder(), a.remainder(), b.remainder());
}

/// `dst[i] += src[i]` over the common length of the two slices.
#[inline]
pub fn mix_accumulate(dst: &mut [f32], src: &[f32]) {
    let n = dst.len().min(src.len());
    let mut dst = dst[..n].chunks_exact_mut(MIX_LANES);
    let mut src = src[..n].chunks_exact(MIX_LANES);

    for (d, s) in dst.by_ref().zip(src.by_ref()) {
        for i in 0..MIX_LANES {
            d[i] += s[i];
        }
    }
    mix_accumulate_scalar(dst.into_remainder(), src.remainder());
}

/// Reference scalar form of [`mix_2`].
#[inline]
pub fn mix_2_scalar(dst: &mut [f32], a: &[f32], b: &[f32]) {
    for ((d, x), y) in dst.iter_mut().zip(a).zip(b) {
        *d = x + y;
    }
}

/// Reference scalar form of [`mix_accumulate`].
#[inline]
pub fn mix_accumulate_scalar(dst: &mut [f32], src: &[f32]) {
    for (d, s) in dst.iter_mut().zip(src) {
        *d += s;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(n: usize, scale: f32) -> Vec<f32> {
        (0..n).map(|i| (i as f32 * 0.37 - 3.0) * scale).collect()
    }

    #[test]
    fn block_and_scalar_paths_agree_bitwise() {
        for n in 0..=3 * MIX_LANES + 5 {
            let a = ramp(n, 1.1);
            let b = ramp(n, -0.7);

            let mut vec_out = vec![0.0; n];
            let mut ref_out = vec![0.0; n];
            mix_2(&mut vec_out, &a, &b);
            mix_2_scalar(&mut ref_out, &a, &b);
            assert_eq!(
                vec_out.iter().map(|x| x.to_bits()).collect::<Vec<_>>(),
                ref_out.iter().map(|x| x.to_bits()).collect::<Vec<_>>(),
                "n = {n}"
            );

            mix_accumulate(&mut vec_out, &a);
            mix_accumulate_scalar(&mut ref_out, &a);
            assert_eq!(vec_out, ref_out, "n = {n}");
        }
    }

    #[test]
    fn shortest_slice_bounds_the_mix() {
        let mut out = [9.0; 5];
        mix_2(&mut out, &[1.0, 1.0, 1.0], &[2.0; 5]);
        assert_eq!(out, [3.0, 3.0, 3.0, 9.0, 9.0]);

        mix_accumulate(&mut out, &[1.0]);
        assert_eq!(out[0], 4.0);
        assert_eq!(out[1], 3.0);
    }

    #[test]
    fn no_saturation() {
        let mut out = [0.0; 2];
        mix_2(&mut out, &[f32::MAX, 1.0], &[f32::MAX, -1.0]);
        assert!(out[0].is_infinite());
        assert_eq!(out[1], 0.0);
    }
}
