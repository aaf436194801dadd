use crate::memory::*;
use rand::prelude::*;

/// Latin hypercube sample of `sample_cnt` points in `[0, 1)^sample_dims`.
///
/// ## Description
/// Every dimension is split into `sample_cnt` equally wide strata. Each stratum of each dimension holds exactly
/// one point, the strata are assigned to points by an independent random permutation per dimension, and the
/// position inside a stratum is uniformly jittered. Compared to plain uniform sampling, this keeps points
/// from clumping together along any single axis.
///
/// ## Returns
/// Sampled points [row-major] = [<point0>,<point1>,<point2>,...]
pub fn latin_hypercube<T: Primitive, R: Rng + ?Sized>(sample_cnt: usize, sample_dims: usize, rnd: &mut R) -> Vec<T> {
    let mut points = vec![T::zero(); sample_cnt * sample_dims];
    if sample_cnt == 0 {
        return points;
    }
    let strata_cnt = T::from(sample_cnt).unwrap_or_else(T::one);
    let mut strata: Vec<usize> = (0..sample_cnt).collect();
    for d in 0..sample_dims {
        strata.shuffle(rnd);
        points.iter_mut().skip(d).step_by(sample_dims)
            .zip(strata.iter().cloned())
            .for_each(|(p, stratum)| {
                let jitter = rnd.gen_range(T::zero()..T::one());
                *p = (T::from(stratum).unwrap_or_else(T::zero) + jitter) / strata_cnt;
            });
    }
    points
}
