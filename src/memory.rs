use num::{NumCast, Zero, Float};
use std::{
    fmt::{Debug, Display, LowerExp}, iter::Sum, ops::{Add, AddAssign, Sub, SubAssign}
};
use rand::distributions::uniform::SampleUniform;

/// Floating point type used for sample coordinates, centroids and distances.
pub trait Primitive: Add + AddAssign + Sum + Sub + SubAssign + Zero + Float + NumCast + SampleUniform
                + PartialOrd + Copy + Default + Display + Debug + Sync + Send + LowerExp + 'static
                + for<'a> AddAssign<&'a Self> + for<'a> Sub<&'a Self> {}
impl Primitive for f32 {}
impl Primitive for f64 {}

/// Squared euclidean distance between two equally long coordinate slices.
#[inline(always)]
pub(crate) fn squared_distance<T: Primitive>(a: &[T], b: &[T]) -> T {
    a.iter().zip(b.iter())
        .map(|(&av, &bv)| av - bv)      // <sample> - <centroid>
        .map(|v| v * v)                 // <vec_components> ^2
        .sum()
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn squared_distance_f32() { squared_distance_generic::<f32>(1e-6); }
    #[test]
    fn squared_distance_f64() { squared_distance_generic::<f64>(1e-12); }

    fn squared_distance_generic<T: Primitive>(tol: f64) {
        let a: Vec<T> = [1.0, 2.0, 3.0].iter().map(|&v| T::from(v).unwrap()).collect();
        let b: Vec<T> = [4.0, 6.0, 3.0].iter().map(|&v| T::from(v).unwrap()).collect();
        let d = squared_distance(&a, &b).to_f64().unwrap();
        assert_approx_eq!(d, 25.0, tol);
        assert_approx_eq!(squared_distance(&a, &a).to_f64().unwrap(), 0.0, tol);
    }
}
