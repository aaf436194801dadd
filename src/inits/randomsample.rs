use crate::memory::*;
use crate::{KMeans, KMeansState};
use rand::prelude::*;

#[inline(always)]
pub fn calculate<T: Primitive>(kmean: &KMeans<'_, T>, state: &mut KMeansState<T>, rnd: &mut dyn RngCore) {
    kmean.samples.chunks_exact(kmean.sample_dims)
		.choose_multiple(rnd, state.k).into_iter()
		.enumerate()
		.for_each(|(ci, c)| { // Copy randomly chosen centroids into state.centroids
			state.set_centroid_from_iter(ci, c.iter().cloned());
		});
}
