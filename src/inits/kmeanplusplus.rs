use crate::memory::*;
use crate::{KMeans, KMeansState};
use rand::distributions::WeightedIndex;
use rand::prelude::*;

#[inline(always)]
pub fn calculate<T: Primitive>(kmean: &KMeans<'_, T>, state: &mut KMeansState<T>, rnd: &mut dyn RngCore) {
    {
        // Randomly select first centroid
        let first_idx = rnd.gen_range(0..kmean.sample_cnt);
        state.set_centroid_from_iter(0, kmean.sample(first_idx).iter().cloned());
    }
    for k in 1..state.k {
        // For each following centroid...
        // Calculate distances & update cluster-assignments
        kmean.update_cluster_assignments(state, Some(k));

        // Draw the next centroid with a probability proportional to each sample's distance to its current centroid.
        // If all samples coincide with a centroid there is nothing to weight, fall back to a uniform draw.
        let sampled_centroid_id = match WeightedIndex::new(state.centroid_distances.iter().cloned()) {
            Ok(centroid_index) => centroid_index.sample(rnd),
            Err(_) => rnd.gen_range(0..kmean.sample_cnt),
        };
        state.set_centroid_from_iter(k, kmean.sample(sampled_centroid_id).iter().cloned());
    }
}
