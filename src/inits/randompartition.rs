use crate::memory::*;
use crate::{KMeans, KMeansState};
use rand::prelude::*;

#[inline(always)]
pub fn calculate<T: Primitive>(kmean: &KMeans<'_, T>, state: &mut KMeansState<T>, rnd: &mut dyn RngCore) {
	let (assignments, centroids, centroid_frequency, k) =
		(&mut state.assignments, &mut state.centroids, &mut state.centroid_frequency, state.k);

	centroid_frequency.iter_mut().for_each(|f| *f = 0);
	centroids.iter_mut().for_each(|c| *c = T::zero());
	assignments.iter_mut().for_each(|a| {
        *a = rnd.gen_range(0..k);
		centroid_frequency[*a] += 1;
	});
	kmean.samples.chunks_exact(kmean.sample_dims)
		.zip(assignments.iter().cloned())
		.for_each(|(sample, assignment)| {
			centroids.iter_mut().skip(kmean.sample_dims * assignment)
				.zip(sample.iter().cloned())
				.for_each(|(cv, sv)| *cv += sv);
		});
	// Partitions that got no sample keep a zero centroid, Lloyd's empty-cluster handling repairs them
	centroids.chunks_exact_mut(kmean.sample_dims)
		.zip(centroid_frequency.iter().cloned())
		.filter(|(_, freq)| *freq > 0)
		.for_each(|(c, freq)| {
			let freq = T::from(freq).unwrap_or_else(T::one);
			c.iter_mut().for_each(|cv| *cv = *cv / freq);
		});
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centroids_are_partition_means() {
        let samples: Vec<f64> = (0..60).map(|v| (v % 7) as f64).collect();
        let kmean = KMeans::new(&samples, 20, 3).unwrap();
        let mut state = KMeansState::new(20, 3, 4);
        calculate(&kmean, &mut state, &mut StdRng::seed_from_u64(4));

        assert_eq!(state.centroid_frequency.iter().sum::<usize>(), 20);
        for cluster in 0..4 {
            if state.centroid_frequency[cluster] == 0 {
                continue;
            }
            for d in 0..3 {
                let members: Vec<f64> = (0..20)
                    .filter(|&s| state.assignments[s] == cluster)
                    .map(|s| samples[s * 3 + d])
                    .collect();
                let mean = members.iter().sum::<f64>() / members.len() as f64;
                assert_approx_eq!(state.centroids[cluster * 3 + d], mean, 1e-12);
            }
        }
    }
}
