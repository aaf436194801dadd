use crate::{AccuracyError, Deadline, KMeans, KMeansConfig, KMeansState, Result, memory::*};
use rand::RngCore;

pub(crate) struct Lloyd<T: Primitive> {
	_p: std::marker::PhantomData<T>
}
impl<T: Primitive> Lloyd<T> {
    fn update_centroids(data: &KMeans<'_, T>, state: &mut KMeansState<T>) -> T {
        let sample_dims = data.sample_dims;
        // Sum all samples in a cluster together into new_centroids
        // Count non-empty clusters
        let mut used_centroids_cnt = 0;
        let mut new_centroids = vec![T::zero(); state.centroids.len()];
        let mut new_distsum = T::zero();

        let (centroid_frequency, assignments, centroid_distances) = (&mut state.centroid_frequency, &state.assignments, &state.centroid_distances);
        rayon::scope(|s| {
            s.spawn(|_| {
				used_centroids_cnt = data.update_cluster_frequencies(assignments, centroid_frequency);
            });
            s.spawn(|_| {
                data.samples.chunks_exact(sample_dims)
                    .zip(assignments.iter().cloned())
                    .for_each(|(s, centroid_id)| {
                        new_centroids[centroid_id * sample_dims..(centroid_id + 1) * sample_dims].iter_mut()
                            .zip(s.iter())
                            .for_each(|(c, sv)| *c += sv);
                    });
            });
            s.spawn(|_| {
                new_distsum = centroid_distances.iter().cloned().sum();
            });
        });

        // Use used_centroids_cnt variable to check, whether there are empty clusters
        // When there are, assign bad samples to empty clusters
        if used_centroids_cnt != state.k {
            let mut distance_sorted_samples: Vec<usize> = (0..data.sample_cnt).collect();
            distance_sorted_samples.sort_by(
                |&i1, &i2| state.centroid_distances[i1].partial_cmp(&state.centroid_distances[i2])
                    .unwrap_or(std::cmp::Ordering::Equal));

            // Assign empty clusters
            for i in 0..state.k {
                if state.centroid_frequency[i] != 0 {
                    continue;
                }
                // Find the sample with the highest distance to its centroid, that is not alone in its cluster
                let candidate = distance_sorted_samples.iter().rev().cloned()
                    .find(|&sample_id| state.centroid_frequency[state.assignments[sample_id]] > 1);
                let sample_id = match candidate {
                    Some(sample_id) => sample_id,
                    None => break, // fewer samples than clusters
                };
                let prev_centroid_id = state.assignments[sample_id];
                // Re-Assign found sample to centroid without any samples
                state.centroid_frequency[prev_centroid_id] -= 1;
                state.centroid_frequency[i] += 1;
                new_distsum -= state.centroid_distances[sample_id];
                // Centroid is moved into the chosen point -> the points centroid distance is 0
                state.centroid_distances[sample_id] = T::zero();
                // new_centroids is a sum of all points within a centroid here.
                // Subtract chosen sample from its previous centroid
                let sample = data.sample(sample_id);
                new_centroids[prev_centroid_id * sample_dims..(prev_centroid_id + 1) * sample_dims].iter_mut()
                    .zip(sample.iter().cloned())
                    .for_each(|(cv, sv)| { *cv -= sv; });
                // Chosen sample is single point in cluster -> set cluster's sum to chosen point
                new_centroids[i * sample_dims..(i + 1) * sample_dims].copy_from_slice(sample);
                state.assignments[sample_id] = i;
            }
        }
        // Calculate new centroids from updated cluster_assignments
        state.centroids.chunks_exact_mut(sample_dims)
            .zip(new_centroids.chunks_exact(sample_dims))
            .zip(state.centroid_frequency.iter().cloned())
            .filter(|(_, cfreq)| *cfreq > 0)
            .for_each(|((c, nc), cfreq)| {
                let cfreq = T::from(cfreq).unwrap_or_else(T::one);
                c.iter_mut().zip(nc.iter()).for_each(|(cv, &ncv)| *cv = ncv / cfreq);
            });
        new_distsum
    }

    #[inline(always)] pub fn calculate<'s, F>(data: &KMeans<'s, T>, k: usize, max_iter: usize, init: F, config: &KMeansConfig<T>,
                rnd: &mut dyn RngCore, deadline: Option<&Deadline>) -> Result<KMeansState<T>>
                where F: FnOnce(&KMeans<'s, T>, &mut KMeansState<T>, &mut dyn RngCore) {
        if k == 0 {
            return Err(AccuracyError::InvalidClusterCount);
        }
        if k > data.sample_cnt {
            return Err(AccuracyError::DegenerateClustering { distinct: data.sample_cnt, k });
        }

        let mut state = KMeansState::new(data.sample_cnt, data.sample_dims, k);
        state.distsum = T::infinity();

        // Initialize clusters and notify subscriber
        init(data, &mut state, rnd);
        (config.init_done)(&state);
        let mut abort_strategy = config.abort_strategy.create_logic();

        for i in 1..=max_iter {
            data.update_cluster_assignments(&mut state, None);
            let new_distsum = Self::update_centroids(data, &mut state);

			// Notify subscriber about finished iteration
			(config.iteration_done)(&state, i, new_distsum);
            tracing::trace!(iteration = i, distsum = %new_distsum, "lloyd iteration finished");
            if let Some(deadline) = deadline {
                deadline.check()?;
            }
            if !abort_strategy.next(new_distsum) {
                break;
            }
            state.distsum = new_distsum;
        }

        data.update_centroid_distances(&mut state);
        state.distsum = state.centroid_distances.iter().cloned().sum();
        Ok(state)
    }
}




#[cfg(test)]
mod tests {
    use super::*;
    use crate::KMeansInit;
    use rand::prelude::*;

    fn two_blobs() -> Vec<f64> {
        vec![
            0.0, 0.0, 0.2, 0.0, 0.0, 0.2, 0.2, 0.2,
            5.0, 5.0, 5.2, 5.0, 5.0, 5.2, 5.2, 5.2,
        ]
    }

    #[test]
    fn separates_two_blobs() {
        let samples = two_blobs();
        let kmean = KMeans::new(&samples, 8, 2).unwrap();
        for init in [KMeansInit::KMeanPlusPlus, KMeansInit::RandomSample].iter() {
            let mut rnd = StdRng::seed_from_u64(1);
            let conf = KMeansConfig::<f64>::build().abort_strategy(crate::AbortStrategy::Never).build();
            let res = kmean.kmeans_lloyd(2, 20, |km, st, rnd| init.apply(km, st, rnd), &conf, &mut rnd, None).unwrap();

            assert!(res.assignments[..4].iter().all(|&a| a == res.assignments[0]));
            assert!(res.assignments[4..].iter().all(|&a| a == res.assignments[4]));
            assert_ne!(res.assignments[0], res.assignments[4]);
            assert_eq!(res.centroid_frequency, vec![4, 4]);
            // each point is 0.1 away from its centroid in both dimensions
            assert_approx_eq!(res.distsum, 8.0 * 0.02, 1e-12);
        }
    }

    #[test]
    fn iris_petals_f64() {
        let samples = vec![1.4f64, 0.2, 1.4, 0.2, 1.3, 0.2, 1.5, 0.2, 1.4, 0.2, 1.7, 0.4, 1.4, 0.3, 1.5, 0.2, 1.4, 0.2, 1.5, 0.1, 1.5, 0.2, 1.6, 0.2, 1.4, 0.1, 1.1, 0.1, 1.2, 0.2, 1.5, 0.4, 1.3, 0.4, 1.4, 0.3, 1.7, 0.3, 1.5, 0.3, 1.7, 0.2, 1.5, 0.4, 1.0, 0.2, 1.7, 0.5, 1.9, 0.2, 1.6, 0.2, 1.6, 0.4, 1.5, 0.2, 1.4, 0.2, 1.6, 0.2, 1.6, 0.2, 1.5, 0.4, 1.5, 0.1, 1.4, 0.2, 1.5, 0.2, 1.2, 0.2, 1.3, 0.2, 1.4, 0.1, 1.3, 0.2, 1.5, 0.2, 1.3, 0.3, 1.3, 0.3, 1.3, 0.2, 1.6, 0.6, 1.9, 0.4, 1.4, 0.3, 1.6, 0.2, 1.4, 0.2, 1.5, 0.2, 1.4, 0.2, 4.7, 1.4, 4.5, 1.5, 4.9, 1.5, 4.0, 1.3, 4.6, 1.5, 4.5, 1.3, 4.7, 1.6, 3.3, 1.0, 4.6, 1.3, 3.9, 1.4, 3.5, 1.0, 4.2, 1.5, 4.0, 1.0, 4.7, 1.4, 3.6, 1.3, 4.4, 1.4, 4.5, 1.5, 4.1, 1.0, 4.5, 1.5, 3.9, 1.1, 4.8, 1.8, 4.0, 1.3, 4.9, 1.5, 4.7, 1.2, 4.3, 1.3, 4.4, 1.4, 4.8, 1.4, 5.0, 1.7, 4.5, 1.5, 3.5, 1.0, 3.8, 1.1, 3.7, 1.0, 3.9, 1.2, 5.1, 1.6, 4.5, 1.5, 4.5, 1.6, 4.7, 1.5, 4.4, 1.3, 4.1, 1.3, 4.0, 1.3, 4.4, 1.2, 4.6, 1.4, 4.0, 1.2, 3.3, 1.0, 4.2, 1.3, 4.2, 1.2, 4.2, 1.3, 4.3, 1.3, 3.0, 1.1, 4.1, 1.3, 6.0, 2.5, 5.1, 1.9, 5.9, 2.1, 5.6, 1.8, 5.8, 2.2, 6.6, 2.1, 4.5, 1.7, 6.3, 1.8, 5.8, 1.8, 6.1, 2.5, 5.1, 2.0, 5.3, 1.9, 5.5, 2.1, 5.0, 2.0, 5.1, 2.4, 5.3, 2.3, 5.5, 1.8, 6.7, 2.2, 6.9, 2.3, 5.0, 1.5, 5.7, 2.3, 4.9, 2.0, 6.7, 2.0, 4.9, 1.8, 5.7, 2.1, 6.0, 1.8, 4.8, 1.8, 4.9, 1.8, 5.6, 2.1, 5.8, 1.6, 6.1, 1.9, 6.4, 2.0, 5.6, 2.2, 5.1, 1.5, 5.6, 1.4, 6.1, 2.3, 5.6, 2.4, 5.5, 1.8, 4.8, 1.8, 5.4, 2.1, 5.6, 2.4, 5.1, 2.3, 5.1, 1.9, 5.9, 2.3, 5.7, 2.5, 5.2, 2.3, 5.0, 1.9, 5.2, 2.0, 5.4, 2.3, 5.1, 1.8];
        let kmean = KMeans::new(&samples, 150, 2).unwrap();
        let mut rnd = StdRng::seed_from_u64(1);
        let res = kmean.kmeans_lloyd(3, 100, KMeans::init_kmeanplusplus, &KMeansConfig::default(), &mut rnd, None).unwrap();

        // Setosa petals are clearly separated from the rest
        assert!(res.assignments[..50].iter().all(|&a| a == res.assignments[0]));
        assert!(res.assignments[50..].iter().all(|&a| a != res.assignments[0]));
        assert_eq!(res.centroid_frequency[res.assignments[0]], 50);
        assert_eq!(res.centroid_frequency.iter().sum::<usize>(), 150);
        let recomputed: f64 = res.centroid_distances.iter().sum();
        assert_approx_eq!(res.distsum, recomputed, 1e-9);
        assert!(res.distsum < 40.0);
    }

    #[test]
    fn empty_cluster_handling() {
        let samples = vec![1.0, 0.0, 2.0, 0.0, 3.0, 0.0];
        let initial_centroids = [2.0, 0.0, 1337.0, 0.0];

        let kmean = KMeans::new(&samples, 3, 2).unwrap();
        let mut rnd = StdRng::seed_from_u64(1);
        let conf = KMeansConfig::default();

        let res = kmean.kmeans_lloyd(2, 1, |_: &KMeans<f64>, state: &mut KMeansState<f64>, _: &mut dyn RngCore| {
            state.centroids.copy_from_slice(&initial_centroids);
        }, &conf, &mut rnd, None).unwrap();
        assert_eq!(res.distsum, 0.5);
        assert_eq!(&res.assignments, &[0,0,1]);
        assert_eq!(&res.centroids, &[1.5, 0.0, 3.0, 0.0]);
        assert_eq!(&res.centroid_frequency, &[2,1]);
        assert_eq!(&res.centroid_distances, &[0.25, 0.25, 0.0]);
    }

    #[test]
    fn too_few_samples() {
        let samples = vec![1.0f64, 2.0];
        let kmean = KMeans::new(&samples, 2, 1).unwrap();
        let mut rnd = StdRng::seed_from_u64(1);
        let conf = KMeansConfig::default();
        assert_eq!(
            kmean.kmeans_lloyd(3, 10, KMeans::init_random_sample, &conf, &mut rnd, None).unwrap_err(),
            AccuracyError::DegenerateClustering { distinct: 2, k: 3 }
        );
        assert_eq!(
            kmean.kmeans_lloyd(0, 10, KMeans::init_random_sample, &conf, &mut rnd, None).unwrap_err(),
            AccuracyError::InvalidClusterCount
        );
    }

    #[test]
    fn callbacks_are_invoked() {
        use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
        let inits = Arc::new(AtomicUsize::new(0));
        let iterations = Arc::new(AtomicUsize::new(0));
        let (inits_cb, iterations_cb) = (inits.clone(), iterations.clone());
        let conf = KMeansConfig::<f64>::build()
            .init_done(move |_| { inits_cb.fetch_add(1, Ordering::SeqCst); })
            .iteration_done(move |_, nr, _| { iterations_cb.store(nr, Ordering::SeqCst); })
            .abort_strategy(crate::AbortStrategy::Never)
            .build();
        let samples = two_blobs();
        let kmean = KMeans::new(&samples, 8, 2).unwrap();
        kmean.kmeans_lloyd(2, 7, KMeans::init_random_sample, &conf, &mut StdRng::seed_from_u64(2), None).unwrap();
        assert_eq!(inits.load(Ordering::SeqCst), 1);
        assert_eq!(iterations.load(Ordering::SeqCst), 7);
    }
}
