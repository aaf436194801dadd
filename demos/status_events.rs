use cluster_accuracy::*;
use rand::prelude::*;
use std::time::Duration;

fn main() {
    let mut rnd = StdRng::seed_from_u64(1337);
    let points: PointSet<f64> = RandomClusterGenerator::new(8, 64, 2.0, SizeRange::default()).unwrap()
        .generate(&mut rnd).unwrap();

	let conf = KMeansConfig::<f64>::build()
		.init(KMeansInit::KMeanPlusPlus)
		.restarts(3)
		.max_iter(100)
		.time_limit(Duration::from_secs(5))
		.init_done(|_| println!("Initialization completed."))
		.iteration_done(|s, nr, new_distsum|
			println!("Iteration {} - Error: {:.2} -> {:.2} | Improvement: {:.2}",
				nr, s.distsum, new_distsum, s.distsum - new_distsum))
		.build();

    let state = KMeansAdapter::new(conf).fit(&points, 8, &mut rnd).unwrap();
    let result = score(points.true_labels(), &state.assignments, 8).unwrap();

    println!("Cluster sizes: {:?}", state.centroid_frequency);
    println!("Error: {}", state.distsum);
    println!("Accuracy: {:.3}", result.accuracy);
}
