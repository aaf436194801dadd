use cluster_accuracy::*;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Sweep dimensionality and spread for 4 and 8 clusters, 10 trials per cell
    let config = ExperimentConfig::default();
    let runner = ExperimentRunner::<f64, _>::new(config, KMeansAdapter::default())
        .expect("default configuration is valid");
    let table = runner.run().expect("k-means adapter only fails per trial");

    println!("{:>3} {:>4} {:>7} {:>9} {:>8}", "k", "dim", "sd_mult", "failures", "accuracy");
    for summary in table.summaries() {
        let accuracy = summary.mean_accuracy.map(|a| format!("{:.3}", a)).unwrap_or_else(|| "-".to_string());
        println!("{:>3} {:>4} {:>7.1} {:>9} {:>8}", summary.k, summary.dim, summary.sd_mult, summary.failures, accuracy);
    }

    table.write_csv(std::io::stderr()).expect("writing to stderr");
}
