use flipper_classifiers::config::PipelineConfig;
use flipper_classifiers::data_handling::{Dataset, Sample};
use flipper_classifiers::run_pipeline;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn main() {
    env_logger::init();

    // Three well separated species, 50 penguins each.
    let centers = [
        ("Adelie", [38.8, 18.3, 190.0, 3700.0]),
        ("Chinstrap", [48.8, 18.4, 196.0, 3730.0]),
        ("Gentoo", [47.5, 15.0, 217.0, 5080.0]),
    ];
    let spread = [2.5, 1.0, 6.5, 450.0];

    let mut rng = StdRng::seed_from_u64(2007);
    let mut samples = Vec::new();
    for (species, center) in centers.iter() {
        for _ in 0..50 {
            let mut features = [0.0; 4];
            for f in 0..4 {
                features[f] = center[f] + spread[f] * rng.gen_range(-1.0..1.0);
            }
            samples.push(Sample::new(*species, features));
        }
    }
    let dataset = Dataset::new(samples).expect("synthetic data is finite");

    let output = run_pipeline(&dataset, &PipelineConfig::default()).expect("pipeline failed");

    for outcome in output.results.iter() {
        match &outcome.result {
            Ok(result) => println!("{:<25} accuracy {:.3}", outcome.name, result.accuracy),
            Err(e) => println!("{:<25} failed: {}", outcome.name, e),
        }
    }
    match output.importance {
        Ok(ranked) => {
            for entry in ranked {
                println!("{:<20} {:.4}", entry.feature, entry.importance);
            }
        }
        Err(e) => println!("No feature importance: {}", e),
    }
}
