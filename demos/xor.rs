use backprop_mlp::{Dataset, Network, NetworkConfig, TrainConfig};

fn main() -> backprop_mlp::Result<()> {
    // RUST_LOG=info shows training progress.
    tracing_subscriber::fmt::init();

    let xs = vec![
        vec![0.0, 0.0],
        vec![0.0, 1.0],
        vec![1.0, 0.0],
        vec![1.0, 1.0],
    ];
    let ys = vec![vec![0.0], vec![1.0], vec![1.0], vec![0.0]];
    let train = Dataset::from_rows(&xs, &ys)?;

    // Default topology: 2 -> 2 -> 2 -> 1, learning rate 0.5.
    let mut net = Network::new(
        2,
        1,
        NetworkConfig {
            seed: Some(10),
            ..Default::default()
        },
    )?;

    let report = net.learn_with(
        &train,
        TrainConfig {
            iterations: net.iterations(),
            log_every: Some(200),
            ..Default::default()
        },
    )?;

    let error = net.evaluate(&train)?;
    println!(
        "epochs={} final_error={} train_error={}",
        report.epochs, report.final_error, error
    );

    let mut scratch = net.scratch();
    let mut out = [0.0_f64; 1];
    for x in xs {
        net.predict_into(&x, &mut scratch, &mut out)?;
        println!("x={x:?} y={:.4}", out[0]);
    }

    Ok(())
}
