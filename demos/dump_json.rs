use backprop_mlp::{Network, NetworkConfig};

const CONFIG: &str = r#"{
    "hidden_layer_count": 1,
    "hidden_layer_sizes": 3,
    "learning_rate": 0.3,
    "bias": [0.1, 0.0],
    "init": { "kind": "uniform", "low": -0.5, "high": 0.5 },
    "seed": 7
}"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config: NetworkConfig = serde_json::from_str(CONFIG)?;
    let mut net = Network::new(2, 1, config)?;
    net.learn_single(&[1.0, 0.0], &[1.0])?;

    println!("{}", net.dump()?);
    Ok(())
}
