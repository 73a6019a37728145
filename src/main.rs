use anyhow::Context;

use mnist_track::logging::init_logging;
use mnist_track::pipeline::{Pipeline, TrainingConfig, load_datasets};
use mnist_track::tracking::TrackingClient;

fn main() -> anyhow::Result<()> {
    init_logging();

    let config = TrainingConfig::default();
    let tracking = TrackingClient::from_env().context("无法连接实验追踪后端")?;
    let (train, test) = load_datasets(&config).context("无法加载 MNIST 数据集")?;

    let report = Pipeline::new(config, tracking)
        .run(&train, &test)
        .context("训练流水线失败")?;

    println!("{}", report.accuracy_line());
    Ok(())
}
