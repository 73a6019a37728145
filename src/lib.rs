//! # mnist_track
//!
//! 用纯rust在MNIST上训练一个三层全连接分类器（Flatten → Dense(128, relu) → Dense(10, softmax)），
//! 训练过程中把参数、逐 epoch 指标和模型结构记录到实验追踪后端（本地 `./mlruns` 目录或 MLflow 服务），
//! 最后在本地保存模型、连同签名记录为 run 的 artifact，并报告测试集准确率。
//!

pub mod data;
pub mod errors;
pub mod logging;
pub mod nn;
pub mod pipeline;
pub mod signature;
pub mod tensor;
pub mod tracking;
