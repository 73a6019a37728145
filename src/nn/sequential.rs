/*
 * @Author       : 老董
 * @Description  : 顺序模型：按顺序堆叠的层 + compile/fit/predict/evaluate
 */

use std::path::Path;
use std::time::Instant;

use ndarray::ArrayD;

use super::layer::{Activation, Dense, Flatten, Layer, LayerKind, Parameter, to_matrix};
use super::{
    CompileOptions, EpochLogs, Evaluation, FitOptions, History, Model, ModelError, Optimizer,
    TrainBegin, TrainingCallback,
};
use crate::data::{DataLoader, TensorDataset};
use crate::tensor::Tensor;

/// predict/evaluate 时每次前向传播的样本数
pub const INFERENCE_BATCH_SIZE: usize = 32;

/// 一次 train_on_batch 的统计
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchStats {
    /// batch 平均损失
    pub loss: f32,
    pub correct: usize,
    pub samples: usize,
}

#[derive(Debug)]
struct Compiled {
    options: CompileOptions,
    optimizer: Box<dyn Optimizer>,
}

#[derive(Debug)]
pub struct Sequential {
    /// 单个样本的形状（不含 batch 维度）
    input_shape: Vec<usize>,
    layers: Vec<LayerKind>,
    compiled: Option<Compiled>,
}

impl Sequential {
    pub fn new(input_shape: &[usize]) -> Self {
        Self {
            input_shape: input_shape.to_vec(),
            layers: Vec::new(),
            compiled: None,
        }
    }

    /// 追加一层，层的输入形状须与当前模型的输出形状一致，层名须唯一
    pub fn add(mut self, layer: impl Into<LayerKind>) -> Result<Self, ModelError> {
        if self.compiled.is_some() {
            return Err(ModelError::AlreadyCompiled);
        }
        let layer = layer.into();
        if self.layers.iter().any(|l| l.name() == layer.name()) {
            return Err(ModelError::InvalidArgument(format!(
                "层名 {} 重复",
                layer.name()
            )));
        }
        layer.output_shape(&self.output_shape()?)?;
        self.layers.push(layer);
        Ok(self)
    }

    /// Flatten -> Dense(hidden_units, relu) -> Dense(num_classes, softmax)
    ///
    /// 两个 Dense 层分别以`seed`和`seed + 1`初始化。
    pub fn mnist_mlp(
        input_shape: &[usize],
        hidden_units: usize,
        num_classes: usize,
        seed: u64,
    ) -> Result<Self, ModelError> {
        if hidden_units == 0 || num_classes == 0 {
            return Err(ModelError::InvalidArgument(
                "hidden_units 与 num_classes 须大于 0".to_string(),
            ));
        }
        let flat: usize = input_shape.iter().product();
        Self::new(input_shape)
            .add(Flatten::new("flatten", input_shape))?
            .add(Dense::new_seeded(
                "dense",
                flat,
                hidden_units,
                Activation::Relu,
                seed,
            ))?
            .add(Dense::new_seeded(
                "dense_1",
                hidden_units,
                num_classes,
                Activation::Softmax,
                seed.wrapping_add(1),
            ))
    }

    /// 绑定优化器、损失与指标；每个模型只能编译一次
    pub fn compile(&mut self, options: CompileOptions) -> Result<(), ModelError> {
        if self.compiled.is_some() {
            return Err(ModelError::AlreadyCompiled);
        }
        if self.layers.is_empty() {
            return Err(ModelError::NoLayers);
        }
        options.optimizer.validate()?;
        self.compiled = Some(Compiled {
            options,
            optimizer: options.optimizer.build(),
        });
        Ok(())
    }

    pub fn is_compiled(&self) -> bool {
        self.compiled.is_some()
    }

    pub fn compile_options(&self) -> Option<&CompileOptions> {
        self.compiled.as_ref().map(|c| &c.options)
    }

    pub fn input_shape(&self) -> &[usize] {
        &self.input_shape
    }

    pub fn layers(&self) -> &[LayerKind] {
        &self.layers
    }

    /// 单个样本的输出形状
    pub fn output_shape(&self) -> Result<Vec<usize>, ModelError> {
        self.layers
            .iter()
            .try_fold(self.input_shape.clone(), |shape, layer| layer.output_shape(&shape))
    }

    /// 用一个 batch 做一次前向、反向与参数更新
    pub fn train_on_batch(&mut self, x: &Tensor, y: &Tensor) -> Result<BatchStats, ModelError> {
        self.check_input(x)?;
        let Self {
            layers, compiled, ..
        } = self;
        let compiled = compiled.as_mut().ok_or(ModelError::NotCompiled)?;

        let mut activations = Vec::with_capacity(layers.len() + 1);
        activations.push(x.view().to_owned());
        for (i, layer) in layers.iter().enumerate() {
            let out = layer.forward(&activations[i])?;
            activations.push(out);
        }

        let output = to_matrix(activations[layers.len()].view(), "模型输出")?;
        let targets = to_matrix(y.view(), "标签")?;
        if output.shape() != targets.shape() {
            return Err(ModelError::ShapeMismatch {
                expected: output.shape().to_vec(),
                got: targets.shape().to_vec(),
                message: "标签".to_string(),
            });
        }

        let samples = output.nrows();
        let CompileOptions { loss, metric, .. } = compiled.options;
        let batch_loss = loss.sum(&output, &targets) / samples.max(1) as f32;
        let correct = metric.count_correct(&output, &targets);
        let mut grad = loss.gradient(&output, &targets).into_dyn();

        for (i, layer) in layers.iter_mut().enumerate().rev() {
            grad = layer.backward(&activations[i], &activations[i + 1], &grad)?;
        }

        let params: Vec<Parameter<'_>> = layers
            .iter_mut()
            .flat_map(|layer| layer.parameters_mut())
            .collect();
        compiled.optimizer.step(params);

        Ok(BatchStats {
            loss: batch_loss,
            correct,
            samples,
        })
    }

    fn forward(&self, x: ArrayD<f32>) -> Result<ArrayD<f32>, ModelError> {
        self.layers
            .iter()
            .try_fold(x, |input, layer| layer.forward(&input))
    }

    fn check_input(&self, x: &Tensor) -> Result<(), ModelError> {
        let shape = x.shape();
        if shape.is_empty() || shape[1..] != self.input_shape[..] {
            return Err(ModelError::ShapeMismatch {
                expected: self.input_shape.clone(),
                got: shape.get(1..).unwrap_or_default().to_vec(),
                message: "输入样本".to_string(),
            });
        }
        Ok(())
    }

    fn check_fit_args(
        &self,
        train: &TensorDataset,
        options: &FitOptions<'_>,
    ) -> Result<(), ModelError> {
        if options.epochs == 0 {
            return Err(ModelError::InvalidArgument("epochs须大于0".to_string()));
        }
        if options.batch_size == 0 {
            return Err(ModelError::InvalidArgument("batch_size须大于0".to_string()));
        }
        if train.is_empty() {
            return Err(ModelError::EmptyDataset);
        }
        let output_shape = self.output_shape()?;
        for dataset in std::iter::once(train).chain(options.validation_data) {
            self.check_input(dataset.features())?;
            if dataset.labels().shape()[1..] != output_shape[..] {
                return Err(ModelError::ShapeMismatch {
                    expected: output_shape,
                    got: dataset.labels().shape()[1..].to_vec(),
                    message: "标签".to_string(),
                });
            }
        }
        Ok(())
    }
}

impl Model for Sequential {
    fn fit(
        &mut self,
        train: &TensorDataset,
        options: &FitOptions<'_>,
        callbacks: &mut [&mut dyn TrainingCallback],
    ) -> Result<History, ModelError> {
        let compile_options = *self
            .compile_options()
            .ok_or(ModelError::NotCompiled)?;
        self.check_fit_args(train, options)?;

        let summary = self.summary();
        let begin = TrainBegin {
            epochs: options.epochs,
            batch_size: options.batch_size,
            num_samples: train.len(),
            optimizer: &compile_options.optimizer,
            loss: compile_options.loss,
            metric: compile_options.metric,
            num_params: self.num_params(),
            summary: &summary,
        };
        for callback in callbacks.iter_mut() {
            callback.on_train_begin(&begin)?;
        }
        log::info!(
            "开始训练：{} 个样本，{} 个epoch，batch_size={}",
            train.len(),
            options.epochs,
            options.batch_size
        );

        let mut history = History::default();
        for epoch in 0..options.epochs {
            let start = Instant::now();
            let loader = DataLoader::new(train, options.batch_size)
                .shuffle(options.shuffle)
                .seed(options.seed.wrapping_add(epoch as u64));

            let mut loss_sum = 0.0f64;
            let mut correct = 0usize;
            for (x_batch, y_batch) in loader.iter() {
                let stats = self.train_on_batch(&x_batch, &y_batch)?;
                loss_sum += f64::from(stats.loss) * stats.samples as f64;
                correct += stats.correct;
            }

            let n = train.len();
            let (val_loss, val_accuracy) = match options.validation_data {
                Some(val) => {
                    let evaluation = self.evaluate(val.features(), val.labels())?;
                    (evaluation.loss, evaluation.accuracy)
                }
                None => (None, None),
            };
            let logs = EpochLogs {
                epoch,
                loss: (loss_sum / n as f64) as f32,
                accuracy: correct as f32 / n as f32,
                val_loss,
                val_accuracy,
                duration_secs: start.elapsed().as_secs_f32(),
            };
            log::info!(
                "Epoch {}/{}：loss={:.4} accuracy={:.4} val_loss={} val_accuracy={}（{:.1}s）",
                epoch + 1,
                options.epochs,
                logs.loss,
                logs.accuracy,
                fmt_optional(logs.val_loss),
                fmt_optional(logs.val_accuracy),
                logs.duration_secs
            );

            for callback in callbacks.iter_mut() {
                callback.on_epoch_end(&logs)?;
            }
            history.epochs.push(logs);
        }

        for callback in callbacks.iter_mut() {
            callback.on_train_end(&history)?;
        }
        Ok(history)
    }

    fn predict(&self, x: &Tensor) -> Result<Tensor, ModelError> {
        if self.layers.is_empty() {
            return Err(ModelError::NoLayers);
        }
        self.check_input(x)?;

        let output_shape = self.output_shape()?;
        let n = x.len();
        let mut outputs = Vec::with_capacity(n * output_shape.iter().product::<usize>());
        let mut start = 0;
        while start < n {
            let end = (start + INFERENCE_BATCH_SIZE).min(n);
            let out = self.forward(x.rows(start..end)?.into_array())?;
            outputs.extend(out.iter().copied());
            start = end;
        }

        let mut shape = vec![n];
        shape.extend(output_shape);
        Ok(Tensor::try_new(&outputs, &shape)?)
    }

    fn evaluate(&self, x: &Tensor, y: &Tensor) -> Result<Evaluation, ModelError> {
        let options = self.compile_options().ok_or(ModelError::NotCompiled)?;
        self.check_input(x)?;
        if y.dimension() != 2 || x.len() != y.len() {
            return Err(ModelError::ShapeMismatch {
                expected: vec![x.len()],
                got: y.shape().to_vec(),
                message: "标签须为 [N, num_classes] 且样本数与输入一致".to_string(),
            });
        }
        if x.is_empty() {
            return Ok(Evaluation::empty());
        }

        let predictions = self.predict(x)?;
        let p = to_matrix(predictions.view(), "模型输出")?;
        let t = to_matrix(y.view(), "标签")?;
        if p.shape() != t.shape() {
            return Err(ModelError::ShapeMismatch {
                expected: p.shape().to_vec(),
                got: t.shape().to_vec(),
                message: "标签".to_string(),
            });
        }

        let n = p.nrows();
        Ok(Evaluation {
            loss: Some(options.loss.sum(&p, &t) / n as f32),
            accuracy: Some(options.metric.count_correct(&p, &t) as f32 / n as f32),
            samples: n,
        })
    }

    fn save(&self, path: &Path) -> Result<(), ModelError> {
        self.save_to(path)
    }

    /// 逐层列出输出形状与参数量
    fn summary(&self) -> String {
        let rule = "_".repeat(65);
        let double_rule = "=".repeat(65);
        let mut lines = vec![
            "Model: \"sequential\"".to_string(),
            rule.clone(),
            format!(" {:<28}{:<26}{}", "Layer (type)", "Output Shape", "Param #"),
            double_rule.clone(),
        ];

        let mut shape = self.input_shape.clone();
        for layer in &self.layers {
            let shape_text = match layer.output_shape(&shape) {
                Ok(out) => {
                    let dims: Vec<String> = out.iter().map(ToString::to_string).collect();
                    shape = out;
                    format!("(None, {})", dims.join(", "))
                }
                Err(_) => "?".to_string(),
            };
            lines.push(format!(
                " {:<28}{:<26}{}",
                format!("{} ({})", layer.name(), layer.type_name()),
                shape_text,
                layer.num_params()
            ));
        }

        lines.push(double_rule);
        lines.push(format!("Total params: {}", self.num_params()));
        lines.push(rule);
        lines.join("\n")
    }

    fn num_params(&self) -> usize {
        self.layers.iter().map(Layer::num_params).sum()
    }
}

fn fmt_optional(value: Option<f32>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.4}"))
}
