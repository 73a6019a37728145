//! 合成数字数据
//!
//! 每个类别对应一个固定的笔画模板（横线 + 竖线，位置随类别变化），
//! 再叠加随机噪声与轻微平移。同一 `seed` 总是生成完全相同的数据。

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::mnist::{IMAGE_SIDE, MnistDataset, NUM_CLASSES};
use crate::data::error::DataError;

impl MnistDataset {
    /// 生成 `len` 个可复现的合成样本，形状与取值范围同 MNIST
    pub fn synthetic(len: usize, seed: u64) -> Result<Self, DataError> {
        let mut rng = StdRng::seed_from_u64(seed);
        let sample_size = IMAGE_SIDE * IMAGE_SIDE;
        let mut pixels = vec![0u8; len * sample_size];
        let mut labels = Vec::with_capacity(len);

        for (i, image) in pixels.chunks_mut(sample_size).enumerate() {
            let label = (i + rng.gen_range(0..NUM_CLASSES)) % NUM_CLASSES;
            labels.push(label as u8);

            let shift = rng.gen_range(0..2usize);
            let row = 3 + 2 * label + shift;
            let col = 24 - 2 * label - shift;
            for (idx, pixel) in image.iter_mut().enumerate() {
                let (r, c) = (idx / IMAGE_SIDE, idx % IMAGE_SIDE);
                let horizontal = (r == row || r == row + 1) && (4..24).contains(&c);
                let vertical = c == col && (4..24).contains(&r);
                *pixel = if horizontal || vertical {
                    rng.gen_range(180..=255)
                } else {
                    rng.gen_range(0..30)
                };
            }
        }

        Self::from_raw(&pixels, &labels)
    }
}
