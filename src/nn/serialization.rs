/*
 * @Author       : 老董
 * @Description  : Sequential 模型的单文件保存与加载
 *
 * 文件格式：4 字节魔数 + u32（小端）版本号 + bincode 编码的模型记录
 * （输入形状、各层结构与权重、编译选项）。
 */

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::layer::LayerKind;
use super::{CompileOptions, ModelError, Sequential};

/// 模型文件魔数
const MODEL_MAGIC: &[u8; 4] = b"MNTM";
/// 模型文件版本
const MODEL_VERSION: u32 = 1;
/// 模型文件扩展名
pub const MODEL_FILE_EXTENSION: &str = "mntm";

#[derive(Serialize)]
struct ModelRecordRef<'a> {
    input_shape: &'a [usize],
    layers: &'a [LayerKind],
    compile: Option<&'a CompileOptions>,
}

#[derive(Deserialize)]
struct ModelRecord {
    input_shape: Vec<usize>,
    layers: Vec<LayerKind>,
    compile: Option<CompileOptions>,
}

impl Sequential {
    /// 编码为模型文件的完整字节内容
    pub fn to_bytes(&self) -> Result<Vec<u8>, ModelError> {
        let mut bytes = Vec::new();
        self.write_to(&mut bytes)?;
        Ok(bytes)
    }

    /// 从模型文件的完整字节内容解码
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ModelError> {
        Self::read_from(bytes)
    }

    /// 保存到文件，已存在时覆盖
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), ModelError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_to(&mut writer)?;
        writer.flush()?;
        log::debug!("模型已保存到 {}", path.display());
        Ok(())
    }

    /// 从文件加载；保存时已编译的模型加载后同样处于已编译状态（优化器状态不保存）
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
        let reader = BufReader::new(File::open(path.as_ref())?);
        Self::read_from(reader)
    }

    fn write_to<W: Write>(&self, mut writer: W) -> Result<(), ModelError> {
        writer.write_all(MODEL_MAGIC)?;
        writer.write_all(&MODEL_VERSION.to_le_bytes())?;
        let record = ModelRecordRef {
            input_shape: self.input_shape(),
            layers: self.layers(),
            compile: self.compile_options(),
        };
        bincode::serialize_into(writer, &record)?;
        Ok(())
    }

    fn read_from<R: Read>(mut reader: R) -> Result<Self, ModelError> {
        let mut magic = [0u8; 4];
        reader
            .read_exact(&mut magic)
            .map_err(|_| ModelError::InvalidFormat("文件过短，缺少魔数".to_string()))?;
        if &magic != MODEL_MAGIC {
            return Err(ModelError::InvalidFormat(
                "魔数不匹配，这不是本crate保存的模型文件".to_string(),
            ));
        }

        let mut version_bytes = [0u8; 4];
        reader
            .read_exact(&mut version_bytes)
            .map_err(|_| ModelError::InvalidFormat("文件过短，缺少版本号".to_string()))?;
        let version = u32::from_le_bytes(version_bytes);
        if version != MODEL_VERSION {
            return Err(ModelError::InvalidFormat(format!(
                "不支持的模型文件版本: {version}"
            )));
        }

        let record: ModelRecord = bincode::deserialize_from(reader)?;
        let mut model = record
            .layers
            .into_iter()
            .try_fold(Self::new(&record.input_shape), |model, layer| model.add(layer))?;
        if let Some(options) = record.compile {
            model.compile(options)?;
        }
        Ok(model)
    }
}
