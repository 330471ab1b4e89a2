//! # 遮罩目录模块
//!
//! ## 设计思路
//!
//! 每次请求都重新扫描遮罩目录并重新解码选中的遮罩，不做跨请求缓存，
//! 因此无需处理缓存失效；目录在运行期只读。
//!
//! ## 实现思路
//!
//! - `scan`：按 `<prefix>*.<ext>` 命名约定列出素材，按文件名排序，空集合即失败。
//! - `pick_from`：通过注入的 `RandomSource` 等概率选择一个条目并立即加载。
//! - 随机源抽象为 trait，生产使用线程本地 RNG，测试可注入固定种子。

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::source::MaskAsset;
use super::{MaskConfig, MaskError};

/// 随机选择策略。
///
/// 实现方需保证返回值落在 `0..len` 内；每次调用都是独立抽样。
pub trait RandomSource: Send + Sync {
    fn pick_index(&self, len: usize) -> usize;
}

/// 基于线程本地 RNG 的默认随机源。
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn pick_index(&self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }
}

/// 固定种子的随机源，用于测试与可复现的命令行调用。
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandom {
    fn pick_index(&self, len: usize) -> usize {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        rng.gen_range(0..len)
    }
}

/// 目录中的一个遮罩条目（尚未解码）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskEntry {
    pub identifier: String,
    path: PathBuf,
}

/// 遮罩目录。
#[derive(Debug, Clone)]
pub struct MaskCatalog {
    dir: PathBuf,
    prefix: String,
    extension: String,
}

impl MaskCatalog {
    pub fn new(config: &MaskConfig) -> Self {
        Self {
            dir: config.masks_dir.clone(),
            prefix: config.mask_prefix.clone(),
            extension: config.mask_extension.clone(),
        }
    }

    /// 列出当前可用的遮罩条目。
    ///
    /// 目录不存在与目录为空同样视为 `NoMasksAvailable`。
    pub fn scan(&self) -> Result<Vec<MaskEntry>, MaskError> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                log::warn!("⚠️ 遮罩目录不存在");
                return Err(MaskError::NoMasksAvailable);
            }
            Err(err) => {
                return Err(MaskError::Internal(format!("无法读取遮罩目录：{}", err.kind())));
            }
        };

        let mut masks: Vec<MaskEntry> = entries
            .flatten()
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| {
                let name = entry.file_name().to_str()?.to_string();
                self.matches_convention(&name).then(|| MaskEntry {
                    identifier: name,
                    path: entry.path(),
                })
            })
            .collect();

        if masks.is_empty() {
            return Err(MaskError::NoMasksAvailable);
        }

        masks.sort_by(|a, b| a.identifier.cmp(&b.identifier));
        log::debug!("🎭 扫描到 {} 个遮罩", masks.len());
        Ok(masks)
    }

    /// 从已扫描的条目中等概率选出一个并加载。
    pub fn pick_from(
        &self,
        entries: &[MaskEntry],
        random: &dyn RandomSource,
    ) -> Result<MaskAsset, MaskError> {
        if entries.is_empty() {
            return Err(MaskError::NoMasksAvailable);
        }

        let index = random.pick_index(entries.len()).min(entries.len() - 1);
        let entry = &entries[index];
        log::info!("🎭 选中遮罩：{}", entry.identifier);
        Self::load(&entry.identifier, &entry.path)
    }

    /// 扫描目录并随机选择一个遮罩。
    pub fn pick_mask(&self, random: &dyn RandomSource) -> Result<MaskAsset, MaskError> {
        let entries = self.scan()?;
        self.pick_from(&entries, random)
    }

    fn matches_convention(&self, name: &str) -> bool {
        let Some(stem) = name.strip_prefix(self.prefix.as_str()) else {
            return false;
        };
        Path::new(stem)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext == self.extension)
    }

    /// 解码遮罩并提取透明通道。
    fn load(identifier: &str, path: &Path) -> Result<MaskAsset, MaskError> {
        let decoded = image::open(path).map_err(|e| {
            log::error!("❌ 遮罩解码失败 - {}: {}", identifier, e);
            MaskError::MaskUnreadable(identifier.to_string())
        })?;

        let rgba = decoded.to_rgba8();
        let (width, height) = rgba.dimensions();
        if width == 0 || height == 0 {
            return Err(MaskError::MaskUnreadable(identifier.to_string()));
        }

        let alpha: Vec<u8> = rgba.pixels().map(|pixel| pixel.0[3]).collect();

        Ok(MaskAsset {
            identifier: identifier.to_string(),
            width,
            height,
            alpha,
        })
    }
}
