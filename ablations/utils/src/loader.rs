//! 对 `gt-berry` 数据模型的更一层封装. 提供更直接的标注导出加载器.

use crate::synth::{self, CrowdConfig};
use gt_berry::consts::DEFAULT_SEED;
use gt_berry::{LabelDump, LabelElement};
use std::env;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// 以 `$HOME/dataset` 为基础路径, 依次拼接 `it` 中的各项.
///
/// 无法获取 home 目录时返回 `None`.
pub fn home_dataset_dir_with<P: AsRef<Path>, I: IntoIterator<Item = P>>(it: I) -> Option<PathBuf> {
    let mut ans = dirs::home_dir()?;
    ans.push("dataset");
    ans.extend(it);
    Some(ans)
}

/// 获取标注导出文件路径.
///
/// 1. 若环境变量 `$MEDTAGGER_DUMP` 非空, 则返回其值;
/// 2. 否则, 返回 `$HOME/dataset/medtagger/labels.bin`.
pub fn dump_path_from_env_or_home() -> Option<PathBuf> {
    match env::var("MEDTAGGER_DUMP") {
        Ok(d) if !d.is_empty() => Some(PathBuf::from(d)),
        _ => home_dataset_dir_with(["medtagger", "labels.bin"]),
    }
}

/// 随机种子. 取自环境变量 `$GT_BERRY_SEED`, 缺省或无法解析时为 [`DEFAULT_SEED`].
pub fn seed_from_env() -> u64 {
    env::var("GT_BERRY_SEED")
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(DEFAULT_SEED)
}

/// 从 `path` 读取 bincode 编码的 [`LabelDump`], 并重新链接为标注元素.
pub fn load_dump<P: AsRef<Path>>(path: P) -> Result<Vec<LabelElement>, Box<dyn std::error::Error>> {
    let reader = BufReader::new(File::open(path)?);
    let dump: LabelDump = bincode::deserialize_from(reader)?;
    Ok(dump.into_elements()?)
}

/// 把 `elements` 以 bincode 编码写入 `path`.
pub fn save_dump<P: AsRef<Path>>(
    path: P,
    elements: &[LabelElement],
) -> Result<(), Box<dyn std::error::Error>> {
    let file = File::create(path)?;
    bincode::serialize_into(file, &LabelDump::from_elements(elements))?;
    Ok(())
}

/// 标注元素的来源.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Source {
    /// 从导出文件加载.
    Dump(PathBuf),
    /// 以给定种子合成.
    Synthetic(u64),
}

/// 加载标注元素.
///
/// 导出文件存在时从中加载, 否则以 `$GT_BERRY_SEED` 合成一批众包标注.
pub fn elements_from_env_or_synthetic() -> (Source, Vec<LabelElement>) {
    if let Some(p) = dump_path_from_env_or_home().filter(|p| p.is_file()) {
        let elements = load_dump(&p)
            .unwrap_or_else(|e| panic!("Loading label dump `{}` error: {e}", p.display()));
        return (Source::Dump(p), elements);
    }

    let seed = seed_from_env();
    let elements = synth::crowd(&CrowdConfig::default(), seed);
    (Source::Synthetic(seed), elements)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dump_file_round_trip() {
        let elements = synth::crowd(&CrowdConfig::default(), 3);
        let path = env::temp_dir().join(format!("gt-berry-dump-{}.bin", std::process::id()));

        save_dump(&path, &elements).unwrap();
        let loaded = load_dump(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(loaded.len(), elements.len());
        for (a, b) in loaded.iter().zip(elements.iter()) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.owner(), b.owner());
            assert_eq!(a.shape, b.shape);
            assert_eq!(a.slice_id().unwrap(), b.slice_id().unwrap());
        }
    }

    #[test]
    fn test_missing_dump() {
        assert!(load_dump("/definitely/not/here/labels.bin").is_err());
    }
}
