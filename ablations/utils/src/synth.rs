//! 合成的众包标注. 在没有真实导出时用于跑通消融实验.
//!
//! 每次扫描的一部分切片上有一个 "真实" 目标 (矩形区域). 标注者分为三类:
//!
//! - 认真的: 在所有有目标的切片上标注, 只有少量抖动;
//! - 懒惰的: 只标注部分有目标的切片;
//! - 嘈杂的: 随机地在任意切片上标注随机区域.
//!
//! 偶数编号的扫描使用矩形标注, 奇数编号的扫描使用链 (多边形) 标注.

use gt_berry::{
    Chain, ElementId, Label, LabelElement, LabelId, Rectangle, Scan, ScanId, Shape, UserId,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

/// 合成参数.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CrowdConfig {
    /// 扫描个数.
    pub scans: u64,
    /// 每次扫描的切片数.
    pub slices: usize,
    /// 切片像素宽度.
    pub width: u32,
    /// 切片像素高度.
    pub height: u32,
    /// 认真的标注者人数.
    pub careful: u64,
    /// 懒惰的标注者人数.
    pub lazy: u64,
    /// 嘈杂的标注者人数.
    pub noisy: u64,
    /// 切片上有目标的概率.
    pub target_ratio: f64,
}

impl Default for CrowdConfig {
    fn default() -> Self {
        Self {
            scans: 4,
            slices: 12,
            width: 64,
            height: 48,
            careful: 3,
            lazy: 2,
            noisy: 2,
            target_ratio: 0.6,
        }
    }
}

/// 标注者类别.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Persona {
    /// 认真的.
    Careful,
    /// 懒惰的.
    Lazy,
    /// 嘈杂的.
    Noisy,
}

impl CrowdConfig {
    /// 所有标注者及其类别. 标识从 1 开始连续编号.
    pub fn users(&self) -> Vec<(UserId, Persona)> {
        let personas = [
            (self.careful, Persona::Careful),
            (self.lazy, Persona::Lazy),
            (self.noisy, Persona::Noisy),
        ];
        personas
            .into_iter()
            .flat_map(|(n, p)| std::iter::repeat(p).take(n as usize))
            .enumerate()
            .map(|(i, p)| (UserId(i as u64 + 1), p))
            .collect()
    }
}

/// 以 `seed` 合成一批标注元素. 相同参数与种子得到相同结果.
pub fn crowd(config: &CrowdConfig, seed: u64) -> Vec<LabelElement> {
    let mut rng = StdRng::seed_from_u64(seed);
    let users = config.users();
    let mut next_element = 0u64;
    let mut elements = vec![];

    for s in 0..config.scans {
        let scan = Arc::new(Scan::new(
            ScanId(s),
            config.slices,
            config.width,
            config.height,
        ));
        let as_chain = s % 2 == 1;
        let targets: Vec<Option<Rectangle>> = (0..config.slices)
            .map(|_| rng.gen_bool(config.target_ratio).then(|| random_rect(&mut rng)))
            .collect();

        for &(user, persona) in users.iter() {
            let label = Arc::new(
                Label::new(LabelId(s * 1000 + user.0), user, scan.clone())
                    .with_labeling_time(rng.gen_range(30.0..300.0)),
            );
            for (index, target) in targets.iter().enumerate() {
                let Some(rect) = annotate(persona, *target, &mut rng) else {
                    continue;
                };
                let shape = if as_chain {
                    Shape::Chain(to_polygon(&rect))
                } else {
                    Shape::Rectangle(rect)
                };
                next_element += 1;
                elements.push(LabelElement::new(
                    ElementId(next_element),
                    label.clone(),
                    index,
                    shape,
                ));
            }
        }
    }
    log::info!(
        "synthesized {} elements from {} users over {} scans",
        elements.len(),
        users.len(),
        config.scans
    );
    elements
}

/// 一位标注者在一张切片上的标注. `None` 表示不标注.
fn annotate(persona: Persona, target: Option<Rectangle>, rng: &mut StdRng) -> Option<Rectangle> {
    match (persona, target) {
        (Persona::Careful, Some(t)) => Some(jitter(&t, 0.01, rng)),
        (Persona::Lazy, Some(t)) if rng.gen_bool(0.4) => Some(jitter(&t, 0.02, rng)),
        (Persona::Noisy, _) if rng.gen_bool(0.5) => Some(random_rect(rng)),
        _ => None,
    }
}

/// 归一化坐标内的随机矩形.
fn random_rect(rng: &mut StdRng) -> Rectangle {
    let width = rng.gen_range(0.15..0.4);
    let height = rng.gen_range(0.15..0.4);
    let x = rng.gen_range(0.0..1.0 - width);
    let y = rng.gen_range(0.0..1.0 - height);
    Rectangle::new(x, y, width, height)
}

/// 为矩形的每个坐标加上 `[-amount, amount]` 内的抖动, 并保持在 `[0, 1]` 内.
fn jitter(r: &Rectangle, amount: f64, rng: &mut StdRng) -> Rectangle {
    let mut d = || rng.gen_range(-amount..=amount);
    let x = (r.x + d()).clamp(0.0, 1.0);
    let y = (r.y + d()).clamp(0.0, 1.0);
    let width = (r.width + d()).clamp(0.0, 1.0 - x);
    let height = (r.height + d()).clamp(0.0, 1.0 - y);
    Rectangle::new(x, y, width, height)
}

/// 矩形的四个角组成的闭合链.
fn to_polygon(r: &Rectangle) -> Chain {
    let [x1, y1, x2, y2] = r.corners();
    Chain::new(vec![(x1, y1), (x2, y1), (x2, y2), (x1, y2)], true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gt_berry::ShapeKind;

    #[test]
    fn test_users() {
        let users = CrowdConfig::default().users();
        assert_eq!(users.len(), 7);
        assert_eq!(users[0], (UserId(1), Persona::Careful));
        assert_eq!(users[3], (UserId(4), Persona::Lazy));
        assert_eq!(users[6], (UserId(7), Persona::Noisy));
    }

    #[test]
    fn test_crowd_is_reproducible() {
        let config = CrowdConfig::default();
        let a = crowd(&config, 5);
        let b = crowd(&config, 5);
        assert!(!a.is_empty());
        assert_eq!(a.len(), b.len());
        assert!(a.iter().zip(b.iter()).all(|(x, y)| x.shape == y.shape));
    }

    #[test]
    fn test_crowd_shapes_are_homogeneous_per_scan() {
        let elements = crowd(&CrowdConfig::default(), 9);
        for e in elements.iter() {
            let expected = if e.scan().id.0 % 2 == 1 {
                ShapeKind::Chain
            } else {
                ShapeKind::Rectangle
            };
            assert_eq!(e.kind(), expected);
            assert!(e.slice().is_ok());
            assert!(e.label.labeling_time.is_some());
        }
    }
}
