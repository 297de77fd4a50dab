//! 实验结果.

use gt_berry::prelude::*;
use std::io::{self, Write};
use std::time::Duration;

/// 一个共识算法的运行结果.
pub struct Profile {
    /// 范围内的切片数.
    pub slices: usize,
    /// 有共识的切片数.
    pub with_consensus: usize,
    /// 生成真值的耗时.
    pub generation: Duration,
    /// 评估标注者的耗时.
    pub evaluation: Duration,
    /// 标注者评估.
    pub report: QualityReport,
    /// 平均标注耗时与得分的对照.
    pub time_vs_score: Vec<(UserId, f64, f64)>,
}

/// 将 `profile` 的结果写进 `w` 中.
fn describe_into<W: Write>(name: &str, p: &Profile, w: &mut W) -> io::Result<()> {
    const S4: &str = "    ";

    writeln!(w, "Profile `{name}`:")?;
    writeln!(w, "{S4}Slices in scope: {}", p.slices)?;
    writeln!(w, "{S4}Slices with consensus: {}", p.with_consensus)?;
    writeln!(w, "{S4}Generation time: {} us", p.generation.as_micros())?;
    writeln!(w, "{S4}Evaluation time: {} us", p.evaluation.as_micros())?;

    writeln!(w, "{S4}Users by score:")?;
    for q in p.report.ranking() {
        writeln!(
            w,
            "{S4}{S4}{}: score {:.6}, sensitivity {:.6} ({}/{}), specificity {:.6} ({}/{})",
            q.user,
            q.score(),
            q.sensitivity(),
            q.true_positive,
            q.positive,
            q.specificity(),
            q.true_negative,
            q.negative,
        )?;
    }

    write!(w, "{S4}Labeling time vs score:")?;
    if p.time_vs_score.is_empty() {
        write!(w, " /")?;
    }
    for (user, seconds, score) in p.time_vs_score.iter() {
        write!(w, "\n{S4}{S4}{user}: {seconds:.1} s, score {score:.6}")?;
    }
    Ok(())
}

/// 消融实验最终结果.
pub struct AblationResult {
    data: Vec<(&'static str, Profile)>,
}

impl AblationResult {
    pub fn from_iter<I: IntoIterator<Item = (&'static str, Profile)>>(it: I) -> Self {
        Self {
            data: it.into_iter().collect(),
        }
    }

    /// 分析运行结果.
    pub fn analyze(&self) {
        utils::sep();
        let mut buf = Vec::with_capacity(1024);

        for (key, profile) in self.data.iter() {
            describe_into(key, profile, &mut buf).expect("Writing into buffer error");
            println!("{}", String::from_utf8_lossy(&buf));
            buf.clear();

            utils::sep();
        }
    }
}
