//! 消融实验: 在同一批众包标注上比较各共识算法生成的真值与标注者评估.

mod result;
mod runner;

use log::LevelFilter;
use simple_logger::SimpleLogger;
use std::env;

fn main() {
    let level = env::var("GT_BERRY_LOG")
        .ok()
        .and_then(|s| s.parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::Info);
    SimpleLogger::new()
        .with_level(level)
        .init()
        .expect("Logger initialization error");

    let result = runner::run();
    result.analyze();
}
