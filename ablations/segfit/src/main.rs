//! 拟合策略消融实验: 比例缩放拟合器与迭代拟合器在同一合成群体上的表现.

mod algos;
mod result;
mod runner;

use simple_logger::SimpleLogger;

fn main() {
    SimpleLogger::new()
        .with_level(log::LevelFilter::Info)
        .init()
        .expect("Logger initialization error");
    runner::run().analyze();
}
