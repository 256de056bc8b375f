//! 拟合运行统计.

use std::time::{Duration, Instant};

/// ablation/benchmark 计时器.
///
/// 支持中途暂停, 之后继续累计.
#[derive(Clone, Debug)]
struct AccTimer {
    consumed: Duration,
    since: Instant,
}

impl AccTimer {
    /// 初始化计时器. 初始化时即视为已经开始计时.
    #[inline]
    pub fn new() -> Self {
        Self {
            consumed: Duration::from_secs(0),
            since: Instant::now(),
        }
    }

    /// 开始一轮计时.
    #[inline]
    pub fn start(&mut self) {
        self.since = Instant::now();
    }

    /// 结束本轮计时并累加, 返回本轮时长.
    ///
    /// # 注意
    ///
    /// 上一次调用必须是 `self.start()`, 否则计算时间值无意义.
    #[inline]
    pub fn elapsed(&mut self) -> Duration {
        let d = self.since.elapsed();
        self.consumed += d;
        d
    }

    /// 累计时间 (微秒).
    #[inline]
    pub fn get_total_us(&self) -> u64 {
        self.consumed.as_micros() as u64
    }
}

impl Default for AccTimer {
    fn default() -> Self {
        Self::new()
    }
}

/// 一个拟合器在整个群体上的统计.
#[derive(Clone, Debug)]
pub struct Stats {
    /// 成功拟合的细胞核个数.
    fitted: u64,

    /// 拟合失败的细胞核个数.
    failed: u64,

    /// 拟合结果的分段 id 与模板不一致的个数. 正确的拟合器应恒为 0.
    inconsistent: u64,

    /// franken-profile 与模板 profile 的均方差之和.
    mismatch: f64,

    /// 拟合本身花费的时间.
    fit_time: AccTimer,

    /// 整个任务花费的时间.
    real_time: AccTimer,

    /// 最耗时的一次拟合.
    most: Option<Duration>,
}

impl Stats {
    /// 初始化.
    #[inline]
    pub fn new() -> Self {
        Self {
            fitted: 0,
            failed: 0,
            inconsistent: 0,
            mismatch: 0.0,
            fit_time: AccTimer::default(),
            real_time: AccTimer::default(),
            most: None,
        }
    }

    /// 开始一次拟合计时.
    #[inline]
    pub fn fit_start(&mut self) {
        self.fit_time.start();
    }

    /// 结束一次拟合计时.
    #[inline]
    pub fn fit_elapsed(&mut self) {
        let d = self.fit_time.elapsed();
        self.most = Some(self.most.map_or(d, |m| m.max(d)));
    }

    /// 记录一次成功拟合及其均方差.
    #[inline]
    pub fn count_fitted(&mut self, mismatch: f64, consistent: bool) {
        self.fitted += 1;
        self.mismatch += mismatch;
        if !consistent {
            self.inconsistent += 1;
        }
    }

    /// 记录一次失败.
    #[inline]
    pub fn count_failed(&mut self) {
        self.failed += 1;
    }

    /// 结束全部计时.
    #[inline]
    pub fn finish(mut self) -> Self {
        self.real_time.elapsed();
        self
    }

    /// 成功个数.
    #[inline]
    pub fn get_fitted(&self) -> u64 {
        self.fitted
    }

    /// 失败个数.
    #[inline]
    pub fn get_failed(&self) -> u64 {
        self.failed
    }

    /// 分段 id 不一致的个数.
    #[inline]
    pub fn get_inconsistent(&self) -> u64 {
        self.inconsistent
    }

    /// 平均均方差.
    #[inline]
    pub fn get_avg_mismatch(&self) -> Option<f64> {
        match self.fitted {
            0 => None,
            n => Some(self.mismatch / n as f64),
        }
    }

    /// 拟合总时间 (微秒).
    #[inline]
    pub fn get_fit_time_us(&self) -> u64 {
        self.fit_time.get_total_us()
    }

    /// 平均每次拟合时间 (微秒).
    #[inline]
    pub fn get_avg_fit_time_us(&self) -> Option<f64> {
        match self.fitted + self.failed {
            0 => None,
            n => Some(self.get_fit_time_us() as f64 / n as f64),
        }
    }

    /// 任务总时间 (微秒).
    #[inline]
    pub fn get_real_time_us(&self) -> u64 {
        self.real_time.get_total_us()
    }

    /// 最耗时的一次拟合.
    #[inline]
    pub fn get_most_time_consuming(&self) -> Option<Duration> {
        self.most
    }
}

impl Default for Stats {
    fn default() -> Self {
        Self::new()
    }
}
