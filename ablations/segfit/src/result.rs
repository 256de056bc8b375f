//! 实验结果.

use crate::algos::Stats;
use std::io::{self, Write};

/// 将 `stats` 的结果写进 `w` 中.
fn describe_into<W: Write>(name: &str, p: &Stats, w: &mut W) -> io::Result<()> {
    const S4: &str = "    ";

    #[inline]
    fn f64_to_display(f: Option<f64>) -> String {
        match f {
            Some(f) => format!("{f:.6}"),
            None => "/".to_string(),
        }
    }

    writeln!(w, "Fitter `{name}`:")?;
    writeln!(w, "{S4}Fitted nuclei: {}", p.get_fitted())?;
    writeln!(w, "{S4}Failed nuclei: {}", p.get_failed())?;
    writeln!(w, "{S4}Inconsistent segment ids: {}", p.get_inconsistent())?;
    writeln!(
        w,
        "{S4}Average mismatch against template: {}",
        f64_to_display(p.get_avg_mismatch())
    )?;
    writeln!(w, "{S4}Fitting total time: {} us", p.get_fit_time_us())?;
    writeln!(
        w,
        "{S4}Fitting average time: {} us",
        f64_to_display(p.get_avg_fit_time_us())
    )?;
    writeln!(w, "{S4}Total machine time: {} us", p.get_real_time_us())?;
    let t = p.get_most_time_consuming().map(|d| d.as_micros() as f64);
    write!(w, "{S4}Slowest fit costs {} us", f64_to_display(t))?;
    Ok(())
}

/// 消融实验最终结果.
pub struct AblationResult {
    data: Vec<(&'static str, Stats)>,
}

impl AblationResult {
    pub fn from_iter<I: IntoIterator<Item = (&'static str, Stats)>>(it: I) -> Self {
        Self {
            data: it.into_iter().collect(),
        }
    }

    /// 分析运行结果.
    pub fn analyze(&self) {
        utils::sep();
        let mut buf = Vec::with_capacity(512);

        for (key, stats) in self.data.iter() {
            describe_into(key, stats, &mut buf).unwrap();
            println!("{}", String::from_utf8_lossy(&buf));
            buf.clear();

            utils::sep();
        }
    }
}
