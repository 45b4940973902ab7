use std::fmt;

use serde::Serialize;

use crate::timeq::Cycle;

/// Running counters owned by one frontend instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Telemetry {
    elapsed_ticks: u64,
    active_ticks: u64,
    sum_inflight: u64,
    sum_active_banks: u64,
    finished_reads: u64,
    finished_writes: u64,
    sum_read_latency: u64,
}

impl Telemetry {
    pub fn elapsed_ticks(&self) -> u64 {
        self.elapsed_ticks
    }

    pub fn active_ticks(&self) -> u64 {
        self.active_ticks
    }

    pub fn finished_reads(&self) -> u64 {
        self.finished_reads
    }

    pub fn finished_writes(&self) -> u64 {
        self.finished_writes
    }

    pub fn sum_read_latency(&self) -> u64 {
        self.sum_read_latency
    }

    /// Account one tick, given the occupancy seen before the tick's acceptances.
    pub fn record_tick(&mut self, inflight: usize, active_banks: usize) {
        self.elapsed_ticks += 1;
        if inflight > 0 {
            self.active_ticks += 1;
            self.sum_inflight += inflight as u64;
            self.sum_active_banks += active_banks as u64;
        }
    }

    pub fn record_read(&mut self, latency: Cycle) {
        self.finished_reads += 1;
        self.sum_read_latency += latency;
    }

    pub fn record_write(&mut self) {
        self.finished_writes += 1;
    }

    pub fn report(&self, bytes_per_access: u32) -> TelemetryReport {
        let accesses = self.finished_reads + self.finished_writes;
        TelemetryReport {
            mlp: ratio(self.sum_inflight, self.active_ticks),
            blp: ratio(self.sum_active_banks, self.active_ticks),
            active_rate: ratio(self.active_ticks, self.elapsed_ticks),
            bandwidth: ratio(accesses * bytes_per_access as u64, self.active_ticks),
            avg_read_latency: ratio(self.sum_read_latency, self.finished_reads),
            finished_reads: self.finished_reads,
            finished_writes: self.finished_writes,
            elapsed_ticks: self.elapsed_ticks,
            active_ticks: self.active_ticks,
        }
    }
}

// None when the denominator is zero
fn ratio(num: u64, denom: u64) -> Option<f64> {
    (denom != 0).then(|| num as f64 / denom as f64)
}

/// Derived figures for the shutdown report. `None` marks a ratio with a zero denominator; it is
/// printed as `nan` and serialized as `null`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TelemetryReport {
    pub mlp: Option<f64>,
    pub blp: Option<f64>,
    pub active_rate: Option<f64>,
    /// bytes per tick
    pub bandwidth: Option<f64>,
    /// ticks
    pub avg_read_latency: Option<f64>,
    pub finished_reads: u64,
    pub finished_writes: u64,
    pub elapsed_ticks: u64,
    pub active_ticks: u64,
}

impl fmt::Display for TelemetryReport {
    // Tools parse this line; keep the layout byte for byte.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Interface MLP {} BLP  {} memoy activeRate {} BW {} lat {} readRqt {}  writeRqt {}",
            format_g(self.mlp),
            format_g(self.blp),
            format_g(self.active_rate),
            format_g(self.bandwidth),
            format_g(self.avg_read_latency),
            self.finished_reads,
            self.finished_writes
        )
    }
}

/// Shortest `%g` rendering with 6 significant digits, the way a default C++ stream prints
/// doubles.
pub fn format_g(value: Option<f64>) -> String {
    const PRECISION: i32 = 6;

    let value = match value {
        Some(v) if v.is_nan() => return "nan".to_string(),
        Some(v) if v.is_infinite() => {
            let s = if v > 0.0 { "inf" } else { "-inf" };
            return s.to_string();
        }
        Some(v) if v == 0.0 => return "0".to_string(),
        Some(v) => v,
        None => return "nan".to_string(),
    };

    // let the rounding to 6 digits pick the exponent
    let sci = format!("{:.*e}", (PRECISION - 1) as usize, value);
    let (mantissa, exp) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exp: i32 = exp.parse().unwrap_or(0);

    if exp < -4 || exp >= PRECISION {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", trim_fraction(mantissa), sign, exp.abs())
    } else {
        let decimals = (PRECISION - 1 - exp) as usize;
        trim_fraction(&format!("{:.*}", decimals, value)).to_string()
    }
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}
