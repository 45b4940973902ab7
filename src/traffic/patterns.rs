use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::frontend::RequestKind;
use crate::traffic::config::{PatternKind, TrafficConfig};

/// Finite stream of `(address, kind)` pairs described by a [`TrafficConfig`].
///
/// Addresses assume the usual interleaved decode: consecutive `line_bytes` lines rotate across
/// `channels`. Only `single_channel` relies on that; the other patterns are decode agnostic.
#[derive(Debug, Clone)]
pub struct TrafficGenerator {
    pattern: PatternKind,
    base: u64,
    step_bytes: u64,
    span_lines: u64,
    line_bytes: u64,
    write_ratio: f64,
    remaining: u64,
    issued: u64,
    rng: StdRng,
}

impl TrafficGenerator {
    pub fn new(config: &TrafficConfig, line_bytes: u32, channels: usize) -> anyhow::Result<Self> {
        config.validate()?;
        let line_bytes = line_bytes.max(1) as u64;
        let step_bytes = match config.pattern {
            PatternKind::Sequential | PatternKind::Random => line_bytes,
            PatternKind::Strided => config.stride,
            PatternKind::SingleChannel => line_bytes * channels.max(1) as u64,
        };
        Ok(Self {
            pattern: config.pattern,
            base: config.base,
            step_bytes,
            span_lines: (config.span_bytes / line_bytes).max(1),
            line_bytes,
            write_ratio: config.write_ratio,
            remaining: config.requests,
            issued: 0,
            rng: StdRng::seed_from_u64(config.seed),
        })
    }

    fn next_address(&mut self) -> u64 {
        match self.pattern {
            PatternKind::Random => {
                let line = self.rng.gen_range(0..self.span_lines);
                self.base.wrapping_add(line * self.line_bytes)
            }
            _ => self
                .base
                .wrapping_add(self.issued.wrapping_mul(self.step_bytes)),
        }
    }
}

impl Iterator for TrafficGenerator {
    type Item = (u64, RequestKind);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let address = self.next_address();
        let kind = RequestKind::from_is_write(self.rng.gen_bool(self.write_ratio));
        self.remaining -= 1;
        self.issued += 1;
        Some((address, kind))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining as usize;
        (n, Some(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(pattern: PatternKind, requests: u64) -> TrafficConfig {
        TrafficConfig {
            requests,
            pattern,
            ..TrafficConfig::default()
        }
    }

    #[test]
    fn sequential_walks_lines() {
        let addrs: Vec<u64> = TrafficGenerator::new(&config(PatternKind::Sequential, 4), 64, 2)
            .unwrap()
            .map(|(a, _)| a)
            .collect();
        assert_eq!(vec![0, 64, 128, 192], addrs);
    }

    #[test]
    fn single_channel_skips_other_channels() {
        let mut c = config(PatternKind::SingleChannel, 3);
        c.base = 0x1000;
        let addrs: Vec<u64> = TrafficGenerator::new(&c, 64, 8)
            .unwrap()
            .map(|(a, _)| a)
            .collect();
        assert_eq!(vec![0x1000, 0x1200, 0x1400], addrs);
    }

    #[test]
    fn random_is_line_aligned_and_reproducible() {
        let mut c = config(PatternKind::Random, 64);
        c.span_bytes = 1 << 16;
        c.seed = 42;
        let a: Vec<_> = TrafficGenerator::new(&c, 64, 1).unwrap().collect();
        let b: Vec<_> = TrafficGenerator::new(&c, 64, 1).unwrap().collect();
        assert_eq!(a, b);
        assert!(a.iter().all(|(addr, _)| addr % 64 == 0 && *addr < 1 << 16));
    }

    #[test]
    fn write_ratio_extremes() {
        let mut c = config(PatternKind::Strided, 32);
        c.write_ratio = 1.0;
        assert!(TrafficGenerator::new(&c, 64, 1)
            .unwrap()
            .all(|(_, k)| k == RequestKind::Write));
        c.write_ratio = 0.0;
        assert!(TrafficGenerator::new(&c, 64, 1)
            .unwrap()
            .all(|(_, k)| k == RequestKind::Read));
    }
}
