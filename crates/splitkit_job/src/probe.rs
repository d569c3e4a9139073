//! Process-memory capability and the admission governor built on it.

use std::time::{Duration, Instant};

use crate::spec::EnumJobWarning;

const N_BYTES_PER_MB: u64 = 1024 * 1024;

/// Reads resident memory of the current process.
///
/// Implementations returning `None` disable back-pressure.
pub trait MemoryProbe: Send + Sync {
    /// Resident set size in bytes, if known.
    fn resident_bytes(&self) -> Option<u64>;

    /// Hook polled while admission is stalled above the limit.
    ///
    /// Memory is reclaimed by the coordinator dropping the finished batch's
    /// datasets before the next batch is admitted. The probe releases
    /// nothing itself; implementations may refresh cached readings here.
    fn reclaim(&self) {}
}

/// Probe for platforms without memory introspection.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMemoryProbe;

impl MemoryProbe for NoopMemoryProbe {
    fn resident_bytes(&self) -> Option<u64> {
        None
    }
}

/// Probe backed by `sysinfo`.
#[cfg(feature = "memory-probe")]
pub struct SysinfoMemoryProbe {
    system: std::sync::Mutex<sysinfo::System>,
}

#[cfg(feature = "memory-probe")]
impl SysinfoMemoryProbe {
    /// Create a probe with an empty process table.
    pub fn new() -> Self {
        Self {
            system: std::sync::Mutex::new(sysinfo::System::new()),
        }
    }
}

#[cfg(feature = "memory-probe")]
impl Default for SysinfoMemoryProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "memory-probe")]
impl MemoryProbe for SysinfoMemoryProbe {
    fn resident_bytes(&self) -> Option<u64> {
        let pid = sysinfo::get_current_pid().ok()?;
        let mut system = match self.system.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        system.refresh_process(pid);
        system.process(pid).map(|process| process.memory())
    }
}

/// Stalls task admission while resident memory exceeds a limit.
pub struct MemoryGovernor<'a> {
    probe: &'a dyn MemoryProbe,
    n_bytes_limit: u64,
    timeout: Duration,
    interval_poll: Duration,
}

impl<'a> MemoryGovernor<'a> {
    /// Governor with a limit in MiB. A zero limit disables it.
    pub fn new(probe: &'a dyn MemoryProbe, n_mb_limit: u64) -> Self {
        Self {
            probe,
            n_bytes_limit: n_mb_limit.saturating_mul(N_BYTES_PER_MB),
            timeout: Duration::from_secs(10),
            interval_poll: Duration::from_millis(200),
        }
    }

    /// Override stall timeout and polling interval.
    pub fn with_timing(mut self, timeout: Duration, interval_poll: Duration) -> Self {
        self.timeout = timeout;
        self.interval_poll = interval_poll;
        self
    }

    /// Block until memory is under the limit or the timeout elapses.
    ///
    /// Returns a `MemoryStall` warning when admission had to wait.
    pub fn wait_for_admission(&self) -> Option<EnumJobWarning> {
        if self.n_bytes_limit == 0 {
            return None;
        }
        let n_bytes = self.probe.resident_bytes()?;
        if n_bytes <= self.n_bytes_limit {
            return None;
        }

        log::warn!(
            "Resident memory {}MB above limit {}MB; reclaiming before next batch",
            n_bytes / N_BYTES_PER_MB,
            self.n_bytes_limit / N_BYTES_PER_MB
        );
        let t_start = Instant::now();
        let mut n_bytes_last = n_bytes;
        loop {
            self.probe.reclaim();
            match self.probe.resident_bytes() {
                Some(n) if n > self.n_bytes_limit => n_bytes_last = n,
                Some(n) => {
                    n_bytes_last = n;
                    break;
                }
                None => break,
            }
            if t_start.elapsed() >= self.timeout {
                log::warn!("Memory stall timed out; admitting next batch anyway");
                break;
            }
            std::thread::sleep(self.interval_poll);
        }

        Some(EnumJobWarning::MemoryStall {
            n_mb_resident: n_bytes_last / N_BYTES_PER_MB,
            n_mb_limit: self.n_bytes_limit / N_BYTES_PER_MB,
            waited: t_start.elapsed(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use super::{MemoryGovernor, MemoryProbe, NoopMemoryProbe};
    use crate::spec::EnumJobWarning;

    struct ScriptedProbe {
        l_readings: Mutex<Vec<u64>>,
        n_reclaims: Mutex<usize>,
    }

    impl MemoryProbe for ScriptedProbe {
        fn resident_bytes(&self) -> Option<u64> {
            let mut l_readings = self.l_readings.lock().unwrap();
            if l_readings.len() > 1 {
                Some(l_readings.remove(0))
            } else {
                l_readings.first().copied()
            }
        }

        fn reclaim(&self) {
            *self.n_reclaims.lock().unwrap() += 1;
        }
    }

    const MB: u64 = 1024 * 1024;

    #[test]
    fn test_noop_probe_never_stalls() {
        let governor = MemoryGovernor::new(&NoopMemoryProbe, 1);
        assert_eq!(governor.wait_for_admission(), None);
    }

    #[test]
    fn test_under_limit_admits_immediately() {
        let probe = ScriptedProbe {
            l_readings: Mutex::new(vec![10 * MB]),
            n_reclaims: Mutex::new(0),
        };
        let governor = MemoryGovernor::new(&probe, 512);
        assert_eq!(governor.wait_for_admission(), None);
        assert_eq!(*probe.n_reclaims.lock().unwrap(), 0);
    }

    #[test]
    fn test_over_limit_reclaims_until_below() {
        let probe = ScriptedProbe {
            l_readings: Mutex::new(vec![900 * MB, 700 * MB, 300 * MB]),
            n_reclaims: Mutex::new(0),
        };
        let governor = MemoryGovernor::new(&probe, 512)
            .with_timing(Duration::from_secs(5), Duration::from_millis(1));
        let warning = governor.wait_for_admission();
        match warning {
            Some(EnumJobWarning::MemoryStall {
                n_mb_resident,
                n_mb_limit,
                ..
            }) => {
                assert_eq!(n_mb_resident, 300);
                assert_eq!(n_mb_limit, 512);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(*probe.n_reclaims.lock().unwrap(), 2);
    }

    #[test]
    fn test_stall_times_out() {
        let probe = ScriptedProbe {
            l_readings: Mutex::new(vec![900 * MB]),
            n_reclaims: Mutex::new(0),
        };
        let governor = MemoryGovernor::new(&probe, 512)
            .with_timing(Duration::from_millis(5), Duration::from_millis(1));
        assert!(matches!(
            governor.wait_for_admission(),
            Some(EnumJobWarning::MemoryStall { n_mb_resident: 900, .. })
        ));
    }

    #[cfg(feature = "memory-probe")]
    #[test]
    fn test_sysinfo_probe_reports_resident_bytes() {
        let probe = super::SysinfoMemoryProbe::new();
        let n_bytes = probe.resident_bytes();
        assert!(matches!(n_bytes, Some(n) if n > 0), "got {n_bytes:?}");
    }
}
