use crate::logging::debug;

/// counts control loop iterations and logs how many happened each second
pub struct LoopStats {
    last_ms: u64,
    count: u64,
}

impl LoopStats {
    pub const fn new(now_ms: u64) -> Self {
        Self {
            last_ms: now_ms,
            count: 0,
        }
    }

    /// returns the loops per second when a second has passed
    pub fn tick(&mut self, now_ms: u64) -> Option<u64> {
        self.count += 1;

        let elapsed_ms = now_ms.saturating_sub(self.last_ms);

        if elapsed_ms < 1_000 {
            return None;
        }

        let loops_per_second = self.count * 1_000 / elapsed_ms;

        self.count = 0;
        self.last_ms = now_ms;

        debug!("loops per second: {}", loops_per_second);

        Some(loops_per_second)
    }
}
