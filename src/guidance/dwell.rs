/// Dwell gate for auto-capture.
///
/// `update` reports ready only once the condition has held on every call for
/// at least `dwell_ms`; a single false call clears the window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadyWindow {
    dwell_ms: u64,
    since: Option<u64>,
}

impl ReadyWindow {
    #[must_use]
    pub const fn new(dwell_ms: u64) -> Self {
        Self { dwell_ms, since: None }
    }

    pub fn update(&mut self, ok: bool, timestamp_ms: u64) -> bool {
        if !ok {
            self.since = None;
            return false;
        }
        let since = *self.since.get_or_insert(timestamp_ms);
        timestamp_ms.saturating_sub(since) >= self.dwell_ms
    }

    /// Timestamp at which the current window opened
    #[must_use]
    pub const fn since(&self) -> Option<u64> {
        self.since
    }

    pub fn reset(&mut self) {
        self.since = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ready_after_dwell() {
        let mut w = ReadyWindow::new(800);
        assert!(!w.update(true, 0));
        assert_eq!(w.since(), Some(0));
        assert!(!w.update(true, 799));
        assert!(w.update(true, 800));
        assert!(w.update(true, 5000));
        assert_eq!(w.since(), Some(0));
    }

    #[test]
    fn test_single_miss_restarts_window() {
        let mut w = ReadyWindow::new(800);
        w.update(true, 100);
        assert!(w.update(true, 1000));
        assert!(!w.update(false, 1100));
        assert_eq!(w.since(), None);
        assert!(!w.update(true, 1200));
        assert!(!w.update(true, 1900));
        assert!(w.update(true, 2000));
    }
}
