use std::pin::Pin;
use std::task::Context;
use std::time::Duration;

use futures::Future;
use futures_timer::Delay;

/// A background job run periodically while the handler is polled.
#[derive(Debug)]
pub(crate) struct PeriodicJob {
    interval: Duration,
    delay: Delay,
}

impl PeriodicJob {
    pub fn new(interval: Duration) -> Self {
        Self {
            delay: Delay::new(interval),
            interval,
        }
    }

    /// Returns `true` if the job is ready to be run and rearms the timer,
    /// `false` otherwise.
    pub fn is_ready(&mut self, cx: &mut Context<'_>) -> bool {
        if Future::poll(Pin::new(&mut self.delay), cx).is_ready() {
            self.delay.reset(self.interval);
            return true;
        }
        false
    }
}
