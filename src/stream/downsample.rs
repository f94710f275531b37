//! Latest-wins downsampling for sample streams.
//!
//! A display loop redrawing at 25 Hz has no use for every packet of a
//! 400 Hz sensor; it wants the newest sample, at its own cadence. The
//! combinator here holds at most one pending item, replacing it as faster
//! items arrive, and releases it once per interval.

use futures::{Stream, ready};
use pin_project_lite::pin_project;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::time::{Interval, MissedTickBehavior, interval};

/// Extension trait adding downsampling to any stream.
pub trait DownsampleExt: Stream {
    /// Emit at most one item per `period`, always the newest.
    ///
    /// Items arriving faster than the period replace the held one; nothing
    /// is queued. When the source ends, the held item (if any) is flushed
    /// before the downsampled stream ends.
    fn downsample(self, period: Duration) -> Downsample<Self>
    where
        Self: Sized,
    {
        Downsample::new(self, period)
    }
}

impl<T: Stream> DownsampleExt for T {}

pin_project! {
    /// Stream combinator produced by [`DownsampleExt::downsample`].
    pub struct Downsample<S: Stream> {
        #[pin]
        stream: S,
        gate: Interval,
        latest: Option<S::Item>,
        done: bool,
    }
}

impl<S: Stream> Downsample<S> {
    /// Wrap `stream`, releasing at most one item per `period`.
    pub fn new(stream: S, period: Duration) -> Self {
        let mut gate = interval(period);
        // A missed tick should not cause a burst of catch-up emissions.
        gate.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { stream, gate, latest: None, done: false }
    }
}

impl<S: Stream> Stream for Downsample<S> {
    type Item = S::Item;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        // Drain the source, keeping only the newest item.
        while !*this.done {
            match this.stream.as_mut().poll_next(cx) {
                Poll::Ready(Some(item)) => *this.latest = Some(item),
                Poll::Ready(None) => {
                    *this.done = true;
                }
                Poll::Pending => break,
            }
        }

        if *this.done {
            // Flush the held item, then end.
            return Poll::Ready(this.latest.take());
        }

        if this.latest.is_some() {
            ready!(this.gate.poll_tick(cx));
            return Poll::Ready(this.latest.take());
        }

        Poll::Pending
    }
}
