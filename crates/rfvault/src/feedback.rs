//! Audible and visual feedback seam.
//!
//! Tones and LED flashes are fixed-duration blocking effects on real
//! hardware, so the trait is async: callers fire them after releasing the
//! archive lock and the executor is free to run request handlers while a
//! tone plays. Implementations carry no state the core cares about.

use async_trait::async_trait;

/// LED flash pattern confirming a stored capture: 100 ms pulses, three times.
pub const RECEIVE_FLASH: (u64, u32) = (100, 3);

/// LED flash pattern confirming a transmission: 200 ms pulses, twice.
pub const TRANSMIT_FLASH: (u64, u32) = (200, 2);

/// Side-effect sink for operator feedback.
///
/// The buzzer methods and [`Feedback::flash`] are gated independently by
/// the caller (buzzer toggle vs. LED toggle); implementations just make
/// noise and light.
#[async_trait]
pub trait Feedback: Send + Sync + std::fmt::Debug {
    /// Two-tone chirp confirming a capture was stored.
    async fn receive_tone(&self);

    /// Two-tone chirp confirming a code was transmitted.
    async fn transmit_tone(&self);

    /// Rising scale played once the service is up.
    async fn startup_tone(&self);

    /// Flash the LED `times` times, `duration_ms` on and off each.
    async fn flash(&self, duration_ms: u64, times: u32);
}

/// A feedback sink that does nothing.
///
/// Used headless (tests, maintenance CLI) and as the default when the
/// device has neither buzzer nor LED wired.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullFeedback;

#[async_trait]
impl Feedback for NullFeedback {
    async fn receive_tone(&self) {}

    async fn transmit_tone(&self) {}

    async fn startup_tone(&self) {}

    async fn flash(&self, _duration_ms: u64, _times: u32) {}
}


#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_null_feedback_is_silent() {
        let feedback = NullFeedback;
        feedback.receive_tone().await;
        feedback.transmit_tone().await;
        feedback.startup_tone().await;
        let (duration, times) = RECEIVE_FLASH;
        feedback.flash(duration, times).await;
    }

    #[tokio::test]
    async fn test_counting_feedback_counts() {
        let feedback = testing::CountingFeedback::default();
        feedback.receive_tone().await;
        feedback.receive_tone().await;
        feedback.transmit_tone().await;
        feedback.flash(100, 3).await;

        assert_eq!(feedback.receive_tones(), 2);
        assert_eq!(feedback.transmit_tones(), 1);
        assert_eq!(feedback.flashes(), 1);
    }
}
