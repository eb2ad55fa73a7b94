//! Transceiver seam.
//!
//! The radio driver is supplied by the embedding firmware; this crate only
//! consumes decoded code triples and hands triples back for transmission.
//! The receive side is edge-triggered: the driver latches at most one
//! decoded reading, and [`Transceiver::try_receive`] returns it and clears
//! the latch.
//!
//! Driver implementations must do their decoding outside any
//! interrupt-context code; `try_receive` is called from the cooperative
//! capture loop and may take its time.

use crate::error::Result;
use crate::signal::RfCode;

/// An RF transceiver that decodes received pulse trains and encodes codes
/// for transmission.
pub trait Transceiver: Send + std::fmt::Debug {
    /// Return the pending decoded reading, if any, clearing the ready
    /// condition.
    ///
    /// A returned code may still be noise (`value == 0`); the caller
    /// filters that.
    fn try_receive(&mut self) -> Option<RfCode>;

    /// Encode and send a code over the air.
    ///
    /// Blocking and bounded: the call returns once the pulse train has
    /// been handed to the hardware.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver rejects the code or the hardware
    /// fails.
    fn transmit(&mut self, code: &RfCode) -> Result<()>;
}

/// A scripted transceiver for the pipeline and command-surface tests.
#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;

    use super::{Result, RfCode, Transceiver};

    #[derive(Debug, Default)]
    pub(crate) struct ScriptedRadio {
        pub(crate) pending: VecDeque<RfCode>,
        pub(crate) sent: Vec<RfCode>,
    }

    impl ScriptedRadio {
        pub(crate) fn with_pending(codes: impl IntoIterator<Item = RfCode>) -> Self {
            Self {
                pending: codes.into_iter().collect(),
                sent: Vec::new(),
            }
        }
    }

    impl Transceiver for ScriptedRadio {
        fn try_receive(&mut self) -> Option<RfCode> {
            self.pending.pop_front()
        }

        fn transmit(&mut self, code: &RfCode) -> Result<()> {
            self.sent.push(*code);
            Ok(())
        }
    }
}
