use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::adc::{AdcProfile, AdcReader};
use crate::error::PlatformError;

#[derive(Debug, Default)]
struct Script {
    queue: VecDeque<Result<u16, PlatformError>>,
    last: Option<u16>,
    reads: usize,
}

/// ADC double that replays queued counts.
///
/// Once the queue runs dry the last successful count repeats, so a test only
/// has to script the readings it cares about. Clones feed the same queue,
/// which lets a test keep a handle after moving the reader into a monitor.
#[derive(Debug, Clone, Default)]
pub struct ScriptedAdc {
    script: Arc<Mutex<Script>>,
}

impl ScriptedAdc {
    pub fn new() -> Self {
        Self::default()
    }

    /// A reader that returns `count` forever.
    pub fn repeating(count: u16) -> Self {
        let adc = Self::new();
        adc.push(count);
        adc
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn push(&self, count: u16) {
        self.script().queue.push_back(Ok(count));
    }

    pub fn push_many<I: IntoIterator<Item = u16>>(&self, counts: I) {
        let mut script = self.script();
        script.queue.extend(counts.into_iter().map(Ok));
    }

    /// Queue the count closest to `volts` under `profile`.
    pub fn push_volts(&self, profile: &AdcProfile, volts: f32) {
        self.push(profile.volts_to_counts(volts));
    }

    pub fn push_error(&self, error: PlatformError) {
        self.script().queue.push_back(Err(error));
    }

    /// Drop everything still queued and make `count` the repeating value.
    pub fn replace(&self, count: u16) {
        let mut script = self.script();
        script.queue.clear();
        script.queue.push_back(Ok(count));
    }

    pub fn pending(&self) -> usize {
        self.script().queue.len()
    }

    pub fn reads(&self) -> usize {
        self.script().reads
    }
}

impl AdcReader for ScriptedAdc {
    fn read_raw(&mut self, pin: u8) -> Result<u16, PlatformError> {
        let mut script = self.script();
        script.reads += 1;
        match script.queue.pop_front() {
            Some(Ok(count)) => {
                script.last = Some(count);
                Ok(count)
            }
            Some(Err(e)) => Err(e),
            None => script
                .last
                .ok_or(PlatformError::ChannelUnavailable { pin }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replays_in_order_then_repeats_last() {
        let mut adc = ScriptedAdc::new();
        adc.push_many([10, 20, 30]);
        assert_eq!(adc.read_raw(1), Ok(10));
        assert_eq!(adc.read_raw(1), Ok(20));
        assert_eq!(adc.read_raw(1), Ok(30));
        assert_eq!(adc.read_raw(1), Ok(30));
        assert_eq!(adc.reads(), 4);
    }

    #[test]
    fn test_empty_script_is_unavailable() {
        let mut adc = ScriptedAdc::new();
        assert_eq!(
            adc.read_raw(7),
            Err(PlatformError::ChannelUnavailable { pin: 7 })
        );
    }

    #[test]
    fn test_scripted_error_does_not_replace_last() {
        let mut adc = ScriptedAdc::repeating(42);
        adc.push_error(PlatformError::Conversion {
            pin: 3,
            reason: "busy".to_string(),
        });
        assert_eq!(adc.read_raw(3), Ok(42));
        assert!(adc.read_raw(3).is_err());
        assert_eq!(adc.read_raw(3), Ok(42));
    }

    #[test]
    fn test_clones_share_queue() {
        let feeder = ScriptedAdc::new();
        let mut reader = feeder.clone();
        feeder.push(99);
        assert_eq!(reader.read_raw(0), Ok(99));
        assert_eq!(feeder.pending(), 0);
    }

    #[test]
    fn test_replace_discards_queue() {
        let mut adc = ScriptedAdc::new();
        adc.push_many([1, 2, 3]);
        adc.replace(7);
        assert_eq!(adc.read_raw(0), Ok(7));
        assert_eq!(adc.read_raw(0), Ok(7));
    }
}
