//! One-Way Delay Estimation
//!
//! Tracks the one-way delay signal that drives delay-based congestion
//! control. Two measurements live here: the delay we observe for packets
//! arriving from the remote (echoed back in every outbound header), and the
//! delay the remote reports for our packets, base-lined against a sliding
//! minimum so only the queueing component feeds the congestion window.

use crate::packet::UtpPacket;
use std::collections::VecDeque;

/// Number of recent samples the base-delay minimum is computed over
const BASE_DELAY_WINDOW: usize = 13;

/// One-way delay estimator
pub struct DelayEstimator {
    /// Remote-reported delay samples, most recent last
    samples: VecDeque<u32>,
    /// Smallest sample currently in the window
    base_delay: u32,
    /// Delay measured locally for the most recent inbound packet
    measured_delay: u32,
}

impl DelayEstimator {
    pub fn new() -> Self {
        DelayEstimator {
            samples: VecDeque::with_capacity(BASE_DELAY_WINDOW),
            base_delay: u32::MAX,
            measured_delay: 0,
        }
    }

    /// Record the delay signals carried by an inbound packet and return the
    /// queueing component of the packet's remote-reported delay (sample
    /// minus the sliding-window minimum).
    ///
    /// `local_receive_micros` is the local clock at the moment the packet
    /// was pulled off the channel. A zero timestamp-difference means the
    /// remote has no measurement yet; no sample is recorded and `None` is
    /// returned.
    pub fn on_received_packet(
        &mut self,
        packet: &UtpPacket,
        local_receive_micros: u32,
    ) -> Option<u32> {
        self.measured_delay = local_receive_micros.wrapping_sub(packet.header.timestamp_micros);

        let reported = packet.header.timestamp_difference_micros;
        if reported == 0 {
            return None;
        }

        self.samples.push_back(reported);
        if self.samples.len() > BASE_DELAY_WINDOW {
            self.samples.pop_front();
        }
        self.base_delay = self.samples.iter().copied().min().unwrap_or(u32::MAX);

        Some(reported.saturating_sub(self.base_delay))
    }

    /// Delay measured locally for the latest inbound packet, echoed in the
    /// timestamp-difference field of every outbound header.
    pub fn measured_delay(&self) -> u32 {
        self.measured_delay
    }
}

impl Default for DelayEstimator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::{PacketHeader, PacketType, PROTOCOL_VERSION};
    use crate::sequence::SeqNumber;
    use bytes::Bytes;

    fn packet_with_delays(timestamp: u32, difference: u32) -> UtpPacket {
        UtpPacket::new(
            PacketHeader {
                packet_type: PacketType::State,
                version: PROTOCOL_VERSION,
                extension: 0,
                connection_id: 1,
                timestamp_micros: timestamp,
                timestamp_difference_micros: difference,
                window_size: 0,
                sequence_number: SeqNumber::new(1),
                acknowledge_number: SeqNumber::new(0),
            },
            Bytes::new(),
        )
    }

    #[test]
    fn test_measured_delay() {
        let mut estimator = DelayEstimator::new();

        estimator.on_received_packet(&packet_with_delays(1_000, 0), 1_400);
        assert_eq!(estimator.measured_delay(), 400);
    }

    #[test]
    fn test_measured_delay_clock_wraparound() {
        let mut estimator = DelayEstimator::new();

        estimator.on_received_packet(&packet_with_delays(u32::MAX - 10, 0), 20);
        assert_eq!(estimator.measured_delay(), 31);
    }

    #[test]
    fn test_queuing_delay_above_base() {
        let mut estimator = DelayEstimator::new();

        let first = estimator.on_received_packet(&packet_with_delays(0, 30_000), 0);
        assert_eq!(first, Some(0));

        let second = estimator.on_received_packet(&packet_with_delays(0, 80_000), 0);
        assert_eq!(second, Some(50_000));
    }

    #[test]
    fn test_zero_report_is_not_a_sample() {
        let mut estimator = DelayEstimator::new();

        let sample = estimator.on_received_packet(&packet_with_delays(0, 0), 100);
        assert_eq!(sample, None);
        assert_eq!(estimator.measured_delay(), 100);
    }

    #[test]
    fn test_base_delay_slides() {
        let mut estimator = DelayEstimator::new();

        estimator.on_received_packet(&packet_with_delays(0, 10_000), 0);
        let mut last = None;
        for _ in 0..BASE_DELAY_WINDOW {
            last = estimator.on_received_packet(&packet_with_delays(0, 40_000), 0);
        }

        // The 10 ms sample has aged out of the window, so the base is now 40 ms
        assert_eq!(last, Some(0));
    }
}
