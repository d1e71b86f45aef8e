//! Delay-Based Congestion Control
//!
//! Tracks bytes in flight against an allowed window. The window follows a
//! LEDBAT-style control law: every delay sample moves it toward the point
//! where the measured queueing delay sits at a fixed target, growing when
//! the path is underfilled and shrinking proportionally when the delay
//! overshoots. Loss and timeout events shrink it multiplicatively, a
//! timeout collapsing it to the floor outright.

use crate::packet::{UtpPacket, MIN_PACKET_SIZE};

/// Queueing delay the control law steers toward, in microseconds
const TARGET_DELAY_MICROS: u32 = 100_000;

/// Largest window adjustment a single delay sample may apply, in bytes
const MAX_WINDOW_GAIN_BYTES: f64 = 3000.0;

/// Window floor: one minimum-size packet must always fit
const MIN_WINDOW: usize = MIN_PACKET_SIZE;

/// Window ceiling
const MAX_WINDOW: usize = 1024 * 1024;

/// Default initial window: two full packets
pub const DEFAULT_INITIAL_WINDOW: usize = 2 * crate::packet::MAX_PACKET_SIZE;

/// Congestion window with bytes-in-flight accounting
pub struct CongestionWindow {
    /// Current window limit in bytes
    max_window: usize,
    /// Bytes sent but not yet confirmed
    bytes_in_flight: usize,
}

impl CongestionWindow {
    pub fn new(initial_window: usize) -> Self {
        CongestionWindow {
            max_window: initial_window.clamp(MIN_WINDOW, MAX_WINDOW),
            bytes_in_flight: 0,
        }
    }

    /// Current window limit in bytes
    pub fn max_window(&self) -> usize {
        self.max_window
    }

    /// Bytes currently in flight
    pub fn bytes_in_flight(&self) -> usize {
        self.bytes_in_flight
    }

    /// Window capacity not yet occupied by in-flight bytes
    pub fn free_capacity(&self) -> usize {
        self.max_window.saturating_sub(self.bytes_in_flight)
    }

    /// Account for a transmitted packet
    pub fn on_packet_sent(&mut self, packet: &UtpPacket) {
        if packet.packet_type().is_acknowledgeable() {
            self.bytes_in_flight += packet.wire_size();
        }
    }

    /// Account for a newly confirmed packet
    pub fn on_packet_confirmed(&mut self, packet: &UtpPacket) {
        self.bytes_in_flight = self.bytes_in_flight.saturating_sub(packet.wire_size());
    }

    /// Apply one queueing-delay sample to the window.
    ///
    /// The gain is scaled both by how far the sample sits from the target
    /// and by how much of the window is actually in use, so an idle
    /// connection cannot grow its window without evidence of available
    /// bandwidth.
    pub fn on_delay_sample(&mut self, queuing_delay_micros: u32) {
        let off_target = TARGET_DELAY_MICROS as f64 - queuing_delay_micros as f64;
        let delay_factor = (off_target / TARGET_DELAY_MICROS as f64).clamp(-1.0, 1.0);
        let utilization = self.bytes_in_flight as f64 / self.max_window as f64;

        let gain = MAX_WINDOW_GAIN_BYTES * delay_factor * utilization.min(1.0);
        let adjusted = self.max_window as f64 + gain;
        self.max_window = (adjusted as usize).clamp(MIN_WINDOW, MAX_WINDOW);
    }

    /// A packet was declared lost: halve the window and release the lost
    /// packet's bytes (it will be counted again when retransmitted).
    pub fn on_packet_loss(&mut self, packet: &UtpPacket) {
        self.max_window = (self.max_window / 2).max(MIN_WINDOW);
        self.bytes_in_flight = self.bytes_in_flight.saturating_sub(packet.wire_size());
    }

    /// The retransmission timeout fired: collapse to the floor and reset
    /// the flight accounting, since every outstanding packet is now a
    /// resend candidate.
    pub fn on_timeout(&mut self) {
        self.max_window = MIN_WINDOW;
        self.bytes_in_flight = 0;
    }
}
