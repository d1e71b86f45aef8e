//! Retransmission Timeout Estimation
//!
//! Maintains a smoothed round-trip-time estimate and variance and derives a
//! bounded retransmission timeout from them. The timer is armed while
//! packets are awaiting acknowledgement, refreshed whenever the remote shows
//! liveness, and backs off exponentially on expiry.

use crate::packet::UtpPacket;
use std::time::{Duration, Instant};

/// Lower bound on the retransmission timeout
const MIN_TIMEOUT: Duration = Duration::from_millis(500);

/// Upper bound on the retransmission timeout
const MAX_TIMEOUT: Duration = Duration::from_secs(60);

/// Smoothing factor for the round-trip estimate
const RTT_ALPHA: f64 = 0.125;

/// Smoothing factor for the round-trip variance
const RTT_BETA: f64 = 0.25;

/// Adaptive retransmission timer
pub struct RetransmissionTimer {
    /// Smoothed RTT (microseconds)
    smoothed_rtt: f64,
    /// RTT variance (microseconds)
    rtt_variance: f64,
    /// Number of samples observed
    sample_count: u32,
    /// Current retransmission timeout
    timeout: Duration,
    /// Deadline after which the connection is considered timed out.
    /// `None` while nothing is awaiting acknowledgement.
    deadline: Option<Instant>,
}

impl RetransmissionTimer {
    pub fn new() -> Self {
        RetransmissionTimer {
            smoothed_rtt: 0.0,
            rtt_variance: 0.0,
            sample_count: 0,
            timeout: Duration::from_secs(1),
            deadline: None,
        }
    }

    /// Arm the timer if it is idle. Called for every transmitted packet.
    pub fn on_sent_packet(&mut self) {
        if self.deadline.is_none() {
            self.deadline = Some(Instant::now() + self.timeout);
        }
    }

    /// Refresh the deadline: any inbound packet proves the remote is alive.
    pub fn on_received_packet(&mut self) {
        if self.deadline.is_some() {
            self.deadline = Some(Instant::now() + self.timeout);
        }
    }

    /// Feed a fresh round-trip sample from a newly confirmed packet.
    ///
    /// The sample is the local clock at confirmation minus the send
    /// timestamp the packet carried on its latest transmission.
    pub fn on_acked_packet(&mut self, packet: &UtpPacket, local_micros: u32) {
        let sample = local_micros.wrapping_sub(packet.header.timestamp_micros) as f64;

        if self.sample_count == 0 {
            self.smoothed_rtt = sample;
            self.rtt_variance = sample / 2.0;
        } else {
            let error = sample - self.smoothed_rtt;
            self.smoothed_rtt += RTT_ALPHA * error;
            self.rtt_variance = (1.0 - RTT_BETA) * self.rtt_variance + RTT_BETA * error.abs();
        }
        self.sample_count += 1;

        let timeout_micros = self.smoothed_rtt + 4.0 * self.rtt_variance;
        self.timeout = Duration::from_micros(timeout_micros as u64).clamp(MIN_TIMEOUT, MAX_TIMEOUT);
    }

    /// Disarm the timer. Called once nothing is awaiting acknowledgement.
    pub fn clear(&mut self) {
        self.deadline = None;
    }

    /// Whether the deadline has passed
    pub fn is_timeout_expired(&self) -> bool {
        match self.deadline {
            Some(deadline) => Instant::now() >= deadline,
            None => false,
        }
    }

    /// Back off after an expiry: double the timeout (bounded) and re-arm.
    pub fn on_timeout(&mut self) {
        self.timeout = (self.timeout * 2).min(MAX_TIMEOUT);
        self.deadline = Some(Instant::now() + self.timeout);
    }

    /// Current retransmission timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Smoothed round-trip estimate in microseconds
    pub fn smoothed_rtt_micros(&self) -> u32 {
        self.smoothed_rtt as u32
    }
}

impl Default for RetransmissionTimer {
    fn default() -> Self {
        Self::new()
    }
}
