//! uTP Connection State Machine
//!
//! Manages the lifecycle of a uTP connection from handshake through data
//! transfer to teardown, and orchestrates the per-connection handlers:
//! acknowledgement tracking, loss detection, retransmission timing,
//! congestion control, payload sizing, delay estimation and inbound
//! reordering. The owning dispatch loop feeds demultiplexed packets into
//! [`Connection::on_received_packet`] and periodically drives
//! [`Connection::process_send_queue`] and [`Connection::process_timeout`];
//! the application reads and writes bytes through the two stream endpoints.

use crate::ack::AckTracker;
use crate::congestion::{CongestionWindow, DEFAULT_INITIAL_WINDOW};
use crate::delay::DelayEstimator;
use crate::loss::LossDetector;
use crate::packet::{
    PacketError, PacketHeader, PacketType, UtpPacket, HEADER_SIZE, PROTOCOL_VERSION,
};
use crate::packet_size::PayloadSizer;
use crate::reorder::InboundReorderer;
use crate::sequence::SeqNumber;
use crate::stream::{SharedBuffer, StreamState, UtpInputStream, UtpOutputStream};
use crate::timeout::RetransmissionTimer;
use bytes::Bytes;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::trace;

/// Default time a [`Connection::connect`] call waits for the handshake
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Created but no handshake traffic yet
    Pending,
    /// SYN sent, waiting for the acknowledging STATE
    SynSent,
    /// SYN received, handshake STATE owed or in flight
    SynReceived,
    /// Handshake complete, data may flow
    Connected,
    /// Teardown in progress
    Closing,
    /// Teardown complete
    Closed,
    /// Remote forced teardown
    Reset,
}

/// Connection errors
#[derive(Error, Debug)]
pub enum UtpError {
    #[error("Connection was not accepted within the timeout")]
    ConnectTimeout,

    #[error("Connect wait was cancelled")]
    ConnectInterrupted,

    #[error("Remote reset the connection")]
    PeerReset,

    #[error("Datagram send consumed {written} of {expected} bytes")]
    SendOverrun { written: usize, expected: usize },

    #[error("Malformed packet: {0}")]
    Malformed(#[from] PacketError),

    #[error("Operation not valid in state {0:?}")]
    InvalidState(ConnectionState),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Shared send primitive for the datagram channel all connections
/// multiplex over. Implemented by `utp-io`'s UDP channel; tests substitute
/// in-memory channels.
pub trait DatagramSender: Send + Sync {
    /// Send one datagram, returning the number of bytes consumed.
    fn send_datagram(&self, buf: &[u8], target: SocketAddr) -> io::Result<usize>;
}

/// Tunable connection constants
#[derive(Debug, Clone, Copy)]
pub struct ConnectionConfig {
    /// How long `connect` waits for the handshake to complete
    pub connect_timeout: Duration,
    /// Initial congestion window in bytes
    pub initial_window: usize,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        ConnectionConfig {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            initial_window: DEFAULT_INITIAL_WINDOW,
        }
    }
}

/// Reactor-owned mutable state. The lock around it is uncontended by
/// construction: the dispatch loop drives every entry point serially, and
/// the few externally callable operations only hold it briefly.
struct Core {
    remote_address: Option<SocketAddr>,
    sequence_number_counter: SeqNumber,
    last_sent_acknowledge_number: SeqNumber,
    end_of_stream_sequence_number: Option<SeqNumber>,
    input_stream_state: StreamState,
    output_stream_state: StreamState,
    resend_queue: VecDeque<UtpPacket>,
    acknowledge_queue: VecDeque<SeqNumber>,
    ack_tracker: AckTracker,
    congestion_window: CongestionWindow,
    delay_estimator: DelayEstimator,
    retransmission_timer: RetransmissionTimer,
    loss_detector: LossDetector,
    payload_sizer: PayloadSizer,
    reorderer: Option<InboundReorderer>,
}

impl Core {
    fn new(initial_window: usize) -> Self {
        Core {
            remote_address: None,
            sequence_number_counter: SeqNumber::new(0),
            last_sent_acknowledge_number: SeqNumber::new(0),
            end_of_stream_sequence_number: None,
            input_stream_state: StreamState::Active,
            output_stream_state: StreamState::Active,
            resend_queue: VecDeque::new(),
            acknowledge_queue: VecDeque::new(),
            ack_tracker: AckTracker::new(),
            congestion_window: CongestionWindow::new(initial_window),
            delay_estimator: DelayEstimator::new(),
            retransmission_timer: RetransmissionTimer::new(),
            loss_detector: LossDetector::new(),
            payload_sizer: PayloadSizer::new(),
            reorderer: None,
        }
    }

    /// Payload bytes the next DATA packet may carry: the adaptive packet
    /// size capped by what the congestion window has room for.
    fn allowed_payload_size(&self) -> usize {
        let window_room = self
            .congestion_window
            .free_capacity()
            .saturating_sub(HEADER_SIZE);
        self.payload_sizer.payload_size().min(window_room)
    }

    /// Sequence number for the next outbound packet. Only the STATE that
    /// completes a SYN handshake advances the counter; every other STATE
    /// reuses the current value, since pure acknowledgements are not part
    /// of the ordered stream.
    fn next_sequence_number(&mut self, packet_type: PacketType, state: ConnectionState) -> SeqNumber {
        if packet_type == PacketType::State && state != ConnectionState::SynReceived {
            self.sequence_number_counter
        } else {
            self.sequence_number_counter.increment();
            self.sequence_number_counter
        }
    }
}

/// A single uTP connection multiplexed over a shared datagram channel
pub struct Connection {
    state: Mutex<ConnectionState>,
    state_changed: Condvar,
    core: Mutex<Core>,
    input: SharedBuffer,
    output: SharedBuffer,
    channel: Arc<dyn DatagramSender>,
    send_connection_id: u16,
    receive_connection_id: u16,
    config: ConnectionConfig,
    clock_origin: Instant,
}

impl Connection {
    /// Create the initiating side of a connection. Packets will be sent
    /// with connection id `receive_connection_id + 1` (the SYN itself
    /// carries `receive_connection_id` so the remote learns both).
    pub fn initiate(channel: Arc<dyn DatagramSender>, receive_connection_id: u16) -> Self {
        Self::initiate_with_config(channel, receive_connection_id, ConnectionConfig::default())
    }

    pub fn initiate_with_config(
        channel: Arc<dyn DatagramSender>,
        receive_connection_id: u16,
        config: ConnectionConfig,
    ) -> Self {
        Self::new(
            channel,
            receive_connection_id.wrapping_add(1),
            receive_connection_id,
            config,
        )
    }

    /// Create the accepting side of a connection from an inbound SYN. The
    /// caller still routes the SYN through [`Connection::on_received_packet`]
    /// to drive the handshake.
    pub fn accept(channel: Arc<dyn DatagramSender>, remote: SocketAddr, syn: &UtpPacket) -> Self {
        Self::accept_with_config(channel, remote, syn, ConnectionConfig::default())
    }

    pub fn accept_with_config(
        channel: Arc<dyn DatagramSender>,
        remote: SocketAddr,
        syn: &UtpPacket,
        config: ConnectionConfig,
    ) -> Self {
        let send_id = syn.header.connection_id;
        let connection = Self::new(channel, send_id, send_id.wrapping_add(1), config);
        {
            let mut core = connection.core.lock();
            core.remote_address = Some(remote);
            core.sequence_number_counter = SeqNumber::new(rand::random());
        }
        connection
    }

    fn new(
        channel: Arc<dyn DatagramSender>,
        send_connection_id: u16,
        receive_connection_id: u16,
        config: ConnectionConfig,
    ) -> Self {
        Connection {
            state: Mutex::new(ConnectionState::Pending),
            state_changed: Condvar::new(),
            core: Mutex::new(Core::new(config.initial_window)),
            input: SharedBuffer::new(),
            output: SharedBuffer::new(),
            channel,
            send_connection_id,
            receive_connection_id,
            config,
            clock_origin: Instant::now(),
        }
    }

    /// Connection id stamped on outbound packets
    pub fn send_connection_id(&self) -> u16 {
        self.send_connection_id
    }

    /// Connection id inbound packets for this connection carry; the
    /// dispatch loop demultiplexes on it
    pub fn receive_connection_id(&self) -> u16 {
        self.receive_connection_id
    }

    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        *self.state.lock()
    }

    /// Read end of the inbound byte stream
    pub fn input_stream(&self) -> UtpInputStream {
        UtpInputStream::new(self.input.clone())
    }

    /// Write end of the outbound byte stream
    pub fn output_stream(&self) -> UtpOutputStream {
        UtpOutputStream::new(self.output.clone())
    }

    /// Send a SYN to `remote` and wait for the handshake to complete.
    ///
    /// Blocks the calling thread until the state reaches `Connected`, the
    /// configured timeout elapses ([`UtpError::ConnectTimeout`]), the wait
    /// is cancelled by a close from another thread
    /// ([`UtpError::ConnectInterrupted`]) or the remote resets
    /// ([`UtpError::PeerReset`]). The SYN is not retried here: if it is
    /// lost, the retransmission timeout re-queues it through the regular
    /// resend path.
    pub fn connect(&self, remote: SocketAddr) -> Result<(), UtpError> {
        {
            let mut core = self.core.lock();
            let state = self.state();
            if state != ConnectionState::Pending {
                return Err(UtpError::InvalidState(state));
            }
            core.remote_address = Some(remote);
            self.build_and_send(&mut core, PacketType::Syn, Bytes::new())?;
            self.set_connection_state(&mut core, ConnectionState::SynSent);
        }

        let deadline = Instant::now() + self.config.connect_timeout;
        let mut state = self.state.lock();
        loop {
            match *state {
                ConnectionState::Connected => return Ok(()),
                ConnectionState::Reset => return Err(UtpError::PeerReset),
                ConnectionState::Closing | ConnectionState::Closed => {
                    return Err(UtpError::ConnectInterrupted)
                }
                _ => {}
            }
            if Instant::now() >= deadline {
                return Err(UtpError::ConnectTimeout);
            }
            let _ = self.state_changed.wait_until(&mut state, deadline);
        }
    }

    /// Update the connection from a received packet.
    ///
    /// The single entry point for every inbound packet the dispatch loop
    /// routes to this connection.
    pub fn on_received_packet(&self, packet: UtpPacket) {
        let now = self.now_micros();
        let mut core = self.core.lock();

        trace!(
            connection = self.send_connection_id,
            packet_type = %packet.packet_type(),
            seq = %packet.header.sequence_number,
            "received packet"
        );

        let confirmed = core.ack_tracker.on_received_packet(&packet);

        if let Some(gap) = core.loss_detector.on_received_packet(&packet) {
            if let Some(lost) = core.ack_tracker.get(gap).cloned() {
                trace!(
                    connection = self.send_connection_id,
                    seq = %gap,
                    "duplicate acknowledgements signal a gap, scheduling resend"
                );
                self.schedule_resend(&mut core, lost);
            }
        }

        core.retransmission_timer.on_received_packet();

        let mut confirmed_bytes = 0;
        for acked in &confirmed {
            core.congestion_window.on_packet_confirmed(acked);
            core.retransmission_timer.on_acked_packet(acked, now);
            confirmed_bytes += acked.wire_size();
        }
        if core.ack_tracker.is_empty() && core.resend_queue.is_empty() {
            core.retransmission_timer.clear();
        }

        core.payload_sizer.on_received_packet(confirmed_bytes);

        if let Some(delay) = core.delay_estimator.on_received_packet(&packet, now) {
            core.congestion_window.on_delay_sample(delay);
        }

        match packet.packet_type() {
            PacketType::Syn => self.on_syn(&mut core, &packet),
            PacketType::State => self.on_state(&mut core, &packet),
            PacketType::Data => self.on_data(&mut core, packet),
            PacketType::Fin => self.on_fin(&mut core, &packet),
            PacketType::Reset => self.on_reset(&mut core),
        }

        self.try_finish_teardown(&mut core);
    }

    /// Re-queue a previously sent packet that has not arrived on the
    /// remote. The loss shrinks both the congestion window and the payload
    /// size.
    pub fn resend(&self, packet: UtpPacket) {
        let mut core = self.core.lock();
        self.schedule_resend(&mut core, packet);
    }

    /// Queue a sequence number to be acknowledged on a following outbound
    /// packet.
    pub fn acknowledge_packet(&self, sequence_number: SeqNumber) {
        self.core.lock().acknowledge_queue.push_back(sequence_number);
    }

    /// Drain pending work onto the wire: queued resends first, then fresh
    /// payload as the window and packet size allow, then a lazy FIN once
    /// the output has shut down, then standalone acknowledgements.
    ///
    /// Invoked periodically by the owning dispatch loop.
    pub fn process_send_queue(&self) -> Result<(), UtpError> {
        let mut core = self.core.lock();
        // A connection that reached Closed may still owe the remote the
        // acknowledgement of its FIN; only Pending and Reset suppress sends.
        if matches!(
            self.state(),
            ConnectionState::Pending | ConnectionState::Reset
        ) {
            return Ok(());
        }

        loop {
            if let Some(packet) = core.resend_queue.pop_front() {
                self.send_packet(&mut core, packet, false)?;
                continue;
            }

            let max_payload = core.allowed_payload_size();
            let chunk = self.output.drain(max_payload);

            if !chunk.is_empty() {
                let drained_to_limit = chunk.len() == max_payload;
                self.build_and_send(&mut core, PacketType::Data, chunk)?;
                if drained_to_limit {
                    // A full packet suggests more data is queued behind it
                    continue;
                }
                break;
            } else if self.output.is_empty()
                && core.output_stream_state == StreamState::ShutdownPending
            {
                self.build_and_send(&mut core, PacketType::Fin, Bytes::new())?;
                core.output_stream_state = StreamState::Shutdown;
                break;
            } else if !core.acknowledge_queue.is_empty() {
                self.send_state_packets(&mut core, max_payload)?;
                break;
            } else {
                break;
            }
        }

        self.try_finish_teardown(&mut core);
        Ok(())
    }

    /// Check the retransmission timer; on expiry shrink the congestion
    /// state aggressively and mark every outstanding packet for resend.
    ///
    /// Invoked periodically by the owning dispatch loop.
    pub fn process_timeout(&self) {
        let mut core = self.core.lock();
        if !core.retransmission_timer.is_timeout_expired() {
            return;
        }

        trace!(
            connection = self.send_connection_id,
            window = core.congestion_window.max_window(),
            bytes_in_flight = core.congestion_window.bytes_in_flight(),
            packet_size = core.payload_sizer.packet_size(),
            resend_queue = core.resend_queue.len(),
            acknowledge_queue = core.acknowledge_queue.len(),
            "connection triggered timeout"
        );

        core.retransmission_timer.on_timeout();
        core.payload_sizer.on_timeout();
        core.congestion_window.on_timeout();

        let queued: Vec<SeqNumber> = core
            .resend_queue
            .iter()
            .map(|p| p.header.sequence_number)
            .collect();
        let candidates: Vec<UtpPacket> = core
            .ack_tracker
            .outstanding()
            .filter(|p| !queued.contains(&p.header.sequence_number))
            .cloned()
            .collect();
        core.resend_queue.extend(candidates);
    }

    /// Request output shutdown. The FIN goes out lazily on a following
    /// [`Connection::process_send_queue`] once buffered data has drained.
    pub fn close(&self) {
        let mut core = self.core.lock();
        self.close_locked(&mut core);
    }

    /// Whether the connection is unusable for I/O
    pub fn is_closed(&self) -> bool {
        matches!(
            self.state(),
            ConnectionState::Pending | ConnectionState::Closed | ConnectionState::Reset
        )
    }

    /// Whether the handshake has completed
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Whether the inbound direction has been shut down
    pub fn is_input_shutdown(&self) -> bool {
        self.core.lock().input_stream_state != StreamState::Active
    }

    /// Whether the outbound direction has been shut down
    pub fn is_output_shutdown(&self) -> bool {
        self.core.lock().output_stream_state != StreamState::Active
    }

    /// Whether teardown is complete: the remote reset the connection, or
    /// both directions have shut down, every inbound byte through the FIN
    /// has been delivered, and nothing is left in flight.
    pub fn is_shutdown(&self) -> bool {
        let core = self.core.lock();
        self.is_shutdown_locked(&core)
    }

    fn is_shutdown_locked(&self, core: &Core) -> bool {
        if self.state() == ConnectionState::Reset {
            return true;
        }

        core.input_stream_state == StreamState::Shutdown
            && core
                .end_of_stream_sequence_number
                .map(|eos| {
                    core.reorderer
                        .as_ref()
                        .map(|r| r.is_complete_until(eos))
                        .unwrap_or(true)
                })
                .unwrap_or(false)
            && core.output_stream_state == StreamState::Shutdown
            && core.congestion_window.bytes_in_flight() == 0
    }

    // Inbound dispatch

    fn on_syn(&self, core: &mut Core, packet: &UtpPacket) {
        let seq = packet.header.sequence_number;
        core.acknowledge_queue.push_back(seq);

        if matches!(
            self.state(),
            ConnectionState::Pending | ConnectionState::SynReceived
        ) {
            core.last_sent_acknowledge_number = seq;
            self.set_connection_state(core, ConnectionState::SynReceived);
        }
    }

    fn on_state(&self, core: &mut Core, packet: &UtpPacket) {
        if self.state() == ConnectionState::SynSent {
            core.last_sent_acknowledge_number = packet.header.sequence_number;
            self.set_connection_state(core, ConnectionState::Connected);
        }
    }

    fn on_data(&self, core: &mut Core, packet: UtpPacket) {
        if self.state() == ConnectionState::SynReceived {
            self.set_connection_state(core, ConnectionState::Connected);
        }

        let seq = packet.header.sequence_number;
        if let Some(reorderer) = core.reorderer.as_mut() {
            let released = reorderer.insert(seq, packet.payload);
            if !released.is_empty() {
                self.input.push_chunks(released);
            }
            // An in-order arrival acknowledges its own sequence number.
            // While a gap is open the frontier repeats instead, which the
            // remote reads as the duplicate-ack loss signal.
            let frontier = reorderer.next_expected() - 1;
            core.acknowledge_queue.push_back(frontier);
        } else {
            core.acknowledge_queue.push_back(seq);
        }
        self.update_input_finished(core);
    }

    fn on_fin(&self, core: &mut Core, packet: &UtpPacket) {
        let seq = packet.header.sequence_number;

        // The FIN occupies a sequence number of its own; an empty entry in
        // the reorderer lets the completeness check cover out-of-order FINs.
        if let Some(reorderer) = core.reorderer.as_mut() {
            reorderer.insert(seq, Bytes::new());
            let frontier = reorderer.next_expected() - 1;
            core.acknowledge_queue.push_back(frontier);
        } else {
            core.acknowledge_queue.push_back(seq);
        }

        core.end_of_stream_sequence_number = Some(seq);
        core.input_stream_state = StreamState::Shutdown;
        self.set_connection_state(core, ConnectionState::Closing);
        if core.output_stream_state == StreamState::Active {
            self.close_locked(core);
        }
        self.update_input_finished(core);
    }

    fn on_reset(&self, core: &mut Core) {
        self.set_connection_state(core, ConnectionState::Reset);
        self.input.set_reset();
        self.output.set_reset();
    }

    // Outbound path

    fn build_and_send(
        &self,
        core: &mut Core,
        packet_type: PacketType,
        payload: Bytes,
    ) -> Result<(), UtpError> {
        let connection_id = if packet_type == PacketType::Syn {
            self.send_connection_id.wrapping_sub(1)
        } else {
            self.send_connection_id
        };

        let header = PacketHeader {
            packet_type,
            version: PROTOCOL_VERSION,
            extension: 0,
            connection_id,
            timestamp_micros: 0,
            timestamp_difference_micros: 0,
            window_size: core.congestion_window.bytes_in_flight() as u32,
            sequence_number: core.next_sequence_number(packet_type, self.state()),
            acknowledge_number: SeqNumber::new(0),
        };

        self.send_packet(core, UtpPacket::new(header, payload), true)
    }

    fn send_packet(
        &self,
        core: &mut Core,
        mut packet: UtpPacket,
        renew_acknowledge_number: bool,
    ) -> Result<(), UtpError> {
        let mut acknowledge_number = core.last_sent_acknowledge_number;
        if !renew_acknowledge_number {
            // A retransmission already carries a valid acknowledge number
            acknowledge_number = packet.header.acknowledge_number;
        } else if let Some(queued) = core.acknowledge_queue.pop_front() {
            acknowledge_number = queued;
            core.last_sent_acknowledge_number = queued;
        }

        packet.header.renew(
            acknowledge_number,
            self.now_micros(),
            core.delay_estimator.measured_delay(),
        );

        let remote = core
            .remote_address
            .ok_or_else(|| UtpError::InvalidState(self.state()))?;
        let buffer = packet.to_bytes();

        trace!(
            connection = self.send_connection_id,
            packet_type = %packet.packet_type(),
            seq = %packet.header.sequence_number,
            ack = %packet.header.acknowledge_number,
            bytes = buffer.len(),
            "writing packet"
        );

        let written = self.channel.send_datagram(&buffer, remote)?;

        core.ack_tracker.on_sent_packet(&packet);
        core.retransmission_timer.on_sent_packet();
        core.congestion_window.on_packet_sent(&packet);

        if written < buffer.len() {
            // The packet stays registered as outstanding, so the loss is
            // recovered through the regular timeout/resend path.
            tracing::error!(
                connection = self.send_connection_id,
                written,
                expected = buffer.len(),
                "datagram send consumed fewer bytes than the packet holds"
            );
            return Err(UtpError::SendOverrun {
                written,
                expected: buffer.len(),
            });
        }
        Ok(())
    }

    /// Send at least one standalone STATE packet, each draining one queued
    /// acknowledgement, bounded so a backlog cannot flush in one burst.
    fn send_state_packets(&self, core: &mut Core, max_payload: usize) -> Result<(), UtpError> {
        let burst = core
            .acknowledge_queue
            .len()
            .min((max_payload / HEADER_SIZE).max(1));

        if burst > 1 {
            trace!(
                connection = self.send_connection_id,
                packets = burst,
                "sending ST_STATE burst"
            );
        }

        for _ in 0..burst {
            self.build_and_send(core, PacketType::State, Bytes::new())?;
        }
        Ok(())
    }

    fn schedule_resend(&self, core: &mut Core, packet: UtpPacket) {
        core.congestion_window.on_packet_loss(&packet);
        core.payload_sizer.on_packet_loss();
        core.resend_queue.push_back(packet);
    }

    // Lifecycle helpers

    fn close_locked(&self, core: &mut Core) {
        if self.state() == ConnectionState::Reset {
            return;
        }
        self.set_connection_state(core, ConnectionState::Closing);
        if core.output_stream_state == StreamState::Active {
            core.output_stream_state = StreamState::ShutdownPending;
        }
        self.output.set_finished();
    }

    fn try_finish_teardown(&self, core: &mut Core) {
        if self.state() == ConnectionState::Closing && self.is_shutdown_locked(core) {
            self.set_connection_state(core, ConnectionState::Closed);
        }
    }

    /// Mark the inbound stream delivered once every byte through the FIN
    /// has been released to the application.
    fn update_input_finished(&self, core: &Core) {
        if core.input_stream_state != StreamState::Shutdown {
            return;
        }
        let Some(eos) = core.end_of_stream_sequence_number else {
            return;
        };
        let complete = core
            .reorderer
            .as_ref()
            .map(|r| r.is_complete_until(eos))
            .unwrap_or(true);
        if complete {
            self.input.set_finished();
        }
    }

    /// Every transition, including no-op ones, broadcasts to state waiters.
    /// Reaching `Connected` constructs the reorderer seeded with the next
    /// sequence number expected from the remote.
    fn set_connection_state(&self, core: &mut Core, new_state: ConnectionState) {
        {
            let mut state = self.state.lock();
            trace!(
                connection = self.send_connection_id,
                from = ?*state,
                to = ?new_state,
                "transitioning connection state"
            );
            *state = new_state;
        }

        if new_state == ConnectionState::Connected {
            core.reorderer = Some(InboundReorderer::new(
                core.last_sent_acknowledge_number.next(),
            ));
        }

        self.state_changed.notify_all();
    }

    fn now_micros(&self) -> u32 {
        self.clock_origin.elapsed().as_micros() as u32
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("send_connection_id", &self.send_connection_id)
            .field("state", &self.state())
            .finish()
    }
}
