//! The mixing node.
//!
//! [`FloatMix`] owns one output port (id 0, always present) and up to
//! [`MAX_PORTS`] input ports in a fixed slot table. Configuration calls
//! negotiate a single node-wide format, install host buffers and bind IO areas;
//! [`FloatMix::process`] then runs one mixing cycle per call.
//!
//! # Cycle Protocol
//!
//! Hosts and the node communicate through each port's [`IoBuffers`] area:
//!
//! 1. The host names a filled input buffer and sets the input status to
//!    [`Status::HAVE_BUFFER`].
//! 2. `process()` consumes every ready input (status flips to
//!    [`Status::NEED_BUFFER`]), takes a free output buffer, and publishes it on
//!    the output area with [`Status::HAVE_BUFFER`].
//! 3. The host reads the output through [`FloatMix::output_buffer`] and either
//!    returns it with [`FloatMix::port_reuse_buffer`] or clears the output
//!    status, in which case the next cycle recycles the buffer itself.
//!
//! Every method takes `&self` or `&mut self`, so a cycle can never overlap a
//! configuration change.

use core::fmt;
use std::sync::Arc;

use crate::buffer::{Chunk, DataBlock, HostBuffer, OutputData};
use crate::command::{Command, NodeState};
use crate::error::{NodeError, Result};
use crate::format::{AudioFormat, AudioInfo};
use crate::io::{INVALID_ID, IoArea, IoBuffers, IoType, Status};
use crate::mix::{mix_2, mix_accumulate};
use crate::params::{ParamIter, ParamType, PortQuery};
use crate::pod::ParamObject;
use crate::port::{Direction, Port, PortInfo, PortProps};
use crate::{MAX_PORTS, MAX_SAMPLES, SAMPLE_SIZE};

/// Port counts reported by [`FloatMix::port_counts`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortCounts {
    /// Allocated input ports.
    pub n_inputs: u32,
    /// Input port capacity.
    pub max_inputs: u32,
    /// Output ports (always 1).
    pub n_outputs: u32,
    /// Output port capacity (always 1).
    pub max_outputs: u32,
}

/// A produced output buffer.
///
/// Single-input cycles alias the input buffer instead of copying it; every
/// other cycle publishes the node's scratch buffer. Both borrow from the node
/// and are valid until the next mutating call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputView<'a> {
    /// Samples summed (or silenced) into the node's scratch buffer.
    Mixed {
        /// Produced samples.
        samples: &'a [f32],
        /// Chunk describing `samples`.
        chunk: Chunk,
    },
    /// The single ready input, passed through untouched.
    Passthrough {
        /// Input port the buffer belongs to.
        port_id: u32,
        /// Buffer id on that input port.
        buffer_id: u32,
        /// The input's chunk samples.
        samples: &'a [f32],
        /// The input's chunk.
        chunk: Chunk,
    },
}

impl<'a> OutputView<'a> {
    /// Produced samples.
    pub fn samples(&self) -> &'a [f32] {
        match self {
            Self::Mixed { samples, .. } | Self::Passthrough { samples, .. } => samples,
        }
    }

    /// Chunk describing the produced samples.
    pub fn chunk(&self) -> Chunk {
        match self {
            Self::Mixed { chunk, .. } | Self::Passthrough { chunk, .. } => *chunk,
        }
    }

    /// Returns `true` if the output aliases an input buffer.
    pub fn is_passthrough(&self) -> bool {
        matches!(self, Self::Passthrough { .. })
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct ReadyInput {
    port_id: u32,
    buffer_id: u32,
}

/// Real-time mixing node for mono float streams.
///
/// See the [module documentation](self) for the cycle protocol.
pub struct FloatMix {
    in_ports: Box<[Port]>,
    out_port: Port,
    port_count: u32,
    last_port: u32,
    format: Option<AudioInfo>,
    n_formats: u32,
    stride: usize,
    state: NodeState,
    scratch: Box<[f32; MAX_SAMPLES]>,
}

impl FloatMix {
    /// Creates a node with only the output port.
    pub fn new() -> Self {
        let mut out_port = Port::new(0, PortInfo::OUTPUT);
        out_port.valid = true;
        Self {
            in_ports: (0..MAX_PORTS as u32)
                .map(|id| Port::new(id, PortInfo::INPUT))
                .collect(),
            out_port,
            port_count: 0,
            last_port: 0,
            format: None,
            n_formats: 0,
            stride: 0,
            state: NodeState::Stopped,
            scratch: Box::new([0.0; MAX_SAMPLES]),
        }
    }

    // --- Commands ---

    /// Applies a host command. Only [`Command::Start`] and [`Command::Pause`]
    /// are handled.
    pub fn send_command(&mut self, command: Command) -> Result<()> {
        let next = self
            .state
            .transition(command)
            .ok_or(NodeError::UnsupportedCommand(command))?;
        #[cfg(feature = "tracing")]
        tracing::info!("floatmix: command {command:?}, {:?} -> {next:?}", self.state);
        self.state = next;
        Ok(())
    }

    /// Current run state.
    pub fn state(&self) -> NodeState {
        self.state
    }

    /// The node has no node-level parameters.
    pub fn enum_params(
        &self,
        _id: ParamType,
        _index: &mut u32,
        _filter: Option<&ParamObject>,
    ) -> Result<Option<ParamObject>> {
        Err(NodeError::Unsupported("node parameters"))
    }

    /// The node has no node-level parameters.
    pub fn set_param(&mut self, _id: ParamType, _param: Option<&ParamObject>) -> Result<()> {
        Err(NodeError::Unsupported("node parameters"))
    }

    // --- Port table ---

    /// Number of allocated and maximum ports per direction.
    pub fn port_counts(&self) -> PortCounts {
        PortCounts {
            n_inputs: self.port_count,
            max_inputs: MAX_PORTS as u32,
            n_outputs: 1,
            max_outputs: 1,
        }
    }

    /// Fills `inputs` with valid input ids in ascending order and `outputs`
    /// with the output id, stopping at each slice's capacity.
    ///
    /// Returns the number of ids written to each slice.
    pub fn port_ids(&self, inputs: &mut [u32], outputs: &mut [u32]) -> (usize, usize) {
        let mut n_in = 0;
        for (slot, id) in inputs.iter_mut().zip(self.input_port_ids()) {
            *slot = id;
            n_in += 1;
        }
        let n_out = match outputs.first_mut() {
            Some(slot) => {
                *slot = 0;
                1
            }
            None => 0,
        };
        (n_in, n_out)
    }

    /// Valid input port ids in ascending order.
    pub fn input_port_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.in_ports[..self.last_port as usize]
            .iter()
            .filter(|p| p.valid)
            .map(|p| p.id)
    }

    /// One past the highest valid input port id.
    pub fn last_port(&self) -> u32 {
        self.last_port
    }

    /// Allocates input port `port_id` with default properties.
    pub fn add_port(&mut self, direction: Direction, port_id: u32) -> Result<()> {
        let port = match direction {
            Direction::Input => self.in_ports.get_mut(port_id as usize),
            Direction::Output => None,
        }
        .ok_or(NodeError::InvalidPort { direction, port_id })?;
        if port.valid {
            return Err(NodeError::PortExists(port_id));
        }

        port.reset();
        port.valid = true;
        self.port_count += 1;
        self.last_port = self.last_port.max(port_id + 1);

        #[cfg(feature = "tracing")]
        tracing::info!("floatmix: add port {port_id}, last port {}", self.last_port);
        Ok(())
    }

    /// Releases input port `port_id`, giving up its share of the node format.
    pub fn remove_port(&mut self, direction: Direction, port_id: u32) -> Result<()> {
        if direction != Direction::Input {
            return Err(NodeError::InvalidPort { direction, port_id });
        }
        let port = self.port_mut(direction, port_id)?;
        let had_format = port.have_format;
        port.reset();

        self.port_count -= 1;
        if had_format {
            self.release_format();
        }
        if port_id + 1 == self.last_port {
            self.last_port = self.in_ports[..port_id as usize]
                .iter()
                .rposition(|p| p.valid)
                .map_or(0, |i| i as u32 + 1);
        }

        #[cfg(feature = "tracing")]
        tracing::info!("floatmix: remove port {port_id}, last port {}", self.last_port);
        Ok(())
    }

    /// Capability descriptor of a port.
    pub fn port_info(&self, direction: Direction, port_id: u32) -> Result<PortInfo> {
        Ok(self.port(direction, port_id)?.info)
    }

    /// Volume and mute of a port.
    pub fn port_props(&self, direction: Direction, port_id: u32) -> Result<PortProps> {
        Ok(self.port(direction, port_id)?.props)
    }

    /// Replaces the volume and mute of a port. The values are not applied to
    /// the mix.
    pub fn set_port_props(
        &mut self,
        direction: Direction,
        port_id: u32,
        props: PortProps,
    ) -> Result<()> {
        self.port_mut(direction, port_id)?.props = props;
        Ok(())
    }

    // --- Negotiation ---

    /// Produces the next candidate of parameter category `id` for a port.
    ///
    /// `index` is the caller's cursor: it starts at 0 and is advanced by one
    /// for every candidate examined. `Ok(None)` marks the end of the list.
    pub fn port_enum_params(
        &self,
        direction: Direction,
        port_id: u32,
        id: ParamType,
        index: &mut u32,
        filter: Option<&ParamObject>,
    ) -> Result<Option<ParamObject>> {
        let port = self.port(direction, port_id)?;
        PortQuery {
            direction,
            port_id,
            have_format: port.have_format,
            format: self.format.as_ref(),
            stride: self.stride,
        }
        .enumerate(id, index, filter)
    }

    /// Iterator over [`port_enum_params`](Self::port_enum_params).
    pub fn port_params<'a>(
        &'a self,
        direction: Direction,
        port_id: u32,
        id: ParamType,
        filter: Option<&'a ParamObject>,
    ) -> ParamIter<'a> {
        ParamIter::new(self, direction, port_id, id, filter)
    }

    /// Sets a port parameter. Only [`ParamType::Format`] is settable.
    pub fn port_set_param(
        &mut self,
        direction: Direction,
        port_id: u32,
        id: ParamType,
        param: Option<&ParamObject>,
    ) -> Result<()> {
        self.port(direction, port_id)?;
        match id {
            ParamType::Format => self.port_set_format(direction, port_id, param),
            _ => Err(NodeError::UnknownParam(id)),
        }
    }

    /// Negotiates (`Some`) or clears (`None`) the format of a port.
    ///
    /// The first accepted proposal becomes the node-wide format and must use
    /// 32-bit float samples. While any port holds the node format, every
    /// proposal must match it exactly. Rejected proposals change nothing.
    /// Clearing drops the port's buffers and, for the last holder, the node
    /// format itself.
    pub fn port_set_format(
        &mut self,
        direction: Direction,
        port_id: u32,
        format: Option<&ParamObject>,
    ) -> Result<()> {
        self.port(direction, port_id)?;

        let Some(format) = format else {
            let port = self.port_mut(direction, port_id)?;
            if port.have_format {
                port.have_format = false;
                if !port.pool.is_empty() {
                    #[cfg(feature = "tracing")]
                    tracing::info!("floatmix: clear buffers on {direction} port {port_id}");
                    port.pool.clear();
                }
                self.release_format();
                #[cfg(feature = "tracing")]
                tracing::info!("floatmix: clear format on {direction} port {port_id}");
            }
            return Ok(());
        };

        let info = AudioInfo::parse(format)?;
        match &self.format {
            Some(current) if *current != info => return Err(NodeError::FormatMismatch),
            Some(_) => {}
            None => {
                if info.format != AudioFormat::F32 {
                    return Err(NodeError::UnsupportedSampleFormat(info.format));
                }
                self.stride = info.stride();
                self.format = Some(info);
            }
        }

        let port = self.port_mut(direction, port_id)?;
        if !port.have_format {
            port.have_format = true;
            self.n_formats += 1;
            #[cfg(feature = "tracing")]
            tracing::info!(
                "floatmix: set format on {direction} port {port_id}: {:?} {} Hz {} ch",
                info.format,
                info.rate,
                info.channels
            );
        }
        Ok(())
    }

    /// The node-wide format, if any port holds one.
    pub fn format(&self) -> Option<&AudioInfo> {
        self.format.as_ref()
    }

    /// Number of ports holding the node-wide format.
    pub fn format_refcount(&self) -> u32 {
        self.n_formats
    }

    /// Bytes per sample of the negotiated format, 0 before negotiation.
    pub fn stride(&self) -> usize {
        self.stride
    }

    fn release_format(&mut self) {
        self.n_formats = self.n_formats.saturating_sub(1);
        if self.n_formats == 0 {
            self.format = None;
        }
    }

    // --- Buffers ---

    /// Replaces the buffer set of a port.
    ///
    /// Requires a negotiated format on the port. Output buffers start on the
    /// free queue; input buffers are handed to the node by the host through
    /// the port's IO area. A rejected set leaves the previous one installed.
    pub fn port_use_buffers(
        &mut self,
        direction: Direction,
        port_id: u32,
        buffers: Vec<HostBuffer>,
    ) -> Result<()> {
        let port = self.port_mut(direction, port_id)?;
        if !port.have_format {
            return Err(NodeError::NoFormat { direction, port_id });
        }

        #[cfg(feature = "tracing")]
        tracing::info!(
            "floatmix: use {} buffers on {direction} port {port_id}",
            buffers.len()
        );
        port.pool.install(buffers, direction == Direction::Output)
    }

    /// The node never allocates buffers; hosts must use
    /// [`port_use_buffers`](Self::port_use_buffers).
    pub fn port_alloc_buffers(&mut self, _direction: Direction, _port_id: u32) -> Result<()> {
        Err(NodeError::Unsupported("buffer allocation"))
    }

    /// Returns output buffer `buffer_id` to the free queue.
    pub fn port_reuse_buffer(&mut self, port_id: u32, buffer_id: u32) -> Result<()> {
        let port = self.port_mut(Direction::Output, port_id)?;
        if !port.pool.contains(buffer_id) {
            return Err(NodeError::UnknownBuffer(buffer_id));
        }
        port.pool.enqueue(buffer_id)
    }

    /// Host access to an installed buffer descriptor.
    pub fn port_buffer(
        &self,
        direction: Direction,
        port_id: u32,
        buffer_id: u32,
    ) -> Result<&HostBuffer> {
        self.port(direction, port_id)?
            .pool
            .get(buffer_id)
            .map(|slot| slot.host())
            .ok_or(NodeError::UnknownBuffer(buffer_id))
    }

    /// Mutable host access to an installed buffer descriptor, used to fill
    /// input blocks and update chunks between cycles.
    pub fn port_buffer_mut(
        &mut self,
        direction: Direction,
        port_id: u32,
        buffer_id: u32,
    ) -> Result<&mut HostBuffer> {
        self.port_mut(direction, port_id)?
            .pool
            .get_mut(buffer_id)
            .map(|slot| slot.host_mut())
            .ok_or(NodeError::UnknownBuffer(buffer_id))
    }

    /// Number of installed buffers on a port.
    pub fn port_n_buffers(&self, direction: Direction, port_id: u32) -> Result<u32> {
        Ok(self.port(direction, port_id)?.pool.len())
    }

    /// Chunk bytes currently sitting on a port's free queue.
    pub fn port_queued_bytes(&self, direction: Direction, port_id: u32) -> Result<usize> {
        Ok(self.port(direction, port_id)?.pool.queued_bytes())
    }

    /// Resolves a produced output buffer to its samples.
    ///
    /// Returns `None` for unknown ids, buffers never produced or since returned
    /// to the free queue, and passthrough outputs whose input buffer has since
    /// been removed.
    pub fn output_buffer(&self, buffer_id: u32) -> Option<OutputView<'_>> {
        let slot = self.out_port.pool.get(buffer_id)?;
        match slot.output() {
            OutputData::Idle => None,
            OutputData::Mixed(chunk) => Some(OutputView::Mixed {
                samples: &self.scratch[..chunk.size as usize / SAMPLE_SIZE],
                chunk,
            }),
            OutputData::Passthrough { port_id, buffer_id } => {
                let block = self
                    .port(Direction::Input, port_id)
                    .ok()?
                    .pool
                    .get(buffer_id)?
                    .host()
                    .first()?;
                Some(OutputView::Passthrough {
                    port_id,
                    buffer_id,
                    samples: block.chunk_samples(),
                    chunk: block.chunk,
                })
            }
        }
    }

    // --- IO ---

    /// Binds (`Some`) or unbinds (`None`) an IO area on a port.
    ///
    /// Only [`IoType::Buffers`] and [`IoType::Range`] are accepted.
    pub fn port_set_io(
        &mut self,
        direction: Direction,
        port_id: u32,
        id: IoType,
        area: Option<IoArea>,
    ) -> Result<()> {
        let port = self.port_mut(direction, port_id)?;
        match (id, area) {
            (IoType::Buffers, None) => port.io = None,
            (IoType::Buffers, Some(IoArea::Buffers(io))) => port.io = Some(io),
            (IoType::Range, None) => port.range = None,
            (IoType::Range, Some(IoArea::Range(range))) => port.range = Some(range),
            (IoType::Control, _) => return Err(NodeError::UnknownIo(id)),
            (_, Some(_)) => return Err(NodeError::IoMismatch(id)),
        }
        Ok(())
    }

    /// The buffer IO area bound to a port.
    pub fn port_io(&self, direction: Direction, port_id: u32) -> Result<Option<Arc<IoBuffers>>> {
        Ok(self.port(direction, port_id)?.io.clone())
    }

    /// Per-port commands are not supported.
    pub fn port_send_command(
        &mut self,
        _direction: Direction,
        _port_id: u32,
        _command: Command,
    ) -> Result<()> {
        Err(NodeError::Unsupported("port commands"))
    }

    // --- Processing ---

    /// Runs one mixing cycle.
    ///
    /// Returns the output status unchanged while the host has not consumed the
    /// previous output, [`NodeError::OutOfBuffers`] when no output buffer is
    /// free (inputs stay unconsumed), and `HAVE_BUFFER | NEED_BUFFER` after
    /// publishing a new output buffer.
    ///
    /// Never allocates, locks, or blocks.
    pub fn process(&mut self) -> Result<Status> {
        let out_io = self
            .out_port
            .io
            .as_deref()
            .ok_or(NodeError::OutputIoUnbound)?;

        let status = out_io.status();
        if status.contains(Status::HAVE_BUFFER) {
            return Ok(status);
        }

        // recycle
        let stale = out_io.buffer_id();
        if self.out_port.pool.contains(stale) {
            if self.out_port.pool.enqueue(stale).is_err() {
                #[cfg(feature = "tracing")]
                tracing::trace!("floatmix: output buffer {stale} already queued");
            }
            out_io.set_buffer_id(INVALID_ID);
        }

        let mut max_bytes = MAX_SAMPLES * SAMPLE_SIZE;
        if let Some(range) = &self.out_port.range {
            max_bytes = max_bytes.min(range.max_size() as usize);
        }

        let mut ready = [ReadyInput::default(); MAX_PORTS];
        let mut n_ready = 0;
        for port in &self.in_ports[..self.last_port as usize] {
            let Some(io) = port.io.as_deref().filter(|_| port.valid) else {
                continue;
            };
            let buffer_id = io.buffer_id();
            let block = port
                .pool
                .get(buffer_id)
                .and_then(|slot| slot.host().first());
            let Some(block) = block.filter(|_| io.status() == Status::HAVE_BUFFER) else {
                #[cfg(feature = "tracing")]
                tracing::trace!(
                    "floatmix: skip input {} status {} buffer {buffer_id}",
                    port.id,
                    io.status()
                );
                continue;
            };

            #[cfg(feature = "tracing")]
            tracing::trace!("floatmix: mix input {} buffer {buffer_id}", port.id);
            let bytes = block.chunk.size.min(block.available_bytes());
            max_bytes = max_bytes.min(bytes as usize);
            ready[n_ready] = ReadyInput {
                port_id: port.id,
                buffer_id,
            };
            n_ready += 1;
        }
        let ready = &ready[..n_ready];

        let Some(out_id) = self.out_port.pool.dequeue() else {
            #[cfg(feature = "tracing")]
            tracing::trace!("floatmix: out of buffers");
            return Err(NodeError::OutOfBuffers);
        };

        for r in ready {
            if let Some(io) = &self.in_ports[r.port_id as usize].io {
                io.set_status(Status::NEED_BUFFER);
            }
        }

        let n_samples = max_bytes / SAMPLE_SIZE;
        let output = match ready {
            [single] => OutputData::Passthrough {
                port_id: single.port_id,
                buffer_id: single.buffer_id,
            },
            [] => {
                self.scratch[..n_samples].fill(0.0);
                OutputData::Mixed(Chunk::samples(n_samples))
            }
            [first, second, rest @ ..] => {
                let dst = &mut self.scratch[..n_samples];
                mix_2(
                    dst,
                    input_samples(&self.in_ports, first),
                    input_samples(&self.in_ports, second),
                );
                for r in rest {
                    mix_accumulate(dst, input_samples(&self.in_ports, r));
                }
                OutputData::Mixed(Chunk::samples(n_samples))
            }
        };
        if let Some(slot) = self.out_port.pool.get_mut(out_id) {
            slot.set_output(output);
        }

        out_io.set_buffer_id(out_id);
        out_io.set_status(Status::HAVE_BUFFER);
        Ok(Status::HAVE_BUFFER.union(Status::NEED_BUFFER))
    }

    // --- Helpers ---

    fn port(&self, direction: Direction, port_id: u32) -> Result<&Port> {
        let port = match direction {
            Direction::Output if port_id == 0 => Some(&self.out_port),
            Direction::Output => None,
            Direction::Input => self.in_ports.get(port_id as usize).filter(|p| p.valid),
        };
        port.ok_or(NodeError::InvalidPort { direction, port_id })
    }

    fn port_mut(&mut self, direction: Direction, port_id: u32) -> Result<&mut Port> {
        let port = match direction {
            Direction::Output if port_id == 0 => Some(&mut self.out_port),
            Direction::Output => None,
            Direction::Input => self
                .in_ports
                .get_mut(port_id as usize)
                .filter(|p| p.valid),
        };
        port.ok_or(NodeError::InvalidPort { direction, port_id })
    }
}

fn input_samples<'a>(ports: &'a [Port], ready: &ReadyInput) -> &'a [f32] {
    ports[ready.port_id as usize]
        .pool
        .get(ready.buffer_id)
        .and_then(|slot| slot.host().first())
        .map(DataBlock::chunk_samples)
        .unwrap_or(&[])
}

impl Default for FloatMix {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FloatMix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FloatMix")
            .field("port_count", &self.port_count)
            .field("last_port", &self.last_port)
            .field("format", &self.format)
            .field("n_formats", &self.n_formats)
            .field("stride", &self.stride)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
