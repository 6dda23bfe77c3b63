//! Floatmix Core - a real-time mixing node for mono float streams
//!
//! This crate implements a pull-driven audio mixing node. An external scheduler
//! owns the processing graph and calls [`FloatMix::process`] once per cycle; the
//! node sums every ready input port into a single output buffer without
//! allocating or copying on the hot path.
//!
//! # Core Abstractions
//!
//! ## Node
//!
//! - [`FloatMix`] - The node: port table, negotiated format, scratch buffer, state
//! - [`Command`] / [`NodeState`] - Start/pause notifications from the host
//!
//! ## Ports and Buffers
//!
//! - [`Direction`], [`PortInfo`], [`PortFlags`], [`PortProps`] - Port description
//! - [`HostBuffer`], [`DataBlock`], [`Chunk`] - Host-supplied buffer descriptors
//! - [`BufferPool`] - Fixed slot table plus FIFO free-queue per port
//! - [`IoBuffers`], [`IoRange`] - Shared IO areas used to hand buffers back and forth
//!
//! ## Negotiation
//!
//! - [`ParamObject`] - Opaque negotiable key/value object with range filtering
//! - [`AudioInfo`] - Parsed raw audio format (sample format, layout, rate, channels)
//! - [`ParamType`], [`ParamIter`] - Index-driven capability enumeration
//!
//! ## Mixing
//!
//! - [`mix_2`], [`mix_accumulate`] - Block-vectorized sample-wise summation
//! - [`OutputView`] - A produced output buffer: mixed scratch or borrowed input
//!
//! # Lifecycle
//!
//! ```rust
//! use floatmix_core::{
//!     AudioFormat, AudioInfo, AudioLayout, DataBlock, Direction, FloatMix, HostBuffer,
//!     IoArea, IoBuffers, IoType, Status,
//! };
//! use std::sync::Arc;
//!
//! let mut node = FloatMix::new();
//! node.add_port(Direction::Input, 0).unwrap();
//!
//! // Negotiate one node-wide format on every port.
//! let info = AudioInfo::new(AudioFormat::F32, AudioLayout::NonInterleaved, 48000, 1);
//! let format = info.to_format();
//! node.port_set_format(Direction::Input, 0, Some(&format)).unwrap();
//! node.port_set_format(Direction::Output, 0, Some(&format)).unwrap();
//!
//! // Hand buffers to the node and bind the shared IO areas.
//! node.port_use_buffers(Direction::Input, 0, vec![HostBuffer::new(vec![DataBlock::mem_ptr(vec![0.5; 4])])]).unwrap();
//! node.port_use_buffers(Direction::Output, 0, vec![HostBuffer::new(vec![DataBlock::mem_ptr(vec![0.0; 4])])]).unwrap();
//! let in_io = Arc::new(IoBuffers::new());
//! let out_io = Arc::new(IoBuffers::new());
//! node.port_set_io(Direction::Input, 0, IoType::Buffers, Some(IoArea::Buffers(in_io.clone()))).unwrap();
//! node.port_set_io(Direction::Output, 0, IoType::Buffers, Some(IoArea::Buffers(out_io.clone()))).unwrap();
//!
//! // One cycle: the single ready input passes straight through.
//! in_io.set_buffer_id(0);
//! in_io.set_status(Status::HAVE_BUFFER);
//! let status = node.process().unwrap();
//! assert!(status.contains(Status::HAVE_BUFFER));
//! let out = node.output_buffer(out_io.buffer_id()).unwrap();
//! assert_eq!(out.samples(), &[0.5; 4]);
//! ```
//!
//! # Design Principles
//!
//! - **Real-time safe**: `process()` never allocates, locks, or blocks
//! - **Fixed capacity**: ports and buffers live in fixed slot tables with stable ids
//! - **No partial mutation**: negotiation and buffer installation either apply fully or not at all
//! - **Single writer**: every mutating call takes `&mut self`, so configuration can never
//!   race an in-progress cycle

pub mod buffer;
pub mod command;
pub mod error;
pub mod format;
pub mod io;
pub mod mix;
pub mod node;
pub mod params;
pub mod pod;
pub mod port;

/// Maximum number of input ports a node can hold.
pub const MAX_PORTS: usize = 128;

/// Maximum number of buffers installed on a single port.
pub const MAX_BUFFERS: usize = 64;

/// Capacity of the summation scratch buffer, in samples.
///
/// This is also the upper bound on the number of samples produced per cycle.
pub const MAX_SAMPLES: usize = 1024;

/// Size in bytes of one sample of the only supported sample format (32-bit float).
pub const SAMPLE_SIZE: usize = core::mem::size_of::<f32>();

/// Default buffer size advertised during negotiation, in samples.
pub const DEFAULT_BUFFER_SAMPLES: usize = 1024;

/// Smallest buffer size accepted during negotiation, in samples.
pub const MIN_BUFFER_SAMPLES: usize = 16;

/// Required byte alignment of buffer data.
pub const BUFFER_ALIGN: usize = 16;

// Re-export main types at crate root
pub use buffer::{BufferPool, Chunk, DataBlock, DataType, HostBuffer, Meta, MetaHeader, MetaType};
pub use command::{Command, NodeState};
pub use error::{ErrorKind, NodeError, Result};
pub use format::{AudioFormat, AudioInfo, AudioLayout, MediaSubtype, MediaType};
pub use io::{INVALID_ID, IoArea, IoBuffers, IoRange, IoType, Status};
pub use mix::{MIX_LANES, mix_2, mix_2_scalar, mix_accumulate, mix_accumulate_scalar};
pub use node::{FloatMix, OutputView, PortCounts};
pub use params::{ParamIter, ParamType};
pub use pod::{Key, ObjectType, ParamObject, Value};
pub use port::{Direction, PortFlags, PortInfo, PortProps};
