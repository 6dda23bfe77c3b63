//! Offline host for the floatmix node.
//!
//! [`MixHost`] plays the graph scheduler's role: it owns every buffer the node
//! uses, publishes input buffers through the input IO areas, calls
//! [`FloatMix::process`] once per cycle, and consumes the produced output by
//! flipping the output IO area back to `NEED_BUFFER`.

use std::sync::Arc;

use floatmix_core::{
    AudioInfo, Chunk, Command, DataBlock, Direction, FloatMix, HostBuffer, IoArea, IoBuffers,
    IoRange, IoType, MAX_SAMPLES, MIN_BUFFER_SAMPLES, MetaHeader, Status,
};

use crate::{Error, Result};

const NANOS_PER_SEC: i64 = 1_000_000_000;

/// What one cycle produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleOutcome {
    /// Inputs that had a buffer ready.
    pub inputs: usize,
    /// Samples appended to the output.
    pub frames: usize,
    /// The output aliased the single ready input.
    pub passthrough: bool,
}

/// Result of mixing whole tracks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MixReport {
    /// Mixed samples, as long as the longest track.
    pub samples: Vec<f32>,
    /// Cycles run.
    pub cycles: u64,
    /// Cycles where two or more inputs were summed.
    pub mixed_cycles: u64,
    /// Cycles where a single input was passed through.
    pub passthrough_cycles: u64,
}

impl MixReport {
    fn record(&mut self, outcome: CycleOutcome) {
        self.cycles += 1;
        if outcome.passthrough {
            self.passthrough_cycles += 1;
        } else if outcome.inputs >= 2 {
            self.mixed_cycles += 1;
        }
    }
}

#[derive(Debug)]
struct InputFeed {
    port_id: u32,
    io: Arc<IoBuffers>,
    next_buffer: u32,
}

/// Drives a [`FloatMix`] node over in-memory tracks.
///
/// Every port gets the same format and `buffers` host buffers of
/// `block_size` samples. Input buffers are used round-robin.
#[derive(Debug)]
pub struct MixHost {
    node: FloatMix,
    out_io: Arc<IoBuffers>,
    inputs: Vec<InputFeed>,
    buffers: u32,
    block_size: usize,
    rate: u32,
    seq: u32,
    position: u64,
}

impl MixHost {
    /// Configure a node with `inputs` input ports and start it.
    ///
    /// Fails with [`Error::BlockSize`] unless `block_size` lies in
    /// `MIN_BUFFER_SAMPLES..=MAX_SAMPLES`, and with the node's error if
    /// `info` is not acceptable or if `inputs` exceeds the port limit.
    pub fn new(info: AudioInfo, inputs: usize, buffers: u32, block_size: usize) -> Result<Self> {
        if !(MIN_BUFFER_SAMPLES..=MAX_SAMPLES).contains(&block_size) {
            return Err(Error::BlockSize {
                value: block_size,
                min: MIN_BUFFER_SAMPLES,
                max: MAX_SAMPLES,
            });
        }
        let format = info.to_format();
        let mut node = FloatMix::new();

        node.port_set_format(Direction::Output, 0, Some(&format))?;
        node.port_use_buffers(Direction::Output, 0, host_buffers(buffers, block_size))?;
        let out_io = Arc::new(IoBuffers::new());
        node.port_set_io(
            Direction::Output,
            0,
            IoType::Buffers,
            Some(IoArea::Buffers(out_io.clone())),
        )?;
        let range = Arc::new(IoRange::new((block_size * info.stride()) as u32));
        node.port_set_io(Direction::Output, 0, IoType::Range, Some(IoArea::Range(range)))?;

        let mut feeds = Vec::with_capacity(inputs);
        for port_id in 0..inputs as u32 {
            node.add_port(Direction::Input, port_id)?;
            node.port_set_format(Direction::Input, port_id, Some(&format))?;
            node.port_use_buffers(Direction::Input, port_id, host_buffers(buffers, block_size))?;
            let io = Arc::new(IoBuffers::new());
            node.port_set_io(
                Direction::Input,
                port_id,
                IoType::Buffers,
                Some(IoArea::Buffers(io.clone())),
            )?;
            feeds.push(InputFeed {
                port_id,
                io,
                next_buffer: 0,
            });
        }

        node.send_command(Command::Start)?;
        tracing::info!(
            "host ready: {inputs} inputs, {buffers} buffers of {block_size} samples at {} Hz",
            info.rate
        );

        Ok(Self {
            node,
            out_io,
            inputs: feeds,
            buffers,
            block_size,
            rate: info.rate,
            seq: 0,
            position: 0,
        })
    }

    /// The hosted node.
    pub fn node(&self) -> &FloatMix {
        &self.node
    }

    /// Number of input ports.
    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    /// Samples per cycle.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Run one cycle.
    ///
    /// `blocks` has one entry per input port; `None` leaves that input idle
    /// for the cycle. Ready blocks shorter than the longest one are padded
    /// with silence, and blocks longer than the block size are truncated.
    /// The produced samples are appended to `out`.
    pub fn cycle(&mut self, blocks: &[Option<&[f32]>], out: &mut Vec<f32>) -> Result<CycleOutcome> {
        if blocks.len() != self.inputs.len() {
            return Err(Error::TrackCount {
                expected: self.inputs.len(),
                actual: blocks.len(),
            });
        }

        let frames = blocks
            .iter()
            .flatten()
            .map(|b| b.len())
            .max()
            .unwrap_or(self.block_size)
            .min(self.block_size);

        let mut ready = 0;
        for (feed, block) in self.inputs.iter_mut().zip(blocks) {
            let Some(block) = block else {
                continue;
            };
            let buffer_id = feed.next_buffer;
            feed.next_buffer = (buffer_id + 1) % self.buffers.max(1);

            let host = self
                .node
                .port_buffer_mut(Direction::Input, feed.port_id, buffer_id)?;
            if let Some(header) = host.header_mut() {
                header.seq = self.seq;
                header.pts = self.position as i64 * NANOS_PER_SEC / i64::from(self.rate.max(1));
            }
            if let Some(data) = host.first_mut() {
                fill_block(data, block, frames);
            }

            feed.io.set_buffer_id(buffer_id);
            feed.io.set_status(Status::HAVE_BUFFER);
            ready += 1;
        }
        self.seq = self.seq.wrapping_add(1);
        self.position += frames as u64;

        let status = self.node.process()?;
        tracing::trace!("host cycle {}: {ready} inputs, status {status}", self.seq);

        let outcome = match self.node.output_buffer(self.out_io.buffer_id()) {
            Some(view) => {
                out.extend_from_slice(view.samples());
                CycleOutcome {
                    inputs: ready,
                    frames: view.samples().len(),
                    passthrough: view.is_passthrough(),
                }
            }
            None => CycleOutcome {
                inputs: ready,
                frames: 0,
                passthrough: false,
            },
        };
        self.out_io.set_status(Status::NEED_BUFFER);
        Ok(outcome)
    }

    /// Mix whole tracks, one per input port, block by block.
    ///
    /// Tracks may differ in length; an input goes idle once its track ends
    /// and the result is as long as the longest track.
    pub fn mix(&mut self, tracks: &[Vec<f32>]) -> Result<MixReport> {
        self.mix_with(tracks, |_| {})
    }

    /// Like [`mix`](Self::mix), calling `progress` with the number of samples
    /// produced so far after every cycle.
    pub fn mix_with(
        &mut self,
        tracks: &[Vec<f32>],
        mut progress: impl FnMut(usize),
    ) -> Result<MixReport> {
        if tracks.len() != self.inputs.len() {
            return Err(Error::TrackCount {
                expected: self.inputs.len(),
                actual: tracks.len(),
            });
        }

        let total = tracks.iter().map(Vec::len).max().unwrap_or(0);
        let mut report = MixReport {
            samples: Vec::with_capacity(total),
            ..MixReport::default()
        };

        let mut pos = 0;
        while pos < total {
            let end = (pos + self.block_size).min(total);
            let blocks: Vec<Option<&[f32]>> = tracks
                .iter()
                .map(|t| (pos < t.len()).then(|| &t[pos..end.min(t.len())]))
                .collect();
            let outcome = self.cycle(&blocks, &mut report.samples)?;
            report.record(outcome);
            pos = end;
            progress(pos);
        }

        tracing::debug!(
            "mixed {} samples in {} cycles ({} summed, {} passthrough)",
            report.samples.len(),
            report.cycles,
            report.mixed_cycles,
            report.passthrough_cycles
        );
        Ok(report)
    }
}

fn host_buffers(count: u32, block_size: usize) -> Vec<HostBuffer> {
    (0..count)
        .map(|_| {
            HostBuffer::new(vec![DataBlock::with_capacity(block_size)])
                .with_header(MetaHeader::default())
        })
        .collect()
}

/// Copies `block` into `data` and zero-pads the chunk out to `frames`.
fn fill_block(data: &mut DataBlock, block: &[f32], frames: usize) {
    let written = data.write_samples(block);
    if written < frames
        && let Some(storage) = data.data.as_mut()
    {
        let end = frames.min(storage.len());
        storage[written..end].fill(0.0);
        data.chunk = Chunk::samples(end);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use floatmix_core::{AudioFormat, AudioLayout, NodeState};

    fn info() -> AudioInfo {
        AudioInfo::new(AudioFormat::F32, AudioLayout::NonInterleaved, 48000, 1)
    }

    fn ramp(len: usize, scale: f32) -> Vec<f32> {
        (0..len).map(|i| i as f32 * scale).collect()
    }

    #[test]
    fn test_two_tracks_sum() {
        let a = ramp(100, 0.5);
        let b = ramp(100, 0.25);
        let mut host = MixHost::new(info(), 2, 3, 32).unwrap();
        assert_eq!(host.node().state(), NodeState::Started);

        let report = host.mix(&[a.clone(), b.clone()]).unwrap();
        let expected: Vec<f32> = a.iter().zip(&b).map(|(x, y)| x + y).collect();
        assert_eq!(report.samples, expected);
        assert_eq!(report.cycles, 4);
        assert_eq!(report.mixed_cycles, 4);
    }

    #[test]
    fn test_single_track_passes_through() {
        let a = ramp(70, 1.0);
        let mut host = MixHost::new(info(), 1, 2, 32).unwrap();

        let report = host.mix(std::slice::from_ref(&a)).unwrap();
        assert_eq!(report.samples, a);
        assert_eq!(report.passthrough_cycles, 3);
    }

    #[test]
    fn test_unequal_lengths() {
        let long = vec![1.0; 50];
        let short = vec![2.0; 20];
        let mut host = MixHost::new(info(), 2, 1, 16).unwrap();

        let report = host.mix(&[long, short]).unwrap();
        assert_eq!(report.samples.len(), 50);
        assert!(report.samples[..16].iter().all(|&s| s == 3.0));
        // second block: short track has 4 samples left, padded with silence
        assert!(report.samples[16..20].iter().all(|&s| s == 3.0));
        assert!(report.samples[20..32].iter().all(|&s| s == 1.0));
        assert!(report.samples[32..].iter().all(|&s| s == 1.0));
        assert_eq!(report.mixed_cycles, 2);
        assert_eq!(report.passthrough_cycles, 2);
    }

    #[test]
    fn test_progress_reports_positions() {
        let mut host = MixHost::new(info(), 1, 2, 16).unwrap();
        let mut seen = Vec::new();
        host.mix_with(&[vec![0.0; 40]], |pos| seen.push(pos)).unwrap();
        assert_eq!(seen, vec![16, 32, 40]);
    }

    #[test]
    fn test_idle_cycle_is_silent() {
        let mut host = MixHost::new(info(), 2, 2, 16).unwrap();
        let mut out = Vec::new();

        let outcome = host.cycle(&[None, None], &mut out).unwrap();
        assert_eq!(outcome.inputs, 0);
        assert_eq!(outcome.frames, 16);
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_track_count_checked() {
        let mut host = MixHost::new(info(), 2, 2, 16).unwrap();
        assert!(matches!(
            host.mix(&[vec![0.0; 4]]),
            Err(Error::TrackCount {
                expected: 2,
                actual: 1
            })
        ));
    }

    #[test]
    fn test_headers_carry_sequence() {
        let mut host = MixHost::new(info(), 1, 1, 16).unwrap();
        let mut out = Vec::new();
        for _ in 0..3 {
            host.cycle(&[Some(&[0.5; 8])], &mut out).unwrap();
        }

        let header = host
            .node()
            .port_buffer(Direction::Input, 0, 0)
            .unwrap()
            .header()
            .copied()
            .unwrap();
        assert_eq!(header.seq, 2);
        assert_eq!(header.pts, 2 * 8 * 1_000_000_000 / 48000);
    }

    #[test]
    fn test_block_size_bounds() {
        for block_size in [0, MIN_BUFFER_SAMPLES - 1, MAX_SAMPLES + 1, 2 * MAX_SAMPLES] {
            assert!(matches!(
                MixHost::new(info(), 2, 2, block_size),
                Err(Error::BlockSize { value, .. }) if value == block_size
            ));
        }
    }

    #[test]
    fn test_largest_block_keeps_every_sample() {
        let mut host = MixHost::new(info(), 2, 2, MAX_SAMPLES).unwrap();
        let report = host
            .mix(&[vec![1.0; 4 * MAX_SAMPLES], vec![0.5; 4 * MAX_SAMPLES]])
            .unwrap();
        assert_eq!(report.samples.len(), 4 * MAX_SAMPLES);
        assert!(report.samples.iter().all(|&s| s == 1.5));
        assert_eq!(report.mixed_cycles, 4);
    }

    #[test]
    fn test_unsupported_format_rejected() {
        let bad = AudioInfo::new(AudioFormat::S16, AudioLayout::NonInterleaved, 48000, 1);
        assert!(matches!(
            MixHost::new(bad, 1, 2, 16),
            Err(Error::Node(_))
        ));
    }
}
