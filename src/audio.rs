//! Microphone analysis feeding the per-frame audio snapshot.
//!
//! Effects receive the snapshot as pass-through context; the Ki family does
//! not read it.

use anyhow::{Context, anyhow};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Sample, SampleFormat};
use ringbuf::HeapRb;
use ringbuf::traits::{Consumer as _, Producer as _, Split as _};
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::f32::consts::PI;
use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

pub const BAND_COUNT: usize = 8;
const WINDOW: usize = 1024;
const HOP: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioSnapshot {
    pub rms: f32,
    pub bands: [f32; BAND_COUNT],
    pub onset: f32,
    pub beat: bool,
    pub beat_strength: f32,
    /// 0.0 until enough beats have been seen.
    pub bpm: f32,
}

impl Default for AudioSnapshot {
    fn default() -> Self {
        Self {
            rms: 0.0,
            bands: [0.0; BAND_COUNT],
            onset: 0.0,
            beat: false,
            beat_strength: 0.0,
            bpm: 0.0,
        }
    }
}

/// Single-writer snapshot cell; readers retry while a write is in flight.
pub struct AtomicAudioSnapshot {
    seq: AtomicU64,
    rms: AtomicU32,
    bands: [AtomicU32; BAND_COUNT],
    onset: AtomicU32,
    beat: AtomicU32,
    beat_strength: AtomicU32,
    bpm: AtomicU32,
}

impl AtomicAudioSnapshot {
    pub fn new() -> Self {
        Self {
            seq: AtomicU64::new(0),
            rms: AtomicU32::new(0),
            bands: std::array::from_fn(|_| AtomicU32::new(0)),
            onset: AtomicU32::new(0),
            beat: AtomicU32::new(0),
            beat_strength: AtomicU32::new(0),
            bpm: AtomicU32::new(0),
        }
    }

    pub fn store(&self, s: AudioSnapshot) {
        self.seq.fetch_add(1, Ordering::Release); // odd => write in progress
        self.rms.store(s.rms.to_bits(), Ordering::Relaxed);
        for (dst, src) in self.bands.iter().zip(s.bands) {
            dst.store(src.to_bits(), Ordering::Relaxed);
        }
        self.onset.store(s.onset.to_bits(), Ordering::Relaxed);
        self.beat.store(u32::from(s.beat), Ordering::Relaxed);
        self.beat_strength
            .store(s.beat_strength.to_bits(), Ordering::Relaxed);
        self.bpm.store(s.bpm.to_bits(), Ordering::Relaxed);
        self.seq.fetch_add(1, Ordering::Release);
    }

    pub fn load(&self) -> AudioSnapshot {
        loop {
            let v1 = self.seq.load(Ordering::Acquire);
            if v1 & 1 == 1 {
                std::hint::spin_loop();
                continue;
            }
            let mut bands = [0.0f32; BAND_COUNT];
            for (dst, src) in bands.iter_mut().zip(&self.bands) {
                *dst = f32::from_bits(src.load(Ordering::Relaxed));
            }
            let snap = AudioSnapshot {
                rms: f32::from_bits(self.rms.load(Ordering::Relaxed)),
                bands,
                onset: f32::from_bits(self.onset.load(Ordering::Relaxed)),
                beat: self.beat.load(Ordering::Relaxed) != 0,
                beat_strength: f32::from_bits(self.beat_strength.load(Ordering::Relaxed)),
                bpm: f32::from_bits(self.bpm.load(Ordering::Relaxed)),
            };
            if self.seq.load(Ordering::Acquire) == v1 {
                return snap;
            }
        }
    }
}

impl Default for AtomicAudioSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

pub fn list_input_devices() -> anyhow::Result<()> {
    let host = cpal::default_host();
    let devices = host.input_devices().context("enumerate input devices")?;
    let mut out = io::stdout();
    writeln!(out, "Input devices:")?;
    for dev in devices {
        let name = dev.name().unwrap_or_else(|_| "<unknown>".to_string());
        writeln!(out, "  - {}", name)?;
    }
    Ok(())
}

/// Live microphone capture plus its analysis thread.
pub struct AudioSystem {
    _stream: cpal::Stream,
    stop: Arc<AtomicBool>,
    analyzer_handle: Option<thread::JoinHandle<()>>,
    snapshot: Arc<AtomicAudioSnapshot>,
    pub sample_rate_hz: u32,
}

impl AudioSystem {
    pub fn new_mic(device_query: Option<&str>) -> anyhow::Result<Self> {
        let host = cpal::default_host();
        let device = select_input_device(&host, device_query)?;
        let supported = device
            .default_input_config()
            .context("get default input config")?;
        let sample_rate_hz = supported.sample_rate().0;
        let channels = supported.channels() as usize;
        let config: cpal::StreamConfig = supported.clone().into();

        let rb = HeapRb::<f32>::new((sample_rate_hz as usize).saturating_mul(2));
        let (mut prod, mut cons) = rb.split();

        let stop = Arc::new(AtomicBool::new(false));
        let snapshot = Arc::new(AtomicAudioSnapshot::new());
        let snapshot_for_thread = Arc::clone(&snapshot);
        let stop_for_thread = Arc::clone(&stop);

        let err_fn = |err: cpal::StreamError| tracing::warn!(%err, "audio stream error");
        let stream = match supported.sample_format() {
            SampleFormat::F32 => device.build_input_stream(
                &config,
                move |data: &[f32], _| push_interleaved(data, channels, &mut prod),
                err_fn,
                None,
            )?,
            SampleFormat::I16 => device.build_input_stream(
                &config,
                move |data: &[i16], _| push_interleaved(data, channels, &mut prod),
                err_fn,
                None,
            )?,
            SampleFormat::U16 => device.build_input_stream(
                &config,
                move |data: &[u16], _| push_interleaved(data, channels, &mut prod),
                err_fn,
                None,
            )?,
            fmt => return Err(anyhow!("unsupported sample format: {fmt:?}")),
        };
        stream.play().context("start input stream")?;
        tracing::info!(
            device = %device.name().unwrap_or_default(),
            sample_rate_hz,
            channels,
            "microphone capture started"
        );

        let analyzer_handle = thread::spawn(move || {
            let mut analyzer = Analyzer::new(sample_rate_hz);
            let mut window = vec![0.0f32; WINDOW];
            let mut write_pos = 0usize;
            let mut since_last = 0usize;
            let started = Instant::now();
            while !stop_for_thread.load(Ordering::Relaxed) {
                let mut got_any = false;
                while let Some(s) = cons.try_pop() {
                    got_any = true;
                    window[write_pos] = s;
                    write_pos = (write_pos + 1) % WINDOW;
                    since_last += 1;
                    if since_last >= HOP {
                        since_last = 0;
                        window.rotate_left(write_pos);
                        write_pos = 0;
                        let now_s = started.elapsed().as_secs_f32();
                        snapshot_for_thread.store(analyzer.analyze(&window, now_s));
                    }
                }
                if !got_any {
                    thread::sleep(Duration::from_millis(2));
                }
            }
        });

        Ok(Self {
            _stream: stream,
            stop,
            analyzer_handle: Some(analyzer_handle),
            snapshot,
            sample_rate_hz,
        })
    }

    pub fn snapshot(&self) -> Arc<AtomicAudioSnapshot> {
        Arc::clone(&self.snapshot)
    }
}

impl Drop for AudioSystem {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(h) = self.analyzer_handle.take() {
            let _ = h.join();
        }
    }
}

fn select_input_device(host: &cpal::Host, device_query: Option<&str>) -> anyhow::Result<cpal::Device> {
    if let Some(want) = device_query.map(str::to_lowercase) {
        let devices = host.input_devices().context("enumerate input devices")?;
        for dev in devices {
            let matches = dev
                .name()
                .map(|n| n.to_lowercase().contains(&want))
                .unwrap_or(false);
            if matches {
                return Ok(dev);
            }
        }
        return Err(anyhow!("no input device matching: {want}"));
    }
    host.default_input_device()
        .ok_or_else(|| anyhow!("no default input device found"))
}

fn push_interleaved<T: Sample<Float = f32> + Copy>(
    data: &[T],
    channels: usize,
    prod: &mut ringbuf::HeapProd<f32>,
) {
    let channels = channels.max(1);
    for frame in data.chunks(channels) {
        let acc: f32 = frame.iter().map(|s| (*s).to_float_sample()).sum();
        let _ = prod.try_push(acc / channels as f32);
    }
}

/// Windowed FFT analysis: loudness, log-spaced bands, spectral-flux onsets,
/// a beat gate and a tempo estimate from inter-beat intervals.
pub struct Analyzer {
    sample_rate_hz: u32,
    fft: Arc<dyn Fft<f32>>,
    hann: Vec<f32>,
    buf: Vec<Complex<f32>>,
    mags: Vec<f32>,
    prev_mags: Vec<f32>,
    flux_avg: f32,
    bands_s: [f32; BAND_COUNT],
    rms_s: f32,
    last_beat_s: Option<f32>,
    intervals: Vec<f32>,
}

impl Analyzer {
    pub fn new(sample_rate_hz: u32) -> Self {
        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(WINDOW);
        let hann = (0..WINDOW)
            .map(|i| 0.5 - 0.5 * ((2.0 * PI * i as f32) / WINDOW as f32).cos())
            .collect();
        Self {
            sample_rate_hz: sample_rate_hz.max(1),
            fft,
            hann,
            buf: vec![Complex { re: 0.0, im: 0.0 }; WINDOW],
            mags: vec![0.0; WINDOW / 2],
            prev_mags: vec![0.0; WINDOW / 2],
            flux_avg: 0.0,
            bands_s: [0.0; BAND_COUNT],
            rms_s: 0.0,
            last_beat_s: None,
            intervals: Vec::with_capacity(16),
        }
    }

    /// Analyze the most recent `WINDOW` samples (shorter input is zero padded).
    pub fn analyze(&mut self, samples: &[f32], now_s: f32) -> AudioSnapshot {
        let n = WINDOW;
        let mut sum_sq = 0.0f32;
        for i in 0..n {
            let s = samples.get(i).copied().unwrap_or(0.0);
            sum_sq += s * s;
            self.buf[i] = Complex {
                re: s * self.hann[i],
                im: 0.0,
            };
        }
        self.fft.process(&mut self.buf);

        for (m, c) in self.mags.iter_mut().zip(&self.buf) {
            *m = c.norm() / n as f32;
        }

        let rms = (sum_sq / n as f32).sqrt();
        self.rms_s = smooth(self.rms_s, (rms * 4.0).min(1.0), 0.35);

        let nyquist = self.sample_rate_hz as f32 / 2.0;
        let bin_hz = nyquist / (n / 2) as f32;
        let mut bands = [0.0f32; BAND_COUNT];
        for (b, out) in bands.iter_mut().enumerate() {
            // 40 Hz .. ~10 kHz, log spaced.
            let lo = 40.0 * 2f32.powf(b as f32);
            let hi = (lo * 2.0).min(nyquist);
            let lo_bin = ((lo / bin_hz) as usize).min(n / 2 - 1);
            let hi_bin = ((hi / bin_hz) as usize).clamp(lo_bin + 1, n / 2);
            let energy: f32 = self.mags[lo_bin..hi_bin].iter().sum();
            *out = (energy / (hi_bin - lo_bin) as f32 * 24.0).min(1.0);
        }
        for (s, v) in self.bands_s.iter_mut().zip(bands) {
            *s = smooth(*s, v, 0.4);
        }

        let flux: f32 = self
            .mags
            .iter()
            .zip(&self.prev_mags)
            .map(|(m, p)| (m - p).max(0.0))
            .sum();
        self.prev_mags.copy_from_slice(&self.mags);
        let onset = if self.flux_avg > 1e-6 {
            ((flux / self.flux_avg - 1.0) / 2.0).clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.flux_avg = smooth(self.flux_avg, flux, 0.08);

        let refractory_ok = self.last_beat_s.is_none_or(|t| now_s - t > 0.25);
        let beat = onset > 0.45 && self.rms_s > 0.02 && refractory_ok;
        if beat {
            if let Some(prev) = self.last_beat_s {
                let dt = now_s - prev;
                if (0.25..=2.0).contains(&dt) {
                    if self.intervals.len() == 16 {
                        self.intervals.remove(0);
                    }
                    self.intervals.push(dt);
                }
            }
            self.last_beat_s = Some(now_s);
        }

        AudioSnapshot {
            rms: self.rms_s,
            bands: self.bands_s,
            onset,
            beat,
            beat_strength: if beat { onset } else { 0.0 },
            bpm: estimate_bpm(&self.intervals),
        }
    }
}

fn smooth(prev: f32, next: f32, alpha: f32) -> f32 {
    prev + (next - prev) * alpha
}

/// Median inter-beat interval as beats per minute; 0.0 with fewer than four.
pub fn estimate_bpm(intervals: &[f32]) -> f32 {
    if intervals.len() < 4 {
        return 0.0;
    }
    let mut sorted = intervals.to_vec();
    sorted.sort_by(f32::total_cmp);
    let median = sorted[sorted.len() / 2];
    if median <= 0.0 { 0.0 } else { 60.0 / median }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_cell_round_trips() {
        let cell = AtomicAudioSnapshot::new();
        let snap = AudioSnapshot {
            rms: 0.5,
            bands: [0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8],
            onset: 0.9,
            beat: true,
            beat_strength: 0.9,
            bpm: 120.0,
        };
        cell.store(snap);
        assert_eq!(cell.load(), snap);
    }

    #[test]
    fn bpm_needs_enough_intervals() {
        assert_eq!(estimate_bpm(&[0.5, 0.5]), 0.0);
        assert!((estimate_bpm(&[0.5, 0.5, 0.52, 0.48, 0.5]) - 120.0).abs() < 1e-3);
    }

    #[test]
    fn silence_has_no_beat() {
        let mut a = Analyzer::new(48_000);
        let silent = vec![0.0f32; WINDOW];
        for i in 0..8 {
            let s = a.analyze(&silent, i as f32 * 0.01);
            assert!(!s.beat);
            assert_eq!(s.rms, 0.0);
        }
    }

    #[test]
    fn tone_lights_up_a_band() {
        let mut a = Analyzer::new(48_000);
        let tone = (0..WINDOW)
            .map(|i| (2.0 * PI * 220.0 * i as f32 / 48_000.0).sin() * 0.5)
            .collect::<Vec<_>>();
        let mut s = AudioSnapshot::default();
        for i in 0..10 {
            s = a.analyze(&tone, i as f32 * 0.005);
        }
        assert!(s.rms > 0.1);
        assert!(s.bands.iter().any(|b| *b > 0.0));
    }
}
