//! ffmpeg-backed media pipeline.
//!
//! Static and full-frame exports are a single ffmpeg invocation with a native
//! `crop`/`scale` filter. Dynamic exports decode raw RGBA frames from one
//! ffmpeg process, run the sample transform on each, and pipe the result into
//! a second ffmpeg process that encodes (taking audio from the source).

use std::io::{BufRead, BufReader, Read, Write};
use std::path::Path;
use std::process::{Child, ChildStderr, Command, Stdio};
use std::thread::JoinHandle;
use std::time::Instant;

use image::RgbaImage;
use serde::Deserialize;

use panframe_common::error::{PanframeError, PanframeResult};
use panframe_project_model::export::ExportFormat;

use crate::export::ExportProgress;
use crate::pipeline::{
    conform_frame, AbortHandle, MediaPipeline, SampleTransform, TrackInfo, TranscodePlan,
    VideoProcessing, DEFAULT_FPS,
};

/// Media pipeline that shells out to `ffmpeg` and `ffprobe`.
#[derive(Debug, Clone)]
pub struct FfmpegPipeline {
    ffmpeg: String,
    ffprobe: String,
}

impl Default for FfmpegPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegPipeline {
    /// Use `ffmpeg` and `ffprobe` from `PATH`.
    pub fn new() -> Self {
        Self::with_binaries("ffmpeg", "ffprobe")
    }

    pub fn with_binaries(ffmpeg: impl Into<String>, ffprobe: impl Into<String>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }

    fn run_native(
        &self,
        plan: &TranscodePlan,
        progress: &dyn Fn(ExportProgress),
        abort: &AbortHandle,
    ) -> PanframeResult<()> {
        let args = native_args(plan);
        tracing::debug!(args = ?args, "Running ffmpeg");

        let mut process = FfmpegProcess::spawn(&self.ffmpeg, &args, Stdio::null())?;
        let stdout = process
            .child
            .stdout
            .take()
            .ok_or_else(|| PanframeError::pipeline("Failed to capture ffmpeg stdout"))?;

        let started = Instant::now();
        let total_frames = plan.total_frames();
        let expected_secs = plan.duration_secs();
        let mut reader = BufReader::new(stdout);
        let mut line = String::new();
        let mut state = ProgressState::default();

        loop {
            if abort.is_aborted() {
                process.kill();
                return Err(PanframeError::Aborted);
            }

            line.clear();
            let bytes = reader.read_line(&mut line).map_err(|e| {
                PanframeError::pipeline(format!("Failed reading ffmpeg progress: {e}"))
            })?;
            if bytes == 0 {
                break;
            }

            let Some((key, value)) = line.trim().split_once('=') else {
                continue;
            };
            state.update(key, value);
            if key == "progress" {
                let fraction = if state.complete {
                    1.0
                } else if expected_secs > 0.0 {
                    state.out_time_secs / expected_secs
                } else {
                    0.0
                };
                progress(ExportProgress::from_fraction(
                    fraction,
                    total_frames,
                    started.elapsed().as_secs_f64(),
                ));
            }
        }

        process.finish("ffmpeg export")
    }

    fn run_per_sample(
        &self,
        plan: &TranscodePlan,
        transform: &dyn SampleTransform,
        progress: &dyn Fn(ExportProgress),
        abort: &AbortHandle,
    ) -> PanframeResult<()> {
        let decoder_args = decoder_args(plan);
        let encoder_args = encoder_args(plan);
        tracing::debug!(decoder = ?decoder_args, encoder = ?encoder_args, "Running ffmpeg frame pipeline");

        let mut decoder = FfmpegProcess::spawn(&self.ffmpeg, &decoder_args, Stdio::null())?;
        let mut encoder = FfmpegProcess::spawn(&self.ffmpeg, &encoder_args, Stdio::piped())?;

        let stdout = decoder
            .child
            .stdout
            .take()
            .ok_or_else(|| PanframeError::pipeline("Failed to capture ffmpeg decoder stdout"))?;
        let mut stdin = encoder
            .child
            .stdin
            .take()
            .ok_or_else(|| PanframeError::pipeline("Failed to capture ffmpeg encoder stdin"))?;

        let (width, height) = (plan.source.width, plan.source.height);
        let frame_len = width as usize * height as usize * 4;
        let mut reader = BufReader::with_capacity(frame_len * 2, stdout);
        let mut buffer = vec![0u8; frame_len];

        let started = Instant::now();
        let total_frames = plan.total_frames();
        let mut index = 0u64;

        loop {
            if abort.is_aborted() {
                drop(stdin);
                decoder.kill();
                encoder.kill();
                return Err(PanframeError::Aborted);
            }

            let has_frame = read_frame(&mut reader, &mut buffer).map_err(|e| {
                PanframeError::pipeline(format!("Failed reading decoded frame: {e}"))
            })?;
            if !has_frame {
                break;
            }

            let frame = RgbaImage::from_raw(width, height, std::mem::take(&mut buffer))
                .ok_or_else(|| PanframeError::pipeline("Decoded frame has unexpected size"))?;
            let timestamp = plan.sample_time(index);

            let written = {
                let output = conform_frame(
                    transform.transform(&frame, timestamp),
                    plan.output_width,
                    plan.output_height,
                );
                stdin.write_all(output.as_raw())
            };
            buffer = frame.into_raw();

            if let Err(err) = written {
                drop(stdin);
                decoder.kill();
                let detail = match encoder.finish("ffmpeg encoder") {
                    Err(encoder_err) => encoder_err.to_string(),
                    Ok(()) => err.to_string(),
                };
                return Err(PanframeError::pipeline(format!(
                    "Failed writing frame {index} to encoder: {detail}"
                )));
            }

            index += 1;
            progress(ExportProgress::from_frames(
                index,
                total_frames,
                started.elapsed().as_secs_f64(),
            ));
        }

        drop(stdin);
        decoder.finish("ffmpeg decoder")?;
        encoder.finish("ffmpeg encoder")?;

        if index == 0 {
            return Err(PanframeError::pipeline("Decoder produced no frames"));
        }
        tracing::debug!(frames = index, expected = total_frames, "Frame pipeline drained");
        Ok(())
    }
}

impl MediaPipeline for FfmpegPipeline {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    fn is_available(&self) -> bool {
        command_exists(&self.ffmpeg) && command_exists(&self.ffprobe)
    }

    fn probe(&self, path: &Path) -> PanframeResult<TrackInfo> {
        let output = Command::new(&self.ffprobe)
            .args([
                "-v",
                "error",
                "-show_entries",
                "stream=codec_type,width,height,avg_frame_rate,r_frame_rate:format=duration",
                "-of",
                "json",
            ])
            .arg(path)
            .output()
            .map_err(|e| PanframeError::pipeline(format!("Failed to run ffprobe: {e}")))?;

        if !output.status.success() {
            return Err(PanframeError::pipeline(format!(
                "ffprobe failed (status {}): {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let info = parse_probe_output(&String::from_utf8_lossy(&output.stdout))?;
        tracing::debug!(
            path = %path.display(),
            width = info.width,
            height = info.height,
            duration_secs = info.duration_secs,
            fps = info.fps,
            has_audio = info.has_audio,
            "Probed media"
        );
        Ok(info)
    }

    fn transcode(
        &self,
        plan: &TranscodePlan,
        transform: Option<&dyn SampleTransform>,
        progress: &dyn Fn(ExportProgress),
        abort: &AbortHandle,
    ) -> PanframeResult<()> {
        match (plan.video, transform) {
            (VideoProcessing::PerSample, Some(transform)) => {
                self.run_per_sample(plan, transform, progress, abort)
            }
            (VideoProcessing::PerSample, None) => Err(PanframeError::pipeline(
                "Per-sample export requires a frame transform",
            )),
            _ => self.run_native(plan, progress, abort),
        }
    }
}

/// A running ffmpeg child with its stderr drained on a thread.
///
/// Dropping a process that was neither finished nor killed kills and reaps it.
struct FfmpegProcess {
    child: Child,
    stderr: Option<JoinHandle<String>>,
    reaped: bool,
}

impl FfmpegProcess {
    fn spawn(binary: &str, args: &[String], stdin: Stdio) -> PanframeResult<Self> {
        let mut child = Command::new(binary)
            .args(args)
            .stdin(stdin)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| PanframeError::pipeline(format!("Failed to start {binary}: {e}")))?;

        tracing::debug!(pid = child.id(), args_len = args.len(), "ffmpeg process started");
        let stderr = child.stderr.take().map(drain_stderr);
        Ok(Self {
            child,
            stderr,
            reaped: false,
        })
    }

    fn kill(&mut self) {
        if self.reaped {
            return;
        }
        if let Err(err) = self.child.kill() {
            tracing::debug!(error = %err, "ffmpeg process already exited");
        }
        let _ = self.child.wait();
        self.reaped = true;
        if let Some(handle) = self.stderr.take() {
            let _ = handle.join();
        }
    }

    fn finish(mut self, what: &str) -> PanframeResult<()> {
        let status = self
            .child
            .wait()
            .map_err(|e| PanframeError::pipeline(format!("Failed to wait on {what}: {e}")))?;
        self.reaped = true;
        let stderr_output = self
            .stderr
            .take()
            .map(|handle| {
                handle
                    .join()
                    .unwrap_or_else(|_| "<failed to join stderr reader>".to_string())
            })
            .unwrap_or_default();

        if !status.success() {
            return Err(PanframeError::pipeline(format!(
                "{what} failed (status {status}): {}",
                stderr_output.trim()
            )));
        }
        Ok(())
    }
}

impl Drop for FfmpegProcess {
    fn drop(&mut self) {
        if !self.reaped {
            tracing::debug!(pid = self.child.id(), "Killing abandoned ffmpeg process");
            self.kill();
        }
    }
}

fn drain_stderr(stderr: ChildStderr) -> JoinHandle<String> {
    std::thread::spawn(move || {
        let mut reader = BufReader::new(stderr);
        let mut output = String::new();
        match reader.read_to_string(&mut output) {
            Ok(_) => output,
            Err(err) => format!("<failed to read ffmpeg stderr: {err}>"),
        }
    })
}

/// Fill `buffer` with one raw frame. Returns `false` at end of stream.
fn read_frame(reader: &mut impl Read, buffer: &mut [u8]) -> std::io::Result<bool> {
    let mut filled = 0;
    while filled < buffer.len() {
        match reader.read(&mut buffer[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
    if filled > 0 && filled < buffer.len() {
        tracing::warn!(bytes = filled, expected = buffer.len(), "Dropping truncated trailing frame");
    }
    Ok(filled == buffer.len() && !buffer.is_empty())
}

fn base_args() -> Vec<String> {
    ["-hide_banner", "-loglevel", "error", "-nostats"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn trim_input_args(plan: &TranscodePlan) -> Vec<String> {
    vec![
        "-ss".to_string(),
        format!("{:.6}", plan.start_secs),
        "-t".to_string(),
        format!("{:.6}", plan.duration_secs()),
        "-i".to_string(),
        plan.input.display().to_string(),
    ]
}

/// Single-process args for passthrough and native-crop exports.
fn native_args(plan: &TranscodePlan) -> Vec<String> {
    let mut args = base_args();
    args.extend(["-y", "-progress", "pipe:1"].iter().map(|s| s.to_string()));
    args.extend(trim_input_args(plan));

    let scale = format!("scale={}:{}", plan.output_width, plan.output_height);
    let filter = match plan.video {
        VideoProcessing::NativeCrop(rect) => format!(
            "crop={}:{}:{}:{},{scale}",
            rect.width.round() as u32,
            rect.height.round() as u32,
            rect.x.round() as u32,
            rect.y.round() as u32
        ),
        _ => scale,
    };

    args.push("-vf".to_string());
    args.push(filter);
    args.push("-map".to_string());
    args.push("0:v:0".to_string());
    args.push("-map".to_string());
    args.push("0:a?".to_string());
    args.append(&mut codec_args(plan.format, plan.video_bitrate_kbps));
    args.push(plan.output.display().to_string());
    args
}

/// Decoder args: trimmed source to raw RGBA on stdout at a constant rate.
fn decoder_args(plan: &TranscodePlan) -> Vec<String> {
    let mut args = base_args();
    args.extend(trim_input_args(plan));
    args.extend(
        [
            "-map".to_string(),
            "0:v:0".to_string(),
            "-r".to_string(),
            format_fps(plan.fps()),
            "-f".to_string(),
            "rawvideo".to_string(),
            "-pix_fmt".to_string(),
            "rgba".to_string(),
            "-s".to_string(),
            format!("{}x{}", plan.source.width, plan.source.height),
            "pipe:1".to_string(),
        ],
    );
    args
}

/// Encoder args: raw RGBA on stdin plus audio from the trimmed source.
fn encoder_args(plan: &TranscodePlan) -> Vec<String> {
    let mut args = base_args();
    args.extend(
        [
            "-y".to_string(),
            "-f".to_string(),
            "rawvideo".to_string(),
            "-pix_fmt".to_string(),
            "rgba".to_string(),
            "-s".to_string(),
            format!("{}x{}", plan.output_width, plan.output_height),
            "-r".to_string(),
            format_fps(plan.fps()),
            "-i".to_string(),
            "pipe:0".to_string(),
        ],
    );

    if plan.source.has_audio {
        args.extend(trim_input_args(plan));
        args.extend(
            ["-map", "0:v:0", "-map", "1:a:0", "-shortest"]
                .iter()
                .map(|s| s.to_string()),
        );
    } else {
        args.extend(["-map", "0:v:0"].iter().map(|s| s.to_string()));
    }

    args.append(&mut codec_args(plan.format, plan.video_bitrate_kbps));
    args.push(plan.output.display().to_string());
    args
}

fn format_fps(fps: f64) -> String {
    let rounded = fps.round();
    if (fps - rounded).abs() < 1e-6 {
        format!("{}", rounded as u64)
    } else {
        format!("{fps:.3}")
    }
}

fn codec_args(format: ExportFormat, video_bitrate_kbps: u32) -> Vec<String> {
    let mut args: Vec<String> = match format {
        ExportFormat::Mp4H264 => [
            "-c:v",
            "libx264",
            "-preset",
            "medium",
            "-profile:v",
            "high",
            "-pix_fmt",
            "yuv420p",
            "-c:a",
            "aac",
            "-b:a",
            "160k",
            "-movflags",
            "+faststart",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect(),
        ExportFormat::Webm => [
            "-c:v",
            "libvpx-vp9",
            "-pix_fmt",
            "yuv420p",
            "-c:a",
            "libopus",
            "-b:a",
            "128k",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect(),
    };

    if video_bitrate_kbps > 0 {
        args.push("-b:v".to_string());
        args.push(format!("{video_bitrate_kbps}k"));
    } else {
        args.push("-crf".to_string());
        args.push(
            match format {
                ExportFormat::Mp4H264 => "20",
                ExportFormat::Webm => "32",
            }
            .to_string(),
        );
    }
    args
}

fn command_exists(binary: &str) -> bool {
    Command::new(binary)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    avg_frame_rate: Option<String>,
    r_frame_rate: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

fn parse_probe_output(json: &str) -> PanframeResult<TrackInfo> {
    let probe: ProbeOutput = serde_json::from_str(json)
        .map_err(|e| PanframeError::pipeline(format!("Unexpected ffprobe output: {e}")))?;

    let video = probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| PanframeError::pipeline("No video stream found"))?;

    let width = video.width.unwrap_or(0);
    let height = video.height.unwrap_or(0);
    if width == 0 || height == 0 {
        return Err(PanframeError::pipeline("Video stream has no dimensions"));
    }

    let fps = video
        .avg_frame_rate
        .as_deref()
        .and_then(parse_frame_rate)
        .or_else(|| video.r_frame_rate.as_deref().and_then(parse_frame_rate))
        .unwrap_or(DEFAULT_FPS);

    let duration_secs = probe
        .format
        .and_then(|f| f.duration)
        .and_then(|d| d.trim().parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0)
        .ok_or_else(|| PanframeError::pipeline("Media duration is unknown"))?;

    let has_audio = probe
        .streams
        .iter()
        .any(|s| s.codec_type.as_deref() == Some("audio"));

    Ok(TrackInfo {
        width,
        height,
        duration_secs,
        fps,
        has_audio,
    })
}

/// Parse `"30000/1001"` or `"25"` style rates.
fn parse_frame_rate(raw: &str) -> Option<f64> {
    let fps = match raw.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => raw.trim().parse().ok()?,
    };
    (fps.is_finite() && fps > 0.0).then_some(fps)
}

#[derive(Debug, Default)]
struct ProgressState {
    out_time_secs: f64,
    complete: bool,
}

impl ProgressState {
    fn update(&mut self, key: &str, value: &str) {
        match key {
            // ffmpeg reports microseconds under both keys.
            "out_time_ms" | "out_time_us" => {
                if let Ok(us) = value.parse::<f64>() {
                    self.out_time_secs = us / 1_000_000.0;
                }
            }
            "progress" => {
                self.complete = value == "end";
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use panframe_project_model::geometry::Rect;
    use std::path::PathBuf;

    #[cfg(target_os = "linux")]
    #[test]
    fn test_dropped_process_is_killed_and_reaped() {
        let Ok(process) = FfmpegProcess::spawn("sleep", &["30".to_string()], Stdio::null()) else {
            return;
        };
        let pid = process.child.id();
        let proc_entry = PathBuf::from(format!("/proc/{pid}"));
        assert!(proc_entry.exists());

        let started = Instant::now();
        drop(process);
        assert!(started.elapsed().as_secs() < 5);
        assert!(!proc_entry.exists());
    }

    #[test]
    fn test_finished_process_is_not_killed_again() {
        let Ok(process) = FfmpegProcess::spawn("true", &[], Stdio::null()) else {
            return;
        };
        assert!(process.finish("true").is_ok());
    }

    fn plan(video: VideoProcessing, has_audio: bool) -> TranscodePlan {
        TranscodePlan {
            input: PathBuf::from("/media/in.mp4"),
            output: PathBuf::from("/media/out.mp4"),
            start_secs: 1.5,
            end_secs: 4.0,
            source: TrackInfo {
                width: 1920,
                height: 1080,
                duration_secs: 10.0,
                fps: 30.0,
                has_audio,
            },
            output_width: 640,
            output_height: 360,
            video,
            format: ExportFormat::Mp4H264,
            video_bitrate_kbps: 4000,
        }
    }

    fn value_after<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
        args.iter()
            .position(|a| a == flag)
            .and_then(|i| args.get(i + 1))
            .map(String::as_str)
    }

    #[test]
    fn test_parse_probe_output() {
        let json = r#"{
            "streams": [
                {"codec_type": "video", "width": 1280, "height": 720, "avg_frame_rate": "30000/1001", "r_frame_rate": "30000/1001"},
                {"codec_type": "audio"}
            ],
            "format": {"duration": "12.500000"}
        }"#;
        let info = parse_probe_output(json).unwrap();
        assert_eq!((info.width, info.height), (1280, 720));
        assert!((info.fps - 29.97).abs() < 0.01);
        assert!((info.duration_secs - 12.5).abs() < 1e-9);
        assert!(info.has_audio);
    }

    #[test]
    fn test_parse_probe_output_requires_video() {
        let json = r#"{"streams": [{"codec_type": "audio"}], "format": {"duration": "3.0"}}"#;
        assert!(parse_probe_output(json).is_err());
    }

    #[test]
    fn test_parse_probe_output_falls_back_on_rate() {
        let json = r#"{
            "streams": [{"codec_type": "video", "width": 640, "height": 360, "avg_frame_rate": "0/0", "r_frame_rate": "25/1"}],
            "format": {"duration": "1.0"}
        }"#;
        let info = parse_probe_output(json).unwrap();
        assert_eq!(info.fps, 25.0);
        assert!(!info.has_audio);
    }

    #[test]
    fn test_parse_frame_rate() {
        assert_eq!(parse_frame_rate("25"), Some(25.0));
        assert_eq!(parse_frame_rate("60/1"), Some(60.0));
        assert_eq!(parse_frame_rate("0/0"), None);
        assert_eq!(parse_frame_rate("abc"), None);
    }

    #[test]
    fn test_native_args_crop_then_scale() {
        let args = native_args(&plan(
            VideoProcessing::NativeCrop(Rect::new(100.0, 50.0, 640.0, 360.0)),
            true,
        ));
        assert_eq!(value_after(&args, "-vf"), Some("crop=640:360:100:50,scale=640:360"));
        assert_eq!(value_after(&args, "-ss"), Some("1.500000"));
        assert_eq!(value_after(&args, "-t"), Some("2.500000"));
        assert_eq!(value_after(&args, "-b:v"), Some("4000k"));
        assert_eq!(args.last().map(String::as_str), Some("/media/out.mp4"));
    }

    #[test]
    fn test_native_args_passthrough_scales_only() {
        let args = native_args(&plan(VideoProcessing::Passthrough, false));
        assert_eq!(value_after(&args, "-vf"), Some("scale=640:360"));
    }

    #[test]
    fn test_frame_pipeline_args() {
        let p = plan(VideoProcessing::PerSample, true);
        let decoder = decoder_args(&p);
        assert_eq!(value_after(&decoder, "-s"), Some("1920x1080"));
        assert_eq!(value_after(&decoder, "-pix_fmt"), Some("rgba"));
        assert_eq!(decoder.last().map(String::as_str), Some("pipe:1"));

        let encoder = encoder_args(&p);
        assert_eq!(value_after(&encoder, "-s"), Some("640x360"));
        assert!(encoder.iter().any(|a| a == "1:a:0"));
        assert!(encoder.iter().any(|a| a == "-shortest"));

        let silent = encoder_args(&plan(VideoProcessing::PerSample, false));
        assert!(!silent.iter().any(|a| a == "1:a:0"));
    }

    #[test]
    fn test_codec_args_without_bitrate_use_crf() {
        let args = codec_args(ExportFormat::Webm, 0);
        assert_eq!(value_after(&args, "-c:v"), Some("libvpx-vp9"));
        assert_eq!(value_after(&args, "-crf"), Some("32"));
        assert!(!args.iter().any(|a| a == "-b:v"));
    }

    #[test]
    fn test_format_fps() {
        assert_eq!(format_fps(30.0), "30");
        assert_eq!(format_fps(29.97002997), "29.970");
    }

    #[test]
    fn test_read_frame_handles_eof() {
        let data = vec![7u8; 10];
        let mut reader = std::io::Cursor::new(data);
        let mut buf = vec![0u8; 4];
        assert!(read_frame(&mut reader, &mut buf).unwrap());
        assert!(read_frame(&mut reader, &mut buf).unwrap());
        // Two trailing bytes are not a full frame.
        assert!(!read_frame(&mut reader, &mut buf).unwrap());
        assert!(!read_frame(&mut reader, &mut buf).unwrap());
    }

    #[test]
    fn test_progress_state_parses_out_time() {
        let mut state = ProgressState::default();
        state.update("out_time_us", "2500000");
        assert!((state.out_time_secs - 2.5).abs() < 1e-9);
        state.update("progress", "continue");
        assert!(!state.complete);
        state.update("progress", "end");
        assert!(state.complete);
    }
}
