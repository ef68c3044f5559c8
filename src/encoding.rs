use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use tracing::debug;

use crate::error::{CollabResult, CollaboratorError};
use crate::raster::canvas::RgbFrame;

/// Frames buffered between the renderer and the ffmpeg writer thread.
const FRAME_QUEUE_DEPTH: usize = 8;

/// Audio muxed under the video, trimmed to the soundbite window.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioTrack {
    pub path: PathBuf,
    pub start: f64,
    pub duration: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EncodeSettings {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub audio: Option<AudioTrack>,
    pub ffmpeg_binary: PathBuf,
}

impl EncodeSettings {
    pub fn new(width: u32, height: u32, fps: u32) -> Self {
        Self {
            width,
            height,
            fps,
            audio: None,
            ffmpeg_binary: PathBuf::from("ffmpeg"),
        }
    }

    pub fn with_audio(mut self, audio: AudioTrack) -> Self {
        self.audio = Some(audio);
        self
    }

    fn frame_len(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }
}

/// ffmpeg child process fed raw RGB24 frames from a dedicated writer thread.
pub struct FfmpegPipe {
    sender: Option<mpsc::SyncSender<Vec<u8>>>,
    worker: Option<JoinHandle<CollabResult<()>>>,
    frame_len: usize,
    frames_sent: usize,
}

impl FfmpegPipe {
    pub fn spawn(settings: &EncodeSettings, output_path: &Path) -> CollabResult<Self> {
        validate_output_path(output_path)?;
        if settings.width == 0 || settings.height == 0 || settings.fps == 0 {
            return Err(CollaboratorError::encode(format!(
                "invalid stream {}x{} @ {} fps",
                settings.width, settings.height, settings.fps
            )));
        }

        let args = ffmpeg_args(settings, output_path);
        let ffmpeg_binary = settings.ffmpeg_binary.clone();
        let (sender, receiver) = mpsc::sync_channel::<Vec<u8>>(FRAME_QUEUE_DEPTH);

        let worker = thread::Builder::new()
            .name("audiogram-ffmpeg-encoder".to_owned())
            .spawn(move || run_ffmpeg_process(&ffmpeg_binary, &args, receiver))
            .map_err(|error| {
                CollaboratorError::encode(format!("failed to spawn ffmpeg writer thread: {error}"))
            })?;

        Ok(Self {
            sender: Some(sender),
            worker: Some(worker),
            frame_len: settings.frame_len(),
            frames_sent: 0,
        })
    }

    /// Queue the next frame. Frames must arrive in presentation order.
    pub fn write_frame(&mut self, frame: RgbFrame) -> CollabResult<()> {
        if frame.data.len() != self.frame_len {
            return Err(CollaboratorError::encode(format!(
                "frame {} has {} bytes, expected {}",
                self.frames_sent,
                frame.data.len(),
                self.frame_len
            )));
        }
        let sender = self
            .sender
            .as_ref()
            .ok_or_else(|| CollaboratorError::encode("encoder has already been finalized"))?;
        sender.send(frame.data).map_err(|_| {
            CollaboratorError::encode("ffmpeg writer stopped early; see finish() for the cause")
        })?;
        self.frames_sent += 1;
        Ok(())
    }

    pub fn frames_sent(&self) -> usize {
        self.frames_sent
    }

    /// Close stdin and wait for ffmpeg to finish the file.
    pub fn finish(mut self) -> CollabResult<()> {
        drop(self.sender.take());
        let handle = self
            .worker
            .take()
            .ok_or_else(|| CollaboratorError::encode("ffmpeg worker thread missing"))?;
        match handle.join() {
            Ok(result) => result,
            Err(_) => Err(CollaboratorError::encode("ffmpeg worker thread panicked")),
        }
    }
}

fn validate_output_path(output_path: &Path) -> CollabResult<()> {
    let path_str = output_path.to_string_lossy();
    if path_str.is_empty() {
        return Err(CollaboratorError::encode("output path is empty"));
    }
    if path_str.chars().any(char::is_control) {
        return Err(CollaboratorError::encode(
            "output path contains control characters",
        ));
    }
    Ok(())
}

fn run_ffmpeg_process(
    ffmpeg_binary: &Path,
    args: &[String],
    receiver: mpsc::Receiver<Vec<u8>>,
) -> CollabResult<()> {
    debug!(binary = %ffmpeg_binary.display(), args = %args.join(" "), "starting ffmpeg");
    let mut child = Command::new(ffmpeg_binary)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|error| {
            if error.kind() == ErrorKind::NotFound {
                CollaboratorError::encode(format!(
                    "ffmpeg executable not found at '{}'; install ffmpeg and make sure it is on PATH",
                    ffmpeg_binary.display()
                ))
            } else {
                CollaboratorError::encode(format!("failed to spawn ffmpeg: {error}"))
            }
        })?;

    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| CollaboratorError::encode("failed to capture ffmpeg stdin"))?;
    let mut stderr_pipe = child.stderr.take();

    let mut write_error = None;
    while let Ok(frame) = receiver.recv() {
        if let Err(error) = stdin.write_all(&frame) {
            write_error = Some(error);
            break;
        }
    }
    // Dropping the receiver makes further write_frame calls fail fast.
    drop(receiver);
    let _ = stdin.flush();
    drop(stdin);

    let status = child.wait()?;
    let stderr_tail = read_stderr_tail(&mut stderr_pipe);
    if !status.success() {
        return Err(CollaboratorError::encode(format!(
            "ffmpeg exited with {status} (args='{}', stderr_tail='{stderr_tail}')",
            args.join(" ")
        )));
    }
    if let Some(error) = write_error {
        return Err(CollaboratorError::encode(format!(
            "failed to write frame to ffmpeg stdin: {error}"
        )));
    }
    Ok(())
}

pub fn ffmpeg_args(settings: &EncodeSettings, output_path: &Path) -> Vec<String> {
    let mut args = rawvideo_input_args(settings);
    if let Some(audio) = &settings.audio {
        args.extend([
            "-ss".to_owned(),
            format!("{:.3}", audio.start),
            "-t".to_owned(),
            format!("{:.3}", audio.duration),
            "-i".to_owned(),
            audio.path.to_string_lossy().into_owned(),
        ]);
    }
    args.extend(h264_output_args(settings.audio.is_some()));
    args.extend(container_output_args(output_path));
    args.push(output_path.to_string_lossy().into_owned());
    args
}

fn rawvideo_input_args(settings: &EncodeSettings) -> Vec<String> {
    vec![
        "-hide_banner".to_owned(),
        "-loglevel".to_owned(),
        "error".to_owned(),
        "-y".to_owned(),
        "-f".to_owned(),
        "rawvideo".to_owned(),
        "-pix_fmt".to_owned(),
        "rgb24".to_owned(),
        "-s:v".to_owned(),
        format!("{}x{}", settings.width, settings.height),
        "-r".to_owned(),
        settings.fps.to_string(),
        "-i".to_owned(),
        "-".to_owned(),
    ]
}

fn h264_output_args(with_audio: bool) -> Vec<String> {
    let mut args = vec![
        "-map".to_owned(),
        "0:v:0".to_owned(),
        "-c:v".to_owned(),
        "libx264".to_owned(),
        "-preset".to_owned(),
        "medium".to_owned(),
        "-pix_fmt".to_owned(),
        "yuv420p".to_owned(),
    ];
    if with_audio {
        args.extend([
            "-map".to_owned(),
            "1:a:0".to_owned(),
            "-c:a".to_owned(),
            "aac".to_owned(),
            "-shortest".to_owned(),
        ]);
    } else {
        args.push("-an".to_owned());
    }
    args
}

fn container_output_args(output_path: &Path) -> Vec<String> {
    let ext = output_path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    if matches!(ext.as_str(), "mov" | "mp4" | "m4v") {
        vec!["-movflags".to_owned(), "+faststart".to_owned()]
    } else {
        Vec::new()
    }
}

fn read_stderr_tail(stderr: &mut Option<std::process::ChildStderr>) -> String {
    let Some(mut pipe) = stderr.take() else {
        return String::new();
    };
    let mut buf = Vec::new();
    if pipe.read_to_end(&mut buf).is_err() {
        return String::new();
    }
    last_n_chars(&String::from_utf8_lossy(&buf), 500)
}

fn last_n_chars(s: &str, max_chars: usize) -> String {
    let count = s.chars().count();
    s.chars()
        .skip(count.saturating_sub(max_chars))
        .collect::<String>()
        .trim()
        .to_owned()
}
