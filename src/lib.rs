//! Audiogram rendering: podcast soundbites to branded social-media videos.
//!
//! The frame core ([`composer`], [`layout`], [`raster`], [`text`],
//! [`waveform`], [`subtitles`]) is pure and infallible. The collaborators
//! around it ([`audio`], [`srt`], [`logo`], [`encoding`], [`config`]) do the
//! I/O and return typed errors; [`pipeline`] ties them together.

pub mod audio;
pub mod captions;
pub mod composer;
pub mod config;
pub mod encoding;
pub mod error;
pub mod error_codes;
pub mod format;
pub mod layout;
pub mod logo;
pub mod pipeline;
pub mod raster;
pub mod selection;
pub mod srt;
pub mod subtitles;
pub mod text;
pub mod theme;
pub mod timecode;
pub mod waveform;

pub use composer::{render_frame, FrameComposer, FrameRequest, PaintReport, StaticInputs};
pub use config::{AppConfig, ConfigOverrides};
pub use error::{CollabResult, CollaboratorError};
pub use format::{FormatSpec, PixelRect, SafeInsetsPx, VideoFormat};
pub use raster::canvas::RgbFrame;
pub use subtitles::TranscriptChunk;
pub use text::face::FontSet;
pub use theme::{ColorTheme, ThemeConfig};
pub use waveform::WaveformTrack;
