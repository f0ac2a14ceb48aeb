//! Normalized transcript and its text renderings.
//!
//! Supports plain text (speaker-split when available), SRT and JSON output.

use serde::{Deserialize, Serialize};
use std::fmt::Write as FmtWrite;
use std::io;
use std::path::Path;

use super::types::{JobSnapshot, SpeakerId};

/// One speaker turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptUtterance {
    pub speaker: SpeakerId,
    pub text: String,
    /// Start offset in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_ms: Option<u64>,
    /// End offset in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_ms: Option<u64>,
}

/// Final result of a completed job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptResult {
    /// Full transcript text
    pub text: String,
    /// Speaker turns, in order (only when speaker labels were requested)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utterances: Option<Vec<TranscriptUtterance>>,
    /// Confidence score (0.0 - 1.0)
    pub confidence: f64,
    /// Audio duration in seconds
    pub audio_duration_secs: f64,
    /// Language detected by the service
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl TranscriptResult {
    /// Build from a completed job. Missing numeric fields default to zero.
    pub fn from_snapshot(snapshot: &JobSnapshot) -> Self {
        let utterances = snapshot
            .utterances
            .as_ref()
            .filter(|u| !u.is_empty())
            .map(|list| {
                list.iter()
                    .map(|u| TranscriptUtterance {
                        speaker: u.speaker.clone(),
                        text: u.text.clone(),
                        start_ms: u.start,
                        end_ms: u.end,
                    })
                    .collect()
            });

        Self {
            text: snapshot.text.clone().unwrap_or_default(),
            utterances,
            confidence: snapshot.confidence.unwrap_or(0.0),
            audio_duration_secs: snapshot.audio_duration.unwrap_or(0.0),
            language: snapshot.language_code.clone(),
        }
    }

    pub fn has_speakers(&self) -> bool {
        self.utterances.is_some()
    }

    /// Distinct speakers, in order of first appearance
    pub fn speakers(&self) -> Vec<&SpeakerId> {
        let mut seen: Vec<&SpeakerId> = Vec::new();
        for u in self.utterances.iter().flatten() {
            if !seen.contains(&&u.speaker) {
                seen.push(&u.speaker);
            }
        }
        seen
    }

    pub fn export(&self, format: ExportFormat) -> String {
        match format {
            ExportFormat::Text => self.to_text(),
            ExportFormat::Srt => self.to_srt(),
            ExportFormat::Json => self.to_json(),
            ExportFormat::JsonPretty => self.to_json_pretty(),
        }
    }

    /// `Speaker X: ...` blocks separated by blank lines, or the plain text
    pub fn to_text(&self) -> String {
        match &self.utterances {
            Some(utterances) => utterances
                .iter()
                .map(|u| format!("Speaker {}: {}", u.speaker, u.text))
                .collect::<Vec<_>>()
                .join("\n\n"),
            None => self.text.clone(),
        }
    }

    /// SubRip subtitles. Without speaker turns the whole text is one cue.
    pub fn to_srt(&self) -> String {
        let mut output = String::new();

        match &self.utterances {
            Some(utterances) => {
                for (i, u) in utterances.iter().enumerate() {
                    let start = u.start_ms.unwrap_or(0);
                    let end = u.end_ms.unwrap_or(start);
                    let _ = writeln!(output, "{}", i + 1);
                    let _ = writeln!(output, "{} --> {}", format_srt_time(start), format_srt_time(end));
                    let _ = writeln!(output, "[Speaker {}] {}", u.speaker, u.text);
                    let _ = writeln!(output);
                }
            }
            None if !self.text.is_empty() => {
                let end = (self.audio_duration_secs * 1000.0) as u64;
                let _ = writeln!(output, "1");
                let _ = writeln!(output, "{} --> {}", format_srt_time(0), format_srt_time(end));
                let _ = writeln!(output, "{}", self.text);
                let _ = writeln!(output);
            }
            None => {}
        }

        output
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    pub fn save_to_file(&self, path: &Path, format: ExportFormat) -> io::Result<()> {
        std::fs::write(path, self.export(format))
    }
}

/// Export format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    /// Plain text, speaker-split when available
    #[default]
    Text,
    /// SubRip subtitle format
    Srt,
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Text => "txt",
            ExportFormat::Srt => "srt",
            ExportFormat::Json | ExportFormat::JsonPretty => "json",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "txt" | "text" => Ok(ExportFormat::Text),
            "srt" => Ok(ExportFormat::Srt),
            "json" => Ok(ExportFormat::Json),
            "json-pretty" | "json_pretty" => Ok(ExportFormat::JsonPretty),
            _ => Err(format!("Unknown format: {}. Use text, srt, json or json-pretty", s)),
        }
    }
}

/// Format milliseconds for SRT (HH:MM:SS,mmm)
fn format_srt_time(total_ms: u64) -> String {
    let ms = total_ms % 1000;
    let total_secs = total_ms / 1000;
    let secs = total_secs % 60;
    let total_mins = total_secs / 60;
    let mins = total_mins % 60;
    let hours = total_mins / 60;

    format!("{:02}:{:02}:{:02},{:03}", hours, mins, secs, ms)
}
