use std::fs;
use std::fmt;
use regex::Regex;
use once_cell::sync::Lazy;
use anyhow::{Result, Context, anyhow};
use std::path::{Path, PathBuf};
use log::warn;

// @module: Subtitle parsing and cue handling

// @const: SRT timestamp regex
static TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{2}):(\d{2}):(\d{2}),(\d{3}) --> (\d{2}):(\d{2}):(\d{2}),(\d{3})").unwrap()
});

// @struct: Single subtitle cue
#[derive(Debug, Clone)]
pub struct SubtitleCue {
    // @field: Ordinal position in the source file
    pub index: usize,

    // @field: Start time in seconds
    pub start_time: f64,

    // @field: End time in seconds
    pub end_time: f64,

    // @field: Cue text
    pub text: String,
}

impl SubtitleCue {
    /// Creates a new cue - used by tests and external consumers
    #[allow(dead_code)]
    pub fn new(index: usize, start_time: f64, end_time: f64, text: String) -> Self {
        SubtitleCue {
            index,
            start_time,
            end_time,
            text,
        }
    }

    // @creates: Validated cue
    // @validates: Time range and non-empty text
    pub fn new_validated(index: usize, start_time: f64, end_time: f64, text: String) -> Result<Self> {
        // Validate time range
        if end_time <= start_time {
            return Err(anyhow!(
                "Invalid time range: end time {} <= start time {}",
                end_time, start_time
            ));
        }

        // Validate text is not empty (after trimming)
        let trimmed_text = text.trim();
        if trimmed_text.is_empty() {
            return Err(anyhow!("Empty subtitle text for cue {}", index));
        }

        Ok(SubtitleCue {
            index,
            start_time,
            end_time,
            text: trimmed_text.to_string(),
        })
    }

    /// The on-screen duration this cue's audio must fill, in seconds
    pub fn target_duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    /// Parse an SRT timestamp to seconds - used by tests
    #[allow(dead_code)]
    pub fn parse_timestamp(timestamp: &str) -> Result<f64> {
        // Parse HH:MM:SS,mmm format
        let parts: Vec<&str> = timestamp.split(&[':', ',', '.'][..]).collect();

        if parts.len() != 4 {
            return Err(anyhow!("Invalid timestamp format: {}", timestamp));
        }

        let hours: u64 = parts[0].parse().context("Failed to parse hours")?;
        let minutes: u64 = parts[1].parse().context("Failed to parse minutes")?;
        let seconds: u64 = parts[2].parse().context("Failed to parse seconds")?;
        let millis: u64 = parts[3].parse().context("Failed to parse milliseconds")?;

        // Validate time components
        if minutes >= 60 || seconds >= 60 || millis >= 1000 {
            return Err(anyhow!("Invalid time components in timestamp: {}", timestamp));
        }

        let total_ms = hours * 3_600_000 + minutes * 60_000 + seconds * 1_000 + millis;
        Ok(total_ms as f64 / 1000.0)
    }

    /// Convert start time to formatted SRT timestamp
    pub fn format_start_time(&self) -> String {
        Self::format_timestamp(self.start_time)
    }

    /// Convert end time to formatted SRT timestamp
    pub fn format_end_time(&self) -> String {
        Self::format_timestamp(self.end_time)
    }

    /// Format a timestamp in seconds to SRT format (HH:MM:SS,mmm)
    pub fn format_timestamp(seconds: f64) -> String {
        let ms = (seconds * 1000.0).round().max(0.0) as u64;
        let hours = ms / 3_600_000;
        let minutes = (ms % 3_600_000) / 60_000;
        let secs = (ms % 60_000) / 1_000;
        let millis = ms % 1_000;

        format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
    }
}

impl fmt::Display for SubtitleCue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.index)?;
        writeln!(f, "{} --> {}", self.format_start_time(), self.format_end_time())?;
        writeln!(f, "{}", self.text)?;
        writeln!(f)
    }
}

/// Collection of cues from one subtitle file
#[derive(Debug)]
pub struct CueSheet {
    /// Source filename
    pub source_file: PathBuf,

    /// List of cues, ordered by start time
    pub cues: Vec<SubtitleCue>,
}

impl CueSheet {
    /// Create a new empty cue sheet
    pub fn new(source_file: PathBuf) -> Self {
        CueSheet {
            source_file,
            cues: Vec::new(),
        }
    }

    /// Parse an SRT file into a cue sheet
    pub fn from_srt_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read subtitle file: {}", path.display()))?;
        let cues = Self::parse_srt_string(&content)?;

        Ok(CueSheet {
            source_file: path.to_path_buf(),
            cues,
        })
    }

    /// Total span of the sheet in seconds (end of the last cue)
    pub fn total_span(&self) -> f64 {
        self.cues
            .iter()
            .map(|c| c.end_time)
            .fold(0.0, f64::max)
    }

    /// Parse SRT format string into cues
    pub fn parse_srt_string(content: &str) -> Result<Vec<SubtitleCue>> {
        let mut cues = Vec::new();
        let lines = content.lines().peekable();

        // State variables for parsing
        let mut current_index: Option<usize> = None;
        let mut current_start: Option<f64> = None;
        let mut current_end: Option<f64> = None;
        let mut current_text = String::new();
        let mut line_count = 0;

        // Helper function to add the current cue if complete
        let mut add_current_cue = |index: usize, start: f64, end: f64, text: &str| {
            if !text.trim().is_empty() {
                match SubtitleCue::new_validated(index, start, end, text.trim().to_string()) {
                    Ok(cue) => {
                        cues.push(cue);
                        true
                    },
                    Err(e) => {
                        warn!("Skipping invalid subtitle cue {}: {}", index, e);
                        false
                    }
                }
            } else {
                warn!("Skipping empty subtitle cue {}", index);
                false
            }
        };

        for line in lines {
            line_count += 1;
            let trimmed = line.trim();

            // Skip empty lines, but check if we need to finalize the current cue
            if trimmed.is_empty() {
                if let (Some(index), Some(start), Some(end)) = (current_index, current_start, current_end) {
                    if !current_text.is_empty() {
                        add_current_cue(index, start, end, &current_text);

                        // Reset state for next cue
                        current_index = None;
                        current_start = None;
                        current_end = None;
                        current_text.clear();
                    }
                }
                continue;
            }

            // Try to parse as sequence number (only if we're starting a new cue)
            if current_index.is_none() && current_text.is_empty() {
                if let Ok(num) = trimmed.parse::<usize>() {
                    current_index = Some(num);
                    continue;
                }
            }

            // Try to parse as timestamp
            if current_index.is_some() && current_start.is_none() && current_end.is_none() {
                if let Some(caps) = TIMESTAMP_REGEX.captures(trimmed) {
                    match (Self::parse_timestamp_to_secs(&caps, 1), Self::parse_timestamp_to_secs(&caps, 5)) {
                        (Ok(start), Ok(end)) => {
                            current_start = Some(start);
                            current_end = Some(end);
                            continue;
                        },
                        _ => {
                            // Invalid timestamp format, but we'll treat it as text
                            warn!("Invalid timestamp format at line {}: {}", line_count, trimmed);
                        }
                    }
                }
            }

            // If we have a sequence number and timestamps, this must be cue text
            if current_index.is_some() && current_start.is_some() && current_end.is_some() {
                if !current_text.is_empty() {
                    current_text.push('\n');
                }
                current_text.push_str(trimmed);
            } else {
                // We have text but no sequence number or timestamps yet
                // This is likely malformed SRT, but we'll try to recover
                warn!("Unexpected text at line {} before sequence number or timestamp: {}", line_count, trimmed);
            }
        }

        // Add the last cue if there is one
        if let (Some(index), Some(start), Some(end)) = (current_index, current_start, current_end) {
            if !current_text.is_empty() {
                add_current_cue(index, start, end, &current_text);
            }
        }

        if cues.is_empty() {
            warn!("No valid subtitle cues found in content");
            return Err(anyhow::anyhow!("No valid subtitle cues were found in the SRT content"));
        }

        // Sort by start time to ensure correct order
        cues.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));

        // Check for overlapping cues
        let mut overlap_count = 0;
        for i in 0..cues.len().saturating_sub(1) {
            if cues[i].end_time > cues[i + 1].start_time {
                overlap_count += 1;
            }
        }

        if overlap_count > 0 {
            warn!("Found {} overlapping subtitle cues", overlap_count);
        }

        // Renumber cues to ensure sequential order
        for (i, cue) in cues.iter_mut().enumerate() {
            cue.index = i + 1;
        }

        Ok(cues)
    }

    /// Parse timestamp captures to seconds
    fn parse_timestamp_to_secs(caps: &regex::Captures, start_idx: usize) -> Result<f64> {
        let hours: u64 = caps.get(start_idx)
            .map_or(0, |m| m.as_str().parse().unwrap_or(0));
        let minutes: u64 = caps.get(start_idx + 1)
            .map_or(0, |m| m.as_str().parse().unwrap_or(0));
        let seconds: u64 = caps.get(start_idx + 2)
            .map_or(0, |m| m.as_str().parse().unwrap_or(0));
        let millis: u64 = caps.get(start_idx + 3)
            .map_or(0, |m| m.as_str().parse().unwrap_or(0));

        let total_ms = (hours * 3600 + minutes * 60 + seconds) * 1000 + millis;
        Ok(total_ms as f64 / 1000.0)
    }
}

impl fmt::Display for CueSheet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Cue Sheet")?;
        writeln!(f, "Source: {:?}", self.source_file)?;
        writeln!(f, "Cues: {}", self.cues.len())?;
        Ok(())
    }
}
