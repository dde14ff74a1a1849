/*!
 * Tests for subtitle parsing functionality
 */

use std::fmt::Write;

use dubwai::subtitle_processor::{CueSheet, SubtitleCue};

use crate::common;

/// Test timestamp parsing and formatting
#[test]
fn test_timestamp_parsing_withValidTimestamp_shouldParseAndFormat() {
    let ts = "01:23:45,678";
    let secs = SubtitleCue::parse_timestamp(ts).unwrap();
    assert!((secs - 5025.678).abs() < 1e-9);

    let formatted = SubtitleCue::format_timestamp(secs);
    assert_eq!(formatted, ts);
}

#[test]
fn test_timestamp_parsing_withInvalidComponents_shouldFail() {
    assert!(SubtitleCue::parse_timestamp("00:61:00,000").is_err());
    assert!(SubtitleCue::parse_timestamp("00:00:61,000").is_err());
    assert!(SubtitleCue::parse_timestamp("not a timestamp").is_err());
}

/// Test cue display formatting
#[test]
fn test_cue_display_withValidCue_shouldFormatAsSrtBlock() {
    let cue = SubtitleCue::new(1, 5.0, 10.0, "Test subtitle".to_string());
    let mut output = String::new();
    write!(output, "{}", cue).unwrap();

    assert!(output.contains("1"));
    assert!(output.contains("00:00:05,000"));
    assert!(output.contains("00:00:10,000"));
    assert!(output.contains("Test subtitle"));
}

#[test]
fn test_cue_targetDuration_shouldBeWindowLength() {
    let cue = SubtitleCue::new(3, 1.25, 4.75, "Hello".to_string());
    assert!((cue.target_duration() - 3.5).abs() < 1e-9);
}

#[test]
fn test_newValidated_withInvertedTimeRange_shouldFail() {
    assert!(SubtitleCue::new_validated(1, 5.0, 5.0, "Text".to_string()).is_err());
    assert!(SubtitleCue::new_validated(1, 5.0, 4.0, "Text".to_string()).is_err());
}

#[test]
fn test_newValidated_withBlankText_shouldFail() {
    assert!(SubtitleCue::new_validated(1, 0.0, 1.0, "   ".to_string()).is_err());
}

/// Test SRT parsing with a well-formed document
#[test]
fn test_parseSrtString_withValidContent_shouldParseAllCues() {
    let content = "1\n00:00:01,000 --> 00:00:03,000\nFirst cue.\n\n\
                   2\n00:00:04,000 --> 00:00:06,000\nSecond cue\nwith two lines.\n";
    let cues = CueSheet::parse_srt_string(content).unwrap();

    assert_eq!(cues.len(), 2);
    assert!((cues[0].start_time - 1.0).abs() < 1e-9);
    assert!((cues[0].end_time - 3.0).abs() < 1e-9);
    assert_eq!(cues[1].text, "Second cue\nwith two lines.");
}

#[test]
fn test_parseSrtString_withUnorderedCues_shouldSortAndRenumber() {
    let content = "7\n00:00:10,000 --> 00:00:12,000\nLater cue.\n\n\
                   3\n00:00:01,000 --> 00:00:03,000\nEarlier cue.\n";
    let cues = CueSheet::parse_srt_string(content).unwrap();

    assert_eq!(cues.len(), 2);
    // Sorted by start time and renumbered from 1
    assert_eq!(cues[0].index, 1);
    assert_eq!(cues[0].text, "Earlier cue.");
    assert_eq!(cues[1].index, 2);
    assert_eq!(cues[1].text, "Later cue.");
}

#[test]
fn test_parseSrtString_withInvalidCue_shouldSkipIt() {
    // Second cue has an inverted time range and must be dropped
    let content = "1\n00:00:01,000 --> 00:00:03,000\nGood cue.\n\n\
                   2\n00:00:06,000 --> 00:00:04,000\nBad cue.\n\n\
                   3\n00:00:08,000 --> 00:00:09,000\nAnother good cue.\n";
    let cues = CueSheet::parse_srt_string(content).unwrap();

    assert_eq!(cues.len(), 2);
    assert_eq!(cues[0].text, "Good cue.");
    assert_eq!(cues[1].text, "Another good cue.");
}

#[test]
fn test_parseSrtString_withNoValidCues_shouldFail() {
    assert!(CueSheet::parse_srt_string("just some prose, no timestamps").is_err());
    assert!(CueSheet::parse_srt_string("").is_err());
}

#[test]
fn test_fromSrtFile_withTestSubtitle_shouldLoadSheet() {
    let dir = common::create_temp_dir().unwrap();
    let path = common::create_test_subtitle(dir.path(), "test.srt").unwrap();

    let sheet = CueSheet::from_srt_file(&path).unwrap();
    assert_eq!(sheet.source_file, path);
    assert_eq!(sheet.cues.len(), 3);
    assert!((sheet.total_span() - 9.0).abs() < 1e-9);
}
