//! Caption data model and format conversion.
//!
//! Pure transformation of the provider's time-stamped line sequence into
//! LRC or SRT caption entries, or a raw passthrough. No I/O, deterministic.

use serde::{Deserialize, Serialize};

/// A single raw lyric line as delivered by the provider.
///
/// Lines arrive ordered by ascending `start_time_ms` and are never
/// reordered here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLyricLine {
    /// Line start offset in milliseconds from the beginning of the track.
    pub start_time_ms: i64,
    pub words: String,
}

/// An LRC caption entry with an `mm:ss.cc` time tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LrcCaption {
    pub time_tag: String,
    pub words: String,
}

/// An SRT caption entry spanning two consecutive raw lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SrtCaption {
    /// 1-based entry index.
    pub index: usize,
    /// Start time in `hh:mm:ss,mmm`.
    pub start_time: String,
    /// End time in `hh:mm:ss,mmm`, taken from the next line's start.
    pub end_time: String,
    pub words: String,
}

/// Requested output representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptionFormat {
    Lrc,
    Srt,
    #[default]
    Raw,
}

impl CaptionFormat {
    /// Parse the request's `format` query value.
    ///
    /// Absent or unrecognized values fall through to the raw passthrough.
    #[must_use]
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("lrc") => Self::Lrc,
            Some("srt") => Self::Srt,
            _ => Self::Raw,
        }
    }

    /// Render raw lines into this format.
    #[must_use]
    pub fn render(self, lines: Vec<RawLyricLine>) -> CaptionLines {
        match self {
            Self::Lrc => CaptionLines::Lrc(to_lrc(&lines)),
            Self::Srt => CaptionLines::Srt(to_srt(&lines)),
            Self::Raw => CaptionLines::Raw(lines),
        }
    }
}

/// Rendered caption lines in one of the supported representations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CaptionLines {
    Lrc(Vec<LrcCaption>),
    Srt(Vec<SrtCaption>),
    Raw(Vec<RawLyricLine>),
}

/// Convert raw lines to LRC entries, one per line.
#[must_use]
pub fn to_lrc(lines: &[RawLyricLine]) -> Vec<LrcCaption> {
    lines
        .iter()
        .map(|line| LrcCaption {
            time_tag: format_lrc_time(line.start_time_ms),
            words: line.words.clone(),
        })
        .collect()
}

/// Convert raw lines to SRT entries built from consecutive pairs.
///
/// Each entry takes its end time from the next line's start, so the last
/// raw line produces no entry of its own and fewer than two lines produce
/// nothing.
#[must_use]
pub fn to_srt(lines: &[RawLyricLine]) -> Vec<SrtCaption> {
    lines
        .windows(2)
        .enumerate()
        .map(|(i, pair)| SrtCaption {
            index: i + 1,
            start_time: format_srt_time(pair[0].start_time_ms),
            end_time: format_srt_time(pair[1].start_time_ms),
            words: pair[0].words.clone(),
        })
        .collect()
}

/// Format milliseconds as an LRC time tag (`mm:ss.cc`).
///
/// Centiseconds are truncated, not rounded. Minutes are not capped at 59.
fn format_lrc_time(milliseconds: i64) -> String {
    let ms = milliseconds.max(0);
    let total_secs = ms / 1000;
    let minutes = total_secs / 60;
    let seconds = total_secs % 60;
    let centis = (ms % 1000) / 10;
    format!("{minutes:02}:{seconds:02}.{centis:02}")
}

/// Format milliseconds as an SRT timestamp (`hh:mm:ss,mmm`), full
/// millisecond precision.
fn format_srt_time(milliseconds: i64) -> String {
    let ms = milliseconds.max(0);
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1000;
    let millis = ms % 1000;
    format!("{hours:02}:{minutes:02}:{seconds:02},{millis:03}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(start_time_ms: i64, words: &str) -> RawLyricLine {
        RawLyricLine {
            start_time_ms,
            words: words.to_string(),
        }
    }

    #[test]
    fn test_to_lrc_zero_start() {
        let result = to_lrc(&[line(0, "a")]);
        assert_eq!(
            result,
            vec![LrcCaption {
                time_tag: "00:00.00".to_string(),
                words: "a".to_string(),
            }]
        );
    }

    #[test]
    fn test_to_lrc_truncates_centiseconds() {
        let result = to_lrc(&[line(61_234, "x")]);
        assert_eq!(result[0].time_tag, "01:01.23");
    }

    #[test]
    fn test_to_lrc_minutes_beyond_an_hour() {
        // 61 minutes, 5 seconds: LRC minutes are not capped at 59
        let result = to_lrc(&[line(61 * 60_000 + 5_000, "late")]);
        assert_eq!(result[0].time_tag, "61:05.00");
    }

    #[test]
    fn test_to_srt_consecutive_pairs() {
        let result = to_srt(&[line(0, "a"), line(1000, "b"), line(2500, "c")]);
        assert_eq!(result.len(), 2);
        assert_eq!(
            result[0],
            SrtCaption {
                index: 1,
                start_time: "00:00:00,000".to_string(),
                end_time: "00:00:01,000".to_string(),
                words: "a".to_string(),
            }
        );
        assert_eq!(
            result[1],
            SrtCaption {
                index: 2,
                start_time: "00:00:01,000".to_string(),
                end_time: "00:00:02,500".to_string(),
                words: "b".to_string(),
            }
        );
    }

    #[test]
    fn test_to_srt_empty_input() {
        assert!(to_srt(&[]).is_empty());
    }

    #[test]
    fn test_to_srt_single_line_has_no_successor() {
        assert!(to_srt(&[line(5000, "only")]).is_empty());
    }

    #[test]
    fn test_srt_time_includes_hours() {
        let result = to_srt(&[line(3_600_000, "a"), line(3_661_500, "b")]);
        assert_eq!(result[0].start_time, "01:00:00,000");
        assert_eq!(result[0].end_time, "01:01:01,500");
    }

    #[test]
    fn test_format_parse() {
        assert_eq!(CaptionFormat::parse(Some("lrc")), CaptionFormat::Lrc);
        assert_eq!(CaptionFormat::parse(Some("srt")), CaptionFormat::Srt);
        assert_eq!(CaptionFormat::parse(Some("raw")), CaptionFormat::Raw);
        assert_eq!(CaptionFormat::parse(Some("vtt")), CaptionFormat::Raw);
        assert_eq!(CaptionFormat::parse(None), CaptionFormat::Raw);
    }

    #[test]
    fn test_render_raw_is_identity() {
        let lines = vec![line(0, "a"), line(1000, "b")];
        let rendered = CaptionFormat::Raw.render(lines.clone());
        assert_eq!(rendered, CaptionLines::Raw(lines));
    }

    #[test]
    fn test_lrc_wire_field_names() {
        let value = serde_json::to_value(LrcCaption {
            time_tag: "00:00.00".to_string(),
            words: "a".to_string(),
        })
        .expect("serialization should succeed");
        assert_eq!(value["timeTag"], "00:00.00");
        assert_eq!(value["words"], "a");
    }

    #[test]
    fn test_srt_wire_field_names() {
        let value = serde_json::to_value(SrtCaption {
            index: 1,
            start_time: "00:00:00,000".to_string(),
            end_time: "00:00:01,000".to_string(),
            words: "a".to_string(),
        })
        .expect("serialization should succeed");
        assert_eq!(value["index"], 1);
        assert_eq!(value["startTime"], "00:00:00,000");
        assert_eq!(value["endTime"], "00:00:01,000");
    }

    #[test]
    fn test_raw_line_parses_wire_names() {
        let parsed: RawLyricLine =
            serde_json::from_str(r#"{"startTimeMs": 1500, "words": "hello"}"#)
                .expect("deserialization should succeed");
        assert_eq!(parsed, line(1500, "hello"));
    }
}
