//! Speaker-notes helpers: the speaking-duration grammar and delivery marks in scripts.
//!
//! Durations come from free model text, so they are parsed with an explicit grammar and then
//! normalised. Formatting a parsed duration is not guaranteed to reproduce the input: `90s`
//! formats as `1min 30s`.

use deck_types::Slide;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DurationError {
    #[error("duration is empty")]
    Empty,
    #[error("duration '{0}' does not match '<minutes>min <seconds>s'")]
    Invalid(String),
}

/// Estimated speaking time for one slide.
///
/// Grammar (case-insensitive, surrounding whitespace ignored):
///
/// ```text
/// duration := minutes [ws] seconds | minutes | seconds
/// minutes  := digits [ws] "min"
/// seconds  := digits [ws] "s"
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeakingDuration {
    minutes: u32,
    seconds: u32,
}

impl SpeakingDuration {
    pub fn parse(raw: &str) -> Result<Self, DurationError> {
        let input = raw.trim().to_ascii_lowercase();
        if input.is_empty() {
            return Err(DurationError::Empty);
        }
        let invalid = || DurationError::Invalid(raw.trim().to_owned());

        let (first, after) = take_number(&input).ok_or_else(invalid)?;
        let after = after.trim_start();

        let (minutes, seconds, rest) = if let Some(after_min) = after.strip_prefix("min") {
            let after_min = after_min.trim_start();
            match take_number(after_min) {
                Some((secs, tail)) => {
                    let tail = tail.trim_start().strip_prefix('s').ok_or_else(invalid)?;
                    (first, secs, tail)
                }
                None => (first, 0, after_min),
            }
        } else if let Some(after_s) = after.strip_prefix('s') {
            (0, first, after_s)
        } else {
            return Err(invalid());
        };

        if !rest.trim().is_empty() {
            return Err(invalid());
        }

        Ok(Self { minutes, seconds })
    }

    pub fn from_seconds(total: u32) -> Self {
        Self {
            minutes: total / 60,
            seconds: total % 60,
        }
    }

    pub fn total_seconds(&self) -> u32 {
        self.minutes.saturating_mul(60).saturating_add(self.seconds)
    }
}

impl std::fmt::Display for SpeakingDuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let total = self.total_seconds();
        let (minutes, seconds) = (total / 60, total % 60);
        match (minutes, seconds) {
            (0, s) => write!(f, "{}s", s),
            (m, 0) => write!(f, "{}min", m),
            (m, s) => write!(f, "{}min {}s", m, s),
        }
    }
}

impl std::str::FromStr for SpeakingDuration {
    type Err = DurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn take_number(input: &str) -> Option<(u32, &str)> {
    let end = input
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(input.len());
    if end == 0 {
        return None;
    }
    let value = input[..end].parse().ok()?;
    Some((value, &input[end..]))
}

/// Total speaking time of a deck in seconds. Unparseable durations count as zero.
pub fn total_duration(slides: &[Slide]) -> u32 {
    slides
        .iter()
        .filter_map(|slide| SpeakingDuration::parse(&slide.speaker_notes.duration).ok())
        .fold(0u32, |acc, d| acc.saturating_add(d.total_seconds()))
}

/// Inline delivery cue embedded in a script as `[MARK]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMark {
    Pause,
    Important,
    Emphasize,
    Transition,
    Story,
    Question,
    Action,
}

impl DeliveryMark {
    pub const ALL: [DeliveryMark; 7] = [
        DeliveryMark::Pause,
        DeliveryMark::Important,
        DeliveryMark::Emphasize,
        DeliveryMark::Transition,
        DeliveryMark::Story,
        DeliveryMark::Question,
        DeliveryMark::Action,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryMark::Pause => "PAUSE",
            DeliveryMark::Important => "IMPORTANT",
            DeliveryMark::Emphasize => "EMPHASIZE",
            DeliveryMark::Transition => "TRANSITION",
            DeliveryMark::Story => "STORY",
            DeliveryMark::Question => "QUESTION",
            DeliveryMark::Action => "ACTION",
        }
    }

    fn from_label(label: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|mark| mark.as_str().eq_ignore_ascii_case(label))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptSegment {
    Text(String),
    Mark(DeliveryMark),
}

/// Splits a speaker script into plain text and delivery marks.
///
/// Bracketed text that is not a known mark stays part of the surrounding text.
pub fn script_segments(script: &str) -> Vec<ScriptSegment> {
    let mut segments = Vec::new();
    let mut text_start = 0;
    let mut cursor = 0;

    while let Some(open) = script[cursor..].find('[').map(|i| cursor + i) {
        let Some(close) = script[open..].find(']').map(|i| open + i) else {
            break;
        };

        match DeliveryMark::from_label(&script[open + 1..close]) {
            Some(mark) => {
                if open > text_start {
                    segments.push(ScriptSegment::Text(script[text_start..open].to_owned()));
                }
                segments.push(ScriptSegment::Mark(mark));
                text_start = close + 1;
                cursor = close + 1;
            }
            None => cursor = open + 1,
        }
    }

    if text_start < script.len() {
        segments.push(ScriptSegment::Text(script[text_start..].to_owned()));
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::fixtures::slide_json;

    #[test]
    fn test_parse_minutes_and_seconds() {
        let d = SpeakingDuration::parse("2min 30s").expect("valid");
        assert_eq!(d.total_seconds(), 150);
        assert_eq!(SpeakingDuration::parse("2min30s").expect("valid").total_seconds(), 150);
        assert_eq!(SpeakingDuration::parse(" 1 MIN 5 S ").expect("valid").total_seconds(), 65);
    }

    #[test]
    fn test_parse_single_component() {
        assert_eq!(SpeakingDuration::parse("3min").expect("valid").total_seconds(), 180);
        assert_eq!(SpeakingDuration::parse("45s").expect("valid").total_seconds(), 45);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(SpeakingDuration::parse(""), Err(DurationError::Empty));
        for bad in ["abc", "2 minutes", "1.5min", "min 30s", "30", "2min 30", "2min 30s extra"] {
            assert!(
                matches!(SpeakingDuration::parse(bad), Err(DurationError::Invalid(_))),
                "{}",
                bad
            );
        }
    }

    #[test]
    fn test_display_normalises() {
        let cases = [("90s", "1min 30s"), ("2min", "2min"), ("0s", "0s"), ("1min 75s", "2min 15s")];
        for (input, expected) in cases {
            let d: SpeakingDuration = input.parse().expect("valid");
            assert_eq!(d.to_string(), expected);
        }
        assert_eq!(SpeakingDuration::from_seconds(61).to_string(), "1min 1s");
    }

    #[test]
    fn test_total_duration_skips_unparseable() {
        let mut a: Slide = serde_json::from_value(slide_json(1, "title")).expect("slide");
        let mut b = a.clone();
        let mut c = a.clone();
        a.speaker_notes.duration = "1min 30s".into();
        b.speaker_notes.duration = "45s".into();
        c.speaker_notes.duration = "soon".into();
        assert_eq!(total_duration(&[a, b, c]), 135);
    }

    #[test]
    fn test_script_segments_splits_marks() {
        let segments = script_segments("Hello [pause] and now [IMPORTANT]this.");
        assert_eq!(
            segments,
            vec![
                ScriptSegment::Text("Hello ".into()),
                ScriptSegment::Mark(DeliveryMark::Pause),
                ScriptSegment::Text(" and now ".into()),
                ScriptSegment::Mark(DeliveryMark::Important),
                ScriptSegment::Text("this.".into()),
            ]
        );
    }

    #[test]
    fn test_script_segments_keeps_unknown_brackets_as_text() {
        let segments = script_segments("See [figure 2] then [ACTION]");
        assert_eq!(
            segments,
            vec![
                ScriptSegment::Text("See [figure 2] then ".into()),
                ScriptSegment::Mark(DeliveryMark::Action),
            ]
        );
    }
}
