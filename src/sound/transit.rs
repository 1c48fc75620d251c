//! Spoken departure announcements

use std::time::{Duration, SystemTime};

use tracing::debug;

use super::vox::say;
use super::{SoundContext, SoundError};

/// Which departure an announcement is about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Departure {
    Next,
    /// Last departure of the day, with escalating warnings
    Last,
}

impl Departure {
    fn prefix(self, remaining: Option<Duration>) -> &'static str {
        match (self, remaining) {
            (Departure::Next, _) => "next",
            (Departure::Last, Some(r)) if r <= Duration::from_secs(15 * 60) => {
                "warning warning last"
            }
            (Departure::Last, Some(r)) if r <= Duration::from_secs(30 * 60) => "warning last",
            (Departure::Last, _) => "last",
        }
    }
}

/// Announces when a line departs next
#[derive(Debug)]
pub struct Transit {
    line: String,
    departure: Departure,
    ctx: SoundContext,
}

impl Transit {
    pub fn new(ctx: &SoundContext, line: impl Into<String>, departure: Departure) -> Self {
        Self {
            line: line.into(),
            departure,
            ctx: ctx.clone(),
        }
    }

    fn arrival(&self) -> Option<SystemTime> {
        match self.departure {
            Departure::Next => self.ctx.transit.next_arrival(&self.line),
            Departure::Last => self.ctx.transit.next_last_arrival(&self.line),
        }
    }

    pub fn play(&self) -> Result<(), SoundError> {
        let sentence = announcement(self.departure, &self.line, self.arrival(), SystemTime::now());
        debug!(line = %self.line, %sentence, "transit announcement");
        say(&self.ctx, &sentence)
    }
}

/// Compose the sentence for a departure seen at `now`
pub fn announcement(
    departure: Departure,
    line: &str,
    arrival: Option<SystemTime>,
    now: SystemTime,
) -> String {
    let Some(arrival) = arrival else {
        return format!("{} {} time unavailable", departure.prefix(None), humanize_line(line));
    };

    let (delta, remaining) = match arrival.duration_since(now) {
        Ok(ahead) => (ahead.as_secs() as i64, ahead),
        Err(e) => (-(e.duration().as_secs() as i64), Duration::ZERO),
    };

    format!(
        "{} {} {}",
        departure.prefix(Some(remaining)),
        humanize_line(line),
        pluralize_minutes(&humanize_delta(delta))
    )
}

/// Spoken name of a line: trams, day buses and metro lines
pub fn humanize_line(line: &str) -> String {
    let digits = !line.is_empty() && line.chars().all(|c| c.is_ascii_digit());

    if digits && line.len() <= 2 {
        format!("topside train number {}", line)
    } else if digits && line.len() == 3 {
        format!("day bus number {}", line)
    } else if is_metro(line) {
        "subsurface train".to_string()
    } else {
        "transportation".to_string()
    }
}

fn is_metro(line: &str) -> bool {
    let lower = line.to_lowercase();
    lower
        .strip_prefix('m')
        .is_some_and(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()))
}

/// Relative time in words, `delta` seconds from now
pub fn humanize_delta(delta: i64) -> String {
    let secs = delta.unsigned_abs();

    let amount = if secs < 10 {
        return "just now".to_string();
    } else if secs < 45 {
        "seconds".to_string()
    } else if secs < 90 {
        "a minute".to_string()
    } else if secs < 45 * 60 {
        format!("{} minutes", (secs / 60).max(2))
    } else if secs < 90 * 60 {
        "an hour".to_string()
    } else if secs < 22 * 3600 {
        format!("{} hours", (secs / 3600).max(2))
    } else if secs < 36 * 3600 {
        "a day".to_string()
    } else {
        format!("{} days", (secs / 86_400).max(2))
    };

    if delta > 0 {
        format!("in {}", amount)
    } else {
        format!("{} ago", amount)
    }
}

/// The vox voice only has the plural recording
fn pluralize_minutes(text: &str) -> String {
    text.split(' ')
        .map(|w| if w == "minute" { "minutes" } else { w })
        .collect::<Vec<_>>()
        .join(" ")
}
