//! Interactive command parsing
//!
//! One command per line. Words are case-insensitive; single-letter
//! shortcuts match the keys listed by `help`.

use crate::error::{CliError, Result};
use mirinoi_playback::RepeatMode;

/// Requested volume change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeChange {
    Set(i32),
    Adjust(i32),
}

/// Where a seek should land
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SeekTarget {
    /// Absolute position
    Millis(i64),
    /// Fraction of the track duration
    Ratio(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Play,
    Pause,
    Toggle,
    Stop,
    Next,
    Prev,
    /// Zero-based queue index
    Goto(usize),
    Shuffle,
    Repeat(RepeatMode),
    Volume(VolumeChange),
    Mute,
    Seek(SeekTarget),
    Status,
    List,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  p, play          play the current track
  pause            pause playback
  space, t         toggle pause
  s, stop          stop playback
  n, next          next track
  b, prev          previous track
  g, goto N        jump to track N (1-based)
  z, shuffle       toggle shuffle
  r, repeat MODE   repeat off | all | one
  v, vol N         volume 0-100 (+N / -N to adjust)
  m, mute          toggle mute
  seek POS         seconds, mm:ss, or N%
  i, status        show the current track
  l, list          show the queue
  h, help          this text
  q, quit          stop and exit";

/// Parse one input line; blank lines yield `None`
pub fn parse_line(line: &str) -> Result<Option<Command>> {
    if line == " " {
        return Ok(Some(Command::Toggle));
    }

    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(None);
    };
    let head = head.to_ascii_lowercase();
    let arg = words.next();

    let command = match head.as_str() {
        "p" | "play" => Command::Play,
        "pause" => Command::Pause,
        "t" | "toggle" => Command::Toggle,
        "s" | "stop" => Command::Stop,
        "n" | "next" => Command::Next,
        "b" | "prev" | "previous" => Command::Prev,
        "g" | "goto" => Command::Goto(parse_position(required(arg, "goto")?)?),
        "z" | "shuffle" => Command::Shuffle,
        "r" | "repeat" => Command::Repeat(parse_repeat(required(arg, "repeat")?)?),
        "v" | "vol" | "volume" => Command::Volume(parse_volume(required(arg, "volume")?)?),
        "m" | "mute" => Command::Mute,
        "seek" => Command::Seek(parse_seek(required(arg, "seek")?)?),
        "i" | "status" => Command::Status,
        "l" | "list" => Command::List,
        "h" | "help" | "?" => Command::Help,
        "q" | "quit" | "exit" => Command::Quit,
        other => {
            return Err(CliError::Command(format!(
                "unknown command '{other}', try 'help'"
            )))
        }
    };

    Ok(Some(command))
}

fn required<'a>(arg: Option<&'a str>, command: &str) -> Result<&'a str> {
    arg.ok_or_else(|| CliError::Command(format!("'{command}' needs an argument")))
}

fn parse_position(arg: &str) -> Result<usize> {
    match arg.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(CliError::Command(format!(
            "track number must be 1 or more, got '{arg}'"
        ))),
    }
}

fn parse_repeat(arg: &str) -> Result<RepeatMode> {
    RepeatMode::from_str(&arg.to_ascii_lowercase())
        .ok_or_else(|| CliError::Command(format!("repeat mode must be off, all or one, got '{arg}'")))
}

/// `+N` and `-N` adjust the current level; a bare number sets it
fn parse_volume(arg: &str) -> Result<VolumeChange> {
    let value = arg
        .parse::<i32>()
        .map_err(|_| CliError::Command(format!("volume must be a number, got '{arg}'")))?;

    if arg.starts_with('+') || arg.starts_with('-') {
        Ok(VolumeChange::Adjust(value))
    } else {
        Ok(VolumeChange::Set(value))
    }
}

fn parse_seek(arg: &str) -> Result<SeekTarget> {
    let invalid = || CliError::Command(format!("seek position must be seconds, mm:ss or N%, got '{arg}'"));

    if let Some(percent) = arg.strip_suffix('%') {
        let percent: f64 = percent.parse().map_err(|_| invalid())?;
        if !(0.0..=100.0).contains(&percent) {
            return Err(invalid());
        }
        return Ok(SeekTarget::Ratio(percent / 100.0));
    }

    if let Some((minutes, seconds)) = arg.split_once(':') {
        let minutes: i64 = minutes.parse().map_err(|_| invalid())?;
        let seconds: f64 = seconds.parse().map_err(|_| invalid())?;
        if minutes < 0 || !(0.0..60.0).contains(&seconds) {
            return Err(invalid());
        }
        return Ok(SeekTarget::Millis(
            minutes * 60_000 + (seconds * 1000.0).round() as i64,
        ));
    }

    let seconds: f64 = arg.parse().map_err(|_| invalid())?;
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(invalid());
    }
    Ok(SeekTarget::Millis((seconds * 1000.0).round() as i64))
}
