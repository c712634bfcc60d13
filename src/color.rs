//! ANSI terminal colors for the access log.
//!
//! Each color is a background + foreground escape sequence, so the status code
//! and method show up as a colored block in the terminal. Both lookups are
//! pure and total: anything unrecognised falls back to a defined color.

use std::fmt;

use http::{Method, StatusCode};

/// A terminal color used by the access log.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Color {
    Blue,
    Cyan,
    Green,
    Magenta,
    Red,
    Reset,
    White,
    Yellow,
}

impl Color {
    /// The raw escape sequence.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Blue    => "\x1b[97;44m",
            Self::Cyan    => "\x1b[97;46m",
            Self::Green   => "\x1b[97;42m",
            Self::Magenta => "\x1b[97;45m",
            Self::Red     => "\x1b[97;41m",
            Self::Reset   => "\x1b[0m",
            Self::White   => "\x1b[90;47m",
            Self::Yellow  => "\x1b[97;43m",
        }
    }

    /// 2xx green, 3xx white, 4xx yellow, everything else red.
    pub fn for_status(status: StatusCode) -> Self {
        match status.as_u16() {
            200..=299 => Self::Green,
            300..=399 => Self::White,
            400..=499 => Self::Yellow,
            _         => Self::Red,
        }
    }

    /// Fixed color per standard method; extension methods get [`Color::Reset`].
    pub fn for_method(method: &Method) -> Self {
        match method.as_str() {
            "GET"     => Self::Blue,
            "POST"    => Self::Cyan,
            "PUT"     => Self::Yellow,
            "DELETE"  => Self::Red,
            "PATCH"   => Self::Green,
            "HEAD"    => Self::Magenta,
            "OPTIONS" => Self::White,
            _         => Self::Reset,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
