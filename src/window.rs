//! Time variables and visible-window snapshots
//!
//! Each decoder can window its table over one of two time columns (virtual
//! send/receive time for event traces, virtual/real time for the others).
//! The current selection is an immutable [`WindowState`]: selecting another
//! time variable or resetting the range produces a fresh snapshot computed
//! from the full decoded table.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{Result, TraceError};
use crate::frame::Frame;

/// A time column a decoder can window over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeVariable {
    /// Virtual time an event was sent (event traces)
    VirtualSend,
    /// Virtual time an event was received (event traces)
    VirtualReceive,
    /// Simulation (virtual) time of a sample
    VirtualTime,
    /// Wall-clock time of a sample
    RealTime,
}

impl TimeVariable {
    pub const ALL: [TimeVariable; 4] = [
        TimeVariable::VirtualSend,
        TimeVariable::VirtualReceive,
        TimeVariable::VirtualTime,
        TimeVariable::RealTime,
    ];

    /// Name of the column holding this time
    pub fn column_name(&self) -> &'static str {
        match self {
            TimeVariable::VirtualSend => "virtual_send",
            TimeVariable::VirtualReceive => "virtual_receive",
            TimeVariable::VirtualTime => "virtual_time",
            TimeVariable::RealTime => "real_time",
        }
    }
}

impl std::fmt::Display for TimeVariable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.column_name())
    }
}

impl FromStr for TimeVariable {
    type Err = TraceError;

    fn from_str(s: &str) -> Result<Self> {
        TimeVariable::ALL
            .into_iter()
            .find(|v| v.column_name() == s)
            .ok_or_else(|| TraceError::UnsupportedTimeVariable {
                variable: s.to_string(),
                decoder: "any decoder",
                expected: join_names(&TimeVariable::ALL),
            })
    }
}

fn join_names(vars: &[TimeVariable]) -> String {
    vars.iter()
        .map(TimeVariable::column_name)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Closed `[min, max]` interval over a time column
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimeWindow {
    pub min: f64,
    pub max: f64,
}

impl TimeWindow {
    /// Build a window; bounds given in the wrong order are swapped
    ///
    /// Returns `None` unless both bounds are finite.
    pub fn new(a: f64, b: f64) -> Option<Self> {
        if !a.is_finite() || !b.is_finite() {
            return None;
        }
        if a <= b {
            Some(Self { min: a, max: b })
        } else {
            Some(Self { min: b, max: a })
        }
    }

    pub fn contains(&self, t: f64) -> bool {
        t >= self.min && t <= self.max
    }
}

/// Snapshot of the active time variable and its visible range
///
/// `window` is `None` when the table it was computed from had no rows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WindowState {
    variable: TimeVariable,
    window: Option<TimeWindow>,
}

impl WindowState {
    /// Window spanning the full range of `variable` in `frame`
    pub fn full(frame: &Frame, variable: TimeVariable) -> Self {
        let column = variable.column_name();
        let window = match (frame.min(column), frame.max(column)) {
            (Some(min), Some(max)) => Some(TimeWindow { min, max }),
            _ => None,
        };
        Self { variable, window }
    }

    /// Same variable, explicit range
    ///
    /// A range with a non-finite bound is ignored and the snapshot is kept.
    pub fn with_range(&self, min: f64, max: f64) -> Self {
        match TimeWindow::new(min, max) {
            Some(window) => Self {
                variable: self.variable,
                window: Some(window),
            },
            None => {
                tracing::warn!("Ignoring non-finite time range {}..{}", min, max);
                *self
            }
        }
    }

    pub fn variable(&self) -> TimeVariable {
        self.variable
    }

    pub fn window(&self) -> Option<TimeWindow> {
        self.window
    }

    pub fn min_time(&self) -> Option<f64> {
        self.window.map(|w| w.min)
    }

    pub fn max_time(&self) -> Option<f64> {
        self.window.map(|w| w.max)
    }

    /// Rows of `frame` whose active time lies inside the window
    ///
    /// Without a window (nothing decoded) the result has the frame's columns
    /// and no rows.
    pub fn apply(&self, frame: &Frame) -> Frame {
        let Some(window) = self.window else {
            return Frame::new(frame.columns().iter().cloned());
        };
        let column = self.variable.column_name();
        frame.filter(|row| row.get(column).is_some_and(|v| window.contains(v.as_f64())))
    }
}

/// A decoded table together with its time-window selection
///
/// Shared by every decoder: it owns the full (validated) table, the two time
/// variables the decoder supports, and the current [`WindowState`].
#[derive(Debug, Clone)]
pub struct WindowedFrame {
    decoder: &'static str,
    choices: [TimeVariable; 2],
    frame: Frame,
    state: WindowState,
}

impl WindowedFrame {
    /// Empty table; the first choice is the default time variable
    pub fn new(decoder: &'static str, choices: [TimeVariable; 2]) -> Self {
        Self {
            decoder,
            choices,
            frame: Frame::default(),
            state: WindowState {
                variable: choices[0],
                window: None,
            },
        }
    }

    /// Replace the table and reset the window over the current variable
    pub fn set_frame(&mut self, frame: Frame) {
        self.state = WindowState::full(&frame, self.state.variable);
        self.frame = frame;
    }

    /// The full decoded table
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// The table restricted to the current window
    pub fn windowed(&self) -> Frame {
        self.state.apply(&self.frame)
    }

    pub fn state(&self) -> WindowState {
        self.state
    }

    pub fn time_variable(&self) -> TimeVariable {
        self.state.variable
    }

    /// Time variables this table can be windowed over
    pub fn time_choices(&self) -> [TimeVariable; 2] {
        self.choices
    }

    pub fn min_time(&self) -> Option<f64> {
        self.state.min_time()
    }

    pub fn max_time(&self) -> Option<f64> {
        self.state.max_time()
    }

    /// Switch the active time column by name
    ///
    /// The window is recomputed from the full table under the new column,
    /// never from the previous window.
    pub fn select_time_variable(&mut self, name: &str) -> Result<WindowState> {
        let variable = self
            .choices
            .into_iter()
            .find(|v| v.column_name() == name)
            .ok_or_else(|| TraceError::UnsupportedTimeVariable {
                variable: name.to_string(),
                decoder: self.decoder,
                expected: join_names(&self.choices),
            })?;
        self.state = WindowState::full(&self.frame, variable);
        Ok(self.state)
    }

    /// Narrow (or widen) the visible range of the current variable
    pub fn set_time_range(&mut self, min: f64, max: f64) -> WindowState {
        self.state = self.state.with_range(min, max);
        self.state
    }

    /// Restore the full range of the current variable
    pub fn reset_time_range(&mut self) -> WindowState {
        self.state = WindowState::full(&self.frame, self.state.variable);
        self.state
    }
}
