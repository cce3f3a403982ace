use std::collections::VecDeque;

/// Severity of an operator-facing status line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warning,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusMessage {
    pub level: StatusLevel,
    pub text: String,
}

/// Bounded queue; the oldest message is dropped once full.
#[derive(Clone, Debug)]
pub(crate) struct StatusQueue {
    messages: VecDeque<StatusMessage>,
    cap: usize,
}

impl StatusQueue {
    pub(crate) fn new(cap: usize) -> Self {
        Self {
            messages: VecDeque::new(),
            cap: cap.max(1),
        }
    }

    pub(crate) fn push(&mut self, level: StatusLevel, text: impl Into<String>) {
        if self.messages.len() == self.cap {
            self.messages.pop_front();
        }
        self.messages.push_back(StatusMessage {
            level,
            text: text.into(),
        });
    }

    pub(crate) fn drain(&mut self) -> Vec<StatusMessage> {
        self.messages.drain(..).collect()
    }
}
