use std::fmt;
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use super::deep::NotSerializable;
use super::shallow::ShallowClone;
use crate::error::CloneError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
}

impl Attachment {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A weekly work log used as a prototype: every week starts as a copy of the
/// previous one with a new date and content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyLog {
    pub name: String,
    pub date: String,
    pub content: String,
    pub attachment: Arc<Mutex<Attachment>>,
}

impl WeeklyLog {
    pub fn new(
        name: impl Into<String>,
        date: impl Into<String>,
        content: impl Into<String>,
        attachment: Attachment,
    ) -> Self {
        Self {
            name: name.into(),
            date: date.into(),
            content: content.into(),
            attachment: Arc::new(Mutex::new(attachment)),
        }
    }

    pub fn attachment_name(&self) -> String {
        self.attachment
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .name
            .clone()
    }

    /// Renames the attachment in place. Logs sharing it see the change.
    pub fn rename_attachment(&self, name: impl Into<String>) {
        self.attachment
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .name = name.into();
    }

    pub fn shares_attachment_with(&self, other: &WeeklyLog) -> bool {
        Arc::ptr_eq(&self.attachment, &other.attachment)
    }

    /// Next week's log: a shallow copy with a new date and content.
    pub fn next_week(
        &self,
        date: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<Self, CloneError> {
        let mut next = self.shallow_clone()?;
        next.date = date.into();
        next.content = content.into();
        Ok(next)
    }
}

crate::impl_shallow_clone!(WeeklyLog);

impl PartialEq for WeeklyLog {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.date == other.date
            && self.content == other.content
            && (self.shares_attachment_with(other) || self.attachment_name() == other.attachment_name())
    }
}

impl fmt::Display for WeeklyLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {} (attachment: {})",
            self.name,
            self.date,
            self.content,
            self.attachment_name()
        )
    }
}

/// A log that pushes notifications through a channel. The channel endpoint
/// cannot be serialized and duplicating the log would double the
/// notifications, so both clone operations are refused.
#[derive(Debug, Serialize, Deserialize)]
pub struct NotifyingLog {
    pub log: WeeklyLog,
    pub notifier: NotSerializable<Sender<String>>,
}

impl NotifyingLog {
    pub fn new(log: WeeklyLog, notifier: Sender<String>) -> Self {
        Self {
            log,
            notifier: NotSerializable::new(notifier),
        }
    }

    pub fn publish(&self) -> bool {
        self.notifier.send(self.log.to_string()).is_ok()
    }
}

impl ShallowClone for NotifyingLog {}
