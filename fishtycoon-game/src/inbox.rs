//! Player inbox ("emails"): short notices about milestones.
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::constants::INBOX_CAPACITY;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MailKind {
    Discovery,
    SkillLevelUp,
    Prestige,
    OfflineReport,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mail {
    pub id: u64,
    pub kind: MailKind,
    pub subject: String,
    pub body: String,
    #[serde(default)]
    pub read: bool,
}

/// Bounded mailbox; the oldest message is dropped when full.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Inbox {
    #[serde(default)]
    messages: VecDeque<Mail>,
    #[serde(default)]
    next_id: u64,
}

impl Inbox {
    pub fn deliver(&mut self, kind: MailKind, subject: impl Into<String>, body: impl Into<String>) {
        self.next_id = self.next_id.saturating_add(1);
        self.messages.push_back(Mail {
            id: self.next_id,
            kind,
            subject: subject.into(),
            body: body.into(),
            read: false,
        });
        while self.messages.len() > INBOX_CAPACITY {
            self.messages.pop_front();
        }
    }

    /// Returns whether a message was newly marked.
    pub fn mark_read(&mut self, id: u64) -> bool {
        match self.messages.iter_mut().find(|mail| mail.id == id) {
            Some(mail) if !mail.read => {
                mail.read = true;
                true
            }
            _ => false,
        }
    }

    #[must_use]
    pub fn unread_count(&self) -> usize {
        self.messages.iter().filter(|mail| !mail.read).count()
    }

    pub fn messages(&self) -> impl Iterator<Item = &Mail> {
        self.messages.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Rebuild from saved messages, keeping ids unique and monotonic.
    pub(crate) fn from_saved(mut messages: Vec<Mail>) -> Self {
        if messages.len() > INBOX_CAPACITY {
            messages.drain(..messages.len() - INBOX_CAPACITY);
        }
        let next_id = messages.iter().map(|mail| mail.id).max().unwrap_or(0);
        Self {
            messages: messages.into(),
            next_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_drops_oldest() {
        let mut inbox = Inbox::default();
        for n in 0..(INBOX_CAPACITY + 5) {
            inbox.deliver(MailKind::Discovery, format!("fish {n}"), "");
        }
        assert_eq!(inbox.len(), INBOX_CAPACITY);
        assert_eq!(inbox.messages().next().map(|mail| mail.id), Some(6));
    }

    #[test]
    fn mark_read_is_one_shot() {
        let mut inbox = Inbox::default();
        inbox.deliver(MailKind::Prestige, "Prestige 1", "Welcome back");
        assert_eq!(inbox.unread_count(), 1);
        assert!(inbox.mark_read(1));
        assert!(!inbox.mark_read(1));
        assert!(!inbox.mark_read(99));
        assert_eq!(inbox.unread_count(), 0);
    }

    #[test]
    fn restored_ids_continue() {
        let saved = vec![Mail {
            id: 41,
            kind: MailKind::OfflineReport,
            subject: "While you were away".into(),
            body: String::new(),
            read: true,
        }];
        let mut inbox = Inbox::from_saved(saved);
        inbox.deliver(MailKind::Discovery, "New fish", "");
        assert_eq!(inbox.messages().last().map(|mail| mail.id), Some(42));
    }
}
