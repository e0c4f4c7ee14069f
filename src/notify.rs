use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// Notice
///
/// A transient, user-visible notification (a toast).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }
}

/// Notifier
///
/// Sending half of the notice stream. Whoever renders toasts holds the receiver;
/// when nobody does, notices are only logged.
#[derive(Clone, Debug)]
pub struct Notifier {
    tx: Option<mpsc::UnboundedSender<Notice>>,
}

impl Notifier {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// A notifier that only logs.
    pub fn silent() -> Self {
        Self { tx: None }
    }

    pub fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Success => tracing::info!(notice = %notice.text, "notice"),
            NoticeLevel::Error => tracing::warn!(notice = %notice.text, "notice"),
        }
        if let Some(tx) = &self.tx {
            // A dropped receiver means the view is gone; the notice has nowhere to go.
            let _ = tx.send(notice);
        }
    }

    pub fn success(&self, text: impl Into<String>) {
        self.notify(Notice::success(text));
    }

    pub fn error(&self, text: impl Into<String>) {
        self.notify(Notice::error(text));
    }
}
