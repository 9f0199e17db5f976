//! Profile channel
//!
//! One-way, last-write-wins delivery of capture profiles from the control
//! surface to the recording surfaces that are alive at publish time. Nothing
//! is buffered for late subscribers.

use std::sync::{Mutex, PoisonError};

use tokio::sync::mpsc;
use tracing::debug;

use crate::domain::profile::{CaptureProfile, PartialCaptureProfile};

/// Result of a publish
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Delivered to this many subscribers
    Delivered(usize),
    /// Held back; these fields were missing
    Incomplete(Vec<&'static str>),
    /// Complete, but nobody was listening
    NoSubscribers,
}

impl PublishOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered(_))
    }
}

/// Broadcast channel for capture profiles
#[derive(Debug, Default)]
pub struct ProfileChannel {
    subscribers: Mutex<Vec<mpsc::UnboundedSender<CaptureProfile>>>,
}

impl ProfileChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber
    pub fn subscribe(&self) -> ProfileSubscription {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        ProfileSubscription { rx }
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        subscribers.retain(|tx| !tx.is_closed());
        subscribers.len()
    }

    /// Forward a profile to every live subscriber if it is complete.
    /// Closed subscriptions are pruned.
    pub fn publish(&self, profile: &PartialCaptureProfile) -> PublishOutcome {
        let complete = match profile.complete() {
            Ok(complete) => complete,
            Err(incomplete) => {
                debug!(missing = ?incomplete.missing, "holding back incomplete profile");
                return PublishOutcome::Incomplete(incomplete.missing);
            }
        };

        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        subscribers.retain(|tx| tx.send(complete.clone()).is_ok());

        if subscribers.is_empty() {
            debug!(session_id = complete.session_id(), "no profile subscribers, dropping");
            PublishOutcome::NoSubscribers
        } else {
            PublishOutcome::Delivered(subscribers.len())
        }
    }
}

/// Receiving end of a profile subscription
#[derive(Debug)]
pub struct ProfileSubscription {
    rx: mpsc::UnboundedReceiver<CaptureProfile>,
}

impl ProfileSubscription {
    /// Wait for the next profile. `None` once the channel is gone.
    pub async fn recv(&mut self) -> Option<CaptureProfile> {
        self.rx.recv().await
    }

    /// Drain everything already delivered and keep the most recent profile
    pub fn latest(&mut self) -> Option<CaptureProfile> {
        let mut latest = None;
        while let Ok(profile) = self.rx.try_recv() {
            latest = Some(profile);
        }
        latest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::profile::{Plan, Preset};

    fn profile(id: &str) -> PartialCaptureProfile {
        PartialCaptureProfile {
            session_id: Some(id.to_string()),
            screen_source_id: Some("screen:1:0".to_string()),
            audio_device_id: Some("mic-1".to_string()),
            preset: Some(Preset::Sd),
            plan: Some(Plan::Pro),
        }
    }

    #[tokio::test]
    async fn delivers_complete_profile() {
        let channel = ProfileChannel::new();
        let mut sub = channel.subscribe();

        assert_eq!(channel.publish(&profile("s1")), PublishOutcome::Delivered(1));
        let received = sub.recv().await.unwrap();
        assert_eq!(received.session_id(), "s1");
    }

    #[tokio::test]
    async fn holds_back_incomplete_profile() {
        let channel = ProfileChannel::new();
        let mut sub = channel.subscribe();

        let partial = PartialCaptureProfile {
            audio_device_id: None,
            ..profile("s1")
        };
        assert_eq!(
            channel.publish(&partial),
            PublishOutcome::Incomplete(vec!["audio"])
        );
        assert!(sub.latest().is_none());
    }

    #[test]
    fn publish_without_subscribers_is_dropped() {
        let channel = ProfileChannel::new();
        assert_eq!(channel.publish(&profile("s1")), PublishOutcome::NoSubscribers);

        // Late subscriber gets nothing buffered
        let mut sub = channel.subscribe();
        assert!(sub.latest().is_none());
    }

    #[tokio::test]
    async fn preserves_publish_order() {
        let channel = ProfileChannel::new();
        let mut sub = channel.subscribe();

        for id in ["a", "b", "c"] {
            channel.publish(&profile(id));
        }

        assert_eq!(sub.recv().await.unwrap().session_id(), "a");
        assert_eq!(sub.recv().await.unwrap().session_id(), "b");
        assert_eq!(sub.recv().await.unwrap().session_id(), "c");
    }

    #[test]
    fn latest_wins_after_burst() {
        let channel = ProfileChannel::new();
        let mut sub = channel.subscribe();

        channel.publish(&profile("a"));
        channel.publish(&PartialCaptureProfile {
            plan: None,
            ..profile("skipped")
        });
        channel.publish(&profile("c"));

        assert_eq!(sub.latest().unwrap().session_id(), "c");
        assert!(sub.latest().is_none());
    }

    #[test]
    fn closed_subscribers_are_pruned() {
        let channel = ProfileChannel::new();
        let keep = channel.subscribe();
        let gone = channel.subscribe();
        drop(gone);

        assert_eq!(channel.publish(&profile("s1")), PublishOutcome::Delivered(1));
        assert_eq!(channel.subscriber_count(), 1);
        drop(keep);
        assert_eq!(channel.subscriber_count(), 0);
    }
}
