//! Launch mirroring between paired HoverDisk instances
//!
//! The instance that accepts a launch applies it directly and publishes it
//! here; followers replay it in their own frame. Launch coordinates are local
//! to the game so paired instances may sit at different origins.

use std::sync::mpsc::{self, Receiver, Sender};

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// One accepted disk launch, in the game's local frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiskLaunch {
    pub from: Vec3,
    pub to: Vec3,
    /// Travel time in seconds
    pub duration: f32,
    pub direction: Vec3,
}

/// Publishing side. Delivery is synchronous: every current subscriber has the
/// launch queued when `publish` returns.
#[derive(Debug, Default)]
pub struct MirrorLink {
    subscribers: Vec<Sender<DiskLaunch>>,
}

impl MirrorLink {
    pub fn new() -> Self {
        Self::default()
    }

    /// New subscriber; sees only launches published from now on
    pub fn subscribe(&mut self) -> MirrorFeed {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        MirrorFeed(rx)
    }

    /// Send to all live subscribers, dropping the ones that went away.
    /// Returns how many received it.
    pub fn publish(&mut self, launch: DiskLaunch) -> usize {
        self.subscribers.retain(|tx| tx.send(launch).is_ok());
        self.subscribers.len()
    }
}

/// Receiving side of a mirror link
#[derive(Debug)]
pub struct MirrorFeed(Receiver<DiskLaunch>);

impl MirrorFeed {
    /// Drain all queued launches without blocking
    pub fn drain(&self) -> Vec<DiskLaunch> {
        self.0.try_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn launch(duration: f32) -> DiskLaunch {
        DiskLaunch {
            from: Vec3::new(0.0, -0.25, -1.7),
            to: Vec3::new(30.0, -0.25, 93.7),
            duration,
            direction: Vec3::new(0.3, 0.0, 0.95),
        }
    }

    #[test]
    fn test_all_subscribers_receive() {
        let mut link = MirrorLink::new();
        let a = link.subscribe();
        let b = link.subscribe();
        assert_eq!(link.publish(launch(20.0)), 2);
        assert_eq!(a.drain(), vec![launch(20.0)]);
        assert_eq!(b.drain(), vec![launch(20.0)]);
        assert!(a.drain().is_empty());
    }

    #[test]
    fn test_late_subscriber_misses_earlier_launches() {
        let mut link = MirrorLink::new();
        link.publish(launch(20.0));
        let late = link.subscribe();
        assert!(late.drain().is_empty());
        link.publish(launch(33.0));
        assert_eq!(late.drain(), vec![launch(33.0)]);
    }

    #[test]
    fn test_dropped_subscribers_are_pruned() {
        let mut link = MirrorLink::new();
        let keep = link.subscribe();
        drop(link.subscribe());
        assert_eq!(link.publish(launch(41.0)), 1);
        assert_eq!(link.publish(launch(42.0)), 1);
        assert_eq!(keep.drain().len(), 2);
    }
}
