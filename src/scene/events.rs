//! Change notifications published by nodes.
//!
//! Listeners (hierarchy views, property panels) subscribe to a node and
//! receive events over a channel. The renderer never listens: it rebuilds
//! everything from the tree each frame.

use std::fmt;
use std::sync::mpsc::{channel, Receiver, Sender};

use crate::util::{Mat4, Vec3};

/// Mutation of a single node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeEvent {
    AddedChildNode { index: usize, name: String },
    RemovedChildNode { index: usize, name: String },
    AddedChildMesh { index: usize, name: String },
    RemovedChildMesh { index: usize, name: String },
    TranslationChanged(Vec3),
    RotationChanged(Vec3),
    ScaleChanged(Vec3),
    /// Local transform was baked into this matrix.
    TransformationApplied(Mat4),
    LightChanged,
}

/// Fan-out publisher owned by a node.
#[derive(Default)]
pub struct NodeEvents {
    listeners: Vec<Sender<NodeEvent>>,
}

impl NodeEvents {
    /// New listener; dropping the receiver unsubscribes it.
    pub fn subscribe(&mut self) -> Receiver<NodeEvent> {
        let (tx, rx) = channel();
        self.listeners.push(tx);
        rx
    }

    /// Send to every live listener, pruning closed ones.
    pub fn publish(&mut self, event: NodeEvent) {
        if self.listeners.is_empty() {
            return;
        }
        self.listeners.retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl fmt::Debug for NodeEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeEvents")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_to_all() {
        let mut events = NodeEvents::default();
        let a = events.subscribe();
        let b = events.subscribe();
        events.publish(NodeEvent::LightChanged);
        assert_eq!(a.try_recv().unwrap(), NodeEvent::LightChanged);
        assert_eq!(b.try_recv().unwrap(), NodeEvent::LightChanged);
    }

    #[test]
    fn test_dropped_listener_pruned() {
        let mut events = NodeEvents::default();
        let keep = events.subscribe();
        drop(events.subscribe());
        assert_eq!(events.listener_count(), 2);

        events.publish(NodeEvent::ScaleChanged(Vec3::ONE));
        assert_eq!(events.listener_count(), 1);
        assert!(keep.try_recv().is_ok());
    }
}
