//! Entity store
//!
//! Sole owner of live bubbles. Iteration is in insertion order, which doubles as
//! age order: index 0 is always the oldest bubble.

use super::bubble::{Bubble, BubbleId};

#[derive(Debug, Clone, Default)]
pub struct BubbleStore {
    bubbles: Vec<Bubble>,
    max_bubbles: usize,
}

impl BubbleStore {
    pub fn new(max_bubbles: usize) -> Self {
        Self {
            bubbles: Vec::with_capacity(max_bubbles),
            max_bubbles: max_bubbles.max(1),
        }
    }

    pub fn max_bubbles(&self) -> usize {
        self.max_bubbles
    }

    /// Add a bubble, evicting the oldest ones first if at capacity.
    ///
    /// Returns the evicted bubbles, oldest first.
    pub fn add(&mut self, bubble: Bubble) -> Vec<Bubble> {
        let mut evicted = Vec::new();
        while self.bubbles.len() >= self.max_bubbles {
            let oldest = self.bubbles.remove(0);
            log::debug!("Evicting bubble {} (cap {})", oldest.id, self.max_bubbles);
            evicted.push(oldest);
        }
        self.bubbles.push(bubble);
        evicted
    }

    /// Remove by id; unknown ids are a no-op
    pub fn remove(&mut self, id: BubbleId) -> bool {
        self.take(id).is_some()
    }

    /// Remove by id and hand the record back
    pub fn take(&mut self, id: BubbleId) -> Option<Bubble> {
        let index = self.bubbles.iter().position(|b| b.id == id)?;
        Some(self.bubbles.remove(index))
    }

    pub fn get(&self, id: BubbleId) -> Option<&Bubble> {
        self.bubbles.iter().find(|b| b.id == id)
    }

    pub fn get_mut(&mut self, id: BubbleId) -> Option<&mut Bubble> {
        self.bubbles.iter_mut().find(|b| b.id == id)
    }

    /// All bubbles in insertion order
    pub fn all(&self) -> &[Bubble] {
        &self.bubbles
    }

    pub fn all_mut(&mut self) -> &mut [Bubble] {
        &mut self.bubbles
    }

    pub fn count(&self) -> usize {
        self.bubbles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bubbles.is_empty()
    }

    /// Remove everything, returning the records in insertion order
    pub fn drain(&mut self) -> Vec<Bubble> {
        std::mem::take(&mut self.bubbles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    fn bubble(id: BubbleId) -> Bubble {
        Bubble::new(id, Vec2::new(id as f32 * 10.0, 0.0), 60.0, id as f64)
    }

    #[test]
    fn test_add_get_remove() {
        let mut store = BubbleStore::new(10);
        store.add(bubble(1));
        store.add(bubble(2));
        assert_eq!(store.count(), 2);
        assert_eq!(store.get(2).map(|b| b.id), Some(2));

        assert!(store.remove(1));
        assert!(!store.remove(1));
        assert!(!store.remove(99));
        assert_eq!(store.count(), 1);
        assert!(store.get(1).is_none());
    }

    #[test]
    fn test_evicts_oldest_at_cap() {
        let mut store = BubbleStore::new(3);
        for id in 1..=3 {
            assert!(store.add(bubble(id)).is_empty());
        }

        let evicted = store.add(bubble(4));
        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0].id, 1);
        assert_eq!(store.count(), 3);

        let ids: Vec<_> = store.all().iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![2, 3, 4]);
    }

    #[test]
    fn test_insertion_order_survives_removal() {
        let mut store = BubbleStore::new(10);
        for id in 1..=5 {
            store.add(bubble(id));
        }
        store.remove(3);
        let ids: Vec<_> = store.all().iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![1, 2, 4, 5]);
    }

    #[test]
    fn test_drain() {
        let mut store = BubbleStore::new(10);
        store.add(bubble(1));
        store.add(bubble(2));
        let drained = store.drain();
        assert_eq!(drained.len(), 2);
        assert!(store.is_empty());
    }
}
