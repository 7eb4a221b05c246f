use std::collections::VecDeque;
use std::future::Future;

use parking_lot::Mutex;
use tokio::sync::Notify;

/// Unbounded FIFO shared between any number of producers and one consumer.
///
/// Every append raises the work signal. The signal holds at most one pending
/// wake-up, so a consumer that drains with [`RequestQueue::process`] after each
/// wake never misses an element.
pub struct RequestQueue<T> {
    items: Mutex<VecDeque<T>>,
    signal: Notify,
}

impl<T> RequestQueue<T> {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            signal: Notify::new(),
        }
    }

    pub fn append(&self, item: T) {
        self.items.lock().push_back(item);
        self.signal.notify_one();
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    /// Remove the oldest element.
    pub fn pop(&self) -> Option<T> {
        self.items.lock().pop_front()
    }

    /// Resolves after at least one append since the last wake. May resolve with
    /// the queue already empty if an earlier drain took the work.
    pub async fn signal(&self) {
        self.signal.notified().await;
    }

    /// Pop and handle elements one at a time until the queue is empty, including
    /// elements appended while draining. Each element leaves the queue before
    /// `each` sees it, and the next is not taken until `each` has completed.
    pub async fn process<F, Fut>(&self, mut each: F)
    where
        F: FnMut(T) -> Fut,
        Fut: Future<Output = ()>,
    {
        while let Some(item) = self.pop() {
            each(item).await;
        }
    }
}

impl<T> Default for RequestQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_queue_fifo() {
        let queue = RequestQueue::new();
        for i in 0..5 {
            queue.append(i);
        }
        assert_eq!(queue.len(), 5);

        let drained: Vec<_> = std::iter::from_fn(|| queue.pop()).collect();
        assert_eq!(drained, vec![0, 1, 2, 3, 4]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_queue_concurrent_producers() {
        let queue = Arc::new(RequestQueue::new());
        let mut handles = vec![];

        for p in 0..8 {
            let queue = queue.clone();
            handles.push(thread::spawn(move || {
                for i in 0..100 {
                    queue.append((p, i));
                }
            }));
        }

        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(queue.len(), 800);

        // Per-producer order survives interleaving.
        let mut last = [None; 8];
        while let Some((p, i)) = queue.pop() {
            if let Some(prev) = last[p] {
                assert!(i > prev);
            }
            last[p] = Some(i);
        }
    }

    #[tokio::test]
    async fn test_signal_after_append() {
        let queue = Arc::new(RequestQueue::new());
        let producer = queue.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            producer.append("work");
        });

        tokio::time::timeout(Duration::from_secs(2), queue.signal())
            .await
            .expect("append should raise the signal");
        assert_eq!(queue.len(), 1);
    }

    #[tokio::test]
    async fn test_signal_is_kept_when_nobody_waits() {
        let queue = RequestQueue::new();
        queue.append(1);

        tokio::time::timeout(Duration::from_millis(200), queue.signal())
            .await
            .expect("pending wake-up should be stored");
    }

    #[tokio::test]
    async fn test_process_pops_before_handling() {
        let queue = RequestQueue::new();
        queue.append("a");
        queue.append("b");
        queue.append("c");

        let mut seen = Vec::new();
        let mut depths = Vec::new();
        queue
            .process(|item| {
                seen.push(item);
                depths.push(queue.len());
                async {}
            })
            .await;

        assert_eq!(seen, vec!["a", "b", "c"]);
        assert_eq!(depths, vec![2, 1, 0]);
        assert!(queue.is_empty());
    }
}
