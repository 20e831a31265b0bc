//! The work queue of pending URLs plus the set of everything already
//! queued or fetched. Push is check-then-insert in a single call, so a URL
//! can enter the queue at most once per run.

use crate::result::ResourceKind;
use std::collections::{HashSet, VecDeque};
use url::Url;

#[derive(Debug, Clone)]
pub struct FrontierEntry {
    pub url: Url,
    pub kind: ResourceKind,
    pub depth: usize,
    pub referrer: Option<String>,
}

impl FrontierEntry {
    pub fn seed(url: Url) -> Self {
        Self {
            url,
            kind: ResourceKind::Page,
            depth: 0,
            referrer: None,
        }
    }
}

#[derive(Debug, Default)]
pub struct Frontier {
    queue: VecDeque<FrontierEntry>,
    visited: HashSet<String>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a URL unless it was already queued or processed. Returns
    /// whether the entry was accepted.
    pub fn push(&mut self, entry: FrontierEntry) -> bool {
        if self.visited.insert(entry.url.as_str().to_string()) {
            self.queue.push_back(entry);
            true
        } else {
            false
        }
    }

    /// FIFO pop: breadth-first ordering so shallow pages mirror first.
    pub fn pop(&mut self) -> Option<FrontierEntry> {
        self.queue.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(s: &str) -> FrontierEntry {
        FrontierEntry::seed(Url::parse(s).unwrap())
    }

    #[test]
    fn duplicate_push_is_rejected() {
        let mut frontier = Frontier::new();
        assert!(frontier.push(entry("https://example.com/a")));
        assert!(!frontier.push(entry("https://example.com/a")));
        assert_eq!(frontier.pending(), 1);
        assert_eq!(frontier.visited_count(), 1);
    }

    #[test]
    fn popped_urls_stay_visited() {
        let mut frontier = Frontier::new();
        frontier.push(entry("https://example.com/a"));
        assert!(frontier.pop().is_some());
        assert!(!frontier.push(entry("https://example.com/a")));
        assert!(frontier.pop().is_none());
    }

    #[test]
    fn pop_order_is_fifo() {
        let mut frontier = Frontier::new();
        frontier.push(entry("https://example.com/1"));
        frontier.push(entry("https://example.com/2"));
        frontier.push(entry("https://example.com/3"));
        let order: Vec<String> = std::iter::from_fn(|| frontier.pop())
            .map(|e| e.url.path().to_string())
            .collect();
        assert_eq!(order, vec!["/1", "/2", "/3"]);
    }

    #[test]
    fn distinct_queries_are_distinct_urls() {
        let mut frontier = Frontier::new();
        assert!(frontier.push(entry("https://example.com/p?a=1")));
        assert!(frontier.push(entry("https://example.com/p?a=2")));
        assert_eq!(frontier.pending(), 2);
    }
}
