//! Reasoning-phase timing.
//!
//! Tracks how long the model spends in each reasoning span. A span starts
//! at the first reasoning chunk and ends at the first chunk of any other
//! kind (or at end of stream).

use std::time::{Duration, Instant};

use askr_types::annotation::{Annotation, ReasoningTiming};

/// Kind of chunk observed on the model stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkKind {
    Reasoning,
    Text,
    Other,
}

/// At most one open span at a time.
#[derive(Debug, Default)]
pub struct ReasoningTimer {
    started_at: Option<Instant>,
    last_duration: Option<Duration>,
}

impl ReasoningTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a chunk; returns a timing annotation when a span closes.
    pub fn observe(&mut self, kind: ChunkKind) -> Option<Annotation> {
        self.observe_at(kind, Instant::now())
    }

    pub fn observe_at(&mut self, kind: ChunkKind, now: Instant) -> Option<Annotation> {
        match (kind, self.started_at) {
            (ChunkKind::Reasoning, None) => {
                self.started_at = Some(now);
                None
            }
            (ChunkKind::Reasoning, Some(_)) => None,
            (_, Some(_)) => self.close_at(now),
            (_, None) => None,
        }
    }

    /// Close a span left open at end of stream.
    pub fn finish(&mut self) -> Option<Annotation> {
        self.finish_at(Instant::now())
    }

    pub fn finish_at(&mut self, now: Instant) -> Option<Annotation> {
        self.started_at.is_some().then(|| self.close_at(now)).flatten()
    }

    /// Duration of the most recently closed span.
    pub fn last_duration(&self) -> Option<Duration> {
        self.last_duration
    }

    pub fn is_open(&self) -> bool {
        self.started_at.is_some()
    }

    fn close_at(&mut self, now: Instant) -> Option<Annotation> {
        let started = self.started_at.take()?;
        let elapsed = now.saturating_duration_since(started);
        self.last_duration = Some(elapsed);
        Some(Annotation::ReasoningTiming(ReasoningTiming {
            time_ms: elapsed.as_millis() as u64,
            reasoning: None,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timing_ms(annotation: &Annotation) -> u64 {
        match annotation {
            Annotation::ReasoningTiming(t) => t.time_ms,
            other => panic!("unexpected annotation {other:?}"),
        }
    }

    #[test]
    fn test_one_annotation_per_transition() {
        let t0 = Instant::now();
        let ms = |n: u64| t0 + Duration::from_millis(n);
        let mut timer = ReasoningTimer::new();

        let kinds = [
            (ChunkKind::Reasoning, 0),
            (ChunkKind::Reasoning, 100),
            (ChunkKind::Text, 250),
            (ChunkKind::Text, 300),
            (ChunkKind::Reasoning, 400),
            (ChunkKind::Other, 450),
            (ChunkKind::Text, 500),
        ];
        let emitted: Vec<Annotation> = kinds
            .iter()
            .filter_map(|(kind, at)| timer.observe_at(*kind, ms(*at)))
            .collect();

        assert_eq!(emitted.len(), 2);
        assert_eq!(timing_ms(&emitted[0]), 250);
        assert_eq!(timing_ms(&emitted[1]), 50);
        assert_eq!(timer.last_duration(), Some(Duration::from_millis(50)));
        assert!(timer.finish_at(ms(600)).is_none());
    }

    #[test]
    fn test_no_reasoning_no_annotation() {
        let mut timer = ReasoningTimer::new();
        assert!(timer.observe(ChunkKind::Text).is_none());
        assert!(timer.observe(ChunkKind::Other).is_none());
        assert!(timer.finish().is_none());
        assert!(timer.last_duration().is_none());
    }

    #[test]
    fn test_open_span_closed_at_finish() {
        let t0 = Instant::now();
        let mut timer = ReasoningTimer::new();
        assert!(timer.observe_at(ChunkKind::Reasoning, t0).is_none());
        assert!(timer.is_open());

        let closed = timer.finish_at(t0 + Duration::from_millis(75)).unwrap();
        assert_eq!(timing_ms(&closed), 75);
        assert!(!timer.is_open());
    }

    #[test]
    fn test_duration_never_negative() {
        let t0 = Instant::now();
        let mut timer = ReasoningTimer::new();
        timer.observe_at(ChunkKind::Reasoning, t0 + Duration::from_millis(10));
        let closed = timer.observe_at(ChunkKind::Text, t0).unwrap();
        assert_eq!(timing_ms(&closed), 0);
    }
}
