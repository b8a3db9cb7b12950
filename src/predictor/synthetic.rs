//! Synthetic labelled sessions
//!
//! Used to bootstrap the learned predictor before real feedback exists.
//! Half of the sessions look easy (few pauses, fast playback, forward
//! skips) and half look difficult (many long pauses, replays, slowed
//! playback). Generation is seeded and therefore reproducible.

use crate::features::extract_metrics;
use crate::models::{LabeledSession, RawInteraction};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Generate `n` sessions: the first `n / 2` easy, the rest difficult.
///
/// Derived fields (`pause_rate`, `replay_ratio`) are filled in the same way
/// the extractor derives them.
pub fn generate(n: usize, seed: u64) -> Vec<LabeledSession> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let easy = n / 2;

    (0..n)
        .map(|i| {
            let difficult = i >= easy;
            let raw = if difficult {
                difficult_session(&mut rng)
            } else {
                easy_session(&mut rng)
            };
            LabeledSession::new(with_derived(raw), difficult)
        })
        .collect()
}

fn count(rng: &mut impl Rng, lo: u32, hi: u32) -> f64 {
    rng.random_range(lo..hi) as f64
}

fn easy_session(rng: &mut impl Rng) -> RawInteraction {
    RawInteraction {
        session_duration: Some(rng.random_range(180.0..1200.0)),
        total_pauses: Some(count(rng, 0, 4)),
        pause_median_duration: Some(rng.random_range(0.0..20.0)),
        replay_frequency: Some(count(rng, 0, 3)),
        replay_duration: Some(rng.random_range(0.0..60.0)),
        seek_forward_frequency: Some(count(rng, 3, 10)),
        skipped_content: Some(rng.random_range(30.0..180.0)),
        speed_changes: Some(count(rng, 0, 2)),
        average_speed: Some(rng.random_range(1.0..2.0)),
        ..Default::default()
    }
}

fn difficult_session(rng: &mut impl Rng) -> RawInteraction {
    RawInteraction {
        session_duration: Some(rng.random_range(180.0..1200.0)),
        total_pauses: Some(count(rng, 5, 15)),
        pause_median_duration: Some(rng.random_range(20.0..120.0)),
        replay_frequency: Some(count(rng, 3, 8)),
        replay_duration: Some(rng.random_range(60.0..300.0)),
        seek_forward_frequency: Some(count(rng, 0, 3)),
        skipped_content: Some(rng.random_range(0.0..60.0)),
        speed_changes: Some(count(rng, 1, 4)),
        average_speed: Some(rng.random_range(0.75..1.0)),
        ..Default::default()
    }
}

fn with_derived(mut raw: RawInteraction) -> RawInteraction {
    let m = extract_metrics(&raw);
    raw.pause_rate = Some(m.pause_rate);
    raw.replay_ratio = Some(m.replay_ratio);
    raw
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_split() {
        let data = generate(11, 42);
        assert_eq!(data.len(), 11);
        assert_eq!(data.iter().filter(|s| !s.is_difficult()).count(), 5);
        assert!(data[..5].iter().all(|s| !s.is_difficult()));
        assert!(data[5..].iter().all(|s| s.is_difficult()));
    }

    #[test]
    fn test_same_seed_same_data() {
        assert_eq!(generate(20, 7), generate(20, 7));
        assert_ne!(generate(20, 7), generate(20, 8));
    }

    #[test]
    fn test_ranges_and_derived_fields() {
        for s in generate(200, 42) {
            let m = &s.metrics;
            let duration = m.session_duration.unwrap();
            assert!((180.0..1200.0).contains(&duration));
            let speed = m.average_speed.unwrap();
            if s.is_difficult() {
                assert!(m.total_pauses.unwrap() >= 5.0);
                assert!((0.75..1.0).contains(&speed));
            } else {
                assert!(m.total_pauses.unwrap() < 4.0);
                assert!((1.0..2.0).contains(&speed));
            }
            let expected_rate = m.total_pauses.unwrap() / (duration / 60.0);
            assert!((m.pause_rate.unwrap() - expected_rate).abs() < 1e-9);
            let expected_ratio = m.replay_duration.unwrap() / duration;
            assert!((m.replay_ratio.unwrap() - expected_ratio).abs() < 1e-9);
        }
    }
}
