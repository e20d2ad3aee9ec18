use rand::seq::SliceRandom;
use rand::Rng;

use crate::{ProbeError, ProbeResult, Record, RecordKind};

/// Synthesizes plausible records, picking the kind uniformly at random.
pub struct Generator<R: Rng> {
    rng: R,
    kinds: Vec<RecordKind>,
}

impl<R: Rng> Generator<R> {
    /// A generator over every record kind.
    pub fn new(rng: R) -> Generator<R> {
        Generator {
            rng,
            kinds: RecordKind::ALL.to_vec(),
        }
    }

    /// A generator restricted to `kinds`, which must not be empty.
    pub fn with_kinds(rng: R, kinds: &[RecordKind]) -> ProbeResult<Generator<R>> {
        if kinds.is_empty() {
            return Err(ProbeError::NoKinds);
        }
        let mut deduped: Vec<RecordKind> = Vec::with_capacity(kinds.len());
        for k in kinds {
            if !deduped.contains(k) {
                deduped.push(*k);
            }
        }
        Ok(Generator {
            rng,
            kinds: deduped,
        })
    }

    pub fn kinds(&self) -> &[RecordKind] {
        &self.kinds
    }

    pub fn next_record(&mut self) -> Record {
        let kind = *self
            .kinds
            .choose(&mut self.rng)
            .unwrap_or(&RecordKind::HeartRate);
        self.record_of(kind)
    }

    fn record_of(&mut self, kind: RecordKind) -> Record {
        let rng = &mut self.rng;
        match kind {
            RecordKind::HeartRate => Record::HeartRate {
                heart_rate: rng.gen_range(60..=100),
            },
            RecordKind::Steps => Record::Steps {
                steps: rng.gen_range(0..=100),
            },
            RecordKind::Diet => Record::Diet {
                calories: rng.gen_range(200..=800),
                carbs: rng.gen_range(20..=100),
                protein: rng.gen_range(10..=50),
                fat: rng.gen_range(5..=30),
            },
            RecordKind::Exercise => {
                let distance: f64 = rng.gen_range(1.0..=10.0);
                Record::Exercise {
                    exercise_duration: rng.gen_range(10..=60),
                    exercise_distance: (distance * 100.0).round() / 100.0,
                }
            }
        }
    }
}

impl<R: Rng> Iterator for Generator<R> {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        Some(self.next_record())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn values_stay_in_range() {
        let records = Generator::new(StdRng::seed_from_u64(7));
        for record in records.take(2000) {
            match record {
                Record::HeartRate { heart_rate } => assert!((60..=100).contains(&heart_rate)),
                Record::Steps { steps } => assert!(steps <= 100),
                Record::Diet {
                    calories,
                    carbs,
                    protein,
                    fat,
                } => {
                    assert!((200..=800).contains(&calories));
                    assert!((20..=100).contains(&carbs));
                    assert!((10..=50).contains(&protein));
                    assert!((5..=30).contains(&fat));
                }
                Record::Exercise {
                    exercise_duration,
                    exercise_distance,
                } => {
                    assert!((10..=60).contains(&exercise_duration));
                    assert!((1.0..=10.0).contains(&exercise_distance));
                    let cents = exercise_distance * 100.0;
                    assert!((cents - cents.round()).abs() < 1e-6);
                }
            }
        }
    }

    #[test]
    fn every_kind_shows_up() {
        let records = Generator::new(StdRng::seed_from_u64(42));
        let seen: Vec<RecordKind> = records.take(400).map(|r| r.kind()).collect();
        for kind in RecordKind::ALL.iter() {
            assert!(seen.contains(kind), "{} never generated", kind);
        }
    }

    #[test]
    fn restricted_kinds() {
        let records = Generator::with_kinds(
            StdRng::seed_from_u64(1),
            &[RecordKind::Steps, RecordKind::Steps],
        )
        .unwrap();
        assert_eq!(records.kinds(), &[RecordKind::Steps]);
        assert!(records.take(50).all(|r| r.kind() == RecordKind::Steps));
    }

    #[test]
    fn empty_kinds_rejected() {
        assert!(matches!(
            Generator::with_kinds(StdRng::seed_from_u64(1), &[]),
            Err(ProbeError::NoKinds)
        ));
    }
}
