//! Bounded time history of interpolable values

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::collections::BTreeMap;

use ordered_float::NotNan;

use crate::pose::Interpolable;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Values keyed by time, holding at most `capacity` entries. The oldest
/// entry is evicted first.
#[derive(Debug, Clone)]
pub struct History<V> {
    capacity: usize,
    map: BTreeMap<NotNan<f64>, V>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<V> History<V>
where
    V: Interpolable + Clone,
{
    /// Create an empty history. A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            map: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Insert a value, replacing any existing value at the same time.
    ///
    /// Returns `false` if `t` is NaN, in which case nothing is inserted.
    pub fn insert(&mut self, t: f64, value: V) -> bool {
        let key = match NotNan::new(t) {
            Ok(k) => k,
            Err(_) => return false,
        };

        self.map.insert(key, value);

        while self.map.len() > self.capacity {
            match self.map.keys().next().copied() {
                Some(oldest) => self.map.remove(&oldest),
                None => break,
            };
        }

        true
    }

    /// The most recent entry.
    pub fn latest(&self) -> Option<(f64, &V)> {
        self.map
            .iter()
            .next_back()
            .map(|(t, v)| (t.into_inner(), v))
    }

    /// The value at time `t`, linearly interpolated between the entries
    /// either side of it.
    ///
    /// Times outside the history clamp to the oldest or newest entry. A NaN
    /// time gives the newest entry.
    pub fn get_interpolated(&self, t: f64) -> Option<V> {
        let key = match NotNan::new(t) {
            Ok(k) => k,
            Err(_) => return self.latest().map(|(_, v)| v.clone()),
        };

        let floor = self.map.range(..=key).next_back();
        let ceiling = self.map.range(key..).next();

        match (floor, ceiling) {
            (Some((tf, vf)), Some((tc, vc))) => {
                if tf == tc {
                    Some(vf.clone())
                } else {
                    let x = (t - tf.into_inner()) / (tc.into_inner() - tf.into_inner());
                    Some(vf.interpolate(vc, x))
                }
            }
            (Some((_, v)), None) | (None, Some((_, v))) => Some(v.clone()),
            (None, None) => None,
        }
    }
}
