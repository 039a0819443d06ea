//! Bounded value ranges

use crate::error::Result;
use crate::kind::Kind;
use crate::Quantity;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// An optional minimum, maximum and resolution over values of type `T`.
///
/// A missing bound means the range is open on that side.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range<T> {
    pub minimum: Option<T>,
    pub maximum: Option<T>,
    pub resolution: Option<T>,
}

impl<T> Range<T> {
    pub fn of(minimum: T, maximum: T) -> Self {
        Range {
            minimum: Some(minimum),
            maximum: Some(maximum),
            resolution: None,
        }
    }

    pub fn with_resolution(mut self, resolution: T) -> Self {
        self.resolution = Some(resolution);
        self
    }

    pub fn at_least(minimum: T) -> Self {
        Range { minimum: Some(minimum), maximum: None, resolution: None }
    }

    pub fn at_most(maximum: T) -> Self {
        Range { minimum: None, maximum: Some(maximum), resolution: None }
    }

    pub fn has_minimum(&self) -> bool {
        self.minimum.is_some()
    }

    pub fn has_maximum(&self) -> bool {
        self.maximum.is_some()
    }
}

impl<T: PartialOrd> Range<T> {
    /// Whether `value` lies within the bounds, both inclusive.
    pub fn contains(&self, value: &T) -> bool {
        let above_min = self.minimum.as_ref().map_or(true, |min| value >= min);
        let below_max = self.maximum.as_ref().map_or(true, |max| value <= max);
        above_min && below_max
    }
}

impl<Q: Kind> Range<Quantity<Q>> {
    /// Unit-aware containment: the candidate is compared against each bound
    /// after conversion into that bound's unit.
    pub fn contains_quantity<R: Kind>(&self, value: &Quantity<R>) -> Result<bool> {
        if let Some(min) = &self.minimum {
            if min.compare(value)? == Ordering::Greater {
                return Ok(false);
            }
        }
        if let Some(max) = &self.maximum {
            if max.compare(value)? == Ordering::Less {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl<T: fmt::Display> fmt::Display for Range<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "min= {}, max= {}", Bound(&self.minimum), Bound(&self.maximum))?;
        if let Some(res) = &self.resolution {
            write!(f, ", res= {}", res)?;
        }
        Ok(())
    }
}

struct Bound<'a, T>(&'a Option<T>);

impl<T: fmt::Display> fmt::Display for Bound<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(v) => write!(f, "{}", v),
            None => write!(f, "none"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::{KILOMETRE, METRE, SECOND};
    use std::collections::HashSet;

    #[test]
    fn test_numeric_range() {
        let r = Range::of(1, 10);
        assert!(r.contains(&1));
        assert!(r.contains(&10));
        assert!(!r.contains(&11));
        assert!(r.has_minimum() && r.has_maximum());
    }

    #[test]
    fn test_open_ended() {
        let r = Range::at_least(0);
        assert!(!r.has_maximum());
        assert!(r.contains(&i32::MAX));
        assert!(!r.contains(&-1));
        assert!(Range::at_most(5).contains(&i32::MIN));
    }

    #[test]
    fn test_structural_equality_and_hash() {
        let a = Range::of(1, 2).with_resolution(1);
        let b = Range::of(1, 2).with_resolution(1);
        assert_eq!(a, b);
        assert_ne!(a, Range::of(1, 2));
        let set: HashSet<_> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_display() {
        assert_eq!(Range::of(1, 10).to_string(), "min= 1, max= 10");
        assert_eq!(Range::of(1, 10).with_resolution(2).to_string(), "min= 1, max= 10, res= 2");
        assert_eq!(Range::at_least(3).to_string(), "min= 3, max= none");
    }

    #[test]
    fn test_quantity_range_converts_candidate() {
        let r = Range::of(Quantity::of(1, KILOMETRE.clone()), Quantity::of(2, KILOMETRE.clone()));
        assert!(r.contains_quantity(&Quantity::of(1500, METRE.clone())).unwrap());
        assert!(!r.contains_quantity(&Quantity::of(2500, METRE.clone())).unwrap());
        assert!(r.contains_quantity(&Quantity::of(1, SECOND.clone())).is_err());
        assert_eq!(r.to_string(), "min= 1 km, max= 2 km");
    }

    #[test]
    fn test_serde_round_trip() {
        let r = Range::of(Quantity::of(1, KILOMETRE.clone()), Quantity::of(2, KILOMETRE.clone()))
            .with_resolution(Quantity::of(10, METRE.clone()));
        let json = serde_json::to_string(&r).unwrap();
        let back: Range<Quantity> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, r);
        assert!(back.contains_quantity(&Quantity::of(1500, METRE.clone())).unwrap());

        let open: Range<i64> = serde_json::from_str(r#"{"minimum":3,"maximum":null,"resolution":null}"#).unwrap();
        assert_eq!(open, Range::at_least(3));
    }
}
