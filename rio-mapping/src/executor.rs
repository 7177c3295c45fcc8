//! Walk a [`Registry`] to move values between a domain instance and a wire frame.
//!
//! Neither direction touches the registry or any shared state, so calls can run
//! concurrently against the same process-wide registry.

use crate::core::WireLayout;
use crate::error::RangeError;
use crate::registry::Registry;

/// Fill a fresh frame from `domain`, stopping at the first value its wire field cannot hold.
pub fn to_wire<D, W: WireLayout>(registry: &Registry<D, W>, domain: &D) -> Result<W, RangeError> {
    let mut frame = W::default();
    for entry in registry.iter() {
        entry.write_wire(domain, &mut frame)?;
    }

    Ok(frame)
}

/// Set every mapped field of `domain` from `frame`.
///
/// Domain fields without an entry keep the values the caller supplied.
pub fn update_from_wire<D, W>(registry: &Registry<D, W>, frame: &W, domain: &mut D) {
    for entry in registry.iter() {
        entry.read_wire(frame, domain);
    }
}

/// Populate a copy of `defaults` from `frame`.
pub fn from_wire<D, W>(registry: &Registry<D, W>, frame: &W, defaults: D) -> D {
    let mut domain = defaults;
    update_from_wire(registry, frame, &mut domain);

    domain
}

/// Every out-of-range value of `domain`, in registry order.
pub fn validate<D, W: WireLayout>(registry: &Registry<D, W>, domain: &D) -> Vec<RangeError> {
    let mut scratch = W::default();
    registry
        .iter()
        .filter_map(|entry| entry.write_wire(domain, &mut scratch).err())
        .collect()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::derive::{FieldPaths, WireLayout};
    use crate::field;
    use crate::registry::{Overflow, Transform};

    #[derive(Debug, Clone, Default, PartialEq, FieldPaths)]
    struct Pump {
        burst: Duration,
        pause: Duration,
        limit: Duration,
        speed: u8,
        serial: u32,
    }

    #[derive(Debug, Clone, Copy, Default, PartialEq, WireLayout)]
    struct PumpFrame {
        burst: u8,
        pause: u8,
        limit: u8,
        speed: u8,
    }

    fn registry() -> Registry<Pump, PumpFrame> {
        Registry::builder()
            .map(
                field!(Pump, burst),
                field!(PumpFrame, burst),
                Transform::millis(Overflow::Reject),
            )
            .map(
                field!(Pump, pause),
                field!(PumpFrame, pause),
                Transform::millis(Overflow::Reject),
            )
            .map(
                field!(Pump, limit),
                field!(PumpFrame, limit),
                Transform::millis(Overflow::Saturate),
            )
            .map(
                field!(Pump, speed),
                field!(PumpFrame, speed),
                Transform::identity(),
            )
            .skip("serial")
            .build()
            .unwrap()
    }

    #[test]
    fn test_to_wire() {
        let pump = Pump {
            burst: Duration::from_millis(20),
            pause: Duration::from_millis(30),
            limit: Duration::from_secs(2),
            speed: 7,
            serial: 99,
        };
        let frame = to_wire(&registry(), &pump).unwrap();
        assert_eq!(
            frame,
            PumpFrame {
                burst: 20,
                pause: 30,
                limit: 255,
                speed: 7
            }
        );
    }

    #[test]
    fn test_to_wire_rejects() {
        let pump = Pump {
            burst: Duration::from_millis(256),
            ..Default::default()
        };
        let err = to_wire(&registry(), &pump).unwrap_err();
        assert_eq!(
            err,
            RangeError::TooLarge {
                field: "burst".into(),
                value: 256,
                max: 255
            }
        );
    }

    #[test]
    fn test_from_wire_keeps_unmapped_defaults() {
        let frame = PumpFrame {
            burst: 5,
            pause: 4,
            limit: 6,
            speed: 7,
        };
        let defaults = Pump {
            serial: 1234,
            speed: 1,
            ..Default::default()
        };
        let pump = from_wire(&registry(), &frame, defaults);
        assert_eq!(
            pump,
            Pump {
                burst: Duration::from_millis(5),
                pause: Duration::from_millis(4),
                limit: Duration::from_millis(6),
                speed: 7,
                serial: 1234,
            }
        );
    }

    #[test]
    fn test_validate_collects_every_error() {
        let pump = Pump {
            burst: Duration::from_millis(300),
            pause: Duration::from_millis(1_000),
            limit: Duration::from_millis(300),
            ..Default::default()
        };
        let errors = validate(&registry(), &pump);
        let fields = errors.iter().map(RangeError::field).collect::<Vec<_>>();
        assert_eq!(fields, ["burst", "pause"]);
        assert!(matches!(errors[1], RangeError::TooLarge { value: 1_000, .. }));

        assert!(validate(&registry(), &Pump::default()).is_empty());
    }
}
