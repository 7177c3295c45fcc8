/// Wire frame and mapping registry without use of derive macros
use rio_mapping::codec::{check_frame_size, Decode, Encode, FrameSizeError};
use rio_mapping::core::{FieldPaths, WireLayout};
use rio_mapping::executor;
use rio_mapping::registry::{Accessor, Overflow, Registry, Transform};
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct Valve {
    pub opening_time: Duration,
    pub closed: bool,
}

impl FieldPaths for Valve {
    fn field_paths() -> Vec<String> {
        vec!["opening_time".to_string(), "closed".to_string()]
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ValveFrame {
    pub opening_time: u16,
    pub closed: bool,
}

impl WireLayout for ValveFrame {
    type Bytes = [u8; 3];

    const SIZE: usize = 3;

    fn encode(&self) -> Self::Bytes {
        let mut bytes = [0; 3];
        self.opening_time.encode_be(&mut bytes[..2]);
        // Bit 7 only, the rest is reserved
        bytes[2] = u8::from(self.closed) << 7;
        bytes
    }

    fn decode(bytes: &[u8]) -> Result<Self, FrameSizeError> {
        check_frame_size(bytes, Self::SIZE)?;
        Ok(Self {
            opening_time: u16::decode_be(&bytes[..2]),
            closed: bytes[2] & 0b1000_0000 != 0,
        })
    }

    fn field_paths() -> Vec<String> {
        vec!["opening_time".to_string(), "closed".to_string()]
    }
}

fn main() {
    tracing_subscriber::fmt().init();

    let registry = Registry::<Valve, ValveFrame>::builder()
        .map(
            Accessor::new(
                "opening_time",
                |valve: &Valve| valve.opening_time,
                |valve, value| valve.opening_time = value,
            ),
            Accessor::new(
                "opening_time",
                |frame: &ValveFrame| frame.opening_time,
                |frame, value| frame.opening_time = value,
            ),
            Transform::millis(Overflow::Saturate),
        )
        .map(
            Accessor::new("closed", |valve: &Valve| valve.closed, |valve, value| valve.closed = value),
            Accessor::new("closed", |frame: &ValveFrame| frame.closed, |frame, value| frame.closed = value),
            Transform::identity(),
        )
        .build()
        .unwrap();

    let valve = Valve {
        opening_time: Duration::from_secs(90),
        closed: true,
    };
    let frame = executor::to_wire(&registry, &valve).unwrap();
    println!("{:?} -> {:02x?}", valve, frame.encode());

    let decoded = executor::from_wire(&registry, &frame, Valve::default());
    println!("{:?}", decoded);
}
