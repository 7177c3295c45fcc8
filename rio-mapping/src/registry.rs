use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::codec::WireInt;
use crate::core::{FieldPaths, WireLayout};
use crate::error::{RangeError, RegistrationError};

type Getter<S, T> = Arc<dyn Fn(&S) -> T + Send + Sync>;
type Setter<S, T> = Arc<dyn Fn(&mut S, T) + Send + Sync>;

/// Build an [`Accessor`] for a (possibly nested) struct field.
///
/// ```
/// use rio_mapping::device::EyEm510;
///
/// let polarity = rio_mapping::field!(EyEm510, triac_03.polarity);
/// assert_eq!(polarity.path(), "triac_03.polarity");
/// ```
#[macro_export]
macro_rules! field {
    ($ty:ty, $head:ident $(. $tail:ident)*) => {
        $crate::registry::Accessor::new(
            concat!(stringify!($head) $(, ".", stringify!($tail))*),
            |source: &$ty| source.$head $(.$tail)*,
            |target: &mut $ty, value| target.$head $(.$tail)* = value,
        )
    };
}

/// Getter and setter pair for one field of `S`, keyed by its dotted path.
pub struct Accessor<S, T> {
    path: String,
    get: Getter<S, T>,
    set: Setter<S, T>,
}

impl<S, T> Accessor<S, T> {
    pub fn new(
        path: impl Into<String>,
        get: impl Fn(&S) -> T + Send + Sync + 'static,
        set: impl Fn(&mut S, T) + Send + Sync + 'static,
    ) -> Self {
        Self {
            path: path.into(),
            get: Arc::new(get),
            set: Arc::new(set),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn get(&self, source: &S) -> T {
        (self.get)(source)
    }

    pub fn set(&self, target: &mut S, value: T) {
        (self.set)(target, value)
    }
}

impl<S, T> Clone for Accessor<S, T> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            get: Arc::clone(&self.get),
            set: Arc::clone(&self.set),
        }
    }
}

impl<S, T> fmt::Debug for Accessor<S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accessor").field("path", &self.path).finish()
    }
}

/// Borrowing access to a nested struct `I` inside `S`.
///
/// Composing a lens with an accessor of `I` gives an accessor of `S`.
pub struct Lens<S, I> {
    path: String,
    get: fn(&S) -> &I,
    get_mut: fn(&mut S) -> &mut I,
}

impl<S: 'static, I: 'static> Lens<S, I> {
    pub fn new(path: impl Into<String>, get: fn(&S) -> &I, get_mut: fn(&mut S) -> &mut I) -> Self {
        Self {
            path: path.into(),
            get,
            get_mut,
        }
    }

    pub fn then<T: 'static>(&self, inner: Accessor<I, T>) -> Accessor<S, T> {
        let (outer_get, outer_get_mut) = (self.get, self.get_mut);
        let Accessor { path, get, set } = inner;

        Accessor {
            path: format!("{}.{}", self.path, path),
            get: Arc::new(move |source: &S| get(outer_get(source))),
            set: Arc::new(move |target: &mut S, value: T| set(outer_get_mut(target), value)),
        }
    }
}

/// What a transform does with a domain value that its wire field cannot hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overflow {
    /// Fail with [`RangeError`], also for durations finer than the wire unit.
    Reject,
    /// Clamp to the wire maximum. Durations round down to the wire unit.
    Saturate,
    /// Keep the low-order bits. Durations round down to the wire unit.
    Truncate,
}

pub(crate) enum Fit<B> {
    Exact(B),
    Adjusted(B),
    OutOfRange { value: u64, max: u64 },
    Inexact { value: Duration, unit: Duration },
}

/// Value conversion between a domain field of type `A` and a wire field of type `B`.
pub struct Transform<A, B> {
    overflow: Option<Overflow>,
    to_wire: Arc<dyn Fn(A) -> Fit<B> + Send + Sync>,
    from_wire: Arc<dyn Fn(B) -> A + Send + Sync>,
}

impl<T: 'static> Transform<T, T> {
    pub fn identity() -> Self {
        Self {
            overflow: None,
            to_wire: Arc::new(Fit::Exact),
            from_wire: Arc::new(|value| value),
        }
    }
}

impl<A: 'static, B: 'static> Transform<A, B> {
    /// Lossless conversion in both directions.
    pub fn new(
        to_wire: impl Fn(A) -> B + Send + Sync + 'static,
        from_wire: impl Fn(B) -> A + Send + Sync + 'static,
    ) -> Self {
        Self {
            overflow: None,
            to_wire: Arc::new(move |value| Fit::Exact(to_wire(value))),
            from_wire: Arc::new(from_wire),
        }
    }

    /// `None` for lossless transforms.
    pub fn overflow(&self) -> Option<Overflow> {
        self.overflow
    }
}

impl<B: WireInt> Transform<Duration, B> {
    /// Count of whole `unit`s.
    ///
    /// A remainder below one unit is an error under [`Overflow::Reject`]
    /// and is dropped under the other policies.
    ///
    /// # Panics
    ///
    /// If `unit` is zero.
    pub fn ticks(unit: Duration, overflow: Overflow) -> Self {
        assert!(!unit.is_zero(), "tick unit must not be zero");

        let to_wire = move |duration: Duration| {
            let ticks = duration.as_nanos() / unit.as_nanos();
            let whole = duration.as_nanos() % unit.as_nanos() == 0;
            let value = u64::try_from(ticks).unwrap_or(u64::MAX);
            match overflow {
                Overflow::Reject if value > B::MAX => Fit::OutOfRange { value, max: B::MAX },
                Overflow::Reject if !whole => Fit::Inexact {
                    value: duration,
                    unit,
                },
                Overflow::Saturate if value > B::MAX => Fit::Adjusted(B::truncate(B::MAX)),
                _ if value > B::MAX || !whole => Fit::Adjusted(B::truncate(value)),
                _ => Fit::Exact(B::truncate(value)),
            }
        };
        let from_wire = move |ticks: B| {
            u32::try_from(ticks.widen()).map_or(Duration::MAX, |ticks| unit.saturating_mul(ticks))
        };

        Self {
            overflow: Some(overflow),
            to_wire: Arc::new(to_wire),
            from_wire: Arc::new(from_wire),
        }
    }

    pub fn millis(overflow: Overflow) -> Self {
        Self::ticks(Duration::from_millis(1), overflow)
    }

    pub fn deciseconds(overflow: Overflow) -> Self {
        Self::ticks(Duration::from_millis(100), overflow)
    }

    pub fn seconds(overflow: Overflow) -> Self {
        Self::ticks(Duration::from_secs(1), overflow)
    }
}

trait Link<D, W>: Send + Sync {
    fn to_wire(&self, domain: &D, frame: &mut W) -> Fit<()>;

    fn from_wire(&self, frame: &W, domain: &mut D);
}

struct FieldLink<D, W, A, B> {
    domain: Accessor<D, A>,
    wire: Accessor<W, B>,
    transform: Transform<A, B>,
}

impl<D, W, A, B> Link<D, W> for FieldLink<D, W, A, B> {
    fn to_wire(&self, domain: &D, frame: &mut W) -> Fit<()> {
        match (self.transform.to_wire)(self.domain.get(domain)) {
            Fit::Exact(value) => {
                self.wire.set(frame, value);
                Fit::Exact(())
            }
            Fit::Adjusted(value) => {
                self.wire.set(frame, value);
                Fit::Adjusted(())
            }
            Fit::OutOfRange { value, max } => Fit::OutOfRange { value, max },
            Fit::Inexact { value, unit } => Fit::Inexact { value, unit },
        }
    }

    fn from_wire(&self, frame: &W, domain: &mut D) {
        let value = (self.transform.from_wire)(self.wire.get(frame));
        self.domain.set(domain, value);
    }
}

/// Single entry of a [`Registry`], linking one domain field with one wire field.
pub struct Entry<D, W> {
    domain_path: String,
    wire_path: String,
    overflow: Option<Overflow>,
    link: Box<dyn Link<D, W>>,
}

impl<D, W> Entry<D, W> {
    /// Stable key of the entry, the dotted path of its domain field.
    pub fn id(&self) -> &str {
        &self.domain_path
    }

    pub fn domain_path(&self) -> &str {
        &self.domain_path
    }

    pub fn wire_path(&self) -> &str {
        &self.wire_path
    }

    pub fn overflow(&self) -> Option<Overflow> {
        self.overflow
    }

    pub(crate) fn write_wire(&self, domain: &D, frame: &mut W) -> Result<(), RangeError> {
        match self.link.to_wire(domain, frame) {
            Fit::Exact(()) => Ok(()),
            Fit::Adjusted(()) => {
                tracing::debug!(
                    field = %self.domain_path,
                    policy = ?self.overflow,
                    "value adjusted to fit wire field `{}`",
                    self.wire_path
                );
                Ok(())
            }
            Fit::OutOfRange { value, max } => Err(RangeError::TooLarge {
                field: self.domain_path.clone(),
                value,
                max,
            }),
            Fit::Inexact { value, unit } => Err(RangeError::Inexact {
                field: self.domain_path.clone(),
                value,
                unit,
            }),
        }
    }

    pub(crate) fn read_wire(&self, frame: &W, domain: &mut D) {
        self.link.from_wire(frame, domain)
    }
}

impl<D, W> fmt::Debug for Entry<D, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("domain_path", &self.domain_path)
            .field("wire_path", &self.wire_path)
            .field("overflow", &self.overflow)
            .finish()
    }
}

/// Immutable table of field mappings between the `D` domain type and the `W` wire frame.
///
/// Entries keep their declaration order.
pub struct Registry<D, W> {
    entries: Vec<Entry<D, W>>,
}

impl<D, W> Registry<D, W> {
    pub fn builder() -> RegistryBuilder<D, W> {
        RegistryBuilder::default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry<D, W>> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Entry<D, W>> {
        self.entries.iter().find(|entry| entry.id() == id)
    }
}

impl<D, W> fmt::Debug for Registry<D, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.entries.iter()).finish()
    }
}

/// Collect mapping entries and check them against both types when built.
pub struct RegistryBuilder<D, W> {
    entries: Vec<Entry<D, W>>,
    skipped: Vec<String>,
}

impl<D, W> Default for RegistryBuilder<D, W> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

impl<D: 'static, W: 'static> RegistryBuilder<D, W> {
    pub fn map<A: 'static, B: 'static>(
        mut self,
        domain: Accessor<D, A>,
        wire: Accessor<W, B>,
        transform: Transform<A, B>,
    ) -> Self {
        let entry = Entry {
            domain_path: domain.path().to_string(),
            wire_path: wire.path().to_string(),
            overflow: transform.overflow(),
            link: Box::new(FieldLink {
                domain,
                wire,
                transform,
            }),
        };
        self.entries.push(entry);

        self
    }

    /// Leave a domain field, or every field below a nested struct, out of this frame.
    pub fn skip(mut self, domain_path: impl Into<String>) -> Self {
        self.skipped.push(domain_path.into());

        self
    }

    pub fn build(self) -> Result<Registry<D, W>, RegistrationError>
    where
        D: FieldPaths,
        W: WireLayout,
    {
        let wire_fields = W::field_paths();
        let domain_fields = D::field_paths();

        let mut wire_seen = HashSet::new();
        let mut domain_seen = HashSet::new();
        for entry in &self.entries {
            if !wire_fields.contains(&entry.wire_path) {
                return Err(RegistrationError::UnknownWireField(entry.wire_path.clone()));
            }
            if !domain_fields.contains(&entry.domain_path) {
                return Err(RegistrationError::UnknownDomainField(
                    entry.domain_path.clone(),
                ));
            }
            if !wire_seen.insert(entry.wire_path.as_str()) {
                return Err(RegistrationError::DuplicateWireField(entry.wire_path.clone()));
            }
            if !domain_seen.insert(entry.domain_path.as_str()) {
                return Err(RegistrationError::DuplicateDomainField(
                    entry.domain_path.clone(),
                ));
            }
        }

        if let Some(skip) = self
            .skipped
            .iter()
            .find(|skip| !domain_fields.iter().any(|path| covers(skip, path)))
        {
            return Err(RegistrationError::UnknownDomainField(skip.clone()));
        }

        if let Some(path) = wire_fields
            .iter()
            .find(|path| !wire_seen.contains(path.as_str()))
        {
            return Err(RegistrationError::UnmappedWireField(path.clone()));
        }

        if let Some(path) = domain_fields.iter().find(|path| {
            !domain_seen.contains(path.as_str())
                && !self.skipped.iter().any(|skip| covers(skip, path))
        }) {
            return Err(RegistrationError::UnmappedDomainField(path.clone()));
        }

        tracing::debug!(
            entries = self.entries.len(),
            frame_size = W::SIZE,
            "mapping registry built"
        );

        Ok(Registry {
            entries: self.entries,
        })
    }
}

/// `prefix` names `path` itself or one of its parent structs.
fn covers(prefix: &str, path: &str) -> bool {
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('.'))
}
