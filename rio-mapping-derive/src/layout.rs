use crate::config::Config;
use crate::entry::{BitEntry, Entry};
use proc_macro2::Ident;
use syn::{Data, DeriveInput, Field, Fields, Type};

pub fn named_fields(ast: &DeriveInput) -> Vec<Field> {
    let data_struct = match ast.data.clone() {
        Data::Struct(data_struct) => data_struct,
        _ => panic!("Trait can be implemented only for a struct."),
    };

    match data_struct.fields {
        Fields::Named(fields_named) => fields_named.named.into_iter().collect(),
        _ => panic!("Trait can be implemented only for a struct with named fields."),
    }
}

#[derive(Debug, Clone)]
/// Byte-aligned fields of a wire frame, in declaration order.
pub struct Layout(pub Vec<Entry>);

impl Layout {
    pub fn new(ast: &DeriveInput) -> Self {
        let entries = named_fields(ast)
            .into_iter()
            .map(From::from)
            .collect::<Vec<Entry>>();

        Self(entries)
    }

    pub fn field_name_vec(&self) -> Vec<Ident> {
        self.0
            .iter()
            .map(|x| x.field_name_ident())
            .collect::<Vec<_>>()
    }

    pub fn field_key_vec(&self) -> Vec<String> {
        self.0.iter().map(|x| x.field_name.clone()).collect::<Vec<_>>()
    }

    pub fn field_ty_vec(&self) -> Vec<Type> {
        self.0.iter().map(|x| x.field_ty.clone()).collect::<Vec<_>>()
    }

    /// Fields with a declared offset, as `(index, key, offset)`.
    pub fn declared_offsets(&self) -> Vec<(usize, String, usize)> {
        self.0
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| {
                entry
                    .offset
                    .map(|offset| (index, entry.field_name.clone(), offset))
            })
            .collect::<Vec<_>>()
    }
}

#[derive(Debug, Clone)]
/// Fields of a bit-packed record.
pub struct Packing(pub Vec<BitEntry>);

impl Packing {
    /// Parse the fields and check they fit the record without overlapping.
    pub fn new(ast: &DeriveInput, config: &Config) -> Self {
        let entries = named_fields(ast)
            .into_iter()
            .map(From::from)
            .collect::<Vec<BitEntry>>();

        let packing = Self(entries);
        packing.check(&ast.ident.to_string(), config);

        packing
    }

    fn check(&self, name: &str, config: &Config) {
        let width = config.bit_width();
        let mut used = 0u64;
        for entry in &self.0 {
            if entry.bits.hi >= width {
                panic!(
                    "In `{name}`, bit {} of `{}` does not fit a {width}-bit record.",
                    entry.bits.hi, entry.field_name
                );
            }
            if used & entry.bits.mask() != 0 {
                panic!(
                    "In `{name}`, bits of `{}` overlap with another field.",
                    entry.field_name
                );
            }
            used |= entry.bits.mask();
        }
    }

    pub fn field_name_vec(&self) -> Vec<Ident> {
        self.0
            .iter()
            .map(|x| x.field_name_ident())
            .collect::<Vec<_>>()
    }

    pub fn field_key_vec(&self) -> Vec<String> {
        self.0.iter().map(|x| x.field_name.clone()).collect::<Vec<_>>()
    }

    /// Bits of a `width`-bit record that no field claims.
    pub fn reserved_mask(&self, width: u32) -> u64 {
        let all = if width >= 64 {
            u64::MAX
        } else {
            (1u64 << width) - 1
        };
        let used = self.0.iter().fold(0u64, |used, entry| used | entry.bits.mask());

        all & !used
    }
}
