use crate::utils::{check_keys, find_attr, get_int, get_punctuated, get_str};
use proc_macro2::{Ident, Span};
use syn::{punctuated::Punctuated, token::Comma, ExprAssign, Field, Type};

pub type Offset = usize;
pub type BitIndex = u32;

#[derive(Debug, Clone)]
/// Single byte-aligned field of a wire frame. Parsed from field attributes and to be used in proc macros
pub struct Entry {
    pub field_name: String,
    pub field_ty: Type,
    pub offset: Option<Offset>,
    pub unit: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Inclusive range of bits, numbered from the least significant bit of the packed value.
pub struct BitRange {
    pub hi: BitIndex,
    pub lo: BitIndex,
}

#[derive(Debug, Clone)]
/// Single field of a bit-packed record.
pub struct BitEntry {
    pub field_name: String,
    pub field_ty: Type,
    pub bits: BitRange,
    /// `bool` flag declared with `bit`, otherwise an unsigned integer declared with `bits`.
    pub flag: bool,
    pub unit: Option<String>,
}

fn is_bool(ty: &Type) -> bool {
    match ty {
        Type::Path(type_path) => type_path.path.is_ident("bool"),
        _ => false,
    }
}

fn field_name(field: &Field) -> String {
    field
        .ident
        .as_ref()
        .unwrap_or_else(|| panic!("Unexpected unnamed struct field."))
        .to_string()
}

impl From<Field> for Entry {
    fn from(value: Field) -> Self {
        let field_name = field_name(&value);

        let (offset, unit) = match find_attr(&value.attrs) {
            Some(attr) => {
                let punctuated = get_punctuated(attr, &field_name);
                check_keys(&punctuated, &["offset", "unit"], &field_name);
                (
                    get_int::<Offset>(&punctuated, "offset", &field_name),
                    get_str(&punctuated, "unit", &field_name),
                )
            }
            None => (None, None),
        };

        Self {
            field_name,
            field_ty: value.ty,
            offset,
            unit,
        }
    }
}

impl From<String> for BitRange {
    fn from(value: String) -> Self {
        let (hi, lo) = value
            .split_once("..=")
            .unwrap_or_else(|| panic!("Invalid `bits` range \"{value}\". Use \"hi..=lo\", e.g. \"7..=4\"."));
        let parse = |index: &str| {
            index.trim().parse::<BitIndex>().unwrap_or_else(|_| {
                panic!("Invalid `bits` range \"{value}\", bounds must be unsigned integers.")
            })
        };
        let (hi, lo) = (parse(hi), parse(lo));
        if hi < lo {
            panic!("Invalid `bits` range \"{value}\", the high bit must come first.");
        }

        Self { hi, lo }
    }
}

impl BitRange {
    pub fn width(&self) -> BitIndex {
        self.hi - self.lo + 1
    }

    /// Mask of the range width, not shifted.
    pub fn value_mask(&self) -> u64 {
        if self.width() >= 64 {
            u64::MAX
        } else {
            (1u64 << self.width()) - 1
        }
    }

    /// Mask of the range in place.
    pub fn mask(&self) -> u64 {
        self.value_mask() << self.lo
    }
}

impl From<Field> for BitEntry {
    fn from(value: Field) -> Self {
        let field_name = field_name(&value);

        let attr = find_attr(&value.attrs).unwrap_or_else(|| {
            panic!("Unexpected missing attribute `wire` for `{field_name}` field.")
        });
        let punctuated = get_punctuated(attr, &field_name);
        check_keys(&punctuated, &["bit", "bits", "unit"], &field_name);

        let (bits, flag) = Self::get_bits(&punctuated, &field_name);
        let unit = get_str(&punctuated, "unit", &field_name);

        match (flag, is_bool(&value.ty)) {
            (true, false) => panic!("`{field_name}` uses `bit`, which only takes `bool` fields. Use `bits` for integers."),
            (false, true) => panic!("`{field_name}` is a `bool` field, declare it with `bit`."),
            _ => {}
        }

        Self {
            field_name,
            field_ty: value.ty,
            bits,
            flag,
            unit,
        }
    }
}

impl BitEntry {
    // Parsing helpers

    fn get_bits(punctuated: &Punctuated<ExprAssign, Comma>, field_name: &str) -> (BitRange, bool) {
        let bit = get_int::<BitIndex>(punctuated, "bit", field_name);
        let bits = get_str(punctuated, "bits", field_name);
        match (bit, bits) {
            (Some(bit), None) => (BitRange { hi: bit, lo: bit }, true),
            (None, Some(bits)) => (bits.into(), false),
            (Some(_), Some(_)) => panic!(
                "In `wire` attribute for `{field_name}`, use either `bit` or `bits`, not both."
            ),
            (None, None) => panic!("In `wire` attribute for `{field_name}`, no key `bit` or `bits`"),
        }
    }
}

// Macro helpers

impl Entry {
    pub fn field_name_ident(&self) -> Ident {
        Ident::new(&self.field_name, Span::call_site())
    }
}

impl BitEntry {
    pub fn field_name_ident(&self) -> Ident {
        Ident::new(&self.field_name, Span::call_site())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(tokens: proc_macro2::TokenStream) -> Field {
        let named: syn::FieldsNamed = syn::parse_quote!({ #tokens });
        named.named.into_iter().next().unwrap()
    }

    #[test]
    fn test_entry_from_field() {
        let entry: Entry = field(quote::quote!(#[wire(offset = 3, unit = "ms")] pub relay: u8)).into();
        assert_eq!(entry.field_name, "relay");
        assert_eq!(entry.offset, Some(3));
        assert_eq!(entry.unit.as_deref(), Some("ms"));

        let entry: Entry = field(quote::quote!(pub relay: u8)).into();
        assert_eq!(entry.offset, None);
    }

    #[test]
    fn test_bit_entry_from_field() {
        let entry: BitEntry = field(quote::quote!(#[wire(bit = 7)] triac: bool)).into();
        assert!(entry.flag);
        assert_eq!(entry.bits, BitRange { hi: 7, lo: 7 });
        assert_eq!(entry.bits.mask(), 0b1000_0000);

        let entry: BitEntry = field(quote::quote!(#[wire(bits = "3..=0")] low: u8)).into();
        assert!(!entry.flag);
        assert_eq!(entry.bits.width(), 4);
        assert_eq!(entry.bits.value_mask(), 0x0f);
        assert_eq!(entry.bits.mask(), 0x0f);
    }

    #[test]
    #[should_panic(expected = "the high bit must come first")]
    fn test_reversed_bit_range() {
        let _: BitRange = String::from("0..=3").into();
    }

    #[test]
    #[should_panic(expected = "use either `bit` or `bits`")]
    fn test_bit_and_bits() {
        let _: BitEntry = field(quote::quote!(#[wire(bit = 1, bits = "1..=0")] x: u8)).into();
    }
}
