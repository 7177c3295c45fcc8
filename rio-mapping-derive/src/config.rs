use crate::utils::{check_keys, find_attr, get_int, get_punctuated};
use syn::DeriveInput;

#[derive(Debug)]
/// Struct-level `wire` attribute.
pub struct Config {
    /// Declared total frame size in bytes, checked against the fields at compile time.
    pub size: Option<usize>,
    /// Width in bytes of a bit-packed record.
    pub bytes: usize,
}

/// Struct keys accepted by `WireLayout`.
pub const LAYOUT_KEYS: &[&str] = &["size"];
/// Struct keys accepted by `BitPacked`.
pub const PACKED_KEYS: &[&str] = &["bytes"];

impl Config {
    pub fn new(ast: &DeriveInput, keys: &[&str]) -> Self {
        let attr = find_attr(&ast.attrs);

        let name = &ast.ident.to_string();

        // Try to extract relevant fields from the attribute
        let (size, bytes) = match attr {
            Some(attr) => {
                let punctuated = get_punctuated(attr, name);
                check_keys(&punctuated, keys, name);

                let size = get_int::<usize>(&punctuated, "size", name);
                let bytes = get_int::<usize>(&punctuated, "bytes", name);

                (size, bytes)
            }
            None => (None, None),
        };

        let bytes = bytes.unwrap_or(1);
        if !(1..=8).contains(&bytes) {
            panic!("In `wire` attribute for `{name}`, `bytes` must be between 1 and 8, got {bytes}.");
        }

        Self { size, bytes }
    }

    pub fn bit_width(&self) -> u32 {
        8 * self.bytes as u32
    }
}
