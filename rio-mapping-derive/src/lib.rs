//! Macros to `derive` the `rio-mapping` traits

use proc_macro::TokenStream;
use quote::quote;

mod config;
mod entry;
mod layout;
mod utils;

/// Derive macro to implement `rio_mapping::core::WireLayout`
#[proc_macro_derive(WireLayout, attributes(wire))]
pub fn derive_wire_layout(input: TokenStream) -> TokenStream {
    let ast = syn::parse_macro_input!(input as syn::DeriveInput);

    let name = &ast.ident;

    let config = config::Config::new(&ast, config::LAYOUT_KEYS);
    let layout = layout::Layout::new(&ast);

    let field_name = layout.field_name_vec();
    let field_key = layout.field_key_vec();
    let field_ty = layout.field_ty_vec();

    let size = quote! {
        0usize #(+ <#field_ty as rio_mapping::codec::Encode>::SIZE)*
    };

    // Compile-time checks of the declared offsets and total size
    let mut checks = Vec::new();
    for (index, key, offset) in layout.declared_offsets() {
        let preceding = &field_ty[..index];
        let message = format!("`{name}::{key}` does not start at its declared offset {offset}");
        checks.push(quote! {
            const _: () = assert!(
                0usize #(+ <#preceding as rio_mapping::codec::Encode>::SIZE)* == #offset,
                #message
            );
        });
    }
    if let Some(declared) = config.size {
        let message = format!("`{name}` fields do not add up to its declared size {declared}");
        checks.push(quote! {
            const _: () = assert!(#size == #declared, #message);
        });
    }

    let tokens = quote! {
        #(#checks)*

        impl rio_mapping::core::WireLayout for #name {
            type Bytes = [u8; #size];

            const SIZE: usize = #size;

            #[allow(unused_assignments, unused_mut, unused_variables)]
            fn encode(&self) -> Self::Bytes {
                let mut bytes = [0u8; #size];
                let mut offset = 0usize;
                #(
                    let end = offset + <#field_ty as rio_mapping::codec::Encode>::SIZE;
                    rio_mapping::codec::Encode::encode_be(&self.#field_name, &mut bytes[offset..end]);
                    offset = end;
                )*

                bytes
            }

            #[allow(unused_assignments, unused_mut, unused_variables)]
            fn decode(bytes: &[u8]) -> Result<Self, rio_mapping::codec::FrameSizeError> {
                rio_mapping::codec::check_frame_size(bytes, #size)?;
                let mut offset = 0usize;
                #(
                    let end = offset + <#field_ty as rio_mapping::codec::Encode>::SIZE;
                    let #field_name = <#field_ty as rio_mapping::codec::Decode>::decode_be(&bytes[offset..end]);
                    offset = end;
                )*

                Ok(Self { #(#field_name),* })
            }

            fn field_paths() -> Vec<String> {
                let mut paths = Vec::new();
                #(
                    let sub_fields = <#field_ty as rio_mapping::codec::Encode>::sub_fields();
                    if sub_fields.is_empty() {
                        paths.push(#field_key.to_string());
                    } else {
                        paths.extend(sub_fields.into_iter().map(|sub| format!("{}.{}", #field_key, sub)));
                    }
                )*

                paths
            }
        }
    };

    tokens.into()
}

/// Derive macro to implement `rio_mapping::codec::Encode` and `rio_mapping::codec::Decode`
/// for a record of flags and small integers packed into one big-endian value
#[proc_macro_derive(BitPacked, attributes(wire))]
pub fn derive_bit_packed(input: TokenStream) -> TokenStream {
    let ast = syn::parse_macro_input!(input as syn::DeriveInput);

    let name = &ast.ident;

    let config = config::Config::new(&ast, config::PACKED_KEYS);
    let packing = layout::Packing::new(&ast, &config);

    let bytes = config.bytes;
    let reserved_mask = packing.reserved_mask(config.bit_width());
    let reserved_bytes = reserved_mask.to_be_bytes()[8 - bytes..].to_vec();
    let field_name = packing.field_name_vec();
    let field_key = packing.field_key_vec();

    let mut encode_blocks = Vec::new();
    let mut decode_blocks = Vec::new();
    for entry in &packing.0 {
        let field_name = entry.field_name_ident();
        let field_ty = &entry.field_ty;
        let lo = entry.bits.lo;
        let value_mask = entry.bits.value_mask();

        if entry.flag {
            encode_blocks.push(quote! {
                raw |= u64::from(self.#field_name) << #lo;
            });
            decode_blocks.push(quote! {
                (raw >> #lo) & 1 == 1
            });
        } else {
            encode_blocks.push(quote! {
                #[allow(clippy::unnecessary_cast)]
                let value = self.#field_name as u64;
                // Keep only the declared width
                raw |= (value & #value_mask) << #lo;
            });
            decode_blocks.push(quote! {
                ((raw >> #lo) & #value_mask) as #field_ty
            });
        }
    }

    let tokens = quote! {
        impl rio_mapping::codec::Encode for #name {
            const SIZE: usize = #bytes;

            #[allow(unused_mut)]
            fn encode_be(&self, bytes: &mut [u8]) {
                // Reserved bits stay zero
                let mut raw: u64 = 0;
                #(#encode_blocks)*
                bytes.copy_from_slice(&raw.to_be_bytes()[8 - #bytes..]);
            }

            fn sub_fields() -> Vec<&'static str> {
                vec![#(#field_key),*]
            }
        }

        impl rio_mapping::codec::Decode for #name {
            fn decode_be(bytes: &[u8]) -> Self {
                let mut array = [0u8; 8];
                array[8 - #bytes..].copy_from_slice(bytes);
                // Reserved bits are never read
                let raw = u64::from_be_bytes(array);

                Self {
                    #(#field_name: #decode_blocks),*
                }
            }
        }

        impl #name {
            /// Bits that carry no field, zero on encode and ignored on decode.
            ///
            /// Right-aligned: bit 0 is the least significant bit of the last record byte.
            pub const RESERVED_MASK: u64 = #reserved_mask;

            /// [`Self::RESERVED_MASK`] as the big-endian bytes of the record.
            pub const RESERVED_BYTES: [u8; #bytes] = [#(#reserved_bytes),*];
        }
    };

    tokens.into()
}

/// Derive macro to implement `rio_mapping::core::FieldPaths`
#[proc_macro_derive(FieldPaths)]
pub fn derive_field_paths(input: TokenStream) -> TokenStream {
    let ast = syn::parse_macro_input!(input as syn::DeriveInput);

    let name = &ast.ident;

    let fields = layout::named_fields(&ast);
    let field_key = fields
        .iter()
        .map(|field| field.ident.as_ref().map(ToString::to_string).unwrap_or_default())
        .collect::<Vec<_>>();
    let field_ty = fields.iter().map(|field| &field.ty).collect::<Vec<_>>();

    let tokens = quote! {
        impl rio_mapping::core::FieldPaths for #name {
            fn field_paths() -> Vec<String> {
                let mut paths = Vec::new();
                #(
                    let nested = <#field_ty as rio_mapping::core::FieldPaths>::field_paths();
                    if nested.is_empty() {
                        paths.push(#field_key.to_string());
                    } else {
                        paths.extend(nested.into_iter().map(|path| format!("{}.{}", #field_key, path)));
                    }
                )*

                paths
            }
        }
    };

    tokens.into()
}

/// Documentation line for a field carrying a `wire` attribute.
fn field_doc(field: &syn::Field) -> String {
    let name = field
        .ident
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_default();
    let is_bit_field = utils::find_attr(&field.attrs)
        .map(|attr| {
            let punctuated = utils::get_punctuated(attr, &name);
            utils::has_key(&punctuated, "bit", &name) || utils::has_key(&punctuated, "bits", &name)
        })
        .unwrap_or(false);

    if is_bit_field {
        let entry: entry::BitEntry = field.clone().into();
        let unit = entry.unit.as_deref().unwrap_or("-");
        if entry.flag {
            format!("bit - `{}`, unit - `{unit}`.", entry.bits.lo)
        } else {
            format!(
                "bits - `{}..={}` (`{}` wide), unit - `{unit}`.",
                entry.bits.hi,
                entry.bits.lo,
                entry.bits.width()
            )
        }
    } else {
        let entry: entry::Entry = field.clone().into();
        format!(
            "offset - `{}`, unit - `{}`.",
            entry.offset.map_or("-".to_string(), |offset| offset.to_string()),
            entry.unit.as_deref().unwrap_or("-")
        )
    }
}

#[proc_macro_attribute]
pub fn wire_doc(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut ast = syn::parse_macro_input!(item as syn::DeriveInput);
    match &mut ast.data {
        syn::Data::Struct(ref mut struct_data) => {
            match &mut struct_data.fields {
                syn::Fields::Named(fields_named) => {
                    for field in &mut fields_named.named {
                        if !utils::has_attr(field) {
                            continue;
                        }
                        let doc = field_doc(field);
                        let doc: syn::Attribute = syn::parse_quote!(#[doc = #doc]);
                        field.attrs.push(doc);
                    }
                }
                _ => panic!("`wire_doc` has to be applied to structs with named fields"),
            }

            quote! {
                #ast
            }
            .into()
        }
        _ => panic!("`wire_doc` has to be applied with structs"),
    }
}
