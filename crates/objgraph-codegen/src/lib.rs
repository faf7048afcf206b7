// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

extern crate proc_macro;

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{
    parse_macro_input, Attribute, Data, DataEnum, DataStruct, DeriveInput, ExprPath, Fields,
    LitStr, Member,
};

/// Container options from `#[codec(...)]` on the type.
#[derive(Default)]
struct ContainerAttrs {
    /// Canonical name override (`name = "..."`).
    name: Option<LitStr>,
    /// Describe the type as opaque (`opaque`).
    opaque: bool,
    /// Post-decode hook (`on_deserialized = "Self::method"`).
    on_deserialized: Option<ExprPath>,
}

/// Member options from `#[codec(...)]` on a field.
#[derive(Default)]
struct FieldAttrs {
    skip: bool,
    base: bool,
}

/// `#[derive(Codec)]`: generates the `objgraph::Describe` shape of a type.
///
/// Supports:
/// - Structs (named, tuple, unit): an aggregate of their members. Also
///   implements `objgraph::RefTarget` so the struct can sit behind `Ref<T>`.
/// - Unit-only enums: encoded as their discriminant, using the `#[repr]`
///   integer type (default `i32`).
///
/// Attributes:
/// - `#[codec(name = "pkg.Type")]`: canonical name used for tag ordering
/// - `#[codec(opaque)]`: known but not serializable (rejected by the
///   default eligibility policy unless a plugin claims it)
/// - `#[codec(on_deserialized = "Self::rebuild")]`: `fn(&mut Self)` run
///   after decoding when hooks are enabled
/// - `#[codec(skip)]` on a field: not serialized, left at its default
/// - `#[codec(base)]` on a field: encoded first, before the sorted members
///
/// Every described type must implement `Default`.
///
/// Example:
/// ```ignore
/// use objgraph::{Codec, Ref};
///
/// #[derive(Codec, Default)]
/// struct Node {
///     label: String,
///     next: Ref<Node>,
///     #[codec(skip)]
///     cached_len: usize,
/// }
/// ```
#[proc_macro_derive(Codec, attributes(codec))]
pub fn derive_codec(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let expanded = match &input.data {
        Data::Struct(data) => expand_struct(&input, data),
        Data::Enum(data) => expand_enum(&input, data),
        Data::Union(_) => Err(syn::Error::new_spanned(
            &input.ident,
            "Codec cannot be derived for unions",
        )),
    };
    expanded.unwrap_or_else(syn::Error::into_compile_error).into()
}

fn expand_struct(input: &DeriveInput, data: &DataStruct) -> syn::Result<TokenStream2> {
    let attrs = container_attrs(&input.attrs)?;
    if let Some(lifetime) = input.generics.lifetimes().next() {
        return Err(syn::Error::new_spanned(
            lifetime,
            "Codec types must be 'static; lifetime parameters are not supported",
        ));
    }

    let name = &input.ident;
    let mut generics = input.generics.clone();
    let params: Vec<_> = generics.type_params().map(|p| p.ident.clone()).collect();
    let where_clause = generics.make_where_clause();
    for param in &params {
        where_clause
            .predicates
            .push(syn::parse_quote!(#param: ::objgraph::Describe));
    }
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let rename = attrs.name.as_ref().map(|lit| quote!(.named(#lit)));

    if attrs.opaque {
        return Ok(quote! {
            impl #impl_generics ::objgraph::Describe for #name #ty_generics #where_clause {
                fn shape() -> ::objgraph::TypeShape {
                    ::objgraph::TypeShape::new::<Self>(::objgraph::TypeKind::Opaque) #rename
                }
            }
        });
    }

    let mut fields = Vec::new();
    for (index, field) in data.fields.iter().enumerate() {
        let field_attrs = field_attrs(&field.attrs)?;
        if field_attrs.skip {
            continue;
        }
        let member = match &field.ident {
            Some(ident) => Member::Named(ident.clone()),
            None => Member::Unnamed(index.into()),
        };
        let label = match &field.ident {
            Some(ident) => ident.to_string(),
            None => index.to_string(),
        };
        let ty = &field.ty;
        let base = field_attrs.base.then(|| quote!(.base()));
        fields.push(quote! {
            ::objgraph::FieldShape::new(
                #label,
                <#ty as ::objgraph::Describe>::shape,
                |value| {
                    value
                        .downcast_ref::<Self>()
                        .map(|this| &this.#member as &dyn ::core::any::Any)
                },
                |value| {
                    value
                        .downcast_mut::<Self>()
                        .map(|this| &mut this.#member as &mut dyn ::core::any::Any)
                },
            ) #base
        });
    }

    let hook = attrs.on_deserialized.as_ref().map(|path| {
        quote! {
            .on_deserialized(|value| {
                if let ::core::option::Option::Some(this) = value.downcast_mut::<Self>() {
                    #path(this);
                }
            })
        }
    });

    Ok(quote! {
        impl #impl_generics ::objgraph::Describe for #name #ty_generics #where_clause {
            fn shape() -> ::objgraph::TypeShape {
                ::objgraph::TypeShape::new::<Self>(::objgraph::TypeKind::Aggregate(
                    ::objgraph::AggregateShape::new(::std::vec![#(#fields),*]) #hook,
                ))
                #rename
                .with_reference(::objgraph::RefOps::of::<Self>())
            }
        }

        impl #impl_generics ::objgraph::RefTarget for #name #ty_generics #where_clause {
            fn target_any(&self) -> &dyn ::core::any::Any {
                self
            }

            fn ref_shape() -> ::objgraph::TypeShape {
                ::objgraph::TypeShape::reference::<Self>()
            }
        }
    })
}

fn expand_enum(input: &DeriveInput, data: &DataEnum) -> syn::Result<TokenStream2> {
    let attrs = container_attrs(&input.attrs)?;
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Codec enums cannot be generic",
        ));
    }
    if attrs.on_deserialized.is_some() {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "on_deserialized is only supported on structs",
        ));
    }

    let mut variants = Vec::new();
    for variant in &data.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(
                variant,
                "Codec enums must be unit-only (no variant data)",
            ));
        }
        variants.push(&variant.ident);
    }

    let name = &input.ident;
    let repr = repr_kind(&input.attrs)?;
    let rename = attrs.name.as_ref().map(|lit| quote!(.named(#lit)));
    let labels = variants.iter().map(|v| v.to_string());

    Ok(quote! {
        impl ::objgraph::Describe for #name {
            fn shape() -> ::objgraph::TypeShape {
                ::objgraph::TypeShape::new::<Self>(::objgraph::TypeKind::Enum(
                    ::objgraph::EnumShape::new(
                        ::objgraph::PrimitiveKind::#repr,
                        ::std::vec![#((#labels, Self::#variants as i64)),*],
                        ::objgraph::EnumOps {
                            to_repr: |value| {
                                value.downcast_ref::<Self>().map(|this| match this {
                                    #(Self::#variants => Self::#variants as i64,)*
                                })
                            },
                            from_repr: |slot, raw| {
                                let ::core::option::Option::Some(this) = slot.downcast_mut::<Self>() else {
                                    return false;
                                };
                                #(
                                    if raw == Self::#variants as i64 {
                                        *this = Self::#variants;
                                        return true;
                                    }
                                )*
                                false
                            },
                        },
                    ),
                ))
                #rename
            }
        }
    })
}

fn container_attrs(attrs: &[Attribute]) -> syn::Result<ContainerAttrs> {
    let mut parsed = ContainerAttrs::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident("codec")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                parsed.name = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("opaque") {
                parsed.opaque = true;
            } else if meta.path.is_ident("on_deserialized") {
                let lit: LitStr = meta.value()?.parse()?;
                parsed.on_deserialized = Some(lit.parse()?);
            } else {
                return Err(meta.error("expected `name`, `opaque`, or `on_deserialized`"));
            }
            Ok(())
        })?;
    }
    Ok(parsed)
}

fn field_attrs(attrs: &[Attribute]) -> syn::Result<FieldAttrs> {
    let mut parsed = FieldAttrs::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident("codec")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                parsed.skip = true;
            } else if meta.path.is_ident("base") {
                parsed.base = true;
            } else {
                return Err(meta.error("expected `skip` or `base`"));
            }
            Ok(())
        })?;
    }
    if parsed.skip && parsed.base {
        return Err(syn::Error::new_spanned(
            &attrs[0],
            "a skipped field cannot be a base member",
        ));
    }
    Ok(parsed)
}

/// `PrimitiveKind` variant for the enum's `#[repr]` (default `i32`).
fn repr_kind(attrs: &[Attribute]) -> syn::Result<syn::Ident> {
    let mut kind = format_ident!("I32");
    for attr in attrs.iter().filter(|a| a.path().is_ident("repr")) {
        attr.parse_nested_meta(|meta| {
            let Some(ident) = meta.path.get_ident() else {
                return Ok(());
            };
            let variant = match ident.to_string().as_str() {
                "u8" => "U8",
                "i8" => "I8",
                "u16" => "U16",
                "i16" => "I16",
                "u32" => "U32",
                "i32" => "I32",
                "u64" => "U64",
                "i64" => "I64",
                "usize" => "Usize",
                "isize" => "Isize",
                // repr(C), repr(align(N)) and friends do not choose a width
                _ => {
                    if meta.input.peek(syn::token::Paren) {
                        let _args;
                        syn::parenthesized!(_args in meta.input);
                    }
                    return Ok(());
                }
            };
            kind = format_ident!("{}", variant);
            Ok(())
        })?;
    }
    Ok(kind)
}
