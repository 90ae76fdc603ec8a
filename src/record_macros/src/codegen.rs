use crate::parser::RawFieldDef;
use proc_macro2::TokenStream;
use quote::quote;
use syn::{DeriveInput, Type};

fn tok_optional_str(v: &Option<syn::LitStr>) -> TokenStream {
    match v {
        Some(lit) => quote! { ::core::option::Option::Some(#lit) },
        None => quote! { ::core::option::Option::None },
    }
}

// `Codec<T>` items resolve to the scalar codec when the field type
// implements `ScalarAttribute` and to the serde codec otherwise.
fn tok_codec(ty: &Type) -> TokenStream {
    quote! { <::record_core::__private::Codec<#ty>> }
}

fn tok_field_info(def: &RawFieldDef) -> TokenStream {
    let ident = def.declared_name();
    let visible = def.visible;
    let annotation = tok_optional_str(&def.annotation);
    let index_annotation = tok_optional_str(&def.index_annotation);
    let ty = &def.ty;
    let codec = tok_codec(ty);
    let type_name = quote!(#ty).to_string();
    quote! {
        ::record_core::FieldInfo {
            ident: #ident,
            visible: #visible,
            annotation: #annotation,
            index_annotation: #index_annotation,
            kind: {
                #[allow(unused_imports)]
                use ::record_core::__private::SerdeCodec as _;
                #codec::KIND
            },
            type_name: #type_name,
        }
    }
}

pub fn generate_impl(input: &DeriveInput, defs: &[RawFieldDef]) -> TokenStream {
    let name = &input.ident;

    let infos = defs.iter().map(tok_field_info);

    //
    // ─── ACCESSORS ───────────────────────────────────────
    //
    let mut getters = Vec::new();
    let mut setters = Vec::new();
    for (index, def) in defs.iter().enumerate() {
        if !def.is_mapped() {
            continue;
        }
        let ident = &def.ident;
        let codec = tok_codec(&def.ty);
        getters.push(quote! {
            #index => #codec::encode(&self.#ident),
        });
        setters.push(quote! {
            #index => {
                self.#ident = #codec::decode(value)?;
                ::core::result::Result::Ok(())
            }
        });
    }

    quote! {
        impl ::record_core::Record for #name {
            fn fields() -> &'static [::record_core::FieldInfo] {
                const FIELDS: &[::record_core::FieldInfo] = &[ #( #infos ),* ];
                FIELDS
            }

            fn field_value(
                &self,
                index: usize,
            ) -> ::core::result::Result<
                ::record_core::__private::AttributeValue,
                ::record_core::ValueError,
            > {
                #[allow(unused_imports)]
                use ::record_core::__private::SerdeCodec as _;
                match index {
                    #( #getters )*
                    _ => ::core::result::Result::Err(::record_core::ValueError::Unmapped(index)),
                }
            }

            #[allow(unused_variables)]
            fn set_field_value(
                &mut self,
                index: usize,
                value: ::record_core::__private::AttributeValue,
            ) -> ::core::result::Result<(), ::record_core::ValueError> {
                #[allow(unused_imports)]
                use ::record_core::__private::SerdeCodec as _;
                match index {
                    #( #setters )*
                    _ => ::core::result::Result::Err(::record_core::ValueError::Unmapped(index)),
                }
            }
        }
    }
}
