use darling::{FromDeriveInput, FromVariant, ast};
use heck::ToSnakeCase;
use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{DeriveInput, parse_macro_input};

#[derive(Debug, FromDeriveInput)]
#[darling(supports(enum_unit))]
struct ComparisonDeriveInput {
    ident: syn::Ident,
    data: ast::Data<ComparisonVariant, ()>,
}

#[derive(Debug, FromVariant)]
#[darling(attributes(comparison))]
struct ComparisonVariant {
    ident: syn::Ident,
    #[darling(default)]
    ignore: bool,
}

/// Generates `where_*`, `or_where_*` and `having_*` shortcuts on
/// `SearchQuery`, one set per operator variant.
pub fn comparison_methods_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let enum_info = match ComparisonDeriveInput::from_derive_input(&input) {
        Ok(v) => v,
        Err(e) => return e.write_errors().into(),
    };

    let enum_name = &enum_info.ident;

    let variants = match enum_info.data.take_enum() {
        Some(variants) => variants,
        None => {
            return syn::Error::new_spanned(&input, "only unit enums are supported")
                .to_compile_error()
                .into();
        }
    };

    let methods = variants.iter().filter_map(|var| {
        let var_name = &var.ident;
        let snake = var_name.to_string().to_snake_case();
        let where_fn = format_ident!("where_{}", snake);
        let or_where_fn = format_ident!("or_where_{}", snake);
        let having_fn = format_ident!("having_{}", snake);

        if var.ignore {
            return None;
        }

        Some(quote! {
            pub fn #where_fn<F, V>(&mut self, field: F, value: V) -> &mut Self
            where
                F: crate::IntoField,
                V: crate::IntoBind,
            {
                self.and_where(crate::Comparison::new(field, #enum_name::#var_name, value))
            }

            pub fn #or_where_fn<F, V>(&mut self, field: F, value: V) -> &mut Self
            where
                F: crate::IntoField,
                V: crate::IntoBind,
            {
                self.or_where(crate::Comparison::new(field, #enum_name::#var_name, value))
            }

            pub fn #having_fn<F, V>(&mut self, field: F, value: V) -> &mut Self
            where
                F: crate::IntoField,
                V: crate::IntoBind,
            {
                self.and_having(crate::Comparison::new(field, #enum_name::#var_name, value))
            }
        })
    });

    quote! {
        impl crate::SearchQuery {
            #(#methods)*
        }
    }
    .into()
}
