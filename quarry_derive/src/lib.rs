use proc_macro::TokenStream;

mod comparison;

#[proc_macro_derive(ComparisonOperator, attributes(comparison))]
pub fn comparison_methods(input: TokenStream) -> TokenStream {
    comparison::comparison_methods_impl(input)
}
