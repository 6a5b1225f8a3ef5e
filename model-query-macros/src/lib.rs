//! Procedural macros for model-query
//!
//! - `model_query!` - Generate a specialized query builder for an entity

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse::Parse, parse::ParseStream, parse_macro_input, Ident, Token, Type, Visibility};

/// Generate a specialized query builder for an entity.
///
/// # Usage
///
/// ```ignore
/// model_query!(UserQuery, User);
/// model_query!(pub(crate) OrderQuery, crate::entities::Order);
/// ```
///
/// # Generated Code
///
/// For `model_query!(pub UserQuery, User)`:
///
/// ```ignore
/// pub struct UserQuery {
///     inner: model_query::EntityQuery<User>,
/// }
///
/// impl model_query::QueryBuilder<User> for UserQuery { /* accessors */ }
/// impl model_query::ModelQueryExt<User> for UserQuery {}
/// impl From<model_query::EntityQuery<User>> for UserQuery { /* ... */ }
/// ```
///
/// Named filters are then added in a plain `impl UserQuery` block, and the
/// entity selects the builder with `impl ModelQuerySupport for User { type Builder = UserQuery; }`.
#[proc_macro]
pub fn model_query(input: TokenStream) -> TokenStream {
    let parsed = parse_macro_input!(input as ModelQueryInput);
    expand(parsed).into()
}

fn expand(parsed: ModelQueryInput) -> proc_macro2::TokenStream {
    let ModelQueryInput { vis, name, entity } = parsed;

    quote! {
        #vis struct #name {
            inner: ::model_query::EntityQuery<#entity>,
        }

        impl ::model_query::QueryBuilder<#entity> for #name {
            fn from_query(query: ::model_query::EntityQuery<#entity>) -> Self {
                Self { inner: query }
            }

            fn query(&self) -> &::model_query::EntityQuery<#entity> {
                &self.inner
            }

            fn query_mut(&mut self) -> &mut ::model_query::EntityQuery<#entity> {
                &mut self.inner
            }

            fn into_query(self) -> ::model_query::EntityQuery<#entity> {
                self.inner
            }
        }

        impl ::model_query::ModelQueryExt<#entity> for #name {}

        impl ::std::convert::From<::model_query::EntityQuery<#entity>> for #name {
            fn from(query: ::model_query::EntityQuery<#entity>) -> Self {
                Self { inner: query }
            }
        }

        impl ::std::default::Default for #name {
            fn default() -> Self {
                Self { inner: ::model_query::EntityQuery::new() }
            }
        }

        impl ::std::fmt::Debug for #name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.debug_tuple(stringify!(#name)).field(&self.inner).finish()
            }
        }
    }
}

/// Input for model_query! macro
struct ModelQueryInput {
    vis: Visibility,
    name: Ident,
    entity: Type,
}

impl Parse for ModelQueryInput {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let vis: Visibility = input.parse()?;
        let name: Ident = input.parse()?;
        input.parse::<Token![,]>()?;
        let entity: Type = input.parse()?;

        if input.peek(Token![,]) {
            input.parse::<Token![,]>()?;
        }

        Ok(ModelQueryInput { vis, name, entity })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gen(tokens: proc_macro2::TokenStream) -> String {
        let input: ModelQueryInput = syn::parse2(tokens).unwrap();
        expand(input).to_string()
    }

    /// Last path segment of every trait implemented in the expansion.
    fn implemented_traits(tokens: proc_macro2::TokenStream) -> Vec<String> {
        let input: ModelQueryInput = syn::parse2(tokens).unwrap();
        let file: syn::File = syn::parse2(expand(input)).unwrap();
        file.items
            .iter()
            .filter_map(|item| match item {
                syn::Item::Impl(imp) => imp.trait_.as_ref(),
                _ => None,
            })
            .filter_map(|(_, path, _)| path.segments.last())
            .map(|seg| seg.ident.to_string())
            .collect()
    }

    #[test]
    fn generates_builder_impls() {
        let s = gen(quote! { pub UserQuery, User });
        assert!(s.contains("pub struct UserQuery"));

        let traits = implemented_traits(quote! { pub UserQuery, User });
        assert_eq!(
            traits,
            vec!["QueryBuilder", "ModelQueryExt", "From", "Default", "Debug"]
        );
    }

    #[test]
    fn accepts_paths_and_trailing_comma() {
        let s = gen(quote! { OrderQuery, crate::entities::Order, });
        assert!(s.contains("struct OrderQuery"));
        assert!(!s.contains("pub struct"));
        assert!(s.contains("EntityQuery < crate :: entities :: Order >"));
    }

    #[test]
    fn rejects_missing_entity() {
        assert!(syn::parse2::<ModelQueryInput>(quote! { UserQuery }).is_err());
    }
}
