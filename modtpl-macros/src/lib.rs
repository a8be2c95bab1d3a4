use proc_macro::TokenStream;

mod assets;

/// Embeds every template set matching a glob pattern (relative to the calling
/// crate's `Cargo.toml`) and registers them with `modtpl::template_loader`
/// before `main` runs.
///
/// ```ignore
/// modtpl::template_assets!("templates/**/*.xml");
/// ```
#[proc_macro]
pub fn template_assets(input: TokenStream) -> TokenStream {
    assets::template_assets_impl(input)
}
