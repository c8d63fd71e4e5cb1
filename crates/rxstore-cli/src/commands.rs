//! Command handlers for the CLI.
//!
//! Each handler prints JSON (or a bare query string) to stdout. Logging goes
//! to stderr, installed by `main` before any handler runs.

use rxstore_client::{
    load_recently_viewed, JsonFileStore, RouteResolver, StateStore, StoreKey, StorefrontClient,
};
use rxstore_core::compose::DEFAULT_PAGE_SIZE;
use rxstore_core::{AppConfig, FilterState, FilterValue, RouteSession, SortOption};

/// Arguments for `resolve`, borrowed from the parsed CLI.
pub(crate) struct ResolveRequest<'a> {
    pub path: &'a str,
    pub filters: &'a [(String, String)],
    pub sort: Option<SortOption>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub pending: bool,
}

/// Builds a filter state from CLI arguments. Sort is applied before the page
/// so an explicit `--page` survives the sort's page reset.
pub(crate) fn build_filter_state(
    default_page_size: u32,
    filters: &[(String, String)],
    sort: Option<SortOption>,
    page: Option<u32>,
    page_size: Option<u32>,
) -> anyhow::Result<FilterState> {
    if let Some(size) = page_size {
        anyhow::ensure!(size > 0, "--page-size must be at least 1");
    }
    let mut state = FilterState::new(page_size.unwrap_or(default_page_size));
    for (key, value) in filters {
        state.set(key, FilterValue::parse(value))?;
    }
    if let Some(sort) = sort {
        sort.apply(&mut state);
        state.page = 1;
    }
    if let Some(page) = page {
        anyhow::ensure!(page > 0, "--page must be at least 1");
        state.page = page;
    }
    Ok(state)
}

/// Canonical query string for the given filters; no config or network needed.
pub(crate) fn build_query(
    filters: &[(String, String)],
    sort: Option<SortOption>,
    page: Option<u32>,
    page_size: Option<u32>,
    include_pagination: bool,
) -> anyhow::Result<String> {
    let state = build_filter_state(DEFAULT_PAGE_SIZE, filters, sort, page, page_size)?;
    Ok(state.to_query_string(include_pagination))
}

/// Resolve a path and print the resulting render plan.
///
/// # Errors
///
/// Returns an error if the filters are invalid or the client cannot be
/// built. Fetch failures are not errors here: they print as a `loadFailed`
/// plan.
pub(crate) async fn run_resolve(
    config: &AppConfig,
    request: &ResolveRequest<'_>,
) -> anyhow::Result<()> {
    let state = build_filter_state(
        config.default_page_size,
        request.filters,
        request.sort,
        request.page,
        request.page_size,
    )?;
    let mut session = RouteSession::new(request.path, config.default_page_size);
    session.replace_filters(state);

    let client = StorefrontClient::from_config(config)
        .map_err(|e| anyhow::anyhow!("failed to build storefront client: {e}"))?;
    let resolver = RouteResolver::new(client, config.compose_settings())
        .with_store(JsonFileStore::new(&config.state_path));

    if request.pending {
        let plan = resolver.pending_plan(request.path, session.filters()).await;
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    let resolution = resolver.resolve_session(&session).await;
    let key = resolution.key.clone();
    let plan = resolution
        .into_current(&session)
        .ok_or_else(|| anyhow::anyhow!("resolution for {key} no longer matches the session"))?;
    println!("{}", serde_json::to_string_pretty(&plan)?);
    Ok(())
}

/// Fetch and print the dynamic filter groups for a category slug.
///
/// # Errors
///
/// Returns an error if the client cannot be built or the fetch fails.
pub(crate) async fn run_filters(config: &AppConfig, slug: &str) -> anyhow::Result<()> {
    let client = StorefrontClient::from_config(config)
        .map_err(|e| anyhow::anyhow!("failed to build storefront client: {e}"))?;
    let filters = client.fetch_dynamic_filters(slug).await?;
    println!("{}", serde_json::to_string_pretty(filters.as_ref())?);
    Ok(())
}

/// Print, or clear, the recently viewed list.
///
/// # Errors
///
/// Returns an error if the state file cannot be read or written.
pub(crate) async fn run_recent(config: &AppConfig, clear: bool) -> anyhow::Result<()> {
    let store = JsonFileStore::new(&config.state_path);
    if clear {
        store.clear(StoreKey::RecentlyViewed).await?;
        tracing::info!(path = %store.path().display(), "recently viewed cleared");
        return Ok(());
    }
    let recent = load_recently_viewed(&store).await?;
    println!("{}", serde_json::to_string_pretty(&recent)?);
    Ok(())
}

#[cfg(test)]
#[path = "commands_test.rs"]
mod tests;
