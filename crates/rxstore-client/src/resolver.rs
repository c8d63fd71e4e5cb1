//! Route resolution: fetch, classify, compose, plan.
//!
//! The main fetch and, for category listings, the dynamic-filters fetch run
//! concurrently. A failed filters fetch only empties the sidebar; a failed
//! main fetch becomes [`RenderPlan::LoadFailed`].

use std::sync::Arc;

use rxstore_core::{
    guess_pending_shape, plan_failed, plan_nested, plan_pending, plan_root, should_fetch_filters,
    ComposeSettings, FilterState, FiltersResponse, PlanInput, Product, RenderPlan, RequestKey,
    RoutePath, RouteSession, ShapeTag,
};

use crate::client::StorefrontClient;
use crate::store::{record_recently_viewed, MemoryStore, StateStore};

const LOAD_FAILED_MESSAGE: &str = "Could not load this page. Please try again.";

/// A plan together with the request it answers.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub key: RequestKey,
    pub plan: RenderPlan,
}

impl Resolution {
    /// The plan, unless the session has since moved to another request.
    #[must_use]
    pub fn into_current(self, session: &RouteSession) -> Option<RenderPlan> {
        if session.is_current(&self.key) {
            Some(self.plan)
        } else {
            tracing::debug!(key = %self.key, "dropping stale resolution");
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RouteKind {
    Root,
    Nested,
}

pub struct RouteResolver<S = MemoryStore> {
    client: StorefrontClient,
    settings: ComposeSettings,
    store: Option<S>,
}

impl RouteResolver<MemoryStore> {
    /// A resolver without a state store; product views are not recorded.
    #[must_use]
    pub fn new(client: StorefrontClient, settings: ComposeSettings) -> Self {
        Self {
            client,
            settings,
            store: None,
        }
    }
}

impl<S: StateStore> RouteResolver<S> {
    /// Attaches a store that receives recently viewed products.
    #[must_use]
    pub fn with_store<T: StateStore>(self, store: T) -> RouteResolver<T> {
        RouteResolver {
            client: self.client,
            settings: self.settings,
            store: Some(store),
        }
    }

    #[must_use]
    pub fn client(&self) -> &StorefrontClient {
        &self.client
    }

    #[must_use]
    pub fn store(&self) -> Option<&S> {
        self.store.as_ref()
    }

    /// Skeleton to show before the main fetch completes. Consults the cache
    /// only; never touches the network.
    pub async fn pending_plan(&self, path: &str, filters: &FilterState) -> RenderPlan {
        let route = RoutePath::parse(path);
        let key = RequestKey::new(&route, filters);
        let cached = self.client.cached_route(&key).await;
        plan_pending(&route, cached.as_deref(), &self.settings)
    }

    /// Resolves any path: single segments as category roots, deeper paths
    /// through the nested resolver.
    pub async fn resolve(&self, path: &str, filters: &FilterState) -> Resolution {
        let route = RoutePath::parse(path);
        let kind = if route.is_root_path() {
            RouteKind::Root
        } else {
            RouteKind::Nested
        };
        self.run(route, filters, kind).await
    }

    /// Resolves the session's current route and filters.
    pub async fn resolve_session(&self, session: &RouteSession) -> Resolution {
        self.resolve(&session.route().to_string(), session.filters())
            .await
    }

    /// Resolves a route of two or more segments. Anything shorter yields
    /// [`RenderPlan::Nothing`].
    pub async fn resolve_nested(&self, path: &str, filters: &FilterState) -> Resolution {
        self.run(RoutePath::parse(path), filters, RouteKind::Nested)
            .await
    }

    /// Resolves a single-segment category listing, including the over-limit
    /// view. Anything else yields [`RenderPlan::Nothing`].
    pub async fn resolve_root(&self, slug: &str, filters: &FilterState) -> Resolution {
        self.run(RoutePath::parse(slug), filters, RouteKind::Root)
            .await
    }

    async fn run(&self, route: RoutePath, filters: &FilterState, kind: RouteKind) -> Resolution {
        let key = RequestKey::new(&route, filters);
        let routable = match kind {
            RouteKind::Root => route.is_root_path(),
            RouteKind::Nested => route.is_valid_nested_path(),
        };
        if !routable {
            return Resolution {
                key,
                plan: RenderPlan::Nothing,
            };
        }

        let guess = match kind {
            RouteKind::Root => ShapeTag::CategoryCollection,
            RouteKind::Nested => guess_pending_shape(
                self.client.cached_route(&key).await.as_deref(),
                route.len(),
                self.settings.detail_depth_threshold,
            ),
        };
        let slug = route.last_segment().unwrap_or_default();

        let (main, prefetched) = if should_fetch_filters(guess) {
            let (main, sidebar) = tokio::join!(
                self.client.fetch_route(&route, filters),
                self.fetch_filters(slug)
            );
            (main, Some(sidebar))
        } else {
            (self.client.fetch_route(&route, filters).await, None)
        };

        let response = match main {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(key = %key, error = %err, "main fetch failed");
                return Resolution {
                    plan: plan_failed(key.clone(), LOAD_FAILED_MESSAGE),
                    key,
                };
            }
        };

        let filters_response = if should_fetch_filters(response.tag()) {
            match prefetched {
                Some(sidebar) => sidebar,
                None => self.fetch_filters(slug).await,
            }
        } else {
            None
        };

        let input = PlanInput {
            route: &route,
            response: response.as_ref(),
            filters_response: filters_response.as_deref(),
            state: filters,
            settings: &self.settings,
        };
        let plan = match kind {
            RouteKind::Root => plan_root(&input),
            RouteKind::Nested => plan_nested(&input),
        };

        if let RenderPlan::Detail(props) = &plan {
            self.record_view(&props.product, &route).await;
        }
        tracing::info!(
            key = %key,
            guessed = ?guess,
            shape = ?response.tag(),
            view = view_name(&plan),
            "route resolved"
        );
        Resolution { key, plan }
    }

    async fn fetch_filters(&self, slug: &str) -> Option<Arc<FiltersResponse>> {
        match self.client.fetch_dynamic_filters(slug).await {
            Ok(filters) => Some(filters),
            Err(err) => {
                tracing::warn!(slug, error = %err, "dynamic filters unavailable, sidebar left empty");
                None
            }
        }
    }

    async fn record_view(&self, product: &Product, route: &RoutePath) {
        let Some(store) = &self.store else {
            return;
        };
        if let Err(err) = record_recently_viewed(store, product, &route.to_string()).await {
            tracing::warn!(product_id = product.id, error = %err, "failed to record recently viewed product");
        }
    }
}

fn view_name(plan: &RenderPlan) -> &'static str {
    match plan {
        RenderPlan::Nothing => "nothing",
        RenderPlan::Loading { .. } => "loading",
        RenderPlan::Detail(_) => "detail",
        RenderPlan::Listing(_) => "listing",
        RenderPlan::Empty(_) => "empty",
        RenderPlan::OverLimit(_) => "over_limit",
        RenderPlan::LoadFailed { .. } => "load_failed",
    }
}
