//! What a route should render, assembled from the classified response.

use serde::Serialize;

use crate::catalog::{DynamicFilterGroup, FiltersResponse, Product, ProductCollection};
use crate::classify::{guess_pending_shape, ClassifiedResponse};
use crate::compose::{
    compose_category_display, is_over_limit, CategoryDisplayInfo, ComposeInput, ComposeSettings,
};
use crate::filters::{ActiveFilter, FilterState};
use crate::route::RoutePath;
use crate::session::RequestKey;
use crate::sort::SortOption;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Skeleton {
    Detail,
    Listing,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailProps {
    pub product: Product,
    pub category: CategoryDisplayInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingProps {
    pub path: String,
    pub category: CategoryDisplayInfo,
    pub products: Vec<Product>,
    pub count: u64,
    pub total_pages: u64,
    pub filter_groups: Vec<DynamicFilterGroup>,
    pub active_filters: Vec<ActiveFilter>,
    pub active_filter_count: usize,
    pub filters: FilterState,
    pub sort: SortOption,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverLimitProps {
    pub category: CategoryDisplayInfo,
    pub product_count: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "view", rename_all = "camelCase")]
pub enum RenderPlan {
    /// The path belongs to another resolver; render nothing.
    Nothing,
    Loading {
        skeleton: Skeleton,
    },
    Detail(DetailProps),
    Listing(ListingProps),
    /// A listing that loaded fine but has no products.
    Empty(ListingProps),
    /// Root category too large to list; show subcategories only.
    OverLimit(OverLimitProps),
    LoadFailed {
        message: String,
        retry: RequestKey,
    },
}

/// Inputs shared by the nested and root planners.
#[derive(Debug, Clone, Copy)]
pub struct PlanInput<'a> {
    pub route: &'a RoutePath,
    pub response: &'a ClassifiedResponse,
    pub filters_response: Option<&'a FiltersResponse>,
    pub state: &'a FilterState,
    pub settings: &'a ComposeSettings,
}

/// Skeleton to show while the main request is in flight.
#[must_use]
pub fn plan_pending(
    route: &RoutePath,
    cached: Option<&ClassifiedResponse>,
    settings: &ComposeSettings,
) -> RenderPlan {
    if route.is_root_path() {
        return RenderPlan::Loading {
            skeleton: Skeleton::Listing,
        };
    }
    if !route.is_valid_nested_path() {
        return RenderPlan::Nothing;
    }
    let shape = guess_pending_shape(cached, route.len(), settings.detail_depth_threshold);
    let skeleton = if shape.is_listing() {
        Skeleton::Listing
    } else {
        Skeleton::Detail
    };
    RenderPlan::Loading { skeleton }
}

/// Plan for a nested (two or more segment) route.
#[must_use]
pub fn plan_nested(input: &PlanInput<'_>) -> RenderPlan {
    if !input.route.is_valid_nested_path() {
        return RenderPlan::Nothing;
    }
    match input.response {
        ClassifiedResponse::Detail(product) => detail(input, product),
        ClassifiedResponse::Collection(c) | ClassifiedResponse::CategoryCollection(c) => {
            listing(input, c)
        }
    }
}

/// Plan for a single-segment category root, including the over-limit view.
#[must_use]
pub fn plan_root(input: &PlanInput<'_>) -> RenderPlan {
    if !input.route.is_root_path() {
        return RenderPlan::Nothing;
    }
    match input.response {
        ClassifiedResponse::Detail(product) => detail(input, product),
        ClassifiedResponse::Collection(c) | ClassifiedResponse::CategoryCollection(c) => {
            if is_over_limit(
                Some(input.response),
                input.filters_response,
                input.settings.over_limit_product_count,
            ) {
                let category = display(input, listing_slug(input.route));
                let product_count = c
                    .product_count
                    .or_else(|| input.filters_response.and_then(|f| f.product_count));
                RenderPlan::OverLimit(OverLimitProps {
                    category,
                    product_count,
                })
            } else {
                listing(input, c)
            }
        }
    }
}

/// Failed main fetch, carrying the key needed for a manual retry.
#[must_use]
pub fn plan_failed(key: RequestKey, message: impl Into<String>) -> RenderPlan {
    RenderPlan::LoadFailed {
        message: message.into(),
        retry: key,
    }
}

fn display(input: &PlanInput<'_>, category_slug: &str) -> CategoryDisplayInfo {
    compose_category_display(&ComposeInput {
        response: Some(input.response),
        filters: input.filters_response,
        category_slug,
        route: input.route,
    })
}

/// A listing route names its own category in the last segment.
fn listing_slug(route: &RoutePath) -> &str {
    route.last_segment().unwrap_or_default()
}

/// A product route's category is the segment before the product slug.
fn detail_slug(route: &RoutePath) -> &str {
    let segments = route.segments();
    match segments.len() {
        0 => "",
        1 => segments[0].as_str(),
        n => segments[n - 2].as_str(),
    }
}

fn detail(input: &PlanInput<'_>, product: &Product) -> RenderPlan {
    RenderPlan::Detail(DetailProps {
        product: product.clone(),
        category: display(input, detail_slug(input.route)),
    })
}

fn listing(input: &PlanInput<'_>, collection: &ProductCollection) -> RenderPlan {
    let sort = SortOption::from_state(input.state);
    let mut products = collection.results.clone();
    sort.apply_client_side(&mut products, collection.ordering.as_deref());

    let filter_groups = input
        .filters_response
        .map(|f| f.filters.clone())
        .unwrap_or_default();
    let active_filters = input.state.active_filters(&filter_groups);
    let page_size = u64::from(input.state.page_size.max(1));

    let props = ListingProps {
        path: input.route.to_string(),
        category: display(input, listing_slug(input.route)),
        count: collection.count,
        total_pages: collection.count.div_ceil(page_size),
        active_filter_count: active_filters.len(),
        active_filters,
        filter_groups,
        filters: input.state.clone(),
        sort,
        products,
    };

    if props.products.is_empty() {
        RenderPlan::Empty(props)
    } else {
        RenderPlan::Listing(props)
    }
}
