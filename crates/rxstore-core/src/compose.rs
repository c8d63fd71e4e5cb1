//! Category display data derived by priority fallback.
//!
//! The main listing response and the dynamic-filters response can arrive in
//! either order, or one may fail. Every derived field is therefore resolved by
//! trying an ordered list of pure sources and taking the first that yields
//! something, ending with a source that only needs the slug.

use serde::Serialize;

use crate::catalog::{CategoryCrumb, FiltersResponse, Product, ProductCollection, Subcategory};
use crate::classify::{ClassifiedResponse, ShapeTag};
use crate::route::{humanize_slug, RoutePath};

pub const DEFAULT_OVER_LIMIT_PRODUCT_COUNT: u64 = 1000;
pub const DEFAULT_DETAIL_DEPTH_THRESHOLD: usize = 3;
pub const DEFAULT_PAGE_SIZE: u32 = 12;

/// Thresholds the composer and pending heuristic read from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComposeSettings {
    pub over_limit_product_count: u64,
    pub detail_depth_threshold: usize,
    pub default_page_size: u32,
}

impl Default for ComposeSettings {
    fn default() -> Self {
        Self {
            over_limit_product_count: DEFAULT_OVER_LIMIT_PRODUCT_COUNT,
            detail_depth_threshold: DEFAULT_DETAIL_DEPTH_THRESHOLD,
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Breadcrumb {
    pub label: String,
    pub slug: String,
    /// Accumulated slug path up to and including this crumb, e.g. `a/b`.
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryDisplayInfo {
    pub category_name: String,
    pub subcategories: Vec<Subcategory>,
    pub breadcrumbs: Vec<Breadcrumb>,
}

/// Everything the sources may look at.
#[derive(Debug, Clone, Copy)]
pub struct ComposeInput<'a> {
    pub response: Option<&'a ClassifiedResponse>,
    pub filters: Option<&'a FiltersResponse>,
    pub category_slug: &'a str,
    pub route: &'a RoutePath,
}

impl<'a> ComposeInput<'a> {
    fn category_collection(&self) -> Option<&'a ProductCollection> {
        self.response.and_then(ClassifiedResponse::as_category_collection)
    }

    /// Products visible in the response: the listing results, or the single
    /// product of a detail response.
    fn products(&self) -> &'a [Product] {
        match self.response {
            Some(ClassifiedResponse::Detail(product)) => std::slice::from_ref(product),
            Some(ClassifiedResponse::Collection(c) | ClassifiedResponse::CategoryCollection(c)) => {
                &c.results
            }
            None => &[],
        }
    }

    /// The first non-empty authoritative category chain among the products.
    fn category_chain(&self) -> Option<&'a [CategoryCrumb]> {
        self.products()
            .iter()
            .map(Product::category_chain)
            .find(|chain| !chain.is_empty())
    }
}

type Source<T> = fn(&ComposeInput<'_>) -> Option<T>;

const CATEGORY_NAME_SOURCES: &[Source<String>] = &[
    name_from_category_collection,
    name_from_filters,
    name_from_product_categories,
    name_from_slug,
];

const SUBCATEGORY_SOURCES: &[Source<Vec<Subcategory>>] =
    &[subcategories_from_category_collection, subcategories_from_filters];

const BREADCRUMB_SOURCES: &[Source<Vec<Breadcrumb>>] =
    &[breadcrumbs_from_product_categories, breadcrumbs_from_route];

fn first_resolved<T>(sources: &[Source<T>], input: &ComposeInput<'_>) -> Option<T> {
    sources.iter().find_map(|source| source(input))
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

fn name_from_category_collection(input: &ComposeInput<'_>) -> Option<String> {
    non_blank(input.category_collection()?.category_name.as_deref())
}

fn name_from_filters(input: &ComposeInput<'_>) -> Option<String> {
    non_blank(input.filters?.category_name.as_deref())
}

fn name_from_product_categories(input: &ComposeInput<'_>) -> Option<String> {
    non_blank(input.category_chain()?.last().map(|crumb| crumb.name.as_str()))
}

fn name_from_slug(input: &ComposeInput<'_>) -> Option<String> {
    non_blank(Some(humanize_slug(input.category_slug).as_str()))
}

fn subcategories_from_category_collection(input: &ComposeInput<'_>) -> Option<Vec<Subcategory>> {
    collection_subcategories(input.response).map(<[Subcategory]>::to_vec)
}

fn subcategories_from_filters(input: &ComposeInput<'_>) -> Option<Vec<Subcategory>> {
    filters_subcategories(input.filters).map(<[Subcategory]>::to_vec)
}

/// Only a category collection lists subcategories; a plain collection's
/// array is never shown.
fn collection_subcategories(response: Option<&ClassifiedResponse>) -> Option<&[Subcategory]> {
    response?
        .as_category_collection()?
        .subcategories
        .as_deref()
}

fn filters_subcategories(filters: Option<&FiltersResponse>) -> Option<&[Subcategory]> {
    filters?.subcategories.as_deref()
}

/// Whether the composed subcategory list will be non-empty. Follows the same
/// priority as [`SUBCATEGORY_SOURCES`], so an empty array on the category
/// collection hides the filters' list here too.
fn lists_subcategories(
    response: Option<&ClassifiedResponse>,
    filters: Option<&FiltersResponse>,
) -> bool {
    collection_subcategories(response)
        .or_else(|| filters_subcategories(filters))
        .is_some_and(|s| !s.is_empty())
}

fn breadcrumbs_from_product_categories(input: &ComposeInput<'_>) -> Option<Vec<Breadcrumb>> {
    let chain = input.category_chain()?;
    let depth = input.route.len().min(chain.len());
    Some(accumulate(
        chain[..depth]
            .iter()
            .map(|crumb| (crumb.name.clone(), crumb.slug.clone())),
    ))
}

fn breadcrumbs_from_route(input: &ComposeInput<'_>) -> Option<Vec<Breadcrumb>> {
    if input.route.is_empty() {
        return None;
    }
    Some(accumulate(
        input
            .route
            .segments()
            .iter()
            .map(|segment| (humanize_slug(segment), segment.clone())),
    ))
}

fn accumulate(levels: impl Iterator<Item = (String, String)>) -> Vec<Breadcrumb> {
    let mut path = String::new();
    levels
        .map(|(label, slug)| {
            if !path.is_empty() {
                path.push('/');
            }
            path.push_str(&slug);
            Breadcrumb {
                label,
                slug,
                path: path.clone(),
            }
        })
        .collect()
}

/// Derives name, subcategories and breadcrumbs from whatever is available.
///
/// Pure: identical inputs always give identical output. When no source
/// resolves, the raw slug text (or nothing) is used rather than failing.
#[must_use]
pub fn compose_category_display(input: &ComposeInput<'_>) -> CategoryDisplayInfo {
    CategoryDisplayInfo {
        category_name: first_resolved(CATEGORY_NAME_SOURCES, input)
            .unwrap_or_else(|| input.category_slug.to_owned()),
        subcategories: first_resolved(SUBCATEGORY_SOURCES, input).unwrap_or_default(),
        breadcrumbs: first_resolved(BREADCRUMB_SOURCES, input).unwrap_or_default(),
    }
}

/// Whether a root listing should show only its subcategories.
///
/// True when either response sets `overLimit`, or as a fallback for a backend
/// that omits the flag: more than `threshold` products, subcategories
/// indicated, and an empty `results` page. Subcategories are indicated by a
/// `hasSubcategories` flag or by the list the composer would display.
#[must_use]
pub fn is_over_limit(
    response: Option<&ClassifiedResponse>,
    filters: Option<&FiltersResponse>,
    threshold: u64,
) -> bool {
    let collection = response.and_then(ClassifiedResponse::as_collection);
    let flagged = collection.and_then(|c| c.over_limit) == Some(true)
        || filters.and_then(|f| f.over_limit) == Some(true);
    if flagged {
        return true;
    }

    let Some(collection) = collection else {
        return false;
    };
    let product_count = collection
        .product_count
        .or_else(|| filters.and_then(|f| f.product_count));
    let has_subcategories = collection.has_subcategories == Some(true)
        || filters.and_then(|f| f.has_subcategories) == Some(true)
        || lists_subcategories(response, filters);

    product_count.is_some_and(|n| n > threshold)
        && has_subcategories
        && collection.results.is_empty()
}

/// The dynamic-filters endpoint is only called for category listings. A
/// product page or a plain collection (search results) never needs it.
#[must_use]
pub fn should_fetch_filters(shape: ShapeTag) -> bool {
    shape == ShapeTag::CategoryCollection
}
