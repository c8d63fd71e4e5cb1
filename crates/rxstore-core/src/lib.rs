pub mod app_config;
pub mod catalog;
pub mod classify;
pub mod compose;
pub mod config;
pub mod filters;
pub mod plan;
pub mod recent;
pub mod route;
pub mod session;
pub mod sort;

pub use app_config::{AppConfig, Environment};
pub use catalog::{
    CategoryCrumb, CategoryInfo, DynamicFilterGroup, FilterKind, FilterOption, FiltersResponse,
    Product, ProductCollection, Subcategory,
};
pub use classify::{classify, guess_pending_shape, shape_of, ClassifiedResponse, ShapeTag};
pub use compose::{
    compose_category_display, is_over_limit, should_fetch_filters, Breadcrumb,
    CategoryDisplayInfo, ComposeInput, ComposeSettings,
};
pub use config::{load_app_config, load_app_config_from_env};
pub use filters::{ActiveFilter, ActiveFilterValue, FilterState, FilterValue};
pub use plan::{
    plan_failed, plan_nested, plan_pending, plan_root, DetailProps, ListingProps, OverLimitProps,
    PlanInput, RenderPlan, Skeleton,
};
pub use recent::{RecentlyViewed, RecentlyViewedEntry};
pub use route::RoutePath;
pub use session::{RequestKey, RouteSession};
pub use sort::SortOption;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("response payload is not a JSON object")]
    NotAnObject,

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid value for filter \"{key}\": {reason}")]
    InvalidFilter { key: String, reason: String },

    #[error("unknown sort option: {0}")]
    UnknownSort(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
