//! Response-shape classification at the API boundary.
//!
//! The catch-all route has no discriminant field, so the payload is parsed
//! once here into [`ClassifiedResponse`] by key presence and the rest of the
//! crate only ever matches on the enum.

use serde::Serialize;

use crate::catalog::{Product, ProductCollection};
use crate::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ShapeTag {
    Detail,
    Collection,
    CategoryCollection,
}

impl ShapeTag {
    /// Any listing shape: a plain collection or a category collection.
    #[must_use]
    pub fn is_listing(self) -> bool {
        matches!(self, ShapeTag::Collection | ShapeTag::CategoryCollection)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "shape", content = "payload", rename_all = "camelCase")]
pub enum ClassifiedResponse {
    Detail(Product),
    Collection(ProductCollection),
    CategoryCollection(ProductCollection),
}

impl ClassifiedResponse {
    #[must_use]
    pub fn tag(&self) -> ShapeTag {
        match self {
            ClassifiedResponse::Detail(_) => ShapeTag::Detail,
            ClassifiedResponse::Collection(_) => ShapeTag::Collection,
            ClassifiedResponse::CategoryCollection(_) => ShapeTag::CategoryCollection,
        }
    }

    /// The listing envelope for either collection shape.
    #[must_use]
    pub fn as_collection(&self) -> Option<&ProductCollection> {
        match self {
            ClassifiedResponse::Detail(_) => None,
            ClassifiedResponse::Collection(c) | ClassifiedResponse::CategoryCollection(c) => {
                Some(c)
            }
        }
    }

    /// Only a category collection; a plain collection yields `None`.
    #[must_use]
    pub fn as_category_collection(&self) -> Option<&ProductCollection> {
        match self {
            ClassifiedResponse::CategoryCollection(c) => Some(c),
            _ => None,
        }
    }
}

/// Tags a raw payload by key presence alone.
///
/// 1. no `results` key: [`ShapeTag::Detail`]
/// 2. `categoryName` key present: [`ShapeTag::CategoryCollection`]
/// 3. otherwise: [`ShapeTag::Collection`]
///
/// # Errors
///
/// Returns [`CoreError::NotAnObject`] when the payload is not a JSON object.
pub fn shape_of(payload: &serde_json::Value) -> Result<ShapeTag, CoreError> {
    let object = payload.as_object().ok_or(CoreError::NotAnObject)?;
    if !object.contains_key("results") {
        Ok(ShapeTag::Detail)
    } else if object.contains_key("categoryName") {
        Ok(ShapeTag::CategoryCollection)
    } else {
        Ok(ShapeTag::Collection)
    }
}

/// Classifies and parses a raw payload into the matching variant.
///
/// # Errors
///
/// - [`CoreError::NotAnObject`] when the payload is not a JSON object.
/// - [`CoreError::Deserialize`] when the payload has the keys of a shape but
///   its fields do not parse.
pub fn classify(payload: serde_json::Value) -> Result<ClassifiedResponse, CoreError> {
    let tag = shape_of(&payload)?;
    let context = |what: &str| format!("{what} response");
    match tag {
        ShapeTag::Detail => serde_json::from_value(payload)
            .map(ClassifiedResponse::Detail)
            .map_err(|source| CoreError::Deserialize {
                context: context("product detail"),
                source,
            }),
        ShapeTag::Collection => serde_json::from_value(payload)
            .map(ClassifiedResponse::Collection)
            .map_err(|source| CoreError::Deserialize {
                context: context("collection"),
                source,
            }),
        ShapeTag::CategoryCollection => serde_json::from_value(payload)
            .map(ClassifiedResponse::CategoryCollection)
            .map_err(|source| CoreError::Deserialize {
                context: context("category collection"),
                source,
            }),
    }
}

/// Picks a shape while the main request is still in flight.
///
/// A cached response for the same request wins. Without one, paths deeper
/// than `detail_depth_threshold` segments are guessed to be products and
/// everything else a category listing. The depth guess is best effort only.
#[must_use]
pub fn guess_pending_shape(
    cached: Option<&ClassifiedResponse>,
    segment_count: usize,
    detail_depth_threshold: usize,
) -> ShapeTag {
    match cached {
        Some(response) => response.tag(),
        None if segment_count > detail_depth_threshold => ShapeTag::Detail,
        None => ShapeTag::CategoryCollection,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payload_without_results_is_detail() {
        let payload = json!({"id": 42, "medicine": {"form": "tablet"}, "price_value": 150_000});
        assert_eq!(shape_of(&payload).unwrap(), ShapeTag::Detail);
        match classify(payload).unwrap() {
            ClassifiedResponse::Detail(product) => assert_eq!(product.id, 42),
            other => panic!("expected detail, got {other:?}"),
        }
    }

    #[test]
    fn payload_with_results_is_never_detail() {
        for payload in [
            json!({"results": []}),
            json!({"results": [], "categoryName": "Làm đẹp"}),
            json!({"results": null, "id": 7}),
        ] {
            assert_ne!(shape_of(&payload).unwrap(), ShapeTag::Detail, "{payload}");
        }
    }

    #[test]
    fn category_name_key_marks_category_collection() {
        let payload = json!({
            "count": 5,
            "results": [{"id": 1}, {"id": 2}],
            "categoryName": "Làm đẹp"
        });
        let classified = classify(payload).unwrap();
        assert_eq!(classified.tag(), ShapeTag::CategoryCollection);
        let collection = classified.as_category_collection().unwrap();
        assert_eq!(collection.category_name.as_deref(), Some("Làm đẹp"));
        assert_eq!(collection.results.len(), 2);
    }

    #[test]
    fn plain_collection_has_no_category_view() {
        let classified = classify(json!({"count": 0, "results": []})).unwrap();
        assert_eq!(classified.tag(), ShapeTag::Collection);
        assert!(classified.as_category_collection().is_none());
        assert!(classified.as_collection().is_some());
    }

    #[test]
    fn non_object_payload_is_rejected() {
        assert!(matches!(
            classify(json!([1, 2, 3])),
            Err(CoreError::NotAnObject)
        ));
    }

    #[test]
    fn non_array_results_read_as_empty_page() {
        for payload in [
            json!({"results": null, "categoryName": "X"}),
            json!({"results": "nope"}),
        ] {
            let classified = classify(payload.clone()).unwrap();
            assert!(classified.tag().is_listing(), "{payload}");
            assert!(classified.as_collection().unwrap().results.is_empty());
        }
    }

    #[test]
    fn malformed_crumb_does_not_fail_the_listing() {
        let classified = classify(json!({
            "categoryName": "Làm đẹp",
            "results": [
                {"id": 1},
                {"id": 2, "category_info": {"category": [{"name": "Thuốc"}]}}
            ]
        }))
        .unwrap();
        let collection = classified.as_category_collection().unwrap();
        assert_eq!(collection.results.len(), 2);
        assert!(collection.results[1].category_chain().is_empty());
    }

    #[test]
    fn detail_without_id_fails_to_parse() {
        let result = classify(json!({"name": "no id"}));
        assert!(matches!(result, Err(CoreError::Deserialize { .. })));
    }

    #[test]
    fn pending_guess_prefers_cached_shape() {
        let cached = classify(json!({"results": [], "categoryName": "x"})).unwrap();
        assert_eq!(
            guess_pending_shape(Some(&cached), 6, 3),
            ShapeTag::CategoryCollection
        );
        let cached = classify(json!({"id": 1})).unwrap();
        assert_eq!(guess_pending_shape(Some(&cached), 2, 3), ShapeTag::Detail);
    }

    #[test]
    fn pending_guess_depth_boundary() {
        assert_eq!(
            guess_pending_shape(None, 3, 3),
            ShapeTag::CategoryCollection
        );
        assert_eq!(guess_pending_shape(None, 4, 3), ShapeTag::Detail);
    }
}
