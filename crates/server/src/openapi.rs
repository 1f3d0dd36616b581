use utoipa::OpenApi;
use utoipa::ToSchema;

#[derive(ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

/// Wire shape of an attribute record.
#[derive(ToSchema)]
pub struct AttributesRecordDoc {
    pub urn: String,
    /// Any JSON value; stored verbatim.
    #[schema(value_type = Object)]
    pub data: serde_json::Value,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::attributes::get_attributes,
        crate::routes::attributes::create_attributes,
        crate::routes::attributes::replace_attributes,
    ),
    components(schemas(HealthResponse, AttributesRecordDoc)),
    tags(
        (name = "health", description = "Liveness"),
        (name = "attributes", description = "Custom attributes keyed by resource urn")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_attribute_paths() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/attributes"));
        assert!(doc.paths.paths.contains_key("/attributes/{urn}"));
        assert!(doc.paths.paths.contains_key("/health"));
    }
}
