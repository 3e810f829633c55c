//! Geo response builder.
//!
//! Maps one inbound request to one rendered response. The whole pipeline runs
//! behind a single failure boundary: any `GeoError` becomes the
//! unexpected-failure outcome and never reaches the caller.

use crate::geo::error::GeoError;
use crate::geo::metadata::{self, ConnectionMetadata};
use crate::geo::response::{GeoOutcome, GeoResponse, GeoSuccess, Status};

/// The inputs the builder reads from a request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InboundRequest {
    /// `CF-Connecting-IP`, verbatim.
    pub client_ip: Option<String>,
    pub metadata: Option<ConnectionMetadata>,
    /// Correlation id for the error log line.
    pub request_id: Option<String>,
}

/// Geo fields as read from the metadata, already normalized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct GeoFields {
    country_code: Option<String>,
    timezone: Option<String>,
    isp: Option<String>,
    asn: Option<String>,
    region_name: Option<String>,
    region_code: Option<String>,
}

impl GeoFields {
    fn extract(metadata: &ConnectionMetadata) -> Result<Self, GeoError> {
        Ok(Self {
            country_code: metadata.string_field(metadata::COUNTRY)?,
            timezone: metadata.string_field(metadata::TIMEZONE)?,
            isp: metadata.string_field(metadata::AS_ORGANIZATION)?,
            asn: metadata.asn()?,
            region_name: metadata.string_field(metadata::REGION)?,
            region_code: metadata.string_field(metadata::REGION_CODE)?,
        })
    }
}

/// Network identity string for the `as` field.
///
/// `AS{asn} {isp}` when both are known, otherwise whichever one is.
pub fn synthesize_as(asn: Option<&str>, isp: Option<&str>) -> Option<String> {
    match (asn, isp) {
        (Some(asn), Some(isp)) => Some(format!("AS{asn} {isp}")),
        (None, Some(isp)) => Some(isp.to_string()),
        (Some(asn), None) => Some(format!("AS{asn}")),
        (None, None) => None,
    }
}

/// Build the response for one request. Infallible by construction.
pub fn build_response(request: InboundRequest) -> GeoResponse {
    let query = request.client_ip.filter(|ip| !ip.is_empty());

    match process(query.clone(), request.metadata.as_ref()) {
        Ok(response) => response,
        Err(err) => {
            tracing::error!(
                error = %err,
                request_id = request.request_id.as_deref().unwrap_or("-"),
                "Unexpected fault while building geo response"
            );
            GeoResponse::failure(query, err.to_string())
        }
    }
}

fn process(
    query: Option<String>,
    metadata: Option<&ConnectionMetadata>,
) -> Result<GeoResponse, GeoError> {
    let Some(metadata) = metadata else {
        tracing::info!(present = false, "Connection metadata missing");
        tracing::warn!(query = ?query, "Returning missing-metadata response");
        return GeoOutcome::missing_metadata(query).render();
    };

    tracing::info!(present = true, metadata = %metadata.content(), "Connection metadata present");

    let fields = GeoFields::extract(metadata)?;
    let as_name = synthesize_as(fields.asn.as_deref(), fields.isp.as_deref());

    let outcome = GeoOutcome::Success(GeoSuccess {
        query,
        status: Status::Success,
        country_code: fields.country_code,
        timezone: fields.timezone,
        isp: fields.isp,
        as_name,
        region_name: fields.region_name,
        region: fields.region_code,
    });
    let response = outcome.render()?;

    tracing::debug!("Geo response built");
    Ok(response)
}
