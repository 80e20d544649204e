//! API server exposing the scan pipeline.

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::ScanRequest;
use crate::scan::SeoScanner;
use serde::Serialize;
use std::sync::Arc;
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

/// Error body matching the original front-end contract.
#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
}

const MISSING_FIELDS: &str = "Missing fields";
const INTERNAL_ERROR: &str = "Internal server error";

/// Start the API server.
pub(crate) async fn start_api_server(config: Arc<Config>, port: u16) -> Result<()> {
    let scanner = Arc::new(SeoScanner::new(config)?);
    let routes = routes(scanner);

    tracing::info!("Starting API server on port {}", port);
    warp::serve(routes).run(([0, 0, 0, 0], port)).await;

    Ok(())
}

fn routes(
    scanner: Arc<SeoScanner>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let scanner_filter = warp::any().map(move || scanner.clone());

    // Health check endpoint
    let health = warp::path("health")
        .and(warp::get())
        .map(|| warp::reply::json(&serde_json::json!({ "status": "ok" })));

    // Scan endpoint
    let scan = warp::path("seo-scan")
        .and(warp::post())
        .and(warp::body::json())
        .and(scanner_filter)
        .and_then(handle_scan);

    health
        .or(scan)
        .recover(handle_rejection)
        .with(warp::cors().allow_any_origin())
}

/// Handle a single scan request.
async fn handle_scan(
    request: ScanRequest,
    scanner: Arc<SeoScanner>,
) -> std::result::Result<impl Reply, Rejection> {
    tracing::info!(target: "api", "Scan requested for '{}'", request.url);

    match scanner.run_scan(&request).await {
        Ok(outcome) => Ok(warp::reply::with_status(
            warp::reply::json(&outcome.result),
            StatusCode::OK,
        )),
        Err(AppError::MissingFields) => Ok(warp::reply::with_status(
            warp::reply::json(&ErrorBody {
                error: MISSING_FIELDS,
            }),
            StatusCode::BAD_REQUEST,
        )),
        Err(e) => {
            tracing::error!(target: "api", "Scan failed unexpectedly: {}", e);
            Ok(warp::reply::with_status(
                warp::reply::json(&ErrorBody {
                    error: INTERNAL_ERROR,
                }),
                StatusCode::INTERNAL_SERVER_ERROR,
            ))
        }
    }
}

/// Handle API rejections, keeping the original error body shapes.
async fn handle_rejection(err: Rejection) -> std::result::Result<impl Reply, Rejection> {
    if err.is_not_found() {
        Ok(warp::reply::with_status(
            warp::reply::json(&ErrorBody { error: "Not Found" }),
            StatusCode::NOT_FOUND,
        ))
    } else if err
        .find::<warp::filters::body::BodyDeserializeError>()
        .is_some()
    {
        // An unreadable body carries no usable fields.
        Ok(warp::reply::with_status(
            warp::reply::json(&ErrorBody {
                error: MISSING_FIELDS,
            }),
            StatusCode::BAD_REQUEST,
        ))
    } else {
        tracing::error!(target: "api", "Unhandled rejection: {:?}", err);
        Ok(warp::reply::with_status(
            warp::reply::json(&ErrorBody {
                error: INTERNAL_ERROR,
            }),
            StatusCode::INTERNAL_SERVER_ERROR,
        ))
    }
}
