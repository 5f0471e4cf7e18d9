//! Scrape endpoints.
//!
//! Each handler binds the request to a fresh [`ScrapeContext`], runs one
//! collector to completion, renders the resulting registry, and logs a
//! completion event. Degraded scrapes (node down, no plan, ...) are still
//! `200 OK`; only exporter defects turn into `500`.

use std::time::Duration;

use axum::{
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::{Instrument, error, info};

use chain::{Collector, ScrapeContext, ScrapeError, render};

use crate::state::SharedState;

/// [`ScrapeError`] as an HTTP response.
#[derive(Debug)]
pub struct ScrapeFailure(pub ScrapeError);

impl IntoResponse for ScrapeFailure {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("failed to collect metrics: {}", self.0),
        )
            .into_response()
    }
}

/// `GET /metrics/proposals`
pub async fn proposals(State(state): State<SharedState>) -> Result<Response, ScrapeFailure> {
    dispatch(&state.proposals, state.scrape_timeout).await
}

/// `GET /metrics/upgrade`
pub async fn upgrade(State(state): State<SharedState>) -> Result<Response, ScrapeFailure> {
    dispatch(&state.upgrade, state.scrape_timeout).await
}

async fn dispatch<C: Collector>(
    collector: &C,
    scrape_timeout: Duration,
) -> Result<Response, ScrapeFailure> {
    let ctx = ScrapeContext::new(collector.endpoint(), scrape_timeout);

    let rendered = async {
        let registry = collector.collect(&ctx).await?;
        render(&registry)
    }
    .instrument(ctx.span().clone())
    .await;

    let request_time = ctx.elapsed().as_secs_f64();
    let exposition = match rendered {
        Ok(exposition) => exposition,
        Err(err) => {
            error!(
                parent: ctx.span(),
                method = "GET",
                endpoint = ctx.endpoint(),
                request_time,
                error = %err,
                "scrape aborted"
            );
            return Err(ScrapeFailure(err));
        }
    };

    info!(
        parent: ctx.span(),
        method = "GET",
        endpoint = ctx.endpoint(),
        request_time,
        "request processed"
    );

    Ok((
        [(header::CONTENT_TYPE, exposition.content_type)],
        exposition.body,
    )
        .into_response())
}
