use std::net::SocketAddr;

use axum::{Json, Router, http::StatusCode, routing::post};
use base64::Engine;
use image::ImageEncoder;
use image::codecs::png::PngEncoder;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use wavereach::config::Params;
use wavereach::grid::Pos;
use wavereach::problem;
use wavereach::render;

#[derive(Deserialize)]
struct SolveRequest {
    seed: Option<u64>,
    trace_path: Option<bool>,
    /// Any subset of the tunable parameters; the rest keep their defaults.
    #[serde(default)]
    params: Params,
}

#[derive(Serialize)]
struct SolveResponse {
    result: i64,
    steps: usize,
    origin: Pos,
    target: Pos,
    path: Option<Vec<Pos>>,
    timings: Vec<TimingEntry>,
    frame: String,
    size: usize,
}

#[derive(Serialize)]
struct TimingEntry {
    name: String,
    ms: f64,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, err: impl std::fmt::Display) -> ApiError {
    (status, Json(ErrorResponse { error: err.to_string() }))
}

fn encode_png(rgba: &[u8], n: usize) -> Result<String, image::ImageError> {
    let mut buf = Vec::new();
    PngEncoder::new(&mut buf).write_image(rgba, n as u32, n as u32, image::ExtendedColorType::Rgba8)?;
    let b64 = base64::engine::general_purpose::STANDARD.encode(&buf);
    Ok(format!("data:image/png;base64,{}", b64))
}

fn solve(seed: u64, trace_path: bool, params: &Params) -> Result<SolveResponse, ApiError> {
    let prob = problem::generate(seed, params);
    let solved = wavereach::solve_full(&prob, params, trace_path)
        .map_err(|e| api_error(StatusCode::UNPROCESSABLE_ENTITY, e))?;
    let outcome = solved.outcome;
    let timings = solved.timings;

    let rgba = render::render_frame(&solved.sim.frame(outcome.path.as_deref()), params);
    let frame = encode_png(&rgba, params.grid_size)
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e))?;

    Ok(SolveResponse {
        result: outcome.result_code(),
        steps: outcome.steps,
        origin: prob.origin,
        target: prob.target,
        path: outcome.path,
        timings: timings
            .iter()
            .map(|t| TimingEntry {
                name: t.name.to_string(),
                ms: t.ms,
            })
            .collect(),
        frame,
        size: params.grid_size,
    })
}

async fn solve_handler(Json(req): Json<SolveRequest>) -> Result<Json<SolveResponse>, ApiError> {
    let seed = req.seed.unwrap_or(42);
    let trace_path = req.trace_path.unwrap_or(false);
    let params = req.params;
    params
        .validate()
        .and_then(|()| if trace_path { params.validate_trace() } else { Ok(()) })
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e))?;

    let response = tokio::task::spawn_blocking(move || solve(seed, trace_path, &params))
        .await
        .map_err(|e| {
            error!(error = %e, "solver task failed");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, e)
        })??;

    Ok(Json(response))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let app = Router::new()
        .route("/api/solve", post(solve_handler))
        .layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    info!("wavereach server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
