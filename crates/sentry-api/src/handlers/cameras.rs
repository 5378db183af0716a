//! Camera admin CRUD and lifecycle control.
//!
//! Out of spec.md's own scope ("REST shape" Non-goal), but present as
//! ambient scaffolding the orchestrator needs a caller for — mirrors the
//! teacher's `admin` handlers being present despite not being the product
//! of `vclip-media`/`vclip-worker` themselves.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use sentry_events::EventStore;
use sentry_models::{CameraId, CameraRecord, EffectivePipelineConfig};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateCameraRequest {
    pub name: String,
    pub device: String,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCameraRequest {
    pub name: Option<String>,
    pub events_enabled: Option<bool>,
    pub notifications_enabled: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub camera_id: CameraId,
    pub frames_captured: u64,
    pub frames_dropped: u64,
    pub current_fps: f64,
    pub detections_total: u64,
    pub avg_inference_ms: f64,
}

pub async fn list_cameras(State(state): State<AppState>) -> ApiResult<Json<Vec<CameraRecord>>> {
    Ok(Json(state.store.list_cameras().await?))
}

pub async fn create_camera(State(state): State<AppState>, Json(req): Json<CreateCameraRequest>) -> ApiResult<Json<CameraRecord>> {
    let camera = CameraRecord::new(req.name, req.device, req.width, req.height, req.fps);
    state.store.save_camera(camera.clone()).await?;
    Ok(Json(camera))
}

pub async fn get_camera(State(state): State<AppState>, Path(camera_id): Path<CameraId>) -> ApiResult<Json<CameraRecord>> {
    Ok(Json(state.store.load_camera(camera_id).await?))
}

pub async fn update_camera(
    State(state): State<AppState>,
    Path(camera_id): Path<CameraId>,
    Json(req): Json<UpdateCameraRequest>,
) -> ApiResult<Json<CameraRecord>> {
    let mut camera = state.store.load_camera(camera_id).await?;
    if let Some(name) = req.name {
        camera.name = name;
    }
    if let Some(enabled) = req.events_enabled {
        camera.events_enabled = enabled;
    }
    if let Some(enabled) = req.notifications_enabled {
        camera.notifications_enabled = enabled;
    }
    state.store.save_camera(camera.clone()).await?;
    Ok(Json(camera))
}

pub async fn delete_camera(State(state): State<AppState>, Path(camera_id): Path<CameraId>) -> ApiResult<()> {
    let camera = state.store.load_camera(camera_id).await?;
    if camera.status == sentry_models::CameraStatus::Active {
        return Err(ApiError::Conflict("camera must be deactivated before deletion".into()));
    }
    state.store.delete_camera(camera_id).await?;
    Ok(())
}

pub async fn activate_camera(
    State(state): State<AppState>,
    Path(camera_id): Path<CameraId>,
    Json(config): Json<EffectivePipelineConfig>,
) -> ApiResult<()> {
    state.orchestrator.activate(camera_id, config).await?;
    Ok(())
}

pub async fn deactivate_camera(State(state): State<AppState>, Path(camera_id): Path<CameraId>) -> ApiResult<()> {
    state.orchestrator.deactivate(camera_id).await?;
    Ok(())
}

/// `GET /cameras/:id/stats`: ambient introspection analogous to
/// `vclip_api::handlers::admin::get_system_info`, explicitly out of
/// spec.md's "REST shape" Non-goal but present for local debugging.
pub async fn camera_stats(State(state): State<AppState>, Path(camera_id): Path<CameraId>) -> ApiResult<Json<StatsResponse>> {
    let capture_stats = state.capture.get_stats(camera_id).await?;
    let pipeline_stats = state.pipelines.get_stats(camera_id).await.unwrap_or(sentry_pipeline::PipelineStatsSnapshot {
        detections_total: 0,
        last_detection_ts_millis: 0,
        avg_inference_ms: 0.0,
    });

    Ok(Json(StatsResponse {
        camera_id,
        frames_captured: capture_stats.frames_captured,
        frames_dropped: capture_stats.frames_dropped,
        current_fps: capture_stats.current_fps,
        detections_total: pipeline_stats.detections_total,
        avg_inference_ms: pipeline_stats.avg_inference_ms,
    }))
}
