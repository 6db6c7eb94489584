//! Device inventory endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::device::{CreateDevice, Device, DeviceQuery, UpdateDevice, UpdateDeviceStatus},
};

use super::CurrentAdmin;

#[derive(Deserialize)]
pub struct DeleteDeviceParams {
    pub force: Option<bool>,
}

/// List devices, optionally filtered by status
#[utoipa::path(
    get,
    path = "/devices",
    tag = "devices",
    params(DeviceQuery),
    responses(
        (status = 200, description = "Device list", body = Vec<Device>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_devices(
    State(state): State<crate::AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Query(query): Query<DeviceQuery>,
) -> AppResult<Json<Vec<Device>>> {
    let devices = state
        .services
        .devices
        .find_all(query.status, query.take, query.skip)
        .await?;
    Ok(Json(devices))
}

/// Get device by ID
#[utoipa::path(
    get,
    path = "/devices/{id}",
    tag = "devices",
    params(("id" = Uuid, Path, description = "Device ID")),
    responses(
        (status = 200, description = "Device details", body = Device),
        (status = 404, description = "Device not found")
    )
)]
pub async fn get_device(
    State(state): State<crate::AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Device>> {
    let device = state.services.devices.find_by_id(id).await?;
    Ok(Json(device))
}

/// Create a device
#[utoipa::path(
    post,
    path = "/devices",
    tag = "devices",
    request_body = CreateDevice,
    responses(
        (status = 201, description = "Device created", body = Device),
        (status = 400, description = "Blank call sign or device type"),
        (status = 409, description = "Call sign already exists")
    )
)]
pub async fn create_device(
    State(state): State<crate::AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Json(data): Json<CreateDevice>,
) -> AppResult<(StatusCode, Json<Device>)> {
    let device = state.services.devices.create(&data).await?;
    Ok((StatusCode::CREATED, Json(device)))
}

/// Update a device (partial)
#[utoipa::path(
    put,
    path = "/devices/{id}",
    tag = "devices",
    params(("id" = Uuid, Path, description = "Device ID")),
    request_body = UpdateDevice,
    responses(
        (status = 200, description = "Device updated", body = Device),
        (status = 404, description = "Device not found"),
        (status = 409, description = "Call sign already exists")
    )
)]
pub async fn update_device(
    State(state): State<crate::AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Path(id): Path<Uuid>,
    Json(data): Json<UpdateDevice>,
) -> AppResult<Json<Device>> {
    let device = state.services.devices.update(id, &data).await?;
    Ok(Json(device))
}

/// Transition a device's status
#[utoipa::path(
    put,
    path = "/devices/{id}/status",
    tag = "devices",
    params(("id" = Uuid, Path, description = "Device ID")),
    request_body = UpdateDeviceStatus,
    responses(
        (status = 200, description = "Status updated", body = Device),
        (status = 400, description = "ON_LOAN is not a settable status"),
        (status = 404, description = "Device not found")
    )
)]
pub async fn update_device_status(
    State(state): State<crate::AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Path(id): Path<Uuid>,
    Json(data): Json<UpdateDeviceStatus>,
) -> AppResult<Json<Device>> {
    let device = state.services.devices.update_status(id, data.status).await?;
    Ok(Json(device))
}

/// Delete a device and its loan history
#[utoipa::path(
    delete,
    path = "/devices/{id}",
    tag = "devices",
    params(
        ("id" = Uuid, Path, description = "Device ID"),
        ("force" = Option<bool>, Query, description = "Delete even while on loan")
    ),
    responses(
        (status = 204, description = "Device deleted"),
        (status = 404, description = "Device not found"),
        (status = 409, description = "Device is on loan")
    )
)]
pub async fn delete_device(
    State(state): State<crate::AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Path(id): Path<Uuid>,
    Query(params): Query<DeleteDeviceParams>,
) -> AppResult<StatusCode> {
    state
        .services
        .devices
        .delete(id, params.force.unwrap_or(false))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
