use super::{users::fetch_addresses, EmployeeError};
use crate::domain::{NewUserAddress, UserAddress, UserAddressRow};
use anyhow::Context;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use sqlx::SqlitePool;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct AddressPayload {
    street: String,
    city: String,
    #[serde(default)]
    province: String,
    #[serde(default)]
    postal_code: String,
    #[serde(default)]
    country: String,
}

impl TryFrom<AddressPayload> for NewUserAddress {
    type Error = String;

    fn try_from(value: AddressPayload) -> Result<Self, Self::Error> {
        NewUserAddress::parse(
            value.street,
            value.city,
            value.province,
            value.postal_code,
            value.country,
        )
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{id}/addresses",
    tag = "employees",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "Addresses of the user", body = [UserAddress]),
        (status = 404, description = "No such user")
    )
)]
#[tracing::instrument(name = "Listing user addresses", skip(pool))]
pub async fn list_addresses(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<UserAddress>>, EmployeeError> {
    ensure_user_exists(&pool, id).await?;
    let addresses = fetch_addresses(&pool, id)
        .await?
        .into_iter()
        .map(UserAddress::from)
        .collect();
    Ok(Json(addresses))
}

#[utoipa::path(
    post,
    path = "/api/v1/users/{id}/addresses",
    tag = "employees",
    params(("id" = i64, Path, description = "User id")),
    request_body = AddressPayload,
    responses(
        (status = 201, description = "Address added", body = UserAddress),
        (status = 400, description = "Blank street or city"),
        (status = 404, description = "No such user")
    )
)]
#[tracing::instrument(name = "Adding a user address", skip(pool, payload))]
pub async fn create_address(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    Json(payload): Json<AddressPayload>,
) -> Result<impl IntoResponse, EmployeeError> {
    let address: NewUserAddress =
        payload.try_into().map_err(EmployeeError::Validation)?;
    ensure_user_exists(&pool, id).await?;

    let result = sqlx::query(
        "INSERT INTO user_addresses \
        (user_id, street, city, province, postal_code, country) \
        VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(address.street.as_str())
    .bind(address.city.as_str())
    .bind(address.province.as_str())
    .bind(address.postal_code.as_str())
    .bind(address.country.as_str())
    .execute(&pool)
    .await
    .context("Failed to insert user address")?;

    let row = sqlx::query_as::<_, UserAddressRow>(
        "SELECT id, user_id, street, city, province, postal_code, country \
        FROM user_addresses WHERE id = ?",
    )
    .bind(result.last_insert_rowid())
    .fetch_one(&pool)
    .await
    .context("Failed to read back inserted address")?;

    Ok((StatusCode::CREATED, Json(UserAddress::from(row))))
}

async fn ensure_user_exists(
    pool: &SqlitePool,
    id: i64,
) -> Result<(), EmployeeError> {
    let found: Option<(i64,)> =
        sqlx::query_as("SELECT id FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
            .context("Failed to look up user")?;
    found.map(|_| ()).ok_or(EmployeeError::NotFound(id))
}
