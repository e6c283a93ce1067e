use super::EmployeeError;
use crate::domain::{
    NewUser, User, UserAddressRow, UserEmail, UserName, UserRow,
};
use anyhow::Context;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use sqlx::SqlitePool;
use std::collections::HashMap;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct UserPayload {
    name: String,
    email: String,
}

impl TryFrom<UserPayload> for NewUser {
    type Error = String;

    fn try_from(value: UserPayload) -> Result<Self, Self::Error> {
        let name = UserName::parse(value.name)?;
        let email = UserEmail::parse(value.email)?;
        Ok(NewUser { name, email })
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "employees",
    responses((status = 200, description = "All users", body = [User]))
)]
#[tracing::instrument(name = "Listing users", skip(pool))]
pub async fn list_users(
    State(pool): State<SqlitePool>,
) -> Result<Json<Vec<User>>, EmployeeError> {
    let rows = sqlx::query_as::<_, UserRow>(
        "SELECT id, name, email FROM users ORDER BY id",
    )
    .fetch_all(&pool)
    .await
    .context("Failed to fetch users")?;

    let mut addresses: HashMap<i64, Vec<UserAddressRow>> = HashMap::new();
    for address in fetch_all_addresses(&pool).await? {
        addresses.entry(address.user_id).or_default().push(address);
    }

    let users = rows
        .into_iter()
        .map(|row| {
            let owned = addresses.remove(&row.id).unwrap_or_default();
            User::from_rows(row, owned)
        })
        .collect();
    Ok(Json(users))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    tag = "employees",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "The user", body = User),
        (status = 404, description = "No such user")
    )
)]
#[tracing::instrument(name = "Fetching a user", skip(pool))]
pub async fn get_user(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<Json<User>, EmployeeError> {
    let user = fetch_user(&pool, id)
        .await?
        .ok_or(EmployeeError::NotFound(id))?;
    Ok(Json(user))
}

#[utoipa::path(
    post,
    path = "/api/v1/users",
    tag = "employees",
    request_body = UserPayload,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Invalid name or email")
    )
)]
#[tracing::instrument(
    name = "Adding a new user",
    skip(payload, pool),
    fields(user_email = %payload.email, user_name = %payload.name)
)]
pub async fn create_user(
    State(pool): State<SqlitePool>,
    Json(payload): Json<UserPayload>,
) -> Result<impl IntoResponse, EmployeeError> {
    let new_user: NewUser =
        payload.try_into().map_err(EmployeeError::Validation)?;

    let id = insert_user(&pool, &new_user)
        .await
        .context("Failed to insert new user")?;
    let user = fetch_user(&pool, id)
        .await?
        .context("Inserted user vanished")?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[utoipa::path(
    put,
    path = "/api/v1/users/{id}",
    tag = "employees",
    params(("id" = i64, Path, description = "User id")),
    request_body = UserPayload,
    responses(
        (status = 200, description = "User updated", body = User),
        (status = 400, description = "Invalid name or email"),
        (status = 404, description = "No such user")
    )
)]
#[tracing::instrument(name = "Updating a user", skip(payload, pool))]
pub async fn update_user(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    Json(payload): Json<UserPayload>,
) -> Result<Json<User>, EmployeeError> {
    let user: NewUser =
        payload.try_into().map_err(EmployeeError::Validation)?;

    let result =
        sqlx::query("UPDATE users SET name = ?, email = ? WHERE id = ?")
            .bind(user.name.as_ref())
            .bind(user.email.as_ref())
            .bind(id)
            .execute(&pool)
            .await
            .context("Failed to update user")?;
    if result.rows_affected() == 0 {
        return Err(EmployeeError::NotFound(id));
    }

    let user = fetch_user(&pool, id)
        .await?
        .ok_or(EmployeeError::NotFound(id))?;
    Ok(Json(user))
}

#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    tag = "employees",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 204, description = "User and their addresses removed"),
        (status = 404, description = "No such user")
    )
)]
#[tracing::instrument(name = "Deleting a user", skip(pool))]
pub async fn delete_user(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<StatusCode, EmployeeError> {
    // Addresses go with the user through `ON DELETE CASCADE`
    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(&pool)
        .await
        .context("Failed to delete user")?;
    if result.rows_affected() == 0 {
        return Err(EmployeeError::NotFound(id));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[tracing::instrument(name = "Saving new user details in the database", skip_all)]
async fn insert_user(
    pool: &SqlitePool,
    new_user: &NewUser,
) -> Result<i64, sqlx::Error> {
    let result =
        sqlx::query("INSERT INTO users (name, email) VALUES (?, ?)")
            .bind(new_user.name.as_ref())
            .bind(new_user.email.as_ref())
            .execute(pool)
            .await?;
    Ok(result.last_insert_rowid())
}

/// Load one user together with their addresses.
pub(super) async fn fetch_user(
    pool: &SqlitePool,
    id: i64,
) -> Result<Option<User>, EmployeeError> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT id, name, email FROM users WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to fetch user")?;

    let Some(row) = row else {
        return Ok(None);
    };
    let addresses = fetch_addresses(pool, id).await?;
    Ok(Some(User::from_rows(row, addresses)))
}

pub(super) async fn fetch_addresses(
    pool: &SqlitePool,
    user_id: i64,
) -> Result<Vec<UserAddressRow>, EmployeeError> {
    let rows = sqlx::query_as::<_, UserAddressRow>(
        "SELECT id, user_id, street, city, province, postal_code, country \
        FROM user_addresses WHERE user_id = ? ORDER BY id",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .context("Failed to fetch user addresses")?;
    Ok(rows)
}

async fn fetch_all_addresses(
    pool: &SqlitePool,
) -> Result<Vec<UserAddressRow>, EmployeeError> {
    let rows = sqlx::query_as::<_, UserAddressRow>(
        "SELECT id, user_id, street, city, province, postal_code, country \
        FROM user_addresses ORDER BY id",
    )
    .fetch_all(pool)
    .await
    .context("Failed to fetch addresses")?;
    Ok(rows)
}
