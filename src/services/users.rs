use sqlx::SqlitePool;

use crate::authz::{policy, Action, Actor, Resource, Role};
use crate::errors::{AppError, AppResult};
use crate::models::user::{DbUser, LoginRequest, RegisterRequest, User};
use crate::utils::{hash_password, unique_violation, utc_now, verify_password};
use crate::validation::validate_name;

const USER_COLUMNS: &str = "id, username, email, password_hash, role, created_at, updated_at";

async fn find_by_id(pool: &SqlitePool, user_id: i64) -> Result<Option<DbUser>, sqlx::Error> {
    sqlx::query_as::<_, DbUser>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

async fn find_by_login(pool: &SqlitePool, email: &str, username: &str) -> Result<Option<DbUser>, sqlx::Error> {
    sqlx::query_as::<_, DbUser>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = ? OR username = ? ORDER BY id LIMIT 1"
    ))
    .bind(email)
    .bind(username)
    .fetch_optional(pool)
    .await
}

fn validate_email(email: &str) -> AppResult<()> {
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if valid {
        Ok(())
    } else {
        Err(AppError::validation("email", "email must look like name@example.com"))
    }
}

async fn insert_user(pool: &SqlitePool, username: &str, email: &str, password: &str, role: Role) -> AppResult<User> {
    validate_name("username", username)?;
    validate_email(email)?;
    let password_hash = hash_password(password)?;

    if find_by_login(pool, email, username).await?.is_some() {
        return Err(AppError::conflict("username or email already registered"));
    }

    let now = utc_now();
    let inserted = sqlx::query_as::<_, DbUser>(&format!(
        "INSERT INTO users (username, email, password_hash, role, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?) RETURNING {USER_COLUMNS}"
    ))
    .bind(username.trim())
    .bind(email.trim())
    .bind(&password_hash)
    .bind(role)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await;

    let user = unique_violation(inserted)?
        .ok_or_else(|| AppError::conflict("username or email already registered"))?;
    tracing::info!(user_id = user.id, role = %role, "user registered");
    Ok(user.into())
}

/// Self-service sign-up. New accounts are always students.
pub async fn register(pool: &SqlitePool, req: &RegisterRequest) -> AppResult<User> {
    insert_user(pool, &req.username, &req.email, &req.password, Role::Student).await
}

/// Unknown accounts and wrong passwords get the same answer.
pub async fn login(pool: &SqlitePool, req: &LoginRequest) -> AppResult<User> {
    let db_user = match (req.email.as_deref(), req.username.as_deref()) {
        (Some(email), _) => find_by_login(pool, email.trim(), "").await?,
        (None, Some(username)) => find_by_login(pool, "", username.trim()).await?,
        (None, None) => return Err(AppError::validation("email", "email or username is required")),
    };

    let db_user = db_user.ok_or_else(|| AppError::unauthorized("invalid credentials"))?;
    if !verify_password(&req.password, &db_user.password_hash)? {
        tracing::debug!(user_id = db_user.id, "password mismatch");
        return Err(AppError::unauthorized("invalid credentials"));
    }

    Ok(db_user.into())
}

/// The authenticated user's own profile.
pub async fn me(pool: &SqlitePool, actor: &Actor) -> AppResult<User> {
    find_by_id(pool, actor.id)
        .await?
        .map(User::from)
        .ok_or_else(|| AppError::unauthorized("account no longer exists"))
}

pub async fn list_users(pool: &SqlitePool, actor: &Actor) -> AppResult<Vec<User>> {
    policy::authorize(actor, Resource::User, Action::List)?;

    let users = sqlx::query_as::<_, DbUser>(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"))
        .fetch_all(pool)
        .await?;
    Ok(users.into_iter().map(User::from).collect())
}

pub async fn get_user(pool: &SqlitePool, actor: &Actor, user_id: i64) -> AppResult<User> {
    policy::authorize(actor, Resource::User, Action::Read)?;

    find_by_id(pool, user_id)
        .await?
        .map(User::from)
        .ok_or_else(|| AppError::not_found(format!("user {user_id} not found")))
}

/// Admin can be seeded but never granted through this action, and a mentor who
/// still owns courses keeps the mentor role. Returns `(before, after)`.
pub async fn update_role(pool: &SqlitePool, actor: &Actor, user_id: i64, role: Role) -> AppResult<(User, User)> {
    policy::authorize(actor, Resource::User, Action::Update)?;
    let existing = find_by_id(pool, user_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("user {user_id} not found")))?;

    if !matches!(role, Role::Student | Role::Mentor) {
        return Err(AppError::validation("role", "role must be student or mentor"));
    }
    if existing.role == Role::Admin {
        return Err(AppError::validation("role", "admin accounts cannot be re-roled"));
    }
    if existing.role == Role::Mentor && role != Role::Mentor {
        let owns_courses: Option<i64> = sqlx::query_scalar("SELECT 1 FROM courses WHERE mentor_id = ? LIMIT 1")
            .bind(user_id)
            .fetch_optional(pool)
            .await?;
        if owns_courses.is_some() {
            return Err(AppError::conflict(format!(
                "user {user_id} still owns courses; reassign them before changing the role"
            )));
        }
    }

    let updated = sqlx::query_as::<_, DbUser>(&format!(
        "UPDATE users SET role = ?, updated_at = ? WHERE id = ? RETURNING {USER_COLUMNS}"
    ))
    .bind(role)
    .bind(utc_now())
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    tracing::info!(user_id, from = %existing.role, to = %role, actor_id = actor.id, "user role changed");
    Ok((existing.into(), updated.into()))
}

/// A mentor who still owns courses cannot be removed until the courses are reassigned.
pub async fn delete_user(pool: &SqlitePool, actor: &Actor, user_id: i64) -> AppResult<User> {
    policy::authorize(actor, Resource::User, Action::Delete)?;
    let user = find_by_id(pool, user_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("user {user_id} not found")))?;
    if user.id == actor.id {
        return Err(AppError::validation("user_id", "admins cannot delete their own account"));
    }

    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(user_id)
        .execute(pool)
        .await;
    match result {
        Ok(_) => {}
        Err(sqlx::Error::Database(db_err)) if db_err.is_foreign_key_violation() => {
            return Err(AppError::conflict(format!("user {user_id} still owns courses")));
        }
        Err(err) => return Err(err.into()),
    }

    tracing::info!(user_id, actor_id = actor.id, "user deleted");
    Ok(user.into())
}

/// Creates the admin account if missing. Running it again with the same
/// identity is a no-op; a non-admin holding the username or email is a conflict.
pub async fn ensure_admin(pool: &SqlitePool, username: &str, email: &str, password: &str) -> AppResult<User> {
    if let Some(existing) = find_by_login(pool, email.trim(), username.trim()).await? {
        if existing.role == Role::Admin {
            tracing::debug!(user_id = existing.id, "admin account already present");
            return Ok(existing.into());
        }
        return Err(AppError::conflict(format!(
            "user {} already exists and is not an admin",
            existing.username
        )));
    }

    insert_user(pool, username, email, password, Role::Admin).await
}
