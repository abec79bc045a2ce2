use std::sync::Mutex;

use crate::db;
use crate::errors::AppError;
use crate::models::{
    Asset, BookingDetails, NewAsset, NewUser, PageRequest, Paginated, ProfilePatch, User,
    UserProfile,
};
use crate::repository::{self, AssetRepository, Atomic, Store, UserRepository};
use crate::services::catalog::storage_error;
use crate::services::storage::{BlobStore, Upload};
use crate::services::{booking, populate};

fn validate_email(email: &str) -> Result<(), AppError> {
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if valid {
        Ok(())
    } else {
        Err(AppError::validation(format!("invalid email: {email}")))
    }
}

fn email_conflict(err: anyhow::Error) -> AppError {
    if db::is_constraint_violation(&err) {
        AppError::conflict("email is already in use")
    } else {
        err.into()
    }
}

pub fn create_user<S: UserRepository>(store: &S, user: &NewUser) -> Result<User, AppError> {
    if user.name.trim().is_empty() {
        return Err(AppError::validation("name is required"));
    }
    validate_email(&user.email)?;

    let created = store.insert_user(user).map_err(email_conflict)?;
    tracing::info!(user_id = created.id, "user created");
    Ok(created)
}

pub fn get_user<S: UserRepository>(store: &S, user_id: i64) -> Result<User, AppError> {
    store
        .find_user(user_id)?
        .ok_or_else(|| AppError::not_found(format!("user {user_id}")))
}

pub fn get_profile<S: Store>(store: &S, user_id: i64) -> Result<UserProfile, AppError> {
    let user = get_user(store, user_id)?;
    let profile_image = match user.profile_image_id {
        Some(asset_id) => store.find_asset(asset_id)?,
        None => None,
    };
    let cars = store
        .cars_for_host(user_id, None)?
        .into_iter()
        .map(|car| populate::car_details(store, car))
        .collect::<anyhow::Result<Vec<_>>>()?;
    let bookings = store
        .bookings_for_user(user_id)?
        .into_iter()
        .map(|b| populate::booking_details(store, b))
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(UserProfile {
        user,
        profile_image,
        cars,
        bookings,
    })
}

pub fn update_profile<S: UserRepository>(
    store: &S,
    user_id: i64,
    patch: ProfilePatch,
) -> Result<User, AppError> {
    let patch = patch.normalized();
    if let Some(email) = &patch.email {
        validate_email(email)?;
    }

    let user = store
        .update_profile(user_id, &patch)
        .map_err(email_conflict)?
        .ok_or_else(|| AppError::not_found(format!("user {user_id}")))?;
    tracing::info!(user_id, "profile updated");
    Ok(user)
}

pub fn booking_history<S: Store>(
    store: &S,
    user_id: i64,
    page: PageRequest,
) -> Result<Paginated<BookingDetails>, AppError> {
    booking::list_for_user(store, user_id, page, None)
}

pub async fn upload_profile_picture<S>(
    db: &Mutex<S>,
    blobs: &dyn BlobStore,
    user_id: i64,
    files: Vec<Upload>,
) -> Result<Asset, AppError>
where
    S: UserRepository + AssetRepository + Atomic + Send,
{
    let Some(file) = files.into_iter().next() else {
        return Err(AppError::validation("no files uploaded"));
    };
    {
        let conn = repository::lock(db)?;
        conn.find_user(user_id)?
            .ok_or_else(|| AppError::not_found(format!("user {user_id}")))?;
    }

    let blob = blobs.upload(&file).await.map_err(storage_error)?;

    let attached = {
        let mut conn = repository::lock(db)?;
        conn.atomically(|store| {
            let asset = store.insert_asset(&NewAsset {
                storage_key: blob.key.clone(),
                url: blob.url.clone(),
                name: file.file_name.clone(),
                mime: file.content_type.clone(),
                size: blob.size,
                car_id: None,
            })?;
            if !store.set_profile_image(user_id, asset.id)? {
                return Err(AppError::not_found(format!("user {user_id}")));
            }
            Ok(asset)
        })
    };

    match attached {
        Ok(asset) => {
            tracing::info!(user_id, asset_id = asset.id, "profile picture uploaded");
            Ok(asset)
        }
        Err(e) => {
            tracing::error!(user_id, key = %blob.key, error = %e, "failed to set profile picture, removing blob");
            if let Err(remove_err) = blobs.remove(&blob.key).await {
                tracing::error!(key = %blob.key, error = %remove_err, "failed to remove orphaned blob");
            }
            Err(e)
        }
    }
}
