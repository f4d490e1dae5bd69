//! User business logic service.
//!
//! Handles registration and profile updates: input checks, image uploads
//! through the object store, and shaping users into their sanitized view.

use crate::auth::models::non_blank;
use crate::database::models::{CreateUser, UserChanges, UserView};
use crate::errors::{ServiceError, ServiceResult};
use crate::repositories::CredentialStore;
use crate::services::object_store::{ObjectStore, SpooledFile, upload_spooled};
use crate::utils::crypto::hash_password;
use serde::Deserialize;
use tracing::{error, info};
use validator::{Validate, ValidateEmail};

/// Registration input gathered from a multipart form.
#[derive(Debug, Default)]
pub struct RegisterUser {
    pub full_name: String,
    pub email: String,
    pub username: String,
    pub password: String,
    pub avatar: Option<SpooledFile>,
    pub cover_image: Option<SpooledFile>,
}

/// Profile update payload
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountRequest {
    #[serde(default)]
    #[validate(custom(function = "non_blank", message = "Full name is required"))]
    pub full_name: String,

    #[serde(default)]
    #[validate(email(message = "Must be a valid email"))]
    pub email: String,
}

pub struct UserService<'a, S: CredentialStore + ?Sized> {
    store: &'a S,
    object_store: &'a dyn ObjectStore,
    bcrypt_cost: u32,
}

impl<'a, S: CredentialStore + ?Sized> UserService<'a, S> {
    /// Creates a new UserService instance.
    pub fn new(store: &'a S, object_store: &'a dyn ObjectStore, bcrypt_cost: u32) -> Self {
        Self {
            store,
            object_store,
            bcrypt_cost,
        }
    }

    /// Registers a new user.
    ///
    /// # Errors
    /// Returns `ServiceError` for:
    /// - blank fields, a malformed email, or a missing or failed avatar upload
    /// - a username or email that is already taken
    /// - a user that cannot be read back after insert
    pub async fn register(&self, input: RegisterUser) -> ServiceResult<UserView> {
        if [&input.full_name, &input.email, &input.username, &input.password]
            .iter()
            .any(|field| field.trim().is_empty())
        {
            return Err(ServiceError::validation("all fields are required"));
        }

        let email = input.email.trim().to_lowercase();
        let username = input.username.trim().to_lowercase();
        if !email.validate_email() {
            return Err(ServiceError::validation("email: Must be a valid email"));
        }

        if self
            .store
            .find_by_identity(Some(&username), Some(&email))
            .await?
            .is_some()
        {
            return Err(ServiceError::already_exists(
                "user with email or username already exists",
            ));
        }

        if input.avatar.is_none() {
            return Err(ServiceError::validation("Avatar file is required"));
        }

        let password_hash = hash_password(input.password, self.bcrypt_cost).await?;

        // The row claims the username and email before anything is uploaded,
        // so a lost uniqueness race leaves no stored images behind.
        let user = self
            .store
            .create(CreateUser {
                username,
                email,
                full_name: input.full_name.trim().to_string(),
                avatar_url: String::new(),
                cover_image_url: String::new(),
                password_hash,
            })
            .await?;

        match self
            .attach_images(&user.id, input.avatar.as_ref(), input.cover_image.as_ref())
            .await
        {
            Ok(created) => {
                info!("Registered user {}", created.id);
                Ok(created)
            }
            Err(e) => {
                if let Err(cleanup) = self.store.delete(&user.id).await {
                    error!("Failed to roll back user {}: {:#}", user.id, cleanup);
                }
                Err(e)
            }
        }
    }

    /// Uploads the registration images and returns the finished user.
    async fn attach_images(
        &self,
        id: &str,
        avatar: Option<&SpooledFile>,
        cover_image: Option<&SpooledFile>,
    ) -> ServiceResult<UserView> {
        let avatar_url = upload_spooled(self.object_store, avatar)
            .await
            .ok_or_else(|| ServiceError::validation("Avatar file is required"))?;
        let cover_image_url = upload_spooled(self.object_store, cover_image).await;

        self.store
            .update_fields(
                id,
                UserChanges {
                    avatar_url: Some(avatar_url),
                    cover_image_url,
                    ..Default::default()
                },
            )
            .await?;

        self.store.find_view_by_id(id).await?.ok_or_else(|| {
            ServiceError::exposed_internal_error("something went wrong while registering the user")
        })
    }

    /// Retrieves the sanitized view of a user.
    ///
    /// # Errors
    /// Returns `ServiceError::NotFound` if user doesn't exist
    pub async fn get_user_required(&self, id: &str) -> ServiceResult<UserView> {
        self.store
            .find_view_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", id))
    }

    /// Updates full name and email.
    pub async fn update_account(
        &self,
        id: &str,
        request: UpdateAccountRequest,
    ) -> ServiceResult<UserView> {
        if request.full_name.trim().is_empty() || request.email.trim().is_empty() {
            return Err(ServiceError::validation("all fields are required"));
        }
        let request = UpdateAccountRequest {
            full_name: request.full_name.trim().to_string(),
            email: request.email.trim().to_lowercase(),
        };
        request.validate()?;

        let user = self
            .store
            .update_fields(
                id,
                UserChanges {
                    full_name: Some(request.full_name),
                    email: Some(request.email),
                    ..Default::default()
                },
            )
            .await?;

        Ok(user.sanitized())
    }

    /// Replaces the avatar with a newly uploaded image.
    pub async fn update_avatar(
        &self,
        id: &str,
        avatar: Option<SpooledFile>,
    ) -> ServiceResult<UserView> {
        if avatar.is_none() {
            return Err(ServiceError::validation("Avatar file is missing"));
        }
        let avatar_url = upload_spooled(self.object_store, avatar.as_ref())
            .await
            .ok_or_else(|| ServiceError::validation("Error while uploading avatar"))?;

        let user = self
            .store
            .update_fields(
                id,
                UserChanges {
                    avatar_url: Some(avatar_url),
                    ..Default::default()
                },
            )
            .await?;

        Ok(user.sanitized())
    }

    /// Replaces the cover image with a newly uploaded image.
    pub async fn update_cover_image(
        &self,
        id: &str,
        cover_image: Option<SpooledFile>,
    ) -> ServiceResult<UserView> {
        if cover_image.is_none() {
            return Err(ServiceError::validation("Cover image file is missing"));
        }
        let cover_image_url = upload_spooled(self.object_store, cover_image.as_ref())
            .await
            .ok_or_else(|| ServiceError::validation("Error while uploading cover image"))?;

        let user = self
            .store
            .update_fields(
                id,
                UserChanges {
                    cover_image_url: Some(cover_image_url),
                    ..Default::default()
                },
            )
            .await?;

        Ok(user.sanitized())
    }
}
