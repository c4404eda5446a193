//! Feed view: share a post (caption and/or image) and list recent posts.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use super::OpSlot;
use crate::client::RemoteClient;
use crate::errors::AppError;
use crate::models::{FeedPost, NewPost};
use crate::session::SessionResolver;

/// Number of posts shown in the feed.
const FEED_LIMIT: usize = 20;

/// An image selected for upload.
pub struct PostImage {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

pub struct FeedFlow {
    client: Arc<RemoteClient>,
    session: Arc<SessionResolver>,
    posting: OpSlot,
}

impl FeedFlow {
    pub fn new(client: Arc<RemoteClient>, session: Arc<SessionResolver>) -> Self {
        Self {
            client,
            session,
            posting: OpSlot::new(),
        }
    }

    /// Share a post. Requires a caption or an image.
    ///
    /// With an image: upload under `{user_id}/{millis}.{ext}` with overwrite
    /// disabled, derive the public URL, then insert the post row. An upload
    /// that succeeds before a failed insert leaves an orphaned object;
    /// that gap is accepted and reported as a single failure.
    pub async fn create_post(
        &self,
        caption: &str,
        image: Option<PostImage>,
    ) -> Result<(), AppError> {
        let caption = caption.trim();
        if caption.is_empty() && image.is_none() {
            return Err(AppError::Validation(
                "Please write your action or add a photo.".to_string(),
            ));
        }

        let identity = self
            .session
            .snapshot()
            .identity
            .ok_or_else(|| AppError::Unauthorized("Please log in.".to_string()))?;

        let _guard = self
            .posting
            .begin(Uuid::nil(), "A post is already being shared.")?;

        let image_url = match image {
            Some(image) => {
                // Last dot-separated segment, or the whole name if undotted.
                let ext = image
                    .file_name
                    .rsplit('.')
                    .next()
                    .unwrap_or(&image.file_name);
                let path = format!("{}/{}.{}", identity.id, Utc::now().timestamp_millis(), ext);
                self.client
                    .upload_object(&path, image.bytes, &image.content_type)
                    .await?;
                Some(self.client.public_object_url(&path))
            }
            None => None,
        };

        let row = NewPost {
            user_id: identity.id,
            caption: if caption.is_empty() {
                None
            } else {
                Some(caption.to_string())
            },
            image_url,
        };

        self.client.table("posts").insert(&row).await
    }

    /// The most recent posts, joined with each author's green name.
    pub async fn list_posts(&self) -> Result<Vec<FeedPost>, AppError> {
        self.client
            .table("posts")
            .select("id, caption, image_url, created_at, profiles(green_name)")
            .order_desc("created_at")
            .limit(FEED_LIMIT)
            .fetch()
            .await
    }
}
