//! Object storage surface: upload without overwrite, public URL derivation.

use super::RemoteClient;
use crate::errors::AppError;

impl RemoteClient {
    /// Upload an object to the configured bucket. Overwrite is disabled;
    /// a path collision is rejected by the backend.
    pub async fn upload_object(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), AppError> {
        let req = self
            .http
            .post(self.storage_url(path))
            .header("x-upsert", "false")
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes);
        let resp = self.authorize(req).send().await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            tracing::error!(status, path, "object upload rejected");
            return Err(AppError::Storage(format!(
                "Upload failed with status {}",
                status
            )));
        }
        Ok(())
    }
}
