//! Anonymous file-hosting upload.
//!
//! The forum itself cannot host inline images, so the client pushes bytes to
//! a third-party anonymous host and pastes the returned URL into a comment.
//! The contract with the host is minimal: submit bytes, get back a URL or a
//! failure.

use reqwest::multipart::{Form, Part};
use tracing::debug;

use crate::client::ForumClient;
use crate::error::ForumError;

impl ForumClient {
    /// Upload an image and return its hosted URL (the trimmed response
    /// body).
    ///
    /// The upload host is unrelated to the forum, so the request carries no
    /// session cookie.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or any non-2xx status.
    pub async fn upload_image(
        &self,
        bytes: Vec<u8>,
        filename: &str,
    ) -> Result<String, ForumError> {
        let form = Form::new().text("reqtype", "fileupload").part(
            "fileToUpload",
            Part::bytes(bytes).file_name(filename.to_string()),
        );

        let response = self
            .http()
            .post(&self.config().upload_endpoint)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ForumError::Status(status));
        }

        let hosted_url = response.text().await?.trim().to_string();
        debug!(url = %hosted_url, "image uploaded");

        Ok(hosted_url)
    }
}
