use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{multipart, Client, Response};
use shared::{
    domain::ColumnId,
    error::{ApiError, ApiException},
    protocol::{CardPayload, CreateCardRequest, ImageUploadResponse},
};

use crate::{ImageUpload, RemoteDataGateway};

/// HTTP implementation of the gateway contract.
pub struct HttpRemoteDataGateway {
    http: Client,
    base_url: String,
}

impl HttpRemoteDataGateway {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Non-2xx responses carry an `ApiError` body when the server had
    /// something to say; otherwise only the status is reported.
    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        match response.json::<ApiError>().await {
            Ok(api_error) => Err(ApiException::new(api_error.code, api_error.message).into()),
            Err(_) => Err(anyhow!("request failed with status {status}")),
        }
    }
}

#[async_trait]
impl RemoteDataGateway for HttpRemoteDataGateway {
    async fn create_card(&self, request: CreateCardRequest) -> Result<CardPayload> {
        let response = self
            .http
            .post(format!("{}/cards", self.base_url))
            .json(&request)
            .send()
            .await?;
        let card = Self::check(response).await?.json().await?;
        Ok(card)
    }

    async fn upload_card_image(
        &self,
        column_id: ColumnId,
        image: ImageUpload,
    ) -> Result<ImageUploadResponse> {
        let mut part = multipart::Part::bytes(image.bytes).file_name(image.filename);
        if let Some(mime) = &image.mime_type {
            part = part
                .mime_str(mime)
                .with_context(|| format!("invalid MIME type '{mime}' for image upload"))?;
        }
        // The server expects exactly one part under the field name `image`.
        let form = multipart::Form::new().part("image", part);

        let response = self
            .http
            .post(format!(
                "{}/columns/{}/card-image",
                self.base_url, column_id.0
            ))
            .multipart(form)
            .send()
            .await?;
        let uploaded = Self::check(response).await?.json().await?;
        Ok(uploaded)
    }
}

#[cfg(test)]
#[path = "tests/gateway_tests.rs"]
mod tests;
