//! HTTP implementation of the document API on top of `reqwest`.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use url::Url;

use crate::config::ServerConfig;
use crate::constants::{FILES_FIELD, STATION_FIELD};
use crate::staging::RawFile;

use super::error::ApiError;
use super::model::{ResourceId, ResourceRecord, parse_listing};
use super::DocumentApi;

/// Client for `/v1/stations/{id}/resources`.
#[derive(Debug, Clone)]
pub struct HttpDocumentApi {
    client: Client,
    base: Url,
    station_id: String,
}

impl HttpDocumentApi {
    /// Build a client for the configured server and station.
    pub fn new(server: &ServerConfig) -> Result<Self, ApiError> {
        Self::with_client(Client::new(), server)
    }

    /// Build a client reusing an existing `reqwest::Client`.
    pub fn with_client(client: Client, server: &ServerConfig) -> Result<Self, ApiError> {
        let base = Url::parse(&server.address)?;
        if base.cannot_be_a_base() {
            return Err(ApiError::CannotBeABase(server.address.clone()));
        }

        Ok(Self {
            client,
            base,
            station_id: server.station_id.clone(),
        })
    }

    pub fn station_id(&self) -> &str {
        &self.station_id
    }

    /// URL of the station's resource collection.
    pub fn resources_url(&self) -> Result<Url, ApiError> {
        self.endpoint(&[])
    }

    /// URL of a single resource.
    pub fn resource_url(&self, id: &ResourceId) -> Result<Url, ApiError> {
        self.endpoint(&[&id.to_string()])
    }

    fn endpoint(&self, tail: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::CannotBeABase(self.base.to_string()))?
            .pop_if_empty()
            .extend(["v1", "stations", self.station_id.as_str(), "resources"])
            .extend(tail);
        Ok(url)
    }

    fn check_status(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(ApiError::Status {
                status: status.as_u16(),
                url: response.url().to_string(),
            })
        }
    }
}

#[async_trait(?Send)]
impl DocumentApi for HttpDocumentApi {
    async fn list_resources(&self) -> Result<Vec<ResourceRecord>, ApiError> {
        let url = self.resources_url()?;
        log::debug!("🌐 GET {}", url);

        let response = self
            .client
            .get(url)
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await?;
        let body = Self::check_status(response)?.text().await?;

        let records = parse_listing(&body)?;
        log::info!("🌐 Fetched {} published resources", records.len());
        Ok(records)
    }

    async fn delete_resource(&self, id: &ResourceId) -> Result<(), ApiError> {
        let url = self.resource_url(id)?;
        log::debug!("🌐 DELETE {}", url);

        let response = self
            .client
            .delete(url)
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await?;
        Self::check_status(response)?;

        log::info!("🌐 Deleted resource {} from station {}", id, self.station_id);
        Ok(())
    }

    async fn upload_resources(&self, files: &[RawFile]) -> Result<(), ApiError> {
        let url = self.resources_url()?;
        log::debug!("🌐 POST {} ({} files)", url, files.len());

        let form = build_form(self.upload_fields(files).await?)?;
        let response = self.client.post(url).multipart(form).send().await?;
        Self::check_status(response)?;

        log::info!("🌐 Uploaded {} files to station {}", files.len(), self.station_id);
        Ok(())
    }
}

/// One multipart field of an upload request.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum UploadField {
    File {
        name: &'static str,
        file_name: String,
        mime_type: String,
        bytes: Vec<u8>,
    },
    Text {
        name: &'static str,
        value: String,
    },
}

impl HttpDocumentApi {
    /// Fields of an upload request: one `files` part per file, in order,
    /// then the station identifier.
    pub(crate) async fn upload_fields(&self, files: &[RawFile]) -> Result<Vec<UploadField>, ApiError> {
        let mut fields = Vec::with_capacity(files.len() + 1);
        for file in files {
            let bytes = file.read_bytes().await?;
            fields.push(UploadField::File {
                name: FILES_FIELD,
                file_name: file.name.clone(),
                mime_type: file.mime_type.clone(),
                bytes: bytes.to_vec(),
            });
        }
        fields.push(UploadField::Text {
            name: STATION_FIELD,
            value: self.station_id.clone(),
        });
        Ok(fields)
    }
}

fn build_form(fields: Vec<UploadField>) -> Result<Form, ApiError> {
    let mut form = Form::new();
    for field in fields {
        form = match field {
            UploadField::File {
                name,
                file_name,
                mime_type,
                bytes,
            } => form.part(name, Part::bytes(bytes).file_name(file_name).mime_str(&mime_type)?),
            UploadField::Text { name, value } => form.text(name, value),
        };
    }
    Ok(form)
}
