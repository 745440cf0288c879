use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use study_core::model::{Profile, ProfileUpdateCommand, ProgressPatch, ProgressRecord, StudyDate};
use url::Url;

use super::{PatchAck, ProfileApi, ProgressApi, ProgressQuery};
use crate::config::ApiConfig;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
struct ProgressList {
    items: Vec<ProgressRecord>,
}

/// `reqwest` client for the study API.
#[derive(Clone, Debug)]
pub struct HttpStudyApi {
    client: Client,
    config: ApiConfig,
}

impl HttpStudyApi {
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the underlying client cannot be built.
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self { client, config })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.config.base_url().join(path)?)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.config.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = self.authorize(request).send().await?;
        if !response.status().is_success() {
            return Err(ApiError::HttpStatus(response.status()));
        }
        Ok(response)
    }
}

#[async_trait]
impl ProgressApi for HttpStudyApi {
    async fn fetch_progress(&self, query: ProgressQuery) -> Result<Vec<ProgressRecord>, ApiError> {
        let request = self.client.get(self.endpoint("api/progress")?);
        let request = match query {
            ProgressQuery::Date(date) => request.query(&[("date", date.to_string())]),
            ProgressQuery::Range { from, to } => {
                request.query(&[("from", from.to_string()), ("to", to.to_string())])
            }
        };

        let body: ProgressList = self.send(request).await?.json().await?;
        Ok(body.items)
    }

    async fn patch_progress(
        &self,
        date: StudyDate,
        patch: &ProgressPatch,
    ) -> Result<PatchAck, ApiError> {
        let url = self.endpoint(&format!("api/progress/{date}"))?;
        let request = self.client.patch(url).json(patch);

        let ack: PatchAck = self.send(request).await?.json().await?;
        if !ack.ok {
            return Err(ApiError::NotAcknowledged);
        }
        Ok(ack)
    }
}

#[async_trait]
impl ProfileApi for HttpStudyApi {
    async fn get_profile(&self) -> Result<Profile, ApiError> {
        let request = self.client.get(self.endpoint("api/me")?);
        Ok(self.send(request).await?.json().await?)
    }

    async fn patch_profile(&self, command: &ProfileUpdateCommand) -> Result<(), ApiError> {
        let request = self.client.patch(self.endpoint("api/me")?).json(command);
        self.send(request).await?;
        Ok(())
    }
}
