//! HTTP access to an openrouteservice-compatible routing service.

use std::future::Future;

use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use shared::GeocodeFeature;
use shared::geocode::GeocodeResponse;
use shared::model::IsochroneResult;
use shared::ors::{
    Endpoint, IsochroneArgs, PlaceSearchArgs, ReverseSearchArgs, RoutingArgs, service_error_message,
};
use shared::url_state::UrlParams;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// The four calls the planner makes. Implemented over HTTP by [`OrsClient`].
pub trait RoutingService {
    fn geocode(
        &self,
        args: &PlaceSearchArgs,
    ) -> impl Future<Output = ClientResult<Vec<GeocodeFeature>>> + Send;

    fn reverse_geocode(
        &self,
        args: &ReverseSearchArgs,
    ) -> impl Future<Output = ClientResult<Vec<GeocodeFeature>>> + Send;

    /// Raw directions payload; its layout varies, see `shared::directions`.
    fn directions(&self, args: &RoutingArgs) -> impl Future<Output = ClientResult<Value>> + Send;

    fn isochrones(
        &self,
        args: &IsochroneArgs,
    ) -> impl Future<Output = ClientResult<IsochroneResult>> + Send;
}

#[derive(Debug, Clone)]
pub struct OrsClient {
    inner: Client,
    config: ClientConfig,
}

impl OrsClient {
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json, application/geo+json"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static("routefinder/0.1"));
        let key = HeaderValue::from_str(&config.api_key)
            .map_err(|_| ClientError::config("API key contains invalid header characters"))?;
        headers.insert(AUTHORIZATION, key);

        let inner = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self { inner, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        params: &UrlParams,
    ) -> ClientResult<T> {
        let url = endpoint.url_with_query(&self.config.base_url, params);
        tracing::debug!("GET {url}");
        let response = self.inner.get(&url).send().await?;
        read_json(response).await
    }

    async fn post_json<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        endpoint: Endpoint,
        body: &B,
    ) -> ClientResult<T> {
        let url = endpoint.url(&self.config.base_url);
        tracing::debug!("POST {url}");
        let response = self.inner.post(&url).json(body).send().await?;
        read_json(response).await
    }
}

impl RoutingService for OrsClient {
    async fn geocode(&self, args: &PlaceSearchArgs) -> ClientResult<Vec<GeocodeFeature>> {
        let response: GeocodeResponse = self
            .get_json(Endpoint::GeocodeSearch, &args.to_params())
            .await?;
        tracing::info!(term = %args.text, results = response.features.len(), "geocoded");
        Ok(response.features)
    }

    async fn reverse_geocode(&self, args: &ReverseSearchArgs) -> ClientResult<Vec<GeocodeFeature>> {
        let response: GeocodeResponse = self
            .get_json(Endpoint::GeocodeReverse, &args.to_params())
            .await?;
        Ok(response.features)
    }

    async fn directions(&self, args: &RoutingArgs) -> ClientResult<Value> {
        let data: Value = self.post_json(args.endpoint(), args).await?;
        tracing::info!(
            profile = %args.profile,
            places = args.coordinates.len(),
            "directions received"
        );
        Ok(data)
    }

    async fn isochrones(&self, args: &IsochroneArgs) -> ClientResult<IsochroneResult> {
        self.post_json(args.endpoint(), args).await
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        let message = service_error_message(&body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });
        tracing::warn!(status = status.as_u16(), "routing service error: {message}");
        return Err(ClientError::Api {
            status: status.as_u16(),
            message,
        });
    }
    Ok(serde_json::from_str(&body)?)
}
