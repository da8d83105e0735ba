//! Routing service calls from the browser.

use seed::prelude::*;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use shared::config::DEFAULT_API_BASE_URL;
use shared::geocode::{GeocodeFeature, GeocodeResponse};
use shared::model::IsochroneResult;
use shared::ors::{
    Endpoint, IsochroneArgs, PlaceSearchArgs, ReverseSearchArgs, RoutingArgs, service_error_message,
};
use shared::url_state::UrlParams;

fn api_base() -> &'static str {
    option_env!("ORS_API_BASE_URL").unwrap_or(DEFAULT_API_BASE_URL)
}

fn api_key() -> &'static str {
    option_env!("ORS_API_KEY").unwrap_or_default()
}

async fn send<T: DeserializeOwned>(request: Request<'_>) -> Result<T, String> {
    let response = request
        .header(Header::custom("Authorization", api_key()))
        .fetch()
        .await
        .map_err(|err| format!("{err:?}"))?;
    let status = response.status();
    let body = response.text().await.map_err(|err| format!("{err:?}"))?;
    if !status.is_ok() {
        return Err(service_error_message(&body)
            .unwrap_or_else(|| format!("{} {}", status.code, status.text)));
    }
    serde_json::from_str(&body).map_err(|err| err.to_string())
}

async fn get<T: DeserializeOwned>(endpoint: Endpoint, params: &UrlParams) -> Result<T, String> {
    let url = endpoint.url_with_query(api_base(), params);
    send(Request::new(url).method(Method::Get)).await
}

async fn post<T: DeserializeOwned, B: Serialize>(endpoint: Endpoint, body: &B) -> Result<T, String> {
    let request = Request::new(endpoint.url(api_base()))
        .method(Method::Post)
        .json(body)
        .map_err(|err| format!("{err:?}"))?;
    send(request).await
}

pub async fn geocode(args: PlaceSearchArgs) -> Result<Vec<GeocodeFeature>, String> {
    let response: GeocodeResponse = get(Endpoint::GeocodeSearch, &args.to_params()).await?;
    Ok(response.features)
}

pub async fn reverse_geocode(args: ReverseSearchArgs) -> Result<Vec<GeocodeFeature>, String> {
    let response: GeocodeResponse = get(Endpoint::GeocodeReverse, &args.to_params()).await?;
    Ok(response.features)
}

pub async fn directions(args: RoutingArgs) -> Result<Value, String> {
    web_sys::console::debug_1(
        &format!(
            "[frontend] directions {} through {} places",
            args.profile,
            args.coordinates.len()
        )
        .into(),
    );
    post(args.endpoint(), &args).await
}

pub async fn isochrones(args: IsochroneArgs) -> Result<IsochroneResult, String> {
    post(args.endpoint(), &args).await
}
