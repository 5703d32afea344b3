use clap::Parser;
use futures_util::future::join_all;
use resource::{
    DEFAULT_BREADCRUMB_CAPACITY, DEFAULT_REQUEST_ID, Method, RequestCoordinator,
    RequestDescriptor, ReqwestTransport, ResourceConfig,
};
use serde::Serialize;
use serde_json::Value;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Issue overlapping coordinated requests against the map backend"
)]
struct Args {
    /// Backend URL prefix, prepended verbatim to the endpoint
    #[arg(long, env = "ORION_SERVER_URL", default_value = "")]
    base_url: String,

    /// Logical identifier shared by every issued request
    #[arg(long, default_value = DEFAULT_REQUEST_ID)]
    id: String,

    /// HTTP verb
    #[arg(long, default_value = "GET")]
    method: Method,

    /// JSON payload (ignored for GET and HEAD)
    #[arg(long, value_parser = parse_payload)]
    payload: Option<Value>,

    /// Number of back-to-back requests; all but the last should be superseded
    #[arg(long, default_value_t = 1)]
    repeat: usize,

    /// Breadcrumbs retained for the summary
    #[arg(long, env = "RESOURCE_BREADCRUMBS", default_value_t = DEFAULT_BREADCRUMB_CAPACITY)]
    breadcrumbs: usize,

    /// Endpoint path, e.g. /api/layers
    endpoint: String,
}

fn parse_payload(raw: &str) -> Result<Value, serde_json::Error> {
    serde_json::from_str(raw)
}

#[derive(Debug, Serialize)]
struct OutcomeLine {
    index: usize,
    stamp: u64,
    outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = ResourceConfig::new(args.base_url).with_breadcrumb_capacity(args.breadcrumbs);
    let coordinator = RequestCoordinator::new(config, ReqwestTransport::new()?);

    let descriptor = RequestDescriptor::new(args.endpoint)
        .with_id(args.id)
        .with_method(args.method)
        .with_payload(args.payload.unwrap_or(Value::Null));

    info!(
        "issuing {} request(s) to {}",
        args.repeat.max(1),
        coordinator.url_for(&descriptor.endpoint)
    );

    // Issue everything before awaiting anything so the requests overlap.
    let pending: Vec<_> = (0..args.repeat.max(1))
        .map(|_| coordinator.fetch(descriptor.clone()))
        .collect();
    let stamps: Vec<u64> = pending.iter().map(|p| p.stamp().0).collect();
    let outcomes = join_all(pending).await;

    for (index, (stamp, outcome)) in stamps.into_iter().zip(outcomes).enumerate() {
        let kind = outcome.kind().as_str();
        let line = match outcome.into_result(&descriptor.id) {
            Ok(data) => OutcomeLine {
                index,
                stamp,
                outcome: kind,
                data,
                code: None,
                error: None,
            },
            Err(err) => OutcomeLine {
                index,
                stamp,
                outcome: kind,
                data: None,
                code: Some(err.code()),
                error: Some(err.to_string()),
            },
        };
        println!("{}", serde_json::to_string(&line)?);
    }

    for crumb in coordinator.breadcrumbs() {
        info!(
            id = %crumb.id,
            stamp = %crumb.stamp,
            method = %crumb.method,
            body = ?crumb.request_body,
            status = ?crumb.status,
            outcome = %crumb.outcome,
            elapsed_ms = crumb.elapsed.as_millis() as u64,
            "{}",
            crumb.url
        );
    }

    let metrics = coordinator.metrics();
    for (name, value) in &metrics.counters {
        info!("{name} = {value}");
    }
    info!(
        "latency ms: count={} min={} max={} sum={}",
        metrics.latency_ms.count,
        metrics.latency_ms.min,
        metrics.latency_ms.max,
        metrics.latency_ms.sum
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::Args;
    use clap::Parser;
    use resource::Method;
    use serde_json::json;

    #[test]
    fn parses_overlapping_post() {
        let args = Args::try_parse_from([
            "resource-probe",
            "--base-url",
            "https://example.com",
            "--id",
            "layers",
            "--method",
            "post",
            "--payload",
            r#"{"bbox":[0,0,1,1]}"#,
            "--repeat",
            "3",
            "/api/layers",
        ])
        .unwrap();

        assert_eq!(args.base_url, "https://example.com");
        assert_eq!(args.id, "layers");
        assert_eq!(args.method, Method::Post);
        assert_eq!(args.payload, Some(json!({ "bbox": [0, 0, 1, 1] })));
        assert_eq!(args.repeat, 3);
        assert_eq!(args.endpoint, "/api/layers");
    }

    #[test]
    fn rejects_unknown_method_and_bad_payload() {
        assert!(Args::try_parse_from(["resource-probe", "--method", "FETCH", "/x"]).is_err());
        assert!(Args::try_parse_from(["resource-probe", "--payload", "{", "/x"]).is_err());
    }
}
