use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use xcali_core::envelope::ApiGatewayResponse;
use xcali_lambda::config::AppConfig;
use xcali_lambda::handlers::request::RequestDispatcher;
use xcali_lambda::runtime::{build_dispatcher, invocation_for_context};
use xcali_lambda::telemetry::init_tracing;

async fn handle_request(
    dispatcher: &RequestDispatcher,
    event: LambdaEvent<Value>,
) -> Result<ApiGatewayResponse, Error> {
    let (payload, context) = event.into_parts();
    let invocation = invocation_for_context(&context);
    Ok(dispatcher.dispatch(payload, &invocation).await?)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing()?;
    let config = AppConfig::from_env()?;
    let dispatcher = build_dispatcher(&config).await;
    let dispatcher = &dispatcher;

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| async move {
        handle_request(dispatcher, event).await
    }))
    .await
}
