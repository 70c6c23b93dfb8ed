pub mod check;
pub mod fix;
pub mod predict;

use anyhow::Result;

use crate::cli::Api;
use crate::llm::LlmClient;

/// Build the client for the selected API flavor. Base URL and model come
/// from the environment unless overridden on the command line.
pub fn build_client(api: Api, model_override: Option<&str>) -> Result<LlmClient> {
    let base_url = LlmClient::base_url_from_env();
    let model = model_override
        .map(str::to_string)
        .unwrap_or_else(LlmClient::model_from_env);

    match api {
        Api::Generate => LlmClient::generate_api(&base_url, &model),
        Api::Chat => LlmClient::chat_api(&base_url, &model),
    }
}
