use crate::infra::error::AppError;
use notification_request_dispatcher::environment::Environment;
use notification_request_dispatcher::fcm_credentials::{FcmCredentials, METADATA_SERVER_TOKEN_URL};
use notification_request_dispatcher::fcm_push_gateway::FcmSettings;

pub struct Fcm;

impl Fcm {
    /// A static `FCM_ACCESS_TOKEN` wins over the metadata server. `FCM_LOCAL_ENDPOINT` points the
    /// gateway at an emulator or a mock.
    pub fn settings_from_env() -> Result<FcmSettings, AppError> {
        let project_id = Environment::optional_string("FCM_PROJECT_ID").ok_or_else(|| AppError::new("FCM_PROJECT_ID is not set", "Missing fcm configuration"))?;

        let credentials = match Environment::optional_string("FCM_ACCESS_TOKEN") {
            Some(token) => FcmCredentials::Static(token),
            None => FcmCredentials::MetadataServer {
                token_url: Environment::string("FCM_METADATA_TOKEN_URL", METADATA_SERVER_TOKEN_URL),
            },
        };

        let settings = FcmSettings::new(&project_id, credentials);

        Ok(match Environment::optional_string("FCM_LOCAL_ENDPOINT") {
            Some(endpoint) => settings.with_base_url(&endpoint),
            None => settings,
        })
    }
}
