use crate::auth::{
    clear_stored_refresh_token, env_access_token, has_stored_refresh_token, GoogleAuthService,
    ACCESS_TOKEN_ENV,
};
use crate::cli::AuthCommands;
use crate::config_profiles::CliProfilesConfig;
use crate::error::CliError;

pub async fn run_auth(command: AuthCommands, global_profile: Option<&str>) -> Result<(), CliError> {
    match command {
        AuthCommands::Login {
            profile,
            refresh_token,
        } => {
            let config = CliProfilesConfig::load().map_err(CliError::Config)?;
            let profile_name = config.resolve_profile_name(profile.as_deref().or(global_profile));
            let profile_config = config.profile(&profile_name).ok_or_else(|| {
                CliError::Config(format!(
                    "Profile '{profile_name}' is not configured. Run `trip-budget config init --profile {profile_name}` first."
                ))
            })?;
            let auth_service = GoogleAuthService::new_for_profile(&profile_name, profile_config)
                .map_err(|error| CliError::Auth(error.to_string()))?
                .ok_or_else(|| {
                    CliError::Config(format!(
                        "Profile '{profile_name}' missing Google OAuth config. Set --client-id and --client-secret via `trip-budget config init`."
                    ))
                })?;
            let token = auth_service
                .sign_in(&refresh_token)
                .await
                .map_err(|error| CliError::Auth(error.to_string()))?;
            println!(
                "Signed in profile '{profile_name}' (access token expires_at={})",
                token.expires_at
            );
            Ok(())
        }
        AuthCommands::Status { profile } => {
            let config = CliProfilesConfig::load().map_err(CliError::Config)?;
            let profile_name = config.resolve_profile_name(profile.as_deref().or(global_profile));

            if env_access_token().is_some() {
                println!("Using access token from {ACCESS_TOKEN_ENV}.");
            }
            if config.profile(&profile_name).is_none() {
                println!("Profile '{profile_name}' is not configured.");
                return Ok(());
            }

            let stored = has_stored_refresh_token(&profile_name)
                .map_err(|error| CliError::Auth(error.to_string()))?;
            if stored {
                println!("Profile '{profile_name}' has a stored refresh token.");
            } else {
                println!("Profile '{profile_name}' is not signed in.");
            }
            Ok(())
        }
        AuthCommands::Logout { profile } => {
            let config = CliProfilesConfig::load().map_err(CliError::Config)?;
            let profile_name = config.resolve_profile_name(profile.as_deref().or(global_profile));

            let maybe_service = match config.profile(&profile_name) {
                Some(profile) => GoogleAuthService::new_for_profile(&profile_name, profile)
                    .map_err(|error| CliError::Auth(error.to_string()))?,
                None => None,
            };
            if let Some(service) = maybe_service {
                service
                    .sign_out()
                    .await
                    .map_err(|error| CliError::Auth(error.to_string()))?;
            } else {
                clear_stored_refresh_token(&profile_name)
                    .map_err(|error| CliError::Auth(error.to_string()))?;
            }

            println!("Signed out profile '{profile_name}'");
            Ok(())
        }
    }
}
