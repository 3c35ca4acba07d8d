use anyhow::{Context, Result};
use log::{debug, info};

use fe_change_pwd::clock::{Clock, SystemClock};
use fe_change_pwd::config::Config;
use fe_change_pwd::database;
use fe_change_pwd::localization::{MessageCatalog, Translator};
use fe_change_pwd::security::Argon2Hasher;
use fe_change_pwd::user::{
    is_password_expired, ChangePasswordOutcome, ChangePasswordRequest, ChangePasswordService,
};

use crate::cli::utils::{format_timestamp, read_password};

fn build_service(config: &Config) -> Result<ChangePasswordService> {
    // A bad hashing setup has to stop the tool before any user is touched
    let hasher = Argon2Hasher::from_config(&config.hashing)
        .context("Invalid hashing configuration")?;

    let pool = database::initialize(&config.database)?;
    let store = database::user_store(pool, &config.database)?;

    Ok(ChangePasswordService::new(
        Box::new(store),
        Box::new(hasher),
        Box::new(SystemClock),
        config.password_complexity.clone(),
        config.password_expiration.clone(),
    ))
}

fn load_catalog(config: &Config) -> Result<MessageCatalog> {
    match &config.localization.catalog_path {
        Some(path) => MessageCatalog::from_toml_file(path),
        None => Ok(MessageCatalog::default()),
    }
}

/// Handle schema initialization
pub fn init(config: &Config) -> Result<()> {
    database::initialize(&config.database)?;
    println!("Database ready at {}", config.database.path);
    Ok(())
}

/// Handle the status report for one user
pub fn status(config: &Config, uid: i64) -> Result<()> {
    let service = build_service(config)?;
    let user = service.find_user(uid)?;
    let must_change = service.must_change_password(uid)?;

    println!("User:                 {} ({})", user.username, user.uid);
    println!("Forced change:        {}", if user.must_change_password { "yes" } else { "no" });
    match user.password_expiry_date {
        0 => println!("Password expires:     never"),
        expiry => println!(
            "Password expires:     {}{}",
            format_timestamp(expiry),
            if is_password_expired(&user, SystemClock.timestamp()) { " (expired)" } else { "" }
        ),
    }
    println!("Must change password: {}", if must_change { "yes" } else { "no" });

    Ok(())
}

/// Handle forcing a password change
pub fn require_change(config: &Config, uid: i64) -> Result<()> {
    let service = build_service(config)?;
    let catalog = load_catalog(config)?;

    service.require_password_change(uid)?;
    info!("Password change required for user {}", uid);
    println!("{}", catalog.translate("passwordChangeRequired", &[]));

    Ok(())
}

/// Handle an interactive password change
pub fn change(config: &Config, uid: i64) -> Result<()> {
    let service = build_service(config)?;
    let catalog = load_catalog(config)?;

    let user = service.find_user(uid)?;
    debug!("Changing password for {}", user.username);

    let request = ChangePasswordRequest::new(
        read_password("New password: ")?,
        read_password("Repeat new password: ")?,
    );

    match service.change_password(uid, &request)? {
        ChangePasswordOutcome::Changed { password_expiry_date } => {
            println!("{}", catalog.translate("passwordChanged", &[]));
            if password_expiry_date > 0 {
                println!("The new password expires on {}.", format_timestamp(password_expiry_date));
            }
            Ok(())
        }
        ChangePasswordOutcome::Rejected(result) => {
            for message in result.localized_messages(&catalog) {
                println!("  - {}", message);
            }
            anyhow::bail!("Password was not changed ({} problem(s))", result.errors().len())
        }
    }
}
