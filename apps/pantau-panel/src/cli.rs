use anyhow::Result;

use crate::auth::UserStore;
use crate::config::AppConfig;

/// Reset a user's password; creates the account as an admin when it does
/// not exist yet, matching the bootstrap workflow.
pub fn reset_password(users_file: &str, username: &str, new_pass: &str) -> Result<()> {
    let store = UserStore::load(users_file)?;

    if store.set_password(username, new_pass).is_ok() {
        println!("Password for user '{}' has been successfully reset.", username);
    } else {
        store.add_user(username, new_pass, "admin")?;
        println!("New admin user '{}' created successfully.", username);
    }

    Ok(())
}

pub fn add_user(users_file: &str, username: &str, password: &str, role: &str) -> Result<()> {
    if role != "admin" && role != "user" {
        anyhow::bail!("Role must be 'admin' or 'user'");
    }
    let store = UserStore::load(users_file)?;
    store.add_user(username, password, role)?;
    println!("User '{}' ({}) created successfully.", username, role);
    Ok(())
}

pub fn remove_user(users_file: &str, username: &str) -> Result<()> {
    let store = UserStore::load(users_file)?;
    store.remove_user(username)?;
    println!("User '{}' deleted.", username);
    Ok(())
}

pub fn info(config: &AppConfig) -> Result<()> {
    let store = UserStore::load(&config.users_file)?;

    println!("\n=== PANTAU PANEL INFO ===");
    println!("API URL:     http://0.0.0.0:{}", config.listen_port);
    println!("Database:    {}", config.database_url);
    println!("Users file:  {}", config.users_file);
    println!("Accounts:    {}", store.usernames().join(", "));
    println!("Brands:      {}", config.valid_brands().join(", "));
    println!("=========================\n");
    Ok(())
}
