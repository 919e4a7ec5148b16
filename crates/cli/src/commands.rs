//! Command implementations for the LMS CLI.

use secrecy::SecretString;

use novel_lms_client::{AppState, AuthError, CurrentUser, LoginOutcome};
use novel_lms_core::{Identity, RoleClass, RoleResolution};

type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Sign in and print where the resolved role lands.
#[allow(clippy::print_stdout)]
pub async fn login(state: &AppState, identity: &Identity, secret: &SecretString) -> CommandResult {
    match state.login(identity, secret).await? {
        LoginOutcome::SignedIn {
            user,
            role,
            destination,
        } => {
            let name = user.full_name.as_deref().unwrap_or(user.identity.as_str());
            println!("Signed in as {name} ({role})");
            println!("Landing route: {destination}");
        }
        LoginOutcome::InsufficientPermissions { notice, destination } => {
            println!("{notice}");
            println!("Returning to {destination}");
        }
        LoginOutcome::AlreadyPending => {
            println!("A login is already in progress");
        }
    }
    Ok(())
}

/// Sign in and print the canonical identity and role.
#[allow(clippy::print_stdout)]
pub async fn whoami(state: &AppState, identity: &Identity, secret: &SecretString) -> CommandResult {
    let Some((user, role)) = sign_in(state, identity, secret).await? else {
        return Ok(());
    };

    println!("{}", user.identity);
    if let Some(full_name) = &user.full_name {
        println!("Name: {full_name}");
    }
    println!("Role: {role}");
    Ok(())
}

/// Sign in, then resolve another user's role.
#[allow(clippy::print_stdout)]
pub async fn role(
    state: &AppState,
    identity: &Identity,
    secret: &SecretString,
    target: &Identity,
) -> CommandResult {
    if sign_in(state, identity, secret).await?.is_none() {
        return Ok(());
    }

    match state.permissions().resolve(target).await? {
        RoleResolution::Resolved(role) => println!("{target}: {role}"),
        RoleResolution::NoRoleAssigned => println!("{target}: no LMS role assigned"),
    }
    Ok(())
}

/// Sign in, then print a member's normalized module progress.
#[allow(clippy::print_stdout)]
pub async fn progress(
    state: &AppState,
    identity: &Identity,
    secret: &SecretString,
    member: &Identity,
) -> CommandResult {
    if sign_in(state, identity, secret).await?.is_none() {
        return Ok(());
    }

    let report = state.member_progress(member).await?;

    if report.modules.is_empty() {
        println!("{member} has no enrollments");
        return Ok(());
    }

    println!("Modules for {member}:");
    for line in &report.modules {
        let status = line
            .status
            .map_or("-", |status| match status {
                novel_lms_core::ModuleStatus::NotStarted => "Not Started",
                novel_lms_core::ModuleStatus::InProgress => "In Progress",
                novel_lms_core::ModuleStatus::Completed => "Completed",
            });
        println!("  {:<40} {:>7.2}%  {}", line.module, line.percent, status);
    }

    let stats = &report.stats;
    println!();
    println!(
        "{} modules: {} completed, {} in progress, {} not started",
        stats.total_modules,
        stats.completed_modules,
        stats.in_progress_modules,
        stats.not_started_modules
    );
    println!("Average progress: {:.2}%", stats.average_progress);
    Ok(())
}

/// Run the login flow, printing the permission notice when the account has
/// no recognized role.
#[allow(clippy::print_stdout)]
async fn sign_in(
    state: &AppState,
    identity: &Identity,
    secret: &SecretString,
) -> Result<Option<(CurrentUser, RoleClass)>, AuthError> {
    match state.login(identity, secret).await? {
        LoginOutcome::SignedIn { user, role, .. } => Ok(Some((user, role))),
        LoginOutcome::InsufficientPermissions { notice, .. } => {
            println!("{notice}");
            Ok(None)
        }
        LoginOutcome::AlreadyPending => {
            println!("A login is already in progress");
            Ok(None)
        }
    }
}
