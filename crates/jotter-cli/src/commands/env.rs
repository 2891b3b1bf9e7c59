use std::io::Write;
use std::path::Path;

use jotter_core::remote::Connector;
use jotter_core::repository::FetchOutcome;
use jotter_core::storage::LocalStore;
use jotter_core::{EnvironmentProfile, Session};

use crate::error::CliError;

pub async fn run_env_list<C: Connector, L: LocalStore>(
    session: &Session<C, L>,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let profiles = session.environments().list();
    if profiles.is_empty() {
        writeln!(out, "No saved environments. Add one with `jotter env use`.")?;
        return Ok(());
    }
    let open_key = session.connection().api_key().await;
    for (index, profile) in profiles.iter().enumerate() {
        let key = profile.identity().unwrap_or_default();
        let marker = if index == 0 { '*' } else { ' ' };
        let project = profile.project_id.as_deref().unwrap_or("?");
        let state = if open_key.as_deref() == Some(key) {
            " (connected)"
        } else {
            ""
        };
        writeln!(out, "{marker} {key}  {project}{state}")?;
        for line in profile.summary_lines() {
            writeln!(out, "    {line}")?;
        }
    }
    Ok(())
}

pub async fn run_env_use<C: Connector, L: LocalStore>(
    session: &mut Session<C, L>,
    text: &str,
    out: &mut impl Write,
) -> Result<(), CliError> {
    switch(session, EnvironmentProfile::parse_auto(text), out).await
}

pub async fn run_env_import<C: Connector, L: LocalStore>(
    session: &mut Session<C, L>,
    path: &Path,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let profile = EnvironmentProfile::from_dotenv_path(path)?;
    switch(session, profile, out).await
}

pub async fn run_env_switch<C: Connector, L: LocalStore>(
    session: &mut Session<C, L>,
    api_key: &str,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let outcome = session
        .switch_to_saved(api_key)
        .await
        .map_err(|error| match error {
            jotter_core::Error::NotFound(_) => CliError::EnvironmentNotFound(api_key.to_string()),
            other => other.into(),
        })?;
    report(session, &outcome, out)
}

pub async fn run_env_remove<C: Connector, L: LocalStore>(
    session: &mut Session<C, L>,
    api_key: &str,
    out: &mut impl Write,
) -> Result<(), CliError> {
    if !session.remove_environment(api_key).await? {
        return Err(CliError::EnvironmentNotFound(api_key.to_string()));
    }
    writeln!(out, "{api_key}")?;
    Ok(())
}

async fn switch<C: Connector, L: LocalStore>(
    session: &mut Session<C, L>,
    profile: EnvironmentProfile,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let outcome = session.switch_environment(profile).await?;
    report(session, &outcome, out)
}

fn report<C: Connector, L: LocalStore>(
    session: &Session<C, L>,
    outcome: &FetchOutcome,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let count = session.state().view.notes().len();
    let key = session
        .environments()
        .current()
        .and_then(EnvironmentProfile::identity)
        .unwrap_or_default();
    writeln!(out, "{key}: {count} note(s)")?;
    if outcome.is_fresh() {
        Ok(())
    } else {
        Err(CliError::Offline)
    }
}
