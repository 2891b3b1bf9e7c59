use std::io::Write;
use std::path::PathBuf;

use jotter_core::media::{CloudinaryHost, ImageUpload};
use jotter_core::remote::Connector;
use jotter_core::storage::LocalStore;
use jotter_core::{EnvironmentProfile, Note, Session};

use crate::commands::common::{body_from_input, normalize_note_identifier};
use crate::error::CliError;

pub async fn run_add<C: Connector, L: LocalStore>(
    session: &mut Session<C, L>,
    title: &str,
    body: &str,
    category: Option<&str>,
    images: &[PathBuf],
    out: &mut impl Write,
) -> Result<(), CliError> {
    let mut body = body_from_input(body);
    if !images.is_empty() {
        let library = session.image_library(CloudinaryHost::new()?);
        let credentials = session
            .environments()
            .current()
            .and_then(EnvironmentProfile::image_service);
        for path in images {
            let image = ImageUpload::from_path(path)?;
            body.push_str(&library.upload_inline(&image, credentials.as_ref()).await);
        }
    }

    let mut note = Note::new(title, body);
    if let Some(category) = category {
        note = note.with_category(category);
    }
    save(session, note, out).await
}

pub async fn run_edit<C: Connector, L: LocalStore>(
    session: &mut Session<C, L>,
    id: &str,
    title: &str,
    body: &str,
    category: Option<&str>,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let id = normalize_note_identifier(id)?;
    let mut note = session
        .state()
        .view
        .find(&id)
        .cloned()
        .ok_or_else(|| CliError::NoteNotFound(id.to_string()))?;

    note.title = title.to_string();
    note.body = body_from_input(body);
    if let Some(category) = category {
        note = note.with_category(category);
    }
    save(session, note, out).await
}

async fn save<C: Connector, L: LocalStore>(
    session: &mut Session<C, L>,
    note: Note,
    out: &mut impl Write,
) -> Result<(), CliError> {
    match session.save_note(note).await? {
        Some(id) => writeln!(out, "{id}")?,
        None => writeln!(out, "(pending) saved locally; run `jotter recover` to upload")?,
    }
    Ok(())
}
