use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::cli::Command;
use crate::registry::Registry;
use crate::service::{SchoolService, ServiceError};
use crate::types::{SchoolSubmission, UploadedAsset};

pub async fn run<R: Registry>(cmd: &Command, service: &SchoolService<R>) -> Result<()> {
    let Command::Register {
        name,
        email,
        address,
        city,
        state,
        contact,
        image,
    } = cmd
    else {
        bail!("not a register command");
    };

    let image = match image {
        Some(path) => Some(load_image(path).await?),
        None => None,
    };
    let submission = SchoolSubmission {
        name: name.clone(),
        email: email.clone(),
        address: address.clone(),
        city: city.clone(),
        state: state.clone(),
        contact: contact.clone(),
        image,
    };

    match service.register(submission).await {
        Ok(record) => {
            println!("{}", serde_json::to_string_pretty(&record)?);
            Ok(())
        }
        Err(ServiceError::Validation(errors)) => {
            for v in errors.violations() {
                eprintln!("{}: {}", v.field, v.message);
            }
            bail!("submission rejected")
        }
        Err(e) => Err(e).context("registering school"),
    }
}

async fn load_image(path: &Path) -> Result<UploadedAsset> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading image {}", path.display()))?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(UploadedAsset::new(filename, bytes))
}
